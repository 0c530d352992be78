//! Listener classification.
//!
//! Categories are derived from the listener's command line only. The default
//! classifier knows two shapes: an SSH port-forward that references the
//! contested port, and another instance of this program.

use crate::ports::diagnostics::PortListener;
use oh_common::PROGRAM_NAME;
use serde::{Deserialize, Serialize};

/// Category of a process holding a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListenerKind {
    Ssh,
    GatewaySelf,
    Other,
}

impl std::fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerKind::Ssh => write!(f, "ssh"),
            ListenerKind::GatewaySelf => write!(f, "gateway-self"),
            ListenerKind::Other => write!(f, "other"),
        }
    }
}

/// Decides which category a listener falls into.
///
/// Implementations must be pure functions of the listener and port.
pub trait ListenerClassifier {
    fn classify(&self, listener: &PortListener, port: u16) -> ListenerKind;
}

/// Classifier driven by command-line patterns.
#[derive(Debug, Clone)]
pub struct CommandLineClassifier {
    product: String,
}

impl CommandLineClassifier {
    /// Classifier that recognizes `product` as the gateway's own program name.
    pub fn for_product(product: &str) -> Self {
        CommandLineClassifier {
            product: product.to_ascii_lowercase(),
        }
    }

    /// Case-insensitive whole-word search for the product name.
    fn mentions_product(&self, text: &str) -> bool {
        if self.product.is_empty() {
            return false;
        }
        let is_word = |c: char| c.is_alphanumeric() || c == '_';
        let text = text.to_ascii_lowercase();
        text.match_indices(&self.product).any(|(start, found)| {
            let before = text[..start].chars().next_back();
            let after = text[start + found.len()..].chars().next();
            !before.is_some_and(is_word) && !after.is_some_and(is_word)
        })
    }

    /// An ssh/autossh command line whose `-L`/`-R` forward binds `port`.
    fn is_ssh_forward(text: &str, port: u16) -> bool {
        let mut tokens = text.split_whitespace();
        let executable = tokens
            .next()
            .and_then(|token| token.rsplit(['/', '\\']).next())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let executable = executable.strip_suffix(".exe").unwrap_or(&executable);
        if !matches!(executable, "ssh" | "autossh") {
            return false;
        }

        let port = port.to_string();
        let args: Vec<&str> = tokens.collect();
        args.iter().enumerate().any(|(i, arg)| {
            has_inner_field(arg, &port)
                || forward_specs(arg, args.get(i + 1).copied())
                    .any(|spec| spec_binds_port(spec, &port))
        })
    }
}

/// Candidate forward specs for one argument.
///
/// `-L 18789:h:p`, `-L18789:h:p` and `-NL 18789:h:p` all put the spec right
/// after an `L` or `R` inside a short-option cluster.
fn forward_specs<'a>(arg: &'a str, next: Option<&'a str>) -> impl Iterator<Item = &'a str> + 'a {
    let cluster = arg
        .strip_prefix('-')
        .filter(|rest| !rest.starts_with('-'))
        .unwrap_or_default();
    cluster
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_alphabetic())
        .filter(|(_, c)| matches!(c, 'L' | 'R'))
        .filter_map(move |(idx, _)| match &cluster[idx + 1..] {
            "" => next,
            attached => Some(attached),
        })
}

/// `port[:...]` or `bind_address:port[:...]`.
fn spec_binds_port(spec: &str, port: &str) -> bool {
    let mut fields = spec.split(':');
    match (fields.next(), fields.next()) {
        (Some(first), _) if first == port => true,
        (Some(first), Some(second)) => !first.is_empty() && second == port,
        _ => false,
    }
}

/// `...:port:...` anywhere in a token.
fn has_inner_field(token: &str, port: &str) -> bool {
    let fields: Vec<&str> = token.split(':').collect();
    fields.len() > 2 && fields[1..fields.len() - 1].contains(&port)
}

impl Default for CommandLineClassifier {
    fn default() -> Self {
        CommandLineClassifier::for_product(PROGRAM_NAME)
    }
}

impl ListenerClassifier for CommandLineClassifier {
    fn classify(&self, listener: &PortListener, port: u16) -> ListenerKind {
        let text = listener.display_command();
        if Self::is_ssh_forward(text, port) {
            return ListenerKind::Ssh;
        }
        if self.mentions_product(text) {
            return ListenerKind::GatewaySelf;
        }
        ListenerKind::Other
    }
}

/// Classify with the default command-line classifier.
pub fn classify_port_listener(listener: &PortListener, port: u16) -> ListenerKind {
    CommandLineClassifier::default().classify(listener, port)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listener(command_line: &str) -> PortListener {
        PortListener::new(Some(1234), command_line)
    }

    #[test]
    fn test_classifies_ssh_and_gateway_listeners() {
        assert_eq!(
            classify_port_listener(
                &listener("ssh -N -L 18789:127.0.0.1:18789 user@host"),
                18789
            ),
            ListenerKind::Ssh
        );
        assert_eq!(
            classify_port_listener(
                &listener("node /Users/me/Projects/openhedgehog/dist/entry.js gateway"),
                18789
            ),
            ListenerKind::GatewaySelf
        );
    }

    #[test]
    fn test_ssh_forward_variants() {
        for cmd in [
            "/usr/bin/ssh -L18789:localhost:18789 host",
            "ssh -NL 127.0.0.1:18789:localhost:18789 host",
            "autossh -M 0 -R 18789:localhost:22 host",
            "ssh -o ExitOnForwardFailure=yes -L 0.0.0.0:18789:10.0.0.2:80 host",
            "ssh -Llocalhost:18789:localhost:80 host",
            "ssh -fNR 18789 host",
            "ssh -N host -W 10.0.0.1:18789:x",
        ] {
            assert_eq!(
                classify_port_listener(&listener(cmd), 18789),
                ListenerKind::Ssh,
                "{cmd}"
            );
        }
    }

    #[test]
    fn test_ssh_forward_for_other_port_is_other() {
        assert_eq!(
            classify_port_listener(&listener("ssh -N -L 9000:127.0.0.1:9000 host"), 18789),
            ListenerKind::Other
        );
        assert_eq!(
            classify_port_listener(&listener("ssh -N -L 187890:127.0.0.1:1 host"), 18789),
            ListenerKind::Other
        );
    }

    #[test]
    fn test_ssh_without_forward_for_port_is_other() {
        for cmd in [
            "ssh -p 18789 host",
            "ssh --L 18789:localhost:80 host",
            "ssh -LN 18789:localhost:80 host",
            "ssh -L 18789x:localhost:80 host",
        ] {
            assert_eq!(
                classify_port_listener(&listener(cmd), 18789),
                ListenerKind::Other,
                "{cmd}"
            );
        }
    }

    #[test]
    fn test_forward_spec_fields() {
        assert!(spec_binds_port("18789", "18789"));
        assert!(spec_binds_port("127.0.0.1:18789:h:1", "18789"));
        assert!(!spec_binds_port(":18789", "18789"));
        assert!(!spec_binds_port("a:b:18789", "18789"));
        assert!(has_inner_field("a:18789:b", "18789"));
        assert!(!has_inner_field("a:18789", "18789"));
    }

    #[test]
    fn test_ssh_to_product_host_is_still_ssh() {
        assert_eq!(
            classify_port_listener(
                &listener("ssh -L 18789:localhost:18789 openhedgehog.internal"),
                18789
            ),
            ListenerKind::Ssh
        );
    }

    #[test]
    fn test_non_ssh_tool_mentioning_port_is_other() {
        assert_eq!(
            classify_port_listener(&listener("python3 -m http.server 18789"), 18789),
            ListenerKind::Other
        );
    }

    #[test]
    fn test_falls_back_to_short_command() {
        let mut l = PortListener::new(Some(7), "");
        l.command = Some("openhedgehog".to_string());
        assert_eq!(classify_port_listener(&l, 18789), ListenerKind::GatewaySelf);
    }

    #[test]
    fn test_custom_product() {
        let classifier = CommandLineClassifier::for_product("hedgegate");
        assert_eq!(
            classifier.classify(&listener("/opt/hedgegate/bin/hedgegate serve"), 80),
            ListenerKind::GatewaySelf
        );
        assert_eq!(
            classifier.classify(&listener("openhedgehog gateway"), 80),
            ListenerKind::Other
        );
    }

    #[test]
    fn test_kind_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ListenerKind::GatewaySelf).unwrap(),
            "\"gateway-self\""
        );
        assert_eq!(ListenerKind::Ssh.to_string(), "ssh");
    }
}
