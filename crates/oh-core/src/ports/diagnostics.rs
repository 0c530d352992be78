//! Port conflict diagnostics: listener model, hints and report rendering.

use crate::ports::classify::{classify_port_listener, ListenerKind};
use oh_common::{ProcessId, PROGRAM_NAME};
use serde::{Deserialize, Serialize};

/// A process observed listening on a port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortListener {
    /// Process id, when the OS source could attribute the socket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<ProcessId>,
    /// Full command line, arguments joined by spaces.
    pub command_line: String,
    /// Short process name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Bound address as reported by the source (e.g. `*:18789`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl PortListener {
    pub fn new(pid: Option<u32>, command_line: impl Into<String>) -> Self {
        PortListener {
            pid: pid.map(ProcessId),
            command_line: command_line.into(),
            ..Default::default()
        }
    }

    /// Command line, or the short name when the command line is unknown.
    pub fn display_command(&self) -> &str {
        if !self.command_line.trim().is_empty() {
            return &self.command_line;
        }
        self.command.as_deref().unwrap_or_default()
    }

    /// `pid <pid> <user>: <command> (<address>)`
    pub fn render(&self) -> String {
        let pid = self
            .pid
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string());
        let mut line = format!("pid {pid}");
        if let Some(user) = &self.user {
            line.push(' ');
            line.push_str(user);
        }
        line.push_str(": ");
        let command = self.display_command();
        line.push_str(if command.is_empty() { "unknown" } else { command });
        if let Some(address) = &self.address {
            line.push_str(&format!(" ({address})"));
        }
        line
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortStatus {
    Free,
    Busy,
}

/// Result of inspecting a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDiagnosticsReport {
    pub port: u16,
    pub status: PortStatus,
    pub listeners: Vec<PortListener>,
    pub hints: Vec<String>,
    /// Introspection failures; listeners may be incomplete when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl PortDiagnosticsReport {
    pub fn free(port: u16) -> Self {
        PortDiagnosticsReport {
            port,
            status: PortStatus::Free,
            listeners: Vec::new(),
            hints: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.status == PortStatus::Busy
    }

    /// Whether any listener looks like another instance of this program.
    pub fn has_gateway_self(&self) -> bool {
        self.listeners
            .iter()
            .any(|l| classify_port_listener(l, self.port) == ListenerKind::GatewaySelf)
    }
}

/// Shown when a port is busy but nothing could be attributed.
pub fn generic_port_hint() -> String {
    "Another process is listening on this port. Find it with 'lsof -nP -iTCP:<port> -sTCP:LISTEN' and stop it, or choose a different port."
        .to_string()
}

pub(crate) fn multiple_listeners_hint() -> String {
    format!(
        "Multiple listeners detected; ensure only one gateway or tunnel uses this port unless intentionally running isolated {PROGRAM_NAME} profiles."
    )
}

fn hint_for(kind: ListenerKind) -> String {
    match kind {
        ListenerKind::Ssh => {
            "SSH tunnel already bound to this port. Close the tunnel or use a different local port in -L."
                .to_string()
        }
        ListenerKind::GatewaySelf => format!(
            "Gateway already running locally. Stop it ({PROGRAM_NAME} gateway stop) or use a different port."
        ),
        ListenerKind::Other => {
            "Another process is listening on this port. Stop it or choose a different port."
                .to_string()
        }
    }
}

/// One hint per listener, in listener order.
pub fn build_port_hints(listeners: &[PortListener], port: u16) -> Vec<String> {
    listeners
        .iter()
        .map(|listener| hint_for(classify_port_listener(listener, port)))
        .collect()
}

/// Human-readable lines for a report.
///
/// A busy report starts with `Port <n> is already in use.`, then one line
/// per listener, then one line per hint. A free report is a single line.
pub fn format_port_diagnostics(report: &PortDiagnosticsReport) -> Vec<String> {
    if !report.is_busy() {
        return vec![format!("Port {} is free.", report.port)];
    }

    let mut lines = vec![format!("Port {} is already in use.", report.port)];
    lines.extend(report.listeners.iter().map(|l| format!("- {}", l.render())));
    lines.extend(report.hints.iter().map(|h| format!("- {h}")));
    lines.extend(
        report
            .errors
            .iter()
            .map(|e| format!("- listener lookup failed: {e}")),
    );
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn busy(listeners: Vec<PortListener>, port: u16) -> PortDiagnosticsReport {
        let hints = build_port_hints(&listeners, port);
        PortDiagnosticsReport {
            port,
            status: PortStatus::Busy,
            listeners,
            hints,
            errors: Vec::new(),
        }
    }

    #[test]
    fn test_hints_follow_listener_order() {
        let listeners = vec![
            PortListener::new(Some(123), "ssh -N -L 18789:127.0.0.1:18789 user@host"),
            PortListener::new(Some(456), "node /opt/openhedgehog/dist/entry.js gateway"),
            PortListener::new(Some(789), "python3 -m http.server 18789"),
        ];
        let hints = build_port_hints(&listeners, 18789);
        assert_eq!(hints.len(), 3);
        assert!(hints[0].contains("SSH tunnel"));
        assert!(hints[1].contains("Gateway already running locally"));
        assert!(hints[1].contains("openhedgehog gateway stop"));
        assert!(hints[2].contains("Another process"));
    }

    #[test]
    fn test_no_listeners_no_hints() {
        assert!(build_port_hints(&[], 18789).is_empty());
    }

    #[test]
    fn test_formats_busy_report() {
        let report = busy(
            vec![PortListener::new(
                Some(123),
                "ssh -N -L 18789:127.0.0.1:18789 user@host",
            )],
            18789,
        );
        let lines = format_port_diagnostics(&report);
        assert_eq!(lines[0], "Port 18789 is already in use.");
        assert_eq!(
            lines[1],
            "- pid 123: ssh -N -L 18789:127.0.0.1:18789 user@host"
        );
        assert!(lines[2].starts_with("- SSH tunnel"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_formats_free_report() {
        assert_eq!(
            format_port_diagnostics(&PortDiagnosticsReport::free(8080)),
            vec!["Port 8080 is free."]
        );
    }

    #[test]
    fn test_render_with_details() {
        let listener = PortListener {
            pid: Some(ProcessId(42)),
            command_line: "node gateway".into(),
            command: Some("node".into()),
            user: Some("peter".into()),
            address: Some("*:18789".into()),
        };
        assert_eq!(listener.render(), "pid 42 peter: node gateway (*:18789)");
    }

    #[test]
    fn test_render_unknown_pid_and_command() {
        let listener = PortListener {
            address: Some("0.0.0.0:18789".into()),
            ..Default::default()
        };
        assert_eq!(listener.render(), "pid ?: unknown (0.0.0.0:18789)");
    }

    #[test]
    fn test_gateway_self_detection() {
        let report = busy(
            vec![PortListener::new(Some(9), "openhedgehog gateway run")],
            18789,
        );
        assert!(report.has_gateway_self());
        let report = busy(vec![PortListener::new(Some(9), "nginx")], 18789);
        assert!(!report.has_gateway_self());
    }

    #[test]
    fn test_report_json_shape() {
        let report = busy(vec![PortListener::new(Some(5), "nginx: master")], 80);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "busy");
        assert_eq!(json["listeners"][0]["pid"], 5);
        assert_eq!(json["listeners"][0]["command_line"], "nginx: master");
        assert!(json.get("errors").is_none());
    }
}
