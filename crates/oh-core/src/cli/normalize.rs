//! Invocation argument normalization.
//!
//! Hosts launch the CLI in many shapes: through a (possibly versioned)
//! interpreter, through a lightweight runtime with a script path, as a direct
//! binary, or behind some unrelated wrapper. Downstream parsing always skips
//! exactly two tokens, so every shape is rewritten to
//! `[host, program, ...user_args]`.
//!
//! The rules live in an ordered table and the first match wins. The last rule
//! matches everything: an unrecognized leading token gets a canonical
//! host/program prefix in front of the whole list, so a real argument is never
//! swallowed by a misclassified interpreter slot.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Placeholder host token prepended when the invocation carries none.
pub const CANONICAL_HOST: &str = "node";

/// Number of leading tokens (host + program) every normalized argv carries.
pub const ARGV_PREFIX_LEN: usize = 2;

static RE_VERSIONED_NODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^node-\d+(?:\.\d+)*(?:\.exe)?$").unwrap());

/// Which rule produced a normalized argv.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeRule {
    /// `node`, `nodejs`, `node-22.2.0.exe`, ... followed by a script.
    Interpreter,
    /// `bun` followed by a script path.
    LightweightRuntime,
    /// Token 0 is the program itself.
    DirectInvocation,
    /// Anything else; the full list is kept as user arguments.
    Wrapped,
    /// No raw invocation was available.
    Fallback,
}

impl std::fmt::Display for NormalizeRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NormalizeRule::Interpreter => "interpreter",
            NormalizeRule::LightweightRuntime => "lightweight_runtime",
            NormalizeRule::DirectInvocation => "direct_invocation",
            NormalizeRule::Wrapped => "wrapped",
            NormalizeRule::Fallback => "fallback",
        };
        write!(f, "{}", s)
    }
}

/// Argument list shaped as `[host, program, ...user_args]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedArgv(Vec<String>);

impl NormalizedArgv {
    fn new(tokens: Vec<String>) -> Self {
        debug_assert!(tokens.len() >= ARGV_PREFIX_LEN);
        NormalizedArgv(tokens)
    }

    pub fn host(&self) -> &str {
        &self.0[0]
    }

    pub fn program(&self) -> &str {
        &self.0[1]
    }

    /// Tokens after the host/program prefix.
    pub fn user_args(&self) -> &[String] {
        &self.0[ARGV_PREFIX_LEN..]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl AsRef<[String]> for NormalizedArgv {
    fn as_ref(&self) -> &[String] {
        &self.0
    }
}

struct RuleEntry {
    rule: NormalizeRule,
    matches: fn(&[String], &str) -> bool,
    transform: fn(&[String], &str) -> Vec<String>,
}

/// Evaluated top to bottom; the last entry always matches.
static RULES: &[RuleEntry] = &[
    RuleEntry {
        rule: NormalizeRule::Interpreter,
        matches: |raw, _| raw.len() >= 2 && is_interpreter(&executable_name(&raw[0])),
        transform: pass_through,
    },
    RuleEntry {
        rule: NormalizeRule::LightweightRuntime,
        matches: |raw, _| raw.len() >= 2 && is_lightweight_runtime(&executable_name(&raw[0])),
        transform: pass_through,
    },
    RuleEntry {
        rule: NormalizeRule::DirectInvocation,
        matches: |raw, program| is_program_token(&raw[0], program),
        transform: |raw, _| prepend(&[CANONICAL_HOST], raw),
    },
    RuleEntry {
        rule: NormalizeRule::Wrapped,
        matches: |_, _| true,
        transform: |raw, program| prepend(&[CANONICAL_HOST, program], raw),
    },
];

fn pass_through(raw: &[String], _program: &str) -> Vec<String> {
    raw.to_vec()
}

fn prepend(prefix: &[&str], raw: &[String]) -> Vec<String> {
    prefix
        .iter()
        .map(|s| s.to_string())
        .chain(raw.iter().cloned())
        .collect()
}

/// Lower-cased basename of a path-like token; both `/` and `\` separate.
fn executable_name(token: &str) -> String {
    token
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn is_interpreter(executable: &str) -> bool {
    matches!(executable, "node" | "node.exe" | "nodejs" | "nodejs.exe")
        || RE_VERSIONED_NODE.is_match(executable)
}

fn is_lightweight_runtime(executable: &str) -> bool {
    matches!(executable, "bun" | "bun.exe")
}

fn is_program_token(token: &str, program: &str) -> bool {
    let name = executable_name(token);
    let name = name.strip_suffix(".exe").unwrap_or(&name);
    !program.is_empty() && name == program.to_ascii_lowercase()
}

/// Which rule applies to a non-empty raw invocation.
pub fn classify_invocation(raw: &[String], program: &str) -> NormalizeRule {
    if raw.is_empty() {
        return NormalizeRule::Fallback;
    }
    RULES
        .iter()
        .find(|entry| (entry.matches)(raw, program))
        .map(|entry| entry.rule)
        .unwrap_or(NormalizeRule::Wrapped)
}

/// Normalize the invocation into `[host, program, ...user_args]`.
///
/// `raw_args` is the full list supplied by the host. When it is missing or
/// empty, `fallback_args` is treated as bare user arguments.
pub fn build_parse_argv(
    program: &str,
    raw_args: Option<&[String]>,
    fallback_args: &[String],
) -> (NormalizedArgv, NormalizeRule) {
    let raw = match raw_args {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            let tokens = prepend(&[CANONICAL_HOST, program], fallback_args);
            return (NormalizedArgv::new(tokens), NormalizeRule::Fallback);
        }
    };

    for entry in RULES {
        if (entry.matches)(raw, program) {
            let tokens = (entry.transform)(raw, program);
            return (NormalizedArgv::new(tokens), entry.rule);
        }
    }

    (
        NormalizedArgv::new(prepend(&[CANONICAL_HOST, program], raw)),
        NormalizeRule::Wrapped,
    )
}
