//! Error types for OpenHedgehog bootstrap.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Conflicting Profile Flags
//!   Reason: Cannot combine --dev with --profile
//!   Fix: Pass either --dev or --profile <name> before the subcommand, not both.
//! ```
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 10,
//!   "category": "usage",
//!   "message": "Cannot combine --dev with --profile",
//!   "recoverable": true
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type alias for bootstrap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or conflicting command-line flags.
    Usage,
    /// Listening port conflicts.
    Port,
    /// Process table / socket table queries.
    Introspection,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Usage => write!(f, "usage"),
            ErrorCategory::Port => write!(f, "port"),
            ErrorCategory::Introspection => write!(f, "introspection"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for the bootstrap layer.
#[derive(Error, Debug)]
pub enum Error {
    // Usage errors (10-19)
    #[error("Cannot combine --dev with --profile")]
    ConflictingProfileFlags,

    #[error("--profile requires a value")]
    MissingProfileValue,

    #[error("Invalid --profile (use letters, numbers, \"_\", \"-\" only): {0}")]
    InvalidProfileName(String),

    // Port errors (20-29)
    #[error("port {port} is already in use")]
    PortInUse { port: u16 },

    // Introspection errors (30-39)
    #[error("listener introspection failed: {0}")]
    Introspection(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the stable error code for this error type.
    ///
    /// - 10-19: Usage errors
    /// - 20-29: Port errors
    /// - 30-39: Introspection errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::ConflictingProfileFlags => 10,
            Error::MissingProfileValue => 11,
            Error::InvalidProfileName(_) => 12,
            Error::PortInUse { .. } => 20,
            Error::Introspection(_) => 30,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ConflictingProfileFlags
            | Error::MissingProfileValue
            | Error::InvalidProfileName(_) => ErrorCategory::Usage,
            Error::PortInUse { .. } => ErrorCategory::Port,
            Error::Introspection(_) => ErrorCategory::Introspection,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Whether this is a usage error that aborts before any environment mutation.
    pub fn is_usage(&self) -> bool {
        self.category() == ErrorCategory::Usage
    }

    /// Returns whether the operator can resolve this error without a code change.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::ConflictingProfileFlags
            | Error::MissingProfileValue
            | Error::InvalidProfileName(_) => true,
            // Not expected to clear within the same process lifetime.
            Error::PortInUse { .. } => false,
            Error::Introspection(_) => true,
            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::ConflictingProfileFlags => {
                "Pass either --dev or --profile <name> before the subcommand, not both."
            }
            Error::MissingProfileValue => {
                "Give the profile a name, e.g. '--profile work' or '--profile=work'."
            }
            Error::InvalidProfileName(_) => {
                "Profile names start with a letter or digit and contain only letters, digits, '_' and '-'."
            }
            Error::PortInUse { .. } => {
                "Stop the process using the port or pass --port <free-port>."
            }
            Error::Introspection(_) => {
                "Listener details are unavailable. Inspect the port manually with 'lsof -nP -iTCP:<port> -sTCP:LISTEN'."
            }
            Error::Io(_) => "Check permissions on the state directory and retry.",
            Error::Json(_) => "Report this as a bug; the output could not be serialized.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::ConflictingProfileFlags => "Conflicting Profile Flags",
            Error::MissingProfileValue => "Missing Profile Name",
            Error::InvalidProfileName(_) => "Invalid Profile Name",
            Error::PortInUse { .. } => "Port In Use",
            Error::Introspection(_) => "Listener Introspection Failed",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Serialization Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Remediation hint.
    pub remediation: String,

    /// Additional structured context (e.g., port).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = BTreeMap::new();

        match err {
            Error::PortInUse { port } => {
                context.insert("port".to_string(), serde_json::json!(port));
            }
            Error::InvalidProfileName(name) => {
                context.insert("profile".to_string(), serde_json::json!(name));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            remediation: err.remediation().to_string(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
