//! Exit codes for the openhedgehog CLI.
//!
//! Exit code ranges:
//! - 0-2: Outcomes a wrapper script is expected to branch on
//! - 20-29: Internal errors (bugs, should be reported)

/// Exit codes for bootstrap operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Clean = 0,

    /// The requested port is held by another listener
    PortInUse = 1,

    /// Malformed or conflicting global flags
    UsageError = 2,

    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Check if this exit code is an internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::PortInUse => "ERR_PORT_IN_USE",
            ExitCode::UsageError => "ERR_USAGE",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }

    /// Exit code for a library error.
    pub fn for_error(err: &oh_common::Error) -> Self {
        match err.category() {
            oh_common::ErrorCategory::Usage => ExitCode::UsageError,
            oh_common::ErrorCategory::Port => ExitCode::PortInUse,
            oh_common::ErrorCategory::Io => ExitCode::IoError,
            oh_common::ErrorCategory::Introspection => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oh_common::Error;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::PortInUse.as_i32(), 1);
        assert_eq!(ExitCode::UsageError.as_i32(), 2);
        assert_eq!(ExitCode::InternalError.as_i32(), 20);
        assert_eq!(ExitCode::IoError.as_i32(), 21);
    }

    #[test]
    fn test_exit_code_classification() {
        assert!(ExitCode::Clean.is_success());
        assert!(!ExitCode::PortInUse.is_success());
        assert!(ExitCode::IoError.is_internal_error());
        assert!(!ExitCode::UsageError.is_internal_error());
    }

    #[test]
    fn test_exit_code_display() {
        assert_eq!(ExitCode::UsageError.to_string(), "ERR_USAGE (2)");
        assert_eq!(i32::from(ExitCode::PortInUse), 1);
    }

    #[test]
    fn test_for_error() {
        assert_eq!(
            ExitCode::for_error(&Error::ConflictingProfileFlags),
            ExitCode::UsageError
        );
        assert_eq!(
            ExitCode::for_error(&Error::PortInUse { port: 1 }),
            ExitCode::PortInUse
        );
        assert_eq!(
            ExitCode::for_error(&Error::Io(std::io::Error::other("x"))),
            ExitCode::IoError
        );
    }
}
