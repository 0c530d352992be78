//! Event vocabulary for structured logs.

use serde::{Deserialize, Serialize};

/// Bootstrap pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Argument normalization.
    Argv,
    /// Global profile flag parsing and overlay derivation.
    Profile,
    /// State directory and config path resolution.
    Paths,
    /// Port probing and conflict diagnosis.
    Port,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Argv => "argv",
            Stage::Profile => "profile",
            Stage::Paths => "paths",
            Stage::Port => "port",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Bootstrap
    pub const ARGV_NORMALIZED: &str = "bootstrap.argv_normalized";
    pub const PROFILE_RESOLVED: &str = "bootstrap.profile_resolved";
    pub const ENV_APPLIED: &str = "bootstrap.env_applied";
    pub const STATE_DIR_RESOLVED: &str = "bootstrap.state_dir_resolved";

    // Ports
    pub const PORT_PROBE: &str = "port.probe";
    pub const PORT_IN_USE: &str = "port.in_use";
    pub const PORT_INTROSPECTION_FAILED: &str = "port.introspection_failed";
}

/// Correlation fields attached to every event of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogContext {
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: Option<&str>) -> Self {
        self.profile = profile.map(str::to_string);
        self
    }
}
