//! OpenHedgehog profile and path configuration.
//!
//! This crate provides:
//! - Environment key names shared by the CLI and the daemon
//! - Profile name validation and normalization
//! - Profile-derived environment defaults that never clobber operator overrides
//! - Gateway state directory resolution (override → profile → home → bare)

pub mod paths;
pub mod profile;

pub use paths::{
    resolve_config_path, resolve_gateway_port, resolve_gateway_state_dir,
    resolve_gateway_state_dir_with_source, resolve_home_dir, ResolvedStateDir, StateDirSource,
};
pub use profile::{
    apply_cli_profile_env, derive_profile_env, is_valid_profile_name, normalize_profile_name,
    resolve_profile_overlay, EnvOverlay, ProfileEnv,
};

/// Environment variable names.
pub mod env_keys {
    /// Active profile name.
    pub const PROFILE: &str = "OPENHEDGEHOG_PROFILE";
    /// Explicit state directory override.
    pub const STATE_DIR: &str = "OPENHEDGEHOG_STATE_DIR";
    /// Explicit config file path override.
    pub const CONFIG_PATH: &str = "OPENHEDGEHOG_CONFIG_PATH";
    /// Gateway listening port.
    pub const GATEWAY_PORT: &str = "OPENHEDGEHOG_GATEWAY_PORT";
    /// Home directory (POSIX).
    pub const HOME: &str = "HOME";
    /// Home directory (Windows).
    pub const USERPROFILE: &str = "USERPROFILE";
}

/// Base name of the state directory under the home directory.
pub const STATE_DIR_NAME: &str = ".openhedgehog";

/// Config file name inside the state directory.
pub const CONFIG_FILENAME: &str = "openhedgehog.json";

/// Profile selected by `--dev`.
pub const DEV_PROFILE: &str = "dev";

/// Gateway port used by the dev profile unless overridden.
pub const DEV_GATEWAY_PORT: u16 = 19001;

/// Gateway port used when nothing else selects one.
pub const DEFAULT_GATEWAY_PORT: u16 = 18789;

/// Profile name that maps to the unsuffixed state directory (case-insensitive).
pub const DEFAULT_PROFILE: &str = "default";
