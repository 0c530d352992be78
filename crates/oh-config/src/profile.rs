//! Profile-derived environment defaults.
//!
//! A profile isolates the state directory, config path and default gateway
//! port. Selecting one derives up to four environment values:
//!
//! | Key | Derived value |
//! |---|---|
//! | `OPENHEDGEHOG_PROFILE` | the profile name |
//! | `OPENHEDGEHOG_STATE_DIR` | `~/.openhedgehog-<profile>` (unsuffixed for `default`) |
//! | `OPENHEDGEHOG_CONFIG_PATH` | `<state dir>/openhedgehog.json` |
//! | `OPENHEDGEHOG_GATEWAY_PORT` | `19001` for `dev`, otherwise unset |
//!
//! Derivation is pure ([`resolve_profile_overlay`]). The overlay only carries
//! keys the environment does not already define, so explicit operator settings
//! always win. Writing it into the real process environment happens once, at
//! the process boundary, through [`EnvOverlay::export_to_process`].

use crate::{
    env_keys, CONFIG_FILENAME, DEFAULT_PROFILE, DEV_GATEWAY_PORT, DEV_PROFILE, STATE_DIR_NAME,
};
use oh_common::EnvMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

static RE_PROFILE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,63}$").unwrap());

/// Whether `name` is usable as a profile identifier.
pub fn is_valid_profile_name(name: &str) -> bool {
    RE_PROFILE_NAME.is_match(name)
}

/// Whether `name` is the default sentinel (case-insensitive).
pub fn is_default_profile(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case(DEFAULT_PROFILE)
}

/// Trim a raw profile value and drop it when unset, default, or invalid.
pub fn normalize_profile_name(raw: Option<&str>) -> Option<&str> {
    let profile = raw?.trim();
    if profile.is_empty() || is_default_profile(profile) || !is_valid_profile_name(profile) {
        return None;
    }
    Some(profile)
}

/// State directory name for a profile (`.openhedgehog` or `.openhedgehog-<profile>`).
pub fn profile_state_dir_name(profile: Option<&str>) -> String {
    match profile.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) if !is_default_profile(p) => format!("{}-{}", STATE_DIR_NAME, p),
        _ => STATE_DIR_NAME.to_string(),
    }
}

/// Fully resolved profile environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEnv {
    /// Profile name (trimmed).
    pub profile: String,
    /// Effective state directory. `None` when it would depend on an unknown
    /// home directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
    /// Effective config file path, under the same condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
    /// Gateway port, if the profile selects one or the environment set one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_port: Option<String>,
}

/// Derive the effective profile environment.
///
/// Values already defined in `env` take precedence over derived ones, so the
/// result describes what the process will observe after the overlay is
/// applied. Returns `None` for an empty profile.
///
/// Without a home directory no state directory or config path is derived;
/// a bare relative name would otherwise be resolved against whatever the
/// working directory happens to be.
pub fn derive_profile_env(profile: &str, env: &EnvMap, home: Option<&Path>) -> Option<ProfileEnv> {
    let profile = profile.trim();
    if profile.is_empty() {
        return None;
    }

    let state_dir = match env.get_defined(env_keys::STATE_DIR) {
        Some(explicit) => Some(PathBuf::from(explicit)),
        None => home.map(|home| home.join(profile_state_dir_name(Some(profile)))),
    };

    let config_path = match env.get_defined(env_keys::CONFIG_PATH) {
        Some(explicit) => Some(PathBuf::from(explicit)),
        None => state_dir.as_ref().map(|dir| dir.join(CONFIG_FILENAME)),
    };

    let gateway_port = match env.get_defined(env_keys::GATEWAY_PORT) {
        Some(explicit) => Some(explicit.to_string()),
        None if profile == DEV_PROFILE => Some(DEV_GATEWAY_PORT.to_string()),
        None => None,
    };

    Some(ProfileEnv {
        profile: env
            .get_defined(env_keys::PROFILE)
            .unwrap_or(profile)
            .to_string(),
        state_dir,
        config_path,
        gateway_port,
    })
}

/// Environment entries a profile contributes on top of an existing environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvOverlay {
    entries: Vec<(String, String)>,
}

impl EnvOverlay {
    /// Entries in application order.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Value the overlay carries for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply to an environment snapshot, skipping keys that became defined.
    ///
    /// Returns the keys that were written.
    pub fn apply_to(&self, env: &mut EnvMap) -> Vec<String> {
        let mut written = Vec::new();
        for (key, value) in &self.entries {
            if env.set_if_undefined(key, value.clone()) {
                written.push(key.clone());
            }
        }
        written
    }

    /// Write the overlay into the real process environment.
    ///
    /// Must run once, before any other component reads these keys. Keys that
    /// are already defined in the process environment are left alone.
    pub fn export_to_process(&self) -> Vec<String> {
        let mut written = Vec::new();
        for (key, value) in &self.entries {
            let defined = std::env::var(key)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false);
            if !defined {
                std::env::set_var(key, value);
                written.push(key.clone());
            }
        }
        debug!(keys = ?written, "exported profile overlay");
        written
    }
}

/// Compute the overlay for `profile` without touching `env`.
///
/// Only keys that `env` does not already define are included.
pub fn resolve_profile_overlay(profile: &str, env: &EnvMap, home: Option<&Path>) -> EnvOverlay {
    let Some(resolved) = derive_profile_env(profile, env, home) else {
        return EnvOverlay::default();
    };

    let candidates = [
        (env_keys::PROFILE, Some(resolved.profile.clone())),
        (
            env_keys::STATE_DIR,
            resolved
                .state_dir
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
        ),
        (
            env_keys::CONFIG_PATH,
            resolved
                .config_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
        ),
        (env_keys::GATEWAY_PORT, resolved.gateway_port.clone()),
    ];

    let entries = candidates
        .into_iter()
        .filter_map(|(key, value)| Some((key, value?)))
        .filter(|(key, _)| !env.is_defined(key))
        .map(|(key, value)| (key.to_string(), value))
        .collect();

    EnvOverlay { entries }
}

/// Fill profile defaults into `env` without overwriting defined values.
///
/// Returns the keys that were written.
pub fn apply_cli_profile_env(profile: &str, env: &mut EnvMap, home: Option<&Path>) -> Vec<String> {
    resolve_profile_overlay(profile, env, home).apply_to(env)
}
