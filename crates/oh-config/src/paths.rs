//! Gateway state directory resolution.
//!
//! Resolution order:
//! 1. `OPENHEDGEHOG_STATE_DIR` (with `~` expanded, made absolute; drive-letter
//!    paths are returned verbatim)
//! 2. Home directory + `.openhedgehog-<profile>` when a non-default profile is set
//! 3. Home directory + `.openhedgehog`
//! 4. Bare `.openhedgehog` when no home directory is known

use crate::profile::{is_default_profile, profile_state_dir_name};
use crate::{env_keys, CONFIG_FILENAME};
use oh_common::EnvMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

static RE_DRIVE_ABSOLUTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]:[\\/]").unwrap());

/// Where the state directory came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateDirSource {
    /// `OPENHEDGEHOG_STATE_DIR` was set.
    Environment,
    /// Home directory with a profile suffix.
    Profile,
    /// Home directory, unsuffixed.
    HomeDefault,
    /// No home directory available.
    #[default]
    BareDefault,
}

impl std::fmt::Display for StateDirSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateDirSource::Environment => write!(f, "environment variable"),
            StateDirSource::Profile => write!(f, "profile default"),
            StateDirSource::HomeDefault => write!(f, "home default"),
            StateDirSource::BareDefault => write!(f, "builtin default"),
        }
    }
}

/// Resolved state directory plus its source, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStateDir {
    pub path: PathBuf,
    pub source: StateDirSource,
}

/// Home directory from `HOME`, falling back to `USERPROFILE`.
pub fn resolve_home_dir(env: &EnvMap) -> Option<PathBuf> {
    env.get_defined(env_keys::HOME)
        .or_else(|| env.get_defined(env_keys::USERPROFILE))
        .map(PathBuf::from)
}

/// Resolve the gateway state directory.
pub fn resolve_gateway_state_dir(env: &EnvMap) -> PathBuf {
    resolve_gateway_state_dir_with_source(env).path
}

/// Resolve the gateway state directory and report which rule produced it.
pub fn resolve_gateway_state_dir_with_source(env: &EnvMap) -> ResolvedStateDir {
    if let Some(explicit) = env.get_defined(env_keys::STATE_DIR) {
        return ResolvedStateDir {
            path: resolve_user_path(explicit, resolve_home_dir(env).as_deref()),
            source: StateDirSource::Environment,
        };
    }

    let profile = env
        .get_defined(env_keys::PROFILE)
        .filter(|p| !is_default_profile(p));
    let name = profile_state_dir_name(profile);

    match resolve_home_dir(env) {
        Some(home) => ResolvedStateDir {
            path: home.join(name),
            source: if profile.is_some() {
                StateDirSource::Profile
            } else {
                StateDirSource::HomeDefault
            },
        },
        None => ResolvedStateDir {
            path: PathBuf::from(crate::STATE_DIR_NAME),
            source: StateDirSource::BareDefault,
        },
    }
}

/// Config file path: `OPENHEDGEHOG_CONFIG_PATH` or `<state dir>/openhedgehog.json`.
pub fn resolve_config_path(env: &EnvMap) -> PathBuf {
    match env.get_defined(env_keys::CONFIG_PATH) {
        Some(explicit) => resolve_user_path(explicit, resolve_home_dir(env).as_deref()),
        None => resolve_gateway_state_dir(env).join(CONFIG_FILENAME),
    }
}

/// Gateway port from `OPENHEDGEHOG_GATEWAY_PORT`, if set to a valid non-zero port.
pub fn resolve_gateway_port(env: &EnvMap) -> Option<u16> {
    env.get_defined(env_keys::GATEWAY_PORT)?
        .parse::<u16>()
        .ok()
        .filter(|p| *p > 0)
}

/// Expand a leading `~` and make the path absolute.
///
/// Drive-letter paths (`C:\...`) are returned unchanged on every platform.
/// A `~` path with no known home directory is returned as given.
fn resolve_user_path(input: &str, home: Option<&Path>) -> PathBuf {
    if RE_DRIVE_ABSOLUTE.is_match(input) {
        return PathBuf::from(input);
    }

    let expanded = match expand_tilde(input, home) {
        Some(p) => p,
        None => return PathBuf::from(input),
    };

    if expanded.is_absolute() {
        return normalize_lexically(&expanded);
    }
    match std::env::current_dir() {
        Ok(cwd) => normalize_lexically(&cwd.join(expanded)),
        Err(_) => expanded,
    }
}

/// Returns `None` when the input needs a home directory that is unknown.
fn expand_tilde(input: &str, home: Option<&Path>) -> Option<PathBuf> {
    let Some(rest) = input.strip_prefix('~') else {
        return Some(PathBuf::from(input));
    };
    // `~user` is not expanded.
    if !(rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\')) {
        return Some(PathBuf::from(input));
    }
    let home = home?;
    let rest = rest.trim_start_matches(['/', '\\']);
    if rest.is_empty() {
        Some(home.to_path_buf())
    } else {
        Some(home.join(rest))
    }
}

/// Collapse `.` and `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uses_default_state_dir_without_overrides() {
        let env = EnvMap::from([("HOME", "/Users/test")]);
        assert_eq!(
            resolve_gateway_state_dir(&env),
            Path::new("/Users/test").join(".openhedgehog")
        );
    }

    #[test]
    fn test_appends_profile_suffix() {
        let env = EnvMap::from([("HOME", "/Users/test"), (env_keys::PROFILE, "rescue")]);
        let resolved = resolve_gateway_state_dir_with_source(&env);
        assert_eq!(
            resolved.path,
            Path::new("/Users/test").join(".openhedgehog-rescue")
        );
        assert_eq!(resolved.source, StateDirSource::Profile);
    }

    #[test]
    fn test_default_profile_is_case_insensitive() {
        for profile in ["default", "Default", "DEFAULT"] {
            let env = EnvMap::from([("HOME", "/Users/test"), (env_keys::PROFILE, profile)]);
            let resolved = resolve_gateway_state_dir_with_source(&env);
            assert_eq!(resolved.path, Path::new("/Users/test").join(".openhedgehog"));
            assert_eq!(resolved.source, StateDirSource::HomeDefault);
        }
    }

    #[test]
    fn test_uses_explicit_state_dir() {
        let env = EnvMap::from([
            ("HOME", "/Users/test"),
            (env_keys::STATE_DIR, "/var/lib/openhedgehog"),
        ]);
        let resolved = resolve_gateway_state_dir_with_source(&env);
        assert_eq!(resolved.path, PathBuf::from("/var/lib/openhedgehog"));
        assert_eq!(resolved.source, StateDirSource::Environment);
    }

    #[test]
    fn test_expands_tilde_in_state_dir() {
        let env = EnvMap::from([
            ("HOME", "/Users/test"),
            (env_keys::STATE_DIR, "~/openhedgehog-state"),
        ]);
        assert_eq!(
            resolve_gateway_state_dir(&env),
            PathBuf::from("/Users/test/openhedgehog-state")
        );
    }

    #[test]
    fn test_bare_tilde_is_home() {
        let env = EnvMap::from([("HOME", "/Users/test"), (env_keys::STATE_DIR, "~")]);
        assert_eq!(resolve_gateway_state_dir(&env), PathBuf::from("/Users/test"));
    }

    #[test]
    fn test_preserves_windows_absolute_paths_without_home() {
        let env = EnvMap::from([(env_keys::STATE_DIR, "C:\\State\\openhedgehog")]);
        assert_eq!(
            resolve_gateway_state_dir(&env),
            PathBuf::from("C:\\State\\openhedgehog")
        );
    }

    #[test]
    fn test_userprofile_fallback() {
        let env = EnvMap::from([("USERPROFILE", "/profiles/me")]);
        assert_eq!(
            resolve_gateway_state_dir(&env),
            Path::new("/profiles/me").join(".openhedgehog")
        );
    }

    #[test]
    fn test_bare_default_without_home() {
        let env = EnvMap::from([(env_keys::PROFILE, "work")]);
        let resolved = resolve_gateway_state_dir_with_source(&env);
        assert_eq!(resolved.path, PathBuf::from(".openhedgehog"));
        assert_eq!(resolved.source, StateDirSource::BareDefault);
    }

    #[test]
    fn test_relative_override_becomes_absolute() {
        let env = EnvMap::from([(env_keys::STATE_DIR, "./state/../state")]);
        let resolved = resolve_gateway_state_dir(&env);
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("state"));
    }

    #[test]
    fn test_config_path_follows_state_dir() {
        let env = EnvMap::from([("HOME", "/Users/test"), (env_keys::PROFILE, "work")]);
        assert_eq!(
            resolve_config_path(&env),
            Path::new("/Users/test")
                .join(".openhedgehog-work")
                .join("openhedgehog.json")
        );
    }

    #[test]
    fn test_gateway_port_parsing() {
        assert_eq!(
            resolve_gateway_port(&EnvMap::from([(env_keys::GATEWAY_PORT, "19001")])),
            Some(19001)
        );
        assert_eq!(
            resolve_gateway_port(&EnvMap::from([(env_keys::GATEWAY_PORT, "0")])),
            None
        );
        assert_eq!(
            resolve_gateway_port(&EnvMap::from([(env_keys::GATEWAY_PORT, "nope")])),
            None
        );
    }

    #[test]
    fn test_state_dir_source_display() {
        assert_eq!(StateDirSource::Environment.to_string(), "environment variable");
        assert_eq!(StateDirSource::BareDefault.to_string(), "builtin default");
    }
}
