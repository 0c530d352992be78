//! Startup pipeline.
//!
//! normalize argv → strip global profile flags → derive the profile overlay →
//! resolve the state directory, config path and gateway port.
//!
//! [`bootstrap`] is pure: it reads an environment snapshot and returns what
//! the process should look like. The only write to the real environment is
//! [`BootstrapContext::export_to_process`], called once by the binary before
//! anything else reads the profile keys.

use crate::cli::{
    build_parse_argv, get_command_path, needs_state_migration_for_path,
    parse_cli_profile_args, NormalizeRule,
};
use crate::logging::event_names;
use oh_common::{EnvMap, Result, PROGRAM_NAME};
use oh_config::{
    derive_profile_env, resolve_config_path, resolve_gateway_port,
    resolve_gateway_state_dir_with_source, resolve_home_dir, resolve_profile_overlay,
    env_keys, EnvOverlay, ProfileEnv, ResolvedStateDir, StateDirSource, DEFAULT_GATEWAY_PORT,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Command path depth considered by routing decisions.
const COMMAND_PATH_DEPTH: usize = 2;

/// Everything resolved before dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapContext {
    /// Normalization rule that shaped `argv`.
    pub rule: NormalizeRule,
    /// Normalized argv with global profile flags removed.
    pub argv: Vec<String>,
    pub command_path: Vec<String>,
    pub profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_env: Option<ProfileEnv>,
    /// Entries to write into the process environment.
    pub overlay: EnvOverlay,
    #[serde(skip)]
    pub env: EnvMap,
    pub state_dir: ResolvedStateDir,
    pub config_path: PathBuf,
    pub gateway_port: u16,
    pub needs_state_migration: bool,
}

impl BootstrapContext {
    /// Write the overlay into the real process environment.
    ///
    /// Returns the keys written.
    pub fn export_to_process(&self) -> Vec<String> {
        let written = self.overlay.export_to_process();
        debug!(event = event_names::ENV_APPLIED, keys = ?written, "profile environment exported");
        written
    }

    /// User arguments after the host/program prefix.
    pub fn user_args(&self) -> &[String] {
        self.argv.get(2..).unwrap_or_default()
    }
}

/// Resolve the startup context from a raw invocation and environment snapshot.
///
/// `home` is used for profile state directories; when `None` it is read from
/// `HOME`/`USERPROFILE` in `env`. Fails only on profile usage errors, before
/// anything is derived.
pub fn bootstrap(
    raw_args: Option<&[String]>,
    env: &EnvMap,
    home: Option<&Path>,
) -> Result<BootstrapContext> {
    let (normalized, rule) = build_parse_argv(PROGRAM_NAME, raw_args, &[]);
    debug!(
        event = event_names::ARGV_NORMALIZED,
        rule = %rule,
        argc = normalized.len(),
        "argv normalized"
    );

    let parsed = parse_cli_profile_args(normalized.as_slice())?;
    debug!(
        event = event_names::PROFILE_RESOLVED,
        profile = ?parsed.profile,
        "profile flags parsed"
    );

    let home = home
        .map(Path::to_path_buf)
        .or_else(|| resolve_home_dir(env));
    let (overlay, profile_env) = match parsed.profile.as_deref() {
        Some(profile) => (
            resolve_profile_overlay(profile, env, home.as_deref()),
            derive_profile_env(profile, env, home.as_deref()),
        ),
        None => (EnvOverlay::default(), None),
    };

    let mut effective = env.clone();
    overlay.apply_to(&mut effective);

    let mut state_dir = resolve_gateway_state_dir_with_source(&effective);
    // The overlay only carries keys the operator left unset.
    if overlay.get(env_keys::STATE_DIR).is_some() {
        state_dir.source = StateDirSource::Profile;
    }
    let config_path = resolve_config_path(&effective);
    let gateway_port = resolve_gateway_port(&effective).unwrap_or(DEFAULT_GATEWAY_PORT);
    debug!(
        event = event_names::STATE_DIR_RESOLVED,
        state_dir = %state_dir.path.display(),
        source = %state_dir.source,
        gateway_port,
        "state directory resolved"
    );

    let command_path = get_command_path(&parsed.argv, COMMAND_PATH_DEPTH);
    let needs_state_migration = needs_state_migration_for_path(&command_path);

    Ok(BootstrapContext {
        rule,
        argv: parsed.argv,
        command_path,
        profile: parsed.profile,
        profile_env,
        overlay,
        env: effective,
        state_dir,
        config_path,
        gateway_port,
        needs_state_migration,
    })
}
