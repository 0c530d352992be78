//! Profile-aware rendering of suggested commands.
//!
//! Hints such as "run `openhedgehog gateway stop`" must target the profile
//! the operator is using, otherwise copy-pasting them acts on the wrong state
//! directory.

use oh_common::{EnvMap, PROGRAM_NAME};
use oh_config::{env_keys, normalize_profile_name};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_CLI_PREFIX: Lazy<Regex> = Lazy::new(|| {
    let program = regex::escape(PROGRAM_NAME);
    Regex::new(&format!(
        r"^(?:(?:pnpm|npm|bunx|npx)\s+{program}\b|{program}\b)"
    ))
    .unwrap()
});
static RE_PROFILE_FLAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)--profile(?:\s|=|$)").unwrap());
static RE_DEV_FLAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)--dev(?:\s|$)").unwrap());

/// Insert `--profile <name>` after the program token when a non-default
/// profile is active.
///
/// Commands that do not start with the program (optionally behind a package
/// runner), or that already carry a profile flag, are returned unchanged.
pub fn format_cli_command(command: &str, env: &EnvMap) -> String {
    let Some(profile) = normalize_profile_name(env.get(env_keys::PROFILE)) else {
        return command.to_string();
    };
    let Some(prefix) = RE_CLI_PREFIX.find(command) else {
        return command.to_string();
    };
    if RE_PROFILE_FLAG.is_match(command) || RE_DEV_FLAG.is_match(command) {
        return command.to_string();
    }

    let (head, tail) = command.split_at(prefix.end());
    format!("{head} --profile {profile}{tail}")
}
