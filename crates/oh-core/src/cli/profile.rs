//! Global `--dev` / `--profile` extraction.
//!
//! Only tokens before the first command token are treated as global flags, so
//! `openhedgehog gateway --dev` keeps its subcommand-local meaning. Matched
//! tokens are removed; everything else, including unknown flags, keeps its
//! order.

use crate::cli::normalize::ARGV_PREFIX_LEN;
use crate::cli::argv::FLAG_TERMINATOR;
use oh_common::{Error, Result};
use oh_config::{is_valid_profile_name, DEV_PROFILE};

/// Arguments with global profile flags removed, plus the selected profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileArgs {
    pub argv: Vec<String>,
    pub profile: Option<String>,
}

fn validated(value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::MissingProfileValue);
    }
    if !is_valid_profile_name(value) {
        return Err(Error::InvalidProfileName(value.to_string()));
    }
    Ok(value.to_string())
}

/// Strip global profile flags from a normalized argv.
///
/// Fails without side effects when both `--dev` and `--profile` are given,
/// when `--profile` has no value, or when the value is not a valid name.
pub fn parse_cli_profile_args<S: AsRef<str>>(argv: &[S]) -> Result<ProfileArgs> {
    let argv: Vec<&str> = argv.iter().map(|a| a.as_ref()).collect();
    if argv.len() < ARGV_PREFIX_LEN {
        return Ok(ProfileArgs {
            argv: argv.iter().map(|a| a.to_string()).collect(),
            profile: None,
        });
    }

    let mut out: Vec<String> = argv[..ARGV_PREFIX_LEN]
        .iter()
        .map(|a| a.to_string())
        .collect();
    let mut profile: Option<String> = None;
    let mut saw_dev = false;
    let mut saw_profile = false;
    let mut in_command = false;

    let args = &argv[ARGV_PREFIX_LEN..];
    let mut i = 0;
    while i < args.len() {
        let arg = args[i];
        i += 1;

        if in_command {
            out.push(arg.to_string());
            continue;
        }

        if arg == FLAG_TERMINATOR {
            in_command = true;
            out.push(arg.to_string());
            continue;
        }

        if arg == "--dev" {
            if saw_profile {
                return Err(Error::ConflictingProfileFlags);
            }
            saw_dev = true;
            profile = Some(DEV_PROFILE.to_string());
            continue;
        }

        if arg == "--profile" || arg.starts_with("--profile=") {
            if saw_dev {
                return Err(Error::ConflictingProfileFlags);
            }
            let value = match arg.strip_prefix("--profile=") {
                Some(inline) => inline,
                None => match args.get(i).copied() {
                    Some(next) if !next.starts_with('-') => {
                        i += 1;
                        next
                    }
                    _ => return Err(Error::MissingProfileValue),
                },
            };
            saw_profile = true;
            profile = Some(validated(value)?);
            continue;
        }

        if !arg.starts_with('-') {
            in_command = true;
        }
        out.push(arg.to_string());
    }

    Ok(ProfileArgs { argv: out, profile })
}
