//! Read-only queries over a normalized argument list.
//!
//! Every query skips the `[host, program]` prefix and stops at the `--`
//! terminator. Nothing here mutates its input or fails; malformed input yields
//! "absent" or "missing" answers.

use crate::cli::normalize::ARGV_PREFIX_LEN;
use once_cell::sync::Lazy;
use regex::Regex;

const HELP_FLAGS: &[&str] = &["-h", "--help"];
const VERSION_FLAGS: &[&str] = &["-v", "-V", "--version"];

/// Everything after this token is opaque to flag parsing.
pub const FLAG_TERMINATOR: &str = "--";

static RE_NEGATIVE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-\d+(?:\.\d+)?$").unwrap());

/// Result of looking up a value-bearing flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagValue<'a> {
    /// Flag not present before the terminator.
    Absent,
    /// Flag present without a usable value (`--name=`, or followed by a flag).
    Missing,
    /// Flag present with a value.
    Value(&'a str),
}

impl<'a> FlagValue<'a> {
    pub fn value(&self) -> Option<&'a str> {
        match self {
            FlagValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, FlagValue::Absent)
    }
}

/// Result of looking up a flag that must carry a positive integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositiveIntFlag {
    Absent,
    Missing,
    /// Present, but not a positive integer.
    Invalid(String),
    Value(u32),
}

impl PositiveIntFlag {
    pub fn value(&self) -> Option<u32> {
        match self {
            PositiveIntFlag::Value(v) => Some(*v),
            _ => None,
        }
    }
}

/// Options for [`get_verbose_flag`].
#[derive(Debug, Clone, Copy, Default)]
pub struct VerboseFlagOptions {
    /// Also treat `--debug` as a verbose request.
    pub include_debug: bool,
}

/// Arguments after the prefix and before the terminator.
fn flag_region<S: AsRef<str>>(argv: &[S]) -> impl Iterator<Item = &str> {
    argv.iter()
        .skip(ARGV_PREFIX_LEN)
        .map(|arg| arg.as_ref())
        .take_while(|arg| *arg != FLAG_TERMINATOR)
}

/// A token that can be consumed as a flag value.
///
/// Negative numbers count as values; other dash-prefixed tokens do not.
pub fn is_value_token(arg: Option<&str>) -> bool {
    match arg {
        None => false,
        Some(FLAG_TERMINATOR) => false,
        Some(a) => !a.starts_with('-') || RE_NEGATIVE_NUMBER.is_match(a),
    }
}

/// Whether any help or version flag appears among the user arguments.
///
/// Unlike the other queries this one looks past `--`.
pub fn has_help_or_version<S: AsRef<str>>(argv: &[S]) -> bool {
    argv.iter()
        .skip(ARGV_PREFIX_LEN)
        .map(|arg| arg.as_ref())
        .any(|arg| HELP_FLAGS.contains(&arg) || VERSION_FLAGS.contains(&arg))
}

/// Whether `name` appears exactly before the terminator.
pub fn has_flag<S: AsRef<str>>(argv: &[S], name: &str) -> bool {
    flag_region(argv).any(|arg| arg == name)
}

/// Look up `--name value` or `--name=value`.
pub fn get_flag_value<'a, S: AsRef<str>>(argv: &'a [S], name: &str) -> FlagValue<'a> {
    let args: Vec<&'a str> = flag_region(argv).collect();
    let inline_prefix = format!("{}=", name);

    for (i, arg) in args.iter().enumerate() {
        if *arg == name {
            let next = args.get(i + 1).copied();
            return match next {
                Some(value) if is_value_token(Some(value)) => FlagValue::Value(value),
                _ => FlagValue::Missing,
            };
        }
        if let Some(value) = arg.strip_prefix(&inline_prefix) {
            return if value.is_empty() {
                FlagValue::Missing
            } else {
                FlagValue::Value(value)
            };
        }
    }
    FlagValue::Absent
}

/// `--verbose`, plus `--debug` when asked.
pub fn get_verbose_flag<S: AsRef<str>>(argv: &[S], options: VerboseFlagOptions) -> bool {
    has_flag(argv, "--verbose") || (options.include_debug && has_flag(argv, "--debug"))
}

/// Look up a flag that must be a positive integer.
pub fn get_positive_int_flag_value<S: AsRef<str>>(argv: &[S], name: &str) -> PositiveIntFlag {
    match get_flag_value(argv, name) {
        FlagValue::Absent => PositiveIntFlag::Absent,
        FlagValue::Missing => PositiveIntFlag::Missing,
        FlagValue::Value(raw) => match raw.trim().parse::<u32>() {
            Ok(n) if n > 0 => PositiveIntFlag::Value(n),
            _ => PositiveIntFlag::Invalid(raw.to_string()),
        },
    }
}

/// Leading non-flag tokens after the prefix, at most `depth` of them.
///
/// Collection stops at the first flag or the terminator.
pub fn get_command_path<S: AsRef<str>>(argv: &[S], depth: usize) -> Vec<String> {
    flag_region(argv)
        .take_while(|arg| !arg.starts_with('-'))
        .take(depth)
        .map(str::to_string)
        .collect()
}

/// First command token, if any.
pub fn get_primary_command<S: AsRef<str>>(argv: &[S]) -> Option<String> {
    get_command_path(argv, 1).into_iter().next()
}

/// Whether a command path may touch legacy on-disk state.
///
/// Read-only diagnostics skip migration; everything else, including a bare
/// invocation, is gated.
pub fn needs_state_migration_for_path(path: &[String]) -> bool {
    match path {
        [] => true,
        [primary, ..] if matches!(primary.as_str(), "health" | "status" | "sessions") => false,
        [first, second, ..] if first == "memory" && second == "status" => false,
        [primary, ..] if primary == "agent" => false,
        _ => true,
    }
}

/// Whether the invocation may touch legacy on-disk state.
pub fn needs_state_migration<S: AsRef<str>>(argv: &[S]) -> bool {
    needs_state_migration_for_path(&get_command_path(argv, 2))
}
