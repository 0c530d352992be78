//! Command-line bootstrap: normalization, inspection, profile flags and
//! command rendering.

pub mod argv;
pub mod command_format;
pub mod normalize;
pub mod profile;

pub use argv::{
    get_command_path, get_flag_value, get_positive_int_flag_value, get_primary_command,
    get_verbose_flag, has_flag, has_help_or_version, is_value_token, needs_state_migration,
    needs_state_migration_for_path, FlagValue, PositiveIntFlag, VerboseFlagOptions,
};
pub use command_format::format_cli_command;
pub use normalize::{build_parse_argv, classify_invocation, NormalizeRule, NormalizedArgv};
pub use profile::{parse_cli_profile_args, ProfileArgs};
