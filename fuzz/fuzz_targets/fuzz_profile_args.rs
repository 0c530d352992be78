//! Fuzz target for global profile flag parsing and command rendering.

#![no_main]

use libfuzzer_sys::fuzz_target;
use oh_common::EnvMap;
use oh_core::cli::{format_cli_command, parse_cli_profile_args};

fuzz_target!(|input: (Vec<String>, String)| {
    let (args, command) = input;
    let mut argv = vec!["node".to_string(), "openhedgehog".to_string()];
    argv.extend(args);

    if let Ok(parsed) = parse_cli_profile_args(&argv) {
        // Stripping only removes tokens.
        assert!(parsed.argv.len() <= argv.len());

        if let Some(profile) = parsed.profile {
            let env = EnvMap::from([("OPENHEDGEHOG_PROFILE", profile.as_str())]);
            let once = format_cli_command(&command, &env);
            assert_eq!(format_cli_command(&once, &env), once);
        }
    }
});
