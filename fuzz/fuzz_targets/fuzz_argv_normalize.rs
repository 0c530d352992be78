//! Fuzz target for argv normalization and flag inspection.
//!
//! Every invocation shape must normalize to at least the host/program prefix
//! and the inspectors must never index past the end.

#![no_main]

use libfuzzer_sys::fuzz_target;
use oh_core::cli::{
    build_parse_argv, get_command_path, get_flag_value, get_positive_int_flag_value,
    has_help_or_version,
};

fuzz_target!(|raw: Vec<String>| {
    let (argv, _rule) = build_parse_argv("openhedgehog", Some(&raw), &[]);
    assert!(argv.len() >= 2);

    let argv = argv.as_slice();
    let _ = has_help_or_version(argv);
    let _ = get_flag_value(argv, "--port");
    let _ = get_positive_int_flag_value(argv, "--limit");
    assert!(get_command_path(argv, 2).len() <= 2);
});
