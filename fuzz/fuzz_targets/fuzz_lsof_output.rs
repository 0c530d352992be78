//! Fuzz target for `lsof -F` field output parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use oh_core::collect::parse_lsof_listeners;

fuzz_target!(|data: &[u8]| {
    let output = String::from_utf8_lossy(data);
    for listener in parse_lsof_listeners(&output) {
        let _ = listener.render();
    }
});
