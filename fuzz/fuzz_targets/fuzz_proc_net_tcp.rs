//! Fuzz target for /proc/net/tcp parsing.
//!
//! Tests that socket table parsing handles arbitrary input without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use oh_core::collect::parse_proc_net_tcp_content;

fuzz_target!(|data: &[u8]| {
    let content = String::from_utf8_lossy(data);

    // Test IPv4 parsing
    let _ = parse_proc_net_tcp_content(&content, false);

    // Test IPv6 parsing
    let _ = parse_proc_net_tcp_content(&content, true);
});
