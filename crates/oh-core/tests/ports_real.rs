//! Port probing against real sockets.
//!
//! Each test holds its own listener on an ephemeral port, so nothing here
//! depends on what else is running on the machine.

use assert_cmd::Command;
use oh_core::collect::{IntrospectionError, ListenerSource};
use oh_core::ports::{
    ensure_port_available, handle_port_error_with, inspect_port_usage_with, is_port_free,
    PortListener, PortStatus, Runtime,
};
use predicates::prelude::*;
use std::net::TcpListener;

/// Hold an IPv4 wildcard listener on a kernel-assigned port.
fn hold_port() -> (TcpListener, u16) {
    let listener = TcpListener::bind("0.0.0.0:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    (listener, port)
}

#[derive(Default)]
struct CapturingRuntime {
    logs: Vec<String>,
    errors: Vec<String>,
    exit_code: Option<i32>,
}

impl Runtime for CapturingRuntime {
    fn log(&mut self, message: &str) {
        self.logs.push(message.to_string());
    }

    fn error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn exit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }
}

struct FixedSource(Result<Vec<PortListener>, IntrospectionError>);

impl ListenerSource for FixedSource {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn listeners(&self, _port: u16) -> Result<Vec<PortListener>, IntrospectionError> {
        self.0.clone()
    }
}

#[test]
fn held_port_is_reported_in_use() {
    let (_guard, port) = hold_port();

    let err = ensure_port_available(port).expect_err("port is held");
    assert!(err.is_addr_in_use());
    assert_eq!(err.port(), port);
    assert!(!is_port_free(port));
}

#[test]
fn released_port_is_available_again() {
    let (guard, port) = hold_port();
    drop(guard);

    // Another process could grab the port in between; only assert when the
    // probe itself did not race.
    if let Err(err) = ensure_port_available(port) {
        assert!(err.is_addr_in_use(), "unexpected bind error: {err}");
    }
}

#[test]
fn handle_port_error_reports_gateway_listener_and_exits() {
    let (_guard, port) = hold_port();
    let err = ensure_port_available(port).expect_err("port is held");

    let gateway = PortListener::new(Some(4242), "openhedgehog gateway run");
    let source = FixedSource(Ok(vec![gateway]));
    let mut runtime = CapturingRuntime::default();

    handle_port_error_with(err, port, "Gateway start", &mut runtime, &source)
        .expect("address-in-use is handled");

    assert_eq!(runtime.exit_code, Some(1));
    assert!(runtime.logs.is_empty());
    let text = runtime.errors.join("\n");
    assert!(text.contains(&format!("Gateway start failed: port {port} is already in use.")));
    assert!(text.contains("pid 4242"));
    assert!(text.contains("Another openhedgehog instance appears to be running"));
}

#[test]
fn handle_port_error_survives_failed_lookup() {
    let (_guard, port) = hold_port();
    let err = ensure_port_available(port).expect_err("port is held");

    let source = FixedSource(Err(IntrospectionError::PermissionDenied {
        detail: "/proc/net/tcp".to_string(),
    }));
    let mut runtime = CapturingRuntime::default();

    handle_port_error_with(err, port, "Gateway start", &mut runtime, &source)
        .expect("address-in-use is handled");

    assert_eq!(runtime.exit_code, Some(1));
    let text = runtime.errors.join("\n");
    assert!(text.contains("listener lookup failed: permission denied"));
}

#[test]
fn inspect_reports_busy_with_listener_details() {
    let (_guard, port) = hold_port();
    let source = FixedSource(Ok(vec![
        PortListener::new(Some(10), "ssh -N -L 18789:127.0.0.1:18789 host"),
        PortListener::new(Some(11), "python3 -m http.server"),
    ]));

    let report = inspect_port_usage_with(port, &source).expect("probe succeeds");
    assert_eq!(report.status, PortStatus::Busy);
    assert_eq!(report.listeners.len(), 2);
    assert!(report.hints.len() >= 2);
    assert!(report.errors.is_empty());
}

// ============================================================================
// Binary
// ============================================================================

fn openhedgehog() -> Command {
    let mut cmd = Command::cargo_bin("openhedgehog").expect("openhedgehog binary should exist");
    cmd.env_remove("OPENHEDGEHOG_PROFILE")
        .env_remove("OPENHEDGEHOG_GATEWAY_PORT");
    cmd
}

#[test]
fn preflight_exits_one_when_port_held() {
    let (_guard, port) = hold_port();

    openhedgehog()
        .args(["preflight", "--port", &port.to_string()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(format!(
            "Gateway start failed: port {port} is already in use."
        )));
}

#[test]
fn ports_command_describes_held_port() {
    let (_guard, port) = hold_port();

    openhedgehog()
        .args(["ports", &port.to_string()])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(format!("Port {port} is already in use.")));
}

#[test]
fn ports_command_json_marks_busy() {
    let (_guard, port) = hold_port();

    let output = openhedgehog()
        .args(["ports", &port.to_string(), "--format", "json"])
        .output()
        .expect("run openhedgehog");
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON report");
    assert_eq!(json["port"], port);
    assert_eq!(json["status"], "busy");
    assert!(json["hints"].as_array().is_some_and(|h| !h.is_empty()));
}
