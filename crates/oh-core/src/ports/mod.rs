//! Port availability and conflict diagnosis.
//!
//! [`ensure_port_available`] probes a port before the daemon binds it. When
//! the probe fails with "address in use", [`handle_port_error`] looks up who
//! holds the port, explains it to the operator and exits with status 1. Every
//! other failure is handed back unchanged.

pub mod classify;
pub mod diagnostics;
pub mod probe;
pub mod runtime;

pub use classify::{
    classify_port_listener, CommandLineClassifier, ListenerClassifier, ListenerKind,
};
pub use diagnostics::{
    build_port_hints, format_port_diagnostics, generic_port_hint, PortDiagnosticsReport,
    PortListener, PortStatus,
};
pub use probe::{ensure_port_available, is_port_free, PortError};
#[cfg(any(test, feature = "test-utils"))]
pub use runtime::RecordingRuntime;
pub use runtime::{ProcessRuntime, Runtime};

use crate::collect::{ListenerSource, SystemListenerSource};
use crate::logging::event_names;
use oh_common::PROGRAM_NAME;
use tracing::{info, warn};

/// Exit status used when the port is taken.
pub const PORT_IN_USE_EXIT: i32 = 1;

/// Build a busy report from whatever `source` can see.
///
/// Introspection failures end up in `errors` and never propagate.
pub fn describe_busy_port(port: u16, source: &dyn ListenerSource) -> PortDiagnosticsReport {
    let (listeners, errors) = match source.listeners(port) {
        Ok(listeners) => (listeners, Vec::new()),
        Err(err) => {
            warn!(
                event = event_names::PORT_INTROSPECTION_FAILED,
                port,
                source = source.name(),
                error = %err,
                "listener lookup failed"
            );
            (Vec::new(), vec![err.to_string()])
        }
    };

    let mut hints = build_port_hints(&listeners, port);
    if listeners.is_empty() {
        hints.push(generic_port_hint());
    } else if listeners.len() > 1 {
        hints.push(diagnostics::multiple_listeners_hint());
    }

    PortDiagnosticsReport {
        port,
        status: PortStatus::Busy,
        listeners,
        hints,
        errors,
    }
}

/// Probe `port` and describe its holders when busy.
pub fn inspect_port_usage_with(
    port: u16,
    source: &dyn ListenerSource,
) -> Result<PortDiagnosticsReport, PortError> {
    match ensure_port_available(port) {
        Ok(()) => Ok(PortDiagnosticsReport::free(port)),
        Err(err) if err.is_addr_in_use() => Ok(describe_busy_port(port, source)),
        Err(err) => Err(err),
    }
}

/// [`inspect_port_usage_with`] using the platform listener source.
pub fn inspect_port_usage(port: u16) -> Result<PortDiagnosticsReport, PortError> {
    inspect_port_usage_with(port, &SystemListenerSource::default())
}

/// Turn an address-in-use failure into operator diagnostics and exit 1.
///
/// Any other error is returned unchanged for the caller to handle.
pub fn handle_port_error_with(
    err: PortError,
    port: u16,
    context: &str,
    runtime: &mut dyn Runtime,
    source: &dyn ListenerSource,
) -> Result<(), PortError> {
    if !err.is_addr_in_use() {
        return Err(err);
    }

    let report = describe_busy_port(port, source);
    info!(
        event = event_names::PORT_IN_USE,
        port,
        context,
        listeners = report.listeners.len(),
        "port conflict"
    );

    runtime.error(&format!("{context} failed: port {port} is already in use."));
    for line in format_port_diagnostics(&report) {
        runtime.error(&line);
    }
    if report.has_gateway_self() {
        runtime.error(&format!(
            "Another {PROGRAM_NAME} instance appears to be running on this port."
        ));
    }
    runtime.error("Resolve by stopping the process using the port or passing --port <free-port>.");
    runtime.exit(PORT_IN_USE_EXIT);
    Ok(())
}

/// [`handle_port_error_with`] using the platform listener source.
pub fn handle_port_error(
    err: PortError,
    port: u16,
    context: &str,
    runtime: &mut dyn Runtime,
) -> Result<(), PortError> {
    handle_port_error_with(err, port, context, runtime, &SystemListenerSource::default())
}
