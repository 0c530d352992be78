//! Bind-and-release port probe.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, TcpListener};
use thiserror::Error;
use tracing::debug;

use crate::logging::event_names;

/// Failure to claim a port.
#[derive(Debug, Error)]
pub enum PortError {
    /// Another listener holds the port.
    #[error("port {port} is already in use")]
    InUse { port: u16 },

    /// Any other bind failure, passed through untouched.
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },
}

impl PortError {
    pub fn port(&self) -> u16 {
        match self {
            PortError::InUse { port } | PortError::Bind { port, .. } => *port,
        }
    }

    /// Whether this failure means "address already in use".
    pub fn is_addr_in_use(&self) -> bool {
        match self {
            PortError::InUse { .. } => true,
            PortError::Bind { source, .. } => source.kind() == io::ErrorKind::AddrInUse,
        }
    }
}

impl From<PortError> for oh_common::Error {
    fn from(err: PortError) -> Self {
        match err {
            PortError::InUse { port } => oh_common::Error::PortInUse { port },
            PortError::Bind { source, .. } => oh_common::Error::Io(source),
        }
    }
}

fn classify_bind_error(port: u16, err: io::Error) -> PortError {
    if err.kind() == io::ErrorKind::AddrInUse {
        PortError::InUse { port }
    } else {
        PortError::Bind { port, source: err }
    }
}

/// Check that `port` can be bound on all local interfaces.
///
/// The probe listener is closed before returning, so a successful check is
/// advisory: another process may claim the port before the real bind.
pub fn ensure_port_available(port: u16) -> Result<(), PortError> {
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
        .map_err(|err| classify_bind_error(port, err))?;
    let bound = listener.local_addr().map(|a| a.port()).unwrap_or(port);
    drop(listener);

    // Hosts without IPv6 fail here for unrelated reasons; only a conflict counts.
    match TcpListener::bind((Ipv6Addr::UNSPECIFIED, bound)) {
        Ok(listener) => drop(listener),
        Err(err) if err.kind() == io::ErrorKind::AddrInUse => {
            debug!(event = event_names::PORT_PROBE, port, family = "ipv6", "port in use");
            return Err(PortError::InUse { port });
        }
        Err(err) => {
            debug!(event = event_names::PORT_PROBE, port, error = %err, "ipv6 probe skipped");
        }
    }

    debug!(event = event_names::PORT_PROBE, port, "port available");
    Ok(())
}

/// Whether `port` is free right now.
pub fn is_port_free(port: u16) -> bool {
    ensure_port_available(port).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held_listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[test]
    fn test_busy_port_reports_in_use() {
        let (_guard, port) = held_listener();
        let err = ensure_port_available(port).unwrap_err();
        assert!(err.is_addr_in_use());
        assert_eq!(err.port(), port);
        assert!(matches!(err, PortError::InUse { .. }));
    }

    #[test]
    fn test_released_port_is_available_again() {
        let (guard, port) = held_listener();
        drop(guard);
        assert!(ensure_port_available(port).is_ok());
        // The probe itself released the port.
        assert!(ensure_port_available(port).is_ok());
    }

    #[test]
    fn test_bind_error_passthrough() {
        let err = classify_bind_error(
            80,
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_addr_in_use());
        assert_eq!(err.port(), 80);
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_raw_addr_in_use_bind_error_counts() {
        let err = PortError::Bind {
            port: 1,
            source: io::Error::from(io::ErrorKind::AddrInUse),
        };
        assert!(err.is_addr_in_use());
    }

    #[test]
    fn test_converts_to_common_error() {
        let err: oh_common::Error = PortError::InUse { port: 18789 }.into();
        assert_eq!(err.code(), 20);
    }
}
