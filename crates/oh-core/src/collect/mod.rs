//! Listener lookup against the operating system.
//!
//! Answers "which processes are listening on TCP port N". Two sources exist:
//! the Linux `/proc` socket tables and `lsof`. Lookups are read-only and best
//! effort; callers treat any error as "no listener details".

pub mod cmdline;
pub mod lsof;
pub mod network;

pub use lsof::{parse_lsof_listeners, LsofSource};
pub use network::{parse_proc_net_tcp_content, ProcNetSource, TcpSocket, TcpState};

use crate::ports::PortListener;
use thiserror::Error;
use tracing::debug;

/// Errors from listener lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntrospectionError {
    #[error("listener lookup unavailable: {detail}")]
    Unavailable { detail: String },

    #[error("permission denied: {detail}")]
    PermissionDenied { detail: String },

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },
}

impl From<IntrospectionError> for oh_common::Error {
    fn from(err: IntrospectionError) -> Self {
        oh_common::Error::Introspection(err.to_string())
    }
}

/// Something that can enumerate listeners on a port.
pub trait ListenerSource {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn listeners(&self, port: u16) -> Result<Vec<PortListener>, IntrospectionError>;
}

/// Picks `/proc` when present and falls back to `lsof`.
#[derive(Debug, Clone, Default)]
pub struct SystemListenerSource {
    proc_net: ProcNetSource,
    lsof: LsofSource,
}

impl ListenerSource for SystemListenerSource {
    fn name(&self) -> &'static str {
        "system"
    }

    fn listeners(&self, port: u16) -> Result<Vec<PortListener>, IntrospectionError> {
        if self.proc_net.is_available() {
            match self.proc_net.listeners(port) {
                // Unattributed sockets usually mean other users' processes;
                // lsof may have better visibility.
                Ok(found) if found.iter().all(|l| l.pid.is_none()) && !found.is_empty() => {
                    if let Ok(better) = self.lsof.listeners(port) {
                        if !better.is_empty() {
                            return Ok(better);
                        }
                    }
                    return Ok(found);
                }
                Ok(found) => return Ok(found),
                Err(err) => {
                    debug!(source = self.proc_net.name(), error = %err, "falling back to lsof");
                }
            }
        }
        self.lsof.listeners(port)
    }
}

/// Fixed answers, for tests.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone)]
pub struct StaticListenerSource {
    result: Result<Vec<PortListener>, IntrospectionError>,
}

#[cfg(any(test, feature = "test-utils"))]
impl StaticListenerSource {
    pub fn new(listeners: Vec<PortListener>) -> Self {
        StaticListenerSource {
            result: Ok(listeners),
        }
    }

    pub fn failing(err: IntrospectionError) -> Self {
        StaticListenerSource { result: Err(err) }
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl ListenerSource for StaticListenerSource {
    fn name(&self) -> &'static str {
        "static"
    }

    fn listeners(&self, _port: u16) -> Result<Vec<PortListener>, IntrospectionError> {
        self.result.clone()
    }
}
