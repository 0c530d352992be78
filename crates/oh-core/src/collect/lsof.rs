//! Listener lookup through `lsof`.
//!
//! Runs `lsof -nP -iTCP:<port> -sTCP:LISTEN -FpcLn`. Field output is one
//! field per line, keyed by its first character:
//!
//! ```text
//! p4242        process id (starts a new process set)
//! cnode        command name
//! Lpeter       login name
//! f23          file descriptor (ignored)
//! n*:18789     bound address
//! ```

use super::cmdline::ps_command_line;
use super::{IntrospectionError, ListenerSource};
use crate::ports::PortListener;
use oh_common::ProcessId;
use std::io;
use std::process::Command;

/// Parse `lsof -F` output into one listener per process.
///
/// The short command name stands in for the command line; callers may
/// replace it with a fuller one.
pub fn parse_lsof_listeners(output: &str) -> Vec<PortListener> {
    let mut listeners = Vec::new();
    let mut current: Option<PortListener> = None;

    for line in output.lines() {
        let mut chars = line.chars();
        let Some(key) = chars.next() else {
            continue;
        };
        let value = chars.as_str();

        match key {
            'p' => {
                // Flush previous process set
                if let Some(done) = current.take() {
                    listeners.push(done);
                }
                current = value.parse::<u32>().ok().map(|pid| PortListener {
                    pid: Some(ProcessId(pid)),
                    ..Default::default()
                });
            }
            'c' => {
                if let Some(l) = current.as_mut() {
                    l.command = Some(value.to_string());
                    if l.command_line.is_empty() {
                        l.command_line = value.to_string();
                    }
                }
            }
            'L' => {
                if let Some(l) = current.as_mut() {
                    l.user = Some(value.to_string());
                }
            }
            'n' => {
                if let Some(l) = current.as_mut() {
                    l.address.get_or_insert_with(|| value.to_string());
                }
            }
            _ => {}
        }
    }

    if let Some(done) = current {
        listeners.push(done);
    }
    listeners
}

/// `lsof`-backed listener source.
#[derive(Debug, Clone, Default)]
pub struct LsofSource;

impl ListenerSource for LsofSource {
    fn name(&self) -> &'static str {
        "lsof"
    }

    fn listeners(&self, port: u16) -> Result<Vec<PortListener>, IntrospectionError> {
        let output = Command::new("lsof")
            .args([
                "-nP",
                &format!("-iTCP:{port}"),
                "-sTCP:LISTEN",
                "-FpcLn",
            ])
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => IntrospectionError::Unavailable {
                    detail: "lsof not found".to_string(),
                },
                _ => IntrospectionError::ToolFailed {
                    tool: "lsof".to_string(),
                    message: e.to_string(),
                },
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() && stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("Permission denied") {
                return Err(IntrospectionError::PermissionDenied {
                    detail: stderr.trim().to_string(),
                });
            }
            // lsof exits 1 when nothing matched.
            return Ok(Vec::new());
        }

        let mut listeners = parse_lsof_listeners(&stdout);
        for listener in &mut listeners {
            if let Some(full) = listener.pid.and_then(|pid| ps_command_line(pid.0)) {
                listener.command_line = full;
            }
        }
        Ok(listeners)
    }
}
