//! Listening sockets from the Linux `/proc` tables.
//!
//! # Data Sources
//! - `/proc/net/tcp`, `/proc/net/tcp6` - Raw socket tables
//! - `/proc/[pid]/fd/` - Per-process socket mappings
//! - `/proc/[pid]/cmdline`, `/proc/[pid]/comm` - Owner command lines

use super::cmdline::{read_proc_cmdline, read_proc_comm};
use super::{IntrospectionError, ListenerSource};
use crate::ports::PortListener;
use oh_common::ProcessId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};

/// One row of `/proc/net/tcp{,6}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpSocket {
    pub local_addr: String,
    pub local_port: u16,
    pub state: TcpState,
    /// Socket inode number.
    pub inode: u64,
    pub is_ipv6: bool,
}

impl TcpSocket {
    /// `addr:port`, bracketing IPv6 addresses.
    pub fn local_endpoint(&self) -> String {
        if self.is_ipv6 {
            format!("[{}]:{}", self.local_addr, self.local_port)
        } else {
            format!("{}:{}", self.local_addr, self.local_port)
        }
    }
}

/// TCP connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TcpState {
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Listen,
    Closing,
    Unknown,
}

impl TcpState {
    /// Parse TCP state from /proc/net/tcp hex value.
    pub fn from_hex(hex: u8) -> Self {
        match hex {
            0x01 => TcpState::Established,
            0x02 => TcpState::SynSent,
            0x03 => TcpState::SynRecv,
            0x04 => TcpState::FinWait1,
            0x05 => TcpState::FinWait2,
            0x06 => TcpState::TimeWait,
            0x07 => TcpState::Close,
            0x08 => TcpState::CloseWait,
            0x09 => TcpState::LastAck,
            0x0A => TcpState::Listen,
            0x0B => TcpState::Closing,
            _ => TcpState::Unknown,
        }
    }

    pub fn is_listen(&self) -> bool {
        matches!(self, TcpState::Listen)
    }
}

/// Parse the body of `/proc/net/tcp` or `/proc/net/tcp6`.
///
/// Malformed rows are skipped.
pub fn parse_proc_net_tcp_content(content: &str, is_ipv6: bool) -> Vec<TcpSocket> {
    let mut sockets = Vec::new();

    // First line is the column header.
    for line in content.lines().skip(1) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 10 {
            continue;
        }

        // sl local_address rem_address st tx_queue:rx_queue tr:tm->when retrnsmt uid timeout inode
        let Some((local_addr, local_port)) = parse_addr_port(parts[1], is_ipv6) else {
            continue;
        };
        let state = u8::from_str_radix(parts[3], 16)
            .map(TcpState::from_hex)
            .unwrap_or(TcpState::Unknown);
        let inode = parts[9].parse().unwrap_or(0);

        sockets.push(TcpSocket {
            local_addr,
            local_port,
            state,
            inode,
            is_ipv6,
        });
    }

    sockets
}

fn parse_addr_port(addr_port: &str, is_ipv6: bool) -> Option<(String, u16)> {
    let (addr_hex, port_hex) = addr_port.split_once(':')?;
    let port = u16::from_str_radix(port_hex, 16).ok()?;
    let addr = if is_ipv6 {
        parse_ipv6_addr(addr_hex)?
    } else {
        parse_ipv4_addr(addr_hex)?
    };
    Some((addr, port))
}

fn parse_ipv4_addr(hex: &str) -> Option<String> {
    if hex.len() != 8 || !hex.is_ascii() {
        return None;
    }
    // Stored as one little-endian word.
    let word = u32::from_str_radix(hex, 16).ok()?;
    Some(Ipv4Addr::from(word.swap_bytes()).to_string())
}

fn parse_ipv6_addr(hex: &str) -> Option<String> {
    if hex.len() != 32 || !hex.is_ascii() {
        return None;
    }

    // Four 32-bit words, each little-endian.
    let mut segments = [0u16; 8];
    for i in 0..4 {
        let word = u32::from_str_radix(&hex[i * 8..(i + 1) * 8], 16)
            .ok()?
            .swap_bytes();
        segments[i * 2] = (word >> 16) as u16;
        segments[i * 2 + 1] = (word & 0xFFFF) as u16;
    }
    Some(Ipv6Addr::from(segments).to_string())
}

/// Parse `socket:[12345]` link targets.
pub fn parse_socket_link(target: &str) -> Option<u64> {
    target
        .strip_prefix("socket:[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}

fn process_socket_inodes(proc_root: &Path, pid: u32) -> Option<BTreeSet<u64>> {
    let entries = fs::read_dir(proc_root.join(pid.to_string()).join("fd")).ok()?;
    let inodes = entries
        .flatten()
        .filter_map(|entry| fs::read_link(entry.path()).ok())
        .filter_map(|target| parse_socket_link(&target.to_string_lossy()))
        .collect();
    Some(inodes)
}

/// Listener lookup through `/proc`.
#[derive(Debug, Clone)]
pub struct ProcNetSource {
    root: PathBuf,
}

impl Default for ProcNetSource {
    fn default() -> Self {
        ProcNetSource {
            root: PathBuf::from("/proc"),
        }
    }
}

impl ProcNetSource {
    /// Read from an alternate procfs mount.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        ProcNetSource { root: root.into() }
    }

    pub fn is_available(&self) -> bool {
        self.root.join("net").join("tcp").is_file()
    }

    /// LISTEN rows on `port` across both tables, deduplicated by inode.
    pub fn listening_sockets(&self, port: u16) -> Result<Vec<TcpSocket>, IntrospectionError> {
        let mut any_table = false;
        let mut sockets: Vec<TcpSocket> = Vec::new();

        for (table, is_ipv6) in [("tcp", false), ("tcp6", true)] {
            let path = self.root.join("net").join(table);
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            any_table = true;
            for socket in parse_proc_net_tcp_content(&content, is_ipv6) {
                if socket.state.is_listen()
                    && socket.local_port == port
                    && !sockets.iter().any(|s| s.inode == socket.inode)
                {
                    sockets.push(socket);
                }
            }
        }

        if !any_table {
            return Err(IntrospectionError::Unavailable {
                detail: format!("cannot read {}/net/tcp", self.root.display()),
            });
        }
        Ok(sockets)
    }

    /// Map socket inodes to the pids holding them.
    fn socket_owners(&self, wanted: &BTreeSet<u64>) -> BTreeMap<u64, Vec<u32>> {
        let mut owners: BTreeMap<u64, Vec<u32>> = BTreeMap::new();
        let Ok(entries) = fs::read_dir(&self.root) else {
            return owners;
        };

        let mut pids: Vec<u32> = entries
            .flatten()
            .filter_map(|e| e.file_name().to_str()?.parse().ok())
            .collect();
        pids.sort_unstable();

        for pid in pids {
            let Some(inodes) = process_socket_inodes(&self.root, pid) else {
                continue;
            };
            for inode in inodes.intersection(wanted) {
                owners.entry(*inode).or_default().push(pid);
            }
        }
        owners
    }
}

impl ListenerSource for ProcNetSource {
    fn name(&self) -> &'static str {
        "procfs"
    }

    fn listeners(&self, port: u16) -> Result<Vec<PortListener>, IntrospectionError> {
        let sockets = self.listening_sockets(port)?;
        if sockets.is_empty() {
            return Ok(Vec::new());
        }

        let wanted: BTreeSet<u64> = sockets.iter().map(|s| s.inode).collect();
        let owners = self.socket_owners(&wanted);

        let mut listeners: Vec<PortListener> = Vec::new();
        for socket in &sockets {
            let address = Some(socket.local_endpoint());
            let Some(pids) = owners.get(&socket.inode) else {
                listeners.push(PortListener {
                    address,
                    ..Default::default()
                });
                continue;
            };
            for &pid in pids {
                // A dual-stack process shows up once per table.
                if listeners.iter().any(|l| l.pid == Some(ProcessId(pid))) {
                    continue;
                }
                let command = read_proc_comm(&self.root, pid);
                let command_line = read_proc_cmdline(&self.root, pid)
                    .or_else(|| command.clone())
                    .unwrap_or_default();
                listeners.push(PortListener {
                    pid: Some(ProcessId(pid)),
                    command_line,
                    command,
                    user: None,
                    address: address.clone(),
                });
            }
        }

        // Unattributed rows are noise once any owner is known.
        if listeners.iter().any(|l| l.pid.is_some()) {
            listeners.retain(|l| l.pid.is_some());
        }
        Ok(listeners)
    }
}
