//! Process command-line lookup.

use std::fs;
use std::path::Path;
use std::process::Command;

/// Join NUL-separated `/proc/<pid>/cmdline` content with spaces.
pub fn join_cmdline(raw: &[u8]) -> Option<String> {
    let joined = raw
        .split(|b| *b == 0)
        .filter(|part| !part.is_empty())
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join(" ");
    let joined = joined.trim();
    (!joined.is_empty()).then(|| joined.to_string())
}

pub fn read_proc_cmdline(proc_root: &Path, pid: u32) -> Option<String> {
    let raw = fs::read(proc_root.join(pid.to_string()).join("cmdline")).ok()?;
    join_cmdline(&raw)
}

pub fn read_proc_comm(proc_root: &Path, pid: u32) -> Option<String> {
    let comm = fs::read_to_string(proc_root.join(pid.to_string()).join("comm")).ok()?;
    let comm = comm.trim();
    (!comm.is_empty()).then(|| comm.to_string())
}

/// Full command line via `ps`, for platforms without `/proc`.
pub fn ps_command_line(pid: u32) -> Option<String> {
    let output = Command::new("ps")
        .args(["-p", &pid.to_string(), "-o", "command="])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.trim();
    (!line.is_empty()).then(|| line.to_string())
}
