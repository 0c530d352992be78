//! Process identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process ID wrapper with display formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub u32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ProcessId {
    fn from(pid: u32) -> Self {
        ProcessId(pid)
    }
}

impl std::str::FromStr for ProcessId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(ProcessId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_id_display() {
        assert_eq!(ProcessId(4242).to_string(), "4242");
    }

    #[test]
    fn test_process_id_parse() {
        assert_eq!(" 17 ".parse::<ProcessId>().unwrap(), ProcessId(17));
        assert!("abc".parse::<ProcessId>().is_err());
    }

    #[test]
    fn test_process_id_serializes_transparently() {
        assert_eq!(serde_json::to_string(&ProcessId(9)).unwrap(), "9");
    }
}
