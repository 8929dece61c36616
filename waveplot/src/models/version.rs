//! Fingerprint format versions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported fingerprint algorithm revisions, oldest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Version {
    Citrus,
    Damson,
}

impl Version {
    /// All versions in ascending order
    pub const ALL: [Version; 2] = [Version::Citrus, Version::Damson];

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Citrus => "CITRUS",
            Version::Damson => "DAMSON",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Version string not in the supported set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVersion(pub String);

impl fmt::Display for UnknownVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported waveplot version {:?}", self.0)
    }
}

impl std::error::Error for UnknownVersion {}

impl FromStr for Version {
    type Err = UnknownVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVersion(s.to_string()))
    }
}
