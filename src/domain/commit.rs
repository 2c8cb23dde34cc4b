use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(pub String);

impl CommitId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CommitId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a stored watermark relates to the branch tip after a pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatermarkStatus {
    /// The watermark is an ancestor of (or equal to) the tip.
    Reachable,
    /// History was rewritten or the object is unknown to the working copy.
    Unreachable,
}
