use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::commit::CommitId;

const COMMIT_PLACEHOLDER: &str = "$commit";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchName(pub String);

impl BranchName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-branch record kept in the state file.
///
/// Keys the monitor does not understand are carried in `extra` so that a
/// rewrite never drops fields written by the provisioning tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedBranch {
    #[serde(default)]
    pub last_commit: Option<CommitId>,
    pub commit_uri: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl TrackedBranch {
    /// Web link for `commit`. A `$commit` placeholder in the template is
    /// substituted; a template without one is treated as a prefix.
    pub fn commit_link(&self, commit: &CommitId) -> String {
        if self.commit_uri.contains(COMMIT_PLACEHOLDER) {
            self.commit_uri.replace(COMMIT_PLACEHOLDER, commit.as_str())
        } else {
            format!("{}{}", self.commit_uri, commit.as_str())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracked(commit_uri: &str) -> TrackedBranch {
        TrackedBranch {
            last_commit: None,
            commit_uri: commit_uri.to_string(),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn appends_commit_to_prefix_template() {
        let branch = tracked("https://github.com/org/repo/commit/");
        let link = branch.commit_link(&CommitId::from("def456"));
        assert_eq!(link, "https://github.com/org/repo/commit/def456");
    }

    #[test]
    fn substitutes_commit_placeholder() {
        let branch = tracked("https://github.com/org/repo/commit/$commit");
        let link = branch.commit_link(&CommitId::from("def456"));
        assert_eq!(link, "https://github.com/org/repo/commit/def456");
    }

    #[test]
    fn keeps_unknown_keys() {
        let yaml = "last_commit: abc123\ncommit_uri: https://example.com/c/\npull_request: true\n";
        let branch: TrackedBranch = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(branch.last_commit, Some(CommitId::from("abc123")));
        assert_eq!(
            branch.extra.get("pull_request"),
            Some(&serde_yaml::Value::Bool(true))
        );

        let rendered = serde_yaml::to_string(&branch).unwrap();
        assert!(rendered.contains("pull_request: true"));
    }

    #[test]
    fn missing_watermark_deserializes_as_none() {
        let branch: TrackedBranch =
            serde_yaml::from_str("commit_uri: https://example.com/c/\n").unwrap();
        assert!(branch.last_commit.is_none());
    }
}
