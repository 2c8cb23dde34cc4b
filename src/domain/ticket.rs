use std::fmt;

use crate::domain::branch::BranchName;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BugId(pub u64);

impl fmt::Display for BugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketComment {
    pub text: String,
}

impl TicketComment {
    pub fn message_prefix(repo: &str, branch: &BranchName) -> String {
        format!("New commit detected on {repo}/{branch}:")
    }

    pub fn compose(prefix: &str, commit_link: &str, commit_message: &str) -> Self {
        Self {
            text: format!("{prefix}\n{commit_link}\n\n{commit_message}"),
        }
    }
}

/// Result of one bug-reference dispatch. Tracker failures are carried here
/// instead of being propagated to the caller.
#[derive(Debug)]
pub enum UpdateOutcome {
    Commented,
    NotInProduct,
    Failed(AppError),
}

impl UpdateOutcome {
    pub fn is_commented(&self) -> bool {
        matches!(self, UpdateOutcome::Commented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_comment_text() {
        let prefix = TicketComment::message_prefix("R", &BranchName("main".to_string()));
        let comment = TicketComment::compose(
            &prefix,
            "https://example.com/commit/def456",
            "commit def456\n\n    Fix it\n",
        );
        assert_eq!(
            comment.text,
            "New commit detected on R/main:\nhttps://example.com/commit/def456\n\ncommit def456\n\n    Fix it\n"
        );
    }
}
