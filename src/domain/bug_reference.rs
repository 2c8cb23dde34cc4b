use regex::Regex;
use tracing::warn;

use crate::domain::ticket::BugId;
use crate::error::{AppError, AppResult};

/// Finds lines of a commit message that consist solely of a link to a bug
/// on the configured tracker.
#[derive(Debug, Clone)]
pub struct BugReferenceMatcher {
    pattern: Regex,
}

impl BugReferenceMatcher {
    pub fn new(tracker_base_url: &str) -> AppResult<Self> {
        let base = tracker_base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(AppError::Configuration(
                "tracker base URL must not be empty".to_string(),
            ));
        }
        let source = format!(r"^{}/show_bug\.cgi\?id=(\d+)$", regex::escape(base));
        let pattern = Regex::new(&source).map_err(|err| {
            AppError::Configuration(format!("invalid bug reference pattern: {err}"))
        })?;
        Ok(Self { pattern })
    }

    /// Every matching line yields one id, in message order. Repeats are kept.
    /// An id too large to be a bug number is logged and left out.
    pub fn extract(&self, message: &str) -> Vec<BugId> {
        message
            .lines()
            .filter_map(|line| self.pattern.captures(line.trim()))
            .filter_map(|captures| {
                let digits = &captures[1];
                match digits.parse::<u64>() {
                    Ok(id) => Some(BugId(id)),
                    Err(err) => {
                        warn!(
                            bug_id = digits,
                            error = %err,
                            "skipping bug reference with out of range id"
                        );
                        None
                    }
                }
            })
            .collect()
    }
}
