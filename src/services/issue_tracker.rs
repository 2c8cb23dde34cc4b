use async_trait::async_trait;

use crate::domain::ticket::{BugId, TicketComment};
use crate::error::AppResult;

#[async_trait]
pub trait IssueTrackerService: Send + Sync {
    /// Whether `bug` exists and belongs to `product`.
    async fn bug_in_product(&self, bug: BugId, product: &str) -> AppResult<bool>;
    async fn add_comment(&self, bug: BugId, comment: &TicketComment) -> AppResult<()>;
}
