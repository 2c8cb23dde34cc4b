use std::path::Path;

use async_trait::async_trait;

use crate::domain::branch::BranchName;
use crate::domain::commit::{CommitId, WatermarkStatus};
use crate::error::AppResult;

/// Operations on a local working copy. Every call names the working copy it
/// acts on, so one adapter serves all tracked repositories.
#[async_trait]
pub trait VersionControlService: Send + Sync {
    async fn checkout_branch(&self, repo: &Path, branch: &BranchName) -> AppResult<()>;
    /// Fast-forward the checked out branch from its upstream.
    async fn pull(&self, repo: &Path) -> AppResult<()>;
    async fn head(&self, repo: &Path) -> AppResult<CommitId>;
    async fn watermark_status(&self, repo: &Path, watermark: &CommitId)
    -> AppResult<WatermarkStatus>;
    /// Commits in `since..HEAD`, oldest first.
    async fn commits_since(&self, repo: &Path, since: &CommitId) -> AppResult<Vec<CommitId>>;
    async fn commit_message(&self, repo: &Path, commit: &CommitId) -> AppResult<String>;
}
