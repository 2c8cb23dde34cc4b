use std::path::Path;
use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::branch::BranchName;
use crate::domain::commit::{CommitId, WatermarkStatus};
use crate::error::{AppError, AppResult};
use crate::services::VersionControlService;

/// Drives the `git` executable inside each working copy.
#[derive(Debug, Default, Clone)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }

    async fn output(repo: &Path, args: &[&str]) -> AppResult<Output> {
        debug!(repo = %repo.display(), ?args, "running git");
        Command::new("git")
            .args(args)
            .current_dir(repo)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|err| {
                AppError::VersionControl(format!(
                    "failed to run git in {}: {err}",
                    repo.display()
                ))
            })
    }

    async fn run(repo: &Path, args: &[&str]) -> AppResult<String> {
        let output = Self::output(repo, args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::VersionControl(format!(
                "git {} failed in {}: {}",
                args.join(" "),
                repo.display(),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn parse_commit_list(stdout: &str) -> Vec<CommitId> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(CommitId::from)
        .collect()
}

#[async_trait]
impl VersionControlService for GitCli {
    async fn checkout_branch(&self, repo: &Path, branch: &BranchName) -> AppResult<()> {
        if branch.as_str().is_empty() {
            return Err(AppError::VersionControl(
                "branch name cannot be empty".to_string(),
            ));
        }
        Self::run(repo, &["checkout", branch.as_str(), "--"]).await?;
        Ok(())
    }

    async fn pull(&self, repo: &Path) -> AppResult<()> {
        Self::run(repo, &["pull", "--ff-only"]).await?;
        Ok(())
    }

    async fn head(&self, repo: &Path) -> AppResult<CommitId> {
        let stdout = Self::run(repo, &["rev-parse", "HEAD"]).await?;
        Ok(CommitId(stdout.trim().to_string()))
    }

    async fn watermark_status(
        &self,
        repo: &Path,
        watermark: &CommitId,
    ) -> AppResult<WatermarkStatus> {
        let object = format!("{}^{{commit}}", watermark.as_str());
        let exists = Self::output(repo, &["cat-file", "-e", &object]).await?;
        if !exists.status.success() {
            return Ok(WatermarkStatus::Unreachable);
        }

        let ancestry =
            Self::output(repo, &["merge-base", "--is-ancestor", watermark.as_str(), "HEAD"])
                .await?;
        match ancestry.status.code() {
            Some(0) => Ok(WatermarkStatus::Reachable),
            Some(1) => Ok(WatermarkStatus::Unreachable),
            _ => Err(AppError::VersionControl(format!(
                "git merge-base failed in {}: {}",
                repo.display(),
                String::from_utf8_lossy(&ancestry.stderr).trim()
            ))),
        }
    }

    async fn commits_since(&self, repo: &Path, since: &CommitId) -> AppResult<Vec<CommitId>> {
        let range = format!("{}..HEAD", since.as_str());
        let stdout = Self::run(repo, &["rev-list", "--reverse", &range]).await?;
        Ok(parse_commit_list(&stdout))
    }

    async fn commit_message(&self, repo: &Path, commit: &CommitId) -> AppResult<String> {
        Self::run(
            repo,
            &["log", "-1", "--pretty=fuller", "--stat", commit.as_str()],
        )
        .await
    }
}
