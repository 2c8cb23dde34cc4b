use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::context::AppContext;
use crate::error::AppResult;
use crate::state::{RepositoryState, StateStore};
use crate::workflow::monitor::process_new_commits;

/// Runs a poll cycle, sleeps, repeats. Stops between cycles once the
/// shutdown flag is raised; a cycle in progress always runs to completion.
pub struct PollScheduler {
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl PollScheduler {
    pub fn new(interval: Duration) -> (Self, watch::Sender<bool>) {
        let (shutdown_tx, shutdown) = watch::channel(false);
        (Self { interval, shutdown }, shutdown_tx)
    }

    /// Returns the number of completed cycles on shutdown. A cycle-fatal
    /// error ends the loop and is returned as is.
    pub async fn run(
        mut self,
        ctx: &AppContext,
        state: &mut RepositoryState,
        store: &StateStore,
    ) -> AppResult<u64> {
        info!(
            interval_secs = self.interval.as_secs(),
            branches = state.branch_count(),
            "commit monitor started"
        );

        let mut cycles = 0;
        loop {
            let report = process_new_commits(ctx, state, store).await?;
            cycles += 1;
            debug!(
                cycle = cycles,
                branches = report.branches,
                commits = report.commits,
                comments = report.comments,
                skipped = report.skipped_updates,
                "poll cycle complete"
            );

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        info!(cycles, "commit monitor stopping");
                        return Ok(cycles);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::config::{AppConfig, MonitorSettings, TrackerCredentials};
    use crate::domain::branch::BranchName;
    use crate::domain::commit::{CommitId, WatermarkStatus};
    use crate::domain::ticket::{BugId, TicketComment};
    use crate::error::AppError;
    use crate::services::{IssueTrackerService, VersionControlService};

    /// A single-commit repository whose pulls can be made to fail.
    struct CountingGit {
        pulls: AtomicUsize,
        fail_from: usize,
    }

    #[async_trait]
    impl VersionControlService for CountingGit {
        async fn checkout_branch(&self, _repo: &Path, _branch: &BranchName) -> AppResult<()> {
            Ok(())
        }

        async fn pull(&self, _repo: &Path) -> AppResult<()> {
            let done = self.pulls.fetch_add(1, Ordering::SeqCst) + 1;
            if done >= self.fail_from {
                return Err(AppError::VersionControl("network unreachable".to_string()));
            }
            Ok(())
        }

        async fn head(&self, _repo: &Path) -> AppResult<CommitId> {
            Ok(CommitId::from("abc123"))
        }

        async fn watermark_status(
            &self,
            _repo: &Path,
            _watermark: &CommitId,
        ) -> AppResult<WatermarkStatus> {
            Ok(WatermarkStatus::Reachable)
        }

        async fn commits_since(&self, _repo: &Path, _since: &CommitId) -> AppResult<Vec<CommitId>> {
            Ok(Vec::new())
        }

        async fn commit_message(&self, _repo: &Path, _commit: &CommitId) -> AppResult<String> {
            Ok(String::new())
        }
    }

    struct NoTracker;

    #[async_trait]
    impl IssueTrackerService for NoTracker {
        async fn bug_in_product(&self, _bug: BugId, _product: &str) -> AppResult<bool> {
            Ok(false)
        }

        async fn add_comment(&self, _bug: BugId, _comment: &TicketComment) -> AppResult<()> {
            Ok(())
        }
    }

    fn setup(fail_from: usize) -> (TempDir, AppContext, StateStore, Arc<CountingGit>) {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            config_dir: dir.path().to_path_buf(),
            settings: MonitorSettings {
                product: "ManageIQ".to_string(),
                repository_base: PathBuf::from("/srv/repos"),
                poll_interval_secs: 60,
            },
            credentials: TrackerCredentials {
                bugzilla_uri: "https://bugzilla.example.com".to_string(),
                username: "bot".to_string(),
                password: "secret".to_string(),
            },
        };
        let store = StateStore::new(config.state_file_path());
        fs::write(
            store.path(),
            "R:\n  main:\n    last_commit: abc123\n    commit_uri: https://example.com/\n",
        )
        .unwrap();
        let git = Arc::new(CountingGit {
            pulls: AtomicUsize::new(0),
            fail_from,
        });
        let ctx = AppContext::new(config, git.clone(), Arc::new(NoTracker)).unwrap();
        (dir, ctx, store, git)
    }

    #[tokio::test]
    async fn stops_after_current_cycle_on_shutdown() {
        let (_dir, ctx, store, git) = setup(usize::MAX);
        let mut state = store.load().unwrap();
        let (scheduler, shutdown) = PollScheduler::new(Duration::from_secs(3600));
        shutdown.send(true).unwrap();

        let cycles = scheduler.run(&ctx, &mut state, &store).await.unwrap();

        assert_eq!(cycles, 1);
        assert_eq!(git.pulls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repeats_on_interval_until_cycle_fails() {
        let (_dir, ctx, store, git) = setup(3);
        let mut state = store.load().unwrap();
        let (scheduler, _shutdown) = PollScheduler::new(Duration::from_millis(5));

        let result = scheduler.run(&ctx, &mut state, &store).await;

        assert!(matches!(result, Err(AppError::VersionControl(_))));
        assert_eq!(git.pulls.load(Ordering::SeqCst), 3);
    }
}
