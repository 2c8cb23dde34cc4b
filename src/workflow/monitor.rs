use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::context::AppContext;
use crate::domain::branch::{BranchName, TrackedBranch};
use crate::domain::commit::{CommitId, WatermarkStatus};
use crate::domain::ticket::{BugId, TicketComment, UpdateOutcome};
use crate::error::AppResult;
use crate::state::{RepositoryState, StateStore};

/// Counters for one poll cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub branches: usize,
    pub commits: usize,
    pub comments: usize,
    pub skipped_updates: usize,
}

/// New commits found for a branch, and where its watermark ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommits {
    pub commits: Vec<CommitId>,
    pub watermark: Option<CommitId>,
}

/// One full pass over every tracked branch.
///
/// Checkout, pull and log failures abort the cycle. Tracker failures never
/// do. `state` is refreshed from the store at the start of the cycle and
/// around every branch, and only the processed branch's watermark is written
/// back, so branches added or removed by provisioning are not overwritten.
/// An aborted cycle keeps the progress of the branches that completed.
pub async fn process_new_commits(
    ctx: &AppContext,
    state: &mut RepositoryState,
    store: &StateStore,
) -> AppResult<CycleReport> {
    let mut report = CycleReport::default();
    *state = store.load()?;

    for (repo, branch) in state.tracked() {
        *state = store.load()?;
        let Some(tracked) = state.branch(&repo, &branch).cloned() else {
            debug!(repo, branch = %branch, "branch no longer tracked, skipping");
            continue;
        };

        let progress = process_branch(ctx, &repo, &branch, &tracked, &mut report).await?;

        *state = store.load()?;
        match state.branch_mut(&repo, &branch) {
            Some(entry) => {
                entry.last_commit = progress;
                store.save(state)?;
            }
            None => debug!(repo, branch = %branch, "branch removed while processing"),
        }
        report.branches += 1;
    }

    Ok(report)
}

async fn process_branch(
    ctx: &AppContext,
    repo: &str,
    branch: &BranchName,
    tracked: &TrackedBranch,
    report: &mut CycleReport,
) -> AppResult<Option<CommitId>> {
    let repo_path = ctx.config.repository_path(repo);

    ctx.version_control
        .checkout_branch(&repo_path, branch)
        .await?;
    ctx.version_control.pull(&repo_path).await?;

    let found = find_new_commits(ctx, &repo_path, tracked.last_commit.as_ref()).await?;
    if found.commits.is_empty() {
        debug!(repo, branch = %branch, "no new commits");
    } else {
        info!(repo, branch = %branch, count = found.commits.len(), "new commits detected");
    }

    let prefix = TicketComment::message_prefix(repo, branch);
    for commit in &found.commits {
        let outcomes = process_commit(ctx, &repo_path, &prefix, tracked, commit).await?;
        report.commits += 1;
        for outcome in outcomes {
            if outcome.is_commented() {
                report.comments += 1;
            } else {
                report.skipped_updates += 1;
            }
        }
    }

    Ok(found.watermark)
}

/// Commits after `watermark` up to the tip, oldest first.
///
/// A branch without a watermark, or whose watermark is no longer an ancestor
/// of the tip, is baselined at the tip and reports nothing new.
pub async fn find_new_commits(
    ctx: &AppContext,
    repo_path: &Path,
    watermark: Option<&CommitId>,
) -> AppResult<NewCommits> {
    let vcs = &ctx.version_control;

    let Some(watermark) = watermark else {
        let head = vcs.head(repo_path).await?;
        info!(repo = %repo_path.display(), commit = %head, "no watermark stored, starting from tip");
        return Ok(NewCommits {
            commits: Vec::new(),
            watermark: Some(head),
        });
    };

    if vcs.watermark_status(repo_path, watermark).await? == WatermarkStatus::Unreachable {
        let head = vcs.head(repo_path).await?;
        warn!(
            repo = %repo_path.display(),
            watermark = %watermark,
            commit = %head,
            "watermark not reachable from tip, history was rewritten; restarting from tip"
        );
        return Ok(NewCommits {
            commits: Vec::new(),
            watermark: Some(head),
        });
    }

    let commits = vcs.commits_since(repo_path, watermark).await?;
    let watermark = commits.last().cloned().unwrap_or_else(|| watermark.clone());
    Ok(NewCommits {
        commits,
        watermark: Some(watermark),
    })
}

/// Sends one comment per bug reference found in the commit message.
pub async fn process_commit(
    ctx: &AppContext,
    repo_path: &Path,
    prefix: &str,
    tracked: &TrackedBranch,
    commit: &CommitId,
) -> AppResult<Vec<UpdateOutcome>> {
    let message = ctx
        .version_control
        .commit_message(repo_path, commit)
        .await?;
    let bugs = ctx.bug_references.extract(&message);
    if bugs.is_empty() {
        return Ok(Vec::new());
    }

    let comment = TicketComment::compose(prefix, &tracked.commit_link(commit), &message);
    let mut outcomes = Vec::with_capacity(bugs.len());
    for bug in bugs {
        outcomes.push(dispatch_bug_update(ctx, bug, &comment).await);
    }
    Ok(outcomes)
}

/// Comments on `bug` if it belongs to the configured product. Errors end
/// here and come back as [`UpdateOutcome::Failed`].
pub async fn dispatch_bug_update(
    ctx: &AppContext,
    bug: BugId,
    comment: &TicketComment,
) -> UpdateOutcome {
    let product = ctx.config.settings.product.as_str();
    info!(bug_id = %bug, "updating bug in Bugzilla");

    let outcome = match ctx.issue_tracker.bug_in_product(bug, product).await {
        Ok(false) => UpdateOutcome::NotInProduct,
        Ok(true) => match ctx.issue_tracker.add_comment(bug, comment).await {
            Ok(()) => UpdateOutcome::Commented,
            Err(err) => UpdateOutcome::Failed(err),
        },
        Err(err) => UpdateOutcome::Failed(err),
    };

    match &outcome {
        UpdateOutcome::Commented => info!(bug_id = %bug, "comment written"),
        UpdateOutcome::NotInProduct => {
            error!(bug_id = %bug, product, "unable to write to bug: not a {product} bug")
        }
        UpdateOutcome::Failed(err) => error!(bug_id = %bug, error = %err, "unable to write to bug"),
    }
    outcome
}
