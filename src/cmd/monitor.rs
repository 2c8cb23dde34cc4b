use std::time::Duration;

use tracing::{info, warn};

use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::state::StateStore;
use crate::workflow::monitor::{CycleReport, process_new_commits};
use crate::workflow::scheduler::PollScheduler;

#[derive(Debug, Clone)]
pub struct RunCommandArgs {
    pub interval: Option<Duration>,
}

/// Polls until Ctrl-C or a cycle-fatal error.
pub async fn run(ctx: &AppContext, args: RunCommandArgs) -> AppResult<()> {
    let store = StateStore::new(ctx.config.state_file_path());
    let mut state = store.load()?;
    let interval = resolve_interval(args.interval, ctx.config.settings.poll_interval())?;

    let (scheduler, shutdown) = PollScheduler::new(interval);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!("unable to listen for Ctrl-C; stop the process with a signal");
            // Dropping the sender would read as a shutdown request.
            std::future::pending::<()>().await;
        }
        info!("Ctrl-C received, finishing current cycle");
        let _ = shutdown.send(true);
    });

    scheduler.run(ctx, &mut state, &store).await?;
    Ok(())
}

/// The override wins over the configured interval; neither may be zero.
fn resolve_interval(requested: Option<Duration>, configured: Duration) -> AppResult<Duration> {
    let interval = requested.unwrap_or(configured);
    if interval.is_zero() {
        return Err(AppError::Configuration(
            "poll interval must be at least one second".to_string(),
        ));
    }
    Ok(interval)
}

/// A single poll cycle, without the interval loop.
pub async fn run_once(ctx: &AppContext) -> AppResult<CycleReport> {
    let store = StateStore::new(ctx.config.state_file_path());
    let mut state = store.load()?;
    process_new_commits(ctx, &mut state, &store).await
}
