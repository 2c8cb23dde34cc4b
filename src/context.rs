use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::bug_reference::BugReferenceMatcher;
use crate::error::AppResult;
use crate::services::{IssueTrackerService, VersionControlService};

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub version_control: Arc<dyn VersionControlService>,
    pub issue_tracker: Arc<dyn IssueTrackerService>,
    pub bug_references: BugReferenceMatcher,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        version_control: Arc<dyn VersionControlService>,
        issue_tracker: Arc<dyn IssueTrackerService>,
    ) -> AppResult<Self> {
        let bug_references = BugReferenceMatcher::new(&config.credentials.bugzilla_uri)?;
        Ok(Self {
            config,
            version_control,
            issue_tracker,
            bug_references,
        })
    }
}
