use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    header::{ACCEPT, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize};

use crate::config::TrackerCredentials;
use crate::domain::ticket::{BugId, TicketComment};
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;

const LOGIN_HEADER: &str = "X-BUGZILLA-LOGIN";
const PASSWORD_HEADER: &str = "X-BUGZILLA-PASSWORD";

/// Bugzilla REST client. Credentials travel with every request, so each
/// call authenticates on its own and no session is kept between bugs.
pub struct BugzillaClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
}

impl BugzillaClient {
    pub fn new(credentials: &TrackerCredentials) -> Self {
        Self {
            http: Client::new(),
            base_url: credentials.bugzilla_uri.clone(),
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        }
    }

    fn bug_search_endpoint(base_url: &str) -> String {
        format!("{}/rest/bug", base_url.trim_end_matches('/'))
    }

    fn comment_endpoint(base_url: &str, bug: BugId) -> String {
        format!("{}/rest/bug/{}/comment", base_url.trim_end_matches('/'), bug)
    }

    fn authenticated(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(LOGIN_HEADER, &self.username)
            .header(PASSWORD_HEADER, &self.password)
            .header(ACCEPT, "application/json")
    }

    async fn check_status(response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response>".to_string());
        Err(Self::status_error(status, body))
    }

    /// Prefers the `message` of a Bugzilla error body over the raw text.
    fn status_error(status: StatusCode, body: String) -> AppError {
        let detail = serde_json::from_str::<BugzillaError>(&body)
            .ok()
            .and_then(|error| error.message)
            .unwrap_or(body);
        AppError::IssueTracker(format!("Bugzilla responded with {status}: {detail}"))
    }
}

#[async_trait]
impl IssueTrackerService for BugzillaClient {
    async fn bug_in_product(&self, bug: BugId, product: &str) -> AppResult<bool> {
        let id = bug.to_string();
        let response = self
            .authenticated(self.http.get(Self::bug_search_endpoint(&self.base_url)))
            .query(&[
                ("id", id.as_str()),
                ("product", product),
                ("include_fields", "id,product"),
            ])
            .send()
            .await
            .map_err(|err| AppError::IssueTracker(format!("failed to call Bugzilla: {err}")))?;

        let payload: BugSearchResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|err| {
                AppError::IssueTracker(format!("failed to parse Bugzilla response: {err}"))
            })?;

        Ok(payload.contains(bug, product))
    }

    async fn add_comment(&self, bug: BugId, comment: &TicketComment) -> AppResult<()> {
        let response = self
            .authenticated(self.http.post(Self::comment_endpoint(&self.base_url, bug)))
            .header(CONTENT_TYPE, "application/json")
            .json(&AddCommentRequest {
                comment: &comment.text,
            })
            .send()
            .await
            .map_err(|err| AppError::IssueTracker(format!("failed to call Bugzilla: {err}")))?;

        Self::check_status(response).await?;
        Ok(())
    }
}

#[derive(Serialize)]
struct AddCommentRequest<'a> {
    comment: &'a str,
}

#[derive(Deserialize)]
struct BugSearchResponse {
    #[serde(default)]
    bugs: Vec<BugSummary>,
}

impl BugSearchResponse {
    fn contains(&self, bug: BugId, product: &str) -> bool {
        self.bugs.iter().any(|summary| {
            summary.id == bug.0
                && summary
                    .product
                    .as_deref()
                    .is_none_or(|found| found == product)
        })
    }
}

#[derive(Deserialize)]
struct BugSummary {
    id: u64,
    product: Option<String>,
}

#[derive(Deserialize)]
struct BugzillaError {
    message: Option<String>,
}
