//! Jira ticket source.
//!
//! Defines the [`TicketSource`] trait the assembler consumes and a
//! [`JiraClient`] implementation over the Jira Cloud search API. Request
//! building and response parsing are pure functions over wire structs so
//! they are testable without a network.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::config::JiraFieldsConfig;
use crate::credentials::JiraAuth;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// The report-request fields extracted from one ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketFields {
    /// Ticket key, e.g. `AD-378`.
    pub key: String,
    /// Ticket title.
    pub summary: String,
    /// Free-text cadence phrase ("Every Monday at 8 AM CST").
    pub schedule_description: String,
    /// Free-text look-back window ("Last 7 days"); some authors fold it
    /// into the schedule field instead.
    pub time_window: Option<String>,
    /// Ordered stakeholder-requested column names.
    pub requested_columns: Vec<String>,
    /// Report recipients.
    pub recipients: Vec<String>,
    /// Delivery method; only email is accepted today.
    pub delivery_method: Option<String>,
}

/// Supplies raw ticket fields for a given ticket identifier.
///
/// The assembler depends on this seam, not on Jira directly, so tests can
/// inject a canned source.
#[async_trait]
pub trait TicketSource: Send + Sync {
    /// Fetch the report-request fields for a ticket.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport, API, or missing-field failure.
    async fn fetch(&self, ticket_key: &str) -> Result<TicketFields, FetchError>;
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by ticket sources.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP transport failure.
    #[error("ticket request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Upstream responded with an error status.
    #[error("ticket source returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        body: String,
    },
    /// Response did not match the expected schema.
    #[error("ticket response parse error: {0}")]
    Parse(String),
    /// The search returned no issue for the key.
    #[error("ticket not found: {0}")]
    NotFound(String),
    /// A required request field is absent on the ticket.
    #[error("ticket {ticket} is missing required field {field:?}")]
    MissingField {
        /// Ticket key.
        ticket: String,
        /// Human-readable field name.
        field: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Jira search API response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct JiraSearchResponse {
    /// Matching issues.
    #[serde(default)]
    pub issues: Vec<JiraIssue>,
}

/// A single issue in a Jira search response.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct JiraIssue {
    /// Issue key.
    pub key: String,
    /// Raw field map, including custom fields.
    pub fields: serde_json::Map<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Request / response helpers (pub for integration testing)
// ---------------------------------------------------------------------------

/// Build the search URL for a ticket key.
///
/// # Errors
///
/// Returns [`FetchError::Parse`] when the base URL is invalid.
#[doc(hidden)]
pub fn search_url(base_url: &str, ticket_key: &str) -> Result<Url, FetchError> {
    let mut url = Url::parse(base_url)
        .and_then(|u| u.join("/rest/api/2/search"))
        .map_err(|e| FetchError::Parse(format!("invalid Jira base URL {base_url:?}: {e}")))?;
    url.query_pairs_mut()
        .append_pair("jql", &format!("key = {ticket_key:?}"))
        .append_pair("maxResults", "1");
    Ok(url)
}

/// Parse a Jira search response into [`TicketFields`].
///
/// # Errors
///
/// Returns [`FetchError::Parse`] on schema mismatch,
/// [`FetchError::NotFound`] when no issue came back, and
/// [`FetchError::MissingField`] when a required custom field is empty.
#[doc(hidden)]
pub fn parse_search_response(
    body: &str,
    ticket_key: &str,
    fields: &JiraFieldsConfig,
) -> Result<TicketFields, FetchError> {
    let response: JiraSearchResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    let issue = response
        .issues
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::NotFound(ticket_key.to_owned()))?;

    let text_field = |id: &str| -> Option<String> {
        issue
            .fields
            .get(id)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };

    let missing = |field: &'static str| FetchError::MissingField {
        ticket: issue.key.clone(),
        field,
    };

    let summary = text_field("summary").ok_or_else(|| missing("summary"))?;
    let schedule_description =
        text_field(&fields.schedule).ok_or_else(|| missing("schedule"))?;
    let raw_columns = text_field(&fields.columns).ok_or_else(|| missing("columns"))?;
    let raw_recipients = text_field(&fields.recipients).ok_or_else(|| missing("recipients"))?;

    Ok(TicketFields {
        key: issue.key.clone(),
        summary,
        schedule_description,
        time_window: text_field(&fields.time_window),
        requested_columns: split_requested_columns(&raw_columns),
        recipients: split_recipients(&raw_recipients),
        delivery_method: text_field(&fields.delivery).map(|s| s.to_lowercase()),
    })
}

/// Split the raw requested-columns field on newlines, commas, and the
/// trailing ", and"/"and" authors tend to write.
///
/// A bare "and" acts as a separator only in the final list item ("Clicks
/// and Spend"); earlier items may legitimately contain the word ("brand
/// and generic, Clicks" stays two items).
#[doc(hidden)]
pub fn split_requested_columns(raw: &str) -> Vec<String> {
    let mut parts: Vec<String> = raw
        .replace(", and ", ",")
        .split(['\n', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect();

    if let Some(last) = parts.pop() {
        parts.extend(
            last.split(" and ")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
        );
    }
    parts
}

/// Normalize the raw recipient field: semicolons and newlines act as
/// separators, surrounding whitespace is dropped.
#[doc(hidden)]
pub fn split_recipients(raw: &str) -> Vec<String> {
    raw.split([';', ',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Collapse whitespace and truncate an upstream error body before logging
/// or embedding it in an error.
fn sanitize_error_body(raw: &str) -> String {
    const MAX_ERROR_BODY_CHARS: usize = 256;

    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = collapsed
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }
    collapsed
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Jira Cloud search API client.
#[derive(Debug, Clone)]
pub struct JiraClient {
    base_url: String,
    fields: JiraFieldsConfig,
    auth: JiraAuth,
    client: reqwest::Client,
}

impl JiraClient {
    /// Create a new Jira client.
    pub fn new(base_url: impl Into<String>, fields: JiraFieldsConfig, auth: JiraAuth) -> Self {
        Self {
            base_url: base_url.into(),
            fields,
            auth,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TicketSource for JiraClient {
    async fn fetch(&self, ticket_key: &str) -> Result<TicketFields, FetchError> {
        let url = search_url(&self.base_url, ticket_key)?;

        tracing::debug!(ticket = ticket_key, url = %url, "fetching ticket");
        let response = self
            .client
            .get(url)
            .basic_auth(&self.auth.email, Some(&self.auth.api_token))
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                body: sanitize_error_body(&body),
            });
        }

        parse_search_response(&body, ticket_key, &self.fields)
    }
}
