//! Google Calendar API client.

use chrono::SecondsFormat;
use serde::Deserialize;
use tracing::{debug, warn};

use super::config::GoogleConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, CalendarQuery, ListRequest, ListResponse, ListScope};
use crate::raw_event::RawItem;

const PROVIDER_NAME: &str = "google";

/// Google Calendar API client bound to one access token.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    access_token: String,
    config: GoogleConfig,
}

impl GoogleCalendarClient {
    /// Creates a client with the given access token.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(access_token: impl Into<String>, config: GoogleConfig) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                ProviderError::configuration("failed to create HTTP client")
                    .with_provider(PROVIDER_NAME)
                    .with_source(e)
            })?;

        Ok(Self {
            http_client,
            access_token: access_token.into(),
            config,
        })
    }

    /// Lists all pages for the request.
    async fn list_all(&self, request: &ListRequest) -> ProviderResult<ListResponse> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_page(request, page_token.as_deref()).await?;
            items.extend(page.items);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => {
                    debug!(
                        calendar = %request.calendar_id,
                        incremental = request.is_incremental(),
                        count = items.len(),
                        "listed events"
                    );
                    return Ok(ListResponse {
                        items,
                        next_sync_token: page.next_sync_token,
                    });
                }
            }
        }
    }

    async fn list_page(
        &self,
        request: &ListRequest,
        page_token: Option<&str>,
    ) -> ProviderResult<EventListPage> {
        let url = format!(
            "{}/calendars/{}/events",
            self.config.api_base,
            urlencoding::encode(&request.calendar_id)
        );

        let mut query: Vec<(&str, String)> = vec![
            ("singleEvents", "true".to_string()),
            ("maxResults", self.config.page_size.to_string()),
        ];
        if !request.fields.is_empty() {
            query.push(("fields", request.fields.clone()));
        }
        match &request.scope {
            ListScope::Window { time_min, time_max } => {
                query.push(("timeMin", time_min.to_rfc3339_opts(SecondsFormat::Secs, true)));
                query.push(("timeMax", time_max.to_rfc3339_opts(SecondsFormat::Secs, true)));
            }
            ListScope::Since { sync_token } => {
                query.push(("syncToken", sync_token.clone()));
            }
        }
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    "request timeout".to_string()
                } else if e.is_connect() {
                    format!("connection failed: {}", e)
                } else {
                    format!("request failed: {}", e)
                };
                ProviderError::network(message)
                    .with_provider(PROVIDER_NAME)
                    .with_source(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, retry_after.as_deref(), &body));
        }

        let body = response.text().await.map_err(|e| {
            ProviderError::network("failed to read response")
                .with_provider(PROVIDER_NAME)
                .with_source(e)
        })?;

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse event list: {}", e))
                .with_provider(PROVIDER_NAME)
                .with_source(e)
        })
    }
}

impl CalendarQuery for GoogleCalendarClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn list_events(&self, request: ListRequest) -> BoxFuture<'_, ProviderResult<ListResponse>> {
        Box::pin(async move { self.list_all(&request).await })
    }
}

/// Maps a non-success status to a provider error.
fn error_for_status(
    status: reqwest::StatusCode,
    retry_after: Option<&str>,
    body: &str,
) -> ProviderError {
    use reqwest::StatusCode;

    let error = match status {
        StatusCode::GONE => {
            ProviderError::sync_token_expired("sync token is no longer valid")
        }
        StatusCode::UNAUTHORIZED => {
            ProviderError::authentication("access token expired or invalid")
        }
        StatusCode::FORBIDDEN => ProviderError::authorization("access denied to calendar"),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(format!(
            "rate limit exceeded{}",
            retry_after
                .map(|s| format!(", retry after {} seconds", s))
                .unwrap_or_default()
        )),
        StatusCode::NOT_FOUND => ProviderError::not_found("calendar not found"),
        s if s.is_server_error() => ProviderError::server(format!("API error ({}): {}", s, body)),
        s => {
            warn!(status = %s, "unexpected calendar API response");
            ProviderError::bad_request(format!("API error ({}): {}", s, body))
        }
    };
    error.with_provider(PROVIDER_NAME)
}

/// One page of the `events.list` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListPage {
    #[serde(default)]
    items: Vec<RawItem>,
    next_page_token: Option<String>,
    next_sync_token: Option<String>,
}
