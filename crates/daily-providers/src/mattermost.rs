//! Mattermost custom status client.
//!
//! While a meeting runs the user's status shows the meeting title with a
//! calendar emoji and switches to Do Not Disturb until the meeting ends. A
//! custom status the user set themselves is never overwritten.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};

const PROVIDER_NAME: &str = "mattermost";

/// Emoji shown next to a meeting status.
pub const MEETING_EMOJI: &str = "calendar";

const ME_ENDPOINT: &str = "/api/v4/users/me";
const CUSTOM_STATUS_ENDPOINT: &str = "/api/v4/users/me/status/custom";
const STATUS_ENDPOINT: &str = "/api/v4/users/me/status";

/// A Mattermost custom status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomStatus {
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CustomStatus {
    /// Status for a meeting ending at `end`, expiring on the minute.
    pub fn for_meeting(title: impl Into<String>, end: DateTime<Utc>) -> Self {
        let expires_at = end.duration_trunc(TimeDelta::minutes(1)).unwrap_or(end);
        Self {
            emoji: MEETING_EMOJI.to_string(),
            text: title.into(),
            expires_at: Some(expires_at),
        }
    }

    /// Returns true if a status is showing at `now`.
    ///
    /// A status without expiry, or with the zero timestamp Mattermost uses
    /// for "never", counts as showing.
    pub fn is_set_at(&self, now: DateTime<Utc>) -> bool {
        if self.text.is_empty() && self.emoji.is_empty() {
            return false;
        }
        match self.expires_at {
            None => true,
            Some(at) if at.timestamp() <= 0 => true,
            Some(at) => at > now,
        }
    }
}

/// Outcome of [`MattermostClient::update_for_meeting`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    /// The user already had a status; nothing was changed.
    Skipped,
    /// The meeting status was set.
    Updated,
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    #[serde(default)]
    id: String,
    #[serde(default)]
    props: UserProps,
}

#[derive(Debug, Default, Deserialize)]
struct UserProps {
    /// JSON-encoded [`CustomStatus`], empty when none is set.
    #[serde(default, rename = "customStatus")]
    custom_status: String,
}

#[derive(Debug, Serialize)]
struct DndRequest<'a> {
    user_id: &'a str,
    status: &'a str,
    dnd_end_time: i64,
}

/// Prefixes `https://` when the server URL carries no scheme.
pub fn normalize_server_url(server: &str) -> String {
    let server = server.trim().trim_end_matches('/');
    if server.starts_with("https://") || server.starts_with("http://") {
        server.to_string()
    } else {
        format!("https://{}", server)
    }
}

/// Mattermost REST client bound to one personal access token.
#[derive(Debug)]
pub struct MattermostClient {
    http_client: reqwest::Client,
    server_url: String,
    token: String,
}

impl MattermostClient {
    /// # Errors
    ///
    /// Fails if the server URL is invalid or the HTTP client cannot be built.
    pub fn new(
        server: &str,
        token: impl Into<String>,
        timeout: std::time::Duration,
    ) -> ProviderResult<Self> {
        let server_url = normalize_server_url(server);
        url::Url::parse(&server_url).map_err(|e| {
            ProviderError::configuration(format!("invalid Mattermost server {:?}", server))
                .with_provider(PROVIDER_NAME)
                .with_source(e)
        })?;

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProviderError::configuration("failed to create HTTP client")
                    .with_provider(PROVIDER_NAME)
                    .with_source(e)
            })?;

        Ok(Self {
            http_client,
            server_url,
            token: token.into(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Sets the meeting status unless the user already shows one.
    ///
    /// A failure to switch to Do Not Disturb is logged and does not fail the
    /// update.
    pub async fn update_for_meeting(
        &self,
        title: &str,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> ProviderResult<StatusUpdate> {
        let (user_id, current) = self.current_status().await?;
        if current.is_set_at(now) {
            info!(text = %current.text, "custom status already set, skipping update");
            return Ok(StatusUpdate::Skipped);
        }

        let status = CustomStatus::for_meeting(title, end);
        self.set_custom_status(&status).await?;
        info!(text = %status.text, "custom status set");

        let until = status.expires_at.unwrap_or(end);
        if let Err(e) = self.set_do_not_disturb(&user_id, until).await {
            warn!(error = %e, "failed to set do not disturb");
        }
        Ok(StatusUpdate::Updated)
    }

    /// Returns the user id and current custom status.
    pub async fn current_status(&self) -> ProviderResult<(String, CustomStatus)> {
        debug!(server = %self.server_url, "fetching current status");
        let response = self
            .http_client
            .get(self.url(ME_ENDPOINT))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(network_error)?;

        let response = check_status(response).await?;
        let profile: UserProfile = response.json().await.map_err(|e| {
            ProviderError::invalid_response("failed to parse user profile")
                .with_provider(PROVIDER_NAME)
                .with_source(e)
        })?;

        if profile.props.custom_status.is_empty() {
            return Ok((profile.id, CustomStatus::default()));
        }

        let status = serde_json::from_str(&profile.props.custom_status).map_err(|e| {
            ProviderError::invalid_response("failed to parse custom status")
                .with_provider(PROVIDER_NAME)
                .with_source(e)
        })?;
        Ok((profile.id, status))
    }

    pub async fn set_custom_status(&self, status: &CustomStatus) -> ProviderResult<()> {
        let response = self
            .http_client
            .put(self.url(CUSTOM_STATUS_ENDPOINT))
            .bearer_auth(&self.token)
            .json(status)
            .send()
            .await
            .map_err(network_error)?;
        check_status(response).await?;
        Ok(())
    }

    pub async fn set_do_not_disturb(
        &self,
        user_id: &str,
        until: DateTime<Utc>,
    ) -> ProviderResult<()> {
        let body = DndRequest {
            user_id,
            status: "dnd",
            dnd_end_time: until.timestamp(),
        };
        let response = self
            .http_client
            .put(self.url(STATUS_ENDPOINT))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;
        check_status(response).await?;
        debug!(until = %until, "do not disturb set");
        Ok(())
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.server_url, endpoint)
    }
}

fn network_error(e: reqwest::Error) -> ProviderError {
    ProviderError::network(format!("request failed: {}", e))
        .with_provider(PROVIDER_NAME)
        .with_source(e)
}

async fn check_status(response: reqwest::Response) -> ProviderResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let error = match status.as_u16() {
        401 => ProviderError::authentication("Mattermost token rejected"),
        403 => ProviderError::authorization("Mattermost token lacks permission"),
        429 => ProviderError::rate_limited("Mattermost rate limit exceeded"),
        500..=599 => ProviderError::server(format!("status {}: {}", status, body)),
        _ => ProviderError::bad_request(format!("status {}: {}", status, body)),
    };
    Err(error.with_provider(PROVIDER_NAME))
}
