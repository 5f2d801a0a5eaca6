//! Microsoft Graph client for Teams channel messages.
//!
//! Client-credential (app-only) bearer auth, one token cached until shortly
//! before expiry. Requests get no retry and no timeout beyond what reqwest
//! enforces; a non-2xx response surfaces as [`GraphError::RequestFailed`]
//! with the status and body text.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::GraphError;

const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
const LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";
const SCOPE: &str = "https://graph.microsoft.com/.default";

/// Renew the cached token this long before its reported expiry.
const TOKEN_RENEWAL_MARGIN_SECS: i64 = 60;

/// Seam between the planner and the remote message source.
///
/// Payloads are returned raw (loosely shaped JSON); the normalizer applies
/// defaults, so this trait makes no schema promises.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch up to `top` most-recent messages created within the last
    /// `lookback_hours` hours.
    async fn fetch_recent_messages(
        &self,
        team_id: &str,
        channel_id: &str,
        top: u32,
        lookback_hours: u32,
    ) -> Result<Vec<Value>, GraphError>;

    /// Post a message to the channel, returning the raw response payload.
    async fn send_message(
        &self,
        team_id: &str,
        channel_id: &str,
        content: &str,
    ) -> Result<Value, GraphError>;
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Microsoft Graph client over reqwest.
pub struct GraphClient {
    tenant_id: String,
    client_id: String,
    client_secret: SecretString,
    client: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl GraphClient {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: SecretString,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret,
            client: reqwest::Client::new(),
            token: Mutex::new(None),
        }
    }

    /// Acquire a bearer token via the client-credential flow, reusing the
    /// cached one while it is still valid.
    async fn token(&self) -> Result<String, GraphError> {
        let mut cached = self.token.lock().await;
        if let Some(t) = cached.as_ref()
            && t.expires_at > Utc::now()
        {
            return Ok(t.token.clone());
        }

        let response = self
            .client
            .post(format!(
                "{LOGIN_BASE_URL}/{}/oauth2/v2.0/token",
                self.tenant_id
            ))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose_secret()),
                ("scope", SCOPE),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::TokenAcquisition(format!("{status}: {body}")));
        }

        let payload: Value = response.json().await?;
        let token = payload
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                GraphError::TokenAcquisition("token response missing access_token".into())
            })?
            .to_string();
        let expires_in = payload
            .get("expires_in")
            .and_then(Value::as_i64)
            .unwrap_or(3600);

        debug!(expires_in, "Acquired Graph token");
        *cached = Some(CachedToken {
            token: token.clone(),
            expires_at: Utc::now()
                + Duration::seconds((expires_in - TOKEN_RENEWAL_MARGIN_SECS).max(0)),
        });
        Ok(token)
    }
}

#[async_trait]
impl MessageSource for GraphClient {
    async fn fetch_recent_messages(
        &self,
        team_id: &str,
        channel_id: &str,
        top: u32,
        lookback_hours: u32,
    ) -> Result<Vec<Value>, GraphError> {
        let token = self.token().await?;
        let response = self
            .client
            .get(format!(
                "{GRAPH_BASE_URL}/teams/{team_id}/channels/{channel_id}/messages"
            ))
            .query(&[
                ("$top", top.to_string()),
                (
                    "$filter",
                    format!("createdDateTime ge {}", lookback_start(lookback_hours)),
                ),
            ])
            .bearer_auth(&token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::RequestFailed { status, body });
        }

        let payload: Value = response.json().await?;
        let messages = payload
            .get("value")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        debug!(count = messages.len(), "Fetched channel messages");
        Ok(messages)
    }

    async fn send_message(
        &self,
        team_id: &str,
        channel_id: &str,
        content: &str,
    ) -> Result<Value, GraphError> {
        let token = self.token().await?;
        let response = self
            .client
            .post(format!(
                "{GRAPH_BASE_URL}/teams/{team_id}/channels/{channel_id}/messages"
            ))
            .bearer_auth(&token)
            .json(&json!({
                "body": {"contentType": "html", "content": content}
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::RequestFailed { status, body });
        }

        Ok(response.json().await?)
    }
}

/// Start of the lookback window as an ISO-8601 UTC timestamp, the format
/// Graph `$filter` comparisons expect.
fn lookback_start(lookback_hours: u32) -> String {
    (Utc::now() - Duration::hours(i64::from(lookback_hours)))
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}
