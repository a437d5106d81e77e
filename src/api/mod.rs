pub mod messages;
pub mod rooms;
pub mod types;

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::auth::{AuthError, AuthProvider, Session};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rate limited until {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },
    #[error("API error (status {status}): {detail}")]
    ApiError { status: u16, detail: String },
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
    #[error("deserialization error: {0}")]
    Deserialize(String),
}

// ---------------------------------------------------------------------------
// Rate limit tracking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub remaining: Option<u32>,
    pub reset_at: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

impl RateLimitInfo {
    fn from_headers(headers: &reqwest::header::HeaderMap) -> Self {
        let num = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<i64>().ok())
        };

        Self {
            remaining: num("x-ratelimit-remaining").and_then(|v| u32::try_from(v).ok()),
            // Rocket.Chat reports the reset as epoch milliseconds.
            reset_at: num("x-ratelimit-reset").and_then(DateTime::from_timestamp_millis),
            limit: num("x-ratelimit-limit").and_then(|v| u32::try_from(v).ok()),
        }
    }
}

// ---------------------------------------------------------------------------
// API client
// ---------------------------------------------------------------------------

pub struct RocketChatClient {
    http_client: reqwest::Client,
    server_url: String,
    session: Session,
    username: Option<String>,
}

impl RocketChatClient {
    /// Build a client and establish a session (logging in if required).
    pub async fn connect(auth: AuthProvider, timeout: Duration) -> Result<Self, ApiClientError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        let session = auth.session(&http_client).await?;
        let mut client = Self {
            http_client,
            server_url: auth.credentials.server_url.clone(),
            session,
            username: None,
        };

        match client.me().await {
            Ok(me) => client.username = Some(me.username),
            Err(e) => tracing::warn!(context = "api.me", error = %e, "could not resolve username"),
        }
        Ok(client)
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// The authenticated user's username, if `/me` succeeded.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// `GET /api/v1/me`.
    pub async fn me(&self) -> Result<types::Me, ApiClientError> {
        self.get(&self.url("/me")).await
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        self.session
            .headers()
            .into_iter()
            .fold(builder, |b, (name, value)| b.header(name, value))
    }

    /// Issue an authenticated GET request.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiClientError> {
        let resp = self.authorize(self.http_client.get(url)).send().await?;
        self.handle_response(resp).await
    }

    /// Issue an authenticated POST request with a JSON body.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T, ApiClientError> {
        let resp = self
            .authorize(self.http_client.post(url))
            .json(body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Parse rate-limit headers, check status, and deserialize the body.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: Response,
    ) -> Result<T, ApiClientError> {
        let rate_limit = RateLimitInfo::from_headers(resp.headers());
        let status = resp.status();

        if status.as_u16() == 429 {
            let reset = rate_limit.reset_at.unwrap_or_else(Utc::now);
            return Err(ApiClientError::RateLimited { reset_at: reset });
        }

        if let Some(remaining) = rate_limit.remaining {
            tracing::trace!(remaining, limit = ?rate_limit.limit, "rate limit");
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiClientError::ApiError {
                status: status.as_u16(),
                detail: body,
            });
        }

        let body = resp.text().await?;
        serde_json::from_str::<T>(&body)
            .map_err(|e| ApiClientError::Deserialize(format!("{e}: {body}")))
    }

    /// Build a full API URL from a path (e.g. "/chat.search").
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.server_url)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderMap, HeaderValue};

    use super::*;

    #[test]
    fn rate_limit_headers_are_parsed() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("7"));
        headers.insert("x-ratelimit-limit", HeaderValue::from_static("10"));
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("1709481909000"));

        let info = RateLimitInfo::from_headers(&headers);
        assert_eq!(info.remaining, Some(7));
        assert_eq!(info.limit, Some(10));
        assert_eq!(
            info.reset_at,
            DateTime::from_timestamp_millis(1_709_481_909_000)
        );
    }

    #[test]
    fn missing_rate_limit_headers_are_none() {
        assert_eq!(
            RateLimitInfo::from_headers(&HeaderMap::new()),
            RateLimitInfo::default()
        );
    }
}
