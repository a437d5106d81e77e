//! Authentication against the Rocket.Chat REST API.
//!
//! Supports personal access tokens and username/password login.

pub mod credentials;

use serde::Deserialize;
use thiserror::Error;

use credentials::{CredentialSet, PasswordCredentials};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("credential error: {0}")]
    Credential(#[from] credentials::CredentialError),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("login rejected: {0}")]
    LoginRejected(String),
    #[error("login response did not contain a user id")]
    MissingUserId,
}

/// Which authentication strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Pre-issued personal access token.
    Token,
    /// Username/password exchanged for a session token.
    Password,
}

/// An authenticated session: the pair of headers every request carries.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub auth_token: String,
}

impl Session {
    /// Header pairs for `reqwest::RequestBuilder::header`.
    pub fn headers(&self) -> [(&'static str, &str); 2] {
        [
            ("X-User-Id", self.user_id.as_str()),
            ("X-Auth-Token", self.auth_token.as_str()),
        ]
    }
}

/// Central auth provider that wraps the active strategy.
#[derive(Debug, Clone)]
pub struct AuthProvider {
    pub method: AuthMethod,
    pub credentials: CredentialSet,
}

/// Pick the best available auth method from a credential set.
///
/// Preference: token > password.
pub fn detect_auth_method(creds: &CredentialSet) -> Result<AuthMethod, AuthError> {
    if creds.token.is_some() {
        Ok(AuthMethod::Token)
    } else if creds.password.is_some() {
        Ok(AuthMethod::Password)
    } else {
        Err(credentials::CredentialError::NoCredentials.into())
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    #[serde(default)]
    user_id: Option<String>,
    auth_token: String,
}

impl AuthProvider {
    pub fn new(credentials: CredentialSet) -> Result<Self, AuthError> {
        let method = detect_auth_method(&credentials)?;
        Ok(Self {
            method,
            credentials,
        })
    }

    /// Produce a session, logging in with username/password when needed.
    pub async fn session(&self, client: &reqwest::Client) -> Result<Session, AuthError> {
        match (self.method, &self.credentials.token, &self.credentials.password) {
            (AuthMethod::Token, Some(token), _) => Ok(Session {
                user_id: token.user_id.clone(),
                auth_token: token.auth_token.clone(),
            }),
            (AuthMethod::Password, _, Some(password)) => {
                login(client, &self.credentials.server_url, password).await
            }
            _ => Err(credentials::CredentialError::NoCredentials.into()),
        }
    }
}

/// `POST /api/v1/login`.
async fn login(
    client: &reqwest::Client,
    server_url: &str,
    creds: &PasswordCredentials,
) -> Result<Session, AuthError> {
    let url = format!("{server_url}/api/v1/login");
    let resp: LoginResponse = client
        .post(&url)
        .json(&serde_json::json!({
            "user": creds.username,
            "password": creds.password,
        }))
        .send()
        .await?
        .json()
        .await?;

    if resp.status != "success" {
        return Err(AuthError::LoginRejected(
            resp.message.unwrap_or_else(|| resp.status.clone()),
        ));
    }

    let data = resp.data.ok_or(AuthError::MissingUserId)?;
    let user_id = data.user_id.ok_or(AuthError::MissingUserId)?;
    tracing::info!(user_id = %user_id, "logged in with password");
    Ok(Session {
        user_id,
        auth_token: data.auth_token,
    })
}
