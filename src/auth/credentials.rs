use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to load .env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
    #[error("RC_SERVER_URL is not set")]
    NoServer,
    #[error(
        "no credentials found; set RC_USER_ID/RC_AUTH_TOKEN or RC_USERNAME/RC_PASSWORD in env or .env"
    )]
    NoCredentials,
}

/// Personal access token issued by the server.
#[derive(Debug, Clone)]
pub struct TokenCredentials {
    pub user_id: String,
    pub auth_token: String,
}

/// Username/password pair exchanged for a token via `/api/v1/login`.
#[derive(Debug, Clone)]
pub struct PasswordCredentials {
    pub username: String,
    pub password: String,
}

/// All detected credentials bundled together.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    pub server_url: String,
    pub token: Option<TokenCredentials>,
    pub password: Option<PasswordCredentials>,
}

/// Return candidate .env paths in priority order.
fn env_file_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = crate::config::config_dir() {
        paths.push(dir.join(".env"));
    }
    paths.push(PathBuf::from(".env"));
    paths
}

/// Load .env files without overriding variables already in the environment.
pub fn load_env_files() {
    for path in env_file_paths() {
        if path.exists() {
            let _ = dotenvy::from_path(&path);
        }
    }
}

/// Load credentials from environment variables, trying .env files first.
///
/// Priority: ~/.config/rcsearch/.env > cwd .env
/// Variables already set in the environment take precedence.
pub fn load_credentials() -> Result<CredentialSet, CredentialError> {
    load_env_files();
    credentials_from(|name| std::env::var(name).ok())
}

fn credentials_from(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<CredentialSet, CredentialError> {
    let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

    let server_url = get("RC_SERVER_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .ok_or(CredentialError::NoServer)?;

    let token = match (get("RC_USER_ID"), get("RC_AUTH_TOKEN")) {
        (Some(user_id), Some(auth_token)) => Some(TokenCredentials {
            user_id,
            auth_token,
        }),
        _ => None,
    };

    let password = match (get("RC_USERNAME"), get("RC_PASSWORD")) {
        (Some(username), Some(password)) => Some(PasswordCredentials { username, password }),
        _ => None,
    };

    if token.is_none() && password.is_none() {
        return Err(CredentialError::NoCredentials);
    }

    Ok(CredentialSet {
        server_url,
        token,
        password,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn token_credentials_are_detected() {
        let creds = credentials_from(env(&[
            ("RC_SERVER_URL", "https://chat.example.com/"),
            ("RC_USER_ID", "u1"),
            ("RC_AUTH_TOKEN", "tok"),
        ]))
        .unwrap();
        assert_eq!(creds.server_url, "https://chat.example.com");
        assert_eq!(creds.token.unwrap().user_id, "u1");
        assert!(creds.password.is_none());
    }

    #[test]
    fn password_credentials_are_detected() {
        let creds = credentials_from(env(&[
            ("RC_SERVER_URL", "https://chat.example.com"),
            ("RC_USERNAME", "alice"),
            ("RC_PASSWORD", "secret"),
        ]))
        .unwrap();
        assert!(creds.token.is_none());
        assert_eq!(creds.password.unwrap().username, "alice");
    }

    #[test]
    fn missing_server_is_an_error() {
        let err = credentials_from(env(&[("RC_USER_ID", "u1"), ("RC_AUTH_TOKEN", "t")]));
        assert!(matches!(err, Err(CredentialError::NoServer)));
    }

    #[test]
    fn empty_values_count_as_missing() {
        let err = credentials_from(env(&[
            ("RC_SERVER_URL", "https://chat.example.com"),
            ("RC_USER_ID", "u1"),
            ("RC_AUTH_TOKEN", ""),
        ]));
        assert!(matches!(err, Err(CredentialError::NoCredentials)));
    }
}
