use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::{AuthProvider, AuthResult};
use crate::{
    config::AuthConfig,
    error::{FixtralError, Result},
    models::{AuthError, AuthProviderError, AuthProviderResponse, AuthSession, Credentials},
};

/// REST client for a GoTrue-compatible hosted auth service.
#[derive(Clone)]
pub struct HostedAuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl HostedAuthClient {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let base_url = config
            .url
            .as_deref()
            .ok_or_else(|| FixtralError::ConfigError("AUTH_URL is required".into()))?
            .trim_end_matches('/')
            .to_string();
        let anon_key = config
            .anon_key
            .clone()
            .ok_or_else(|| FixtralError::ConfigError("AUTH_ANON_KEY is required".into()))?;

        Ok(Self {
            client: Client::new(),
            base_url,
            anon_key,
        })
    }

    async fn post_credentials(&self, path: &str, email: &str, password: &str) -> AuthResult {
        let url = format!("{}/auth/v1/{}", self.base_url, path);
        let body = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::new(format!("Auth request failed: {}", e)))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if status.is_success() {
            let parsed: AuthProviderResponse = serde_json::from_str(&text)
                .map_err(|e| AuthError::new(format!("Unexpected auth response: {}", e)))?;
            return Ok(AuthSession::from(parsed));
        }

        log::warn!("Auth provider returned {} for {}", status, path);
        Err(provider_error(status, &text))
    }
}

fn provider_error(status: StatusCode, body: &str) -> AuthError {
    match serde_json::from_str::<AuthProviderError>(body) {
        Ok(parsed) => parsed.into_auth_error(status.as_u16()),
        Err(_) if !body.trim().is_empty() => {
            AuthError::new(body.trim()).with_status(status.as_u16())
        }
        Err(_) => AuthError::new(format!("Authentication failed with status {}", status.as_u16()))
            .with_status(status.as_u16()),
    }
}

#[async_trait]
impl AuthProvider for HostedAuthClient {
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult {
        self.post_credentials("token?grant_type=password", email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> AuthResult {
        self.post_credentials("signup", email, password).await
    }
}
