use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::GoogleOAuthConfig;
use crate::error::AppError;

/// External profile fetched from the identity provider, used once to find or
/// create a local account. Never persisted as its own entity.
#[derive(Debug, Clone, Deserialize)]
pub struct FederatedProfile {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Adapter over a third-party OAuth2 provider.
///
/// Callers get a single `FederationFailed` for provider-side problems; they
/// do not need provider-specific diagnostics. Timeouts are the exception and
/// surface as `UpstreamUnavailable`.
#[async_trait]
pub trait IdentityFederator: Send + Sync {
    /// Exchanges an authorization code for a provider access token.
    async fn exchange_code(&self, code: &str) -> Result<String, AppError>;
    /// Fetches the external profile for a provider access token.
    async fn fetch_profile(&self, access_token: &str) -> Result<FederatedProfile, AppError>;
}

#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    access_token: String,
}

/// Google OAuth2 implementation over the token and userinfo endpoints.
/// Holds no local state beyond its HTTP client and configuration.
pub struct GoogleFederator {
    http: reqwest::Client,
    config: GoogleOAuthConfig,
}

impl GoogleFederator {
    pub fn new(config: GoogleOAuthConfig, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::InternalServerError(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self { http, config })
    }

    fn classify(error: reqwest::Error) -> AppError {
        if error.is_timeout() || error.is_connect() {
            AppError::UpstreamUnavailable(format!("Identity provider unreachable: {}", error))
        } else {
            AppError::FederationFailed(format!("Identity provider request failed: {}", error))
        }
    }
}

#[async_trait]
impl IdentityFederator for GoogleFederator {
    async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(Self::classify)?;

        if !response.status().is_success() {
            return Err(AppError::FederationFailed(format!(
                "Token exchange rejected with status {}",
                response.status()
            )));
        }

        let exchanged: TokenExchangeResponse = response
            .json()
            .await
            .map_err(|e| AppError::FederationFailed(format!("Malformed token response: {}", e)))?;

        Ok(exchanged.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<FederatedProfile, AppError> {
        let response = self
            .http
            .get(&self.config.userinfo_url)
            .query(&[("alt", "json")])
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(Self::classify)?;

        if !response.status().is_success() {
            return Err(AppError::FederationFailed(format!(
                "Profile fetch rejected with status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::FederationFailed(format!("Malformed profile payload: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_payload_shape() {
        let payload = r#"{
            "email": "bob@example.com",
            "name": "Bob",
            "picture": "https://example.com/bob.png",
            "verified_email": true
        }"#;

        let profile: FederatedProfile = serde_json::from_str(payload).unwrap();
        assert_eq!(profile.email, "bob@example.com");
        assert_eq!(profile.name.as_deref(), Some("Bob"));
    }

    #[test]
    fn test_profile_tolerates_missing_optionals() {
        let profile: FederatedProfile =
            serde_json::from_str(r#"{"email": "bob@example.com"}"#).unwrap();
        assert!(profile.name.is_none());
        assert!(profile.picture.is_none());
    }
}
