//! OAuth 2.0 authorization-code client.
//!
//! Builds the provider redirect, exchanges the callback code for an access
//! token, and turns the provider profile into an [`AuthPayload`].

use rand::{Rng, distr::Alphanumeric};
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::config::OAuthProviderConfig;
use crate::services::auth::AuthError;

/// Profile data an OAuth provider returns about the signed-in account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPayload {
    /// Provider name, e.g. `facebook`.
    pub provider: String,
    /// Account ID at the provider.
    pub uid: String,
    pub info: AuthInfo,
}

/// Optional account details shared by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthInfo {
    pub email: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Providers return the account ID as a string or a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileId {
    Text(String),
    Number(i64),
}

#[derive(Deserialize)]
struct ProfileResponse {
    id: ProfileId,
    #[serde(default)]
    email: Option<String>,
}

impl AuthPayload {
    /// Build a payload from a provider's profile JSON.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::OAuth` if the profile has no usable `id`.
    pub fn from_profile(provider: &str, profile: &serde_json::Value) -> Result<Self, AuthError> {
        let profile = ProfileResponse::deserialize(profile)
            .map_err(|e| AuthError::OAuth(format!("unexpected profile response: {e}")))?;

        let uid = match profile.id {
            ProfileId::Text(id) => id,
            ProfileId::Number(id) => id.to_string(),
        };
        if uid.is_empty() {
            return Err(AuthError::OAuth("profile id is empty".to_owned()));
        }

        Ok(Self {
            provider: provider.to_owned(),
            uid,
            info: AuthInfo {
                email: profile.email.filter(|e| !e.is_empty()),
            },
        })
    }
}

/// Length of the `state` value stored in the session.
pub const STATE_LENGTH: usize = 32;

/// Generate a random alphanumeric string for the OAuth `state` parameter.
#[must_use]
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

/// Client for one configured OAuth provider.
pub struct OAuthClient<'a> {
    http: &'a reqwest::Client,
    provider: &'a OAuthProviderConfig,
}

impl<'a> OAuthClient<'a> {
    /// Create a client for `provider` using a shared HTTP client.
    #[must_use]
    pub const fn new(http: &'a reqwest::Client, provider: &'a OAuthProviderConfig) -> Self {
        Self { http, provider }
    }

    /// The URL to send the user to for authorization.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::OAuth` if the configured authorize URL is invalid.
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<String, AuthError> {
        let url = url::Url::parse_with_params(
            &self.provider.authorize_url,
            &[
                ("client_id", self.provider.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", self.provider.scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::OAuth(format!("invalid authorize url: {e}")))?;

        Ok(url.into())
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::OAuth` if the provider rejects the code.
    /// Returns `AuthError::Http` if the request fails.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.provider.client_id.as_str()),
            ("client_secret", self.provider.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .http
            .post(&self.provider.token_url)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::OAuth(format!("token exchange failed: {text}")));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Fetch the signed-in account's profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::OAuth` if the provider rejects the token or the
    /// profile has no `id`.
    pub async fn fetch_payload(&self, access_token: &str) -> Result<AuthPayload, AuthError> {
        let response = self
            .http
            .get(&self.provider.profile_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::OAuth(format!("profile request failed: {text}")));
        }

        let profile: serde_json::Value = response.json().await?;
        AuthPayload::from_profile(&self.provider.name, &profile)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;

    use super::*;

    fn provider() -> OAuthProviderConfig {
        OAuthProviderConfig {
            name: "facebook".to_string(),
            client_id: "app 123".to_string(),
            client_secret: SecretString::from("s3cr3t"),
            authorize_url: "https://www.facebook.com/v19.0/dialog/oauth".to_string(),
            token_url: "https://graph.facebook.com/v19.0/oauth/access_token".to_string(),
            profile_url: "https://graph.facebook.com/v19.0/me?fields=id,email".to_string(),
            scope: "email".to_string(),
        }
    }

    #[test]
    fn test_payload_from_string_id() {
        let payload =
            AuthPayload::from_profile("facebook", &json!({"id": "12345", "email": "a@b.com"}))
                .unwrap();
        assert_eq!(payload.uid, "12345");
        assert_eq!(payload.provider, "facebook");
        assert_eq!(payload.info.email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn test_payload_from_numeric_id_without_email() {
        let payload = AuthPayload::from_profile("facebook", &json!({"id": 987})).unwrap();
        assert_eq!(payload.uid, "987");
        assert_eq!(payload.info, AuthInfo::default());
    }

    #[test]
    fn test_payload_rejects_missing_or_empty_id() {
        assert!(AuthPayload::from_profile("facebook", &json!({"email": "a@b.com"})).is_err());
        assert!(AuthPayload::from_profile("facebook", &json!({"id": ""})).is_err());
    }

    #[test]
    fn test_generate_state() {
        let a = generate_state();
        let b = generate_state();
        assert_eq!(a.len(), STATE_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_authorization_url_encodes_params() {
        let http = reqwest::Client::new();
        let provider = provider();
        let client = OAuthClient::new(&http, &provider);

        let url = client
            .authorization_url("http://localhost:3000/users/auth/facebook/callback", "xyz")
            .unwrap();
        let parsed = url::Url::parse(&url).unwrap();
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();

        assert_eq!(parsed.host_str(), Some("www.facebook.com"));
        assert_eq!(params.get("client_id").map(String::as_str), Some("app 123"));
        assert_eq!(params.get("state").map(String::as_str), Some("xyz"));
        assert_eq!(params.get("response_type").map(String::as_str), Some("code"));
        assert_eq!(
            params.get("redirect_uri").map(String::as_str),
            Some("http://localhost:3000/users/auth/facebook/callback")
        );
    }
}
