//! OAuth2 grant flows against Azure AD.
//!
//! Service principals use the client-credentials grant on the v1 token
//! endpoint with a `resource` parameter. Azure users go through the
//! authorization-code grant with PKCE and can renew with a refresh token.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use serde::{Deserialize, Deserializer};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use crate::config::{ApiConfig, HttpConfig};
use crate::error::{AuthError, Result};

use super::credentials::Credentials;
use super::SecretString;

/// PKCE code verifier and challenge pair.
#[derive(Debug)]
pub struct PkceChallenge {
    /// Sent on code exchange.
    pub verifier: String,
    /// BASE64URL(SHA256(verifier)), sent in the authorization request.
    pub challenge: String,
}

impl PkceChallenge {
    pub fn new() -> Self {
        let verifier = random_token(32);

        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        let challenge = URL_SAFE_NO_PAD.encode(hasher.finalize());

        Self {
            verifier,
            challenge,
        }
    }
}

impl Default for PkceChallenge {
    fn default() -> Self {
        Self::new()
    }
}

/// Random CSRF state for the authorization request.
pub fn generate_state() -> String {
    random_token(16)
}

fn random_token(len: usize) -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Endpoints and client identity for one grant flow.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub token_url: String,
    /// Only set for the authorization-code grant.
    pub authorize_url: Option<String>,
    pub redirect_uri: Option<String>,
    pub resource: String,
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    /// Client-credentials grant on `{login_v1_host}/{tenant}/oauth2/token`.
    pub fn client_credentials(credentials: &Credentials, api: &ApiConfig) -> Self {
        Self {
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            token_url: api.client_credentials_token_url(&credentials.tenant),
            authorize_url: None,
            redirect_uri: None,
            resource: api.resource.clone(),
            scopes: Vec::new(),
        }
    }

    /// Authorization-code grant on `{login_v2_host}/{tenant}/oauth2/{authorize,token}`.
    pub fn authorization_code(credentials: &Credentials, api: &ApiConfig) -> Self {
        Self {
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            token_url: api.user_token_url(&credentials.tenant),
            authorize_url: Some(api.authorize_url(&credentials.tenant)),
            redirect_uri: credentials.redirect_uri.clone(),
            resource: api.resource.clone(),
            scopes: api.scopes.clone(),
        }
    }
}

/// OAuth2 client for Azure AD token endpoints.
pub struct OAuthClient {
    config: OAuthConfig,
    http_client: reqwest::Client,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig, http: &HttpConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(http.timeout_seconds))
            .connect_timeout(Duration::from_secs(http.connect_timeout_seconds))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the browser sign-in URL for the authorization-code grant.
    ///
    /// `scopes` replaces the configured scopes when non-empty.
    pub fn authorization_url(
        &self,
        scopes: &[String],
        state: &str,
        pkce: &PkceChallenge,
    ) -> Result<Url, AuthError> {
        let endpoint = self.config.authorize_url.as_deref().ok_or_else(|| {
            AuthError::OAuthFailed("no authorization endpoint configured".into())
        })?;
        let redirect_uri = self
            .config
            .redirect_uri
            .as_deref()
            .ok_or_else(|| AuthError::OAuthFailed("no redirect_uri configured".into()))?;

        let mut url = Url::parse(endpoint)
            .map_err(|e| AuthError::OAuthFailed(format!("invalid authorization endpoint: {e}")))?;

        let scope = if scopes.is_empty() {
            self.config.scopes.join(" ")
        } else {
            scopes.join(" ")
        };

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("response_mode", "query")
            .append_pair("scope", &scope)
            .append_pair("resource", &self.config.resource)
            .append_pair("state", state)
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("code_challenge_method", "S256");

        Ok(url)
    }

    /// Client-credentials grant.
    pub async fn request_client_credentials_token(&self) -> Result<TokenResponse, AuthError> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose()),
            ("resource", self.config.resource.as_str()),
        ];

        debug!("Requesting client-credentials token from {}", self.config.token_url);
        self.post_token(&params, AuthError::TokenRequestFailed).await
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<TokenResponse, AuthError> {
        let redirect_uri = self.config.redirect_uri.as_deref().unwrap_or_default();
        let scope = self.config.scopes.join(" ");
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("code_verifier", pkce_verifier),
            ("resource", self.config.resource.as_str()),
            ("scope", scope.as_str()),
        ];

        debug!("Exchanging authorization code");
        self.post_token(&params, AuthError::TokenRequestFailed).await
    }

    /// Renew an access token with a refresh token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        let scope = self.config.scopes.join(" ");
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose()),
            ("refresh_token", refresh_token),
            ("resource", self.config.resource.as_str()),
            ("scope", scope.as_str()),
        ];

        debug!("Refreshing access token");
        self.post_token(&params, AuthError::TokenRefreshFailed).await
    }

    async fn post_token(
        &self,
        params: &[(&str, &str)],
        fail: fn(String) -> AuthError,
    ) -> Result<TokenResponse, AuthError> {
        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            // Details stay in the log; the error only carries the status.
            let error_body = response.text().await.unwrap_or_default();
            error!("Token endpoint returned HTTP {} - {}", status, error_body);
            return Err(fail(format!("HTTP {}", status.as_u16())));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| fail(e.to_string()))
    }
}

/// Token response from Azure AD.
///
/// The v1 endpoint sends `expires_in` as a string; both forms are accepted.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: SecretString,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(deserialize_with = "seconds_from_string_or_number")]
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<SecretString>,
    #[serde(default)]
    pub scope: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

fn seconds_from_string_or_number<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(u64),
        Text(String),
    }

    match Seconds::deserialize(deserializer)? {
        Seconds::Number(n) => Ok(n),
        Seconds::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Parse the OAuth callback URL to extract code and state.
pub fn parse_callback_url(url_string: &str) -> Result<(String, String), AuthError> {
    let url = Url::parse(url_string).map_err(|_| AuthError::InvalidAuthCode)?;

    let params: HashMap<_, _> = url.query_pairs().collect();

    if let Some(error) = params.get("error") {
        let description = params
            .get("error_description")
            .map(|s| s.to_string())
            .unwrap_or_else(|| error.to_string());
        return Err(AuthError::OAuthFailed(description));
    }

    let code = params
        .get("code")
        .ok_or(AuthError::InvalidAuthCode)?
        .to_string();

    let state = params
        .get("state")
        .ok_or(AuthError::StateValidationFailed)?
        .to_string();

    Ok((code, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn user_client() -> OAuthClient {
        let config = Config::embedded().unwrap();
        let credentials = Credentials {
            tenant: "contoso".into(),
            client_id: "client-123".into(),
            client_secret: "secret".into(),
            redirect_uri: Some("http://localhost:28491/callback".into()),
        };
        OAuthClient::new(
            OAuthConfig::authorization_code(&credentials, &config.api),
            &config.http,
        )
        .unwrap()
    }

    #[test]
    fn test_pkce_generation() {
        let pkce = PkceChallenge::new();

        // 32 bytes encode to 43 base64url characters.
        assert_eq!(pkce.verifier.len(), 43);
        assert!(!pkce.challenge.is_empty());
        assert_ne!(pkce.verifier, pkce.challenge);
    }

    #[test]
    fn test_state_is_random() {
        assert_ne!(generate_state(), generate_state());
    }

    #[test]
    fn test_authorization_url() {
        let client = user_client();
        let pkce = PkceChallenge::new();
        let url = client.authorization_url(&[], "state-1", &pkce).unwrap();

        assert!(url
            .as_str()
            .starts_with("https://login.microsoftonline.com/contoso/oauth2/authorize?"));
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["redirect_uri"], "http://localhost:28491/callback");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["state"], "state-1");
        assert_eq!(
            params["scope"],
            "https://analysis.windows.net/powerbi/api/.default offline_access"
        );
        assert_eq!(params["code_challenge"], pkce.challenge);
    }

    #[test]
    fn test_authorization_url_custom_scopes() {
        let client = user_client();
        let url = client
            .authorization_url(&["openid".to_string()], "s", &PkceChallenge::new())
            .unwrap();
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["scope"], "openid");
    }

    #[test]
    fn test_token_response_string_expiry() {
        let json = r#"{
            "token_type": "Bearer",
            "expires_in": "3599",
            "ext_expires_in": "3599",
            "resource": "https://analysis.windows.net/powerbi/api",
            "access_token": "eyJ0eXAi"
        }"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.expires_in, 3599);
        assert_eq!(token.access_token.expose(), "eyJ0eXAi");
        assert!(token.refresh_token.is_none());
    }

    #[test]
    fn test_token_response_numeric_expiry() {
        let json = r#"{"access_token": "a", "expires_in": 3600, "refresh_token": "r"}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.expires_in, 3600);
        assert_eq!(token.token_type, "Bearer");
        assert!(!format!("{:?}", token).contains("\"a\""));
    }

    #[test]
    fn test_parse_callback_success() {
        let url = "http://localhost:28491/callback?code=abc123&state=xyz789";
        let (code, state) = parse_callback_url(url).unwrap();
        assert_eq!(code, "abc123");
        assert_eq!(state, "xyz789");
    }

    #[test]
    fn test_parse_callback_error() {
        let url = "http://localhost:28491/callback?error=access_denied&error_description=User%20cancelled";
        let result = parse_callback_url(url);
        assert!(matches!(result, Err(AuthError::OAuthFailed(msg)) if msg == "User cancelled"));
    }

    #[test]
    fn test_parse_callback_missing_code() {
        let url = "http://localhost:28491/callback?state=xyz789";
        let result = parse_callback_url(url);
        assert!(matches!(result, Err(AuthError::InvalidAuthCode)));
    }
}
