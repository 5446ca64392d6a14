//! Authenticated connection to the Power BI REST API.
//!
//! A [`Connector`] is bound to one account type for its whole life. It
//! resolves credentials, owns the OAuth client and token cache, and sends
//! [`Request`] descriptors with the account-type guard applied first.

use reqwest::header::ACCEPT;
use reqwest::{Method, Response};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::auth::credentials::{self, CredentialOverrides, Credentials};
use crate::auth::oauth::{self, OAuthClient, OAuthConfig, PkceChallenge};
use crate::auth::token_cache::{CachedToken, TokenCache};
use crate::auth::SecretString;
use crate::config::Config;
use crate::error::{AuthError, PowerBiError, Result};
use crate::guard;
use crate::models::ConnectionAccountType;
use crate::request::Request;
use crate::response_cache::{CacheKey, ResponseCache};

/// First delay between GET retries; doubled on every attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Authorization request in flight for an Azure user sign-in.
struct PendingAuthorization {
    state: String,
    pkce: PkceChallenge,
}

pub struct Connector {
    account_type: ConnectionAccountType,
    credentials: Credentials,
    oauth: OAuthClient,
    http_client: reqwest::Client,
    base_url: String,
    max_get_retries: u32,
    tokens: TokenCache,
    responses: ResponseCache,
    pending: Mutex<Option<PendingAuthorization>>,
}

impl Connector {
    /// Build a connector, resolving credentials from `overrides` or `config`.
    pub fn new(
        account_type: ConnectionAccountType,
        config: &Config,
        overrides: CredentialOverrides,
    ) -> Result<Self> {
        let credentials = credentials::resolve(account_type, overrides, &config.credentials)?;

        let oauth_config = match account_type {
            ConnectionAccountType::AzureUser => {
                OAuthConfig::authorization_code(&credentials, &config.api)
            }
            ConnectionAccountType::ServicePrincipal
            | ConnectionAccountType::AdminServicePrincipal => {
                OAuthConfig::client_credentials(&credentials, &config.api)
            }
        };
        let oauth = OAuthClient::new(oauth_config, &config.http)?;

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        info!(
            "Created {} connector for tenant {}",
            account_type, credentials.tenant
        );

        Ok(Self {
            account_type,
            credentials,
            oauth,
            http_client,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            max_get_retries: config.http.max_get_retries,
            tokens: TokenCache::new(
                config.cache.enabled,
                config.cache.refresh_before_expiry_seconds,
            ),
            responses: ResponseCache::new(
                config.cache.enabled,
                config.cache.response_ttl_seconds,
            ),
            pending: Mutex::new(None),
        })
    }

    pub fn service_principal(config: &Config, overrides: CredentialOverrides) -> Result<Self> {
        Self::new(ConnectionAccountType::ServicePrincipal, config, overrides)
    }

    pub fn admin_service_principal(
        config: &Config,
        overrides: CredentialOverrides,
    ) -> Result<Self> {
        Self::new(ConnectionAccountType::AdminServicePrincipal, config, overrides)
    }

    pub fn azure_user(config: &Config, overrides: CredentialOverrides) -> Result<Self> {
        Self::new(ConnectionAccountType::AzureUser, config, overrides)
    }

    pub fn account_type(&self) -> ConnectionAccountType {
        self.account_type
    }

    pub fn tenant(&self) -> &str {
        &self.credentials.tenant
    }

    pub fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    pub fn redirect_uri(&self) -> Option<&str> {
        self.credentials.redirect_uri.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn oauth_config(&self) -> &OAuthConfig {
        self.oauth.config()
    }

    /// Use `token` as the bearer token, replacing any cached one.
    ///
    /// Cached responses are dropped since they may belong to another identity.
    pub async fn authenticate(&self, token: impl Into<SecretString>) {
        self.tokens.store(CachedToken::explicit(token.into())).await;
        self.responses.clear();
        debug!("Explicit access token installed");
    }

    /// Drop the cached access token and acquire a new one.
    pub async fn reauthenticate(&self) -> Result<()> {
        self.tokens.invalidate().await;
        self.access_token().await.map(|_| ())
    }

    /// Forget all tokens, including an Azure user's refresh token.
    pub async fn sign_out(&self) {
        self.tokens.clear().await;
        self.responses.clear();
        info!("Signed out");
    }

    /// A valid bearer token, from the cache or a fresh grant.
    pub async fn access_token(&self) -> Result<SecretString> {
        if let Some(token) = self.tokens.get_valid().await {
            return Ok(token);
        }

        let response = match self.account_type {
            ConnectionAccountType::ServicePrincipal
            | ConnectionAccountType::AdminServicePrincipal => {
                self.oauth.request_client_credentials_token().await?
            }
            ConnectionAccountType::AzureUser => {
                let refresh = self
                    .tokens
                    .refresh_token()
                    .await
                    .ok_or(AuthError::NotAuthenticated)?;
                self.oauth.refresh_token(refresh.expose()).await?
            }
        };

        info!("Acquired access token for {} connector", self.account_type);
        let cached = CachedToken::from_response(response);
        let token = cached.access_token.clone();
        self.tokens.store(cached).await;
        Ok(token)
    }

    /// Start an Azure user sign-in: returns the browser URL and remembers
    /// the CSRF state and PKCE verifier for the callback.
    pub fn authorization_url(&self, scopes: &[String]) -> Result<Url> {
        if self.account_type != ConnectionAccountType::AzureUser {
            return Err(AuthError::UnsupportedGrant {
                grant: "authorization_code",
                account_type: self.account_type,
            }
            .into());
        }

        let state = oauth::generate_state();
        let pkce = PkceChallenge::new();
        let url = self.oauth.authorization_url(scopes, &state, &pkce)?;

        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(PendingAuthorization { state, pkce });

        Ok(url)
    }

    /// State of the last authorization URL, if a sign-in is pending.
    pub fn state(&self) -> Option<String> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|p| p.state.clone())
    }

    /// Finish a sign-in with the code and state from the redirect.
    pub async fn exchange_authorization_code(&self, code: &str, state: &str) -> Result<()> {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(AuthError::StateValidationFailed)?;

        if pending.state != state {
            warn!("Authorization state mismatch");
            return Err(AuthError::StateValidationFailed.into());
        }

        let response = self
            .oauth
            .exchange_code(code, &pending.pkce.verifier)
            .await?;
        self.tokens.store(CachedToken::from_response(response)).await;

        info!("Azure user signed in");
        Ok(())
    }

    /// Finish a sign-in from the full redirect URL.
    pub async fn handle_callback(&self, callback_url: &str) -> Result<()> {
        let (code, state) = oauth::parse_callback_url(callback_url)?;
        self.exchange_authorization_code(&code, &state).await
    }

    /// Send one request and parse its response.
    ///
    /// Successful GET bodies are cached per connector and reused until the
    /// configured TTL passes.
    pub async fn send<R: Request>(&self, request: &R) -> Result<R::Output> {
        guard::enforce_account_type_restrictions(self.account_type, request)?;

        let method = request.method();
        let endpoint = request.endpoint();
        let url = format!("{}{}", self.base_url, endpoint);
        let query = request.query();
        let body = request.body();

        let cache_key = CacheKey::for_request(&method, &endpoint, &query);
        if let Some(cached) = cache_key.as_ref().and_then(|key| self.responses.get(key)) {
            return request.parse_response(&cached);
        }

        let token = self.access_token().await?;

        debug!("{} {}", method, endpoint);
        let response = self
            .execute(&method, &url, &query, body.as_ref(), &token)
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!("{} {} failed: HTTP {}", method, endpoint, status);
            return Err(guard::classify_failure(status, &endpoint, text));
        }

        let output = request.parse_response(&text)?;
        if let Some(key) = cache_key {
            self.responses.insert(key, text);
        }
        Ok(output)
    }

    /// Drop every cached response body.
    pub fn clear_response_cache(&self) {
        self.responses.clear();
    }

    /// Issue the HTTP call. GETs are retried on connect and timeout errors.
    async fn execute(
        &self,
        method: &Method,
        url: &str,
        query: &[(String, String)],
        body: Option<&serde_json::Value>,
        token: &SecretString,
    ) -> Result<Response> {
        let mut retries = 0;
        let mut delay = RETRY_BASE_DELAY;

        loop {
            let mut builder = self
                .http_client
                .request(method.clone(), url)
                .bearer_auth(token.expose())
                .header(ACCEPT, "application/json");

            if !query.is_empty() {
                builder = builder.query(query);
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            match builder.send().await {
                Ok(response) => return Ok(response),
                Err(e)
                    if *method == Method::GET
                        && (e.is_connect() || e.is_timeout())
                        && retries < self.max_get_retries =>
                {
                    retries += 1;
                    warn!(
                        "Transient error {}, retry {}/{} after {:?}",
                        e, retries, self.max_get_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => return Err(PowerBiError::Network(e)),
            }
        }
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("account_type", &self.account_type)
            .field("tenant", &self.credentials.tenant)
            .field("client_id", &self.credentials.client_id)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config() -> Config {
        Config::embedded().unwrap()
    }

    fn user() -> Connector {
        Connector::azure_user(
            &config(),
            CredentialOverrides::new("tenant", "client", "secret")
                .with_redirect_uri("http://localhost:28491/callback"),
        )
        .unwrap()
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let err = Connector::service_principal(&config(), CredentialOverrides::default())
            .unwrap_err();
        assert!(matches!(err, PowerBiError::InvalidArgument(_)));
    }

    #[test]
    fn test_oauth_endpoints_by_account_type() {
        let sp = Connector::service_principal(
            &config(),
            CredentialOverrides::new("tenant", "client", "secret"),
        )
        .unwrap();
        assert_eq!(
            sp.oauth_config().token_url,
            "https://login.windows.net/tenant/oauth2/token"
        );
        assert!(sp.oauth_config().authorize_url.is_none());

        let user = user();
        assert_eq!(
            user.oauth_config().token_url,
            "https://login.microsoftonline.com/tenant/oauth2/token"
        );
        assert_eq!(
            user.oauth_config().authorize_url.as_deref(),
            Some("https://login.microsoftonline.com/tenant/oauth2/authorize")
        );
    }

    #[test]
    fn test_authorization_url_records_state() {
        let connector = user();
        assert!(connector.state().is_none());

        let url = connector.authorization_url(&[]).unwrap();
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();

        let state = connector.state().unwrap();
        assert_eq!(params["state"], state);
        assert_eq!(params["client_id"], "client");
    }

    #[test]
    fn test_authorization_url_requires_azure_user() {
        let connector = Connector::admin_service_principal(
            &config(),
            CredentialOverrides::new("tenant", "client", "secret"),
        )
        .unwrap();
        let err = connector.authorization_url(&[]).unwrap_err();
        assert!(matches!(
            err,
            PowerBiError::Auth(AuthError::UnsupportedGrant { .. })
        ));
    }

    #[tokio::test]
    async fn test_state_mismatch_rejected() {
        let connector = user();
        connector.authorization_url(&[]).unwrap();

        let err = connector
            .exchange_authorization_code("code", "forged")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PowerBiError::Auth(AuthError::StateValidationFailed)
        ));
        // The pending sign-in is consumed.
        assert!(connector.state().is_none());
    }

    #[tokio::test]
    async fn test_azure_user_without_sign_in() {
        let err = user().access_token().await.unwrap_err();
        assert!(matches!(err, PowerBiError::Auth(AuthError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_explicit_token_skips_grant() {
        let connector = user();
        connector.authenticate("explicit-token").await;
        assert_eq!(
            connector.access_token().await.unwrap().expose(),
            "explicit-token"
        );
    }
}
