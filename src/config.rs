//! Configuration loading and management.
//!
//! Loads configuration from the embedded config.toml, merges an optional user
//! file on top, then applies environment variable overrides.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::auth::SecretString;

/// Embedded configuration file content.
const CONFIG_TOML: &str = include_str!("../config.toml");

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub credentials: CredentialsConfig,
    pub api: ApiConfig,
    pub http: HttpConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// Fallback credentials used when a connector is built without overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    pub tenant: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub admin_client_id: String,
    pub admin_client_secret: SecretString,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Host of the v1 token endpoint used by the client-credentials grant.
    pub login_v1_host: String,
    /// Host of the authorize/token endpoints used by the user grant.
    pub login_v2_host: String,
    pub resource: String,
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
    pub max_get_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub refresh_before_expiry_seconds: u64,
    /// Lifetime of cached GET responses. Zero turns response caching off.
    pub response_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    /// The embedded defaults, without user file or environment overrides.
    pub fn embedded() -> Result<Self> {
        Self::from_toml_str(CONFIG_TOML).context("Failed to parse embedded config.toml")
    }

    /// Load configuration from the default user config location.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, merging `path` (or the default user config file)
    /// over the embedded defaults and applying environment overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut merged: toml::Value =
            toml::from_str(CONFIG_TOML).context("Failed to parse embedded config.toml")?;

        let user_file = path.map(Path::to_path_buf).or_else(user_config_path);
        if let Some(file) = user_file.filter(|p| p.exists()) {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let overlay: toml::Value = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            tracing::debug!("Merging user config from {}", file.display());
            merge_toml(&mut merged, overlay);
        }

        let mut config: Config = merged
            .try_into()
            .context("Configuration has an invalid shape")?;

        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a complete configuration document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `POWER_BI_*` overrides looked up through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let creds = &mut self.credentials;

        if let Some(tenant) = lookup("POWER_BI_TENANT") {
            creds.tenant = tenant;
        }
        if let Some(client_id) = lookup("POWER_BI_CLIENT_ID") {
            creds.client_id = client_id;
        }
        if let Some(secret) = lookup("POWER_BI_CLIENT_SECRET") {
            creds.client_secret = secret.into();
        }
        if let Some(client_id) = lookup("POWER_BI_ADMIN_CLIENT_ID") {
            creds.admin_client_id = client_id;
        }
        if let Some(secret) = lookup("POWER_BI_ADMIN_CLIENT_SECRET") {
            creds.admin_client_secret = secret.into();
        }
        if let Some(redirect_uri) = lookup("POWER_BI_REDIRECT_URI") {
            creds.redirect_uri = redirect_uri;
        }

        if let Some(enabled) = lookup("POWER_BI_CACHE_ENABLED") {
            self.cache.enabled = parse_bool(&enabled)
                .with_context(|| format!("POWER_BI_CACHE_ENABLED must be a boolean, got '{enabled}'"))?;
        }

        if let Some(ttl) = lookup("POWER_BI_CACHE_TTL_SECONDS") {
            self.cache.response_ttl_seconds = ttl.trim().parse().with_context(|| {
                format!("POWER_BI_CACHE_TTL_SECONDS must be a whole number, got '{ttl}'")
            })?;
        }

        if let Some(log_level) = lookup("RUST_LOG") {
            self.logging.level = log_level;
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("api.base_url", &self.api.base_url),
            ("api.login_v1_host", &self.api.login_v1_host),
            ("api.login_v2_host", &self.api.login_v2_host),
        ] {
            Url::parse(value).with_context(|| format!("{name} is not a valid URL: '{value}'"))?;
        }

        if self.http.timeout_seconds == 0 || self.http.connect_timeout_seconds == 0 {
            anyhow::bail!("http timeouts must be greater than zero");
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.http.connect_timeout_seconds)
    }
}

impl ApiConfig {
    /// Token URL for the client-credentials grant.
    pub fn client_credentials_token_url(&self, tenant: &str) -> String {
        format!(
            "{}/{}/oauth2/token",
            self.login_v1_host.trim_end_matches('/'),
            tenant
        )
    }

    /// Authorization URL for the user grant.
    pub fn authorize_url(&self, tenant: &str) -> String {
        format!(
            "{}/{}/oauth2/authorize",
            self.login_v2_host.trim_end_matches('/'),
            tenant
        )
    }

    /// Token URL for the user grant.
    pub fn user_token_url(&self, tenant: &str) -> String {
        format!(
            "{}/{}/oauth2/token",
            self.login_v2_host.trim_end_matches('/'),
            tenant
        )
    }
}

/// `~/.config/powerbi/config.toml` or the platform equivalent.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "powerbi", "powerbi").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Recursively merge `overlay` tables into `base`. Non-table values replace.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
