//! Credential resolution from explicit overrides or configuration.

use crate::config::CredentialsConfig;
use crate::error::{PowerBiError, Result};
use crate::models::ConnectionAccountType;

use super::SecretString;

/// Explicit credentials passed when building a connector.
///
/// `tenant`, `client_id` and `client_secret` must be given together or not
/// at all. `redirect_uri` is independent.
#[derive(Debug, Clone, Default)]
pub struct CredentialOverrides {
    pub tenant: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub redirect_uri: Option<String>,
}

impl CredentialOverrides {
    pub fn new(
        tenant: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<SecretString>,
    ) -> Self {
        Self {
            tenant: Some(tenant.into()),
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            redirect_uri: None,
        }
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    fn supplied_count(&self) -> usize {
        [
            self.tenant.is_some(),
            self.client_id.is_some(),
            self.client_secret.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

/// Fully resolved credentials for one connector.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub tenant: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: Option<String>,
}

/// Resolve credentials for `account_type`.
///
/// With no overrides the configuration values are used; the admin variant
/// reads `admin_client_id`/`admin_client_secret`. Every required field must
/// be non-empty.
pub fn resolve(
    account_type: ConnectionAccountType,
    overrides: CredentialOverrides,
    config: &CredentialsConfig,
) -> Result<Credentials> {
    let supplied = overrides.supplied_count();
    if supplied != 0 && supplied != 3 {
        let mut missing = Vec::new();
        if overrides.tenant.is_none() {
            missing.push("tenant");
        }
        if overrides.client_id.is_none() {
            missing.push("client_id");
        }
        if overrides.client_secret.is_none() {
            missing.push("client_secret");
        }
        return Err(PowerBiError::InvalidArgument(format!(
            "tenant, client_id and client_secret must be supplied together; missing: {}",
            missing.join(", ")
        )));
    }

    let (id_field, secret_field) = match account_type {
        ConnectionAccountType::AdminServicePrincipal => ("admin_client_id", "admin_client_secret"),
        _ => ("client_id", "client_secret"),
    };

    let (tenant, client_id, client_secret) = match overrides.tenant {
        Some(tenant) => (
            tenant,
            overrides.client_id.unwrap_or_default(),
            overrides.client_secret.unwrap_or_default(),
        ),
        None => match account_type {
            ConnectionAccountType::AdminServicePrincipal => (
                config.tenant.clone(),
                config.admin_client_id.clone(),
                config.admin_client_secret.clone(),
            ),
            _ => (
                config.tenant.clone(),
                config.client_id.clone(),
                config.client_secret.clone(),
            ),
        },
    };

    let redirect_uri = overrides
        .redirect_uri
        .or_else(|| Some(config.redirect_uri.clone()))
        .filter(|uri| !uri.trim().is_empty());

    let mut missing = Vec::new();
    if tenant.trim().is_empty() {
        missing.push("tenant");
    }
    if client_id.trim().is_empty() {
        missing.push(id_field);
    }
    if client_secret.is_empty() {
        missing.push(secret_field);
    }
    if account_type == ConnectionAccountType::AzureUser && redirect_uri.is_none() {
        missing.push("redirect_uri");
    }

    if !missing.is_empty() {
        return Err(PowerBiError::InvalidArgument(format!(
            "{account_type} credentials are incomplete; missing: {}",
            missing.join(", ")
        )));
    }

    Ok(Credentials {
        tenant,
        client_id,
        client_secret,
        redirect_uri,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CredentialsConfig {
        CredentialsConfig {
            tenant: "cfg-tenant".into(),
            client_id: "cfg-client".into(),
            client_secret: "cfg-secret".into(),
            admin_client_id: "cfg-admin".into(),
            admin_client_secret: "cfg-admin-secret".into(),
            redirect_uri: String::new(),
        }
    }

    #[test]
    fn test_falls_back_to_config() {
        let creds = resolve(
            ConnectionAccountType::ServicePrincipal,
            CredentialOverrides::default(),
            &config(),
        )
        .unwrap();
        assert_eq!(creds.tenant, "cfg-tenant");
        assert_eq!(creds.client_id, "cfg-client");
        assert_eq!(creds.client_secret.expose(), "cfg-secret");
    }

    #[test]
    fn test_admin_uses_admin_pair() {
        let creds = resolve(
            ConnectionAccountType::AdminServicePrincipal,
            CredentialOverrides::default(),
            &config(),
        )
        .unwrap();
        assert_eq!(creds.client_id, "cfg-admin");
        assert_eq!(creds.client_secret.expose(), "cfg-admin-secret");
    }

    #[test]
    fn test_explicit_overrides_win() {
        let creds = resolve(
            ConnectionAccountType::AdminServicePrincipal,
            CredentialOverrides::new("t", "c", "s"),
            &config(),
        )
        .unwrap();
        assert_eq!(creds.tenant, "t");
        assert_eq!(creds.client_id, "c");
    }

    #[test]
    fn test_partial_overrides_rejected() {
        let overrides = CredentialOverrides {
            tenant: Some("t".into()),
            client_id: Some("c".into()),
            ..Default::default()
        };
        let err = resolve(ConnectionAccountType::ServicePrincipal, overrides, &config())
            .unwrap_err();
        assert!(matches!(err, PowerBiError::InvalidArgument(_)));
        assert!(err.to_string().contains("client_secret"));

        let overrides = CredentialOverrides {
            client_secret: Some("s".into()),
            ..Default::default()
        };
        let err = resolve(ConnectionAccountType::ServicePrincipal, overrides, &config())
            .unwrap_err();
        assert!(err.to_string().contains("tenant, client_id"));
    }

    #[test]
    fn test_empty_config_names_every_missing_field() {
        let mut cfg = config();
        cfg.admin_client_id.clear();
        cfg.admin_client_secret = SecretString::default();

        let err = resolve(
            ConnectionAccountType::AdminServicePrincipal,
            CredentialOverrides::default(),
            &cfg,
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("admin_client_id"));
        assert!(message.contains("admin_client_secret"));
        assert!(!message.contains("tenant"));
    }

    #[test]
    fn test_azure_user_requires_redirect_uri() {
        let err = resolve(
            ConnectionAccountType::AzureUser,
            CredentialOverrides::default(),
            &config(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("redirect_uri"));

        let creds = resolve(
            ConnectionAccountType::AzureUser,
            CredentialOverrides::new("t", "c", "s").with_redirect_uri("http://localhost/cb"),
            &config(),
        )
        .unwrap();
        assert_eq!(creds.redirect_uri.as_deref(), Some("http://localhost/cb"));
    }
}
