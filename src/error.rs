//! Error types for the Power BI client.
//!
//! Uses `thiserror` for library-style errors with automatic `Display` and `Error` implementations.

use reqwest::Method;
use thiserror::Error;

use crate::models::ConnectionAccountType;

/// Result alias used throughout the crate.
pub type Result<T, E = PowerBiError> = std::result::Result<T, E>;

/// Top-level error type for every Power BI operation.
#[derive(Error, Debug)]
pub enum PowerBiError {
    /// Malformed input: partial credentials, out-of-range `$top`, unknown enum strings.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The connector's account type is not allowed to call this endpoint.
    /// Raised before any network I/O.
    #[error("Account type '{account_type}' cannot access {method} {endpoint}")]
    AccountTypeRestricted {
        account_type: ConnectionAccountType,
        method: Method,
        endpoint: String,
    },

    /// The API answered 401 on an `/admin` path.
    #[error("Unauthorized (401) for admin endpoint {endpoint}: the credential lacks Power BI administrator rights")]
    UnauthorizedAdminAccess { endpoint: String },

    /// Any other non-2xx response.
    #[error("Power BI request to {endpoint} failed: HTTP {status}")]
    UpstreamRequestFailure {
        status: u16,
        endpoint: String,
        body: String,
    },

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to parse API response: {0}")]
    InvalidResponse(String),
}

/// OAuth and token related errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("OAuth2 authorization failed: {0}")]
    OAuthFailed(String),

    #[error("Invalid authorization code")]
    InvalidAuthCode,

    #[error("Token request failed: {0}")]
    TokenRequestFailed(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("State validation failed (possible CSRF attack)")]
    StateValidationFailed,

    #[error("Connector is not authenticated")]
    NotAuthenticated,

    #[error("{grant} is not available for {account_type} connectors")]
    UnsupportedGrant {
        grant: &'static str,
        account_type: ConnectionAccountType,
    },
}

impl PowerBiError {
    /// Returns a user-friendly message for display in the CLI.
    pub fn user_message(&self) -> &str {
        match self {
            Self::InvalidArgument(_) => "Invalid input. Check the arguments and configuration.",
            Self::AccountTypeRestricted { .. } => {
                "This endpoint is not available for the current account type."
            }
            Self::UnauthorizedAdminAccess { .. } => {
                "Admin access denied. The service principal needs Power BI administrator rights."
            }
            Self::UpstreamRequestFailure { status: 404, .. } => "The requested item was not found.",
            Self::UpstreamRequestFailure { status: 429, .. } => {
                "Too many requests. Please wait a moment."
            }
            Self::UpstreamRequestFailure { .. } => "Power BI rejected the request.",
            Self::Auth(AuthError::StateValidationFailed) => {
                "Security error. Please try signing in again."
            }
            Self::Auth(AuthError::NotAuthenticated) => "Not signed in. Please sign in first.",
            Self::Auth(AuthError::TokenRefreshFailed(_)) => "Session expired. Please sign in again.",
            Self::Auth(_) => "Sign-in failed. Check the credentials.",
            Self::Network(_) => "Network error. Check your connection.",
            Self::InvalidResponse(_) => "Unexpected response from Power BI.",
        }
    }

    /// Returns true if a fresh token might resolve this error.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            Self::Auth(AuthError::TokenRefreshFailed(_))
                | Self::Auth(AuthError::NotAuthenticated)
                | Self::UpstreamRequestFailure { status: 401, .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_type_restricted_message() {
        let err = PowerBiError::AccountTypeRestricted {
            account_type: ConnectionAccountType::ServicePrincipal,
            method: Method::GET,
            endpoint: "/reports/abc".into(),
        };
        assert_eq!(
            err.to_string(),
            "Account type 'ServicePrincipal' cannot access GET /reports/abc"
        );
    }

    #[test]
    fn test_user_messages() {
        let err = PowerBiError::Auth(AuthError::NotAuthenticated);
        assert_eq!(err.user_message(), "Not signed in. Please sign in first.");

        let err = PowerBiError::UpstreamRequestFailure {
            status: 404,
            endpoint: "/groups/x".into(),
            body: String::new(),
        };
        assert_eq!(err.user_message(), "The requested item was not found.");
    }

    #[test]
    fn test_requires_reauthentication() {
        let err = PowerBiError::UpstreamRequestFailure {
            status: 401,
            endpoint: "/groups".into(),
            body: String::new(),
        };
        assert!(err.requires_reauthentication());

        let err = PowerBiError::UnauthorizedAdminAccess {
            endpoint: "/admin/groups".into(),
        };
        assert!(!err.requires_reauthentication());
    }
}
