//! Azure AD authentication.
//!
//! Credential resolution, OAuth2 grant flows (client credentials,
//! authorization code with PKCE, refresh token), a per-connector token cache
//! and the local redirect listener used for interactive sign-in.

pub mod callback_server;
pub mod credentials;
pub mod oauth;
pub mod secret;
pub mod token_cache;

pub use credentials::{CredentialOverrides, Credentials};
pub use oauth::{OAuthClient, OAuthConfig, PkceChallenge, TokenResponse};
pub use secret::SecretString;
pub use token_cache::{CachedToken, TokenCache};
