//! Request descriptors.
//!
//! Each Power BI endpoint is a small immutable value implementing
//! [`Request`]: it knows its method, path, query, body, the account types
//! that may not call it, and how to parse the response body.

use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::error::{PowerBiError, Result};
use crate::models::ConnectionAccountType;

pub trait Request: Send + Sync {
    type Output: Send;

    fn method(&self) -> Method {
        Method::GET
    }

    /// Path relative to the API base URL, starting with `/`.
    fn endpoint(&self) -> String;

    fn query(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn body(&self) -> Option<serde_json::Value> {
        None
    }

    /// Account types that must not send this request. Empty means everyone.
    fn restricted_account_types(&self) -> &'static [ConnectionAccountType] {
        &[]
    }

    fn parse_response(&self, body: &str) -> Result<Self::Output>;
}

/// Deserialize a response body, naming the endpoint on failure.
pub(crate) fn parse_json<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| PowerBiError::InvalidResponse(format!("{endpoint}: {e}")))
}

/// Percent-encode a path segment.
pub(crate) fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
