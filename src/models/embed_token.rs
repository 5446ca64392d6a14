//! Embed tokens returned by the GenerateToken endpoints.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedToken {
    pub token: String,
    pub token_id: String,
    pub expiration: DateTime<Utc>,
}

impl EmbedToken {
    /// Time remaining until the token expires, or `None` if already expired.
    pub fn time_until_expiry(&self) -> Option<Duration> {
        let now = Utc::now();
        if self.expiration > now {
            Some(self.expiration - now)
        } else {
            None
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expiration <= Utc::now()
    }
}

impl std::fmt::Debug for EmbedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbedToken")
            .field("token", &"[REDACTED]")
            .field("token_id", &self.token_id)
            .field("expiration", &self.expiration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_token_parsing() {
        let json = r#"{
            "token": "H4sIAAAAAAAEAB2Wxw6EWAoE",
            "tokenId": "49ae3742-54c0-4c29-af52-619ff93b5c80",
            "expiration": "2030-07-29T17:58:19Z"
        }"#;

        let token: EmbedToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.token_id, "49ae3742-54c0-4c29-af52-619ff93b5c80");
        assert!(!token.is_expired());
        assert!(token.time_until_expiry().is_some());
    }

    #[test]
    fn test_embed_token_invalid_expiration() {
        let json = r#"{"token": "t", "tokenId": "id", "expiration": "tomorrow"}"#;
        assert!(serde_json::from_str::<EmbedToken>(json).is_err());
    }

    #[test]
    fn test_embed_token_debug_redacts() {
        let token = EmbedToken {
            token: "secret-embed".into(),
            token_id: "id".into(),
            expiration: Utc::now(),
        };
        assert!(!format!("{:?}", token).contains("secret-embed"));
    }
}
