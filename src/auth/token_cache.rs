//! Per-connector access token cache.
//!
//! Tokens acquired through a grant are reused until shortly before they
//! expire. A token handed in explicitly through `authenticate` is always
//! kept, cache enabled or not, because there is no grant to repeat.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::oauth::TokenResponse;
use super::SecretString;

/// Where a cached token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// Supplied by the caller.
    Explicit,
    /// Obtained from a grant flow.
    Acquired,
}

#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    /// `None` for explicit tokens without a known lifetime.
    pub expires_at: Option<DateTime<Utc>>,
    pub source: TokenSource,
}

impl CachedToken {
    pub fn explicit(access_token: SecretString) -> Self {
        Self {
            access_token,
            refresh_token: None,
            expires_at: None,
            source: TokenSource::Explicit,
        }
    }

    /// A lifetime too large to represent is treated as already expired, so
    /// the token is used once and not cached.
    pub fn from_response(response: TokenResponse) -> Self {
        let now = Utc::now();
        let expires_at = seconds(response.expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or_else(|| {
                warn!(
                    "Token lifetime of {}s is out of range, not caching",
                    response.expires_in
                );
                now
            });
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: Some(expires_at),
            source: TokenSource::Acquired,
        }
    }

    /// True while the token has more than `skew` left before expiry.
    pub fn is_fresh(&self, skew: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now()
                .checked_add_signed(skew)
                .is_some_and(|deadline| deadline < expires_at),
            None => true,
        }
    }
}

pub struct TokenCache {
    enabled: bool,
    skew: Duration,
    current: Mutex<Option<CachedToken>>,
    /// Kept separately so a refresh grant still works with caching off.
    refresh_token: Mutex<Option<SecretString>>,
}

impl TokenCache {
    pub fn new(enabled: bool, refresh_before_expiry_seconds: u64) -> Self {
        Self {
            enabled,
            skew: seconds(refresh_before_expiry_seconds).unwrap_or(Duration::MAX),
            current: Mutex::new(None),
            refresh_token: Mutex::new(None),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The cached access token, if it is still fresh.
    pub async fn get_valid(&self) -> Option<SecretString> {
        let guard = self.current.lock().await;
        let token = guard.as_ref()?;
        if token.is_fresh(self.skew) {
            Some(token.access_token.clone())
        } else {
            if let Some(expires_at) = token.expires_at {
                debug!("Cached token expires at {}, renewing", expires_at);
            }
            None
        }
    }

    /// Store a token. Acquired tokens are dropped when caching is disabled.
    pub async fn store(&self, token: CachedToken) {
        if let Some(refresh) = token.refresh_token.clone() {
            *self.refresh_token.lock().await = Some(refresh);
        }

        if token.source == TokenSource::Acquired && !self.enabled {
            return;
        }

        if let Some(expires_at) = token.expires_at {
            if let Some(remaining) = time_until_expiry(expires_at) {
                debug!("Caching access token, valid for {}", format_duration(remaining));
            }
        }
        *self.current.lock().await = Some(token);
    }

    pub async fn refresh_token(&self) -> Option<SecretString> {
        self.refresh_token.lock().await.clone()
    }

    /// Forget the access token. The refresh token survives.
    pub async fn invalidate(&self) {
        *self.current.lock().await = None;
    }

    /// Forget everything, including the refresh token.
    pub async fn clear(&self) {
        self.invalidate().await;
        *self.refresh_token.lock().await = None;
    }
}

/// `secs` as a chrono duration, if it fits.
fn seconds(secs: u64) -> Option<Duration> {
    i64::try_from(secs).ok().and_then(Duration::try_seconds)
}

/// Remaining time until `expiry`, or `None` if it has passed.
pub fn time_until_expiry(expiry: DateTime<Utc>) -> Option<Duration> {
    let now = Utc::now();

    if expiry > now {
        Some(expiry - now)
    } else {
        None
    }
}

/// Format duration as human-readable string (e.g., "45 min", "1 hour").
pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes();

    if total_minutes < 1 {
        "< 1 min".to_string()
    } else if total_minutes < 60 {
        format!("{} min", total_minutes)
    } else {
        let hours = total_minutes / 60;
        let mins = total_minutes % 60;
        if mins == 0 {
            format!("{} hour{}", hours, if hours == 1 { "" } else { "s" })
        } else {
            format!("{}h {}m", hours, mins)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acquired(expires_in: i64) -> CachedToken {
        CachedToken {
            access_token: "acquired".into(),
            refresh_token: Some("refresh".into()),
            expires_at: Some(Utc::now() + Duration::seconds(expires_in)),
            source: TokenSource::Acquired,
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::seconds(30)), "< 1 min");
        assert_eq!(format_duration(Duration::minutes(45)), "45 min");
        assert_eq!(format_duration(Duration::hours(2)), "2 hours");
        assert_eq!(format_duration(Duration::minutes(90)), "1h 30m");
    }

    #[tokio::test]
    async fn test_fresh_token_is_reused() {
        let cache = TokenCache::new(true, 300);
        cache.store(acquired(3600)).await;
        assert_eq!(cache.get_valid().await.unwrap().expose(), "acquired");
    }

    #[tokio::test]
    async fn test_token_inside_skew_is_stale() {
        let cache = TokenCache::new(true, 300);
        cache.store(acquired(120)).await;
        assert!(cache.get_valid().await.is_none());
        // The refresh token is still available for renewal.
        assert_eq!(cache.refresh_token().await.unwrap().expose(), "refresh");
    }

    #[tokio::test]
    async fn test_disabled_cache_keeps_explicit_tokens_only() {
        let cache = TokenCache::new(false, 300);
        cache.store(acquired(3600)).await;
        assert!(cache.get_valid().await.is_none());
        assert!(cache.refresh_token().await.is_some());

        cache.store(CachedToken::explicit("explicit".into())).await;
        assert_eq!(cache.get_valid().await.unwrap().expose(), "explicit");
    }

    fn response(expires_in: u64) -> TokenResponse {
        serde_json::from_value(serde_json::json!({
            "access_token": "acquired",
            "expires_in": expires_in
        }))
        .unwrap()
    }

    #[test]
    fn test_from_response_lifetime() {
        let token = CachedToken::from_response(response(3600));
        let remaining = time_until_expiry(token.expires_at.unwrap()).unwrap();
        assert!(remaining > Duration::minutes(59));
        assert!(token.is_fresh(Duration::minutes(5)));
    }

    #[test]
    fn test_out_of_range_lifetime_is_expired() {
        for expires_in in [10_000_000_000_000, i64::MAX as u64, u64::MAX] {
            let token = CachedToken::from_response(response(expires_in));
            assert!(!token.is_fresh(Duration::zero()));
        }
    }

    #[tokio::test]
    async fn test_huge_skew_never_fresh() {
        let cache = TokenCache::new(true, u64::MAX);
        cache.store(acquired(3600)).await;
        assert!(cache.get_valid().await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = TokenCache::new(true, 0);
        cache.store(acquired(3600)).await;
        cache.invalidate().await;
        assert!(cache.get_valid().await.is_none());
        assert!(cache.refresh_token().await.is_some());

        cache.clear().await;
        assert!(cache.refresh_token().await.is_none());
    }
}
