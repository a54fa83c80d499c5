use chrono::{DateTime, Duration, Utc};

/// Service token issued by the upstream endpoint together with its local lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCredential {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TokenCredential {
    pub fn new(token: String, issued_at: DateTime<Utc>, cache_duration: Duration) -> Self {
        Self {
            token,
            issued_at,
            expires_at: issued_at
                .checked_add_signed(cache_duration)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// A credential is usable strictly before its expiry instant.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}
