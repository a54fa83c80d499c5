use std::sync::Arc;
use tokio::sync::RwLock;

use crate::cache::token::TokenCredential;

/// Single-slot token storage. Holds no expiry logic, the broker decides
/// whether a stored credential is still usable.
#[derive(Debug, Clone, Default)]
pub struct TokenCache {
    slot: Arc<RwLock<Option<TokenCredential>>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read(&self) -> Option<TokenCredential> {
        self.slot.read().await.clone()
    }

    /// Replace the slot unconditionally
    pub async fn write(&self, credential: TokenCredential) {
        *self.slot.write().await = Some(credential);
    }

    /// Returns the credential that was removed, if any
    pub async fn clear(&self) -> Option<TokenCredential> {
        self.slot.write().await.take()
    }

    /// Clear only while the slot still holds `token`.
    pub async fn clear_token(&self, token: &str) -> Option<TokenCredential> {
        let mut slot = self.slot.write().await;
        if slot.as_ref().is_some_and(|credential| credential.token == token) {
            slot.take()
        } else {
            None
        }
    }
}
