//! In-memory token store - tokens live as long as the process.

use async_trait::async_trait;
use tokio::sync::RwLock;

use surge_core::ports::{TokenSet, TokenStore, TokenStoreError};

/// Token store backed by an async `RwLock`.
///
/// Note: Tokens are lost on process restart.
#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: RwLock<Option<TokenSet>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn load(&self) -> Result<Option<TokenSet>, TokenStoreError> {
        Ok(self.tokens.read().await.clone())
    }

    async fn save(&self, tokens: &TokenSet) -> Result<(), TokenStoreError> {
        *self.tokens.write().await = Some(tokens.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        self.tokens.write().await.take();
        Ok(())
    }
}
