//! File-backed token store, so a CLI session survives between runs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use surge_core::ports::{TokenSet, TokenStore, TokenStoreError};

/// Persists tokens as JSON at a fixed path.
///
/// Writes go to a sibling temp file first and are renamed into place. On
/// unix the temp file is created owner-only, so the tokens are never
/// readable by anyone else, not even briefly.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<TokenSet>, TokenStoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TokenStoreError::Io(e.to_string())),
        };

        match serde_json::from_slice(&raw) {
            Ok(tokens) => Ok(Some(tokens)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Discarding unreadable token file");
                Ok(None)
            }
        }
    }

    async fn save(&self, tokens: &TokenSet) -> Result<(), TokenStoreError> {
        let json = serde_json::to_vec_pretty(tokens)
            .map_err(|e| TokenStoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TokenStoreError::Io(e.to_string()))?;
        }

        let tmp = self.path.with_extension("tmp");
        write_private(&tmp, &json)
            .await
            .map_err(|e| TokenStoreError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| TokenStoreError::Io(e.to_string()))?;

        tracing::debug!(path = %self.path.display(), "Tokens saved");
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TokenStoreError::Io(e.to_string())),
        }
    }
}

/// Create `path` fresh and write `contents`. The mode only applies on
/// creation, so a leftover temp file from an interrupted save goes first.
async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}
