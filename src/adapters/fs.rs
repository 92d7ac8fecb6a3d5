//! Local-filesystem storage adapter.
//!
//! Keys resolve under a configured root directory; public URLs are built
//! from a configured base. Useful for development and for deployments that
//! mount a bucket as a filesystem.

use crate::ports::storage::StoragePort;
use async_trait::async_trait;
use std::error::Error;
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct FsStorage {
    root: PathBuf,
    public_base_url: String,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl StoragePort for FsStorage {
    async fn download(
        &self,
        key: &str,
        local_path: &Path,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let source = self.resolve(key);
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&source, local_path).await?;
        Ok(())
    }

    async fn upload(
        &self,
        local_path: &Path,
        key: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let dest = self.resolve(key);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(local_path, &dest).await?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }
}
