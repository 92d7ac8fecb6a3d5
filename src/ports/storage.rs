use async_trait::async_trait;
use std::error::Error;
use std::path::Path;

/// Object store collaborator. The pipeline reads sources and writes outputs
/// through this port and never embeds storage-specific logic beyond key
/// resolution.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait StoragePort: Send + Sync {
    /// Download a file from storage to a local path
    async fn download(
        &self,
        key: &str,
        local_path: &Path,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Upload a file from a local path to storage
    async fn upload(
        &self,
        local_path: &Path,
        key: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Publicly reachable URL for a stored key
    fn public_url(&self, key: &str) -> String;
}
