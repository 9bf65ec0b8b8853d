use async_trait::async_trait;

use crate::domain::model::MediaUpload;

/// Storage for uploaded post images.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist the upload and return the URL it is served under.
    async fn save(&self, upload: MediaUpload) -> anyhow::Result<String>;

    /// Delete a file previously returned by [`MediaStore::save`]; unknown URLs are a no-op.
    async fn remove(&self, url: &str) -> anyhow::Result<()>;
}
