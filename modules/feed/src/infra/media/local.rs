use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::model::MediaUpload;
use crate::domain::ports::MediaStore;

/// Stores uploads as files in one directory served under `url_prefix`.
pub struct LocalMediaStore {
    dir: PathBuf,
    url_prefix: String,
    public_base_url: Option<String>,
}

impl LocalMediaStore {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: &str, public_base_url: Option<&str>) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
            public_base_url: public_base_url.map(|b| b.trim_end_matches('/').to_string()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn url_for(&self, file_name: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{base}{}/{file_name}", self.url_prefix),
            None => format!("{}/{file_name}", self.url_prefix),
        }
    }

    /// File name inside `dir` for a URL produced by [`Self::url_for`].
    fn file_name_of<'a>(&self, url: &'a str) -> Option<&'a str> {
        let prefix = self.url_for("");
        url.strip_prefix(prefix.as_str())
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && *name != "..")
    }
}

/// Extension from the content type, then from the client file name.
fn extension_for(upload: &MediaUpload) -> String {
    let from_type = match upload.content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    };
    if let Some(ext) = from_type {
        return ext.to_string();
    }
    upload
        .file_name
        .as_deref()
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "img".to_string())
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn save(&self, upload: MediaUpload) -> anyhow::Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("create media dir {}", self.dir.display()))?;

        let file_name = format!("{}.{}", Uuid::new_v4().simple(), extension_for(&upload));
        let path = self.dir.join(&file_name);
        tokio::fs::write(&path, &upload.bytes)
            .await
            .with_context(|| format!("write {}", path.display()))?;

        Ok(self.url_for(&file_name))
    }

    async fn remove(&self, url: &str) -> anyhow::Result<()> {
        let Some(name) = self.file_name_of(url) else {
            return Ok(());
        };
        let path = self.dir.join(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
        }
    }
}
