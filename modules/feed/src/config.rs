use serde::{Deserialize, Serialize};

/// Configuration for the feed module (`modules.feed`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    /// Upload directory; relative paths resolve against the server home dir.
    pub media_dir: String,
    /// URL prefix the upload directory is served under.
    pub media_url_prefix: String,
    /// Origin prepended to image URLs, e.g. `http://localhost:5161`.
    /// Image URLs stay relative when unset.
    pub public_base_url: Option<String>,
    pub max_caption_len: usize,
    pub max_comment_len: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            media_dir: "media".to_string(),
            media_url_prefix: "/media".to_string(),
            public_base_url: None,
            max_caption_len: 2200,
            max_comment_len: 1000,
        }
    }
}

impl FeedConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let prefix = self.media_url_prefix.trim_end_matches('/');
        if !prefix.starts_with('/') || prefix.is_empty() {
            anyhow::bail!(
                "modules.feed.media_url_prefix must start with '/' and not be the root (got '{}')",
                self.media_url_prefix
            );
        }
        if let Some(base) = &self.public_base_url {
            url::Url::parse(base)
                .map_err(|e| anyhow::anyhow!("invalid modules.feed.public_base_url: {e}"))?;
        }
        if self.max_caption_len == 0 || self.max_comment_len == 0 {
            anyhow::bail!("modules.feed length limits must be positive");
        }
        Ok(())
    }

    /// Normalized prefix without a trailing slash.
    pub fn url_prefix(&self) -> &str {
        self.media_url_prefix.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = FeedConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.url_prefix(), "/media");
    }

    #[test]
    fn partial_section_keeps_defaults() {
        let cfg: FeedConfig = serde_json::from_value(serde_json::json!({"media_dir": "/srv/media"})).unwrap();
        assert_eq!(cfg.media_dir, "/srv/media");
        assert_eq!(cfg.max_caption_len, 2200);
    }

    #[test]
    fn root_prefix_is_rejected() {
        let cfg = FeedConfig {
            media_url_prefix: "/".into(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res: Result<FeedConfig, _> = serde_json::from_value(serde_json::json!({"media": "x"}));
        assert!(res.is_err());
    }
}
