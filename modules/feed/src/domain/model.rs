use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub caption: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Per-post counters, plus whether the viewer liked it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostStats {
    pub likes: u64,
    pub comments: u64,
    pub liked_by_viewer: bool,
}

/// Uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Post creation input after transport decoding.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: Uuid,
    pub caption: String,
    /// Externally hosted image; ignored when `upload` is present.
    pub image_url: Option<String>,
    pub upload: Option<MediaUpload>,
}

/// Legacy profile card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarRecord {
    pub id: i32,
    pub user_name: String,
    pub email: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewStar {
    pub user_name: String,
    pub email: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}
