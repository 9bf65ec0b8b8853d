use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A post as rendered in the feed, with author and interaction counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_avatar_url: String,
    pub caption: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub likes_count: u64,
    pub comments_count: u64,
    /// Always false when there is no viewer.
    pub is_liked_by_current_user: bool,
}

/// A comment with its author's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
