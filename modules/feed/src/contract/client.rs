use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{FeedError, PostView};

/// Read access to the feed for other modules, published to the `ClientHub`.
#[async_trait]
pub trait FeedApi: Send + Sync {
    /// All posts, newest first. `viewer` drives `is_liked_by_current_user`.
    async fn list_posts(&self, viewer: Option<Uuid>) -> Result<Vec<PostView>, FeedError>;

    async fn get_post(&self, id: Uuid, viewer: Option<Uuid>) -> Result<PostView, FeedError>;
}
