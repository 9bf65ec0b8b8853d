use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::model::{CommentRecord, NewStar, PostRecord, PostStats, StarRecord};

/// Persistence port for posts, likes and comments.
#[async_trait]
pub trait PostsRepository: Send + Sync {
    async fn insert_post(&self, post: PostRecord) -> anyhow::Result<()>;
    async fn find_post(&self, id: Uuid) -> anyhow::Result<Option<PostRecord>>;
    /// Newest first.
    async fn list_posts(&self) -> anyhow::Result<Vec<PostRecord>>;
    /// Counters for the given posts; posts without likes or comments may be absent.
    async fn post_stats(
        &self,
        post_ids: &[Uuid],
        viewer: Option<Uuid>,
    ) -> anyhow::Result<HashMap<Uuid, PostStats>>;
    /// Flip the like of `user_id` on `post_id`. Returns true when the post is now liked.
    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> anyhow::Result<bool>;
    async fn insert_comment(&self, comment: CommentRecord) -> anyhow::Result<()>;
    /// Comments of a post in insertion order.
    async fn list_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<CommentRecord>>;
}

#[async_trait]
pub trait StarsRepository: Send + Sync {
    async fn list_stars(&self) -> anyhow::Result<Vec<StarRecord>>;
    async fn insert_star(&self, star: NewStar, now: DateTime<Utc>) -> anyhow::Result<StarRecord>;
}
