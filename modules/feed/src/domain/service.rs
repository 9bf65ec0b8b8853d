use std::collections::HashMap;
use std::sync::Arc;

use accounts::{AccountsApi, AccountsError};
use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::{CommentView, PostView};
use crate::domain::avatar::avatar_url;
use crate::domain::error::DomainError;
use crate::domain::model::{CommentRecord, NewPost, NewStar, PostRecord, StarRecord};
use crate::domain::ports::MediaStore;
use crate::domain::repo::{PostsRepository, StarsRepository};

/// Shown for authors the accounts module no longer knows.
const UNKNOWN_USER: &str = "unknown";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_caption_len: usize,
    pub max_comment_len: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_caption_len: 2200,
            max_comment_len: 1000,
        }
    }
}

/// Feed rules: posts, likes, comments and star cards.
/// Authors are resolved through the accounts client.
#[derive(Clone)]
pub struct Service {
    posts: Arc<dyn PostsRepository>,
    stars: Arc<dyn StarsRepository>,
    accounts: Arc<dyn AccountsApi>,
    media: Arc<dyn MediaStore>,
    config: ServiceConfig,
}

fn db_err(e: anyhow::Error) -> DomainError {
    DomainError::database(format!("{e:#}"))
}

fn accounts_err(e: AccountsError) -> DomainError {
    match e {
        AccountsError::NotFound { id } => DomainError::UserNotFound { id },
        AccountsError::Unauthorized => DomainError::Unauthorized,
        other => DomainError::Accounts {
            message: other.to_string(),
        },
    }
}

fn is_image(content_type: &str) -> bool {
    content_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("image/")
}

impl Service {
    pub fn new(
        posts: Arc<dyn PostsRepository>,
        stars: Arc<dyn StarsRepository>,
        accounts: Arc<dyn AccountsApi>,
        media: Arc<dyn MediaStore>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            posts,
            stars,
            accounts,
            media,
            config,
        }
    }

    /// User behind an optional bearer token; invalid tokens count as anonymous.
    pub async fn viewer(&self, bearer: Option<&str>) -> Option<Uuid> {
        let token = bearer?;
        match self.accounts.verify_session(token).await {
            Ok(user) => Some(user.id),
            Err(e) => {
                debug!(error = %e, "Ignoring invalid bearer token on a public read");
                None
            }
        }
    }

    /// A present bearer token must be valid and belong to `user_id`.
    pub async fn authorize(&self, bearer: Option<&str>, user_id: Uuid) -> Result<(), DomainError> {
        let Some(token) = bearer else {
            return Ok(());
        };
        let session = self
            .accounts
            .verify_session(token)
            .await
            .map_err(accounts_err)?;
        if session.id != user_id {
            return Err(DomainError::UserMismatch);
        }
        Ok(())
    }

    async fn user_names(&self, ids: Vec<Uuid>) -> Result<HashMap<Uuid, String>, DomainError> {
        let mut ids = ids;
        ids.sort_unstable();
        ids.dedup();
        let users = self.accounts.get_users(&ids).await.map_err(accounts_err)?;
        Ok(users.into_iter().map(|u| (u.id, u.user_name)).collect())
    }

    async fn render(
        &self,
        posts: Vec<PostRecord>,
        viewer: Option<Uuid>,
    ) -> Result<Vec<PostView>, DomainError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let stats = self
            .posts
            .post_stats(&ids, viewer)
            .await
            .map_err(db_err)?;
        let names = self
            .user_names(posts.iter().map(|p| p.user_id).collect())
            .await?;

        Ok(posts
            .into_iter()
            .map(|p| {
                let s = stats.get(&p.id).copied().unwrap_or_default();
                let user_name = names
                    .get(&p.user_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_USER.to_string());
                PostView {
                    id: p.id,
                    user_id: p.user_id,
                    user_avatar_url: avatar_url(&user_name),
                    user_name,
                    caption: p.caption,
                    image_url: p.image_url,
                    created_at: p.created_at,
                    likes_count: s.likes,
                    comments_count: s.comments,
                    is_liked_by_current_user: viewer.is_some() && s.liked_by_viewer,
                }
            })
            .collect())
    }

    async fn render_one(&self, post: PostRecord, viewer: Option<Uuid>) -> Result<PostView, DomainError> {
        let id = post.id;
        self.render(vec![post], viewer)
            .await?
            .pop()
            .ok_or(DomainError::PostNotFound { id })
    }

    async fn require_post(&self, id: Uuid) -> Result<PostRecord, DomainError> {
        self.posts
            .find_post(id)
            .await
            .map_err(db_err)?
            .ok_or(DomainError::PostNotFound { id })
    }

    #[instrument(name = "feed.service.list_posts", skip(self))]
    pub async fn list_posts(&self, viewer: Option<Uuid>) -> Result<Vec<PostView>, DomainError> {
        let posts = self.posts.list_posts().await.map_err(db_err)?;
        self.render(posts, viewer).await
    }

    pub async fn get_post(&self, id: Uuid, viewer: Option<Uuid>) -> Result<PostView, DomainError> {
        let post = self.require_post(id).await?;
        self.render_one(post, viewer).await
    }

    #[instrument(name = "feed.service.create_post", skip_all, fields(user_id = %input.user_id))]
    pub async fn create_post(&self, bearer: Option<&str>, input: NewPost) -> Result<PostView, DomainError> {
        self.authorize(bearer, input.user_id).await?;
        self.accounts
            .get_user(input.user_id)
            .await
            .map_err(accounts_err)?;

        let caption = input.caption.trim().to_string();
        let len = caption.chars().count();
        if len > self.config.max_caption_len {
            return Err(DomainError::CaptionTooLong {
                len,
                max: self.config.max_caption_len,
            });
        }

        let linked = input
            .image_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        if caption.is_empty() && input.upload.is_none() && linked.is_none() {
            return Err(DomainError::EmptyPost);
        }

        let uploaded = input.upload.is_some();
        let image_url = match input.upload {
            Some(upload) => {
                if !is_image(&upload.content_type) {
                    return Err(DomainError::UnsupportedMedia {
                        content_type: upload.content_type,
                    });
                }
                let size = upload.bytes.len();
                let url = self
                    .media
                    .save(upload)
                    .await
                    .map_err(|e| DomainError::storage(format!("{e:#}")))?;
                debug!(size, url = %url, "Stored post image");
                Some(url)
            }
            None => linked,
        };

        let post = PostRecord {
            id: Uuid::now_v7(),
            user_id: input.user_id,
            caption,
            image_url,
            created_at: Utc::now(),
        };
        if let Err(e) = self.posts.insert_post(post.clone()).await {
            if let Some(url) = post.image_url.as_deref().filter(|_| uploaded) {
                if let Err(rm) = self.media.remove(url).await {
                    warn!(error = %rm, url = %url, "Failed to remove image of unsaved post");
                }
            }
            return Err(db_err(e));
        }
        info!(post_id = %post.id, "Post created");
        self.render_one(post, Some(input.user_id)).await
    }

    #[instrument(name = "feed.service.toggle_like", skip(self, bearer))]
    pub async fn toggle_like(
        &self,
        bearer: Option<&str>,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<PostView, DomainError> {
        self.authorize(bearer, user_id).await?;
        let post = self.require_post(post_id).await?;
        self.accounts.get_user(user_id).await.map_err(accounts_err)?;

        let liked = self
            .posts
            .toggle_like(post_id, user_id, Utc::now())
            .await
            .map_err(db_err)?;
        debug!(liked, "Like toggled");
        self.render_one(post, Some(user_id)).await
    }

    #[instrument(name = "feed.service.add_comment", skip(self, bearer, text))]
    pub async fn add_comment(
        &self,
        bearer: Option<&str>,
        post_id: Uuid,
        user_id: Uuid,
        text: &str,
    ) -> Result<CommentView, DomainError> {
        self.authorize(bearer, user_id).await?;

        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::EmptyComment);
        }
        let len = text.chars().count();
        if len > self.config.max_comment_len {
            return Err(DomainError::CommentTooLong {
                len,
                max: self.config.max_comment_len,
            });
        }

        self.require_post(post_id).await?;
        let user = self.accounts.get_user(user_id).await.map_err(accounts_err)?;

        let comment = CommentRecord {
            id: Uuid::now_v7(),
            post_id,
            user_id,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        self.posts
            .insert_comment(comment.clone())
            .await
            .map_err(db_err)?;
        info!(comment_id = %comment.id, "Comment added");

        Ok(CommentView {
            id: comment.id,
            post_id,
            user_id,
            user_name: user.user_name,
            text: comment.text,
            created_at: comment.created_at,
        })
    }

    pub async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentView>, DomainError> {
        self.require_post(post_id).await?;
        let comments = self.posts.list_comments(post_id).await.map_err(db_err)?;
        if comments.is_empty() {
            return Ok(Vec::new());
        }
        let names = self
            .user_names(comments.iter().map(|c| c.user_id).collect())
            .await?;
        Ok(comments
            .into_iter()
            .map(|c| CommentView {
                user_name: names
                    .get(&c.user_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_USER.to_string()),
                id: c.id,
                post_id: c.post_id,
                user_id: c.user_id,
                text: c.text,
                created_at: c.created_at,
            })
            .collect())
    }

    pub async fn list_stars(&self) -> Result<Vec<StarRecord>, DomainError> {
        self.stars.list_stars().await.map_err(db_err)
    }

    pub async fn create_star(&self, star: NewStar) -> Result<StarRecord, DomainError> {
        let star = NewStar {
            user_name: star.user_name.trim().to_string(),
            email: star.email.trim().to_string(),
            ..star
        };
        if star.user_name.is_empty() {
            return Err(DomainError::invalid_star("userName is required"));
        }
        if star.email.is_empty() {
            return Err(DomainError::invalid_star("email is required"));
        }
        let created = self
            .stars
            .insert_star(star, Utc::now())
            .await
            .map_err(db_err)?;
        info!(star_id = created.id, "Star created");
        Ok(created)
    }
}
