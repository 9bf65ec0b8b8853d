use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::contract::{CommentView, PostView};
use crate::domain::model::{NewStar, StarRecord};

/// REST DTO for a feed post
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_avatar_url: String,
    pub caption: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub likes_count: u64,
    pub comments_count: u64,
    pub is_liked_by_current_user: bool,
}

/// Feed listing; serialized as a bare JSON array.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct PostListDto(pub Vec<PostDto>);

/// JSON body of `POST /api/posts`
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostReq {
    #[serde(default)]
    pub caption: String,
    pub user_id: Uuid,
    /// Externally hosted image.
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Multipart form of `POST /api/posts`; documentation only.
#[derive(Debug, Clone, ToSchema)]
#[schema(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct CreatePostForm {
    pub caption: Option<String>,
    pub user_id: Uuid,
    /// Image file; only `image/*` content types are accepted.
    #[schema(value_type = Option<String>, format = Binary)]
    pub file: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeReq {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentReq {
    #[serde(default)]
    pub text: String,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct CommentListDto(pub Vec<CommentDto>);

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StarDto {
    pub id: i32,
    pub user_name: String,
    pub email: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct StarListDto(pub Vec<StarDto>);

/// `createdAt` is always set by the server.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStarReq {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl From<PostView> for PostDto {
    fn from(p: PostView) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            user_name: p.user_name,
            user_avatar_url: p.user_avatar_url,
            caption: p.caption,
            image_url: p.image_url,
            created_at: p.created_at,
            likes_count: p.likes_count,
            comments_count: p.comments_count,
            is_liked_by_current_user: p.is_liked_by_current_user,
        }
    }
}

impl From<CommentView> for CommentDto {
    fn from(c: CommentView) -> Self {
        Self {
            id: c.id,
            post_id: c.post_id,
            user_id: c.user_id,
            user_name: c.user_name,
            text: c.text,
            created_at: c.created_at,
        }
    }
}

impl From<StarRecord> for StarDto {
    fn from(s: StarRecord) -> Self {
        Self {
            id: s.id,
            user_name: s.user_name,
            email: s.email,
            display_name: s.display_name,
            bio: s.bio,
            avatar_url: s.avatar_url,
            created_at: s.created_at,
        }
    }
}

impl From<CreateStarReq> for NewStar {
    fn from(req: CreateStarReq) -> Self {
        Self {
            user_name: req.user_name,
            email: req.email,
            display_name: req.display_name,
            bio: req.bio,
            avatar_url: req.avatar_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn post_dto_uses_camel_case() {
        let dto = PostDto {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            user_name: "ana".into(),
            user_avatar_url: "https://example.com/a.svg".into(),
            caption: "hi".into(),
            image_url: None,
            created_at: Utc::now(),
            likes_count: 2,
            comments_count: 1,
            is_liked_by_current_user: true,
        };
        let v = serde_json::to_value(dto).unwrap();
        assert_eq!(v["userName"], "ana");
        assert_eq!(v["likesCount"], 2);
        assert_eq!(v["isLikedByCurrentUser"], true);
        assert!(v["imageUrl"].is_null());

        let list = serde_json::to_value(PostListDto(vec![])).unwrap();
        assert!(list.as_array().is_some_and(Vec::is_empty));
    }

    #[test]
    fn create_post_caption_is_optional() {
        let id = Uuid::new_v4();
        let req: CreatePostReq =
            serde_json::from_value(json!({"userId": id, "imageUrl": "https://img/x.png"})).unwrap();
        assert_eq!(req.caption, "");
        assert_eq!(req.user_id, id);
        assert_eq!(req.image_url.as_deref(), Some("https://img/x.png"));
    }
}
