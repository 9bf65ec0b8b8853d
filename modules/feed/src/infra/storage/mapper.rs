use sea_orm::Set;

use crate::domain::model::{CommentRecord, PostRecord, StarRecord};
use crate::infra::storage::entity::{post_comments, posts, stars};

impl From<posts::Model> for PostRecord {
    fn from(m: posts::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            caption: m.caption,
            image_url: m.image_url,
            created_at: m.created_at,
        }
    }
}

impl From<PostRecord> for posts::ActiveModel {
    fn from(p: PostRecord) -> Self {
        Self {
            id: Set(p.id),
            user_id: Set(p.user_id),
            caption: Set(p.caption),
            image_url: Set(p.image_url),
            created_at: Set(p.created_at),
        }
    }
}

impl From<post_comments::Model> for CommentRecord {
    fn from(m: post_comments::Model) -> Self {
        Self {
            id: m.id,
            post_id: m.post_id,
            user_id: m.user_id,
            text: m.text,
            created_at: m.created_at,
        }
    }
}

impl From<CommentRecord> for post_comments::ActiveModel {
    fn from(c: CommentRecord) -> Self {
        Self {
            id: Set(c.id),
            post_id: Set(c.post_id),
            user_id: Set(c.user_id),
            text: Set(c.text),
            created_at: Set(c.created_at),
        }
    }
}

impl From<stars::Model> for StarRecord {
    fn from(m: stars::Model) -> Self {
        Self {
            id: m.id,
            user_name: m.user_name,
            email: m.email,
            display_name: m.display_name,
            bio: m.bio,
            avatar_url: m.avatar_url,
            created_at: m.created_at,
        }
    }
}
