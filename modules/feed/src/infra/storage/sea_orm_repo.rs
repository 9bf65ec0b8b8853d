use std::collections::HashMap;

use anyhow::Context;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::model::{CommentRecord, NewStar, PostRecord, PostStats, StarRecord};
use crate::domain::repo::{PostsRepository, StarsRepository};
use crate::infra::storage::entity::{post_comments, post_likes, posts, stars};

/// A like that a concurrent request already stored leaves the post liked.
async fn insert_like<C: ConnectionTrait>(
    conn: &C,
    post_id: Uuid,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    post_likes::Entity::insert(post_likes::ActiveModel {
        post_id: Set(post_id),
        user_id: Set(user_id),
        created_at: Set(now),
    })
    .on_conflict(
        OnConflict::columns([post_likes::Column::PostId, post_likes::Column::UserId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await
    .context("like failed")?;
    Ok(())
}

pub struct SeaOrmPostsRepository {
    conn: DatabaseConnection,
}

impl SeaOrmPostsRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl PostsRepository for SeaOrmPostsRepository {
    async fn insert_post(&self, post: PostRecord) -> anyhow::Result<()> {
        let m: posts::ActiveModel = post.into();
        let _ = m.insert(&self.conn).await.context("insert post failed")?;
        Ok(())
    }

    async fn find_post(&self, id: Uuid) -> anyhow::Result<Option<PostRecord>> {
        let found = posts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_post failed")?;
        Ok(found.map(Into::into))
    }

    async fn list_posts(&self) -> anyhow::Result<Vec<PostRecord>> {
        let rows = posts::Entity::find()
            .order_by_desc(posts::Column::CreatedAt)
            .order_by_desc(posts::Column::Id)
            .all(&self.conn)
            .await
            .context("list_posts failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn post_stats(
        &self,
        post_ids: &[Uuid],
        viewer: Option<Uuid>,
    ) -> anyhow::Result<HashMap<Uuid, PostStats>> {
        let mut stats: HashMap<Uuid, PostStats> = HashMap::new();
        if post_ids.is_empty() {
            return Ok(stats);
        }

        let likes: Vec<(Uuid, Uuid)> = post_likes::Entity::find()
            .select_only()
            .column(post_likes::Column::PostId)
            .column(post_likes::Column::UserId)
            .filter(post_likes::Column::PostId.is_in(post_ids.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("load likes failed")?;
        for (post_id, user_id) in likes {
            let s = stats.entry(post_id).or_default();
            s.likes += 1;
            if viewer == Some(user_id) {
                s.liked_by_viewer = true;
            }
        }

        let comments: Vec<Uuid> = post_comments::Entity::find()
            .select_only()
            .column(post_comments::Column::PostId)
            .filter(post_comments::Column::PostId.is_in(post_ids.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("load comment counts failed")?;
        for post_id in comments {
            stats.entry(post_id).or_default().comments += 1;
        }

        Ok(stats)
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> anyhow::Result<bool> {
        let txn = self.conn.begin().await.context("begin transaction")?;

        let removed = post_likes::Entity::delete_by_id((post_id, user_id))
            .exec(&txn)
            .await
            .context("unlike failed")?;
        let liked = if removed.rows_affected > 0 {
            false
        } else {
            insert_like(&txn, post_id, user_id, now).await?;
            true
        };

        txn.commit().await.context("commit")?;
        Ok(liked)
    }

    async fn insert_comment(&self, comment: CommentRecord) -> anyhow::Result<()> {
        let m: post_comments::ActiveModel = comment.into();
        let _ = m
            .insert(&self.conn)
            .await
            .context("insert comment failed")?;
        Ok(())
    }

    async fn list_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<CommentRecord>> {
        let rows = post_comments::Entity::find()
            .filter(post_comments::Column::PostId.eq(post_id))
            .order_by_asc(post_comments::Column::CreatedAt)
            .order_by_asc(post_comments::Column::Id)
            .all(&self.conn)
            .await
            .context("list_comments failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

pub struct SeaOrmStarsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmStarsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> StarsRepository for SeaOrmStarsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn list_stars(&self) -> anyhow::Result<Vec<StarRecord>> {
        let rows = stars::Entity::find()
            .order_by_asc(stars::Column::Id)
            .all(&self.conn)
            .await
            .context("list_stars failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_star(&self, star: NewStar, now: DateTime<Utc>) -> anyhow::Result<StarRecord> {
        let m = stars::ActiveModel {
            id: NotSet,
            user_name: Set(star.user_name),
            email: Set(star.email),
            display_name: Set(star.display_name),
            bio: Set(star.bio),
            avatar_url: Set(star.avatar_url),
            created_at: Set(now),
        };
        let created = m.insert(&self.conn).await.context("insert star failed")?;
        Ok(created.into())
    }
}
