//! SeaORM-backed repositories for the domain ports.
//!
//! The users repository is generic over `C: ConnectionTrait`, so it can be
//! built on a `DatabaseConnection` or a transaction. Reset-token consumption
//! needs its own transaction and therefore holds a `DatabaseConnection`.

use anyhow::Context;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::model::{ResetTokenRecord, UserRecord};
use crate::domain::repo::{ResetTokenRepository, UniqueViolation, UsersRepository};
use crate::infra::storage::entity::{password_reset_tokens as tokens, users};

fn insert_err(e: DbErr, what: &'static str) -> anyhow::Error {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            anyhow::Error::new(UniqueViolation).context(format!("{what}: {detail}"))
        }
        _ => anyhow::Error::new(e).context(what),
    }
}

pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRecord>> {
        let found = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        Ok(found.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<UserRecord>> {
        let rows = users::Entity::find()
            .filter(users::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await
            .context("find_by_ids failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        let found = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("find_by_email failed")?;
        Ok(found.map(Into::into))
    }

    async fn find_by_user_name(&self, user_name: &str) -> anyhow::Result<Option<UserRecord>> {
        let found = users::Entity::find()
            .filter(users::Column::UserName.eq(user_name))
            .one(&self.conn)
            .await
            .context("find_by_user_name failed")?;
        Ok(found.map(Into::into))
    }

    async fn email_exists(&self, email: &str) -> anyhow::Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.conn)
            .await
            .context("email_exists failed")?;
        Ok(count > 0)
    }

    async fn user_name_exists(&self, user_name: &str) -> anyhow::Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::UserName.eq(user_name))
            .count(&self.conn)
            .await
            .context("user_name_exists failed")?;
        Ok(count > 0)
    }

    async fn insert(&self, user: UserRecord) -> anyhow::Result<()> {
        let m: users::ActiveModel = user.into();
        let _ = m
            .insert(&self.conn)
            .await
            .map_err(|e| insert_err(e, "insert user failed"))?;
        Ok(())
    }
}

pub struct SeaOrmResetTokenRepository {
    conn: DatabaseConnection,
}

impl SeaOrmResetTokenRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl ResetTokenRepository for SeaOrmResetTokenRepository {
    async fn invalidate_active(&self, user_id: Uuid, now: DateTime<Utc>) -> anyhow::Result<u64> {
        let res = tokens::Entity::update_many()
            .col_expr(tokens::Column::Used, Expr::value(true))
            .filter(tokens::Column::UserId.eq(user_id))
            .filter(tokens::Column::Used.eq(false))
            .filter(tokens::Column::ExpiresAt.gt(now))
            .exec(&self.conn)
            .await
            .context("invalidate reset tokens failed")?;
        Ok(res.rows_affected)
    }

    async fn insert(&self, token: ResetTokenRecord) -> anyhow::Result<()> {
        let m: tokens::ActiveModel = token.into();
        let _ = m
            .insert(&self.conn)
            .await
            .context("insert reset token failed")?;
        Ok(())
    }

    async fn consume_and_set_password(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Uuid>> {
        let txn = self.conn.begin().await.context("begin transaction")?;

        // Conditional update: only a live token flips to used
        let res = tokens::Entity::update_many()
            .col_expr(tokens::Column::Used, Expr::value(true))
            .filter(tokens::Column::Token.eq(token))
            .filter(tokens::Column::Used.eq(false))
            .filter(tokens::Column::ExpiresAt.gt(now))
            .exec(&txn)
            .await
            .context("consume reset token failed")?;
        if res.rows_affected == 0 {
            txn.rollback().await.context("rollback")?;
            return Ok(None);
        }

        let row = tokens::Entity::find()
            .filter(tokens::Column::Token.eq(token))
            .one(&txn)
            .await
            .context("reload reset token failed")?
            .ok_or_else(|| anyhow::anyhow!("reset token vanished inside transaction"))?;

        users::Entity::update_many()
            .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
            .filter(users::Column::Id.eq(row.user_id))
            .exec(&txn)
            .await
            .context("update password hash failed")?;

        txn.commit().await.context("commit")?;
        Ok(Some(row.user_id))
    }
}
