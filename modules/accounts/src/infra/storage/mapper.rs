use sea_orm::Set;

use crate::domain::model::{ResetTokenRecord, UserRecord};
use crate::infra::storage::entity::{password_reset_tokens, users};

impl From<users::Model> for UserRecord {
    fn from(m: users::Model) -> Self {
        Self {
            id: m.id,
            user_name: m.user_name,
            email: m.email,
            password_hash: m.password_hash,
            created_at: m.created_at,
        }
    }
}

impl From<UserRecord> for users::ActiveModel {
    fn from(u: UserRecord) -> Self {
        Self {
            id: Set(u.id),
            user_name: Set(u.user_name),
            email: Set(u.email),
            password_hash: Set(u.password_hash),
            created_at: Set(u.created_at),
        }
    }
}

impl From<ResetTokenRecord> for password_reset_tokens::ActiveModel {
    fn from(t: ResetTokenRecord) -> Self {
        Self {
            id: Set(t.id),
            user_id: Set(t.user_id),
            token: Set(t.token),
            expires_at: Set(t.expires_at),
            used: Set(t.used),
            created_at: Set(t.created_at),
        }
    }
}
