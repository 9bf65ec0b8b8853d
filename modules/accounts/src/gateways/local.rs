use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{AccountsApi, AccountsError, SessionUser, User};
use crate::domain::service::Service;

/// Local implementation of the AccountsApi trait that delegates to the domain service
pub struct AccountsLocalClient {
    service: Arc<Service>,
}

impl AccountsLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AccountsApi for AccountsLocalClient {
    async fn verify_session(&self, token: &str) -> Result<SessionUser, AccountsError> {
        self.service.verify_session(token).map_err(Into::into)
    }

    async fn get_user(&self, id: Uuid) -> Result<User, AccountsError> {
        self.service.get_user(id).await.map_err(Into::into)
    }

    async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AccountsError> {
        self.service.get_users(ids).await.map_err(Into::into)
    }
}
