use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{FeedApi, FeedError, PostView};
use crate::domain::service::Service;

/// Local implementation of the FeedApi trait that delegates to the domain service
pub struct FeedLocalClient {
    service: Arc<Service>,
}

impl FeedLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl FeedApi for FeedLocalClient {
    async fn list_posts(&self, viewer: Option<Uuid>) -> Result<Vec<PostView>, FeedError> {
        self.service.list_posts(viewer).await.map_err(Into::into)
    }

    async fn get_post(&self, id: Uuid, viewer: Option<Uuid>) -> Result<PostView, FeedError> {
        self.service.get_post(id, viewer).await.map_err(Into::into)
    }
}
