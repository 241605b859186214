//! Storage ports for posts, split into read and write halves.

use std::fmt::Display;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::PostRecord;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("store failed: {0}")]
    Persistence(String),
    #[error("store timed out")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub title: String,
    pub description: String,
    pub image: String,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image: String,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Every post, newest first.
    async fn list_posts(&self) -> Result<Vec<PostRecord>, RepoError>;

    async fn health_check(&self) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    /// Persist a new post; the store assigns id and timestamps.
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    /// Replace title, description and image. `Ok(None)` when no post has the id.
    async fn update_post(&self, params: UpdatePostParams)
    -> Result<Option<PostRecord>, RepoError>;

    /// Returns whether a post was removed.
    async fn delete_post(&self, id: Uuid) -> Result<bool, RepoError>;
}
