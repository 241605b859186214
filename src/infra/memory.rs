//! Process-local post store used when no database is configured.

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;

/// Posts kept in insertion order; reads sort newest first.
#[derive(Default)]
pub struct MemoryPostsRepo {
    posts: RwLock<Vec<PostRecord>>,
}

impl MemoryPostsRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostsRepo for MemoryPostsRepo {
    async fn list_posts(&self) -> Result<Vec<PostRecord>, RepoError> {
        let posts = self.posts.read().await;
        let mut listed: Vec<PostRecord> = posts.iter().rev().cloned().collect();
        // Stable sort, so equal timestamps stay newest-inserted first.
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryPostsRepo {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let record = PostRecord {
            id: Uuid::new_v4(),
            title: params.title,
            description: params.description,
            image: params.image,
            created_at: now,
            updated_at: now,
        };
        self.posts.write().await.push(record.clone());
        Ok(record)
    }

    async fn update_post(
        &self,
        params: UpdatePostParams,
    ) -> Result<Option<PostRecord>, RepoError> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.iter_mut().find(|post| post.id == params.id) else {
            return Ok(None);
        };
        post.title = params.title;
        post.description = params.description;
        post.image = params.image;
        post.updated_at = OffsetDateTime::now_utc();
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|post| post.id != id);
        Ok(posts.len() != before)
    }
}
