use async_trait::async_trait;

use crate::application::repos::{PostsRepo, RepoError};
use crate::domain::entities::PostRecord;

use super::PostgresRepositories;
use super::types::{POST_COLUMNS, PostRow};
use crate::infra::db::map_sqlx_error;

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(&self) -> Result<Vec<PostRecord>, RepoError> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        sqlx::query("SELECT 1")
            .execute(self.pool())
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }
}
