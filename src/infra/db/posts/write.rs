use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;

use super::PostgresRepositories;
use super::types::{POST_COLUMNS, PostRow};
use crate::infra::db::map_sqlx_error;

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            title,
            description,
            image,
        } = params;

        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            INSERT INTO posts (id, title, description, image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(image)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn update_post(
        &self,
        params: UpdatePostParams,
    ) -> Result<Option<PostRecord>, RepoError> {
        let UpdatePostParams {
            id,
            title,
            description,
            image,
        } = params;

        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            UPDATE posts
            SET title = $2, description = $3, image = $4, updated_at = $5
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(image)
        .bind(now)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
