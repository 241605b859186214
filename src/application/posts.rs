//! Post lifecycle: validation of submitted payloads and the CRUD calls behind the API.

use std::sync::Arc;

use bytes::Bytes;
use metrics::counter;
use postboard_api_types::PostPayload;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;
use crate::domain::error::DomainError;
use crate::domain::posts::{ImageDataUri, PostDraft};

const SOURCE: &str = "postboard::posts";

pub const POSTS_CREATED_TOTAL: &str = "postboard_posts_created_total";
pub const POSTS_UPDATED_TOTAL: &str = "postboard_posts_updated_total";
pub const POSTS_DELETED_TOTAL: &str = "postboard_posts_deleted_total";

#[derive(Debug, Error)]
pub enum PostServiceError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Where the image of a submission came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    /// A data URI sent as text.
    DataUri(String),
    /// Raw file bytes from a multipart upload.
    Upload { content_type: String, bytes: Bytes },
}

/// Normalized submission produced by both the JSON and the multipart adapters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<ImageInput>,
}

impl From<PostPayload> for PostInput {
    fn from(payload: PostPayload) -> Self {
        Self {
            title: payload.title,
            description: payload.description,
            image: payload.image.map(ImageInput::DataUri),
        }
    }
}

impl PostInput {
    /// Check required fields and turn the image into its stored form.
    pub fn into_draft(self) -> Result<PostDraft, PostServiceError> {
        let title = self.title.filter(|value| !value.trim().is_empty());
        let description = self.description.filter(|value| !value.trim().is_empty());
        let image = self.image.filter(|image| match image {
            ImageInput::DataUri(value) => !value.trim().is_empty(),
            ImageInput::Upload { bytes, .. } => !bytes.is_empty(),
        });

        let (title, description, image) = match (title, description, image) {
            (Some(title), Some(description), Some(image)) => (title, description, image),
            (title, description, image) => {
                let mut missing = Vec::new();
                if title.is_none() {
                    missing.push("title");
                }
                if description.is_none() {
                    missing.push("description");
                }
                if image.is_none() {
                    missing.push("image");
                }
                return Err(PostServiceError::MissingFields(missing));
            }
        };

        let image = match image {
            ImageInput::DataUri(value) => ImageDataUri::parse(value.trim())?,
            ImageInput::Upload {
                content_type,
                bytes,
            } => ImageDataUri::encode(&content_type, &bytes)?,
        };

        Ok(PostDraft {
            title,
            description,
            image,
        })
    }
}

#[derive(Clone)]
pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
}

impl PostService {
    pub fn new(reader: Arc<dyn PostsRepo>, writer: Arc<dyn PostsWriteRepo>) -> Self {
        Self { reader, writer }
    }

    pub async fn list_posts(&self) -> Result<Vec<PostRecord>, PostServiceError> {
        Ok(self.reader.list_posts().await?)
    }

    pub async fn create_post(&self, input: PostInput) -> Result<PostRecord, PostServiceError> {
        let draft = input.into_draft()?;
        let image_bytes = draft.image.decoded_len();
        let mime = draft.image.mime_type().to_string();

        let post = self
            .writer
            .create_post(CreatePostParams {
                title: draft.title,
                description: draft.description,
                image: draft.image.into_string(),
            })
            .await?;

        counter!(POSTS_CREATED_TOTAL).increment(1);
        info!(
            target: SOURCE,
            post_id = %post.id,
            image_mime = %mime,
            image_bytes,
            "post created"
        );
        Ok(post)
    }

    /// Replace a post's content. Yields `None` when the id is unknown; the
    /// caller decides how to present that.
    pub async fn update_post(
        &self,
        id: Uuid,
        input: PostInput,
    ) -> Result<Option<PostRecord>, PostServiceError> {
        let draft = input.into_draft()?;
        let image_bytes = draft.image.decoded_len();

        let updated = self
            .writer
            .update_post(UpdatePostParams {
                id,
                title: draft.title,
                description: draft.description,
                image: draft.image.into_string(),
            })
            .await?;

        match &updated {
            Some(post) => {
                counter!(POSTS_UPDATED_TOTAL).increment(1);
                info!(target: SOURCE, post_id = %post.id, image_bytes, "post updated");
            }
            None => info!(target: SOURCE, post_id = %id, "update matched no post"),
        }
        Ok(updated)
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<bool, PostServiceError> {
        let removed = self.writer.delete_post(id).await?;
        if removed {
            counter!(POSTS_DELETED_TOTAL).increment(1);
        }
        info!(target: SOURCE, post_id = %id, removed, "post delete handled");
        Ok(removed)
    }

    pub async fn health_check(&self) -> Result<(), RepoError> {
        self.reader.health_check().await
    }
}
