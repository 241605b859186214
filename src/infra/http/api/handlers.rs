//! Posts handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use postboard_api_types::{MessageResponse, Post};
use uuid::Uuid;

use crate::application::posts::PostServiceError;
use crate::application::repos::RepoError;

use super::error::{ApiError, ErrorCode};
use super::ingest::PostSubmission;
use super::state::ApiState;

pub const DELETED_MESSAGE: &str = "post deleted";

const SOURCE: &str = "infra::http::api::handlers";
const PERSISTENCE_ERROR: &str = "Persistence error";

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    let code = match err {
        RepoError::Timeout => ErrorCode::StoreTimeout,
        RepoError::Persistence(_) => ErrorCode::Store,
    };
    ApiError::new(code, PERSISTENCE_ERROR).with_cause(SOURCE, &err)
}

pub(crate) fn post_to_api(err: PostServiceError) -> ApiError {
    match err {
        PostServiceError::MissingFields(fields) => {
            ApiError::new(ErrorCode::InvalidInput, "Missing required fields")
                .with_hint(fields.join(", "))
        }
        PostServiceError::Invalid(inner) => {
            ApiError::new(ErrorCode::InvalidInput, "Invalid post").with_hint(inner.to_string())
        }
        PostServiceError::Repo(repo) => repo_to_api(repo),
    }
}

pub async fn list_posts(State(state): State<ApiState>) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = state.posts.list_posts().await.map_err(post_to_api)?;
    Ok(Json(posts.into_iter().map(Post::from).collect()))
}

pub async fn create_post(
    State(state): State<ApiState>,
    PostSubmission(input): PostSubmission,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.create_post(input).await.map_err(post_to_api)?;
    Ok((StatusCode::CREATED, Json(Post::from(post))))
}

/// Replace a post. Unknown or malformed ids answer `null` rather than 404.
pub async fn update_post(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    PostSubmission(input): PostSubmission,
) -> Result<Json<Option<Post>>, ApiError> {
    let Ok(id) = Uuid::parse_str(&id) else {
        input.into_draft().map_err(post_to_api)?;
        return Ok(Json(None));
    };

    let post = state
        .posts
        .update_post(id, input)
        .await
        .map_err(post_to_api)?;
    Ok(Json(post.map(Post::from)))
}

/// Delete a post. Succeeds whether or not the id matched anything.
pub async fn delete_post(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    if let Ok(id) = Uuid::parse_str(&id) {
        state.posts.delete_post(id).await.map_err(post_to_api)?;
    }
    Ok(Json(MessageResponse {
        message: DELETED_MESSAGE.to_string(),
    }))
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

pub async fn db_health(State(state): State<ApiState>) -> Response {
    match state.posts.health_check().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => ApiError::new(ErrorCode::Unavailable, "Store unavailable")
            .with_cause(SOURCE, &err)
            .into_response(),
    }
}
