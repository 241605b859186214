pub mod error;
pub mod handlers;
pub mod ingest;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, put},
};
use postboard_api_types::POSTS_PATH;

use crate::infra::http::middleware::{assign_request_id, log_responses};

/// Posts API router. `body_limit` caps request bodies, inline images included.
pub fn build_api_router(state: ApiState, body_limit: usize) -> Router {
    Router::new()
        .route(
            POSTS_PATH,
            get(handlers::list_posts)
                .post(handlers::create_post)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/posts/{id}",
            put(handlers::update_post)
                .delete(handlers::delete_post)
                .fallback(handlers::method_not_allowed),
        )
        .route("/_health/db", get(handlers::db_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(assign_request_id))
}
