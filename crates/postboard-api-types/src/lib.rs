//! Wire types shared by the postboard server and its command-line client.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Collection route served by the API.
pub const POSTS_PATH: &str = "/posts";

/// Item route for a single post.
pub fn post_path(id: Uuid) -> String {
    format!("{POSTS_PATH}/{id}")
}

/// A stored blog post as returned by every read or write endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// `data:<mime>;base64,<payload>`
    pub image: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// JSON body accepted by create and update.
///
/// Every field is optional on the wire so that a missing field surfaces as a
/// validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl PostPayload {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            description: Some(description.into()),
            image: Some(image.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}
