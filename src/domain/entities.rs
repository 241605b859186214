//! Domain entities mirrored from persistent storage.

use postboard_api_types::Post;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<PostRecord> for Post {
    fn from(record: PostRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            image: record.image,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
