use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::PostRecord;

pub(super) const POST_COLUMNS: &str = "id, title, description, image, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: Uuid,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) image: String,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
