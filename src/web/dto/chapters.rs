use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::ChapterCreate;

/// Chapter payload as posted under a course; the course comes from the path.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ChapterBody {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub video_url: Option<String>,
    /// Appended after the last chapter when absent
    pub position: Option<i32>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_free: bool,
}

impl ChapterBody {
    pub fn into_create(self, course_id: Uuid) -> ChapterCreate {
        ChapterCreate {
            course_id,
            title: self.title,
            description: self.description,
            video_url: self.video_url,
            position: self.position,
            is_published: self.is_published,
            is_free: self.is_free,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ReorderBody {
    /// Every chapter of the course, exactly once, in the new order
    pub ordered_ids: Vec<Uuid>,
}
