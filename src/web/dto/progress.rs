use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ToggleBody {
    pub chapter_id: Uuid,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ToggleResponse {
    pub chapter_id: Uuid,
    pub completed: bool,
    pub progress: i32,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ProgressResponse {
    pub course_id: Uuid,
    /// Integer percentage, `0..=100`
    pub progress: i32,
    pub completed_chapter_ids: Vec<Uuid>,
}
