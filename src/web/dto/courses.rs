use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{Attachment, Chapter, Course};

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChapterWithAttachments {
    #[serde(flatten)]
    pub chapter: Chapter,
    pub attachments: Vec<Attachment>,
}

impl ChapterWithAttachments {
    /// Groups attachments under their chapters. Both inputs keep their own order.
    pub fn group(chapters: Vec<Chapter>, attachments: Vec<Attachment>) -> Vec<Self> {
        let mut grouped: Vec<Self> = chapters
            .into_iter()
            .map(|chapter| Self {
                chapter,
                attachments: Vec::new(),
            })
            .collect();

        for attachment in attachments {
            if let Some(entry) = grouped
                .iter_mut()
                .find(|entry| entry.chapter.id() == attachment.chapter_id())
            {
                entry.attachments.push(attachment);
            }
        }
        grouped
    }
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourseDetails {
    pub course: Course,
    pub chapters: Vec<ChapterWithAttachments>,
    /// Empty for anonymous callers
    pub completed_chapter_ids: Vec<Uuid>,
    pub progress: i32,
    pub is_enrolled: bool,
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct Dashboard {
    /// Courses the caller teaches, empty for students
    pub created: Vec<Course>,
    pub enrolled: Vec<Course>,
}
