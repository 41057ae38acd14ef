mod user;
pub use user::{UserEntity, UserEntityCreate, UserEntityUpdate};

mod category;
pub use category::{Category, CategoryCreate};

mod course;
pub use course::{Course, CourseCreate, CourseUpdate};

mod chapter;
pub use chapter::{Chapter, ChapterCreate, ChapterUpdate, plan_reorder};

mod attachment;
pub use attachment::{Attachment, AttachmentCreate};

mod purchase;
pub use purchase::{Enrollment, Purchase, PurchaseCreate, PurchaseOutcome};

mod progress;
pub use progress::{CourseProgress, progress_percentage};
