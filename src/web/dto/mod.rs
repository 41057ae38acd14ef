mod courses;
pub use courses::{ChapterWithAttachments, CourseDetails, Dashboard};

mod chapters;
pub use chapters::{ChapterBody, ReorderBody};

mod progress;
pub use progress::{ProgressResponse, ToggleBody, ToggleResponse};

mod purchase;
pub use purchase::{CheckoutSuccessQuery, PurchaseResponse, PurchaseStatus};
