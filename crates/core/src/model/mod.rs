mod completion;
mod ids;
mod lesson;
mod module;
mod navigation;
mod progress;
mod request;
mod resources;
mod role;
mod tree;
mod viewer;

pub use completion::CompletionRecord;
pub use ids::{LessonId, ModuleId, ParseIdError, UserId};
pub use lesson::{Lesson, LessonDraft, LessonError, LessonMedia};
pub use module::{Module, ModuleDraft, ModuleError};
pub use navigation::{Advance, Navigation, OutlineEntry};
pub use progress::{CompletionSet, CourseProgress, LocalMark, ProgressCount, ProgressPolicy};
pub use request::{Applied, RequestSeq, Ticket};
pub use resources::LessonResources;
pub use role::{Profile, Role, UnknownRole};
pub use tree::CourseTree;
pub use viewer::{Gate, ViewerState};
