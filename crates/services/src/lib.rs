#![forbid(unsafe_code)]

pub mod app_services;
pub mod authoring;
pub mod course_session;
pub mod course_tree;
pub mod error;
pub mod generation;
pub mod progress;
pub mod roles;
pub mod viewer;

pub use course_core::Clock;

pub use app_services::AppServices;
pub use authoring::AuthoringService;
pub use course_session::{CourseSession, LoadReport};
pub use course_tree::CourseTreeLoader;
pub use error::{
    AppServicesError, AuthoringError, CourseError, GenerationError, IdentityError, RoleError,
};
pub use generation::{ContentGenerator, GeneratedAssets, GenerationConfig, HttpContentGenerator};
pub use progress::{ProgressStatus, ProgressTracker};
pub use roles::{AdminGate, RoleService, UserWithRole};
pub use viewer::{IdentityProvider, StaticIdentity, ViewerSession};
