//! Shared error types for the services crate.

use thiserror::Error;

use course_core::model::{LessonError, ModuleError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Outcomes of the learner-facing course core. None of these is fatal: the
/// worst case is a degraded, read-only or empty view.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseError {
    /// The content store could not be read. Retry or reload.
    #[error("course content is unavailable: {0}")]
    ContentUnavailable(#[source] StorageError),

    /// Completions could not be read; treat as zero known completions.
    #[error("progress is unavailable: {0}")]
    ProgressUnavailable(#[source] StorageError),

    /// The completion write did not reach the progress store.
    #[error("failed to persist completion: {0}")]
    PersistFailed(#[source] StorageError),

    /// Progress writes need an identified user; redirect to sign-in.
    #[error("sign in to record progress")]
    Unauthorized,

    /// Completions for this user have not finished loading yet.
    #[error("progress has not finished loading")]
    ProgressPending,

    #[error("no lesson is selected")]
    NoLessonSelected,
}

impl CourseError {
    /// Whether retrying the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ContentUnavailable(_)
                | Self::ProgressUnavailable(_)
                | Self::PersistFailed(_)
                | Self::ProgressPending
        )
    }
}

/// Errors from the identity provider capability.
#[derive(Debug, Error)]
#[error("identity provider unavailable: {0}")]
pub struct IdentityError(pub String);

/// Errors emitted by `ContentGenerator` implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("content generation is not configured")]
    Disabled,
    #[error("content generation failed: {0}")]
    Remote(String),
    #[error("content generation returned no {0}")]
    Incomplete(&'static str),
    #[error("content generation request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `RoleService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RoleError {
    #[error("viewer is still resolving")]
    Resolving,
    #[error("sign in required")]
    Unauthorized,
    #[error("admin role required")]
    Forbidden,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AuthoringService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthoringError {
    #[error(transparent)]
    Access(#[from] RoleError),
    #[error(transparent)]
    Module(#[from] ModuleError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
