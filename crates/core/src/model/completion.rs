use chrono::{DateTime, Utc};

use crate::model::ids::{LessonId, UserId};

/// Durable fact that a user finished a lesson. At most one per (user, lesson).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRecord {
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub completed_at: DateTime<Utc>,
}

impl CompletionRecord {
    #[must_use]
    pub fn new(user_id: UserId, lesson_id: LessonId, completed_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            lesson_id,
            completed_at,
        }
    }
}
