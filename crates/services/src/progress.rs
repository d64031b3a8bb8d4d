use std::sync::Arc;

use course_core::Clock;
use course_core::model::{
    Applied, CompletionRecord, CompletionSet, LessonId, LocalMark, ProgressPolicy, RequestSeq,
    Ticket, UserId,
};
use storage::repository::{ProgressRepository, StorageError};
use tracing::{debug, info, warn};

use crate::error::CourseError;

//
// ─── LOAD STATUS ───────────────────────────────────────────────────────────────
//

/// Where the completion set stands for the current user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProgressStatus {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    /// The last load failed; the set holds only what is known locally.
    Unavailable,
}

impl ProgressStatus {
    #[must_use]
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Loaded | Self::Unavailable)
    }
}

//
// ─── TRACKER ───────────────────────────────────────────────────────────────────
//

/// Completion state for one viewer, kept in step with the progress store.
///
/// Marks apply locally first and are then written durably; what happens to
/// the local mark when the write fails is decided by `ProgressPolicy`.
pub struct ProgressTracker {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
    policy: ProgressPolicy,
    completed: CompletionSet,
    status: ProgressStatus,
    user: Option<UserId>,
    requests: RequestSeq,
    // Confirmed since the in-flight load was issued; that load may not see them.
    confirmed_since_load: Vec<LessonId>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(clock: Clock, progress: Arc<dyn ProgressRepository>) -> Self {
        Self::with_policy(clock, progress, ProgressPolicy::default())
    }

    #[must_use]
    pub fn with_policy(
        clock: Clock,
        progress: Arc<dyn ProgressRepository>,
        policy: ProgressPolicy,
    ) -> Self {
        Self {
            clock,
            progress,
            policy,
            completed: CompletionSet::default(),
            status: ProgressStatus::NotLoaded,
            user: None,
            requests: RequestSeq::default(),
            confirmed_since_load: Vec::new(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> ProgressPolicy {
        self.policy
    }

    #[must_use]
    pub fn status(&self) -> ProgressStatus {
        self.status
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn completed(&self) -> &CompletionSet {
        &self.completed
    }

    #[must_use]
    pub fn is_complete(&self, lesson_id: &LessonId) -> bool {
        self.completed.is_complete(lesson_id)
    }

    /// Lessons marked locally whose durable write has not gone through yet.
    #[must_use]
    pub fn unconfirmed(&self) -> Vec<LessonId> {
        self.completed.unconfirmed().cloned().collect()
    }

    /// Start a completion load for `user`, superseding any load in flight.
    ///
    /// Switching users drops the previous user's set. Reloading the same user
    /// keeps the current set usable until the new result lands.
    pub fn begin_load(&mut self, user: &UserId) -> Ticket {
        if self.user.as_ref() != Some(user) {
            self.completed = CompletionSet::default();
            self.user = Some(user.clone());
            self.status = ProgressStatus::Loading;
        } else if !self.status.is_settled() {
            self.status = ProgressStatus::Loading;
        }
        self.confirmed_since_load.clear();
        self.requests.issue()
    }

    /// Read the user's completed lesson ids. Does not touch tracker state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the progress store cannot be read.
    pub async fn fetch_completions(&self, user: &UserId) -> Result<Vec<LessonId>, StorageError> {
        let records = self.progress.list_completions(user).await?;
        Ok(records.into_iter().map(|record| record.lesson_id).collect())
    }

    /// Apply a load result if `ticket` is still the newest one.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::ProgressUnavailable` when the fresh result is a
    /// failure. The tracker is still settled afterwards so marks can proceed.
    pub fn apply_load(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<LessonId>, StorageError>,
    ) -> Result<Applied, CourseError> {
        if !self.requests.is_latest(ticket) {
            debug!(?ticket, "discarding stale completion load");
            return Ok(Applied::Stale);
        }
        match result {
            Ok(ids) => {
                let recent = std::mem::take(&mut self.confirmed_since_load);
                self.completed.replace_loaded(ids.into_iter().chain(recent));
                self.status = ProgressStatus::Loaded;
                debug!(completed = self.completed.len(), "completions loaded");
                Ok(Applied::Fresh)
            }
            Err(err) => {
                warn!(error = %err, "completions unavailable, showing no recorded progress");
                self.status = ProgressStatus::Unavailable;
                Err(CourseError::ProgressUnavailable(err))
            }
        }
    }

    /// Load completions for `user` and apply them.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::ProgressUnavailable` if the store cannot be read.
    pub async fn load_completions(&mut self, user: &UserId) -> Result<Applied, CourseError> {
        let ticket = self.begin_load(user);
        let result = self.fetch_completions(user).await;
        self.apply_load(ticket, result)
    }

    /// Local phase of a mark: update the set immediately.
    pub fn apply_local(&mut self, lesson_id: LessonId) -> LocalMark {
        self.completed.apply_local(lesson_id)
    }

    /// Durable phase of a mark. A record that already exists counts as success.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::PersistFailed` if the store rejects the write; the
    /// local mark is then kept or rolled back according to the policy.
    pub async fn confirm_durable(
        &mut self,
        user: &UserId,
        mark: LocalMark,
    ) -> Result<(), CourseError> {
        let record = CompletionRecord::new(user.clone(), mark.lesson_id().clone(), self.clock.now());
        match self.progress.insert_completion(&record).await {
            Ok(()) | Err(StorageError::Conflict) => {
                self.completed.confirm(&mark);
                self.confirmed_since_load.push(mark.lesson_id().clone());
                info!(user = %user, lesson = %mark.lesson_id(), "lesson completed");
                Ok(())
            }
            Err(err) => {
                warn!(
                    user = %user,
                    lesson = %mark.lesson_id(),
                    policy = ?self.policy,
                    error = %err,
                    "completion was not saved"
                );
                self.completed.fail(&mark, self.policy);
                Err(CourseError::PersistFailed(err))
            }
        }
    }

    /// Mark `lesson_id` complete for `user`. Marking twice is harmless.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::ProgressPending` until completions for `user`
    /// have settled, or `CourseError::PersistFailed` if the write fails.
    pub async fn mark_complete(
        &mut self,
        user: &UserId,
        lesson_id: &LessonId,
    ) -> Result<(), CourseError> {
        self.ensure_settled_for(user)?;
        let mark = self.apply_local(lesson_id.clone());
        self.confirm_durable(user, mark).await
    }

    /// Re-send every unconfirmed mark. Returns how many went through.
    ///
    /// # Errors
    ///
    /// Stops at the first write that fails and returns `PersistFailed`.
    pub async fn retry_unconfirmed(&mut self, user: &UserId) -> Result<usize, CourseError> {
        self.ensure_settled_for(user)?;
        let mut confirmed = 0;
        for lesson_id in self.unconfirmed() {
            let mark = self.apply_local(lesson_id);
            self.confirm_durable(user, mark).await?;
            confirmed += 1;
        }
        Ok(confirmed)
    }

    fn ensure_settled_for(&self, user: &UserId) -> Result<(), CourseError> {
        if self.status.is_settled() && self.user.as_ref() == Some(user) {
            Ok(())
        } else {
            Err(CourseError::ProgressPending)
        }
    }
}
