use course_core::Clock;
use course_core::model::{
    Advance, Applied, CourseProgress, CourseTree, Gate, Lesson, LessonId, Module, Navigation,
    OutlineEntry, ProgressPolicy, RequestSeq, Ticket, UserId, ViewerState,
};
use storage::repository::Storage;
use tracing::{debug, info};

use crate::course_tree::CourseTreeLoader;
use crate::error::CourseError;
use crate::progress::{ProgressStatus, ProgressTracker};

//
// ─── LOAD REPORT ───────────────────────────────────────────────────────────────
//

/// What `CourseSession::open` managed to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub modules: usize,
    pub lessons: usize,
    pub orphaned: usize,
    /// `Unavailable` means completions could not be read and none are shown.
    pub progress: ProgressStatus,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One learner's pass through the course: the loaded sequence, the current
/// lesson and the completion state for the resolved viewer.
///
/// The viewer is passed into every call that depends on it rather than read
/// from shared state.
pub struct CourseSession {
    loader: CourseTreeLoader,
    tracker: ProgressTracker,
    navigation: Navigation,
    modules: Vec<Module>,
    tree_requests: RequestSeq,
    content_loaded: bool,
}

impl CourseSession {
    #[must_use]
    pub fn new(loader: CourseTreeLoader, tracker: ProgressTracker) -> Self {
        Self {
            loader,
            tracker,
            navigation: Navigation::default(),
            modules: Vec::new(),
            tree_requests: RequestSeq::default(),
            content_loaded: false,
        }
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, policy: ProgressPolicy) -> Self {
        Self::new(
            CourseTreeLoader::new(storage.content.clone()),
            ProgressTracker::with_policy(clock, storage.progress.clone(), policy),
        )
    }

    /// Load the tree and, for an authenticated viewer, their completions.
    ///
    /// The two reads run concurrently. A progress failure is not fatal: it is
    /// reported through `LoadReport::progress` and the course shows no marks.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::ContentUnavailable` if the tree cannot be read.
    pub async fn open(&mut self, viewer: &ViewerState) -> Result<LoadReport, CourseError> {
        let tree_ticket = self.begin_tree_load();
        let tree = match viewer.user_id() {
            Some(user) => {
                let progress_ticket = self.tracker.begin_load(user);
                let (tree, completions) = tokio::join!(
                    self.loader.load_tree(),
                    self.tracker.fetch_completions(user)
                );
                // Already logged by the tracker; the report carries the status.
                let _ = self.tracker.apply_load(progress_ticket, completions);
                tree
            }
            None => self.loader.load_tree().await,
        };

        let orphaned = tree.as_ref().map_or(0, CourseTree::orphaned);
        self.apply_tree(tree_ticket, tree)?;

        let report = LoadReport {
            modules: self.modules.len(),
            lessons: self.navigation.sequence().len(),
            orphaned,
            progress: self.tracker.status(),
        };
        info!(
            modules = report.modules,
            lessons = report.lessons,
            progress = ?report.progress,
            "course opened"
        );
        Ok(report)
    }

    /// Re-read the tree to pick up authoring edits. The current lesson is
    /// kept when it still exists, otherwise the first lesson is selected.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::ContentUnavailable`; the previous sequence stays.
    pub async fn reload(&mut self) -> Result<Applied, CourseError> {
        let ticket = self.begin_tree_load();
        let tree = self.loader.load_tree().await;
        self.apply_tree(ticket, tree)
    }

    pub fn begin_tree_load(&mut self) -> Ticket {
        self.tree_requests.issue()
    }

    /// Apply a tree load result if `ticket` is still the newest tree request.
    ///
    /// # Errors
    ///
    /// Passes through the load error when the fresh result is a failure.
    pub fn apply_tree(
        &mut self,
        ticket: Ticket,
        result: Result<CourseTree, CourseError>,
    ) -> Result<Applied, CourseError> {
        if !self.tree_requests.is_latest(ticket) {
            debug!(?ticket, "discarding stale course tree");
            return Ok(Applied::Stale);
        }
        let (modules, sequence) = result?.into_parts();
        self.modules = modules;
        self.navigation.replace_sequence(sequence);
        self.content_loaded = true;
        Ok(Applied::Fresh)
    }

    /// (Re)load completions for the viewer.
    ///
    /// # Errors
    ///
    /// `ProgressPending` while the viewer resolves, `Unauthorized` for an
    /// anonymous viewer, `ProgressUnavailable` if the store cannot be read.
    pub async fn load_progress(&mut self, viewer: &ViewerState) -> Result<Applied, CourseError> {
        match viewer {
            ViewerState::Resolving => Err(CourseError::ProgressPending),
            ViewerState::Anonymous => Err(CourseError::Unauthorized),
            ViewerState::Authenticated(user) => self.tracker.load_completions(user).await,
        }
    }

    /// Whether a tree load has succeeded at least once.
    #[must_use]
    pub fn content_loaded(&self) -> bool {
        self.content_loaded
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    #[must_use]
    pub fn sequence(&self) -> &[Lesson] {
        self.navigation.sequence()
    }

    /// Ids outside the loaded sequence are ignored.
    pub fn select(&mut self, lesson_id: &LessonId) -> bool {
        let accepted = self.navigation.select(lesson_id);
        if !accepted {
            debug!(lesson = %lesson_id, "ignoring selection outside the sequence");
        }
        accepted
    }

    /// Select the first lesson not yet complete. Returns false when every
    /// lesson is done or nothing is loaded.
    pub fn resume(&mut self) -> bool {
        let next = self
            .navigation
            .first_incomplete(self.tracker.completed())
            .map(|lesson| lesson.id().clone());
        next.is_some_and(|id| self.navigation.select(&id))
    }

    #[must_use]
    pub fn current_lesson(&self) -> Option<&Lesson> {
        self.navigation.current_lesson()
    }

    #[must_use]
    pub fn current_lesson_id(&self) -> Option<&LessonId> {
        self.navigation.current_id()
    }

    #[must_use]
    pub fn is_complete(&self, lesson_id: &LessonId) -> bool {
        self.tracker.is_complete(lesson_id)
    }

    #[must_use]
    pub fn outline(&self) -> Vec<OutlineEntry> {
        self.navigation.outline(self.tracker.completed())
    }

    #[must_use]
    pub fn progress(&self) -> CourseProgress {
        CourseProgress::summarize(self.navigation.sequence(), self.tracker.completed())
    }

    #[must_use]
    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Mark the current lesson complete, then move at most one step forward.
    ///
    /// Nothing changes for a viewer who is not authenticated. A failed write
    /// leaves the current lesson where it was.
    ///
    /// # Errors
    ///
    /// `ProgressPending` while the viewer resolves, `Unauthorized` for an
    /// anonymous viewer, `NoLessonSelected` or `PersistFailed`.
    pub async fn mark_and_advance(&mut self, viewer: &ViewerState) -> Result<Advance, CourseError> {
        let user = writer(viewer)?;
        let lesson_id = self
            .navigation
            .current_id()
            .cloned()
            .ok_or(CourseError::NoLessonSelected)?;

        self.tracker.mark_complete(user, &lesson_id).await?;

        let advance = self.navigation.advance();
        debug!(lesson = %lesson_id, ?advance, "mark and advance");
        Ok(advance)
    }

    /// Re-send marks whose durable write failed earlier.
    ///
    /// # Errors
    ///
    /// As `mark_and_advance` for the viewer, otherwise as
    /// `ProgressTracker::retry_unconfirmed`.
    pub async fn retry_unconfirmed(&mut self, viewer: &ViewerState) -> Result<usize, CourseError> {
        let user = writer(viewer)?;
        self.tracker.retry_unconfirmed(user).await
    }
}

// Resolving is not anonymous: wait, and leave any redirect to a settled viewer.
fn writer(viewer: &ViewerState) -> Result<&UserId, CourseError> {
    match viewer.gate() {
        Gate::Wait => Err(CourseError::ProgressPending),
        Gate::RedirectToSignIn => Err(CourseError::Unauthorized),
        Gate::Proceed(user) => Ok(user),
    }
}
