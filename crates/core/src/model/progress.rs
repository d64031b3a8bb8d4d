//! In-memory completion state for one viewer session.

use std::collections::{BTreeSet, HashSet};

use crate::model::ids::{LessonId, ModuleId};
use crate::model::lesson::Lesson;

/// What to do with an optimistic local mark when the durable write fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProgressPolicy {
    /// Keep the lesson marked locally and remember it as unconfirmed.
    #[default]
    KeepOptimistic,
    /// Undo the local mark unless the lesson was already complete.
    RollBack,
}

/// Receipt for a local apply, handed back when the durable phase settles.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct LocalMark {
    lesson_id: LessonId,
    newly_marked: bool,
}

impl LocalMark {
    pub fn lesson_id(&self) -> &LessonId {
        &self.lesson_id
    }

    /// False when the lesson was already complete before this mark.
    #[must_use]
    pub fn newly_marked(&self) -> bool {
        self.newly_marked
    }
}

/// Set of completed lessons, mirroring the user's completion records.
///
/// Marking is two-phase: `apply_local` updates the set immediately, then
/// `confirm` or `fail` settles the durable write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionSet {
    completed: HashSet<LessonId>,
    unconfirmed: BTreeSet<LessonId>,
}

impl CompletionSet {
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = LessonId>) -> Self {
        Self {
            completed: ids.into_iter().collect(),
            unconfirmed: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn is_complete(&self, lesson_id: &LessonId) -> bool {
        self.completed.contains(lesson_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.completed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LessonId> {
        self.completed.iter()
    }

    /// Lessons marked locally whose durable write has not succeeded.
    pub fn unconfirmed(&self) -> impl Iterator<Item = &LessonId> {
        self.unconfirmed.iter()
    }

    pub fn apply_local(&mut self, lesson_id: LessonId) -> LocalMark {
        let newly_marked = self.completed.insert(lesson_id.clone());
        LocalMark {
            lesson_id,
            newly_marked,
        }
    }

    pub fn confirm(&mut self, mark: &LocalMark) {
        self.unconfirmed.remove(&mark.lesson_id);
    }

    pub fn fail(&mut self, mark: &LocalMark, policy: ProgressPolicy) {
        match policy {
            ProgressPolicy::KeepOptimistic => {
                self.unconfirmed.insert(mark.lesson_id.clone());
            }
            ProgressPolicy::RollBack => {
                if mark.newly_marked {
                    self.completed.remove(&mark.lesson_id);
                }
                self.unconfirmed.remove(&mark.lesson_id);
            }
        }
    }

    /// Replace the set with a fresh load, keeping unconfirmed local marks.
    pub fn replace_loaded(&mut self, ids: impl IntoIterator<Item = LessonId>) {
        let mut completed: HashSet<LessonId> = ids.into_iter().collect();
        completed.extend(self.unconfirmed.iter().cloned());
        self.completed = completed;
    }
}

//
// ─── SUMMARY ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressCount {
    pub completed: usize,
    pub total: usize,
}

impl ProgressCount {
    /// Whole-number percentage, rounded down. An empty count is 0%.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = self.completed.min(self.total) * 100 / self.total;
        u8::try_from(pct).unwrap_or(100)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.completed >= self.total
    }
}

/// Completion counts for the whole course and per module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseProgress {
    pub overall: ProgressCount,
    pub modules: Vec<(ModuleId, ProgressCount)>,
}

impl CourseProgress {
    /// Count completions over an ordered lesson sequence. Completed ids that are
    /// not in the sequence (deleted lessons) are ignored.
    #[must_use]
    pub fn summarize(sequence: &[Lesson], completed: &CompletionSet) -> Self {
        let mut progress = Self::default();
        for lesson in sequence {
            let done = completed.is_complete(lesson.id());
            progress.overall.total += 1;
            progress.overall.completed += usize::from(done);

            let starts_module = progress
                .modules
                .last()
                .is_none_or(|(module_id, _)| module_id != lesson.module_id());
            if starts_module {
                progress
                    .modules
                    .push((lesson.module_id().clone(), ProgressCount::default()));
            }
            if let Some((_, entry)) = progress.modules.last_mut() {
                entry.total += 1;
                entry.completed += usize::from(done);
            }
        }
        progress
    }

    #[must_use]
    pub fn module(&self, module_id: &ModuleId) -> Option<ProgressCount> {
        self.modules
            .iter()
            .find(|(id, _)| id == module_id)
            .map(|(_, count)| *count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::resources::LessonResources;

    fn id(s: &str) -> LessonId {
        LessonId::new(s)
    }

    fn lesson(id: &str, module_id: &str) -> Lesson {
        Lesson::from_persisted(
            LessonId::new(id),
            ModuleId::new(module_id),
            id.into(),
            String::new(),
            "https://v/1".into(),
            String::new(),
            None,
            None,
            LessonResources::default(),
            0,
        )
    }

    #[test]
    fn apply_local_is_idempotent() {
        let mut set = CompletionSet::default();
        let first = set.apply_local(id("l1"));
        set.confirm(&first);
        let second = set.apply_local(id("l1"));
        assert!(first.newly_marked());
        assert!(!second.newly_marked());
        assert_eq!(set.len(), 1);
        assert!(set.is_complete(&id("l1")));
    }

    #[test]
    fn keep_optimistic_records_unconfirmed() {
        let mut set = CompletionSet::default();
        let mark = set.apply_local(id("l1"));
        set.fail(&mark, ProgressPolicy::KeepOptimistic);
        assert!(set.is_complete(&id("l1")));
        assert_eq!(set.unconfirmed().collect::<Vec<_>>(), [&id("l1")]);

        let retry = set.apply_local(id("l1"));
        set.confirm(&retry);
        assert_eq!(set.unconfirmed().count(), 0);
    }

    #[test]
    fn roll_back_only_undoes_new_marks() {
        let mut set = CompletionSet::from_ids([id("done")]);
        let fresh = set.apply_local(id("l1"));
        set.fail(&fresh, ProgressPolicy::RollBack);
        assert!(!set.is_complete(&id("l1")));

        let repeat = set.apply_local(id("done"));
        set.fail(&repeat, ProgressPolicy::RollBack);
        assert!(set.is_complete(&id("done")));
    }

    #[test]
    fn reload_keeps_unconfirmed_marks() {
        let mut set = CompletionSet::default();
        let mark = set.apply_local(id("l2"));
        set.fail(&mark, ProgressPolicy::KeepOptimistic);
        set.replace_loaded([id("l1")]);
        assert!(set.is_complete(&id("l1")));
        assert!(set.is_complete(&id("l2")));
    }

    #[test]
    fn summary_counts_per_module() {
        let sequence = vec![lesson("a", "m1"), lesson("b", "m1"), lesson("c", "m2")];
        let set = CompletionSet::from_ids([id("a"), id("c"), id("deleted")]);
        let progress = CourseProgress::summarize(&sequence, &set);
        assert_eq!(progress.overall, ProgressCount { completed: 2, total: 3 });
        assert_eq!(progress.overall.percent(), 66);
        assert_eq!(
            progress.module(&ModuleId::new("m1")),
            Some(ProgressCount { completed: 1, total: 2 })
        );
        assert!(progress.module(&ModuleId::new("m2")).unwrap().is_finished());
    }

    #[test]
    fn empty_count_is_zero_percent() {
        assert_eq!(ProgressCount::default().percent(), 0);
        assert!(!ProgressCount::default().is_finished());
    }
}
