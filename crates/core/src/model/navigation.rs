//! Current-lesson selection over a loaded lesson sequence.

use crate::model::ids::{LessonId, ModuleId};
use crate::model::lesson::Lesson;
use crate::model::progress::CompletionSet;

/// Result of stepping forward from the current lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved(LessonId),
    /// The current lesson is the last one; selection is unchanged.
    AtEnd,
    NoSelection,
}

/// One row of the lesson outline shown beside the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub lesson_id: LessonId,
    pub module_id: ModuleId,
    pub title: String,
    /// 1-based position in the sequence.
    pub position: usize,
    pub is_current: bool,
    pub is_complete: bool,
}

/// Holds the ordered sequence and the current lesson.
///
/// Once a non-empty sequence is loaded, `current` always names a lesson in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigation {
    sequence: Vec<Lesson>,
    current: Option<LessonId>,
}

impl Navigation {
    /// Start at the first lesson of the sequence.
    #[must_use]
    pub fn new(sequence: Vec<Lesson>) -> Self {
        let current = sequence.first().map(|lesson| lesson.id().clone());
        Self { sequence, current }
    }

    /// Swap in a freshly loaded sequence. The current lesson survives if it is
    /// still present, otherwise selection falls back to the first lesson.
    pub fn replace_sequence(&mut self, sequence: Vec<Lesson>) {
        self.sequence = sequence;
        let keep = self
            .current
            .as_ref()
            .is_some_and(|id| self.position(id).is_some());
        if !keep {
            self.current = self.sequence.first().map(|lesson| lesson.id().clone());
        }
    }

    #[must_use]
    pub fn sequence(&self) -> &[Lesson] {
        &self.sequence
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    #[must_use]
    pub fn current_id(&self) -> Option<&LessonId> {
        self.current.as_ref()
    }

    /// `None` when nothing is loaded; callers render an empty state.
    #[must_use]
    pub fn current_lesson(&self) -> Option<&Lesson> {
        let id = self.current.as_ref()?;
        self.sequence.iter().find(|lesson| lesson.id() == id)
    }

    #[must_use]
    pub fn position(&self, lesson_id: &LessonId) -> Option<usize> {
        self.sequence.iter().position(|lesson| lesson.id() == lesson_id)
    }

    /// Select a lesson. Ids outside the sequence are ignored; returns whether
    /// the selection was accepted.
    pub fn select(&mut self, lesson_id: &LessonId) -> bool {
        if self.position(lesson_id).is_none() {
            return false;
        }
        self.current = Some(lesson_id.clone());
        true
    }

    /// Move at most one step forward.
    pub fn advance(&mut self) -> Advance {
        let Some(index) = self.current.as_ref().and_then(|id| self.position(id)) else {
            return Advance::NoSelection;
        };
        match self.sequence.get(index + 1) {
            Some(next) => {
                let next_id = next.id().clone();
                self.current = Some(next_id.clone());
                Advance::Moved(next_id)
            }
            None => Advance::AtEnd,
        }
    }

    /// First lesson in sequence order that is not complete.
    #[must_use]
    pub fn first_incomplete(&self, completed: &CompletionSet) -> Option<&Lesson> {
        self.sequence
            .iter()
            .find(|lesson| !completed.is_complete(lesson.id()))
    }

    #[must_use]
    pub fn outline(&self, completed: &CompletionSet) -> Vec<OutlineEntry> {
        self.sequence
            .iter()
            .enumerate()
            .map(|(index, lesson)| OutlineEntry {
                lesson_id: lesson.id().clone(),
                module_id: lesson.module_id().clone(),
                title: lesson.title().to_owned(),
                position: index + 1,
                is_current: self.current.as_ref() == Some(lesson.id()),
                is_complete: completed.is_complete(lesson.id()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::resources::LessonResources;

    fn lesson(id: &str) -> Lesson {
        Lesson::from_persisted(
            LessonId::new(id),
            ModuleId::new("m1"),
            format!("Lesson {id}"),
            String::new(),
            "https://v/1".into(),
            String::new(),
            None,
            None,
            LessonResources::default(),
            0,
        )
    }

    fn nav(ids: &[&str]) -> Navigation {
        Navigation::new(ids.iter().map(|id| lesson(id)).collect())
    }

    #[test]
    fn starts_on_first_lesson() {
        let nav = nav(&["l1", "l2"]);
        assert_eq!(nav.current_id(), Some(&LessonId::new("l1")));
        assert_eq!(nav.current_lesson().unwrap().title(), "Lesson l1");
    }

    #[test]
    fn empty_sequence_has_no_current_lesson() {
        let mut nav = Navigation::new(Vec::new());
        assert!(nav.current_lesson().is_none());
        assert_eq!(nav.advance(), Advance::NoSelection);
    }

    #[test]
    fn select_ignores_unknown_ids() {
        let mut nav = nav(&["l1", "l2"]);
        assert!(!nav.select(&LessonId::new("missing")));
        assert_eq!(nav.current_id(), Some(&LessonId::new("l1")));
        assert!(nav.select(&LessonId::new("l2")));
        assert_eq!(nav.current_id(), Some(&LessonId::new("l2")));
    }

    #[test]
    fn advance_moves_one_step_and_stops_at_end() {
        let mut nav = nav(&["l1", "l2"]);
        assert_eq!(nav.advance(), Advance::Moved(LessonId::new("l2")));
        assert_eq!(nav.advance(), Advance::AtEnd);
        assert_eq!(nav.current_id(), Some(&LessonId::new("l2")));
    }

    #[test]
    fn advance_never_skips_completed_lessons() {
        let mut nav = nav(&["l1", "l2", "l3", "l4"]);
        let completed = CompletionSet::from_ids([LessonId::new("l2"), LessonId::new("l3")]);
        assert_eq!(
            nav.first_incomplete(&completed).map(Lesson::id),
            Some(&LessonId::new("l1"))
        );

        assert_eq!(nav.advance(), Advance::Moved(LessonId::new("l2")));
        assert_eq!(nav.current_id(), Some(&LessonId::new("l2")));
        assert_eq!(
            nav.first_incomplete(&completed).map(Lesson::id),
            Some(&LessonId::new("l1"))
        );
    }

    #[test]
    fn replace_keeps_current_when_still_present() {
        let mut nav = nav(&["l1", "l2", "l3"]);
        nav.select(&LessonId::new("l3"));
        nav.replace_sequence(vec![lesson("l0"), lesson("l3")]);
        assert_eq!(nav.current_id(), Some(&LessonId::new("l3")));
    }

    #[test]
    fn replace_falls_back_to_first_when_current_removed() {
        let mut nav = nav(&["l1", "l2"]);
        nav.select(&LessonId::new("l2"));
        nav.replace_sequence(vec![lesson("l9"), lesson("l1")]);
        assert_eq!(nav.current_id(), Some(&LessonId::new("l9")));

        nav.replace_sequence(Vec::new());
        assert_eq!(nav.current_id(), None);
    }

    #[test]
    fn outline_marks_current_and_completed() {
        let nav = nav(&["l1", "l2"]);
        let done = CompletionSet::from_ids([LessonId::new("l2")]);
        let outline = nav.outline(&done);
        assert_eq!(outline.len(), 2);
        assert!(outline[0].is_current && !outline[0].is_complete);
        assert_eq!(outline[1].position, 2);
        assert!(outline[1].is_complete && !outline[1].is_current);
        assert_eq!(nav.first_incomplete(&done).unwrap().id().as_str(), "l1");
    }
}
