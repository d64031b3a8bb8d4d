//! Ordered module → lesson hierarchy and the flattened lesson sequence.

use std::collections::HashMap;

use crate::model::ids::{LessonId, ModuleId};
use crate::model::lesson::Lesson;
use crate::model::module::Module;

/// The course as loaded from the content store.
///
/// Modules are ordered by `order_index` (id breaks ties). The lesson sequence is
/// the concatenation of each module's lessons, themselves ordered by
/// `order_index` then id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseTree {
    modules: Vec<Module>,
    sequence: Vec<Lesson>,
    orphaned: usize,
}

impl CourseTree {
    /// Assemble the tree from unordered modules and lessons.
    ///
    /// Lessons whose module is missing cannot be placed in the sequence and are
    /// dropped; `orphaned()` reports how many.
    #[must_use]
    pub fn assemble(mut modules: Vec<Module>, lessons: Vec<Lesson>) -> Self {
        modules.sort_by(|a, b| {
            a.order_index()
                .cmp(&b.order_index())
                .then_with(|| a.id().cmp(b.id()))
        });

        let mut by_module: HashMap<ModuleId, Vec<Lesson>> = HashMap::new();
        for lesson in lessons {
            by_module
                .entry(lesson.module_id().clone())
                .or_default()
                .push(lesson);
        }

        let mut sequence = Vec::new();
        for module in &modules {
            if let Some(mut group) = by_module.remove(module.id()) {
                group.sort_by(|a, b| {
                    a.order_index()
                        .cmp(&b.order_index())
                        .then_with(|| a.id().cmp(b.id()))
                });
                sequence.extend(group);
            }
        }

        let orphaned = by_module.values().map(Vec::len).sum();
        Self {
            modules,
            sequence,
            orphaned,
        }
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Flattened, globally ordered lessons used for navigation.
    #[must_use]
    pub fn sequence(&self) -> &[Lesson] {
        &self.sequence
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<Module>, Vec<Lesson>) {
        (self.modules, self.sequence)
    }

    #[must_use]
    pub fn orphaned(&self) -> usize {
        self.orphaned
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    #[must_use]
    pub fn lesson(&self, id: &LessonId) -> Option<&Lesson> {
        self.sequence.iter().find(|lesson| lesson.id() == id)
    }

    /// Lessons of a single module, in order.
    pub fn lessons_in<'a>(&'a self, module_id: &'a ModuleId) -> impl Iterator<Item = &'a Lesson> {
        self.sequence
            .iter()
            .filter(move |lesson| lesson.module_id() == module_id)
    }
}
