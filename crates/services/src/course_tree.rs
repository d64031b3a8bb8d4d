use std::sync::Arc;

use course_core::model::CourseTree;
use storage::repository::ContentRepository;
use tracing::{debug, warn};

use crate::error::CourseError;

/// Reads modules and lessons and assembles the ordered course tree.
#[derive(Clone)]
pub struct CourseTreeLoader {
    content: Arc<dyn ContentRepository>,
}

impl CourseTreeLoader {
    #[must_use]
    pub fn new(content: Arc<dyn ContentRepository>) -> Self {
        Self { content }
    }

    /// Load the course tree. Safe to call again to pick up authoring edits.
    ///
    /// An empty store is not an error: the returned tree is simply empty.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::ContentUnavailable` if either list cannot be read.
    pub async fn load_tree(&self) -> Result<CourseTree, CourseError> {
        let (modules, lessons) =
            tokio::join!(self.content.list_modules(), self.content.list_lessons());
        let modules = modules.map_err(CourseError::ContentUnavailable)?;
        let lessons = lessons.map_err(CourseError::ContentUnavailable)?;

        let tree = CourseTree::assemble(modules, lessons);
        if tree.orphaned() > 0 {
            warn!(
                orphaned = tree.orphaned(),
                "lessons reference missing modules and were left out"
            );
        }
        debug!(
            modules = tree.modules().len(),
            lessons = tree.sequence().len(),
            "course tree loaded"
        );
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::{LessonDraft, LessonId, LessonResources, Module, ModuleId};
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn loads_ordered_tree_from_store() {
        let repo = InMemoryRepository::new();
        for (id, order) in [("m2", 1), ("m1", 0)] {
            let module = Module::new(ModuleId::new(id), id, "", order).unwrap();
            repo.upsert_module(&module).await.unwrap();
        }
        for (id, module_id, order) in [("l3", "m2", 0), ("l2", "m1", 1), ("l1", "m1", 0)] {
            let lesson = LessonDraft {
                module_id: ModuleId::new(module_id),
                title: id.into(),
                description: String::new(),
                video_url: "https://v/1".into(),
                trainer_script: String::new(),
                visual_suggestion: None,
                example: None,
                resources: LessonResources::default(),
                order_index: order,
            }
            .into_lesson(LessonId::new(id))
            .unwrap();
            repo.upsert_lesson(&lesson).await.unwrap();
        }

        let loader = CourseTreeLoader::new(Arc::new(repo));
        let tree = loader.load_tree().await.unwrap();
        let ids: Vec<_> = tree.sequence().iter().map(|l| l.id().as_str()).collect();
        assert_eq!(ids, ["l1", "l2", "l3"]);
    }

    #[tokio::test]
    async fn empty_store_is_not_an_error() {
        let loader = CourseTreeLoader::new(Arc::new(InMemoryRepository::new()));
        assert!(loader.load_tree().await.unwrap().is_empty());
    }
}
