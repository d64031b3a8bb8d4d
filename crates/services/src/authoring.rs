use std::sync::Arc;

use course_core::model::{
    Lesson, LessonDraft, LessonId, LessonResources, Module, ModuleDraft, ModuleId, ViewerState,
};
use storage::repository::{ContentRepository, StorageError};
use tracing::info;

use crate::error::AuthoringError;
use crate::generation::ContentGenerator;
use crate::roles::RoleService;

/// Admin-only writes to the content store.
///
/// Learner sessions pick these edits up on their next `reload`.
#[derive(Clone)]
pub struct AuthoringService {
    content: Arc<dyn ContentRepository>,
    roles: RoleService,
    generator: Arc<dyn ContentGenerator>,
}

impl AuthoringService {
    #[must_use]
    pub fn new(
        content: Arc<dyn ContentRepository>,
        roles: RoleService,
        generator: Arc<dyn ContentGenerator>,
    ) -> Self {
        Self {
            content,
            roles,
            generator,
        }
    }

    /// # Errors
    ///
    /// Returns `AuthoringError` on access, validation or storage failure.
    pub async fn create_module(
        &self,
        viewer: &ViewerState,
        draft: ModuleDraft,
    ) -> Result<Module, AuthoringError> {
        self.roles.require_admin(viewer).await?;
        let module = draft.into_module(ModuleId::generate())?;
        self.content.upsert_module(&module).await?;
        info!(module = %module.id(), "module created");
        Ok(module)
    }

    /// # Errors
    ///
    /// Returns `AuthoringError` on access, validation or storage failure.
    pub async fn update_module(
        &self,
        viewer: &ViewerState,
        id: &ModuleId,
        draft: ModuleDraft,
    ) -> Result<Module, AuthoringError> {
        self.roles.require_admin(viewer).await?;
        let exists = self
            .content
            .list_modules()
            .await?
            .iter()
            .any(|module| module.id() == id);
        if !exists {
            return Err(StorageError::NotFound.into());
        }
        let module = draft.into_module(id.clone())?;
        self.content.upsert_module(&module).await?;
        Ok(module)
    }

    /// Deletes the module and every lesson in it.
    ///
    /// # Errors
    ///
    /// Returns `AuthoringError` on access or storage failure.
    pub async fn delete_module(
        &self,
        viewer: &ViewerState,
        id: &ModuleId,
    ) -> Result<(), AuthoringError> {
        self.roles.require_admin(viewer).await?;
        self.content.delete_module(id).await?;
        info!(module = %id, "module deleted");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AuthoringError` on access or validation failure, or
    /// `StorageError::NotFound` when the owning module does not exist.
    pub async fn create_lesson(
        &self,
        viewer: &ViewerState,
        draft: LessonDraft,
    ) -> Result<Lesson, AuthoringError> {
        self.roles.require_admin(viewer).await?;
        let lesson = draft.into_lesson(LessonId::generate())?;
        self.content.upsert_lesson(&lesson).await?;
        info!(lesson = %lesson.id(), module = %lesson.module_id(), "lesson created");
        Ok(lesson)
    }

    /// # Errors
    ///
    /// Returns `AuthoringError` on access, validation or storage failure.
    pub async fn update_lesson(
        &self,
        viewer: &ViewerState,
        id: &LessonId,
        draft: LessonDraft,
    ) -> Result<Lesson, AuthoringError> {
        self.roles.require_admin(viewer).await?;
        if self.content.get_lesson(id).await?.is_none() {
            return Err(StorageError::NotFound.into());
        }
        let lesson = draft.into_lesson(id.clone())?;
        self.content.upsert_lesson(&lesson).await?;
        Ok(lesson)
    }

    /// # Errors
    ///
    /// Returns `AuthoringError` on access or storage failure.
    pub async fn delete_lesson(
        &self,
        viewer: &ViewerState,
        id: &LessonId,
    ) -> Result<(), AuthoringError> {
        self.roles.require_admin(viewer).await?;
        self.content.delete_lesson(id).await?;
        info!(lesson = %id, "lesson deleted");
        Ok(())
    }

    /// Generate image and audio for a lesson and store their URLs in its
    /// resources. Existing resource items are kept.
    ///
    /// # Errors
    ///
    /// Returns `AuthoringError` on access, generation or storage failure.
    pub async fn generate_assets(
        &self,
        viewer: &ViewerState,
        id: &LessonId,
    ) -> Result<LessonResources, AuthoringError> {
        self.roles.require_admin(viewer).await?;
        let lesson = self
            .content
            .get_lesson(id)
            .await?
            .ok_or(StorageError::NotFound)?;

        let assets = self.generator.generate(id).await?;
        let resources = lesson
            .resources()
            .clone()
            .with_generated_assets(Some(assets.image_url), Some(assets.audio_url));
        self.content.update_lesson_resources(id, &resources).await?;
        info!(lesson = %id, "generated assets stored");
        Ok(resources)
    }
}
