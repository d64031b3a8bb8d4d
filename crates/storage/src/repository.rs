use async_trait::async_trait;
use course_core::model::{
    CompletionRecord, Lesson, LessonId, LessonResources, Module, ModuleId, Profile, Role, UserId,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint rejected the write.
    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of a lesson, with `resources` still as the raw stored text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonRecord {
    pub id: LessonId,
    pub module_id: ModuleId,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub trainer_script: String,
    pub visual_suggestion: Option<String>,
    pub example_code: Option<String>,
    pub resources: Option<String>,
    pub order_index: i32,
}

impl LessonRecord {
    #[must_use]
    pub fn from_lesson(lesson: &Lesson) -> Self {
        Self {
            id: lesson.id().clone(),
            module_id: lesson.module_id().clone(),
            title: lesson.title().to_owned(),
            description: lesson.description().to_owned(),
            video_url: lesson.video_url().to_owned(),
            trainer_script: lesson.trainer_script().to_owned(),
            visual_suggestion: lesson.visual_suggestion().map(str::to_owned),
            example_code: lesson.example().map(str::to_owned),
            resources: lesson.resources().to_blob(),
            order_index: lesson.order_index(),
        }
    }

    /// Convert into the domain `Lesson`, parsing the resources blob.
    ///
    /// Malformed resources never fail the conversion; they become empty.
    #[must_use]
    pub fn into_lesson(self) -> Lesson {
        let resources = LessonResources::parse(self.resources.as_deref());
        Lesson::from_persisted(
            self.id,
            self.module_id,
            self.title,
            self.description,
            self.video_url,
            self.trainer_script,
            self.visual_suggestion,
            self.example_code,
            resources,
            self.order_index,
        )
    }
}

/// Content store: modules and lessons.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// List modules ordered by `order_index`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn list_modules(&self) -> Result<Vec<Module>, StorageError>;

    /// List all lessons ordered by `order_index`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn list_lessons(&self) -> Result<Vec<Lesson>, StorageError>;

    /// Fetch a lesson by ID. Returns `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn get_lesson(&self, id: &LessonId) -> Result<Option<Lesson>, StorageError>;

    /// Create or update a module.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the module cannot be stored.
    async fn upsert_module(&self, module: &Module) -> Result<(), StorageError>;

    /// Delete a module together with its lessons.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the module does not exist.
    async fn delete_module(&self, id: &ModuleId) -> Result<(), StorageError>;

    /// Create or update a lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the owning module does not exist.
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError>;

    /// Delete a lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the lesson does not exist.
    async fn delete_lesson(&self, id: &LessonId) -> Result<(), StorageError>;

    /// Overwrite only the resources blob of a lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the lesson does not exist.
    async fn update_lesson_resources(
        &self,
        id: &LessonId,
        resources: &LessonResources,
    ) -> Result<(), StorageError>;
}

/// Progress store: one completion record per (user, lesson).
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn list_completions(&self, user_id: &UserId)
    -> Result<Vec<CompletionRecord>, StorageError>;

    /// Insert a completion record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` when the pair is already recorded, or
    /// other storage errors.
    async fn insert_completion(&self, record: &CompletionRecord) -> Result<(), StorageError>;
}

/// User profiles and role grants.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn list_profiles(&self) -> Result<Vec<Profile>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be stored.
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn roles_for(&self, user_id: &UserId) -> Result<Vec<Role>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::Conflict` when the role is already granted.
    async fn grant_role(&self, user_id: &UserId, role: Role) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the role was not granted.
    async fn revoke_role(&self, user_id: &UserId, role: Role) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct ContentState {
    modules: HashMap<ModuleId, Module>,
    lessons: HashMap<LessonId, LessonRecord>,
}

#[derive(Default)]
struct AccountState {
    profiles: HashMap<UserId, Profile>,
    roles: BTreeSet<(UserId, Role)>,
}

fn poisoned<E: ToString>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    content: Arc<Mutex<ContentState>>,
    completions: Arc<Mutex<HashMap<(UserId, LessonId), CompletionRecord>>>,
    accounts: Arc<Mutex<AccountState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a lesson row verbatim, including an unparsed resources blob.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the owning module does not exist.
    pub fn insert_lesson_record(&self, record: LessonRecord) -> Result<(), StorageError> {
        let mut guard = self.content.lock().map_err(poisoned)?;
        if !guard.modules.contains_key(&record.module_id) {
            return Err(StorageError::NotFound);
        }
        guard.lessons.insert(record.id.clone(), record);
        Ok(())
    }
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    async fn list_modules(&self) -> Result<Vec<Module>, StorageError> {
        let guard = self.content.lock().map_err(poisoned)?;
        let mut modules: Vec<Module> = guard.modules.values().cloned().collect();
        modules.sort_by(|a, b| {
            a.order_index()
                .cmp(&b.order_index())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(modules)
    }

    async fn list_lessons(&self) -> Result<Vec<Lesson>, StorageError> {
        let guard = self.content.lock().map_err(poisoned)?;
        let mut records: Vec<LessonRecord> = guard.lessons.values().cloned().collect();
        records.sort_by(|a, b| a.order_index.cmp(&b.order_index).then_with(|| a.id.cmp(&b.id)));
        Ok(records.into_iter().map(LessonRecord::into_lesson).collect())
    }

    async fn get_lesson(&self, id: &LessonId) -> Result<Option<Lesson>, StorageError> {
        let guard = self.content.lock().map_err(poisoned)?;
        Ok(guard.lessons.get(id).cloned().map(LessonRecord::into_lesson))
    }

    async fn upsert_module(&self, module: &Module) -> Result<(), StorageError> {
        let mut guard = self.content.lock().map_err(poisoned)?;
        guard.modules.insert(module.id().clone(), module.clone());
        Ok(())
    }

    async fn delete_module(&self, id: &ModuleId) -> Result<(), StorageError> {
        let mut guard = self.content.lock().map_err(poisoned)?;
        if guard.modules.remove(id).is_none() {
            return Err(StorageError::NotFound);
        }
        guard.lessons.retain(|_, lesson| &lesson.module_id != id);
        Ok(())
    }

    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        self.insert_lesson_record(LessonRecord::from_lesson(lesson))
    }

    async fn delete_lesson(&self, id: &LessonId) -> Result<(), StorageError> {
        let mut guard = self.content.lock().map_err(poisoned)?;
        guard
            .lessons
            .remove(id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn update_lesson_resources(
        &self,
        id: &LessonId,
        resources: &LessonResources,
    ) -> Result<(), StorageError> {
        let mut guard = self.content.lock().map_err(poisoned)?;
        let record = guard.lessons.get_mut(id).ok_or(StorageError::NotFound)?;
        record.resources = resources.to_blob();
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn list_completions(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<CompletionRecord>, StorageError> {
        let guard = self.completions.lock().map_err(poisoned)?;
        let mut records: Vec<CompletionRecord> = guard
            .values()
            .filter(|record| &record.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.completed_at.cmp(&b.completed_at));
        Ok(records)
    }

    async fn insert_completion(&self, record: &CompletionRecord) -> Result<(), StorageError> {
        let mut guard = self.completions.lock().map_err(poisoned)?;
        let key = (record.user_id.clone(), record.lesson_id.clone());
        if guard.contains_key(&key) {
            return Err(StorageError::Conflict);
        }
        guard.insert(key, record.clone());
        Ok(())
    }
}

#[async_trait]
impl RoleRepository for InMemoryRepository {
    async fn list_profiles(&self) -> Result<Vec<Profile>, StorageError> {
        let guard = self.accounts.lock().map_err(poisoned)?;
        let mut profiles: Vec<Profile> = guard.profiles.values().cloned().collect();
        profiles.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(profiles)
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        let mut guard = self.accounts.lock().map_err(poisoned)?;
        guard.profiles.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn roles_for(&self, user_id: &UserId) -> Result<Vec<Role>, StorageError> {
        let guard = self.accounts.lock().map_err(poisoned)?;
        Ok(guard
            .roles
            .iter()
            .filter(|(user, _)| user == user_id)
            .map(|(_, role)| *role)
            .collect())
    }

    async fn grant_role(&self, user_id: &UserId, role: Role) -> Result<(), StorageError> {
        let mut guard = self.accounts.lock().map_err(poisoned)?;
        if guard.roles.insert((user_id.clone(), role)) {
            Ok(())
        } else {
            Err(StorageError::Conflict)
        }
    }

    async fn revoke_role(&self, user_id: &UserId, role: Role) -> Result<(), StorageError> {
        let mut guard = self.accounts.lock().map_err(poisoned)?;
        if guard.roles.remove(&(user_id.clone(), role)) {
            Ok(())
        } else {
            Err(StorageError::NotFound)
        }
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub content: Arc<dyn ContentRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub roles: Arc<dyn RoleRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let content: Arc<dyn ContentRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let roles: Arc<dyn RoleRepository> = Arc::new(repo);
        Self {
            content,
            progress,
            roles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::time::fixed_now;

    fn module(id: &str, order: i32) -> Module {
        Module::new(ModuleId::new(id), format!("Module {id}"), "", order).unwrap()
    }

    fn record(id: &str, module_id: &str, resources: Option<&str>) -> LessonRecord {
        LessonRecord {
            id: LessonId::new(id),
            module_id: ModuleId::new(module_id),
            title: format!("Lesson {id}"),
            description: String::new(),
            video_url: "https://video/1".into(),
            trainer_script: "Script".into(),
            visual_suggestion: None,
            example_code: None,
            resources: resources.map(str::to_owned),
            order_index: 0,
        }
    }

    #[tokio::test]
    async fn malformed_resources_load_as_empty() {
        let repo = InMemoryRepository::new();
        repo.upsert_module(&module("m1", 0)).await.unwrap();
        repo.insert_lesson_record(record("l1", "m1", Some("not json")))
            .unwrap();

        let lesson = repo.get_lesson(&LessonId::new("l1")).await.unwrap().unwrap();
        assert!(lesson.resources().items().is_empty());
    }

    #[tokio::test]
    async fn lesson_requires_existing_module() {
        let repo = InMemoryRepository::new();
        let err = repo
            .insert_lesson_record(record("l1", "missing", None))
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn deleting_module_removes_its_lessons() {
        let repo = InMemoryRepository::new();
        repo.upsert_module(&module("m1", 0)).await.unwrap();
        repo.upsert_module(&module("m2", 1)).await.unwrap();
        repo.insert_lesson_record(record("l1", "m1", None)).unwrap();
        repo.insert_lesson_record(record("l2", "m2", None)).unwrap();

        repo.delete_module(&ModuleId::new("m1")).await.unwrap();
        let lessons = repo.list_lessons().await.unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].id(), &LessonId::new("l2"));
    }

    #[tokio::test]
    async fn duplicate_completion_is_a_conflict() {
        let repo = InMemoryRepository::new();
        let record = CompletionRecord::new(UserId::new("u1"), LessonId::new("l1"), fixed_now());
        repo.insert_completion(&record).await.unwrap();
        let err = repo.insert_completion(&record).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
        assert_eq!(
            repo.list_completions(&UserId::new("u1")).await.unwrap().len(),
            1
        );
        assert!(repo.list_completions(&UserId::new("u2")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn role_grants_are_unique() {
        let repo = InMemoryRepository::new();
        let user = UserId::new("u1");
        repo.grant_role(&user, Role::Admin).await.unwrap();
        assert!(matches!(
            repo.grant_role(&user, Role::Admin).await,
            Err(StorageError::Conflict)
        ));
        assert_eq!(repo.roles_for(&user).await.unwrap(), [Role::Admin]);
        repo.revoke_role(&user, Role::Admin).await.unwrap();
        assert!(matches!(
            repo.revoke_role(&user, Role::Admin).await,
            Err(StorageError::NotFound)
        ));
    }
}
