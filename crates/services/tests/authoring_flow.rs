use std::sync::Arc;

use async_trait::async_trait;
use course_core::model::{
    LessonDraft, LessonId, LessonMedia, LessonResources, ModuleDraft, ModuleId, Profile, Role,
    UserId, ViewerState,
};
use course_core::time::fixed_now;
use services::{
    AppServices, AuthoringError, Clock, ContentGenerator, GeneratedAssets, GenerationError,
    RoleError,
};
use storage::repository::{InMemoryRepository, RoleRepository, Storage, StorageError};

struct FixedGenerator;

#[async_trait]
impl ContentGenerator for FixedGenerator {
    async fn generate(&self, lesson_id: &LessonId) -> Result<GeneratedAssets, GenerationError> {
        Ok(GeneratedAssets {
            image_url: format!("https://cdn.example/{lesson_id}.png"),
            audio_url: format!("https://cdn.example/{lesson_id}.mp3"),
        })
    }
}

async fn services_with_admin(repo: &InMemoryRepository) -> AppServices {
    repo.grant_role(&UserId::new("admin"), Role::Admin)
        .await
        .unwrap();
    AppServices::from_storage(
        Storage::from_in_memory(repo.clone()),
        Clock::fixed(fixed_now()),
        Arc::new(FixedGenerator),
    )
}

fn lesson_draft(module_id: &ModuleId, title: &str, items: Vec<String>) -> LessonDraft {
    LessonDraft {
        module_id: module_id.clone(),
        title: title.into(),
        description: "Intro".into(),
        video_url: "https://video.example/intro".into(),
        trainer_script: "Welcome.".into(),
        visual_suggestion: Some("Whiteboard".into()),
        example: None,
        resources: LessonResources::from_items(items),
        order_index: 0,
    }
}

#[tokio::test]
async fn authored_content_reaches_learner_on_reload() {
    let repo = InMemoryRepository::new();
    let app = services_with_admin(&repo).await;
    let admin = ViewerState::Authenticated(UserId::new("admin"));
    let learner = ViewerState::Authenticated(UserId::new("learner"));

    let mut session = app.course_session();
    session.open(&learner).await.unwrap();
    assert!(session.current_lesson().is_none());

    let authoring = app.authoring();
    let module = authoring
        .create_module(
            &admin,
            ModuleDraft {
                title: "Getting started".into(),
                description: String::new(),
                order_index: 0,
            },
        )
        .await
        .unwrap();
    let lesson = authoring
        .create_lesson(&admin, lesson_draft(module.id(), "Hello", Vec::new()))
        .await
        .unwrap();

    session.reload().await.unwrap();
    assert_eq!(session.current_lesson_id(), Some(lesson.id()));
    assert_eq!(session.modules().len(), 1);
}

#[tokio::test]
async fn learners_cannot_author() {
    let repo = InMemoryRepository::new();
    let app = services_with_admin(&repo).await;
    let draft = ModuleDraft {
        title: "Nope".into(),
        description: String::new(),
        order_index: 0,
    };

    let learner = ViewerState::Authenticated(UserId::new("learner"));
    let err = app
        .authoring()
        .create_module(&learner, draft.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthoringError::Access(RoleError::Forbidden)));

    let err = app
        .authoring()
        .create_module(&ViewerState::Resolving, draft)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthoringError::Access(RoleError::Resolving)));
}

#[tokio::test]
async fn generated_assets_keep_existing_items() {
    let repo = InMemoryRepository::new();
    let app = services_with_admin(&repo).await;
    let admin = ViewerState::Authenticated(UserId::new("admin"));
    let authoring = app.authoring();

    let module = authoring
        .create_module(
            &admin,
            ModuleDraft {
                title: "Media".into(),
                description: String::new(),
                order_index: 0,
            },
        )
        .await
        .unwrap();
    let lesson = authoring
        .create_lesson(
            &admin,
            lesson_draft(module.id(), "Slides", vec!["Worksheet".into()]),
        )
        .await
        .unwrap();

    let resources = authoring.generate_assets(&admin, lesson.id()).await.unwrap();
    assert_eq!(resources.items(), ["Worksheet"]);

    let mut session = app.course_session();
    session.open(&admin).await.unwrap();
    let stored = session.current_lesson().unwrap();
    assert_eq!(stored.resources().items(), ["Worksheet"]);
    let expected_image = format!("https://cdn.example/{}.png", lesson.id());
    assert!(matches!(
        stored.media(),
        LessonMedia::Generated { image_url: Some(url), .. } if url == expected_image
    ));
}

#[tokio::test]
async fn deleting_a_module_removes_its_lessons() {
    let repo = InMemoryRepository::new();
    let app = services_with_admin(&repo).await;
    let admin = ViewerState::Authenticated(UserId::new("admin"));
    let authoring = app.authoring();

    let module = authoring
        .create_module(
            &admin,
            ModuleDraft {
                title: "Temporary".into(),
                description: String::new(),
                order_index: 0,
            },
        )
        .await
        .unwrap();
    authoring
        .create_lesson(&admin, lesson_draft(module.id(), "Gone soon", Vec::new()))
        .await
        .unwrap();
    authoring.delete_module(&admin, module.id()).await.unwrap();

    let mut session = app.course_session();
    let report = session.open(&admin).await.unwrap();
    assert_eq!(report.lessons, 0);
}

#[tokio::test]
async fn admin_manages_roles() {
    let repo = InMemoryRepository::new();
    let app = services_with_admin(&repo).await;
    for id in ["admin", "learner"] {
        repo.upsert_profile(&Profile {
            id: UserId::new(id),
            email: format!("{id}@example.com"),
            full_name: None,
        })
        .await
        .unwrap();
    }
    let admin = ViewerState::Authenticated(UserId::new("admin"));
    let roles = app.roles();

    roles
        .set_admin(&admin, &UserId::new("learner"), true)
        .await
        .unwrap();
    roles
        .set_admin(&admin, &UserId::new("learner"), true)
        .await
        .unwrap();
    let users = roles.list_users(&admin).await.unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|user| user.is_admin));

    roles
        .set_admin(&admin, &UserId::new("learner"), false)
        .await
        .unwrap();
    assert!(!roles.is_admin(&UserId::new("learner")).await.unwrap());
}

#[tokio::test]
async fn lesson_for_missing_module_is_rejected() {
    let repo = InMemoryRepository::new();
    let app = services_with_admin(&repo).await;
    let admin = ViewerState::Authenticated(UserId::new("admin"));

    let err = app
        .authoring()
        .create_lesson(&admin, lesson_draft(&ModuleId::new("nowhere"), "Lost", Vec::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthoringError::Storage(StorageError::NotFound)));

    let mut session = app.course_session();
    assert_eq!(session.open(&admin).await.unwrap().lessons, 0);
}
