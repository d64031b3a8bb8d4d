use thiserror::Error;
use url::Url;

use crate::model::ids::{LessonId, ModuleId};
use crate::model::resources::LessonResources;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("invalid video url: {0}")]
    InvalidVideoUrl(String),
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// The atomic unit of content a learner completes.
///
/// Every lesson belongs to exactly one module; `order_index` orders it within
/// that module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    module_id: ModuleId,
    title: String,
    description: String,
    video_url: String,
    trainer_script: String,
    visual_suggestion: Option<String>,
    example: Option<String>,
    resources: LessonResources,
    order_index: i32,
}

/// What the media panel of a lesson shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonMedia<'a> {
    /// Generated visual and narration take precedence over the video.
    Generated {
        image_url: Option<&'a str>,
        audio_url: Option<&'a str>,
    },
    Video(&'a str),
}

fn optional_text(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Lesson {
    /// Rebuild a lesson from stored fields. Stored rows are trusted as-is.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        id: LessonId,
        module_id: ModuleId,
        title: String,
        description: String,
        video_url: String,
        trainer_script: String,
        visual_suggestion: Option<String>,
        example: Option<String>,
        resources: LessonResources,
        order_index: i32,
    ) -> Self {
        Self {
            id,
            module_id,
            title,
            description,
            video_url,
            trainer_script,
            visual_suggestion: optional_text(visual_suggestion),
            example: optional_text(example),
            resources,
            order_index,
        }
    }

    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn module_id(&self) -> &ModuleId {
        &self.module_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn video_url(&self) -> &str {
        &self.video_url
    }

    #[must_use]
    pub fn trainer_script(&self) -> &str {
        &self.trainer_script
    }

    #[must_use]
    pub fn visual_suggestion(&self) -> Option<&str> {
        self.visual_suggestion.as_deref()
    }

    #[must_use]
    pub fn example(&self) -> Option<&str> {
        self.example.as_deref()
    }

    #[must_use]
    pub fn resources(&self) -> &LessonResources {
        &self.resources
    }

    #[must_use]
    pub fn order_index(&self) -> i32 {
        self.order_index
    }

    #[must_use]
    pub fn media(&self) -> LessonMedia<'_> {
        if self.resources.has_generated_assets() {
            LessonMedia::Generated {
                image_url: self.resources.generated_image_url(),
                audio_url: self.resources.generated_audio_url(),
            }
        } else {
            LessonMedia::Video(&self.video_url)
        }
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Authoring input for a lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonDraft {
    pub module_id: ModuleId,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub trainer_script: String,
    pub visual_suggestion: Option<String>,
    pub example: Option<String>,
    pub resources: LessonResources,
    pub order_index: i32,
}

impl LessonDraft {
    /// Validate the draft and assign it an id.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::EmptyTitle` for a blank title and
    /// `LessonError::InvalidVideoUrl` when the video reference is not an absolute URL.
    pub fn into_lesson(self, id: LessonId) -> Result<Lesson, LessonError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        let video_url = self.video_url.trim().to_owned();
        Url::parse(&video_url).map_err(|_| LessonError::InvalidVideoUrl(video_url.clone()))?;

        Ok(Lesson::from_persisted(
            id,
            self.module_id,
            title,
            self.description,
            video_url,
            self.trainer_script,
            self.visual_suggestion,
            self.example,
            self.resources,
            self.order_index,
        ))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> LessonDraft {
        LessonDraft {
            module_id: ModuleId::new("m1"),
            title: "Introduction to Testing".into(),
            description: "QA mindset".into(),
            video_url: "https://www.youtube.com/embed/abc".into(),
            trainer_script: "Welcome!".into(),
            visual_suggestion: Some("  ".into()),
            example: None,
            resources: LessonResources::default(),
            order_index: 0,
        }
    }

    #[test]
    fn draft_validates_title_and_url() {
        let mut bad_title = draft();
        bad_title.title = String::new();
        assert_eq!(
            bad_title.into_lesson(LessonId::new("l1")).unwrap_err(),
            LessonError::EmptyTitle
        );

        let mut bad_url = draft();
        bad_url.video_url = "not a url".into();
        assert!(matches!(
            bad_url.into_lesson(LessonId::new("l1")),
            Err(LessonError::InvalidVideoUrl(_))
        ));
    }

    #[test]
    fn blank_optional_text_is_absent() {
        let lesson = draft().into_lesson(LessonId::new("l1")).unwrap();
        assert_eq!(lesson.visual_suggestion(), None);
        assert_eq!(lesson.example(), None);
    }

    #[test]
    fn media_prefers_generated_assets() {
        let lesson = draft().into_lesson(LessonId::new("l1")).unwrap();
        assert_eq!(lesson.media(), LessonMedia::Video("https://www.youtube.com/embed/abc"));

        let mut with_assets = draft();
        with_assets.resources =
            LessonResources::default().with_generated_assets(None, Some("https://a/1.mp3".into()));
        let lesson = with_assets.into_lesson(LessonId::new("l2")).unwrap();
        assert_eq!(
            lesson.media(),
            LessonMedia::Generated {
                image_url: None,
                audio_url: Some("https://a/1.mp3"),
            }
        );
    }
}
