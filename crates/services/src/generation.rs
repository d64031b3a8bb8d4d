use std::env;

use async_trait::async_trait;
use course_core::model::LessonId;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GenerationError;

/// Image and audio produced for a lesson by the generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAssets {
    pub image_url: String,
    pub audio_url: String,
}

/// Capability that turns a lesson into generated media.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// # Errors
    ///
    /// Returns `GenerationError` if generation is disabled or fails.
    async fn generate(&self, lesson_id: &LessonId) -> Result<GeneratedAssets, GenerationError>;
}

#[derive(Clone, Debug)]
pub struct GenerationConfig {
    pub endpoint: String,
    pub api_key: String,
}

impl GenerationConfig {
    /// Reads `COURSE_GENERATION_URL` and `COURSE_GENERATION_KEY`. Generation
    /// stays disabled unless both are set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("COURSE_GENERATION_KEY").ok()?;
        let endpoint = env::var("COURSE_GENERATION_URL").ok()?;
        if api_key.trim().is_empty() || endpoint.trim().is_empty() {
            return None;
        }
        Some(Self { endpoint, api_key })
    }
}

/// Calls the lesson-content generation function over HTTP.
#[derive(Clone)]
pub struct HttpContentGenerator {
    client: Client,
    config: Option<GenerationConfig>,
}

impl HttpContentGenerator {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GenerationConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GenerationConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl ContentGenerator for HttpContentGenerator {
    async fn generate(&self, lesson_id: &LessonId) -> Result<GeneratedAssets, GenerationError> {
        let config = self.config.as_ref().ok_or(GenerationError::Disabled)?;

        debug!(lesson = %lesson_id, "requesting generated lesson content");
        let response = self
            .client
            .post(&config.endpoint)
            .bearer_auth(&config.api_key)
            .json(&GenerateRequest {
                lesson_id: lesson_id.as_str(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Prefer the backend's own message when it sends one.
            let message = response
                .json::<GenerateResponse>()
                .await
                .ok()
                .and_then(|body| body.error);
            warn!(lesson = %lesson_id, %status, ?message, "content generation failed");
            return Err(message.map_or(GenerationError::HttpStatus(status), GenerationError::Remote));
        }

        let body: GenerateResponse = response.json().await?;
        body.into_assets()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    lesson_id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    image_url: Option<String>,
    audio_url: Option<String>,
    error: Option<String>,
}

impl GenerateResponse {
    fn into_assets(self) -> Result<GeneratedAssets, GenerationError> {
        if let Some(message) = self.error {
            return Err(GenerationError::Remote(message));
        }
        let image_url = non_blank(self.image_url).ok_or(GenerationError::Incomplete("imageUrl"))?;
        let audio_url = non_blank(self.audio_url).ok_or(GenerationError::Incomplete("audioUrl"))?;
        Ok(GeneratedAssets {
            image_url,
            audio_url,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
