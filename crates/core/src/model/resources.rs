//! Structured view of a lesson's `resources` blob.
//!
//! The content store keeps resources as free text. When present it holds JSON in
//! one of two shapes: a bare list of strings, or an object carrying that list
//! under `items` together with optional generated asset URLs. Each key of the
//! object is read on its own, so one badly shaped key does not hide the others.
//! Anything else is treated as "no resources".

use serde::Serialize;
use serde_json::{Map, Value};

/// Resources attached to a lesson, parsed once at the storage boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonResources {
    items: Vec<String>,
    generated_image_url: Option<String>,
    generated_audio_url: Option<String>,
}

#[derive(Serialize)]
struct StoredResources<'a> {
    items: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    generated_image_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generated_audio_url: Option<&'a str>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// Non-string entries are skipped.
fn string_items(values: Vec<Value>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|value| match value {
            Value::String(item) => Some(item),
            _ => None,
        })
        .collect()
}

fn string_field(object: &mut Map<String, Value>, key: &str) -> Option<String> {
    match object.remove(key) {
        Some(Value::String(value)) => Some(value),
        _ => None,
    }
}

impl LessonResources {
    #[must_use]
    pub fn new(
        items: Vec<String>,
        generated_image_url: Option<String>,
        generated_audio_url: Option<String>,
    ) -> Self {
        Self {
            items,
            generated_image_url: non_blank(generated_image_url),
            generated_audio_url: non_blank(generated_audio_url),
        }
    }

    #[must_use]
    pub fn from_items(items: Vec<String>) -> Self {
        Self::new(items, None, None)
    }

    /// Parse the stored blob. Missing, blank, or malformed input yields the empty value.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::default();
        };

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(values)) => Self::from_items(string_items(values)),
            Ok(Value::Object(mut object)) => {
                let items = match object.remove("items") {
                    Some(Value::Array(values)) => string_items(values),
                    _ => Vec::new(),
                };
                Self::new(
                    items,
                    string_field(&mut object, "generated_image_url"),
                    string_field(&mut object, "generated_audio_url"),
                )
            }
            _ => Self::default(),
        }
    }

    /// Serialize back into the object form. Returns `None` when there is nothing to store.
    #[must_use]
    pub fn to_blob(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let stored = StoredResources {
            items: &self.items,
            generated_image_url: self.generated_image_url.as_deref(),
            generated_audio_url: self.generated_audio_url.as_deref(),
        };
        serde_json::to_string(&stored).ok()
    }

    /// Replace the generated asset URLs, keeping the existing item list.
    #[must_use]
    pub fn with_generated_assets(
        mut self,
        image_url: Option<String>,
        audio_url: Option<String>,
    ) -> Self {
        self.generated_image_url = non_blank(image_url);
        self.generated_audio_url = non_blank(audio_url);
        self
    }

    #[must_use]
    pub fn items(&self) -> &[String] {
        &self.items
    }

    #[must_use]
    pub fn generated_image_url(&self) -> Option<&str> {
        self.generated_image_url.as_deref()
    }

    #[must_use]
    pub fn generated_audio_url(&self) -> Option<&str> {
        self.generated_audio_url.as_deref()
    }

    #[must_use]
    pub fn has_generated_assets(&self) -> bool {
        self.generated_image_url.is_some() || self.generated_audio_url.is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && !self.has_generated_assets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_text_yields_empty_resources() {
        let parsed = LessonResources::parse(Some("not json"));
        assert!(parsed.items().is_empty());
        assert!(parsed.is_empty());
    }

    #[test]
    fn missing_blob_is_empty() {
        assert_eq!(LessonResources::parse(None), LessonResources::default());
        assert_eq!(LessonResources::parse(Some("   ")), LessonResources::default());
    }

    #[test]
    fn bare_list_becomes_items() {
        let parsed = LessonResources::parse(Some(r#"["Playwright docs", "ISTQB syllabus"]"#));
        assert_eq!(parsed.items(), ["Playwright docs", "ISTQB syllabus"]);
        assert!(!parsed.has_generated_assets());
    }

    #[test]
    fn object_form_carries_assets() {
        let parsed = LessonResources::parse(Some(
            r#"{"items":["a"],"generated_image_url":"https://img/1.png","generated_audio_url":null}"#,
        ));
        assert_eq!(parsed.items(), ["a"]);
        assert_eq!(parsed.generated_image_url(), Some("https://img/1.png"));
        assert_eq!(parsed.generated_audio_url(), None);
    }

    #[test]
    fn object_without_items_has_empty_list() {
        let parsed =
            LessonResources::parse(Some(r#"{"generated_audio_url":"data:audio/mpeg;base64,AA=="}"#));
        assert!(parsed.items().is_empty());
        assert_eq!(parsed.generated_audio_url(), Some("data:audio/mpeg;base64,AA=="));
    }

    #[test]
    fn wrong_shapes_are_treated_as_empty() {
        assert!(LessonResources::parse(Some("42")).is_empty());
        assert!(LessonResources::parse(Some(r#"[1, 2]"#)).is_empty());
        assert!(LessonResources::parse(Some(r#"{"items": "nope"}"#)).is_empty());
    }

    #[test]
    fn badly_shaped_items_keep_asset_urls() {
        let parsed = LessonResources::parse(Some(
            r#"{"items":[1,"a"],"generated_image_url":"https://img/1.png","generated_audio_url":7}"#,
        ));
        assert_eq!(parsed.items(), ["a"]);
        assert_eq!(parsed.generated_image_url(), Some("https://img/1.png"));
        assert_eq!(parsed.generated_audio_url(), None);

        let parsed = LessonResources::parse(Some(
            r#"{"items":"nope","generated_audio_url":"https://audio/1.mp3"}"#,
        ));
        assert!(parsed.items().is_empty());
        assert_eq!(parsed.generated_audio_url(), Some("https://audio/1.mp3"));
    }

    #[test]
    fn blank_asset_urls_count_as_absent() {
        let parsed = LessonResources::parse(Some(r#"{"generated_image_url":""}"#));
        assert!(!parsed.has_generated_assets());
    }

    #[test]
    fn generated_assets_preserve_items() {
        let updated = LessonResources::from_items(vec!["keep me".into()]).with_generated_assets(
            Some("https://img/2.png".into()),
            Some("https://audio/2.mp3".into()),
        );
        let reparsed = LessonResources::parse(updated.to_blob().as_deref());
        assert_eq!(reparsed, updated);
        assert_eq!(reparsed.items(), ["keep me"]);
    }

    #[test]
    fn empty_resources_store_nothing() {
        assert_eq!(LessonResources::default().to_blob(), None);
    }
}
