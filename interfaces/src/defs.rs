use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Closed vocabulary the tagger may choose from. Used verbatim in prompts and
/// for validating model output.
pub const TAG_OPTIONS: [&str; 17] = [
    "vss",
    "shortform",
    "micropoem",
    "monoku",
    "haiku",
    "longform",
    "sad",
    "happy",
    "whimsical",
    "fun",
    "rhyme",
    "dark",
    "tender",
    "loving",
    "longing",
    "melancholy",
    "passionate",
];

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const UNTITLED_POEM: &str = "Untitled Poem";

/// A post as it came off the feed (or out of a previously saved file).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPost {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub published_at: String,
    /// Space-joined hashtags from the source record.
    #[serde(default, deserialize_with = "tags_as_text")]
    pub tags: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub cid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Anything else found in an input file, written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawPost {
    pub fn new(content: impl Into<String>, published_at: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            published_at: published_at.into(),
            ..Default::default()
        }
    }

    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// Publication time as wall-clock, or `None` when the stored value is not
    /// a usable timestamp.
    pub fn published_naive(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.published_at)
    }

    /// `title_en` wins over `title`; blank values count as absent.
    pub fn existing_title(&self) -> Option<&str> {
        self.title_en
            .as_deref()
            .or(self.title.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

/// A post after the enrichment pipeline. Field order here is the order
/// written to the output file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedPost {
    pub content: String,
    pub published_at: String,
    pub uri: String,
    pub cid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub poem_en: String,
    pub title_en: String,
    /// `title_<lang>` / `poem_<lang>`, empty when translation is off.
    #[serde(flatten)]
    pub translations: BTreeMap<String, String>,
    pub tags: Vec<String>,
    pub category: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EnrichedPost {
    pub fn translated_title(&self, language: &str) -> Option<&str> {
        self.translations
            .get(&translation_key("title", language))
            .map(String::as_str)
    }

    pub fn translated_poem(&self, language: &str) -> Option<&str> {
        self.translations
            .get(&translation_key("poem", language))
            .map(String::as_str)
    }
}

/// `("title", "Italian")` -> `"title_italian"`
pub fn translation_key(field: &str, language: &str) -> String {
    format!("{}_{}", field, language.trim().to_lowercase())
}

/// Accepts RFC 3339 (`Z` or numeric offset), a naive ISO datetime, or a bare
/// date. The offset is dropped, not applied: the wall-clock value is kept.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn tags_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TagsField {
        Text(String),
        List(Vec<String>),
    }

    Ok(match Option::<TagsField>::deserialize(deserializer)? {
        Some(TagsField::Text(text)) => text,
        Some(TagsField::List(list)) => list.join(" "),
        None => String::new(),
    })
}
