use std::time::Duration;

use serde::{Deserialize, Serialize};

// Use the interfaces crate for the record types
pub use poem_interfaces::defs::{
    parse_timestamp, translation_key, EnrichedPost, RawPost, TAG_OPTIONS, UNCATEGORIZED,
    UNTITLED_POEM,
};

pub const DEFAULT_SERVICE_URL: &str = "https://bsky.social/";
pub const DEFAULT_COMPLETION_URL: &str = "https://api.openai.com/v1/";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_LANGUAGE: &str = "Italian";

/// Largest page the author-feed endpoint will serve.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub service_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            user_agent: "Poem-Processor/1.0".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// How the assistant text is read out of a chat completion response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResponseShape {
    /// Typed decode of the whole body, then `choices[0].message.content`.
    #[default]
    Chat,
    /// Untyped lookup of `choices[0].message.content`; the rest of the body
    /// is not checked.
    Legacy,
}

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub base_url: String,
    pub model: String,
    pub response_shape: ResponseShape,
    pub timeout_seconds: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COMPLETION_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            response_shape: ResponseShape::Chat,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed after a transport or service failure.
    pub max_failure_retries: u32,
    /// Retries allowed after an apologetic non-answer.
    pub max_refusal_retries: u32,
    /// Failure retry `n` waits `failure_step * n`.
    pub failure_step: Duration,
    pub refusal_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_failure_retries: 3,
            max_refusal_retries: 3,
            failure_step: Duration::from_secs(2),
            refusal_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn immediate() -> Self {
        Self {
            failure_step: Duration::ZERO,
            refusal_delay: Duration::ZERO,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnrichmentOptions {
    pub enable_title: bool,
    pub enable_translation: bool,
    pub enable_tagging: bool,
    pub language: String,
}

impl Default for EnrichmentOptions {
    fn default() -> Self {
        Self {
            enable_title: true,
            enable_translation: true,
            enable_tagging: true,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl EnrichmentOptions {
    pub fn disabled() -> Self {
        Self {
            enable_title: false,
            enable_translation: false,
            enable_tagging: false,
            ..Default::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
