use crate::traits::FeedCredentials;
use crate::types::{
    CompletionConfig, EnrichmentOptions, FetchConfig, PipelineError, ResponseShape, Result,
    RetryPolicy, DEFAULT_LANGUAGE, MAX_PAGE_SIZE,
};
use crate::utils::time::parse_day;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use tracing::warn;

pub const ENV_FEED_USER: &str = "BLUESKY_USERNAME";
pub const ENV_FEED_PASSWORD: &str = "BLUESKY_APP_PASSWORD";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";

#[derive(Parser, Debug, Clone)]
#[command(name = "poem-processor")]
#[command(about = "Process Bluesky posts (poems) and output to a single JSON file")]
#[command(version)]
pub struct Cli {
    /// Input JSON file path
    #[arg(long, default_value = "poems.json")]
    pub input: PathBuf,

    /// Output JSON file
    #[arg(long, default_value = "processed_poems.json")]
    pub output: PathBuf,

    /// Raw output JSON file when using --no-openai
    #[arg(long, default_value = "raw_posts.json")]
    pub raw_output: PathBuf,

    /// OpenAI API key (overrides OPENAI_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Number of days to process if no start-date/end-date is given
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub days: i64,

    /// Ignore date filters and process everything
    #[arg(long)]
    pub all: bool,

    /// Skip OpenAI processing and just output raw Bluesky posts
    #[arg(long)]
    pub no_openai: bool,

    /// Bluesky username (overrides BLUESKY_USERNAME)
    #[arg(long)]
    pub bluesky_user: Option<String>,

    /// Bluesky app password (overrides BLUESKY_APP_PASSWORD)
    #[arg(long)]
    pub bluesky_password: Option<String>,

    /// Load the input file instead of fetching (a missing input file still fetches)
    #[arg(long = "no-fetch")]
    pub no_fetch: bool,

    /// Maximum number of posts to fetch (default: all posts since the start date)
    #[arg(long)]
    pub count: Option<usize>,

    /// Per-page limit for the Bluesky fetch
    #[arg(long, default_value_t = MAX_PAGE_SIZE)]
    pub limit: u32,

    /// Only process posts on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Only process posts on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Disable title generation
    #[arg(long)]
    pub disable_title: bool,

    /// Disable translation
    #[arg(long)]
    pub disable_translation: bool,

    /// Disable AI tagging
    #[arg(long)]
    pub disable_tagging: bool,

    /// Translation language
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    pub language: String,

    /// Directory for the run log file (default: ~/logs)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Where the completion text lives in API responses
    #[arg(long, value_enum, default_value_t = ResponseShape::Chat)]
    pub response_shape: ResponseShape,
}

/// Secrets for both services. Each value is resolved once:
/// explicit value, then environment, then absent.
#[derive(Clone, Default)]
pub struct Credentials {
    pub feed_identifier: Option<String>,
    pub feed_password: Option<String>,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("feed_identifier", &self.feed_identifier)
            .field("feed_password", &self.feed_password.as_ref().map(|_| "***"))
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Explicit value wins, then `env_var` via `lookup`. Blank strings count as
/// absent at every level.
pub fn resolve_secret(
    explicit: Option<&str>,
    env_var: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    explicit
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| {
            lookup(env_var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
}

impl Credentials {
    pub fn resolve(
        feed_identifier: Option<&str>,
        feed_password: Option<&str>,
        api_key: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        Self {
            feed_identifier: resolve_secret(feed_identifier, ENV_FEED_USER, &lookup),
            feed_password: resolve_secret(feed_password, ENV_FEED_PASSWORD, &lookup),
            api_key: resolve_secret(api_key, ENV_API_KEY, &lookup),
        }
    }

    pub fn from_env(
        feed_identifier: Option<&str>,
        feed_password: Option<&str>,
        api_key: Option<&str>,
    ) -> Self {
        Self::resolve(feed_identifier, feed_password, api_key, |key| {
            std::env::var(key).ok()
        })
    }

    pub fn feed(&self) -> Result<FeedCredentials> {
        let identifier = self
            .feed_identifier
            .clone()
            .ok_or(PipelineError::MissingCredential(ENV_FEED_USER))?;
        let password = self
            .feed_password
            .clone()
            .ok_or(PipelineError::MissingCredential(ENV_FEED_PASSWORD))?;
        Ok(FeedCredentials {
            identifier,
            password,
        })
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}

/// Everything the runner needs for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub raw_output: PathBuf,
    pub fetch: bool,
    pub per_page_limit: u32,
    pub max_count: Option<usize>,
    pub days: i64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub process_all: bool,
    pub raw_only: bool,
    pub enrichment: EnrichmentOptions,
    pub credentials: Credentials,
    pub fetch_config: FetchConfig,
    pub completion: CompletionConfig,
    pub retry: RetryPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("poems.json"),
            output: PathBuf::from("processed_poems.json"),
            raw_output: PathBuf::from("raw_posts.json"),
            fetch: true,
            per_page_limit: MAX_PAGE_SIZE,
            max_count: None,
            days: 1,
            start_date: None,
            end_date: None,
            process_all: false,
            raw_only: false,
            enrichment: EnrichmentOptions::default(),
            credentials: Credentials::default(),
            fetch_config: FetchConfig::default(),
            completion: CompletionConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

fn day_arg(flag: &str, value: Option<&str>) -> Option<NaiveDate> {
    let value = value?;
    let day = parse_day(value);
    if day.is_none() {
        warn!("Ignoring invalid {} '{}', expected YYYY-MM-DD", flag, value);
    }
    day
}

impl Cli {
    pub fn into_config(self, credentials: Credentials) -> RunConfig {
        RunConfig {
            start_date: day_arg("--start-date", self.start_date.as_deref()),
            end_date: day_arg("--end-date", self.end_date.as_deref()),
            input: self.input,
            output: self.output,
            raw_output: self.raw_output,
            fetch: !self.no_fetch,
            per_page_limit: self.limit,
            max_count: self.count,
            days: self.days,
            process_all: self.all,
            raw_only: self.no_openai,
            enrichment: EnrichmentOptions {
                enable_title: !self.disable_title,
                enable_translation: !self.disable_translation,
                enable_tagging: !self.disable_tagging,
                language: self.language,
            },
            credentials,
            completion: CompletionConfig {
                response_shape: self.response_shape,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::from_env(
            self.bluesky_user.as_deref(),
            self.bluesky_password.as_deref(),
            self.api_key.as_deref(),
        )
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("logs")
        })
    }
}
