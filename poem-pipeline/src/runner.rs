use crate::config::RunConfig;
use crate::date_filter::DateRangeFilter;
use crate::enricher::TextEnricher;
use crate::fetcher::{FeedFetcher, FetchOptions, StopReason};
use crate::llm_adapter::{CompletionBackend, OpenAiClient};
use crate::logging::LogContext;
use crate::pipeline::EnrichmentPipeline;
use crate::retry::RetryingCaller;
use crate::sources::BlueskyClient;
use crate::store::{load_posts, save_json};
use crate::traits::FeedApi;
use crate::types::RawPost;
use anyhow::{anyhow, bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// What a run did, for the caller to report.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Posts fetched or loaded before any filtering.
    pub loaded: usize,
    /// Posts left after the date filter.
    pub selected: usize,
    pub processed: usize,
    pub skipped: usize,
    /// File written by this run, if any.
    pub written: Option<PathBuf>,
}

pub struct Runner {
    config: RunConfig,
    logs: Option<LogContext>,
}

impl Runner {
    pub fn new(config: RunConfig) -> Self {
        Self { config, logs: None }
    }

    /// Keep `logs` installed for as long as the runner lives.
    pub fn with_logging(mut self, logs: LogContext) -> Self {
        self.logs = Some(logs);
        self
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.logs.as_ref().map(LogContext::path)
    }

    /// The input file is only trusted when fetching is off and it exists.
    pub fn should_fetch(&self) -> bool {
        self.config.fetch || !self.config.input.exists()
    }

    /// Build the real HTTP clients and run.
    pub async fn run(&self) -> Result<RunSummary> {
        let feed = if self.should_fetch() {
            Some(BlueskyClient::new(&self.config.fetch_config)?)
        } else {
            None
        };

        let backend = if self.config.raw_only {
            None
        } else {
            match self.config.credentials.api_key() {
                Some(key) => Some(OpenAiClient::new(key, &self.config.completion)?),
                None => {
                    warn!("No OpenAI API key provided, switching to raw output mode");
                    None
                }
            }
        };

        self.run_with(feed, backend).await
    }

    /// Run against the given transports. No backend means raw output mode.
    pub async fn run_with<F, B>(
        &self,
        feed: Option<F>,
        backend: Option<B>,
    ) -> Result<RunSummary>
    where
        F: FeedApi,
        B: CompletionBackend,
    {
        let config = &self.config;
        self.log_config(backend.is_some());

        let posts = if self.should_fetch() {
            let feed =
                feed.ok_or_else(|| anyhow!("fetch required but no feed client available"))?;
            let credentials = config
                .credentials
                .feed()
                .context(
                    "no Bluesky credentials for fetching; pass --bluesky-user/--bluesky-password \
                     or set BLUESKY_USERNAME/BLUESKY_APP_PASSWORD",
                )?;

            info!(limit = config.per_page_limit, "Fetching posts from Bluesky");
            let options = FetchOptions {
                per_page_limit: config.per_page_limit,
                max_count: config.max_count,
                start_date: config.start_date,
            };
            let report = FeedFetcher::new(feed)
                .fetch_with_report(&credentials, &options)
                .await;
            if report.stop_reason == StopReason::AuthFailed {
                bail!("Bluesky rejected the login for {}", credentials.identifier);
            }

            let posts = report.posts;
            if posts.is_empty() {
                info!("No posts fetched, exiting");
                return Ok(RunSummary::default());
            }

            match save_json(&config.input, &posts) {
                Ok(()) => info!(path = %config.input.display(), "Wrote raw posts"),
                Err(e) => error!(
                    path = %config.input.display(),
                    "Failed to save fetched posts: {}",
                    e
                ),
            }
            posts
        } else {
            let posts = load_posts(&config.input);
            if posts.is_empty() {
                info!("No data in input file, exiting");
                return Ok(RunSummary::default());
            }
            posts
        };

        let mut summary = RunSummary {
            loaded: posts.len(),
            ..Default::default()
        };

        let Some(backend) = backend else {
            info!(path = %config.raw_output.display(), "Skipping enrichment, writing raw posts");
            save_json(&config.raw_output, &posts)
                .with_context(|| format!("writing {}", config.raw_output.display()))?;
            summary.selected = posts.len();
            summary.written = Some(config.raw_output.clone());
            return Ok(summary);
        };

        let posts = self.select(posts);
        summary.selected = posts.len();
        if posts.is_empty() {
            info!("No posts remain after date filtering, exiting");
            return Ok(summary);
        }

        let enricher = TextEnricher::new(RetryingCaller::new(backend, config.retry.clone()));
        let pipeline = EnrichmentPipeline::new(enricher, config.enrichment.clone());
        let report = pipeline.run(posts).await;

        summary.processed = report.posts.len();
        summary.skipped = report.skipped;
        info!("Processed {}/{} posts", summary.processed, summary.selected);

        save_json(&config.output, &report.posts)
            .with_context(|| format!("writing {}", config.output.display()))?;
        summary.written = Some(config.output.clone());
        Ok(summary)
    }

    fn select(&self, posts: Vec<RawPost>) -> Vec<RawPost> {
        if self.config.process_all {
            info!("--all given, skipping date filter");
            return posts;
        }
        DateRangeFilter::new(self.config.days)
            .with_range(self.config.start_date, self.config.end_date)
            .apply(posts)
    }

    fn log_config(&self, enriching: bool) {
        let config = &self.config;
        info!(
            input = %config.input.display(),
            output = %if enriching { &config.output } else { &config.raw_output }.display(),
            days = config.days,
            start_date = ?config.start_date,
            end_date = ?config.end_date,
            max_count = ?config.max_count,
            all = config.process_all,
            enriching,
            "Run configuration"
        );
        if enriching {
            let e = &config.enrichment;
            info!(
                title = e.enable_title,
                translation = e.enable_translation,
                tagging = e.enable_tagging,
                language = %e.language,
                "Enrichment features"
            );
        }
    }
}
