pub mod types;
pub mod traits;
pub mod sources;
pub mod parser;
pub mod fetcher;
pub mod utils;
pub mod date_filter;
pub mod llm_adapter;
pub mod retry;
pub mod enricher;
pub mod pipeline;
pub mod store;
pub mod config;
pub mod logging;
pub mod runner;

pub use types::*;
pub use traits::{FeedApi, FeedCredentials, FeedPage, Session};
pub use sources::BlueskyClient;
pub use parser::FeedParser;
pub use fetcher::{FeedFetcher, FetchOptions, FetchReport, StopReason};
pub use date_filter::{filter_by_date, DateRangeFilter};
pub use llm_adapter::{CompletionBackend, OpenAiClient};
pub use retry::{RetryingCaller, RetrySchedule};
pub use enricher::TextEnricher;
pub use pipeline::{EnrichmentPipeline, EnrichmentReport};
pub use config::{Cli, Credentials, RunConfig};
pub use logging::LogContext;
pub use runner::{RunSummary, Runner};
