use crate::parser::FeedParser;
use crate::traits::{FeedApi, FeedCredentials};
use crate::types::{RawPost, MAX_PAGE_SIZE};
use crate::utils::time::today_local;
use chrono::NaiveDate;
use std::time::Instant;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    AuthFailed,
    MaxCount,
    ReachedStartDate,
    LastPage,
    EmptyPage,
    PageError,
}

#[derive(Debug)]
pub struct FetchReport {
    pub posts: Vec<RawPost>,
    pub stop_reason: StopReason,
    pub pages: usize,
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub per_page_limit: u32,
    /// Stop once this many posts are kept. `None` or zero means no cap.
    pub max_count: Option<usize>,
    /// Earliest calendar day to keep. Defaults to today.
    pub start_date: Option<NaiveDate>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            per_page_limit: MAX_PAGE_SIZE,
            max_count: None,
            start_date: None,
        }
    }
}

/// Walks a user's author feed newest-first until a cap, the start date, or the
/// end of the feed is reached.
pub struct FeedFetcher<A> {
    api: A,
}

impl<A: FeedApi> FeedFetcher<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub async fn fetch(
        &self,
        credentials: &FeedCredentials,
        per_page_limit: u32,
        max_count: Option<usize>,
        start_date: Option<NaiveDate>,
    ) -> Vec<RawPost> {
        let options = FetchOptions {
            per_page_limit,
            max_count,
            start_date,
        };
        self.fetch_with_report(credentials, &options).await.posts
    }

    pub async fn fetch_with_report(
        &self,
        credentials: &FeedCredentials,
        options: &FetchOptions,
    ) -> FetchReport {
        let started = Instant::now();
        let start_date = options.start_date.unwrap_or_else(today_local);
        let max_count = options.max_count.filter(|&n| n > 0);
        let limit = options.per_page_limit.clamp(1, MAX_PAGE_SIZE);

        info!(
            limit,
            max_count = ?max_count,
            since = %start_date,
            "Starting feed pagination"
        );

        let session = match self.api.create_session(credentials).await {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to authenticate with feed service: {}", e);
                return FetchReport {
                    posts: Vec::new(),
                    stop_reason: StopReason::AuthFailed,
                    pages: 0,
                };
            }
        };

        let parser = FeedParser::new(start_date);
        let mut posts: Vec<RawPost> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;

        let stop_reason = loop {
            pages += 1;
            let page = match self.api.author_feed(&session, limit, cursor.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(page = pages, "Page fetch failed, keeping {} posts: {}", posts.len(), e);
                    break StopReason::PageError;
                }
            };

            if page.feed.is_empty() {
                debug!(page = pages, "Empty page");
                break StopReason::EmptyPage;
            }

            let parsed = parser.parse_page(&page);
            let kept = parsed.kept.len();
            let crossed = parsed.crossed(start_date);
            posts.extend(parsed.kept);
            info!(
                page = pages,
                seen = parsed.items_seen,
                kept,
                total = posts.len(),
                "Processed feed page"
            );

            if let Some(max) = max_count {
                if posts.len() >= max {
                    posts.truncate(max);
                    break StopReason::MaxCount;
                }
            }

            if crossed {
                break StopReason::ReachedStartDate;
            }

            match page.cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break StopReason::LastPage,
            }
        };

        info!(
            posts = posts.len(),
            pages,
            reason = ?stop_reason,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pagination finished"
        );

        FetchReport {
            posts,
            stop_reason,
            pages,
        }
    }
}
