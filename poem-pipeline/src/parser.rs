use crate::traits::{FeedPage, FeedViewPost};
use crate::types::{parse_timestamp, RawPost};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

/// Result of sifting one feed page against the fetch start date.
#[derive(Debug, Default)]
pub struct ParsedPage {
    /// Items dated on or after the start date, in page order.
    pub kept: Vec<RawPost>,
    /// Oldest parseable timestamp seen on the page, kept or not.
    pub oldest: Option<NaiveDateTime>,
    pub items_seen: usize,
}

impl ParsedPage {
    /// True once the page reaches back past `start_date`. Pages arrive newest
    /// first, so nothing after this page can qualify.
    pub fn crossed(&self, start_date: NaiveDate) -> bool {
        self.oldest.is_some_and(|oldest| oldest.date() < start_date)
    }
}

pub struct FeedParser {
    start_date: NaiveDate,
}

impl FeedParser {
    pub fn new(start_date: NaiveDate) -> Self {
        Self { start_date }
    }

    pub fn parse_page(&self, page: &FeedPage) -> ParsedPage {
        let mut parsed = ParsedPage {
            items_seen: page.feed.len(),
            ..Default::default()
        };

        for item in &page.feed {
            let Some(created) = parse_timestamp(&item.post.record.created_at) else {
                debug!(uri = %item.post.uri, "Skipping item without a usable createdAt");
                continue;
            };

            if parsed.oldest.map_or(true, |oldest| created < oldest) {
                parsed.oldest = Some(created);
            }

            if created.date() >= self.start_date {
                parsed.kept.push(to_raw_post(item));
            }
        }

        parsed
    }
}

pub fn to_raw_post(item: &FeedViewPost) -> RawPost {
    let record = &item.post.record;
    RawPost {
        content: record.text.clone(),
        published_at: record.created_at.clone(),
        tags: record.tags.join(" "),
        uri: item.post.uri.clone(),
        cid: item.post.cid.clone(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{PostRecord, PostView};

    fn item(text: &str, created_at: &str) -> FeedViewPost {
        FeedViewPost {
            post: PostView {
                uri: format!("at://did:plc:test/app.bsky.feed.post/{}", text),
                cid: format!("cid-{}", text),
                record: PostRecord {
                    text: text.to_string(),
                    created_at: created_at.to_string(),
                    tags: vec!["poetry".to_string(), "vss".to_string()],
                },
            },
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn keeps_items_on_or_after_start_date() {
        let page = FeedPage {
            feed: vec![
                item("new", "2024-05-02T08:00:00Z"),
                item("edge", "2024-05-01T00:00:01Z"),
                item("old", "2024-04-30T23:59:59Z"),
            ],
            cursor: Some("c".to_string()),
        };
        let parsed = FeedParser::new(day(2024, 5, 1)).parse_page(&page);
        let kept: Vec<_> = parsed.kept.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(kept, vec!["new", "edge"]);
        assert_eq!(parsed.items_seen, 3);
        assert!(parsed.crossed(day(2024, 5, 1)));
    }

    #[test]
    fn unparsable_dates_are_neither_kept_nor_oldest() {
        let page = FeedPage {
            feed: vec![item("a", "2024-05-02T08:00:00Z"), item("b", "soon")],
            cursor: None,
        };
        let parsed = FeedParser::new(day(2024, 5, 1)).parse_page(&page);
        assert_eq!(parsed.kept.len(), 1);
        assert!(!parsed.crossed(day(2024, 5, 1)));
    }

    #[test]
    fn raw_post_carries_identifiers_and_joined_tags() {
        let post = to_raw_post(&item("hello", "2024-05-02T08:00:00Z"));
        assert_eq!(post.tags, "poetry vss");
        assert_eq!(post.cid, "cid-hello");
        assert_eq!(post.published_at, "2024-05-02T08:00:00Z");
    }
}
