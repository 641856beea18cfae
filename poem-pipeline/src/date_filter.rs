use crate::types::RawPost;
use crate::utils::time::{end_of_day, now_local, start_of_day};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

/// Window sizes outside this range switch relative filtering off.
pub const DAYS_RANGE: std::ops::RangeInclusive<i64> = 1..=9999;

/// Post-fetch date filter.
///
/// With an absolute bound set, posts need a parseable timestamp inside the
/// bounds (missing dates are dropped). Without one, posts newer than
/// `now - days` are kept and so are posts whose date cannot be read.
#[derive(Debug, Clone)]
pub struct DateRangeFilter {
    days: i64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    now: Option<NaiveDateTime>,
}

impl DateRangeFilter {
    pub fn new(days: i64) -> Self {
        Self {
            days,
            start: None,
            end: None,
            now: None,
        }
    }

    /// Absolute bounds. `end` covers the whole of that day, up to its last
    /// instant, not just its midnight.
    pub fn with_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Pin "now" for the relative window.
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    pub fn apply(&self, posts: Vec<RawPost>) -> Vec<RawPost> {
        let total = posts.len();

        if self.start.is_some() || self.end.is_some() {
            let lower = self.start.map(start_of_day);
            let upper = self.end.map(end_of_day);
            let kept: Vec<RawPost> = posts
                .into_iter()
                .filter(|post| match post.published_naive() {
                    Some(t) => lower.map_or(true, |l| t >= l) && upper.map_or(true, |u| t <= u),
                    None => {
                        debug!(uri = %post.uri, "Dropping post without a usable date");
                        false
                    }
                })
                .collect();
            info!(
                start = ?self.start,
                end = ?self.end,
                kept = kept.len(),
                total,
                "Applied date range filter"
            );
            return kept;
        }

        if !DAYS_RANGE.contains(&self.days) {
            debug!(days = self.days, "Day window out of range, not filtering");
            return posts;
        }

        let cutoff = self.now.unwrap_or_else(now_local) - Duration::days(self.days);
        let kept: Vec<RawPost> = posts
            .into_iter()
            .filter(|post| post.published_naive().map_or(true, |t| t >= cutoff))
            .collect();
        info!(days = self.days, kept = kept.len(), total, "Applied day window filter");
        kept
    }
}

/// One-shot form of [`DateRangeFilter`].
pub fn filter_by_date(
    posts: Vec<RawPost>,
    days: i64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<RawPost> {
    DateRangeFilter::new(days).with_range(start, end).apply(posts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, published_at: &str) -> RawPost {
        RawPost {
            uri: id.to_string(),
            ..RawPost::new(format!("poem {}", id), published_at)
        }
    }

    fn ids(posts: &[RawPost]) -> Vec<&str> {
        posts.iter().map(|p| p.uri.as_str()).collect()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn noon(y: i32, m: u32, d: u32) -> NaiveDateTime {
        day(y, m, d).and_hms_opt(12, 0, 0).unwrap()
    }

    fn sample() -> Vec<RawPost> {
        vec![
            post("fresh", "2024-05-10T09:00:00Z"),
            post("undated", "not a date"),
            post("week-old", "2024-05-03T09:00:00Z"),
            post("blank", ""),
            post("yesterday", "2024-05-09T13:00:00Z"),
        ]
    }

    #[test]
    fn relative_window_keeps_recent_and_undated() {
        let kept = DateRangeFilter::new(1).with_now(noon(2024, 5, 10)).apply(sample());
        assert_eq!(ids(&kept), vec!["fresh", "undated", "blank", "yesterday"]);
    }

    #[test]
    fn absolute_range_drops_undated() {
        let kept = DateRangeFilter::new(1)
            .with_range(Some(day(2024, 5, 1)), None)
            .apply(sample());
        assert_eq!(ids(&kept), vec!["fresh", "week-old", "yesterday"]);
    }

    #[test]
    fn end_bound_covers_the_whole_day() {
        let kept = DateRangeFilter::new(1)
            .with_range(None, Some(day(2024, 5, 9)))
            .apply(sample());
        assert_eq!(ids(&kept), vec!["week-old", "yesterday"]);
    }

    #[test]
    fn both_bounds() {
        let kept = filter_by_date(sample(), 1, Some(day(2024, 5, 4)), Some(day(2024, 5, 9)));
        assert_eq!(ids(&kept), vec!["yesterday"]);
    }

    #[test]
    fn out_of_range_days_means_no_filtering() {
        for days in [0, -3, 10_000] {
            let kept = DateRangeFilter::new(days).with_now(noon(2024, 5, 10)).apply(sample());
            assert_eq!(kept, sample());
        }
    }

    #[test]
    fn range_wins_over_invalid_days() {
        let kept = DateRangeFilter::new(0)
            .with_range(Some(day(2024, 5, 10)), None)
            .apply(sample());
        assert_eq!(ids(&kept), vec!["fresh"]);
    }
}
