/// Text clean-up applied around model calls
pub mod text {
    use regex::Regex;
    use std::sync::OnceLock;

    fn hashtag_pattern() -> &'static Regex {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        PATTERN.get_or_init(|| Regex::new(r"#(\w+)").expect("valid hashtag regex"))
    }

    fn punctuation_pattern() -> &'static Regex {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        PATTERN.get_or_init(|| Regex::new(r"[^\w\s]").expect("valid punctuation regex"))
    }

    /// `#love wins` -> `love wins`. A lone `#` with no word after it stays.
    pub fn strip_hashtags(text: &str) -> String {
        hashtag_pattern().replace_all(text, "$1").into_owned()
    }

    /// Uppercase the first letter of each word and lowercase the rest,
    /// collapsing runs of whitespace to one space.
    pub fn title_case(text: &str) -> String {
        text.split_whitespace()
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first
                        .to_uppercase()
                        .chain(chars.flat_map(char::to_lowercase))
                        .collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn strip_punctuation(text: &str) -> String {
        punctuation_pattern().replace_all(text, "").trim().to_string()
    }

    const QUOTE_PAIRS: [(char, char); 4] =
        [('"', '"'), ('\'', '\''), ('“', '”'), ('‘', '’')];

    /// Remove one layer of matching quotes around the whole text.
    pub fn strip_surrounding_quotes(text: &str) -> String {
        let trimmed = text.trim();
        for (open, close) in QUOTE_PAIRS {
            if let Some(inner) = trimmed
                .strip_prefix(open)
                .and_then(|rest| rest.strip_suffix(close))
            {
                return inner.trim().to_string();
            }
        }
        trimmed.to_string()
    }
}

/// Calendar helpers. All bounds are local wall-clock.
pub mod time {
    use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

    /// Parse a `YYYY-MM-DD` command-line date.
    pub fn parse_day(value: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
    }

    pub fn today_local() -> NaiveDate {
        Local::now().date_naive()
    }

    pub fn now_local() -> NaiveDateTime {
        Local::now().naive_local()
    }

    pub fn start_of_day(day: NaiveDate) -> NaiveDateTime {
        day.and_time(NaiveTime::MIN)
    }

    /// Last representable instant of `day`.
    pub fn end_of_day(day: NaiveDate) -> NaiveDateTime {
        match day.succ_opt() {
            Some(next) => start_of_day(next) - chrono::Duration::nanoseconds(1),
            None => NaiveDateTime::MAX,
        }
    }
}
