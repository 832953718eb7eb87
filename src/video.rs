use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Maximum description length kept on a candidate
pub const DESCRIPTION_LIMIT: usize = 200;

/// One video returned by a search, joined with its statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoCandidate {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub channel_name: String,
    pub subscriber_count: u64,
    pub view_count: u64,
    pub duration_seconds: u64,
    pub published_date: Option<NaiveDate>,
    pub title_keyword_hits: u32,
    /// Topic label derived from title and description
    pub topic: String,
}

impl VideoCandidate {
    /// Watch page URL
    pub fn url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }

    /// Channel page URL
    pub fn channel_url(&self) -> String {
        format!("https://www.youtube.com/channel/{}", self.channel_id)
    }

    /// Human readable duration, `H:MM:SS` or `M:SS`
    pub fn duration_formatted(&self) -> String {
        format_duration(self.duration_seconds)
    }
}

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").expect("duration pattern is valid")
    })
}

/// Parse an ISO-8601 `PT#H#M#S` duration into seconds.
///
/// Matching is prefix-based: components are read until the first one that
/// doesn't fit, so `PT1M30.5S` gives 60. Values not starting with `PT`
/// (including day components such as `P1DT2H`) yield 0.
pub fn parse_iso8601_duration(value: &str) -> u64 {
    let Some(caps) = duration_regex().captures(value.trim()) else {
        return 0;
    };

    let part = |idx: usize| -> u64 {
        caps.get(idx)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };

    part(1)
        .saturating_mul(3600)
        .saturating_add(part(2).saturating_mul(60))
        .saturating_add(part(3))
}

/// Parse a provider count string (`"12345"`), defaulting to 0
pub fn parse_count(value: Option<&str>) -> u64 {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

/// Parse the date part of an RFC 3339 timestamp such as `2024-05-01T09:00:00Z`
pub fn parse_publish_date(value: &str) -> Option<NaiveDate> {
    let date_part = value.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Format a count as `1.2M`, `3.4K` or the plain number
pub fn format_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Format seconds as `H:MM:SS` when at least an hour long, otherwise `M:SS`
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Truncate to at most `limit` characters on a char boundary
pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
