//! Quality heuristic used to rank search results
//!
//! A score is the sum of independently capped signals: channel size, view
//! count, duration band, quality words in the title and recency. The strict
//! profile gates out small channels and short videos before anything else is
//! counted.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::selector::jst;
use crate::video::VideoCandidate;

/// Which bucket tables to score with
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScoringProfile {
    #[default]
    Lenient,
    Strict,
}

impl FromStr for ScoringProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown scoring profile: {}", other)),
        }
    }
}

impl fmt::Display for ScoringProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lenient => write!(f, "lenient"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

/// Minimum subscribers to pass the strict gate
pub const STRICT_MIN_SUBSCRIBERS: u64 = 10_000;
/// Minimum duration in seconds to pass the strict gate
pub const STRICT_MIN_DURATION: u64 = 600;

/// Points for the title signal per matched word, and its cap
const TITLE_POINTS_PER_HIT: f64 = 5.0;
const TITLE_POINTS_CAP: f64 = 15.0;

// (inclusive lower bound, points), highest first
const LENIENT_SUBSCRIBERS: &[(u64, f64)] = &[
    (100_000, 30.0),
    (50_000, 25.0),
    (10_000, 20.0),
    (1_000, 10.0),
];

const STRICT_SUBSCRIBERS: &[(u64, f64)] = &[
    (1_000_000, 30.0),
    (500_000, 25.0),
    (100_000, 20.0),
    (50_000, 15.0),
    (10_000, 10.0),
];

const VIEWS: &[(u64, f64)] = &[
    (100_000, 25.0),
    (50_000, 20.0),
    (10_000, 15.0),
    (1_000, 10.0),
];

// (min seconds, max seconds, points), both bounds inclusive, first match wins
const LENIENT_DURATION: &[(u64, u64, f64)] = &[
    (300, 1800, 20.0),
    (180, 300, 15.0),
    (1800, 3600, 15.0),
];

const STRICT_DURATION: &[(u64, u64, f64)] = &[
    (1800, 5400, 20.0),
    (600, 1800, 15.0),
    (5400, 7200, 10.0),
];

// (max days since publish, points)
const RECENCY: &[(i64, f64)] = &[
    (30, 10.0),
    (90, 8.0),
    (180, 6.0),
    (365, 4.0),
];

/// Why the strict gate excluded a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateReason {
    TooFewSubscribers(u64),
    TooShort(u64),
}

impl fmt::Display for GateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewSubscribers(n) => write!(f, "{} subscribers < {}", n, STRICT_MIN_SUBSCRIBERS),
            Self::TooShort(s) => write!(f, "{}s < {}s", s, STRICT_MIN_DURATION),
        }
    }
}

/// Per-signal points behind a score
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub subscribers: f64,
    pub views: f64,
    pub duration: f64,
    pub title: f64,
    pub recency: f64,
    /// Set when the strict gate short-circuited scoring
    pub gate: Option<GateReason>,
}

impl ScoreBreakdown {
    /// Total score; a gated breakdown is always 0
    pub fn total(&self) -> f64 {
        if self.gate.is_some() {
            return 0.0;
        }
        self.subscribers + self.views + self.duration + self.title + self.recency
    }
}

/// A candidate together with the score the ranker gave it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    candidate: VideoCandidate,
    quality_score: f64,
}

impl ScoredCandidate {
    pub(crate) fn new(candidate: VideoCandidate, quality_score: f64) -> Self {
        Self { candidate, quality_score }
    }

    pub fn candidate(&self) -> &VideoCandidate {
        &self.candidate
    }

    pub fn quality_score(&self) -> f64 {
        self.quality_score
    }

    pub fn into_candidate(self) -> VideoCandidate {
        self.candidate
    }
}

/// Scores and ranks candidates under one profile
#[derive(Debug, Clone)]
pub struct QualityScorer {
    profile: ScoringProfile,
    quality_words: Vec<String>,
}

impl QualityScorer {
    pub fn new(profile: ScoringProfile, quality_words: Vec<String>) -> Self {
        let mut quality_words: Vec<String> = quality_words.into_iter().map(|w| w.to_lowercase()).collect();
        quality_words.sort();
        quality_words.dedup();
        Self { profile, quality_words }
    }

    pub fn profile(&self) -> ScoringProfile {
        self.profile
    }

    /// Count configured quality words contained in a title
    pub fn count_title_hits(&self, title: &str) -> u32 {
        count_title_hits(title, &self.quality_words)
    }

    /// Score a candidate relative to `now`
    pub fn score(&self, candidate: &VideoCandidate, now: DateTime<Utc>) -> f64 {
        self.evaluate(candidate, now).total()
    }

    /// Score a candidate and keep the per-signal points
    pub fn evaluate(&self, candidate: &VideoCandidate, now: DateTime<Utc>) -> ScoreBreakdown {
        if self.profile == ScoringProfile::Strict {
            if candidate.subscriber_count < STRICT_MIN_SUBSCRIBERS {
                return ScoreBreakdown {
                    gate: Some(GateReason::TooFewSubscribers(candidate.subscriber_count)),
                    ..Default::default()
                };
            }
            if candidate.duration_seconds < STRICT_MIN_DURATION {
                return ScoreBreakdown {
                    gate: Some(GateReason::TooShort(candidate.duration_seconds)),
                    ..Default::default()
                };
            }
        }

        let (subscriber_buckets, duration_bands) = match self.profile {
            ScoringProfile::Lenient => (LENIENT_SUBSCRIBERS, LENIENT_DURATION),
            ScoringProfile::Strict => (STRICT_SUBSCRIBERS, STRICT_DURATION),
        };

        ScoreBreakdown {
            subscribers: threshold_points(candidate.subscriber_count, subscriber_buckets),
            views: threshold_points(candidate.view_count, VIEWS),
            duration: band_points(candidate.duration_seconds, duration_bands),
            title: (candidate.title_keyword_hits as f64 * TITLE_POINTS_PER_HIT).min(TITLE_POINTS_CAP),
            recency: recency_points(candidate, now),
            gate: None,
        }
    }

    /// Score every candidate, sort best first and keep the top `max_ranked`
    pub fn rank(
        &self,
        candidates: Vec<VideoCandidate>,
        now: DateTime<Utc>,
        max_ranked: usize,
    ) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|candidate| {
                let breakdown = self.evaluate(&candidate, now);
                match breakdown.gate {
                    Some(reason) => debug!("🚫 Gated '{}': {}", candidate.title, reason),
                    None => debug!(
                        "📊 '{}' = {:.1} (subs {:.0}, views {:.0}, duration {:.0}, title {:.0}, recency {:.0})",
                        candidate.title,
                        breakdown.total(),
                        breakdown.subscribers,
                        breakdown.views,
                        breakdown.duration,
                        breakdown.title,
                        breakdown.recency
                    ),
                }
                ScoredCandidate::new(candidate, breakdown.total())
            })
            .collect();

        // sort_by is stable, so equal scores keep search relevance order
        scored.sort_by(|a, b| {
            b.quality_score
                .partial_cmp(&a.quality_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(max_ranked);
        scored
    }
}

/// Count distinct words (already lower-cased) contained in the lower-cased title
pub fn count_title_hits(title: &str, words: &[String]) -> u32 {
    let title = title.to_lowercase();
    words
        .iter()
        .filter(|word| !word.is_empty() && title.contains(word.as_str()))
        .count() as u32
}

fn threshold_points(value: u64, buckets: &[(u64, f64)]) -> f64 {
    buckets
        .iter()
        .find(|(min, _)| value >= *min)
        .map(|(_, points)| *points)
        .unwrap_or(0.0)
}

fn band_points(value: u64, bands: &[(u64, u64, f64)]) -> f64 {
    bands
        .iter()
        .find(|(min, max, _)| (*min..=*max).contains(&value))
        .map(|(_, _, points)| *points)
        .unwrap_or(0.0)
}

fn recency_points(candidate: &VideoCandidate, now: DateTime<Utc>) -> f64 {
    let Some(published) = candidate.published_date else {
        return 0.0;
    };
    let today = now.with_timezone(&jst()).date_naive();
    let days = (today - published).num_days().max(0);

    RECENCY
        .iter()
        .find(|(max_days, _)| days <= *max_days)
        .map(|(_, points)| *points)
        .unwrap_or(0.0)
}
