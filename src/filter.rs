//! Threshold filtering and top-N selection over ranked candidates
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::scoring::ScoredCandidate;

/// What to do when nothing reaches the minimum score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", content = "min_score", rename_all = "snake_case")]
pub enum Fallback {
    /// Skip the run
    Abort,
    /// Retry the filter with a lower minimum
    LowerThreshold(f64),
    /// Use the ranked list as is
    Unfiltered,
}

impl Default for Fallback {
    fn default() -> Self {
        Self::Unfiltered
    }
}

/// Why a run produced nothing to publish
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Weekend,
    NoCandidates,
    BelowThreshold { min_score: f64, best: Option<f64> },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekend => write!(f, "weekend"),
            Self::NoCandidates => write!(f, "no videos found"),
            Self::BelowThreshold { min_score, best: Some(best) } => {
                write!(f, "best score {:.1} is below {:.1}", best, min_score)
            }
            Self::BelowThreshold { min_score, best: None } => {
                write!(f, "no candidates scored at least {:.1}", min_score)
            }
        }
    }
}

/// Result of filtering
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Publish(Vec<ScoredCandidate>),
    Skip(SkipReason),
}

/// Minimum-score filter with fallback and a cap on posted videos
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFilter {
    pub min_score: f64,
    pub fallback: Fallback,
    pub max_candidates: usize,
}

impl CandidateFilter {
    pub fn new(min_score: f64, fallback: Fallback, max_candidates: usize) -> Self {
        Self { min_score, fallback, max_candidates }
    }

    /// Filter candidates already sorted best first
    pub fn select(&self, ranked: Vec<ScoredCandidate>) -> Selection {
        if ranked.is_empty() {
            return Selection::Skip(SkipReason::NoCandidates);
        }

        let best = ranked.first().map(|c| c.quality_score());
        let passing = above(&ranked, self.min_score);

        let mut chosen = if !passing.is_empty() {
            info!("✅ {} videos scored at least {:.1}", passing.len(), self.min_score);
            passing
        } else {
            match self.fallback {
                Fallback::Abort => {
                    warn!("⚠️ No video reached {:.1}, skipping", self.min_score);
                    return Selection::Skip(SkipReason::BelowThreshold { min_score: self.min_score, best });
                }
                Fallback::LowerThreshold(lower) => {
                    warn!("⚠️ No video reached {:.1}, retrying with {:.1}", self.min_score, lower);
                    let relaxed = above(&ranked, lower);
                    if relaxed.is_empty() {
                        return Selection::Skip(SkipReason::BelowThreshold { min_score: lower, best });
                    }
                    relaxed
                }
                Fallback::Unfiltered => {
                    warn!("⚠️ No video reached {:.1}, choosing from all results", self.min_score);
                    ranked
                }
            }
        };

        chosen.truncate(self.max_candidates);
        if chosen.is_empty() {
            return Selection::Skip(SkipReason::NoCandidates);
        }
        Selection::Publish(chosen)
    }
}

fn above(ranked: &[ScoredCandidate], min_score: f64) -> Vec<ScoredCandidate> {
    ranked
        .iter()
        .filter(|c| c.quality_score() >= min_score)
        .cloned()
        .collect()
}
