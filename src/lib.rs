/// tube-digest - YouTube learning digest for Chatwork
///
/// Searches YouTube for a rotating set of learning keywords, ranks the results
/// with a quality heuristic and posts the best few to a Chatwork room.

pub mod video;
pub mod scoring;
pub mod selector;
pub mod filter;
pub mod youtube;
pub mod chatwork;
pub mod message;
pub mod pipeline;
pub mod config;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder};
pub use crate::video::VideoCandidate;
pub use crate::scoring::{QualityScorer, ScoredCandidate, ScoringProfile};
pub use crate::selector::{Category, CategorySelector};
pub use crate::filter::{CandidateFilter, Fallback, Selection, SkipReason};
pub use crate::youtube::{CandidateCollector, VideoSearchProvider, YouTubeClient};
pub use crate::chatwork::{ChatworkClient, MessageSink};
pub use crate::pipeline::{DigestPipeline, RunOutcome};

/// Result type for digest operations
pub type Result<T> = std::result::Result<T, DigestError>;

/// Error types for digest operations
#[derive(thiserror::Error, Debug)]
pub enum DigestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),
}
