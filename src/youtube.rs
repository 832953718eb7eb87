//! YouTube Data API v3 client and candidate collection
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::scoring::QualityScorer;
use crate::selector::CategorySelector;
use crate::video::{self, VideoCandidate, DESCRIPTION_LIMIT};
use crate::{DigestError, Result};

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// One search hit, before statistics are joined in
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub video_id: String,
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub published_at: String,
    pub channel_title: String,
}

/// Raw per-video statistics as the API returns them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoDetails {
    pub view_count: Option<String>,
    pub duration: Option<String>,
}

/// Raw per-channel statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelDetails {
    pub subscriber_count: Option<String>,
}

/// Source of search results and statistics
#[async_trait]
pub trait VideoSearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>>;
    async fn video_details(&self, video_ids: &[String]) -> Result<HashMap<String, VideoDetails>>;
    async fn channel_details(&self, channel_ids: &[String]) -> Result<HashMap<String, ChannelDetails>>;
}

/// Search request options
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub region_code: String,
    pub relevance_language: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            region_code: "JP".to_string(),
            relevance_language: "ja".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    published_at: String,
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    #[serde(default)]
    statistics: VideoStatistics,
    #[serde(default)]
    content_details: ContentDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: String,
    #[serde(default)]
    statistics: ChannelStatistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    subscriber_count: Option<String>,
}

/// YouTube Data API client
pub struct YouTubeClient {
    api_key: String,
    base_url: String,
    options: SearchOptions,
    client: reqwest::Client,
}

impl YouTubeClient {
    pub fn new(api_key: String, base_url: &str, options: SearchOptions, timeout_seconds: u64) -> Result<Self> {
        if api_key.is_empty() {
            return Err(DigestError::Config("YouTube API key required".to_string()));
        }
        Url::parse(base_url)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            options,
            client,
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, endpoint: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("Sending request to YouTube {}", endpoint);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DigestError::Api { status, body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl VideoSearchProvider for YouTubeClient {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>> {
        let params = [
            ("part", "snippet".to_string()),
            ("q", query.to_string()),
            ("type", "video".to_string()),
            ("maxResults", max_results.to_string()),
            ("order", "relevance".to_string()),
            ("regionCode", self.options.region_code.clone()),
            ("relevanceLanguage", self.options.relevance_language.clone()),
        ];
        let response: ListResponse<SearchItem> = self.get("search", &params).await?;

        Ok(response
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                Some(SearchHit {
                    video_id,
                    channel_id: item.snippet.channel_id,
                    title: item.snippet.title,
                    description: item.snippet.description,
                    published_at: item.snippet.published_at,
                    channel_title: item.snippet.channel_title,
                })
            })
            .collect())
    }

    async fn video_details(&self, video_ids: &[String]) -> Result<HashMap<String, VideoDetails>> {
        if video_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let params = [
            ("part", "statistics,contentDetails".to_string()),
            ("id", video_ids.join(",")),
        ];
        let response: ListResponse<VideoItem> = self.get("videos", &params).await?;

        Ok(response
            .items
            .into_iter()
            .map(|item| {
                let details = VideoDetails {
                    view_count: item.statistics.view_count,
                    duration: item.content_details.duration,
                };
                (item.id, details)
            })
            .collect())
    }

    async fn channel_details(&self, channel_ids: &[String]) -> Result<HashMap<String, ChannelDetails>> {
        if channel_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let params = [("part", "statistics".to_string()), ("id", channel_ids.join(","))];
        let response: ListResponse<ChannelItem> = self.get("channels", &params).await?;

        Ok(response
            .items
            .into_iter()
            .map(|item| {
                let details = ChannelDetails {
                    subscriber_count: item.statistics.subscriber_count,
                };
                (item.id, details)
            })
            .collect())
    }
}

/// Runs a search and joins video and channel statistics into candidates
pub struct CandidateCollector {
    provider: Box<dyn VideoSearchProvider>,
    max_results: u32,
}

impl CandidateCollector {
    pub fn new(provider: Box<dyn VideoSearchProvider>, max_results: u32) -> Self {
        Self { provider, max_results }
    }

    /// Collect candidates for `query`.
    ///
    /// A failed search yields no candidates. A failed statistics lookup is
    /// logged and the affected fields default to zero.
    pub async fn collect(
        &self,
        query: &str,
        scorer: &QualityScorer,
        selector: &CategorySelector,
    ) -> Vec<VideoCandidate> {
        info!("🔍 Searching YouTube: {}", query);

        let hits = match self.provider.search(query, self.max_results).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("❌ YouTube search failed: {}", e);
                return Vec::new();
            }
        };

        if hits.is_empty() {
            warn!("❌ No search results for: {}", query);
            return Vec::new();
        }

        let video_ids: Vec<String> = hits.iter().map(|h| h.video_id.clone()).collect();
        let mut seen = HashSet::new();
        let channel_ids: Vec<String> = hits
            .iter()
            .filter(|h| seen.insert(h.channel_id.as_str()))
            .map(|h| h.channel_id.clone())
            .collect();

        let video_details = self.provider.video_details(&video_ids).await.unwrap_or_else(|e| {
            warn!("❌ Failed to fetch video details: {}", e);
            HashMap::new()
        });
        let channel_details = self.provider.channel_details(&channel_ids).await.unwrap_or_else(|e| {
            warn!("❌ Failed to fetch channel details: {}", e);
            HashMap::new()
        });

        let candidates: Vec<VideoCandidate> = hits
            .into_iter()
            .map(|hit| {
                let v = video_details.get(&hit.video_id).cloned().unwrap_or_default();
                let c = channel_details.get(&hit.channel_id).cloned().unwrap_or_default();
                let topic = selector.classify_topic(&hit.title, &hit.description);

                VideoCandidate {
                    title_keyword_hits: scorer.count_title_hits(&hit.title),
                    subscriber_count: video::parse_count(c.subscriber_count.as_deref()),
                    view_count: video::parse_count(v.view_count.as_deref()),
                    duration_seconds: video::parse_iso8601_duration(v.duration.as_deref().unwrap_or("")),
                    published_date: video::parse_publish_date(&hit.published_at),
                    description: video::truncate_chars(&hit.description, DESCRIPTION_LIMIT),
                    video_id: hit.video_id,
                    channel_id: hit.channel_id,
                    channel_name: hit.channel_title,
                    title: hit.title,
                    topic,
                }
            })
            .collect();

        info!("✅ Collected {} videos", candidates.len());
        candidates
    }
}
