use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tube_digest::chatwork::MessageSink;
use tube_digest::config::{Config, ConfigBuilder};
use tube_digest::filter::{Fallback, SkipReason};
use tube_digest::pipeline::{DigestPipeline, RunOptions, RunOutcome};
use tube_digest::scoring::ScoringProfile;
use tube_digest::youtube::{ChannelDetails, SearchHit, VideoDetails, VideoSearchProvider};
use tube_digest::{DigestError, Result};

#[derive(Clone)]
struct FakeVideo {
    id: &'static str,
    channel: &'static str,
    title: &'static str,
    views: &'static str,
    duration: &'static str,
    subscribers: &'static str,
}

#[derive(Default)]
struct Calls {
    queries: Vec<String>,
}

struct FakeYouTube {
    videos: Vec<FakeVideo>,
    fail_search: bool,
    calls: Arc<Mutex<Calls>>,
}

#[async_trait]
impl VideoSearchProvider for FakeYouTube {
    async fn search(&self, query: &str, _max_results: u32) -> Result<Vec<SearchHit>> {
        self.calls.lock().unwrap().queries.push(query.to_string());
        if self.fail_search {
            return Err(DigestError::Api { status: 403, body: "quotaExceeded".to_string() });
        }
        Ok(self
            .videos
            .iter()
            .map(|v| SearchHit {
                video_id: v.id.to_string(),
                channel_id: v.channel.to_string(),
                title: v.title.to_string(),
                description: format!("{} の説明", v.title),
                published_at: "2025-06-01T00:00:00Z".to_string(),
                channel_title: format!("{} channel", v.channel),
            })
            .collect())
    }

    async fn video_details(&self, video_ids: &[String]) -> Result<HashMap<String, VideoDetails>> {
        Ok(self
            .videos
            .iter()
            .filter(|v| video_ids.iter().any(|id| id == v.id))
            .map(|v| {
                let details = VideoDetails {
                    view_count: Some(v.views.to_string()),
                    duration: Some(v.duration.to_string()),
                };
                (v.id.to_string(), details)
            })
            .collect())
    }

    async fn channel_details(&self, channel_ids: &[String]) -> Result<HashMap<String, ChannelDetails>> {
        Ok(self
            .videos
            .iter()
            .filter(|v| channel_ids.iter().any(|id| id == v.channel))
            .map(|v| {
                let details = ChannelDetails { subscriber_count: Some(v.subscribers.to_string()) };
                (v.channel.to_string(), details)
            })
            .collect())
    }
}

#[derive(Default)]
struct RecordingSink {
    posts: Arc<Mutex<Vec<(String, String)>>>,
    fail: bool,
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn post(&self, room_id: &str, body: &str) -> Result<()> {
        if self.fail {
            return Err(DigestError::Api { status: 401, body: "invalid token".to_string() });
        }
        self.posts.lock().unwrap().push((room_id.to_string(), body.to_string()));
        Ok(())
    }
}

fn videos() -> Vec<FakeVideo> {
    vec![
        FakeVideo {
            id: "small",
            channel: "c-small",
            title: "雑談",
            views: "300",
            duration: "PT2M",
            subscribers: "500",
        },
        FakeVideo {
            id: "great",
            channel: "c-big",
            title: "ネットワーク 基礎 解説 入門",
            views: "250000",
            duration: "PT15M",
            subscribers: "320000",
        },
        FakeVideo {
            id: "good",
            channel: "c-mid",
            title: "Windows Server 設定 方法",
            views: "20000",
            duration: "PT12M30S",
            subscribers: "60000",
        },
        FakeVideo {
            id: "long",
            channel: "c-big",
            title: "CCNA 完全版",
            views: "80000",
            duration: "PT2H",
            subscribers: "320000",
        },
    ]
}

// Tuesday 12:00 in Tokyo
fn weekday_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 10, 3, 0, 0).unwrap()
}

// Saturday 12:00 in Tokyo
fn weekend_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 14, 3, 0, 0).unwrap()
}

fn config() -> Config {
    ConfigBuilder::new()
        .with_youtube_api_key("yt-key")
        .with_chatwork("cw-token", "room-1")
        .build()
}

struct Harness {
    pipeline: DigestPipeline,
    calls: Arc<Mutex<Calls>>,
    posts: Arc<Mutex<Vec<(String, String)>>>,
}

fn harness(config: &Config, videos: Vec<FakeVideo>, fail_search: bool, options: RunOptions) -> Harness {
    let calls = Arc::new(Mutex::new(Calls::default()));
    let posts = Arc::new(Mutex::new(Vec::new()));
    let provider = FakeYouTube { videos, fail_search, calls: Arc::clone(&calls) };
    let sink = RecordingSink { posts: Arc::clone(&posts), fail: false };
    let pipeline = DigestPipeline::new(config, Box::new(provider), Some(Box::new(sink)), options).unwrap();
    Harness { pipeline, calls, posts }
}

#[tokio::test]
async fn test_weekday_run_posts_top_videos() {
    let options = RunOptions { category: Some("technical".to_string()), ..Default::default() };
    let h = harness(&config(), videos(), false, options);
    let mut rng = StdRng::seed_from_u64(1);

    let outcome = h.pipeline.run(weekday_now(), &mut rng).await.unwrap();

    let summary = match outcome {
        RunOutcome::Posted(summary) => summary,
        other => panic!("expected a post, got {:?}", other),
    };
    assert_eq!(summary.category, "技術系");
    // "small" scores below 50 and is dropped
    assert_eq!(summary.video_count, 3);

    let posts = h.posts.lock().unwrap();
    assert_eq!(posts.len(), 1);
    let (room, body) = &posts[0];
    assert_eq!(room, "room-1");
    assert!(body.contains("🎥 **動画 1：ネットワーク 基礎 解説 入門**"));
    assert!(!body.contains("雑談"));
    assert!(body.find("動画 1").unwrap() < body.find("動画 2").unwrap());

    let calls = h.calls.lock().unwrap();
    let queries = &calls.queries;
    assert_eq!(queries.len(), 1);
    let technical = config().categories.pools[0].keywords.clone();
    assert!(technical.contains(&queries[0]));
}

#[tokio::test]
async fn test_weekend_is_skipped_without_searching() {
    let h = harness(&config(), videos(), false, RunOptions::default());
    let mut rng = StdRng::seed_from_u64(1);

    let outcome = h.pipeline.run(weekend_now(), &mut rng).await.unwrap();

    assert_eq!(outcome, RunOutcome::Skipped(SkipReason::Weekend));
    assert!(h.calls.lock().unwrap().queries.is_empty());
    assert!(h.posts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_forced_weekend_uses_default_category() {
    let options = RunOptions { force: true, ..Default::default() };
    let h = harness(&config(), videos(), false, options);

    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        match h.pipeline.run(weekend_now(), &mut rng).await.unwrap() {
            RunOutcome::Posted(summary) => assert_eq!(summary.category, "技術系"),
            other => panic!("expected a post, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_same_seed_same_query() {
    let first = harness(&config(), videos(), false, RunOptions::default());
    let second = harness(&config(), videos(), false, RunOptions::default());

    first.pipeline.run(weekday_now(), &mut StdRng::seed_from_u64(77)).await.unwrap();
    second.pipeline.run(weekday_now(), &mut StdRng::seed_from_u64(77)).await.unwrap();

    assert_eq!(
        first.calls.lock().unwrap().queries,
        second.calls.lock().unwrap().queries
    );
}

#[tokio::test]
async fn test_strict_profile_gates_and_aborts() {
    let config = ConfigBuilder::new()
        .with_youtube_api_key("yt-key")
        .with_chatwork("cw-token", "room-1")
        .strict()
        .build();
    // only short or small-channel videos
    let weak = vec![videos()[0].clone(), FakeVideo { duration: "PT9M59S", ..videos()[1].clone() }];
    let h = harness(&config, weak, false, RunOptions::default());

    let outcome = h.pipeline.run(weekday_now(), &mut StdRng::seed_from_u64(3)).await.unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Skipped(SkipReason::BelowThreshold { min_score: 70.0, best: Some(0.0) })
    );
    assert!(h.posts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_strict_profile_posts_at_most_two() {
    let config = ConfigBuilder::new()
        .with_youtube_api_key("yt-key")
        .with_chatwork("cw-token", "room-1")
        .strict()
        .build();
    let strong = vec![
        FakeVideo { id: "a", channel: "ca", subscribers: "1500000", duration: "PT40M", views: "500000", title: "解説 入門 基礎" },
        FakeVideo { id: "b", channel: "cb", subscribers: "600000", duration: "PT35M", views: "200000", title: "まとめ コツ 攻略" },
        FakeVideo { id: "c", channel: "cc", subscribers: "700000", duration: "PT50M", views: "150000", title: "実践 方法 ノウハウ" },
    ];
    let h = harness(&config, strong, false, RunOptions::default());

    match h.pipeline.run(weekday_now(), &mut StdRng::seed_from_u64(3)).await.unwrap() {
        RunOutcome::Posted(summary) => {
            assert_eq!(summary.video_count, 2);
            assert!(summary.average_score >= 70.0);
        }
        other => panic!("expected a post, got {:?}", other),
    }
}

#[tokio::test]
async fn test_search_failure_skips_quietly() {
    let h = harness(&config(), videos(), true, RunOptions::default());

    let outcome = h.pipeline.run(weekday_now(), &mut StdRng::seed_from_u64(5)).await.unwrap();

    assert_eq!(outcome, RunOutcome::Skipped(SkipReason::NoCandidates));
    assert!(h.posts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unfiltered_fallback_posts_weak_results() {
    let config = ConfigBuilder::new()
        .with_youtube_api_key("yt-key")
        .with_chatwork("cw-token", "room-1")
        .with_fallback(Fallback::Unfiltered)
        .build();
    let h = harness(&config, vec![videos()[0].clone()], false, RunOptions::default());

    match h.pipeline.run(weekday_now(), &mut StdRng::seed_from_u64(5)).await.unwrap() {
        RunOutcome::Posted(summary) => assert_eq!(summary.video_count, 1),
        other => panic!("expected a post, got {:?}", other),
    }
}

#[tokio::test]
async fn test_dry_run_renders_without_posting() {
    let calls = Arc::new(Mutex::new(Calls::default()));
    let provider = FakeYouTube { videos: videos(), fail_search: false, calls };
    let options = RunOptions { dry_run: true, ..Default::default() };
    let mut config = config();
    config.chatwork.room_id = None;
    let pipeline = DigestPipeline::new(&config, Box::new(provider), None, options).unwrap();

    match pipeline.run(weekday_now(), &mut StdRng::seed_from_u64(9)).await.unwrap() {
        RunOutcome::DryRun { summary, message } => {
            assert!(summary.video_count > 0);
            assert!(message.contains("おすすめ動画リスト"));
        }
        other => panic!("expected a dry run, got {:?}", other),
    }
}

#[tokio::test]
async fn test_sink_failure_is_an_error() {
    let provider = FakeYouTube {
        videos: videos(),
        fail_search: false,
        calls: Arc::new(Mutex::new(Calls::default())),
    };
    let sink = RecordingSink { posts: Arc::new(Mutex::new(Vec::new())), fail: true };
    let pipeline = DigestPipeline::new(&config(), Box::new(provider), Some(Box::new(sink)), RunOptions::default()).unwrap();

    let result = pipeline.run(weekday_now(), &mut StdRng::seed_from_u64(9)).await;
    assert!(result.is_err());
}

#[test]
fn test_posting_requires_sink() {
    let provider = FakeYouTube {
        videos: Vec::new(),
        fail_search: false,
        calls: Arc::new(Mutex::new(Calls::default())),
    };
    let result = DigestPipeline::new(&config(), Box::new(provider), None, RunOptions::default());
    assert!(result.is_err());
}

#[tokio::test]
async fn test_unknown_category_override_fails() {
    let options = RunOptions { category: Some("cooking".to_string()), ..Default::default() };
    let h = harness(&config(), videos(), false, options);
    assert!(h.pipeline.run(weekday_now(), &mut StdRng::seed_from_u64(1)).await.is_err());
}

#[test]
fn test_profile_override_round_trip() {
    let config = ConfigBuilder::new().with_profile(ScoringProfile::Strict).build();
    assert_eq!(config.scorer().profile(), ScoringProfile::Strict);
}
