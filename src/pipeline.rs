//! One digest run: select, collect, rank, filter, render, post
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::chatwork::{ChatworkClient, MessageSink};
use crate::config::Config;
use crate::filter::{CandidateFilter, Selection, SkipReason};
use crate::message::DigestRenderer;
use crate::scoring::{QualityScorer, ScoredCandidate};
use crate::selector::{is_weekend, weekday_jst, Category, CategorySelector};
use crate::youtube::{CandidateCollector, VideoSearchProvider, YouTubeClient};

/// Per-invocation switches
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Render but don't post
    pub dry_run: bool,

    /// Run even when weekends are skipped
    pub force: bool,

    /// Use this category instead of drawing one
    pub category: Option<String>,
}

/// What a posted (or rendered) digest contained
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    pub category: String,
    pub keyword: String,
    pub video_count: usize,
    pub average_score: f64,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Posted(PostSummary),
    DryRun { summary: PostSummary, message: String },
    Skipped(SkipReason),
}

/// The configured stages of a digest run
pub struct DigestPipeline {
    scorer: QualityScorer,
    selector: CategorySelector,
    filter: CandidateFilter,
    collector: CandidateCollector,
    renderer: DigestRenderer,
    sink: Option<Box<dyn MessageSink>>,
    room_id: Option<String>,
    max_ranked: usize,
    skip_weekends: bool,
    options: RunOptions,
}

impl DigestPipeline {
    /// Assemble a pipeline around explicit providers
    pub fn new(
        config: &Config,
        provider: Box<dyn VideoSearchProvider>,
        sink: Option<Box<dyn MessageSink>>,
        options: RunOptions,
    ) -> Result<Self> {
        config.validate_settings()?;

        if !options.dry_run && (sink.is_none() || config.chatwork.room_id.is_none()) {
            return Err(anyhow!("posting requires a Chatwork sink and room id"));
        }

        Ok(Self {
            scorer: config.scorer(),
            selector: config.selector()?,
            filter: config.filter(),
            collector: CandidateCollector::new(provider, config.youtube.search_max_results),
            renderer: DigestRenderer::new(config.message.clone()).with_categories(config.categories.pools.clone()),
            sink,
            room_id: config.chatwork.room_id.clone(),
            max_ranked: config.scoring.max_ranked,
            skip_weekends: config.schedule.skip_weekends,
            options,
        })
    }

    /// Build the YouTube and Chatwork clients from configuration
    pub fn from_config(config: &Config, options: RunOptions) -> Result<Self> {
        if options.dry_run {
            config.validate_settings()?;
        } else {
            config.validate()?;
        }

        let api_key = config
            .youtube
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("YOUTUBE_API_KEY is not set"))?;
        let provider = YouTubeClient::new(
            api_key,
            &config.youtube.base_url,
            config.search_options(),
            config.youtube.timeout_seconds,
        )?;

        let sink: Option<Box<dyn MessageSink>> = match (&config.chatwork.api_token, options.dry_run) {
            (Some(token), false) => Some(Box::new(ChatworkClient::new(
                token.clone(),
                &config.chatwork.base_url,
                config.chatwork.timeout_seconds,
            )?)),
            _ => None,
        };

        Self::new(config, Box::new(provider), sink, options)
    }

    fn pick_category<R: Rng + ?Sized>(&self, now: DateTime<Utc>, rng: &mut R) -> Result<&Category> {
        match &self.options.category {
            Some(id) => self
                .selector
                .find(id)
                .ok_or_else(|| anyhow!("unknown category '{}'", id)),
            None => Ok(self.selector.select_category(weekday_jst(now), rng)),
        }
    }

    /// Run once relative to `now`, drawing every random choice from `rng`
    pub async fn run<R: Rng + ?Sized>(&self, now: DateTime<Utc>, rng: &mut R) -> Result<RunOutcome> {
        let weekday = weekday_jst(now);
        info!("🚀 Digest run starting ({} JST)", weekday);

        if self.skip_weekends && !self.options.force && is_weekend(weekday) {
            info!("⏰ Weekend, skipping post");
            return Ok(RunOutcome::Skipped(SkipReason::Weekend));
        }

        let category = self.pick_category(now, rng)?;
        let keyword = self
            .selector
            .select_keyword(category, rng)
            .ok_or_else(|| anyhow!("category '{}' has no keywords", category.id))?;
        let template = self
            .selector
            .select_template(category, rng)
            .ok_or_else(|| anyhow!("category '{}' has no templates", category.id))?;

        info!("📂 Category: {}", category.display_name);
        info!("🔍 Keyword: {}", keyword);

        let candidates = self.collector.collect(keyword, &self.scorer, &self.selector).await;
        if candidates.is_empty() {
            warn!("❌ No videos found");
            return Ok(RunOutcome::Skipped(SkipReason::NoCandidates));
        }

        let ranked = self.scorer.rank(candidates, now, self.max_ranked);
        info!("📊 Ranked {} videos ({} profile)", ranked.len(), self.scorer.profile());

        let selected = match self.filter.select(ranked) {
            Selection::Publish(selected) => selected,
            Selection::Skip(reason) => {
                info!("⏭️ Nothing to post: {}", reason);
                return Ok(RunOutcome::Skipped(reason));
            }
        };

        let summary = PostSummary {
            category: category.display_name.clone(),
            keyword: keyword.to_string(),
            video_count: selected.len(),
            average_score: average_score(&selected),
        };
        let message = self.renderer.render(&selected, category, template, now);

        if self.options.dry_run {
            info!("📝 Dry run, not posting");
            return Ok(RunOutcome::DryRun { summary, message });
        }

        let (Some(sink), Some(room_id)) = (&self.sink, &self.room_id) else {
            return Err(anyhow!("posting requires a Chatwork sink and room id"));
        };
        sink.post(room_id, &message).await?;

        info!("✅ Posted {} videos", summary.video_count);
        info!("   - Category: {}", summary.category);
        info!("   - Keyword: {}", summary.keyword);
        info!("   - Average score: {:.1}", summary.average_score);

        Ok(RunOutcome::Posted(summary))
    }
}

fn average_score(selected: &[ScoredCandidate]) -> f64 {
    if selected.is_empty() {
        return 0.0;
    }
    selected.iter().map(|c| c.quality_score()).sum::<f64>() / selected.len() as f64
}
