//! Chatwork digest rendering
use chrono::{DateTime, Datelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::scoring::ScoredCandidate;
use crate::selector::{jst, Category};
use crate::video::{format_count, truncate_chars};

const DESCRIPTION_PREVIEW: usize = 150;
const RULE_WIDTH: usize = 50;

/// Fixed text around the video list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MessageConfig {
    /// Heading for the closing checklist
    pub practice_heading: String,

    /// Closing checklist lines
    pub practice_lines: Vec<String>,

    /// Last line before the hashtags
    pub tagline: String,

    /// Hashtags; `{category}` is replaced with the category name
    pub hashtags: Vec<String>,

    /// Category whose importance lines cover videos with no matching topic
    pub importance_fallback: Option<String>,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            practice_heading: "💪 **今日から実践できること**".to_string(),
            practice_lines: vec![
                "1つの動画を最後まで視聴する".to_string(),
                "学んだ内容を仕事で実際に試してみる".to_string(),
                "同僚とシェアして議論してみる".to_string(),
            ],
            tagline: "🚀 **技術力 × 人間力 × AI活用力** で最強のヘルプデスクエンジニアを目指しましょう！".to_string(),
            hashtags: vec![
                "#ITヘルプデスク".to_string(),
                "#{category}".to_string(),
                "#スキルアップ".to_string(),
                "#YouTube学習".to_string(),
            ],
            importance_fallback: Some("human_skills".to_string()),
        }
    }
}

fn weekday_ja(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "月",
        Weekday::Tue => "火",
        Weekday::Wed => "水",
        Weekday::Thu => "木",
        Weekday::Fri => "金",
        Weekday::Sat => "土",
        Weekday::Sun => "日",
    }
}

/// Five-star bar, one star per 20 points
pub fn quality_stars(score: f64) -> String {
    let filled = ((score / 20.0).floor().max(0.0) as usize).min(5);
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

fn banner(title: &str) -> String {
    format!(
        "┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓\n\
        ┃           {}           ┃\n\
        ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛\n\n",
        title
    )
}

/// Renders the digest body posted to Chatwork
#[derive(Debug, Clone, Default)]
pub struct DigestRenderer {
    config: MessageConfig,
    topics: Vec<Category>,
}

impl DigestRenderer {
    pub fn new(config: MessageConfig) -> Self {
        Self { config, topics: Vec::new() }
    }

    /// Categories used to look up each video's importance lines by topic label
    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.topics = categories;
        self
    }

    pub fn render(
        &self,
        videos: &[ScoredCandidate],
        category: &Category,
        template: &str,
        now: DateTime<Utc>,
    ) -> String {
        let local = now.with_timezone(&jst());
        let mut message = String::new();

        message.push_str(&format!(
            "╔══════════════════════════════════════════════╗\n\
            ║  {}  ║\n\
            ╚══════════════════════════════════════════════╝\n\n",
            template
        ));
        message.push_str(&format!(
            "📅 **{}（{}曜日）**\n",
            local.format("%Y年%m月%d日"),
            weekday_ja(local.weekday())
        ));
        message.push_str(&format!("📂 **カテゴリ：** {}\n\n", category.display_name));

        if !category.intro.is_empty() {
            message.push_str(&format!("{}\n\n", category.intro));
        }

        message.push_str(&banner("📺 おすすめ動画リスト"));
        for (i, video) in videos.iter().enumerate() {
            message.push_str(&self.render_video(i, video, category));
        }

        message.push_str(&banner("🎯 今日のアクション"));
        if !category.action_message.is_empty() {
            message.push_str(&format!("✅ {}\n\n", category.action_message));
        }

        message.push_str(&format!("{}\n", self.config.practice_heading));
        for line in &self.config.practice_lines {
            message.push_str(&format!("• {}\n", line));
        }
        message.push_str(&format!("\n{}\n\n", self.config.tagline));

        let tag_name = category.display_name.replace('・', "");
        let hashtags: Vec<String> = self
            .config
            .hashtags
            .iter()
            .map(|tag| tag.replace("{category}", &tag_name))
            .collect();
        message.push_str(&hashtags.join(" "));

        message
    }

    /// Importance lines for a video: its own topic's, then the fallback
    /// category's, then the run category's
    fn importance_pool<'a>(&'a self, topic: &str, category: &'a Category) -> &'a [String] {
        let by_topic = self.topics.iter().find(|c| c.display_name == topic);
        let fallback = self
            .config
            .importance_fallback
            .as_deref()
            .and_then(|id| self.topics.iter().find(|c| c.id == id));

        [by_topic, fallback, Some(category)]
            .into_iter()
            .flatten()
            .map(|c| c.importance_messages.as_slice())
            .find(|messages| !messages.is_empty())
            .unwrap_or(&[])
    }

    fn render_video(&self, index: usize, video: &ScoredCandidate, category: &Category) -> String {
        let c = video.candidate();
        let score = video.quality_score();
        let rule = "─".repeat(RULE_WIDTH);
        let published = c
            .published_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "不明".to_string());

        let mut section = format!(
            "{rule}\n🎥 **動画 {}：{}**\n{rule}\n\n\
            ⭐ **品質スコア：** {} ({:.1}/100点)\n\n\
            📺 **チャンネル：** {}\n\
            👥 **登録者数：** {}人\n\n\
            📊 **動画情報**\n\
            ```\n\
            ⏱️ 長さ     │ {}\n\
            👀 再生数   │ {}\n\
            📅 投稿日   │ {}\n\
            🏷️ カテゴリ │ {}\n\
            ```\n\n",
            index + 1,
            c.title,
            quality_stars(score),
            score,
            c.channel_name,
            format_count(c.subscriber_count),
            c.duration_formatted(),
            format_count(c.view_count),
            published,
            c.topic,
        );

        if !c.description.is_empty() {
            let preview = truncate_chars(&c.description, DESCRIPTION_PREVIEW).replace('\n', " ");
            let ellipsis = if c.description.chars().count() > DESCRIPTION_PREVIEW { "..." } else { "" };
            section.push_str(&format!("📝 **概要**\n>{}{}\n\n", preview, ellipsis));
        }

        let pool = self.importance_pool(&c.topic, category);
        if !pool.is_empty() {
            section.push_str(&format!(
                "💡 **ヘルプデスクでの活用ポイント**\n📌 {}\n\n",
                pool[index % pool.len()]
            ));
        }

        section.push_str(&format!(
            "🔗 **アクセス**\n   📹 [動画を見る]({})\n   📺 [チャンネルを見る]({})\n\n",
            c.url(),
            c.channel_url()
        ));
        section
    }
}
