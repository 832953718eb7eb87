use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::filter::{CandidateFilter, Fallback};
use crate::message::MessageConfig;
use crate::scoring::{QualityScorer, ScoringProfile};
use crate::selector::{Category, CategorySelector};
use crate::youtube::SearchOptions;
use crate::{chatwork, youtube};

/// Configuration for the digest bot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// YouTube Data API settings
    pub youtube: YouTubeConfig,

    /// Chatwork destination settings
    pub chatwork: ChatworkConfig,

    /// Quality scoring settings
    pub scoring: ScoringConfig,

    /// Threshold and top-N settings
    pub selection: SelectionConfig,

    /// Run schedule settings
    pub schedule: ScheduleConfig,

    /// Keyword and template pools
    pub categories: CategoryConfig,

    /// Fixed digest text
    pub message: MessageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct YouTubeConfig {
    /// API key (usually from `YOUTUBE_API_KEY`)
    pub api_key: Option<String>,

    /// API base URL
    pub base_url: String,

    /// `regionCode` search parameter
    pub region_code: String,

    /// `relevanceLanguage` search parameter
    pub relevance_language: String,

    /// Search results requested per run (API maximum is 50)
    pub search_max_results: u32,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatworkConfig {
    /// API token (usually from `CHATWORK_API_TOKEN`)
    pub api_token: Option<String>,

    /// Destination room (usually from `CHATWORK_ROOM_ID`)
    pub room_id: Option<String>,

    /// API base URL
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// Bucket tables to score with
    pub profile: ScoringProfile,

    /// Title words that signal instructional content
    pub quality_words: Vec<String>,

    /// Candidates kept after ranking
    pub max_ranked: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectionConfig {
    /// Minimum quality score to publish
    pub min_score: f64,

    /// Behaviour when nothing reaches `min_score`
    pub fallback: Fallback,

    /// Videos per post
    pub max_candidates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Skip Saturday and Sunday (UTC+9)
    pub skip_weekends: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CategoryConfig {
    /// Category used on weekends
    pub default_category: String,

    /// Topic label for videos matching no category
    pub general_label: String,

    /// Category that labels a video only when it leads every other outright
    pub priority_topic: Option<String>,

    pub pools: Vec<Category>,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: youtube::DEFAULT_BASE_URL.to_string(),
            region_code: "JP".to_string(),
            relevance_language: "ja".to_string(),
            search_max_results: 20,
            timeout_seconds: 30,
        }
    }
}

impl Default for ChatworkConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            room_id: None,
            base_url: chatwork::DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            profile: ScoringProfile::Lenient,
            quality_words: to_strings(&[
                "解説", "わかりやすい", "入門", "基礎", "実践", "方法",
                "初心者", "完全版", "まとめ", "ノウハウ", "コツ", "攻略",
            ]),
            max_ranked: 10,
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_score: 50.0,
            fallback: Fallback::Unfiltered,
            max_candidates: 3,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { skip_weekends: true }
    }
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            default_category: "technical".to_string(),
            general_label: "総合".to_string(),
            priority_topic: Some("ai_ml".to_string()),
            pools: default_categories(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            youtube: YouTubeConfig::default(),
            chatwork: ChatworkConfig::default(),
            scoring: ScoringConfig::default(),
            selection: SelectionConfig::default(),
            schedule: ScheduleConfig::default(),
            categories: CategoryConfig::default(),
            message: MessageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist and parse. Otherwise the usual locations
    /// are tried, then built-in defaults. Environment overrides apply last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::discover().unwrap_or_default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    fn discover() -> Option<Self> {
        let config_paths = [
            "tube-digest.toml",
            "config/tube-digest.toml",
            "/etc/tube-digest/config.toml",
        ];

        for path in &config_paths {
            let path = Path::new(path);
            if !path.exists() {
                continue;
            }
            match Self::from_file(path) {
                Ok(config) => return Some(config),
                Err(e) => tracing::warn!("{:#}", e),
            }
        }

        None
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override settings from environment-style lookups
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("YOUTUBE_API_KEY") {
            self.youtube.api_key = Some(key);
        }
        if let Some(token) = non_empty("CHATWORK_API_TOKEN") {
            self.chatwork.api_token = Some(token);
        }
        if let Some(room) = non_empty("CHATWORK_ROOM_ID") {
            self.chatwork.room_id = Some(room);
        }
        if let Some(profile) = non_empty("TUBE_DIGEST_PROFILE") {
            self.scoring.profile = profile.parse().map_err(|e: String| anyhow!(e))?;
        }
        if let Some(min_score) = non_empty("TUBE_DIGEST_MIN_SCORE") {
            self.selection.min_score = min_score
                .trim()
                .parse()
                .with_context(|| format!("TUBE_DIGEST_MIN_SCORE is not a number: {}", min_score))?;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate settings that don't depend on credentials
    pub fn validate_settings(&self) -> Result<()> {
        if self.categories.pools.is_empty() {
            return Err(anyhow!("at least one category is required"));
        }

        for category in &self.categories.pools {
            if !category.weight.is_finite() || category.weight < 0.0 {
                return Err(anyhow!("category '{}' has an invalid weight", category.id));
            }
            if category.keywords.is_empty() {
                return Err(anyhow!("category '{}' has no keywords", category.id));
            }
            if category.templates.is_empty() {
                return Err(anyhow!("category '{}' has no templates", category.id));
            }
        }

        if !self.categories.pools.iter().any(|c| c.weight > 0.0) {
            return Err(anyhow!("at least one category needs a positive weight"));
        }

        if !self
            .categories
            .pools
            .iter()
            .any(|c| c.id == self.categories.default_category)
        {
            return Err(anyhow!(
                "default category '{}' is not defined",
                self.categories.default_category
            ));
        }

        let referenced = [
            ("priority_topic", &self.categories.priority_topic),
            ("importance_fallback", &self.message.importance_fallback),
        ];
        for (key, id) in referenced {
            if let Some(id) = id {
                if !self.categories.pools.iter().any(|c| &c.id == id) {
                    return Err(anyhow!("{} '{}' is not a defined category", key, id));
                }
            }
        }

        if !(0.0..=100.0).contains(&self.selection.min_score) {
            return Err(anyhow!("min_score must be between 0 and 100"));
        }

        if let Fallback::LowerThreshold(lower) = self.selection.fallback {
            if !(0.0..=self.selection.min_score).contains(&lower) {
                return Err(anyhow!("fallback threshold must be between 0 and min_score"));
            }
        }

        if self.selection.max_candidates == 0 {
            return Err(anyhow!("max_candidates must be greater than 0"));
        }

        if self.scoring.max_ranked == 0 {
            return Err(anyhow!("max_ranked must be greater than 0"));
        }

        if !(1..=50).contains(&self.youtube.search_max_results) {
            return Err(anyhow!("search_max_results must be between 1 and 50"));
        }

        Ok(())
    }

    /// Validate everything needed for a run that posts
    pub fn validate(&self) -> Result<()> {
        self.validate_settings()?;

        if self.youtube.api_key.is_none() {
            return Err(anyhow!("YOUTUBE_API_KEY is not set"));
        }
        if self.chatwork.api_token.is_none() {
            return Err(anyhow!("CHATWORK_API_TOKEN is not set"));
        }
        if self.chatwork.room_id.is_none() {
            return Err(anyhow!("CHATWORK_ROOM_ID is not set"));
        }

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }

    pub fn scorer(&self) -> QualityScorer {
        QualityScorer::new(self.scoring.profile, self.scoring.quality_words.clone())
    }

    pub fn selector(&self) -> Result<CategorySelector> {
        let selector = CategorySelector::new(
            self.categories.pools.clone(),
            &self.categories.default_category,
            self.categories.general_label.clone(),
        )?;
        Ok(match &self.categories.priority_topic {
            Some(id) => selector.with_priority_topic(id)?,
            None => selector,
        })
    }

    pub fn filter(&self) -> CandidateFilter {
        CandidateFilter::new(
            self.selection.min_score,
            self.selection.fallback,
            self.selection.max_candidates,
        )
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            region_code: self.youtube.region_code.clone(),
            relevance_language: self.youtube.relevance_language.clone(),
        }
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        let weights = self
            .categories
            .pools
            .iter()
            .map(|c| format!("{}={}", c.id, c.weight))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "tube-digest configuration:\n\
            - Scoring profile: {}\n\
            - Minimum score: {:.1} (fallback: {:?})\n\
            - Videos per post: {}\n\
            - Category weights: {}\n\
            - Weekend default: {}\n\
            - Skip weekends: {}",
            self.scoring.profile,
            self.selection.min_score,
            self.selection.fallback,
            self.selection.max_candidates,
            weights,
            self.categories.default_category,
            self.schedule.skip_weekends
        )
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_categories() -> Vec<Category> {
    vec![
        Category {
            id: "technical".to_string(),
            display_name: "技術系".to_string(),
            weight: 0.5,
            keywords: to_strings(&[
                "ITパスポート 資格 取得方法 勉強法",
                "基本情報技術者 試験 勉強法 合格",
                "IT系常駐ヘルプデスク 資格 知識 スキル",
                "ヘルプデスク 仕事内容 スキル 必要な知識",
                "セキュリティ資格 情報セキュリティマネジメント",
                "MOS Excel Word PowerPoint 資格",
                "CCNA ネットワーク 資格 試験",
                "CompTIA A+ 資格 ハードウェア",
                "ITIL ファンデーション サービス管理",
                "Windows Server 管理 設定",
                "ネットワーク トラブルシューティング 方法",
                "Active Directory 設定 管理",
            ]),
            templates: to_strings(&[
                "🔧 今日のIT技術学習コンテンツ",
                "💻 スキルアップに役立つ技術動画！",
                "⚡ IT系ヘルプデスクを目指す方必見！",
                "🚀 技術力向上のための学習リソース",
                "📚 資格取得に向けた学習動画をご紹介",
                "🎯 実務で活かせるIT知識を学ぼう！",
            ]),
            topic_terms: to_strings(&[
                "IT", "資格", "技術", "パスポート", "ネットワーク", "システム", "エンジニア", "プログラ",
            ]),
            intro: "🔧 **IT系ヘルプデスクに必要な技術力**\n\n\
                技術的な知識とスキルは、お客様の問題を迅速に解決するための基盤です。\n\
                今日選出した動画は、登録者数・再生数・内容の質を総合的に評価した\n\
                **高品質コンテンツ** です。"
                .to_string(),
            action_message: "今日は技術的な知識を一つ深堀りしてみましょう。学んだことをラボ環境で実際に試し、実践スキルとして身につけてください。".to_string(),
            importance_messages: to_strings(&[
                "技術資格は信頼性の証明となり、お客様からの信頼獲得につながります。体系的な知識習得で問題解決力を向上させましょう。",
                "システム知識があることで、より深い問題解決が可能になります。根本原因の特定と効率的な解決策の提案ができるようになります。",
                "最新技術の理解は、現代的な問題への対応力を高めます。技術トレンドを把握することで、お客様により良いアドバイスができます。",
            ]),
        },
        Category {
            id: "human_skills".to_string(),
            display_name: "人間力系".to_string(),
            weight: 0.25,
            keywords: to_strings(&[
                "7つの習慣 ビジネス 自己啓発 スティーブン・コヴィー",
                "アドラー心理学 嫌われる勇気 課題の分離",
                "ビジネスマナー コミュニケーション 自己啓発",
                "人は話し方が9割 コミュニケーション術",
                "好かれる人の言葉選び ビジネス会話",
                "話しかけたくなる人 コミュニケーション スキル",
                "ビジネス敬語 話し方 マナー",
                "職場 人間関係 改善方法",
                "リーダーシップ マネジメント スキル",
                "問題解決思考 論理的思考 方法",
                "ストレス管理 メンタルヘルス 職場",
                "チームワーク 協調性 向上",
            ]),
            templates: to_strings(&[
                "🌟 人間力アップ！自己成長コンテンツ",
                "💬 コミュニケーション力向上の秘訣",
                "🎭 ビジネスパーソンとしての人間力を磨こう",
                "🤝 職場での人間関係を良好にするヒント",
                "💪 内面から成長！自己啓発コンテンツ",
                "🧠 心理学で学ぶ人間関係の極意",
            ]),
            topic_terms: to_strings(&[
                "習慣", "コミュニケーション", "マナー", "アドラー", "心理学", "話し方", "人間関係", "ビジネス",
            ]),
            intro: "🌟 **IT系ヘルプデスクに必要な人間力**\n\n\
                お客様と直接対話するヘルプデスクでは、技術力と同じくらい人間力が重要です。\n\
                コミュニケーション能力や心理学的アプローチを学ぶことで、\n\
                より効果的なサポートが提供できるようになります。"
                .to_string(),
            action_message: "今日は同僚やお客様との会話で、学んだコミュニケーション技術を一つ試してみましょう。相手の反応を観察し、効果を確認してください。".to_string(),
            importance_messages: to_strings(&[
                "コミュニケーション力は、お客様の真の困りごとを引き出すために必須です。適切な質問と傾聴スキルでより良いサポートを提供できます。",
                "心理学の知識は、ストレスの多いお客様への適切な対応に活かされます。相手の心理状態を理解し、安心感を与える対応ができるようになります。",
                "ビジネスマナーは、プロフェッショナルとしての印象を決定づけます。第一印象と継続的な信頼関係構築の基盤となります。",
            ]),
        },
        Category {
            id: "ai_ml".to_string(),
            display_name: "AI・機械学習系".to_string(),
            weight: 0.25,
            keywords: to_strings(&[
                "Claude Anthropic 使い方 ChatGPT 比較 違い",
                "Google Gemini 旧Bard 機能 活用法 Gmail連携",
                "Microsoft Copilot Office365 Word Excel 統合活用",
                "DeepSeek AI 推論能力 コード生成 使い方",
                "Perplexity AI ウェブ検索 情報収集 調査ツール",
                "ChatGPT vs Claude vs Gemini 比較 選び方",
                "生成AI 比較 2025 最新 おすすめ ランキング",
                "AI人工知能 基礎 初心者 わかりやすい 仕組み",
                "機械学習 Machine Learning 入門 基本概念",
                "深層学習 ディープラーニング ニューラルネットワーク",
                "自然言語処理 NLP 大規模言語モデル LLM",
                "Python データサイエンス 機械学習 入門",
                "Google Colab Python 機械学習 実践 チュートリアル",
                "プロンプトエンジニアリング 技術 コツ 効果的な書き方",
                "ChatGPT 活用法 ビジネス 業務効率化 事例",
                "生成AI ビジネス活用 導入事例 成功パターン",
                "データサイエンス 統計 分析手法 基礎",
                "Stable Diffusion Midjourney AI画像生成 比較",
                "AI業界 転職 必要スキル 資格 キャリアパス",
                "AIリテラシー ビジネスパーソン 必須知識",
                "AI倫理 人工知能 社会への影響 課題",
                "AI セキュリティ プライバシー 保護対策",
                "RAG Retrieval Augmented Generation 活用法",
                "AI ヘルプデスク 自動化 チャットボット 導入",
                "IT運用 AIOps 異常検知 自動化",
                "AI 業務自動化 RPA 連携 効率化",
            ]),
            templates: to_strings(&[
                "🤖 最新AI技術で業務を革新しよう！",
                "⚡ 生成AI活用でヘルプデスク業務効率化",
                "🚀 AIリテラシー向上で差をつけろ！",
                "🧠 機械学習の基礎から実践まで",
                "🎯 プロンプトエンジニアリングをマスター",
                "💡 AI時代のヘルプデスクエンジニア必見！",
                "🔮 未来のIT業界を先取りしよう",
                "⚙️ AI×ITで新しい価値を創造",
            ]),
            topic_terms: to_strings(&[
                "AI", "人工知能", "機械学習", "ChatGPT", "Claude", "Gemini",
                "データサイエンス", "プロンプト", "生成AI", "ディープラーニング",
            ]),
            intro: "🤖 **AI時代のヘルプデスクエンジニア**\n\n\
                生成AIや機械学習技術を活用することで、より効率的で高度な問題解決が可能になります。\n\
                ChatGPTやClaude、Geminiなどの最新AIツールを使いこなし、\n\
                業務の自動化と質の向上を実現しましょう。"
                .to_string(),
            action_message: "今日はAIツールを一つ試してみましょう。業務での活用シーンを具体的に想像し、実際のタスクに適用してみてください。".to_string(),
            importance_messages: to_strings(&[
                "AI技術の理解により、自動化可能な作業を特定し、より高度な問題に集中できます。効率化と質の向上を同時に実現できます。",
                "プロンプトエンジニアリングスキルで、AIツールを効果的に活用した問題解決が可能です。複雑な問題も段階的に解決できるようになります。",
                "生成AIを活用することで、お客様への説明資料作成や回答の質を向上させられます。分かりやすい説明で顧客満足度を向上させましょう。",
            ]),
        },
    ]
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_youtube_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.youtube.api_key = Some(key.into());
        self
    }

    pub fn with_youtube_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.youtube.base_url = url.into();
        self
    }

    pub fn with_chatwork(mut self, token: impl Into<String>, room_id: impl Into<String>) -> Self {
        self.config.chatwork.api_token = Some(token.into());
        self.config.chatwork.room_id = Some(room_id.into());
        self
    }

    pub fn with_chatwork_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.chatwork.base_url = url.into();
        self
    }

    pub fn with_profile(mut self, profile: ScoringProfile) -> Self {
        self.config.scoring.profile = profile;
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.config.selection.min_score = min_score;
        self
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.config.selection.fallback = fallback;
        self
    }

    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.config.selection.max_candidates = max;
        self
    }

    /// Replace the category pools; topic references to removed ids are cleared
    pub fn with_categories(mut self, pools: Vec<Category>, default_category: impl Into<String>) -> Self {
        let defined = |id: &Option<String>| id.as_ref().filter(|id| pools.iter().any(|c| &c.id == *id)).cloned();
        self.config.categories.priority_topic = defined(&self.config.categories.priority_topic);
        self.config.message.importance_fallback = defined(&self.config.message.importance_fallback);
        self.config.categories.pools = pools;
        self.config.categories.default_category = default_category.into();
        self
    }

    pub fn skip_weekends(mut self, skip: bool) -> Self {
        self.config.schedule.skip_weekends = skip;
        self
    }

    /// Strict gate, 70 point minimum, two videos, no fallback
    pub fn strict(self) -> Self {
        self.with_profile(ScoringProfile::Strict)
            .with_min_score(70.0)
            .with_fallback(Fallback::Abort)
            .with_max_candidates(2)
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
