//! Category rotation and keyword selection
use chrono::{DateTime, Datelike, FixedOffset, Utc, Weekday};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{DigestError, Result};

const JST_OFFSET_SECONDS: i32 = 9 * 3600;

/// A topical pool of search keywords and message text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Stable identifier, e.g. `technical`
    pub id: String,

    /// Name shown in the digest, e.g. `技術系`
    pub display_name: String,

    /// Relative weight for weekday selection
    pub weight: f64,

    /// Search queries, one picked per run
    pub keywords: Vec<String>,

    /// Digest headlines, one picked per run
    pub templates: Vec<String>,

    /// Words that mark a video as belonging to this category
    #[serde(default)]
    pub topic_terms: Vec<String>,

    /// Paragraph introducing the category
    #[serde(default)]
    pub intro: String,

    /// Closing call to action
    #[serde(default)]
    pub action_message: String,

    /// Per-video "why it matters" lines, rotated by position
    #[serde(default)]
    pub importance_messages: Vec<String>,
}

/// UTC+9, the calendar the schedule runs on
pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECONDS).expect("UTC+9 is a valid offset")
}

/// Day of week for `now` on the UTC+9 calendar
pub fn weekday_jst(now: DateTime<Utc>) -> Weekday {
    now.with_timezone(&jst()).weekday()
}

pub fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

/// Picks the category, keyword and template for a run
#[derive(Debug, Clone)]
pub struct CategorySelector {
    categories: Vec<Category>,
    default_index: usize,
    weights: WeightedIndex<f64>,
    general_label: String,
    priority_topic: Option<usize>,
}

impl CategorySelector {
    pub fn new(categories: Vec<Category>, default_id: &str, general_label: impl Into<String>) -> Result<Self> {
        let default_index = categories
            .iter()
            .position(|c| c.id == default_id)
            .ok_or_else(|| DigestError::Config(format!("default category '{}' is not defined", default_id)))?;

        let weights = WeightedIndex::new(categories.iter().map(|c| c.weight))
            .map_err(|e| DigestError::Config(format!("invalid category weights: {}", e)))?;

        Ok(Self {
            categories,
            default_index,
            weights,
            general_label: general_label.into(),
            priority_topic: None,
        })
    }

    /// Give one category precedence in topic classification.
    ///
    /// It labels a video only when it has strictly more hits than every other
    /// category; otherwise it drops out and the remaining categories compete.
    pub fn with_priority_topic(mut self, id: &str) -> Result<Self> {
        let index = self
            .categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| DigestError::Config(format!("priority topic '{}' is not defined", id)))?;
        self.priority_topic = Some(index);
        Ok(self)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn default_category(&self) -> &Category {
        &self.categories[self.default_index]
    }

    pub fn find(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Weekends always get the default category; weekdays draw by weight
    pub fn select_category<R: Rng + ?Sized>(&self, weekday: Weekday, rng: &mut R) -> &Category {
        if is_weekend(weekday) {
            return self.default_category();
        }
        &self.categories[self.weights.sample(rng)]
    }

    pub fn select_keyword<'a, R: Rng + ?Sized>(&self, category: &'a Category, rng: &mut R) -> Option<&'a str> {
        category.keywords.choose(rng).map(String::as_str)
    }

    pub fn select_template<'a, R: Rng + ?Sized>(&self, category: &'a Category, rng: &mut R) -> Option<&'a str> {
        category.templates.choose(rng).map(String::as_str)
    }

    /// Label a video by the category whose topic terms it mentions most.
    ///
    /// The priority category (if any) wins only outright. Among the rest a
    /// unique non-zero maximum wins; ties and no hits get the general label.
    pub fn classify_topic(&self, title: &str, description: &str) -> String {
        let title = title.to_lowercase();
        let description = description.to_lowercase();

        let counts: Vec<usize> = self
            .categories
            .iter()
            .map(|category| {
                category
                    .topic_terms
                    .iter()
                    .map(|t| t.to_lowercase())
                    .filter(|t| !t.is_empty() && (title.contains(t.as_str()) || description.contains(t.as_str())))
                    .count()
            })
            .collect();

        if let Some(p) = self.priority_topic {
            let hits = counts[p];
            let outright = hits > 0 && counts.iter().enumerate().all(|(i, n)| i == p || hits > *n);
            if outright {
                return self.categories[p].display_name.clone();
            }
        }

        let contenders: Vec<(usize, usize)> = counts
            .iter()
            .copied()
            .enumerate()
            .filter(|(i, _)| Some(*i) != self.priority_topic)
            .collect();

        let best = contenders.iter().map(|(_, hits)| *hits).max().unwrap_or(0);
        if best == 0 {
            return self.general_label.clone();
        }

        let mut leaders = contenders.iter().filter(|(_, hits)| *hits == best);
        match (leaders.next(), leaders.next()) {
            (Some((i, _)), None) => self.categories[*i].display_name.clone(),
            _ => self.general_label.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn category(id: &str, weight: f64, terms: &[&str]) -> Category {
        Category {
            id: id.to_string(),
            display_name: format!("{}-name", id),
            weight,
            keywords: vec![format!("{} keyword 1", id), format!("{} keyword 2", id)],
            templates: vec![format!("{} headline", id)],
            topic_terms: terms.iter().map(|t| t.to_string()).collect(),
            intro: String::new(),
            action_message: String::new(),
            importance_messages: Vec::new(),
        }
    }

    fn three_way() -> CategorySelector {
        CategorySelector::new(
            vec![
                category("technical", 0.5, &["ネットワーク", "資格"]),
                category("human_skills", 0.25, &["コミュニケーション"]),
                category("ai_ml", 0.25, &["AI", "ChatGPT"]),
            ],
            "technical",
            "総合",
        )
        .unwrap()
    }

    #[test]
    fn test_weekday_jst_crosses_midnight() {
        // Friday 16:00 UTC is already Saturday in Tokyo
        let now = Utc.with_ymd_and_hms(2025, 6, 13, 16, 0, 0).unwrap();
        assert_eq!(weekday_jst(now), Weekday::Sat);

        let now = Utc.with_ymd_and_hms(2025, 6, 13, 14, 59, 0).unwrap();
        assert_eq!(weekday_jst(now), Weekday::Fri);
    }

    #[test]
    fn test_weekend_always_default() {
        let selector = three_way();
        let mut rng = StdRng::seed_from_u64(7);
        for weekday in [Weekday::Sat, Weekday::Sun] {
            for _ in 0..1000 {
                assert_eq!(selector.select_category(weekday, &mut rng).id, "technical");
            }
        }
    }

    #[test]
    fn test_weekday_weighted_proportions() {
        let selector = three_way();
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 10_000;
        let mut counts = std::collections::HashMap::new();

        for _ in 0..trials {
            let picked = selector.select_category(Weekday::Wed, &mut rng);
            *counts.entry(picked.id.clone()).or_insert(0usize) += 1;
        }

        let share = |id: &str| *counts.get(id).unwrap_or(&0) as f64 / trials as f64;
        assert!((share("technical") - 0.5).abs() < 0.03);
        assert!((share("human_skills") - 0.25).abs() < 0.03);
        assert!((share("ai_ml") - 0.25).abs() < 0.03);
    }

    #[test]
    fn test_two_way_weights() {
        let selector = CategorySelector::new(
            vec![category("technical", 0.7, &[]), category("ai_ml", 0.3, &[])],
            "technical",
            "総合",
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let trials = 10_000;
        let technical = (0..trials)
            .filter(|_| selector.select_category(Weekday::Mon, &mut rng).id == "technical")
            .count();
        assert!((technical as f64 / trials as f64 - 0.7).abs() < 0.03);
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let selector = three_way();
        let picks = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..20)
                .map(|_| {
                    let c = selector.select_category(Weekday::Tue, &mut rng);
                    let k = selector.select_keyword(c, &mut rng).unwrap().to_string();
                    (c.id.clone(), k)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(99), picks(99));
    }

    #[test]
    fn test_select_keyword_from_pool() {
        let selector = three_way();
        let mut rng = StdRng::seed_from_u64(3);
        let technical = selector.find("technical").unwrap();
        for _ in 0..50 {
            let keyword = selector.select_keyword(technical, &mut rng).unwrap();
            assert!(technical.keywords.iter().any(|k| k == keyword));
        }

        let empty = Category { keywords: Vec::new(), ..technical.clone() };
        assert!(selector.select_keyword(&empty, &mut rng).is_none());
    }

    #[test]
    fn test_unknown_default_is_rejected() {
        let result = CategorySelector::new(vec![category("technical", 1.0, &[])], "missing", "総合");
        assert!(matches!(result, Err(DigestError::Config(_))));
    }

    #[test]
    fn test_zero_weights_are_rejected() {
        let result = CategorySelector::new(vec![category("technical", 0.0, &[])], "technical", "総合");
        assert!(result.is_err());
    }

    #[test]
    fn test_classify_topic() {
        let selector = three_way();
        assert_eq!(selector.classify_topic("ChatGPT 活用法", "AI で効率化"), "ai_ml-name");
        assert_eq!(selector.classify_topic("CCNA ネットワーク", "資格 試験"), "technical-name");
        assert_eq!(selector.classify_topic("料理", "レシピ"), "総合");
        // without a priority category, any tie for first is general
        assert_eq!(selector.classify_topic("ネットワーク と AI", ""), "総合");
    }

    #[test]
    fn test_priority_topic_must_win_outright() {
        let selector = three_way().with_priority_topic("ai_ml").unwrap();

        assert_eq!(selector.classify_topic("ChatGPT 活用法", "AI で効率化"), "ai_ml-name");
        assert_eq!(selector.classify_topic("ネットワーク と AI", ""), "technical-name");
        assert_eq!(selector.classify_topic("コミュニケーション と ChatGPT", ""), "human_skills-name");
        // the remaining categories still tie
        assert_eq!(selector.classify_topic("ネットワーク コミュニケーション AI", ""), "総合");
        assert_eq!(selector.classify_topic("料理", "レシピ"), "総合");
    }

    #[test]
    fn test_unknown_priority_topic_is_rejected() {
        let result = three_way().with_priority_topic("missing");
        assert!(matches!(result, Err(DigestError::Config(_))));
    }
}
