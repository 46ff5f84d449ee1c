// src/categorize.rs
//! Keyword categorizer. Strong keywords score 3 points, weak keywords 1;
//! the best category must reach a minimum score or the entry falls back
//! to `general`. The tables live in `category_keywords.json` at the repo
//! root and are matched by case-insensitive containment against
//! title + summary, so entries like `"mp "` rely on their trailing space.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::model::Category;

const STRONG_POINTS: u32 = 3;
const WEAK_POINTS: u32 = 1;
/// Best score below this falls back to `general`; keeps a single weak
/// match from claiming a category.
const MIN_SCORE: u32 = 2;

#[derive(Debug, Deserialize)]
struct KeywordGroup {
    #[serde(default)]
    strong: Vec<String>,
    #[serde(default)]
    weak: Vec<String>,
}

// Fixed category order keeps tie-breaks deterministic.
static KEYWORDS: Lazy<Vec<(Category, KeywordGroup)>> = Lazy::new(|| {
    let raw = include_str!("../category_keywords.json");
    let mut table: HashMap<String, KeywordGroup> =
        serde_json::from_str(raw).expect("valid category keyword table");
    Category::ALL
        .iter()
        .filter_map(|&c| table.remove(c.as_str()).map(|g| (c, g)))
        .collect()
});

/// Classify a title + summary pair into the closed category taxonomy.
pub fn classify(title: &str, summary: &str) -> Category {
    let text = format!("{} {}", title, summary).to_lowercase();

    let mut best = Category::General;
    let mut best_score = 0u32;
    for (category, group) in KEYWORDS.iter() {
        let mut score = 0u32;
        for kw in &group.strong {
            if text.contains(kw.as_str()) {
                score += STRONG_POINTS;
            }
        }
        for kw in &group.weak {
            if text.contains(kw.as_str()) {
                score += WEAK_POINTS;
            }
        }
        if score > best_score {
            best_score = score;
            best = *category;
        }
    }

    if best_score < MIN_SCORE {
        Category::General
    } else {
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_keyword_wins_outright() {
        let c = classify("Parliament passes new budget", "");
        assert_eq!(c, Category::Politics);
    }

    #[test]
    fn single_weak_match_falls_back_to_general() {
        // "growth" alone is 1 point, below the threshold.
        let c = classify("Steady growth expected", "");
        assert_eq!(c, Category::General);
    }

    #[test]
    fn no_keywords_means_general() {
        assert_eq!(classify("Quiet day everywhere", "nothing notable"), Category::General);
    }

    #[test]
    fn summary_contributes_to_the_score() {
        let c = classify(
            "Black Stars name squad",
            "The GFA confirmed the AFCON fixture list",
        );
        assert_eq!(c, Category::Sports);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify("MALARIA VACCINE ROLLOUT BEGINS", ""), Category::Health);
    }
}
