// src/ingest/normalize.rs
//! Raw entry -> ArticleDraft. Pure transformation; anything without a
//! usable title or link is rejected here and never reaches storage.

use chrono::Utc;

use crate::affiliates;
use crate::categorize;
use crate::error::IngestError;
use crate::ingest::feed::{self, Item};
use crate::ingest::normalize_text;
use crate::model::{ArticleDraft, Source};

/// Normalized summaries are capped; list pages never need more.
const SUMMARY_MAX_CHARS: usize = 500;

pub fn build_draft(item: Item, source: &Source) -> Result<ArticleDraft, IngestError> {
    let title = normalize_text(item.title.as_deref().unwrap_or_default());
    if title.is_empty() {
        return Err(IngestError::InvalidDraft("empty title"));
    }

    let url = item.link.as_deref().unwrap_or_default().trim().to_string();
    if url.is_empty() {
        return Err(IngestError::InvalidDraft("empty link"));
    }

    // Image extraction reads the raw description, before normalization
    // strips the markup it looks for.
    let image_url = feed::extract_image(&item);

    let mut summary = normalize_text(item.description.as_deref().unwrap_or_default());
    if summary.chars().count() > SUMMARY_MAX_CHARS {
        summary = summary.chars().take(SUMMARY_MAX_CHARS).collect();
    }

    // A missing or malformed date never rejects an entry.
    let published_at = item
        .pub_date
        .as_deref()
        .and_then(feed::parse_pub_date)
        .unwrap_or_else(Utc::now);

    let category = categorize::classify(&title, &summary);
    let affiliates = affiliates::affiliate_links(&format!("{} {}", title, summary));

    Ok(ArticleDraft {
        title,
        summary,
        url,
        image_url,
        source_id: source.id.clone(),
        source_name: source.name.clone(),
        region: source.region,
        category,
        published_at,
        affiliates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Region};

    fn source() -> Source {
        Source {
            id: "citinews".into(),
            name: "CitiNews".into(),
            url: "https://citinewsroom.com/feed/".into(),
            region: Region::Ghana,
            active: true,
            created_at: Utc::now(),
        }
    }

    fn item(title: &str, link: &str) -> Item {
        Item {
            title: Some(title.to_string()),
            link: Some(link.to_string()),
            ..Item::default()
        }
    }

    #[test]
    fn empty_title_is_rejected() {
        let err = build_draft(item("  <b></b> ", "https://x.test/a"), &source()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidDraft("empty title")));
    }

    #[test]
    fn empty_link_is_rejected() {
        let err = build_draft(item("Headline", "   "), &source()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidDraft("empty link")));
    }

    #[test]
    fn missing_date_defaults_to_now() {
        let before = Utc::now();
        let draft = build_draft(item("Headline", "https://x.test/a"), &source()).unwrap();
        assert!(draft.published_at >= before);
        assert!(draft.published_at <= Utc::now());
    }

    #[test]
    fn unparseable_date_defaults_to_now() {
        let mut it = item("Headline", "https://x.test/a");
        it.pub_date = Some("not a date".into());
        let before = Utc::now();
        let draft = build_draft(it, &source()).unwrap();
        assert!(draft.published_at >= before);
    }

    #[test]
    fn draft_carries_source_provenance_and_category() {
        let mut it = item("Parliament passes new budget", "https://x.test/a");
        it.description = Some("The vote followed a long opposition debate.".into());
        let draft = build_draft(it, &source()).unwrap();
        assert_eq!(draft.source_name, "CitiNews");
        assert_eq!(draft.region, Region::Ghana);
        assert_eq!(draft.category, Category::Politics);
    }

    #[test]
    fn long_summaries_are_capped() {
        let mut it = item("Headline", "https://x.test/a");
        it.description = Some("word ".repeat(400));
        let draft = build_draft(it, &source()).unwrap();
        assert!(draft.summary.chars().count() <= 500);
    }

    #[test]
    fn affiliate_triggers_are_recorded() {
        let mut it = item("Best laptop deals in Accra", "https://x.test/a");
        it.description = Some("Shop on Jumia today".into());
        let draft = build_draft(it, &source()).unwrap();
        assert!(draft.affiliates.contains_key("laptop"));
        assert!(draft.affiliates.contains_key("jumia"));
    }
}
