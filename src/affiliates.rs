// src/affiliates.rs
//! Affiliate trigger scan. Trigger words found in an entry's text become
//! the article's opaque `affiliates` map at ingestion time; rendering
//! them is the presentation layer's problem, not ours.

use std::collections::HashMap;

use once_cell::sync::Lazy;

static TRIGGERS: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("iphone", "https://amzn.to/ghana-iphone"),
        ("samsung", "https://amzn.to/ghana-samsung"),
        ("laptop", "https://amzn.to/ghana-laptop"),
        ("tickets", "https://www.eventbrite.com/?aff=ghana_news"),
        ("book", "https://amzn.to/ghana-books"),
        ("jumia", "https://www.jumia.com.gh/?utm_source=ghananews&utm_medium=affiliate"),
    ]
});

/// Case-insensitive containment scan; returns trigger -> link for every
/// trigger present in `text`.
pub fn affiliate_links(text: &str) -> HashMap<String, String> {
    let haystack = text.to_lowercase();
    TRIGGERS
        .iter()
        .filter(|(trigger, _)| haystack.contains(trigger))
        .map(|(trigger, url)| (trigger.to_string(), url.to_string()))
        .collect()
}
