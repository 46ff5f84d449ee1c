// src/ingest/feed.rs
//! Feed decoding: quick-xml serde structs for RSS 2.0 plus the few
//! extension points these sources actually use (`media:content` images,
//! image-typed enclosures).

use once_cell::sync::OnceCell;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use chrono::{DateTime, TimeZone, Utc};

use crate::error::IngestError;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

/// One raw feed entry, as the wire gives it to us. Everything is
/// optional here; the normalizer decides what is usable.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Item {
    pub title: Option<String>,
    pub link: Option<String>,
    #[serde(rename = "pubDate")]
    pub pub_date: Option<String>,
    pub description: Option<String>,
    // quick-xml's serde deserializer reports the element's local name
    // (namespace prefix stripped), so `<media:content>` arrives as
    // `content`.
    #[serde(rename = "content")]
    pub media_content: Option<MediaContent>,
    pub enclosure: Option<Enclosure>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MediaContent {
    #[serde(rename = "@url")]
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Enclosure {
    #[serde(rename = "@url")]
    pub url: Option<String>,
    #[serde(rename = "@type")]
    pub mime_type: Option<String>,
}

/// Parse a feed document into its raw items.
pub fn parse_feed(xml: &str) -> Result<Vec<Item>, IngestError> {
    let cleaned = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&cleaned).map_err(|e| IngestError::Parse(e.to_string()))?;
    Ok(rss.channel.items)
}

/// RFC 2822 `pubDate` -> UTC; `None` on anything unparseable so the
/// normalizer can fall back to ingestion time.
pub fn parse_pub_date(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC))
        .and_then(|dt| Utc.timestamp_opt(dt.unix_timestamp(), 0).single())
}

/// `media:content` url, else an image-typed enclosure, else the first
/// `<img src>` inside the description markup.
pub fn extract_image(item: &Item) -> Option<String> {
    if let Some(url) = item.media_content.as_ref().and_then(|m| m.url.clone()) {
        return Some(url);
    }
    if let Some(enc) = &item.enclosure {
        let is_image = enc.mime_type.as_deref().is_some_and(|t| t.contains("image"));
        if is_image {
            if let Some(url) = enc.url.clone() {
                return Some(url);
            }
        }
    }

    let desc = item.description.as_deref()?;
    static RE_IMG: OnceCell<regex::Regex> = OnceCell::new();
    let re = RE_IMG.get_or_init(|| {
        regex::Regex::new(r#"(?is)<img[^>]*\bsrc\s*=\s*["']([^"']+)["']"#).unwrap()
    });
    re.captures(desc).map(|caps| caps[1].to_string())
}

// Feeds in the wild leak HTML entities into what should be XML text;
// quick-xml rejects them, so fold the common ones first.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
