// src/dedup.rs
//! Title fingerprinting. The fingerprint is the sole identity of an
//! article across all sources: outlets republish near-identical
//! headlines for the same event, and URL identity fails because every
//! outlet mints its own link.
//!
//! Two genuinely different stories that normalize to the same
//! fingerprint are treated as one article. That false positive is an
//! accepted policy, traded for a single identity rule.

use std::fmt::Write as _;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::error::RepoError;
use crate::repo::ArticleRepository;

/// Stable content hash of a canonicalized title: lowercase, punctuation
/// stripped, internal whitespace collapsed, SHA-256 hex.
pub fn fingerprint(title: &str) -> String {
    let mut canon = String::with_capacity(title.len());
    let mut pending_space = false;
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !canon.is_empty() {
                canon.push(' ');
            }
            pending_space = false;
            for lc in ch.to_lowercase() {
                canon.push(lc);
            }
        } else {
            pending_space = true;
        }
    }

    let mut hasher = Sha256::new();
    hasher.update(canon.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Advisory pre-filter against the repository's unique index. The
/// authoritative guard is the uniqueness check inside `upsert`; two
/// cycles may race on the same fingerprint and only the insert decides.
pub async fn is_duplicate(
    repo: &Arc<dyn ArticleRepository>,
    fingerprint: &str,
) -> Result<bool, RepoError> {
    repo.contains_fingerprint(fingerprint).await
}
