// src/error.rs
//! Failure taxonomy. Each ingestion failure is contained at its own
//! level: a fetch failure skips the source for the cycle, a parse or
//! draft failure skips the entry. Only storage unavailability aborts a
//! whole cycle. A duplicate fingerprint is not an error at all; it is
//! the `AlreadyExists` upsert outcome.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("feed parse error: {0}")]
    Parse(String),
    #[error("invalid draft: {0}")]
    InvalidDraft(&'static str),
}

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("article {0} not found")]
    NotFound(u64),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
