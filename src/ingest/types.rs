// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// Article as received from a source. Every field may be missing.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RawArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<String>, // as sent by the source, usually RFC 3339
    pub source_name: Option<String>,
}

/// Fully-defaulted candidate produced by `ingest::normalize_article`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub context: String,
    pub link: String,
    pub source_name: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Lowercase `title + " " + description` from the original fields (no defaults).
    pub haystack: String,
    /// Position in the aggregated candidate list.
    pub seq: usize,
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<RawArticle>>;
    fn name(&self) -> &str;
}

/// One result slot per configured source.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source: String,
    pub result: Result<Vec<RawArticle>>,
}

impl SourceOutcome {
    pub fn ok(source: impl Into<String>, articles: Vec<RawArticle>) -> Self {
        Self {
            source: source.into(),
            result: Ok(articles),
        }
    }

    pub fn failed(source: impl Into<String>, err: anyhow::Error) -> Self {
        Self {
            source: source.into(),
            result: Err(err),
        }
    }
}

/// Merged candidates plus the names of sources that contributed nothing due to errors.
#[derive(Debug, Default)]
pub struct Aggregated {
    pub articles: Vec<RawArticle>,
    pub failed: Vec<String>,
    pub sources_total: usize,
}

impl Aggregated {
    pub fn all_sources_failed(&self) -> bool {
        self.sources_total > 0 && self.failed.len() == self.sources_total
    }
}
