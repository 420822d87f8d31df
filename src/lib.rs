// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod digest;
pub mod error;
pub mod importance;
pub mod ingest;
pub mod notify;
pub mod pipeline;
pub mod relevance;

// ---- Re-exports for a stable public API ----
pub use crate::config::{DigestConfig, Settings};
pub use crate::digest::{DigestItem, FallbackReason};
pub use crate::error::RunError;
pub use crate::importance::ImportanceAnnotator;
pub use crate::ingest::types::{Article, RawArticle, SourceProvider};
pub use crate::notify::{DeliveryReceipt, DigestSender, OutgoingDigest};
pub use crate::pipeline::{Pipeline, RunClock, RunReport};
pub use crate::relevance::{Category, RankingEngine, ScoredArticle};
