// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::types::{Aggregated, Article, RawArticle, SourceOutcome, SourceProvider};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, histogram};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::time::Instant;

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_CONTEXT: &str = "Description not available.";
pub const DEFAULT_LINK: &str = "#";
pub const DEFAULT_SOURCE_NAME: &str = "Unknown source";

const MAX_TEXT_CHARS: usize = 1500;

/// One-time metrics registration (so series show up once a recorder is installed).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "digest_articles_fetched_total",
            "Articles returned by all sources."
        );
        describe_counter!(
            "digest_source_errors_total",
            "Source fetch/parse errors (source contributes nothing)."
        );
        describe_counter!(
            "digest_ineligible_total",
            "Articles dropped for missing both title and description."
        );
        describe_counter!("digest_blocked_total", "Articles excluded by the blocklist.");
        describe_counter!(
            "digest_unmatched_total",
            "Articles excluded in selective mode (no keyword, no trusted source)."
        );
        describe_counter!(
            "digest_fallback_total",
            "Runs that substituted the fallback item set."
        );
        describe_histogram!("digest_fetch_ms", "Per-source fetch time in milliseconds.");
        describe_gauge!("digest_last_run_ts", "Unix ts when the digest pipeline last ran.");
    });
}

/// Clean source text: decode entities, strip tags, collapse whitespace, cap length.
pub fn clean_text(s: &str) -> String {
    static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

    let decoded = html_escape::decode_html_entities(s);
    let stripped = RE_TAGS.replace_all(&decoded, " ");

    // “ ” ‘ ’ « » -> ASCII quotes
    let quoted = stripped
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    let mut out = RE_WS.replace_all(&quoted, " ").trim().to_string();
    if out.chars().count() > MAX_TEXT_CHARS {
        out = out.chars().take(MAX_TEXT_CHARS).collect();
    }
    out
}

/// Parse a source timestamp. RFC 3339 first, RFC 2822 as a fallback; anything else is `None`.
pub fn parse_published_at(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    DateTime::parse_from_rfc3339(ts)
        .or_else(|_| DateTime::parse_from_rfc2822(ts))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn non_empty(v: Option<&str>) -> Option<String> {
    v.map(clean_text).filter(|s| !s.is_empty())
}

/// Turn a raw record into a fully-defaulted candidate.
/// Returns `None` when both title and description are missing.
pub fn normalize_article(raw: &RawArticle, seq: usize) -> Option<Article> {
    let title = non_empty(raw.title.as_deref());
    let description = non_empty(raw.description.as_deref());
    if title.is_none() && description.is_none() {
        return None;
    }

    let haystack = format!(
        "{} {}",
        title.as_deref().unwrap_or_default(),
        description.as_deref().unwrap_or_default()
    )
    .to_lowercase();

    let link = raw
        .url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_LINK)
        .to_string();

    Some(Article {
        title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        context: description.unwrap_or_else(|| DEFAULT_CONTEXT.to_string()),
        link,
        source_name: non_empty(raw.source_name.as_deref())
            .unwrap_or_else(|| DEFAULT_SOURCE_NAME.to_string()),
        published_at: raw.published_at.as_deref().and_then(parse_published_at),
        haystack,
        seq,
    })
}

/// Normalize the aggregated list once. Returns (candidates, ineligible_count).
pub fn normalize_all(raw: &[RawArticle]) -> (Vec<Article>, usize) {
    let mut out = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;
    for (seq, r) in raw.iter().enumerate() {
        match normalize_article(r, seq) {
            Some(a) => out.push(a),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        counter!("digest_ineligible_total").increment(dropped as u64);
    }
    (out, dropped)
}

/// Merge per-source outcomes in source order. Failed sources contribute nothing.
pub fn aggregate(outcomes: Vec<SourceOutcome>) -> Aggregated {
    let mut agg = Aggregated {
        sources_total: outcomes.len(),
        ..Aggregated::default()
    };
    for o in outcomes {
        match o.result {
            Ok(mut v) => {
                tracing::debug!(source = %o.source, count = v.len(), "source merged");
                agg.articles.append(&mut v);
            }
            Err(e) => {
                tracing::warn!(error = ?e, source = %o.source, "source unavailable, skipping");
                counter!("digest_source_errors_total").increment(1);
                agg.failed.push(o.source);
            }
        }
    }
    agg
}

/// Fetch every provider concurrently and wait for all of them to settle.
/// The outcome order matches the provider order.
pub async fn fetch_all(providers: &[Box<dyn SourceProvider>]) -> Vec<SourceOutcome> {
    let futures = providers.iter().map(|p| async move {
        let t0 = Instant::now();
        let result = p.fetch_latest().await;
        histogram!("digest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        if let Ok(v) = &result {
            counter!("digest_articles_fetched_total").increment(v.len() as u64);
        }
        SourceOutcome {
            source: p.name().to_string(),
            result,
        }
    });
    join_all(futures).await
}

/// Fetch + merge in one step.
pub async fn run_once(providers: &[Box<dyn SourceProvider>]) -> Aggregated {
    ensure_metrics_described();
    let agg = aggregate(fetch_all(providers).await);
    tracing::info!(
        target: "ingest",
        candidates = agg.articles.len(),
        sources = agg.sources_total,
        failed = agg.failed.len(),
        "sources aggregated"
    );
    agg
}
