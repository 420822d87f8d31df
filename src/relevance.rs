// src/relevance.rs
//! Relevance gate for digest candidates: blocklist, selective inclusion, keyword
//! scoring, first-match categories and stable ranking.
//!
//! All tables come from `DigestConfig` at construction; nothing is read from globals.

use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::config::digest::MAX_FRESHNESS_HOURS;
use crate::config::{CategoryRule, DigestConfig, DigestSection, FilterMode};
use crate::ingest::types::Article;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Politics,
    Economy,
    Health,
    Technology,
    Security,
    International,
    #[default]
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Politics => "politics",
            Category::Economy => "economy",
            Category::Health => "health",
            Category::Technology => "technology",
            Category::Security => "security",
            Category::International => "international",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Short stable id for logs; never log raw headlines.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn article_id(a: &Article) -> String {
    if a.link != crate::ingest::DEFAULT_LINK {
        anon_hash(&a.link)
    } else {
        anon_hash(&a.haystack)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredArticle {
    pub article: Article,
    pub score: i32,
    pub category: Category,
    /// Priority terms and trusted fragments that contributed, e.g. `kw:climate`, `src:reuters`.
    pub matched: Vec<String>,
}

/// Outcome of evaluating one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Contains a blocklist term (the first one found).
    Blocked(String),
    /// Selective mode only: no priority term, no trusted source.
    Unmatched,
    Kept(ScoredArticle),
}

#[derive(Debug, Clone)]
pub struct RankingEngine {
    mode: FilterMode,
    max_items: usize,
    blocklist: Vec<String>,
    trusted_sources: Vec<String>,
    priority: Vec<(String, i32)>,
    categories: Vec<CategoryRule>,
    trusted_bonus: i32,
    freshness_bonus: i32,
    freshness_window: Duration,
}

/// Clamped to `1..=MAX_FRESHNESS_HOURS`; non-positive hours use the default window.
fn freshness_window(hours: i64) -> Duration {
    let hours = if hours <= 0 {
        DigestSection::default().freshness_hours
    } else {
        hours.min(MAX_FRESHNESS_HOURS)
    };
    Duration::try_hours(hours).unwrap_or_else(|| Duration::hours(24))
}

impl RankingEngine {
    pub fn new(cfg: &DigestConfig) -> Self {
        Self {
            mode: cfg.digest.mode,
            max_items: cfg.digest.max_items.max(1),
            blocklist: cfg.blocklist.clone(),
            trusted_sources: cfg.trusted_sources.clone(),
            priority: cfg
                .priority
                .iter()
                .map(|(k, w)| (k.clone(), *w))
                .collect(),
            categories: cfg.categories.clone(),
            trusted_bonus: cfg.digest.trusted_bonus,
            freshness_bonus: cfg.digest.freshness_bonus,
            freshness_window: freshness_window(cfg.digest.freshness_hours),
        }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// First blocklist term found in the article text, if any.
    pub fn blocked_by(&self, a: &Article) -> Option<&str> {
        self.blocklist
            .iter()
            .find(|t| a.haystack.contains(t.as_str()))
            .map(String::as_str)
    }

    pub fn is_blocked(&self, a: &Article) -> bool {
        self.blocked_by(a).is_some()
    }

    /// First category (in configured order) whose keywords occur in `text`.
    pub fn categorize(&self, text: &str) -> Category {
        let text = text.to_lowercase();
        self.categories
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|rule| rule.category)
            .unwrap_or_default()
    }

    fn is_fresh(&self, published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match published_at {
            Some(ts) => {
                let age = now.signed_duration_since(ts);
                age >= Duration::zero() && age <= self.freshness_window
            }
            None => false,
        }
    }

    pub fn evaluate(&self, a: &Article, now: DateTime<Utc>) -> Evaluation {
        if let Some(term) = self.blocked_by(a) {
            return Evaluation::Blocked(term.to_string());
        }

        let mut score = 0i32;
        let mut matched = Vec::new();
        let mut keyword_hit = false;

        for (term, w) in &self.priority {
            if a.haystack.contains(term.as_str()) {
                score = score.saturating_add(*w);
                keyword_hit = true;
                matched.push(format!("kw:{term}"));
            }
        }

        let source = a.source_name.to_lowercase();
        let mut trusted_hit = false;
        for frag in &self.trusted_sources {
            if source.contains(frag.as_str()) {
                score = score.saturating_add(self.trusted_bonus);
                trusted_hit = true;
                matched.push(format!("src:{frag}"));
            }
        }

        if self.mode == FilterMode::Selective && !keyword_hit && !trusted_hit {
            return Evaluation::Unmatched;
        }

        if self.is_fresh(a.published_at, now) {
            score = score.saturating_add(self.freshness_bonus);
            matched.push("fresh".to_string());
        }

        Evaluation::Kept(ScoredArticle {
            category: self.categorize(&a.haystack),
            article: a.clone(),
            score: score.max(0),
            matched,
        })
    }

    /// `None` when the article is excluded.
    pub fn score(&self, a: &Article, now: DateTime<Utc>) -> Option<ScoredArticle> {
        match self.evaluate(a, now) {
            Evaluation::Kept(s) => Some(s),
            Evaluation::Blocked(_) | Evaluation::Unmatched => None,
        }
    }

    /// Filter, score and order candidates; returns at most `max_items`, best first.
    /// Equal scores keep aggregation order.
    pub fn rank(&self, candidates: Vec<Article>, now: DateTime<Utc>) -> Vec<ScoredArticle> {
        let total = candidates.len();
        let mut blocked = 0usize;
        let mut unmatched = 0usize;
        let mut kept = Vec::with_capacity(total);

        for a in &candidates {
            match self.evaluate(a, now) {
                Evaluation::Blocked(term) => {
                    blocked += 1;
                    debug!(target: "relevance", id = %article_id(a), %term, "blocked");
                }
                Evaluation::Unmatched => {
                    unmatched += 1;
                    debug!(target: "relevance", id = %article_id(a), "no keyword or trusted source");
                }
                Evaluation::Kept(s) => {
                    debug!(
                        target: "relevance",
                        id = %article_id(a),
                        score = s.score,
                        category = %s.category,
                        matched = ?s.matched,
                        "kept"
                    );
                    kept.push(s);
                }
            }
        }

        counter!("digest_blocked_total").increment(blocked as u64);
        counter!("digest_unmatched_total").increment(unmatched as u64);

        sort_by_score(&mut kept);
        kept.truncate(self.max_items);

        info!(
            target: "relevance",
            candidates = total,
            blocked,
            unmatched,
            selected = kept.len(),
            mode = ?self.mode,
            "ranking done"
        );
        kept
    }
}

/// Score descending; ties fall back to aggregation order.
pub fn sort_by_score(items: &mut [ScoredArticle]) {
    items.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.article.seq.cmp(&b.article.seq))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{normalize_article, types::RawArticle};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn article(seq: usize, title: &str, source: &str, published: Option<&str>) -> Article {
        normalize_article(
            &RawArticle {
                title: Some(title.into()),
                description: None,
                url: None,
                published_at: published.map(Into::into),
                source_name: Some(source.into()),
            },
            seq,
        )
        .unwrap()
    }

    fn engine(mode: FilterMode) -> RankingEngine {
        let mut cfg = DigestConfig::default_seed();
        cfg.digest.mode = mode;
        RankingEngine::new(&cfg)
    }

    #[test]
    fn anon_hash_is_short_and_stable() {
        assert_eq!(anon_hash("abc").len(), 12);
        assert_eq!(anon_hash("abc"), anon_hash("abc"));
        assert_ne!(anon_hash("abc"), anon_hash("abd"));
    }

    #[test]
    fn blocklist_beats_any_score() {
        let e = engine(FilterMode::Permissive);
        let a = article(0, "Prague climate celebrity gala", "Reuters", None);
        assert_eq!(e.evaluate(&a, now()), Evaluation::Blocked("celebrity".into()));
    }

    #[test]
    fn trusted_source_alone_passes_selective_gate() {
        let e = engine(FilterMode::Selective);
        let a = article(0, "Quiet day at the museum", "Reuters", None);
        let s = e.score(&a, now()).expect("trusted source kept");
        assert_eq!(s.score, 3);
        assert_eq!(s.matched, vec!["src:reuters".to_string()]);
    }

    #[test]
    fn trusted_bonus_is_additive_per_fragment() {
        let mut cfg = DigestConfig::default_seed();
        cfg.trusted_sources = vec!["bbc".into(), "bbc news".into()];
        let e = RankingEngine::new(&cfg);
        let a = article(0, "Quiet day", "BBC News", None);
        assert_eq!(e.score(&a, now()).unwrap().score, 6);
    }

    #[test]
    fn unmatched_dropped_only_in_selective_mode() {
        let a = article(0, "Quiet day at the museum", "Local Blog", None);
        assert_eq!(engine(FilterMode::Selective).evaluate(&a, now()), Evaluation::Unmatched);
        let kept = engine(FilterMode::Permissive).score(&a, now()).unwrap();
        assert_eq!(kept.score, 0);
        assert_eq!(kept.category, Category::General);
    }

    #[test]
    fn freshness_bonus_window() {
        let e = engine(FilterMode::Permissive);
        let fresh = article(0, "Energy prices", "x", Some("2025-03-01T01:00:00Z"));
        let stale = article(1, "Energy prices", "x", Some("2025-02-27T01:00:00Z"));
        let future = article(2, "Energy prices", "x", Some("2025-03-02T01:00:00Z"));
        let broken = article(3, "Energy prices", "x", Some("not a date"));
        assert_eq!(e.score(&fresh, now()).unwrap().score, 1 + 2);
        assert_eq!(e.score(&stale, now()).unwrap().score, 1);
        assert_eq!(e.score(&future, now()).unwrap().score, 1);
        assert_eq!(e.score(&broken, now()).unwrap().score, 1);
    }

    #[test]
    fn negative_weights_never_go_below_zero() {
        let mut cfg = DigestConfig::default_seed();
        cfg.priority.insert("rumor".into(), -10);
        let e = RankingEngine::new(&cfg);
        let a = article(0, "Climate rumor", "x", None);
        assert_eq!(e.score(&a, now()).unwrap().score, 0);
    }

    #[test]
    fn huge_weights_saturate_instead_of_overflowing() {
        let mut cfg = DigestConfig::default_seed();
        cfg.priority.insert("alpha".into(), i32::MAX);
        cfg.priority.insert("beta".into(), i32::MAX);
        let e = RankingEngine::new(&cfg);
        let a = article(0, "alpha beta", "Reuters", Some("2025-03-01T11:00:00Z"));
        assert_eq!(e.score(&a, now()).unwrap().score, i32::MAX);
    }

    #[test]
    fn unsanitized_freshness_hours_do_not_panic() {
        let mut cfg = DigestConfig::default_seed();
        cfg.digest.freshness_hours = i64::MAX;
        let e = RankingEngine::new(&cfg);
        let old = article(0, "Energy prices", "x", Some("2024-06-01T00:00:00Z"));
        // okno je omezené na rok
        assert_eq!(e.score(&old, now()).unwrap().score, 1 + 2);

        cfg.digest.freshness_hours = 0;
        let e = RankingEngine::new(&cfg);
        let fresh = article(1, "Energy prices", "x", Some("2025-03-01T01:00:00Z"));
        assert_eq!(e.score(&fresh, now()).unwrap().score, 1 + 2);
    }

    #[test]
    fn first_category_in_list_order_wins() {
        let e = engine(FilterMode::Permissive);
        // "government" (politics) and "market" (economy) both present
        assert_eq!(e.categorize("Government calms the MARKET"), Category::Politics);
        assert_eq!(e.categorize("Stock market rally"), Category::Economy);
        assert_eq!(e.categorize("A quiet afternoon"), Category::General);
    }

    #[test]
    fn rank_truncates_and_keeps_order_for_ties() {
        let e = engine(FilterMode::Permissive);
        let items: Vec<Article> = (0..8)
            .map(|i| article(i, &format!("Energy story {i}"), "x", None))
            .collect();
        let out = e.rank(items, now());
        assert_eq!(out.len(), 5);
        let seqs: Vec<usize> = out.iter().map(|s| s.article.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
    }
}
