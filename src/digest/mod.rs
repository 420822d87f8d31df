// src/digest/mod.rs
//! Final digest items: annotated ranking output, or the fixed fallback set.

pub mod render;

use chrono::NaiveDate;
use serde::Serialize;

use crate::importance::ImportanceAnnotator;
use crate::relevance::ScoredArticle;

pub use render::{render_html, render_plain_text, subject_line, RenderOptions};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestItem {
    pub title: String,
    pub context: String,
    pub link: String,
    pub source_name: String,
    pub importance: String,
    /// Only set when score display is enabled.
    pub score: Option<i32>,
}

/// Why the fallback set replaced the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// Every configured source failed.
    SourcesUnavailable,
    /// Sources answered but nothing survived filtering.
    NothingEligible,
}

/// Annotate ranked articles in order. `rank` passed to the annotator is 1-based.
pub fn build_items(
    ranked: &[ScoredArticle],
    annotator: &ImportanceAnnotator,
    show_scores: bool,
) -> Vec<DigestItem> {
    let total = ranked.len();
    ranked
        .iter()
        .enumerate()
        .map(|(i, s)| DigestItem {
            title: s.article.title.clone(),
            context: s.article.context.clone(),
            link: s.article.link.clone(),
            source_name: s.article.source_name.clone(),
            importance: annotator.annotate(s, i + 1, total),
            score: show_scores.then_some(s.score),
        })
        .collect()
}

/// Self-describing status items used when the ranking comes back empty.
pub fn fallback_items(today: NaiveDate, contact: Option<&str>, reason: FallbackReason) -> Vec<DigestItem> {
    let day = today.format("%Y-%m-%d");
    let contact_link = contact
        .map(|c| format!("mailto:{c}"))
        .unwrap_or_else(|| crate::ingest::DEFAULT_LINK.to_string());

    let status = match reason {
        FallbackReason::SourcesUnavailable => DigestItem {
            title: "News sources temporarily unavailable".into(),
            context: "None of the configured news sources answered this run. The next scheduled run will try again.".into(),
            link: "https://newsapi.org/docs".into(),
            source_name: "Technical Status".into(),
            importance: "Technical notice about source availability for the digest service.".into(),
            score: None,
        },
        FallbackReason::NothingEligible => DigestItem {
            title: "No eligible articles today".into(),
            context: "Sources answered, but every article was filtered out by the blocklist or did not match any priority topic.".into(),
            link: crate::ingest::DEFAULT_LINK.into(),
            source_name: "Technical Status".into(),
            importance: "Technical notice: filtering left nothing worth sending today.".into(),
            score: None,
        },
    };

    vec![
        DigestItem {
            title: "News digest is running".into(),
            context: format!(
                "Your automatic news digest is working as of {day}. This is a status message."
            ),
            link: contact_link,
            source_name: "News Digest System".into(),
            importance: "Confirms that the automated daily news service is up.".into(),
            score: None,
        },
        status,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DigestConfig;
    use crate::ingest::{normalize_article, types::RawArticle};
    use crate::relevance::Category;

    #[test]
    fn fallback_is_never_empty_and_mentions_date() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        for reason in [FallbackReason::SourcesUnavailable, FallbackReason::NothingEligible] {
            let items = fallback_items(day, Some("me@example.test"), reason);
            assert_eq!(items.len(), 2);
            assert!(items[0].context.contains("2025-03-01"));
            assert_eq!(items[0].link, "mailto:me@example.test");
        }
        let items = fallback_items(day, None, FallbackReason::NothingEligible);
        assert_eq!(items[0].link, "#");
    }

    #[test]
    fn build_items_ranks_from_one_and_hides_scores() {
        let cfg = DigestConfig::default_seed();
        let annotator = ImportanceAnnotator::new(&cfg);
        let ranked: Vec<ScoredArticle> = (0..2)
            .map(|i| ScoredArticle {
                article: normalize_article(
                    &RawArticle {
                        title: Some(format!("t{i}")),
                        ..RawArticle::default()
                    },
                    i,
                )
                .unwrap(),
                score: 10 - i as i32,
                category: Category::General,
                matched: vec![],
            })
            .collect();

        let hidden = build_items(&ranked, &annotator, false);
        assert!(hidden.iter().all(|d| d.score.is_none()));
        assert!(hidden[0].importance.contains("#1"));
        assert!(hidden[1].importance.contains("#2"));

        let shown = build_items(&ranked, &annotator, true);
        assert_eq!(shown[0].score, Some(10));
    }
}
