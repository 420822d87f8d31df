// src/pipeline.rs
//! One digest run: fetch (concurrent) -> aggregate -> normalize -> rank -> annotate
//! -> render -> send. Only configuration and delivery faults escape as `RunError`.

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use metrics::{counter, gauge};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{DigestConfig, Settings};
use crate::digest::{
    build_items, fallback_items, render_html, render_plain_text, subject_line, DigestItem,
    FallbackReason, RenderOptions,
};
use crate::error::RunError;
use crate::importance::ImportanceAnnotator;
use crate::ingest::providers::NewsApiProvider;
use crate::ingest::types::{Aggregated, SourceProvider};
use crate::ingest::{self, normalize_all};
use crate::notify::{DeliveryReceipt, DigestSender, OutgoingDigest};
use crate::relevance::RankingEngine;

/// Evaluation time for freshness plus the wall-clock time shown in the digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunClock {
    pub now: DateTime<Utc>,
    pub local: NaiveDateTime,
}

impl RunClock {
    pub fn system() -> Self {
        let local = Local::now();
        Self {
            now: local.with_timezone(&Utc),
            local: local.naive_local(),
        }
    }

    /// Fixed clock; the displayed time is the UTC time.
    pub fn fixed(now: DateTime<Utc>) -> Self {
        Self {
            now,
            local: now.naive_utc(),
        }
    }
}

/// Ranked + annotated items, or the fallback set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub items: Vec<DigestItem>,
    pub fallback: Option<FallbackReason>,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub items: usize,
    pub distinct_sources: usize,
    pub sources_total: usize,
    pub sources_failed: usize,
    pub fallback: Option<FallbackReason>,
    pub receipt: DeliveryReceipt,
}

pub struct Pipeline {
    engine: RankingEngine,
    annotator: ImportanceAnnotator,
    show_scores: bool,
    render: RenderOptions,
    contact: Option<String>,
}

impl Pipeline {
    pub fn new(cfg: &DigestConfig) -> Self {
        Self {
            engine: RankingEngine::new(cfg),
            annotator: ImportanceAnnotator::new(cfg),
            show_scores: cfg.digest.show_scores,
            render: RenderOptions::default(),
            contact: None,
        }
    }

    /// Address shown as the link of the "digest is running" fallback item.
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    pub fn engine(&self) -> &RankingEngine {
        &self.engine
    }

    /// Everything between the fetch join and rendering. Never fails.
    pub fn select(&self, agg: &Aggregated, clock: &RunClock) -> Selection {
        let (candidates, ineligible) = normalize_all(&agg.articles);
        if ineligible > 0 {
            info!(ineligible, "dropped articles without title and description");
        }

        let ranked = self.engine.rank(candidates, clock.now);
        if !ranked.is_empty() {
            return Selection {
                items: build_items(&ranked, &self.annotator, self.show_scores),
                fallback: None,
            };
        }

        let reason = if agg.all_sources_failed() {
            FallbackReason::SourcesUnavailable
        } else {
            FallbackReason::NothingEligible
        };
        warn!(?reason, "no eligible articles, using fallback items");
        counter!("digest_fallback_total").increment(1);
        Selection {
            items: fallback_items(clock.local.date(), self.contact.as_deref(), reason),
            fallback: Some(reason),
        }
    }

    pub fn compose(&self, items: &[DigestItem], clock: &RunClock) -> OutgoingDigest {
        OutgoingDigest {
            subject: subject_line(items.len(), &clock.local),
            html: render_html(items, &clock.local, &self.render),
            text: render_plain_text(items, &clock.local, &self.render),
        }
    }

    /// Full run against the given providers and sender.
    pub async fn run(
        &self,
        providers: &[Box<dyn SourceProvider>],
        sender: &dyn DigestSender,
        clock: RunClock,
    ) -> Result<RunReport, RunError> {
        let agg = ingest::run_once(providers).await;
        let selection = self.select(&agg, &clock);
        let digest = self.compose(&selection.items, &clock);
        info!(
            items = selection.items.len(),
            html_bytes = digest.html.len(),
            "digest rendered"
        );

        let receipt = sender
            .send(&digest)
            .await
            .map_err(RunError::DeliveryFailure)?;
        gauge!("digest_last_run_ts").set(clock.now.timestamp() as f64);

        let report = RunReport {
            items: selection.items.len(),
            distinct_sources: crate::digest::render::distinct_sources(&selection.items),
            sources_total: agg.sources_total,
            sources_failed: agg.failed.len(),
            fallback: selection.fallback,
            receipt,
        };
        info!(
            channel = sender.name(),
            receipt = %report.receipt.id,
            items = report.items,
            distinct_sources = report.distinct_sources,
            sources_failed = report.sources_failed,
            "digest delivered"
        );
        Ok(report)
    }
}

/// One NewsAPI provider per configured source.
pub fn providers_from_config(
    cfg: &DigestConfig,
    settings: &Settings,
) -> anyhow::Result<Vec<Box<dyn SourceProvider>>> {
    if cfg.sources.is_empty() {
        anyhow::bail!("no news sources configured");
    }
    let timeout = Duration::from_secs(cfg.digest.fetch_timeout_secs);
    cfg.sources
        .iter()
        .map(|s| {
            NewsApiProvider::from_url(&s.name, &s.url, &settings.news_api_key, timeout)
                .map(|p| Box::new(p) as Box<dyn SourceProvider>)
        })
        .collect()
}
