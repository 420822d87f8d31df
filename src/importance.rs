// src/importance.rs
//! Importance annotation: one short, deterministic sentence per selected article.

use std::collections::HashMap;

use crate::config::{AnnotationMode, DigestConfig};
use crate::relevance::{Category, ScoredArticle};

#[derive(Debug, Clone)]
pub struct ImportanceAnnotator {
    mode: AnnotationMode,
    by_category: HashMap<Category, String>,
    general: String,
    position: String,
}

impl ImportanceAnnotator {
    pub fn new(cfg: &DigestConfig) -> Self {
        let mut by_category = HashMap::new();
        // keep the first template if a category is listed twice (first match wins there too)
        for rule in &cfg.categories {
            by_category
                .entry(rule.category)
                .or_insert_with(|| rule.template.clone());
        }
        Self {
            mode: cfg.digest.annotation,
            by_category,
            general: cfg.templates.general.clone(),
            position: cfg.templates.position.clone(),
        }
    }

    pub fn mode(&self) -> AnnotationMode {
        self.mode
    }

    /// `rank` is 1-based; `total` is the digest size.
    pub fn annotate(&self, item: &ScoredArticle, rank: usize, total: usize) -> String {
        let template = match self.mode {
            AnnotationMode::Position => &self.position,
            AnnotationMode::Category => self
                .by_category
                .get(&item.category)
                .unwrap_or(&self.general),
        };
        fill(template, rank, total)
    }
}

fn fill(template: &str, rank: usize, total: usize) -> String {
    template
        .replace("{rank}", &rank.to_string())
        .replace("{total}", &total.to_string())
}
