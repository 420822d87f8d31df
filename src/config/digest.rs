// src/config/digest.rs
//! Digest configuration (TOML).
//!
//! Holds the knobs of one run plus the ranking tables:
//! - `blocklist`: terms that unconditionally exclude an article,
//! - `priority`: term -> weight used for scoring,
//! - `trusted_sources`: source-name fragments granting inclusion + bonus,
//! - `categories`: ORDERED list of category rules; the first match wins,
//! - `sources`: news endpoints to fetch.
//!
//! Any top-level key left out of the file keeps its built-in default.
//! Resolution order: `$DIGEST_CONFIG_PATH` -> `config/digest.toml` -> built-in seed.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::relevance::Category;

pub const ENV_DIGEST_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const DEFAULT_DIGEST_CONFIG_PATH: &str = "config/digest.toml";

/// Upper bound for `freshness_hours` (one year).
pub const MAX_FRESHNESS_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Only the blocklist applies.
    Permissive,
    /// Blocklist + require a priority keyword or a trusted source.
    #[default]
    Selective,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationMode {
    Position,
    #[default]
    Category,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestSection {
    pub max_items: usize,
    pub mode: FilterMode,
    pub annotation: AnnotationMode,
    pub show_scores: bool,
    pub freshness_hours: i64,
    pub trusted_bonus: i32,
    pub freshness_bonus: i32,
    pub fetch_timeout_secs: u64,
}

impl Default for DigestSection {
    fn default() -> Self {
        Self {
            max_items: 5,
            mode: FilterMode::Selective,
            annotation: AnnotationMode::Category,
            show_scores: false,
            freshness_hours: 24,
            trusted_bonus: 3,
            freshness_bonus: 2,
            fetch_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: Category,
    pub keywords: Vec<String>,
    /// `{rank}` and `{total}` are substituted.
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Templates {
    /// Used for `general` in category mode.
    pub general: String,
    /// Used for every item in position mode.
    pub position: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            general: "Notable story of the day by reader interest. Ranked #{rank} among today's most discussed topics.".into(),
            position: "Ranked {rank} of {total} among today's most relevant stories.".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCfg {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub digest: DigestSection,
    pub blocklist: Vec<String>,
    pub trusted_sources: Vec<String>,
    pub priority: BTreeMap<String, i32>,
    pub categories: Vec<CategoryRule>,
    pub templates: Templates,
    pub sources: Vec<SourceCfg>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl DigestConfig {
    /// Load from a TOML string and sanitize.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: DigestConfig = toml::from_str(s).context("parsing digest config toml")?;
        Ok(cfg.sanitized())
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading digest config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid digest config {}", path.display()))
    }

    /// Load using env var + fallbacks:
    /// 1) $DIGEST_CONFIG_PATH (must exist)
    /// 2) config/digest.toml
    /// 3) built-in seed
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_DIGEST_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!(
                    "{ENV_DIGEST_CONFIG_PATH} points to non-existent path {}",
                    pb.display()
                ));
            }
            return Self::load_from(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_DIGEST_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        tracing::info!("no digest config file found, using built-in defaults");
        Ok(Self::default_seed())
    }

    /// Trim + lowercase every matching term, drop empties and clamp numeric knobs.
    fn sanitized(mut self) -> Self {
        self.blocklist = clean_terms(self.blocklist);
        self.trusted_sources = clean_terms(self.trusted_sources);
        self.priority = self
            .priority
            .into_iter()
            .filter_map(|(k, w)| {
                let k = k.trim().to_lowercase();
                (!k.is_empty()).then_some((k, w))
            })
            .collect();
        for rule in &mut self.categories {
            rule.keywords = clean_terms(std::mem::take(&mut rule.keywords));
        }
        self.sources
            .retain(|s| !s.name.trim().is_empty() && !s.url.trim().is_empty());

        let d = &mut self.digest;
        if d.max_items == 0 {
            d.max_items = 1;
        }
        if d.freshness_hours <= 0 {
            d.freshness_hours = DigestSection::default().freshness_hours;
        }
        d.freshness_hours = d.freshness_hours.min(MAX_FRESHNESS_HOURS);
        if d.fetch_timeout_secs == 0 {
            d.fetch_timeout_secs = DigestSection::default().fetch_timeout_secs;
        }
        self
    }

    /// Built-in tables. Used when no config file is present.
    pub fn default_seed() -> Self {
        fn terms(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }

        let blocklist = terms(&[
            "celebrity",
            "celebrities",
            "kardashian",
            "hollywood",
            "red carpet",
            "gossip",
            "divorce",
            "reality show",
            "box office",
            "oscars",
            "grammy",
            "fashion week",
            "football",
            "soccer",
            "super bowl",
            "premier league",
            "tennis",
            "sports",
        ]);

        let trusted_sources = terms(&[
            "reuters",
            "associated press",
            "bbc",
            "financial times",
            "čt24",
            "irozhlas",
            "seznam zprávy",
        ]);

        let mut priority = BTreeMap::new();
        for (k, w) in [
            ("czech", 5),
            ("česk", 5),
            ("prague", 5),
            ("praha", 5),
            ("climate", 3),
            ("ukraine", 3),
            ("election", 3),
            ("invasion", 3),
            ("european union", 2),
            ("government", 2),
            ("inflation", 2),
            ("economy", 2),
            ("interest rate", 2),
            ("energy", 1),
            ("health", 1),
            ("technology", 1),
        ] {
            priority.insert(k.to_string(), w);
        }

        let categories = vec![
            CategoryRule {
                category: Category::Politics,
                keywords: terms(&[
                    "government",
                    "president",
                    "congress",
                    "senate",
                    "parliament",
                    "election",
                    "law",
                    "policy",
                    "vláda",
                    "volby",
                ]),
                template: "Political decision with significance for international relations. Ranked #{rank} among today's most-read stories.".into(),
            },
            CategoryRule {
                category: Category::Economy,
                keywords: terms(&[
                    "market",
                    "economy",
                    "stock",
                    "bank",
                    "investment",
                    "business",
                    "financial",
                    "inflation",
                ]),
                template: "Economic news with impact on global markets. May influence the world economy.".into(),
            },
            CategoryRule {
                category: Category::Health,
                keywords: terms(&[
                    "health", "medical", "hospital", "disease", "covid", "vaccine", "patient",
                ]),
                template: "Health topic relevant to public health. Important for keeping citizens informed.".into(),
            },
            CategoryRule {
                category: Category::Technology,
                keywords: terms(&[
                    "technology",
                    "tech",
                    "artificial intelligence",
                    "computer",
                    "digital",
                    "internet",
                    "software",
                ]),
                template: "Technological development changing how we live and work. A trend with long-term impact.".into(),
            },
            CategoryRule {
                category: Category::Security,
                keywords: terms(&[
                    "security",
                    "police",
                    "accident",
                    "fire",
                    "crisis",
                    "attack",
                    "emergency",
                ]),
                template: "Security incident with an impact on public order. Information for citizens.".into(),
            },
            CategoryRule {
                category: Category::International,
                keywords: terms(&[
                    "world",
                    "international",
                    "global",
                    "china",
                    "russia",
                    "ukraine",
                    "europe",
                ]),
                template: "International event with possible impact on the Czech Republic. Geopolitical significance.".into(),
            },
        ];

        let sources = vec![
            SourceCfg {
                name: "newsapi-us-top".into(),
                url: "https://newsapi.org/v2/top-headlines?country=us&pageSize=10".into(),
            },
            SourceCfg {
                name: "newsapi-czech".into(),
                url: "https://newsapi.org/v2/everything?q=czech%20OR%20prague&language=en&sortBy=publishedAt&pageSize=10".into(),
            },
            SourceCfg {
                name: "newsapi-europe".into(),
                url: "https://newsapi.org/v2/everything?q=europe&language=en&sortBy=publishedAt&pageSize=10".into(),
            },
        ];

        Self {
            digest: DigestSection::default(),
            blocklist,
            trusted_sources,
            priority,
            categories,
            templates: Templates::default(),
            sources,
        }
    }
}

fn clean_terms(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim().to_lowercase();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}
