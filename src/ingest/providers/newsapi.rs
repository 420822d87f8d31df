// src/ingest/providers/newsapi.rs
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::ingest::types::{RawArticle, SourceProvider};

#[derive(Debug, Deserialize)]
struct Payload {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Item>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    #[serde(default)]
    source: Option<ItemSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemSource {
    name: Option<String>,
}

/// Parse a NewsAPI response body (`top-headlines` / `everything`).
pub fn parse_payload(body: &str) -> Result<Vec<RawArticle>> {
    let p: Payload = serde_json::from_str(body).context("parsing newsapi json")?;
    if p.status != "ok" {
        bail!(
            "newsapi error: {}",
            p.message.as_deref().unwrap_or("no message")
        );
    }
    Ok(p.articles
        .into_iter()
        .map(|it| RawArticle {
            title: it.title,
            description: it.description,
            url: it.url,
            published_at: it.published_at,
            source_name: it.source.and_then(|s| s.name),
        })
        .collect())
}

pub struct NewsApiProvider {
    name: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        api_key: String,
        client: reqwest::Client,
    },
}

impl NewsApiProvider {
    /// Parse a stored response instead of calling the API.
    pub fn from_fixture(name: impl Into<String>, body: &str) -> Self {
        Self {
            name: name.into(),
            mode: Mode::Fixture(body.to_string()),
        }
    }

    /// Live provider. The key is sent as `X-Api-Key`, never in the URL.
    pub fn from_url(
        name: impl Into<String>,
        url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("news-digest/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building http client")?;
        Ok(Self {
            name: name.into(),
            mode: Mode::Http {
                url: url.into(),
                api_key: api_key.into(),
                client,
            },
        })
    }
}

#[async_trait]
impl SourceProvider for NewsApiProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawArticle>> {
        match &self.mode {
            Mode::Fixture(s) => parse_payload(s),
            Mode::Http {
                url,
                api_key,
                client,
            } => {
                let resp = client
                    .get(url.as_str())
                    .header("X-Api-Key", api_key.as_str())
                    .send()
                    .await
                    .with_context(|| format!("{} http get()", self.name))?;
                let status = resp.status();
                let body = resp
                    .text()
                    .await
                    .with_context(|| format!("{} http .text()", self.name))?;
                // NewsAPI reports errors as JSON with a non-2xx status; prefer its message.
                let parsed = parse_payload(&body);
                if !status.is_success() {
                    return Err(match parsed {
                        Err(e) => e.context(format!("{} returned HTTP {}", self.name, status)),
                        Ok(_) => anyhow!("{} returned HTTP {}", self.name, status),
                    });
                }
                let articles = parsed?;
                tracing::debug!(provider = %self.name, count = articles.len(), "newsapi fetched");
                Ok(articles)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
