//! Fetching ingestion input from the web: HTML pages and Wikipedia articles.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::wikipedia::{extract_query, parse_extract_response, resolve_title, Article};

/// Source of documents to ingest.
#[async_trait]
pub trait WebSource: Send + Sync {
    /// Raw page body, decoded as UTF-8.
    async fn fetch_page(&self, url: &str) -> Result<String>;

    /// Full plain-text body of a Wikipedia article, by title or article URL.
    async fn fetch_article(&self, title_or_url: &str) -> Result<Article>;
}

pub struct HttpWebSource {
    http: reqwest::Client,
    wikipedia_endpoint: String,
}

impl HttpWebSource {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.service.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            wikipedia_endpoint: config.wikipedia.endpoint.clone(),
        })
    }
}

/// Only plain web URLs are fetched.
fn check_page_url(url: &str) -> Result<url::Url> {
    let parsed = url::Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => bail!("Unsupported URL scheme '{}' in {}", scheme, url),
    }
}

#[async_trait]
impl WebSource for HttpWebSource {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let parsed = check_page_url(url)?;
        debug!(%parsed, "fetching page");

        let response = self
            .http
            .get(parsed)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?
            .error_for_status()
            .with_context(|| format!("Failed to fetch {}", url))?;

        let bytes = response.bytes().await?;
        String::from_utf8(bytes.to_vec())
            .with_context(|| format!("Page at {} is not valid UTF-8", url))
    }

    async fn fetch_article(&self, title_or_url: &str) -> Result<Article> {
        let article_ref = resolve_title(title_or_url)?;
        let endpoint = article_ref
            .api_endpoint
            .as_deref()
            .unwrap_or(&self.wikipedia_endpoint);
        debug!(title = %article_ref.title, %endpoint, "fetching Wikipedia article");

        let json: serde_json::Value = self
            .http
            .get(endpoint)
            .query(&extract_query(&article_ref.title))
            .send()
            .await
            .with_context(|| format!("Failed to query Wikipedia for '{}'", article_ref.title))?
            .error_for_status()?
            .json()
            .await?;

        parse_extract_response(&article_ref.title, &json)
    }
}
