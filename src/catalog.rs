use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::model::{
    self, BookRecord, DEFAULT_AUTHORS, DEFAULT_DESCRIPTION, DEFAULT_PUBLISHED_DATE,
    DEFAULT_PUBLISHER, DEFAULT_RATING, DEFAULT_TITLE, PLACEHOLDER_COVER_URL,
};

/// Upper bound on results requested from the catalog per search.
pub const MAX_RESULTS: usize = 6;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Seam between the views and the external catalog. One-shot, best-effort:
/// implementations never surface a failure to the caller.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Keyword search returning at most [`MAX_RESULTS`] normalized records.
    /// Any upstream failure is downgraded to an empty list.
    async fn search(&self, query: &str) -> Vec<BookRecord>;
}

/// Google Books `volumes` endpoint client.
#[derive(Debug, Clone)]
pub struct GoogleBooksClient {
    client: reqwest::Client,
    base_url: Url,
}

impl GoogleBooksClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://www.googleapis.com";

    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid catalog base url: {base_url}"))?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build catalog http client")?;
        Ok(Self { client, base_url })
    }

    /// Honors `BOOKSCOUT_CATALOG_URL` so tests and local stubs can replace the
    /// real endpoint; falls back to the public Google Books host.
    pub fn from_env() -> anyhow::Result<Self> {
        let base = std::env::var("BOOKSCOUT_CATALOG_URL")
            .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string());
        Self::new(base.trim())
    }

    fn volumes_url(&self, query: &str) -> anyhow::Result<Url> {
        let mut url = self
            .base_url
            .join("/books/v1/volumes")
            .context("join volumes path")?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("maxResults", &MAX_RESULTS.to_string());
        Ok(url)
    }

    async fn try_search(&self, query: &str) -> anyhow::Result<Vec<BookRecord>> {
        let url = self.volumes_url(query)?;
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        if !resp.status().is_success() {
            anyhow::bail!("catalog returned {}", resp.status());
        }

        let body: VolumesResponse = resp.json().await.context("parse volumes response")?;
        Ok(body
            .items
            .unwrap_or_default()
            .into_iter()
            .take(MAX_RESULTS)
            .map(|volume| volume.volume_info.unwrap_or_default().into_record())
            .collect())
    }
}

#[async_trait]
impl CatalogClient for GoogleBooksClient {
    async fn search(&self, query: &str) -> Vec<BookRecord> {
        match self.try_search(query).await {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(
                    query,
                    error = format!("{err:#}"),
                    "catalog search failed, treating as zero results"
                );
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct VolumesResponse {
    items: Option<Vec<Volume>>,
}

#[derive(Debug, Default, Deserialize)]
struct Volume {
    #[serde(rename = "volumeInfo")]
    volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    authors: Option<Vec<String>>,
    publisher: Option<String>,
    published_date: Option<String>,
    description: Option<String>,
    average_rating: Option<serde_json::Number>,
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Default, Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
}

impl VolumeInfo {
    fn into_record(self) -> BookRecord {
        let authors = match self.authors {
            Some(names) if !names.is_empty() => names.join(", "),
            _ => DEFAULT_AUTHORS.to_string(),
        };
        BookRecord {
            title: self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            authors,
            publisher: self
                .publisher
                .unwrap_or_else(|| DEFAULT_PUBLISHER.to_string()),
            published_date: self
                .published_date
                .unwrap_or_else(|| DEFAULT_PUBLISHED_DATE.to_string()),
            description: self
                .description
                .map(|raw| model::truncate_description(&raw))
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            rating: self
                .average_rating
                .map(|n| n.to_string())
                .unwrap_or_else(|| DEFAULT_RATING.to_string()),
            cover_url: self
                .image_links
                .and_then(|links| links.thumbnail)
                .unwrap_or_else(|| PLACEHOLDER_COVER_URL.to_string()),
        }
    }
}
