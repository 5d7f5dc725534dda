use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use mn_core::{Error, Result};
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::fetcher::HttpFetcher;

/// Absolute article URLs (`domain + href`) for every anchor carrying
/// `marker_class`, in document order. Anchors without an href are ignored.
pub fn extract_links(html: &str, domain: &str, marker_class: &str) -> Result<Vec<String>> {
    let selector = Selector::parse(&format!("a.{}", marker_class))
        .map_err(|e| Error::Scraping(format!("Invalid marker class '{}': {}", marker_class, e)))?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .map(|href| format!("{}{}", domain, href))
        .collect())
}

/// Walks listing pages and gathers the article links they point to.
pub struct LinkCollector {
    fetcher: Arc<HttpFetcher>,
    domain: String,
    marker_class: String,
    concurrency: usize,
}

impl LinkCollector {
    pub fn new(fetcher: Arc<HttpFetcher>, domain: impl Into<String>, marker_class: impl Into<String>) -> Self {
        Self {
            fetcher,
            domain: domain.into(),
            marker_class: marker_class.into(),
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Links from all pages, concatenated in page order. Duplicates are kept.
    pub async fn collect(&self, pages: &[String]) -> Result<Vec<String>> {
        let per_page: Vec<Vec<String>> = stream::iter(pages)
            .map(|url| self.collect_page(url))
            .buffered(self.concurrency)
            .try_collect()
            .await?;
        Ok(per_page.into_iter().flatten().collect())
    }

    pub async fn collect_page(&self, url: &str) -> Result<Vec<String>> {
        let html = match self.fetcher.get_html(url).await {
            Ok(html) => html,
            Err(Error::HttpStatus { status, .. }) if status.is_client_error() => {
                warn!("⚠️ Listing page {} answered {}, no links taken from it", url, status);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        let links = extract_links(&html, &self.domain, &self.marker_class)?;
        debug!(%url, count = links.len(), "Collected article links");
        Ok(links)
    }
}
