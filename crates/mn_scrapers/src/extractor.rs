use std::sync::Arc;

use futures::stream::{self, StreamExt};
use mn_core::{ArticleRecord, ArticleTable, Error, Result};
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::body::{BodyExtractor, LongestParagraph};
use crate::fetcher::HttpFetcher;

/// Build one record from an article page.
///
/// The title is the text of every `h1` concatenated (empty when there is
/// none). The body is chosen by `body` among the `p` texts; a page without
/// any paragraph is a [`Error::NoContent`].
pub fn extract_record(html: &str, url: &str, body: &dyn BodyExtractor) -> Result<ArticleRecord> {
    let document = Html::parse_document(html);
    let title = select_texts(&document, "h1")?.concat();
    let paragraphs = select_texts(&document, "p")?;

    let body = body
        .extract(&paragraphs)
        .ok_or_else(|| Error::NoContent { url: url.to_string() })?;

    Ok(ArticleRecord {
        title,
        body,
        url: url.to_string(),
    })
}

fn select_texts(document: &Html, selector: &str) -> Result<Vec<String>> {
    let selector = Selector::parse(selector)
        .map_err(|e| Error::Scraping(format!("Invalid selector: {}", e)))?;
    Ok(document
        .select(&selector)
        .map(|el| el.text().collect::<String>())
        .collect())
}

#[derive(Debug)]
pub struct SkippedArticle {
    pub url: String,
    pub error: Error,
}

/// Table of extracted articles plus the ones left out of it.
#[derive(Debug, Default)]
pub struct Extraction {
    pub table: ArticleTable,
    pub skipped: Vec<SkippedArticle>,
}

pub struct ContentExtractor {
    fetcher: Arc<HttpFetcher>,
    body: Box<dyn BodyExtractor>,
    concurrency: usize,
}

impl ContentExtractor {
    pub fn new(fetcher: Arc<HttpFetcher>) -> Self {
        Self {
            fetcher,
            body: Box::new(LongestParagraph),
            concurrency: 1,
        }
    }

    pub fn with_body_extractor(mut self, body: Box<dyn BodyExtractor>) -> Self {
        self.body = body;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn body_extractor(&self) -> &dyn BodyExtractor {
        self.body.as_ref()
    }

    pub async fn extract_one(&self, url: &str) -> Result<ArticleRecord> {
        let html = self.fetcher.get_html(url).await?;
        let record = extract_record(&html, url, self.body.as_ref())?;
        debug!(%url, title = %record.title, body_chars = record.body.chars().count(), "Extracted article");
        Ok(record)
    }

    /// One row per URL in input order. Pages without content and pages
    /// answering with a terminal 4xx are skipped and reported; any other
    /// failure aborts the batch.
    pub async fn extract(&self, urls: &[String]) -> Result<Extraction> {
        let mut extraction = Extraction::default();
        let mut results = stream::iter(urls)
            .map(|url| async move { (url, self.extract_one(url).await) })
            .buffered(self.concurrency);

        while let Some((url, result)) = results.next().await {
            match result {
                Ok(record) => extraction.table.push(record),
                Err(error) if is_skippable(&error) => {
                    warn!("⏭️ Skipping {}: {}", url, error);
                    extraction.skipped.push(SkippedArticle {
                        url: url.clone(),
                        error,
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(extraction)
    }
}

fn is_skippable(error: &Error) -> bool {
    match error {
        Error::NoContent { .. } => true,
        Error::HttpStatus { status, .. } => status.is_client_error() && !error.is_retryable(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::JoinedParagraphs;
    use mn_core::RetryPolicy;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE_A: &str = r#"
        <html><body>
            <h1>Collision Report</h1>
            <p>short</p>
            <p>this is the longest paragraph body text</p>
        </body></html>
    "#;

    const PAGE_B: &str = "<html><body><p>only text</p></body></html>";

    #[test]
    fn test_extract_record() {
        let record = extract_record(PAGE_A, "https://x/a", &LongestParagraph).unwrap();
        assert_eq!(record.title, "Collision Report");
        assert_eq!(record.body, "this is the longest paragraph body text");
        assert_eq!(record.url, "https://x/a");
    }

    #[test]
    fn test_missing_heading_gives_empty_title() {
        let record = extract_record(PAGE_B, "https://x/b", &LongestParagraph).unwrap();
        assert_eq!(record.title, "");
        assert_eq!(record.body, "only text");
    }

    #[test]
    fn test_headings_are_concatenated() {
        let html = "<h1>Fire on board</h1><h1>: <em>update</em></h1><p>text</p>";
        let record = extract_record(html, "https://x/c", &LongestParagraph).unwrap();
        assert_eq!(record.title, "Fire on board: update");
    }

    #[test]
    fn test_no_paragraphs_is_no_content() {
        let html = "<html><body><h1>Title only</h1><div>no paragraphs</div></body></html>";
        let err = extract_record(html, "https://x/d", &LongestParagraph).unwrap_err();
        assert!(matches!(err, Error::NoContent { url } if url == "https://x/d"));
    }

    #[test]
    fn test_blank_paragraphs_are_no_content_when_joined() {
        let html = "<h1>Blank</h1><p> </p><p></p>";
        let err = extract_record(html, "https://x/e", &JoinedParagraphs).unwrap_err();
        assert!(matches!(err, Error::NoContent { .. }));
    }

    #[test]
    fn test_alternative_body_strategy() {
        let record = extract_record(PAGE_A, "https://x/a", &JoinedParagraphs).unwrap();
        assert_eq!(record.body, "short\n\nthis is the longest paragraph body text");
    }

    async fn serve(pages: &[(&str, &str)]) -> MockServer {
        let mock_server = MockServer::start().await;
        for (page_path, html) in pages {
            Mock::given(method("GET"))
                .and(path(*page_path))
                .respond_with(ResponseTemplate::new(200).set_body_string(*html))
                .mount(&mock_server)
                .await;
        }
        mock_server
    }

    fn extractor() -> ContentExtractor {
        ContentExtractor::new(Arc::new(HttpFetcher::with_client(
            reqwest::Client::new(),
            RetryPolicy::none(),
        )))
    }

    #[tokio::test]
    async fn test_extract_keeps_input_order() {
        let mock_server = serve(&[("/a", PAGE_A), ("/b", PAGE_B)]).await;
        let urls = vec![
            format!("{}/b", mock_server.uri()),
            format!("{}/a", mock_server.uri()),
            format!("{}/b", mock_server.uri()),
        ];

        let extraction = extractor().with_concurrency(3).extract(&urls).await.unwrap();
        assert!(extraction.skipped.is_empty());
        assert_eq!(extraction.table.urls(), urls.as_slice());
        assert_eq!(extraction.table.titles(), ["", "Collision Report", ""]);
    }

    #[tokio::test]
    async fn test_extract_skips_pages_without_content() {
        let mock_server = serve(&[("/a", PAGE_A), ("/empty", "<h1>Nothing</h1>")]).await;
        let urls = vec![
            format!("{}/empty", mock_server.uri()),
            format!("{}/a", mock_server.uri()),
        ];

        let extraction = extractor().extract(&urls).await.unwrap();
        assert_eq!(extraction.table.len(), 1);
        assert_eq!(extraction.table.titles(), ["Collision Report"]);
        assert_eq!(extraction.skipped.len(), 1);
        assert_eq!(extraction.skipped[0].url, urls[0]);
        assert!(matches!(extraction.skipped[0].error, Error::NoContent { .. }));
    }

    #[tokio::test]
    async fn test_extract_skips_dead_links() {
        let mock_server = serve(&[("/a", PAGE_A)]).await;
        let urls = vec![
            format!("{}/gone", mock_server.uri()),
            format!("{}/a", mock_server.uri()),
        ];

        let extraction = extractor().extract(&urls).await.unwrap();
        assert_eq!(extraction.table.urls(), &urls[1..]);
        assert_eq!(extraction.table.titles(), ["Collision Report"]);
        assert_eq!(extraction.skipped.len(), 1);
        assert_eq!(extraction.skipped[0].url, urls[0]);
        assert!(matches!(
            extraction.skipped[0].error,
            Error::HttpStatus { status, .. } if status.as_u16() == 404
        ));
    }

    #[tokio::test]
    async fn test_server_error_aborts_batch() {
        let mock_server = serve(&[("/a", PAGE_A)]).await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;
        let urls = vec![
            format!("{}/a", mock_server.uri()),
            format!("{}/broken", mock_server.uri()),
        ];

        let result = extractor().extract(&urls).await;
        assert!(matches!(result, Err(Error::HttpStatus { status, .. }) if status.as_u16() == 500));
    }

    #[tokio::test]
    async fn test_transport_failure_aborts_batch() {
        // Nothing listens on the discard port.
        let urls = vec!["http://127.0.0.1:9/a".to_string()];
        let result = extractor().extract(&urls).await;
        assert!(matches!(result, Err(Error::Http(_))));
    }
}
