use std::sync::Arc;

use mn_core::{
    ArticleRecord, ArticleTable, BlobStorage, Result, RunConfig, UploadPolicy, UploadReceipt,
};
use mn_storage::Publisher;

use crate::body::body_extractor;
use crate::collector::LinkCollector;
use crate::extractor::{ContentExtractor, Extraction, SkippedArticle};
use crate::fetcher::HttpFetcher;
use crate::logging::Logger;

/// What a full run produced.
#[derive(Debug)]
pub struct RunReport {
    pub links: usize,
    pub table: ArticleTable,
    pub skipped: Vec<SkippedArticle>,
    pub upload: Result<UploadReceipt>,
}

/// Runs collector → extractor → publisher for one configuration.
pub struct ScraperManager {
    config: RunConfig,
    collector: LinkCollector,
    extractor: ContentExtractor,
    publisher: Publisher,
    logger: Logger,
}

impl ScraperManager {
    pub fn new(config: RunConfig, storage: Arc<dyn BlobStorage>) -> Result<Self> {
        config.validate()?;
        let fetcher = Arc::new(HttpFetcher::new(&config)?);

        let collector = LinkCollector::new(fetcher.clone(), config.domain.as_str(), config.marker_class.as_str())
            .with_concurrency(config.concurrency);
        let extractor = ContentExtractor::new(fetcher)
            .with_body_extractor(body_extractor(config.body_strategy))
            .with_concurrency(config.concurrency);
        let publisher = Publisher::new(storage, config.container.as_str()).with_retry(config.retry);

        Ok(Self {
            config,
            collector,
            extractor,
            publisher,
            logger: Logger::new().with_prefix("⚓"),
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub async fn collect_links(&self) -> Result<Vec<String>> {
        let pages = self.config.listing_page_urls();
        let logger = self.logger.clone().with_prefix("🔗");
        logger.info(&format!("Collecting article links from {} listing pages", pages.len()));
        let links = self.collector.collect(&pages).await?;
        logger.info(&format!("Found {} article links", links.len()));
        Ok(links)
    }

    pub async fn scrape_url(&self, url: &str) -> Result<ArticleRecord> {
        self.extractor.extract_one(url).await
    }

    pub async fn scrape_articles(&self, urls: &[String]) -> Result<Extraction> {
        let logger = self.logger.clone().with_prefix("📰");
        logger.info(&format!(
            "Extracting {} articles (body: {})",
            urls.len(),
            self.extractor.body_extractor().name()
        ));
        let extraction = self.extractor.extract(urls).await?;
        logger.info(&format!(
            "Extracted {} articles, skipped {}",
            extraction.table.len(),
            extraction.skipped.len()
        ));
        Ok(extraction)
    }

    pub async fn publish(&self, table: &ArticleTable) -> Result<UploadReceipt> {
        self.publisher
            .publish(table, &self.config.base_name, self.config.output_format)
            .await
    }

    /// Full pipeline. Upload failures surface as an error under
    /// [`UploadPolicy::Fail`]; under [`UploadPolicy::Log`] they are logged and
    /// left in [`RunReport::upload`].
    pub async fn run(&self) -> Result<RunReport> {
        let links = self.collect_links().await?;
        let Extraction { table, skipped } = self.scrape_articles(&links).await?;

        let logger = self.logger.clone().with_prefix("☁️");
        let upload = match self.publish(&table).await {
            Ok(receipt) => {
                logger.info(&format!("Published {}/{}", receipt.container, receipt.blob_name));
                Ok(receipt)
            }
            Err(e) => match self.config.upload_policy {
                UploadPolicy::Fail => return Err(e),
                UploadPolicy::Log => {
                    logger.error(&format!(
                        "Upload of '{}' failed: {}",
                        self.config.base_name, e
                    ));
                    Err(e)
                }
            },
        };

        Ok(RunReport {
            links: links.len(),
            table,
            skipped,
            upload,
        })
    }
}
