pub mod body;
pub mod cli;
pub mod collector;
pub mod extractor;
pub mod fetcher;
pub mod logging;
pub mod manager;

pub use body::{BodyExtractor, JoinedParagraphs, LongestParagraph};
pub use cli::{handle_command, ScraperCommands};
pub use collector::LinkCollector;
pub use extractor::{ContentExtractor, Extraction, SkippedArticle};
pub use fetcher::HttpFetcher;
pub use logging::{init_logging, Logger};
pub use manager::{RunReport, ScraperManager};

pub mod prelude {
    pub use super::body::BodyExtractor;
    pub use super::manager::ScraperManager;
    pub use mn_core::{ArticleRecord, ArticleTable, Error, Result};
}
