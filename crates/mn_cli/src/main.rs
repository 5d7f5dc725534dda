use std::time::Duration;

use clap::Parser;
use mn_core::config::{
    DEFAULT_BASE_NAME, DEFAULT_CATEGORY, DEFAULT_CONTAINER, DEFAULT_DOMAIN, DEFAULT_LISTING_PATH,
    DEFAULT_MARKER_CLASS, DEFAULT_MAX_PAGE,
};
use mn_core::{BodyStrategy, OutputFormat, Result, RetryPolicy, RunConfig, UploadPolicy};
use mn_scrapers::{handle_command, init_logging, ScraperCommands, ScraperManager};
use mn_storage::StorageKind;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scrape FleetMon maritime news into blob storage", long_about = None)]
pub struct Cli {
    #[arg(long, value_enum, env = "MN_STORAGE", default_value = "azure")]
    storage: StorageKind,
    /// Storage connection string (AccountName=...;AccountKey=...)
    #[arg(long, env = "AZURE_STORAGE_CONNECTION_STRING", hide_env_values = true)]
    connection_string: Option<String>,
    #[arg(long, env = "MN_CONTAINER", default_value = DEFAULT_CONTAINER)]
    container: String,
    #[arg(long, env = "MN_BASE_NAME", default_value = DEFAULT_BASE_NAME)]
    base_name: String,
    /// Output format: .csv, .xlsx or .json
    #[arg(long, env = "MN_OUTPUT_FORMAT", default_value = ".xlsx")]
    format: OutputFormat,
    /// Number of listing pages to walk, starting at 1
    #[arg(long, env = "MN_MAX_PAGE", default_value_t = DEFAULT_MAX_PAGE)]
    max_page: u32,
    #[arg(long, env = "MN_CATEGORY", default_value = DEFAULT_CATEGORY)]
    category: String,
    #[arg(long, env = "MN_DOMAIN", default_value = DEFAULT_DOMAIN)]
    domain: String,
    #[arg(long, env = "MN_LISTING_PATH", default_value = DEFAULT_LISTING_PATH)]
    listing_path: String,
    /// Class of the "continue reading" anchors on listing pages
    #[arg(long, env = "MN_MARKER_CLASS", default_value = DEFAULT_MARKER_CLASS)]
    marker_class: String,
    #[arg(long, value_enum, default_value = "longest")]
    body_strategy: BodyStrategy,
    /// Skip TLS certificate validation when fetching pages
    #[arg(long)]
    accept_invalid_certs: bool,
    /// Per-request timeout, 0 disables it
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
    /// Pages fetched at once; rows keep discovery order either way
    #[arg(long, default_value_t = 1)]
    concurrency: usize,
    #[arg(long, default_value_t = 2)]
    max_retries: u32,
    /// What to do when the upload fails
    #[arg(long, value_enum, default_value = "fail")]
    on_upload_error: UploadPolicy,
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<ScraperCommands>,
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        RunConfig {
            domain: self.domain.trim_end_matches('/').to_string(),
            listing_path: self.listing_path.clone(),
            category: self.category.clone(),
            max_page: self.max_page,
            marker_class: self.marker_class.clone(),
            body_strategy: self.body_strategy,
            output_format: self.format,
            container: self.container.clone(),
            base_name: self.base_name.clone(),
            connection_string: self.connection_string.clone(),
            accept_invalid_certs: self.accept_invalid_certs,
            timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
            concurrency: self.concurrency,
            retry: RetryPolicy {
                max_retries: self.max_retries,
                ..RetryPolicy::default()
            },
            upload_policy: self.on_upload_error,
        }
    }

    fn command(&self) -> ScraperCommands {
        self.command.clone().unwrap_or(ScraperCommands::Run)
    }

    /// Only `run` uploads; the read-only commands never touch real storage.
    fn storage_kind(&self, command: &ScraperCommands) -> StorageKind {
        match command {
            ScraperCommands::Run => self.storage,
            ScraperCommands::Links | ScraperCommands::Article { .. } => StorageKind::Memory,
        }
    }

    async fn manager(&self, command: &ScraperCommands) -> Result<ScraperManager> {
        let config = self.run_config();
        debug!(?config, "Run configuration");
        let storage = mn_storage::create_storage(self.storage_kind(command), &config).await?;
        ScraperManager::new(config, storage)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let logger = init_logging(cli.verbose).with_prefix("🦗");

    let command = cli.command();
    let manager = cli.manager(&command).await?;

    logger.info(&format!("Running {:?}", command));
    handle_command(command, &manager).await
}
