use clap::Subcommand;
use mn_core::Result;

use crate::manager::ScraperManager;

#[derive(Subcommand, Debug, Clone)]
pub enum ScraperCommands {
    /// Collect links, extract every article and upload the table
    Run,
    /// Print the article URLs found on the listing pages
    Links,
    /// Extract a single article and print it as JSON
    Article {
        /// Absolute article URL
        url: String,
    },
}

pub async fn handle_command(command: ScraperCommands, manager: &ScraperManager) -> Result<()> {
    match command {
        ScraperCommands::Run => {
            let report = manager.run().await?;
            println!(
                "🔗 {} links, 📰 {} articles, ⏭️ {} skipped",
                report.links,
                report.table.len(),
                report.skipped.len()
            );
            for skipped in &report.skipped {
                println!("  - {} ({})", skipped.url, skipped.error);
            }
            match &report.upload {
                Ok(receipt) => println!(
                    "☁️ {}/{} ({} bytes, {})",
                    receipt.container, receipt.blob_name, receipt.size, receipt.content_type
                ),
                Err(e) => eprintln!("❌ Upload failed: {}", e),
            }
        }
        ScraperCommands::Links => {
            let links = manager.collect_links().await?;
            for link in &links {
                println!("{}", link);
            }
        }
        ScraperCommands::Article { url } => {
            let record = manager.scrape_url(&url).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }
    Ok(())
}
