use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;

use serpscrape::config::ScraperConfig;
use serpscrape::observability::init_tracing;
use serpscrape::service::{handle_extract, handle_page, handle_scrape, welcome};
use serpscrape::Scraper;

#[derive(Parser, Debug)]
#[command(name = "serpscrape", about = "Search the web and store what the results contain")]
struct Cli {
    /// JSON configuration file
    #[arg(long, env = "SERPSCRAPE_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract structured records from the results of a search
    Scrape {
        /// Search term
        search: String,
    },
    /// Extract article text from the results of a search
    Extract {
        /// Search term
        search: String,
    },
    /// Print one page of stored structured records
    Page {
        /// 1-indexed page number
        page_num: u64,
        /// Records per page
        page_size: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let Some(command) = cli.command else {
        print_json(&welcome())?;
        return Ok(());
    };

    let config = match &cli.config {
        Some(path) => ScraperConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ScraperConfig::default(),
    };

    let scraper = Scraper::open(config).await.context("failed to open scraper")?;
    let outcome = run(&scraper, command).await;
    scraper.close().await.context("failed to close store")?;

    print_json(&outcome?)
}

async fn run(scraper: &Scraper, command: Command) -> Result<Value> {
    let response = match command {
        Command::Scrape { search } => handle_scrape(scraper, &json!({ "search": search })).await,
        Command::Extract { search } => handle_extract(scraper, &json!({ "search": search })).await,
        Command::Page {
            page_num,
            page_size,
        } => {
            handle_page(
                scraper,
                &json!({ "page_num": page_num, "page_size": page_size }),
            )
            .await
        }
    };
    Ok(response?)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
