//! paperharvest - keyword-driven literature harvester
//!
//! ## Usage
//!
//! ```bash
//! paperharvest harvest --keyword "learnable item tokenization" --max-results 50
//! paperharvest publish --input papers_with_abstract.csv
//! paperharvest dedup --input papers_with_abstract.csv
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use paperharvest::{
    config::HarvestConfig, dblp::DblpClient, pipeline::Harvester,
    semanticscholar::SemanticScholarClient, sheets::SheetsPublisher, store,
};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Harvest DBLP papers for keywords and enrich them with abstracts
#[derive(Parser)]
#[command(name = "paperharvest")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (TOML). Defaults to ./paperharvest.toml or the platform config dir
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search keywords, enrich new papers, and save the merged corpus
    Harvest(HarvestArgs),

    /// Push an existing CSV to the configured Google Sheet
    Publish {
        /// CSV to publish (defaults to the configured output file)
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        sheet: SheetArgs,
    },

    /// Remove duplicate papers from an existing CSV in place
    Dedup {
        /// CSV to clean (defaults to the configured output file)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

#[derive(Args)]
struct HarvestArgs {
    /// Search keyword (repeatable; replaces configured keywords)
    #[arg(short, long = "keyword")]
    keywords: Vec<String>,

    /// Maximum DBLP hits per keyword
    #[arg(long)]
    max_results: Option<usize>,

    /// Output CSV path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also publish the result to Google Sheets
    #[arg(long)]
    publish: bool,

    #[command(flatten)]
    sheet: SheetArgs,
}

/// Google Sheets overrides shared by `harvest` and `publish`
#[derive(Args)]
struct SheetArgs {
    /// Google Sheet name
    #[arg(long)]
    sheet_name: Option<String>,

    /// Service-account key file
    #[arg(long)]
    credentials: Option<PathBuf>,
}

impl SheetArgs {
    fn apply(self, config: &mut HarvestConfig) {
        if let Some(name) = self.sheet_name {
            config.sheet_name = name;
        }
        if let Some(credentials) = self.credentials {
            config.credentials_path = credentials;
        }
    }
}

impl HarvestArgs {
    fn apply(self, config: &mut HarvestConfig) {
        if !self.keywords.is_empty() {
            config.keywords = self.keywords;
        }
        if let Some(max) = self.max_results {
            config.max_results_per_keyword = max;
        }
        if let Some(output) = self.output {
            config.output_file = output;
        }
        if self.publish {
            config.publish_to_sheet = true;
        }
        self.sheet.apply(config);
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.json_logs {
        fmt().json().with_env_filter(filter).with_target(true).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .init();
    }

    let mut config =
        HarvestConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Harvest(args) => {
            args.apply(&mut config);
            run_harvest(&config).await
        }
        Commands::Publish { input, sheet } => {
            sheet.apply(&mut config);
            run_publish(&config, input).await
        }
        Commands::Dedup { input } => run_dedup(&config, input),
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn run_harvest(config: &HarvestConfig) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let dblp = DblpClient::new(&config.endpoints.dblp)?;
    let s2 = SemanticScholarClient::new(
        &config.endpoints.semantic_scholar,
        config.semantic_scholar_api_key.clone(),
    )?;

    let publisher = if config.publish_to_sheet {
        Some(build_publisher(config)?)
    } else {
        None
    };

    let mut harvester = Harvester::new(config, &dblp, &s2);
    if let Some(publisher) = &publisher {
        harvester = harvester.with_publisher(publisher);
    }

    let summary = harvester.run().await.context("Harvest failed")?;

    for stats in &summary.keywords {
        println!(
            "  {}: {} fetched, {} new",
            stats.keyword, stats.fetched, stats.new
        );
    }
    match &summary.published {
        Some(published) => {
            info!(spreadsheet_id = %published.spreadsheet_id, created = published.created, "Sheet updated");
            println!(
                "Collected {} papers (saved to {} and Google Sheet '{}')",
                summary.total,
                config.output_file.display(),
                config.sheet_name
            );
        }
        None => println!(
            "Collected {} papers (saved to {})",
            summary.total,
            config.output_file.display()
        ),
    }
    Ok(())
}

async fn run_publish(config: &HarvestConfig, input: Option<PathBuf>) -> Result<()> {
    let path = input.unwrap_or_else(|| config.output_file.clone());
    let papers = store::load_existing(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let publisher = build_publisher(config)?;
    let summary = publisher
        .publish(&papers, &config.sheet_name)
        .await
        .context("Google Sheets publish failed")?;

    println!(
        "Published {} papers to '{}' ({})",
        summary.rows, config.sheet_name, summary.spreadsheet_id
    );
    Ok(())
}

fn run_dedup(config: &HarvestConfig, input: Option<PathBuf>) -> Result<()> {
    let path = input.unwrap_or_else(|| config.output_file.clone());
    let report = store::dedup_file(&path)
        .with_context(|| format!("Failed to deduplicate {}", path.display()))?;

    println!(
        "Removed {} duplicates, {} papers remain in {}",
        report.removed(),
        report.after,
        path.display()
    );
    Ok(())
}

fn build_publisher(config: &HarvestConfig) -> Result<SheetsPublisher> {
    let publisher = SheetsPublisher::from_credentials_file(&config.credentials_path)
        .with_context(|| {
            format!(
                "Failed to load service-account key {}",
                config.credentials_path.display()
            )
        })?
        .with_endpoints(&config.endpoints.google_drive, &config.endpoints.google_sheets);
    Ok(publisher)
}
