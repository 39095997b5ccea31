mod analyzer;
mod catalog;
mod classifier;
mod config;
mod export;
mod model;
mod normalizer;
mod parser;
mod scraper;
mod source;
mod storage;
mod utils;

use analyzer::CatalogSummary;
use catalog::{Catalog, CatalogAssembler};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use classifier::Classifier;
use config::{AppConfig, RuleTables, load_config};
use model::{ConfigError, ProductCandidate, ProductRecord, StorageError};
use parser::ShopParser;
use scraper::{CrawlOptions, ScraperImpl, crawl_listings};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use storage::SqliteStorage;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config.json";

/// Builds the shop catalog from product image names or the live shop.
#[derive(Parser)]
#[command(name = "dydy-catalog", version, about)]
struct Cli {
    /// Run settings (defaults to ./config.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Rule tables JSON; overrides the config and the built-in tables
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify the image files in a directory
    Images {
        dir: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Crawl the shop and classify listing titles
    Scrape {
        #[arg(long)]
        base_url: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print classified records for the given identifiers as JSON
    Classify {
        #[arg(required = true)]
        raw: Vec<String>,
    },
    /// Validate the rule tables and print their sizes
    CheckRules,
    /// Find stored products whose name or category contains QUERY
    Search {
        query: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// List stored products priced at or below MAX cedis, cheapest first
    Budget {
        max: u32,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

#[derive(Args)]
struct OutputArgs {
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// First SKU sequence number
    #[arg(long)]
    start_seq: Option<u32>,

    /// Keep the stored products and continue after them
    #[arg(long)]
    append: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = resolve_config(cli.config.as_deref())?;
    let tables = match cli.rules.as_deref().or(config.rules_path.as_deref()) {
        Some(path) => {
            info!("Loading rule tables from {}", path.display());
            RuleTables::load(path)?
        }
        None => RuleTables::builtin()?,
    };
    let classifier = Classifier::new(tables)?;

    match cli.command {
        Command::Images { dir, output } => {
            let candidates = source::list_image_candidates(&dir, &config.image_extensions)?;
            if candidates.is_empty() {
                warn!("No product images found in {}", dir.display());
            }
            build_catalog(&classifier, candidates, &output, &config)
        }
        Command::Scrape { base_url, output } => {
            let scrape = &config.scrape;
            let fetcher = ScraperImpl::new(&scrape.user_agent, Duration::from_secs(scrape.timeout_seconds))?;
            let parser = ShopParser::new(&scrape.item_selector, &scrape.price_selector)?;
            let options = CrawlOptions {
                base_url: base_url.unwrap_or_else(|| scrape.base_url.clone()),
                delay: Duration::from_millis(scrape.delay_ms),
            };

            let listings = crawl_listings(&fetcher, &parser, &options).await?;
            let candidates: Vec<ProductCandidate> = listings
                .into_iter()
                .filter_map(|listing| listing.into_candidate())
                .collect();
            build_catalog(&classifier, candidates, &output, &config)
        }
        Command::Classify { raw } => {
            let catalog = catalog::assemble(
                &classifier,
                raw.into_iter().map(ProductCandidate::new),
                config.sku_start,
                Local::now().date_naive(),
            );
            println!("{}", serde_json::to_string_pretty(&catalog.records)?);
            Ok(())
        }
        Command::CheckRules => {
            let tables = classifier.tables();
            println!(
                "OK: {} category rules, {} brands, {} description templates, {} feature templates",
                tables.categories.len(),
                tables.brands.len(),
                tables.content.descriptions.len(),
                tables.content.features.len(),
            );
            Ok(())
        }
        Command::Search { query, limit, out_dir } => {
            let storage = open_storage(out_dir.as_deref(), &config)?;
            let found = storage.search_products(&query, limit)?;
            println!("Searching for '{}': {} shown", query, found.len());
            if found.is_empty() {
                println!("  No products found matching your search.");
            }
            print_products(&found);
            Ok(())
        }
        Command::Budget { max, limit, out_dir } => {
            let storage = open_storage(out_dir.as_deref(), &config)?;
            let total = storage.count_in_budget(max)?;
            let found = storage.products_in_budget(max, limit)?;
            println!("Products under GHS {}: {} found", max, total);
            print_products(&found);
            if total > found.len() {
                println!("  ... and {} more products", total - found.len());
            }
            Ok(())
        }
    }
}

fn open_storage(out_dir: Option<&Path>, config: &AppConfig) -> Result<SqliteStorage, Box<dyn Error>> {
    let path = out_dir.unwrap_or(config.output_dir.as_path()).join(&config.database_file);
    if !path.exists() {
        return Err(format!(
            "no catalog database at {}, build one with `images` or `scrape` first",
            path.display()
        )
        .into());
    }
    Ok(SqliteStorage::new(&path)?)
}

fn print_products(products: &[ProductRecord]) {
    for product in products {
        println!(
            "  {} | {} | GHS {} | {}",
            product.sku, product.name, product.price_ghs, product.category
        );
    }
}

/// An explicit config path must exist; otherwise `config.json` is used when present.
fn resolve_config(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match explicit {
        Some(path) => load_config(path),
        None if Path::new(DEFAULT_CONFIG).exists() => load_config(Path::new(DEFAULT_CONFIG)),
        None => {
            info!("No {} found, using defaults", DEFAULT_CONFIG);
            Ok(AppConfig::default())
        }
    }
}

fn build_catalog(
    classifier: &Classifier,
    candidates: Vec<ProductCandidate>,
    output: &OutputArgs,
    config: &AppConfig,
) -> Result<(), Box<dyn Error>> {
    let out_dir = output.out_dir.clone().unwrap_or_else(|| config.output_dir.clone());
    fs::create_dir_all(&out_dir)?;
    let mut storage = SqliteStorage::new(&out_dir.join(&config.database_file))?;

    let today = Local::now().date_naive();
    let (start_seq, reserved) = plan_sequence(&storage, output, config.sku_start)?;

    info!("Classifying {} candidates, SKUs from {}", candidates.len(), start_seq);
    let mut assembler = CatalogAssembler::new(classifier, start_seq, today);
    assembler.reserve_skus(reserved);
    for candidate in candidates {
        assembler.push(candidate);
    }
    let Catalog { records, stats } = assembler.finish();
    if stats.sequence_exhausted > 0 {
        warn!("{} products got no SKU, the sequence ran out", stats.sequence_exhausted);
    }

    // Exports always mirror the whole stored catalog.
    let records = if output.append {
        storage.append_catalog(&records)?;
        storage.load_products()?
    } else {
        storage.replace_catalog(&records)?;
        records
    };
    export::write_csv(&out_dir.join(&config.csv_file), &records)?;
    export::write_json(&out_dir.join(&config.json_file), &records)?;

    let summary = CatalogSummary::from_records(&records, stats);
    export::write_summary(&out_dir.join(&config.summary_file), &summary)?;
    log_summary(&summary);
    Ok(())
}

/// First sequence number and SKUs already taken.
///
/// Appending continues after the stored rows and reserves their SKUs, unless
/// `--start-seq` says otherwise; a fresh build starts at `default_start`.
fn plan_sequence(
    storage: &SqliteStorage,
    output: &OutputArgs,
    default_start: u32,
) -> Result<(u32, Vec<String>), StorageError> {
    if !output.append {
        return Ok((output.start_seq.unwrap_or(default_start), Vec::new()));
    }
    let reserved = storage.existing_skus()?;
    let next = u32::try_from(storage.count()?).map_or(u32::MAX, |n| n.saturating_add(1));
    Ok((output.start_seq.unwrap_or(next), reserved))
}

fn log_summary(summary: &CatalogSummary) {
    info!(
        "Catalog: {} products, {} categories, {} brands ({} duplicates dropped, {} invalid skipped)",
        summary.total_products,
        summary.category_count,
        summary.brand_count,
        summary.assembly.duplicates_dropped,
        summary.assembly.skipped_invalid,
    );
    if let Some(prices) = &summary.prices {
        info!(
            "Prices: total {:.0} GHS | avg {:.2} | median {:.2} | min {} | max {}",
            prices.total, prices.average, prices.median, prices.min, prices.max
        );
    }
    for (category, count) in &summary.top_categories {
        info!("  {}: {}", category, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn output(append: bool, start_seq: Option<u32>) -> OutputArgs {
        OutputArgs {
            out_dir: None,
            start_seq,
            append,
        }
    }

    fn stored(skus: &[&str]) -> SqliteStorage {
        let classifier = Classifier::new(RuleTables::builtin().unwrap()).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let names = ["JBL Flip 6", "HP LaserJet Pro Printer", "Seagate 2TB Hard Drive"];
        let mut catalog = catalog::assemble(
            &classifier,
            names.iter().take(skus.len()).map(|name| ProductCandidate::new(*name)),
            1,
            date,
        );
        for (record, sku) in catalog.records.iter_mut().zip(skus) {
            record.sku = sku.to_string();
        }
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        storage.replace_catalog(&catalog.records).unwrap();
        storage
    }

    #[test]
    fn append_continues_after_stored_rows() {
        let storage = stored(&["AUD-JBL-0001", "OFF-HP-0002"]);
        let (start, reserved) = plan_sequence(&storage, &output(true, None), 1).unwrap();
        assert_eq!(start, 3);
        assert_eq!(reserved, vec!["AUD-JBL-0001".to_string(), "OFF-HP-0002".to_string()]);
    }

    #[test]
    fn explicit_start_wins_but_skus_stay_reserved() {
        let storage = stored(&["AUD-JBL-0001"]);
        let (start, reserved) = plan_sequence(&storage, &output(true, Some(1)), 1).unwrap();
        assert_eq!(start, 1);
        assert_eq!(reserved.len(), 1);

        let classifier = Classifier::new(RuleTables::builtin().unwrap()).unwrap();
        let mut assembler = CatalogAssembler::new(&classifier, start, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assembler.reserve_skus(reserved);
        let sku = assembler.push(ProductCandidate::new("JBL Flip 6")).map(|r| r.sku.clone());
        assert_eq!(sku.as_deref(), Some("AUD-JBL-0001-2"));
    }

    #[test]
    fn fresh_build_ignores_stored_rows() {
        let storage = stored(&["AUD-JBL-0001", "OFF-HP-0002"]);
        let (start, reserved) = plan_sequence(&storage, &output(false, None), 40).unwrap();
        assert_eq!(start, 40);
        assert!(reserved.is_empty());
    }

    #[test]
    fn append_run_exports_whole_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = Classifier::new(RuleTables::builtin().unwrap()).unwrap();
        let config = AppConfig::default();
        let mut args = output(false, None);
        args.out_dir = Some(dir.path().to_path_buf());

        build_catalog(&classifier, vec![ProductCandidate::new("JBL Flip 6")], &args, &config).unwrap();
        args.append = true;
        build_catalog(
            &classifier,
            vec![
                ProductCandidate::new("JBL Flip 6"),
                ProductCandidate::new("HP LaserJet Pro Printer"),
            ],
            &args,
            &config,
        )
        .unwrap();

        let json = fs::read_to_string(dir.path().join(&config.json_file)).unwrap();
        let exported: Vec<ProductRecord> = serde_json::from_str(&json).unwrap();
        let skus: Vec<_> = exported.iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(skus, vec!["AUD-JBL-0001", "AUD-JBL-0002", "OFF-HP-0003"]);

        let csv = fs::read_to_string(dir.path().join(&config.csv_file)).unwrap();
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn cli_parses_query_commands() {
        let cli = Cli::try_parse_from(["dydy-catalog", "budget", "500", "--limit", "3"]).unwrap();
        assert!(matches!(cli.command, Command::Budget { max: 500, limit: 3, .. }));

        let cli = Cli::try_parse_from(["dydy-catalog", "-v", "search", "camera"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Search { ref query, limit: 5, .. } if query == "camera"));
    }
}
