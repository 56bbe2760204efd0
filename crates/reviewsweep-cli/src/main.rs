//! reviewsweep: low-rating review dataset and report-category assistant.

use std::path::PathBuf;

use reviewsweep_browser::{CookieJarStore, ScraperConfig};
use reviewsweep_core::SweepConfig;
use reviewsweep_infer::{create_embedder, SemanticClassifier, Taxonomy};
use reviewsweep_store::ReportHistory;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;

fn resolve_data_dir() -> PathBuf {
    std::env::var("REVIEWSWEEP_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn build_classifier(config: &SweepConfig) -> anyhow::Result<SemanticClassifier> {
    let taxonomy = Taxonomy::load_or_builtin(config.taxonomy_file.as_deref());
    let embedder = create_embedder(&config.model_dir);
    Ok(SemanticClassifier::new(embedder, taxonomy)?)
}

fn print_help() {
    println!("reviewsweep: low-rating review dataset and report-category assistant");
    println!();
    println!("Usage: reviewsweep <command> [args]");
    println!();
    println!("Commands:");
    println!("  classify <text>                      Suggest a report category for a review text");
    println!("  dataset <reviews.json> [options]     Classify, filter and export a scraped dataset");
    println!("      --category <name>                Keep reviews classified into <name>");
    println!("      --reporter <id>                  Reporter identity for history lookups");
    println!("      --unreported                     Drop reviews the reporter already reported");
    println!("      --csv <file|dir>                 Write the selection as CSV");
    println!("  history [reporter]                   List recorded reports");
    println!("  accounts                             List saved account sessions");
    println!("  init                                 Write the default scraper.json");
    println!("  help                                 Show this help message");
    println!();
    println!("Environment: REVIEWSWEEP_DATA_DIR, REVIEWSWEEP_MODEL_DIR, REVIEWSWEEP_TAXONOMY, RUST_LOG");
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        print_help();
        return Ok(());
    };

    let data_dir = resolve_data_dir();
    let config = SweepConfig::from_env(&data_dir)?;
    info!("Data directory: {}", data_dir.display());

    match command.as_str() {
        "classify" => {
            let text = args[2..].join(" ");
            if text.is_empty() {
                eprintln!("Usage: reviewsweep classify <text>");
                std::process::exit(1);
            }
            let classifier = build_classifier(&config)?;
            let result = classifier.assess(&text);
            commands::print_assessment(&text, &result);
        }
        "dataset" => {
            let dataset_args = match commands::DatasetArgs::parse(&args[2..]) {
                Ok(a) => a,
                Err(e) => {
                    eprintln!("{}", e);
                    eprintln!("Usage: reviewsweep dataset <reviews.json> [--category C] [--reporter R] [--unreported] [--csv OUT]");
                    std::process::exit(1);
                }
            };
            let classifier = build_classifier(&config)?;
            let history = ReportHistory::load(&config.data_paths.report_history);
            let report = commands::run_dataset(&dataset_args, &classifier, &history)?;
            commands::print_dataset_report(&report);
        }
        "history" => {
            let history = ReportHistory::load(&config.data_paths.report_history);
            commands::print_history(&history, args.get(2).map(String::as_str));
        }
        "accounts" => {
            let store = CookieJarStore::open(&config.data_paths.cookies)?;
            commands::print_accounts(&store);
        }
        "init" => {
            let scraper = ScraperConfig::load(&config.data_paths.root);
            scraper.save()?;
            println!("Scraper config written to {}", scraper.config_path.display());
        }
        "--help" | "-h" | "help" => print_help(),
        other => {
            eprintln!("Unknown command: {}. Use 'reviewsweep help' for usage.", other);
            std::process::exit(1);
        }
    }

    Ok(())
}
