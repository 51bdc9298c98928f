//! Geraldton CLI binary.
//!
//! Builds the labeled fundamentals dataset from a raw corpus dump, or
//! prints per-ticker risk statistics.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use geraldton::dataset::LabelWindow;
use geraldton::pipeline::{Pipeline, PipelineConfig};
use geraldton_data::tensor::{PRICE_KEY_SUFFIX, TICKER_KEY};
use geraldton_data::{FeatureDictionary, PriceSeries, scan_records};
use geraldton_output::{ExportFormat, Exporter, FeatureNameExport, LabeledMatrixExport};
use geraldton_risk::{RiskEngine, simple_returns};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "geraldton")]
#[command(about = "Geraldton: supervised-learning datasets from stock fundamentals", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the labeled dataset from a raw corpus dump
    Build {
        /// Raw corpus file
        raw: PathBuf,

        /// Feature dictionary file, one ratio key per line
        #[arg(long)]
        dictionary: PathBuf,

        /// Directory the artifacts are written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Train window opening date
        #[arg(long, default_value = "2014-01-02")]
        train_start: NaiveDate,

        /// Train window closing date
        #[arg(long, default_value = "2015-01-02")]
        train_end: NaiveDate,

        /// Test window opening date
        #[arg(long, default_value = "2015-01-02")]
        test_start: NaiveDate,

        /// Test window closing date
        #[arg(long, default_value = "2016-01-04")]
        test_end: NaiveDate,

        /// Minimum Sortino ratio for a positive label
        #[arg(long, default_value = "1.0")]
        sortino_threshold: f64,

        /// Maximum tolerated share of missing values per feature column
        #[arg(long, default_value = "0.0")]
        missing_threshold: f64,

        /// Number of distinct price dates a ticker must exceed
        #[arg(long, default_value = "756")]
        min_history: usize,

        /// Reporting periods per ratio
        #[arg(long, default_value = "11")]
        periods: usize,

        /// Also write pretty-printed JSON renderings of the artifacts
        #[arg(long)]
        json: bool,
    },

    /// Print per-ticker risk statistics from a raw corpus dump
    Risk {
        /// Raw corpus file
        raw: PathBuf,

        /// Restrict the report to one ticker
        #[arg(long)]
        ticker: Option<String>,

        /// Output format (json or text)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            raw,
            dictionary,
            out_dir,
            train_start,
            train_end,
            test_start,
            test_end,
            sortino_threshold,
            missing_threshold,
            min_history,
            periods,
            json,
        } => {
            let mut config = PipelineConfig::default();
            config.set_periods(periods);
            config.tensor.min_price_history = min_history;
            config.label.sortino_threshold = sortino_threshold;
            config.label.train = LabelWindow {
                start: train_start,
                end: train_end,
            };
            config.label.test = LabelWindow {
                start: test_start,
                end: test_end,
            };
            config.filter.missing_threshold = missing_threshold;

            build_dataset(&raw, &dictionary, &out_dir, config, json)?;
        }
        Commands::Risk {
            raw,
            ticker,
            format,
        } => {
            risk_report(&raw, ticker.as_deref(), &format)?;
        }
    }

    Ok(())
}

fn build_dataset(
    raw: &Path,
    dictionary: &Path,
    out_dir: &Path,
    config: PipelineConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(raw)?;
    let dict = FeatureDictionary::from_path(dictionary)?;
    let train = config.label.train;

    println!(
        "Building dataset from {} ({} ratios, {} periods)",
        raw.display(),
        dict.len(),
        config.tensor.periods
    );

    let (dataset, summary) = Pipeline::new(config).run(&text, &dict)?;

    println!("\nStage report");
    println!("============");
    println!(
        "  Raw matrix:        {} tickers x {} columns",
        summary.raw_shape.0, summary.raw_shape.1
    );
    println!("  Time horizon:      {}", summary.time_horizon.join(" "));
    println!(
        "  Missing pass:      {} columns kept",
        summary.filter.after_missing.1
    );
    println!(
        "  Completeness pass: {} columns kept",
        summary.filter.after_completeness.1
    );
    println!("  Labeled tickers:   {}", summary.labeled_tickers);
    for (label, count) in &summary.train_label_counts {
        println!("    train label {}:  {}", label, count);
    }
    if !summary.ticker_labels.is_empty() {
        println!("\nTrain-window assessment");
        println!(
            "  {:<10} {:>10} {:>10} {:>10} {:>10} {:>6}",
            "ticker", "return", "sortino", "sharpe", "cvar", "label"
        );
        for labels in &summary.ticker_labels {
            println!(
                "  {:<10} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>6}",
                labels.ticker,
                labels.train.realized_return,
                labels.train.sortino,
                labels.train.sharpe,
                labels.cvar,
                labels.train.label
            );
        }
    }
    if !summary.exclusions.is_empty() {
        println!("  Excluded tickers:");
        for (ticker, reason) in &summary.exclusions {
            println!("    {:<10} {}", ticker, reason);
        }
    }

    std::fs::create_dir_all(out_dir)?;
    let stem = format!("{}_{}", train.start, train.end);

    let matrix_path = out_dir.join(format!("feature_label_{stem}.csv"));
    LabeledMatrixExport::new(&dataset).export_to_file(&matrix_path, ExportFormat::Csv)?;
    println!("\nWrote {}", matrix_path.display());

    let names_path = out_dir.join(format!("selected_feature_{stem}.txt"));
    FeatureNameExport::new(&dataset).export_to_file(&names_path, ExportFormat::Csv)?;
    println!("Wrote {}", names_path.display());

    if json {
        let matrix_json = out_dir.join(format!("feature_label_{stem}.json"));
        LabeledMatrixExport::new(&dataset).export_to_file(&matrix_json, ExportFormat::PrettyJson)?;
        println!("Wrote {}", matrix_json.display());

        let names_json = out_dir.join(format!("selected_feature_{stem}.json"));
        FeatureNameExport::new(&dataset).export_to_file(&names_json, ExportFormat::PrettyJson)?;
        println!("Wrote {}", names_json.display());
    }

    Ok(())
}

fn risk_report(
    raw: &Path,
    ticker: Option<&str>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(raw)?;
    let engine = RiskEngine::try_default()?;

    let mut series_map = collect_price_series(&text);
    if let Some(ticker) = ticker {
        series_map.retain(|name, _| name == ticker);
        if series_map.is_empty() {
            return Err(format!("no price data for ticker: {}", ticker).into());
        }
    }

    if format.eq_ignore_ascii_case("json") {
        let mut entries = Vec::new();
        for (ticker, series) in &series_map {
            let stats = engine.assess(series);
            entries.push(json!({
                "ticker": ticker,
                "price_dates": series.len(),
                "returns": simple_returns(series).len(),
                "stats": stats,
            }));
        }
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!(
        "{:<10} {:>7} {:>8} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "ticker", "dates", "returns", "sd", "downside", "cvar95", "cvar99", "cvar99.9"
    );
    for (ticker, series) in &series_map {
        let returns = simple_returns(series).len();
        match engine.assess(series) {
            Some(stats) => println!(
                "{:<10} {:>7} {:>8} {:>10.4} {:>10} {:>10} {:>10} {:>10}",
                ticker,
                series.len(),
                returns,
                stats.annualized_sd,
                fmt_opt(stats.downside_sd),
                fmt_opt(stats.cvar_at(95.0)),
                fmt_opt(stats.cvar_at(99.0)),
                fmt_opt(stats.cvar_at(99.9)),
            ),
            None => println!(
                "{:<10} {:>7} {:>8} {:>10} {:>10} {:>10} {:>10} {:>10}",
                ticker,
                series.len(),
                returns,
                "-",
                "-",
                "-",
                "-",
                "-"
            ),
        }
    }

    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v))
}

/// Collect price series per ticker without building the full tensor.
fn collect_price_series(text: &str) -> BTreeMap<String, PriceSeries> {
    let mut series: BTreeMap<String, PriceSeries> = BTreeMap::new();
    let mut current: Option<String> = None;

    for record in scan_records(text) {
        if record.key == TICKER_KEY {
            current = Some(record.value.to_string());
            series.entry(record.value.to_string()).or_default();
            continue;
        }
        if let Some(date_part) = record.key.strip_suffix(PRICE_KEY_SUFFIX)
            && let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            && let Ok(price) = record.value.parse::<f64>()
            && let Some(ticker) = &current
            && let Some(entry) = series.get_mut(ticker)
        {
            entry.record(date, price);
        }
    }

    series
}
