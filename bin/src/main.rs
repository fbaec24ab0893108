//! CLI for the hfmemo valuation pipeline.
//!
//! Loads canonical financial facts and a scenario configuration, runs the
//! Base/Bull/Bear valuation and prints a summary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hfmemo::{
    BalanceInputs, ForecastConfig, HistoricalDrivers, LineItem, Scenario, ScenarioResults,
    StandardizedFact, StatementType, extract_drivers, facts_to_frame, load_config, run_all,
    validate_standard_frame,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "hfmemo")]
#[command(about = "Driver-based forecast and DCF valuation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Value a company from canonical facts
    Value {
        /// JSON array of standardized facts
        #[arg(long)]
        facts: PathBuf,
        /// YAML or JSON scenario configuration (defaults if omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Shares outstanding, for a per-share value
        #[arg(long)]
        shares: Option<f64>,
        /// Print the full result set as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the effective scenario configuration
    Config {
        /// YAML or JSON scenario configuration (defaults if omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List the canonical line items
    LineItems,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,hfmemo=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Value {
            facts,
            config,
            shares,
            json,
        } => value_command(&facts, config.as_deref(), shares, json),
        Commands::Config { config } => show_config(config.as_deref()),
        Commands::LineItems => {
            list_line_items();
            Ok(())
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Everything handed to the memo renderer.
#[derive(Debug, Serialize)]
struct Valuation {
    ticker: Option<String>,
    drivers: HistoricalDrivers,
    config: ForecastConfig,
    balances: BalanceInputs,
    results: ScenarioResults,
}

/// Run the full pipeline for a facts file.
fn run_valuation(
    facts_path: &Path,
    config_path: Option<&Path>,
    shares: Option<f64>,
) -> Result<Valuation> {
    let config = load_config(config_path).context("loading configuration")?;

    let contents = std::fs::read_to_string(facts_path)
        .with_context(|| format!("reading facts from {}", facts_path.display()))?;
    let facts: Vec<StandardizedFact> =
        serde_json::from_str(&contents).context("parsing standardized facts")?;
    let ticker = facts.first().map(|f| f.ticker.clone());

    let table = facts_to_frame(&facts).context("building canonical table")?;
    validate_standard_frame(&table).context("validating canonical table")?;
    info!(rows = table.height(), "loaded standardized facts");

    let drivers = extract_drivers(&table).context("extracting historical drivers")?;
    let balances = BalanceInputs::from_frame(&table).context("reading balance sheet")?;
    let results = run_all(&drivers, &config, balances.cash, balances.debt, shares)
        .context("running scenarios")?;

    Ok(Valuation {
        ticker,
        drivers,
        config,
        balances,
        results,
    })
}

fn value_command(
    facts_path: &Path,
    config_path: Option<&Path>,
    shares: Option<f64>,
    json: bool,
) -> Result<()> {
    let valuation = run_valuation(facts_path, config_path, shares)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&valuation)?);
    } else {
        print_summary(&valuation);
    }
    Ok(())
}

fn print_summary(valuation: &Valuation) {
    let rule = "=".repeat(60);
    println!("{rule}");
    match &valuation.ticker {
        Some(ticker) => println!("VALUATION SUMMARY: {ticker}"),
        None => println!("VALUATION SUMMARY"),
    }
    println!("{rule}");
    println!(
        "History: {} periods, last {}",
        valuation.drivers.len(),
        valuation.drivers.last_period()
    );
    println!(
        "Horizon: {} years | cash {} | debt {}",
        valuation.config.horizon_years(),
        billions(valuation.balances.cash),
        billions(valuation.balances.debt)
    );
    println!();
    println!(
        "{:<8} {:>8} {:>8} {:>14} {:>14} {:>12}",
        "Scenario", "WACC", "g", "EV", "Equity", "Per share"
    );
    for result in valuation.results.iter() {
        let assumptions = valuation.config.scenario(result.scenario);
        let per_share = result
            .equity
            .price_per_share
            .map_or_else(|| "-".to_string(), |p| format!("{p:.2}"));
        println!(
            "{:<8} {:>7.2}% {:>7.2}% {:>14} {:>14} {:>12}",
            scenario_label(result.scenario),
            assumptions.discount_rate() * 100.0,
            assumptions.terminal_growth() * 100.0,
            billions(result.dcf.enterprise_value),
            billions(result.equity.equity_value),
            per_share
        );
    }
    println!("{rule}");
}

const fn scenario_label(scenario: Scenario) -> &'static str {
    match scenario {
        Scenario::Base => "Base",
        Scenario::Bull => "Bull",
        Scenario::Bear => "Bear",
    }
}

fn billions(value: f64) -> String {
    format!("${:.2}B", value / 1e9)
}

fn show_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path).context("loading configuration")?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// List the canonical line items grouped by statement.
fn list_line_items() {
    println!("Canonical line items ({} total)\n", LineItem::ALL.len());
    for statement in StatementType::ALL {
        println!("{statement}:");
        for item in LineItem::ALL.iter().filter(|i| i.statement() == statement) {
            println!("  {} - {}", item, item.label());
        }
        println!();
    }
}
