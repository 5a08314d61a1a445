//! Command-line front end: fetch the configured books and print the fills.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use aggregated_fill::{Aggregator, Allocation, Config, Report, Strategy};
use serde_json::Value;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aggregated-fill")]
#[command(about = "Best sell and buy fills for a quantity across exchange order books")]
#[command(version)]
struct Cli {
    /// Quantity to buy and to sell
    #[arg(short, long, default_value_t = 10.0)]
    quantity: f64,

    /// JSON file listing the exchanges to query
    #[arg(short, long, default_value = "exchanges.json")]
    file: PathBuf,

    /// Use the optimal (knapsack) fill instead of the greedy one
    #[arg(short, long)]
    optimize: bool,

    /// With --optimize, fail a side instead of approximating when the exact
    /// search outgrows its state budget
    #[arg(long)]
    exact: bool,

    /// Per-request timeout in seconds
    #[arg(short, long, default_value_t = 2.0)]
    timeout: f64,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("aggregated_fill=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "run failed");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> aggregated_fill::Result<()> {
    let timeout = Duration::try_from_secs_f64(cli.timeout)
        .map_err(|e| aggregated_fill::Error::Config(format!("invalid timeout: {e}")))?;
    let config = Config::from_file(&cli.file)?
        .with_timeout(timeout)
        .with_grid_fallback(!cli.exact);

    let strategy = if cli.optimize {
        Strategy::Optimal
    } else {
        Strategy::Greedy
    };

    let aggregator = Aggregator::new(config)?;
    let report = aggregator.run(cli.quantity, strategy).await?;

    if cli.json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &Report) {
    for failure in &report.failures {
        eprintln!("{} failed: {}", failure.exchange, failure.error);
    }
    if report.sources.is_empty() {
        eprintln!("No exchange returned a usable book");
    } else {
        let names: Vec<&str> = report.sources.iter().map(|e| e.name()).collect();
        eprintln!("Quotes from: {}", names.join(", "));
    }

    print_side("IF YOU SELL", &report.sell);
    print_side("IF YOU BUY", &report.buy);
}

fn print_side(title: &str, fill: &aggregated_fill::Result<Allocation>) {
    let bar = "*".repeat(35);
    println!("{bar} {title} {bar}");

    let fill = match fill {
        Ok(fill) => fill,
        Err(err) => {
            println!(" Unavailable:\n\t{err}");
            return;
        }
    };
    println!(" Quantity:\n\t{}", fill.filled_quantity);
    println!(" Total Price:\n\t{}", fill.total_value);
    if let Some(average) = fill.average_price() {
        println!(" Average Price:\n\t{average}");
    }
    println!(" Selection:");
    for order in &fill.selection {
        println!("\t{order}");
    }
}

fn print_json(report: &Report) -> aggregated_fill::Result<()> {
    let failures: Vec<_> = report
        .failures
        .iter()
        .map(|f| {
            serde_json::json!({
                "exchange": f.exchange,
                "error": f.error.to_string(),
            })
        })
        .collect();

    let value = serde_json::json!({
        "capacity": report.capacity,
        "sell": side_json(&report.sell)?,
        "buy": side_json(&report.buy)?,
        "sources": report.sources,
        "failures": failures,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn side_json(fill: &aggregated_fill::Result<Allocation>) -> aggregated_fill::Result<Value> {
    Ok(match fill {
        Ok(fill) => serde_json::to_value(fill)?,
        Err(err) => serde_json::json!({ "error": err.to_string() }),
    })
}
