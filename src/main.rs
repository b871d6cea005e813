//! Indexed settlement CLI
//!
//! Runs claim settlements against the bundled index snapshot, resolves index
//! variations and looks up statutory minimums.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use indexed_settlement::{
    adjust_amount, load_scenarios, resolve, IndexKind, IndexStore, MinimumCategory, ResolutionStore, ScenarioRunner,
    SettlementResult, DEFAULT_INDICES_PATH, DEFAULT_RESOLUTIONS_PATH,
};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "settle", about = "Indexed interest accrual and payment settlement")]
#[command(version)]
struct Cli {
    /// Directory holding one CSV per index dataset
    #[arg(long, env = "INDICES_PATH", default_value = DEFAULT_INDICES_PATH)]
    indices: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Settle one or more scenarios and print the audit trail
    Simulate {
        /// Scenario JSON (object or array)
        file: PathBuf,

        /// History CSV output
        #[arg(short, long, default_value = "settlement_history.csv")]
        output: PathBuf,
    },

    /// Settle many scenarios in parallel and print totals
    Batch {
        /// Scenario JSON array
        file: PathBuf,

        /// Write all results as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Index variation between two dates
    Resolve {
        #[arg(long, default_value = "activa")]
        index: IndexKind,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },

    /// Statutory minimum in force at a date, optionally brought forward
    Minimum {
        /// Category label, e.g. 14B or "Art. 14.2.B"
        #[arg(long)]
        category: MinimumCategory,
        #[arg(long)]
        date: NaiveDate,

        /// Update the minimum to this date by `--index`
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, default_value = "activa")]
        index: IndexKind,
        #[arg(long)]
        capitalize: bool,

        #[arg(long, env = "RESOLUTIONS_PATH", default_value = DEFAULT_RESOLUTIONS_PATH)]
        resolutions: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate { file, output } => simulate(&cli.indices, &file, &output),
        Commands::Batch { file, json } => batch(&cli.indices, &file, json.as_deref()),
        Commands::Resolve { index, from, to } => {
            let store = load_store(&cli.indices)?;
            let variation = resolve(&store, index, from, to)?;
            print!("{} {} -> {}: {:.6}%", index, from, to, variation.percent);
            match variation.dataset {
                Some(dataset) => println!(" ({} dataset)", dataset.as_str()),
                None => println!(),
            }
            Ok(())
        }
        Commands::Minimum {
            category,
            date,
            to,
            index,
            capitalize,
            resolutions,
        } => minimum(&cli.indices, &resolutions, category, date, to, index, capitalize),
    }
}

fn load_store(dir: &Path) -> Result<IndexStore> {
    IndexStore::load_from(dir).with_context(|| format!("loading indices from {}", dir.display()))
}

fn simulate(indices: &Path, file: &Path, output: &Path) -> Result<()> {
    let runner = ScenarioRunner::with_store(load_store(indices)?);
    let scenarios = load_scenarios(file).with_context(|| format!("reading {}", file.display()))?;
    if scenarios.is_empty() {
        bail!("{} holds no scenarios", file.display());
    }

    let mut csv = csv::Writer::from_path(output).with_context(|| format!("creating {}", output.display()))?;
    csv.write_record(HISTORY_HEADER)?;

    for scenario in &scenarios {
        let result = runner.run(scenario)?;
        print_result(&scenario.name, &result);
        write_history(&mut csv, &scenario.name, &result)?;
    }
    csv.flush()?;

    println!("\nHistory written to: {}", output.display());
    Ok(())
}

const HISTORY_HEADER: [&str; 8] = [
    "Scenario",
    "Date",
    "Entry",
    "Amount",
    "Principal",
    "AccruedInterest",
    "OverdueInterest",
    "Total",
];

/// One CSV row per history entry; the writer quotes names holding commas or quotes
fn write_history<W: Write>(csv: &mut csv::Writer<W>, name: &str, result: &SettlementResult) -> csv::Result<()> {
    for entry in &result.history {
        csv.write_record([
            name.to_string(),
            entry.date.to_string(),
            entry.event.label().to_string(),
            format!("{:.2}", entry.event.amount()),
            format!("{:.2}", entry.balance.principal),
            format!("{:.2}", entry.balance.accrued_interest),
            format!("{:.2}", entry.balance.overdue_interest),
            format!("{:.2}", entry.balance.total()),
        ])?;
    }
    Ok(())
}

fn print_result(name: &str, result: &SettlementResult) {
    println!("Scenario: {} ({} through {})", name, result.index, result.horizon);
    println!(
        "{:>10} {:<30} {:>16} {:>16} {:>16} {:>16}",
        "Date", "Entry", "Amount", "Principal", "Accrued", "Overdue"
    );
    println!("{}", "-".repeat(110));

    for entry in &result.history {
        println!(
            "{:>10} {:<30} {:>16.2} {:>16.2} {:>16.2} {:>16.2}",
            entry.date,
            entry.event.label(),
            entry.event.amount(),
            entry.balance.principal,
            entry.balance.accrued_interest,
            entry.balance.overdue_interest,
        );
    }

    let pending: Vec<String> = result
        .tranches
        .iter()
        .filter(|t| t.activated_on.is_none())
        .map(|t| t.sequence_id.to_string())
        .collect();
    if !pending.is_empty() {
        println!("Tranches starting after the valuation date: {}", pending.join(", "));
    }

    let summary = result.summary();
    println!("\nSummary:");
    println!("  Interest accrued:     {:.2}", summary.total_interest_accrued);
    println!("  Capitalized:          {:.2}", summary.total_capitalized);
    println!("  Paid overdue interest: {:.2}", summary.paid_overdue_interest);
    println!("  Paid accrued interest: {:.2}", summary.paid_accrued_interest);
    println!("  Paid principal:       {:.2}", summary.paid_principal);
    if summary.leftover > Decimal::ZERO {
        println!("  Payment leftover:     {:.2}", summary.leftover);
    }
    println!("  Principal:            {:.2}", summary.final_principal);
    println!("  Accrued interest:     {:.2}", summary.final_accrued_interest);
    println!("  Overdue interest:     {:.2}", summary.final_overdue_interest);
    println!("  Total owed:           {:.2}\n", summary.final_total);
}

fn batch(indices: &Path, file: &Path, json: Option<&Path>) -> Result<()> {
    let runner = ScenarioRunner::with_store(load_store(indices)?);
    let scenarios = load_scenarios(file).with_context(|| format!("reading {}", file.display()))?;

    let start = Instant::now();
    let results = runner.run_batch(&scenarios);
    println!("Settled {} scenarios in {:?}", scenarios.len(), start.elapsed());

    println!("{:<30} {:>10} {:>16} {:>16}", "Scenario", "Horizon", "Interest", "Total");
    println!("{}", "-".repeat(75));
    let mut failures = 0;
    for (scenario, result) in scenarios.iter().zip(&results) {
        match result {
            Ok(result) => {
                let summary = result.summary();
                println!(
                    "{:<30} {:>10} {:>16.2} {:>16.2}",
                    scenario.name, result.horizon, summary.total_interest_accrued, summary.final_total
                );
            }
            Err(e) => {
                failures += 1;
                println!("{:<30} FAILED: {}", scenario.name, e);
            }
        }
    }

    if let Some(path) = json {
        let ok: Vec<&SettlementResult> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        let out = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(out, &ok)?;
        println!("Results written to: {}", path.display());
    }

    if failures > 0 {
        log::warn!("{} of {} scenarios failed", failures, scenarios.len());
    }
    Ok(())
}

fn minimum(
    indices: &Path,
    resolutions: &Path,
    category: MinimumCategory,
    date: NaiveDate,
    to: Option<NaiveDate>,
    index: IndexKind,
    capitalize: bool,
) -> Result<()> {
    let table = ResolutionStore::load_from(resolutions)?;
    let Some(hit) = table.lookup(category, date) else {
        bail!("no {} minimum published for {}", category, date);
    };

    println!("{} on {}: {:.2}", category, date, hit.amount);
    println!("  {} ({} to {})", hit.resolution, hit.from, hit.to);
    if let Some(url) = &hit.url {
        println!("  {}", url);
    }

    if let Some(to) = to {
        let store = load_store(indices)?;
        let adjusted = adjust_amount(&store, index, hit.amount, date, to, capitalize)?;
        if adjusted.applied {
            println!(
                "Updated to {} by {} ({:.6}%): {:.2}",
                to,
                index,
                adjusted.rate.unwrap_or_default(),
                adjusted.comparison_value
            );
            if !capitalize {
                println!("  Base kept at {:.2}, interest {:.2}", adjusted.carried_base, adjusted.uncapitalized_interest);
            }
        } else {
            println!("No update: {} is not after {}", to, date);
        }
    }

    Ok(())
}
