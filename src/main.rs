//! colmutate - compute columns of a grouped table from a JSON plan

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use colmutate::plan::{MutatePlan, MutateReport, TableDocument};
use log::info;
use std::fs;
use std::path::PathBuf;

/// colmutate - evaluate named column expressions per group
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input table document (JSON)
    #[arg(short, long)]
    table: PathBuf,

    /// Mutate plan document (JSON)
    #[arg(short, long)]
    plan: PathBuf,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let table = TableDocument::load(&args.table)?
        .into_table()
        .with_context(|| format!("Invalid table in {}", args.table.display()))?;
    let plan = MutatePlan::load(&args.plan)?;
    info!(
        "Loaded {} row(s) x {} column(s) and {} expression(s)",
        table.n_rows(),
        table.n_columns(),
        plan.expressions.len()
    );

    let output = plan.apply(&table)?;

    let report = MutateReport::from(&output);
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;

    match &args.output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote result to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
