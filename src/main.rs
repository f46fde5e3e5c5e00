//! # PANDA CLI
//!
//! Loads a problem spec and its CSV relations, runs the rewriting engine,
//! and reports one witness relation per output attribute group.
//!
//! ## Usage
//!
//! ```bash
//! panda --spec-dir specs --spec-file query.yaml --tables-dir tables
//!
//! # machine-readable output, witness CSVs written to out/
//! panda --spec-dir specs --spec-file query.yaml --tables-dir tables \
//!       --json --output-dir out
//! ```
//!
//! Exit code is 0 on success and nonzero on any fatal error; the error
//! chain names the failing layer (spec, algebra, proof structure, limits).

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use panda::config::{Config, LoggingConfig};
use panda::engine::{Engine, EngineLimits, Witness};
use panda::schema::Schema;
use panda::spec::load_problem;
use panda::storage::save_table;

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "panda", about = "Degree-feasible witness engine for conjunctive queries")]
struct Cli {
    /// Directory containing the spec document
    #[arg(long)]
    spec_dir: PathBuf,

    /// Spec document file name within the spec directory
    #[arg(long)]
    spec_file: String,

    /// Directory containing the CSV relations named by the spec
    #[arg(long)]
    tables_dir: PathBuf,

    /// Configuration file (defaults to panda.toml + environment)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write each witness relation as a CSV file into this directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Print the witness as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(&path.display().to_string()),
        None => Config::load(),
    }
    .context("loading configuration")?;
    init_logging(&config.logging);

    let problem = load_problem(&cli.spec_dir, &cli.spec_file, &cli.tables_dir)
        .context("loading problem spec")?;

    let engine = Engine::new(EngineLimits::from_config(&config.limits));
    let witness = engine
        .run(&problem.subproblem)
        .context("running rewrite engine")?;

    if cli.json {
        println!("{}", render_json(&problem.schema, &witness));
    } else {
        print_witness(&problem.schema, &witness);
    }

    if let Some(dir) = &cli.output_dir {
        for (mon, table) in &witness {
            let stem = problem.schema.names(mon.attrs_y).join("_");
            let path = dir.join(format!("{stem}.csv"));
            save_table(&path, &problem.schema, table)
                .with_context(|| format!("writing witness {}", path.display()))?;
        }
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    if config.format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn print_witness(schema: &Schema, witness: &Witness) {
    for (mon, table) in witness {
        let columns = schema.names(mon.attrs_y);
        println!("== {} ({} rows)", columns.join(","), table.len());
        for row in table.iter() {
            let cells: Vec<String> = mon
                .attrs_y
                .bits()
                .map(|bit| match row.get(bit) {
                    Some(value) => value.to_string(),
                    None => String::new(),
                })
                .collect();
            println!("{}", cells.join(","));
        }
    }
}

fn render_json(schema: &Schema, witness: &Witness) -> String {
    let groups: Vec<serde_json::Value> = witness
        .iter()
        .map(|(mon, table)| {
            let columns = schema.names(mon.attrs_y);
            let rows: Vec<serde_json::Value> = table
                .iter()
                .map(|row| {
                    mon.attrs_y
                        .bits()
                        .map(|bit| serde_json::to_value(row.get(bit)).unwrap_or_default())
                        .collect::<Vec<_>>()
                        .into()
                })
                .collect();
            serde_json::json!({
                "attributes": columns,
                "rows": rows,
            })
        })
        .collect();
    serde_json::Value::Array(groups).to_string()
}
