mod api;
mod config;
mod domain;
mod error;
mod loader;
mod logger;
mod stages;

use clap::{Parser, Subcommand};

use crate::api::lrb::LrbInput;
use crate::api::mrs::MrsInput;
use crate::api::srfs::SrfsInput;
use crate::loader::parser::parse_json_file;

/// Demonstration CLI for the remanufacturing scheduler core. Each subcommand
/// reads one stage's JSON fixture and prints the resulting `*Output` struct
/// as pretty JSON. The real stdin/stdout process transport a caller wraps
/// this in is out of scope here; this binary only proves the pure entry
/// points wire up end to end.
#[derive(Parser)]
#[command(name = "remanufacturing_scheduler", about = "Run one planning stage against a JSON fixture")]
struct Cli {
    #[command(subcommand)]
    stage: Stage,
}

#[derive(Subcommand)]
enum Stage {
    /// Long-range batching
    Lrb {
        #[arg(default_value = "fixtures/lrb_sample.json")]
        path: String,
    },
    /// Mid-range sequencing (genetic algorithm)
    Mrs {
        #[arg(default_value = "fixtures/mrs_sample.json")]
        path: String,
    },
    /// Short-range fine scheduling (harmony search)
    Srfs {
        #[arg(default_value = "fixtures/srfs_sample.json")]
        path: String,
    },
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let cli = Cli::parse();

    match cli.stage {
        Stage::Lrb { path } => {
            log::info!("Loading LRB fixture from '{}'...", path);
            let input: LrbInput = parse_json_file(&path)?;
            let output = stages::lrb::run_lrb(&input);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Stage::Mrs { path } => {
            log::info!("Loading MRS fixture from '{}'...", path);
            let input: MrsInput = parse_json_file(&path)?;
            let output = stages::mrs::run_mrs(&input);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Stage::Srfs { path } => {
            log::info!("Loading SRFS fixture from '{}'...", path);
            let input: SrfsInput = parse_json_file(&path)?;
            let output = stages::srfs::run_srfs(&input);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
