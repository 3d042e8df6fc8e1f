use meal_planner::constants::{DB_ENV, DEFAULT_DB};
use meal_planner::data_types::cli_data_types::Command;
use meal_planner::data_types::Backend;
use meal_planner::shared_main::{logger_init, run_command};

use clap::Parser;
use log::log_enabled;
use std::{path::PathBuf, process::exit};

/// Recipes, meal plans and the shopping lists they add up to.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// SQLite database file
    #[arg(long, env = DB_ENV, default_value = DEFAULT_DB)]
    db: PathBuf,
    /// Keep everything in memory for this run, nothing is saved
    #[arg(long)]
    in_memory: bool,
    /// enable verbose logging (mostly performance metrics){n}[SETS env: RUST_LOG=debug]
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

fn main() {
    let args = Args::parse();

    if args.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }

    logger_init(module_path!());

    if log_enabled!(log::Level::Debug) {
        log::debug!("db: {}, in memory: {}", args.db.display(), args.in_memory);
    }

    let backend = if args.in_memory {
        Backend::Memory
    } else {
        Backend::Sqlite
    };

    match run_command(backend, &args.db, args.command) {
        Ok(output) => print!("{}", output),
        Err(e) => {
            log::error!("{:#}", e);
            exit(1);
        }
    }
}
