use std::{env, path::Path};

use anyhow::Context;

use crate::command_handlers::handle_command;
use crate::data_backend::open_store;
use crate::data_types::cli_data_types::Command;
use crate::data_types::Backend;

// the binary and the library share the `meal_planner` module path
pub fn logger_init(module_path: &str) {
    pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Info)
        .filter_module(
            module_path,
            if env::var(pretty_env_logger::env_logger::DEFAULT_FILTER_ENV).unwrap_or_default()
                == "debug"
            {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            },
        )
        .init();
}

/// Opens the selected store, runs one command and returns its output.
pub fn run_command(backend: Backend, db_path: &Path, command: Command) -> anyhow::Result<String> {
    let mut store = open_store(backend, db_path)
        .with_context(|| format!("could not open database {}", db_path.display()))?;

    if backend == Backend::Memory {
        log::info!("using in-memory store, nothing will be saved");
    }
    handle_command(store.as_mut(), command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::cli_data_types::PlanCommand;

    #[test]
    fn test_commands_persist_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("planner.sqlite");

        run_command(Backend::Sqlite, &db, Command::Seed).unwrap();
        run_command(
            Backend::Sqlite,
            &db,
            Command::Plan(PlanCommand::Create {
                name: "Sunday".to_string(),
                description: None,
                recipes: vec![],
            }),
        )
        .unwrap();

        let plans = run_command(Backend::Sqlite, &db, Command::Plan(PlanCommand::List)).unwrap();
        assert!(plans.contains("Sunday (0 recipes)"));

        // seeding again finds the recipes from the first run
        let seeded = run_command(Backend::Sqlite, &db, Command::Seed).unwrap();
        assert!(seeded.starts_with("Seeded 0 recipes"));
    }

    #[test]
    fn test_memory_backend_forgets() {
        let db = Path::new("unused.sqlite");
        run_command(Backend::Memory, db, Command::Seed).unwrap();
        let plans = run_command(Backend::Memory, db, Command::Plan(PlanCommand::List)).unwrap();
        assert_eq!(plans, "No meal plans yet.\n");
        assert!(!db.exists());
    }
}
