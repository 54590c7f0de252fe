//! skudb CLI: item catalog front end.
//!
//! Two modes:
//! - **Single command**: `skudb [flags] COMMAND`, run it and exit
//! - **REPL mode**: `skudb [flags]`, interactive prompt (if stdin is a TTY)
//! - **Pipe mode**: `echo "add spoon" | skudb`, line-by-line from stdin

mod commands;
mod format;
mod parse;
mod repl;
mod state;

use std::io::IsTerminal;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use skudb_catalog::{CatalogConfig, ItemCatalog, ItemDb};
use skudb_engine::Database;
use tracing::Level;

use commands::build_cli;
use format::{format_error, format_output, OutputMode};
use parse::matches_to_action;
use state::SessionState;

fn main() {
    let matches = build_cli().get_matches();

    init_tracing(matches.get_flag("debug"));

    let output_mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let (store, db) = match open_catalog(&matches) {
        Ok(opened) => opened,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    let timeout = matches.get_one::<u64>("timeout").map(|ms| Duration::from_millis(*ms));
    let state = SessionState::new(db, timeout);

    let exit_code = if matches.subcommand().is_some() {
        run_single(&matches, &state, output_mode)
    } else if std::io::stdin().is_terminal() {
        repl::run_repl(&state, output_mode)
    } else {
        repl::run_pipe(&state, output_mode)
    };

    // process::exit skips destructors, so flush the WAL explicitly
    if let Err(e) = store.shutdown() {
        eprintln!("Failed to shut down database: {}", e);
        process::exit(1);
    }
    process::exit(exit_code);
}

fn init_tracing(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_catalog(matches: &clap::ArgMatches) -> Result<(Arc<Database>, Arc<dyn ItemDb>), String> {
    let store = match matches.get_one::<String>("db") {
        Some(dir) => Database::open(dir).map_err(|e| format!("Failed to open database: {}", e))?,
        None => Database::ephemeral(),
    };

    let mut config = CatalogConfig::default();
    if let Some(data) = matches.get_one::<String>("data") {
        config = config.with_data_collection(data.as_str());
    }
    if let Some(util) = matches.get_one::<String>("util") {
        config = config.with_util_collection(util.as_str());
    }

    let store = Arc::new(store);
    let catalog = ItemCatalog::open(Arc::clone(&store), config)
        .map_err(|e| format!("Failed to open catalog: {}", e))?;
    Ok((store, Arc::new(catalog)))
}

fn run_single(matches: &clap::ArgMatches, state: &SessionState, mode: OutputMode) -> i32 {
    let action = match matches_to_action(matches) {
        Ok(Some(action)) => action,
        Ok(None) => return 0,
        Err(e) => {
            eprintln!("(error) {}", e);
            return 1;
        }
    };
    match state.execute(action) {
        Ok(output) => {
            println!("{}", format_output(&output, mode));
            0
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, mode));
            1
        }
    }
}
