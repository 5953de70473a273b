use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::cli::commands::{Cli, Commands, QueryArgs};
use crate::cli::output::{changes_json, documents_json, format_changes, format_documents};
use crate::cloud::{CoordinatorState, DirectoryProvider, QueryPredicate, TaskCoordinator};
use crate::io::config_io::{self, ConfigError};
use crate::model::config::TasksConfig;

/// How long `ls` waits for the first gather
const FIRST_RESULTS_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli, config: &TasksConfig) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    match cli.command {
        Commands::Ls(args) => cmd_ls(args, config, json),
        Commands::Watch(args) => cmd_watch(args, config, json),
    }
}

/// Resolve the container directory and predicate from args, falling back to config
fn resolve_query(
    args: QueryArgs,
    config: &TasksConfig,
) -> Result<(PathBuf, QueryPredicate), Box<dyn std::error::Error>> {
    let dir = args
        .dir
        .or_else(|| config.cloud.container.clone())
        .ok_or("no container directory given (pass DIR or set cloud.container)")?;
    let predicate = match (args.extension, args.name) {
        (Some(ext), _) => QueryPredicate::path_extension(&ext),
        (None, Some(name)) => QueryPredicate::last_path_component(&name),
        (None, None) => config_io::query_predicate(&config.cloud)?,
    };
    Ok((dir, predicate))
}

fn start_coordinator(
    dir: PathBuf,
    predicate: QueryPredicate,
    config: &TasksConfig,
) -> TaskCoordinator {
    info!("watching {} for {:?}", dir.display(), predicate);
    let mut coordinator =
        TaskCoordinator::new(predicate, Box::new(DirectoryProvider::new(dir)), || {});
    coordinator.set_coalesce_batches(config.cloud.coalesce_batches);
    coordinator
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_ls(args: QueryArgs, config: &TasksConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (dir, predicate) = resolve_query(args, config)?;
    let mut coordinator = start_coordinator(dir, predicate, config);

    coordinator.wait_and_process(FIRST_RESULTS_TIMEOUT);
    if coordinator.state() != CoordinatorState::Live {
        return Err("timed out waiting for query results".into());
    }

    let docs = coordinator.documents();
    if json {
        println!("{}", serde_json::to_string_pretty(&documents_json(docs))?);
    } else if !docs.is_empty() {
        println!("{}", format_documents(docs));
    }
    coordinator.stop();
    Ok(())
}

fn cmd_watch(
    args: QueryArgs,
    config: &TasksConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (dir, predicate) = resolve_query(args, config)?;
    let mut coordinator = start_coordinator(dir, predicate, config);

    coordinator.add_listener(move |added, removed, updated| {
        if json {
            match serde_json::to_string(&changes_json(added, removed, updated)) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("error: {}", e),
            }
        } else {
            println!("{}", format_changes(added, removed, updated));
        }
    });

    let interval = Duration::from_millis(config.cloud.poll_interval_ms.max(1));
    loop {
        coordinator.wait_and_process(interval);
    }
}

/// Load the config from `--config`, or `./tasks.toml` if present
pub fn load_config(path: Option<&PathBuf>) -> Result<TasksConfig, ConfigError> {
    let default_path = PathBuf::from(config_io::CONFIG_FILE_NAME);
    config_io::read_config(path.unwrap_or(&default_path))
}
