use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tasks", about = concat!("tasks v", env!("CARGO_PKG_VERSION"), " - task documents in a cloud folder"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: ./tasks.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List task documents once and exit
    Ls(QueryArgs),
    /// Print document changes as they happen
    Watch(QueryArgs),
}

#[derive(Args)]
pub struct QueryArgs {
    /// Container directory (default: cloud.container from config)
    pub dir: Option<PathBuf>,
    /// Track documents with this extension
    #[arg(long, conflicts_with = "name")]
    pub extension: Option<String>,
    /// Track the single document with this exact file name
    #[arg(long)]
    pub name: Option<String>,
}
