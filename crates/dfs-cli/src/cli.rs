use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dfs",
    about = "DFS: minimal file storage service",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the DFS server
    Serve(ServeArgs),
    /// Store a local file
    Put(PutArgs),
    /// Copy a stored file out
    Get(GetArgs),
    /// List stored files
    Ls(LsArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Address to listen on (overrides the config file)
    #[arg(long)]
    pub bind: Option<String>,
    /// Storage root directory (overrides the config file)
    #[arg(long)]
    pub root: Option<PathBuf>,
}

#[derive(Args)]
pub struct PutArgs {
    pub path: PathBuf,
    /// Name to store under (defaults to the file's own name)
    #[arg(short, long)]
    pub name: Option<String>,
    #[arg(long, default_value = "dfs-data")]
    pub root: PathBuf,
}

#[derive(Args)]
pub struct GetArgs {
    pub name: String,
    /// Output path (defaults to the stored name in the current directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[arg(long, default_value = "dfs-data")]
    pub root: PathBuf,
}

#[derive(Args)]
pub struct LsArgs {
    #[arg(long, default_value = "dfs-data")]
    pub root: PathBuf,
}
