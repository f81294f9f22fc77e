//! Command line argument parsing
//!
//! Subcommands:
//! - `push`: Create or recreate the component's containers as needed
//! - `check`: Report which containers are missing, stale or in sync
//! - `env init`: Create the environment file for a context
//! - `env set`: Set a value in the environment file
//! - `env view`: Show the environment file

use crate::env;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq)]
pub enum ExecutionMode {
    Push(ComponentConfig),
    Check(ComponentConfig),
    EnvInit { context: PathBuf, name: String },
    EnvSet(EnvSetConfig),
    EnvView { context: PathBuf },
}

#[derive(Debug, PartialEq)]
pub struct ComponentConfig {
    pub manifest: PathBuf,
    pub json: bool,
}

#[derive(Debug, PartialEq)]
pub struct EnvSetConfig {
    pub context: PathBuf,
    pub name: String,
    pub value: String,
    pub force: bool,
}

#[derive(Debug, Parser)]
#[command(name = "devsync")]
#[command(author = "devsync Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Keeps component containers in sync with their declared configuration")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create missing containers and recreate outdated ones
    Push {
        /// Component manifest (defaults to <context>/devsync.toml)
        #[arg(short = 'm', long = "manifest")]
        manifest: Option<PathBuf>,
        /// Context directory
        #[arg(long = "context")]
        context: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long = "json")]
        json: bool,
    },
    /// Show which containers would be created or recreated
    Check {
        /// Component manifest (defaults to <context>/devsync.toml)
        #[arg(short = 'm', long = "manifest")]
        manifest: Option<PathBuf>,
        /// Context directory
        #[arg(long = "context")]
        context: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long = "json")]
        json: bool,
    },
    /// Manage the environment file of a context
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum EnvCommands {
    /// Create the environment file for a component
    Init {
        /// Component name
        name: String,
        /// Context directory
        #[arg(long = "context")]
        context: Option<PathBuf>,
    },
    /// Set an individual value in the environment file
    Set {
        /// Parameter name (name, namespace, debugport)
        name: String,
        /// Parameter value
        value: String,
        /// Don't ask for confirmation, set the value directly
        #[arg(short = 'f', long = "force")]
        force: bool,
        /// Context directory
        #[arg(long = "context")]
        context: Option<PathBuf>,
    },
    /// Show the environment file
    View {
        /// Context directory
        #[arg(long = "context")]
        context: Option<PathBuf>,
    },
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Resolve the subcommand into an execution mode relative to `cwd`.
    pub fn mode(&self, cwd: &Path) -> Result<ExecutionMode, String> {
        let context_dir =
            |context: &Option<PathBuf>| context.clone().unwrap_or_else(|| cwd.to_path_buf());

        match &self.command {
            Some(Commands::Push {
                manifest,
                context,
                json,
            }) => Ok(ExecutionMode::Push(ComponentConfig {
                manifest: resolve_manifest(manifest, &context_dir(context)),
                json: *json,
            })),
            Some(Commands::Check {
                manifest,
                context,
                json,
            }) => Ok(ExecutionMode::Check(ComponentConfig {
                manifest: resolve_manifest(manifest, &context_dir(context)),
                json: *json,
            })),
            Some(Commands::Env { command }) => Ok(match command {
                EnvCommands::Init { name, context } => ExecutionMode::EnvInit {
                    context: context_dir(context),
                    name: name.clone(),
                },
                EnvCommands::Set {
                    name,
                    value,
                    force,
                    context,
                } => ExecutionMode::EnvSet(EnvSetConfig {
                    context: context_dir(context),
                    name: name.clone(),
                    value: value.clone(),
                    force: *force,
                }),
                EnvCommands::View { context } => ExecutionMode::EnvView {
                    context: context_dir(context),
                },
            }),
            None => Err(
                "No command specified. Use 'devsync --help' to see available commands.".to_string(),
            ),
        }
    }
}

fn resolve_manifest(manifest: &Option<PathBuf>, context: &Path) -> PathBuf {
    manifest
        .clone()
        .unwrap_or_else(|| env::manifest_file_path(context))
}
