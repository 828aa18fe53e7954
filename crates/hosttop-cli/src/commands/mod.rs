//! CLI command definitions and dispatch.

pub mod top;
pub mod workers;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use hosttop_common::config::HostTopConfig;

/// Live requests per second for every virtual host of a web server.
#[derive(Parser, Debug)]
#[command(name = hosttop_common::constants::BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// JSON configuration file; flags override its values.
    #[arg(long, global = true, env = "HOSTTOP_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Append logs to this file instead of stderr.
    #[arg(long, global = true, env = "HOSTTOP_LOG_FILE", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Trace the workers and show live requests per second per host.
    Top(top::TopArgs),
    /// List the pids of the worker processes that would be traced.
    Workers(workers::WorkersArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the command
/// fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Top(args) => top::execute(&args, config),
        Command::Workers(args) => workers::execute(&args, &config),
    }
}

/// Reads `path` if given, otherwise starts from the defaults.
fn load_config(path: Option<&Path>) -> anyhow::Result<HostTopConfig> {
    path.map_or_else(
        || Ok(HostTopConfig::default()),
        |path| {
            HostTopConfig::load(path)
                .with_context(|| format!("invalid configuration {}", path.display()))
        },
    )
}
