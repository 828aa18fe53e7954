//! `hosttop workers`: list the processes `top` would trace.

use clap::Args;
use hosttop_common::config::HostTopConfig;
use hosttop_trace::discovery::discover_workers;

/// Arguments for the `workers` command.
#[derive(Args, Debug)]
pub struct WorkersArgs {
    /// Command-line prefix identifying a worker process.
    #[arg(long, env = "HOSTTOP_MARKER")]
    pub marker: Option<String>,

    /// Print the pids as a JSON array.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `workers` command.
///
/// # Errors
///
/// Returns an error if `/proc` cannot be scanned or no worker matches.
pub fn execute(args: &WorkersArgs, config: &HostTopConfig) -> anyhow::Result<()> {
    let marker = args.marker.as_deref().unwrap_or(&config.worker_marker);
    let pids = discover_workers(marker)?;
    tracing::debug!(marker, count = pids.len(), "workers discovered");

    if args.json {
        println!("{}", serde_json::to_string(&pids)?);
    } else {
        for pid in &pids {
            println!("{pid}");
        }
    }
    Ok(())
}
