//! `hosttop top`: trace the workers and show live rates per host.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use hosttop_common::config::HostTopConfig;
use hosttop_common::types::ProcessId;
use hosttop_runtime::report::{ReportSink, Reporter};
use hosttop_runtime::spy::SpyOutcome;
use hosttop_runtime::store::CounterStore;
use hosttop_runtime::supervisor::{Fleet, Supervisor};
use hosttop_trace::PtraceInterceptor;
use hosttop_trace::discovery::discover_workers;
use hosttop_trace::registers::default_recv_syscall;
use hosttop_tui::{Dashboard, PlainRenderer, restore_terminal};

use crate::output;

/// Exit status after Ctrl-C, as a shell reports SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Arguments for the `top` command.
#[derive(Args, Debug, Default)]
pub struct TopArgs {
    /// Trace this pid instead of discovering workers. Repeatable.
    #[arg(short, long = "pid", value_name = "PID")]
    pub pids: Vec<u32>,

    /// Command-line prefix identifying a worker process.
    #[arg(long, env = "HOSTTOP_MARKER")]
    pub marker: Option<String>,

    /// Highlight hosts at or above this many requests per second.
    #[arg(long, env = "HOSTTOP_THRESHOLD")]
    pub threshold: Option<u64>,

    /// Syscall number to intercept instead of the platform's recvfrom.
    #[arg(long, env = "HOSTTOP_SYSCALL")]
    pub syscall: Option<u64>,

    /// Refresh interval in milliseconds.
    #[arg(long = "tick-ms", env = "HOSTTOP_TICK_MS")]
    pub tick_ms: Option<u64>,

    /// Track at most this many hosts; the rest are counted as "(other)".
    #[arg(long, env = "HOSTTOP_MAX_HOSTS")]
    pub max_hosts: Option<usize>,

    /// Print a plain ANSI table instead of the full-screen dashboard.
    #[arg(long)]
    pub plain: bool,
}

impl TopArgs {
    /// Overlays the flags that were given on `config` and validates it.
    fn apply(&self, mut config: HostTopConfig) -> anyhow::Result<HostTopConfig> {
        if let Some(marker) = &self.marker {
            config.worker_marker.clone_from(marker);
        }
        if let Some(threshold) = self.threshold {
            config.rps_threshold = threshold;
        }
        if let Some(syscall) = self.syscall {
            config.syscall_nr = Some(syscall);
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_millis = tick_ms;
        }
        if let Some(max_hosts) = self.max_hosts {
            config.max_hosts = Some(max_hosts);
        }
        config.validate()?;
        Ok(config)
    }

    /// Explicit pids, or the workers found under `/proc`.
    fn targets(&self, marker: &str) -> anyhow::Result<Vec<ProcessId>> {
        if self.pids.is_empty() {
            return Ok(discover_workers(marker)?);
        }
        Ok(self.pids.iter().copied().map(ProcessId::new).collect())
    }
}

/// Executes the `top` command.
///
/// Attaches one spy per worker, prints the workers that could not be
/// attached, then renders the report until every spy has finished or
/// the user interrupts.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, no worker is found,
/// no worker could be attached or the terminal cannot be set up.
pub fn execute(args: &TopArgs, config: HostTopConfig) -> anyhow::Result<()> {
    let config = args.apply(config)?;
    let syscall_nr = config
        .syscall_nr
        .or_else(default_recv_syscall)
        .context("no default receive syscall on this platform, pass --syscall")?;
    let pids = args.targets(&config.worker_marker)?;
    tracing::info!(
        workers = pids.len(),
        syscall_nr,
        marker = %config.worker_marker,
        "starting monitor"
    );

    let store = Arc::new(CounterStore::with_max_hosts(config.max_hosts));
    let max_capture = config.max_capture_bytes;
    let fleet = Supervisor::new(Arc::clone(&store)).start(&pids, |pid| {
        PtraceInterceptor::new(pid, syscall_nr, max_capture)
    });
    for failure in fleet.failures() {
        eprintln!("{}", output::format_failure(failure));
    }
    fleet.ensure_attached()?;

    ctrlc::set_handler(|| {
        let _ = restore_terminal();
        std::process::exit(INTERRUPTED_EXIT_CODE);
    })
    .context("failed to install Ctrl-C handler")?;

    let reporter = Reporter::new(
        store,
        config.rps_threshold,
        Duration::from_millis(config.tick_millis),
    );
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to build the reporter runtime")?;

    let outcomes = if args.plain {
        let mut sink = PlainRenderer::new(io::stdout());
        runtime.block_on(monitor(reporter, &mut sink, fleet))?
    } else {
        let mut sink = Dashboard::enter().context("failed to set up the terminal")?;
        runtime.block_on(monitor(reporter, &mut sink, fleet))?
    };

    for outcome in &outcomes {
        eprintln!("{}", output::format_outcome(outcome));
    }
    Ok(())
}

/// Renders reports until every spy has finished.
async fn monitor<S>(
    reporter: Reporter,
    sink: &mut S,
    fleet: Fleet,
) -> anyhow::Result<Vec<SpyOutcome>>
where
    S: ReportSink + ?Sized,
{
    let spies = tokio::task::spawn_blocking(move || fleet.wait());
    tokio::select! {
        outcomes = spies => {
            let outcomes = outcomes.context("spy supervision panicked")?;
            tracing::info!(spies = outcomes.len(), "all spies finished");
            Ok(outcomes)
        }
        () = reporter.run(sink) => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use hosttop_common::error::HostTopError;
    use hosttop_runtime::report::{RenderError, Report};
    use hosttop_trace::{Interceptor, TraceError};

    use super::*;

    #[test]
    fn flags_override_config() {
        let args = TopArgs {
            marker: Some("php-fpm: pool www".to_owned()),
            threshold: Some(5),
            syscall: Some(45),
            tick_ms: Some(250),
            max_hosts: Some(64),
            ..TopArgs::default()
        };
        let config = args.apply(HostTopConfig::default()).unwrap();

        assert_eq!(config.worker_marker, "php-fpm: pool www");
        assert_eq!(config.rps_threshold, 5);
        assert_eq!(config.syscall_nr, Some(45));
        assert_eq!(config.tick_millis, 250);
        assert_eq!(config.max_hosts, Some(64));
    }

    #[test]
    fn absent_flags_keep_config_values() {
        let base = HostTopConfig {
            rps_threshold: 42,
            max_hosts: Some(10),
            ..HostTopConfig::default()
        };
        let config = TopArgs::default().apply(base.clone()).unwrap();
        assert_eq!(config, base);
    }

    #[test]
    fn zero_tick_flag_is_rejected() {
        let args = TopArgs {
            tick_ms: Some(0),
            ..TopArgs::default()
        };
        let err = args.apply(HostTopConfig::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HostTopError>(),
            Some(HostTopError::Config { .. })
        ));
    }

    #[test]
    fn explicit_pids_skip_discovery() {
        let args = TopArgs {
            pids: vec![30, 10],
            ..TopArgs::default()
        };
        let pids = args.targets("no such marker").unwrap();
        assert_eq!(pids, vec![ProcessId::new(30), ProcessId::new(10)]);
    }

    struct OneShot(ProcessId, bool);

    impl Interceptor for OneShot {
        fn pid(&self) -> ProcessId {
            self.0
        }

        fn attach(&mut self) -> Result<(), TraceError> {
            Ok(())
        }

        fn next_capture(&mut self) -> Result<Option<Vec<u8>>, TraceError> {
            if std::mem::replace(&mut self.1, true) {
                return Ok(None);
            }
            Ok(Some(b"GET / HTTP/1.1\r\nHost: one.test\r\n\r\n".to_vec()))
        }

        fn detach(&mut self) {}
    }

    #[derive(Default)]
    struct Discard(usize);

    impl ReportSink for Discard {
        fn render(&mut self, _report: &Report) -> Result<(), RenderError> {
            self.0 += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn monitor_returns_once_spies_finish() {
        let store = Arc::new(CounterStore::new());
        let fleet = Supervisor::new(Arc::clone(&store))
            .start(&[ProcessId::new(1)], |pid| OneShot(pid, false));
        let reporter = Reporter::new(Arc::clone(&store), 100, Duration::from_secs(3600));
        let mut sink = Discard::default();

        let outcomes = monitor(reporter, &mut sink, fleet).await.unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].recorded, 1);
        assert_eq!(store.get("one.test"), Some(1));
        assert_eq!(sink.0, 0);
    }
}
