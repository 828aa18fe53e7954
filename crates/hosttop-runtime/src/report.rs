//! Periodic requests-per-second reporting.
//!
//! Every tick the [`Reporter`] bumps the elapsed-seconds counter, takes a
//! [`Snapshot`] of the store and turns it into a [`Report`]: one row per
//! host with `count / elapsed` requests per second (integer division) and
//! a highlight flag for rows at or above the threshold. Rendering is left
//! to a [`ReportSink`].

use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::Duration;

use hosttop_common::constants::OVERFLOW_LABEL;
use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior};

use crate::store::{CounterStore, Snapshot};

/// A failed repaint. Rendering is best-effort; the reporter logs and
/// carries on.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Writing to the terminal failed.
    #[error("terminal write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that can display a [`Report`].
pub trait ReportSink {
    /// Clears the previous report and draws `report` in its place.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the output cannot be written.
    fn render(&mut self, report: &Report) -> Result<(), RenderError>;
}

/// Elapsed ticks and the highlight threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportState {
    elapsed: u64,
    threshold: u64,
}

impl ReportState {
    /// Starts before the first tick, highlighting rows at `threshold` rps.
    #[must_use]
    pub const fn new(threshold: u64) -> Self {
        Self {
            elapsed: 0,
            threshold,
        }
    }

    /// Records one tick and returns the seconds elapsed since reporting
    /// began, which is at least 1.
    pub fn tick(&mut self) -> NonZeroU64 {
        self.elapsed = self.elapsed.saturating_add(1);
        NonZeroU64::new(self.elapsed).unwrap_or(NonZeroU64::MIN)
    }

    /// Requests per second at which rows are highlighted.
    #[must_use]
    pub const fn threshold(&self) -> u64 {
        self.threshold
    }
}

/// Average requests per second, truncated.
#[must_use]
pub const fn rps(count: u64, elapsed: NonZeroU64) -> u64 {
    count / elapsed.get()
}

/// One rendered line of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    /// Host name.
    pub host: String,
    /// Requests counted since startup.
    pub count: u64,
    /// Average requests per second.
    pub rps: u64,
    /// Whether `rps` reached the threshold.
    pub highlighted: bool,
    /// Whether this row sums the hosts beyond the store's bound rather
    /// than naming one host.
    pub overflow: bool,
}

impl ReportRow {
    fn new(
        host: String,
        count: u64,
        elapsed: NonZeroU64,
        threshold: u64,
        overflow: bool,
    ) -> Self {
        let rps = rps(count, elapsed);
        Self {
            host,
            count,
            rps,
            highlighted: rps >= threshold,
            overflow,
        }
    }
}

/// Everything a sink needs to draw one refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Seconds since reporting began.
    pub elapsed: NonZeroU64,
    /// Highlight threshold in requests per second.
    pub threshold: u64,
    /// Requests counted across all hosts.
    pub total: u64,
    /// Rows, highest count first; the overflow row, if any, comes last.
    pub rows: Vec<ReportRow>,
}

impl Report {
    /// Builds the rows for `snapshot` after `elapsed` seconds.
    #[must_use]
    pub fn build(snapshot: &Snapshot, elapsed: NonZeroU64, threshold: u64) -> Self {
        let mut rows: Vec<ReportRow> = snapshot
            .iter()
            .map(|entry| {
                ReportRow::new(entry.host.clone(), entry.count, elapsed, threshold, false)
            })
            .collect();
        if snapshot.overflow() > 0 {
            rows.push(ReportRow::new(
                OVERFLOW_LABEL.to_owned(),
                snapshot.overflow(),
                elapsed,
                threshold,
                true,
            ));
        }
        Self {
            elapsed,
            threshold,
            total: snapshot.total(),
            rows,
        }
    }
}

/// Ticks at a fixed period and renders the store.
#[derive(Debug)]
pub struct Reporter {
    store: Arc<CounterStore>,
    state: ReportState,
    period: Duration,
}

impl Reporter {
    /// Creates a reporter over `store`, ticking every `period`.
    #[must_use]
    pub const fn new(store: Arc<CounterStore>, threshold: u64, period: Duration) -> Self {
        Self {
            store,
            state: ReportState::new(threshold),
            period,
        }
    }

    /// Advances one tick and builds the report for it.
    pub fn tick(&mut self) -> Report {
        let elapsed = self.state.tick();
        Report::build(&self.store.snapshot(), elapsed, self.state.threshold())
    }

    /// Renders a report every period, forever. The first report comes one
    /// period after the call.
    pub async fn run<S>(mut self, sink: &mut S)
    where
        S: ReportSink + ?Sized,
    {
        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            let _ = interval.tick().await;
            let report = self.tick();
            if let Err(err) = sink.render(&report) {
                tracing::debug!(error = %err, "report not rendered");
            }
        }
    }
}
