//! # hosttop-runtime
//!
//! Aggregation and scheduling for hosttop.
//!
//! - [`CounterStore`](store::CounterStore): per-host request counts shared
//!   by every spy (writers) and the reporter (reader).
//! - [`Spy`](spy::Spy): the trace loop of one worker, run on a pinned
//!   thread; turns intercepted buffers into counter increments.
//! - [`Supervisor`](supervisor::Supervisor): starts one spy per worker and
//!   collects attach results before the report takes over the terminal.
//! - [`Reporter`](report::Reporter): ticks, snapshots the store and hands a
//!   [`Report`](report::Report) to a [`ReportSink`](report::ReportSink).

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod report;
pub mod spy;
pub mod store;
pub mod supervisor;
