//! # hosttop-tui
//!
//! Terminal renderers for the live report.
//!
//! - [`PlainRenderer`](plain::PlainRenderer): clears the screen and prints
//!   a tab-separated `RPS | Hostname` table with ANSI highlighting; works
//!   on any terminal and in `watch`-style pipelines.
//! - [`Dashboard`](dashboard::Dashboard): a `ratatui` table on the
//!   alternate screen.
//!
//! Both implement [`ReportSink`](hosttop_runtime::report::ReportSink).

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod dashboard;
pub mod plain;
pub mod ui;

pub use dashboard::{Dashboard, restore_terminal};
pub use plain::PlainRenderer;
