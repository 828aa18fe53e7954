//! System-wide constants and defaults.

/// Root of the process table scanned by worker discovery.
pub const PROC_ROOT: &str = "/proc";

/// Command-line prefix identifying an nginx worker process.
pub const DEFAULT_WORKER_MARKER: &str = "nginx: worker process";

/// Requests per second at which a report row is highlighted.
pub const DEFAULT_RPS_THRESHOLD: u64 = 100;

/// Interval between two report refreshes, in milliseconds.
pub const DEFAULT_TICK_MILLIS: u64 = 1000;

/// Report label of the requests for hosts beyond `max_hosts`.
pub const OVERFLOW_LABEL: &str = "(other)";

/// Application name used in report titles and log output.
pub const APP_NAME: &str = "hosttop";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "hosttop";
