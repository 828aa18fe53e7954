//! Domain primitive types used across the hosttop workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a monitored worker process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcessId(u32);

impl ProcessId {
    /// Wraps a raw process identifier.
    #[must_use]
    pub const fn new(pid: u32) -> Self {
        Self(pid)
    }

    /// Returns the raw process identifier.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a traced worker process.
///
/// A spy moves `Unattached -> Attaching -> Tracing` and ends in one of
/// `Detached`, `Failed` or `Exited`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraceState {
    /// No attach attempted yet.
    Unattached,
    /// Attach request issued, waiting for the attach stop.
    Attaching,
    /// Syscall stops are being intercepted.
    Tracing,
    /// The tracer released the process.
    Detached,
    /// Attach or a trace-control call failed.
    Failed,
    /// The traced process exited.
    Exited,
}

impl fmt::Display for TraceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unattached => write!(f, "unattached"),
            Self::Attaching => write!(f, "attaching"),
            Self::Tracing => write!(f, "tracing"),
            Self::Detached => write!(f, "detached"),
            Self::Failed => write!(f, "failed"),
            Self::Exited => write!(f, "exited"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_display_lowercase() {
        assert_eq!(TraceState::Tracing.to_string(), "tracing");
        assert_eq!(TraceState::Detached.to_string(), "detached");
        assert_eq!(TraceState::Failed.to_string(), "failed");
        assert_eq!(TraceState::Exited.to_string(), "exited");
    }

    #[test]
    fn process_ids_order_numerically() {
        let mut pids = vec![ProcessId::new(30), ProcessId::new(4), ProcessId::new(120)];
        pids.sort();
        assert_eq!(pids, vec![ProcessId::new(4), ProcessId::new(30), ProcessId::new(120)]);
        assert_eq!(pids[0].to_string(), "4");
    }
}
