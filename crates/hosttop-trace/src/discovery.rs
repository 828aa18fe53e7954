//! Worker process discovery.
//!
//! Scans the process table for processes whose command line starts with a
//! marker such as `nginx: worker process`.

use std::collections::BTreeSet;
use std::path::Path;

use hosttop_common::error::{HostTopError, Result};
use hosttop_common::types::ProcessId;

/// Finds worker processes in `/proc`.
///
/// # Errors
///
/// Returns [`HostTopError::Discovery`] if `/proc` cannot be listed and
/// [`HostTopError::NoWorkers`] if nothing matches.
pub fn discover_workers(marker: &str) -> Result<Vec<ProcessId>> {
    let pids = discover_in(Path::new(hosttop_common::constants::PROC_ROOT), marker)?;
    require_workers(pids, marker)
}

/// Lists the pids under `proc_root` whose `cmdline` starts with `marker`.
///
/// Entries that are not numeric, or whose `cmdline` disappears while
/// scanning, are skipped. The result is sorted and free of duplicates.
///
/// # Errors
///
/// Returns [`HostTopError::Discovery`] if `proc_root` cannot be listed.
pub fn discover_in(proc_root: &Path, marker: &str) -> Result<Vec<ProcessId>> {
    let entries = std::fs::read_dir(proc_root).map_err(|e| HostTopError::Discovery {
        path: proc_root.to_path_buf(),
        source: e,
    })?;

    let mut pids = BTreeSet::new();
    for entry in entries.flatten() {
        let Some(pid) = entry.file_name().to_str().and_then(|n| n.parse::<u32>().ok()) else {
            continue;
        };
        let Ok(cmdline) = std::fs::read(entry.path().join("cmdline")) else {
            continue;
        };
        if cmdline.starts_with(marker.as_bytes()) {
            let _ = pids.insert(ProcessId::new(pid));
        }
    }

    tracing::debug!(root = %proc_root.display(), marker, found = pids.len(), "worker scan complete");
    Ok(pids.into_iter().collect())
}

/// Rejects an empty target list; there is nothing to monitor.
///
/// # Errors
///
/// Returns [`HostTopError::NoWorkers`] if `pids` is empty.
pub fn require_workers(pids: Vec<ProcessId>, marker: &str) -> Result<Vec<ProcessId>> {
    if pids.is_empty() {
        return Err(HostTopError::NoWorkers {
            marker: marker.to_owned(),
        });
    }
    Ok(pids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_process(root: &Path, pid: &str, cmdline: &[u8]) {
        let dir = root.join(pid);
        std::fs::create_dir_all(&dir).expect("create pid dir");
        std::fs::write(dir.join("cmdline"), cmdline).expect("write cmdline");
    }

    #[test]
    fn matching_workers_are_found_sorted() {
        let root = tempfile::tempdir().expect("tempdir");
        fake_process(root.path(), "912", b"nginx: worker process\0\0");
        fake_process(root.path(), "90", b"nginx: worker process\0");
        fake_process(root.path(), "89", b"nginx: master process /usr/sbin/nginx\0");
        fake_process(root.path(), "1", b"/sbin/init\0");

        let pids = discover_in(root.path(), "nginx: worker process").expect("scan");
        assert_eq!(pids, vec![ProcessId::new(90), ProcessId::new(912)]);
    }

    #[test]
    fn pids_starting_with_zero_or_nine_are_not_skipped() {
        let root = tempfile::tempdir().expect("tempdir");
        fake_process(root.path(), "9", b"nginx: worker process\0");
        fake_process(root.path(), "1000", b"nginx: worker process\0");

        let pids = discover_in(root.path(), "nginx: worker process").expect("scan");
        assert_eq!(pids, vec![ProcessId::new(9), ProcessId::new(1000)]);
    }

    #[test]
    fn non_numeric_entries_are_ignored() {
        let root = tempfile::tempdir().expect("tempdir");
        fake_process(root.path(), "self", b"nginx: worker process\0");
        std::fs::create_dir_all(root.path().join("sys")).expect("mkdir");
        fake_process(root.path(), "77", b"nginx: worker process\0");

        let pids = discover_in(root.path(), "nginx: worker process").expect("scan");
        assert_eq!(pids, vec![ProcessId::new(77)]);
    }

    #[test]
    fn vanished_process_is_skipped() {
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(root.path().join("500")).expect("mkdir without cmdline");
        fake_process(root.path(), "501", b"nginx: worker process\0");

        let pids = discover_in(root.path(), "nginx: worker process").expect("scan");
        assert_eq!(pids, vec![ProcessId::new(501)]);
    }

    #[test]
    fn unreadable_root_is_a_discovery_error() {
        let root = tempfile::tempdir().expect("tempdir");
        let missing = root.path().join("no-proc-here");
        let err = discover_in(&missing, "nginx").expect_err("root is missing");
        assert!(matches!(err, HostTopError::Discovery { .. }));
    }

    #[test]
    fn empty_result_is_fatal() {
        let err = require_workers(Vec::new(), "nginx: worker process").expect_err("empty");
        assert!(matches!(err, HostTopError::NoWorkers { .. }));
        assert!(require_workers(vec![ProcessId::new(3)], "x").is_ok());
    }
}
