//! The trace loop of one worker process.
//!
//! A [`Spy`] owns an [`Interceptor`] for its whole life and is meant to
//! run on a [`PinnedWorker`](hosttop_trace::PinnedWorker). Failures stay
//! inside the spy: a bad sample is dropped, a control failure ends this
//! spy only.

use std::sync::Arc;
use std::sync::mpsc::Sender;

use hosttop_common::types::{ProcessId, TraceState};
use hosttop_http::{HostSource, RawRequest};
use hosttop_trace::{Interceptor, TraceError};

use crate::store::CounterStore;

/// Result of the attach phase, sent back to the supervisor.
#[derive(Debug)]
pub struct AttachReport {
    /// Worker the attach was attempted on.
    pub pid: ProcessId,
    /// `Err` when the worker will not be monitored.
    pub result: Result<(), TraceError>,
}

/// How a spy ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpyOutcome {
    /// Worker that was traced.
    pub pid: ProcessId,
    /// Final state: `Detached`, `Failed` or `Exited`.
    pub state: TraceState,
    /// Receive buffers copied out of the worker.
    pub captured: u64,
    /// Buffers that yielded a host and were counted.
    pub recorded: u64,
}

/// Intercepts receives in one worker and counts the hosts they name.
#[derive(Debug)]
pub struct Spy<I> {
    interceptor: I,
    store: Arc<CounterStore>,
    state: TraceState,
    captured: u64,
    recorded: u64,
}

impl<I: Interceptor> Spy<I> {
    /// Creates an unattached spy.
    #[must_use]
    pub const fn new(interceptor: I, store: Arc<CounterStore>) -> Self {
        Self {
            interceptor,
            store,
            state: TraceState::Unattached,
            captured: 0,
            recorded: 0,
        }
    }

    /// Attaches, reports the attach result on `attached`, then traces
    /// until the worker exits or a control call fails.
    ///
    /// The sender is dropped right after the report so the supervisor's
    /// channel closes once every spy has attached or failed. If nobody
    /// receives the report, the worker is released untraced.
    pub fn run(mut self, attached: Sender<AttachReport>) -> SpyOutcome {
        let pid = self.interceptor.pid();
        self.state = TraceState::Attaching;
        let result = self.interceptor.attach();
        let ok = result.is_ok();
        if let Err(err) = &result {
            tracing::debug!(%pid, error = %err, "attach failed");
            self.interceptor.detach();
            self.state = TraceState::Failed;
        } else {
            self.state = TraceState::Tracing;
        }
        let delivered = attached.send(AttachReport { pid, result }).is_ok();
        drop(attached);
        if ok && !delivered {
            tracing::warn!(%pid, "attach report not received, releasing worker");
            self.interceptor.detach();
            self.state = TraceState::Detached;
        } else if ok {
            self.trace();
        }
        self.outcome()
    }

    fn trace(&mut self) {
        let pid = self.interceptor.pid();
        tracing::info!(%pid, "tracing worker");
        loop {
            match self.interceptor.next_capture() {
                Ok(Some(buf)) => self.record(&buf),
                Ok(None) => {
                    self.state = TraceState::Exited;
                    tracing::info!(%pid, "worker exited, spy stopping");
                    return;
                }
                Err(err) if err.is_sample_error() => {
                    tracing::trace!(%pid, error = %err, "sample dropped");
                }
                Err(err) => {
                    tracing::warn!(%pid, error = %err, "tracing stopped");
                    self.interceptor.detach();
                    self.state = TraceState::Failed;
                    return;
                }
            }
        }
    }

    /// Extracts the host from one captured buffer and counts it.
    /// Unparseable buffers are dropped without noise on the display.
    fn record(&mut self, buf: &[u8]) {
        self.captured += 1;
        match RawRequest::new(buf).host() {
            Ok(host) => {
                self.store.increment(&host);
                self.recorded += 1;
            }
            Err(err) => {
                tracing::trace!(
                    pid = %self.interceptor.pid(),
                    error = %err,
                    len = buf.len(),
                    "not counted"
                );
            }
        }
    }

    fn outcome(&self) -> SpyOutcome {
        SpyOutcome {
            pid: self.interceptor.pid(),
            state: self.state,
            captured: self.captured,
            recorded: self.recorded,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::mpsc;

    use nix::errno::Errno;

    use super::*;

    /// Plays back a fixed sequence of captures.
    struct Scripted {
        pid: ProcessId,
        attach: Option<Errno>,
        script: VecDeque<Result<Option<Vec<u8>>, TraceError>>,
        detached: Arc<std::sync::atomic::AtomicBool>,
    }

    impl Scripted {
        fn new(pid: u32, script: Vec<Result<Option<Vec<u8>>, TraceError>>) -> Self {
            Self {
                pid: ProcessId::new(pid),
                attach: None,
                script: script.into(),
                detached: Arc::default(),
            }
        }
    }

    impl Interceptor for Scripted {
        fn pid(&self) -> ProcessId {
            self.pid
        }

        fn attach(&mut self) -> Result<(), TraceError> {
            match self.attach {
                Some(source) => Err(TraceError::Attach {
                    pid: self.pid,
                    source,
                }),
                None => Ok(()),
            }
        }

        fn next_capture(&mut self) -> Result<Option<Vec<u8>>, TraceError> {
            self.script.pop_front().unwrap_or(Ok(None))
        }

        fn detach(&mut self) {
            self.detached.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    }

    fn request(host: &str) -> Result<Option<Vec<u8>>, TraceError> {
        Ok(Some(format!("GET / HTTP/1.1\r\nHost: {host}\r\n\r\n").into_bytes()))
    }

    #[test]
    fn captured_requests_are_counted_until_exit() {
        let store = Arc::new(CounterStore::new());
        let script = vec![request("a.test"), request("b.test"), request("a.test")];
        let (tx, rx) = mpsc::channel();

        let outcome = Spy::new(Scripted::new(10, script), Arc::clone(&store)).run(tx);

        assert!(rx.recv().expect("attach report").result.is_ok());
        assert_eq!(outcome.state, TraceState::Exited);
        assert_eq!(outcome.captured, 3);
        assert_eq!(outcome.recorded, 3);
        assert_eq!(store.get("a.test"), Some(2));
        assert_eq!(store.get("b.test"), Some(1));
    }

    #[test]
    fn unparseable_samples_are_dropped_silently() {
        let store = Arc::new(CounterStore::new());
        let script = vec![
            Ok(Some(b"HTTP/1.1 200 OK\r\n\r\n".to_vec())),
            Ok(Some(b"GET / HTTP/1.1\r\nAccept: */*\r\n\r\n".to_vec())),
            request("ok.test"),
        ];
        let (tx, _rx) = mpsc::channel();

        let outcome = Spy::new(Scripted::new(11, script), Arc::clone(&store)).run(tx);

        assert_eq!(outcome.captured, 3);
        assert_eq!(outcome.recorded, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn memory_read_failure_keeps_the_loop_running() {
        let store = Arc::new(CounterStore::new());
        let script = vec![
            Err(TraceError::MemoryRead {
                pid: ProcessId::new(12),
                addr: 0x1000,
                len: 64,
                source: Errno::EFAULT,
            }),
            request("after.test"),
        ];
        let (tx, _rx) = mpsc::channel();

        let outcome = Spy::new(Scripted::new(12, script), Arc::clone(&store)).run(tx);

        assert_eq!(outcome.state, TraceState::Exited);
        assert_eq!(store.get("after.test"), Some(1));
    }

    #[test]
    fn control_failure_ends_only_this_spy_and_detaches() {
        let store = Arc::new(CounterStore::new());
        let script = vec![
            request("before.test"),
            Err(TraceError::Control {
                pid: ProcessId::new(13),
                op: "PTRACE_GETREGS",
                source: Errno::EIO,
            }),
            request("never.test"),
        ];
        let interceptor = Scripted::new(13, script);
        let detached = Arc::clone(&interceptor.detached);
        let (tx, _rx) = mpsc::channel();

        let outcome = Spy::new(interceptor, Arc::clone(&store)).run(tx);

        assert_eq!(outcome.state, TraceState::Failed);
        assert!(detached.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(store.get("before.test"), Some(1));
        assert_eq!(store.get("never.test"), None);
    }

    #[test]
    fn unreceived_attach_report_releases_the_worker() {
        let store = Arc::new(CounterStore::new());
        let interceptor = Scripted::new(15, vec![request("x.test")]);
        let detached = Arc::clone(&interceptor.detached);
        let (tx, rx) = mpsc::channel();
        drop(rx);

        let outcome = Spy::new(interceptor, Arc::clone(&store)).run(tx);

        assert_eq!(outcome.state, TraceState::Detached);
        assert!(detached.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(outcome.captured, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn attach_failure_is_reported_and_nothing_is_traced() {
        let store = Arc::new(CounterStore::new());
        let mut interceptor = Scripted::new(14, vec![request("x.test")]);
        interceptor.attach = Some(Errno::EPERM);
        let (tx, rx) = mpsc::channel();

        let spy = Spy::new(interceptor, Arc::clone(&store));
        let outcome = spy.run(tx);

        let report = rx.recv().expect("attach report");
        assert_eq!(report.pid, ProcessId::new(14));
        assert!(matches!(report.result, Err(TraceError::Attach { .. })));
        assert_eq!(outcome.state, TraceState::Failed);
        assert_eq!(outcome.captured, 0);
        assert!(store.is_empty());
    }
}
