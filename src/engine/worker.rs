//! Probe worker threads.
//!
//! # Lifecycle
//! ```text
//! spawned ──probe returns──▶ complete (publish, clear running, notify) ──▶ drop holder
//!                                                                           │
//!                                    cancel requested? ◀────────────────────┘
//!                                      yes → exit
//!                                      no  → parked until cancelled, then exit
//! ```
//!
//! Cancellation is advisory. A worker blocked in the kernel keeps running
//! until the ioctl returns, however long that takes; it then notices the
//! request and exits without parking. Dropping a `Worker` always requests
//! cancellation, so no parked thread outlives its handle.

use std::io;
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::engine::context::AsyncContext;
use crate::probe::TurProbe;

#[derive(Debug, Default)]
struct CancelToken {
    requested: AtomicBool,
}

impl CancelToken {
    fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    fn park_until_requested(&self) {
        while !self.is_requested() {
            thread::park();
        }
    }
}

/// Everything the worker needs to run one probe.
#[derive(Debug)]
pub struct ProbeJob {
    pub probe: TurProbe,
    pub fd: RawFd,
    pub timeout: Duration,
}

/// Handle-side association with a running (or parked) worker.
#[derive(Debug)]
pub struct Worker {
    thread: JoinHandle<()>,
    cancel: Arc<CancelToken>,
}

impl Worker {
    /// Start a worker holding its own reference to `ctx`.
    ///
    /// On failure the reference moved into the thread closure is dropped again.
    pub fn spawn(ctx: Arc<AsyncContext>, job: ProbeJob) -> io::Result<Self> {
        let cancel = Arc::new(CancelToken::default());
        let token = Arc::clone(&cancel);
        let thread = thread::Builder::new()
            .name("tur-checker".to_string())
            .spawn(move || run(ctx, job, token))?;
        Ok(Self { thread, cancel })
    }

    /// True once the thread has fully exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.cancel.requested.store(true, Ordering::Release);
        self.thread.thread().unpark();
    }
}

fn run(ctx: Arc<AsyncContext>, job: ProbeJob, cancel: Arc<CancelToken>) {
    let (state, msgid) = job.probe.run(job.fd, job.timeout, ctx.device());
    if !ctx.complete(state, msgid) {
        tracing::debug!(
            device = ctx.device(),
            %state,
            "TUR worker finished after its cycle timed out"
        );
    }
    drop(ctx);

    cancel.park_until_requested();
}
