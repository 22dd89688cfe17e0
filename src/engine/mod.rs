//! Asynchronous TEST UNIT READY engine.
//!
//! # State Machine
//! ```text
//! Idle ──check──▶ Pending ──worker publishes──▶ Done ──check──▶ Idle
//!                    │
//!                    └──deadline passed, worker still running──▶ Timeout ──▶ Idle
//! ```
//!
//! # Per `check` call
//! - No worker associated: start a cycle (spawn a worker), then wait at most
//!   the poll budget for its result
//! - Worker associated, deadline passed: take `running`; if the worker still
//!   had it, report `Timeout` and abandon the worker, else report its result
//! - Worker associated, still running: `Pending`
//! - Worker associated, finished: report its result and release the worker
//!
//! # Design Decisions
//! - The caller is never blocked longer than the poll budget per call
//! - After a timeout, a context still held by the stray worker is never
//!   reused or waited on; the next cycle gets a fresh context
//! - A worker that completed its cycle no longer touches the context, so the
//!   context is reused even if that worker has not dropped its reference yet
//! - Failing to spawn a thread falls back to probing inline
//! - Abandoned workers are never joined: a thread wedged in an
//!   uninterruptible ioctl stays until the kernel lets it go

pub mod context;
pub mod worker;

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::checker::state::{MsgId, PathState};
use crate::checker::{CheckTarget, CheckerSettings, Strategy};
use crate::observability::metrics;
use crate::probe::TurProbe;
use crate::scsi::ScsiTransport;

use context::AsyncContext;
use worker::{ProbeJob, Worker};

type SpawnFn = fn(Arc<AsyncContext>, ProbeJob) -> io::Result<Worker>;

/// Strategy state of the `tur` checker.
#[derive(Debug)]
pub struct TurChecker {
    device: String,
    probe: TurProbe,
    poll_budget: Duration,
    ctx: Arc<AsyncContext>,
    worker: Option<Worker>,
    deadline: Instant,
    /// The last cycle timed out; its worker may still write to `ctx`.
    timed_out: bool,
    spawn: SpawnFn,
}

impl TurChecker {
    pub fn new(device: String, transport: Arc<dyn ScsiTransport>, settings: CheckerSettings) -> Self {
        Self {
            ctx: AsyncContext::new(device.clone()),
            device,
            probe: TurProbe::new(transport, settings.retries),
            poll_budget: settings.poll_budget,
            worker: None,
            deadline: Instant::now(),
            timed_out: false,
            spawn: Worker::spawn,
        }
    }

    /// True while a worker is associated with the current cycle.
    pub fn has_worker(&self) -> bool {
        self.worker.is_some()
    }

    fn check_async(&mut self, target: &CheckTarget<'_>) -> (PathState, MsgId) {
        if self.worker.is_some() {
            return self.poll_worker();
        }
        self.start_cycle(target)
    }

    fn poll_worker(&mut self) -> (PathState, MsgId) {
        if Instant::now() >= self.deadline {
            // Dropping the worker requests cancellation either way.
            let worker = self.worker.take();
            if self.ctx.clear_running() {
                tracing::debug!(device = %self.device, "TUR checker timed out, cancelling worker");
                metrics::record_timeout(&self.device);
                self.timed_out = true;
                drop(worker);
                return (PathState::Timeout, MsgId::Timeout);
            }
            drop(worker);
            return self.ctx.outcome().into_parts();
        }

        if self.ctx.is_running() {
            return (PathState::Pending, MsgId::Running);
        }
        self.worker = None;
        self.ctx.outcome().into_parts()
    }

    fn start_cycle(&mut self, target: &CheckTarget<'_>) -> (PathState, MsgId) {
        if std::mem::take(&mut self.timed_out) && AsyncContext::holders(&self.ctx) > 1 {
            tracing::warn!(
                device = %self.device,
                holders = AsyncContext::holders(&self.ctx),
                "Timed out TUR worker has not exited, abandoning its context"
            );
            metrics::record_abandoned_context(&self.device);
            self.ctx = AsyncContext::new(self.device.clone());
        }

        self.ctx.begin_cycle();
        self.deadline = Instant::now() + target.timeout;

        let job = ProbeJob {
            probe: self.probe.clone(),
            fd: target.fd,
            timeout: target.timeout,
        };
        match (self.spawn)(Arc::clone(&self.ctx), job) {
            Ok(worker) => self.worker = Some(worker),
            Err(e) => {
                self.ctx.clear_running();
                tracing::warn!(
                    device = %self.device,
                    error = %e,
                    "Failed to start TUR worker, probing synchronously"
                );
                metrics::record_sync_fallback(&self.device);
                return self.probe.run(target.fd, target.timeout, &self.device);
            }
        }

        match self.ctx.wait_for_outcome(self.poll_budget) {
            Some(outcome) => {
                self.worker = None;
                outcome.into_parts()
            }
            None => (PathState::Pending, MsgId::Running),
        }
    }
}

impl Strategy for TurChecker {
    fn check(&mut self, target: &CheckTarget<'_>) -> (PathState, MsgId) {
        if target.sync {
            return self.probe.run(target.fd, target.timeout, &self.device);
        }
        self.check_async(target)
    }
}

impl Drop for TurChecker {
    fn drop(&mut self) {
        if self.worker.is_some() && self.ctx.is_running() {
            tracing::debug!(device = %self.device, "Freeing TUR checker with a worker in flight");
        }
    }
}
