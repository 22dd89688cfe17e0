//! State shared between a polling checker and its worker thread.
//!
//! # Locking
//! - `outcome` is only written and read under its mutex; a completed cycle
//!   is announced by a notify on `done` with the mutex held
//! - `running` is an atomic and is never touched with the mutex held, so a
//!   worker stuck inside the kernel can never keep the mutex from the poller
//! - holders are the `Arc` strong count: the handle side owns one, each
//!   live worker owns one, and the last one to drop frees the context

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::checker::state::{MsgId, PathState};

/// Result slot of one check cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub state: PathState,
    pub msgid: MsgId,
}

impl Outcome {
    fn pending() -> Self {
        Self {
            state: PathState::Pending,
            msgid: MsgId::Running,
        }
    }

    pub fn into_parts(self) -> (PathState, MsgId) {
        (self.state, self.msgid)
    }
}

#[derive(Debug)]
pub struct AsyncContext {
    device: String,
    outcome: Mutex<Outcome>,
    done: Condvar,
    running: AtomicBool,
}

impl AsyncContext {
    pub fn new(device: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            device: device.into(),
            outcome: Mutex::new(Outcome {
                state: PathState::Unchecked,
                msgid: MsgId::None,
            }),
            done: Condvar::new(),
            running: AtomicBool::new(false),
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Number of parties still referencing this context.
    pub fn holders(this: &Arc<Self>) -> usize {
        Arc::strong_count(this)
    }

    /// Mark a new cycle as started. Only valid while no worker holds the context.
    pub fn begin_cycle(&self) {
        *self.outcome.lock() = Outcome::pending();
        self.running.store(true, Ordering::Release);
    }

    /// Store a finished probe result.
    fn publish(&self, state: PathState, msgid: MsgId) {
        *self.outcome.lock() = Outcome { state, msgid };
    }

    /// Worker side of a finished cycle: publish, clear `running`, then wake
    /// any waiting poller. Returns whether the worker won the cycle.
    ///
    /// After this returns `true` the worker never touches the context again,
    /// so the handle may start a new cycle on it even while the worker's
    /// reference is still alive.
    pub fn complete(&self, state: PathState, msgid: MsgId) -> bool {
        self.publish(state, msgid);
        let won = self.clear_running();
        // Taking the lock orders the notify after a waiter's predicate check.
        let _outcome = self.outcome.lock();
        self.done.notify_all();
        won
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Clear `running`, returning whether it was still set.
    ///
    /// Both sides race on this exchange: whoever observes `true` owns the
    /// decision for the cycle (worker: it finished first; poller: it timed
    /// the worker out).
    pub fn clear_running(&self) -> bool {
        self.running.swap(false, Ordering::AcqRel)
    }

    pub fn outcome(&self) -> Outcome {
        *self.outcome.lock()
    }

    /// Wait at most `budget` for the worker to complete the current cycle.
    ///
    /// Only a completed cycle (result published and `running` cleared) counts.
    pub fn wait_for_outcome(&self, budget: Duration) -> Option<Outcome> {
        let deadline = Instant::now() + budget;
        let mut outcome = self.outcome.lock();
        while self.is_running() {
            if self.done.wait_until(&mut outcome, deadline).timed_out() {
                break;
            }
        }
        (!self.is_running() && outcome.state != PathState::Pending).then_some(*outcome)
    }
}
