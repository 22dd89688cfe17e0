//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use path_checker::scsi::sense::SenseData;
use path_checker::scsi::{ScsiCommand, ScsiReply, ScsiTransport};

/// One scripted transport answer.
#[derive(Debug, Clone)]
pub enum Step {
    Reply(ScsiReply),
    Errno(i32),
    /// Sleep, then answer.
    Delayed(Duration, ScsiReply),
    /// Block until the gate opens, then answer.
    Gated(Arc<Gate>, ScsiReply),
}

impl Step {
    pub fn good() -> Self {
        Step::Reply(ScsiReply::good())
    }

    pub fn sense(key: u8, asc: u8, ascq: u8) -> Self {
        Step::Reply(ScsiReply::check_condition(
            SenseData::new(key, asc, ascq).to_fixed(),
        ))
    }
}

/// Answers from a queue, then repeats `fallback` forever.
#[derive(Debug)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Step>, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(step: Step) -> Arc<Self> {
        Self::new([], step)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ScsiTransport for ScriptedTransport {
    fn execute(&self, _fd: RawFd, _cmd: &ScsiCommand, _timeout: Duration) -> io::Result<ScsiReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match step {
            Step::Reply(reply) => Ok(reply),
            Step::Errno(errno) => Err(io::Error::from_raw_os_error(errno)),
            Step::Delayed(delay, reply) => {
                thread::sleep(delay);
                Ok(reply)
            }
            Step::Gated(gate, reply) => {
                gate.wait();
                Ok(reply)
            }
        }
    }
}

/// A latch that blocks probes until opened.
#[derive(Debug, Default)]
pub struct Gate {
    open: Mutex<bool>,
    cond: Condvar,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open(&self) {
        *self.open.lock() = true;
        self.cond.notify_all();
    }

    pub fn wait(&self) {
        let mut open = self.open.lock();
        while !*open {
            self.cond.wait(&mut open);
        }
    }
}

/// Poll `f` until it returns `Some` or `limit` elapses.
pub fn poll_until<T>(limit: Duration, mut f: impl FnMut() -> Option<T>) -> Option<T> {
    let end = Instant::now() + limit;
    loop {
        if let Some(value) = f() {
            return Some(value);
        }
        if Instant::now() >= end {
            return None;
        }
        thread::sleep(Duration::from_millis(5));
    }
}
