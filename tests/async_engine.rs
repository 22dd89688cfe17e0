//! Asynchronous checker behaviour seen from the polling caller.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use path_checker::scsi::ScsiReply;
use path_checker::{Checker, CheckerKind, MsgId, PathState};

mod common;
use common::{poll_until, Gate, ScriptedTransport, Step};

fn async_checker(transport: Arc<ScriptedTransport>, timeout: Duration) -> Checker {
    let mut checker = Checker::new(CheckerKind::Tur, transport).with_device("/dev/sdr");
    checker.set_fd(11);
    checker.set_async();
    checker.set_timeout(timeout);
    checker.init().unwrap();
    checker
}

#[test]
fn slow_probe_reports_pending_then_result() {
    let transport = ScriptedTransport::always(Step::Delayed(Duration::from_millis(100), ScsiReply::good()));
    let mut checker = async_checker(transport, Duration::from_secs(5));

    assert_eq!(checker.check(), PathState::Pending);
    assert_eq!(checker.msgid(), MsgId::Running);

    let state = poll_until(Duration::from_secs(5), || {
        let state = checker.check();
        (state != PathState::Pending).then_some(state)
    });
    assert_eq!(state, Some(PathState::Up));
    assert_eq!(checker.msgid(), MsgId::Up);
}

#[test]
fn poll_latency_is_bounded_by_poll_budget() {
    let transport = ScriptedTransport::always(Step::Delayed(Duration::from_millis(500), ScsiReply::good()));
    let mut checker = async_checker(transport, Duration::from_secs(30));

    for _ in 0..20 {
        let start = Instant::now();
        let state = checker.check();
        let elapsed = start.elapsed();
        assert!(elapsed < Duration::from_millis(50), "check blocked for {elapsed:?}");
        if state != PathState::Pending {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn timeout_then_fresh_cycle_despite_stuck_worker() {
    let gate = Gate::new();
    let timeout = Duration::from_millis(100);
    // First probe hangs past twice the timeout; later probes answer at once.
    let transport = ScriptedTransport::new(
        [Step::Gated(gate.clone(), ScsiReply::good())],
        Step::good(),
    );
    let mut checker = async_checker(transport.clone(), timeout);

    assert_eq!(checker.check(), PathState::Pending);

    thread::sleep(timeout + Duration::from_millis(20));
    assert_eq!(checker.check(), PathState::Timeout);
    assert_eq!(checker.msgid(), MsgId::Timeout);

    let mut states = vec![checker.check()];
    let result = poll_until(Duration::from_secs(5), || {
        let state = *states.last()?;
        if state != PathState::Pending {
            return Some(state);
        }
        states.push(checker.check());
        None
    });
    assert_eq!(result, Some(PathState::Up));
    assert!(states.iter().all(|s| matches!(s, PathState::Pending | PathState::Up)));
    assert_eq!(transport.calls(), 2);

    gate.open();
}

#[test]
fn repeated_timeouts_never_block_the_caller() {
    let gate = Gate::new();
    let transport = ScriptedTransport::always(Step::Gated(gate.clone(), ScsiReply::good()));
    let timeout = Duration::from_millis(20);
    let mut checker = async_checker(transport.clone(), timeout);

    let mut timeouts = 0;
    for _ in 0..3 {
        let start = Instant::now();
        assert_eq!(checker.check(), PathState::Pending);
        assert!(start.elapsed() < Duration::from_millis(50));

        thread::sleep(timeout + Duration::from_millis(10));
        let start = Instant::now();
        if checker.check() == PathState::Timeout {
            timeouts += 1;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }
    assert_eq!(timeouts, 3);
    // every cycle got its own worker even though none returned
    assert_eq!(poll_until(Duration::from_secs(5), || (transport.calls() == 3).then_some(())), Some(()));

    gate.open();
}

#[test]
fn free_does_not_wait_for_worker() {
    let gate = Gate::new();
    let transport = ScriptedTransport::always(Step::Gated(gate.clone(), ScsiReply::good()));
    let mut checker = async_checker(transport, Duration::from_secs(30));
    assert_eq!(checker.check(), PathState::Pending);

    let start = Instant::now();
    checker.free();
    drop(checker);
    assert!(start.elapsed() < Duration::from_millis(50));

    gate.open();
}

#[test]
fn switching_to_sync_probes_inline() {
    let transport = ScriptedTransport::always(Step::good());
    let mut checker = async_checker(transport.clone(), Duration::from_secs(5));
    checker.set_sync();
    assert_eq!(checker.check(), PathState::Up);
    assert_eq!(transport.calls(), 1);
}
