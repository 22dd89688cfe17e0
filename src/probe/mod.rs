//! Synchronous path probes.
//!
//! # Responsibilities
//! - Issue one SCSI command through a `ScsiTransport`
//! - Classify status and sense data into a `PathState`
//! - Retry transient conditions within a bounded attempt count
//!
//! # Design Decisions
//! - Classification is a pure function of one reply, tested on its own
//! - Retries are immediate: transient conditions clear on the next command
//! - Exhausted retries degrade to `Down`, never to an error

pub mod readsector0;
pub mod tur;

pub use readsector0::Readsector0Checker;
pub use tur::{classify, RetryReason, TurProbe, Verdict};
