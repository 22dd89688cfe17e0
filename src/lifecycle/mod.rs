//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → monitor loop leaves its ticker → checkers dropped (freed)
//! ```
//!
//! # Design Decisions
//! - Freeing checkers never blocks, so shutdown is bounded even with
//!   workers stuck in the kernel

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
