//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! probes, engine, monitor produce:
//!     → logging.rs (structured log events: retries, cancellations,
//!       abandoned contexts, state transitions)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Telemetry is write-only: it never blocks and never changes control flow
//! - No process-wide state beyond the subscriber and recorder the daemon installs

pub mod logging;
pub mod metrics;
