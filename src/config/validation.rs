//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check checker names against the registry
//! - Validate value ranges (timeouts > 0, poll budget below timeout)
//! - Detect duplicate paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitorConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::checker::lookup;
use crate::config::schema::MonitorConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown checker '{name}' ({context})")]
    UnknownChecker { name: String, context: String },

    #[error("checker.{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("checker.poll_budget_ms ({budget_ms}) must be below the timeout ({timeout_ms} ms)")]
    PollBudgetTooLarge { budget_ms: u64, timeout_ms: u64 },

    #[error("duplicate path name '{0}'")]
    DuplicatePath(String),

    #[error("path '{0}' has an empty device")]
    EmptyDevice(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let checker = &config.checker;

    if lookup(&checker.name).is_err() {
        errors.push(ValidationError::UnknownChecker {
            name: checker.name.clone(),
            context: "checker.name".to_string(),
        });
    }

    for (field, value) in [
        ("timeout_secs", checker.timeout_secs),
        ("retries", u64::from(checker.retries)),
        ("poll_budget_ms", checker.poll_budget_ms),
        ("interval_secs", checker.interval_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    let timeout_ms = checker.timeout_secs.saturating_mul(1000);
    if checker.timeout_secs > 0 && checker.poll_budget_ms >= timeout_ms {
        errors.push(ValidationError::PollBudgetTooLarge {
            budget_ms: checker.poll_budget_ms,
            timeout_ms,
        });
    }

    let mut seen = HashSet::new();
    for path in &config.paths {
        if !seen.insert(path.name.as_str()) {
            errors.push(ValidationError::DuplicatePath(path.name.clone()));
        }
        if path.device.trim().is_empty() {
            errors.push(ValidationError::EmptyDevice(path.name.clone()));
        }
        if let Some(name) = &path.checker {
            if lookup(name).is_err() {
                errors.push(ValidationError::UnknownChecker {
                    name: name.clone(),
                    context: format!("path '{}'", path.name),
                });
            }
        }
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(obs.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
