//! Registered probe strategies.

use serde::Serialize;

use crate::checker::{CheckerError, Strategy, StrategyParams};
use crate::engine::TurChecker;
use crate::probe::Readsector0Checker;

/// The closed set of strategies a checker can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckerKind {
    /// TEST UNIT READY, synchronous or asynchronous.
    Tur,
    /// READ(10) of block 0, synchronous only.
    Readsector0,
}

/// Every registered strategy, in lookup order.
pub const REGISTERED: &[CheckerKind] = &[CheckerKind::Tur, CheckerKind::Readsector0];

/// Resolve a strategy by its configuration name.
pub fn lookup(name: &str) -> Result<CheckerKind, CheckerError> {
    REGISTERED
        .iter()
        .copied()
        .find(|kind| kind.name() == name)
        .ok_or_else(|| CheckerError::NotFound(name.to_string()))
}

impl CheckerKind {
    pub fn name(self) -> &'static str {
        match self {
            CheckerKind::Tur => "tur",
            CheckerKind::Readsector0 => "readsector0",
        }
    }

    pub fn supports_async(self) -> bool {
        matches!(self, CheckerKind::Tur)
    }

    /// Allocate strategy-private state.
    pub(crate) fn init(self, params: StrategyParams) -> Result<Box<dyn Strategy>, CheckerError> {
        let strategy: Box<dyn Strategy> = match self {
            CheckerKind::Tur => Box::new(TurChecker::new(
                params.device,
                params.transport,
                params.settings,
            )),
            CheckerKind::Readsector0 => Box::new(Readsector0Checker::new(
                params.transport,
                params.settings.retries,
            )),
        };
        Ok(strategy)
    }
}

impl std::fmt::Display for CheckerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_names() {
        assert_eq!(lookup("tur"), Ok(CheckerKind::Tur));
        assert_eq!(lookup("readsector0"), Ok(CheckerKind::Readsector0));
    }

    #[test]
    fn lookup_unknown_name() {
        assert_eq!(lookup("directio"), Err(CheckerError::NotFound("directio".into())));
        assert_eq!(lookup("TUR"), Err(CheckerError::NotFound("TUR".into())));
    }

    #[test]
    fn only_tur_runs_async() {
        assert!(CheckerKind::Tur.supports_async());
        assert!(!CheckerKind::Readsector0.supports_async());
    }
}
