//! Challenge signal
//!
//! The upload flows report detected attack patterns through the
//! `ChallengeSignal` trait without depending on whoever consumes them.
//! Reporting is fire-and-forget and never changes the outcome of a request.

use crate::models::ChallengeKind;
use std::collections::HashSet;
use std::sync::RwLock;

/// Observer for detected attack patterns
///
/// `report` evaluates the predicate and, when it holds and the kind has not
/// been reported before, marks the kind reported. Returns whether this call
/// was the one that marked it.
pub trait ChallengeSignal: Send + Sync {
    fn report(&self, kind: ChallengeKind, predicate: &dyn Fn() -> bool) -> bool;

    /// Whether the kind has already been reported
    fn is_reported(&self, kind: ChallengeKind) -> bool;

    /// All kinds reported so far
    fn reported(&self) -> Vec<ChallengeKind>;
}

/// In-process, append-only ledger of reported kinds
#[derive(Debug, Default)]
pub struct ChallengeLedger {
    solved: RwLock<HashSet<ChallengeKind>>,
}

impl ChallengeLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChallengeSignal for ChallengeLedger {
    fn report(&self, kind: ChallengeKind, predicate: &dyn Fn() -> bool) -> bool {
        if !predicate() {
            return false;
        }

        let mut solved = self.solved.write().unwrap_or_else(|e| e.into_inner());
        let newly = solved.insert(kind);
        if newly {
            tracing::info!(challenge = %kind, "Challenge solved");
        }
        newly
    }

    fn is_reported(&self, kind: ChallengeKind) -> bool {
        self.solved
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&kind)
    }

    fn reported(&self) -> Vec<ChallengeKind> {
        let solved = self.solved.read().unwrap_or_else(|e| e.into_inner());
        ChallengeKind::ALL
            .into_iter()
            .filter(|kind| solved.contains(kind))
            .collect()
    }
}

/// No-op implementation for deployments without a challenge consumer
pub struct NoOpChallengeSignal;

impl ChallengeSignal for NoOpChallengeSignal {
    fn report(&self, _kind: ChallengeKind, _predicate: &dyn Fn() -> bool) -> bool {
        false
    }

    fn is_reported(&self, _kind: ChallengeKind) -> bool {
        false
    }

    fn reported(&self) -> Vec<ChallengeKind> {
        Vec::new()
    }
}
