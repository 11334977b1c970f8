//! Injection tracking.
//!
//! Guarantees each identity's result block is written at most once and
//! records how each injected block was classified, for the session summary.

use std::collections::HashMap;
use std::sync::Mutex;

use super::handle::lock;
use super::identity::ResourceIdentity;

/// Classification of an injected result block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InjectionOutcome {
    /// Analysis text was written
    Analyzed,
    /// An error marker was written
    Failed,
    /// The wait for the result expired and a timeout marker was written
    TimedOut,
    /// Neither text nor error was available
    Empty,
}

/// Counts of injected blocks by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectionSummary {
    pub injected: usize,
    pub analyzed: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub empty: usize,
}

/// Per-session "already injected" set with an atomic test-and-set.
#[derive(Default)]
pub struct InjectionTracker {
    injected: Mutex<HashMap<ResourceIdentity, Option<InjectionOutcome>>>,
}

impl InjectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the right to inject `id`. True only for the first caller.
    pub fn try_mark_injected(&self, id: &ResourceIdentity) -> bool {
        let mut injected = lock(&self.injected);
        if injected.contains_key(id) {
            return false;
        }
        injected.insert(id.clone(), None);
        true
    }

    /// Record what was written for a claimed identity.
    pub fn record_outcome(&self, id: &ResourceIdentity, outcome: InjectionOutcome) {
        lock(&self.injected).insert(id.clone(), Some(outcome));
    }

    pub fn is_injected(&self, id: &ResourceIdentity) -> bool {
        lock(&self.injected).contains_key(id)
    }

    pub fn outcome(&self, id: &ResourceIdentity) -> Option<InjectionOutcome> {
        lock(&self.injected).get(id).copied().flatten()
    }

    pub fn summary(&self) -> InjectionSummary {
        let injected = lock(&self.injected);
        let mut summary = InjectionSummary {
            injected: injected.len(),
            ..Default::default()
        };
        for outcome in injected.values().flatten() {
            match outcome {
                InjectionOutcome::Analyzed => summary.analyzed += 1,
                InjectionOutcome::Failed => summary.failed += 1,
                InjectionOutcome::TimedOut => summary.timed_out += 1,
                InjectionOutcome::Empty => summary.empty += 1,
            }
        }
        summary
    }
}
