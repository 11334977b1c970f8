//! Write-once result handles.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::result::AnalysisResult;

/// Lock a mutex, recovering the data if a panicking thread poisoned it.
///
/// Every critical section in this module leaves its data consistent, so a
/// poisoned lock carries no torn state.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Slot {
    value: Mutex<Option<AnalysisResult>>,
    ready: Condvar,
}

/// Write-once, read-many handle for one [`AnalysisResult`].
///
/// Clones share the same slot. The first `complete` wins; readers block
/// until a value is present and may read it any number of times.
#[derive(Clone)]
pub struct PendingHandle {
    slot: Arc<Slot>,
}

impl PendingHandle {
    /// Create an unresolved handle.
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Slot {
                value: Mutex::new(None),
                ready: Condvar::new(),
            }),
        }
    }

    /// Create a handle that is already resolved.
    pub fn completed(result: AnalysisResult) -> Self {
        let handle = Self::new();
        handle.complete(result);
        handle
    }

    /// Resolve the handle. Returns false if it was already resolved, in
    /// which case `result` is discarded.
    pub fn complete(&self, result: AnalysisResult) -> bool {
        let mut value = lock(&self.slot.value);
        if value.is_some() {
            return false;
        }
        *value = Some(result);
        self.slot.ready.notify_all();
        true
    }

    pub fn is_complete(&self) -> bool {
        lock(&self.slot.value).is_some()
    }

    /// The result, if already available.
    pub fn try_get(&self) -> Option<AnalysisResult> {
        lock(&self.slot.value).clone()
    }

    /// Block until resolved.
    pub fn wait(&self) -> AnalysisResult {
        let mut value = lock(&self.slot.value);
        loop {
            if let Some(result) = value.as_ref() {
                return result.clone();
            }
            value = self
                .slot
                .ready
                .wait(value)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until resolved or `timeout` elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<AnalysisResult> {
        let value = lock(&self.slot.value);
        let (value, _) = self
            .slot
            .ready
            .wait_timeout_while(value, timeout, |v| v.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        value.clone()
    }
}

impl Default for PendingHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PendingHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingHandle")
            .field("complete", &self.is_complete())
            .finish()
    }
}
