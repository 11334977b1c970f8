//! Output injection.
//!
//! The injector runs on the thread that owns the sink. It is the only code
//! that turns results into output events, and it never writes a block for
//! the same identity twice.
//!
//! # Waiting
//!
//! An injection blocks on the handle of the one identity being injected,
//! for at most the configured timeout. The identity is claimed in the
//! tracker before the wait, so a timed-out entry is final: a timeout marker
//! is written and a late result is never injected.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::error::ErrorTag;
use super::handle::PendingHandle;
use super::identity::ResourceIdentity;
use super::registry::ResultRegistry;
use super::render;
use super::result::AnalysisResult;
use super::tracker::{InjectionOutcome, InjectionTracker};
use crate::sink::{EventSink, SinkResult};

/// Bounded waits used by the injector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionTimeouts {
    /// Wait at a reference point
    pub reference: Duration,
    /// Wait per entry during the end-of-document drain
    pub drain: Duration,
}

impl Default for InjectionTimeouts {
    fn default() -> Self {
        Self {
            reference: Duration::from_secs(120),
            drain: Duration::from_secs(60),
        }
    }
}

/// What a reference-point injection did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    /// No registry entry for the identity
    NotScheduled,
    /// The block was already written earlier
    AlreadyInjected,
    /// A block was written
    Written(InjectionOutcome),
}

/// Result of one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub written: usize,
    pub timed_out: usize,
}

/// Writes result blocks into a sink, at most once per identity.
pub struct OutputInjector<'s> {
    registry: &'s ResultRegistry,
    tracker: &'s InjectionTracker,
    timeouts: InjectionTimeouts,
}

impl<'s> OutputInjector<'s> {
    pub fn new(
        registry: &'s ResultRegistry,
        tracker: &'s InjectionTracker,
        timeouts: InjectionTimeouts,
    ) -> Self {
        Self {
            registry,
            tracker,
            timeouts,
        }
    }

    /// Inject the block for `id` if it is scheduled and not yet written.
    pub fn inject_for<S: EventSink + ?Sized>(
        &self,
        sink: &mut S,
        id: &ResourceIdentity,
    ) -> SinkResult<Injection> {
        let handle = match self.registry.get(id) {
            Some(handle) => handle,
            None => {
                debug!(resource = %id, "reference to unscheduled resource");
                return Ok(Injection::NotScheduled);
            }
        };
        if !self.tracker.try_mark_injected(id) {
            debug!(resource = %id, "already injected");
            return Ok(Injection::AlreadyInjected);
        }

        let outcome = self.write_resolved(sink, id, &handle, self.timeouts.reference)?;
        info!(resource = %id, ?outcome, "injected at reference");
        Ok(Injection::Written(outcome))
    }

    /// Inject every registered identity that has not been written yet, in
    /// scheduling order. A second drain writes nothing.
    pub fn drain_remaining<S: EventSink + ?Sized>(&self, sink: &mut S) -> SinkResult<DrainReport> {
        let mut report = DrainReport::default();
        for (id, handle) in self.registry.all_entries() {
            if !self.tracker.try_mark_injected(&id) {
                continue;
            }
            let outcome = self.write_resolved(sink, &id, &handle, self.timeouts.drain)?;
            report.written += 1;
            if outcome == InjectionOutcome::TimedOut {
                report.timed_out += 1;
            }
        }
        if report.written > 0 {
            info!(
                written = report.written,
                timed_out = report.timed_out,
                "drained remaining results"
            );
        }
        Ok(report)
    }

    fn write_resolved<S: EventSink + ?Sized>(
        &self,
        sink: &mut S,
        id: &ResourceIdentity,
        handle: &PendingHandle,
        timeout: Duration,
    ) -> SinkResult<InjectionOutcome> {
        let result = match handle.wait_timeout(timeout) {
            Some(result) => result,
            None => {
                warn!(resource = %id, timeout_secs = timeout.as_secs(), "analysis timed out");
                AnalysisResult::failure(ErrorTag::Timeout(timeout))
            }
        };

        render::write_block(sink, id, &result)?;
        let outcome = result.outcome();
        self.tracker.record_outcome(id, outcome);
        Ok(outcome)
    }
}
