//! Per-document analysis session.
//!
//! A session owns the identity resolver, the result registry and the
//! injection tracker for one document. The worker pool and the provider are
//! shared and may serve many sessions.
//!
//! # Lifecycle
//!
//! 1. The document parser calls [`AnalysisSession::on_resource_discovered`]
//!    for every embedded resource; the bytes are copied and a task is
//!    submitted to the pool
//! 2. While rendering, [`AnalysisSession::on_reference_point`] injects the
//!    block of a referenced resource right where it is referenced
//! 3. [`AnalysisSession::on_document_end`] drains everything not injected yet

use std::fmt;
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use super::error::ErrorTag;
use super::handle::PendingHandle;
use super::identity::{IdentityResolver, ResourceHints, ResourceIdentity};
use super::injector::{DrainReport, Injection, InjectionTimeouts, OutputInjector};
use super::registry::ResultRegistry;
use super::result::AnalysisResult;
use super::task::AnalysisTask;
use super::tracker::{InjectionOutcome, InjectionTracker};
use super::worker::{Submission, WorkerPool};
use crate::provider::AnalysisProvider;
use crate::sink::{EventSink, SinkResult};

/// MIME type assumed when neither metadata nor file name tell.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Options for one session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub timeouts: InjectionTimeouts,
    pub default_mime: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeouts: InjectionTimeouts::default(),
            default_mime: DEFAULT_MIME_TYPE.to_string(),
        }
    }
}

/// Metadata the parser has for a discovered resource.
#[derive(Debug, Clone, Default)]
pub struct ResourceMetadata {
    pub hints: ResourceHints,
    pub content_type: Option<String>,
}

impl ResourceMetadata {
    pub fn new(hints: ResourceHints) -> Self {
        Self {
            hints,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// What happened to a discovered resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// A task was submitted (or already ran inline)
    Scheduled {
        identity: ResourceIdentity,
        submission: Submission,
    },
    /// The bytes could not be read; an error result is registered
    Failed { identity: ResourceIdentity },
    /// The identity was already registered; the first entry is kept
    Duplicate { identity: ResourceIdentity },
}

impl ScheduleOutcome {
    pub fn identity(&self) -> &ResourceIdentity {
        match self {
            ScheduleOutcome::Scheduled { identity, .. }
            | ScheduleOutcome::Failed { identity }
            | ScheduleOutcome::Duplicate { identity } => identity,
        }
    }
}

/// Lifecycle state of one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    Unscheduled,
    Scheduled,
    CompletedOk,
    CompletedError,
    /// The block was written; a wait that expired shows as `Injected(TimedOut)`
    Injected(InjectionOutcome),
}

/// Counters for a finished (or running) session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub scheduled: usize,
    pub duplicates: usize,
    pub ran_inline: usize,
    pub injected: usize,
    pub analyzed: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub empty: usize,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Analyzed {} resource(s): {} ok, {} failed, {} timed out",
            self.scheduled, self.analyzed, self.failed, self.timed_out
        )?;
        if self.empty > 0 {
            write!(f, ", {} empty", self.empty)?;
        }
        if self.duplicates > 0 {
            write!(f, " ({} duplicate reference(s) skipped)", self.duplicates)?;
        }
        Ok(())
    }
}

/// Analysis state for one document.
pub struct AnalysisSession {
    pool: Arc<WorkerPool>,
    provider: Arc<dyn AnalysisProvider>,
    options: SessionOptions,
    resolver: IdentityResolver,
    registry: ResultRegistry,
    tracker: InjectionTracker,
    duplicates: AtomicUsize,
    ran_inline: AtomicUsize,
}

impl AnalysisSession {
    pub fn new(
        pool: Arc<WorkerPool>,
        provider: Arc<dyn AnalysisProvider>,
        options: SessionOptions,
    ) -> Self {
        Self {
            pool,
            provider,
            options,
            resolver: IdentityResolver::new(),
            registry: ResultRegistry::new(),
            tracker: InjectionTracker::new(),
            duplicates: AtomicUsize::new(0),
            ran_inline: AtomicUsize::new(0),
        }
    }

    /// Read a resource and schedule its analysis.
    ///
    /// Never fails: a read error registers an error result instead.
    pub fn on_resource_discovered<R: Read>(
        &self,
        mut stream: R,
        metadata: &ResourceMetadata,
    ) -> ScheduleOutcome {
        let (identity, handle) = match self.register(metadata) {
            Ok(entry) => entry,
            Err(duplicate) => return duplicate,
        };

        let mut bytes = Vec::new();
        match stream.read_to_end(&mut bytes) {
            Ok(_) => self.submit(identity, handle, bytes, metadata),
            Err(err) => self.fail(identity, handle, err.to_string()),
        }
    }

    /// Schedule analysis of bytes the caller already holds.
    pub fn schedule_bytes(&self, bytes: Vec<u8>, metadata: &ResourceMetadata) -> ScheduleOutcome {
        match self.register(metadata) {
            Ok((identity, handle)) => self.submit(identity, handle, bytes, metadata),
            Err(duplicate) => duplicate,
        }
    }

    /// Register a resource whose bytes could not be obtained at all.
    pub fn on_resource_read_failed(
        &self,
        metadata: &ResourceMetadata,
        reason: impl Into<String>,
    ) -> ScheduleOutcome {
        match self.register(metadata) {
            Ok((identity, handle)) => self.fail(identity, handle, reason.into()),
            Err(duplicate) => duplicate,
        }
    }

    /// Inject the block for the resource referenced by `hint`, if any.
    pub fn on_reference_point<S: EventSink + ?Sized>(
        &self,
        sink: &mut S,
        hint: &str,
    ) -> SinkResult<Injection> {
        self.injector()
            .inject_for(sink, &ResourceIdentity::normalize(hint))
    }

    /// Drain all results not injected yet.
    pub fn on_document_end<S: EventSink + ?Sized>(&self, sink: &mut S) -> SinkResult<DrainReport> {
        self.injector().drain_remaining(sink)
    }

    pub fn injector(&self) -> OutputInjector<'_> {
        OutputInjector::new(&self.registry, &self.tracker, self.options.timeouts)
    }

    pub fn state_of(&self, id: &ResourceIdentity) -> ResourceState {
        let handle = match self.registry.get(id) {
            Some(handle) => handle,
            None => return ResourceState::Unscheduled,
        };
        if let Some(outcome) = self.tracker.outcome(id) {
            return ResourceState::Injected(outcome);
        }
        match handle.try_get() {
            None => ResourceState::Scheduled,
            Some(result) if result.error_tag.is_some() => ResourceState::CompletedError,
            Some(_) => ResourceState::CompletedOk,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        let injected = self.tracker.summary();
        SessionSummary {
            scheduled: self.registry.len(),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            ran_inline: self.ran_inline.load(Ordering::Relaxed),
            injected: injected.injected,
            analyzed: injected.analyzed,
            failed: injected.failed,
            timed_out: injected.timed_out,
            empty: injected.empty,
        }
    }

    pub fn registry(&self) -> &ResultRegistry {
        &self.registry
    }

    pub fn tracker(&self) -> &InjectionTracker {
        &self.tracker
    }

    fn register(
        &self,
        metadata: &ResourceMetadata,
    ) -> Result<(ResourceIdentity, PendingHandle), ScheduleOutcome> {
        let identity = self.resolver.resolve(&metadata.hints);
        let handle = PendingHandle::new();
        if self.registry.put_if_absent(identity.clone(), handle.clone()) {
            Ok((identity, handle))
        } else {
            warn!(resource = %identity, "resource discovered twice, keeping first");
            self.duplicates.fetch_add(1, Ordering::Relaxed);
            Err(ScheduleOutcome::Duplicate { identity })
        }
    }

    fn submit(
        &self,
        identity: ResourceIdentity,
        handle: PendingHandle,
        bytes: Vec<u8>,
        metadata: &ResourceMetadata,
    ) -> ScheduleOutcome {
        let mime_type = self.mime_type(metadata);
        info!(resource = %identity, mime = %mime_type, size = bytes.len(), "scheduling analysis");

        let task = AnalysisTask {
            identity: identity.clone(),
            bytes,
            mime_type,
            provider: Arc::clone(&self.provider),
            handle,
        };
        let submission = self.pool.submit(move || task.run());
        if submission == Submission::CallerRan {
            self.ran_inline.fetch_add(1, Ordering::Relaxed);
        }
        ScheduleOutcome::Scheduled {
            identity,
            submission,
        }
    }

    fn fail(
        &self,
        identity: ResourceIdentity,
        handle: PendingHandle,
        reason: String,
    ) -> ScheduleOutcome {
        warn!(resource = %identity, %reason, "failed to read resource");
        handle.complete(AnalysisResult::failure(ErrorTag::ResourceRead(reason)));
        ScheduleOutcome::Failed { identity }
    }

    fn mime_type(&self, metadata: &ResourceMetadata) -> String {
        if let Some(content_type) = metadata.content_type.as_deref() {
            return content_type.to_string();
        }
        metadata
            .hints
            .preferred()
            .and_then(|hint| mime_guess::from_path(hint).first())
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| self.options.default_mime.clone())
    }
}
