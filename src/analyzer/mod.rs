//! Concurrent resource analysis and result injection.
//!
//! Embedded resources are analysed on a bounded worker pool while the
//! document keeps rendering on its own thread. Results are injected back
//! into the single ordered output stream, exactly once per resource.
//!
//! # Design
//!
//! Workers publish results into write-once handles; only the rendering
//! thread writes to the sink. The only shared mutable state is the
//! [`ResultRegistry`] (insert-if-absent) and the [`InjectionTracker`]
//! (test-and-set), both scoped to one [`AnalysisSession`].
//!
//! # Module Structure
//!
//! - [`identity`] - stable resource identities from metadata hints
//! - [`worker`] - bounded pool with caller-runs back-pressure
//! - [`handle`] - write-once result handles
//! - [`registry`] - identity to handle map
//! - [`tracker`] - at-most-once injection
//! - [`task`] - provider invocation off the main thread
//! - [`injector`] - near-reference injection and end-of-document drain
//! - [`render`] - result block formatting for both projections
//! - [`session`] - per-document facade used by document parsers
//! - [`decorator`] - sink wrapper that drains at `</body>`

pub mod decorator;
pub mod error;
pub mod handle;
pub mod identity;
pub mod injector;
pub mod registry;
pub mod render;
pub mod result;
pub mod session;
pub mod task;
pub mod tracker;
pub mod worker;

pub use decorator::{DrainingSink, DRAIN_BEGIN, DRAIN_CLASS, DRAIN_END};
pub use error::ErrorTag;
pub use handle::PendingHandle;
pub use identity::{IdentityResolver, ResourceHints, ResourceIdentity};
pub use injector::{DrainReport, Injection, InjectionTimeouts, OutputInjector};
pub use registry::ResultRegistry;
pub use result::AnalysisResult;
pub use session::{
    AnalysisSession, ResourceMetadata, ResourceState, ScheduleOutcome, SessionOptions,
    SessionSummary,
};
pub use task::AnalysisTask;
pub use tracker::{InjectionOutcome, InjectionSummary, InjectionTracker};
pub use worker::{PoolStats, Submission, WorkerConfig, WorkerPool};
