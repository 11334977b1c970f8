//! vlmweave library
//!
//! Renders container documents through a single ordered event sink while
//! vision-model analyses of their embedded images run on a bounded worker
//! pool. Results are woven back into the output next to the image reference,
//! or in an end-of-body drain, exactly once per resource.

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod document;
pub mod provider;
pub mod sink;

pub use analyzer::{AnalysisSession, ResourceHints, ResourceIdentity, ResourceMetadata, WorkerPool};
pub use config::Config;
pub use document::ContainerParser;
pub use provider::{AnalysisProvider, ProviderKind};
pub use sink::{EventSink, PlainTextWriter, XhtmlWriter};
