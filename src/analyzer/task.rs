//! Analysis task execution.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::error::ErrorTag;
use super::handle::PendingHandle;
use super::identity::ResourceIdentity;
use super::result::AnalysisResult;
use crate::provider::AnalysisProvider;

/// Snapshot of one resource, ready to be analysed off the main thread.
///
/// The bytes are owned by the task; nothing here borrows from the document
/// being rendered.
pub struct AnalysisTask {
    pub identity: ResourceIdentity,
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub provider: Arc<dyn AnalysisProvider>,
    pub handle: PendingHandle,
}

impl AnalysisTask {
    /// Call the provider and resolve the handle.
    ///
    /// The handle is resolved exactly once whatever the provider does,
    /// including panicking.
    pub fn run(self) {
        let started = Instant::now();
        let provider = Arc::clone(&self.provider);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            provider.analyze(&self.bytes, &self.mime_type)
        }));

        let result = match outcome {
            Ok(Ok(analysis)) if analysis.text.trim().is_empty() => {
                debug!(resource = %self.identity, "provider returned no text");
                AnalysisResult::empty()
            }
            Ok(Ok(analysis)) => {
                info!(
                    resource = %self.identity,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "analysis completed"
                );
                AnalysisResult::success(analysis)
            }
            Ok(Err(err)) => {
                warn!(resource = %self.identity, error = %err, "analysis failed");
                AnalysisResult::failure(ErrorTag::from(&err))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(resource = %self.identity, panic = %message, "provider panicked");
                AnalysisResult::failure(ErrorTag::analysis("panic", message))
            }
        }
        .attributed(
            Some(provider.name().to_string()),
            provider.model().map(str::to_string),
        );

        if !self.handle.complete(result) {
            debug!(resource = %self.identity, "handle already resolved, result discarded");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
