//! Drain-at-body-end sink decorator.

use tracing::debug;

use super::injector::DrainReport;
use super::session::AnalysisSession;
use crate::sink::{text_element, Attribute, EventSink, Projection, SinkResult};

pub const DRAIN_BEGIN: &str = "=== VLM ANALYSIS (begin) ===";
pub const DRAIN_END: &str = "=== VLM ANALYSIS (end) ===";
/// Class of the `<section>` holding drained blocks.
pub const DRAIN_CLASS: &str = "vlm-drain";

/// Forwards events to `inner` and drains the session into it once.
///
/// The drain happens just before the first `</body>`, or at
/// `end_document` when the stream has no body element. The drained blocks
/// are wrapped in a `<section class="vlm-drain">` with begin and end
/// banners that only the plain-text projection shows.
pub struct DrainingSink<'s, S: EventSink> {
    inner: S,
    session: &'s AnalysisSession,
    report: Option<DrainReport>,
}

impl<'s, S: EventSink> DrainingSink<'s, S> {
    pub fn new(inner: S, session: &'s AnalysisSession) -> Self {
        Self {
            inner,
            session,
            report: None,
        }
    }

    /// Report of the drain, once it has happened.
    pub fn report(&self) -> Option<DrainReport> {
        self.report
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn drain(&mut self) -> SinkResult<()> {
        if self.report.is_some() {
            return Ok(());
        }
        let banner = [Projection::Text.attribute()];

        self.inner
            .start_element("section", &[Attribute::new("class", DRAIN_CLASS)])?;
        text_element(&mut self.inner, "div", &banner, DRAIN_BEGIN)?;
        let report = self.session.on_document_end(&mut self.inner)?;
        text_element(&mut self.inner, "div", &banner, DRAIN_END)?;
        self.inner.end_element("section")?;

        debug!(written = report.written, "end-of-body drain finished");
        self.report = Some(report);
        Ok(())
    }
}

impl<S: EventSink> EventSink for DrainingSink<'_, S> {
    fn start_document(&mut self) -> SinkResult<()> {
        self.inner.start_document()
    }

    fn end_document(&mut self) -> SinkResult<()> {
        self.drain()?;
        self.inner.end_document()
    }

    fn start_element(&mut self, name: &str, attrs: &[Attribute]) -> SinkResult<()> {
        self.inner.start_element(name, attrs)
    }

    fn end_element(&mut self, name: &str) -> SinkResult<()> {
        if name.eq_ignore_ascii_case("body") {
            self.drain()?;
        }
        self.inner.end_element(name)
    }

    fn characters(&mut self, text: &str) -> SinkResult<()> {
        self.inner.characters(text)
    }
}
