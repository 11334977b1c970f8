//! Ordered output event sinks.
//!
//! Rendering produces one stream of structural and text events. A sink
//! consumes that stream in order and is written by exactly one thread; no
//! implementation here is synchronized, and none needs to be `Send`.
//!
//! Two projections of the same stream are provided:
//!
//! - [`XhtmlWriter`] serializes the full markup
//! - [`PlainTextWriter`] keeps character data only
//!
//! An element can be restricted to one projection with the
//! `data-projection` attribute (see [`Projection`]). [`EventLog`] records
//! the raw stream so it can be inspected or replayed into another sink.

mod log;
mod text;
mod xhtml;

pub use log::{EventLog, OutputEvent};
pub use text::PlainTextWriter;
pub use xhtml::XhtmlWriter;

use thiserror::Error;

/// Attribute carrying the projection restriction of an element.
pub const PROJECTION_ATTR: &str = "data-projection";

/// Errors from writing to a sink.
///
/// These are the only fatal errors of a render: they propagate unchanged to
/// whoever drives the document.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("unbalanced markup: expected </{expected}>, found </{found}>")]
    Unbalanced { expected: String, found: String },

    #[error("closing element </{0}> that was never opened")]
    NotOpen(String),

    #[error("document ended with <{0}> still open")]
    Unclosed(String),
}

/// Result type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// A single name/value attribute on a structural marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Which projection an element (and everything inside it) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Rendered by the plain-text projection only
    Text,
    /// Rendered by the markup projection only
    Markup,
}

impl Projection {
    pub fn as_str(self) -> &'static str {
        match self {
            Projection::Text => "text",
            Projection::Markup => "markup",
        }
    }

    /// The attribute that restricts an element to this projection.
    pub fn attribute(self) -> Attribute {
        Attribute::new(PROJECTION_ATTR, self.as_str())
    }

    /// Read the projection restriction from an attribute list.
    pub fn of(attrs: &[Attribute]) -> Option<Projection> {
        attrs
            .iter()
            .find(|a| a.name == PROJECTION_ATTR)
            .and_then(|a| match a.value.as_str() {
                "text" => Some(Projection::Text),
                "markup" => Some(Projection::Markup),
                _ => None,
            })
    }
}

/// Append-only consumer of output events.
///
/// Events arrive in document order from a single writer. There is no random
/// access and no rollback.
pub trait EventSink {
    fn start_document(&mut self) -> SinkResult<()>;

    fn end_document(&mut self) -> SinkResult<()>;

    fn start_element(&mut self, name: &str, attrs: &[Attribute]) -> SinkResult<()>;

    fn end_element(&mut self, name: &str) -> SinkResult<()>;

    fn characters(&mut self, text: &str) -> SinkResult<()>;
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn start_document(&mut self) -> SinkResult<()> {
        (**self).start_document()
    }

    fn end_document(&mut self) -> SinkResult<()> {
        (**self).end_document()
    }

    fn start_element(&mut self, name: &str, attrs: &[Attribute]) -> SinkResult<()> {
        (**self).start_element(name, attrs)
    }

    fn end_element(&mut self, name: &str) -> SinkResult<()> {
        (**self).end_element(name)
    }

    fn characters(&mut self, text: &str) -> SinkResult<()> {
        (**self).characters(text)
    }
}

/// Write `<name attrs>text</name>`. Nothing is written for empty text.
pub fn text_element<S: EventSink + ?Sized>(
    sink: &mut S,
    name: &str,
    attrs: &[Attribute],
    text: &str,
) -> SinkResult<()> {
    if text.is_empty() {
        return Ok(());
    }
    sink.start_element(name, attrs)?;
    sink.characters(text)?;
    sink.end_element(name)
}

/// Open elements of a writer, each flagged hidden when it (or an ancestor)
/// belongs to the other projection.
#[derive(Debug, Default)]
pub(crate) struct ElementStack {
    open: Vec<(String, bool)>,
}

impl ElementStack {
    /// Open `name`; returns whether it is hidden.
    pub(crate) fn push(&mut self, name: &str, hidden_here: bool) -> bool {
        let hidden = hidden_here || self.hidden();
        self.open.push((name.to_string(), hidden));
        hidden
    }

    /// Close `name`; returns whether it was hidden.
    pub(crate) fn pop(&mut self, name: &str) -> SinkResult<bool> {
        match self.open.pop() {
            Some((open, hidden)) if open == name => Ok(hidden),
            Some((open, _)) => Err(SinkError::Unbalanced {
                expected: open,
                found: name.to_string(),
            }),
            None => Err(SinkError::NotOpen(name.to_string())),
        }
    }

    /// Whether content written now is hidden.
    pub(crate) fn hidden(&self) -> bool {
        self.open.last().map(|(_, hidden)| *hidden).unwrap_or(false)
    }

    pub(crate) fn finish(&self) -> SinkResult<()> {
        match self.open.last() {
            Some((name, _)) => Err(SinkError::Unclosed(name.clone())),
            None => Ok(()),
        }
    }
}

/// Elements that end a line in the plain-text projection.
pub(crate) fn is_block_element(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "section"
            | "pre"
            | "li"
            | "ul"
            | "ol"
            | "title"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "tr"
            | "br"
    )
}
