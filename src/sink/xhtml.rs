//! XHTML projection.

use std::borrow::Cow;
use std::io::Write;

use super::{Attribute, ElementStack, EventSink, Projection, SinkResult, PROJECTION_ATTR};

/// Serializes the event stream as XHTML.
///
/// Empty elements are written self-closing. Elements marked
/// `data-projection="text"` are skipped together with their content, and the
/// projection attribute itself is never serialized.
pub struct XhtmlWriter<W: Write> {
    out: W,
    stack: ElementStack,
    /// A start tag has been written without its closing `>`
    tag_open: bool,
}

impl<W: Write> XhtmlWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            stack: ElementStack::default(),
            tag_open: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn close_start_tag(&mut self) -> SinkResult<()> {
        if self.tag_open {
            self.out.write_all(b">")?;
            self.tag_open = false;
        }
        Ok(())
    }
}

impl<W: Write> EventSink for XhtmlWriter<W> {
    fn start_document(&mut self) -> SinkResult<()> {
        self.out
            .write_all(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n")?;
        Ok(())
    }

    fn end_document(&mut self) -> SinkResult<()> {
        self.stack.finish()?;
        self.close_start_tag()?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }

    fn start_element(&mut self, name: &str, attrs: &[Attribute]) -> SinkResult<()> {
        let hidden = self
            .stack
            .push(name, Projection::of(attrs) == Some(Projection::Text));
        if hidden {
            return Ok(());
        }

        self.close_start_tag()?;
        write!(self.out, "<{}", name)?;
        for attr in attrs.iter().filter(|a| a.name != PROJECTION_ATTR) {
            write!(self.out, " {}=\"{}\"", attr.name, escape(&attr.value, true))?;
        }
        self.tag_open = true;
        Ok(())
    }

    fn end_element(&mut self, name: &str) -> SinkResult<()> {
        if self.stack.pop(name)? {
            return Ok(());
        }

        if self.tag_open {
            self.out.write_all(b"/>")?;
            self.tag_open = false;
        } else {
            write!(self.out, "</{}>", name)?;
        }
        Ok(())
    }

    fn characters(&mut self, text: &str) -> SinkResult<()> {
        if text.is_empty() || self.stack.hidden() {
            return Ok(());
        }
        self.close_start_tag()?;
        self.out.write_all(escape(text, false).as_bytes())?;
        Ok(())
    }
}

/// Escape XML special characters; quotes only inside attribute values.
///
/// Control characters that XML 1.0 forbids are dropped.
pub(crate) fn escape(text: &str, in_attribute: bool) -> String {
    let clean: Cow<'_, str> = if text.chars().any(is_forbidden) {
        Cow::Owned(text.chars().filter(|&c| !is_forbidden(c)).collect())
    } else {
        Cow::Borrowed(text)
    };
    let escaped = if in_attribute {
        quick_xml::escape::escape(clean.as_ref())
    } else {
        quick_xml::escape::partial_escape(clean.as_ref())
    };
    escaped.into_owned()
}

fn is_forbidden(c: char) -> bool {
    c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r')
}
