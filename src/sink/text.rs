//! Plain-text projection.

use std::io::Write;

use super::{is_block_element, Attribute, ElementStack, EventSink, Projection, SinkResult};

/// Writes only the character data of the event stream.
///
/// Block-level elements start and end lines. Elements marked
/// `data-projection="markup"` are skipped together with their content.
pub struct PlainTextWriter<W: Write> {
    out: W,
    stack: ElementStack,
    /// Whether the last written character was not a newline
    line_open: bool,
}

impl<W: Write> PlainTextWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            stack: ElementStack::default(),
            line_open: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn break_line(&mut self) -> SinkResult<()> {
        if self.line_open {
            self.out.write_all(b"\n")?;
            self.line_open = false;
        }
        Ok(())
    }
}

impl<W: Write> EventSink for PlainTextWriter<W> {
    fn start_document(&mut self) -> SinkResult<()> {
        Ok(())
    }

    fn end_document(&mut self) -> SinkResult<()> {
        self.stack.finish()?;
        self.break_line()?;
        self.out.flush()?;
        Ok(())
    }

    fn start_element(&mut self, name: &str, attrs: &[Attribute]) -> SinkResult<()> {
        let hidden = self
            .stack
            .push(name, Projection::of(attrs) == Some(Projection::Markup));
        if !hidden && is_block_element(name) {
            self.break_line()?;
        }
        Ok(())
    }

    fn end_element(&mut self, name: &str) -> SinkResult<()> {
        let hidden = self.stack.pop(name)?;
        if !hidden && is_block_element(name) {
            self.break_line()?;
        }
        Ok(())
    }

    fn characters(&mut self, text: &str) -> SinkResult<()> {
        if text.is_empty() || self.stack.hidden() {
            return Ok(());
        }
        self.out.write_all(text.as_bytes())?;
        self.line_open = !text.ends_with('\n');
        Ok(())
    }
}
