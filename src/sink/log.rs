//! In-memory event recording.

use super::{Attribute, EventSink, SinkResult};

/// One recorded output event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    StartDocument,
    EndDocument,
    StartElement { name: String, attrs: Vec<Attribute> },
    EndElement { name: String },
    Characters(String),
}

/// Sink that records every event in order.
///
/// Useful for inspecting a render, or for producing both projections from a
/// single pass with [`EventLog::replay`].
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<OutputEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[OutputEvent] {
        &self.events
    }

    /// All character data, concatenated in order.
    pub fn text(&self) -> String {
        self.events
            .iter()
            .filter_map(|e| match e {
                OutputEvent::Characters(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Count opened elements named `name` whose attribute `attr` equals `value`.
    pub fn count_elements(&self, name: &str, attr: &str, value: &str) -> usize {
        self.events
            .iter()
            .filter(|e| match e {
                OutputEvent::StartElement { name: n, attrs } => {
                    n == name && attrs.iter().any(|a| a.name == attr && a.value == value)
                }
                _ => false,
            })
            .count()
    }

    /// Index of the first event matching `pred`.
    pub fn position(&self, pred: impl Fn(&OutputEvent) -> bool) -> Option<usize> {
        self.events.iter().position(pred)
    }

    /// Feed the recorded events, in order, into another sink.
    pub fn replay<S: EventSink + ?Sized>(&self, sink: &mut S) -> SinkResult<()> {
        for event in &self.events {
            match event {
                OutputEvent::StartDocument => sink.start_document()?,
                OutputEvent::EndDocument => sink.end_document()?,
                OutputEvent::StartElement { name, attrs } => sink.start_element(name, attrs)?,
                OutputEvent::EndElement { name } => sink.end_element(name)?,
                OutputEvent::Characters(text) => sink.characters(text)?,
            }
        }
        Ok(())
    }
}

impl EventSink for EventLog {
    fn start_document(&mut self) -> SinkResult<()> {
        self.events.push(OutputEvent::StartDocument);
        Ok(())
    }

    fn end_document(&mut self) -> SinkResult<()> {
        self.events.push(OutputEvent::EndDocument);
        Ok(())
    }

    fn start_element(&mut self, name: &str, attrs: &[Attribute]) -> SinkResult<()> {
        self.events.push(OutputEvent::StartElement {
            name: name.to_string(),
            attrs: attrs.to_vec(),
        });
        Ok(())
    }

    fn end_element(&mut self, name: &str) -> SinkResult<()> {
        self.events.push(OutputEvent::EndElement {
            name: name.to_string(),
        });
        Ok(())
    }

    fn characters(&mut self, text: &str) -> SinkResult<()> {
        if !text.is_empty() {
            self.events.push(OutputEvent::Characters(text.to_string()));
        }
        Ok(())
    }
}
