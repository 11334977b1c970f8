//! Container document parsing.
//!
//! Reads ZIP-based containers (docx, pptx, xlsx, odt, epub, plain zip) and
//! single image files, and renders them as a small XHTML event stream
//! through an [`AnalysisSession`].
//!
//! # Phases
//!
//! 1. **Discovery**: every image entry is read and handed to the session,
//!    so all analyses start before any output is written
//! 2. **Rendering**: entries are emitted in archive order. Images become
//!    `<img>` elements followed by a reference-point injection; text-like
//!    entries become `<div class="entry">` blocks of extracted paragraphs
//!
//! The caller's sink is wrapped in a [`DrainingSink`], so results that were
//! not injected at their reference appear at the end of the body.

pub mod text;

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::analyzer::{
    AnalysisSession, DrainingSink, ResourceHints, ResourceIdentity, ResourceMetadata,
};
use crate::sink::{text_element, Attribute, EventSink, SinkError};

/// Errors that abort a parse.
///
/// Analysis failures never show up here; they are rendered into the output.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),

    #[error("invalid container: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Counts from one parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseReport {
    /// Non-directory entries in the container
    pub entries: usize,
    /// Image entries handed to the session
    pub resources: usize,
    /// Entries rendered as extracted text
    pub text_entries: usize,
}

/// Parser options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Inject results right after their image reference
    pub inline: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self { inline: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Image,
    Text { markup: bool },
    Other,
}

impl EntryKind {
    fn of(name: &str) -> Self {
        if is_image_name(name) {
            return EntryKind::Image;
        }
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "txt" | "md" | "csv" | "json" => EntryKind::Text { markup: false },
            "xml" | "html" | "htm" | "xhtml" => EntryKind::Text { markup: true },
            _ => EntryKind::Other,
        }
    }
}

fn is_image_name(name: &str) -> bool {
    mime_guess::from_path(name)
        .first()
        .map(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .unwrap_or(false)
}

fn file_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Metadata hints for an archive entry.
pub fn entry_metadata(entry_name: &str) -> ResourceMetadata {
    ResourceMetadata::new(
        ResourceHints::new()
            .final_path(format!("embedded:/{}", entry_name))
            .embedded_path(format!("/{}", entry_name))
            .resource_name(file_name(entry_name)),
    )
}

struct Entry {
    index: usize,
    name: String,
    kind: EntryKind,
}

/// Parses container documents into an event sink.
#[derive(Debug, Clone, Default)]
pub struct ContainerParser {
    options: ParserOptions,
}

impl ContainerParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Parse the document at `path`, writing its rendering to `sink`.
    pub fn parse<S: EventSink + ?Sized>(
        &self,
        path: &Path,
        session: &AnalysisSession,
        sink: &mut S,
    ) -> Result<ParseReport, ParseError> {
        let title = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut sink = DrainingSink::new(sink, session);

        let report = if is_image_name(&title) {
            self.parse_image(path, &title, session, &mut sink)?
        } else {
            self.parse_container(path, &title, session, &mut sink)?
        };

        info!(
            entries = report.entries,
            resources = report.resources,
            text_entries = report.text_entries,
            "document rendered"
        );
        Ok(report)
    }

    fn parse_image<S: EventSink>(
        &self,
        path: &Path,
        title: &str,
        session: &AnalysisSession,
        sink: &mut DrainingSink<'_, S>,
    ) -> Result<ParseReport, ParseError> {
        let bytes = std::fs::read(path)?;
        session.schedule_bytes(bytes, &ResourceMetadata::new(ResourceHints::new().resource_name(title)));

        open_document(sink, title)?;
        self.write_image(sink, session, title, title)?;
        close_document(sink)?;

        Ok(ParseReport {
            entries: 1,
            resources: 1,
            text_entries: 0,
        })
    }

    fn parse_container<S: EventSink>(
        &self,
        path: &Path,
        title: &str,
        session: &AnalysisSession,
        sink: &mut DrainingSink<'_, S>,
    ) -> Result<ParseReport, ParseError> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;
        let mut report = ParseReport::default();

        // Discovery
        let mut entries = Vec::new();
        for index in 0..archive.len() {
            let name = match archive.name_for_index(index) {
                Some(name) if !name.ends_with('/') => name.to_string(),
                _ => continue,
            };
            let kind = EntryKind::of(&name);
            if kind == EntryKind::Image {
                let metadata = entry_metadata(&name);
                match archive.by_index(index) {
                    Ok(entry) => {
                        session.on_resource_discovered(entry, &metadata);
                    }
                    Err(err) => {
                        session.on_resource_read_failed(&metadata, err.to_string());
                    }
                }
                report.resources += 1;
            }
            entries.push(Entry { index, name, kind });
        }
        report.entries = entries.len();
        debug!(entries = report.entries, resources = report.resources, "discovery finished");

        // Rendering
        open_document(sink, title)?;
        for entry in &entries {
            match entry.kind {
                EntryKind::Image => {
                    self.write_image(sink, session, &entry.name, file_name(&entry.name))?;
                }
                EntryKind::Text { markup } => {
                    let content = match read_entry(&mut archive, entry.index) {
                        Ok(content) => content,
                        Err(err) => {
                            warn!(entry = %entry.name, error = %err, "skipping unreadable entry");
                            continue;
                        }
                    };
                    write_text_entry(sink, &entry.name, &content, markup)?;
                    report.text_entries += 1;
                }
                EntryKind::Other => {}
            }
        }
        close_document(sink)?;

        Ok(report)
    }

    fn write_image<S: EventSink>(
        &self,
        sink: &mut DrainingSink<'_, S>,
        session: &AnalysisSession,
        entry_name: &str,
        alt: &str,
    ) -> Result<(), SinkError> {
        let src = ResourceIdentity::normalize(entry_name);
        sink.start_element(
            "img",
            &[
                Attribute::new("src", src.as_str()),
                Attribute::new("alt", alt),
            ],
        )?;
        sink.end_element("img")?;

        if self.options.inline {
            session.on_reference_point(sink, &format!("embedded:{}", src))?;
        }
        Ok(())
    }
}

fn read_entry<R: Read + io::Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
) -> Result<String, ParseError> {
    let mut bytes = Vec::new();
    archive.by_index(index)?.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn open_document<S: EventSink + ?Sized>(sink: &mut S, title: &str) -> Result<(), SinkError> {
    sink.start_document()?;
    sink.start_element("html", &[Attribute::new("xmlns", "http://www.w3.org/1999/xhtml")])?;
    sink.start_element("head", &[])?;
    text_element(sink, "title", &[], title)?;
    sink.end_element("head")?;
    sink.start_element("body", &[])
}

fn close_document<S: EventSink + ?Sized>(sink: &mut S) -> Result<(), SinkError> {
    sink.end_element("body")?;
    sink.end_element("html")?;
    sink.end_document()
}

fn write_text_entry<S: EventSink + ?Sized>(
    sink: &mut S,
    name: &str,
    content: &str,
    markup: bool,
) -> Result<(), SinkError> {
    let extracted = if markup {
        text::strip_markup(content)
    } else {
        content.to_string()
    };

    sink.start_element(
        "div",
        &[
            Attribute::new("class", "entry"),
            Attribute::new("data-entry", name),
        ],
    )?;
    text_element(sink, "h2", &[], name)?;
    for paragraph in text::paragraphs(&extracted) {
        text_element(sink, "p", &[], &paragraph)?;
    }
    sink.end_element("div")
}
