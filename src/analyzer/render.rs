//! Result block formatting.
//!
//! One [`AnalysisResult`] is written as two sibling elements: a plain-text
//! rendering restricted to the text projection, and a structured rendering
//! restricted to the markup projection. Each projection therefore shows the
//! block exactly once.

use super::identity::ResourceIdentity;
use super::result::AnalysisResult;
use super::tracker::InjectionOutcome;
use crate::sink::{text_element, Attribute, EventSink, Projection, SinkResult};

/// Heading of the structured block.
pub const BLOCK_HEADING: &str = "Vision Language Model Analysis";

/// Marker written when there is neither text nor error.
pub const NO_ANALYSIS: &str = "[no analysis]";

fn status(outcome: InjectionOutcome) -> &'static str {
    match outcome {
        InjectionOutcome::Analyzed => "ok",
        InjectionOutcome::Failed => "error",
        InjectionOutcome::TimedOut => "timeout",
        InjectionOutcome::Empty => "empty",
    }
}

/// Lines of `text` that look like list items, with their bullet removed.
///
/// Recognized bullets are `1.`, `1)`, `-` and `*` followed by whitespace.
pub fn list_items(text: &str) -> Vec<String> {
    text.lines().filter_map(strip_bullet).collect()
}

fn strip_bullet(line: &str) -> Option<String> {
    let line = line.trim();
    let rest = if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        rest
    } else {
        let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return None;
        }
        let after = &line[digits..];
        after
            .strip_prefix(". ")
            .or_else(|| after.strip_prefix(") "))?
    };
    let rest = rest.trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Whether the analysis says the image contains text or writing.
pub fn mentions_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("text:") || lower.contains("writing:")
}

/// Whether the analysis names objects, people or animals.
pub fn mentions_objects(text: &str) -> bool {
    let lower = text.to_lowercase();
    ["object", "person", "animal"]
        .iter()
        .any(|word| lower.contains(word))
}

fn attribution(result: &AnalysisResult) -> Option<String> {
    if result.provider.is_none() && result.model.is_none() {
        return None;
    }
    Some(format!(
        "provider={}, model={}",
        result.provider.as_deref().unwrap_or("unknown"),
        result.model.as_deref().unwrap_or("unknown"),
    ))
}

fn body_line(result: &AnalysisResult) -> String {
    match (&result.analysis_text, &result.error_tag) {
        (_, Some(tag)) => format!("[analysis unavailable: {}]", tag),
        (Some(text), None) => text.trim().to_string(),
        (None, None) => NO_ANALYSIS.to_string(),
    }
}

/// Plain-text rendering of a result block.
pub fn render_plain(id: &ResourceIdentity, result: &AnalysisResult) -> String {
    let mut out = format!("=== VLM Analysis for {} ===\n", id);
    out.push_str(&body_line(result));
    out.push('\n');
    if let Some(label) = attribution(result) {
        out.push('[');
        out.push_str(&label);
        out.push_str("]\n");
    }
    out
}

/// Structured rendering of a result block.
pub fn write_markup<S: EventSink + ?Sized>(
    sink: &mut S,
    id: &ResourceIdentity,
    result: &AnalysisResult,
) -> SinkResult<()> {
    let text = result
        .analysis_text
        .as_deref()
        .filter(|_| result.error_tag.is_none());

    let mut attrs = vec![
        Attribute::new("class", "vlm-result"),
        Attribute::new("data-resource", id.as_str()),
        Attribute::new("data-status", status(result.outcome())),
        Projection::Markup.attribute(),
    ];
    if let Some(text) = text {
        if mentions_text(text) {
            attrs.push(Attribute::new("data-mentions-text", "true"));
        }
        if mentions_objects(text) {
            attrs.push(Attribute::new("data-mentions-objects", "true"));
        }
    }

    sink.start_element("div", &attrs)?;
    text_element(sink, "h3", &[], BLOCK_HEADING)?;
    text_element(
        sink,
        "p",
        &[Attribute::new("class", "vlm-image")],
        &format!("image={}", id),
    )?;

    match text {
        Some(text) => write_analysis(sink, text)?,
        None => {
            let class = if result.error_tag.is_some() {
                "vlm-error"
            } else {
                "vlm-empty"
            };
            text_element(
                sink,
                "p",
                &[Attribute::new("class", class)],
                &body_line(result),
            )?;
        }
    }

    if let Some(label) = attribution(result) {
        text_element(
            sink,
            "p",
            &[Attribute::new("class", "vlm-attribution")],
            &label,
        )?;
    }
    sink.end_element("div")
}

/// Prose and list runs of `text` in their original order.
///
/// Consecutive prose lines share one paragraph and consecutive list lines
/// share one `<ul>`; switching between the two closes the open run.
fn write_analysis<S: EventSink + ?Sized>(sink: &mut S, text: &str) -> SinkResult<()> {
    let mut prose: Vec<&str> = Vec::new();
    let mut in_list = false;

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        match strip_bullet(line) {
            Some(item) => {
                flush_prose(sink, &mut prose)?;
                if !in_list {
                    sink.start_element("ul", &[])?;
                    in_list = true;
                }
                text_element(sink, "li", &[], &item)?;
            }
            None => {
                if in_list {
                    sink.end_element("ul")?;
                    in_list = false;
                }
                prose.push(line);
            }
        }
    }

    flush_prose(sink, &mut prose)?;
    if in_list {
        sink.end_element("ul")?;
    }
    Ok(())
}

fn flush_prose<S: EventSink + ?Sized>(sink: &mut S, prose: &mut Vec<&str>) -> SinkResult<()> {
    if prose.is_empty() {
        return Ok(());
    }
    text_element(
        sink,
        "p",
        &[Attribute::new("class", "vlm-analysis")],
        &prose.join("\n"),
    )?;
    prose.clear();
    Ok(())
}

/// Write the complete block into both projections.
pub fn write_block<S: EventSink + ?Sized>(
    sink: &mut S,
    id: &ResourceIdentity,
    result: &AnalysisResult,
) -> SinkResult<()> {
    text_element(
        sink,
        "div",
        &[Projection::Text.attribute()],
        &render_plain(id, result),
    )?;
    write_markup(sink, id, result)
}
