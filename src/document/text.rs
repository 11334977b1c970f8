//! Text extraction for text-like container entries.

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Tags whose end terminates a line. Namespace prefixes (`w:p`, `text:p`)
/// are ignored when matching.
const LINE_ENDING_TAGS: &[&str] = &[
    "p", "br", "div", "li", "tr", "title", "h1", "h2", "h3", "h4", "h5", "h6", "para",
];

/// Elements whose content is never readable text.
const SKIPPED_TAGS: &[&str] = &["script", "style"];

/// Remove markup tags, keeping character data.
///
/// Closing block tags (and `<br/>`) become newlines. CDATA sections are kept
/// verbatim and `script`/`style` bodies are dropped. Extraction stops at the
/// first syntax error, keeping whatever text came before it.
pub fn strip_markup(input: &str) -> String {
    let mut reader = Reader::from_str(input);
    let config = reader.config_mut();
    config.trim_text_start = false;
    config.trim_text_end = false;
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut out = String::with_capacity(input.len() / 2);
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name(e.local_name().as_ref());
                if SKIPPED_TAGS.contains(&name.as_str()) {
                    skip_depth += 1;
                } else if name == "br" && skip_depth == 0 {
                    // HTML-style void element without a closing tag
                    out.push('\n');
                }
            }
            Ok(Event::End(e)) => {
                let name = local_name(e.local_name().as_ref());
                if SKIPPED_TAGS.contains(&name.as_str()) {
                    skip_depth = skip_depth.saturating_sub(1);
                } else if skip_depth == 0 && name != "br" && LINE_ENDING_TAGS.contains(&name.as_str()) {
                    out.push('\n');
                }
            }
            Ok(Event::Empty(e)) => {
                let name = local_name(e.local_name().as_ref());
                if skip_depth == 0 && LINE_ENDING_TAGS.contains(&name.as_str()) {
                    out.push('\n');
                }
            }
            Ok(Event::Text(e)) if skip_depth == 0 => {
                match e.unescape_with(html_entity) {
                    Ok(text) => out.push_str(&text),
                    // Unknown entity: keep the run as written
                    Err(_) => out.push_str(&String::from_utf8_lossy(&e)),
                }
            }
            Ok(Event::CData(e)) if skip_depth == 0 => {
                out.push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
    }
    out
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

/// The predefined XML entities plus a few that show up in HTML entries.
fn html_entity(name: &str) -> Option<&'static str> {
    resolve_predefined_entity(name).or(match name {
        "nbsp" => Some(" "),
        "mdash" => Some("-"),
        "hellip" => Some("..."),
        _ => None,
    })
}

/// Non-empty lines of `text` with inner whitespace collapsed.
pub fn paragraphs(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}
