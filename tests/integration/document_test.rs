//! Container parsing through both writers

use std::sync::Arc;

use vlmweave::analyzer::{DRAIN_BEGIN, DRAIN_END};
use vlmweave::document::{ParseError, ParserOptions};
use vlmweave::{ContainerParser, PlainTextWriter, XhtmlWriter};

use crate::helpers::{sample_document, session_with, timeouts, write_zip, ScriptedProvider, FAKE_PNG};

fn provider() -> Arc<ScriptedProvider> {
    Arc::new(
        ScriptedProvider::new()
            .answer(b"image-a", "A chart.\n- Revenue\n- Costs")
            .answer(b"image-b", "A person holding a sign. Text: OPEN"),
    )
}

fn render_xhtml(path: &std::path::Path, inline: bool) -> String {
    let session = session_with(provider(), 2, timeouts(5_000, 5_000));
    let parser = ContainerParser::new(ParserOptions { inline });
    let mut writer = XhtmlWriter::new(Vec::new());
    parser.parse(path, &session, &mut writer).unwrap();
    String::from_utf8(writer.into_inner()).unwrap()
}

fn render_text(path: &std::path::Path, inline: bool) -> String {
    let session = session_with(provider(), 2, timeouts(5_000, 5_000));
    let parser = ContainerParser::new(ParserOptions { inline });
    let mut writer = PlainTextWriter::new(Vec::new());
    parser.parse(path, &session, &mut writer).unwrap();
    String::from_utf8(writer.into_inner()).unwrap()
}

#[test]
#[cfg_attr(miri, ignore)]
fn xhtml_places_blocks_after_their_images() {
    let (_dir, path) = sample_document();
    let out = render_xhtml(&path, true);

    assert!(out.starts_with("<?xml"));
    assert!(out.contains("<title>sample.zip</title>"));
    assert!(out.contains("<p>First paragraph.</p>"));
    assert!(out.contains("<li>Revenue</li>"));
    assert!(out.contains("data-mentions-text=\"true\""));
    assert!(out.contains("data-mentions-objects=\"true\""));

    let img_a = out.find("src=\"/media/a.png\"").unwrap();
    let block_a = out.find("data-resource=\"/media/a.png\"").unwrap();
    let img_b = out.find("src=\"/media/b.png\"").unwrap();
    assert!(img_a < block_a && block_a < img_b);

    // Text projection only
    assert!(!out.contains("=== VLM Analysis for"));
    assert!(!out.contains(DRAIN_BEGIN));
    assert!(!out.contains("data-projection"));

    // The drain section and the per-result paragraphs use distinct classes
    assert_eq!(out.matches(r#"<section class="vlm-drain"/>"#).count(), 1);
    assert!(!out.contains(r#"<section class="vlm-analysis""#));
}

#[test]
#[cfg_attr(miri, ignore)]
fn text_projection_carries_plain_blocks_and_banners() {
    let (_dir, path) = sample_document();
    let out = render_text(&path, true);

    assert!(out.contains("=== VLM Analysis for /media/a.png ==="));
    assert!(out.contains("[provider=scripted, model=test-model]"));
    assert!(out.contains(DRAIN_BEGIN));
    assert!(out.contains(DRAIN_END));
    assert!(!out.contains('<'));
    assert!(!out.contains("Vision Language Model Analysis"));

    // Inline injection leaves the drain section empty
    let begin = out.find(DRAIN_BEGIN).unwrap();
    let end = out.find(DRAIN_END).unwrap();
    assert!(!out[begin..end].contains("=== VLM Analysis for"));
}

#[test]
#[cfg_attr(miri, ignore)]
fn without_inline_everything_lands_in_the_drain() {
    let (_dir, path) = sample_document();
    let out = render_text(&path, false);

    let begin = out.find(DRAIN_BEGIN).unwrap();
    let a = out.find("=== VLM Analysis for /media/a.png ===").unwrap();
    let b = out.find("=== VLM Analysis for /media/b.png ===").unwrap();
    assert!(begin < a && a < b);
    assert_eq!(out.matches("=== VLM Analysis for").count(), 2);
}

#[test]
#[cfg_attr(miri, ignore)]
fn single_image_file_is_its_own_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photo.png");
    std::fs::write(&path, FAKE_PNG).unwrap();

    let out = render_text(&path, true);
    assert!(out.contains("=== VLM Analysis for /photo.png ==="));
    assert_eq!(out.matches("=== VLM Analysis for").count(), 1);
}

#[test]
#[cfg_attr(miri, ignore)]
fn each_image_is_analysed_once() {
    let (_dir, path) = sample_document();
    let provider = provider();
    let session = session_with(provider.clone(), 2, timeouts(5_000, 5_000));
    let mut writer = XhtmlWriter::new(Vec::new());
    let report = ContainerParser::default()
        .parse(&path, &session, &mut writer)
        .unwrap();

    assert_eq!(report.entries, 3);
    assert_eq!(report.resources, 2);
    assert_eq!(report.text_entries, 1);
    assert_eq!(provider.calls(), 2);
    assert_eq!(session.summary().injected, 2);
}

#[test]
#[cfg_attr(miri, ignore)]
fn markup_entries_are_stripped() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_zip(
        dir.path(),
        "doc.docx",
        &[(
            "word/document.xml",
            b"<w:document><w:p><w:t>Hello &amp; welcome</w:t></w:p></w:document>",
        )],
    );
    let out = render_xhtml(&path, true);
    assert!(out.contains("Hello &amp; welcome"));
    assert!(!out.contains("w:t"));
}

#[test]
fn corrupt_container_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.zip");
    std::fs::write(&path, b"not a zip archive").unwrap();

    let session = session_with(Arc::new(ScriptedProvider::new()), 1, timeouts(100, 100));
    let mut writer = XhtmlWriter::new(Vec::new());
    let err = ContainerParser::default()
        .parse(&path, &session, &mut writer)
        .unwrap_err();
    assert!(matches!(err, ParseError::Zip(_)));
}
