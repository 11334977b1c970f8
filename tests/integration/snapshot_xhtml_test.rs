//! XHTML output snapshots

use std::sync::Arc;

use vlmweave::{ContainerParser, XhtmlWriter};

use crate::helpers::{session_with, timeouts, write_zip, ScriptedProvider};

fn render(entries: &[(&str, &[u8])], provider: ScriptedProvider) -> String {
    let dir = tempfile::tempdir().unwrap();
    let path = write_zip(dir.path(), "doc.zip", entries);
    let session = session_with(Arc::new(provider), 1, timeouts(5_000, 5_000));
    let mut writer = XhtmlWriter::new(Vec::new());
    ContainerParser::default()
        .parse(&path, &session, &mut writer)
        .unwrap();
    String::from_utf8(writer.into_inner()).unwrap()
}

#[test]
#[cfg_attr(miri, ignore)]
fn snapshot_single_image_block() {
    let out = render(
        &[("pic.png", b"cat")],
        ScriptedProvider::new().answer(b"cat", "A cat.\n- whiskers"),
    );
    insta::assert_snapshot!(out.trim_end(), @r#"
    <?xml version="1.0" encoding="UTF-8"?>
    <html xmlns="http://www.w3.org/1999/xhtml"><head><title>doc.zip</title></head><body><img src="/pic.png" alt="pic.png"/><div class="vlm-result" data-resource="/pic.png" data-status="ok"><h3>Vision Language Model Analysis</h3><p class="vlm-image">image=/pic.png</p><p class="vlm-analysis">A cat.</p><ul><li>whiskers</li></ul><p class="vlm-attribution">provider=scripted, model=test-model</p></div><section class="vlm-drain"/></body></html>
    "#);
}

#[test]
#[cfg_attr(miri, ignore)]
fn snapshot_failed_block() {
    let out = render(&[("x.gif", b"bad")], ScriptedProvider::new().fail_on(b"bad"));
    insta::assert_snapshot!(out.trim_end(), @r#"
    <?xml version="1.0" encoding="UTF-8"?>
    <html xmlns="http://www.w3.org/1999/xhtml"><head><title>doc.zip</title></head><body><img src="/x.gif" alt="x.gif"/><div class="vlm-result" data-resource="/x.gif" data-status="error"><h3>Vision Language Model Analysis</h3><p class="vlm-image">image=/x.gif</p><p class="vlm-error">[analysis unavailable: analysis failed (http-status): HTTP 500: internal error]</p><p class="vlm-attribution">provider=scripted, model=test-model</p></div><section class="vlm-drain"/></body></html>
    "#);
}
