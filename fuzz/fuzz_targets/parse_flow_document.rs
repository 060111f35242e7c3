#![no_main]

use flowdoc_clipboard::converter::HtmlConverter;
use flowdoc_clipboard::parser::parse_flow_document;
use flowdoc_clipboard::preamble::{build_clipboard_payload, parse_clipboard_payload};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(root) = parse_flow_document(data) else {
        return;
    };
    let Ok(html) = HtmlConverter::new().convert(&root) else {
        return;
    };

    // Converted output always carries both markers, so the payload must build
    let payload = build_clipboard_payload(&html).expect("payload for converted HTML");
    let parsed = parse_clipboard_payload(&payload).expect("own payload parses");
    assert_eq!(parsed.header.end_html, payload.len());
    assert!(parsed.fragment().is_ok());
});
