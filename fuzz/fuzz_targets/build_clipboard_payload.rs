#![no_main]

use flowdoc_clipboard::converter::LineEnding;
use flowdoc_clipboard::preamble::{
    OffsetMode, PayloadOptions, build_clipboard_payload_with, parse_clipboard_payload,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&flags, rest)) = data.split_first() else {
        return;
    };
    let Ok(fragment) = std::str::from_utf8(rest) else {
        return;
    };

    let options = PayloadOptions {
        offset_mode: if flags & 1 == 0 {
            OffsetMode::Utf8Bytes
        } else {
            OffsetMode::Legacy
        },
        line_ending: if flags & 2 == 0 {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        },
    };

    if let Ok(payload) = build_clipboard_payload_with(fragment, &options) {
        let parsed = parse_clipboard_payload(&payload);
        if options.offset_mode == OffsetMode::Utf8Bytes
            && let Ok(parsed) = parsed
        {
            assert_eq!(parsed.header.end_html, payload.len());
        }
    }
});
