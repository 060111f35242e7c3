//! Shows how the two offset modes number the same payload

use flowdoc_clipboard::converter::{ConversionOptions, LineEnding};
use flowdoc_clipboard::pipeline::ClipboardHtmlConverter;
use flowdoc_clipboard::preamble::{OffsetMode, PayloadOptions, parse_clipboard_payload};

const MARKUP: &str =
    "<Section xml:space=\"preserve\"><Paragraph>  Grüße 😀</Paragraph></Section>";

fn main() {
    println!("Input markup:\n{}\n", MARKUP);

    for mode in [OffsetMode::Utf8Bytes, OffsetMode::Legacy] {
        let converter = ClipboardHtmlConverter::with_options(
            ConversionOptions {
                line_ending: LineEnding::Lf,
                ..Default::default()
            },
            PayloadOptions {
                offset_mode: mode,
                line_ending: LineEnding::Lf,
            },
        );
        let payload = converter.convert_str(MARKUP).expect("Conversion failed");
        let parsed = parse_clipboard_payload(&payload).expect("Payload parse failed");

        println!("{:?} ({} bytes)", mode, payload.len());
        print!("{}", parsed.preamble);
        match parsed.fragment() {
            Ok(fragment) => println!("fragment by offsets: {:?}\n", fragment),
            Err(e) => println!("fragment by offsets: {}\n", e),
        }
    }
}
