//! Convert a flow document file into an HTML clipboard payload
//!
//! ```text
//! flowdoc-convert [--fragment] [--legacy-offsets] [--lf] [--trace] <file|->
//! flowdoc-convert --dump <file|->
//! ```
//!
//! The payload is written to stdout. `--trace` reports every node on stderr;
//! `RUST_LOG=flowdoc_clipboard=trace` shows the library's own events.

use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::process;

use flowdoc_clipboard::converter::{ConversionObserver, ConversionOptions, LineEnding, NoopObserver};
use flowdoc_clipboard::document::NodeKind;
use flowdoc_clipboard::error::ConversionWarning;
use flowdoc_clipboard::pipeline::ClipboardHtmlConverter;
use flowdoc_clipboard::preamble::{OffsetMode, PayloadOptions, parse_clipboard_payload};
use flowdoc_clipboard::whitespace::visualize;
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct Args {
    dump: bool,
    fragment: bool,
    legacy_offsets: bool,
    lf: bool,
    trace: bool,
    input: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args::default();
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--dump" => args.dump = true,
            "--fragment" => args.fragment = true,
            "--legacy-offsets" => args.legacy_offsets = true,
            "--lf" => args.lf = true,
            "--trace" => args.trace = true,
            flag if flag.starts_with("--") => return Err(format!("unknown flag {}", flag)),
            _ if args.input.is_some() => return Err("more than one input file".to_string()),
            path => args.input = Some(path.to_string()),
        }
    }
    Ok(args)
}

/// Prints one line per node in fixed columns
struct TraceReport<W: Write> {
    out: W,
}

impl<W: Write> TraceReport<W> {
    fn title(&mut self, title: &str, has_attributes: bool) {
        let title = if has_attributes {
            format!("{}+", title)
        } else {
            title.to_string()
        };
        let _ = write!(self.out, "{:<12}", title);
    }

    fn mapping(&mut self, source: &str, target: Option<&str>) {
        let _ = writeln!(self.out, "{:<10}--> {:<10}", source, target.unwrap_or("(none)"));
    }
}

impl<W: Write> ConversionObserver for TraceReport<W> {
    fn on_element_start(&mut self, source: &str, target: Option<&str>, has_attributes: bool) {
        self.title("element", has_attributes);
        self.mapping(source, target);
    }

    fn on_element_end(&mut self, source: &str, target: Option<&str>) {
        self.title("endelement", false);
        self.mapping(source, target);
    }

    fn on_text(&mut self, kind: NodeKind, text: &str) {
        let title = match kind {
            NodeKind::CData => "cdata",
            NodeKind::SignificantWhitespace => "whitespace!",
            NodeKind::Whitespace => "whitespace",
            NodeKind::Text | NodeKind::Element => "text",
        };
        self.title(title, false);
        let _ = writeln!(self.out, "[{}]", visualize(text));
    }

    fn on_warning(&mut self, warning: &ConversionWarning) {
        self.title("warning", false);
        let _ = writeln!(self.out, "{}", warning);
    }
}

fn read_input(path: &str) -> io::Result<Vec<u8>> {
    if path == "-" {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        Ok(buffer)
    } else {
        fs::read(path)
    }
}

fn dump(input: &[u8]) -> Result<(), String> {
    let text = std::str::from_utf8(input).map_err(|e| format!("payload is not UTF-8: {}", e))?;
    let parsed = parse_clipboard_payload(text).map_err(|e| e.to_string())?;
    let header = &parsed.header;

    println!("Version:       {}", header.version);
    println!("StartHTML:     {}", header.start_html);
    println!("EndHTML:       {} (payload is {} bytes)", header.end_html, text.len());
    println!("StartFragment: {}", header.start_fragment);
    println!("EndFragment:   {}", header.end_fragment);
    println!();
    match parsed.fragment() {
        Ok(fragment) => println!("{}", visualize(fragment)),
        Err(e) => println!("fragment unavailable: {}", e),
    }
    Ok(())
}

fn convert(args: &Args, input: &[u8]) -> Result<(), String> {
    let line_ending = if args.lf { LineEnding::Lf } else { LineEnding::CrLf };
    let converter = ClipboardHtmlConverter::with_options(
        ConversionOptions {
            line_ending,
            ..Default::default()
        },
        PayloadOptions {
            offset_mode: if args.legacy_offsets {
                OffsetMode::Legacy
            } else {
                OffsetMode::Utf8Bytes
            },
            line_ending,
        },
    );

    let mut report = TraceReport { out: io::stderr() };
    let mut noop = NoopObserver;
    let observer: &mut dyn ConversionObserver = if args.trace { &mut report } else { &mut noop };

    let output = if args.fragment {
        converter.fragment_with_observer(input, observer)
    } else {
        converter.convert_with_observer(input, observer)
    }
    .map_err(|e| format!("{} (code {})", e, e.code()))?;

    io::stdout()
        .write_all(output.as_bytes())
        .map_err(|e| format!("failed to write output: {}", e))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Usage: flowdoc-convert [--dump] [--fragment] [--legacy-offsets] [--lf] [--trace] <file|->");
            process::exit(2);
        }
    };

    let Some(path) = args.input.as_deref() else {
        eprintln!("Usage: flowdoc-convert [--dump] [--fragment] [--legacy-offsets] [--lf] [--trace] <file|->");
        process::exit(2);
    };

    let input = match read_input(path) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Error reading {}: {}", path, e);
            process::exit(1);
        }
    };

    let result = if args.dump {
        dump(&input)
    } else {
        convert(&args, &input)
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
