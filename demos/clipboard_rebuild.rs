//! Rebuilds an in-memory clipboard the way a tray helper would on copy

use flowdoc_clipboard::clipboard::{
    ClipboardAccess, ClipboardFormat, ClipboardRebuilder, MemoryClipboard, RebuildOutcome,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut clipboard = MemoryClipboard::new()
        .with_text(
            ClipboardFormat::Xaml,
            r#"<Section><Paragraph><Bold>Quarterly</Bold> report</Paragraph><Figure><Paragraph>chart</Paragraph></Figure></Section>"#,
        )
        .with_text(ClipboardFormat::UnicodeText, "Quarterly report\nchart")
        .with_text(ClipboardFormat::CommaSeparatedValue, "Quarterly,report");

    println!("Before: {:?}", clipboard.formats());

    match ClipboardRebuilder::new().rebuild(&mut clipboard) {
        Ok(RebuildOutcome::Unchanged { formats }) => {
            println!("Nothing to convert, clipboard holds {:?}", formats);
        }
        Ok(outcome) => {
            println!("Outcome: {:?}", outcome);
            println!("After: {:?}\n", clipboard.formats());
            if let Some(html) = clipboard.text(ClipboardFormat::Html) {
                println!("{}", html);
            }
        }
        Err(e) => eprintln!("Rebuild failed (code {}): {}", e.code(), e),
    }
}
