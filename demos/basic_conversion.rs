//! Basic conversion example demonstrating the clipboard HTML converter

use flowdoc_clipboard::converter::convert_markup_to_html_fragment;
use flowdoc_clipboard::parser::parse_flow_document;
use flowdoc_clipboard::whitespace::visualize;

fn main() {
    println!("=== Flow Document to HTML - Basic Examples ===\n");

    // Example 1: Formatted paragraph
    example(
        "Formatted paragraph",
        br##"<Section><Paragraph FontWeight="Bold" Foreground="#FF336699">Hello</Paragraph></Section>"##,
    );

    // Example 2: Lists
    example(
        "Bullet and numbered lists",
        br#"<Section><List><ListItem><Paragraph>one</Paragraph></ListItem></List><List MarkerStyle="Decimal"><ListItem><Paragraph>two</Paragraph></ListItem></List></Section>"#,
    );

    // Example 3: Indentation survives the paste
    example(
        "Leading whitespace",
        b"<Section xml:space=\"preserve\"><Paragraph>\tindented</Paragraph></Section>",
    );

    // Example 4: Table
    example(
        "Table with a spanning cell",
        br#"<Section><Table><TableRowGroup><TableRow><TableCell ColumnSpan="2"><Paragraph>wide</Paragraph></TableCell></TableRow></TableRowGroup></Table></Section>"#,
    );
}

fn example(title: &str, markup: &[u8]) {
    println!("{}", title);
    println!("Input markup:");
    println!("{}\n", String::from_utf8_lossy(markup));

    let root = parse_flow_document(markup).expect("Parse failed");
    let html = convert_markup_to_html_fragment(&root).expect("Conversion failed");

    println!("Output HTML (spaces shown as '.', no-break spaces as '·'):");
    println!("{}", visualize(&html));
    println!("---\n");
}
