//! End-to-end conversion tests
//!
//! Markup goes in, a clipboard payload comes out. Checks cover the mapping
//! tables as seen through the whole pipeline and structural properties of
//! the generated HTML for arbitrary trees.

use flowdoc_clipboard::converter::{ConversionOptions, HtmlConverter, UnmappedElementPolicy};
use flowdoc_clipboard::document::{Element, SourceNode};
use flowdoc_clipboard::pipeline::ClipboardHtmlConverter;
use flowdoc_clipboard::preamble::{build_clipboard_payload, parse_clipboard_payload};
use flowdoc_clipboard::whitespace::VISIBLE_SPACE;
use proptest::prelude::*;
use quick_xml::Reader;
use quick_xml::events::Event;

fn fragment_of(markup: &str) -> String {
    let payload = ClipboardHtmlConverter::new()
        .convert_str(markup)
        .expect("Failed to convert");
    parse_clipboard_payload(&payload)
        .expect("Failed to parse payload")
        .fragment()
        .expect("Failed to locate fragment")
        .to_string()
}

/// Walk `html` with an XML reader and return the maximum nesting depth
fn assert_balanced(html: &str) -> usize {
    let mut reader = Reader::from_str(html);
    reader.config_mut().trim_text(false);

    let mut depth = 0usize;
    let mut max_depth = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            Ok(Event::End(_)) => {
                assert!(depth > 0, "end tag without start in {html}");
                depth -= 1;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => panic!("generated HTML is not well formed: {e}\n{html}"),
        }
    }
    assert_eq!(depth, 0, "unclosed elements in {html}");
    max_depth
}

#[test]
fn test_rich_paragraph() {
    let fragment = fragment_of(
        r##"<Section><Paragraph Foreground="#FF112233" FontSize="10.5" FontFamily="Segoe UI"><Run FontStyle="Italic">a</Run><Bold>b</Bold></Paragraph></Section>"##,
    );
    assert_eq!(
        fragment,
        r#"<p style="color:#112233;font-size:11pt;font-family:'Segoe UI';"><span style="font-style:italic;">a</span><b>b</b></p>"#
    );
}

#[test]
fn test_lists_choose_tag_by_marker_style() {
    let fragment = fragment_of(
        r#"<Section><List><ListItem><Paragraph>a</Paragraph></ListItem></List><List MarkerStyle="Decimal"><ListItem><Paragraph>b</Paragraph></ListItem></List></Section>"#,
    );
    assert_eq!(
        fragment,
        "<ul><li><p>a</p></li></ul><ol><li><p>b</p></li></ol>"
    );
}

#[test]
fn test_table() {
    let fragment = fragment_of(
        r#"<Section><Table><Table.Columns><TableColumn Width="100"/></Table.Columns><TableRowGroup><TableRow><TableCell ColumnSpan="2" BorderThickness="1,1,0.5,0"><Paragraph>c</Paragraph></TableCell></TableRow></TableRowGroup></Table></Section>"#,
    );
    assert_eq!(
        fragment,
        r#"<table><tbody><tr><td colspan="2" style="border-width:1px 1px 1px 0px;"><p>c</p></td></tr></tbody></table>"#
    );
}

#[test]
fn test_hyperlink_and_decorations() {
    let fragment = fragment_of(
        r#"<Section><Paragraph><Hyperlink NavigateUri="https://example.com/?a=1&amp;b=2" TextDecorations="Strikethrough">go</Hyperlink></Paragraph></Section>"#,
    );
    assert_eq!(
        fragment,
        r#"<p><a href="https://example.com/?a=1&amp;b=2" style="text-decoration:line-through;">go</a></p>"#
    );
}

#[test]
fn test_leading_whitespace_becomes_visible() {
    let fragment = fragment_of(
        "<Section xml:space=\"preserve\"><Paragraph><Run>\t  x</Run></Paragraph></Section>",
    );
    let expected = format!("<p><span>{}x</span></p>", VISIBLE_SPACE.to_string().repeat(6));
    assert_eq!(fragment, expected);
}

#[test]
fn test_text_is_escaped() {
    let fragment = fragment_of("<Section><Paragraph>a &lt;b&gt; &amp; c</Paragraph></Section>");
    assert_eq!(fragment, "<p>a &lt;b&gt; &amp; c</p>");
}

#[test]
fn test_insignificant_whitespace_is_dropped() {
    let fragment = fragment_of(
        "<Section>\n  <Paragraph>\n    <Run>x</Run>\n  </Paragraph>\n</Section>",
    );
    assert_eq!(fragment, "<p><span>x</span></p>");
}

#[test]
fn test_unmapped_elements_are_transparent() {
    let fragment = fragment_of(
        "<Section><Figure><Paragraph>inside</Paragraph></Figure><Paragraph>after</Paragraph></Section>",
    );
    assert_eq!(fragment, "<p>inside</p><p>after</p>");
}

#[test]
fn test_output_is_well_formed() {
    let payload = ClipboardHtmlConverter::new()
        .convert_str(
            r#"<Section><List><ListItem><Paragraph><Bold>x</Bold><LineBreak/><Italic>y</Italic></Paragraph></ListItem></List></Section>"#,
        )
        .unwrap();
    let parsed = parse_clipboard_payload(&payload).unwrap();
    // html, body, ul, li, p, b
    assert_eq!(assert_balanced(parsed.html_region().unwrap()), 6);
}

#[test]
fn test_include_root() {
    let converter = ClipboardHtmlConverter::with_options(
        ConversionOptions {
            include_root: true,
            ..Default::default()
        },
        Default::default(),
    );
    let payload = converter
        .convert_str(r##"<Section Background="#FFFFFFFF"><Paragraph>x</Paragraph></Section>"##)
        .unwrap();
    assert_eq!(
        parse_clipboard_payload(&payload).unwrap().fragment().unwrap(),
        r#"<div style="background-color:#FFFFFF;"><p>x</p></div>"#
    );
}

fn element_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "Section",
        "Paragraph",
        "Span",
        "Run",
        "Bold",
        "Italic",
        "List",
        "ListItem",
        "Table",
        "TableRowGroup",
        "TableRow",
        "TableCell",
        "Hyperlink",
        "Figure",
        "Floater",
    ])
}

fn attribute() -> impl Strategy<Value = (&'static str, String)> {
    (
        prop::sample::select(vec![
            "FontWeight",
            "Foreground",
            "FontSize",
            "Margin",
            "NavigateUri",
            "ColumnSpan",
            "MarkerStyle",
            "Tag",
        ]),
        "[ -~]{0,12}",
    )
}

fn source_tree() -> impl Strategy<Value = SourceNode> {
    let leaf = prop_oneof![
        "[ -~\t]{0,10}".prop_map(SourceNode::Text),
        "[ \t]{1,4}".prop_map(SourceNode::SignificantWhitespace),
    ];

    leaf.prop_recursive(6, 48, 5, |inner| {
        (
            element_name(),
            prop::collection::vec(attribute(), 0..3),
            prop::collection::vec(inner, 0..5),
        )
            .prop_map(|(name, attributes, children)| {
                let mut element = Element::new(name);
                for (attr, value) in attributes {
                    element = element.with_attribute(attr, value);
                }
                element.children = children;
                SourceNode::from(element)
            })
    })
}

proptest! {
    #[test]
    fn prop_random_trees_produce_balanced_html(child in source_tree()) {
        let root = SourceNode::from(Element::new("FlowDocument").with_child(child));
        let html = HtmlConverter::new().convert(&root).unwrap();

        assert_balanced(&html);
        prop_assert_eq!(html.matches("<!--StartFragment-->").count(), 1);
        prop_assert_eq!(html.matches("<!--EndFragment-->").count(), 1);
    }

    #[test]
    fn prop_payload_offsets_hold_for_random_trees(child in source_tree()) {
        let root = SourceNode::from(Element::new("FlowDocument").with_child(child));
        let html = HtmlConverter::new().convert(&root).unwrap();
        let payload = build_clipboard_payload(&html).unwrap();

        let parsed = parse_clipboard_payload(&payload).unwrap();
        prop_assert_eq!(parsed.header.end_html, payload.len());
        prop_assert!(parsed.html_region().unwrap().starts_with("<html>"));
        prop_assert!(parsed.fragment().is_ok());
    }

    #[test]
    fn prop_drop_subtree_never_emits_more(child in source_tree()) {
        let root = SourceNode::from(Element::new("FlowDocument").with_child(child));
        let skip = HtmlConverter::new().convert(&root).unwrap();
        let drop = HtmlConverter::with_options(ConversionOptions {
            unmapped_elements: UnmappedElementPolicy::DropSubtree,
            ..Default::default()
        })
        .convert(&root)
        .unwrap();

        prop_assert!(drop.len() <= skip.len());
    }
}
