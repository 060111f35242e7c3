//! FFI integration tests
//!
//! These tests verify that the FFI functions convert markup correctly and
//! handle memory management properly.

use flowdoc_clipboard::ffi::*;
use flowdoc_clipboard::preamble::parse_clipboard_payload;
use proptest::prelude::*;
use std::ptr;
use std::slice;

fn ffi_converter_new(options: Option<&FlowDocOptions>) -> *mut FlowDocConverterHandle {
    let options = options.map_or(ptr::null(), |options| options as *const FlowDocOptions);
    unsafe { flowdoc_converter_new(options) }
}

fn ffi_convert(handle: *const FlowDocConverterHandle, input: &[u8], result: *mut ClipboardHtmlResult) {
    unsafe { flowdoc_convert(handle, input.as_ptr(), input.len(), result) }
}

fn ffi_result_free(result: *mut ClipboardHtmlResult) {
    unsafe { flowdoc_result_free(result) }
}

fn ffi_converter_free(handle: *mut FlowDocConverterHandle) {
    unsafe { flowdoc_converter_free(handle) }
}

fn ffi_test_empty_result() -> ClipboardHtmlResult {
    ClipboardHtmlResult {
        output: ptr::null_mut(),
        output_len: 0,
        warning_count: 0,
        error_code: 0,
        error_message: ptr::null_mut(),
        error_len: 0,
    }
}

fn output_str(result: &ClipboardHtmlResult) -> &str {
    let bytes = unsafe { slice::from_raw_parts(result.output, result.output_len) };
    std::str::from_utf8(bytes).expect("output is UTF-8")
}

fn error_str(result: &ClipboardHtmlResult) -> &str {
    let bytes = unsafe { slice::from_raw_parts(result.error_message, result.error_len) };
    std::str::from_utf8(bytes).expect("error message is UTF-8")
}

#[test]
fn test_converter_lifecycle() {
    let converter = ffi_converter_new(None);
    assert!(!converter.is_null(), "Converter should not be NULL");
    ffi_converter_free(converter);
}

#[test]
fn test_basic_conversion() {
    let converter = ffi_converter_new(None);
    let markup = br#"<Section xmlns="http://schemas.microsoft.com/winfx/2006/xaml/presentation"><Paragraph FontWeight="Bold">Hi</Paragraph></Section>"#;

    let mut result = ffi_test_empty_result();
    ffi_convert(converter, markup, &mut result);

    assert_eq!(result.error_code, ERROR_SUCCESS, "Conversion should succeed");
    assert!(result.error_message.is_null());
    assert_eq!(result.error_len, 0);
    assert_eq!(result.warning_count, 0);

    let payload = output_str(&result);
    assert!(payload.starts_with("Version:0.9\r\nStartHTML:0000000105\r\n"));
    let parsed = parse_clipboard_payload(payload).unwrap();
    assert_eq!(parsed.fragment().unwrap(), r#"<p style="font-weight:bold;">Hi</p>"#);
    assert_eq!(parsed.header.end_html, result.output_len);

    ffi_result_free(&mut result);
    ffi_converter_free(converter);
}

#[test]
fn test_fragment_only_and_lf() {
    let options = FlowDocOptions {
        line_ending: 1,
        fragment_only: 1,
        ..Default::default()
    };
    let converter = ffi_converter_new(Some(&options));
    let mut result = ffi_test_empty_result();
    ffi_convert(converter, b"<Section><Paragraph>x</Paragraph></Section>", &mut result);

    assert_eq!(result.error_code, ERROR_SUCCESS);
    assert_eq!(
        output_str(&result),
        "<html>\n<body>\n<!--StartFragment--><p>x</p><!--EndFragment-->\n</body>\n</html>\n"
    );

    ffi_result_free(&mut result);
    ffi_converter_free(converter);
}

#[test]
fn test_warning_count() {
    let converter = ffi_converter_new(None);
    let markup = br#"<Section><Figure><Paragraph><Hyperlink NavigateUri="javascript:alert(1)">x</Hyperlink></Paragraph></Figure></Section>"#;
    let mut result = ffi_test_empty_result();
    ffi_convert(converter, markup, &mut result);

    assert_eq!(result.error_code, ERROR_SUCCESS);
    assert_eq!(result.warning_count, 2);
    assert!(!output_str(&result).contains("javascript"));

    ffi_result_free(&mut result);
    ffi_converter_free(converter);
}

#[test]
fn test_error_codes() {
    let strict = FlowDocOptions {
        unmapped_policy: 2,
        ..Default::default()
    };
    let converter = ffi_converter_new(Some(&strict));

    let cases: [(&[u8], u32); 4] = [
        (b"<Section><Paragraph>", ERROR_PARSE),
        (b"<Section><Figure>x</Figure></Section>", ERROR_UNMAPPED_ELEMENT),
        (b"<?xml version=\"1.0\" encoding=\"x-no-such\"?><Section/>", ERROR_ENCODING),
        (b"<Section>\xff</Section>", ERROR_ENCODING),
    ];

    for (input, expected) in cases {
        let mut result = ffi_test_empty_result();
        ffi_convert(converter, input, &mut result);
        assert_eq!(result.error_code, expected, "input {:?}", String::from_utf8_lossy(input));
        assert!(result.output.is_null());
        assert_eq!(result.output_len, 0);
        assert!(!error_str(&result).is_empty());
        ffi_result_free(&mut result);
    }

    ffi_converter_free(converter);
}

#[test]
fn test_null_pointer_handling() {
    let converter = ffi_converter_new(None);

    // NULL handle
    let mut result = ffi_test_empty_result();
    ffi_convert(ptr::null(), b"<Section/>", &mut result);
    assert_eq!(result.error_code, ERROR_INVALID_INPUT);
    assert!(error_str(&result).contains("Converter handle"));
    ffi_result_free(&mut result);

    // NULL input with non-zero length
    let mut result = ffi_test_empty_result();
    unsafe { flowdoc_convert(converter, ptr::null(), 10, &mut result) };
    assert_eq!(result.error_code, ERROR_INVALID_INPUT);
    ffi_result_free(&mut result);

    // NULL input with zero length is empty markup
    let mut result = ffi_test_empty_result();
    unsafe { flowdoc_convert(converter, ptr::null(), 0, &mut result) };
    assert_eq!(result.error_code, ERROR_INVALID_INPUT);
    ffi_result_free(&mut result);

    // NULL result is a no-op
    unsafe { flowdoc_convert(converter, b"<Section/>".as_ptr(), 10, ptr::null_mut()) };

    ffi_converter_free(converter);
}

#[test]
fn test_idempotent_free() {
    let converter = ffi_converter_new(None);
    let mut result = ffi_test_empty_result();
    ffi_convert(converter, b"<Section><Paragraph>x</Paragraph></Section>", &mut result);
    assert!(!result.output.is_null());

    ffi_result_free(&mut result);
    assert!(result.output.is_null());
    assert_eq!(result.output_len, 0);

    ffi_result_free(&mut result);
    assert!(result.output.is_null());

    ffi_converter_free(converter);
}

#[test]
fn test_free_null_pointers() {
    ffi_result_free(ptr::null_mut());
    ffi_converter_free(ptr::null_mut());

    let mut result = ffi_test_empty_result();
    ffi_result_free(&mut result);
    assert_eq!(result.error_code, 0);
}

#[test]
fn test_utf16_input() {
    let converter = ffi_converter_new(None);
    let mut input = vec![0xFF, 0xFE];
    for unit in "<Section><Paragraph>é</Paragraph></Section>".encode_utf16() {
        input.extend_from_slice(&unit.to_le_bytes());
    }

    let mut result = ffi_test_empty_result();
    ffi_convert(converter, &input, &mut result);
    assert_eq!(result.error_code, ERROR_SUCCESS);
    assert!(output_str(&result).contains("<p>é</p>"));

    ffi_result_free(&mut result);
    ffi_converter_free(converter);
}

#[test]
fn test_multiple_conversions_reuse_handle() {
    let converter = ffi_converter_new(None);
    for word in ["one", "two", "three"] {
        let markup = format!("<Section><Paragraph>{word}</Paragraph></Section>");
        let mut result = ffi_test_empty_result();
        ffi_convert(converter, markup.as_bytes(), &mut result);
        assert_eq!(result.error_code, ERROR_SUCCESS);
        assert!(output_str(&result).contains(&format!("<p>{word}</p>")));
        ffi_result_free(&mut result);
    }
    ffi_converter_free(converter);
}

proptest! {
    #[test]
    fn prop_random_bytes_do_not_crash_ffi_conversion(input in proptest::collection::vec(any::<u8>(), 0..128)) {
        let converter = ffi_converter_new(None);
        prop_assert!(!converter.is_null());

        let mut result = ffi_test_empty_result();
        ffi_convert(converter, &input, &mut result);

        if result.error_code == ERROR_SUCCESS {
            prop_assert!(result.error_message.is_null());
            prop_assert!(!result.output.is_null());
        } else {
            prop_assert_ne!(result.error_code, ERROR_INTERNAL);
            prop_assert!(result.output.is_null());
            prop_assert!(!result.error_message.is_null());
            prop_assert!(result.error_len > 0);
        }

        ffi_result_free(&mut result);
        ffi_converter_free(converter);
    }

    #[test]
    fn prop_payload_length_matches_header(text in "[A-Za-z0-9 äöü€]{0,40}") {
        let converter = ffi_converter_new(None);
        let markup = format!("<Section><Paragraph>{text}</Paragraph></Section>");

        let mut result = ffi_test_empty_result();
        ffi_convert(converter, markup.as_bytes(), &mut result);
        prop_assert_eq!(result.error_code, ERROR_SUCCESS);

        let parsed = parse_clipboard_payload(output_str(&result)).unwrap();
        prop_assert_eq!(parsed.header.end_html, result.output_len);

        ffi_result_free(&mut result);
        ffi_converter_free(converter);
    }
}
