#![no_main]

use std::ptr;

use flowdoc_clipboard::ffi::{
    ClipboardHtmlResult, ERROR_INTERNAL, ERROR_SUCCESS, flowdoc_convert, flowdoc_converter_free,
    flowdoc_converter_new, flowdoc_result_free,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let converter = unsafe { flowdoc_converter_new(ptr::null()) };
    assert!(!converter.is_null());

    let mut result = ClipboardHtmlResult {
        output: ptr::null_mut(),
        output_len: 0,
        warning_count: 0,
        error_code: 0,
        error_message: ptr::null_mut(),
        error_len: 0,
    };
    unsafe { flowdoc_convert(converter, data.as_ptr(), data.len(), &mut result) };

    assert_ne!(result.error_code, ERROR_INTERNAL);
    if result.error_code == ERROR_SUCCESS {
        assert!(!result.output.is_null());
    } else {
        assert!(result.output.is_null());
    }

    unsafe {
        flowdoc_result_free(&mut result);
        flowdoc_converter_free(converter);
    }
});
