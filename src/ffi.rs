//! FFI (Foreign Function Interface) layer for C integration
//!
//! This module provides C-compatible data structures and functions so native
//! clipboard hosts (a Win32 tray helper, a GTK bridge) can turn flow document
//! markup into an `HTML Format` payload without linking a Rust toolchain.
//!
//! # FFI Boundary Contract
//!
//! ## CRITICAL: String Representation
//!
//! **All strings use UTF-8 bytes + length representation (NOT NUL-terminated C strings)**
//!
//! Every string field follows this pattern:
//! - Pointer field: `*mut u8` (points to UTF-8 bytes)
//! - Length field: `usize` with `_len` suffix (byte count)
//!
//! ```c
//! // CORRECT: Use length field
//! SetClipboardData(html_format, copy_to_global(result.output, result.output_len));
//!
//! // WRONG: Do NOT use strlen()
//! size_t len = strlen((char*)result.output);  // INCORRECT!
//! ```
//!
//! Input markup is passed as raw bytes. The byte order mark, a UTF-16 byte
//! pattern or the XML declaration decide how it is decoded, so hosts can hand
//! over the clipboard's `Xaml` entry as-is.
//!
//! ## Memory Management
//!
//! **Ownership Model:**
//! - Rust allocates all output memory using `Box<[u8]>`
//! - C receives raw pointers but does NOT own the memory
//! - C must call `flowdoc_result_free()` exactly once to deallocate
//! - After calling free, all pointers become invalid
//!
//! **Allocation Strategy (runnable Rust example):**
//! ```rust
//! use flowdoc_clipboard::ffi::{flowdoc_result_free, ClipboardHtmlResult};
//! use std::ptr;
//!
//! let payload = String::from("Version:0.9\r\n");
//! let output_len = payload.len();
//! let output = Box::into_raw(payload.into_bytes().into_boxed_slice()) as *mut u8;
//!
//! let mut result = ClipboardHtmlResult {
//!     output,
//!     output_len,
//!     warning_count: 0,
//!     error_code: 0,
//!     error_message: ptr::null_mut(),
//!     error_len: 0,
//! };
//!
//! unsafe { flowdoc_result_free(&mut result) };
//! assert!(result.output.is_null());
//! assert_eq!(result.output_len, 0);
//! ```
//!
//! ## Error Handling Contract
//!
//! **Success Case:**
//! - `error_code = 0`
//! - `error_message = NULL`, `error_len = 0`
//! - `output` holds the payload (or the bare fragment when requested)
//!
//! **Error Case:**
//! - `error_code != 0` (see error code constants below)
//! - `error_message` points to a UTF-8 error description
//! - `output` is NULL and `warning_count` is 0
//!
//! **Panic Safety:**
//! - All FFI functions use `catch_unwind` to prevent panics from crossing the boundary
//! - Panics are converted to `ERROR_INTERNAL`
//!
//! ## Thread Safety
//!
//! A `FlowDocConverterHandle` holds only immutable options. It may be shared
//! across threads as long as it is not freed while a conversion is running.

use std::panic;
use std::ptr;
use std::slice;

use tracing::debug;

use crate::converter::{ConversionOptions, LineEnding, UnmappedElementPolicy, WarningCollector};
use crate::error::ConversionError;
use crate::pipeline::ClipboardHtmlConverter;
use crate::preamble::{OffsetMode, PayloadOptions};

// ============================================================================
// Error Code Constants
// ============================================================================

/// Success - no error occurred
pub const ERROR_SUCCESS: u32 = 0;

/// Markup parsing failed (malformed XML, unclosed elements)
pub const ERROR_PARSE: u32 = 1;

/// Character encoding error (invalid UTF-8, unsupported declared encoding)
pub const ERROR_ENCODING: u32 = 2;

/// Invalid input data (NULL pointers, empty markup, nesting too deep)
pub const ERROR_INVALID_INPUT: u32 = 5;

/// Element without HTML mapping under the failing policy
pub const ERROR_UNMAPPED_ELEMENT: u32 = 6;

/// Fragment markers or header offsets are inconsistent
pub const ERROR_INVARIANT: u32 = 7;

/// Clipboard collaborator failure
pub const ERROR_CLIPBOARD: u32 = 8;

/// Internal error (unexpected condition, panic caught)
pub const ERROR_INTERNAL: u32 = 99;

// ============================================================================
// FFI Data Structures
// ============================================================================

/// Conversion options passed from C to Rust
///
/// # Field Descriptions
///
/// - `unmapped_policy`: what to do with elements that have no HTML tag
///   - 0 = skip the element, convert its children (default)
///   - 1 = drop the element with its subtree
///   - 2 = fail with `ERROR_UNMAPPED_ELEMENT`
/// - `line_ending`: line breaks of the HTML skeleton, 0 = CRLF, 1 = LF
/// - `include_root`: 1 emits the root element itself
/// - `tab_stop`: tab width for leading whitespace, 0 uses the default of 4
/// - `sanitize_urls`: 1 drops `javascript:`-style link targets
/// - `max_depth`: nesting limit, 0 uses the default of 1000
/// - `offset_mode`: 0 = exact UTF-8 byte offsets, 1 = legacy offsets
/// - `payload_line_ending`: line breaks of the header, 0 = CRLF, 1 = LF
/// - `fragment_only`: 1 returns the HTML document without the header
///
/// # Example Usage (C)
///
/// ```c
/// flowdoc_options_t options = {
///     .unmapped_policy = 0,
///     .line_ending = 0,
///     .include_root = 0,
///     .tab_stop = 4,
///     .sanitize_urls = 1,
///     .max_depth = 0,
///     .offset_mode = 0,
///     .payload_line_ending = 0,
///     .fragment_only = 0
/// };
/// flowdoc_converter_t *converter = flowdoc_converter_new(&options);
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FlowDocOptions {
    pub unmapped_policy: u32,
    pub line_ending: u32,
    pub include_root: u8,
    pub tab_stop: u32,
    pub sanitize_urls: u8,
    pub max_depth: u32,
    pub offset_mode: u32,
    pub payload_line_ending: u32,
    pub fragment_only: u8,
}

impl Default for FlowDocOptions {
    fn default() -> Self {
        Self {
            unmapped_policy: 0,
            line_ending: 0,
            include_root: 0,
            tab_stop: 0,
            sanitize_urls: 1,
            max_depth: 0,
            offset_mode: 0,
            payload_line_ending: 0,
            fragment_only: 0,
        }
    }
}

/// Conversion result returned from Rust to C
///
/// # State Invariants
///
/// **Success State (error_code == 0):**
/// - `output` is non-NULL and points to `output_len` UTF-8 bytes
/// - `warning_count` is the number of unmapped elements and removed links
/// - `error_message` is NULL, `error_len` is 0
///
/// **Error State (error_code != 0):**
/// - `output` is NULL, `output_len` is 0, `warning_count` is 0
/// - `error_message` is non-NULL, `error_len` > 0
///
/// # Example Usage (C)
///
/// ```c
/// flowdoc_result_t result;
/// flowdoc_convert(converter, xaml, xaml_len, &result);
///
/// if (result.error_code == 0) {
///     put_html_format(result.output, result.output_len);
/// } else {
///     log_error(result.error_code, result.error_message, result.error_len);
/// }
///
/// // Always free result
/// flowdoc_result_free(&result);
/// ```
#[repr(C)]
pub struct ClipboardHtmlResult {
    /// Payload or fragment (UTF-8 bytes, NOT NUL-terminated)
    pub output: *mut u8,

    /// Length of output in bytes
    pub output_len: usize,

    /// Non-fatal warnings raised during conversion
    pub warning_count: u32,

    /// Error code: 0=success, non-zero=error (see ERROR_* constants)
    pub error_code: u32,

    /// Error message (UTF-8 bytes, NULL if success)
    pub error_message: *mut u8,

    /// Length of error message in bytes
    pub error_len: usize,
}

/// Opaque handle to a configured converter
///
/// # Lifecycle
///
/// 1. Create: `flowdoc_converter_new()` returns a handle
/// 2. Use: pass the handle to `flowdoc_convert()` any number of times
/// 3. Destroy: `flowdoc_converter_free()` deallocates the handle
pub struct FlowDocConverterHandle {
    converter: ClipboardHtmlConverter,
    fragment_only: bool,
}

impl FlowDocConverterHandle {
    fn from_options(options: &FlowDocOptions) -> Self {
        let defaults = ConversionOptions::default();
        let conversion = ConversionOptions {
            unmapped_elements: match options.unmapped_policy {
                1 => UnmappedElementPolicy::DropSubtree,
                2 => UnmappedElementPolicy::Error,
                _ => UnmappedElementPolicy::SkipAndRecurse,
            },
            line_ending: line_ending(options.line_ending),
            include_root: options.include_root != 0,
            tab_stop: match options.tab_stop {
                0 => defaults.tab_stop,
                width => width as usize,
            },
            sanitize_urls: options.sanitize_urls != 0,
            max_depth: match options.max_depth {
                0 => defaults.max_depth,
                depth => depth as usize,
            },
        };
        let payload = PayloadOptions {
            offset_mode: match options.offset_mode {
                1 => OffsetMode::Legacy,
                _ => OffsetMode::Utf8Bytes,
            },
            line_ending: line_ending(options.payload_line_ending),
        };

        Self {
            converter: ClipboardHtmlConverter::with_options(conversion, payload),
            fragment_only: options.fragment_only != 0,
        }
    }
}

fn line_ending(value: u32) -> LineEnding {
    match value {
        1 => LineEnding::Lf,
        _ => LineEnding::CrLf,
    }
}

struct ConversionOutput {
    output: Box<[u8]>,
    warning_count: u32,
}

fn reset_result(result: &mut ClipboardHtmlResult) {
    result.output = ptr::null_mut();
    result.output_len = 0;
    result.warning_count = 0;
    result.error_code = ERROR_SUCCESS;
    result.error_message = ptr::null_mut();
    result.error_len = 0;
}

fn set_error_result(result: &mut ClipboardHtmlResult, error_code: u32, error_message: String) {
    let error_bytes = error_message.into_bytes().into_boxed_slice();
    result.error_code = error_code;
    result.error_len = error_bytes.len();
    result.error_message = Box::into_raw(error_bytes) as *mut u8;
}

fn set_success_result(result: &mut ClipboardHtmlResult, output: ConversionOutput) {
    result.output_len = output.output.len();
    result.output = Box::into_raw(output.output) as *mut u8;
    result.warning_count = output.warning_count;
    result.error_code = ERROR_SUCCESS;
    result.error_message = ptr::null_mut();
    result.error_len = 0;
}

fn required_ref<'a, T>(ptr: *const T, name: &str) -> Result<&'a T, ConversionError> {
    if ptr.is_null() {
        return Err(ConversionError::InvalidInput(format!(
            "{name} pointer is NULL"
        )));
    }

    // SAFETY: Caller provided a non-NULL pointer and accepts FFI contract
    // that this points to a valid, properly aligned value.
    Ok(unsafe { &*ptr })
}

fn required_bytes<'a>(ptr: *const u8, len: usize, name: &str) -> Result<&'a [u8], ConversionError> {
    if len == 0 {
        return Ok(&[]);
    }

    if ptr.is_null() {
        return Err(ConversionError::InvalidInput(format!(
            "{name} pointer is NULL"
        )));
    }

    // SAFETY: Pointer was validated as non-NULL above; caller guarantees `len`
    // bytes are valid and readable for the duration of this call.
    Ok(unsafe { slice::from_raw_parts(ptr, len) })
}

fn convert_inner(
    handle: &FlowDocConverterHandle,
    markup: &[u8],
) -> Result<ConversionOutput, ConversionError> {
    let mut warnings = WarningCollector::new();
    let output = if handle.fragment_only {
        handle.converter.fragment_with_observer(markup, &mut warnings)?
    } else {
        handle.converter.convert_with_observer(markup, &mut warnings)?
    };

    let warning_count = u32::try_from(warnings.warnings().len()).unwrap_or(u32::MAX);
    debug!(
        bytes = output.len(),
        warning_count, "converted flow document across FFI"
    );

    Ok(ConversionOutput {
        output: output.into_bytes().into_boxed_slice(),
        warning_count,
    })
}

fn free_buffer(ptr_field: &mut *mut u8, len_field: &mut usize) {
    if (*ptr_field).is_null() {
        return;
    }

    let raw = ptr::slice_from_raw_parts_mut(*ptr_field, *len_field);
    // SAFETY: `raw` was allocated by `Box<[u8]>` via `Box::into_raw`.
    let _ = unsafe { Box::from_raw(raw) };
    *ptr_field = ptr::null_mut();
    *len_field = 0;
}

// ============================================================================
// FFI Functions
// ============================================================================

/// Create a converter configured with `options`
///
/// # Returns
///
/// - Non-NULL pointer to `FlowDocConverterHandle` on success
/// - NULL on allocation failure or panic
///
/// A NULL `options` pointer selects the defaults: CRLF skeleton, exact byte
/// offsets, unmapped elements skipped, unsafe links removed.
///
/// # Safety
///
/// `options` must be NULL or point to a valid `FlowDocOptions`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn flowdoc_converter_new(
    options: *const FlowDocOptions,
) -> *mut FlowDocConverterHandle {
    let result = panic::catch_unwind(|| {
        let options = if options.is_null() {
            FlowDocOptions::default()
        } else {
            // SAFETY: `options` was validated as non-NULL above.
            unsafe { *options }
        };
        Box::into_raw(Box::new(FlowDocConverterHandle::from_options(&options)))
    });

    match result {
        Ok(ptr) => ptr,
        Err(_) => ptr::null_mut(),
    }
}

/// Convert flow document markup into an HTML clipboard payload
///
/// # Parameters
///
/// - `handle`: converter from `flowdoc_converter_new()`, must be non-NULL
/// - `input`: markup bytes, may be NULL only when `input_len == 0`
/// - `input_len`: byte length of `input`
/// - `result`: structure to populate; free it with `flowdoc_result_free()`
///
/// # Error Codes
///
/// - `ERROR_INVALID_INPUT` (5): NULL pointer, empty markup or nesting too deep
/// - `ERROR_PARSE` (1): malformed markup
/// - `ERROR_ENCODING` (2): undecodable bytes or unknown declared encoding
/// - `ERROR_UNMAPPED_ELEMENT` (6): unmapped element under the failing policy
/// - `ERROR_INVARIANT` (7): payload offsets could not be computed
/// - `ERROR_INTERNAL` (99): panic caught
///
/// # Safety
///
/// **Pointer Validation:**
/// - All pointers are validated for NULL before dereferencing
/// - A NULL `result` makes the call a no-op
///
/// **Undefined Behavior:**
/// - Passing invalid (non-NULL but bad) pointers is undefined behavior
/// - Using a freed handle is undefined behavior
#[unsafe(no_mangle)]
pub unsafe extern "C" fn flowdoc_convert(
    handle: *const FlowDocConverterHandle,
    input: *const u8,
    input_len: usize,
    result: *mut ClipboardHtmlResult,
) {
    if result.is_null() {
        return;
    }

    // SAFETY: `result` was validated as non-NULL above.
    let result_ref = unsafe { &mut *result };
    reset_result(result_ref);

    let panic_result = panic::catch_unwind(|| -> Result<ConversionOutput, ConversionError> {
        let handle_ref = required_ref(handle, "Converter handle")?;
        let markup = required_bytes(input, input_len, "Input")?;
        convert_inner(handle_ref, markup)
    });

    match panic_result {
        Ok(Ok(output)) => set_success_result(result_ref, output),
        Ok(Err(e)) => {
            set_error_result(result_ref, e.code(), e.to_string());
        }
        Err(_) => {
            set_error_result(
                result_ref,
                ERROR_INTERNAL,
                "Internal panic during conversion".to_string(),
            );
        }
    }
}

/// Free memory owned by a conversion result
///
/// Frees `output` and `error_message`, then nulls every pointer and zeroes
/// every length. Calling it again on the same result is a no-op.
///
/// **NEVER use CString::from_raw() on these fields** - they are NOT
/// NUL-terminated C strings.
///
/// # Safety
///
/// - NULL `result` is handled gracefully (no-op)
/// - The result must have been populated by `flowdoc_convert()` or be zeroed
/// - Mixing Rust and C allocators (calling C `free()`) is UB
#[unsafe(no_mangle)]
pub unsafe extern "C" fn flowdoc_result_free(result: *mut ClipboardHtmlResult) {
    if result.is_null() {
        return;
    }

    // SAFETY: `result` was validated as non-NULL above.
    let result_ref = unsafe { &mut *result };
    free_buffer(&mut result_ref.output, &mut result_ref.output_len);
    free_buffer(&mut result_ref.error_message, &mut result_ref.error_len);
    result_ref.warning_count = 0;
    result_ref.error_code = 0;
}

/// Destroy a converter created by `flowdoc_converter_new()`
///
/// # Safety
///
/// - NULL handle is handled gracefully (no-op)
/// - Freeing a handle twice or while a conversion runs is UB
#[unsafe(no_mangle)]
pub unsafe extern "C" fn flowdoc_converter_free(handle: *mut FlowDocConverterHandle) {
    if handle.is_null() {
        return;
    }

    // SAFETY: `handle` was validated as non-NULL above and was originally
    // created by `Box::into_raw` in `flowdoc_converter_new`.
    unsafe { drop(Box::from_raw(handle)) };
}
