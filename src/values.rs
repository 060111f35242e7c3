//! Value converters from flow document syntax to CSS syntax
//!
//! Both converters are total: input they do not understand is passed through
//! (colors) or replaced by zero (sizes), never rejected.

use regex::Regex;
use std::sync::OnceLock;

/// `#AARRGGBB` color token
fn argb_color_regex() -> Option<&'static Regex> {
    static ARGB: OnceLock<Option<Regex>> = OnceLock::new();
    ARGB.get_or_init(|| Regex::new(r"^#[0-9A-Fa-f]{8}$").ok()).as_ref()
}

/// Translate a flow document color to a CSS color
///
/// `#AARRGGBB` drops the alpha channel and becomes `#RRGGBB`. Anything else
/// (named colors, `#RRGGBB`) is returned unchanged.
///
/// # Examples
///
/// ```
/// use flowdoc_clipboard::values::translate_color;
///
/// assert_eq!(translate_color("#FF112233"), "#112233");
/// assert_eq!(translate_color("red"), "red");
/// assert_eq!(translate_color("#112233"), "#112233");
/// ```
pub fn translate_color(value: &str) -> String {
    if argb_color_regex().is_some_and(|regex| regex.is_match(value)) {
        format!("#{}", &value[3..])
    } else {
        value.to_string()
    }
}

/// Translate a comma separated list of lengths to a space separated CSS list
///
/// Each token is parsed as a floating point number (0 if unparsable or not
/// finite), rounded up to the next integer, and suffixed with `unit`.
///
/// # Examples
///
/// ```
/// use flowdoc_clipboard::values::translate_size;
///
/// assert_eq!(translate_size("1.1,2.9", "px"), "2px 3px");
/// assert_eq!(translate_size("12", "pt"), "12pt");
/// assert_eq!(translate_size("Auto", "px"), "0px");
/// ```
pub fn translate_size(value: &str, unit: &str) -> String {
    let mut output = String::with_capacity(value.len() + 8);

    for (index, token) in value.split(',').enumerate() {
        if index > 0 {
            output.push(' ');
        }
        output.push_str(&ceil_token(token));
        output.push_str(unit);
    }

    output
}

fn ceil_token(token: &str) -> String {
    let parsed = token
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0);

    let ceiled = parsed.ceil();
    // -0.5 rounds up to negative zero
    let ceiled = if ceiled == 0.0 { 0.0 } else { ceiled };
    format!("{:.0}", ceiled)
}
