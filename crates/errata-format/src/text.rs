// SPDX-License-Identifier: MIT OR Apache-2.0
//! Small text helpers used by message builders.

use crate::inspect::{inspect, js_number, number_text};
use serde_json::Value;

/// Group the digits of an integer with `_` every three places from the
/// right, keeping a leading `-` in place.
///
/// ```
/// use errata_format::add_numerical_separator;
///
/// assert_eq!(add_numerical_separator("1234567"), "1_234_567");
/// assert_eq!(add_numerical_separator("-42"), "-42");
/// ```
pub fn add_numerical_separator(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let start = usize::from(chars.first() == Some(&'-'));
    let mut groups: Vec<String> = Vec::new();
    let mut i = chars.len();
    while i >= start + 4 {
        groups.push(chars[i - 3..i].iter().collect());
        i -= 3;
    }
    let mut out: String = chars[..i].iter().collect();
    for group in groups.iter().rev() {
        out.push('_');
        out.push_str(group);
    }
    out
}

/// Join `items` into an English list using `conjunction` before the last
/// element: `a`, `a or b`, `a, b, or c`.
pub fn format_list<S: AsRef<str>>(items: &[S], conjunction: &str) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [first, second] => format!("{} {conjunction} {}", first.as_ref(), second.as_ref()),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(AsRef::as_ref).collect();
            format!("{}, {conjunction} {}", head.join(", "), last.as_ref())
        }
    }
}

/// Describe the concrete type (and a short rendering) of `value` for
/// "Received ..." message suffixes.
pub fn determine_specific_type(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("type boolean ({b})"),
        Value::Number(n) => {
            let text = match n.as_f64() {
                Some(x) if x == 0.0 && x.is_sign_negative() => js_number(x),
                _ => number_text(n),
            };
            format!("type number ({text})")
        }
        Value::String(s) => {
            let shown = if s.chars().count() > 28 {
                let head: String = s.chars().take(25).collect();
                format!("{head}...")
            } else {
                s.clone()
            };
            if shown.contains('\'') {
                format!("type string ({})", Value::String(shown))
            } else {
                format!("type string ('{shown}')")
            }
        }
        Value::Array(_) => "an instance of Array".to_string(),
        Value::Object(_) => "an instance of Object".to_string(),
    }
}

/// [`inspect`] cut to at most `max` characters, with a `...` marker.
pub fn inspect_truncated(value: &Value, max: usize) -> String {
    let full = inspect(value);
    if full.chars().count() > max {
        let head: String = full.chars().take(max).collect();
        format!("{head}...")
    } else {
        full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn separator_groups_from_the_right() {
        assert_eq!(add_numerical_separator("1234567"), "1_234_567");
        assert_eq!(add_numerical_separator("123456"), "123_456");
        assert_eq!(add_numerical_separator("1000"), "1_000");
        assert_eq!(add_numerical_separator("999"), "999");
    }

    #[test]
    fn separator_keeps_sign() {
        assert_eq!(add_numerical_separator("-42"), "-42");
        assert_eq!(add_numerical_separator("-1234"), "-1_234");
        assert_eq!(add_numerical_separator("-4294967297"), "-4_294_967_297");
    }

    #[test]
    fn separator_on_empty_input() {
        assert_eq!(add_numerical_separator(""), "");
        assert_eq!(add_numerical_separator("-"), "-");
    }

    #[test]
    fn list_shapes() {
        let none: [&str; 0] = [];
        assert_eq!(format_list(&none, "and"), "");
        assert_eq!(format_list(&["a"], "and"), "a");
        assert_eq!(format_list(&["a", "b"], "or"), "a or b");
        assert_eq!(format_list(&["a", "b", "c"], "and"), "a, b, and c");
    }

    #[test]
    fn specific_type_scalars() {
        assert_eq!(determine_specific_type(&json!(null)), "null");
        assert_eq!(determine_specific_type(&json!(5)), "type number (5)");
        assert_eq!(determine_specific_type(&json!(-0.0)), "type number (-0)");
        assert_eq!(
            determine_specific_type(&json!(false)),
            "type boolean (false)"
        );
    }

    #[test]
    fn specific_type_strings() {
        assert_eq!(determine_specific_type(&json!("abc")), "type string ('abc')");
        assert_eq!(
            determine_specific_type(&json!("it's")),
            "type string (\"it's\")"
        );
        let long = "x".repeat(40);
        assert_eq!(
            determine_specific_type(&json!(long)),
            format!("type string ('{}...')", "x".repeat(25))
        );
    }

    #[test]
    fn truncated_inspection() {
        assert_eq!(inspect_truncated(&json!("abc"), 10), "'abc'");
        assert_eq!(inspect_truncated(&json!("abcdef"), 4), "'abc...");
    }

    #[test]
    fn specific_type_objects() {
        assert_eq!(
            determine_specific_type(&json!([1])),
            "an instance of Array"
        );
        assert_eq!(
            determine_specific_type(&json!({"a": 1})),
            "an instance of Object"
        );
    }
}
