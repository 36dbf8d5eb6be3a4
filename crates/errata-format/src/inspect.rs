// SPDX-License-Identifier: MIT OR Apache-2.0
//! Debug rendering of argument values.

use serde_json::{Number, Value};

/// Render `value` the way a REPL would echo it back.
///
/// Strings are single-quoted (double-quoted if they contain a single quote
/// but no double quote), arrays print as `[ 1, 2 ]` and objects as
/// `{ key: 'value' }`.
pub fn inspect(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

/// Format an `f64` the way JavaScript prints numbers.
pub fn js_number(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else if x.is_infinite() {
        if x.is_sign_negative() {
            "-Infinity".to_string()
        } else {
            "Infinity".to_string()
        }
    } else if x == 0.0 && x.is_sign_negative() {
        "-0".to_string()
    } else {
        format!("{x}")
    }
}

pub(crate) fn number_text(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        js_number(n.as_f64().unwrap_or(f64::NAN))
    }
}

pub(crate) fn quote(s: &str) -> String {
    let delim = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delim);
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&number_text(n)),
        Value::String(s) => out.push_str(&quote(s)),
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push_str("[ ");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(item, out);
            }
            out.push_str(" ]");
        }
        Value::Object(map) => {
            if map.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{ ");
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if is_identifier(key) {
                    out.push_str(key);
                } else {
                    out.push_str(&quote(key));
                }
                out.push_str(": ");
                write_value(item, out);
            }
            out.push_str(" }");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars() {
        assert_eq!(inspect(&json!(null)), "null");
        assert_eq!(inspect(&json!(true)), "true");
        assert_eq!(inspect(&json!(-7)), "-7");
        assert_eq!(inspect(&json!(2.5)), "2.5");
        assert_eq!(inspect(&json!(4.0)), "4");
    }

    #[test]
    fn strings_are_quoted() {
        assert_eq!(inspect(&json!("abc")), "'abc'");
        assert_eq!(inspect(&json!("it's")), "\"it's\"");
        assert_eq!(inspect(&json!("'\"")), "'\\'\"'");
        assert_eq!(inspect(&json!("a\nb")), "'a\\nb'");
    }

    #[test]
    fn collections() {
        assert_eq!(inspect(&json!([])), "[]");
        assert_eq!(inspect(&json!({})), "{}");
        assert_eq!(inspect(&json!([1, "x"])), "[ 1, 'x' ]");
        assert_eq!(
            inspect(&json!({"a": 1, "b-c": [true]})),
            "{ a: 1, 'b-c': [ true ] }"
        );
    }

    #[test]
    fn js_number_specials() {
        assert_eq!(js_number(f64::NAN), "NaN");
        assert_eq!(js_number(f64::INFINITY), "Infinity");
        assert_eq!(js_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(js_number(-0.0), "-0");
        assert_eq!(js_number(0.0), "0");
        assert_eq!(js_number(12.0), "12");
    }
}
