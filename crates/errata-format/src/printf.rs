// SPDX-License-Identifier: MIT OR Apache-2.0
//! `printf`-style substitution of positional specifiers.

use crate::Arg;
use crate::inspect::{inspect, js_number};
use serde_json::Value;

/// Characters that form a specifier when they follow a `%`.
pub const SPECIFIERS: &[char] = &['s', 'd', 'i', 'f', 'j', 'o', 'O', 'c'];

fn is_specifier(c: char) -> bool {
    SPECIFIERS.contains(&c)
}

/// Count the positional specifiers in `template`.
///
/// `%%` is an escaped percent sign and does not count.
pub fn count_specifiers(template: &str) -> usize {
    let mut count = 0;
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        match chars.peek() {
            Some('%') => {
                chars.next();
            }
            Some(&next) if is_specifier(next) => {
                chars.next();
                count += 1;
            }
            _ => {}
        }
    }
    count
}

/// Substitute `args` into `template` positionally.
///
/// With no arguments the template is returned untouched. Specifiers left
/// without an argument are emitted literally; arguments left without a
/// specifier are appended, separated by a space.
pub fn format(template: &str, args: &[Arg]) -> String {
    if args.is_empty() {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut rest = args.iter();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some(conv) if is_specifier(conv) => match rest.next() {
                Some(arg) => {
                    chars.next();
                    substitute(conv, arg, &mut out);
                }
                None => out.push('%'),
            },
            _ => out.push('%'),
        }
    }

    for arg in rest {
        out.push(' ');
        match arg {
            Value::String(s) => out.push_str(s),
            other => out.push_str(&inspect(other)),
        }
    }
    out
}

fn substitute(conv: char, arg: &Arg, out: &mut String) {
    match conv {
        's' => match arg {
            Value::String(s) => out.push_str(s),
            other => out.push_str(&inspect(other)),
        },
        'd' => out.push_str(&js_number(to_number(arg).unwrap_or(f64::NAN))),
        'i' => out.push_str(&js_number(to_number(arg).unwrap_or(f64::NAN).trunc())),
        'f' => out.push_str(&js_number(to_float(arg))),
        'j' => out.push_str(&arg.to_string()),
        'o' | 'O' => out.push_str(&inspect(arg)),
        // %c consumes its argument and prints nothing.
        _ => {}
    }
}

fn to_number(arg: &Arg) -> Option<f64> {
    match arg {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Like `parseFloat`: the longest numeric prefix of a string.
fn to_float(arg: &Arg) -> f64 {
    match arg {
        Value::String(s) => {
            let trimmed = s.trim_start();
            let end = trimmed
                .char_indices()
                .take_while(|(i, c)| {
                    c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+'))
                })
                .map(|(i, c)| i + c.len_utf8())
                .last()
                .unwrap_or(0);
            trimmed[..end].parse::<f64>().unwrap_or(f64::NAN)
        }
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}
