// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz printf-style message formatting.
//!
//! The first byte picks how many arguments are supplied, the rest is the
//! template. Verifies:
//! 1. `format` never panics whatever the specifier/argument mismatch.
//! 2. A template without `%` comes back unchanged.
//! 3. `count_specifiers` never exceeds the number of `%` characters.
#![no_main]
use arbitrary::Arbitrary;
use errata_format::{Arg, count_specifiers, format, inspect};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    template: String,
    strings: Vec<String>,
    numbers: Vec<f64>,
    flags: Vec<bool>,
}

fuzz_target!(|input: Input| {
    let mut args: Vec<Arg> = Vec::new();
    args.extend(input.strings.iter().cloned().map(Arg::from));
    args.extend(input.numbers.iter().map(|n| {
        serde_json::Number::from_f64(*n).map_or(Arg::Null, Arg::Number)
    }));
    args.extend(input.flags.iter().copied().map(Arg::from));

    let rendered = format(&input.template, &args);
    if !input.template.contains('%') && args.is_empty() {
        assert_eq!(rendered, input.template);
    }

    let count = count_specifiers(&input.template);
    assert!(count <= input.template.matches('%').count());

    for arg in &args {
        let _ = inspect(arg);
    }
});
