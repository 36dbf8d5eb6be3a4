// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property-based tests for `errata-format`.

use errata_format::{Arg, add_numerical_separator, count_specifiers, format};
use proptest::prelude::*;

/// Strategy: template text without any `%` characters.
fn plain_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,:'\"()-]{0,12}".prop_map(|s| s.to_string())
}

/// Strategy: a template built from plain chunks joined by `%s`.
fn string_template() -> impl Strategy<Value = (String, usize)> {
    prop::collection::vec(plain_text(), 1..6).prop_map(|chunks| {
        let n = chunks.len() - 1;
        (chunks.join("%s"), n)
    })
}

// ── 1. Separator output strips back to the input ───────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]
    #[test]
    fn separator_preserves_digits(n in any::<i64>()) {
        let text = n.to_string();
        let grouped = add_numerical_separator(&text);
        prop_assert_eq!(grouped.replace('_', ""), text);
    }
}

// ── 2. Every group after the first has exactly three digits ────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]
    #[test]
    fn separator_groups_are_three_wide(n in any::<u64>()) {
        let grouped = add_numerical_separator(&n.to_string());
        let mut parts = grouped.split('_');
        let head = parts.next().unwrap();
        prop_assert!(!head.is_empty() && head.len() <= 3);
        for part in parts {
            prop_assert_eq!(part.len(), 3);
        }
    }
}

// ── 3. Specifier counting matches how the template was built ───────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]
    #[test]
    fn count_matches_construction((template, n) in string_template()) {
        prop_assert_eq!(count_specifiers(&template), n);
    }
}

// ── 4. Exact-arity substitution consumes every specifier ───────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]
    #[test]
    fn exact_arity_leaves_no_specifier(
        (template, n) in string_template(),
        word in "[a-z]{1,6}",
    ) {
        let args: Vec<Arg> = (0..n).map(|_| Arg::String(word.clone())).collect();
        let out = format(&template, &args);
        prop_assert!(!out.contains("%s"));
        prop_assert_eq!(out, template.replace("%s", &word));
    }
}

// ── 5. Formatting never panics on arbitrary input ──────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]
    #[test]
    fn format_never_panics(template in ".{0,40}", nums in prop::collection::vec(any::<i32>(), 0..4)) {
        let args: Vec<Arg> = nums.into_iter().map(Arg::from).collect();
        let _ = format(&template, &args);
        let _ = count_specifiers(&template);
    }
}
