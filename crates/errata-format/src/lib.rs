// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod inspect;
mod printf;
mod text;

pub use inspect::{inspect, js_number};
pub use printf::{SPECIFIERS, count_specifiers, format};
pub use text::{add_numerical_separator, determine_specific_type, format_list, inspect_truncated};

#[doc(hidden)]
pub use serde_json;

/// A single positional argument passed to a message template.
pub type Arg = serde_json::Value;

/// Build a `Vec<Arg>` from a list of serialisable expressions.
///
/// ```
/// use errata_format::args;
///
/// let a = args!["fd", 3, true];
/// assert_eq!(a.len(), 3);
/// assert!(args![].is_empty());
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::serde_json::json!($arg)),+]
    };
}
