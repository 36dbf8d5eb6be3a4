// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod aggregate;
mod catalog;
mod code;
mod error;
mod kind;
mod registry;
mod template;

pub use aggregate::{AggregateError, Combined, aggregate_two_errors};
pub use catalog::BUILTIN_CODES;
pub use code::{DEFAULT_CODE_PREFIX, ErrorCode, is_valid_code};
pub use error::{CodedError, CodedErrorDto};
pub use kind::BaseKind;
pub use registry::{ErrorVariant, FACTORY_FRAME, Registry, registry};
pub use template::{Extras, MessageFn, MessageTemplate, TemplateStore, render_template};

pub use errata_format::{Arg, args};

/// Construct a [`CodedError`] from the process-wide [`registry`].
///
/// ```
/// use errata_error::coded_error;
///
/// let err = coded_error!("ERR_INVALID_ARG_TYPE", TypeMismatch, "fd", ["number"], "abc");
/// assert_eq!(
///     err.to_string(),
///     "TypeError [ERR_INVALID_ARG_TYPE]: The \"fd\" argument must be of type number. \
///      Received type string ('abc')"
/// );
/// ```
#[macro_export]
macro_rules! coded_error {
    ($code:expr, $kind:ident $(, $arg:expr)* $(,)?) => {
        $crate::registry().create($code, $crate::BaseKind::$kind, &$crate::args![$($arg),*])
    };
}
