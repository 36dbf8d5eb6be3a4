// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error code identifiers.

use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};
use std::fmt;

/// Prefix every built-in code carries.
pub const DEFAULT_CODE_PREFIX: &str = "ERR_";

/// A permanent, machine-readable error identifier such as
/// `ERR_INVALID_ARG_TYPE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(Cow<'static, str>);

impl ErrorCode {
    /// Wrap a code known at compile time.
    pub const fn from_static(code: &'static str) -> Self {
        Self(Cow::Borrowed(code))
    }

    /// Wrap an owned code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(Cow::Owned(code.into()))
    }

    /// The code text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ErrorCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ErrorCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for ErrorCode {
    fn from(code: &'static str) -> Self {
        Self::from_static(code)
    }
}

impl PartialEq<str> for ErrorCode {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ErrorCode {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Whether `code` is `prefix` followed by upper-snake-case segments.
///
/// ```
/// use errata_error::is_valid_code;
///
/// assert!(is_valid_code("ERR_", "ERR_OUT_OF_RANGE"));
/// assert!(is_valid_code("ERR_", "ERR_HTTP2_STREAM_ERROR"));
/// assert!(!is_valid_code("ERR_", "ERR_lowercase"));
/// assert!(!is_valid_code("ERR_", "OUT_OF_RANGE"));
/// ```
pub fn is_valid_code(prefix: &str, code: &str) -> bool {
    let Some(rest) = code.strip_prefix(prefix) else {
        return false;
    };
    !rest.is_empty()
        && rest.split('_').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        })
}
