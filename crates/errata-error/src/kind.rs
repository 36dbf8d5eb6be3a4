// SPDX-License-Identifier: MIT OR Apache-2.0
//! Base error kinds a code may be raised as.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The family an error belongs to, independent of its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseKind {
    /// Plain `Error`.
    Generic,
    /// `TypeError`: a value had the wrong type.
    TypeMismatch,
    /// `RangeError`: a value was outside its allowed range.
    OutOfRange,
    /// `SyntaxError`: malformed input.
    Syntax,
    /// `SystemError`: an operating-system call failed.
    SystemFailure,
}

impl BaseKind {
    /// Every kind, in declaration order.
    pub const ALL: [BaseKind; 5] = [
        Self::Generic,
        Self::TypeMismatch,
        Self::OutOfRange,
        Self::Syntax,
        Self::SystemFailure,
    ];

    /// The conventional display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Generic => "Error",
            Self::TypeMismatch => "TypeError",
            Self::OutOfRange => "RangeError",
            Self::Syntax => "SyntaxError",
            Self::SystemFailure => "SystemError",
        }
    }
}

impl fmt::Display for BaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_distinct() {
        let mut names: Vec<_> = BaseKind::ALL.iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BaseKind::ALL.len());
    }

    #[test]
    fn serde_snake_case() {
        let json = serde_json::to_string(&BaseKind::OutOfRange).unwrap();
        assert_eq!(json, r#""out_of_range""#);
    }
}
