// SPDX-License-Identifier: MIT OR Apache-2.0
//! Combining two failures from the same operation.

use crate::code::ErrorCode;
use crate::error::CodedError;
use std::fmt;

/// Several errors reported as one, carrying the code and message of the
/// first.
#[derive(Debug)]
pub struct AggregateError {
    code: ErrorCode,
    message: String,
    errors: Vec<CodedError>,
}

impl AggregateError {
    /// Aggregate `outer` and `inner`, in that order.
    pub fn new(outer: CodedError, inner: CodedError) -> Self {
        Self {
            code: outer.code().clone(),
            message: outer.message().to_string(),
            errors: vec![outer, inner],
        }
    }

    /// Code of the first error.
    pub fn code(&self) -> &ErrorCode {
        &self.code
    }

    /// Message of the first error.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Every collected error, oldest first.
    pub fn errors(&self) -> &[CodedError] {
        &self.errors
    }

    /// Add one more error.
    pub fn push(&mut self, err: CodedError) {
        self.errors.push(err);
    }

    /// Take the collected errors.
    pub fn into_errors(self) -> Vec<CodedError> {
        self.errors
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AggregateError [{}]: {}", self.code, self.message)
    }
}

impl std::error::Error for AggregateError {}

/// Either a single error or an aggregate of several.
#[derive(Debug)]
pub enum Combined {
    /// Only one error was present.
    Single(CodedError),
    /// Both were present.
    Aggregate(AggregateError),
}

impl Combined {
    /// Code of the single error, or of the aggregate.
    pub fn code(&self) -> &ErrorCode {
        match self {
            Self::Single(err) => err.code(),
            Self::Aggregate(agg) => agg.code(),
        }
    }
}

impl fmt::Display for Combined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(err) => fmt::Display::fmt(err, f),
            Self::Aggregate(agg) => fmt::Display::fmt(agg, f),
        }
    }
}

/// Merge an error raised while cleaning up (`inner`) with the error that
/// triggered the cleanup (`outer`).
///
/// An aggregate `outer` absorbs `inner`; two plain errors become a new
/// aggregate keeping `outer`'s code and message; a lone error passes through.
pub fn aggregate_two_errors(inner: Option<CodedError>, outer: Option<Combined>) -> Option<Combined> {
    match (inner, outer) {
        (Some(inner), Some(Combined::Aggregate(mut agg))) => {
            agg.push(inner);
            Some(Combined::Aggregate(agg))
        }
        (Some(inner), Some(Combined::Single(outer))) => {
            Some(Combined::Aggregate(AggregateError::new(outer, inner)))
        }
        (Some(inner), None) => Some(Combined::Single(inner)),
        (None, outer) => outer,
    }
}
