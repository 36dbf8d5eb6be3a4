// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame records and the capture seam.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::Location;

/// One entry of a captured call sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frame {
    /// Function name, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// Source file, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// 1-based line number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// 1-based column number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    /// Contributed by error machinery; never shown to users.
    #[serde(default)]
    pub internal: bool,
}

impl Frame {
    /// A user frame for `function` with no location.
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: Some(function.into()),
            ..Self::default()
        }
    }

    /// An internal frame for `function`.
    pub fn internal(function: impl Into<String>) -> Self {
        Self::new(function).mark_internal()
    }

    /// An anonymous user frame pointing at `location`.
    pub fn at(location: &Location<'_>) -> Self {
        Self {
            file: Some(location.file().to_string()),
            line: Some(location.line()),
            column: Some(location.column()),
            ..Self::default()
        }
    }

    /// An anonymous user frame pointing at the caller.
    #[track_caller]
    pub fn here() -> Self {
        Self::at(Location::caller())
    }

    /// Attach a source location.
    pub fn with_location(mut self, file: impl Into<String>, line: u32, column: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Attach a function name.
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// Tag the frame as internal.
    pub fn mark_internal(mut self) -> Self {
        self.internal = true;
        self
    }

    /// `file:line:col`, or as much of it as is known.
    pub fn location(&self) -> Option<String> {
        let file = self.file.as_deref()?;
        Some(match (self.line, self.column) {
            (Some(line), Some(col)) => format!("{file}:{line}:{col}"),
            (Some(line), None) => format!("{file}:{line}"),
            _ => file.to_string(),
        })
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.function.as_deref(), self.location()) {
            (Some(func), Some(loc)) => write!(f, "{func} ({loc})"),
            (Some(func), None) => f.write_str(func),
            (None, Some(loc)) => f.write_str(&loc),
            (None, None) => f.write_str("<anonymous>"),
        }
    }
}

/// Something that can report the currently executing call sequence.
pub trait FrameSource: Send + Sync {
    /// Return at most `limit` frames, newest first.
    fn capture(&self, limit: usize) -> Vec<Frame>;
}
