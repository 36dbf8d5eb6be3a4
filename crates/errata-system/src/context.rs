// SPDX-License-Identifier: MIT OR Apache-2.0
//! The O/S failure record a [`SystemError`](crate::SystemError) wraps.

use crate::errno::{errno_message, errno_name};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

/// A path as the O/S reported it: text, or raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathValue {
    /// UTF-8 text.
    Text(String),
    /// Raw bytes, possibly not UTF-8.
    Bytes(Vec<u8>),
}

impl PathValue {
    /// The raw byte form.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    /// Text form, replacing invalid UTF-8.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Bytes(bytes) => String::from_utf8_lossy(bytes),
        }
    }
}

impl fmt::Display for PathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl From<&str> for PathValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for PathValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<u8>> for PathValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for PathValue {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<&Path> for PathValue {
    fn from(path: &Path) -> Self {
        match path.to_str() {
            Some(text) => Self::Text(text.to_string()),
            None => Self::Bytes(path.as_os_str().as_encoded_bytes().to_vec()),
        }
    }
}

/// What the O/S said about a failed call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemFailureContext {
    /// Symbolic code, e.g. `ENOENT`.
    pub code: String,
    /// The system call that failed.
    pub syscall: String,
    /// Human description of `code`.
    pub message: String,
    /// Path the call operated on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathValue>,
    /// Destination path, for two-path calls such as `rename`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<PathValue>,
    /// Numeric errno.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errno: Option<i32>,
}

impl SystemFailureContext {
    /// A context with no path, dest or errno.
    pub fn new(
        code: impl Into<String>,
        syscall: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            syscall: syscall.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Set the path.
    pub fn with_path(mut self, path: impl Into<PathValue>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the destination path.
    pub fn with_dest(mut self, dest: impl Into<PathValue>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    /// Set the numeric errno.
    pub fn with_errno(mut self, errno: i32) -> Self {
        self.errno = Some(errno);
        self
    }

    /// Describe `err`, raised by `syscall`.
    ///
    /// Errors without a raw O/S code get code `UNKNOWN` and their display
    /// text as message.
    pub fn from_io_error(err: &io::Error, syscall: impl Into<String>) -> Self {
        let errno = err.raw_os_error();
        let code = errno.and_then(errno_name).unwrap_or("UNKNOWN");
        let message = match errno.and_then(errno_message) {
            Some(message) => message.to_string(),
            None => err.to_string(),
        };
        Self {
            code: code.to_string(),
            syscall: syscall.into(),
            message,
            errno,
            ..Self::default()
        }
    }
}

/// A [`SystemFailureContext`] shared between the code that raised it and
/// the errors wrapping it.
///
/// Clones share the same record; an update through one is seen by all.
#[derive(Debug, Clone, Default)]
pub struct SharedContext(Arc<RwLock<SystemFailureContext>>);

impl SharedContext {
    /// Share `context`.
    pub fn new(context: SystemFailureContext) -> Self {
        Self(Arc::new(RwLock::new(context)))
    }

    /// Borrow the current record.
    pub fn read(&self) -> RwLockReadGuard<'_, SystemFailureContext> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate the record in place.
    pub fn update<R>(&self, f: impl FnOnce(&mut SystemFailureContext) -> R) -> R {
        let mut guard = self.0.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Copy of the current record.
    pub fn snapshot(&self) -> SystemFailureContext {
        self.read().clone()
    }

    /// Whether both handles share one record.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<SystemFailureContext> for SharedContext {
    fn from(context: SystemFailureContext) -> Self {
        Self::new(context)
    }
}
