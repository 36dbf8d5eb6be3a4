// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flat errors keyed by symbolic errno names.

use crate::context::SystemFailureContext;
use crate::errno::{errno_entry, system_error_name};
use errata_stack::{Frame, ShadowStack, StackController, StackInput};
use std::fmt;
use std::panic::Location;
use tracing::trace;

const CAPTURE_FRAME: &str = "OsError::capture";

/// A plain (non-taxonomy) error describing a failed O/S call.
#[derive(Debug)]
pub struct OsError {
    message: String,
    code: String,
    errno: Option<i32>,
    syscall: Option<String>,
    address: Option<String>,
    port: Option<u16>,
    path: Option<String>,
    dest: Option<String>,
    frames: Vec<Frame>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl OsError {
    fn capture(call_site: &Location<'_>, message: String, code: String) -> Self {
        let frames = {
            let _site = ShadowStack::push(Frame::at(call_site));
            let _machinery = ShadowStack::push_internal(CAPTURE_FRAME);
            StackController::global().capture_visible()
        };
        trace!(target: "errata.system", %code, "os error constructed");
        Self {
            message,
            code,
            errno: None,
            syscall: None,
            address: None,
            port: None,
            path: None,
            dest: None,
            frames,
            source: None,
        }
    }

    /// The message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Symbolic code, e.g. `ECONNRESET`.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Numeric errno, if known.
    pub fn errno(&self) -> Option<i32> {
        self.errno
    }

    /// Failing system call, if known.
    pub fn syscall(&self) -> Option<&str> {
        self.syscall.as_deref()
    }

    /// Remote or local address involved.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Port involved.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Path involved.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Destination path involved.
    pub fn dest(&self) -> Option<&str> {
        self.dest.as_deref()
    }

    /// Visible frames captured at construction.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// The stack rendered through the global controller.
    pub fn stack(&self) -> String {
        StackController::global().render(
            None,
            &StackInput {
                name: "Error",
                message: &self.message,
                frames: &self.frames,
            },
        )
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for OsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for OsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| &**e as &(dyn std::error::Error + 'static))
    }
}

/// `<syscall> <CODE>[ <original>]`, with `errno`, `code` and `syscall` set.
#[track_caller]
pub fn errno_exception(errno: i32, syscall: &str, original: Option<&str>) -> OsError {
    let code = system_error_name(errno);
    let message = match original {
        Some(original) => format!("{syscall} {code} {original}"),
        None => format!("{syscall} {code}"),
    };
    let mut err = OsError::capture(Location::caller(), message, code);
    err.errno = Some(errno);
    err.syscall = Some(syscall.to_string());
    err
}

fn host_port_details(address: &str, port: Option<u16>) -> String {
    match port {
        Some(port) if port > 0 => format!(" {address}:{port}"),
        _ if !address.is_empty() => format!(" {address}"),
        _ => String::new(),
    }
}

/// Like [`errno_exception`] with `<address>:<port>` appended, and
/// ` - Local (<additional>)` when a local endpoint is given.
#[track_caller]
pub fn exception_with_host_port(
    errno: i32,
    syscall: &str,
    address: &str,
    port: Option<u16>,
    additional: Option<&str>,
) -> OsError {
    let code = system_error_name(errno);
    let mut details = host_port_details(address, port);
    if let Some(local) = additional {
        details.push_str(&format!(" - Local ({local})"));
    }
    let message = format!("{syscall} {code}{details}");
    let mut err = OsError::capture(Location::caller(), message, code);
    err.errno = Some(errno);
    err.syscall = Some(syscall.to_string());
    err.address = Some(address.to_string());
    err.port = port.filter(|&p| p > 0);
    err
}

/// `<CODE>: <message>, <syscall>[ '<path>'][ -> '<dest>']` from a context
/// whose `errno` is resolved through the errno table.
///
/// The context message wins over the table's when non-empty; unknown
/// errnos become `UNKNOWN: unknown error`.
#[track_caller]
pub fn uv_exception(ctx: &SystemFailureContext) -> OsError {
    let (code, table_message) = match ctx.errno.and_then(errno_entry) {
        Some(entry) => (entry.name, entry.message),
        None => ("UNKNOWN", "unknown error"),
    };
    let detail = if ctx.message.is_empty() {
        table_message
    } else {
        ctx.message.as_str()
    };
    let mut message = format!("{code}: {detail}, {}", ctx.syscall);
    let path = ctx.path.as_ref().map(|p| p.to_string_lossy().into_owned());
    let dest = ctx.dest.as_ref().map(|p| p.to_string_lossy().into_owned());
    if let Some(path) = &path {
        message.push_str(&format!(" '{path}'"));
    }
    if let Some(dest) = &dest {
        message.push_str(&format!(" -> '{dest}'"));
    }
    let mut err = OsError::capture(Location::caller(), message, code.to_string());
    err.errno = ctx.errno;
    err.syscall = Some(ctx.syscall.clone());
    err.path = path;
    err.dest = dest;
    err
}

/// `<syscall> <CODE>: <message>` plus the address and port.
#[track_caller]
pub fn uv_exception_with_host_port(
    errno: i32,
    syscall: &str,
    address: &str,
    port: Option<u16>,
) -> OsError {
    let (code, table_message) = match errno_entry(errno) {
        Some(entry) => (entry.name, entry.message),
        None => ("UNKNOWN", "unknown error"),
    };
    let details = host_port_details(address, port);
    let message = format!("{syscall} {code}: {table_message}{details}");
    let mut err = OsError::capture(Location::caller(), message, code.to_string());
    err.errno = Some(errno);
    err.syscall = Some(syscall.to_string());
    err.address = Some(address.to_string());
    err.port = port.filter(|&p| p > 0);
    err
}

/// A peer reset the connection.
#[track_caller]
pub fn conn_reset_exception(message: &str) -> OsError {
    OsError::capture(
        Location::caller(),
        message.to_string(),
        "ECONNRESET".to_string(),
    )
}
