// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod errno;
mod error;
mod exception;

pub use context::{PathValue, SharedContext, SystemFailureContext};
pub use errno::{
    ERRNO_TABLE, ErrnoEntry, errno_entry, errno_from_name, errno_message, errno_name,
    system_error_name,
};
pub use error::{AccessorError, SystemError};
pub use exception::{
    OsError, conn_reset_exception, errno_exception, exception_with_host_port, uv_exception,
    uv_exception_with_host_port,
};
