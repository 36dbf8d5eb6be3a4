// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod controller;
mod frame;
mod shadow;

pub use controller::{
    DEFAULT_FRAME_LIMIT, DeepCapture, ErrorId, LimitGuard, PrepareHook, StackController,
    StackInput, StackOverride, hide_internal_frames,
};
pub use frame::{Frame, FrameSource};
pub use shadow::{
    DEFAULT_MAX_DEPTH, FrameGuard, RecursionLimitExceeded, ShadowStack, hide_stack_frames,
    is_stack_overflow_error,
};
