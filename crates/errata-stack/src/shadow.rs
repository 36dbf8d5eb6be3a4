// SPDX-License-Identifier: MIT OR Apache-2.0
//! Thread-local shadow call stack.

use crate::frame::{Frame, FrameSource};
use std::cell::RefCell;
use std::marker::PhantomData;
use std::panic::Location;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Default maximum number of frames [`ShadowStack::enter`] accepts.
pub const DEFAULT_MAX_DEPTH: usize = 10_000;

static MAX_DEPTH: AtomicUsize = AtomicUsize::new(DEFAULT_MAX_DEPTH);

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Raised when [`ShadowStack::enter`] would exceed the configured depth.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Maximum call stack size exceeded")]
pub struct RecursionLimitExceeded {
    /// Depth at which the push was refused.
    pub depth: usize,
}

/// Handle to the calling thread's shadow call stack.
///
/// Frames are pushed with [`ShadowStack::push`] (or the fallible
/// [`ShadowStack::enter`]) and popped when the returned [`FrameGuard`] drops.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShadowStack;

impl ShadowStack {
    /// Push `frame` unconditionally.
    pub fn push(frame: Frame) -> FrameGuard {
        let depth = FRAMES.with_borrow_mut(|frames| {
            let depth = frames.len();
            frames.push(frame);
            depth
        });
        FrameGuard {
            depth,
            _not_send: PhantomData,
        }
    }

    /// Push an internal frame named `function`.
    pub fn push_internal(function: &str) -> FrameGuard {
        Self::push(Frame::internal(function))
    }

    /// Push `frame` unless the stack is already at its maximum depth.
    pub fn enter(frame: Frame) -> Result<FrameGuard, RecursionLimitExceeded> {
        let depth = Self::depth();
        if depth >= Self::max_depth() {
            return Err(RecursionLimitExceeded { depth });
        }
        Ok(Self::push(frame))
    }

    /// [`ShadowStack::enter`] with the caller's source location attached.
    #[track_caller]
    pub fn enter_here(function: impl Into<String>) -> Result<FrameGuard, RecursionLimitExceeded> {
        let location = Location::caller();
        Self::enter(Frame::at(location).with_function(function))
    }

    /// Number of frames currently on this thread's stack.
    pub fn depth() -> usize {
        FRAMES.with_borrow(Vec::len)
    }

    /// Current depth limit for [`ShadowStack::enter`].
    pub fn max_depth() -> usize {
        MAX_DEPTH.load(Ordering::Relaxed)
    }

    /// Change the depth limit for every thread.
    pub fn set_max_depth(depth: usize) {
        MAX_DEPTH.store(depth, Ordering::Relaxed);
    }

    /// All frames on this thread's stack, newest first.
    pub fn snapshot() -> Vec<Frame> {
        FRAMES.with_borrow(|frames| frames.iter().rev().cloned().collect())
    }
}

impl FrameSource for ShadowStack {
    fn capture(&self, limit: usize) -> Vec<Frame> {
        FRAMES.with_borrow(|frames| frames.iter().rev().take(limit).cloned().collect())
    }
}

/// Pops its frame (and anything pushed above it) when dropped.
#[must_use = "the frame is popped as soon as the guard is dropped"]
#[derive(Debug)]
pub struct FrameGuard {
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        let _ = FRAMES.try_with(|frames| frames.borrow_mut().truncate(self.depth));
    }
}

/// Run `f` inside an internal frame so nothing it captures shows the
/// machinery above the caller.
pub fn hide_stack_frames<R>(name: &str, f: impl FnOnce() -> R) -> R {
    let _guard = ShadowStack::push_internal(name);
    f()
}

/// Whether `err` (or anything in its source chain) is a recursion-limit
/// failure.
pub fn is_stack_overflow_error(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<RecursionLimitExceeded>() {
            return true;
        }
        current = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn guards_pop_in_order() {
        let base = ShadowStack::depth();
        {
            let _a = ShadowStack::push(Frame::new("a"));
            {
                let _b = ShadowStack::push(Frame::new("b"));
                assert_eq!(ShadowStack::depth(), base + 2);
                let top = ShadowStack::snapshot();
                assert_eq!(top[0].function.as_deref(), Some("b"));
                assert_eq!(top[1].function.as_deref(), Some("a"));
            }
            assert_eq!(ShadowStack::depth(), base + 1);
        }
        assert_eq!(ShadowStack::depth(), base);
    }

    #[test]
    fn forgotten_guard_is_cleaned_by_outer_guard() {
        let base = ShadowStack::depth();
        {
            let _outer = ShadowStack::push(Frame::new("outer"));
            std::mem::forget(ShadowStack::push(Frame::new("leaked")));
            assert_eq!(ShadowStack::depth(), base + 2);
        }
        assert_eq!(ShadowStack::depth(), base);
    }

    #[test]
    fn capture_respects_limit() {
        let _a = ShadowStack::push(Frame::new("a"));
        let _b = ShadowStack::push(Frame::new("b"));
        let _c = ShadowStack::push(Frame::new("c"));
        let frames = ShadowStack.capture(2);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].function.as_deref(), Some("c"));
        assert!(ShadowStack.capture(0).is_empty());
    }

    #[test]
    #[serial]
    fn enter_here_records_location() {
        let _g = ShadowStack::enter_here("probe").unwrap();
        let frames = ShadowStack::snapshot();
        let top = &frames[0];
        assert_eq!(top.function.as_deref(), Some("probe"));
        assert!(top.file.as_deref().unwrap().ends_with("shadow.rs"));
    }

    #[test]
    #[serial]
    fn enter_refuses_past_max_depth() {
        let previous = ShadowStack::max_depth();
        ShadowStack::set_max_depth(ShadowStack::depth() + 1);
        let first = ShadowStack::enter(Frame::new("ok"));
        assert!(first.is_ok());
        let err = ShadowStack::enter(Frame::new("too deep")).unwrap_err();
        assert_eq!(err.to_string(), "Maximum call stack size exceeded");
        drop(first);
        ShadowStack::set_max_depth(previous);
    }

    #[test]
    fn hide_stack_frames_pushes_internal_frame() {
        let inner = hide_stack_frames("validate", ShadowStack::snapshot);
        assert!(inner[0].internal);
        assert_eq!(inner[0].function.as_deref(), Some("validate"));
    }

    #[test]
    fn overflow_detection_walks_source_chain() {
        #[derive(Debug, thiserror::Error)]
        #[error("wrapped")]
        struct Wrapper(#[source] RecursionLimitExceeded);

        let direct = RecursionLimitExceeded { depth: 3 };
        assert!(is_stack_overflow_error(&direct));
        assert!(is_stack_overflow_error(&Wrapper(direct)));
        let other = std::io::Error::other("nope");
        assert!(!is_stack_overflow_error(&other));
    }
}
