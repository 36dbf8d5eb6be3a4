// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame limits, deep capture, internal-frame stripping and rendering.

use crate::frame::{Frame, FrameSource};
use crate::shadow::ShadowStack;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex, PoisonError, RwLock};
use tracing::{debug, trace};

/// Visible frame limit used until someone changes it.
pub const DEFAULT_FRAME_LIMIT: usize = 10;

static GLOBAL: LazyLock<Arc<StackController>> =
    LazyLock::new(|| Arc::new(StackController::new(Arc::new(ShadowStack))));

thread_local! {
    /// Scoped limits in force on this thread: `(controller address, limit)`.
    static SCOPED_LIMITS: RefCell<Vec<(usize, usize)>> = const { RefCell::new(Vec::new()) };
}

// ---------------------------------------------------------------------------
// ErrorId
// ---------------------------------------------------------------------------

/// Process-unique identity of one error instance, used to key per-error
/// stack overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ErrorId(u64);

impl ErrorId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ErrorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Rendering inputs and hooks
// ---------------------------------------------------------------------------

/// Everything a renderer sees about the error whose stack it formats.
#[derive(Debug, Clone, Copy)]
pub struct StackInput<'a> {
    /// Display name, e.g. `TypeError [ERR_INVALID_ARG_TYPE]`.
    pub name: &'a str,
    /// Current message.
    pub message: &'a str,
    /// Visible frames, newest first.
    pub frames: &'a [Frame],
}

impl StackInput<'_> {
    /// `name: message`, or whichever half is non-empty.
    pub fn header(&self) -> String {
        match (self.name.is_empty(), self.message.is_empty()) {
            (_, true) => self.name.to_string(),
            (true, false) => self.message.to_string(),
            (false, false) => format!("{}: {}", self.name, self.message),
        }
    }
}

/// Process-wide stack formatting hook.
pub type PrepareHook = Arc<dyn Fn(&StackInput<'_>) -> String + Send + Sync>;

/// One-shot stack formatter registered for a single error.
pub type StackOverride = Box<dyn FnOnce(&StackInput<'_>) -> String + Send>;

/// Result of a capture taken above the visible limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepCapture {
    /// Every frame the source reported, newest first.
    pub frames: Vec<Frame>,
    /// The visible limit in force when the capture started.
    pub user_limit: usize,
}

impl DeepCapture {
    /// Strip internal frames and cut to the visible limit.
    pub fn into_visible(self) -> Vec<Frame> {
        hide_internal_frames(self.frames, self.user_limit)
    }
}

// ---------------------------------------------------------------------------
// StackController
// ---------------------------------------------------------------------------

/// Owns the visible frame limit, the global prepare hook and the per-error
/// override table.
pub struct StackController {
    limit: AtomicUsize,
    source: Arc<dyn FrameSource>,
    prepare_hook: RwLock<Option<PrepareHook>>,
    overrides: Mutex<HashMap<ErrorId, StackOverride>>,
}

impl StackController {
    /// Create a controller reading frames from `source`.
    pub fn new(source: Arc<dyn FrameSource>) -> Self {
        Self {
            limit: AtomicUsize::new(DEFAULT_FRAME_LIMIT),
            source,
            prepare_hook: RwLock::new(None),
            overrides: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide controller backed by the [`ShadowStack`].
    pub fn global() -> Arc<StackController> {
        Arc::clone(&GLOBAL)
    }

    /// Current visible frame limit: the innermost scoped limit on this
    /// thread, else the configured one.
    pub fn frame_limit(&self) -> usize {
        let key = self.key();
        SCOPED_LIMITS
            .with_borrow(|scoped| {
                scoped
                    .iter()
                    .rev()
                    .find(|&&(owner, _)| owner == key)
                    .map(|&(_, limit)| limit)
            })
            .unwrap_or_else(|| self.configured_limit())
    }

    /// The process-wide limit, ignoring scoped limits.
    pub fn configured_limit(&self) -> usize {
        self.limit.load(Ordering::SeqCst)
    }

    /// Replace the process-wide visible frame limit.
    pub fn set_frame_limit(&self, limit: usize) {
        debug!(target: "errata.stack", limit, "frame limit changed");
        self.limit.store(limit, Ordering::SeqCst);
    }

    /// Set the frame limit for this thread until the returned guard drops.
    ///
    /// The previous limit comes back on every exit path, unwinding included.
    /// Other threads keep seeing their own limit.
    pub fn scoped_limit(&self, limit: usize) -> LimitGuard<'_> {
        let key = self.key();
        let index = SCOPED_LIMITS.with_borrow_mut(|scoped| {
            scoped.push((key, limit));
            scoped.len() - 1
        });
        LimitGuard {
            index,
            _scope: PhantomData,
        }
    }

    /// Capture at most [`frame_limit`](Self::frame_limit) frames.
    pub fn capture(&self) -> Vec<Frame> {
        self.source.capture(self.frame_limit())
    }

    /// Capture with the limit lifted, remembering the visible limit.
    pub fn capture_larger(&self) -> DeepCapture {
        let user_limit = self.frame_limit();
        let frames = {
            let _unbounded = self.scoped_limit(usize::MAX);
            self.capture()
        };
        trace!(target: "errata.stack", captured = frames.len(), user_limit, "deep capture");
        DeepCapture { frames, user_limit }
    }

    /// Deep capture, leading internal block removed, cut to the visible
    /// limit.
    pub fn capture_visible(&self) -> Vec<Frame> {
        self.capture_larger().into_visible()
    }

    /// Install the global prepare hook, replacing any earlier one.
    pub fn set_prepare_hook<F>(&self, hook: F)
    where
        F: Fn(&StackInput<'_>) -> String + Send + Sync + 'static,
    {
        debug!(target: "errata.stack", "prepare hook installed");
        *self.hook_slot() = Some(Arc::new(hook));
    }

    /// Remove the global prepare hook, returning it.
    pub fn clear_prepare_hook(&self) -> Option<PrepareHook> {
        debug!(target: "errata.stack", "prepare hook cleared");
        self.hook_slot().take()
    }

    /// Register a one-shot renderer for the error identified by `id`.
    ///
    /// A later registration for the same id replaces the earlier one.
    pub fn set_override<F>(&self, id: ErrorId, f: F)
    where
        F: FnOnce(&StackInput<'_>) -> String + Send + 'static,
    {
        // Replaced closures may own errors whose drop calls `forget`, so
        // they are dropped after the lock is released.
        let replaced = self.lock_overrides().insert(id, Box::new(f));
        drop(replaced);
    }

    /// Whether `id` still has an unconsumed override.
    pub fn has_override(&self, id: ErrorId) -> bool {
        self.lock_overrides().contains_key(&id)
    }

    /// Drop any override for `id` without running it.
    pub fn forget(&self, id: ErrorId) {
        let removed = self.lock_overrides().remove(&id);
        drop(removed);
    }

    /// Number of overrides not yet consumed or forgotten.
    pub fn pending_overrides(&self) -> usize {
        self.lock_overrides().len()
    }

    /// Register an override that drops every internal frame, wherever it
    /// sits in the trace.
    pub fn hide_internal_stack_frames(&self, id: ErrorId) {
        self.set_override(id, |input| {
            let frames: Vec<Frame> = input.frames.iter().filter(|f| !f.internal).cloned().collect();
            Self::render_default(&StackInput {
                frames: &frames,
                ..*input
            })
        });
    }

    /// Render a stack: the override for `id` first (consuming it), then the
    /// global hook, then the default layout.
    pub fn render(&self, id: Option<ErrorId>, input: &StackInput<'_>) -> String {
        if let Some(id) = id {
            let taken = self.lock_overrides().remove(&id);
            if let Some(render) = taken {
                trace!(target: "errata.stack", %id, "rendering with per-error override");
                return render(input);
            }
        }
        let hook = self
            .prepare_hook
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match hook {
            Some(hook) => hook(input),
            None => Self::render_default(input),
        }
    }

    /// `Name: message` followed by one `    at frame` line per frame.
    pub fn render_default(input: &StackInput<'_>) -> String {
        let mut out = input.header();
        for frame in input.frames {
            out.push_str("\n    at ");
            out.push_str(&frame.to_string());
        }
        out
    }

    fn key(&self) -> usize {
        std::ptr::from_ref(self) as usize
    }

    fn hook_slot(&self) -> std::sync::RwLockWriteGuard<'_, Option<PrepareHook>> {
        self.prepare_hook
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_overrides(&self) -> std::sync::MutexGuard<'_, HashMap<ErrorId, StackOverride>> {
        self.overrides.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for StackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackController")
            .field("frame_limit", &self.frame_limit())
            .field("pending_overrides", &self.pending_overrides())
            .finish_non_exhaustive()
    }
}

/// Restores the previous frame limit on drop.
#[must_use = "the previous limit is restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct LimitGuard<'a> {
    index: usize,
    _scope: PhantomData<(&'a StackController, *const ())>,
}

impl Drop for LimitGuard<'_> {
    fn drop(&mut self) {
        let _ = SCOPED_LIMITS.try_with(|scoped| scoped.borrow_mut().truncate(self.index));
    }
}

/// Remove the block of internal frames at the front of `frames`, then cut to
/// `limit`.
///
/// When the newest frame is internal, everything up to and including the
/// oldest internal frame is discarded. User frames between two internal
/// frames go with them.
pub fn hide_internal_frames(mut frames: Vec<Frame>, limit: usize) -> Vec<Frame> {
    if frames.first().is_some_and(|f| f.internal) {
        if let Some(last) = frames.iter().rposition(|f| f.internal) {
            frames.drain(..=last);
        }
    }
    frames.truncate(limit);
    frames
}
