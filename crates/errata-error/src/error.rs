// SPDX-License-Identifier: MIT OR Apache-2.0
//! The coded error value.

use crate::code::ErrorCode;
use crate::kind::BaseKind;
use crate::template::Extras;
use errata_stack::{ErrorId, Frame, StackController, StackInput};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};

// ---------------------------------------------------------------------------
// CodedError
// ---------------------------------------------------------------------------

/// An error carrying a permanent code, a base kind and a rendered message.
///
/// Built by [`Registry::create`](crate::Registry::create) or an
/// [`ErrorVariant`](crate::ErrorVariant). The code cannot change after
/// construction; the message can.
pub struct CodedError {
    id: ErrorId,
    code: ErrorCode,
    kind: BaseKind,
    message: String,
    extras: Extras,
    frames: Vec<Frame>,
    stack: OnceLock<String>,
    controller: Arc<StackController>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CodedError {
    /// A message-less error with whatever frames `controller` captures at
    /// its current limit.
    pub(crate) fn bare(code: ErrorCode, kind: BaseKind, controller: Arc<StackController>) -> Self {
        let frames = controller.capture();
        Self {
            id: ErrorId::next(),
            code,
            kind,
            message: String::new(),
            extras: Extras::new(),
            frames,
            stack: OnceLock::new(),
            controller,
            source: None,
        }
    }

    pub(crate) fn extras_mut(&mut self) -> &mut Extras {
        &mut self.extras
    }

    pub(crate) fn set_frames(&mut self, frames: Vec<Frame>) {
        self.frames = frames;
    }

    /// Process-unique identity of this error.
    pub fn id(&self) -> ErrorId {
        self.id
    }

    /// The error code.
    pub fn code(&self) -> &ErrorCode {
        &self.code
    }

    /// The base kind.
    pub fn kind(&self) -> BaseKind {
        self.kind
    }

    /// Whether this error was raised as `kind`.
    pub fn is_kind(&self, kind: BaseKind) -> bool {
        self.kind == kind
    }

    /// The plain kind name (`TypeError`, `RangeError`, ...).
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// The current message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Replace the message. A stack already rendered keeps the old text.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    /// Fields attached while the message was built, plus any added with
    /// [`with_extra`](Self::with_extra).
    pub fn extras(&self) -> &Extras {
        &self.extras
    }

    /// One attached field.
    pub fn extra(&self, key: &str) -> Option<&serde_json::Value> {
        self.extras.get(key)
    }

    /// Attach a field (builder style).
    ///
    /// Values that fail to serialise are stored as `null`.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        self.extras.insert(key.into(), value);
        self
    }

    /// Attach an underlying cause (builder style).
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Visible frames captured at construction, newest first.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// `Kind [CODE]`, the name shown in stack headers.
    pub fn stack_name(&self) -> String {
        format!("{} [{}]", self.kind.name(), self.code)
    }

    /// The rendered stack trace, produced on first access and cached.
    ///
    /// A pending override is consumed by the first access and its output is
    /// what later calls return. Use [`CodedError::render_stack`] to render
    /// again once the override has been used.
    pub fn stack(&self) -> &str {
        self.stack.get_or_init(|| self.render_stack())
    }

    /// Render the stack now, consuming any pending override, without
    /// touching the cache.
    pub fn render_stack(&self) -> String {
        let name = self.stack_name();
        self.controller.render(
            Some(self.id),
            &StackInput {
                name: &name,
                message: &self.message,
                frames: &self.frames,
            },
        )
    }

    /// Register a one-shot renderer used the first time the stack is
    /// rendered.
    pub fn set_stack_override<F>(&self, render: F)
    where
        F: FnOnce(&StackInput<'_>) -> String + Send + 'static,
    {
        self.controller.set_override(self.id, render);
    }

    /// Render this error's stack with every internal frame removed.
    pub fn hide_internal_stack_frames(&self) {
        self.controller.hide_internal_stack_frames(self.id);
    }

    /// Serialisable snapshot.
    pub fn to_dto(&self) -> CodedErrorDto {
        CodedErrorDto::from(self)
    }
}

impl fmt::Display for CodedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.kind.name(), self.code, self.message)
    }
}

impl fmt::Debug for CodedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("CodedError");
        s.field("code", &self.code)
            .field("kind", &self.kind)
            .field("message", &self.message);
        if !self.extras.is_empty() {
            s.field("extras", &self.extras);
        }
        if let Some(ref src) = self.source {
            s.field("source", &format_args!("{src}"));
        }
        s.finish()
    }
}

impl std::error::Error for CodedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| &**e as &(dyn std::error::Error + 'static))
    }
}

impl Drop for CodedError {
    fn drop(&mut self) {
        self.controller.forget(self.id);
    }
}

// ---------------------------------------------------------------------------
// CodedErrorDto
// ---------------------------------------------------------------------------

/// Serialisable view of a [`CodedError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodedErrorDto {
    /// Error code.
    pub code: ErrorCode,
    /// Base kind.
    pub kind: BaseKind,
    /// Message at snapshot time.
    pub message: String,
    /// Attached fields.
    #[serde(default, skip_serializing_if = "Extras::is_empty")]
    pub extras: Extras,
    /// Display text of the source error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_message: Option<String>,
}

impl From<&CodedError> for CodedErrorDto {
    fn from(err: &CodedError) -> Self {
        Self {
            code: err.code.clone(),
            kind: err.kind,
            message: err.message.clone(),
            extras: err.extras.clone(),
            source_message: err.source.as_ref().map(|s| s.to_string()),
        }
    }
}
