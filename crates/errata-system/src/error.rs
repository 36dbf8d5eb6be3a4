// SPDX-License-Identifier: MIT OR Apache-2.0
//! The system error wrapper.

use crate::context::{PathValue, SharedContext, SystemFailureContext};
use errata_error::{BaseKind, CodedError, ErrorCode, Registry, registry};
use errata_format::inspect;
use errata_stack::{ErrorId, Frame};
use serde_json::{Map, Value};
use std::fmt;
use tracing::trace;

/// Writing an accessor that was not defined at construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessorError {
    /// The field was absent from the context when the error was built.
    #[error("the `{field}` accessor is not defined on this error")]
    Absent {
        /// Accessor name.
        field: &'static str,
    },
}

/// A coded error of kind `SystemError` carrying the O/S failure that
/// caused it.
///
/// `errno` and `syscall` read and write through to the shared context, as
/// do `path` and `dest` when those accessors exist. Whether they exist is
/// fixed at construction: a field absent from the context then never gets
/// an accessor, even if the context gains the field later.
pub struct SystemError {
    inner: CodedError,
    context: SharedContext,
    has_path: bool,
    has_dest: bool,
}

impl SystemError {
    /// Build from the process-wide [`registry`].
    ///
    /// # Panics
    ///
    /// If `code` is not defined with kind [`BaseKind::SystemFailure`].
    #[track_caller]
    pub fn new(code: &str, context: impl Into<SharedContext>) -> Self {
        Self::new_in(registry(), code, context)
    }

    /// Build from `registry`.
    ///
    /// The message is the code's template followed by
    /// `: <syscall> returned <code> (<message>)`, then ` <path>` and
    /// ` => <dest>` when present.
    #[track_caller]
    pub fn new_in(registry: &Registry, code: &str, context: impl Into<SharedContext>) -> Self {
        let context = context.into();
        let snapshot = context.snapshot();
        let inner = registry.create_with(code, BaseKind::SystemFailure, &[], |prefix| {
            system_message(&prefix, &snapshot)
        });
        trace!(
            target: "errata.system",
            code = %inner.code(),
            syscall = %snapshot.syscall,
            os_code = %snapshot.code,
            "system error constructed"
        );
        Self {
            inner,
            context,
            has_path: snapshot.path.is_some(),
            has_dest: snapshot.dest.is_some(),
        }
    }

    /// The error code (not the O/S code, which lives in [`info`](Self::info)).
    pub fn code(&self) -> &ErrorCode {
        self.inner.code()
    }

    /// Always [`BaseKind::SystemFailure`].
    pub fn kind(&self) -> BaseKind {
        self.inner.kind()
    }

    /// `SystemError`.
    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    /// Process-unique identity.
    pub fn id(&self) -> ErrorId {
        self.inner.id()
    }

    /// The current message.
    pub fn message(&self) -> &str {
        self.inner.message()
    }

    /// Replace the message.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.inner.set_message(message);
    }

    /// Visible frames captured at construction.
    pub fn frames(&self) -> &[Frame] {
        self.inner.frames()
    }

    /// The rendered stack trace.
    pub fn stack(&self) -> &str {
        self.inner.stack()
    }

    /// The shared context.
    pub fn info(&self) -> &SharedContext {
        &self.context
    }

    /// The wrapped coded error.
    pub fn as_coded(&self) -> &CodedError {
        &self.inner
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.inner = self.inner.with_source(source);
        self
    }

    // -- read/write-through accessors ---------------------------------------

    /// Numeric errno from the context.
    pub fn errno(&self) -> Option<i32> {
        self.context.read().errno
    }

    /// Write errno to the context.
    pub fn set_errno(&self, errno: Option<i32>) {
        self.context.update(|ctx| ctx.errno = errno);
    }

    /// System call from the context.
    pub fn syscall(&self) -> String {
        self.context.read().syscall.clone()
    }

    /// Write the system call to the context.
    pub fn set_syscall(&self, syscall: impl Into<String>) {
        let syscall = syscall.into();
        self.context.update(|ctx| ctx.syscall = syscall);
    }

    /// Whether the `path` accessor exists.
    pub fn has_path(&self) -> bool {
        self.has_path
    }

    /// Path from the context, as text. `None` when the accessor does not
    /// exist or the context no longer holds a path.
    pub fn path(&self) -> Option<String> {
        self.read_path_like(self.has_path, |ctx| ctx.path.as_ref())
    }

    /// Write the path to the context, stored as bytes.
    pub fn set_path(&self, path: impl AsRef<[u8]>) -> Result<(), AccessorError> {
        let value = PathValue::from(path.as_ref());
        self.write_path_like(self.has_path, "path", |ctx| &mut ctx.path, Some(value))
    }

    /// Clear the path in the context; the accessor stays defined.
    pub fn clear_path(&self) -> Result<(), AccessorError> {
        self.write_path_like(self.has_path, "path", |ctx| &mut ctx.path, None)
    }

    /// Whether the `dest` accessor exists.
    pub fn has_dest(&self) -> bool {
        self.has_dest
    }

    /// Destination from the context, as text. `None` when the accessor does
    /// not exist or the context no longer holds a destination.
    pub fn dest(&self) -> Option<String> {
        self.read_path_like(self.has_dest, |ctx| ctx.dest.as_ref())
    }

    /// Write the destination to the context, stored as bytes.
    pub fn set_dest(&self, dest: impl AsRef<[u8]>) -> Result<(), AccessorError> {
        let value = PathValue::from(dest.as_ref());
        self.write_path_like(self.has_dest, "dest", |ctx| &mut ctx.dest, Some(value))
    }

    /// Clear the destination in the context; the accessor stays defined.
    pub fn clear_dest(&self) -> Result<(), AccessorError> {
        self.write_path_like(self.has_dest, "dest", |ctx| &mut ctx.dest, None)
    }

    fn write_path_like(
        &self,
        defined: bool,
        field: &'static str,
        slot: fn(&mut SystemFailureContext) -> &mut Option<PathValue>,
        value: Option<PathValue>,
    ) -> Result<(), AccessorError> {
        if !defined {
            return Err(AccessorError::Absent { field });
        }
        self.context.update(|ctx| *slot(ctx) = value);
        Ok(())
    }

    fn read_path_like(
        &self,
        defined: bool,
        field: impl FnOnce(&SystemFailureContext) -> Option<&PathValue>,
    ) -> Option<String> {
        if !defined {
            return None;
        }
        let ctx = self.context.read();
        field(&ctx).map(|p| p.to_string_lossy().into_owned())
    }

    /// Display text followed by the accessor values as plain fields.
    pub fn inspect(&self) -> String {
        let ctx = self.context.snapshot();
        let mut fields: Vec<(&str, Value)> = vec![
            ("code", Value::from(self.code().as_str())),
            ("info", context_value(&ctx)),
            ("errno", ctx.errno.map_or(Value::Null, Value::from)),
            ("syscall", Value::from(ctx.syscall.as_str())),
        ];
        if self.has_path {
            fields.push(("path", lossy_value(ctx.path.as_ref())));
        }
        if self.has_dest {
            fields.push(("dest", lossy_value(ctx.dest.as_ref())));
        }
        let body: Vec<String> = fields
            .iter()
            .map(|(key, value)| format!("{key}: {}", inspect(value)))
            .collect();
        format!("{self} {{ {} }}", body.join(", "))
    }
}

fn system_message(prefix: &str, ctx: &SystemFailureContext) -> String {
    let mut message = format!(
        "{prefix}: {} returned {} ({})",
        ctx.syscall, ctx.code, ctx.message
    );
    if let Some(path) = &ctx.path {
        message.push(' ');
        message.push_str(&path.to_string_lossy());
    }
    if let Some(dest) = &ctx.dest {
        message.push_str(" => ");
        message.push_str(&dest.to_string_lossy());
    }
    message
}

fn lossy_value(path: Option<&PathValue>) -> Value {
    path.map_or(Value::Null, |p| Value::from(p.to_string_lossy().into_owned()))
}

fn context_value(ctx: &SystemFailureContext) -> Value {
    let mut map = Map::new();
    map.insert("code".into(), Value::from(ctx.code.as_str()));
    map.insert("syscall".into(), Value::from(ctx.syscall.as_str()));
    map.insert("message".into(), Value::from(ctx.message.as_str()));
    if let Some(errno) = ctx.errno {
        map.insert("errno".into(), Value::from(errno));
    }
    if ctx.path.is_some() {
        map.insert("path".into(), lossy_value(ctx.path.as_ref()));
    }
    if ctx.dest.is_some() {
        map.insert("dest".into(), lossy_value(ctx.dest.as_ref()));
    }
    Value::Object(map)
}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl fmt::Debug for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemError")
            .field("code", self.code())
            .field("message", &self.message())
            .field("info", &*self.context.read())
            .finish()
    }
}

impl std::error::Error for SystemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use errata_stack::{ShadowStack, StackController};
    use std::sync::Arc;

    fn local() -> Registry {
        Registry::with_builtins(Arc::new(StackController::new(Arc::new(ShadowStack))))
    }

    fn enoent() -> SystemFailureContext {
        SystemFailureContext::new("ENOENT", "open", "no such file or directory")
    }

    #[test]
    fn message_folds_in_path_and_dest() {
        let reg = local();
        let err = SystemError::new_in(
            &reg,
            "ERR_FS_CP_EEXIST",
            enoent().with_path("/a").with_dest("/b"),
        );
        assert_eq!(
            err.message(),
            "Target already exists: open returned ENOENT (no such file or directory) /a => /b"
        );
        assert_eq!(err.kind(), BaseKind::SystemFailure);
        assert_eq!(err.name(), "SystemError");
    }

    #[test]
    fn display_uses_name_and_code() {
        let reg = local();
        let err = SystemError::new_in(&reg, "ERR_TTY_INIT_FAILED", enoent());
        assert_eq!(
            err.to_string(),
            "SystemError [ERR_TTY_INIT_FAILED]: TTY initialization failed: open returned ENOENT \
             (no such file or directory)"
        );
    }

    #[test]
    fn errno_and_syscall_write_through() {
        let reg = local();
        let shared = SharedContext::new(enoent().with_errno(2));
        let err = SystemError::new_in(&reg, "ERR_FS_EISDIR", shared.clone());
        assert_eq!(err.errno(), Some(2));
        err.set_errno(Some(-2));
        err.set_syscall("stat");
        assert_eq!(shared.read().errno, Some(-2));
        assert_eq!(shared.read().syscall, "stat");
        assert_eq!(err.syscall(), "stat");
    }

    #[test]
    fn absent_accessors_stay_absent() {
        let reg = local();
        let shared = SharedContext::new(enoent());
        let err = SystemError::new_in(&reg, "ERR_FS_EISDIR", shared.clone());
        shared.update(|ctx| ctx.dest = Some("/late".into()));
        assert!(!err.has_dest());
        assert_eq!(err.dest(), None);
        assert_eq!(
            err.set_dest("/x"),
            Err(AccessorError::Absent { field: "dest" })
        );
        assert_eq!(shared.read().dest, Some(PathValue::from("/late")));
    }

    #[test]
    fn path_writes_store_bytes() {
        let reg = local();
        let shared = SharedContext::new(enoent().with_path("/tmp/x"));
        let err = SystemError::new_in(&reg, "ERR_FS_EISDIR", shared.clone());
        err.set_path("/tmp/new").unwrap();
        assert_eq!(shared.read().path, Some(PathValue::Bytes(b"/tmp/new".to_vec())));
        assert_eq!(err.path().as_deref(), Some("/tmp/new"));
        err.clear_path().unwrap();
        assert!(err.has_path());
        assert_eq!(err.path(), None);
    }

    #[test]
    fn inspect_lists_accessors() {
        let reg = local();
        let err = SystemError::new_in(&reg, "ERR_FS_EISDIR", enoent().with_path("/tmp/x"));
        let text = err.inspect();
        assert!(text.starts_with("SystemError [ERR_FS_EISDIR]: Path is a directory"));
        assert!(text.contains("code: 'ERR_FS_EISDIR'"));
        assert!(text.contains("errno: null"));
        assert!(text.contains("syscall: 'open'"));
        assert!(text.contains("path: '/tmp/x'"));
        assert!(!text.contains("dest:"));
    }

    #[test]
    #[should_panic(expected = "is not defined as SystemError")]
    fn non_system_code_is_rejected() {
        SystemError::new_in(&local(), "ERR_INVALID_URI", enoent());
    }
}
