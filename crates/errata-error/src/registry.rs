// SPDX-License-Identifier: MIT OR Apache-2.0
//! Code registry and the error factory.

use crate::catalog;
use crate::code::ErrorCode;
use crate::error::CodedError;
use crate::kind::BaseKind;
use crate::template::{MessageTemplate, TemplateStore};
use errata_format::Arg;
use errata_stack::{Frame, ShadowStack, StackController};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::panic::Location;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use tracing::{debug, trace};

/// Name of the internal frame the factory pushes while it builds an error.
pub const FACTORY_FRAME: &str = "ErrorVariant::construct";

static GLOBAL: LazyLock<Registry> =
    LazyLock::new(|| Registry::with_builtins(StackController::global()));

/// The process-wide registry, preloaded with the built-in catalog and
/// rendering through [`StackController::global`].
pub fn registry() -> &'static Registry {
    &GLOBAL
}

/// Binds codes to templates and to the base kinds they may be raised as.
pub struct Registry {
    store: TemplateStore,
    kinds: RwLock<HashMap<ErrorCode, BTreeSet<BaseKind>>>,
    stack: Arc<StackController>,
}

impl Registry {
    /// An empty registry for `ERR_`-prefixed codes.
    pub fn new(stack: Arc<StackController>) -> Self {
        Self::from_store(TemplateStore::new(), stack)
    }

    /// An empty registry accepting codes that start with `prefix`.
    pub fn with_prefix(prefix: impl Into<String>, stack: Arc<StackController>) -> Self {
        Self::from_store(TemplateStore::with_prefix(prefix), stack)
    }

    /// A registry preloaded with [`BUILTIN_CODES`](crate::BUILTIN_CODES).
    pub fn with_builtins(stack: Arc<StackController>) -> Self {
        let registry = Self::new(stack);
        catalog::register_builtins(&registry);
        debug!(target: "errata.registry", codes = registry.store.len(), "built-in catalog loaded");
        registry
    }

    fn from_store(store: TemplateStore, stack: Arc<StackController>) -> Self {
        Self {
            store,
            kinds: RwLock::new(HashMap::new()),
            stack,
        }
    }

    /// The underlying template store.
    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    /// The stack controller errors from this registry render through.
    pub fn stack(&self) -> &Arc<StackController> {
        &self.stack
    }

    /// Register `code` with `template` and one variant per kind.
    ///
    /// Defining an existing code again with the same template adds the new
    /// kinds to it.
    ///
    /// # Panics
    ///
    /// If `kinds` is empty, or on the conditions of
    /// [`TemplateStore::register`].
    pub fn define(
        &self,
        code: &str,
        template: impl Into<MessageTemplate>,
        kinds: &[BaseKind],
    ) -> Vec<ErrorVariant<'_>> {
        assert!(
            !kinds.is_empty(),
            "Error code {code} must be defined with at least one base kind"
        );
        let code = self.store.register(code, template);
        self.kinds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(code.clone())
            .or_default()
            .extend(kinds.iter().copied());
        debug!(target: "errata.registry", %code, ?kinds, "error code defined");
        kinds
            .iter()
            .map(|&kind| ErrorVariant {
                registry: self,
                code: code.clone(),
                kind,
            })
            .collect()
    }

    /// Base kinds `code` may be raised as, in kind order.
    pub fn kinds_of(&self, code: &str) -> Option<Vec<BaseKind>> {
        self.kinds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(code)
            .map(|set| set.iter().copied().collect())
    }

    /// The variant of `code` for `kind`, if defined.
    pub fn try_variant(&self, code: &str, kind: BaseKind) -> Option<ErrorVariant<'_>> {
        let kinds = self.kinds.read().unwrap_or_else(PoisonError::into_inner);
        let (key, set) = kinds.get_key_value(code)?;
        set.contains(&kind).then(|| ErrorVariant {
            registry: self,
            code: key.clone(),
            kind,
        })
    }

    /// The variant of `code` for `kind`.
    ///
    /// # Panics
    ///
    /// If the pair was never defined.
    pub fn variant(&self, code: &str, kind: BaseKind) -> ErrorVariant<'_> {
        self.try_variant(code, kind)
            .unwrap_or_else(|| panic!("Error code {code} is not defined as {kind}"))
    }

    /// Every defined code, sorted.
    pub fn codes(&self) -> Vec<ErrorCode> {
        self.store.codes()
    }

    /// Construct an error for `code` as `kind`.
    ///
    /// # Panics
    ///
    /// If the pair was never defined, or on an argument-count mismatch.
    #[track_caller]
    pub fn create(&self, code: &str, kind: BaseKind, args: &[Arg]) -> CodedError {
        self.build(Location::caller(), code, kind, args, |message| message)
    }

    /// Like [`create`](Self::create), passing the rendered message through
    /// `finish` before it is stored.
    #[track_caller]
    pub fn create_with<F>(&self, code: &str, kind: BaseKind, args: &[Arg], finish: F) -> CodedError
    where
        F: FnOnce(String) -> String,
    {
        self.build(Location::caller(), code, kind, args, finish)
    }

    fn build<F>(
        &self,
        call_site: &Location<'_>,
        code: &str,
        kind: BaseKind,
        args: &[Arg],
        finish: F,
    ) -> CodedError
    where
        F: FnOnce(String) -> String,
    {
        let _call_site = ShadowStack::push(Frame::at(call_site));
        let _factory = ShadowStack::push_internal(FACTORY_FRAME);
        let code = self.variant(code, kind).code;

        let mut err = {
            let _bare = self.stack.scoped_limit(0);
            CodedError::bare(code.clone(), kind, Arc::clone(&self.stack))
        };
        let message = self.store.render(code.as_str(), args, err.extras_mut());
        err.set_message(finish(message));
        err.set_frames(self.stack.capture_visible());
        trace!(
            target: "errata.registry",
            code = %err.code(),
            kind = %kind,
            id = %err.id(),
            "error constructed"
        );
        err
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("store", &self.store)
            .field("stack", &self.stack)
            .finish_non_exhaustive()
    }
}

/// A code bound to one base kind; the constructor user code calls.
#[derive(Clone)]
pub struct ErrorVariant<'r> {
    registry: &'r Registry,
    code: ErrorCode,
    kind: BaseKind,
}

impl ErrorVariant<'_> {
    /// The variant's code.
    pub fn code(&self) -> &ErrorCode {
        &self.code
    }

    /// The variant's base kind.
    pub fn kind(&self) -> BaseKind {
        self.kind
    }

    /// Construct an error with `args`.
    #[track_caller]
    pub fn construct(&self, args: &[Arg]) -> CodedError {
        self.registry.create(self.code.as_str(), self.kind, args)
    }
}

impl fmt::Debug for ErrorVariant<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorVariant")
            .field("code", &self.code)
            .field("kind", &self.kind)
            .finish()
    }
}
