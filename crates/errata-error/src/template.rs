// SPDX-License-Identifier: MIT OR Apache-2.0
//! Message templates and the code-to-template store.

use crate::code::{DEFAULT_CODE_PREFIX, ErrorCode, is_valid_code};
use errata_format::{Arg, count_specifiers, format};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

/// Side-channel fields a message builder may attach to the error it is
/// building (e.g. `reason`).
pub type Extras = BTreeMap<String, serde_json::Value>;

type BuildFn = dyn Fn(&mut Extras, &[Arg]) -> String + Send + Sync;

// ---------------------------------------------------------------------------
// MessageTemplate
// ---------------------------------------------------------------------------

/// A message-building function with a declared minimum argument count.
#[derive(Clone)]
pub struct MessageFn {
    required: usize,
    build: Arc<BuildFn>,
}

impl MessageFn {
    /// Wrap `build`, which needs at least `required` arguments.
    pub fn new<F>(required: usize, build: F) -> Self
    where
        F: Fn(&mut Extras, &[Arg]) -> String + Send + Sync + 'static,
    {
        Self {
            required,
            build: Arc::new(build),
        }
    }

    /// Minimum number of arguments.
    pub fn required(&self) -> usize {
        self.required
    }

    /// Build the message, letting the function write into `receiver`.
    pub fn call(&self, receiver: &mut Extras, args: &[Arg]) -> String {
        (self.build)(receiver, args)
    }
}

impl fmt::Debug for MessageFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageFn")
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// How the message for a code is produced.
#[derive(Debug, Clone)]
pub enum MessageTemplate {
    /// Text with positional `%s`-style specifiers.
    Static(Cow<'static, str>),
    /// A function of the arguments.
    Function(MessageFn),
}

impl MessageTemplate {
    /// Number of arguments construction must supply (exactly, for static
    /// templates; at least, for functions).
    pub fn required_args(&self) -> usize {
        match self {
            Self::Static(text) => count_specifiers(text),
            Self::Function(f) => f.required(),
        }
    }

    /// Whether two templates are the same definition. Functions compare by
    /// identity.
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Static(a), Self::Static(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => {
                a.required == b.required && Arc::ptr_eq(&a.build, &b.build)
            }
            _ => false,
        }
    }
}

impl From<&'static str> for MessageTemplate {
    fn from(text: &'static str) -> Self {
        Self::Static(Cow::Borrowed(text))
    }
}

impl From<String> for MessageTemplate {
    fn from(text: String) -> Self {
        Self::Static(Cow::Owned(text))
    }
}

impl From<MessageFn> for MessageTemplate {
    fn from(f: MessageFn) -> Self {
        Self::Function(f)
    }
}

/// Render `template` for `code`.
///
/// # Panics
///
/// When a static template receives a different number of arguments than
/// it has specifiers, or a function receives fewer than it requires. Both
/// are defects at the construction site.
pub fn render_template(
    code: &str,
    template: &MessageTemplate,
    args: &[Arg],
    receiver: &mut Extras,
) -> String {
    match template {
        MessageTemplate::Static(text) => {
            let expected = count_specifiers(text);
            assert_eq!(
                args.len(),
                expected,
                "Code: {code}; The provided arguments length ({}) does not match the required ones ({expected}).",
                args.len()
            );
            format(text, args)
        }
        MessageTemplate::Function(f) => {
            assert!(
                args.len() >= f.required(),
                "Code: {code}; The provided arguments length ({}) does not match the required ones ({}).",
                args.len(),
                f.required()
            );
            f.call(receiver, args)
        }
    }
}

// ---------------------------------------------------------------------------
// TemplateStore
// ---------------------------------------------------------------------------

/// Mapping from error code to message template.
///
/// Codes are permanent: a code may be registered again only with the same
/// template.
pub struct TemplateStore {
    prefix: String,
    entries: RwLock<HashMap<ErrorCode, MessageTemplate>>,
}

impl TemplateStore {
    /// A store accepting `ERR_`-prefixed codes.
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_CODE_PREFIX)
    }

    /// A store accepting codes that start with `prefix`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The required code prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Register `template` under `code` and return the stored key.
    ///
    /// # Panics
    ///
    /// If `code` does not follow the naming convention, or is already bound
    /// to a different template.
    pub fn register(&self, code: &str, template: impl Into<MessageTemplate>) -> ErrorCode {
        assert!(
            is_valid_code(&self.prefix, code),
            "Invalid error code \"{code}\": expected \"{}\" followed by upper-snake-case segments",
            self.prefix
        );
        let template = template.into();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some((key, existing)) = entries.get_key_value(code) {
            assert!(
                existing.same_as(&template),
                "Error code {code} is already registered with a different message template"
            );
            return key.clone();
        }
        let key = ErrorCode::new(code);
        trace!(target: "errata.registry", code, required = template.required_args(), "template registered");
        entries.insert(key.clone(), template);
        key
    }

    /// The template for `code`, if any.
    pub fn get(&self, code: &str) -> Option<MessageTemplate> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(code)
            .cloned()
    }

    /// The stored key for `code`, if registered.
    pub fn key(&self, code: &str) -> Option<ErrorCode> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get_key_value(code)
            .map(|(key, _)| key.clone())
    }

    /// Whether `code` is registered.
    pub fn contains(&self, code: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(code)
    }

    /// Number of registered codes.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registered codes, sorted.
    pub fn codes(&self) -> Vec<ErrorCode> {
        let mut codes: Vec<ErrorCode> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        codes.sort();
        codes
    }

    /// Render the message for `code`.
    ///
    /// The store's lock is released before the template runs, so a message
    /// builder may itself construct errors.
    ///
    /// # Panics
    ///
    /// If `code` is unregistered, or on an argument-count mismatch (see
    /// [`render_template`]).
    pub fn render(&self, code: &str, args: &[Arg], receiver: &mut Extras) -> String {
        let template = self
            .get(code)
            .unwrap_or_else(|| panic!("No message template registered for code {code}"));
        render_template(code, &template, args, receiver)
    }
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TemplateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateStore")
            .field("prefix", &self.prefix)
            .field("len", &self.len())
            .finish()
    }
}
