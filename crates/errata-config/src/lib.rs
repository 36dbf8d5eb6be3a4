// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

use errata_stack::{DEFAULT_FRAME_LIMIT, DEFAULT_MAX_DEPTH, ShadowStack, StackController};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// What happens instead.
        hint: String,
    },
    /// `stack_trace_limit = 0`: every rendered stack is a bare header.
    EmptyStackTraces,
    /// A limit is unusually large.
    LargeValue {
        /// Field name.
        field: String,
        /// Configured value.
        value: usize,
        /// Threshold it exceeds.
        threshold: usize,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
            ConfigWarning::EmptyStackTraces => {
                f.write_str("stack_trace_limit is 0; stack traces will carry no frames")
            }
            ConfigWarning::LargeValue {
                field,
                value,
                threshold,
            } => write!(f, "'{field}' is unusually large ({value} > {threshold})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ErrataConfig {
    /// Visible frames kept in a rendered stack trace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace_limit: Option<usize>,

    /// Maximum shadow-stack depth before `ShadowStack::enter` refuses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stack_depth: Option<usize>,

    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Log output format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_format: Option<LogFormat>,
}

impl Default for ErrataConfig {
    fn default() -> Self {
        Self {
            stack_trace_limit: Some(DEFAULT_FRAME_LIMIT),
            max_stack_depth: Some(DEFAULT_MAX_DEPTH),
            log_level: Some(DEFAULT_LOG_LEVEL.into()),
            log_format: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Level used when none is configured.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Frame limits above this generate a warning.
const LARGE_STACK_TRACE_LIMIT: usize = 1_000;

/// Depths above this generate a warning.
const LARGE_STACK_DEPTH: usize = 1_000_000;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load an [`ErrataConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`ErrataConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<ErrataConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => ErrataConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into an [`ErrataConfig`].
pub fn parse_toml(content: &str) -> Result<ErrataConfig, ConfigError> {
    toml::from_str::<ErrataConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `ERRATA_STACK_TRACE_LIMIT`
/// - `ERRATA_MAX_STACK_DEPTH`
/// - `ERRATA_LOG_LEVEL`
/// - `ERRATA_LOG_FORMAT` (`text` or `json`)
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(config: &mut ErrataConfig) {
    apply_env_overrides_from(config, |key| std::env::var(key).ok());
}

/// [`apply_env_overrides`] reading variables through `lookup`.
pub fn apply_env_overrides_from<F>(config: &mut ErrataConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(limit) = lookup("ERRATA_STACK_TRACE_LIMIT").and_then(|v| v.trim().parse().ok()) {
        config.stack_trace_limit = Some(limit);
    }
    if let Some(depth) = lookup("ERRATA_MAX_STACK_DEPTH").and_then(|v| v.trim().parse().ok()) {
        config.max_stack_depth = Some(depth);
    }
    if let Some(level) = lookup("ERRATA_LOG_LEVEL") {
        config.log_level = Some(level);
    }
    match lookup("ERRATA_LOG_FORMAT").as_deref().map(str::trim) {
        Some("text") => config.log_format = Some(LogFormat::Text),
        Some("json") => config.log_format = Some(LogFormat::Json),
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (unknown log level, zero stack depth) are returned as a
/// [`ConfigError::ValidationError`]; soft issues come back as warnings.
pub fn validate_config(config: &ErrataConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if let Some(ref level) = config.log_level {
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(format!("invalid log_level '{level}'"));
        }
    }

    match config.max_stack_depth {
        Some(0) => errors.push("max_stack_depth must be at least 1".into()),
        Some(depth) if depth > LARGE_STACK_DEPTH => warnings.push(ConfigWarning::LargeValue {
            field: "max_stack_depth".into(),
            value: depth,
            threshold: LARGE_STACK_DEPTH,
        }),
        Some(_) => {}
        None => warnings.push(ConfigWarning::MissingOptionalField {
            field: "max_stack_depth".into(),
            hint: format!("the shadow stack keeps its current depth limit ({DEFAULT_MAX_DEPTH} by default)"),
        }),
    }

    match config.stack_trace_limit {
        Some(0) => warnings.push(ConfigWarning::EmptyStackTraces),
        Some(limit) if limit > LARGE_STACK_TRACE_LIMIT => {
            warnings.push(ConfigWarning::LargeValue {
                field: "stack_trace_limit".into(),
                value: limit,
                threshold: LARGE_STACK_TRACE_LIMIT,
            })
        }
        Some(_) => {}
        None => warnings.push(ConfigWarning::MissingOptionalField {
            field: "stack_trace_limit".into(),
            hint: format!("stack traces keep the current limit ({DEFAULT_FRAME_LIMIT} by default)"),
        }),
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations.  Values in `overlay` take precedence over `base`.
pub fn merge_configs(base: ErrataConfig, overlay: ErrataConfig) -> ErrataConfig {
    ErrataConfig {
        stack_trace_limit: overlay.stack_trace_limit.or(base.stack_trace_limit),
        max_stack_depth: overlay.max_stack_depth.or(base.max_stack_depth),
        log_level: overlay.log_level.or(base.log_level),
        log_format: overlay.log_format.or(base.log_format),
    }
}

// ---------------------------------------------------------------------------
// Applying
// ---------------------------------------------------------------------------

/// Push the configured limits into the process-wide stack controller and
/// shadow stack. Unset fields leave the current values alone.
pub fn apply_config(config: &ErrataConfig) {
    apply_config_to(config, &StackController::global());
}

/// [`apply_config`] against a specific controller.
pub fn apply_config_to(config: &ErrataConfig, controller: &StackController) {
    if let Some(limit) = config.stack_trace_limit {
        controller.set_frame_limit(limit);
    }
    if let Some(depth) = config.max_stack_depth {
        ShadowStack::set_max_depth(depth);
    }
    debug!(
        target: "errata.config",
        frame_limit = controller.configured_limit(),
        max_depth = ShadowStack::max_depth(),
        "config applied"
    );
}

/// The `EnvFilter` directive for `config`: `errata=<level>`.
pub fn filter_directive(config: &ErrataConfig) -> String {
    let level = config.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL);
    format!("errata={level}")
}

/// Install a global tracing subscriber for `config`.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing(config: &ErrataConfig) -> bool {
    let filter = EnvFilter::new(filter_directive(config));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match config.log_format.unwrap_or_default() {
        LogFormat::Text => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };
    if installed {
        debug!(target: "errata.config", "tracing initialised");
    }
    installed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
