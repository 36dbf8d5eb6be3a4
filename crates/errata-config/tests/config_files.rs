// SPDX-License-Identifier: MIT OR Apache-2.0
//! Loading configuration from disk.

use errata_config::{ConfigError, ErrataConfig, LogFormat, load_config, parse_toml, validate_config};
use std::io::Write;

#[test]
fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "stack_trace_limit = 7").unwrap();
    writeln!(file, "log_format = \"text\"").unwrap();
    let cfg = load_config(Some(file.path())).unwrap();
    assert_eq!(cfg.log_format, Some(LogFormat::Text));
    assert!(validate_config(&cfg).is_ok());
}

#[test]
fn missing_file_is_reported_with_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("errata.toml");
    match load_config(Some(path.as_path())).unwrap_err() {
        ConfigError::FileNotFound { path: reported } => {
            assert!(reported.ends_with("errata.toml"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn serialised_default_parses_back() {
    let cfg = ErrataConfig::default();
    let text = toml::to_string(&cfg).unwrap();
    assert_eq!(parse_toml(&text).unwrap(), cfg);
}

#[test]
fn json_schema_lists_every_field() {
    let schema = schemars::schema_for!(ErrataConfig);
    let json = serde_json::to_value(&schema).unwrap();
    let properties = json["properties"].as_object().unwrap();
    for field in ["stack_trace_limit", "max_stack_depth", "log_level", "log_format"] {
        assert!(properties.contains_key(field), "{field}");
    }
}
