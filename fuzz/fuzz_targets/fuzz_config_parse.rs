// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz ErrataConfig TOML parsing and validation.
//!
//! Feeds arbitrary byte strings through `parse_toml` and `validate_config`,
//! verifying:
//! 1. `parse_toml` never panics on arbitrary input.
//! 2. Successfully parsed configs can be validated without panics.
//! 3. Round-trip: serialize back to TOML and re-parse produces the same config.
#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(s) => s,
        Err(_) => return,
    };

    let config = match errata_config::parse_toml(s) {
        Ok(c) => c,
        Err(_) => return,
    };

    match errata_config::validate_config(&config) {
        Ok(warnings) => {
            for w in &warnings {
                let _ = format!("{w}");
            }
        }
        Err(e) => {
            let _ = format!("{e}");
        }
    }

    if let Ok(toml_str) = toml::to_string(&config) {
        if let Ok(rt) = errata_config::parse_toml(&toml_str) {
            assert_eq!(config, rt, "TOML round-trip must be lossless");
        }
    }

    let _ = errata_config::filter_directive(&config);
});
