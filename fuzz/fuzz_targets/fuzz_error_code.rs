// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz error-code validation and construction against a private registry.
//!
//! Verifies:
//! 1. `is_valid_code` never panics.
//! 2. A code accepted by `is_valid_code` can be defined and constructed,
//!    and the error reports exactly that code.
#![no_main]
use errata_error::{BaseKind, Registry, is_valid_code};
use errata_stack::{ShadowStack, StackController};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let code = match std::str::from_utf8(data) {
        Ok(s) => s,
        Err(_) => return,
    };

    if !is_valid_code("ERR_", code) {
        return;
    }

    let registry = Registry::new(Arc::new(StackController::new(Arc::new(ShadowStack))));
    registry.define(code, "fuzzed", &[BaseKind::Generic]);
    let err = registry.create(code, BaseKind::Generic, &[]);
    assert_eq!(err.code().as_str(), code);
    assert_eq!(err.message(), "fuzzed");
});
