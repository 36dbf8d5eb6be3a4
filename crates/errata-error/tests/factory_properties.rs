// SPDX-License-Identifier: MIT OR Apache-2.0
//! Construction properties of the registry and its variants.

use errata_error::{
    Arg, BaseKind, CodedError, FACTORY_FRAME, MessageFn, Registry, args, coded_error, registry,
};
use errata_stack::{Frame, ShadowStack, StackController};
use proptest::prelude::*;
use serde_json::json;
use serial_test::serial;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

fn local_registry() -> Registry {
    Registry::new(Arc::new(StackController::new(Arc::new(ShadowStack))))
}

fn placeholder_args(count: usize) -> Vec<Arg> {
    (0..count).map(|i| json!(format!("a{i}"))).collect()
}

#[test]
#[serial]
fn every_builtin_code_and_kind_constructs() {
    let reg = registry();
    for code in reg.codes() {
        let template = reg.store().get(code.as_str()).unwrap();
        let args = placeholder_args(template.required_args());
        for kind in reg.kinds_of(code.as_str()).unwrap() {
            let err = reg.create(code.as_str(), kind, &args);
            assert_eq!(err.code(), &code);
            assert_eq!(err.kind(), kind);
            assert!(!err.name().contains(code.as_str()), "{code}");
            assert!(err.stack().starts_with(&format!("{} [{code}]", kind.name())));
            assert!(!err.name().contains(code.as_str()), "{code}");
        }
    }
}

#[test]
fn function_template_with_two_kinds_shares_code() {
    let reg = Registry::with_prefix("", Arc::new(StackController::new(Arc::new(ShadowStack))));
    let variants = reg.define(
        "X",
        MessageFn::new(2, |_, a| format!("{}-{}", a[0], a[1])),
        &[BaseKind::TypeMismatch, BaseKind::OutOfRange],
    );
    let errors: Vec<CodedError> = variants.iter().map(|v| v.construct(&args![1, 2])).collect();
    assert_eq!(errors[0].code(), "X");
    assert_eq!(errors[1].code(), "X");
    assert_eq!(errors[0].message(), "1-2");
    assert_eq!(errors[0].message(), errors[1].message());
    assert_ne!(errors[0].kind(), errors[1].kind());
    assert!(errors[0].is_kind(BaseKind::TypeMismatch));
    assert!(errors[1].is_kind(BaseKind::OutOfRange));
    assert_ne!(errors[0].id(), errors[1].id());
}

#[test]
fn stack_starts_at_the_call_site() {
    let reg = local_registry();
    reg.define("ERR_TEST", "boom", &[BaseKind::Generic]);
    let _user = ShadowStack::push(Frame::new("user_fn").with_location("src/app.rs", 7, 1));
    let err = reg.create("ERR_TEST", BaseKind::Generic, &[]);
    let stack = err.stack();
    let mut lines = stack.lines();
    assert_eq!(lines.next(), Some("Error [ERR_TEST]: boom"));
    let first_frame = lines.next().unwrap();
    assert!(first_frame.contains("factory_properties.rs"), "{first_frame}");
    assert_eq!(lines.next(), Some("    at user_fn (src/app.rs:7:1)"));
    assert!(!stack.contains(FACTORY_FRAME));
}

#[test]
fn override_applies_once() {
    let reg = local_registry();
    reg.define("ERR_TEST", "boom", &[BaseKind::Generic]);
    let err = reg.create("ERR_TEST", BaseKind::Generic, &[]);
    err.set_stack_override(|_| "overridden".to_string());
    assert_eq!(err.render_stack(), "overridden");
    assert!(err.render_stack().starts_with("Error [ERR_TEST]: boom"));
}

#[test]
#[serial]
fn global_registry_honours_the_global_limit() {
    let controller = StackController::global();
    let guard = controller.scoped_limit(2);
    let _frames: Vec<_> = (0..6)
        .map(|i| ShadowStack::push(Frame::new(format!("depth{i}"))))
        .collect();
    let err = coded_error!("ERR_STREAM_PREMATURE_CLOSE", Generic);
    assert_eq!(err.frames().len(), 2);
    assert_eq!(controller.frame_limit(), 2);
    drop(guard);
}

#[test]
#[serial]
fn macro_builds_from_the_global_catalog() {
    let err = coded_error!("ERR_INVALID_ARG_VALUE", OutOfRange, "port", -1, "must be positive");
    assert_eq!(err.kind(), BaseKind::OutOfRange);
    assert_eq!(
        err.message(),
        "The argument 'port' must be positive. Received -1"
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn static_templates_demand_exact_arity(specifiers in 0usize..5, supplied in 0usize..7) {
        let reg = local_registry();
        let template = vec!["%s"; specifiers].join("|");
        reg.define("ERR_ARITY", template, &[BaseKind::Generic]);
        let args = placeholder_args(supplied);
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            reg.create("ERR_ARITY", BaseKind::Generic, &args).message().to_string()
        }));
        if specifiers == supplied {
            let expected: Vec<String> = (0..supplied).map(|i| format!("a{i}")).collect();
            prop_assert_eq!(outcome.ok(), Some(expected.join("|")));
        } else {
            prop_assert!(outcome.is_err());
        }
    }

    #[test]
    fn visible_frames_never_exceed_limit(limit in 0usize..8, depth in 0usize..20) {
        let reg = local_registry();
        reg.stack().set_frame_limit(limit);
        reg.define("ERR_DEPTH", "deep", &[BaseKind::Generic]);
        let _frames: Vec<_> = (0..depth)
            .map(|i| ShadowStack::push(Frame::new(format!("f{i}"))))
            .collect();
        let err = reg.create("ERR_DEPTH", BaseKind::Generic, &[]);
        prop_assert!(err.frames().len() <= limit);
        prop_assert!(err.frames().iter().all(|f| !f.internal));
        prop_assert_eq!(reg.stack().frame_limit(), limit);
    }
}
