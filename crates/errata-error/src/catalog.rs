// SPDX-License-Identifier: MIT OR Apache-2.0
//! The built-in code catalog.

use crate::kind::BaseKind::{self, Generic, OutOfRange, Syntax, SystemFailure, TypeMismatch};
use crate::registry::Registry;
use crate::template::{Extras, MessageFn};
use errata_format::{
    Arg, add_numerical_separator, determine_specific_type, format_list, inspect,
    inspect_truncated,
};
use serde_json::Value;

/// Codes with static templates: `(code, template, kinds)`.
pub const BUILTIN_CODES: &[(&str, &str, &[BaseKind])] = &[
    ("ERR_ASSERTION", "%s", &[Generic]),
    ("ERR_BUFFER_TOO_LARGE", "Cannot create a buffer larger than %s bytes", &[OutOfRange]),
    ("ERR_CHILD_CLOSED_BEFORE_REPLY", "Child closed before reply received", &[Generic]),
    ("ERR_DIR_CLOSED", "Directory handle was closed", &[Generic]),
    ("ERR_ENCODING_NOT_SUPPORTED", "The \"%s\" encoding is not supported", &[OutOfRange]),
    ("ERR_FS_CP_DIR_TO_NON_DIR", "Cannot overwrite non-directory with directory", &[SystemFailure]),
    ("ERR_FS_CP_EEXIST", "Target already exists", &[SystemFailure]),
    ("ERR_FS_CP_EINVAL", "Invalid src or dest", &[SystemFailure]),
    ("ERR_FS_CP_FIFO_PIPE", "Cannot copy a FIFO pipe", &[SystemFailure]),
    ("ERR_FS_CP_NON_DIR_TO_DIR", "Cannot overwrite directory with non-directory", &[SystemFailure]),
    ("ERR_FS_CP_SOCKET", "Cannot copy a socket file", &[SystemFailure]),
    ("ERR_FS_CP_SYMLINK_TO_SUBDIRECTORY", "Cannot overwrite symlink in subdirectory of self", &[SystemFailure]),
    ("ERR_FS_CP_UNKNOWN", "Cannot copy an unknown file type", &[SystemFailure]),
    ("ERR_FS_EISDIR", "Path is a directory", &[SystemFailure]),
    ("ERR_FS_FILE_TOO_LARGE", "File size (%s) is greater than 2 GiB", &[OutOfRange]),
    ("ERR_ILLEGAL_CONSTRUCTOR", "Illegal constructor", &[TypeMismatch]),
    ("ERR_INCOMPATIBLE_OPTION_PAIR", "Option \"%s\" cannot be used in combination with option \"%s\"", &[TypeMismatch]),
    ("ERR_INVALID_ADDRESS_FAMILY", "Invalid address family: %s %s:%s", &[OutOfRange]),
    ("ERR_INVALID_CURSOR_POS", "Cannot set cursor row without setting its column", &[TypeMismatch]),
    ("ERR_INVALID_FD", "\"fd\" must be a positive integer: %s", &[OutOfRange]),
    ("ERR_INVALID_FD_TYPE", "Unsupported fd type: %s", &[TypeMismatch]),
    ("ERR_INVALID_HANDLE_TYPE", "This handle type cannot be sent", &[TypeMismatch]),
    ("ERR_INVALID_STATE", "Invalid state: %s", &[Generic, TypeMismatch, OutOfRange]),
    ("ERR_INVALID_SYNC_FORK_INPUT", "Asynchronous forks do not support Buffer, TypedArray, DataView or string input: %s", &[TypeMismatch]),
    ("ERR_INVALID_THIS", "Value of \"this\" must be of type %s", &[TypeMismatch]),
    ("ERR_INVALID_URI", "URI malformed", &[Syntax]),
    ("ERR_INVALID_URL", "Invalid URL", &[TypeMismatch]),
    ("ERR_IPC_CHANNEL_CLOSED", "Channel closed", &[Generic]),
    ("ERR_IPC_DISCONNECTED", "IPC channel is already disconnected", &[Generic]),
    ("ERR_IPC_ONE_PIPE", "Child process can have only one IPC pipe", &[Generic]),
    ("ERR_METHOD_NOT_IMPLEMENTED", "The %s method is not implemented", &[Generic]),
    ("ERR_MULTIPLE_CALLBACK", "Callback called multiple times", &[Generic]),
    ("ERR_OPERATION_FAILED", "Operation failed: %s", &[Generic, TypeMismatch]),
    ("ERR_SOCKET_ALREADY_BOUND", "Socket is already bound", &[Generic]),
    ("ERR_SOCKET_BAD_BUFFER_SIZE", "Buffer size must be a positive integer", &[TypeMismatch]),
    ("ERR_SOCKET_CLOSED", "Socket is closed", &[Generic]),
    ("ERR_SOCKET_DGRAM_NOT_RUNNING", "Not running", &[Generic]),
    ("ERR_STREAM_ALREADY_FINISHED", "Cannot call %s after a stream was finished", &[Generic]),
    ("ERR_STREAM_CANNOT_PIPE", "Cannot pipe, not readable", &[Generic]),
    ("ERR_STREAM_DESTROYED", "Cannot call %s after a stream was destroyed", &[Generic]),
    ("ERR_STREAM_NULL_VALUES", "May not write null values to stream", &[TypeMismatch]),
    ("ERR_STREAM_PREMATURE_CLOSE", "Premature close", &[Generic]),
    ("ERR_STREAM_PUSH_AFTER_EOF", "stream.push() after EOF", &[Generic]),
    ("ERR_STREAM_WRITE_AFTER_END", "write after end", &[Generic]),
    ("ERR_SYSTEM_ERROR", "A system error occurred", &[SystemFailure]),
    ("ERR_TTY_INIT_FAILED", "TTY initialization failed", &[SystemFailure]),
    ("ERR_UNKNOWN_ENCODING", "Unknown encoding: %s", &[TypeMismatch]),
    ("ERR_UNKNOWN_SIGNAL", "Unknown signal: %s", &[TypeMismatch]),
    ("ERR_USE_AFTER_CLOSE", "%s was closed", &[Generic]),
];

pub(crate) fn register_builtins(registry: &Registry) {
    for &(code, template, kinds) in BUILTIN_CODES {
        registry.define(code, template, kinds);
    }
    registry.define("ERR_INVALID_ARG_TYPE", MessageFn::new(3, invalid_arg_type), &[TypeMismatch]);
    registry.define("ERR_INVALID_ARG_VALUE", MessageFn::new(2, invalid_arg_value), &[TypeMismatch, OutOfRange]);
    registry.define("ERR_OUT_OF_RANGE", MessageFn::new(3, out_of_range), &[OutOfRange]);
    registry.define("ERR_MISSING_ARGS", MessageFn::new(1, missing_args), &[TypeMismatch]);
    registry.define("ERR_SOCKET_BAD_PORT", MessageFn::new(2, socket_bad_port), &[OutOfRange]);
    registry.define("ERR_INVALID_RETURN_VALUE", MessageFn::new(3, invalid_return_value), &[TypeMismatch, OutOfRange]);
    registry.define("ERR_INVALID_CHAR", MessageFn::new(1, invalid_char), &[TypeMismatch]);
    registry.define("ERR_BUFFER_OUT_OF_BOUNDS", MessageFn::new(0, buffer_out_of_bounds), &[OutOfRange]);
    registry.define("ERR_UNHANDLED_ERROR", MessageFn::new(0, unhandled_error), &[Generic]);
    registry.define("ERR_FALSY_VALUE_REJECTION", MessageFn::new(1, falsy_value_rejection), &[Generic]);
}

// ---------------------------------------------------------------------------
// Message builders
// ---------------------------------------------------------------------------

const PRIMITIVE_TYPES: &[&str] = &[
    "string", "function", "number", "object", "Function", "Object", "boolean", "bigint", "symbol",
];

fn arg(args: &[Arg], index: usize) -> &Value {
    args.get(index).unwrap_or(&Value::Null)
}

/// Strings as-is, everything else inspected.
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => inspect(other),
    }
}

fn property_or_argument(name: &str) -> &'static str {
    if name.contains('.') { "property" } else { "argument" }
}

/// `Buffer`, `URL`, `ArrayBuffer`: a capitalised class name.
fn is_class_name(value: &str) -> bool {
    value.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && value.chars().all(|c| c.is_ascii_alphanumeric())
}

fn invalid_arg_type(_: &mut Extras, args: &[Arg]) -> String {
    let name = text(arg(args, 0));
    let expected: Vec<String> = match arg(args, 1) {
        Value::Array(items) => items.iter().map(text).collect(),
        other => vec![text(other)],
    };

    let mut msg = if name.ends_with(" argument") {
        format!("The {name} ")
    } else {
        format!("The \"{name}\" {} ", property_or_argument(&name))
    };
    msg.push_str("must be ");

    let mut types = Vec::new();
    let mut instances = Vec::new();
    let mut other = Vec::new();
    for value in expected {
        if PRIMITIVE_TYPES.contains(&value.as_str()) {
            types.push(value.to_lowercase());
        } else if is_class_name(&value) {
            instances.push(value);
        } else {
            other.push(value);
        }
    }
    if !instances.is_empty() {
        if let Some(pos) = types.iter().position(|t| t == "object") {
            types.remove(pos);
            instances.push("Object".to_string());
        }
    }

    if !types.is_empty() {
        if types.len() > 1 {
            msg.push_str("one of type ");
        } else {
            msg.push_str("of type ");
        }
        msg.push_str(&format_list(&types, "or"));
        if !instances.is_empty() || !other.is_empty() {
            msg.push_str(" or ");
        }
    }
    if !instances.is_empty() {
        msg.push_str("an instance of ");
        msg.push_str(&format_list(&instances, "or"));
        if !other.is_empty() {
            msg.push_str(" or ");
        }
    }
    if !other.is_empty() {
        if other.len() > 1 {
            msg.push_str("one of ");
            msg.push_str(&format_list(&other, "or"));
        } else {
            if other[0].to_lowercase() != other[0] {
                msg.push_str("an ");
            }
            msg.push_str(&other[0]);
        }
    }

    msg.push_str(". Received ");
    msg.push_str(&determine_specific_type(arg(args, 2)));
    msg
}

fn invalid_arg_value(_: &mut Extras, args: &[Arg]) -> String {
    let name = text(arg(args, 0));
    let inspected = inspect_truncated(arg(args, 1), 128);
    let reason = match args.get(2) {
        Some(reason) => text(reason),
        None => "is invalid".to_string(),
    };
    format!(
        "The {} '{name}' {reason}. Received {inspected}",
        property_or_argument(&name)
    )
}

fn out_of_range(_: &mut Extras, args: &[Arg]) -> String {
    let name = text(arg(args, 0));
    let range = text(arg(args, 1));
    let input = arg(args, 2);
    let replace_default = matches!(args.get(3), Some(Value::Bool(true)));

    let mut msg = if replace_default {
        name
    } else {
        format!("The value of \"{name}\" is out of range.")
    };
    let received = match input.as_f64() {
        Some(x) if x.fract() == 0.0 && x.abs() > 4_294_967_296.0 => {
            add_numerical_separator(&inspect(input))
        }
        _ => inspect(input),
    };
    msg.push_str(&format!(" It must be {range}. Received {received}"));
    msg
}

fn missing_args(_: &mut Extras, args: &[Arg]) -> String {
    let wrap = |value: &Value| format!("\"{}\"", text(value));
    let names: Vec<String> = args
        .iter()
        .map(|a| match a {
            Value::Array(alternatives) => alternatives
                .iter()
                .map(wrap)
                .collect::<Vec<_>>()
                .join(" or "),
            other => wrap(other),
        })
        .collect();
    let noun = if names.len() == 1 { "argument" } else { "arguments" };
    format!("The {} {noun} must be specified", format_list(&names, "and"))
}

fn socket_bad_port(_: &mut Extras, args: &[Arg]) -> String {
    let name = text(arg(args, 0));
    let allow_zero = !matches!(args.get(2), Some(Value::Bool(false)));
    let operator = if allow_zero { ">=" } else { ">" };
    format!(
        "{name} should be {operator} 0 and < 65536. Received {}.",
        determine_specific_type(arg(args, 1))
    )
}

fn invalid_return_value(_: &mut Extras, args: &[Arg]) -> String {
    let input = text(arg(args, 0));
    let name = text(arg(args, 1));
    let received = match arg(args, 2) {
        Value::Null => "type object",
        Value::Bool(_) => "instance of Boolean",
        Value::Number(_) => "instance of Number",
        Value::String(_) => "instance of String",
        Value::Array(_) => "instance of Array",
        Value::Object(_) => "instance of Object",
    };
    format!("Expected {input} to be returned from the \"{name}\" function but got {received}.")
}

fn invalid_char(_: &mut Extras, args: &[Arg]) -> String {
    let name = text(arg(args, 0));
    match args.get(1) {
        Some(field) => format!("Invalid character in {name} [\"{}\"]", text(field)),
        None => format!("Invalid character in {name}"),
    }
}

fn buffer_out_of_bounds(_: &mut Extras, args: &[Arg]) -> String {
    match args.first() {
        Some(name) => format!("\"{}\" is outside of buffer bounds", text(name)),
        None => "Attempt to access memory outside buffer bounds".to_string(),
    }
}

fn unhandled_error(_: &mut Extras, args: &[Arg]) -> String {
    match args.first() {
        None | Some(Value::Null) => "Unhandled error.".to_string(),
        Some(err) => format!("Unhandled error. ({})", text(err)),
    }
}

fn falsy_value_rejection(receiver: &mut Extras, args: &[Arg]) -> String {
    receiver.insert("reason".to_string(), arg(args, 0).clone());
    "Promise was rejected with falsy value".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use errata_format::args;
    use errata_stack::{ShadowStack, StackController};
    use serde_json::json;
    use std::sync::Arc;

    fn builtins() -> Registry {
        Registry::with_builtins(Arc::new(StackController::new(Arc::new(ShadowStack))))
    }

    fn message(code: &str, kind: BaseKind, args: &[Arg]) -> String {
        builtins().create(code, kind, args).message().to_string()
    }

    #[test]
    fn static_codes_match_naming_convention() {
        for &(code, template, _) in BUILTIN_CODES {
            assert!(crate::is_valid_code("ERR_", code), "{code}");
            assert!(!template.is_empty(), "{code}");
        }
    }

    #[test]
    fn every_builtin_is_registered() {
        let reg = builtins();
        for &(code, _, _) in BUILTIN_CODES {
            assert!(reg.store().contains(code), "{code}");
        }
        assert!(reg.kinds_of("ERR_INVALID_ARG_TYPE").is_some());
    }

    #[test]
    fn invalid_arg_type_single_primitive() {
        assert_eq!(
            message("ERR_INVALID_ARG_TYPE", TypeMismatch, &args!["fd", ["number"], "abc"]),
            "The \"fd\" argument must be of type number. Received type string ('abc')"
        );
    }

    #[test]
    fn invalid_arg_type_mixed_expectations() {
        assert_eq!(
            message(
                "ERR_INVALID_ARG_TYPE",
                TypeMismatch,
                &args!["options.path", ["string", "Buffer", "URL"], 5]
            ),
            "The \"options.path\" property must be of type string or an instance of Buffer \
             or URL. Received type number (5)"
        );
    }

    #[test]
    fn invalid_arg_type_object_moves_to_instances() {
        assert_eq!(
            message(
                "ERR_INVALID_ARG_TYPE",
                TypeMismatch,
                &args!["value", ["object", "Buffer"], json!(null)]
            ),
            "The \"value\" argument must be an instance of Buffer or Object. Received null"
        );
    }

    #[test]
    fn invalid_arg_type_other_description() {
        assert_eq!(
            message(
                "ERR_INVALID_ARG_TYPE",
                TypeMismatch,
                &args!["first argument", "valid listener", true]
            ),
            "The first argument must be valid listener. Received type boolean (true)"
        );
    }

    #[test]
    fn invalid_arg_value_default_reason() {
        assert_eq!(
            message("ERR_INVALID_ARG_VALUE", TypeMismatch, &args!["encoding", "utf9"]),
            "The argument 'encoding' is invalid. Received 'utf9'"
        );
        assert_eq!(
            message(
                "ERR_INVALID_ARG_VALUE",
                OutOfRange,
                &args!["opts.mode", 9, "must be an octal number"]
            ),
            "The property 'opts.mode' must be an octal number. Received 9"
        );
    }

    #[test]
    fn out_of_range_groups_large_integers() {
        assert_eq!(
            message("ERR_OUT_OF_RANGE", OutOfRange, &args!["offset", ">= 0", 4294967297u64]),
            "The value of \"offset\" is out of range. It must be >= 0. Received 4_294_967_297"
        );
        assert_eq!(
            message("ERR_OUT_OF_RANGE", OutOfRange, &args!["offset", ">= 0", -1]),
            "The value of \"offset\" is out of range. It must be >= 0. Received -1"
        );
    }

    #[test]
    fn out_of_range_replaces_default_prefix() {
        assert_eq!(
            message(
                "ERR_OUT_OF_RANGE",
                OutOfRange,
                &args!["The length", "<= 10", 11, true]
            ),
            "The length It must be <= 10. Received 11"
        );
    }

    #[test]
    fn missing_args_lists() {
        assert_eq!(
            message("ERR_MISSING_ARGS", TypeMismatch, &args!["name"]),
            "The \"name\" argument must be specified"
        );
        assert_eq!(
            message("ERR_MISSING_ARGS", TypeMismatch, &args!["a", "b"]),
            "The \"a\" and \"b\" arguments must be specified"
        );
        assert_eq!(
            message("ERR_MISSING_ARGS", TypeMismatch, &args!["a", ["b", "c"], "d"]),
            "The \"a\", \"b\" or \"c\", and \"d\" arguments must be specified"
        );
    }

    #[test]
    fn socket_bad_port_operator() {
        assert_eq!(
            message("ERR_SOCKET_BAD_PORT", OutOfRange, &args!["Port", 70000]),
            "Port should be >= 0 and < 65536. Received type number (70000)."
        );
        assert_eq!(
            message("ERR_SOCKET_BAD_PORT", OutOfRange, &args!["Port", 0, false]),
            "Port should be > 0 and < 65536. Received type number (0)."
        );
    }

    #[test]
    fn invalid_return_value_describes_value() {
        assert_eq!(
            message(
                "ERR_INVALID_RETURN_VALUE",
                TypeMismatch,
                &args!["an object", "transform", json!(null)]
            ),
            "Expected an object to be returned from the \"transform\" function but got type object."
        );
    }

    #[test]
    fn optional_argument_builders() {
        assert_eq!(
            message("ERR_BUFFER_OUT_OF_BOUNDS", OutOfRange, &[]),
            "Attempt to access memory outside buffer bounds"
        );
        assert_eq!(
            message("ERR_BUFFER_OUT_OF_BOUNDS", OutOfRange, &args!["offset"]),
            "\"offset\" is outside of buffer bounds"
        );
        assert_eq!(message("ERR_UNHANDLED_ERROR", Generic, &[]), "Unhandled error.");
        assert_eq!(
            message("ERR_UNHANDLED_ERROR", Generic, &args!["boom"]),
            "Unhandled error. (boom)"
        );
        assert_eq!(
            message("ERR_INVALID_CHAR", TypeMismatch, &args!["header content", "Host"]),
            "Invalid character in header content [\"Host\"]"
        );
    }

    #[test]
    fn falsy_rejection_attaches_reason() {
        let reg = builtins();
        let err = reg.create("ERR_FALSY_VALUE_REJECTION", Generic, &args![0]);
        assert_eq!(err.message(), "Promise was rejected with falsy value");
        assert_eq!(err.extra("reason"), Some(&json!(0)));
    }

    #[test]
    fn static_template_codes() {
        assert_eq!(
            message("ERR_INCOMPATIBLE_OPTION_PAIR", TypeMismatch, &args!["a", "b"]),
            "Option \"a\" cannot be used in combination with option \"b\""
        );
        assert_eq!(
            message("ERR_STREAM_PREMATURE_CLOSE", Generic, &[]),
            "Premature close"
        );
    }
}
