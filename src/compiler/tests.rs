//! Unit tests for the code generator's support structures.

use inkwell::{context::Context, types::BasicTypeEnum};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::ast::types::{FunctionSignature, Type};

use super::{
    defer::DeferRegistry,
    expr::{character_value, parse_integer},
    loops::LoopStack,
    scope::Scopes,
    types::TypeLowering,
};

#[test]
fn test_inner_scope_shadows_outer() {
    let mut scopes: Scopes<i32> = Scopes::new();
    scopes.declare_global("x", 1);
    scopes.enter_scope();
    scopes.declare("x", 2);

    assert_eq!(scopes.lookup("x"), Some(&2));

    scopes.exit_scope();
    assert_eq!(scopes.lookup("x"), Some(&1));
}

#[test]
fn test_reset_keeps_globals() {
    let mut scopes: Scopes<&str> = Scopes::new();
    scopes.declare_global("main", "function");
    scopes.enter_scope();
    scopes.enter_scope();
    scopes.declare("local", "slot");

    scopes.reset_to_global();

    assert_eq!(scopes.depth(), 1);
    assert_eq!(scopes.lookup("local"), None);
    assert_eq!(scopes.lookup("main"), Some(&"function"));

    scopes.clear();
    assert_eq!(scopes.lookup("main"), None);
}

proptest! {
    #[test]
    fn test_lookup_finds_innermost_binding(values in proptest::collection::vec(any::<i64>(), 1..16)) {
        let mut scopes: Scopes<i64> = Scopes::new();
        for value in values.iter() {
            scopes.enter_scope();
            scopes.declare("name", *value);
        }

        for value in values.iter().rev() {
            prop_assert_eq!(scopes.lookup("name"), Some(value));
            scopes.exit_scope();
        }
        prop_assert_eq!(scopes.lookup("name"), None);
    }

    #[test]
    fn test_integer_lowering_is_stable_per_width(width in 1u32..=128, other in 1u32..=128) {
        let context = Context::create();
        let types = TypeLowering::new(&context);

        let lowered = types.convert_type(&Type::Integer(width));
        prop_assert_eq!(lowered, types.convert_type(&Type::Integer(width)));
        prop_assert_eq!(lowered.into_int_type().get_bit_width(), width);
        if width != other {
            prop_assert_ne!(lowered, types.convert_type(&Type::Integer(other)));
        }
    }

    #[test]
    fn test_decimal_literals_parse(value in any::<u64>()) {
        prop_assert_eq!(parse_integer(&value.to_string()), Some(value));
    }
}

#[test]
fn test_frame_calls_run_in_reverse() {
    let mut defers: DeferRegistry<&str> = DeferRegistry::new();
    defers.push_frame();
    for call in ["A", "B", "C"] {
        defers.register(call).unwrap();
    }

    let order: Vec<&str> = defers.frame_calls().copied().collect();
    assert_eq!(order, vec!["C", "B", "A"]);
}

#[test]
fn test_calls_above_start_with_innermost_frame() {
    let mut defers: DeferRegistry<&str> = DeferRegistry::new();
    defers.push_frame();
    defers.register("function").unwrap();
    let loop_depth = defers.depth();

    defers.push_frame();
    defers.register("body first").unwrap();
    defers.register("body second").unwrap();
    defers.push_frame();
    defers.register("nested").unwrap();

    let unwound: Vec<&str> = defers.calls_above(loop_depth).copied().collect();
    assert_eq!(unwound, vec!["nested", "body second", "body first"]);

    let all: Vec<&str> = defers.calls_above(0).copied().collect();
    assert_eq!(all, vec!["nested", "body second", "body first", "function"]);

    // Unwinding does not consume the frames.
    assert_eq!(defers.depth(), 3);
}

#[test]
fn test_register_without_frame_is_rejected() {
    let mut defers: DeferRegistry<u8> = DeferRegistry::new();
    assert_eq!(defers.register(7), Err(7));
}

#[test]
fn test_loop_stack_tracks_innermost() {
    let mut loops: LoopStack<&str> = LoopStack::new();
    assert!(loops.current().is_none());

    loops.push("outer");
    loops.push("inner");
    assert_eq!(loops.current(), Some(&"inner"));

    loops.pop();
    assert_eq!(loops.current(), Some(&"outer"));
    loops.clear();
    assert!(loops.is_empty());
}

#[test]
fn test_integer_literal_radixes() {
    assert_eq!(parse_integer("42"), Some(42));
    assert_eq!(parse_integer("0x2A"), Some(42));
    assert_eq!(parse_integer("0o52"), Some(42));
    assert_eq!(parse_integer("0b101010"), Some(42));
    assert_eq!(parse_integer("4.2"), None);
    assert_eq!(parse_integer(""), None);
}

#[test]
fn test_character_literals() {
    assert_eq!(character_value("a"), Some(b'a'));
    assert_eq!(character_value("'a'"), Some(b'a'));
    assert_eq!(character_value("\\n"), Some(b'\n'));
    assert_eq!(character_value("'\\0'"), Some(0));
    assert_eq!(character_value("ab"), None);
    assert_eq!(character_value("\\q"), None);
}

#[test]
fn test_type_lowering() {
    let context = Context::create();
    let types = TypeLowering::new(&context);

    assert_eq!(
        types.convert_type(&Type::Integer(1)),
        BasicTypeEnum::from(context.bool_type())
    );
    assert_eq!(
        types.convert_type(&Type::Integer(32)),
        BasicTypeEnum::from(context.i32_type())
    );
    assert_eq!(
        types.convert_type(&Type::Float(32)),
        BasicTypeEnum::from(context.f32_type())
    );
    assert_eq!(
        types.convert_type(&Type::array(Type::Integer(8), 4)),
        BasicTypeEnum::from(context.i8_type().array_type(4))
    );
    assert!(types.lower(&Type::Void).is_void_type());

    let signature = FunctionSignature {
        parameters: vec![Type::pointer(Type::Integer(8))],
        return_type: Box::new(Type::Integer(32)),
        is_variadic: true,
    };
    let function_type = types.function_type(&signature);
    assert!(function_type.is_var_arg());
    assert_eq!(function_type.count_param_types(), 1);
    assert!(types
        .convert_type(&Type::pointer(Type::Function(signature)))
        .is_pointer_type());
}
