//! Unit tests for the syntax tree and type model.

use pretty_assertions::assert_eq;

use crate::{
    tokens::tokens::{Token, TokenKind},
    Span,
};

use super::{
    ast::Expr,
    expressions::{BinaryExpr, CallExpr, LiteralExpr, NumberExpr, StringExpr, UnaryExpr},
    statements::FieldDeclaration,
    types::{FunctionSignature, Type},
};

fn literal(name: &str, ty: Type) -> Expr {
    Expr::Literal(LiteralExpr::new(Token::identifier(name, Span::null()), ty))
}

fn binary(left: Expr, operator: &str, right: Expr) -> BinaryExpr {
    BinaryExpr {
        left: Box::new(left),
        operator: Token::symbol(operator, Span::null()).unwrap(),
        right: Box::new(right),
    }
}

#[test]
fn test_comparison_and_logical_are_boolean() {
    for ty in [
        Type::Integer(8),
        Type::Integer(64),
        Type::Float(32),
        Type::pointer(Type::Integer(8)),
    ] {
        let comparison = Expr::Comparison(binary(
            literal("a", ty.clone()),
            "<",
            literal("b", ty.clone()),
        ));
        let logical = Expr::Logical(binary(literal("a", ty.clone()), "&&", literal("b", ty)));

        assert_eq!(comparison.get_type().unwrap(), Type::Integer(1));
        assert_eq!(logical.get_type().unwrap(), Type::Integer(1));
    }
}

#[test]
fn test_number_defaults() {
    let integer = NumberExpr::new(Token::new(TokenKind::Integer, "1", Span::null()));
    let float = NumberExpr::new(Token::new(TokenKind::Float, "1.5", Span::null()));

    assert_eq!(integer.ty, Type::Integer(64));
    assert_eq!(float.ty, Type::Float(64));
}

#[test]
fn test_string_is_byte_array() {
    let string = StringExpr {
        value: Token::new(TokenKind::String, "hello", Span::null()),
    };
    assert_eq!(string.get_type(), Type::array(Type::Integer(8), 5));
}

#[test]
fn test_call_types_to_return_type() {
    let signature = FunctionSignature::new(vec![Type::Integer(32)], Type::Float(64));
    let call = Expr::Call(CallExpr {
        position: Token::identifier("f", Span::null()),
        callee: Box::new(literal("f", Type::Function(signature.clone()))),
        arguments: vec![],
    });
    assert_eq!(call.get_type().unwrap(), Type::Float(64));

    let through_pointer = Expr::Call(CallExpr {
        position: Token::identifier("f", Span::null()),
        callee: Box::new(literal("f", Type::pointer(Type::Function(signature)))),
        arguments: vec![],
    });
    assert_eq!(through_pointer.get_type().unwrap(), Type::Float(64));
}

#[test]
fn test_address_and_dereference_types() {
    let address = Expr::Unary(UnaryExpr {
        operator: Token::symbol("&", Span::null()).unwrap(),
        right: Box::new(literal("x", Type::Integer(16))),
    });
    assert_eq!(address.get_type().unwrap(), Type::pointer(Type::Integer(16)));

    let dereference = Expr::Unary(UnaryExpr {
        operator: Token::symbol("*", Span::null()).unwrap(),
        right: Box::new(address),
    });
    assert_eq!(dereference.get_type().unwrap(), Type::Integer(16));
}

#[test]
fn test_late_bound_type_is_set_once() {
    let field = FieldDeclaration::unresolved(Token::identifier("x", Span::null()), None);
    assert!(field.get_type().is_err());

    field.set_type(Type::Integer(32)).unwrap();
    field.set_type(Type::Integer(32)).unwrap();
    assert_eq!(field.get_type().unwrap(), &Type::Integer(32));

    let error = field.set_type(Type::Integer(8)).unwrap_err();
    assert_eq!(error.get_error_name(), "TypeAlreadyResolved");
    assert_eq!(field.get_type().unwrap(), &Type::Integer(32));
}

#[test]
fn test_type_display() {
    let signature = FunctionSignature {
        parameters: vec![Type::pointer(Type::Integer(8))],
        return_type: Box::new(Type::Integer(32)),
        is_variadic: true,
    };
    assert_eq!(Type::array(Type::Integer(8), 3).to_string(), "[3]int8");
    assert_eq!(
        Type::Function(signature).to_string(),
        "fun (*int8, ...) int32"
    );
}
