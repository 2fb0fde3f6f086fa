use std::fmt::Display;

use inkwell::builder::BuilderError;
use thiserror::Error;

use crate::Position;

/// A fatal code generation error.
///
/// The tree handed to the compiler is already resolved, so every error here
/// means a broken contract between the resolver and the backend. Compilation
/// of the unit stops at the first one.
#[derive(Error, Debug, Clone)]
#[error("{internal_error} ({position})")]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_internal_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnresolvedSymbol { .. } => "UnresolvedSymbol",
            ErrorImpl::BreakOutsideLoop => "BreakOutsideLoop",
            ErrorImpl::UnsupportedCast { .. } => "UnsupportedCast",
            ErrorImpl::ArgumentCountMismatch { .. } => "ArgumentCountMismatch",
            ErrorImpl::ArgumentTypeMismatch { .. } => "ArgumentTypeMismatch",
            ErrorImpl::MissingReturn { .. } => "MissingReturn",
            ErrorImpl::ReturnTypeMismatch { .. } => "ReturnTypeMismatch",
            ErrorImpl::TypeMismatch { .. } => "TypeMismatch",
            ErrorImpl::DuplicateDeclaration { .. } => "DuplicateDeclaration",
            ErrorImpl::ConflictingSignature { .. } => "ConflictingSignature",
            ErrorImpl::UnsupportedOperator { .. } => "UnsupportedOperator",
            ErrorImpl::InvalidAssignmentTarget => "InvalidAssignmentTarget",
            ErrorImpl::NotAddressable => "NotAddressable",
            ErrorImpl::NotCallable { .. } => "NotCallable",
            ErrorImpl::NotIndexable { .. } => "NotIndexable",
            ErrorImpl::VoidValue => "VoidValue",
            ErrorImpl::VoidStorage { .. } => "VoidStorage",
            ErrorImpl::StatementOutsideFunction { .. } => "StatementOutsideFunction",
            ErrorImpl::NestedFunction { .. } => "NestedFunction",
            ErrorImpl::NonConstantGlobal { .. } => "NonConstantGlobal",
            ErrorImpl::InvalidNumberLiteral { .. } => "InvalidNumberLiteral",
            ErrorImpl::InvalidCharacterLiteral { .. } => "InvalidCharacterLiteral",
            ErrorImpl::TypeAlreadyResolved { .. } => "TypeAlreadyResolved",
            ErrorImpl::UnresolvedType { .. } => "UnresolvedType",
            ErrorImpl::Builder { .. } => "Builder",
            ErrorImpl::Verification { .. } => "Verification",
            ErrorImpl::Target { .. } => "Target",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnresolvedSymbol { name } => ErrorTip::Suggestion(format!(
                "`{}` is not declared in any enclosing scope",
                name
            )),
            ErrorImpl::BreakOutsideLoop => {
                ErrorTip::Suggestion(String::from("`break` can only appear inside a loop"))
            }
            ErrorImpl::UnsupportedCast { from, to } => {
                ErrorTip::Suggestion(format!("Cannot cast `{}` to `{}`", from, to))
            }
            ErrorImpl::ArgumentCountMismatch {
                function,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "`{}` expects {} arguments, received {}",
                function, expected, received
            )),
            ErrorImpl::ArgumentTypeMismatch {
                function,
                index,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "Argument {} of `{}` expects `{}`, received `{}`",
                index, function, expected, received
            )),
            ErrorImpl::MissingReturn { function } => ErrorTip::Suggestion(format!(
                "`{}` can reach its end without returning a value",
                function
            )),
            ErrorImpl::ReturnTypeMismatch {
                function,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "`{}` returns `{}`, received `{}`",
                function, expected, received
            )),
            ErrorImpl::TypeMismatch { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::DuplicateDeclaration { name, previous } => ErrorTip::Suggestion(format!(
                "`{}` was already declared at {}",
                name, previous
            )),
            ErrorImpl::ConflictingSignature { name, previous } => ErrorTip::Suggestion(format!(
                "`{}` was declared with a different signature at {}",
                name, previous
            )),
            ErrorImpl::UnsupportedOperator { operator, type_ } => ErrorTip::Suggestion(format!(
                "Operator `{}` is not defined for `{}`",
                operator, type_
            )),
            ErrorImpl::InvalidAssignmentTarget => ErrorTip::Suggestion(String::from(
                "Only variables, index expressions and dereferences can be assigned",
            )),
            ErrorImpl::NotAddressable => {
                ErrorTip::Suggestion(String::from("This expression has no storage location"))
            }
            ErrorImpl::NotCallable { type_ } => {
                ErrorTip::Suggestion(format!("Values of type `{}` cannot be called", type_))
            }
            ErrorImpl::NotIndexable { type_ } => {
                ErrorTip::Suggestion(format!("Values of type `{}` cannot be indexed", type_))
            }
            ErrorImpl::VoidValue => ErrorTip::Suggestion(String::from(
                "A call to a void function does not produce a value",
            )),
            ErrorImpl::VoidStorage { name } => {
                ErrorTip::Suggestion(format!("`{}` cannot be stored with type `void`", name))
            }
            ErrorImpl::StatementOutsideFunction { statement } => ErrorTip::Suggestion(format!(
                "{} statements must appear inside a function body",
                statement
            )),
            ErrorImpl::NestedFunction { name } => ErrorTip::Suggestion(format!(
                "`{}` must be declared at the top level",
                name
            )),
            ErrorImpl::NonConstantGlobal { name } => ErrorTip::Suggestion(format!(
                "The initializer of global `{}` must be a constant",
                name
            )),
            ErrorImpl::InvalidNumberLiteral { literal } => {
                ErrorTip::Suggestion(format!("`{}` is not a valid number", literal))
            }
            ErrorImpl::InvalidCharacterLiteral { literal } => {
                ErrorTip::Suggestion(format!("`{}` is not a single byte character", literal))
            }
            ErrorImpl::TypeAlreadyResolved { name, .. } => ErrorTip::Suggestion(format!(
                "`{}` was already resolved to a different type",
                name
            )),
            ErrorImpl::UnresolvedType { name } => {
                ErrorTip::Suggestion(format!("`{}` reached code generation without a type", name))
            }
            ErrorImpl::Builder { .. } | ErrorImpl::Verification { .. } | ErrorImpl::Target { .. } => {
                ErrorTip::None
            }
        }
    }
}

impl From<BuilderError> for Error {
    fn from(error: BuilderError) -> Self {
        Error::new(
            ErrorImpl::Builder {
                message: error.to_string(),
            },
            Position::null(),
        )
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unresolved symbol {name:?}")]
    UnresolvedSymbol { name: String },
    #[error("break statement outside of a loop")]
    BreakOutsideLoop,
    #[error("unsupported cast from {from} to {to}")]
    UnsupportedCast { from: String, to: String },
    #[error("call to {function:?}: expected {expected} arguments, received {received}")]
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        received: usize,
    },
    #[error("call to {function:?}: argument {index} expected {expected}, received {received}")]
    ArgumentTypeMismatch {
        function: String,
        index: usize,
        expected: String,
        received: String,
    },
    #[error("function {function:?} does not return a value on every path")]
    MissingReturn { function: String },
    #[error("function {function:?} returns {expected}, received {received}")]
    ReturnTypeMismatch {
        function: String,
        expected: String,
        received: String,
    },
    #[error("types do not match: expected {expected}, received {received}")]
    TypeMismatch { expected: String, received: String },
    #[error("{name:?} already declared at {previous}")]
    DuplicateDeclaration { name: String, previous: Position },
    #[error("{name:?} redeclared with a different signature (previous declaration at {previous})")]
    ConflictingSignature { name: String, previous: Position },
    #[error("operator {operator:?} is not supported for {type_}")]
    UnsupportedOperator { operator: String, type_: String },
    #[error("invalid assignment target")]
    InvalidAssignmentTarget,
    #[error("expression is not addressable")]
    NotAddressable,
    #[error("value of type {type_} is not callable")]
    NotCallable { type_: String },
    #[error("value of type {type_} is not indexable")]
    NotIndexable { type_: String },
    #[error("void value used as an operand")]
    VoidValue,
    #[error("{name:?} has no storage type")]
    VoidStorage { name: String },
    #[error("{statement} statement outside of a function")]
    StatementOutsideFunction { statement: String },
    #[error("nested function declaration {name:?}")]
    NestedFunction { name: String },
    #[error("global {name:?} has a non constant initializer")]
    NonConstantGlobal { name: String },
    #[error("invalid number literal {literal:?}")]
    InvalidNumberLiteral { literal: String },
    #[error("invalid character literal {literal:?}")]
    InvalidCharacterLiteral { literal: String },
    #[error("type of {name:?} already resolved to {resolved}, received {received}")]
    TypeAlreadyResolved {
        name: String,
        resolved: String,
        received: String,
    },
    #[error("{name:?} has no resolved type")]
    UnresolvedType { name: String },
    #[error("llvm builder error: {message}")]
    Builder { message: String },
    #[error("module verification failed: {message}")]
    Verification { message: String },
    #[error("target initialization failed: {message}")]
    Target { message: String },
}
