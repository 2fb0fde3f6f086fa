use std::cell::OnceCell;

use crate::{
    errors::errors::{Error, ErrorImpl},
    tokens::tokens::{Token, TokenKind},
};

use super::{ast::Expr, types::Type};

/// Parenthesized sub-expression.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupExpr {
    pub position: Token,
    pub expression: Box<Expr>,
}

/// Assignment `left <op> right`, where `<op>` is `=` or a compound operator.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignExpr {
    pub left: Box<Expr>,
    pub operator: Token,
    pub right: Box<Expr>,
}

/// Two operands and an operator. Shared by binary, shift, comparison and
/// logical expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub operator: Token,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub operator: Token,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub position: Token,
    pub callee: Box<Expr>,
    pub arguments: Vec<Expr>,
}

/// Reference to a declared symbol. The type is filled in by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    pub name: Token,
    ty: OnceCell<Type>,
}

impl LiteralExpr {
    pub fn new(name: Token, ty: Type) -> Self {
        LiteralExpr {
            name,
            ty: OnceCell::from(ty),
        }
    }

    pub fn unresolved(name: Token) -> Self {
        LiteralExpr {
            name,
            ty: OnceCell::new(),
        }
    }

    /// Records the resolved type. Resolving twice to the same type is a no-op.
    pub fn set_type(&self, resolved_type: Type) -> Result<(), Error> {
        set_once(&self.ty, resolved_type, &self.name)
    }

    pub fn get_type(&self) -> Result<&Type, Error> {
        get_resolved(&self.ty, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberExpr {
    pub value: Token,
    pub ty: Type,
}

impl NumberExpr {
    /// Integer tokens default to `int64`, float tokens to `float64`.
    pub fn new(value: Token) -> Self {
        let ty = if value.kind == TokenKind::Float {
            Type::Float(64)
        } else {
            Type::Integer(64)
        };
        NumberExpr { value, ty }
    }

    pub fn with_type(value: Token, ty: Type) -> Self {
        NumberExpr { value, ty }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharacterExpr {
    pub value: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BooleanExpr {
    pub value: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NullExpr {
    pub value: Token,
}

/// String literal, typed as a fixed-size array of bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct StringExpr {
    pub value: Token,
}

impl StringExpr {
    pub fn get_type(&self) -> Type {
        Type::array(Type::Integer(8), self.value.value.len() as u32)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpr {
    pub position: Token,
    pub values: Vec<Expr>,
    pub element_type: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub position: Token,
    pub value: Box<Expr>,
    pub index: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastExpr {
    pub position: Token,
    pub ty: Type,
    pub value: Box<Expr>,
}

/// `Enum::Element`, evaluated to the element's ordinal as an `int32`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumAccessExpr {
    pub enum_name: Token,
    pub element_name: Token,
}

impl EnumAccessExpr {
    pub fn qualified_name(&self) -> String {
        qualified_enum_name(&self.enum_name.value, &self.element_name.value)
    }
}

pub fn qualified_enum_name(enum_name: &str, element_name: &str) -> String {
    format!("{}::{}", enum_name, element_name)
}

/// Value producing `if`. Both branches share the type of `if_value`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfExpr {
    pub if_token: Token,
    pub else_token: Token,
    pub condition: Box<Expr>,
    pub if_value: Box<Expr>,
    pub else_value: Box<Expr>,
}

pub(crate) fn set_once(cell: &OnceCell<Type>, resolved_type: Type, name: &Token) -> Result<(), Error> {
    match cell.get() {
        Some(existing) if *existing == resolved_type => Ok(()),
        Some(existing) => Err(Error::new(
            ErrorImpl::TypeAlreadyResolved {
                name: name.value.clone(),
                resolved: existing.to_string(),
                received: resolved_type.to_string(),
            },
            name.get_position(),
        )),
        None => {
            let _ = cell.set(resolved_type);
            Ok(())
        }
    }
}

pub(crate) fn get_resolved<'a>(cell: &'a OnceCell<Type>, name: &Token) -> Result<&'a Type, Error> {
    cell.get().ok_or_else(|| {
        Error::new(
            ErrorImpl::UnresolvedType {
                name: name.value.clone(),
            },
            name.get_position(),
        )
    })
}
