use std::cell::OnceCell;

use crate::{errors::errors::Error, tokens::tokens::Token};

use super::{
    ast::{Expr, Stmt},
    expressions::{get_resolved, set_once, CallExpr},
    types::{FunctionSignature, Type},
};

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
    pub nodes: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: Token,
    pub ty: Type,
}

/// `var name: type = value;`. The type may be inferred by the resolver, so it
/// is bound late.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDeclaration {
    pub name: Token,
    ty: OnceCell<Type>,
    pub value: Option<Expr>,
}

impl FieldDeclaration {
    pub fn new(name: Token, ty: Type, value: Option<Expr>) -> Self {
        FieldDeclaration {
            name,
            ty: OnceCell::from(ty),
            value,
        }
    }

    pub fn unresolved(name: Token, value: Option<Expr>) -> Self {
        FieldDeclaration {
            name,
            ty: OnceCell::new(),
            value,
        }
    }

    pub fn set_type(&self, resolved_type: Type) -> Result<(), Error> {
        set_once(&self.ty, resolved_type, &self.name)
    }

    pub fn get_type(&self) -> Result<&Type, Error> {
        get_resolved(&self.ty, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionPrototype {
    pub name: Token,
    pub parameters: Vec<Parameter>,
    pub return_type: Type,
    pub is_variadic: bool,
}

impl FunctionPrototype {
    pub fn signature(&self) -> FunctionSignature {
        FunctionSignature {
            parameters: self.parameters.iter().map(|p| p.ty.clone()).collect(),
            return_type: Box::new(self.return_type.clone()),
            is_variadic: self.is_variadic,
        }
    }
}

/// A prototype whose body is provided by another module.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalPrototype {
    pub extern_token: Token,
    pub prototype: FunctionPrototype,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub prototype: FunctionPrototype,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDeclaration {
    pub name: Token,
    pub values: Vec<Token>,
}

/// `if` statement. An `else if` chain nests another `If` in `else_body`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub position: Token,
    pub condition: Expr,
    pub then_body: Box<Stmt>,
    pub else_body: Option<Box<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub position: Token,
    pub condition: Expr,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub position: Token,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeferStmt {
    pub position: Token,
    pub call: CallExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakStmt {
    pub position: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStmt {
    pub expression: Expr,
}
