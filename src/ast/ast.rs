use crate::{
    errors::errors::{Error, ErrorImpl},
    tokens::tokens::TokenKind,
    Position,
};

use super::{
    expressions::{
        ArrayExpr, AssignExpr, BinaryExpr, BooleanExpr, CallExpr, CastExpr, CharacterExpr,
        EnumAccessExpr, GroupExpr, IfExpr, IndexExpr, LiteralExpr, NullExpr, NumberExpr,
        StringExpr, UnaryExpr,
    },
    statements::{
        BlockStmt, BreakStmt, DeferStmt, EnumDeclaration, ExpressionStmt, ExternalPrototype,
        FieldDeclaration, FunctionDeclaration, FunctionPrototype, IfStmt, ReturnStmt, WhileStmt,
    },
    types::Type,
};

/// The ordered top-level statements of one source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompilationUnit {
    pub tree_nodes: Vec<Stmt>,
}

impl CompilationUnit {
    pub fn new(tree_nodes: Vec<Stmt>) -> Self {
        CompilationUnit { tree_nodes }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block(BlockStmt),
    FieldDeclaration(FieldDeclaration),
    ExternalPrototype(ExternalPrototype),
    FunctionPrototype(FunctionPrototype),
    FunctionDeclaration(FunctionDeclaration),
    EnumDeclaration(EnumDeclaration),
    If(IfStmt),
    While(WhileStmt),
    Return(ReturnStmt),
    Defer(DeferStmt),
    Break(BreakStmt),
    Expression(ExpressionStmt),
}

impl Stmt {
    /// Short human readable name of the statement kind.
    pub fn name(&self) -> &'static str {
        match self {
            Stmt::Block(_) => "block",
            Stmt::FieldDeclaration(_) => "field declaration",
            Stmt::ExternalPrototype(_) => "extern",
            Stmt::FunctionPrototype(_) => "prototype",
            Stmt::FunctionDeclaration(_) => "function",
            Stmt::EnumDeclaration(_) => "enum",
            Stmt::If(_) => "if",
            Stmt::While(_) => "while",
            Stmt::Return(_) => "return",
            Stmt::Defer(_) => "defer",
            Stmt::Break(_) => "break",
            Stmt::Expression(_) => "expression",
        }
    }

    pub fn get_position(&self) -> Position {
        match self {
            Stmt::Block(block) => block
                .nodes
                .first()
                .map(|node| node.get_position())
                .unwrap_or_else(Position::null),
            Stmt::FieldDeclaration(field) => field.name.get_position(),
            Stmt::ExternalPrototype(external) => external.extern_token.get_position(),
            Stmt::FunctionPrototype(prototype) => prototype.name.get_position(),
            Stmt::FunctionDeclaration(function) => function.prototype.name.get_position(),
            Stmt::EnumDeclaration(declaration) => declaration.name.get_position(),
            Stmt::If(if_stmt) => if_stmt.position.get_position(),
            Stmt::While(while_stmt) => while_stmt.position.get_position(),
            Stmt::Return(return_stmt) => return_stmt.position.get_position(),
            Stmt::Defer(defer_stmt) => defer_stmt.position.get_position(),
            Stmt::Break(break_stmt) => break_stmt.position.get_position(),
            Stmt::Expression(expression_stmt) => expression_stmt.expression.get_position(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Group(GroupExpr),
    Assign(AssignExpr),
    Binary(BinaryExpr),
    Shift(BinaryExpr),
    Comparison(BinaryExpr),
    Logical(BinaryExpr),
    Unary(UnaryExpr),
    Call(CallExpr),
    Literal(LiteralExpr),
    Number(NumberExpr),
    Character(CharacterExpr),
    Boolean(BooleanExpr),
    Null(NullExpr),
    String(StringExpr),
    Array(ArrayExpr),
    Index(IndexExpr),
    Cast(CastExpr),
    EnumAccess(EnumAccessExpr),
    If(IfExpr),
}

impl Expr {
    /// The resolved type of this expression.
    pub fn get_type(&self) -> Result<Type, Error> {
        match self {
            Expr::Comparison(_) | Expr::Logical(_) | Expr::Boolean(_) => Ok(Type::boolean()),
            Expr::Group(group) => group.expression.get_type(),
            Expr::Assign(assign) => assign.right.get_type(),
            Expr::Binary(binary) | Expr::Shift(binary) => binary.right.get_type(),
            Expr::Unary(unary) => {
                let operand = unary.right.get_type()?;
                match unary.operator.kind {
                    TokenKind::Star => match operand {
                        Type::Pointer(pointee) => Ok(*pointee),
                        other => Err(Error::new(
                            ErrorImpl::UnsupportedOperator {
                                operator: unary.operator.value.clone(),
                                type_: other.to_string(),
                            },
                            unary.operator.get_position(),
                        )),
                    },
                    TokenKind::And => Ok(Type::pointer(operand)),
                    _ => Ok(operand),
                }
            }
            Expr::Call(call) => {
                let callee = call.callee.get_type()?;
                match callee.callable_signature() {
                    Some(signature) => Ok(signature.return_type.as_ref().clone()),
                    None => Err(Error::new(
                        ErrorImpl::NotCallable {
                            type_: callee.to_string(),
                        },
                        call.position.get_position(),
                    )),
                }
            }
            Expr::Literal(literal) => literal.get_type().cloned(),
            Expr::Number(number) => Ok(number.ty.clone()),
            Expr::Character(_) => Ok(Type::Integer(8)),
            Expr::Null(_) => Ok(Type::pointer(Type::Void)),
            Expr::String(string) => Ok(string.get_type()),
            Expr::Array(array) => Ok(Type::array(
                array.element_type.clone(),
                array.values.len() as u32,
            )),
            Expr::Index(index) => {
                let base = index.value.get_type()?;
                match base.indexed_type() {
                    Some(element) => Ok(element.clone()),
                    None => Err(Error::new(
                        ErrorImpl::NotIndexable {
                            type_: base.to_string(),
                        },
                        index.position.get_position(),
                    )),
                }
            }
            Expr::Cast(cast) => Ok(cast.ty.clone()),
            Expr::EnumAccess(_) => Ok(Type::Integer(32)),
            Expr::If(if_expr) => if_expr.if_value.get_type(),
        }
    }

    pub fn get_position(&self) -> Position {
        match self {
            Expr::Group(group) => group.position.get_position(),
            Expr::Assign(assign) => assign.operator.get_position(),
            Expr::Binary(binary)
            | Expr::Shift(binary)
            | Expr::Comparison(binary)
            | Expr::Logical(binary) => binary.operator.get_position(),
            Expr::Unary(unary) => unary.operator.get_position(),
            Expr::Call(call) => call.position.get_position(),
            Expr::Literal(literal) => literal.name.get_position(),
            Expr::Number(number) => number.value.get_position(),
            Expr::Character(character) => character.value.get_position(),
            Expr::Boolean(boolean) => boolean.value.get_position(),
            Expr::Null(null) => null.value.get_position(),
            Expr::String(string) => string.value.get_position(),
            Expr::Array(array) => array.position.get_position(),
            Expr::Index(index) => index.position.get_position(),
            Expr::Cast(cast) => cast.position.get_position(),
            Expr::EnumAccess(access) => access.enum_name.get_position(),
            Expr::If(if_expr) => if_expr.if_token.get_position(),
        }
    }
}
