#![allow(clippy::module_inception)]

//! LLVM code generation for the Jot language.
//!
//! The crate takes a fully resolved syntax tree ([`ast::ast::CompilationUnit`])
//! and lowers it into an LLVM module through [`compiler::compiler::compile`].
//! Lexing, parsing and type resolution happen upstream; the tree handed to the
//! compiler is expected to be well formed, and any violation is reported as a
//! fatal [`errors::errors::Error`].

use std::{fmt::Display, rc::Rc};

pub mod ast;
pub mod compiler;
pub mod diagnostics;
pub mod errors;
pub mod tokens;

/// Byte offset into a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.1, self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(file: &Rc<String>, start: u32, end: u32) -> Self {
        Span {
            start: Position(start, Rc::clone(file)),
            end: Position(end, Rc::clone(file)),
        }
    }

    pub fn null() -> Self {
        Span {
            start: Position::null(),
            end: Position::null(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{Position, Span};

    #[test]
    fn test_position_display() {
        let position = Position(42, Rc::new("main.jot".to_string()));
        assert_eq!(position.to_string(), "main.jot:42");
    }

    #[test]
    fn test_span_shares_file() {
        let file = Rc::new("main.jot".to_string());
        let span = Span::new(&file, 3, 7);
        assert_eq!(span.start.0, 3);
        assert_eq!(span.end.0, 7);
        assert!(Rc::ptr_eq(&span.start.1, &span.end.1));
    }
}
