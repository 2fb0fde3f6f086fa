//! Code generation module for the compiler.
//!
//! This module contains the LLVM-based code generator that transforms
//! the resolved syntax tree into LLVM IR. It handles:
//!
//! - Declaration of functions, enums and globals
//! - Compilation of expressions and statements
//! - Type lowering from language types to LLVM types
//! - Scoped storage, deferred calls and loop exits

pub mod compiler;
pub mod defer;
pub mod expr;
pub mod loops;
pub mod scope;
pub mod stmt;
pub mod types;

#[cfg(test)]
mod tests;
