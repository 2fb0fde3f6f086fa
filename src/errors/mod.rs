//! Error types for the code generator.
//!
//! This module defines the fatal errors raised while lowering a resolved
//! syntax tree. Each error names the violated invariant and carries the
//! source position of the node that violated it.

pub mod errors;

#[cfg(test)]
mod tests;
