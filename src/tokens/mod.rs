//! Token model shared with the lexer.
//!
//! The lexer itself lives upstream; tree nodes keep the tokens it produced so
//! that the code generator can read operators and literal text and can point
//! errors at a source position.

pub mod tokens;

#[cfg(test)]
mod tests;
