/// AST (Abstract Syntax Tree) module
/// Contains the resolved tree consumed by the code generator
///
/// Submodules:
/// - ast: Statement and expression families and the compilation unit
/// - expressions: Expression node definitions
/// - statements: Statement node definitions
/// - types: The language type model
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;

#[cfg(test)]
mod tests;
