//! Collection and rendering of compiler diagnostics.

pub mod diagnostics;

#[cfg(test)]
mod tests;
