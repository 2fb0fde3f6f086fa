//! Unit tests for the token model.

use crate::Span;

use super::tokens::{Token, TokenKind};

#[test]
fn test_symbol_lookup() {
    assert_eq!(TokenKind::from_symbol("<<"), Some(TokenKind::LeftShift));
    assert_eq!(TokenKind::from_symbol("&&"), Some(TokenKind::AndAnd));
    assert_eq!(TokenKind::from_symbol("defer"), Some(TokenKind::Defer));
    assert_eq!(TokenKind::from_symbol("@"), None);
}

#[test]
fn test_symbol_token_keeps_spelling() {
    let token = Token::symbol("+=", Span::null()).unwrap();
    assert_eq!(token.kind, TokenKind::PlusEqual);
    assert_eq!(token.value, "+=");
}

#[test]
fn test_compound_operator() {
    assert_eq!(
        TokenKind::PercentEqual.compound_operator(),
        Some(TokenKind::Percent)
    );
    assert_eq!(TokenKind::Equal.compound_operator(), None);
}
