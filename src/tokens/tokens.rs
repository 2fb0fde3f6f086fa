use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::{Position, Span};

lazy_static! {
    pub static ref SYMBOL_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("+", TokenKind::Plus);
        map.insert("-", TokenKind::Minus);
        map.insert("*", TokenKind::Star);
        map.insert("/", TokenKind::Slash);
        map.insert("%", TokenKind::Percent);
        map.insert("&", TokenKind::And);
        map.insert("|", TokenKind::Or);
        map.insert("^", TokenKind::Xor);
        map.insert("~", TokenKind::Tilde);
        map.insert("!", TokenKind::Bang);
        map.insert("<<", TokenKind::LeftShift);
        map.insert(">>", TokenKind::RightShift);
        map.insert("==", TokenKind::EqualEqual);
        map.insert("!=", TokenKind::BangEqual);
        map.insert("<", TokenKind::Smaller);
        map.insert("<=", TokenKind::SmallerEqual);
        map.insert(">", TokenKind::Greater);
        map.insert(">=", TokenKind::GreaterEqual);
        map.insert("&&", TokenKind::AndAnd);
        map.insert("||", TokenKind::OrOr);
        map.insert("=", TokenKind::Equal);
        map.insert("+=", TokenKind::PlusEqual);
        map.insert("-=", TokenKind::MinusEqual);
        map.insert("*=", TokenKind::StarEqual);
        map.insert("/=", TokenKind::SlashEqual);
        map.insert("%=", TokenKind::PercentEqual);
        map.insert("++", TokenKind::PlusPlus);
        map.insert("--", TokenKind::MinusMinus);
        map.insert("true", TokenKind::True);
        map.insert("false", TokenKind::False);
        map.insert("null", TokenKind::Null);
        map.insert("var", TokenKind::Var);
        map.insert("fun", TokenKind::Fun);
        map.insert("extern", TokenKind::Extern);
        map.insert("enum", TokenKind::Enum);
        map.insert("if", TokenKind::If);
        map.insert("else", TokenKind::Else);
        map.insert("while", TokenKind::While);
        map.insert("return", TokenKind::Return);
        map.insert("defer", TokenKind::Defer);
        map.insert("break", TokenKind::Break);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    Identifier,
    Integer,
    Float,
    Character,
    String,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    And,   // &
    Or,    // |
    Xor,   // ^
    Tilde, // ~
    Bang,  // !

    LeftShift,
    RightShift,

    EqualEqual,
    BangEqual,
    Smaller,
    SmallerEqual,
    Greater,
    GreaterEqual,

    AndAnd,
    OrOr,

    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,

    PlusPlus,
    MinusMinus,

    // Reserved
    True,
    False,
    Null,
    Var,
    Fun,
    Extern,
    Enum,
    If,
    Else,
    While,
    Return,
    Defer,
    Break,
}

impl TokenKind {
    pub fn from_symbol(symbol: &str) -> Option<TokenKind> {
        SYMBOL_LOOKUP.get(symbol).copied()
    }

    /// The arithmetic operator applied by a compound assignment (`+=` -> `+`).
    pub fn compound_operator(&self) -> Option<TokenKind> {
        match self {
            TokenKind::PlusEqual => Some(TokenKind::Plus),
            TokenKind::MinusEqual => Some(TokenKind::Minus),
            TokenKind::StarEqual => Some(TokenKind::Star),
            TokenKind::SlashEqual => Some(TokenKind::Slash),
            TokenKind::PercentEqual => Some(TokenKind::Percent),
            _ => None,
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.kind, self.value)
    }
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, span: Span) -> Self {
        Token {
            kind,
            value: value.into(),
            span,
        }
    }

    /// Builds an operator or keyword token from its spelling.
    ///
    /// Returns `None` when the spelling is not a known symbol.
    pub fn symbol(symbol: &str, span: Span) -> Option<Self> {
        TokenKind::from_symbol(symbol).map(|kind| Token::new(kind, symbol, span))
    }

    pub fn identifier(name: impl Into<String>, span: Span) -> Self {
        Token::new(TokenKind::Identifier, name, span)
    }

    pub fn get_position(&self) -> Position {
        self.span.start.clone()
    }
}
