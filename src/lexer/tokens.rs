use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    /// Words that open a statement. Fortran has no reserved words, so the
    /// parser still accepts these where a name is expected.
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("integer", TokenKind::Integer);
        map.insert("real", TokenKind::Real);
        map.insert("double", TokenKind::Double);
        map.insert("complex", TokenKind::Complex);
        map.insert("logical", TokenKind::Logical);
        map.insert("character", TokenKind::Character);
        map.insert("type", TokenKind::Type);
        map.insert("function", TokenKind::Function);
        map.insert("subroutine", TokenKind::Subroutine);
        map.insert("interface", TokenKind::Interface);
        map.insert("end", TokenKind::End);
        map.insert("call", TokenKind::Call);
        map.insert("elemental", TokenKind::Elemental);
        map.insert("pure", TokenKind::Pure);
        map.insert("implicit", TokenKind::Implicit);
        map.insert("program", TokenKind::Program);
        map
    };

    /// Dotted operators and logical constants.
    pub static ref DOT_OPERATOR_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert(".and.", TokenKind::And);
        map.insert(".or.", TokenKind::Or);
        map.insert(".not.", TokenKind::Not);
        map.insert(".eqv.", TokenKind::Eqv);
        map.insert(".neqv.", TokenKind::Neqv);
        map.insert(".eq.", TokenKind::Equals);
        map.insert(".ne.", TokenKind::NotEquals);
        map.insert(".lt.", TokenKind::Less);
        map.insert(".le.", TokenKind::LessEquals);
        map.insert(".gt.", TokenKind::Greater);
        map.insert(".ge.", TokenKind::GreaterEquals);
        map.insert(".true.", TokenKind::True);
        map.insert(".false.", TokenKind::False);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Newline,
    Number,
    RealNumber,
    String,
    Identifier,
    True,
    False,
    DefinedOperator,

    OpenParen,
    CloseParen,
    OpenArray,  // (/
    CloseArray, // /)
    OpenBracket,
    CloseBracket,

    Assignment, // =
    Equals,     // ==
    NotEquals,  // /=
    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    And,
    Or,
    Not,
    Eqv,
    Neqv,

    Comma,
    Colon,
    DoubleColon,
    Percent,

    Plus,
    Dash,
    Star,
    Slash,
    Power,  // **
    Concat, // //

    // Reserved
    Integer,
    Real,
    Double,
    Complex,
    Logical,
    Character,
    Type,
    Function,
    Subroutine,
    Interface,
    End,
    Call,
    Elemental,
    Pure,
    Implicit,
    Program,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl TokenKind {
    pub fn is_reserved(&self) -> bool {
        RESERVED_LOOKUP.values().any(|kind| kind == self)
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token {{\nkind: {},\nvalue: {}}}", self.kind, self.value)
    }
}

impl Token {
    /// Whether the token can stand for a name: identifiers and every
    /// reserved word.
    pub fn is_name(&self) -> bool {
        self.kind == TokenKind::Identifier || self.kind.is_reserved()
    }

    /// Case-folded check of a contextual keyword such as `parameter`.
    pub fn is_word(&self, word: &str) -> bool {
        self.is_name() && self.value == word
    }
}
