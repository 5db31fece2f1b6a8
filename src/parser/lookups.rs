use std::collections::HashMap;

use crate::{
    ast::{ast::Ast, statements::Stmt},
    errors::errors::Error,
    lexer::tokens::TokenKind,
};

use super::{expr::*, parser::Parser, stmt::*};

/// Fortran operator precedence, weakest first.
#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub enum BindingPower {
    Default,
    DefinedBinary,
    Equivalence,
    Or,
    And,
    Not,
    Relational,
    Concat,
    Additive,
    Multiplicative,
    Power,
    DefinedUnary,
    Call,
    Member,
    Primary,
}

pub type StmtHandler = fn(&mut Parser) -> Result<Stmt, Error>;
pub type NUDHandler = fn(&mut Parser) -> Result<Ast, Error>;
pub type LEDHandler = fn(&mut Parser, Ast, BindingPower) -> Result<Ast, Error>;

pub fn create_token_lookups(parser: &mut Parser) {
    // Defined and logical
    parser.led(TokenKind::DefinedOperator, BindingPower::DefinedBinary, parse_defined_binary_expr);
    parser.led(TokenKind::Eqv, BindingPower::Equivalence, parse_binary_expr);
    parser.led(TokenKind::Neqv, BindingPower::Equivalence, parse_binary_expr);
    parser.led(TokenKind::Or, BindingPower::Or, parse_binary_expr);
    parser.led(TokenKind::And, BindingPower::And, parse_binary_expr);

    // Relational
    parser.led(TokenKind::Equals, BindingPower::Relational, parse_binary_expr);
    parser.led(TokenKind::NotEquals, BindingPower::Relational, parse_binary_expr);
    parser.led(TokenKind::Less, BindingPower::Relational, parse_binary_expr);
    parser.led(TokenKind::LessEquals, BindingPower::Relational, parse_binary_expr);
    parser.led(TokenKind::Greater, BindingPower::Relational, parse_binary_expr);
    parser.led(TokenKind::GreaterEquals, BindingPower::Relational, parse_binary_expr);

    // Character, additive and multiplicative
    parser.led(TokenKind::Concat, BindingPower::Concat, parse_binary_expr);
    parser.led(TokenKind::Plus, BindingPower::Additive, parse_binary_expr);
    parser.led(TokenKind::Dash, BindingPower::Additive, parse_binary_expr);
    parser.led(TokenKind::Star, BindingPower::Multiplicative, parse_binary_expr);
    parser.led(TokenKind::Slash, BindingPower::Multiplicative, parse_binary_expr);
    parser.led(TokenKind::Power, BindingPower::Power, parse_power_expr);

    parser.led(TokenKind::OpenParen, BindingPower::Call, parse_call_expr);
    parser.led(TokenKind::Percent, BindingPower::Member, parse_component_expr);

    // Literals and names
    parser.nud(TokenKind::Number, parse_primary_expr);
    parser.nud(TokenKind::RealNumber, parse_primary_expr);
    parser.nud(TokenKind::String, parse_primary_expr);
    parser.nud(TokenKind::True, parse_primary_expr);
    parser.nud(TokenKind::False, parse_primary_expr);
    parser.nud(TokenKind::Identifier, parse_primary_expr);
    for reserved in [
        TokenKind::Integer,
        TokenKind::Real,
        TokenKind::Double,
        TokenKind::Complex,
        TokenKind::Logical,
        TokenKind::Character,
        TokenKind::Type,
    ] {
        parser.nud(reserved, parse_primary_expr);
    }

    // Prefix and grouping
    parser.nud(TokenKind::Dash, parse_prefix_expr);
    parser.nud(TokenKind::Plus, parse_prefix_expr);
    parser.nud(TokenKind::Not, parse_prefix_expr);
    parser.nud(TokenKind::DefinedOperator, parse_defined_unary_expr);
    parser.nud(TokenKind::OpenParen, parse_grouping_expr);
    parser.nud(TokenKind::OpenArray, parse_array_constructor_expr);
    parser.nud(TokenKind::OpenBracket, parse_array_constructor_expr);

    // Statements
    parser.stmt(TokenKind::Integer, parse_declaration_stmt);
    parser.stmt(TokenKind::Real, parse_declaration_stmt);
    parser.stmt(TokenKind::Double, parse_declaration_stmt);
    parser.stmt(TokenKind::Complex, parse_declaration_stmt);
    parser.stmt(TokenKind::Logical, parse_declaration_stmt);
    parser.stmt(TokenKind::Character, parse_declaration_stmt);
    parser.stmt(TokenKind::Type, parse_type_stmt);
    parser.stmt(TokenKind::Function, parse_procedure_stmt);
    parser.stmt(TokenKind::Subroutine, parse_procedure_stmt);
    parser.stmt(TokenKind::Elemental, parse_procedure_stmt);
    parser.stmt(TokenKind::Pure, parse_procedure_stmt);
    parser.stmt(TokenKind::Interface, parse_interface_stmt);
    parser.stmt(TokenKind::Call, parse_call_stmt);
}

// Lookup tables inside parser struct, so it's easier
pub type StmtLookup = HashMap<TokenKind, StmtHandler>;
pub type NUDLookup = HashMap<TokenKind, NUDHandler>;
pub type LEDLookup = HashMap<TokenKind, LEDHandler>;
pub type BPLookup = HashMap<TokenKind, BindingPower>;
