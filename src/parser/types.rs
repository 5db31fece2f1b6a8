//! Type specification parsing.
//!
//! Handles the declaration type of an entity and its array shape:
//!
//! - Intrinsic types with kind selectors: `integer(8)`, `real(kind=4)`, `real*8`
//! - `double precision`
//! - Character length selectors: `character(len=10)`, `character(*)`, `character*5`
//! - Derived types: `type(point)`
//! - Array specifications: `(3)`, `(0:n)`, `(:,:)`, `(*)`

use crate::{
    ast::{
        ast::{Ast, AstKind},
        types::{DimSpec, IntrinsicTypeName, LenSelector, TypeSpec},
    },
    errors::errors::Error,
    lexer::tokens::TokenKind,
};

use super::{expr::parse_expr, lookups::BindingPower, parser::Parser};

/// Whether the current token can open a type specification.
pub fn is_type_spec_start(parser: &Parser) -> bool {
    match parser.current_token_kind() {
        TokenKind::Integer
        | TokenKind::Real
        | TokenKind::Double
        | TokenKind::Complex
        | TokenKind::Logical
        | TokenKind::Character => true,
        TokenKind::Type => parser.peek(1).kind == TokenKind::OpenParen,
        _ => false,
    }
}

pub fn parse_type_spec(parser: &mut Parser) -> Result<TypeSpec, Error> {
    let token = parser.advance().clone();
    let name = match token.kind {
        TokenKind::Integer => IntrinsicTypeName::Integer,
        TokenKind::Real => IntrinsicTypeName::Real,
        TokenKind::Complex => IntrinsicTypeName::Complex,
        TokenKind::Logical => IntrinsicTypeName::Logical,
        TokenKind::Double => {
            parser.expect_word("precision")?;
            return Ok(TypeSpec::Intrinsic {
                name: IntrinsicTypeName::DoublePrecision,
                kind: None,
                len: None,
            });
        }
        TokenKind::Character => return parse_character_spec(parser),
        TokenKind::Type => {
            parser.expect(TokenKind::OpenParen)?;
            let name = parser.expect_name()?;
            parser.expect(TokenKind::CloseParen)?;
            return Ok(TypeSpec::Derived(name));
        }
        _ => return Err(parser.unexpected("expected a type specification")),
    };

    let kind = match parser.current_token_kind() {
        TokenKind::OpenParen => {
            parser.advance();
            if parser.current_token().is_word("kind") && parser.peek(1).kind == TokenKind::Assignment {
                parser.advance();
                parser.advance();
            }
            let kind = parse_expr(parser, BindingPower::Default)?;
            parser.expect(TokenKind::CloseParen)?;
            Some(kind)
        }
        TokenKind::Star => {
            parser.advance();
            let size = parser.expect(TokenKind::Number)?;
            Some(Ast::leaf(AstKind::IntegerLiteral, &size.value, size.span))
        }
        _ => None,
    };

    Ok(TypeSpec::Intrinsic { name, kind, len: None })
}

fn parse_length(parser: &mut Parser) -> Result<LenSelector, Error> {
    if parser.current_token_kind() == TokenKind::Star {
        parser.advance();
        return Ok(LenSelector::Assumed);
    }
    Ok(LenSelector::Expr(parse_expr(parser, BindingPower::Default)?))
}

/// `*5`, `*(*)` or `*(n)` after an entity name or `character`.
pub fn parse_star_length(parser: &mut Parser) -> Result<LenSelector, Error> {
    parser.expect(TokenKind::Star)?;
    if parser.current_token_kind() == TokenKind::OpenParen {
        parser.advance();
        let len = parse_length(parser)?;
        parser.expect(TokenKind::CloseParen)?;
        return Ok(len);
    }
    let size = parser.expect(TokenKind::Number)?;
    Ok(LenSelector::Expr(Ast::leaf(AstKind::IntegerLiteral, &size.value, size.span)))
}

fn parse_character_spec(parser: &mut Parser) -> Result<TypeSpec, Error> {
    let mut len = None;
    let mut kind = None;

    match parser.current_token_kind() {
        TokenKind::OpenParen => {
            parser.advance();
            let mut position = 0;
            while parser.current_token_kind() != TokenKind::CloseParen {
                let keyword = if parser.current_token().is_name() && parser.peek(1).kind == TokenKind::Assignment {
                    let keyword = parser.advance().value.clone();
                    parser.advance();
                    Some(keyword)
                } else {
                    None
                };

                match keyword.as_deref() {
                    Some("len") => len = Some(parse_length(parser)?),
                    Some("kind") => kind = Some(parse_expr(parser, BindingPower::Default)?),
                    Some(_) => return Err(parser.unexpected("expected `len` or `kind`")),
                    None if position == 0 => len = Some(parse_length(parser)?),
                    None => kind = Some(parse_expr(parser, BindingPower::Default)?),
                }
                position += 1;

                if parser.current_token_kind() != TokenKind::CloseParen {
                    parser.expect(TokenKind::Comma)?;
                }
            }
            parser.expect(TokenKind::CloseParen)?;
        }
        TokenKind::Star => len = Some(parse_star_length(parser)?),
        _ => {}
    }

    Ok(TypeSpec::Intrinsic {
        name: IntrinsicTypeName::Character,
        kind,
        len,
    })
}

/// Parses `(dim, dim, ...)`.
pub fn parse_array_spec(parser: &mut Parser) -> Result<Vec<DimSpec>, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let mut dims = vec![];

    while parser.current_token_kind() != TokenKind::CloseParen {
        let dim = match parser.current_token_kind() {
            TokenKind::Colon => {
                parser.advance();
                DimSpec::AssumedShape { lower: None }
            }
            TokenKind::Star => {
                parser.advance();
                DimSpec::AssumedSize { lower: None }
            }
            _ => {
                let first = parse_expr(parser, BindingPower::Default)?;
                if parser.current_token_kind() != TokenKind::Colon {
                    DimSpec::Explicit { lower: None, upper: first }
                } else {
                    parser.advance();
                    match parser.current_token_kind() {
                        TokenKind::Star => {
                            parser.advance();
                            DimSpec::AssumedSize { lower: Some(first) }
                        }
                        TokenKind::Comma | TokenKind::CloseParen => DimSpec::AssumedShape { lower: Some(first) },
                        _ => DimSpec::Explicit {
                            lower: Some(first),
                            upper: parse_expr(parser, BindingPower::Default)?,
                        },
                    }
                }
            }
        };
        dims.push(dim);

        if parser.current_token_kind() != TokenKind::CloseParen {
            parser.expect(TokenKind::Comma)?;
        }
    }

    parser.expect(TokenKind::CloseParen)?;
    Ok(dims)
}
