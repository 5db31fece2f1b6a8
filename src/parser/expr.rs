use crate::{
    ast::ast::{Ast, AstKind},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Span,
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Ast, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_nud_lookup().get(&token_kind) {
        Some(nud) => *nud,
        None => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: parser.current_token().value.clone(),
                },
                parser.get_position(),
            ))
        }
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let token_bp = *parser
            .get_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);
        if token_bp <= bp {
            break;
        }

        let led = match parser.get_led_lookup().get(&token_kind) {
            Some(led) => *led,
            None => {
                return Err(Error::new(
                    ErrorImpl::UnexpectedToken {
                        token: parser.current_token().value.clone(),
                    },
                    left.span.start.clone(),
                ))
            }
        };
        left = led(parser, left, token_bp)?;
    }

    Ok(left)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Ast, Error> {
    let token = parser.current_token().clone();
    let kind = match token.kind {
        TokenKind::Number => AstKind::IntegerLiteral,
        TokenKind::RealNumber => AstKind::FloatingLiteral,
        TokenKind::String => AstKind::StringLiteral,
        TokenKind::True | TokenKind::False => AstKind::BooleanLiteral,
        _ if token.is_name() => AstKind::Symbol,
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken { token: token.value },
                parser.get_position(),
            ))
        }
    };
    parser.advance();

    let text = match token.kind {
        TokenKind::True => "true",
        TokenKind::False => "false",
        _ => token.value.as_str(),
    };
    Ok(Ast::leaf(kind, text, token.span))
}

fn binary_kind(kind: TokenKind) -> Option<AstKind> {
    Some(match kind {
        TokenKind::Plus => AstKind::Add,
        TokenKind::Dash => AstKind::Minus,
        TokenKind::Star => AstKind::Mul,
        TokenKind::Slash => AstKind::Div,
        TokenKind::Power => AstKind::Power,
        TokenKind::Concat => AstKind::Concat,
        TokenKind::Equals => AstKind::Equal,
        TokenKind::NotEquals => AstKind::Different,
        TokenKind::Less => AstKind::LowerThan,
        TokenKind::LessEquals => AstKind::LowerOrEqual,
        TokenKind::Greater => AstKind::GreaterThan,
        TokenKind::GreaterEquals => AstKind::GreaterOrEqual,
        TokenKind::And => AstKind::LogicalAnd,
        TokenKind::Or => AstKind::LogicalOr,
        TokenKind::Eqv => AstKind::Eqv,
        TokenKind::Neqv => AstKind::Neqv,
        _ => return None,
    })
}

pub fn parse_binary_expr(parser: &mut Parser, left: Ast, bp: BindingPower) -> Result<Ast, Error> {
    let operator_token = parser.current_token().clone();
    let kind = binary_kind(operator_token.kind).ok_or_else(|| {
        Error::new(
            ErrorImpl::UnexpectedToken {
                token: operator_token.value.clone(),
            },
            operator_token.span.start.clone(),
        )
    })?;
    parser.advance();

    let right = parse_expr(parser, bp)?;
    Ok(Ast::binary(kind, left, right))
}

/// `**` groups to the right: `a ** b ** c` is `a ** (b ** c)`.
pub fn parse_power_expr(parser: &mut Parser, left: Ast, _bp: BindingPower) -> Result<Ast, Error> {
    parser.advance();
    let right = parse_expr(parser, BindingPower::Multiplicative)?;
    Ok(Ast::binary(AstKind::Power, left, right))
}

pub fn parse_defined_binary_expr(parser: &mut Parser, left: Ast, bp: BindingPower) -> Result<Ast, Error> {
    let operator = parser.advance().value.clone();
    let right = parse_expr(parser, bp)?;
    Ok(Ast::binary(AstKind::DefinedBinary, left, right).with_text(&operator))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Ast, Error> {
    let operator_token = parser.advance().clone();
    let (kind, bp) = match operator_token.kind {
        TokenKind::Dash => (AstKind::Neg, BindingPower::Additive),
        TokenKind::Plus => (AstKind::Plus, BindingPower::Additive),
        _ => (AstKind::LogicalNot, BindingPower::Not),
    };

    let rhs = parse_expr(parser, bp)?;
    let span = operator_token.span.to(&rhs.span);
    Ok(Ast::node(kind, vec![rhs], span))
}

pub fn parse_defined_unary_expr(parser: &mut Parser) -> Result<Ast, Error> {
    let operator_token = parser.advance().clone();
    let rhs = parse_expr(parser, BindingPower::DefinedUnary)?;
    let span = operator_token.span.to(&rhs.span);
    Ok(Ast::new(AstKind::DefinedUnary, vec![rhs], &operator_token.value, span))
}

/// Items of a parenthesised list after a name.
struct ActualList {
    items: Vec<Ast>,
    has_keyword: bool,
    has_range: bool,
    end: Span,
}

fn empty_at(parser: &Parser) -> Ast {
    let position = parser.get_position();
    Ast::leaf(
        AstKind::Empty,
        "",
        Span {
            start: position.clone(),
            end: position,
        },
    )
}

fn at_range_end(parser: &Parser) -> bool {
    matches!(
        parser.current_token_kind(),
        TokenKind::Comma | TokenKind::CloseParen | TokenKind::Colon
    )
}

/// `[lower]:[upper][:stride]`, the leading bound already parsed.
fn parse_range_rest(parser: &mut Parser, lower: Ast) -> Result<Ast, Error> {
    parser.expect(TokenKind::Colon)?;
    let upper = if at_range_end(parser) {
        empty_at(parser)
    } else {
        parse_expr(parser, BindingPower::Default)?
    };
    let stride = if parser.current_token_kind() == TokenKind::Colon {
        parser.advance();
        parse_expr(parser, BindingPower::Default)?
    } else {
        empty_at(parser)
    };

    let span = lower.span.to(&stride.span);
    Ok(Ast::node(AstKind::Range, vec![lower, upper, stride], span))
}

fn parse_actual_list(parser: &mut Parser) -> Result<ActualList, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let mut list = ActualList {
        items: vec![],
        has_keyword: false,
        has_range: false,
        end: Span::null(),
    };

    while parser.current_token_kind() != TokenKind::CloseParen {
        let item = if parser.current_token().is_name() && parser.peek(1).kind == TokenKind::Assignment {
            let keyword = parser.advance().clone();
            parser.advance();
            let value = parse_expr(parser, BindingPower::Default)?;
            list.has_keyword = true;
            let span = keyword.span.to(&value.span);
            Ast::new(AstKind::KeywordArgument, vec![value], &keyword.value, span)
        } else if parser.current_token_kind() == TokenKind::Colon {
            list.has_range = true;
            let lower = empty_at(parser);
            parse_range_rest(parser, lower)?
        } else {
            let value = parse_expr(parser, BindingPower::Default)?;
            if parser.current_token_kind() == TokenKind::Colon {
                list.has_range = true;
                parse_range_rest(parser, value)?
            } else {
                value
            }
        };
        list.items.push(item);

        if parser.current_token_kind() != TokenKind::CloseParen {
            parser.expect(TokenKind::Comma)?;
        }
    }

    list.end = parser.expect(TokenKind::CloseParen)?.span;
    Ok(list)
}

/// `name(args)` may be a call or an array element; both readings are kept
/// for the checker unless the syntax rules one out.
pub fn parse_call_expr(parser: &mut Parser, left: Ast, _bp: BindingPower) -> Result<Ast, Error> {
    let start = left.span.clone();
    let list = parse_actual_list(parser)?;
    let span = start.to(&list.end);

    let subscript = |left: Ast, items: Vec<Ast>| {
        let subscripts = Ast::node(AstKind::SubscriptList, items, span.clone());
        Ast::node(AstKind::ArraySubscript, vec![left, subscripts], span.clone())
    };

    if left.kind != AstKind::Symbol || list.has_range {
        if list.has_keyword {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: "=".to_string(),
                    message: "keyword arguments are not allowed in a subscript".to_string(),
                },
                span.start.clone(),
            ));
        }
        return Ok(subscript(left, list.items));
    }

    let arguments = Ast::node(AstKind::ArgumentList, list.items.clone(), span.clone());
    let call = Ast::node(AstKind::FunctionCall, vec![left.clone(), arguments], span.clone());
    if list.has_keyword {
        return Ok(call);
    }

    Ok(Ast::node(AstKind::Ambiguous, vec![call, subscript(left, list.items)], span.clone()))
}

pub fn parse_component_expr(parser: &mut Parser, left: Ast, _bp: BindingPower) -> Result<Ast, Error> {
    parser.advance();
    let member = parser.current_token().clone();
    let name = parser.expect_name()?;
    let span = left.span.to(&member.span);
    Ok(Ast::new(AstKind::ComponentReference, vec![left], &name, span))
}

/// `(expr)`, a complex literal `(re, im)` or an implied-do
/// `(values, i = lower, upper[, stride])`.
pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Ast, Error> {
    let open = parser.advance().clone();
    let first = parse_expr(parser, BindingPower::Default)?;

    if parser.current_token_kind() == TokenKind::CloseParen {
        let close = parser.advance().clone();
        return Ok(Ast::node(AstKind::Parenthesized, vec![first], open.span.to(&close.span)));
    }

    let mut items = vec![first];
    while parser.current_token_kind() == TokenKind::Comma {
        parser.advance();
        if parser.current_token().is_name() && parser.peek(1).kind == TokenKind::Assignment {
            return parse_implied_do_rest(parser, open.span, items);
        }
        items.push(parse_expr(parser, BindingPower::Default)?);
    }

    let close = parser.expect(TokenKind::CloseParen)?;
    let span = open.span.to(&close.span);
    if items.len() == 2 {
        return Ok(Ast::node(AstKind::ComplexLiteral, items, span));
    }

    Err(Error::new(
        ErrorImpl::UnexpectedTokenDetailed {
            token: ",".to_string(),
            message: "expected a complex literal or an implied-do".to_string(),
        },
        span.start,
    ))
}

fn parse_implied_do_rest(parser: &mut Parser, open: Span, values: Vec<Ast>) -> Result<Ast, Error> {
    let variable = parser.expect_name()?;
    parser.expect(TokenKind::Assignment)?;
    let lower = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Comma)?;
    let upper = parse_expr(parser, BindingPower::Default)?;
    let stride = if parser.current_token_kind() == TokenKind::Comma {
        parser.advance();
        parse_expr(parser, BindingPower::Default)?
    } else {
        empty_at(parser)
    };
    let close = parser.expect(TokenKind::CloseParen)?;

    let span = open.to(&close.span);
    let values = Ast::node(AstKind::ArgumentList, values, span.clone());
    Ok(Ast::new(AstKind::ImpliedDo, vec![values, lower, upper, stride], &variable, span))
}

/// `(/ a, b, c /)` or `[a, b, c]`
pub fn parse_array_constructor_expr(parser: &mut Parser) -> Result<Ast, Error> {
    let open = parser.advance().clone();
    let closing = if open.kind == TokenKind::OpenArray {
        TokenKind::CloseArray
    } else {
        TokenKind::CloseBracket
    };

    let mut items = vec![];
    while parser.current_token_kind() != closing {
        items.push(parse_expr(parser, BindingPower::Default)?);
        if parser.current_token_kind() != closing {
            parser.expect(TokenKind::Comma)?;
        }
    }
    let close = parser.expect(closing)?;

    Ok(Ast::node(AstKind::ArrayConstructor, items, open.span.to(&close.span)))
}

/// Spelling used to name an operator interface: `operator(.eq.)` and
/// `operator(==)` name the same generic.
pub fn operator_spelling(kind: TokenKind, value: &str) -> Option<String> {
    let spelling = match kind {
        TokenKind::DefinedOperator => return Some(value.to_string()),
        TokenKind::Not => ".not.",
        TokenKind::Star => "*",
        _ => binary_kind(kind)?.operator_name(),
    };
    Some(spelling.to_string())
}
