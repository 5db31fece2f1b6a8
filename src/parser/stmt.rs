use crate::{
    ast::{
        ast::{Ast, AstKind},
        statements::{
            Attribute, DeclarationStmt, DerivedTypeStmt, EntityDecl, GenericName, InterfaceStmt, ProcedurePrefix,
            ProcedureStmt, Stmt,
        },
        types::TypeSpec,
    },
    errors::errors::Error,
    lexer::tokens::TokenKind,
    symbols::symbols::Intent,
    Position,
};

use super::{
    expr::{operator_spelling, parse_call_expr, parse_expr},
    lookups::BindingPower,
    parser::Parser,
    types::{is_type_spec_start, parse_array_spec, parse_star_length, parse_type_spec},
};

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let handler = parser.get_stmt_lookup().get(&parser.current_token_kind()).copied();
    if let Some(handler) = handler {
        if !starts_assignment(parser) {
            return handler(parser);
        }
    }

    let expr = parse_expr(parser, BindingPower::Default)?;

    let stmt = if parser.current_token_kind() == TokenKind::Assignment {
        parser.advance();
        let value = parse_expr(parser, BindingPower::Default)?;
        Stmt::Assignment(Ast::binary(AstKind::Assignment, expr, value))
    } else {
        Stmt::Expression(expr)
    };

    expect_end_of_statement(parser)?;
    Ok(stmt)
}

/// `real = 1.0` assigns to a variable named `real`.
fn starts_assignment(parser: &Parser) -> bool {
    parser.peek(1).kind == TokenKind::Assignment
}

pub fn expect_end_of_statement(parser: &mut Parser) -> Result<(), Error> {
    match parser.current_token_kind() {
        TokenKind::Newline => {
            parser.advance();
            Ok(())
        }
        TokenKind::EOF => Ok(()),
        _ => Err(parser.unexpected("expected end of statement")),
    }
}

/// `type-spec [, attr]... [::] entity [, entity]...`, or a function whose
/// result type leads the statement.
pub fn parse_declaration_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.get_position();
    let type_spec = parse_type_spec(parser)?;

    if matches!(
        parser.current_token_kind(),
        TokenKind::Function | TokenKind::Elemental | TokenKind::Pure
    ) {
        let prefix = parse_prefix(parser);
        return Ok(Stmt::Procedure(parse_procedure_rest(parser, prefix, Some(type_spec), start)?));
    }

    Ok(Stmt::Declaration(parse_declaration_rest(parser, type_spec, start)?))
}

fn parse_declaration(parser: &mut Parser) -> Result<DeclarationStmt, Error> {
    let start = parser.get_position();
    let type_spec = parse_type_spec(parser)?;
    parse_declaration_rest(parser, type_spec, start)
}

fn parse_declaration_rest(parser: &mut Parser, type_spec: TypeSpec, start: Position) -> Result<DeclarationStmt, Error> {
    let mut attributes = vec![];
    while parser.current_token_kind() == TokenKind::Comma {
        parser.advance();
        attributes.push(parse_attribute(parser)?);
    }
    if parser.current_token_kind() == TokenKind::DoubleColon {
        parser.advance();
    }

    let mut entities = vec![];
    loop {
        let entity_start = parser.get_position();
        let name = parser.expect_name()?;
        let dimensions = if parser.current_token_kind() == TokenKind::OpenParen {
            Some(parse_array_spec(parser)?)
        } else {
            None
        };
        let length = if parser.current_token_kind() == TokenKind::Star {
            Some(parse_star_length(parser)?)
        } else {
            None
        };
        let initializer = if parser.current_token_kind() == TokenKind::Assignment {
            parser.advance();
            Some(parse_expr(parser, BindingPower::Default)?)
        } else {
            None
        };

        entities.push(EntityDecl {
            name,
            dimensions,
            length,
            initializer,
            span: parser.span_from(&entity_start),
        });

        if parser.current_token_kind() != TokenKind::Comma {
            break;
        }
        parser.advance();
    }

    let span = parser.span_from(&start);
    expect_end_of_statement(parser)?;

    Ok(DeclarationStmt {
        type_spec,
        attributes,
        entities,
        span,
    })
}

fn parse_attribute(parser: &mut Parser) -> Result<Attribute, Error> {
    let word = parser.current_token().value.clone();
    match word.as_str() {
        "parameter" => {
            parser.advance();
            Ok(Attribute::Parameter)
        }
        "pointer" => {
            parser.advance();
            Ok(Attribute::Pointer)
        }
        "optional" => {
            parser.advance();
            Ok(Attribute::Optional)
        }
        "dimension" => {
            parser.advance();
            Ok(Attribute::Dimension(parse_array_spec(parser)?))
        }
        "intent" => {
            parser.advance();
            parser.expect(TokenKind::OpenParen)?;
            let intent = match parser.current_token().value.as_str() {
                "in" => Intent::In,
                "out" => Intent::Out,
                "inout" => Intent::InOut,
                _ => return Err(parser.unexpected("expected `in`, `out` or `inout`")),
            };
            parser.advance();
            parser.expect(TokenKind::CloseParen)?;
            Ok(Attribute::Intent(intent))
        }
        _ => Err(parser.unexpected("expected an attribute")),
    }
}

/// `type(name) :: x` declares; `type [::] name` opens a definition.
pub fn parse_type_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    if is_type_spec_start(parser) {
        return parse_declaration_stmt(parser);
    }

    let start = parser.get_position();
    parser.expect(TokenKind::Type)?;
    if parser.current_token_kind() == TokenKind::DoubleColon {
        parser.advance();
    }
    let name = parser.expect_name()?;
    expect_end_of_statement(parser)?;

    let mut components = vec![];
    loop {
        parser.skip_newlines();
        if parser.current_token_kind() == TokenKind::End || !parser.has_tokens() {
            break;
        }
        components.push(parse_declaration(parser)?);
    }

    parser.expect(TokenKind::End)?;
    parser.expect(TokenKind::Type)?;
    if parser.current_token().is_name() {
        parser.advance();
    }
    let span = parser.span_from(&start);
    expect_end_of_statement(parser)?;

    Ok(Stmt::DerivedType(DerivedTypeStmt { name, components, span }))
}

fn parse_prefix(parser: &mut Parser) -> ProcedurePrefix {
    let mut prefix = ProcedurePrefix::default();
    loop {
        match parser.current_token_kind() {
            TokenKind::Elemental => prefix.elemental = true,
            TokenKind::Pure => prefix.pure = true,
            _ => return prefix,
        }
        parser.advance();
    }
}

pub fn parse_procedure_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    Ok(Stmt::Procedure(parse_procedure(parser)?))
}

fn parse_procedure(parser: &mut Parser) -> Result<ProcedureStmt, Error> {
    let start = parser.get_position();
    let mut prefix = parse_prefix(parser);
    let result_type = if is_type_spec_start(parser) {
        Some(parse_type_spec(parser)?)
    } else {
        None
    };
    let more = parse_prefix(parser);
    prefix.elemental |= more.elemental;
    prefix.pure |= more.pure;

    parse_procedure_rest(parser, prefix, result_type, start)
}

fn parse_procedure_rest(
    parser: &mut Parser,
    prefix: ProcedurePrefix,
    result_type: Option<TypeSpec>,
    start: Position,
) -> Result<ProcedureStmt, Error> {
    let is_function = match parser.current_token_kind() {
        TokenKind::Function => true,
        TokenKind::Subroutine => false,
        _ => return Err(parser.unexpected("expected `function` or `subroutine`")),
    };
    parser.advance();
    let name = parser.expect_name()?;

    let mut dummies = vec![];
    if parser.current_token_kind() == TokenKind::OpenParen {
        parser.advance();
        while parser.current_token_kind() != TokenKind::CloseParen {
            dummies.push(parser.expect_name()?);
            if parser.current_token_kind() != TokenKind::CloseParen {
                parser.expect(TokenKind::Comma)?;
            }
        }
        parser.expect(TokenKind::CloseParen)?;
    }

    let result = if parser.current_token().is_word("result") {
        parser.advance();
        parser.expect(TokenKind::OpenParen)?;
        let result = parser.expect_name()?;
        parser.expect(TokenKind::CloseParen)?;
        Some(result)
    } else {
        None
    };
    expect_end_of_statement(parser)?;

    let mut declarations = vec![];
    let mut body = vec![];
    loop {
        parser.skip_newlines();
        match parser.current_token_kind() {
            TokenKind::End | TokenKind::EOF => break,
            TokenKind::Implicit => {
                parser.advance();
                parser.expect_word("none")?;
                expect_end_of_statement(parser)?;
            }
            _ if is_type_spec_start(parser)
                && !starts_assignment(parser)
                && !opens_function(parser) =>
            {
                declarations.push(parse_declaration(parser)?)
            }
            _ => body.push(parse_stmt(parser)?),
        }
    }

    parser.expect(TokenKind::End)?;
    if matches!(parser.current_token_kind(), TokenKind::Function | TokenKind::Subroutine) {
        parser.advance();
        if parser.current_token().is_name() {
            parser.advance();
        }
    }
    let span = parser.span_from(&start);
    expect_end_of_statement(parser)?;

    Ok(ProcedureStmt {
        name,
        is_function,
        prefix,
        result_type,
        dummies,
        result,
        declarations,
        body,
        span,
    })
}

/// `real function f(x)` inside a procedure body is a nested procedure.
fn opens_function(parser: &Parser) -> bool {
    (1..8).any(|n| parser.peek(n).kind == TokenKind::Function)
        && !(1..8).any(|n| parser.peek(n).kind == TokenKind::DoubleColon)
}

pub fn parse_interface_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.get_position();
    parser.expect(TokenKind::Interface)?;

    let generic = if parser.current_token().is_word("operator") && parser.peek(1).kind == TokenKind::OpenParen {
        parser.advance();
        parser.advance();
        let token = parser.current_token().clone();
        let spelling = operator_spelling(token.kind, &token.value)
            .ok_or_else(|| parser.unexpected("expected an operator"))?;
        parser.advance();
        parser.expect(TokenKind::CloseParen)?;
        Some(GenericName::Operator(spelling))
    } else if parser.current_token().is_word("assignment") && parser.peek(1).kind == TokenKind::OpenParen {
        parser.advance();
        parser.advance();
        parser.expect(TokenKind::Assignment)?;
        parser.expect(TokenKind::CloseParen)?;
        Some(GenericName::Assignment)
    } else if parser.current_token().is_name() {
        Some(GenericName::Name(parser.expect_name()?))
    } else {
        None
    };
    expect_end_of_statement(parser)?;

    let mut bodies = vec![];
    loop {
        parser.skip_newlines();
        if matches!(parser.current_token_kind(), TokenKind::End | TokenKind::EOF) {
            break;
        }
        bodies.push(parse_procedure(parser)?);
    }

    parser.expect(TokenKind::End)?;
    parser.expect(TokenKind::Interface)?;
    while !matches!(parser.current_token_kind(), TokenKind::Newline | TokenKind::EOF) {
        parser.advance();
    }
    let span = parser.span_from(&start);
    expect_end_of_statement(parser)?;

    Ok(Stmt::Interface(InterfaceStmt { generic, bodies, span }))
}

/// `call name[(args)]`
pub fn parse_call_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.get_position();
    parser.expect(TokenKind::Call)?;
    let name_token = parser.current_token().clone();
    let name = parser.expect_name()?;
    let callee = Ast::leaf(AstKind::Symbol, &name, name_token.span);

    let mut call = if parser.current_token_kind() == TokenKind::OpenParen {
        let parsed = parse_call_expr(parser, callee, BindingPower::Call)?;
        match parsed.kind {
            AstKind::Ambiguous => parsed.children[0].clone(),
            _ => parsed,
        }
    } else {
        Ast::call(callee, vec![])
    };
    call.span = parser.span_from(&start);

    expect_end_of_statement(parser)?;
    Ok(Stmt::Call(call))
}
