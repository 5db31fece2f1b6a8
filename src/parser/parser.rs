//! Parser implementation for building the syntax tree.
//!
//! This module contains the main Parser struct and the program-unit entry
//! point. The parser uses a Pratt parser approach with NUD/LED handlers for
//! expression parsing and specialized functions for statement parsing.
//!
//! It maintains lookup tables for:
//! - Statement handlers
//! - NUD (null denotation) handlers for prefix expressions
//! - LED (left denotation) handlers for infix expressions
//! - Binding powers for operator precedence

use std::{collections::HashMap, rc::Rc};

use crate::{
    ast::statements::Program,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    Position, Span,
};

use super::{
    lookups::{
        create_token_lookups, BPLookup, BindingPower, LEDHandler, LEDLookup, NUDHandler, NUDLookup,
        StmtHandler, StmtLookup,
    },
    stmt::{expect_end_of_statement, parse_stmt},
};

/// The main parser structure that maintains parsing state.
pub struct Parser {
    /// The list of tokens to parse
    tokens: Vec<Token>,
    /// Current position in the token stream
    pos: usize,
    /// The name of the source file being parsed
    file: Rc<String>,
    /// Lookup table for statement parsing handlers
    stmt_lookup: StmtLookup,
    /// Lookup table for null denotation (prefix) expression handlers
    nud_lookup: NUDLookup,
    /// Lookup table for left denotation (infix) expression handlers
    led_lookup: LEDLookup,
    /// Lookup table for expression binding powers (precedence)
    binding_power_lookup: BPLookup,
}

impl Parser {
    /// Creates a new Parser instance over a token stream ending in EOF.
    pub fn new(tokens: Vec<Token>, file: Rc<String>) -> Self {
        Parser {
            tokens,
            pos: 0,
            file,
            stmt_lookup: HashMap::new(),
            nud_lookup: HashMap::new(),
            led_lookup: HashMap::new(),
            binding_power_lookup: HashMap::new(),
        }
    }

    /// Returns the current token without advancing.
    pub fn current_token(&self) -> &Token {
        self.peek(0)
    }

    /// Returns the kind of the current token.
    pub fn current_token_kind(&self) -> TokenKind {
        self.peek(0).kind
    }

    /// Returns the token `n` positions ahead, or the final EOF token.
    pub fn peek(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    /// Advances to the next token and returns the previous token.
    pub fn advance(&mut self) -> &Token {
        let index = self.pos.min(self.tokens.len() - 1);
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        &self.tokens[index]
    }

    /// Expects a token of the specified kind, with optional custom error.
    pub fn expect_error(&mut self, expected_kind: TokenKind, error: Option<Error>) -> Result<Token, Error> {
        let token = self.current_token();
        if token.kind != expected_kind {
            match error {
                Some(error) => Err(error),
                None => Err(Error::new(
                    ErrorImpl::UnexpectedTokenDetailed {
                        token: token.value.clone(),
                        message: format!("expected {}", expected_kind),
                    },
                    token.span.start.clone(),
                )),
            }
        } else {
            Ok(self.advance().clone())
        }
    }

    /// Expects a token of the specified kind with default error message.
    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Error> {
        self.expect_error(expected_kind, None)
    }

    /// Expects a name; reserved words are names too.
    pub fn expect_name(&mut self) -> Result<String, Error> {
        if self.current_token().is_name() {
            Ok(self.advance().value.clone())
        } else {
            Err(self.unexpected("expected a name"))
        }
    }

    /// Expects a contextual keyword such as `precision`.
    pub fn expect_word(&mut self, word: &str) -> Result<Token, Error> {
        if self.current_token().is_word(word) {
            Ok(self.advance().clone())
        } else {
            Err(self.unexpected(&format!("expected `{}`", word)))
        }
    }

    pub fn unexpected(&self, message: &str) -> Error {
        Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: self.current_token().value.clone(),
                message: message.to_string(),
            },
            self.current_token().span.start.clone(),
        )
    }

    pub fn skip_newlines(&mut self) {
        while self.current_token_kind() == TokenKind::Newline {
            self.advance();
        }
    }

    /// Checks if there are more tokens to parse.
    pub fn has_tokens(&self) -> bool {
        self.current_token_kind() != TokenKind::EOF
    }

    pub fn get_stmt_lookup(&self) -> &StmtLookup {
        &self.stmt_lookup
    }

    pub fn get_nud_lookup(&self) -> &NUDLookup {
        &self.nud_lookup
    }

    pub fn get_led_lookup(&self) -> &LEDLookup {
        &self.led_lookup
    }

    pub fn get_bp_lookup(&self) -> &BPLookup {
        &self.binding_power_lookup
    }

    /// Registers a left denotation (infix) handler for a token.
    pub fn led(&mut self, kind: TokenKind, binding_power: BindingPower, led_fn: LEDHandler) {
        self.binding_power_lookup.insert(kind, binding_power);
        self.led_lookup.insert(kind, led_fn);
    }

    /// Registers a null denotation (prefix) handler for a token.
    pub fn nud(&mut self, kind: TokenKind, nud_fn: NUDHandler) {
        self.nud_lookup.insert(kind, nud_fn);
    }

    /// Registers a statement handler for a token.
    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: StmtHandler) {
        self.stmt_lookup.insert(kind, stmt_fn);
    }

    /// Returns the current position in the source file.
    pub fn get_position(&self) -> Position {
        Position(self.current_token().span.start.0, Rc::clone(&self.file))
    }

    /// Span from `start` to the end of the previous token.
    pub fn span_from(&self, start: &Position) -> Span {
        let previous = &self.tokens[self.pos.saturating_sub(1)];
        Span {
            start: start.clone(),
            end: previous.span.end.clone(),
        }
    }
}

/// Parses a stream of tokens into a program unit.
///
/// A leading `program name` and the matching `end` are optional, so a
/// plain list of statements is a valid program too.
pub fn parse(tokens: Vec<Token>, file: Rc<String>) -> Result<Program, Error> {
    let mut parser = Parser::new(tokens, Rc::clone(&file));
    create_token_lookups(&mut parser);

    let start = Position(0, Rc::clone(&file));
    let mut name = None;
    let mut implicit_none = false;
    let mut body = vec![];

    parser.skip_newlines();
    if parser.current_token_kind() == TokenKind::Program {
        parser.advance();
        name = Some(parser.expect_name()?);
        expect_end_of_statement(&mut parser)?;
    }

    loop {
        parser.skip_newlines();
        if !parser.has_tokens() {
            break;
        }

        match parser.current_token_kind() {
            TokenKind::Implicit => {
                parser.advance();
                parser.expect_word("none")?;
                implicit_none = true;
                expect_end_of_statement(&mut parser)?;
            }
            TokenKind::End => {
                parser.advance();
                while !matches!(parser.current_token_kind(), TokenKind::Newline | TokenKind::EOF) {
                    parser.advance();
                }
            }
            _ if parser.current_token().is_word("contains") => {
                parser.advance();
                expect_end_of_statement(&mut parser)?;
            }
            _ => body.push(parse_stmt(&mut parser)?),
        }
    }

    Ok(Program {
        name,
        implicit_none,
        body,
        span: parser.span_from(&start),
    })
}
