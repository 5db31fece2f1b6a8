use std::rc::Rc;

use regex::Regex;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position, Span, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, DOT_OPERATOR_LOOKUP, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, Regex);

#[derive(Clone)]
pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

#[derive(Clone)]
pub struct Lexer {
    patterns: Vec<RegexPattern>,
    tokens: Vec<Token>,
    source: String,
    pos: i32,
    file: Rc<String>,
}

fn pattern(regex: &str, handler: RegexHandler) -> RegexPattern {
    RegexPattern {
        regex: Regex::new(&format!("^(?:{})", regex)).expect("invalid lexer pattern"),
        handler,
    }
}

impl Lexer {
    pub fn new(source: String, file: Option<String>) -> Lexer {
        let file_name = if let Some(file) = file {
            Rc::new(file)
        } else {
            Rc::new(String::from("shell"))
        };

        Lexer {
            pos: 0,
            tokens: vec![],
            patterns: vec![
                pattern("&[ \\t]*(![^\\n]*)?\\r?\\n[ \\t]*&?", skip_handler),
                pattern("![^\\n]*", skip_handler),
                pattern("[ \\t\\r]+", skip_handler),
                pattern("\\n", newline_handler),
                pattern(";", newline_handler),
                pattern("[a-zA-Z][a-zA-Z0-9_]*", symbol_handler),
                pattern(
                    "([0-9]+(\\.[0-9]*)?|\\.[0-9]+)([eEdD][+-]?[0-9]+)?(_[a-zA-Z0-9_]+)?",
                    number_handler,
                ),
                pattern("\\.[a-zA-Z]+\\.", dot_operator_handler),
                pattern("'[^']*'", string_handler),
                pattern("\"[^\"]*\"", string_handler),
                pattern("\\(/", MK_DEFAULT_HANDLER!(TokenKind::OpenArray, "(/")),
                pattern("/\\)", MK_DEFAULT_HANDLER!(TokenKind::CloseArray, "/)")),
                pattern("\\(", MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "(")),
                pattern("\\)", MK_DEFAULT_HANDLER!(TokenKind::CloseParen, ")")),
                pattern("\\[", MK_DEFAULT_HANDLER!(TokenKind::OpenBracket, "[")),
                pattern("\\]", MK_DEFAULT_HANDLER!(TokenKind::CloseBracket, "]")),
                pattern("==", MK_DEFAULT_HANDLER!(TokenKind::Equals, "==")),
                pattern("/=", MK_DEFAULT_HANDLER!(TokenKind::NotEquals, "/=")),
                pattern("<=", MK_DEFAULT_HANDLER!(TokenKind::LessEquals, "<=")),
                pattern("<", MK_DEFAULT_HANDLER!(TokenKind::Less, "<")),
                pattern(">=", MK_DEFAULT_HANDLER!(TokenKind::GreaterEquals, ">=")),
                pattern(">", MK_DEFAULT_HANDLER!(TokenKind::Greater, ">")),
                pattern("=", MK_DEFAULT_HANDLER!(TokenKind::Assignment, "=")),
                pattern("::", MK_DEFAULT_HANDLER!(TokenKind::DoubleColon, "::")),
                pattern(":", MK_DEFAULT_HANDLER!(TokenKind::Colon, ":")),
                pattern(",", MK_DEFAULT_HANDLER!(TokenKind::Comma, ",")),
                pattern("%", MK_DEFAULT_HANDLER!(TokenKind::Percent, "%")),
                pattern("\\*\\*", MK_DEFAULT_HANDLER!(TokenKind::Power, "**")),
                pattern("//", MK_DEFAULT_HANDLER!(TokenKind::Concat, "//")),
                pattern("\\+", MK_DEFAULT_HANDLER!(TokenKind::Plus, "+")),
                pattern("-", MK_DEFAULT_HANDLER!(TokenKind::Dash, "-")),
                pattern("\\*", MK_DEFAULT_HANDLER!(TokenKind::Star, "*")),
                pattern("/", MK_DEFAULT_HANDLER!(TokenKind::Slash, "/")),
            ],
            source,
            file: file_name,
        }
    }

    pub fn advance_n(&mut self, n: i32) {
        self.pos += n;
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn at(&self) -> char {
        self.source[self.pos as usize..].chars().next().unwrap_or('\0')
    }

    pub fn remainder(&self) -> &str {
        &self.source[(self.pos as usize)..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos as usize >= self.source.len()
    }

    fn span(&self, len: usize) -> Span {
        Span {
            start: Position(self.pos as u32, Rc::clone(&self.file)),
            end: Position((self.pos + len as i32) as u32, Rc::clone(&self.file)),
        }
    }

    fn matched(&self, regex: &Regex) -> String {
        regex
            .find(self.remainder())
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }
}

fn number_handler(lexer: &mut Lexer, regex: Regex) {
    let mut matched = lexer.matched(&regex);

    // `1.eq.2`: the dot belongs to the operator
    if matched.ends_with('.') {
        let next = lexer.remainder()[matched.len()..].chars().next();
        if next.is_some_and(|c| c.is_ascii_alphabetic()) {
            matched.pop();
        }
    }

    let is_real = matched.contains(['.', 'e', 'E', 'd', 'D']);
    let kind = if is_real && !only_kind_suffix_has_letters(&matched) {
        TokenKind::RealNumber
    } else {
        TokenKind::Number
    };

    lexer.push(MK_TOKEN!(kind, matched.to_lowercase(), lexer.span(matched.len())));
    lexer.advance_n(matched.len() as i32);
}

/// `42_k8` is an integer even though its kind suffix has an `e`.
fn only_kind_suffix_has_letters(matched: &str) -> bool {
    match matched.split_once('_') {
        Some((digits, _)) => !digits.contains(['.', 'e', 'E', 'd', 'D']),
        None => false,
    }
}

fn skip_handler(lexer: &mut Lexer, regex: Regex) {
    let matched = lexer.matched(&regex);
    lexer.advance_n(matched.len() as i32);
}

fn newline_handler(lexer: &mut Lexer, regex: Regex) {
    let matched = lexer.matched(&regex);
    let after_newline = lexer
        .tokens
        .last()
        .map(|t| t.kind == TokenKind::Newline)
        .unwrap_or(true);
    if !after_newline {
        lexer.push(MK_TOKEN!(TokenKind::Newline, String::from("\\n"), lexer.span(matched.len())));
    }
    lexer.advance_n(matched.len() as i32);
}

fn string_handler(lexer: &mut Lexer, regex: Regex) {
    let matched = lexer.matched(&regex);
    let string_literal = matched[1..matched.len() - 1].to_string();

    lexer.push(MK_TOKEN!(TokenKind::String, string_literal, lexer.span(matched.len())));
    lexer.advance_n(matched.len() as i32);
}

fn dot_operator_handler(lexer: &mut Lexer, regex: Regex) {
    let matched = lexer.matched(&regex).to_lowercase();
    let kind = DOT_OPERATOR_LOOKUP
        .get(matched.as_str())
        .copied()
        .unwrap_or(TokenKind::DefinedOperator);

    lexer.push(MK_TOKEN!(kind, matched.clone(), lexer.span(matched.len())));
    lexer.advance_n(matched.len() as i32);
}

fn symbol_handler(lexer: &mut Lexer, regex: Regex) {
    let value = lexer.matched(&regex).to_lowercase();

    if let Some(kind) = RESERVED_LOOKUP.get(value.as_str()) {
        lexer.push(MK_TOKEN!(*kind, value.clone(), lexer.span(value.len())));
    } else {
        lexer.push(MK_TOKEN!(TokenKind::Identifier, value.clone(), lexer.span(value.len())));
    }

    lexer.advance_n(value.len() as i32);
}

pub fn tokenize(source: String, file: Option<String>) -> Result<Vec<Token>, Error> {
    let mut lex = Lexer::new(source, file);
    let patterns = lex.patterns.clone();

    while !lex.at_eof() {
        let mut matched = false;

        for pattern in patterns.iter() {
            if pattern.regex.is_match(lex.remainder()) {
                (pattern.handler)(&mut lex, pattern.regex.clone());
                matched = true;
                break;
            }
        }

        if !matched {
            return Err(Error::new(
                ErrorImpl::UnrecognisedToken {
                    token: lex.at().to_string(),
                },
                Position(lex.pos as u32, Rc::clone(&lex.file)),
            ));
        }
    }

    if lex.tokens.last().is_some_and(|t| t.kind != TokenKind::Newline) {
        lex.push(MK_TOKEN!(TokenKind::Newline, String::from("\\n"), lex.span(0)));
    }
    lex.push(MK_TOKEN!(TokenKind::EOF, String::from("EOF"), lex.span(0)));
    Ok(lex.tokens)
}
