//! Lexical analysis module.
//!
//! This module contains the lexer (tokenizer) that converts free-form
//! Fortran source into a stream of tokens for parsing. It handles:
//!
//! - Tokenization of source code using regex patterns
//! - Case folding of names and statement keywords
//! - Dotted operators (`.and.`, `.eq.`, user-defined `.op.`)
//! - Comments, continuation lines and statement separators

pub mod lexer;
pub mod tokens;
