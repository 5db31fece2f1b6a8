//! Parser module for building the syntax tree of a Fortran program unit.
//!
//! This module contains the parser that transforms a stream of tokens
//! into `Ast` expressions and `Stmt` statements. It uses a Pratt parser for
//! expressions with Fortran operator precedence and handles:
//!
//! - Declarations, derived type definitions and procedures
//! - Interface blocks for generic names, operators and assignment
//! - Call and assignment statements
//! - Array constructors, implied-do loops and complex literals
//!
//! `name(args)` is ambiguous between a function call and an array element
//! until names are resolved, so the parser keeps both readings.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod types;

#[cfg(test)]
mod tests;
