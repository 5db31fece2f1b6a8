//! Type representation and predicates.
//!
//! Types are interned into a [`types::TypeTable`] and handed around as
//! copyable [`types::TypeId`] handles. The shape of a type is a closed
//! [`types::TypeKind`] sum type, so every consumer matches exhaustively.
//!
//! - `types` holds the table, constructors, qualifiers and predicates
//! - `fortran` adds rank, kind and character helpers used by the Fortran dialect
//! - `print` renders types for diagnostics in C and Fortran spelling

pub mod fortran;
pub mod print;
pub mod types;

#[cfg(test)]
mod tests;
