//! Fortran dialect of the expression checker.
//!
//! Submodules:
//! - expr: handler table, literals and names
//! - operators: intrinsic operator rule tables and defined operators
//! - calls: procedure references, generic resolution, argument association
//! - intrinsics: intrinsic procedure table and simplifiers
//! - arrays: subscripts, substrings, sections and array constructors
//! - structures: component references and structure constructors
//! - assignment: intrinsic and defined assignment
//! - declarations: symbols for declarations, derived types and interfaces

pub mod arrays;
pub mod assignment;
pub mod calls;
pub mod declarations;
pub mod expr;
pub mod intrinsics;
pub mod operators;
pub mod structures;

#[cfg(test)]
mod tests;
