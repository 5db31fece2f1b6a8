//! C and C++ dialect of the expression checker.
//!
//! Submodules:
//! - expr: handler table, literals, names, casts, `sizeof`, braced lists
//! - conversions: promotions, usual arithmetic conversions, implicit
//!   conversion ranks
//! - operators: built-in operator rules and `operator<op>` fallback
//! - overload: calls, candidate sets, template specialization, best viable
//!   function
//! - access: subscripts, member access and assignment
//!
//! Both languages share the handlers; the differences (truth type, enum
//! conversions, `void*` conversions, overloading) are decided on
//! `CheckerConfig::language`.

pub mod access;
pub mod conversions;
pub mod expr;
pub mod operators;
pub mod overload;

#[cfg(test)]
mod tests;
