//! Expression type checking and semantic analysis.
//!
//! The checker turns raw `Ast` expressions into annotated nodecls. Each
//! dialect registers one handler per expression kind:
//!
//! - type_checker: checker state, diagnostics and the shared dispatcher
//! - fortran: Fortran operators, calls, intrinsics, arrays, derived types,
//!   assignment and declaration processing
//! - cxx: C and C++ operators, conversions and overload resolution
//!
//! Handlers return `Result` internally; the dispatcher turns an error into a
//! reported diagnostic and an error nodecl, so checking never aborts.

pub mod cxx;
pub mod fortran;
pub mod type_checker;

#[cfg(test)]
mod tests;
