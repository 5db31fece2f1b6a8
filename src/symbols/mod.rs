//! Symbols and scopes.
//!
//! Symbols and scopes live in one arena, [`symbols::SymbolTable`], and are
//! referred to by index. A placeholder symbol that later turns out to be
//! something else is redirected instead of overwritten, see
//! [`symbols::SymbolTable::redirect`].

pub mod copy;
pub mod scope;
pub mod symbols;

#[cfg(test)]
mod tests;
