//! Compile-time constant values.
//!
//! This module contains the immutable constant representation used by the
//! type checker to fold expressions. It handles:
//!
//! - Integers of any byte width up to 16, signed or unsigned
//! - Floating values of several precisions and complex pairs
//! - Character strings, arrays, structures and subscript ranges
//! - Arithmetic, comparison and casting between all of the above
//!
//! Every operation builds a new value; nothing is mutated in place.

pub mod const_value;

#[cfg(test)]
mod tests;
