//! Template argument deduction.
//!
//! - `deduction`: parameter keys, arguments, deduction sets and their merge
//! - `unify`: structural matching of a formal type against an actual type
//! - `substitute`: replacing template parameters by their bindings
//! - `call`: deduction for a call, explicit arguments and final verification
//! - `auto`: `auto` deduction through a one-parameter fake template

pub mod auto;
pub mod call;
pub mod deduction;
pub mod substitute;
pub mod unify;

#[cfg(test)]
mod tests;
