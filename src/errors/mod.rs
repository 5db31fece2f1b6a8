//! Error values and the diagnostics sink.
//!
//! [`errors::Error`] pairs an [`errors::ErrorImpl`] with the position it was
//! raised at. The checker collects reported errors in a
//! [`diagnostics::Diagnostics`] sink, which stays silent while ambiguous
//! parses are being probed.

pub mod diagnostics;
pub mod errors;

#[cfg(test)]
mod tests;
