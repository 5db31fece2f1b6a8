//! Argument-dependent (Koenig) lookup.
//!
//! Unqualified call names are also searched in the namespaces associated
//! with the argument types; see [`koenig::koenig_lookup`].

pub mod koenig;
