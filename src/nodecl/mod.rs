//! Annotated expression nodes.
//!
//! A [`nodecl::Nodecl`] is a checked expression: a node kind, its children
//! and an [`nodecl::Annotation`] carrying the semantic results (type,
//! symbol, constant value, lvalue-ness, dependence). The annotation is
//! built together with the node, never attached afterwards.

pub mod list;
pub mod nodecl;
