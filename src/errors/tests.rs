//! Unit tests for error handling.
//!
//! This module contains tests for error types and the diagnostics sink.

use crate::errors::diagnostics::Diagnostics;
use crate::errors::errors::{Error, ErrorImpl, ErrorTip};
use crate::Position;
use std::rc::Rc;

fn at(offset: u32) -> Position {
    Position(offset, Rc::new("test.f90".to_string()))
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        at(10),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().0, 10);
}

#[test]
fn test_ambiguous_generic_tip() {
    let error = Error::new(
        ErrorImpl::AmbiguousGenericCall {
            generic: "g".to_string(),
            candidates: "g1, g2".to_string(),
        },
        at(0),
    );

    match error.get_tip() {
        ErrorTip::Suggestion(text) => assert!(text.contains("g1, g2")),
        ErrorTip::None => panic!("expected a suggestion"),
    }
}

#[test]
fn test_unrecognised_token_has_no_tip() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "$".to_string(),
        },
        at(0),
    );

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_not_supported_display() {
    let error = Error::new(
        ErrorImpl::NotSupported {
            feature: "coarrays".to_string(),
        },
        at(0),
    );

    assert_eq!(error.to_string(), "sorry, coarrays is not supported");
}

#[test]
fn test_diagnostics_collects_errors() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.report(Error::new(
        ErrorImpl::SymbolNotDeclared {
            name: "x".to_string(),
        },
        at(3),
    ));

    assert!(diagnostics.has_errors());
    assert_eq!(diagnostics.error_names(), vec!["SymbolNotDeclared".to_string()]);
}

#[test]
fn test_muted_diagnostics_drop_errors() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.mute();
    diagnostics.report(Error::new(
        ErrorImpl::SymbolNotDeclared {
            name: "x".to_string(),
        },
        at(3),
    ));
    diagnostics.unmute();

    assert!(!diagnostics.has_errors());
    assert!(!diagnostics.is_muted());
}

#[test]
fn test_already_reported_is_never_recorded() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.report(Error::new(ErrorImpl::AlreadyReported, at(0)));

    assert!(diagnostics.entries().is_empty());
}
