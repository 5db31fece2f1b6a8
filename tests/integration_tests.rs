//! Integration tests for the checking pipeline.
//!
//! These tests run source text through tokenization, parsing, declaration
//! processing and expression checking, using only the public API.

use std::rc::Rc;

use pretty_assertions::assert_eq;
use sema::{
    config::CheckerConfig,
    lexer::lexer::tokenize,
    nodecl::nodecl::{Nodecl, NodeclKind},
    parser::parser::parse,
    type_checker::{fortran::declarations::check_program, type_checker::TypeChecker},
};

fn run(source: &str, config: CheckerConfig) -> (TypeChecker, Vec<Nodecl>) {
    let tokens = tokenize(source.to_string(), Some("test.f90".to_string())).unwrap();
    let program = parse(tokens, Rc::new("test.f90".to_string())).unwrap();
    let mut type_checker = TypeChecker::new(config);
    let checked = check_program(&mut type_checker, &program);
    (type_checker, checked)
}

#[test]
fn test_parameter_sum_folds_to_real() {
    let (type_checker, checked) = run(
        "real, parameter :: a = 3\n\
         integer, parameter :: b = 4\n\
         a + b\n",
        CheckerConfig::default(),
    );

    assert!(!type_checker.diagnostics.has_errors());
    let sum = checked.last().unwrap();
    assert_eq!(type_checker.describe(sum.ty()), "REAL(4)");
    assert_eq!(sum.constant().and_then(|v| v.as_f64()), Some(7.0));
    assert_eq!(sum.constant().unwrap().to_string(), "7.0");
}

#[test]
fn test_structurally_equal_specifics_are_ambiguous() {
    let (type_checker, checked) = run(
        "interface norm\n\
           function norm_a(x)\n\
             real :: x\n\
             real :: norm_a\n\
           end function\n\
           function norm_b(y)\n\
             real :: y\n\
             real :: norm_b\n\
           end function\n\
         end interface\n\
         real :: v\n\
         norm(v)\n",
        CheckerConfig::default(),
    );

    assert_eq!(type_checker.diagnostics.error_names(), vec!["AmbiguousGenericCall"]);
    assert!(checked.last().unwrap().is_error());
}

#[test]
fn test_configuration_changes_typing() {
    let source = "x = 1\nkind(1.0)\n";

    let (type_checker, _) = run(source, CheckerConfig::default());
    assert_eq!(type_checker.diagnostics.error_names(), vec!["SymbolNotDeclared"]);

    let config = CheckerConfig::from_toml_str("implicit_none = false\ndefault_real_kind = 8\n").unwrap();
    let (type_checker, checked) = run(source, config);
    assert!(!type_checker.diagnostics.has_errors());
    assert_eq!(type_checker.describe(checked[0].ty()), "REAL(8)");
    assert_eq!(checked[1].constant().and_then(|v| v.as_i64()), Some(8));
}

#[test]
fn test_errors_do_not_stop_later_statements() {
    let (type_checker, checked) = run(
        "integer :: k\n\
         k + .true.\n\
         k = missing\n\
         k * 2\n",
        CheckerConfig::default(),
    );

    assert_eq!(
        type_checker.diagnostics.error_names(),
        vec!["OperatorTypeMismatch", "SymbolNotDeclared"]
    );
    assert_eq!(checked.len(), 3);
    assert!(checked[0].is_error());
    assert!(checked[1].is_error());
    assert_eq!(type_checker.describe(checked[2].ty()), "INTEGER(4)");
    assert_eq!(checked[2].kind(), NodeclKind::Mul);
}

#[test]
fn test_checking_twice_gives_the_same_result() {
    let source = "integer, parameter :: v(4) = (/ (i * 3, i = 1, 4) /)\nsum(v) + v(2)\n";
    let (first_checker, first) = run(source, CheckerConfig::default());
    let (second_checker, second) = run(source, CheckerConfig::default());

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(first_checker.describe(a.ty()), second_checker.describe(b.ty()));
        assert_eq!(a.constant(), b.constant());
    }
    assert_eq!(first.last().unwrap().constant().and_then(|v| v.as_i64()), Some(36));
}

#[test]
fn test_front_end_errors() {
    let lexed = tokenize("x = $\n".to_string(), None);
    assert_eq!(lexed.err().unwrap().get_error_name(), "UnrecognisedToken");

    let tokens = tokenize("integer :: \n".to_string(), None).unwrap();
    assert!(parse(tokens, Rc::new("test.f90".to_string())).is_err());
}
