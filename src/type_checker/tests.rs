//! Dispatcher-level tests shared by both dialects: disambiguation of
//! `Ambiguous` nodes, speculative checking and the error nodecl.

use pretty_assertions::assert_eq;

use crate::{
    ast::ast::{Ast, AstKind},
    config::{CheckerConfig, Language},
    symbols::{
        scope::{DeclContext, ScopeId},
        symbols::SymbolKind,
    },
    type_checker::type_checker::TypeChecker,
    types::types::TypeId,
    Span,
};

fn cxx() -> TypeChecker {
    TypeChecker::new(CheckerConfig::for_language(Language::Cxx))
}

fn leaf(kind: AstKind, text: &str) -> Ast {
    Ast::leaf(kind, text, Span::null())
}

fn ambiguous(alternatives: Vec<Ast>) -> Ast {
    Ast::node(AstKind::Ambiguous, alternatives, Span::null())
}

#[test]
fn test_ambiguity_keeps_the_interpretation_that_checks() {
    let mut tc = cxx();
    let ast = ambiguous(vec![leaf(AstKind::Symbol, "missing"), leaf(AstKind::IntegerLiteral, "1")]);

    let checked = tc.check_expression(&ast, &DeclContext::global());
    assert_eq!(tc.describe(checked.ty()), "int");
    assert!(!tc.diagnostics.has_errors());
}

#[test]
fn test_ambiguity_without_valid_interpretation_reports_once() {
    let mut tc = cxx();
    let ast = ambiguous(vec![leaf(AstKind::Symbol, "missing"), leaf(AstKind::Symbol, "absent")]);

    let checked = tc.check_expression(&ast, &DeclContext::global());
    assert!(checked.is_error());
    assert_eq!(tc.diagnostics.error_names(), vec!["SymbolNotDeclared"]);
}

#[test]
#[should_panic(expected = "interpretations of an ambiguous expression are valid")]
fn test_two_valid_interpretations_are_an_internal_error() {
    let mut tc = cxx();
    let ast = ambiguous(vec![leaf(AstKind::IntegerLiteral, "1"), leaf(AstKind::IntegerLiteral, "2")]);
    tc.check_expression(&ast, &DeclContext::global());
}

#[test]
fn test_probing_suppresses_diagnostics() {
    let mut tc = cxx();
    let ast = leaf(AstKind::Symbol, "missing");

    let probed = tc.probe(|tc| tc.check_expression(&ast, &DeclContext::global()));
    assert!(probed.is_error());
    assert!(!tc.diagnostics.has_errors());
    assert!(!tc.is_probing());

    let checked = tc.check_expression(&ast, &DeclContext::global());
    assert!(checked.is_error());
    assert_eq!(tc.diagnostics.error_names(), vec!["SymbolNotDeclared"]);
}

#[test]
fn test_failed_operand_is_reported_once() {
    let mut tc = cxx();
    let ast = Ast::binary(
        AstKind::Add,
        Ast::binary(AstKind::Add, leaf(AstKind::Symbol, "missing"), leaf(AstKind::IntegerLiteral, "1")),
        leaf(AstKind::IntegerLiteral, "2"),
    );

    let checked = tc.check_expression(&ast, &DeclContext::global());
    assert!(checked.is_error());
    assert_eq!(tc.diagnostics.error_names(), vec!["SymbolNotDeclared"]);
}

#[test]
fn test_non_expression_names() {
    let mut tc = cxx();
    tc.symbols.new_symbol(ScopeId::GLOBAL, "N", SymbolKind::Namespace);

    tc.check_expression(&leaf(AstKind::Symbol, "N"), &DeclContext::global());
    let int_type = tc.types.signed_int();
    tc.check_expression(
        &leaf(AstKind::TypeName, "int").with_type(int_type),
        &DeclContext::global(),
    );
    assert_eq!(tc.diagnostics.error_names(), vec!["NotAnExpression", "NotAnExpression"]);
}

mod properties {
    use proptest::prelude::*;

    use super::*;

    fn arithmetic() -> impl Strategy<Value = Ast> {
        let literal = prop_oneof![
            (0u32..1000).prop_map(|v| leaf(AstKind::IntegerLiteral, &v.to_string())),
            (0u32..100).prop_map(|v| leaf(AstKind::FloatingLiteral, &format!("{}.5", v))),
            Just(leaf(AstKind::Symbol, "missing")),
        ];
        literal.prop_recursive(4, 32, 2, |inner| {
            let operator = prop_oneof![
                Just(AstKind::Add),
                Just(AstKind::Minus),
                Just(AstKind::Mul),
                Just(AstKind::Div),
                Just(AstKind::Mod),
                Just(AstKind::LowerThan),
                Just(AstKind::BitwiseAnd),
            ];
            (operator, inner.clone(), inner).prop_map(|(kind, left, right)| Ast::binary(kind, left, right))
        })
    }

    proptest! {
        #[test]
        fn checking_is_deterministic(ast in arithmetic(), c_language in any::<bool>()) {
            let language = if c_language { Language::C } else { Language::Cxx };
            let mut tc = TypeChecker::new(CheckerConfig::for_language(language));
            let context = DeclContext::global();

            let first = tc.check_expression(&ast, &context);
            let first_errors = tc.diagnostics.error_names();
            tc.diagnostics.clear();
            let second = tc.check_expression(&ast, &context);

            prop_assert_eq!(first.is_error(), second.is_error());
            prop_assert_eq!(first.ty(), second.ty());
            prop_assert_eq!(first.constant(), second.constant());
            prop_assert_eq!(first_errors, tc.diagnostics.error_names());
        }

        #[test]
        fn results_are_typed_or_errors(ast in arithmetic()) {
            let mut tc = cxx();
            let checked = tc.check_expression(&ast, &DeclContext::global());
            prop_assert!(checked.is_error() || checked.ty() != TypeId::ERROR);
            prop_assert_eq!(checked.is_error(), tc.diagnostics.has_errors());
        }
    }
}
