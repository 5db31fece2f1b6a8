//! Unit tests for the parser module.
//!
//! This module contains tests for parsing various language constructs including:
//! - Operator precedence and associativity
//! - Call/subscript ambiguity
//! - Array constructors, implied-do and complex literals
//! - Declarations, derived types, procedures and interfaces

use std::rc::Rc;

use crate::{
    ast::{
        ast::{Ast, AstKind},
        statements::{Attribute, GenericName, Program, Stmt},
        types::{DimSpec, IntrinsicTypeName, LenSelector, TypeSpec},
    },
    lexer::lexer::tokenize,
    symbols::symbols::Intent,
};

use super::parser::parse;

fn parse_source(source: &str) -> Program {
    let tokens = tokenize(source.to_string(), Some("test.f90".to_string())).unwrap();
    parse(tokens, Rc::new("test.f90".to_string())).unwrap()
}

fn parse_expression(source: &str) -> Ast {
    match parse_source(source).body.remove(0) {
        Stmt::Expression(ast) => ast,
        other => panic!("expected an expression statement, got {:?}", other),
    }
}

fn kinds(ast: &Ast) -> Vec<AstKind> {
    ast.children.iter().map(|c| c.kind).collect()
}

#[test]
fn test_parse_precedence() {
    let ast = parse_expression("a + b * c");

    assert_eq!(ast.kind, AstKind::Add);
    assert_eq!(kinds(&ast), vec![AstKind::Symbol, AstKind::Mul]);
}

#[test]
fn test_parse_power_is_right_associative() {
    let ast = parse_expression("a ** b ** c");

    assert_eq!(ast.kind, AstKind::Power);
    assert_eq!(ast.children[0].text, "a");
    assert_eq!(ast.children[1].kind, AstKind::Power);
}

#[test]
fn test_parse_unary_minus_binds_looser_than_power() {
    let ast = parse_expression("-a ** 2");

    assert_eq!(ast.kind, AstKind::Neg);
    assert_eq!(ast.children[0].kind, AstKind::Power);
}

#[test]
fn test_parse_logical_operators() {
    let ast = parse_expression("a .eq. b .and. .not. c .or. d");

    assert_eq!(ast.kind, AstKind::LogicalOr);
    let and = &ast.children[0];
    assert_eq!(and.kind, AstKind::LogicalAnd);
    assert_eq!(kinds(and), vec![AstKind::Equal, AstKind::LogicalNot]);
}

#[test]
fn test_parse_concat_below_additive() {
    let ast = parse_expression("s // t");
    assert_eq!(ast.kind, AstKind::Concat);
}

#[test]
fn test_parse_defined_operators() {
    let ast = parse_expression("a .cross. b");
    assert_eq!(ast.kind, AstKind::DefinedBinary);
    assert_eq!(ast.text, ".cross.");

    let ast = parse_expression(".inv. a + b");
    assert_eq!(ast.kind, AstKind::Add);
    assert_eq!(ast.children[0].kind, AstKind::DefinedUnary);
}

#[test]
fn test_parse_name_with_arguments_is_ambiguous() {
    let ast = parse_expression("f(1, x)");

    assert_eq!(ast.kind, AstKind::Ambiguous);
    assert_eq!(kinds(&ast), vec![AstKind::FunctionCall, AstKind::ArraySubscript]);
}

#[test]
fn test_parse_keyword_argument_is_a_call() {
    let ast = parse_expression("f(1, dim = 2)");

    assert_eq!(ast.kind, AstKind::FunctionCall);
    let arguments = &ast.children[1];
    assert_eq!(arguments.children[1].kind, AstKind::KeywordArgument);
    assert_eq!(arguments.children[1].text, "dim");
}

#[test]
fn test_parse_section_is_a_subscript() {
    let ast = parse_expression("a(2:, :, 1:n:2)");

    assert_eq!(ast.kind, AstKind::ArraySubscript);
    let subscripts = &ast.children[1];
    assert_eq!(subscripts.children.len(), 3);
    for range in subscripts.children.iter() {
        assert_eq!(range.kind, AstKind::Range);
        assert_eq!(range.children.len(), 3);
    }
    assert!(subscripts.children[0].children[1].is_empty_node());
    assert!(subscripts.children[1].children[0].is_empty_node());
    assert_eq!(subscripts.children[2].children[2].text, "2");
}

#[test]
fn test_parse_component_reference() {
    let ast = parse_expression("p%x");

    assert_eq!(ast.kind, AstKind::ComponentReference);
    assert_eq!(ast.text, "x");
    assert_eq!(ast.children[0].text, "p");
}

#[test]
fn test_parse_groupings() {
    assert_eq!(parse_expression("(a)").kind, AstKind::Parenthesized);
    assert_eq!(parse_expression("(1.0, 2.0)").kind, AstKind::ComplexLiteral);

    let ast = parse_expression("(/ 1, 2, (i, i = 1, 3) /)");
    assert_eq!(ast.kind, AstKind::ArrayConstructor);
    assert_eq!(ast.children.len(), 3);
    let implied = &ast.children[2];
    assert_eq!(implied.kind, AstKind::ImpliedDo);
    assert_eq!(implied.text, "i");
    assert!(implied.children[3].is_empty_node());

    assert_eq!(parse_expression("[1, 2]").kind, AstKind::ArrayConstructor);
}

#[test]
fn test_parse_literals() {
    let ast = parse_expression(".true. .neqv. .false.");
    assert_eq!(ast.kind, AstKind::Neqv);
    assert_eq!(ast.children[0].kind, AstKind::BooleanLiteral);
    assert_eq!(ast.children[0].text, "true");

    let ast = parse_expression("'abc'");
    assert_eq!(ast.kind, AstKind::StringLiteral);
    assert_eq!(ast.text, "abc");
}

#[test]
fn test_parse_type_keyword_as_intrinsic_name() {
    let program = parse_source("x = real(i, 8)\n");
    let Stmt::Assignment(assignment) = &program.body[0] else {
        panic!("expected an assignment");
    };
    let value = &assignment.children[1];
    assert_eq!(value.kind, AstKind::Ambiguous);
    assert_eq!(value.children[0].children[0].text, "real");
}

#[test]
fn test_parse_assignment_and_call() {
    let program = parse_source("x = y + 1\ncall s(x, k = 2)\ncall t\n");

    assert_eq!(program.body.len(), 3);
    match &program.body[0] {
        Stmt::Assignment(ast) => assert_eq!(ast.kind, AstKind::Assignment),
        other => panic!("unexpected {:?}", other),
    }
    match &program.body[1] {
        Stmt::Call(ast) => {
            assert_eq!(ast.kind, AstKind::FunctionCall);
            assert_eq!(ast.children[1].children.len(), 2);
        }
        other => panic!("unexpected {:?}", other),
    }
    match &program.body[2] {
        Stmt::Call(ast) => assert!(ast.children[1].children.is_empty()),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_declarations() {
    let program = parse_source(
        "integer(kind=8), parameter :: n = 3, m = 4\n\
         real, dimension(0:n, :) :: a\n\
         character(len=*) :: s\n\
         character*5 t\n\
         double precision d\n",
    );

    let Stmt::Declaration(first) = &program.body[0] else {
        panic!("expected a declaration");
    };
    assert_eq!(first.entities.len(), 2);
    assert_eq!(first.attributes, vec![Attribute::Parameter]);
    match &first.type_spec {
        TypeSpec::Intrinsic { name, kind, .. } => {
            assert_eq!(*name, IntrinsicTypeName::Integer);
            assert_eq!(kind.as_ref().unwrap().text, "8");
        }
        other => panic!("unexpected {:?}", other),
    }

    let Stmt::Declaration(second) = &program.body[1] else {
        panic!("expected a declaration");
    };
    match &second.attributes[0] {
        Attribute::Dimension(dims) => {
            assert!(matches!(dims[0], DimSpec::Explicit { lower: Some(_), .. }));
            assert!(matches!(dims[1], DimSpec::AssumedShape { lower: None }));
        }
        other => panic!("unexpected {:?}", other),
    }

    let Stmt::Declaration(third) = &program.body[2] else {
        panic!("expected a declaration");
    };
    assert!(matches!(
        third.type_spec,
        TypeSpec::Intrinsic {
            len: Some(LenSelector::Assumed),
            ..
        }
    ));

    let Stmt::Declaration(fourth) = &program.body[3] else {
        panic!("expected a declaration");
    };
    assert!(matches!(
        fourth.type_spec,
        TypeSpec::Intrinsic {
            len: Some(LenSelector::Expr(_)),
            ..
        }
    ));

    let Stmt::Declaration(fifth) = &program.body[4] else {
        panic!("expected a declaration");
    };
    assert!(matches!(
        fifth.type_spec,
        TypeSpec::Intrinsic {
            name: IntrinsicTypeName::DoublePrecision,
            ..
        }
    ));
}

#[test]
fn test_parse_derived_type() {
    let program = parse_source("type :: point\n  real :: x, y\nend type point\ntype(point) :: p\n");

    let Stmt::DerivedType(definition) = &program.body[0] else {
        panic!("expected a derived type");
    };
    assert_eq!(definition.name, "point");
    assert_eq!(definition.components[0].entities.len(), 2);

    let Stmt::Declaration(declaration) = &program.body[1] else {
        panic!("expected a declaration");
    };
    assert_eq!(declaration.type_spec, TypeSpec::Derived("point".to_string()));
}

#[test]
fn test_parse_program_unit() {
    let program = parse_source(
        "program demo\n\
         implicit none\n\
         integer :: i\n\
         i = 1\n\
         end program demo\n",
    );

    assert_eq!(program.name.as_deref(), Some("demo"));
    assert!(program.implicit_none);
    assert_eq!(program.body.len(), 2);
}

#[test]
fn test_parse_procedure() {
    let program = parse_source(
        "elemental real(8) function scale(x, f) result(r)\n\
         real(8), intent(in) :: x\n\
         integer, optional :: f\n\
         r = x\n\
         end function scale\n",
    );

    let Stmt::Procedure(procedure) = &program.body[0] else {
        panic!("expected a procedure");
    };
    assert!(procedure.is_function);
    assert!(procedure.prefix.elemental);
    assert_eq!(procedure.dummies, vec!["x".to_string(), "f".to_string()]);
    assert_eq!(procedure.result.as_deref(), Some("r"));
    assert_eq!(procedure.declarations.len(), 2);
    assert_eq!(procedure.declarations[0].attributes, vec![Attribute::Intent(Intent::In)]);
    assert_eq!(procedure.declarations[1].attributes, vec![Attribute::Optional]);
    assert_eq!(procedure.body.len(), 1);
}

#[test]
fn test_parse_interfaces() {
    let program = parse_source(
        "interface swap\n\
           subroutine swap_i(a, b)\n\
             integer :: a, b\n\
           end subroutine\n\
           subroutine swap_r(a, b)\n\
             real :: a, b\n\
           end subroutine\n\
         end interface\n\
         interface operator(.eq.)\n\
           logical function same(a, b)\n\
             type(point), intent(in) :: a, b\n\
           end function\n\
         end interface operator(.eq.)\n\
         interface assignment(=)\n\
           subroutine assign(a, b)\n\
             type(point), intent(out) :: a\n\
             integer, intent(in) :: b\n\
           end subroutine\n\
         end interface\n",
    );

    let Stmt::Interface(generic) = &program.body[0] else {
        panic!("expected an interface");
    };
    assert_eq!(generic.generic, Some(GenericName::Name("swap".to_string())));
    assert_eq!(generic.bodies.len(), 2);
    assert!(!generic.bodies[0].is_function);

    let Stmt::Interface(operator) = &program.body[1] else {
        panic!("expected an interface");
    };
    assert_eq!(operator.generic, Some(GenericName::Operator("==".to_string())));
    assert!(operator.bodies[0].is_function);

    let Stmt::Interface(assignment) = &program.body[2] else {
        panic!("expected an interface");
    };
    assert_eq!(assignment.generic, Some(GenericName::Assignment));
}

#[test]
fn test_parse_errors() {
    let tokens = tokenize("x = (1, 2, 3)\n".to_string(), None).unwrap();
    assert!(parse(tokens, Rc::new("shell".to_string())).is_err());

    let tokens = tokenize("x = a(k = 1:2)\n".to_string(), None).unwrap();
    assert!(parse(tokens, Rc::new("shell".to_string())).is_err());

    let tokens = tokenize("integer :: \n".to_string(), None).unwrap();
    assert!(parse(tokens, Rc::new("shell".to_string())).is_err());
}
