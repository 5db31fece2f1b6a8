//! Unit tests for the Fortran dialect.
//!
//! Each test checks a small program unit and inspects the checked
//! statements and the diagnostics:
//! - folding of operators, intrinsics and named constants
//! - implicit typing
//! - generic resolution and its ambiguity error
//! - subscripts, sections and array constructors
//! - derived types and structure constructors
//! - intrinsic and defined assignment

use std::rc::Rc;

use crate::{
    config::CheckerConfig,
    lexer::lexer::tokenize,
    nodecl::nodecl::{Nodecl, NodeclKind},
    parser::parser::parse,
    type_checker::type_checker::TypeChecker,
};

use super::declarations::check_program;

fn check_with(source: &str, config: CheckerConfig) -> (TypeChecker, Vec<Nodecl>) {
    let tokens = tokenize(source.to_string(), Some("test.f90".to_string())).unwrap();
    let program = parse(tokens, Rc::new("test.f90".to_string())).unwrap();
    let mut type_checker = TypeChecker::new(config);
    let checked = check_program(&mut type_checker, &program);
    (type_checker, checked)
}

fn check(source: &str) -> (TypeChecker, Vec<Nodecl>) {
    check_with(source, CheckerConfig::default())
}

/// Checks a program that must not produce diagnostics.
fn check_clean(source: &str) -> (TypeChecker, Vec<Nodecl>) {
    let (type_checker, checked) = check(source);
    assert_eq!(type_checker.diagnostics.error_names(), Vec::<String>::new());
    (type_checker, checked)
}

fn errors(source: &str) -> Vec<String> {
    check(source).0.diagnostics.error_names()
}

fn last(checked: &[Nodecl]) -> &Nodecl {
    checked.last().unwrap()
}

fn int_value(nodecl: &Nodecl) -> i64 {
    nodecl.constant().and_then(|value| value.as_i64()).unwrap()
}

#[test]
fn test_fold_named_constants() {
    let (type_checker, checked) = check_clean("integer, parameter :: n = 3\nn * 4 + 2\n");

    let value = last(&checked);
    assert_eq!(int_value(value), 14);
    assert_eq!(type_checker.describe(value.ty()), "INTEGER(4)");
    assert!(!value.is_lvalue());
}

#[test]
fn test_mixed_kind_arithmetic() {
    let (type_checker, checked) = check_clean("1 + 2.5\n7 / 2\n2 ** 10\n");

    assert_eq!(type_checker.describe(checked[0].ty()), "REAL(4)");
    assert_eq!(checked[0].constant().and_then(|v| v.as_f64()), Some(3.5));
    assert_eq!(int_value(&checked[1]), 3);
    assert_eq!(int_value(&checked[2]), 1024);
}

#[test]
fn test_relational_and_logical_operators() {
    let (type_checker, checked) = check_clean("1 < 2\n.true. .and. .false.\n1.5 == 1\n");

    for value in &checked {
        assert_eq!(type_checker.describe(value.ty()), "LOGICAL(4)");
    }
    assert!(checked[0].constant().unwrap().is_nonzero());
    assert!(checked[1].constant().unwrap().is_zero());
    assert!(checked[2].constant().unwrap().is_zero());
}

#[test]
fn test_operator_errors() {
    assert_eq!(errors("1 + .true.\n"), vec!["OperatorTypeMismatch"]);
    assert_eq!(errors("real :: a(3), b(2, 2)\na + b\n"), vec!["RankMismatch"]);
}

#[test]
fn test_character_concatenation() {
    let (type_checker, checked) = check_clean("character(len=5), parameter :: s = 'abc'\ns // 'x'\n");

    let value = last(&checked);
    assert_eq!(type_checker.types.character_length(value.ty()), Some(6));
    assert_eq!(value.constant().and_then(|v| v.string_value()), Some("abc  x".to_string()));
}

#[test]
fn test_implicit_typing() {
    let config = CheckerConfig {
        implicit_none: false,
        ..Default::default()
    };
    let (type_checker, checked) = check_with("i = 1\nx = i * 2.5\n", config);

    assert!(!type_checker.diagnostics.has_errors());
    assert_eq!(type_checker.describe(checked[0].ty()), "INTEGER(4)");
    assert_eq!(type_checker.describe(checked[1].ty()), "REAL(4)");

    assert_eq!(errors("implicit none\ni = 1\n"), vec!["SymbolNotDeclared"]);
}

#[test]
fn test_declaration_errors() {
    assert_eq!(errors("integer(kind=3) :: i\n"), vec!["InvalidKind"]);
    assert_eq!(errors("integer, parameter :: n\n"), vec!["NotConstant"]);
    assert_eq!(errors("integer :: i\nreal :: i\n"), vec!["SymbolAlreadyDeclared"]);
    assert_eq!(errors("type(nowhere) :: p\n"), vec!["UnknownType"]);
}

#[test]
fn test_intrinsic_folding() {
    let (type_checker, checked) = check_clean(
        "max(1, 5, 3)\n\
         len('hello')\n\
         mod(7, 3)\n\
         sqrt(4.0)\n\
         kind(1.0)\n",
    );

    assert_eq!(int_value(&checked[0]), 5);
    assert_eq!(int_value(&checked[1]), 5);
    assert_eq!(int_value(&checked[2]), 1);
    assert_eq!(checked[3].constant().and_then(|v| v.as_f64()), Some(2.0));
    assert_eq!(type_checker.describe(checked[3].ty()), "REAL(4)");
    assert_eq!(int_value(&checked[4]), 4);
}

#[test]
fn test_intrinsic_argument_errors() {
    assert_eq!(errors("sqrt(4)\n"), vec!["ArgumentTypeMatchError"]);
    assert_eq!(errors("max(1, 2.0)\n"), vec!["ArgumentTypeMatchError"]);
    assert_eq!(errors("len('a', 'b')\n"), vec!["UnexpectedArguments"]);
}

#[test]
fn test_array_subscripts_and_sections() {
    let (type_checker, checked) = check_clean(
        "integer, parameter :: v(3) = (/ 10, 20, 30 /)\n\
         v(2)\n\
         v(2:3)\n\
         size(v)\n",
    );

    assert_eq!(int_value(&checked[0]), 20);
    assert_eq!(checked[0].kind(), NodeclKind::ArraySubscript);

    let section = &checked[1];
    assert_eq!(type_checker.types.rank(section.ty()), 1);
    assert_eq!(type_checker.types.array_element_count(section.ty()), Some(2));
    let elements: Vec<i64> = section
        .constant()
        .unwrap()
        .elements()
        .iter()
        .map(|e| e.as_i64().unwrap())
        .collect();
    assert_eq!(elements, vec![20, 30]);

    assert_eq!(int_value(&checked[2]), 3);
}

#[test]
fn test_subscript_errors() {
    let declarations = "integer, parameter :: v(3) = (/ 10, 20, 30 /)\n";
    assert_eq!(errors(&format!("{}v(4)\n", declarations)), vec!["InvalidSubscript"]);
    assert_eq!(errors(&format!("{}v(1, 1)\n", declarations)), vec!["SubscriptCountMismatch"]);
    assert_eq!(errors("integer :: k\nk(1)\n"), vec!["NotCallable"]);
}

#[test]
fn test_array_element_order() {
    let (_, checked) = check_clean(
        "integer, parameter :: m(2, 3) = (/ (i, i = 1, 6) /)\n\
         m(2, 1)\n\
         m(1, 3)\n",
    );

    assert_eq!(int_value(&checked[0]), 2);
    assert_eq!(int_value(&checked[1]), 5);
}

#[test]
fn test_implied_do_folding() {
    let (type_checker, checked) = check_clean(
        "integer, parameter :: squares(4) = (/ (i * i, i = 1, 4) /)\n\
         squares(3)\n\
         sum(squares)\n\
         (/ (j, j = 1, 10, 3) /)\n",
    );

    assert_eq!(int_value(&checked[0]), 9);
    assert_eq!(int_value(&checked[1]), 30);
    assert_eq!(type_checker.types.array_element_count(checked[2].ty()), Some(4));
}

#[test]
fn test_substring() {
    let (type_checker, checked) = check_clean("character(len=5), parameter :: s = 'hello'\ns(2:4)\n");

    let value = last(&checked);
    assert_eq!(type_checker.types.character_length(value.ty()), Some(3));
    assert_eq!(value.constant().and_then(|v| v.string_value()), Some("ell".to_string()));
}

const POINT: &str = "type :: point\n  real :: x, y = 2.0\nend type point\n";

#[test]
fn test_structure_constructor() {
    let (type_checker, checked) = check_clean(&format!(
        "{}type(point), parameter :: origin = point(1.0)\norigin%y\norigin%x\npoint(y = 4.0, x = 3.0)\n",
        POINT
    ));

    assert_eq!(checked[0].constant().and_then(|v| v.as_f64()), Some(2.0));
    assert_eq!(checked[1].constant().and_then(|v| v.as_f64()), Some(1.0));
    assert_eq!(checked[0].kind(), NodeclKind::ClassMemberAccess);

    let constructed = &checked[2];
    assert_eq!(constructed.kind(), NodeclKind::StructuredValue);
    assert_eq!(type_checker.describe(constructed.ty()), "TYPE(point)");
    let members: Vec<f64> = constructed
        .constant()
        .unwrap()
        .elements()
        .iter()
        .map(|m| m.as_f64().unwrap())
        .collect();
    assert_eq!(members, vec![3.0, 4.0]);
}

#[test]
fn test_structure_constructor_errors() {
    assert_eq!(
        errors(&format!("{}point(1.0, 2.0, 3.0)\n", POINT)),
        vec!["StructureConstructorError"]
    );
    assert_eq!(errors(&format!("{}point(z = 1.0)\n", POINT)), vec!["StructureConstructorError"]);
    assert_eq!(errors(&format!("{}point()\n", POINT)), vec!["StructureConstructorError"]);
    assert_eq!(
        errors(&format!("{}type(point) :: p\np%z\n", POINT)),
        vec!["NoSuchMember"]
    );
}

#[test]
fn test_intrinsic_assignment() {
    let (type_checker, checked) = check_clean(
        "integer :: k\n\
         character(len=3) :: c\n\
         k = 2.7\n\
         c = 'abcdef'\n",
    );

    let assignment = &checked[0];
    assert_eq!(assignment.kind(), NodeclKind::Assignment);
    let value = assignment.child(1).unwrap();
    assert_eq!(value.kind(), NodeclKind::Conversion);
    assert_eq!(int_value(value), 2);
    assert_eq!(type_checker.describe(value.ty()), "INTEGER(4)");

    let fitted = checked[1].child(1).unwrap();
    assert_eq!(fitted.constant().and_then(|v| v.string_value()), Some("abc".to_string()));
}

#[test]
fn test_assignment_errors() {
    assert_eq!(errors("logical :: l\nl = 1\n"), vec!["AssignmentTypeMismatch"]);
    assert_eq!(errors("integer, parameter :: n = 1\nn = 2\n"), vec!["NotAssignable"]);
    assert_eq!(errors("real :: a(3), b(4)\na = b\n"), vec!["RankMismatch"]);
}

#[test]
fn test_defined_assignment_and_operator() {
    let (type_checker, checked) = check_clean(&format!(
        "{}\
         interface assignment(=)\n\
           subroutine from_int(p, i)\n\
             type(point), intent(out) :: p\n\
             integer, intent(in) :: i\n\
           end subroutine\n\
         end interface\n\
         interface operator(+)\n\
           function add_points(a, b)\n\
             type(point), intent(in) :: a, b\n\
             type(point) :: add_points\n\
           end function\n\
         end interface\n\
         type(point) :: p, q\n\
         p = 3\n\
         p + q\n",
        POINT
    ));

    let assignment = &checked[0];
    assert_eq!(assignment.kind(), NodeclKind::FunctionCall);
    let callee = assignment.get_symbol().unwrap();
    assert_eq!(type_checker.symbols.get(callee).name, "from_int");

    let sum = &checked[1];
    assert_eq!(sum.kind(), NodeclKind::FunctionCall);
    assert_eq!(type_checker.describe(sum.ty()), "TYPE(point)");
}

const GENERIC_SWAP: &str = "interface swap\n\
                              subroutine swap_i(a, b)\n\
                                integer :: a, b\n\
                              end subroutine\n\
                              subroutine swap_r(a, b)\n\
                                real :: a, b\n\
                              end subroutine\n\
                            end interface\n";

#[test]
fn test_generic_resolution() {
    let (type_checker, checked) = check_clean(&format!(
        "{}integer :: i, j\nreal :: x, y\ncall swap(i, j)\ncall swap(x, y)\n",
        GENERIC_SWAP
    ));

    let names: Vec<&str> = checked
        .iter()
        .map(|call| type_checker.symbols.get(call.get_symbol().unwrap()).name.as_str())
        .collect();
    assert_eq!(names, vec!["swap_i", "swap_r"]);
}

#[test]
fn test_generic_resolution_errors() {
    assert_eq!(
        errors(&format!("{}integer :: i\nreal :: x\ncall swap(i, x)\n", GENERIC_SWAP)),
        vec!["NoMatchingSpecific"]
    );

    let ambiguous = "interface g\n\
                       subroutine g1(a)\n\
                         integer :: a\n\
                       end subroutine\n\
                       subroutine g2(b)\n\
                         integer :: b\n\
                       end subroutine\n\
                     end interface\n\
                     integer :: k\n\
                     call g(k)\n";
    assert_eq!(errors(ambiguous), vec!["AmbiguousGenericCall"]);
}

#[test]
fn test_generic_keyword_disambiguation() {
    let source = "interface g\n\
                    subroutine g1(a)\n\
                      integer :: a\n\
                    end subroutine\n\
                    subroutine g2(b)\n\
                      integer :: b\n\
                    end subroutine\n\
                  end interface\n\
                  integer :: k\n\
                  call g(b = k)\n";
    let (type_checker, checked) = check_clean(source);

    let callee = last(&checked).get_symbol().unwrap();
    assert_eq!(type_checker.symbols.get(callee).name, "g2");
}

#[test]
fn test_argument_association() {
    let procedures = "subroutine set(a)\n\
                        integer, intent(out) :: a\n\
                      end subroutine\n\
                      subroutine opt(a, b)\n\
                        integer :: a\n\
                        integer, optional :: b\n\
                      end subroutine\n";

    assert_eq!(errors(&format!("{}call set(3)\n", procedures)), vec!["NotAssignable"]);
    assert_eq!(errors(&format!("{}call opt()\n", procedures)), vec!["MissingArgument"]);
    assert_eq!(errors(&format!("{}call opt(1, c = 2)\n", procedures)), vec!["UnknownKeyword"]);
    assert_eq!(errors(&format!("{}call opt(1.0)\n", procedures)), vec!["ArgumentTypeMatchError"]);
    assert!(errors(&format!("{}integer :: k\ncall set(k)\ncall opt(b = 2, a = 1)\n", procedures)).is_empty());
}

#[test]
fn test_elemental_function_reference() {
    let (type_checker, checked) = check_clean(
        "elemental real function twice(x)\n\
           real, intent(in) :: x\n\
           twice = 2.0 * x\n\
         end function twice\n\
         real :: v(3)\n\
         twice(v)\n\
         twice(1.5)\n",
    );

    let array = &checked[checked.len() - 2];
    assert_eq!(type_checker.types.rank(array.ty()), 1);
    assert_eq!(type_checker.types.array_element_count(array.ty()), Some(3));
    assert_eq!(type_checker.describe(last(&checked).ty()), "REAL(4)");
}

#[test]
fn test_present_requires_optional_dummy() {
    let source = "subroutine s(a, b)\n\
                    integer, optional :: a\n\
                    integer :: b\n\
                    logical :: l\n\
                    l = present(a)\n\
                    l = present(b)\n\
                  end subroutine\n";
    assert_eq!(errors(source), vec!["ArgumentTypeMatchError"]);
}

#[test]
fn test_undeclared_dummy_without_implicit_typing() {
    assert_eq!(
        errors("implicit none\nsubroutine u(z)\nend subroutine\n"),
        vec!["SymbolNotDeclared"]
    );
}

#[test]
fn test_subroutine_in_expression() {
    assert_eq!(
        errors("subroutine s()\nend subroutine\ninteger :: k\nk = s()\n"),
        vec!["NotAnExpression"]
    );
}
