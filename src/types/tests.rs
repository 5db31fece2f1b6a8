use pretty_assertions::assert_eq;

use crate::{
    deduction::deduction::{TemplateParameterKey, TemplateParameterKind},
    symbols::{
        scope::ScopeId,
        symbols::{SymbolKind, SymbolTable},
    },
};

use super::{
    fortran::Dimension,
    types::{ArrayBound, CvQualifiers, FloatPrecision, TypeId, TypeTable},
};

#[test]
fn test_interning_shares_handles() {
    let mut types = TypeTable::new();
    let a = types.integer(4, true);
    let b = types.signed_int();
    let p1 = types.pointer_to(a);
    let p2 = types.pointer_to(b);

    assert_eq!(a, b);
    assert_eq!(p1, p2);
    assert!(types.equivalent_types(p1, p2));
    assert!(!types.equivalent_types(TypeId::ERROR, TypeId::ERROR));
}

#[test]
fn test_reference_collapsing() {
    let mut types = TypeTable::new();
    let int = types.signed_int();
    let lref = types.lvalue_reference(int);
    let rref = types.rvalue_reference(int);

    assert_eq!(types.lvalue_reference(lref), lref);
    assert_eq!(types.lvalue_reference(rref), lref);
    assert_eq!(types.rvalue_reference(lref), lref);
    assert_eq!(types.rvalue_reference(rref), rref);
    assert_eq!(types.no_ref(rref), int);
}

#[test]
fn test_qualification() {
    let mut types = TypeTable::new();
    let int = types.signed_int();
    let const_int = types.qualified(int, CvQualifiers::CONST);
    let cv_int = types.qualified(const_int, CvQualifiers::VOLATILE);

    assert_ne!(int, const_int);
    assert!(types.cv(cv_int).is_const && types.cv(cv_int).is_volatile);
    assert_eq!(types.unqualified(cv_int), int);

    let array = types.c_array(int, Some(3));
    let const_array = types.qualified(array, CvQualifiers::CONST);
    assert!(types.effective_cv(const_array).is_const);
    assert!(types.cv(const_array).is_empty());

    let reference = types.lvalue_reference(int);
    assert_eq!(types.qualified(reference, CvQualifiers::CONST), reference);
}

#[test]
fn test_cv_containment() {
    let cv = CvQualifiers::CONST.union(CvQualifiers::VOLATILE);

    assert!(cv.contains(CvQualifiers::CONST));
    assert!(!CvQualifiers::CONST.contains(cv));
    assert_eq!(cv.without(CvQualifiers::CONST), CvQualifiers::VOLATILE);
}

#[test]
fn test_dependence() {
    let mut types = TypeTable::new();
    let key = TemplateParameterKey::new(TemplateParameterKind::Type, "T", 0, 1);
    let t = types.template_parameter(key);
    let pointer = types.pointer_to(t);
    let int = types.signed_int();
    let function = types.function(int, vec![pointer], false);

    assert!(types.is_dependent(function));
    assert!(!types.is_dependent(int));

    let n = TemplateParameterKey::new(TemplateParameterKind::NonType, "N", 1, 1);
    let array = types.array(int, ArrayBound::Known(0), ArrayBound::Dependent(n));
    assert!(types.is_dependent(array));
}

#[test]
fn test_class_predicates() {
    let mut types = TypeTable::new();
    let mut symbols = SymbolTable::new();
    let class = symbols.new_symbol(ScopeId::GLOBAL, "A", SymbolKind::Class);
    let enumeration = symbols.new_symbol(ScopeId::GLOBAL, "E", SymbolKind::Enum);
    let class_type = types.named(class);
    let enum_type = types.named(enumeration);

    assert!(types.is_class(class_type, &symbols));
    assert!(!types.is_class(enum_type, &symbols));
    assert!(types.is_integral(enum_type, &symbols));
    assert!(!types.is_scalar(class_type, &symbols));
}

#[test]
fn test_fortran_rank_and_dimensions() {
    let mut types = TypeTable::new();
    let real = types.fortran_real(4).unwrap();
    let matrix = types.fortran_array(real, &[Dimension::known(1, 3), Dimension::known(0, 4)]);

    assert_eq!(types.rank(matrix), 2);
    assert_eq!(types.rank0(matrix), real);
    assert_eq!(
        types.dimensions(matrix),
        vec![Dimension::known(1, 3), Dimension::known(0, 4)]
    );
    assert_eq!(types.array_element_count(matrix), Some(15));

    let reals = types.array_of_rank(real, 2);
    let ints = types.fortran_integer(4);
    let rebuilt = types.rebuild_array(ints, matrix);
    assert_eq!(types.rank(rebuilt), 2);
    assert!(types.conformable(matrix, reals));
    assert!(types.conformable(matrix, ints));
}

#[test]
fn test_character_strings_are_scalars() {
    let mut types = TypeTable::new();
    let string = types.fortran_character(ArrayBound::Known(5), 1);
    let strings = types.fortran_array(string, &[Dimension::known(1, 2)]);

    assert_eq!(types.rank(string), 0);
    assert_eq!(types.rank(strings), 1);
    assert_eq!(types.rank0(strings), string);
    assert_eq!(types.character_length(string), Some(5));
    assert!(types.is_fortran_character(string));
    assert!(!types.is_fortran_array(string));

    let other = types.fortran_character(ArrayBound::Known(3), 1);
    assert!(types.same_type_and_kind(string, other));
}

#[test]
fn test_unsupported_real_kind() {
    let mut types = TypeTable::new();

    assert!(types.fortran_real(3).is_none());
    let complex = types.fortran_complex(8).unwrap();
    assert_eq!(types.fortran_kind(complex), Some(8));
}

#[test]
fn test_describe_c() {
    let mut types = TypeTable::new();
    let symbols = SymbolTable::new();
    let int = types.signed_int();
    let const_char = {
        let c = types.character(1);
        types.qualified(c, CvQualifiers::CONST)
    };
    let pointer = types.pointer_to(const_char);
    let double = types.float(FloatPrecision::Double);
    let function = types.function(double, vec![int], true);
    let function_pointer = types.pointer_to(function);
    let unsigned = types.integer(8, false);

    assert_eq!(types.describe(pointer, &symbols), "const char *");
    assert_eq!(types.describe(function_pointer, &symbols), "double (*)(int, ...)");
    assert_eq!(types.describe(unsigned, &symbols), "unsigned long");
}

#[test]
fn test_describe_fortran() {
    let mut types = TypeTable::new();
    let symbols = SymbolTable::new();
    let real = types.fortran_real(8).unwrap();
    let matrix = types.fortran_array(real, &[Dimension::known(1, 3), Dimension::known(0, 1)]);
    let string = types.fortran_character(ArrayBound::Known(5), 1);
    let logical = types.fortran_logical(4);

    assert_eq!(types.describe_fortran(matrix, &symbols), "REAL(8), DIMENSION(1:3, 0:1)");
    assert_eq!(types.describe_fortran(string, &symbols), "CHARACTER(len=5)");
    assert_eq!(types.describe_fortran(logical, &symbols), "LOGICAL(4)");
}
