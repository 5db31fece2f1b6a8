use pretty_assertions::assert_eq;

use crate::{
    config::{CheckerConfig, Language},
    symbols::{
        scope::{ScopeId, ScopeKind},
        symbols::{SymbolId, SymbolKind},
    },
    type_checker::type_checker::TypeChecker,
    types::types::{ArrayBound, CvQualifiers, FloatPrecision, TemplateName, TypeId},
};

use super::{
    auto::deduce_auto,
    call::{deduce_call, CallArgument},
    deduction::{
        ArgumentProvenance, DeducedParameter, DeductionSet, TemplateArgument, TemplateParameter,
        TemplateParameterKey, TemplateParameterKind, TemplateParameterList,
    },
    substitute::{specialize_class, substitute_type},
};

fn cxx() -> TypeChecker {
    TypeChecker::new(CheckerConfig::for_language(Language::Cxx))
}

fn type_key(name: &str, position: usize) -> TemplateParameterKey {
    TemplateParameterKey::new(TemplateParameterKind::Type, name, position, 1)
}

fn function_template(
    tc: &mut TypeChecker,
    name: &str,
    parameters: Vec<TemplateParameter>,
    formals: Vec<TypeId>,
) -> SymbolId {
    let void = tc.types.void();
    let ty = tc.types.function(void, formals, false);
    let symbol = tc.symbols.new_symbol(ScopeId::GLOBAL, name, SymbolKind::FunctionTemplate);
    let data = tc.symbols.get_mut(symbol);
    data.ty = ty;
    data.specs.template_parameters = Some(TemplateParameterList::new(1, parameters));
    symbol
}

fn class_template(tc: &mut TypeChecker, scope: ScopeId, name: &str, parameter: &str) -> SymbolId {
    let symbol = tc.symbols.new_symbol(scope, name, SymbolKind::ClassTemplate);
    tc.symbols.new_scope(ScopeKind::Class, scope, Some(symbol));
    tc.symbols.get_mut(symbol).specs.template_parameters = Some(TemplateParameterList::new(
        1,
        vec![TemplateParameter::new(type_key(parameter, 0))],
    ));
    symbol
}

fn bound_type(list: &TemplateParameterList, position: usize) -> Option<TypeId> {
    match list.argument(position) {
        Some(TemplateArgument::Type(ty)) => Some(*ty),
        _ => None,
    }
}

#[test]
fn test_deduces_parameter_from_both_arguments() {
    let mut tc = cxx();
    let key = type_key("T", 0);
    let t = tc.types.template_parameter(key.clone());
    let f = function_template(&mut tc, "f", vec![TemplateParameter::new(key)], vec![t, t]);
    let int = tc.types.signed_int();

    let list = deduce_call(&mut tc, f, &[CallArgument::lvalue(int), CallArgument::rvalue(int)], None).unwrap();

    assert_eq!(bound_type(&list, 0), Some(int));
    assert_eq!(list.provenance[0], Some(ArgumentProvenance::Deduced));
}

#[test]
fn test_conflicting_deductions_fail() {
    let mut tc = cxx();
    let key = type_key("T", 0);
    let t = tc.types.template_parameter(key.clone());
    let f = function_template(&mut tc, "f", vec![TemplateParameter::new(key)], vec![t, t]);
    let int = tc.types.signed_int();
    let double = tc.types.float(FloatPrecision::Double);

    let result = deduce_call(&mut tc, f, &[CallArgument::lvalue(int), CallArgument::lvalue(double)], None);

    assert!(result.is_none());
}

#[test]
fn test_explicit_argument_takes_part_in_conversions() {
    let mut tc = cxx();
    let key = type_key("T", 0);
    let t = tc.types.template_parameter(key.clone());
    let f = function_template(&mut tc, "f", vec![TemplateParameter::new(key)], vec![t, t]);
    let int = tc.types.signed_int();
    let double = tc.types.float(FloatPrecision::Double);

    let list = deduce_call(
        &mut tc,
        f,
        &[CallArgument::lvalue(int), CallArgument::lvalue(int)],
        Some(&[TemplateArgument::Type(double)]),
    )
    .unwrap();

    assert_eq!(bound_type(&list, 0), Some(double));
    assert_eq!(list.provenance[0], Some(ArgumentProvenance::Explicit));
}

#[test]
fn test_explicit_arguments_must_fit() {
    let mut tc = cxx();
    let key = type_key("T", 0);
    let t = tc.types.template_parameter(key.clone());
    let f = function_template(&mut tc, "f", vec![TemplateParameter::new(key)], vec![t]);
    let int = tc.types.signed_int();
    let one = TemplateArgument::Value {
        value: crate::const_value::const_value::ConstValue::signed_int(1),
        ty: int,
    };

    assert!(deduce_call(&mut tc, f, &[CallArgument::lvalue(int)], Some(&[one])).is_none());
    assert!(deduce_call(
        &mut tc,
        f,
        &[CallArgument::lvalue(int)],
        Some(&[TemplateArgument::Type(int), TemplateArgument::Type(int)])
    )
    .is_none());
}

#[test]
fn test_default_argument_uses_deduced_parameters() {
    let mut tc = cxx();
    let t_key = type_key("T", 0);
    let u_key = type_key("U", 1);
    let t = tc.types.template_parameter(t_key.clone());
    let t_pointer = tc.types.pointer_to(t);
    let g = function_template(
        &mut tc,
        "g",
        vec![
            TemplateParameter::new(t_key),
            TemplateParameter::new(u_key).with_default(TemplateArgument::Type(t_pointer)),
        ],
        vec![t],
    );
    let int = tc.types.signed_int();
    let int_pointer = tc.types.pointer_to(int);

    let list = deduce_call(&mut tc, g, &[CallArgument::lvalue(int)], None).unwrap();

    assert_eq!(bound_type(&list, 1), Some(int_pointer));
    assert_eq!(list.provenance[1], Some(ArgumentProvenance::Default));
}

#[test]
fn test_undeducible_parameter_fails() {
    let mut tc = cxx();
    let t_key = type_key("T", 0);
    let u_key = type_key("U", 1);
    let t = tc.types.template_parameter(t_key.clone());
    let h = function_template(
        &mut tc,
        "h",
        vec![TemplateParameter::new(t_key), TemplateParameter::new(u_key)],
        vec![t],
    );
    let int = tc.types.signed_int();

    assert!(deduce_call(&mut tc, h, &[CallArgument::lvalue(int)], None).is_none());
}

#[test]
fn test_too_many_arguments_fail() {
    let mut tc = cxx();
    let key = type_key("T", 0);
    let t = tc.types.template_parameter(key.clone());
    let f = function_template(&mut tc, "f", vec![TemplateParameter::new(key)], vec![t]);
    let int = tc.types.signed_int();

    assert!(deduce_call(&mut tc, f, &[CallArgument::lvalue(int), CallArgument::lvalue(int)], None).is_none());
    assert!(deduce_call(&mut tc, f, &[], None).is_none());
}

#[test]
fn test_trailing_pack_collects_arguments() {
    let mut tc = cxx();
    let key = TemplateParameterKey::new(TemplateParameterKind::TypePack, "Ts", 0, 1);
    let ts = tc.types.template_parameter(key.clone());
    let pack = tc.types.pack(ts);
    let v = function_template(&mut tc, "v", vec![TemplateParameter::new(key)], vec![pack]);
    let int = tc.types.signed_int();
    let double = tc.types.float(FloatPrecision::Double);

    let list = deduce_call(&mut tc, v, &[CallArgument::lvalue(int), CallArgument::rvalue(double)], None).unwrap();
    assert_eq!(
        list.argument(0),
        Some(&TemplateArgument::Pack(vec![
            TemplateArgument::Type(int),
            TemplateArgument::Type(double)
        ]))
    );

    let empty = deduce_call(&mut tc, v, &[], None).unwrap();
    assert_eq!(empty.argument(0), Some(&TemplateArgument::Pack(vec![])));
}

#[test]
fn test_pack_expands_in_function_type() {
    let mut tc = cxx();
    let key = TemplateParameterKey::new(TemplateParameterKind::TypePack, "Ts", 0, 1);
    let ts = tc.types.template_parameter(key.clone());
    let pack = tc.types.pack(ts);
    let void = tc.types.void();
    let function = tc.types.function(void, vec![pack], false);
    let int = tc.types.signed_int();
    let char_type = tc.types.character(1);

    let mut list = TemplateParameterList::new(1, vec![TemplateParameter::new(key)]);
    list.bind(
        0,
        TemplateArgument::Pack(vec![TemplateArgument::Type(int), TemplateArgument::Type(char_type)]),
        ArgumentProvenance::Explicit,
    );
    let substituted = substitute_type(&mut tc, function, &list).unwrap();

    assert_eq!(tc.types.function_parameters(substituted), &[int, char_type]);
}

#[test]
fn test_array_bound_is_deduced() {
    let mut tc = cxx();
    let t_key = type_key("T", 0);
    let n_key = TemplateParameterKey::new(TemplateParameterKind::NonType, "N", 1, 1);
    let t = tc.types.template_parameter(t_key.clone());
    let size_type = tc.types.integer(8, false);
    let array = tc.types.array(t, ArrayBound::Known(0), ArrayBound::Dependent(n_key.clone()));
    let reference = tc.types.lvalue_reference(array);
    let a = function_template(
        &mut tc,
        "a",
        vec![
            TemplateParameter::new(t_key),
            TemplateParameter::new(n_key).with_value_type(size_type),
        ],
        vec![reference],
    );
    let int = tc.types.signed_int();
    let three_ints = tc.types.c_array(int, Some(3));

    let list = deduce_call(&mut tc, a, &[CallArgument::lvalue(three_ints)], None).unwrap();

    assert_eq!(bound_type(&list, 0), Some(int));
    match list.argument(1) {
        Some(TemplateArgument::Value { value, ty }) => {
            assert_eq!(value.as_i64(), Some(3));
            assert_eq!(*ty, size_type);
        }
        other => panic!("expected a value, got {:?}", other),
    }
}

#[test]
fn test_forwarding_reference() {
    let mut tc = cxx();
    let key = type_key("T", 0);
    let t = tc.types.template_parameter(key.clone());
    let forwarding = tc.types.rvalue_reference(t);
    let fw = function_template(&mut tc, "fw", vec![TemplateParameter::new(key)], vec![forwarding]);
    let int = tc.types.signed_int();
    let int_ref = tc.types.lvalue_reference(int);

    let from_lvalue = deduce_call(&mut tc, fw, &[CallArgument::lvalue(int)], None).unwrap();
    let from_rvalue = deduce_call(&mut tc, fw, &[CallArgument::rvalue(int)], None).unwrap();

    assert_eq!(bound_type(&from_lvalue, 0), Some(int_ref));
    assert_eq!(bound_type(&from_rvalue, 0), Some(int));
}

#[test]
fn test_const_reference_binds_less_qualified_argument() {
    let mut tc = cxx();
    let key = type_key("T", 0);
    let t = tc.types.template_parameter(key.clone());
    let const_t = tc.types.qualified(t, CvQualifiers::CONST);
    let formal = tc.types.lvalue_reference(const_t);
    let c = function_template(&mut tc, "c", vec![TemplateParameter::new(key)], vec![formal]);
    let int = tc.types.signed_int();
    let const_int = tc.types.qualified(int, CvQualifiers::CONST);

    let plain = deduce_call(&mut tc, c, &[CallArgument::lvalue(int)], None).unwrap();
    let qualified = deduce_call(&mut tc, c, &[CallArgument::lvalue(const_int)], None).unwrap();

    assert_eq!(bound_type(&plain, 0), Some(int));
    assert_eq!(bound_type(&qualified, 0), Some(int));
}

#[test]
fn test_pointer_qualification_conversion() {
    let mut tc = cxx();
    let key = type_key("T", 0);
    let t = tc.types.template_parameter(key.clone());
    let const_t = tc.types.qualified(t, CvQualifiers::CONST);
    let formal = tc.types.pointer_to(const_t);
    let p = function_template(&mut tc, "p", vec![TemplateParameter::new(key)], vec![formal]);
    let int = tc.types.signed_int();
    let int_pointer = tc.types.pointer_to(int);

    let list = deduce_call(&mut tc, p, &[CallArgument::rvalue(int_pointer)], None).unwrap();

    assert_eq!(bound_type(&list, 0), Some(int));
}

fn derived_from_specialization(tc: &mut TypeChecker) -> (SymbolId, SymbolId) {
    let base_template = class_template(tc, ScopeId::GLOBAL, "B", "U");
    let int = tc.types.signed_int();
    let base = specialize_class(tc, base_template, vec![TemplateArgument::Type(int)]).unwrap();

    let derived = tc.symbols.new_symbol(ScopeId::GLOBAL, "D", SymbolKind::Class);
    tc.symbols.new_scope(ScopeKind::Class, ScopeId::GLOBAL, Some(derived));
    let derived_type = tc.types.named(derived);
    let data = tc.symbols.get_mut(derived);
    data.ty = derived_type;
    data.specs.bases = vec![base];

    let key = type_key("T", 0);
    let t = tc.types.template_parameter(key.clone());
    let formal = tc
        .types
        .dependent_specialization(TemplateName::Symbol(base_template), vec![TemplateArgument::Type(t)]);
    let h = function_template(tc, "h", vec![TemplateParameter::new(key)], vec![formal]);
    (h, derived)
}

#[test]
fn test_derived_class_deduces_through_base() {
    let mut tc = cxx();
    let (h, derived) = derived_from_specialization(&mut tc);
    let derived_type = tc.types.named(derived);
    let int = tc.types.signed_int();

    let list = deduce_call(&mut tc, h, &[CallArgument::lvalue(derived_type)], None).unwrap();

    assert_eq!(bound_type(&list, 0), Some(int));
}

#[test]
fn test_derived_class_rejected_when_strict() {
    let mut tc = cxx();
    tc.config.lenient_derived_deduction = false;
    let (h, derived) = derived_from_specialization(&mut tc);
    let derived_type = tc.types.named(derived);

    assert!(deduce_call(&mut tc, h, &[CallArgument::lvalue(derived_type)], None).is_none());
}

#[test]
fn test_derived_pointer_converts_to_base_pointer() {
    let mut tc = cxx();
    let (_, derived) = derived_from_specialization(&mut tc);
    tc.config.lenient_derived_deduction = false;
    let base_template = tc.symbols.lookup(ScopeId::GLOBAL, "B", Default::default())[0];
    let key = type_key("T", 0);
    let t = tc.types.template_parameter(key.clone());
    let base_of_t = tc
        .types
        .dependent_specialization(TemplateName::Symbol(base_template), vec![TemplateArgument::Type(t)]);
    let formal = tc.types.pointer_to(base_of_t);
    let q = function_template(&mut tc, "q", vec![TemplateParameter::new(key)], vec![formal]);
    let derived_type = tc.types.named(derived);
    let derived_pointer = tc.types.pointer_to(derived_type);
    let int = tc.types.signed_int();

    let list = deduce_call(&mut tc, q, &[CallArgument::rvalue(derived_pointer)], None).unwrap();

    assert_eq!(bound_type(&list, 0), Some(int));
}

#[test]
fn test_overloaded_function_argument() {
    let mut tc = cxx();
    let key = type_key("T", 0);
    let t = tc.types.template_parameter(key.clone());
    let formal = tc.types.pointer_to(t);
    let p = function_template(&mut tc, "p", vec![TemplateParameter::new(key)], vec![formal]);

    let int = tc.types.signed_int();
    let double = tc.types.float(FloatPrecision::Double);
    let int_to_int = tc.types.function(int, vec![int], false);
    let double_to_int = tc.types.function(int, vec![double], false);
    let first = tc.symbols.new_symbol(ScopeId::GLOBAL, "k", SymbolKind::Function);
    tc.symbols.get_mut(first).ty = int_to_int;
    let second = tc.symbols.new_symbol(ScopeId::GLOBAL, "k", SymbolKind::Function);
    tc.symbols.get_mut(second).ty = double_to_int;

    let single = tc.types.unresolved_overload(vec![first], None);
    let list = deduce_call(&mut tc, p, &[CallArgument::lvalue(single)], None).unwrap();
    assert_eq!(bound_type(&list, 0), Some(int_to_int));

    let both = tc.types.unresolved_overload(vec![first, second], None);
    assert!(deduce_call(&mut tc, p, &[CallArgument::lvalue(both)], None).is_none());
}

#[test]
fn test_deduction_sets_detect_conflicts() {
    let mut tc = cxx();
    let key = type_key("T", 0);
    let int = tc.types.signed_int();
    let double = tc.types.float(FloatPrecision::Double);

    let mut first = DeductionSet::new();
    assert!(first.add(&key, DeducedParameter::Type(int)));
    assert!(first.add(&key, DeducedParameter::Type(int)));
    let mut second = DeductionSet::new();
    assert!(second.add(&key, DeducedParameter::Type(double)));

    assert!(!first.merge(second));
}

#[test]
fn test_invalid_substitutions() {
    let mut tc = cxx();
    let key = type_key("T", 0);
    let t = tc.types.template_parameter(key.clone());
    let pointer_to_t = tc.types.pointer_to(t);
    let reference_to_t = tc.types.lvalue_reference(t);
    let int = tc.types.signed_int();
    let int_ref = tc.types.lvalue_reference(int);
    let void = tc.types.void();

    let mut with_reference = TemplateParameterList::new(1, vec![TemplateParameter::new(key.clone())]);
    with_reference.bind(0, TemplateArgument::Type(int_ref), ArgumentProvenance::Explicit);
    assert_eq!(substitute_type(&mut tc, pointer_to_t, &with_reference), None);
    assert_eq!(substitute_type(&mut tc, reference_to_t, &with_reference), Some(int_ref));

    let mut with_void = TemplateParameterList::new(1, vec![TemplateParameter::new(key)]);
    with_void.bind(0, TemplateArgument::Type(void), ArgumentProvenance::Explicit);
    assert_eq!(substitute_type(&mut tc, reference_to_t, &with_void), None);

    let n_key = TemplateParameterKey::new(TemplateParameterKind::NonType, "N", 0, 1);
    let sized = tc.types.array(int, ArrayBound::Known(0), ArrayBound::Dependent(n_key.clone()));
    let mut zero = TemplateParameterList::new(1, vec![TemplateParameter::new(n_key)]);
    zero.bind(
        0,
        TemplateArgument::Value {
            value: crate::const_value::const_value::ConstValue::signed_int(0),
            ty: int,
        },
        ArgumentProvenance::Explicit,
    );
    assert_eq!(substitute_type(&mut tc, sized, &zero), None);
}

#[test]
fn test_unbound_parameters_stay() {
    let mut tc = cxx();
    let key = type_key("T", 0);
    let t = tc.types.template_parameter(key.clone());
    let pointer_to_t = tc.types.pointer_to(t);
    let list = TemplateParameterList::new(1, vec![TemplateParameter::new(key)]);

    assert_eq!(substitute_type(&mut tc, pointer_to_t, &list), Some(pointer_to_t));
}

#[test]
fn test_class_specialization_is_shared_and_inherits_bases() {
    let mut tc = cxx();
    let base_template = class_template(&mut tc, ScopeId::GLOBAL, "Base", "U");
    let derived_template = class_template(&mut tc, ScopeId::GLOBAL, "Derived", "U");
    let u = tc.types.template_parameter(type_key("U", 0));
    let base_of_u = tc
        .types
        .dependent_specialization(TemplateName::Symbol(base_template), vec![TemplateArgument::Type(u)]);
    tc.symbols.get_mut(derived_template).specs.dependent_bases = vec![base_of_u];
    let int = tc.types.signed_int();

    let first = specialize_class(&mut tc, derived_template, vec![TemplateArgument::Type(int)]).unwrap();
    let second = specialize_class(&mut tc, derived_template, vec![TemplateArgument::Type(int)]).unwrap();
    let base = specialize_class(&mut tc, base_template, vec![TemplateArgument::Type(int)]).unwrap();

    assert_eq!(first, second);
    assert_eq!(tc.symbols.get(first).specs.bases, vec![base]);
    assert_eq!(tc.symbols.get(first).specs.template_of, Some(derived_template));
    assert_eq!(tc.symbols.get(derived_template).specs.specializations, vec![first]);
}

fn declare_initializer_list(tc: &mut TypeChecker) -> SymbolId {
    let std = tc.symbols.new_symbol(ScopeId::GLOBAL, "std", SymbolKind::Namespace);
    let std_scope = tc.symbols.new_scope(ScopeKind::Namespace, ScopeId::GLOBAL, Some(std));
    class_template(tc, std_scope, "initializer_list", "E")
}

#[test]
fn test_auto_deduction() {
    let mut tc = cxx();
    let auto = tc.types.auto();
    let int = tc.types.signed_int();
    let const_int = tc.types.qualified(int, CvQualifiers::CONST);
    let int_ref = tc.types.lvalue_reference(int);
    let const_int_ref = tc.types.lvalue_reference(const_int);
    let const_auto = tc.types.qualified(auto, CvQualifiers::CONST);
    let const_auto_ref = tc.types.lvalue_reference(const_auto);
    let forwarding_auto = tc.types.rvalue_reference(auto);

    assert_eq!(deduce_auto(&mut tc, auto, &CallArgument::lvalue(const_int), false), Some(int));
    assert_eq!(
        deduce_auto(&mut tc, const_auto_ref, &CallArgument::lvalue(int), false),
        Some(const_int_ref)
    );
    assert_eq!(
        deduce_auto(&mut tc, forwarding_auto, &CallArgument::lvalue(int), false),
        Some(int_ref)
    );
}

#[test]
fn test_braced_auto_deduces_initializer_list() {
    let mut tc = cxx();
    let initializer_list = declare_initializer_list(&mut tc);
    let auto = tc.types.auto();
    let int = tc.types.signed_int();
    let double = tc.types.float(FloatPrecision::Double);
    let ints = tc.types.sequence(vec![int, int]);
    let mixed = tc.types.sequence(vec![int, double]);

    let deduced = deduce_auto(&mut tc, auto, &CallArgument::rvalue(ints), true).unwrap();
    let class = tc.types.named_symbol(deduced).unwrap();
    let data = tc.symbols.get(class);
    assert_eq!(data.specs.template_of, Some(initializer_list));
    assert_eq!(
        data.specs.template_arguments.as_ref().unwrap().bound_arguments(),
        vec![TemplateArgument::Type(int)]
    );

    assert_eq!(deduce_auto(&mut tc, auto, &CallArgument::rvalue(mixed), true), None);
}

#[test]
fn test_braced_auto_without_initializer_list_fails() {
    let mut tc = cxx();
    let auto = tc.types.auto();
    let int = tc.types.signed_int();
    let ints = tc.types.sequence(vec![int]);

    assert_eq!(deduce_auto(&mut tc, auto, &CallArgument::rvalue(ints), true), None);
}
