use std::collections::HashMap;

use pretty_assertions::assert_eq;

use crate::{
    config::{CheckerConfig, Language},
    const_value::const_value::ConstValue,
    deduction::deduction::{
        ArgumentProvenance, TemplateArgument, TemplateParameter, TemplateParameterKey, TemplateParameterKind,
        TemplateParameterList,
    },
    nodecl::nodecl::{Nodecl, NodeclKind},
    type_checker::type_checker::TypeChecker,
    Span,
};

use super::{
    copy::{copy_symbol, SymbolMap},
    scope::{DeclContext, QueryFlags, ScopeId, ScopeKind},
    symbols::{SymbolKind, SymbolTable},
};

#[test]
fn test_lookup_climbs_scopes() {
    let mut symbols = SymbolTable::new();
    let outer = symbols.new_symbol(ScopeId::GLOBAL, "x", SymbolKind::Variable);
    let block = symbols.new_scope(ScopeKind::Block, ScopeId::GLOBAL, None);
    let inner_block = symbols.new_scope(ScopeKind::Block, block, None);

    assert_eq!(symbols.lookup(inner_block, "x", QueryFlags::NONE), vec![outer]);
    assert!(symbols
        .lookup(inner_block, "x", QueryFlags::CURRENT_SCOPE_ONLY)
        .is_empty());

    let shadow = symbols.new_symbol(block, "x", SymbolKind::Variable);
    assert_eq!(symbols.lookup(inner_block, "x", QueryFlags::NONE), vec![shadow]);
}

#[test]
fn test_used_scopes_are_searched() {
    let mut symbols = SymbolTable::new();
    let ns = symbols.new_symbol(ScopeId::GLOBAL, "n", SymbolKind::Namespace);
    let ns_scope = symbols.new_scope(ScopeKind::Namespace, ScopeId::GLOBAL, Some(ns));
    let f = symbols.new_symbol(ns_scope, "f", SymbolKind::Function);
    let block = symbols.new_scope(ScopeKind::Block, ScopeId::GLOBAL, None);

    assert!(symbols.lookup_in_scope(block, "f", QueryFlags::NONE).is_empty());
    symbols.scope_mut(block).used_scopes.push(ns_scope);
    assert_eq!(symbols.lookup_in_scope(block, "f", QueryFlags::NONE), vec![f]);
}

#[test]
fn test_friend_declared_names_can_be_skipped() {
    let mut symbols = SymbolTable::new();
    let f = symbols.new_symbol(ScopeId::GLOBAL, "f", SymbolKind::Function);
    symbols.get_mut(f).specs.is_friend_declared = true;

    assert_eq!(symbols.lookup(ScopeId::GLOBAL, "f", QueryFlags::NONE), vec![f]);
    assert!(symbols
        .lookup(ScopeId::GLOBAL, "f", QueryFlags::IGNORE_FRIEND_DECLARED)
        .is_empty());
}

#[test]
fn test_qualified_lookup_and_name() {
    let mut symbols = SymbolTable::new();
    let outer = symbols.new_symbol(ScopeId::GLOBAL, "a", SymbolKind::Namespace);
    let outer_scope = symbols.new_scope(ScopeKind::Namespace, ScopeId::GLOBAL, Some(outer));
    let inner = symbols.new_symbol(outer_scope, "b", SymbolKind::Namespace);
    let inner_scope = symbols.new_scope(ScopeKind::Namespace, outer_scope, Some(inner));
    let c = symbols.new_symbol(inner_scope, "c", SymbolKind::Variable);

    assert_eq!(
        symbols.lookup_qualified(ScopeId::GLOBAL, &["a", "b", "c"], QueryFlags::NONE),
        vec![c]
    );
    assert!(symbols
        .lookup_qualified(ScopeId::GLOBAL, &["a", "c"], QueryFlags::NONE)
        .is_empty());
    assert_eq!(symbols.qualified_name(c), "a::b::c");
    assert_eq!(symbols.enclosing_namespace(inner_scope), inner_scope);
}

#[test]
fn test_redirected_placeholder_resolves_to_real_symbol() {
    let mut symbols = SymbolTable::new();
    let placeholder = symbols.new_symbol(ScopeId::GLOBAL, "sqrt", SymbolKind::Unknown);
    let real = symbols.new_detached_symbol(ScopeId::GLOBAL, "sqrt", SymbolKind::Function);

    symbols.redirect(placeholder, real);
    symbols.get_mut(placeholder).specs.is_elemental = true;

    assert_eq!(symbols.resolve(placeholder), real);
    assert_eq!(symbols.get(placeholder).kind, SymbolKind::Function);
    assert!(symbols.get(real).specs.is_elemental);
    assert_eq!(symbols.lookup(ScopeId::GLOBAL, "sqrt", QueryFlags::NONE), vec![real]);
}

#[test]
fn test_class_members_are_found_through_bases() {
    let mut symbols = SymbolTable::new();
    let base = symbols.new_symbol(ScopeId::GLOBAL, "Base", SymbolKind::Class);
    let base_scope = symbols.new_scope(ScopeKind::Class, ScopeId::GLOBAL, Some(base));
    let member = symbols.new_symbol(base_scope, "m", SymbolKind::Variable);
    let derived = symbols.new_symbol(ScopeId::GLOBAL, "Derived", SymbolKind::Class);
    let derived_scope = symbols.new_scope(ScopeKind::Class, ScopeId::GLOBAL, Some(derived));
    symbols.get_mut(derived).specs.bases.push(base);

    assert_eq!(symbols.lookup(derived_scope, "m", QueryFlags::NONE), vec![member]);
    assert!(symbols.is_derived_from(derived, base));
    assert!(!symbols.is_derived_from(base, derived));
    assert_eq!(symbols.enclosing_class(member), Some(base));
}

fn fortran() -> TypeChecker {
    TypeChecker::new(CheckerConfig::for_language(Language::Fortran))
}

#[test]
fn test_copy_symbol_is_independent() {
    let mut tc = fortran();
    let int = tc.types.signed_int();
    let source = tc.symbols.new_symbol(ScopeId::GLOBAL, "n", SymbolKind::Variable);
    let value = Nodecl::new(NodeclKind::IntegerLiteral, vec![], int, Span::null())
        .with_constant(Some(ConstValue::signed_int(4)));
    {
        let data = tc.symbols.get_mut(source);
        data.ty = int;
        data.defined = true;
        data.value = Some(value.clone());
        data.specs.is_parameter = true;
        data.extended_data.insert("bind".to_string(), "c".to_string());
    }
    let dest = tc.symbols.new_symbol(ScopeId::GLOBAL, "m", SymbolKind::Unknown);

    copy_symbol(&mut tc, dest, source, &SymbolMap::new(), &DeclContext::global());

    let copy = tc.symbols.get(dest);
    assert_eq!(copy.name, "m");
    assert_eq!(copy.kind, SymbolKind::Variable);
    assert_eq!(copy.ty, int);
    assert!(copy.defined);
    assert!(copy.specs.is_parameter);
    assert!(copy.extended_data.is_empty());
    let copied_value = copy.value.as_ref().unwrap();
    assert_eq!(copied_value, &value);
    assert!(!copied_value.same_node(&value));
}

#[test]
fn test_copy_symbol_remaps_references() {
    let mut tc = fortran();
    let real = tc.default_real();
    let function = tc.symbols.new_symbol(ScopeId::GLOBAL, "f", SymbolKind::Function);
    let scope = tc.symbols.new_scope(ScopeKind::Program, ScopeId::GLOBAL, Some(function));
    let parameter = tc.symbols.new_symbol(scope, "x", SymbolKind::Variable);
    let result = tc.symbols.new_symbol(scope, "f", SymbolKind::Variable);
    tc.symbols.get_mut(parameter).specs.parameter_of.push((function, 0));
    let function_type = tc.types.function(real, vec![real], false);
    {
        let data = tc.symbols.get_mut(function);
        data.ty = function_type;
        data.specs.related_symbols = vec![parameter, result];
        data.specs.result_symbol = Some(result);
    }

    let new_parameter = tc.symbols.new_symbol(scope, "x", SymbolKind::Variable);
    let dest = tc.symbols.new_symbol(ScopeId::GLOBAL, "g", SymbolKind::Unknown);
    let map: SymbolMap = HashMap::from([(parameter, new_parameter)]);
    tc.symbols.get_mut(new_parameter).specs.parameter_of.push((function, 0));

    copy_symbol(&mut tc, dest, function, &map, &DeclContext::global());

    let copy = tc.symbols.get(dest);
    assert_eq!(copy.ty, function_type);
    assert_eq!(copy.specs.related_symbols, vec![new_parameter, result]);
    assert_eq!(copy.specs.result_symbol, Some(result));
    assert!(tc.symbols.get(new_parameter).specs.parameter_of.contains(&(dest, 0)));
    assert_eq!(tc.symbols.get(parameter).specs.parameter_of, vec![(function, 0)]);
}

#[test]
fn test_copy_symbol_substitutes_template_parameters() {
    let mut tc = TypeChecker::new(CheckerConfig::for_language(Language::Cxx));
    let key = TemplateParameterKey::new(TemplateParameterKind::Type, "T", 0, 1);
    let t = tc.types.template_parameter(key.clone());
    let pointer_to_t = tc.types.pointer_to(t);
    let source = tc.symbols.new_symbol(ScopeId::GLOBAL, "p", SymbolKind::Variable);
    tc.symbols.get_mut(source).ty = pointer_to_t;
    let dest = tc.symbols.new_symbol(ScopeId::GLOBAL, "p", SymbolKind::Unknown);
    let int = tc.types.signed_int();
    let mut list = TemplateParameterList::new(1, vec![TemplateParameter::new(key)]);
    list.bind(0, TemplateArgument::Type(int), ArgumentProvenance::Explicit);
    let context = DeclContext::global().with_template_parameters(list);

    copy_symbol(&mut tc, dest, source, &SymbolMap::new(), &context);

    let int_pointer = tc.types.pointer_to(int);
    assert_eq!(tc.symbols.get(dest).ty, int_pointer);
    assert_eq!(tc.symbols.get(source).ty, pointer_to_t);
}

#[test]
fn test_copy_symbol_keeps_type_when_substitution_fails() {
    let mut tc = TypeChecker::new(CheckerConfig::for_language(Language::Cxx));
    let key = TemplateParameterKey::new(TemplateParameterKind::Type, "T", 0, 1);
    let t = tc.types.template_parameter(key.clone());
    let reference_to_t = tc.types.lvalue_reference(t);
    let source = tc.symbols.new_symbol(ScopeId::GLOBAL, "r", SymbolKind::Variable);
    tc.symbols.get_mut(source).ty = reference_to_t;
    let dest = tc.symbols.new_symbol(ScopeId::GLOBAL, "r", SymbolKind::Unknown);
    let void = tc.types.void();
    let mut list = TemplateParameterList::new(1, vec![TemplateParameter::new(key)]);
    list.bind(0, TemplateArgument::Type(void), ArgumentProvenance::Explicit);
    let context = DeclContext::global().with_template_parameters(list);

    copy_symbol(&mut tc, dest, source, &SymbolMap::new(), &context);

    assert_eq!(tc.symbols.get(dest).ty, reference_to_t);
    assert!(tc.types.is_dependent(tc.symbols.get(dest).ty));
}

#[test]
#[should_panic(expected = "cannot deep-copy")]
fn test_classes_cannot_be_copied() {
    let mut tc = fortran();
    let class = tc.symbols.new_symbol(ScopeId::GLOBAL, "c", SymbolKind::Class);
    let dest = tc.symbols.new_symbol(ScopeId::GLOBAL, "d", SymbolKind::Unknown);

    copy_symbol(&mut tc, dest, class, &SymbolMap::new(), &DeclContext::global());
}
