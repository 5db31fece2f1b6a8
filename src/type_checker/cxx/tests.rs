use pretty_assertions::assert_eq;

use crate::{
    ast::ast::{Ast, AstKind},
    config::{CheckerConfig, Language},
    const_value::const_value::ConstValue,
    deduction::deduction::{TemplateArgument, TemplateParameter, TemplateParameterKey, TemplateParameterKind, TemplateParameterList},
    nodecl::nodecl::{Nodecl, NodeclKind},
    symbols::{
        scope::{DeclContext, ScopeId, ScopeKind},
        symbols::{SymbolId, SymbolKind},
    },
    type_checker::type_checker::TypeChecker,
    types::types::{CvQualifiers, FloatPrecision, TypeId},
    Span,
};

use super::expr::{constant_literal, deduce_variable_type};

fn cxx() -> TypeChecker {
    TypeChecker::new(CheckerConfig::for_language(Language::Cxx))
}

fn c() -> TypeChecker {
    TypeChecker::new(CheckerConfig::for_language(Language::C))
}

fn leaf(kind: AstKind, text: &str) -> Ast {
    Ast::leaf(kind, text, Span::null())
}

fn int(text: &str) -> Ast {
    leaf(AstKind::IntegerLiteral, text)
}

fn name(text: &str) -> Ast {
    leaf(AstKind::Symbol, text)
}

fn call(callee: Ast, arguments: Vec<Ast>) -> Ast {
    let arguments = Ast::node(AstKind::ArgumentList, arguments, Span::null());
    Ast::node(AstKind::FunctionCall, vec![callee, arguments], Span::null())
}

fn member(kind: AstKind, base: Ast, member: &str) -> Ast {
    Ast::new(kind, vec![base], member, Span::null())
}

fn check(tc: &mut TypeChecker, ast: Ast) -> Nodecl {
    tc.check_expression(&ast, &DeclContext::global())
}

fn described(tc: &mut TypeChecker, ast: Ast) -> String {
    let checked = check(tc, ast);
    tc.describe(checked.ty())
}

fn int_value(nodecl: &Nodecl) -> i64 {
    nodecl.constant().and_then(|value| value.as_i64()).unwrap()
}

fn variable(tc: &mut TypeChecker, scope: ScopeId, name: &str, ty: TypeId) -> SymbolId {
    let symbol = tc.symbols.new_symbol(scope, name, SymbolKind::Variable);
    tc.symbols.get_mut(symbol).ty = ty;
    symbol
}

fn function(tc: &mut TypeChecker, scope: ScopeId, name: &str, result: TypeId, parameters: Vec<TypeId>) -> SymbolId {
    let ty = tc.types.function(result, parameters, false);
    let symbol = tc.symbols.new_symbol(scope, name, SymbolKind::Function);
    tc.symbols.get_mut(symbol).ty = ty;
    symbol
}

fn class(tc: &mut TypeChecker, scope: ScopeId, name: &str) -> (SymbolId, ScopeId, TypeId) {
    let symbol = tc.symbols.new_symbol(scope, name, SymbolKind::Class);
    let class_scope = tc.symbols.new_scope(ScopeKind::Class, scope, Some(symbol));
    let ty = tc.types.named(symbol);
    tc.symbols.get_mut(symbol).ty = ty;
    (symbol, class_scope, ty)
}

fn member_variable(tc: &mut TypeChecker, scope: ScopeId, name: &str, ty: TypeId) -> SymbolId {
    let symbol = variable(tc, scope, name, ty);
    tc.symbols.get_mut(symbol).specs.is_member = true;
    symbol
}

/// template <class T> T name(T);
fn identity_template(tc: &mut TypeChecker, name: &str) -> SymbolId {
    let key = TemplateParameterKey::new(TemplateParameterKind::Type, "T", 0, 1);
    let t = tc.types.template_parameter(key.clone());
    let ty = tc.types.function(t, vec![t], false);
    let symbol = tc.symbols.new_symbol(ScopeId::GLOBAL, name, SymbolKind::FunctionTemplate);
    let data = tc.symbols.get_mut(symbol);
    data.ty = ty;
    data.specs.template_parameters = Some(TemplateParameterList::new(1, vec![TemplateParameter::new(key)]));
    symbol
}

// Literals and built-in operators

#[test]
fn test_integer_literal_types() {
    let mut tc = cxx();

    assert_eq!(described(&mut tc, int("1")), "int");
    assert_eq!(described(&mut tc, int("4294967296")), "long");
    assert_eq!(described(&mut tc, int("0xffffffff")), "unsigned int");
    assert_eq!(described(&mut tc, int("1u")), "unsigned int");
    assert_eq!(described(&mut tc, int("10L")), "long");
    assert_eq!(int_value(&check(&mut tc, int("017"))), 15);

    check(&mut tc, int("99999999999999999999"));
    assert_eq!(tc.diagnostics.error_names(), vec!["NumberParseError"]);
}

#[test]
fn test_character_literal_type_depends_on_language() {
    let mut tc = c();
    let value = check(&mut tc, leaf(AstKind::CharacterLiteral, "a"));
    assert_eq!(tc.describe(value.ty()), "int");
    assert_eq!(int_value(&value), 97);

    let mut tc = cxx();
    let value = check(&mut tc, leaf(AstKind::CharacterLiteral, "\\n"));
    assert_eq!(tc.describe(value.ty()), "char");
    assert_eq!(int_value(&value), 10);
}

#[test]
fn test_usual_arithmetic_conversions() {
    let mut tc = cxx();

    let sum = check(&mut tc, Ast::binary(AstKind::Add, int("1"), leaf(AstKind::FloatingLiteral, "2.5")));
    assert_eq!(tc.describe(sum.ty()), "double");
    assert_eq!(sum.constant().and_then(ConstValue::as_f64), Some(3.5));

    let promoted = check(&mut tc, Ast::binary(AstKind::Add, leaf(AstKind::CharacterLiteral, "a"), int("1")));
    assert_eq!(tc.describe(promoted.ty()), "int");
    assert_eq!(int_value(&promoted), 98);

    let mixed = check(&mut tc, Ast::binary(AstKind::Mul, int("2u"), int("3L")));
    assert_eq!(tc.describe(mixed.ty()), "long");
    assert_eq!(int_value(&mixed), 6);
    assert!(!tc.diagnostics.has_errors());
}

#[test]
fn test_comparison_type_depends_on_language() {
    let mut tc = c();
    let less = check(&mut tc, Ast::binary(AstKind::LowerThan, int("1"), int("2")));
    assert_eq!(tc.describe(less.ty()), "int");
    assert_eq!(int_value(&less), 1);

    let mut tc = cxx();
    let less = check(&mut tc, Ast::binary(AstKind::LowerThan, int("1"), int("2")));
    assert_eq!(tc.describe(less.ty()), "bool");
    assert!(less.constant().unwrap().is_nonzero());
    let negated = check(&mut tc, Ast::unary(AstKind::LogicalNot, int("0")));
    assert_eq!(tc.describe(negated.ty()), "bool");
}

#[test]
fn test_pointer_arithmetic() {
    let mut tc = c();
    let int_type = tc.types.signed_int();
    let pointer = tc.types.pointer_to(int_type);
    variable(&mut tc, ScopeId::GLOBAL, "p", pointer);

    assert_eq!(described(&mut tc, Ast::binary(AstKind::Add, name("p"), int("1"))), "int *");
    assert_eq!(described(&mut tc, Ast::binary(AstKind::Add, int("1"), name("p"))), "int *");
    assert_eq!(described(&mut tc, Ast::binary(AstKind::Minus, name("p"), name("p"))), "long");
    assert!(!tc.diagnostics.has_errors());

    check(&mut tc, Ast::binary(AstKind::Add, name("p"), name("p")));
    assert_eq!(tc.diagnostics.error_names(), vec!["OperatorTypeMismatch"]);
}

#[test]
fn test_address_and_dereference() {
    let mut tc = cxx();
    let int_type = tc.types.signed_int();
    variable(&mut tc, ScopeId::GLOBAL, "i", int_type);

    let address = check(&mut tc, Ast::unary(AstKind::Reference, name("i")));
    assert_eq!(tc.describe(address.ty()), "int *");
    assert!(!address.is_lvalue());

    let back = check(
        &mut tc,
        Ast::unary(AstKind::Dereference, Ast::unary(AstKind::Reference, name("i"))),
    );
    assert_eq!(tc.describe(back.ty()), "int");
    assert!(back.is_lvalue());

    check(&mut tc, Ast::unary(AstKind::Reference, int("1")));
    assert_eq!(tc.diagnostics.error_names(), vec!["TypeMatchError"]);
}

#[test]
fn test_string_literal_subscript_folds() {
    let mut tc = cxx();
    let subscripts = Ast::node(AstKind::SubscriptList, vec![int("1")], Span::null());
    let ast = Ast::node(
        AstKind::ArraySubscript,
        vec![leaf(AstKind::StringLiteral, "abc"), subscripts],
        Span::null(),
    );

    let element = check(&mut tc, ast);
    assert_eq!(tc.describe(element.ty()), "const char");
    assert!(element.is_lvalue());
    assert_eq!(int_value(&element), 'b' as i64);
}

#[test]
fn test_subscript_errors() {
    let mut tc = cxx();
    let subscript = |base: Ast, indices: Vec<Ast>| {
        let list = Ast::node(AstKind::SubscriptList, indices, Span::null());
        Ast::node(AstKind::ArraySubscript, vec![base, list], Span::null())
    };

    check(&mut tc, subscript(int("1"), vec![int("2")]));
    check(&mut tc, subscript(leaf(AstKind::StringLiteral, "ab"), vec![int("1"), int("2")]));
    assert_eq!(
        tc.diagnostics.error_names(),
        vec!["InvalidSubscript", "SubscriptCountMismatch"]
    );
}

#[test]
fn test_conditional_and_cast() {
    let mut tc = cxx();

    let chosen = check(
        &mut tc,
        Ast::node(
            AstKind::Conditional,
            vec![int("1"), int("2"), leaf(AstKind::FloatingLiteral, "3.0")],
            Span::null(),
        ),
    );
    assert_eq!(tc.describe(chosen.ty()), "double");
    assert_eq!(chosen.constant().and_then(ConstValue::as_f64), Some(2.0));

    let int_type = tc.types.signed_int();
    let truncated = check(
        &mut tc,
        Ast::unary(AstKind::Cast, leaf(AstKind::FloatingLiteral, "2.7")).with_type(int_type),
    );
    assert_eq!(tc.describe(truncated.ty()), "int");
    assert_eq!(int_value(&truncated), 2);

    let size = check(
        &mut tc,
        Ast::unary(AstKind::Sizeof, leaf(AstKind::TypeName, "int").with_type(int_type)),
    );
    assert_eq!(tc.describe(size.ty()), "unsigned long");
    assert_eq!(int_value(&size), 4);
    assert!(!tc.diagnostics.has_errors());
}

// Assignment

#[test]
fn test_assignment_value_category() {
    let mut tc = c();
    let int_type = tc.types.signed_int();
    variable(&mut tc, ScopeId::GLOBAL, "i", int_type);
    let assigned = check(&mut tc, Ast::binary(AstKind::Assignment, name("i"), leaf(AstKind::FloatingLiteral, "2.5")));
    assert_eq!(tc.describe(assigned.ty()), "int");
    assert!(!assigned.is_lvalue());
    assert_eq!(assigned.children()[1].kind(), NodeclKind::Conversion);

    let mut tc = cxx();
    let int_type = tc.types.signed_int();
    variable(&mut tc, ScopeId::GLOBAL, "i", int_type);
    let assigned = check(&mut tc, Ast::binary(AstKind::Assignment, name("i"), int("2")));
    assert!(assigned.is_lvalue());
}

#[test]
fn test_assignment_errors() {
    let mut tc = cxx();
    let int_type = tc.types.signed_int();
    let const_int = tc.types.qualified(int_type, CvQualifiers::CONST);
    variable(&mut tc, ScopeId::GLOBAL, "i", int_type);
    variable(&mut tc, ScopeId::GLOBAL, "k", const_int);

    check(&mut tc, Ast::binary(AstKind::Assignment, int("1"), int("2")));
    check(&mut tc, Ast::binary(AstKind::Assignment, name("k"), int("2")));
    check(&mut tc, Ast::binary(AstKind::Assignment, name("i"), leaf(AstKind::StringLiteral, "abc")));
    assert_eq!(
        tc.diagnostics.error_names(),
        vec!["NotAssignable", "NotAssignable", "AssignmentTypeMismatch"]
    );
}

// Members

#[test]
fn test_member_access() {
    let mut tc = cxx();
    let int_type = tc.types.signed_int();
    let (_, scope, point) = class(&mut tc, ScopeId::GLOBAL, "Point");
    member_variable(&mut tc, scope, "x", int_type);
    let const_point = tc.types.qualified(point, CvQualifiers::CONST);
    let point_pointer = tc.types.pointer_to(point);
    variable(&mut tc, ScopeId::GLOBAL, "p", point);
    variable(&mut tc, ScopeId::GLOBAL, "cp", const_point);
    variable(&mut tc, ScopeId::GLOBAL, "pp", point_pointer);

    let x = check(&mut tc, member(AstKind::MemberAccess, name("p"), "x"));
    assert_eq!(tc.describe(x.ty()), "int");
    assert!(x.is_lvalue());
    assert_eq!(x.kind(), NodeclKind::ClassMemberAccess);

    let through_pointer = check(&mut tc, member(AstKind::PointerMemberAccess, name("pp"), "x"));
    assert_eq!(tc.describe(through_pointer.ty()), "int");
    assert!(through_pointer.is_lvalue());

    let constant = check(&mut tc, member(AstKind::MemberAccess, name("cp"), "x"));
    assert_eq!(tc.describe(constant.ty()), "const int");
    assert!(!tc.diagnostics.has_errors());

    check(
        &mut tc,
        Ast::binary(AstKind::Assignment, member(AstKind::MemberAccess, name("cp"), "x"), int("1")),
    );
    check(&mut tc, member(AstKind::MemberAccess, name("p"), "z"));
    check(&mut tc, member(AstKind::MemberAccess, int("1"), "x"));
    assert_eq!(
        tc.diagnostics.error_names(),
        vec!["NotAssignable", "NoSuchMember", "TypeMatchError"]
    );
}

#[test]
fn test_member_found_in_base_class() {
    let mut tc = cxx();
    let int_type = tc.types.signed_int();
    let (base, base_scope, _) = class(&mut tc, ScopeId::GLOBAL, "Base");
    member_variable(&mut tc, base_scope, "value", int_type);
    let (derived, _, derived_type) = class(&mut tc, ScopeId::GLOBAL, "Derived");
    tc.symbols.get_mut(derived).specs.bases = vec![base];
    variable(&mut tc, ScopeId::GLOBAL, "d", derived_type);

    let value = check(&mut tc, member(AstKind::MemberAccess, name("d"), "value"));
    assert_eq!(tc.describe(value.ty()), "int");
    assert!(!tc.diagnostics.has_errors());
}

#[test]
fn test_member_function_call() {
    let mut tc = cxx();
    let int_type = tc.types.signed_int();
    let (_, scope, point) = class(&mut tc, ScopeId::GLOBAL, "Point");
    let get = function(&mut tc, scope, "get", int_type, vec![]);
    tc.symbols.get_mut(get).specs.is_member = true;
    variable(&mut tc, ScopeId::GLOBAL, "p", point);

    let result = check(&mut tc, call(member(AstKind::MemberAccess, name("p"), "get"), vec![]));
    assert_eq!(tc.describe(result.ty()), "int");
    assert_eq!(result.get_symbol(), Some(get));
    assert_eq!(result.children()[0].kind(), NodeclKind::ClassMemberAccess);
}

// Calls and overload resolution

#[test]
fn test_overload_prefers_better_conversion() {
    let mut tc = cxx();
    let int_type = tc.types.signed_int();
    let long_type = tc.types.integer(8, true);
    let double = tc.types.float(FloatPrecision::Double);
    let void = tc.types.void();
    let f_int = function(&mut tc, ScopeId::GLOBAL, "f", void, vec![int_type]);
    let f_double = function(&mut tc, ScopeId::GLOBAL, "f", void, vec![double]);
    let g_int = function(&mut tc, ScopeId::GLOBAL, "g", void, vec![int_type]);
    function(&mut tc, ScopeId::GLOBAL, "g", void, vec![long_type]);

    assert_eq!(check(&mut tc, call(name("f"), vec![int("1")])).get_symbol(), Some(f_int));
    let float_call = call(name("f"), vec![leaf(AstKind::FloatingLiteral, "1.5")]);
    assert_eq!(check(&mut tc, float_call).get_symbol(), Some(f_double));
    // char to int is a promotion, char to long a conversion.
    let char_call = call(name("g"), vec![leaf(AstKind::CharacterLiteral, "a")]);
    assert_eq!(check(&mut tc, char_call).get_symbol(), Some(g_int));
    assert!(!tc.diagnostics.has_errors());
}

#[test]
fn test_overload_errors() {
    let mut tc = cxx();
    let int_type = tc.types.signed_int();
    let double = tc.types.float(FloatPrecision::Double);
    let pointer = tc.types.pointer_to(int_type);
    let void = tc.types.void();
    function(&mut tc, ScopeId::GLOBAL, "f", void, vec![int_type]);
    function(&mut tc, ScopeId::GLOBAL, "f", void, vec![double]);
    function(&mut tc, ScopeId::GLOBAL, "h", void, vec![pointer]);

    check(&mut tc, call(name("f"), vec![int("1L")]));
    check(&mut tc, call(name("h"), vec![leaf(AstKind::FloatingLiteral, "1.0")]));
    check(&mut tc, call(name("nowhere"), vec![]));
    check(&mut tc, call(int("1"), vec![]));
    assert_eq!(
        tc.diagnostics.error_names(),
        vec!["AmbiguousCall", "NoMatchingFunction", "SymbolNotDeclared", "NotCallable"]
    );
}

#[test]
fn test_default_arguments_fill_the_call() {
    let mut tc = cxx();
    let int_type = tc.types.signed_int();
    let f = function(&mut tc, ScopeId::GLOBAL, "f", int_type, vec![int_type, int_type]);
    let a = tc.symbols.new_detached_symbol(ScopeId::GLOBAL, "a", SymbolKind::Variable);
    let b = tc.symbols.new_detached_symbol(ScopeId::GLOBAL, "b", SymbolKind::Variable);
    let five = constant_literal(NodeclKind::IntegerLiteral, ConstValue::signed_int(5), int_type, &Span::null());
    tc.symbols.get_mut(b).specs.default_argument = Some(five);
    tc.symbols.get_mut(f).specs.related_symbols = vec![a, b];

    let result = check(&mut tc, call(name("f"), vec![int("1")]));
    assert_eq!(result.get_symbol(), Some(f));
    let arguments = result.children()[1].children();
    assert_eq!(arguments.len(), 2);
    assert_eq!(int_value(&arguments[1]), 5);

    check(&mut tc, call(name("f"), vec![]));
    assert_eq!(tc.diagnostics.error_names(), vec!["NoMatchingFunction"]);
}

#[test]
fn test_argument_dependent_lookup() {
    let mut tc = cxx();
    let void = tc.types.void();
    let n = tc.symbols.new_symbol(ScopeId::GLOBAL, "N", SymbolKind::Namespace);
    let n_scope = tc.symbols.new_scope(ScopeKind::Namespace, ScopeId::GLOBAL, Some(n));
    let (_, _, s) = class(&mut tc, n_scope, "S");
    let g = function(&mut tc, n_scope, "g", void, vec![s]);
    variable(&mut tc, ScopeId::GLOBAL, "s", s);

    let result = check(&mut tc, call(name("g"), vec![name("s")]));
    assert_eq!(result.get_symbol(), Some(g));

    check(&mut tc, call(name("g"), vec![int("1")]));
    assert_eq!(tc.diagnostics.error_names(), vec!["SymbolNotDeclared"]);
}

#[test]
fn test_template_call_specializes_once() {
    let mut tc = cxx();
    let template = identity_template(&mut tc, "id");

    let first = check(&mut tc, call(name("id"), vec![int("1")]));
    let second = check(&mut tc, call(name("id"), vec![int("2")]));
    assert!(!tc.diagnostics.has_errors());
    assert_eq!(tc.describe(first.ty()), "int");

    let specialization = first.get_symbol().unwrap();
    assert_eq!(second.get_symbol(), Some(specialization));
    assert_eq!(tc.symbols.get(specialization).specs.template_of, Some(template));
    assert_eq!(tc.symbols.get(specialization).kind, SymbolKind::Function);
    assert_eq!(tc.describe(tc.symbols.get(specialization).ty), "int (int)");
    assert_eq!(tc.symbols.get(template).specs.specializations, vec![specialization]);

    let int_type = tc.types.signed_int();
    assert_eq!(
        first.template_arguments().unwrap().bound_arguments(),
        vec![TemplateArgument::Type(int_type)]
    );
}

#[test]
fn test_non_template_preferred_over_template() {
    let mut tc = cxx();
    identity_template(&mut tc, "id");
    let int_type = tc.types.signed_int();
    let plain = function(&mut tc, ScopeId::GLOBAL, "id", int_type, vec![int_type]);

    let result = check(&mut tc, call(name("id"), vec![int("1")]));
    assert_eq!(result.get_symbol(), Some(plain));

    let double_call = check(&mut tc, call(name("id"), vec![leaf(AstKind::FloatingLiteral, "1.0")]));
    assert_eq!(tc.describe(double_call.ty()), "double");
    assert_ne!(double_call.get_symbol(), Some(plain));
}

#[test]
fn test_explicit_template_arguments() {
    let mut tc = cxx();
    identity_template(&mut tc, "id");
    let double = tc.types.float(FloatPrecision::Double);
    let callee = Ast::new(
        AstKind::TemplateId,
        vec![leaf(AstKind::TypeName, "double").with_type(double)],
        "id",
        Span::null(),
    );

    let result = check(&mut tc, call(callee, vec![int("1")]));
    assert!(!tc.diagnostics.has_errors());
    assert_eq!(tc.describe(result.ty()), "double");
    assert_eq!(result.children()[1].children()[0].kind(), NodeclKind::Conversion);
}

#[test]
fn test_overloaded_operator() {
    let mut tc = cxx();
    let (_, scope, vector) = class(&mut tc, ScopeId::GLOBAL, "Vector");
    let int_type = tc.types.signed_int();
    let plus = function(&mut tc, ScopeId::GLOBAL, "operator+", vector, vec![vector, vector]);
    let index = function(&mut tc, scope, "operator[]", int_type, vec![int_type]);
    tc.symbols.get_mut(index).specs.is_member = true;
    variable(&mut tc, ScopeId::GLOBAL, "v", vector);

    let sum = check(&mut tc, Ast::binary(AstKind::Add, name("v"), name("v")));
    assert_eq!(sum.kind(), NodeclKind::FunctionCall);
    assert_eq!(sum.get_symbol(), Some(plus));
    assert_eq!(tc.describe(sum.ty()), "Vector");

    let subscripts = Ast::node(AstKind::SubscriptList, vec![int("0")], Span::null());
    let element = check(
        &mut tc,
        Ast::node(AstKind::ArraySubscript, vec![name("v"), subscripts], Span::null()),
    );
    assert_eq!(element.get_symbol(), Some(index));
    assert_eq!(tc.describe(element.ty()), "int");
    assert!(!tc.diagnostics.has_errors());

    check(&mut tc, Ast::binary(AstKind::Mul, name("v"), name("v")));
    assert_eq!(tc.diagnostics.error_names(), vec!["OperatorTypeMismatch"]);
}

// Templates and placeholders

#[test]
fn test_dependent_operands_defer_checking() {
    let mut tc = cxx();
    let key = TemplateParameterKey::new(TemplateParameterKind::Type, "T", 0, 1);
    let t = tc.types.template_parameter(key);
    variable(&mut tc, ScopeId::GLOBAL, "t", t);

    let sum = check(&mut tc, Ast::binary(AstKind::Add, name("t"), int("1")));
    assert!(sum.is_type_dependent());
    let called = check(&mut tc, call(name("anything"), vec![name("t")]));
    assert!(called.is_type_dependent());
    let accessed = check(&mut tc, member(AstKind::MemberAccess, name("t"), "x"));
    assert!(accessed.is_type_dependent());
    assert!(!tc.diagnostics.has_errors());
}

#[test]
fn test_placeholder_deduction() {
    let mut tc = cxx();
    let std = tc.symbols.new_symbol(ScopeId::GLOBAL, "std", SymbolKind::Namespace);
    let std_scope = tc.symbols.new_scope(ScopeKind::Namespace, ScopeId::GLOBAL, Some(std));
    let list = tc.symbols.new_symbol(std_scope, "initializer_list", SymbolKind::ClassTemplate);
    tc.symbols.new_scope(ScopeKind::Class, std_scope, Some(list));
    let key = TemplateParameterKey::new(TemplateParameterKind::Type, "E", 0, 1);
    tc.symbols.get_mut(list).specs.template_parameters =
        Some(TemplateParameterList::new(1, vec![TemplateParameter::new(key)]));

    let int_type = tc.types.signed_int();
    let auto = tc.types.auto();
    let context = DeclContext::global();

    let braced = Ast::node(AstKind::BracedInitializer, vec![int("1"), int("2")], Span::null());
    let deduced = deduce_variable_type(&mut tc, auto, &braced, &context).unwrap();
    assert_eq!(tc.describe(deduced), "std::initializer_list<int>");

    variable(&mut tc, ScopeId::GLOBAL, "i", int_type);
    let const_auto = tc.types.qualified(auto, CvQualifiers::CONST);
    let const_auto_ref = tc.types.lvalue_reference(const_auto);
    let deduced = deduce_variable_type(&mut tc, const_auto_ref, &name("i"), &context).unwrap();
    assert_eq!(tc.describe(deduced), "const int &");

    let mixed = Ast::node(
        AstKind::BracedInitializer,
        vec![int("1"), leaf(AstKind::FloatingLiteral, "2.0")],
        Span::null(),
    );
    assert!(deduce_variable_type(&mut tc, auto, &mixed, &context).is_err());
}
