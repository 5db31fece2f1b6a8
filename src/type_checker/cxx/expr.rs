use tracing::trace;

use crate::{
    ast::ast::{Ast, AstKind},
    const_value::const_value::{ConstValue, FloatPrecision},
    deduction::{
        auto::deduce_auto,
        call::CallArgument,
        deduction::{TemplateArgument, TemplateParameterKey, TemplateParameterList},
    },
    errors::errors::{Error, ErrorImpl},
    internal_error,
    nodecl::nodecl::{Nodecl, NodeclKind},
    symbols::{
        scope::{DeclContext, QueryFlags, ScopeId},
        symbols::{SymbolId, SymbolKind},
    },
    type_checker::{
        fortran::expr::child,
        type_checker::{already_reported, error_at, Handler, TypeChecker},
    },
    types::types::{CvQualifiers, TypeId},
    Span,
};

use super::{
    access,
    conversions::{
        convert_scalar_constant, convert_to, decay, implicit_conversion, usual_arithmetic_conversions,
        ConversionSource,
    },
    operators, overload,
};

/// Handlers of the C and C++ dialect, one per expression kind.
pub fn handlers() -> Vec<(AstKind, Handler)> {
    let mut handlers: Vec<(AstKind, Handler)> = vec![
        (AstKind::IntegerLiteral, check_integer_literal as Handler),
        (AstKind::FloatingLiteral, check_floating_literal as Handler),
        (AstKind::CharacterLiteral, check_character_literal as Handler),
        (AstKind::StringLiteral, check_string_literal as Handler),
        (AstKind::BooleanLiteral, check_boolean_literal as Handler),
        (AstKind::Symbol, check_symbol as Handler),
        (AstKind::TemplateId, check_template_id as Handler),
        (AstKind::QualifiedId, check_qualified_id as Handler),
        (AstKind::TypeName, check_type_name as Handler),
        (AstKind::Parenthesized, check_parenthesized as Handler),
        (AstKind::Conditional, check_conditional as Handler),
        (AstKind::Comma, check_comma as Handler),
        (AstKind::Cast, check_cast as Handler),
        (AstKind::Sizeof, check_sizeof as Handler),
        (AstKind::BracedInitializer, check_braced_initializer as Handler),
        (AstKind::FunctionCall, overload::check_function_call as Handler),
        (AstKind::ArraySubscript, access::check_array_subscript as Handler),
        (AstKind::MemberAccess, access::check_member_access as Handler),
        (AstKind::PointerMemberAccess, access::check_member_access as Handler),
        (AstKind::Assignment, access::check_assignment as Handler),
    ];
    for kind in operators::BINARY_OPERATORS {
        handlers.push((*kind, operators::check_binary_operator as Handler));
    }
    for kind in operators::UNARY_OPERATORS {
        handlers.push((*kind, operators::check_unary_operator as Handler));
    }
    handlers
}

/// A literal node holding `value`.
pub fn constant_literal(kind: NodeclKind, value: ConstValue, ty: TypeId, span: &Span) -> Nodecl {
    let text = value.to_string();
    Nodecl::new(kind, vec![], ty, span.clone())
        .with_text(&text)
        .with_constant(Some(value))
}

/// A node whose type is only known once template arguments are.
pub fn dependent_nodecl(type_checker: &mut TypeChecker, kind: NodeclKind, children: Vec<Nodecl>, span: &Span) -> Nodecl {
    let auto = type_checker.types.auto();
    Nodecl::new(kind, children, auto, span.clone()).with_dependence(true, true)
}

// Literals

fn check_integer_literal(type_checker: &mut TypeChecker, ast: &Ast, _context: &DeclContext) -> Result<Nodecl, Error> {
    let parse_error = || {
        error_at(
            ErrorImpl::NumberParseError {
                token: ast.text.clone(),
            },
            &ast.span,
        )
    };
    let text = ast.text.to_ascii_lowercase();
    let digits = text.trim_end_matches(|c: char| c == 'u' || c == 'l');
    let suffix = &text[digits.len()..];
    let (unsigned, long) = (suffix.contains('u'), suffix.contains('l'));

    let (radix, body) = match digits.strip_prefix("0x") {
        Some(hex) => (16, hex),
        None if digits.len() > 1 && digits.starts_with('0') => (8, &digits[1..]),
        None => (10, digits),
    };
    let value = u64::from_str_radix(body, radix).map_err(|_| parse_error())?;

    // Octal and hexadecimal literals may also take the unsigned types.
    let decimal = radix == 10;
    let candidates: &[(u8, bool)] = match (unsigned, long) {
        (false, false) if decimal => &[(4, true), (8, true)],
        (false, false) => &[(4, true), (4, false), (8, true), (8, false)],
        (true, false) => &[(4, false), (8, false)],
        (false, true) if decimal => &[(8, true)],
        (false, true) => &[(8, true), (8, false)],
        (true, true) => &[(8, false)],
    };
    let fits = |(bytes, signed): &(u8, bool)| {
        let bits = *bytes as u32 * 8 - *signed as u32;
        (value as u128) < (1u128 << bits)
    };
    let Some((bytes, signed)) = candidates.iter().find(|c| fits(*c)).copied() else {
        return Err(parse_error());
    };

    let ty = type_checker.types.integer(bytes, signed);
    Ok(constant_literal(
        NodeclKind::IntegerLiteral,
        ConstValue::int(value as i128, bytes, signed),
        ty,
        &ast.span,
    ))
}

fn check_floating_literal(type_checker: &mut TypeChecker, ast: &Ast, _context: &DeclContext) -> Result<Nodecl, Error> {
    let text = ast.text.to_ascii_lowercase();
    let (mantissa, precision) = if let Some(mantissa) = text.strip_suffix('f') {
        (mantissa, FloatPrecision::Float)
    } else if let Some(mantissa) = text.strip_suffix('l') {
        (mantissa, FloatPrecision::LongDouble)
    } else {
        (text.as_str(), FloatPrecision::Double)
    };
    let value: f64 = mantissa.parse().map_err(|_| {
        error_at(
            ErrorImpl::NumberParseError {
                token: ast.text.clone(),
            },
            &ast.span,
        )
    })?;
    let ty = type_checker.types.float(precision);
    Ok(constant_literal(
        NodeclKind::FloatingLiteral,
        ConstValue::float(value, precision),
        ty,
        &ast.span,
    ))
}

/// Code of a character literal body, escapes included.
fn character_code(body: &str) -> Option<u32> {
    let mut chars = body.chars();
    let first = chars.next()?;
    if first != '\\' {
        return chars.next().is_none().then_some(first as u32);
    }
    let rest: String = chars.collect();
    let code = match rest.as_str() {
        "n" => 10,
        "t" => 9,
        "r" => 13,
        "a" => 7,
        "b" => 8,
        "f" => 12,
        "v" => 11,
        "\\" => 92,
        "'" => 39,
        "\"" => 34,
        "?" => 63,
        _ => match rest.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => u32::from_str_radix(&rest, 8).ok()?,
        },
    };
    Some(code)
}

/// `'c'` is an `int` in C and a `char` in C++.
fn check_character_literal(type_checker: &mut TypeChecker, ast: &Ast, _context: &DeclContext) -> Result<Nodecl, Error> {
    let Some(code) = character_code(&ast.text) else {
        return Err(error_at(
            ErrorImpl::NumberParseError {
                token: format!("'{}'", ast.text),
            },
            &ast.span,
        ));
    };
    let (ty, value) = if type_checker.config.is_cxx() {
        (type_checker.types.character(1), ConstValue::int(code as i128, 1, true))
    } else {
        (type_checker.types.signed_int(), ConstValue::int(code as i128, 4, true))
    };
    Ok(constant_literal(NodeclKind::IntegerLiteral, value, ty, &ast.span))
}

/// A string literal is an lvalue array of `const char`, terminator included.
fn check_string_literal(type_checker: &mut TypeChecker, ast: &Ast, _context: &DeclContext) -> Result<Nodecl, Error> {
    let length = ast.text.chars().count() as i64 + 1;
    let char_type = type_checker.types.character(1);
    let element = type_checker.types.qualified(char_type, CvQualifiers::CONST);
    let ty = type_checker.types.c_array(element, Some(length));
    Ok(Nodecl::new(NodeclKind::StringLiteral, vec![], ty, ast.span.clone())
        .with_text(&ast.text)
        .with_constant(Some(ConstValue::string(&ast.text, 1)))
        .with_lvalue(true))
}

fn check_boolean_literal(type_checker: &mut TypeChecker, ast: &Ast, _context: &DeclContext) -> Result<Nodecl, Error> {
    let ty = type_checker.truth_type();
    let truth = ConstValue::truth(ast.text == "true");
    let value = convert_scalar_constant(type_checker, &truth, ty).unwrap_or(truth);
    Ok(constant_literal(NodeclKind::BooleanLiteral, value, ty, &ast.span))
}

// Names

fn check_symbol(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let found = type_checker
        .symbols
        .lookup(context.current_scope, &ast.text, QueryFlags::NONE);
    name_reference(type_checker, &ast.text, found, None, &ast.span, context)
}

fn check_qualified_id(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let found = lookup_qualified_id(type_checker, &ast.text, context);
    name_reference(type_checker, &ast.text, found, None, &ast.span, context)
}

/// Lookup of `a::b::c`; a leading `::` starts at the global namespace.
pub fn lookup_qualified_id(type_checker: &TypeChecker, path: &str, context: &DeclContext) -> Vec<SymbolId> {
    let (start, path) = match path.strip_prefix("::") {
        Some(rest) => (ScopeId::GLOBAL, rest),
        None => (context.current_scope, path),
    };
    let components: Vec<&str> = path.split("::").collect();
    type_checker
        .symbols
        .lookup_qualified(start, &components, QueryFlags::NONE)
}

/// `f<args>` used as a value: an overload set carrying the explicit
/// arguments, resolved by the call or conversion that uses it.
fn check_template_id(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let explicit = template_arguments(type_checker, ast, context)?;
    let found = if ast.text.contains("::") {
        lookup_qualified_id(type_checker, &ast.text, context)
    } else {
        type_checker
            .symbols
            .lookup(context.current_scope, &ast.text, QueryFlags::NONE)
    };
    name_reference(type_checker, &ast.text, found, Some(explicit), &ast.span, context)
}

/// Explicit template arguments of a template-id: type-ids or constant
/// expressions.
pub fn template_arguments(
    type_checker: &mut TypeChecker,
    ast: &Ast,
    context: &DeclContext,
) -> Result<Vec<TemplateArgument>, Error> {
    let mut arguments = vec![];
    for argument in &ast.children {
        if argument.kind == AstKind::TypeName {
            let Some(ty) = argument.type_ref else {
                internal_error!("type-id without a resolved type");
            };
            arguments.push(TemplateArgument::Type(ty));
            continue;
        }
        let value = type_checker.check_operand(argument, context)?;
        match value.constant() {
            Some(constant) => arguments.push(TemplateArgument::Value {
                value: constant.clone(),
                ty: value.ty(),
            }),
            None => {
                return Err(error_at(
                    ErrorImpl::NotConstant {
                        name: "template argument".to_string(),
                    },
                    &argument.span,
                ))
            }
        }
    }
    Ok(arguments)
}

/// Reference to a looked-up name. Several functions, a function template
/// or explicit template arguments give an unresolved overload set.
pub fn name_reference(
    type_checker: &mut TypeChecker,
    name: &str,
    found: Vec<SymbolId>,
    explicit: Option<Vec<TemplateArgument>>,
    span: &Span,
    context: &DeclContext,
) -> Result<Nodecl, Error> {
    let Some(first) = found.first().copied() else {
        return Err(error_at(
            ErrorImpl::SymbolNotDeclared {
                name: name.to_string(),
            },
            span,
        ));
    };
    let functions: Vec<SymbolId> = found
        .iter()
        .copied()
        .filter(|s| type_checker.symbols.get(*s).kind.is_function_like())
        .collect();
    let overloaded = functions.len() > 1
        || explicit.is_some()
        || functions
            .iter()
            .any(|f| type_checker.symbols.get(*f).kind == SymbolKind::FunctionTemplate);
    if !functions.is_empty() && overloaded {
        trace!("`{}` names an overload set of {} function(s)", name, functions.len());
        let ty = type_checker.types.unresolved_overload(functions.clone(), explicit);
        return Ok(Nodecl::new(NodeclKind::Symbol, vec![], ty, span.clone())
            .with_symbol(functions[0])
            .with_text(name));
    }
    symbol_reference(type_checker, first, span, context)
}

/// A use of a named entity. Variables are lvalues of their referenced
/// type; constants and enumerators carry their value.
pub fn symbol_reference(
    type_checker: &mut TypeChecker,
    symbol: SymbolId,
    span: &Span,
    context: &DeclContext,
) -> Result<Nodecl, Error> {
    let symbol = type_checker.symbols.resolve(symbol);
    let data = type_checker.symbols.get(symbol);
    match data.kind {
        SymbolKind::Variable | SymbolKind::Function | SymbolKind::Enumerator if data.ty == TypeId::ERROR => {
            Err(already_reported(span))
        }
        SymbolKind::Variable => {
            let ty = type_checker.types.no_ref(data.ty);
            let constant = if type_checker.types.effective_cv(ty).is_const {
                data.value.as_ref().and_then(Nodecl::constant).cloned()
            } else {
                None
            };
            let dependent = type_checker.types.is_dependent(ty);
            let reference = Nodecl::symbol(symbol, ty, span.clone())
                .with_lvalue(true)
                .with_constant(constant);
            Ok(if dependent {
                reference.with_dependence(true, true)
            } else {
                reference
            })
        }
        SymbolKind::Enumerator => {
            let constant = data.value.as_ref().and_then(Nodecl::constant).cloned();
            Ok(Nodecl::symbol(symbol, data.ty, span.clone()).with_constant(constant))
        }
        SymbolKind::Function => Ok(Nodecl::symbol(symbol, data.ty, span.clone()).with_lvalue(true)),
        SymbolKind::TemplateNonTypeParameter => template_parameter_reference(type_checker, symbol, span, context),
        _ => Err(error_at(
            ErrorImpl::NotAnExpression {
                name: data.name.clone(),
            },
            span,
        )),
    }
}

fn parameter_of_symbol(list: &TemplateParameterList, symbol: SymbolId) -> Option<(TemplateParameterKey, Option<TypeId>)> {
    list.parameters
        .iter()
        .find(|p| p.symbol == Some(symbol))
        .map(|p| (p.key.clone(), p.value_type))
        .or_else(|| list.enclosing.as_deref().and_then(|e| parameter_of_symbol(e, symbol)))
}

/// A non-type template parameter is its bound value, or a value-dependent
/// expression while checking the template itself.
fn template_parameter_reference(
    type_checker: &mut TypeChecker,
    symbol: SymbolId,
    span: &Span,
    context: &DeclContext,
) -> Result<Nodecl, Error> {
    let list = context.template_parameters.as_ref();
    let parameter = list.and_then(|list| parameter_of_symbol(list, symbol));
    if let (Some(list), Some((key, _))) = (list, &parameter) {
        if let Some(TemplateArgument::Value { value, ty }) = list.lookup(key) {
            return Ok(constant_literal(NodeclKind::IntegerLiteral, value.clone(), *ty, span).with_symbol(symbol));
        }
    }

    let declared = type_checker.symbols.get(symbol).ty;
    let ty = match (declared, parameter.and_then(|(_, ty)| ty)) {
        (TypeId::ERROR, Some(value_type)) => value_type,
        (TypeId::ERROR, None) => type_checker.types.auto(),
        (declared, _) => declared,
    };
    let type_dependent = type_checker.types.is_dependent(ty) || type_checker.types.is_auto(ty);
    Ok(Nodecl::symbol(symbol, ty, span.clone()).with_dependence(type_dependent, true))
}

fn check_type_name(type_checker: &mut TypeChecker, ast: &Ast, _context: &DeclContext) -> Result<Nodecl, Error> {
    let name = match ast.type_ref {
        Some(ty) => type_checker.describe(ty),
        None => ast.text.clone(),
    };
    Err(error_at(ErrorImpl::NotAnExpression { name }, &ast.span))
}

/// Parentheses keep the value category in C++.
fn check_parenthesized(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let inner = type_checker.check_operand(child(ast, 0), context)?;
    let ty = inner.ty();
    let constant = inner.constant().cloned();
    let lvalue = inner.is_lvalue() && type_checker.config.is_cxx();
    let (type_dependent, value_dependent) = (inner.is_type_dependent(), inner.is_value_dependent());
    Ok(Nodecl::new(NodeclKind::Parenthesized, vec![inner], ty, ast.span.clone())
        .with_constant(constant)
        .with_lvalue(lvalue)
        .with_dependence(type_dependent, value_dependent))
}

// Other expressions

/// Checks that `condition` can be tested for truth.
pub fn check_condition(type_checker: &mut TypeChecker, condition: &Nodecl) -> Result<(), Error> {
    let ty = decay(type_checker, condition.ty());
    let scalar = type_checker.types.is_scalar(ty, &type_checker.symbols);
    if scalar || condition.is_type_dependent() {
        return Ok(());
    }
    Err(error_at(
        ErrorImpl::TypeMatchError {
            expected: "scalar condition".to_string(),
            received: type_checker.describe(condition.ty()),
        },
        condition.span(),
    ))
}

/// `c ? a : b`. Arithmetic arms meet in their common type; equal types
/// keep it, as an lvalue when both arms are; a null pointer constant takes
/// the type of the other arm.
fn check_conditional(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let condition = type_checker.check_operand(child(ast, 0), context)?;
    let then = type_checker.check_operand(child(ast, 1), context)?;
    let otherwise = type_checker.check_operand(child(ast, 2), context)?;
    check_condition(type_checker, &condition)?;

    if [&condition, &then, &otherwise].iter().any(|n| n.is_type_dependent()) {
        return Ok(dependent_nodecl(
            type_checker,
            NodeclKind::Conditional,
            vec![condition, then, otherwise],
            &ast.span,
        ));
    }

    let (then_type, else_type) = (then.ty(), otherwise.ty());
    let symbols = &type_checker.symbols;
    let both_arithmetic =
        type_checker.types.is_arithmetic(then_type, symbols) && type_checker.types.is_arithmetic(else_type, symbols);
    let same = type_checker.types.unqualified(then_type) == type_checker.types.unqualified(else_type);

    let (ty, lvalue) = if same {
        let lvalue = then.is_lvalue() && otherwise.is_lvalue() && type_checker.config.is_cxx();
        if lvalue {
            (then_type, true)
        } else {
            (decay(type_checker, then_type), false)
        }
    } else if both_arithmetic {
        (usual_arithmetic_conversions(type_checker, then_type, else_type), false)
    } else {
        let then_source = ConversionSource::of(type_checker, &then);
        let else_source = ConversionSource::of(type_checker, &otherwise);
        let then_decayed = decay(type_checker, then_type);
        let else_decayed = decay(type_checker, else_type);
        if implicit_conversion(type_checker, &else_source, then_decayed).is_some() {
            (then_decayed, false)
        } else if implicit_conversion(type_checker, &then_source, else_decayed).is_some() {
            (else_decayed, false)
        } else {
            return Err(error_at(
                ErrorImpl::OperatorTypeMismatch {
                    operator: "?:".to_string(),
                    operands: type_checker.describe_types(&[then_type, else_type]),
                },
                &ast.span,
            ));
        }
    };

    let then = if lvalue { then } else { convert_to(type_checker, then, ty) };
    let otherwise = if lvalue {
        otherwise
    } else {
        convert_to(type_checker, otherwise, ty)
    };
    let constant = match condition.constant() {
        Some(c) if c.is_nonzero() => then.constant().cloned(),
        Some(_) => otherwise.constant().cloned(),
        None => None,
    };
    Ok(
        Nodecl::new(NodeclKind::Conditional, vec![condition, then, otherwise], ty, ast.span.clone())
            .with_constant(constant)
            .with_lvalue(lvalue),
    )
}

/// `a, b` has the type and, in C++, the value category of `b`.
fn check_comma(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let left = type_checker.check_operand(child(ast, 0), context)?;
    let right = type_checker.check_operand(child(ast, 1), context)?;
    let ty = right.ty();
    let lvalue = right.is_lvalue() && type_checker.config.is_cxx();
    let type_dependent = right.is_type_dependent();
    Ok(Nodecl::new(NodeclKind::Comma, vec![left, right], ty, ast.span.clone())
        .with_lvalue(lvalue)
        .with_dependence(type_dependent, type_dependent))
}

/// Explicit conversions: any implicit one, plus arithmetic, pointer and
/// integer reinterpretations, class up and down casts and casts to `void`.
fn cast_allowed(type_checker: &mut TypeChecker, source: &ConversionSource, target: TypeId) -> bool {
    if implicit_conversion(type_checker, source, target).is_some() {
        return true;
    }
    let from = decay(type_checker, source.ty);
    let no_ref = type_checker.types.no_ref(target);
    let to = type_checker.types.unqualified(no_ref);
    let types = &type_checker.types;
    let symbols = &type_checker.symbols;
    let pointer_like = |ty: TypeId| types.is_pointer(ty) || types.is_integral(ty, symbols);
    let related_classes = match (types.named_symbol(from), types.named_symbol(to)) {
        (Some(a), Some(b)) if types.is_class(from, symbols) => {
            symbols.is_derived_from(a, b) || symbols.is_derived_from(b, a)
        }
        _ => false,
    };
    types.is_void(to)
        || (types.is_arithmetic(from, symbols) && types.is_arithmetic(to, symbols))
        || (pointer_like(from) && pointer_like(to) && (types.is_pointer(from) || types.is_pointer(to)))
        || related_classes
}

fn check_cast(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let Some(target) = ast.type_ref else {
        internal_error!("cast without a resolved target type");
    };
    let operand = type_checker.check_operand(child(ast, 0), context)?;
    if operand.is_type_dependent() || type_checker.types.is_dependent(target) {
        return Ok(dependent_nodecl(type_checker, NodeclKind::Cast, vec![operand], &ast.span));
    }

    let source = ConversionSource::of(type_checker, &operand);
    if !cast_allowed(type_checker, &source, target) {
        return Err(error_at(
            ErrorImpl::TypeMatchError {
                expected: type_checker.describe(target),
                received: type_checker.describe(operand.ty()),
            },
            &ast.span,
        ));
    }

    let lvalue = type_checker.types.is_lvalue_reference(target);
    let no_ref = type_checker.types.no_ref(target);
    let ty = if lvalue { no_ref } else { type_checker.types.unqualified(no_ref) };
    let constant = if type_checker.types.is_arithmetic(ty, &type_checker.symbols) {
        operand
            .constant()
            .and_then(|value| convert_scalar_constant(type_checker, value, ty))
    } else {
        None
    };
    Ok(Nodecl::new(NodeclKind::Cast, vec![operand], ty, ast.span.clone())
        .with_constant(constant)
        .with_lvalue(lvalue))
}

/// `sizeof expr` or `sizeof(type)`: a `size_t` constant.
fn check_sizeof(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let operand = child(ast, 0);
    let (measured, children) = match (operand.kind, operand.type_ref) {
        (AstKind::TypeName, Some(ty)) => (ty, vec![]),
        _ => {
            let value = type_checker.check_operand(operand, context)?;
            if value.is_type_dependent() {
                return Ok(dependent_nodecl(type_checker, NodeclKind::Sizeof, vec![value], &ast.span));
            }
            (value.ty(), vec![value])
        }
    };
    let size_t = type_checker.types.integer(8, false);
    let measured = type_checker.types.no_ref(measured);
    if type_checker.types.is_dependent(measured) {
        return Ok(Nodecl::new(NodeclKind::Sizeof, children, size_t, ast.span.clone()).with_dependence(false, true));
    }
    let Some(size) = type_checker.types.size_of(measured) else {
        return Err(error_at(
            ErrorImpl::TypeMatchError {
                expected: "complete object type".to_string(),
                received: type_checker.describe(measured),
            },
            &ast.span,
        ));
    };
    Ok(Nodecl::new(NodeclKind::Sizeof, children, size_t, ast.span.clone())
        .with_constant(Some(ConstValue::int(size as i128, 8, false))))
}

/// Checked elements of a braced list and the sequence type that stands for
/// them during `auto` deduction.
fn braced_elements(
    type_checker: &mut TypeChecker,
    ast: &Ast,
    context: &DeclContext,
) -> Result<(Vec<Nodecl>, TypeId), Error> {
    let mut elements = vec![];
    for element in &ast.children {
        elements.push(type_checker.check_operand(element, context)?);
    }
    let types: Vec<TypeId> = elements.iter().map(Nodecl::ty).collect();
    let sequence = type_checker.types.sequence(types);
    Ok((elements, sequence))
}

/// A braced list in expression position is a `std::initializer_list`.
fn check_braced_initializer(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let (elements, sequence) = braced_elements(type_checker, ast, context)?;
    if elements.iter().any(Nodecl::is_type_dependent) {
        return Ok(dependent_nodecl(type_checker, NodeclKind::StructuredValue, elements, &ast.span));
    }
    let auto = type_checker.types.auto();
    let Some(ty) = deduce_auto(type_checker, auto, &CallArgument::rvalue(sequence), true) else {
        let types: Vec<TypeId> = elements.iter().map(Nodecl::ty).collect();
        return Err(error_at(
            ErrorImpl::TypeMatchError {
                expected: "elements of one type".to_string(),
                received: type_checker.describe_types(&types),
            },
            &ast.span,
        ));
    };
    let constant = elements
        .iter()
        .map(|e| e.constant().cloned())
        .collect::<Option<Vec<_>>>()
        .map(ConstValue::array);
    Ok(Nodecl::new(NodeclKind::StructuredValue, elements, ty, ast.span.clone()).with_constant(constant))
}

/// Type of a variable declared with a placeholder (`auto`, `const auto&`,
/// `auto*`) from its initializer.
pub fn deduce_variable_type(
    type_checker: &mut TypeChecker,
    declared: TypeId,
    initializer: &Ast,
    context: &DeclContext,
) -> Result<TypeId, Error> {
    let braced = initializer.kind == AstKind::BracedInitializer;
    let (argument, received) = if braced {
        let (elements, sequence) = braced_elements(type_checker, initializer, context)?;
        let types: Vec<TypeId> = elements.iter().map(Nodecl::ty).collect();
        (CallArgument::rvalue(sequence), type_checker.describe_types(&types))
    } else {
        let value = type_checker.check_operand(initializer, context)?;
        let argument = CallArgument {
            ty: value.ty(),
            is_lvalue: value.is_lvalue(),
        };
        (argument, type_checker.describe(value.ty()))
    };
    deduce_auto(type_checker, declared, &argument, braced).ok_or_else(|| {
        error_at(
            ErrorImpl::TypeMatchError {
                expected: type_checker.describe(declared),
                received,
            },
            &initializer.span,
        )
    })
}
