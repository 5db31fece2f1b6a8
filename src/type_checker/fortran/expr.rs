use tracing::trace;

use crate::{
    ast::ast::{Ast, AstKind},
    const_value::const_value::{ConstValue, FloatPrecision},
    errors::errors::{Error, ErrorImpl},
    internal_error,
    nodecl::{
        list::NodeclList,
        nodecl::{Nodecl, NodeclKind},
    },
    symbols::{
        scope::{DeclContext, QueryFlags},
        symbols::{SymbolId, SymbolKind},
    },
    type_checker::type_checker::{already_reported, convert_constant, error_at, Handler, TypeChecker},
    types::types::{ArrayBound, TypeId, TypeKind},
    Span,
};

use super::{arrays, assignment, calls, operators, structures};

/// Handlers of the Fortran dialect, one per expression kind.
pub fn handlers() -> Vec<(AstKind, Handler)> {
    let mut handlers: Vec<(AstKind, Handler)> = vec![
        (AstKind::IntegerLiteral, check_integer_literal as Handler),
        (AstKind::FloatingLiteral, check_real_literal as Handler),
        (AstKind::ComplexLiteral, check_complex_literal as Handler),
        (AstKind::BooleanLiteral, check_logical_literal as Handler),
        (AstKind::StringLiteral, check_character_literal as Handler),
        (AstKind::Symbol, check_symbol as Handler),
        (AstKind::Parenthesized, check_parenthesized as Handler),
        (AstKind::FunctionCall, calls::check_function_call as Handler),
        (AstKind::ArraySubscript, arrays::check_array_subscript as Handler),
        (AstKind::ArrayConstructor, arrays::check_array_constructor as Handler),
        (AstKind::ComponentReference, structures::check_component_reference as Handler),
        (AstKind::Assignment, assignment::check_assignment as Handler),
    ];
    for kind in operators::BINARY_OPERATORS {
        handlers.push((*kind, operators::check_binary_operator as Handler));
    }
    for kind in operators::UNARY_OPERATORS {
        handlers.push((*kind, operators::check_unary_operator as Handler));
    }
    handlers
}

/// Child `index` of a node whose arity the parser guarantees.
pub fn child(ast: &Ast, index: usize) -> &Ast {
    match ast.children.get(index) {
        Some(child) => child,
        None => internal_error!("{:?} node without child {}", ast.kind, index),
    }
}

pub fn find_symbol(type_checker: &TypeChecker, name: &str, context: &DeclContext) -> Option<SymbolId> {
    type_checker
        .symbols
        .lookup(context.current_scope, name, QueryFlags::NONE)
        .first()
        .copied()
}

/// Alternative of a call-or-subscript node whose diagnostics are shown
/// when no alternative checks: the subscript when the name is a declared
/// array or character variable, the call otherwise.
pub fn failed_interpretation(type_checker: &TypeChecker, ast: &Ast, context: &DeclContext) -> usize {
    let subscript = ast.children.iter().position(|a| a.kind == AstKind::ArraySubscript);
    let names_data = |alternative: &Ast| {
        let Some(base) = alternative.children.first().filter(|base| base.kind == AstKind::Symbol) else {
            return false;
        };
        find_symbol(type_checker, &base.text, context).is_some_and(|symbol| {
            let data = type_checker.symbols.get(type_checker.symbols.resolve(symbol));
            data.kind == SymbolKind::Variable
                && (type_checker.types.rank(data.ty) > 0 || type_checker.types.is_fortran_character(data.ty))
        })
    };
    match subscript {
        Some(index) if names_data(&ast.children[index]) => index,
        _ => 0,
    }
}

/// Declares an undeclared variable with the type its first letter implies.
pub fn declare_implicit(type_checker: &mut TypeChecker, name: &str, context: &DeclContext) -> SymbolId {
    let ty = type_checker.implicit_type(name);
    let symbol = type_checker
        .symbols
        .new_symbol(context.current_scope, name, SymbolKind::Variable);
    let data = type_checker.symbols.get_mut(symbol);
    data.ty = ty;
    data.defined = true;
    data.specs.is_implicit = true;
    trace!("implicitly declared `{}`", name);
    symbol
}

/// Builds a literal node for a folded value of type `ty`.
pub fn constant_nodecl(type_checker: &TypeChecker, value: ConstValue, ty: TypeId, span: &Span) -> Nodecl {
    let types = &type_checker.types;
    let kind = if types.rank(ty) > 0 {
        NodeclKind::StructuredValue
    } else if types.is_fortran_character(ty) {
        NodeclKind::StringLiteral
    } else if types.is_integer(ty) {
        NodeclKind::IntegerLiteral
    } else if types.is_floating(ty) {
        NodeclKind::FloatingLiteral
    } else if types.is_complex(ty) {
        NodeclKind::ComplexLiteral
    } else if types.is_bool(ty) {
        NodeclKind::BooleanLiteral
    } else {
        NodeclKind::StructuredValue
    };
    let text = value.to_string();
    Nodecl::new(kind, vec![], ty, span.clone())
        .with_text(&text)
        .with_constant(Some(value))
}

/// An empty node standing for an omitted optional argument or bound.
pub fn absent(type_checker: &mut TypeChecker, span: &Span) -> Nodecl {
    let void = type_checker.types.void();
    NodeclList::new().into_nodecl(void, span.clone())
}

pub fn is_absent(nodecl: &Nodecl) -> bool {
    nodecl.kind() == NodeclKind::List && nodecl.children().is_empty()
}

/// Converts `operand` elementwise to the scalar type `target`, keeping its
/// shape. Nothing is inserted when the scalar types already agree.
pub fn convert_to(type_checker: &mut TypeChecker, operand: Nodecl, target: TypeId) -> Nodecl {
    let scalar = type_checker.types.rank0(operand.ty());
    if scalar == target {
        return operand;
    }
    let ty = type_checker.types.rebuild_array(target, operand.ty());
    let constant = operand
        .constant()
        .and_then(|value| convert_constant(&type_checker.types, value, ty));
    let span = operand.span().clone();
    Nodecl::new(NodeclKind::Conversion, vec![operand], ty, span).with_constant(constant)
}

/// Dereferences a pointer-typed reference; other nodes are returned as is.
pub fn dereference(type_checker: &TypeChecker, reference: Nodecl) -> Nodecl {
    match type_checker.types.pointer_pointee(reference.ty()) {
        Some(pointee) => {
            let span = reference.span().clone();
            Nodecl::new(NodeclKind::Dereference, vec![reference], pointee, span).with_lvalue(true)
        }
        None => reference,
    }
}

pub fn float_precision(type_checker: &TypeChecker, ty: TypeId) -> Option<FloatPrecision> {
    match type_checker.types.kind(type_checker.types.rank0(ty)) {
        TypeKind::Float(precision) => Some(*precision),
        TypeKind::Complex(base) => match type_checker.types.kind(*base) {
            TypeKind::Float(precision) => Some(*precision),
            _ => None,
        },
        _ => None,
    }
}

// Literals

fn split_kind(text: &str) -> (&str, Option<&str>) {
    match text.split_once('_') {
        Some((digits, kind)) => (digits, Some(kind)),
        None => (text, None),
    }
}

/// Value of a `_kind` suffix: digits or the name of an integer constant.
fn kind_parameter(type_checker: &TypeChecker, kind: &str, context: &DeclContext, span: &Span) -> Result<u8, Error> {
    let value = match kind.parse::<i64>() {
        Ok(value) => Some(value),
        Err(_) => find_symbol(type_checker, kind, context)
            .map(|symbol| type_checker.symbols.get(symbol))
            .filter(|data| data.specs.is_parameter)
            .and_then(|data| data.value.as_ref())
            .and_then(|value| value.constant())
            .and_then(ConstValue::as_i64),
    };
    match value {
        Some(value) => u8::try_from(value)
            .ok()
            .filter(|kind| *kind > 0)
            .ok_or_else(|| error_at(ErrorImpl::InvalidKind { kind: value }, span)),
        None => Err(error_at(
            ErrorImpl::NotConstant {
                name: kind.to_string(),
            },
            span,
        )),
    }
}

pub fn is_integer_kind(kind: u8) -> bool {
    matches!(kind, 1 | 2 | 4 | 8 | 16)
}

fn check_integer_literal(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let (digits, kind) = split_kind(&ast.text);
    let kind = match kind {
        Some(kind) => kind_parameter(type_checker, kind, context, &ast.span)?,
        None => type_checker.config.default_integer_kind,
    };
    if !is_integer_kind(kind) {
        return Err(error_at(ErrorImpl::InvalidKind { kind: kind as i64 }, &ast.span));
    }

    let parse_error = || {
        error_at(
            ErrorImpl::NumberParseError {
                token: ast.text.clone(),
            },
            &ast.span,
        )
    };
    let value: i128 = digits.parse().map_err(|_| parse_error())?;
    let max = if kind >= 16 {
        i128::MAX
    } else {
        (1i128 << (kind as u32 * 8 - 1)) - 1
    };
    if value > max {
        return Err(parse_error());
    }

    let ty = type_checker.types.fortran_integer(kind);
    Ok(constant_nodecl(type_checker, ConstValue::int(value, kind, true), ty, &ast.span))
}

fn check_real_literal(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let (mantissa, kind) = split_kind(&ast.text);
    let kind = match kind {
        Some(kind) => kind_parameter(type_checker, kind, context, &ast.span)?,
        None if mantissa.contains('d') => type_checker.config.double_precision_kind,
        None => type_checker.config.default_real_kind,
    };
    let Some(ty) = type_checker.types.fortran_real(kind) else {
        return Err(error_at(ErrorImpl::InvalidKind { kind: kind as i64 }, &ast.span));
    };

    let value: f64 = mantissa.replace('d', "e").parse().map_err(|_| {
        error_at(
            ErrorImpl::NumberParseError {
                token: ast.text.clone(),
            },
            &ast.span,
        )
    })?;
    let precision = float_precision(type_checker, ty).unwrap_or(FloatPrecision::Float);
    Ok(constant_nodecl(type_checker, ConstValue::float(value, precision), ty, &ast.span))
}

/// `(re, im)`: both parts are integer or real constants; the kind is the
/// largest real kind among them.
fn check_complex_literal(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let real = type_checker.check_operand(child(ast, 0), context)?;
    let imag = type_checker.check_operand(child(ast, 1), context)?;

    let mut kind = None;
    for part in [&real, &imag] {
        let ty = part.ty();
        if type_checker.types.rank(ty) != 0
            || !(type_checker.types.is_integer(ty) || type_checker.types.is_floating(ty))
        {
            return Err(error_at(
                ErrorImpl::TypeMatchError {
                    expected: "integer or real".to_string(),
                    received: type_checker.describe(ty),
                },
                part.span(),
            ));
        }
        if !part.is_constant() {
            return Err(error_at(
                ErrorImpl::NotConstant {
                    name: "complex literal part".to_string(),
                },
                part.span(),
            ));
        }
        if type_checker.types.is_floating(ty) {
            kind = kind.max(type_checker.types.fortran_kind(ty));
        }
    }

    let kind = kind.unwrap_or(type_checker.config.default_real_kind);
    let Some(ty) = type_checker.types.fortran_complex(kind) else {
        return Err(error_at(ErrorImpl::InvalidKind { kind: kind as i64 }, &ast.span));
    };
    let value = real
        .constant()
        .zip(imag.constant())
        .and_then(|(re, im)| ConstValue::complex(re.clone(), im.clone()).cast_to_complex(FloatPrecision::from_bytes(kind)?));
    Ok(Nodecl::new(NodeclKind::ComplexLiteral, vec![real, imag], ty, ast.span.clone()).with_constant(value))
}

fn check_logical_literal(type_checker: &mut TypeChecker, ast: &Ast, _context: &DeclContext) -> Result<Nodecl, Error> {
    let ty = type_checker.default_logical();
    let truth = ConstValue::truth(ast.text == "true");
    let value = convert_constant(&type_checker.types, &truth, ty).unwrap_or(truth);
    Ok(constant_nodecl(type_checker, value, ty, &ast.span))
}

fn check_character_literal(type_checker: &mut TypeChecker, ast: &Ast, _context: &DeclContext) -> Result<Nodecl, Error> {
    let length = ast.text.chars().count() as i64;
    let ty = type_checker.default_character(ArrayBound::Known(length));
    let value = ConstValue::string(&ast.text, type_checker.config.default_character_kind);
    Ok(constant_nodecl(type_checker, value, ty, &ast.span))
}

// Names

fn check_symbol(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let symbol = match find_symbol(type_checker, &ast.text, context) {
        Some(symbol) => symbol,
        None if type_checker.implicit_typing => declare_implicit(type_checker, &ast.text, context),
        None => {
            return Err(error_at(
                ErrorImpl::SymbolNotDeclared {
                    name: ast.text.clone(),
                },
                &ast.span,
            ))
        }
    };
    symbol_reference(type_checker, symbol, &ast.span)
}

/// A use of a named entity. Named constants carry their value and are not
/// definable; pointers are dereferenced.
pub fn symbol_reference(type_checker: &TypeChecker, symbol: SymbolId, span: &Span) -> Result<Nodecl, Error> {
    let symbol = type_checker.symbols.resolve(symbol);
    let data = type_checker.symbols.get(symbol);
    match data.kind {
        SymbolKind::Variable | SymbolKind::Function if data.ty == TypeId::ERROR => Err(already_reported(span)),
        SymbolKind::Variable if data.specs.is_parameter => {
            let constant = data.value.as_ref().and_then(|value| value.constant()).cloned();
            Ok(Nodecl::symbol(symbol, data.ty, span.clone()).with_constant(constant))
        }
        SymbolKind::Variable => {
            let reference = Nodecl::symbol(symbol, data.ty, span.clone()).with_lvalue(true);
            if data.specs.is_pointer {
                return Ok(dereference(type_checker, reference));
            }
            Ok(reference)
        }
        SymbolKind::Function => Ok(Nodecl::symbol(symbol, data.ty, span.clone())),
        _ => Err(error_at(
            ErrorImpl::NotAnExpression {
                name: data.name.clone(),
            },
            span,
        )),
    }
}

fn check_parenthesized(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let inner = type_checker.check_operand(child(ast, 0), context)?;
    let ty = inner.ty();
    let constant = inner.constant().cloned();
    Ok(Nodecl::new(NodeclKind::Parenthesized, vec![inner], ty, ast.span.clone()).with_constant(constant))
}
