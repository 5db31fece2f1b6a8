//! Intrinsic procedures.
//!
//! Each entry checks its arguments and computes the result type; entries
//! with a simplifier fold references whose arguments are constant.

use std::cmp::Ordering;

use lazy_static::lazy_static;
use tracing::trace;

use crate::{
    const_value::const_value::ConstValue,
    errors::errors::{Error, ErrorImpl},
    internal_error,
    nodecl::nodecl::{Nodecl, NodeclKind},
    symbols::{
        scope::ScopeId,
        symbols::{SymbolId, SymbolKind},
    },
    type_checker::type_checker::{convert_constant, error_at, TypeChecker},
    types::types::{TypeId, TypeKind, TypeTable},
    Span,
};

use super::{
    arrays::flatten_constant,
    calls::{self, ActualArgument},
    expr::{absent, constant_nodecl, is_integer_kind},
};

/// Checks the arguments of a reference and returns the scalar result type.
type ResultType = fn(&mut TypeChecker, &[Option<Nodecl>], &Span) -> Result<TypeId, Error>;

/// Folds a reference given its arguments and its result type.
type Simplifier = fn(&TypeTable, &[Option<Nodecl>], TypeId) -> Option<ConstValue>;

pub struct Intrinsic {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    /// Number of leading arguments that must be present.
    pub required: usize,
    pub elemental: bool,
    /// Extra positional arguments are accepted (`max`, `min`).
    pub variadic: bool,
    result: ResultType,
    simplify: Option<Simplifier>,
}

fn intrinsic(
    name: &'static str,
    keywords: &'static [&'static str],
    required: usize,
    elemental: bool,
    result: ResultType,
    simplify: Option<Simplifier>,
) -> Intrinsic {
    Intrinsic {
        name,
        keywords,
        required,
        elemental,
        variadic: false,
        result,
        simplify,
    }
}

fn variadic(mut intrinsic: Intrinsic) -> Intrinsic {
    intrinsic.variadic = true;
    intrinsic
}

lazy_static! {
    pub static ref INTRINSICS: Vec<Intrinsic> = vec![
        intrinsic("abs", &["a"], 1, true, abs_result, Some(simplify_abs)),
        intrinsic("sqrt", &["x"], 1, true, real_or_complex_result, Some(simplify_sqrt)),
        intrinsic("exp", &["x"], 1, true, real_or_complex_result, Some(simplify_exp)),
        intrinsic("sin", &["x"], 1, true, real_or_complex_result, Some(simplify_sin)),
        intrinsic("cos", &["x"], 1, true, real_or_complex_result, Some(simplify_cos)),
        intrinsic("mod", &["a", "p"], 2, true, mod_result, Some(simplify_mod)),
        variadic(intrinsic("max", &["a1", "a2"], 2, true, extremum_result, Some(simplify_max))),
        variadic(intrinsic("min", &["a1", "a2"], 2, true, extremum_result, Some(simplify_min))),
        intrinsic("int", &["a", "kind"], 1, true, int_result, Some(simplify_conversion)),
        intrinsic("real", &["a", "kind"], 1, true, real_result, Some(simplify_conversion)),
        intrinsic("dble", &["a"], 1, true, dble_result, Some(simplify_conversion)),
        intrinsic("nint", &["a", "kind"], 1, true, nint_result, Some(simplify_nint)),
        intrinsic("len", &["string"], 1, false, len_result, Some(simplify_len)),
        intrinsic("kind", &["x"], 1, false, kind_result, Some(simplify_kind)),
        intrinsic("size", &["array", "dim"], 1, false, size_result, Some(simplify_size)),
        intrinsic("sum", &["array"], 1, false, sum_result, Some(simplify_sum)),
        intrinsic("present", &["a"], 1, false, present_result, None),
    ];
}

pub fn find_intrinsic(name: &str) -> Option<usize> {
    INTRINSICS.iter().position(|intrinsic| intrinsic.name == name)
}

/// The symbol standing for intrinsic `name`, created on first use. It is
/// not visible to name lookup.
pub fn intrinsic_symbol(type_checker: &mut TypeChecker, name: &str) -> Option<SymbolId> {
    let index = find_intrinsic(name)?;
    if let Some(symbol) = type_checker.intrinsic_symbols.get(name) {
        return Some(*symbol);
    }

    let void = type_checker.types.void();
    let ty = type_checker.types.unprototyped_function(void);
    let symbol = type_checker
        .symbols
        .new_detached_symbol(ScopeId::GLOBAL, name, SymbolKind::Function);
    let data = type_checker.symbols.get_mut(symbol);
    data.ty = ty;
    data.defined = true;
    data.specs.is_builtin = true;
    data.specs.is_elemental = INTRINSICS[index].elemental;
    data.specs.intrinsic = Some(index);
    type_checker.intrinsic_symbols.insert(name.to_string(), symbol);
    Some(symbol)
}

pub fn check_intrinsic_call(
    type_checker: &mut TypeChecker,
    symbol: SymbolId,
    arguments: &[ActualArgument],
    span: &Span,
) -> Result<Nodecl, Error> {
    let Some(index) = type_checker.symbols.get(symbol).specs.intrinsic else {
        internal_error!("`{}` is not an intrinsic", type_checker.symbols.get(symbol).name);
    };
    let intrinsic = &INTRINSICS[index];

    let keywords: Vec<String> = intrinsic.keywords.iter().map(|k| k.to_string()).collect();
    let slots = calls::associate_keywords(intrinsic.name, &keywords, arguments, intrinsic.variadic, span)?;
    for (keyword, slot) in keywords.iter().zip(&slots).take(intrinsic.required) {
        if slot.is_none() {
            return Err(error_at(
                ErrorImpl::MissingArgument {
                    procedure: intrinsic.name.to_string(),
                    parameter: keyword.clone(),
                },
                span,
            ));
        }
    }
    let values: Vec<Option<Nodecl>> = slots.into_iter().map(|slot| slot.map(|a| a.value)).collect();

    let scalar = (intrinsic.result)(type_checker, &values, span)?;
    let ty = if intrinsic.elemental {
        let present: Vec<Nodecl> = values.iter().flatten().cloned().collect();
        match calls::elemental_shape(type_checker, intrinsic.name, &present, span)? {
            Some(shape) => type_checker.types.rebuild_array(scalar, shape),
            None => scalar,
        }
    } else {
        scalar
    };

    if let Some(simplify) = intrinsic.simplify {
        let folded = simplify(&type_checker.types, &values, ty).and_then(|v| convert_constant(&type_checker.types, &v, ty));
        if let Some(value) = folded {
            trace!("simplified `{}` to {}", intrinsic.name, value);
            return Ok(constant_nodecl(type_checker, value, ty, span));
        }
    }

    let function_type = type_checker.symbols.get(symbol).ty;
    let mut call_arguments = vec![];
    for value in values {
        match value {
            Some(value) => call_arguments.push(value),
            None => call_arguments.push(absent(type_checker, span)),
        }
    }
    Ok(calls::call_nodecl(type_checker, symbol, function_type, call_arguments, ty, span))
}

// Argument checks

fn argument(values: &[Option<Nodecl>], index: usize) -> Option<&Nodecl> {
    values.get(index).and_then(Option::as_ref)
}

fn required_argument<'a>(values: &'a [Option<Nodecl>], index: usize, span: &Span) -> Result<&'a Nodecl, Error> {
    match argument(values, index) {
        Some(value) => Ok(value),
        None => Err(error_at(
            ErrorImpl::MissingArgument {
                procedure: "intrinsic".to_string(),
                parameter: format!("#{}", index + 1),
            },
            span,
        )),
    }
}

fn argument_error(type_checker: &TypeChecker, parameter: &str, expected: &str, value: &Nodecl) -> Error {
    error_at(
        ErrorImpl::ArgumentTypeMatchError {
            parameter: parameter.to_string(),
            expected: expected.to_string(),
            received: type_checker.describe(value.ty()),
        },
        value.span(),
    )
}

/// Scalar type of argument `index` after checking it with `accepts`.
fn scalar_argument(
    type_checker: &TypeChecker,
    values: &[Option<Nodecl>],
    index: usize,
    parameter: &str,
    expected: &str,
    accepts: fn(&TypeTable, TypeId) -> bool,
    span: &Span,
) -> Result<TypeId, Error> {
    let value = required_argument(values, index, span)?;
    let scalar = type_checker.types.rank0(value.ty());
    if !accepts(&type_checker.types, scalar) {
        return Err(argument_error(type_checker, parameter, expected, value));
    }
    Ok(scalar)
}

/// A constant `kind=` argument.
fn kind_argument(values: &[Option<Nodecl>], index: usize) -> Result<Option<u8>, Error> {
    let Some(value) = argument(values, index) else {
        return Ok(None);
    };
    match value.constant().and_then(ConstValue::as_i64) {
        Some(kind) => u8::try_from(kind)
            .ok()
            .map(Some)
            .ok_or_else(|| error_at(ErrorImpl::InvalidKind { kind }, value.span())),
        None => Err(error_at(
            ErrorImpl::NotConstant {
                name: "kind".to_string(),
            },
            value.span(),
        )),
    }
}

fn integer_of_kind(type_checker: &mut TypeChecker, kind: Option<u8>, span: &Span) -> Result<TypeId, Error> {
    match kind {
        None => Ok(type_checker.default_integer()),
        Some(kind) if is_integer_kind(kind) => Ok(type_checker.types.fortran_integer(kind)),
        Some(kind) => Err(error_at(ErrorImpl::InvalidKind { kind: kind as i64 }, span)),
    }
}

fn real_of_kind(type_checker: &mut TypeChecker, kind: u8, span: &Span) -> Result<TypeId, Error> {
    type_checker
        .types
        .fortran_real(kind)
        .ok_or_else(|| error_at(ErrorImpl::InvalidKind { kind: kind as i64 }, span))
}

// Result types

fn abs_result(type_checker: &mut TypeChecker, values: &[Option<Nodecl>], span: &Span) -> Result<TypeId, Error> {
    let scalar = scalar_argument(type_checker, values, 0, "a", "numeric", TypeTable::is_fortran_numeric, span)?;
    Ok(type_checker.types.complex_base(scalar).unwrap_or(scalar))
}

fn real_or_complex_result(type_checker: &mut TypeChecker, values: &[Option<Nodecl>], span: &Span) -> Result<TypeId, Error> {
    scalar_argument(
        type_checker,
        values,
        0,
        "x",
        "real or complex",
        |types, ty| types.is_floating(ty) || types.is_complex(ty),
        span,
    )
}

fn is_integer_or_real(types: &TypeTable, ty: TypeId) -> bool {
    types.is_integer(ty) || types.is_floating(ty)
}

fn mod_result(type_checker: &mut TypeChecker, values: &[Option<Nodecl>], span: &Span) -> Result<TypeId, Error> {
    let a = scalar_argument(type_checker, values, 0, "a", "integer or real", is_integer_or_real, span)?;
    let p = scalar_argument(type_checker, values, 1, "p", "integer or real", is_integer_or_real, span)?;
    if a != p {
        let value = required_argument(values, 1, span)?;
        return Err(argument_error(type_checker, "p", &type_checker.describe(a), value));
    }
    Ok(a)
}

fn extremum_result(type_checker: &mut TypeChecker, values: &[Option<Nodecl>], span: &Span) -> Result<TypeId, Error> {
    let first = scalar_argument(type_checker, values, 0, "a1", "integer or real", is_integer_or_real, span)?;
    for (index, value) in values.iter().enumerate().skip(1) {
        let Some(value) = value else { continue };
        if type_checker.types.rank0(value.ty()) != first {
            let parameter = format!("a{}", index + 1);
            return Err(argument_error(type_checker, &parameter, &type_checker.describe(first), value));
        }
    }
    Ok(first)
}

fn int_result(type_checker: &mut TypeChecker, values: &[Option<Nodecl>], span: &Span) -> Result<TypeId, Error> {
    scalar_argument(type_checker, values, 0, "a", "numeric", TypeTable::is_fortran_numeric, span)?;
    let kind = kind_argument(values, 1)?;
    integer_of_kind(type_checker, kind, span)
}

fn real_result(type_checker: &mut TypeChecker, values: &[Option<Nodecl>], span: &Span) -> Result<TypeId, Error> {
    let scalar = scalar_argument(type_checker, values, 0, "a", "numeric", TypeTable::is_fortran_numeric, span)?;
    let kind = match kind_argument(values, 1)? {
        Some(kind) => kind,
        None if type_checker.types.is_complex(scalar) => type_checker
            .types
            .fortran_kind(scalar)
            .unwrap_or(type_checker.config.default_real_kind),
        None => type_checker.config.default_real_kind,
    };
    real_of_kind(type_checker, kind, span)
}

fn dble_result(type_checker: &mut TypeChecker, values: &[Option<Nodecl>], span: &Span) -> Result<TypeId, Error> {
    scalar_argument(type_checker, values, 0, "a", "numeric", TypeTable::is_fortran_numeric, span)?;
    let kind = type_checker.config.double_precision_kind;
    real_of_kind(type_checker, kind, span)
}

fn nint_result(type_checker: &mut TypeChecker, values: &[Option<Nodecl>], span: &Span) -> Result<TypeId, Error> {
    scalar_argument(type_checker, values, 0, "a", "real", TypeTable::is_floating, span)?;
    let kind = kind_argument(values, 1)?;
    integer_of_kind(type_checker, kind, span)
}

fn len_result(type_checker: &mut TypeChecker, values: &[Option<Nodecl>], span: &Span) -> Result<TypeId, Error> {
    scalar_argument(type_checker, values, 0, "string", "character", TypeTable::is_fortran_character, span)?;
    Ok(type_checker.default_integer())
}

fn kind_result(type_checker: &mut TypeChecker, values: &[Option<Nodecl>], span: &Span) -> Result<TypeId, Error> {
    scalar_argument(
        type_checker,
        values,
        0,
        "x",
        "intrinsic type",
        |types, ty| types.fortran_kind(ty).is_some(),
        span,
    )?;
    Ok(type_checker.default_integer())
}

fn size_result(type_checker: &mut TypeChecker, values: &[Option<Nodecl>], span: &Span) -> Result<TypeId, Error> {
    let array = required_argument(values, 0, span)?;
    if type_checker.types.rank(array.ty()) == 0 {
        return Err(argument_error(type_checker, "array", "array", array));
    }
    if let Some(dim) = argument(values, 1) {
        if !type_checker.types.is_integer(dim.ty()) {
            return Err(argument_error(type_checker, "dim", "integer", dim));
        }
    }
    Ok(type_checker.default_integer())
}

fn sum_result(type_checker: &mut TypeChecker, values: &[Option<Nodecl>], span: &Span) -> Result<TypeId, Error> {
    let array = required_argument(values, 0, span)?;
    let scalar = type_checker.types.rank0(array.ty());
    if type_checker.types.rank(array.ty()) == 0 || !type_checker.types.is_fortran_numeric(scalar) {
        return Err(argument_error(type_checker, "array", "numeric array", array));
    }
    Ok(scalar)
}

/// `present(a)`: `a` must name an optional dummy argument.
fn present_result(type_checker: &mut TypeChecker, values: &[Option<Nodecl>], span: &Span) -> Result<TypeId, Error> {
    let value = required_argument(values, 0, span)?;
    let mut named = value;
    while named.kind() == NodeclKind::Dereference {
        match named.child(0) {
            Some(inner) => named = inner,
            None => break,
        }
    }
    let optional = named.kind() == NodeclKind::Symbol
        && named
            .get_symbol()
            .is_some_and(|symbol| type_checker.symbols.get(symbol).specs.is_optional);
    if !optional {
        return Err(argument_error(type_checker, "a", "optional dummy argument", value));
    }
    Ok(type_checker.default_logical())
}

// Simplifiers

fn constant_argument(values: &[Option<Nodecl>], index: usize) -> Option<&ConstValue> {
    argument(values, index)?.constant()
}

fn map_elements(value: &ConstValue, f: &dyn Fn(&ConstValue) -> Option<ConstValue>) -> Option<ConstValue> {
    match value {
        ConstValue::Array { elements } => elements
            .iter()
            .map(|element| map_elements(element, f))
            .collect::<Option<Vec<_>>>()
            .map(ConstValue::array),
        _ => f(value),
    }
}

fn simplify_abs(_types: &TypeTable, values: &[Option<Nodecl>], _ty: TypeId) -> Option<ConstValue> {
    map_elements(constant_argument(values, 0)?, &|value| match value {
        ConstValue::Complex { real, imag } => {
            let ConstValue::Floating { precision, .. } = real.as_ref() else {
                return None;
            };
            Some(ConstValue::float(real.as_f64()?.hypot(imag.as_f64()?), *precision))
        }
        _ if value.as_f64()? < 0.0 => value.neg(),
        _ => Some(value.clone()),
    })
}

fn real_function(values: &[Option<Nodecl>], f: fn(f64) -> f64) -> Option<ConstValue> {
    map_elements(constant_argument(values, 0)?, &|value| match value {
        ConstValue::Floating { value, precision } => {
            let result = f(*value);
            result.is_finite().then(|| ConstValue::float(result, *precision))
        }
        _ => None,
    })
}

fn simplify_sqrt(_types: &TypeTable, values: &[Option<Nodecl>], _ty: TypeId) -> Option<ConstValue> {
    real_function(values, f64::sqrt)
}

fn simplify_exp(_types: &TypeTable, values: &[Option<Nodecl>], _ty: TypeId) -> Option<ConstValue> {
    real_function(values, f64::exp)
}

fn simplify_sin(_types: &TypeTable, values: &[Option<Nodecl>], _ty: TypeId) -> Option<ConstValue> {
    real_function(values, f64::sin)
}

fn simplify_cos(_types: &TypeTable, values: &[Option<Nodecl>], _ty: TypeId) -> Option<ConstValue> {
    real_function(values, f64::cos)
}

fn simplify_mod(_types: &TypeTable, values: &[Option<Nodecl>], _ty: TypeId) -> Option<ConstValue> {
    constant_argument(values, 0)?.rem(constant_argument(values, 1)?)
}

fn extremum(values: &[Option<Nodecl>], keep: Ordering) -> Option<ConstValue> {
    let mut result: Option<ConstValue> = None;
    for value in values.iter().flatten() {
        let value = value.constant()?;
        result = match result {
            Some(current) if value.compare(&current)? != keep => Some(current),
            _ => Some(value.clone()),
        };
    }
    result
}

fn simplify_max(_types: &TypeTable, values: &[Option<Nodecl>], _ty: TypeId) -> Option<ConstValue> {
    extremum(values, Ordering::Greater)
}

fn simplify_min(_types: &TypeTable, values: &[Option<Nodecl>], _ty: TypeId) -> Option<ConstValue> {
    extremum(values, Ordering::Less)
}

/// `int`, `real` and `dble` keep the value; the conversion to the result
/// type truncates and drops imaginary parts.
fn simplify_conversion(_types: &TypeTable, values: &[Option<Nodecl>], _ty: TypeId) -> Option<ConstValue> {
    map_elements(constant_argument(values, 0)?, &|value| match value {
        ConstValue::Complex { real, .. } => Some(real.as_ref().clone()),
        _ => Some(value.clone()),
    })
}

fn simplify_nint(_types: &TypeTable, values: &[Option<Nodecl>], _ty: TypeId) -> Option<ConstValue> {
    map_elements(constant_argument(values, 0)?, &|value| match value {
        ConstValue::Floating { value, precision } => Some(ConstValue::float(value.round(), *precision)),
        _ => None,
    })
}

fn simplify_len(types: &TypeTable, values: &[Option<Nodecl>], _ty: TypeId) -> Option<ConstValue> {
    let string = argument(values, 0)?;
    types
        .character_length(types.rank0(string.ty()))
        .map(ConstValue::signed_int)
}

fn simplify_kind(types: &TypeTable, values: &[Option<Nodecl>], _ty: TypeId) -> Option<ConstValue> {
    let kind = types.fortran_kind(argument(values, 0)?.ty())?;
    Some(ConstValue::signed_int(kind as i64))
}

fn simplify_size(types: &TypeTable, values: &[Option<Nodecl>], _ty: TypeId) -> Option<ConstValue> {
    let array = argument(values, 0)?;
    match argument(values, 1) {
        Some(dim) => {
            let dim = dim.constant()?.as_i64()?;
            let dims = types.dimensions(array.ty());
            let index = usize::try_from(dim).ok()?.checked_sub(1)?;
            dims.get(index)?.size.known().map(ConstValue::signed_int)
        }
        None => types.array_element_count(array.ty()).map(ConstValue::signed_int),
    }
}

fn simplify_sum(types: &TypeTable, values: &[Option<Nodecl>], _ty: TypeId) -> Option<ConstValue> {
    let array = argument(values, 0)?;
    let elements = flatten_constant(array.constant()?);
    let Some((first, rest)) = elements.split_first() else {
        return match types.kind(types.rank0(array.ty())) {
            TypeKind::Integer { .. } => Some(ConstValue::signed_int(0)),
            _ => None,
        };
    };
    rest.iter().try_fold(first.clone(), |total, value| total.add(value))
}
