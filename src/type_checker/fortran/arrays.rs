use tracing::trace;

use crate::{
    ast::ast::{Ast, AstKind},
    const_value::const_value::ConstValue,
    errors::errors::{Error, ErrorImpl},
    nodecl::{
        list::NodeclList,
        nodecl::{Nodecl, NodeclKind},
    },
    symbols::{
        scope::{DeclContext, ScopeKind},
        symbols::SymbolKind,
    },
    type_checker::type_checker::{error_at, not_supported, TypeChecker},
    types::{
        fortran::Dimension,
        types::{ArrayBound, TypeId},
    },
    Span,
};

use super::expr::{absent, child, constant_nodecl, find_symbol};

/// Implied-do loops with more iterations are not folded.
const MAX_FOLDED_ITERATIONS: i64 = 1 << 16;

/// Scalar elements of a constant in array element order.
pub fn flatten_constant(value: &ConstValue) -> Vec<ConstValue> {
    match value {
        ConstValue::Array { elements } => elements.iter().flat_map(flatten_constant).collect(),
        _ => vec![value.clone()],
    }
}

fn invalid_subscript(message: &str, span: &Span) -> Error {
    error_at(
        ErrorImpl::InvalidSubscript {
            message: message.to_string(),
        },
        span,
    )
}

/// Which elements of one dimension a subscript designates.
#[derive(Debug, Clone)]
enum Selector {
    Index(i64),
    Section(Vec<i64>),
    Unknown,
}

struct Subscript {
    nodecl: Nodecl,
    /// Extent of the resulting dimension; `None` when the subscript is a
    /// scalar and removes the dimension.
    extent: Option<ArrayBound>,
    selector: Selector,
}

/// A scalar integer expression, or nothing for an omitted bound.
fn check_bound(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Option<Nodecl>, Error> {
    if ast.is_empty_node() {
        return Ok(None);
    }
    let bound = type_checker.check_operand(ast, context)?;
    if type_checker.types.rank(bound.ty()) != 0 || !type_checker.types.is_integer(bound.ty()) {
        return Err(invalid_subscript("bounds must be scalar integers", bound.span()));
    }
    Ok(Some(bound))
}

fn bound_value(bound: &Option<Nodecl>, default: Option<i64>) -> Option<i64> {
    match bound {
        Some(bound) => bound.constant().and_then(ConstValue::as_i64),
        None => default,
    }
}

fn range_nodecl(type_checker: &mut TypeChecker, bounds: [Option<Nodecl>; 3], span: &Span) -> Nodecl {
    let mut children = vec![];
    for bound in bounds {
        match bound {
            Some(bound) => children.push(bound),
            None => children.push(absent(type_checker, span)),
        }
    }
    let ty = type_checker.default_integer();
    Nodecl::new(NodeclKind::Range, children, ty, span.clone())
}

/// Indices of `lower:upper:stride`.
fn section_indices(lower: i64, upper: i64, stride: i64) -> Vec<i64> {
    let mut indices = vec![];
    let mut index = lower;
    while (stride > 0 && index <= upper) || (stride < 0 && index >= upper) {
        indices.push(index);
        index += stride;
    }
    indices
}

fn check_subscript(type_checker: &mut TypeChecker, ast: &Ast, dim: &Dimension, context: &DeclContext) -> Result<Subscript, Error> {
    if ast.kind == AstKind::Range {
        let lower = check_bound(type_checker, child(ast, 0), context)?;
        let upper = check_bound(type_checker, child(ast, 1), context)?;
        let stride = check_bound(type_checker, child(ast, 2), context)?;
        let bounds = (
            bound_value(&lower, dim.lower.known()),
            bound_value(&upper, dim.upper()),
            bound_value(&stride, Some(1)),
        );
        let (extent, selector) = match bounds {
            (_, _, Some(0)) => return Err(invalid_subscript("zero stride in section", &ast.span)),
            (Some(l), Some(u), Some(s)) => {
                let indices = section_indices(l, u, s);
                (ArrayBound::Known(indices.len() as i64), Selector::Section(indices))
            }
            _ => (ArrayBound::Unknown, Selector::Unknown),
        };
        return Ok(Subscript {
            nodecl: range_nodecl(type_checker, [lower, upper, stride], &ast.span),
            extent: Some(extent),
            selector,
        });
    }

    let index = type_checker.check_operand(ast, context)?;
    let ty = index.ty();
    if !type_checker.types.is_integer(type_checker.types.rank0(ty)) {
        return Err(invalid_subscript("subscripts must be integers", &ast.span));
    }
    match type_checker.types.rank(ty) {
        0 => {
            let selector = match index.constant().and_then(ConstValue::as_i64) {
                Some(value) => {
                    if let (Some(lower), Some(upper)) = (dim.lower.known(), dim.upper()) {
                        if value < lower || value > upper {
                            let message = format!("index {} is outside the bounds {}:{}", value, lower, upper);
                            return Err(invalid_subscript(&message, &ast.span));
                        }
                    }
                    Selector::Index(value)
                }
                None => Selector::Unknown,
            };
            Ok(Subscript {
                nodecl: index,
                extent: None,
                selector,
            })
        }
        1 => {
            let extent = type_checker
                .types
                .array_element_count(ty)
                .map(ArrayBound::Known)
                .unwrap_or(ArrayBound::Unknown);
            let selector = match index.constant() {
                Some(value) => flatten_constant(value)
                    .iter()
                    .map(ConstValue::as_i64)
                    .collect::<Option<Vec<_>>>()
                    .map(Selector::Section)
                    .unwrap_or(Selector::Unknown),
                None => Selector::Unknown,
            };
            Ok(Subscript {
                nodecl: index,
                extent: Some(extent),
                selector,
            })
        }
        _ => Err(invalid_subscript("vector subscripts must have rank one", &ast.span)),
    }
}

/// Picks the designated elements of a nested constant. `selectors` start
/// with the last dimension, which is the outermost level of the value.
fn select_constant(value: &ConstValue, selectors: &[(Selector, i64)]) -> Option<ConstValue> {
    let Some(((selector, lower), rest)) = selectors.split_first() else {
        return Some(value.clone());
    };
    let pick = |index: i64| -> Option<ConstValue> {
        let offset = usize::try_from(index - lower).ok()?;
        select_constant(value.element(offset)?, rest)
    };
    match selector {
        Selector::Index(index) => pick(*index),
        Selector::Section(indices) => indices
            .iter()
            .map(|index| pick(*index))
            .collect::<Option<Vec<_>>>()
            .map(ConstValue::array),
        Selector::Unknown => None,
    }
}

pub fn check_array_subscript(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let base_ast = child(ast, 0);
    if base_ast.kind == AstKind::Symbol && find_symbol(type_checker, &base_ast.text, context).is_none() {
        return Err(error_at(
            ErrorImpl::SymbolNotDeclared {
                name: base_ast.text.clone(),
            },
            &base_ast.span,
        ));
    }
    let base = type_checker.check_operand(base_ast, context)?;
    let subscripts = &child(ast, 1).children;
    let base_ty = base.ty();

    if type_checker.types.rank(base_ty) == 0 {
        if type_checker.types.is_fortran_character(base_ty) {
            return check_substring(type_checker, base, subscripts, &ast.span, context);
        }
        return Err(invalid_subscript("only arrays and character strings can be subscripted", &ast.span));
    }

    let dims = type_checker.types.dimensions(base_ty);
    if subscripts.len() != dims.len() {
        return Err(error_at(
            ErrorImpl::SubscriptCountMismatch {
                expected: dims.len(),
                received: subscripts.len(),
            },
            &ast.span,
        ));
    }

    let mut checked = vec![];
    let mut result_dims = vec![];
    let mut selectors = vec![];
    for (subscript, dim) in subscripts.iter().zip(&dims) {
        let subscript = check_subscript(type_checker, subscript, dim, context)?;
        if let Some(extent) = subscript.extent {
            result_dims.push(Dimension {
                lower: ArrayBound::Known(1),
                size: extent,
            });
        }
        selectors.push((subscript.selector, dim.lower.known()));
        checked.push(subscript.nodecl);
    }

    let element = type_checker.types.rank0(base_ty);
    let ty = type_checker.types.fortran_array(element, &result_dims);
    let constant = base.constant().and_then(|value| {
        let selectors = selectors
            .into_iter()
            .rev()
            .map(|(selector, lower)| Some((selector, lower?)))
            .collect::<Option<Vec<_>>>()?;
        select_constant(value, &selectors)
    });

    let is_lvalue = base.is_lvalue();
    let void = type_checker.types.void();
    let subscripts = NodeclList::from_vec(checked).into_nodecl(void, child(ast, 1).span.clone());
    Ok(Nodecl::new(NodeclKind::ArraySubscript, vec![base, subscripts], ty, ast.span.clone())
        .with_lvalue(is_lvalue)
        .with_constant(constant))
}

/// `string(lower:upper)`.
fn check_substring(
    type_checker: &mut TypeChecker,
    base: Nodecl,
    subscripts: &[Ast],
    span: &Span,
    context: &DeclContext,
) -> Result<Nodecl, Error> {
    let [range] = subscripts else {
        return Err(error_at(
            ErrorImpl::SubscriptCountMismatch {
                expected: 1,
                received: subscripts.len(),
            },
            span,
        ));
    };
    if range.kind != AstKind::Range {
        return Err(invalid_subscript("a character string takes a substring range", &range.span));
    }
    if !child(range, 2).is_empty_node() {
        return Err(invalid_subscript("a substring range has no stride", &range.span));
    }

    let length = type_checker.types.character_length(base.ty());
    let lower = check_bound(type_checker, child(range, 0), context)?;
    let upper = check_bound(type_checker, child(range, 1), context)?;
    let (start, end) = (bound_value(&lower, Some(1)), bound_value(&upper, length));

    if let (Some(start), Some(end), Some(length)) = (start, end, length) {
        if start <= end && (start < 1 || end > length) {
            let message = format!("substring {}:{} is outside 1:{}", start, end, length);
            return Err(invalid_subscript(&message, &range.span));
        }
    }

    let result_length = match (start, end) {
        (Some(start), Some(end)) => ArrayBound::Known((end - start + 1).max(0)),
        _ => ArrayBound::Unknown,
    };
    let kind = type_checker
        .types
        .fortran_kind(base.ty())
        .unwrap_or(type_checker.config.default_character_kind);
    let ty = type_checker.types.fortran_character(result_length, kind);
    let constant = match (base.constant(), start, end) {
        (Some(value), Some(start), Some(end)) if start >= 1 => {
            value.substring((start - 1) as usize, end.max(0) as usize)
        }
        _ => None,
    };

    let is_lvalue = base.is_lvalue();
    let range = range_nodecl(type_checker, [lower, upper, None], &range.span);
    Ok(Nodecl::new(NodeclKind::ArraySubscript, vec![base, range], ty, span.clone())
        .with_lvalue(is_lvalue)
        .with_constant(constant))
}

/// One item of an array constructor after checking.
struct ConstructorItem {
    nodecl: Nodecl,
    element_type: TypeId,
    count: Option<i64>,
    /// Flattened constant elements.
    values: Option<Vec<ConstValue>>,
}

fn check_constructor_item(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<ConstructorItem, Error> {
    if ast.kind == AstKind::ImpliedDo {
        return check_implied_do(type_checker, ast, context);
    }
    let nodecl = type_checker.check_operand(ast, context)?;
    let ty = nodecl.ty();
    let count = if type_checker.types.rank(ty) == 0 {
        Some(1)
    } else {
        type_checker.types.array_element_count(ty)
    };
    Ok(ConstructorItem {
        element_type: type_checker.types.rank0(ty),
        count,
        values: nodecl.constant().map(flatten_constant),
        nodecl,
    })
}

/// Element type shared by every item; the first item decides.
fn common_element_type(type_checker: &TypeChecker, items: &[ConstructorItem], span: &Span) -> Result<TypeId, Error> {
    let Some(first) = items.first() else {
        return Err(not_supported("array constructors without elements", span));
    };
    for item in &items[1..] {
        if !type_checker.types.same_type_and_kind(first.element_type, item.element_type) {
            return Err(error_at(
                ErrorImpl::TypeMatchError {
                    expected: type_checker.describe(first.element_type),
                    received: type_checker.describe(item.element_type),
                },
                item.nodecl.span(),
            ));
        }
    }
    Ok(first.element_type)
}

fn total_count(items: &[ConstructorItem]) -> Option<i64> {
    items.iter().map(|item| item.count).sum()
}

fn concatenated_values(items: &[ConstructorItem]) -> Option<Vec<ConstValue>> {
    items
        .iter()
        .map(|item| item.values.clone())
        .collect::<Option<Vec<_>>>()
        .map(|values| values.concat())
}

/// `[a, b, (f(i), i = 1, n)]`, a rank-one array of the items flattened.
pub fn check_array_constructor(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let mut items = vec![];
    for item in &ast.children {
        items.push(check_constructor_item(type_checker, item, context)?);
    }
    let element = common_element_type(type_checker, &items, &ast.span)?;
    let size = total_count(&items).map(ArrayBound::Known).unwrap_or(ArrayBound::Unknown);
    let ty = type_checker.types.fortran_array(
        element,
        &[Dimension {
            lower: ArrayBound::Known(1),
            size,
        }],
    );
    let constant = concatenated_values(&items).map(ConstValue::array);
    let children = items.into_iter().map(|item| item.nodecl).collect();
    Ok(Nodecl::new(NodeclKind::StructuredValue, children, ty, ast.span.clone()).with_constant(constant))
}

fn trip_count(lower: i64, upper: i64, stride: i64) -> i64 {
    ((upper - lower + stride) / stride).max(0)
}

/// `(values, var = lower, upper[, stride])`. The loop variable lives in a
/// block scope of its own; with constant bounds every iteration is checked
/// again with the variable as a constant so that the values fold.
fn check_implied_do(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<ConstructorItem, Error> {
    let value_asts = &child(ast, 0).children;
    let lower = check_bound(type_checker, child(ast, 1), context)?;
    let upper = check_bound(type_checker, child(ast, 2), context)?;
    let stride = check_bound(type_checker, child(ast, 3), context)?;
    let (Some(lower), Some(upper)) = (lower, upper) else {
        return Err(invalid_subscript("implied-do loops need both bounds", &ast.span));
    };

    let block = type_checker
        .symbols
        .new_scope(ScopeKind::Block, context.current_scope, None);
    let variable = type_checker.symbols.new_symbol(block, &ast.text, SymbolKind::Variable);
    let integer = type_checker.default_integer();
    {
        let data = type_checker.symbols.get_mut(variable);
        data.ty = integer;
        data.defined = true;
        data.span = ast.span.clone();
    }
    let inner = context.in_scope(block);

    let mut items = vec![];
    for value in value_asts {
        items.push(check_constructor_item(type_checker, value, &inner)?);
    }
    let element = common_element_type(type_checker, &items, &ast.span)?;

    let bounds = (
        lower.constant().and_then(ConstValue::as_i64),
        upper.constant().and_then(ConstValue::as_i64),
        bound_value(&stride, Some(1)),
    );
    let trips = match bounds {
        (_, _, Some(0)) => return Err(invalid_subscript("zero stride in implied-do loop", &ast.span)),
        (Some(l), Some(u), Some(s)) => Some((l, trip_count(l, u, s), s)),
        _ => None,
    };
    let count = trips
        .map(|(_, trips, _)| trips)
        .zip(total_count(&items))
        .map(|(trips, per_iteration)| trips * per_iteration);

    let values = match trips {
        Some((first, trips, step)) if trips <= MAX_FOLDED_ITERATIONS => {
            let mut values = Some(vec![]);
            for iteration in 0..trips {
                let index = first + iteration * step;
                let value = ConstValue::int(index as i128, type_checker.config.default_integer_kind, true);
                let constant = constant_nodecl(type_checker, value, integer, &ast.span);
                {
                    let data = type_checker.symbols.get_mut(variable);
                    data.specs.is_parameter = true;
                    data.value = Some(constant);
                }
                let folded = type_checker.probe(|tc| {
                    value_asts
                        .iter()
                        .map(|value| check_constructor_item(tc, value, &inner).ok().and_then(|item| item.values))
                        .collect::<Option<Vec<_>>>()
                });
                values = values.zip(folded).map(|(mut values, folded)| {
                    values.extend(folded.concat());
                    values
                });
                if values.is_none() {
                    break;
                }
            }
            values
        }
        _ => None,
    };
    {
        let data = type_checker.symbols.get_mut(variable);
        data.specs.is_parameter = false;
        data.value = None;
    }
    trace!(
        "implied-do over `{}`: {} element(s){}",
        ast.text,
        count.map_or("?".to_string(), |c| c.to_string()),
        if values.is_some() { ", folded" } else { "" }
    );

    let size = count.map(ArrayBound::Known).unwrap_or(ArrayBound::Unknown);
    let ty = type_checker.types.fortran_array(
        element,
        &[Dimension {
            lower: ArrayBound::Known(1),
            size,
        }],
    );
    let void = type_checker.types.void();
    let body = NodeclList::from_vec(items.into_iter().map(|item| item.nodecl).collect()).into_nodecl(void, ast.span.clone());
    let stride = match stride {
        Some(stride) => stride,
        None => absent(type_checker, &ast.span),
    };
    let nodecl = Nodecl::new(NodeclKind::ImpliedDo, vec![body, lower, upper, stride], ty, ast.span.clone())
        .with_text(&ast.text)
        .with_symbol(variable);
    Ok(ConstructorItem {
        nodecl,
        element_type: element,
        count,
        values,
    })
}
