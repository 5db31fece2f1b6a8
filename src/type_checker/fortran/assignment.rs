use tracing::trace;

use crate::{
    ast::ast::{Ast, AstKind},
    const_value::const_value::ConstValue,
    errors::errors::{Error, ErrorImpl},
    nodecl::nodecl::{Nodecl, NodeclKind},
    symbols::{scope::DeclContext, symbols::SymbolTable},
    type_checker::type_checker::{error_at, TypeChecker},
    types::types::{TypeId, TypeTable},
};

use super::{
    calls::{self, ActualArgument},
    expr::{child, convert_to, dereference, find_symbol},
};

/// Whether `right` can be assigned to `left` without a defined assignment:
/// numeric to numeric, character to character of the same kind, logical
/// to logical, or a derived type to itself.
pub fn is_intrinsic_assignment(types: &TypeTable, symbols: &SymbolTable, left: TypeId, right: TypeId) -> bool {
    let (left, right) = (types.rank0(left), types.rank0(right));
    if types.is_fortran_numeric(left) && types.is_fortran_numeric(right) {
        return true;
    }
    if types.is_fortran_character(left) && types.is_fortran_character(right) {
        return types.fortran_kind(left) == types.fortran_kind(right);
    }
    if types.is_bool(left) && types.is_bool(right) {
        return true;
    }
    match (types.named_symbol(left), types.named_symbol(right)) {
        (Some(a), Some(b)) => symbols.resolve(a) == symbols.resolve(b) && types.is_class(left, symbols),
        _ => false,
    }
}

/// Pads or truncates a constant string to `length`.
fn fit_string(value: &ConstValue, length: i64, kind: u8) -> Option<ConstValue> {
    match value {
        ConstValue::Array { elements } => elements
            .iter()
            .map(|element| fit_string(element, length, kind))
            .collect::<Option<Vec<_>>>()
            .map(ConstValue::array),
        ConstValue::Str { chars } => {
            let mut chars = chars.clone();
            chars.resize(usize::try_from(length).ok()?, ConstValue::int(' ' as i128, kind, false));
            Some(ConstValue::Str { chars })
        }
        _ => None,
    }
}

/// Converts a value about to be stored in a variable of scalar type
/// `target`. Character values take the target length.
pub fn coerce_value(type_checker: &mut TypeChecker, value: Nodecl, target: TypeId) -> Nodecl {
    let types = &type_checker.types;
    let scalar = types.rank0(value.ty());
    if !(types.is_fortran_character(target) && types.is_fortran_character(scalar)) {
        return convert_to(type_checker, value, target);
    }

    let Some(length) = types.character_length(target) else {
        return value;
    };
    if types.character_length(scalar) == Some(length) {
        return value;
    }
    let kind = types.fortran_kind(target).unwrap_or(type_checker.config.default_character_kind);
    let constant = value.constant().and_then(|v| fit_string(v, length, kind));
    let ty = type_checker.types.rebuild_array(target, value.ty());
    let span = value.span().clone();
    Nodecl::new(NodeclKind::Conversion, vec![value], ty, span).with_constant(constant)
}

fn describe_target(ast: &Ast) -> String {
    match ast.kind {
        AstKind::Symbol => ast.text.clone(),
        _ => format!("{:?} expression", ast.kind),
    }
}

/// `variable = expr`. Without an intrinsic assignment between the types,
/// an `assignment(=)` interface is tried.
pub fn check_assignment(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let target = child(ast, 0);
    let left = type_checker.check_operand(target, context)?;
    let right = type_checker.check_operand(child(ast, 1), context)?;
    let left = dereference(type_checker, left);
    let (left_ty, right_ty) = (left.ty(), right.ty());

    if is_intrinsic_assignment(&type_checker.types, &type_checker.symbols, left_ty, right_ty) {
        if !left.is_lvalue() {
            return Err(error_at(
                ErrorImpl::NotAssignable {
                    expression: describe_target(target),
                },
                &target.span,
            ));
        }
        let (left_rank, right_rank) = (type_checker.types.rank(left_ty), type_checker.types.rank(right_ty));
        if right_rank != 0 && (left_rank != right_rank || !type_checker.types.conformable(left_ty, right_ty)) {
            return Err(error_at(
                ErrorImpl::RankMismatch {
                    operator: "=".to_string(),
                    left: left_rank,
                    right: right_rank,
                },
                &ast.span,
            ));
        }
        let scalar = type_checker.types.rank0(left_ty);
        let right = coerce_value(type_checker, right, scalar);
        return Ok(Nodecl::new(NodeclKind::Assignment, vec![left, right], left_ty, ast.span.clone()).with_lvalue(true));
    }

    if let Some(generic) = find_symbol(type_checker, ".operator.=", context) {
        trace!("assignment resolves through interface assignment(=)");
        let arguments = vec![ActualArgument::positional(left), ActualArgument::positional(right)];
        return calls::call_procedure(type_checker, generic, &arguments, &ast.span);
    }

    Err(error_at(
        ErrorImpl::AssignmentTypeMismatch {
            left: type_checker.describe(left_ty),
            right: type_checker.describe(right_ty),
        },
        &ast.span,
    ))
}
