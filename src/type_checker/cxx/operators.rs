use tracing::trace;

use crate::{
    ast::ast::{Ast, AstKind},
    const_value::const_value::ConstValue,
    errors::errors::{Error, ErrorImpl},
    internal_error,
    nodecl::nodecl::{Nodecl, NodeclKind},
    symbols::scope::DeclContext,
    type_checker::{
        fortran::expr::child,
        type_checker::{error_at, TypeChecker},
    },
    types::types::TypeId,
    Span,
};

use super::{
    conversions::{convert_scalar_constant, convert_to, decay, is_null_pointer_constant, promote, usual_arithmetic_conversions},
    expr::dependent_nodecl,
    overload,
};

pub const BINARY_OPERATORS: &[AstKind] = &[
    AstKind::Add,
    AstKind::Minus,
    AstKind::Mul,
    AstKind::Div,
    AstKind::Mod,
    AstKind::Equal,
    AstKind::Different,
    AstKind::LowerThan,
    AstKind::LowerOrEqual,
    AstKind::GreaterThan,
    AstKind::GreaterOrEqual,
    AstKind::LogicalAnd,
    AstKind::LogicalOr,
    AstKind::BitwiseAnd,
    AstKind::BitwiseOr,
    AstKind::BitwiseXor,
    AstKind::Shl,
    AstKind::Shr,
];

pub const UNARY_OPERATORS: &[AstKind] = &[
    AstKind::Neg,
    AstKind::Plus,
    AstKind::LogicalNot,
    AstKind::BitwiseNot,
    AstKind::Reference,
    AstKind::Dereference,
];

fn nodecl_kind(kind: AstKind) -> NodeclKind {
    match kind {
        AstKind::Add => NodeclKind::Add,
        AstKind::Minus => NodeclKind::Minus,
        AstKind::Mul => NodeclKind::Mul,
        AstKind::Div => NodeclKind::Div,
        AstKind::Mod => NodeclKind::Mod,
        AstKind::Equal => NodeclKind::Equal,
        AstKind::Different => NodeclKind::Different,
        AstKind::LowerThan => NodeclKind::LowerThan,
        AstKind::LowerOrEqual => NodeclKind::LowerOrEqual,
        AstKind::GreaterThan => NodeclKind::GreaterThan,
        AstKind::GreaterOrEqual => NodeclKind::GreaterOrEqual,
        AstKind::LogicalAnd => NodeclKind::LogicalAnd,
        AstKind::LogicalOr => NodeclKind::LogicalOr,
        AstKind::BitwiseAnd => NodeclKind::BitwiseAnd,
        AstKind::BitwiseOr => NodeclKind::BitwiseOr,
        AstKind::BitwiseXor => NodeclKind::BitwiseXor,
        AstKind::Shl => NodeclKind::Shl,
        AstKind::Shr => NodeclKind::Shr,
        AstKind::Neg => NodeclKind::Neg,
        AstKind::Plus => NodeclKind::Plus,
        AstKind::LogicalNot => NodeclKind::LogicalNot,
        AstKind::BitwiseNot => NodeclKind::BitwiseNot,
        AstKind::Reference => NodeclKind::Reference,
        AstKind::Dereference => NodeclKind::Dereference,
        other => internal_error!("{:?} is not a C operator", other),
    }
}

/// How the operands of a matched built-in operator are prepared.
#[derive(Debug, Clone, Copy)]
enum Operands {
    /// Both converted to this type before folding.
    Common(TypeId),
    /// Each promoted on its own (shifts).
    Promoted,
    /// Left as they are (pointer arithmetic and comparisons, logical
    /// operators).
    AsIs,
}

fn fold_binary(kind: AstKind, left: &ConstValue, right: &ConstValue) -> Option<ConstValue> {
    match kind {
        AstKind::Add => left.add(right),
        AstKind::Minus => left.sub(right),
        AstKind::Mul => left.mul(right),
        AstKind::Div => left.div(right),
        AstKind::Mod => left.rem(right),
        AstKind::Equal => left.equal(right),
        AstKind::Different => left.not_equal(right),
        AstKind::LowerThan => left.lower_than(right),
        AstKind::LowerOrEqual => left.lower_or_equal(right),
        AstKind::GreaterThan => left.greater_than(right),
        AstKind::GreaterOrEqual => left.greater_or_equal(right),
        AstKind::LogicalAnd => Some(ConstValue::truth(left.is_nonzero() && right.is_nonzero())),
        AstKind::LogicalOr => Some(ConstValue::truth(left.is_nonzero() || right.is_nonzero())),
        AstKind::BitwiseAnd => left.bit_and(right),
        AstKind::BitwiseOr => left.bit_or(right),
        AstKind::BitwiseXor => left.bit_xor(right),
        AstKind::Shl => left.shl(right),
        AstKind::Shr => left.shr(right),
        _ => None,
    }
}

fn is_relational(kind: AstKind) -> bool {
    matches!(
        kind,
        AstKind::Equal
            | AstKind::Different
            | AstKind::LowerThan
            | AstKind::LowerOrEqual
            | AstKind::GreaterThan
            | AstKind::GreaterOrEqual
    )
}

/// Whether a class or enum operand sends the operator to overload
/// resolution first.
fn may_be_overloaded(type_checker: &TypeChecker, operands: &[&Nodecl]) -> bool {
    type_checker.config.is_cxx()
        && operands.iter().any(|operand| {
            let ty = type_checker.types.no_ref(operand.ty());
            type_checker.types.is_class(ty, &type_checker.symbols) || type_checker.types.is_enum(ty, &type_checker.symbols)
        })
}

fn mismatch(type_checker: &TypeChecker, kind: AstKind, operands: &[TypeId], span: &Span) -> Error {
    error_at(
        ErrorImpl::OperatorTypeMismatch {
            operator: kind.c_operator_name().to_string(),
            operands: type_checker.describe_types(operands),
        },
        span,
    )
}

pub fn check_binary_operator(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let left = type_checker.check_operand(child(ast, 0), context)?;
    let right = type_checker.check_operand(child(ast, 1), context)?;
    binary_operation(type_checker, ast.kind, left, right, &ast.span, context)
}

/// Resolves `left <op> right`: a user-defined `operator<op>` when an
/// operand has class or enum type and one is viable, the built-in operator
/// otherwise.
pub fn binary_operation(
    type_checker: &mut TypeChecker,
    kind: AstKind,
    left: Nodecl,
    right: Nodecl,
    span: &Span,
    context: &DeclContext,
) -> Result<Nodecl, Error> {
    if left.is_type_dependent() || right.is_type_dependent() {
        return Ok(dependent_nodecl(type_checker, nodecl_kind(kind), vec![left, right], span));
    }
    if may_be_overloaded(type_checker, &[&left, &right]) {
        let name = format!("operator{}", kind.c_operator_name());
        let operands = vec![left.clone(), right.clone()];
        if let Some(call) = overload::overloaded_operator(type_checker, &name, operands, span, context)? {
            return Ok(call);
        }
    }
    builtin_binary(type_checker, kind, left, right, span)
}

fn builtin_binary(
    type_checker: &mut TypeChecker,
    kind: AstKind,
    left: Nodecl,
    right: Nodecl,
    span: &Span,
) -> Result<Nodecl, Error> {
    let left_type = decay(type_checker, left.ty());
    let right_type = decay(type_checker, right.ty());
    let types = &type_checker.types;
    let symbols = &type_checker.symbols;
    let arithmetic = types.is_arithmetic(left_type, symbols) && types.is_arithmetic(right_type, symbols);
    let integral = types.is_integral(left_type, symbols) && types.is_integral(right_type, symbols);
    let scalar = types.is_scalar(left_type, symbols) && types.is_scalar(right_type, symbols);
    let left_pointer = types.pointer_pointee(left_type);
    let right_pointer = types.pointer_pointee(right_type);
    let left_index = types.is_integral(left_type, symbols);
    let right_index = types.is_integral(right_type, symbols);
    let object_pointer = |pointee: Option<TypeId>| pointee.is_some_and(|p| !types.is_function(p) && !types.is_void(p));
    let (left_object, right_object) = (object_pointer(left_pointer), object_pointer(right_pointer));

    let same_pointee = match (left_pointer, right_pointer) {
        (Some(a), Some(b)) => {
            let types = &mut type_checker.types;
            types.unqualified(a) == types.unqualified(b) || types.is_void(a) || types.is_void(b)
        }
        _ => false,
    };
    let null_comparison = (left_pointer.is_some() && is_null_pointer_constant(type_checker, &right))
        || (right_pointer.is_some() && is_null_pointer_constant(type_checker, &left));

    let (ty, operands) = match kind {
        AstKind::Add | AstKind::Minus | AstKind::Mul | AstKind::Div if arithmetic => {
            let common = usual_arithmetic_conversions(type_checker, left_type, right_type);
            (common, Operands::Common(common))
        }
        AstKind::Mod | AstKind::BitwiseAnd | AstKind::BitwiseOr | AstKind::BitwiseXor if integral => {
            let common = usual_arithmetic_conversions(type_checker, left_type, right_type);
            (common, Operands::Common(common))
        }
        AstKind::Shl | AstKind::Shr if integral => (promote(type_checker, left_type), Operands::Promoted),
        AstKind::Add if left_object && right_index => (left_type, Operands::AsIs),
        AstKind::Add if left_index && right_object => (right_type, Operands::AsIs),
        AstKind::Minus if left_object && right_index => (left_type, Operands::AsIs),
        AstKind::Minus if left_object && right_object && same_pointee => {
            (type_checker.types.integer(8, true), Operands::AsIs)
        }
        _ if is_relational(kind) && arithmetic => {
            let common = usual_arithmetic_conversions(type_checker, left_type, right_type);
            (type_checker.truth_type(), Operands::Common(common))
        }
        _ if is_relational(kind) && (same_pointee || null_comparison) => (type_checker.truth_type(), Operands::AsIs),
        AstKind::LogicalAnd | AstKind::LogicalOr if scalar => (type_checker.truth_type(), Operands::AsIs),
        _ => return Err(mismatch(type_checker, kind, &[left.ty(), right.ty()], span)),
    };
    trace!("built-in `{}` on {}", kind.c_operator_name(), type_checker.describe_types(&[left_type, right_type]));

    let (left, right) = match operands {
        Operands::Common(common) => (
            convert_to(type_checker, left, common),
            convert_to(type_checker, right, common),
        ),
        Operands::Promoted => {
            let right_promoted = promote(type_checker, right_type);
            (convert_to(type_checker, left, ty), convert_to(type_checker, right, right_promoted))
        }
        Operands::AsIs => (left, right),
    };

    let folds = type_checker.types.is_arithmetic(ty, &type_checker.symbols);
    let constant = match (left.constant(), right.constant()) {
        (Some(a), Some(b)) if folds => fold_binary(kind, a, b).and_then(|value| convert_scalar_constant(type_checker, &value, ty)),
        _ => None,
    };
    Ok(Nodecl::new(nodecl_kind(kind), vec![left, right], ty, span.clone()).with_constant(constant))
}

pub fn check_unary_operator(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let operand = type_checker.check_operand(child(ast, 0), context)?;
    unary_operation(type_checker, ast.kind, operand, &ast.span, context)
}

pub fn unary_operation(
    type_checker: &mut TypeChecker,
    kind: AstKind,
    operand: Nodecl,
    span: &Span,
    context: &DeclContext,
) -> Result<Nodecl, Error> {
    if operand.is_type_dependent() {
        return Ok(dependent_nodecl(type_checker, nodecl_kind(kind), vec![operand], span));
    }
    if kind == AstKind::Reference {
        return address_of(type_checker, operand, span);
    }
    if may_be_overloaded(type_checker, &[&operand]) {
        let name = format!("operator{}", kind.c_operator_name());
        if let Some(call) = overload::overloaded_operator(type_checker, &name, vec![operand.clone()], span, context)? {
            return Ok(call);
        }
    }
    builtin_unary(type_checker, kind, operand, span)
}

fn builtin_unary(type_checker: &mut TypeChecker, kind: AstKind, operand: Nodecl, span: &Span) -> Result<Nodecl, Error> {
    let ty = decay(type_checker, operand.ty());
    let types = &type_checker.types;
    let symbols = &type_checker.symbols;
    let (arithmetic, integral, scalar) = (
        types.is_arithmetic(ty, symbols),
        types.is_integral(ty, symbols),
        types.is_scalar(ty, symbols),
    );

    let (result, constant, lvalue) = match kind {
        AstKind::Neg | AstKind::Plus if arithmetic => {
            let result = promote(type_checker, ty);
            let operand_value = operand
                .constant()
                .and_then(|value| convert_scalar_constant(type_checker, value, result));
            let folded = operand_value.and_then(|value| if kind == AstKind::Neg { value.neg() } else { value.plus() });
            (result, folded, false)
        }
        AstKind::Plus if types.is_pointer(ty) => (ty, None, false),
        AstKind::BitwiseNot if integral => {
            let result = promote(type_checker, ty);
            let folded = operand
                .constant()
                .and_then(|value| convert_scalar_constant(type_checker, value, result))
                .and_then(|value| value.bitwise_not());
            (result, folded, false)
        }
        AstKind::LogicalNot if scalar => {
            let result = type_checker.truth_type();
            let folded = operand.constant().map(|value| ConstValue::truth(value.is_zero()));
            (result, folded, false)
        }
        AstKind::Dereference => match types.pointer_pointee(ty) {
            Some(pointee) if !types.is_void(pointee) => (pointee, None, true),
            _ => return Err(mismatch(type_checker, kind, &[operand.ty()], span)),
        },
        _ => return Err(mismatch(type_checker, kind, &[operand.ty()], span)),
    };

    let constant = constant.and_then(|value| convert_scalar_constant(type_checker, &value, result));
    let operand = if lvalue { operand } else { convert_to(type_checker, operand, ty) };
    Ok(Nodecl::new(nodecl_kind(kind), vec![operand], result, span.clone())
        .with_constant(constant)
        .with_lvalue(lvalue))
}

/// `&e`: a pointer to an lvalue or function, a pointer to member for a
/// qualified non-static member, or the overload set itself until a target
/// type picks a function.
fn address_of(type_checker: &mut TypeChecker, operand: Nodecl, span: &Span) -> Result<Nodecl, Error> {
    let ty = operand.ty();
    if type_checker.types.is_unresolved_overload(ty) {
        return Ok(Nodecl::new(NodeclKind::Reference, vec![operand], ty, span.clone()));
    }

    if let Some(symbol) = operand.get_symbol().filter(|_| operand.kind() == NodeclKind::Symbol) {
        let specs = &type_checker.symbols.get(symbol).specs;
        if let (true, false, Some(class)) = (specs.is_member, specs.is_static, specs.class_type) {
            let member_type = type_checker.types.pointer_to_member(ty, class);
            return Ok(Nodecl::new(NodeclKind::Reference, vec![operand], member_type, span.clone()));
        }
    }

    if !operand.is_lvalue() {
        return Err(error_at(
            ErrorImpl::TypeMatchError {
                expected: "lvalue operand of `&`".to_string(),
                received: type_checker.describe(ty),
            },
            span,
        ));
    }
    let pointer = type_checker.types.pointer_to(ty);
    Ok(Nodecl::new(NodeclKind::Reference, vec![operand], pointer, span.clone()))
}
