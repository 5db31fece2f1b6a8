use tracing::trace;

use crate::{
    ast::ast::{Ast, AstKind},
    const_value::const_value::ConstValue,
    errors::errors::{Error, ErrorImpl},
    internal_error,
    nodecl::nodecl::{Nodecl, NodeclKind},
    symbols::scope::DeclContext,
    type_checker::type_checker::{convert_constant, error_at, TypeChecker},
    types::types::{ArrayBound, TypeId},
    Span,
};

use super::{
    calls::{self, ActualArgument},
    expr::{child, convert_to, find_symbol},
};

pub const BINARY_OPERATORS: &[AstKind] = &[
    AstKind::Add,
    AstKind::Minus,
    AstKind::Mul,
    AstKind::Div,
    AstKind::Power,
    AstKind::Concat,
    AstKind::Equal,
    AstKind::Different,
    AstKind::LowerThan,
    AstKind::LowerOrEqual,
    AstKind::GreaterThan,
    AstKind::GreaterOrEqual,
    AstKind::LogicalAnd,
    AstKind::LogicalOr,
    AstKind::Eqv,
    AstKind::Neqv,
    AstKind::DefinedBinary,
];

pub const UNARY_OPERATORS: &[AstKind] = &[AstKind::Neg, AstKind::Plus, AstKind::LogicalNot, AstKind::DefinedUnary];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperandClass {
    Integer,
    Real,
    Complex,
    Numeric,
    /// Integer or real: the types that can be ordered.
    Ordered,
    Logical,
    Character,
}

impl OperandClass {
    fn accepts(self, type_checker: &TypeChecker, ty: TypeId) -> bool {
        let types = &type_checker.types;
        match self {
            OperandClass::Integer => types.is_integer(ty),
            OperandClass::Real => types.is_floating(ty),
            OperandClass::Complex => types.is_complex(ty),
            OperandClass::Numeric => types.is_fortran_numeric(ty),
            OperandClass::Ordered => types.is_integer(ty) || types.is_floating(ty),
            OperandClass::Logical => types.is_bool(ty),
            OperandClass::Character => types.is_fortran_character(ty),
        }
    }
}

/// How the result type follows from the operand types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResultRule {
    /// The operand category with the larger kind.
    CommonKind,
    First,
    Second,
    DefaultLogical,
    Concatenation,
}

/// One accepted combination of operand types. With `convert`, both operands
/// are converted to a common type before the operation.
#[derive(Debug, Clone, Copy)]
struct OperandRule {
    left: OperandClass,
    right: OperandClass,
    result: ResultRule,
    convert: bool,
}

const fn rule(left: OperandClass, right: OperandClass, result: ResultRule, convert: bool) -> OperandRule {
    OperandRule {
        left,
        right,
        result,
        convert,
    }
}

use OperandClass::*;
use ResultRule::*;

const ARITHMETIC_RULES: &[OperandRule] = &[
    rule(Integer, Integer, CommonKind, true),
    rule(Integer, Real, Second, true),
    rule(Integer, Complex, Second, true),
    rule(Real, Integer, First, true),
    rule(Real, Real, CommonKind, true),
    rule(Real, Complex, CommonKind, true),
    rule(Complex, Integer, First, true),
    rule(Complex, Real, CommonKind, true),
    rule(Complex, Complex, CommonKind, true),
];

// x ** n keeps an integer exponent as is.
const POWER_RULES: &[OperandRule] = &[
    rule(Integer, Integer, CommonKind, true),
    rule(Integer, Real, Second, true),
    rule(Integer, Complex, Second, true),
    rule(Real, Integer, First, false),
    rule(Real, Real, CommonKind, true),
    rule(Real, Complex, CommonKind, true),
    rule(Complex, Integer, First, false),
    rule(Complex, Real, CommonKind, true),
    rule(Complex, Complex, CommonKind, true),
];

const EQUALITY_RULES: &[OperandRule] = &[
    rule(Numeric, Numeric, DefaultLogical, true),
    rule(Character, Character, DefaultLogical, false),
];

const ORDERING_RULES: &[OperandRule] = &[
    rule(Ordered, Ordered, DefaultLogical, true),
    rule(Character, Character, DefaultLogical, false),
];

const LOGICAL_RULES: &[OperandRule] = &[rule(Logical, Logical, CommonKind, false)];

const CONCAT_RULES: &[OperandRule] = &[rule(Character, Character, Concatenation, false)];

// Unary rules only look at the right operand.
const SIGN_RULES: &[OperandRule] = &[rule(Numeric, Numeric, Second, false)];

const NOT_RULES: &[OperandRule] = &[rule(Logical, Logical, Second, false)];

fn rules_for(kind: AstKind) -> &'static [OperandRule] {
    match kind {
        AstKind::Add | AstKind::Minus | AstKind::Mul | AstKind::Div => ARITHMETIC_RULES,
        AstKind::Power => POWER_RULES,
        AstKind::Equal | AstKind::Different => EQUALITY_RULES,
        AstKind::LowerThan | AstKind::LowerOrEqual | AstKind::GreaterThan | AstKind::GreaterOrEqual => ORDERING_RULES,
        AstKind::LogicalAnd | AstKind::LogicalOr | AstKind::Eqv | AstKind::Neqv => LOGICAL_RULES,
        AstKind::Concat => CONCAT_RULES,
        AstKind::Neg | AstKind::Plus => SIGN_RULES,
        AstKind::LogicalNot => NOT_RULES,
        _ => internal_error!("{:?} is not an intrinsic Fortran operator", kind),
    }
}

fn nodecl_kind(kind: AstKind) -> NodeclKind {
    match kind {
        AstKind::Add => NodeclKind::Add,
        AstKind::Minus => NodeclKind::Minus,
        AstKind::Mul => NodeclKind::Mul,
        AstKind::Div => NodeclKind::Div,
        AstKind::Power => NodeclKind::Power,
        AstKind::Concat => NodeclKind::Concat,
        AstKind::Equal | AstKind::Eqv => NodeclKind::Equal,
        AstKind::Different | AstKind::Neqv => NodeclKind::Different,
        AstKind::LowerThan => NodeclKind::LowerThan,
        AstKind::LowerOrEqual => NodeclKind::LowerOrEqual,
        AstKind::GreaterThan => NodeclKind::GreaterThan,
        AstKind::GreaterOrEqual => NodeclKind::GreaterOrEqual,
        AstKind::LogicalAnd => NodeclKind::LogicalAnd,
        AstKind::LogicalOr => NodeclKind::LogicalOr,
        AstKind::Neg => NodeclKind::Neg,
        AstKind::Plus => NodeclKind::Plus,
        AstKind::LogicalNot => NodeclKind::LogicalNot,
        _ => internal_error!("{:?} has no nodecl counterpart", kind),
    }
}

fn find_rule(type_checker: &TypeChecker, rules: &[OperandRule], left: Option<TypeId>, right: TypeId) -> Option<OperandRule> {
    rules.iter().copied().find(|rule| {
        let left_ok = left.map_or(true, |left| rule.left.accepts(type_checker, left));
        let same_character_kind = match left {
            Some(left) if rule.left == Character && rule.right == Character => {
                type_checker.types.fortran_kind(left) == type_checker.types.fortran_kind(right)
            }
            _ => true,
        };
        left_ok && rule.right.accepts(type_checker, right) && same_character_kind
    })
}

/// Type of the operand category with the larger kind parameter.
fn common_kind(type_checker: &mut TypeChecker, left: TypeId, right: TypeId) -> TypeId {
    let types = &mut type_checker.types;
    let Some(kind) = types.fortran_kind(left).max(types.fortran_kind(right)) else {
        return left;
    };
    let common = if types.is_complex(left) || types.is_complex(right) {
        types.fortran_complex(kind)
    } else if types.is_floating(left) || types.is_floating(right) {
        types.fortran_real(kind)
    } else if types.is_integer(left) && types.is_integer(right) {
        Some(types.fortran_integer(kind))
    } else if types.is_bool(left) && types.is_bool(right) {
        Some(types.fortran_logical(kind))
    } else {
        None
    };
    common.unwrap_or(left)
}

/// Type both operands of a comparison are converted to: an integer takes
/// the type of the other operand.
fn comparison_type(type_checker: &mut TypeChecker, left: TypeId, right: TypeId) -> TypeId {
    match (type_checker.types.is_integer(left), type_checker.types.is_integer(right)) {
        (true, false) => right,
        (false, true) => left,
        _ => common_kind(type_checker, left, right),
    }
}

fn result_scalar(type_checker: &mut TypeChecker, rule: OperandRule, left: TypeId, right: TypeId) -> TypeId {
    match rule.result {
        CommonKind => common_kind(type_checker, left, right),
        First => left,
        Second => right,
        DefaultLogical => type_checker.default_logical(),
        Concatenation => {
            let types = &type_checker.types;
            let length = types
                .character_length(left)
                .zip(types.character_length(right))
                .map(|(l, r)| ArrayBound::Known(l + r))
                .unwrap_or(ArrayBound::Unknown);
            let kind = types.fortran_kind(left).unwrap_or(type_checker.config.default_character_kind);
            type_checker.types.fortran_character(length, kind)
        }
    }
}

fn fold_binary(kind: AstKind, left: Option<&ConstValue>, right: Option<&ConstValue>) -> Option<ConstValue> {
    let (a, b) = (left?, right?);
    match kind {
        AstKind::Add => a.add(b),
        AstKind::Minus => a.sub(b),
        AstKind::Mul => a.mul(b),
        AstKind::Div => a.div(b),
        AstKind::Power => a.pow(b),
        AstKind::Concat => a.concat(b),
        AstKind::Equal => a.equal(b),
        AstKind::Different => a.not_equal(b),
        AstKind::LowerThan => a.lower_than(b),
        AstKind::LowerOrEqual => a.lower_or_equal(b),
        AstKind::GreaterThan => a.greater_than(b),
        AstKind::GreaterOrEqual => a.greater_or_equal(b),
        AstKind::LogicalAnd => a.logical_and(b),
        AstKind::LogicalOr => a.logical_or(b),
        AstKind::Eqv => a.eqv(b),
        AstKind::Neqv => a.neqv(b),
        _ => None,
    }
}

pub fn check_binary_operator(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let left = type_checker.check_operand(child(ast, 0), context)?;
    let right = type_checker.check_operand(child(ast, 1), context)?;
    if ast.kind == AstKind::DefinedBinary {
        return defined_operator(type_checker, &ast.text, vec![left, right], &ast.span, context);
    }
    binary_operation(type_checker, ast.kind, left, right, &ast.span, context)
}

/// Checks an intrinsic binary operation, falling back to a user-defined
/// `operator(op)` interface when no intrinsic rule accepts the operands.
pub fn binary_operation(
    type_checker: &mut TypeChecker,
    kind: AstKind,
    left: Nodecl,
    right: Nodecl,
    span: &Span,
    context: &DeclContext,
) -> Result<Nodecl, Error> {
    let left_scalar = type_checker.types.rank0(left.ty());
    let right_scalar = type_checker.types.rank0(right.ty());
    let Some(rule) = find_rule(type_checker, rules_for(kind), Some(left_scalar), right_scalar) else {
        return defined_operator(type_checker, kind.operator_name(), vec![left, right], span, context);
    };

    let (left_rank, right_rank) = (type_checker.types.rank(left.ty()), type_checker.types.rank(right.ty()));
    if left_rank != 0
        && right_rank != 0
        && (left_rank != right_rank || !type_checker.types.conformable(left.ty(), right.ty()))
    {
        return Err(error_at(
            ErrorImpl::RankMismatch {
                operator: kind.operator_name().to_string(),
                left: left_rank,
                right: right_rank,
            },
            span,
        ));
    }

    let scalar = result_scalar(type_checker, rule, left_scalar, right_scalar);
    let shape = if left_rank > 0 {
        Some(left.ty())
    } else if right_rank > 0 {
        Some(right.ty())
    } else {
        None
    };
    let ty = match shape {
        Some(shape) => type_checker.types.rebuild_array(scalar, shape),
        None => scalar,
    };

    let (left, right) = if rule.convert {
        let target = if rule.result == DefaultLogical {
            comparison_type(type_checker, left_scalar, right_scalar)
        } else {
            scalar
        };
        (convert_to(type_checker, left, target), convert_to(type_checker, right, target))
    } else {
        (left, right)
    };

    let constant = fold_binary(kind, left.constant(), right.constant())
        .and_then(|value| convert_constant(&type_checker.types, &value, ty));
    if let Some(value) = &constant {
        trace!("folded {} to {}", kind.operator_name(), value);
    }
    Ok(Nodecl::new(nodecl_kind(kind), vec![left, right], ty, span.clone()).with_constant(constant))
}

pub fn check_unary_operator(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let operand = type_checker.check_operand(child(ast, 0), context)?;
    if ast.kind == AstKind::DefinedUnary {
        return defined_operator(type_checker, &ast.text, vec![operand], &ast.span, context);
    }

    let scalar = type_checker.types.rank0(operand.ty());
    if find_rule(type_checker, rules_for(ast.kind), None, scalar).is_none() {
        return defined_operator(type_checker, ast.kind.operator_name(), vec![operand], &ast.span, context);
    }

    let ty = operand.ty();
    let constant = operand
        .constant()
        .and_then(|value| match ast.kind {
            AstKind::Neg => value.neg(),
            AstKind::Plus => value.plus(),
            AstKind::LogicalNot => value.logical_not(),
            _ => None,
        })
        .and_then(|value| convert_constant(&type_checker.types, &value, ty));
    Ok(Nodecl::new(nodecl_kind(ast.kind), vec![operand], ty, ast.span.clone()).with_constant(constant))
}

/// Resolves `operator(spelling)` through the generic interface of that
/// name, like a function reference with the operands as arguments.
fn defined_operator(
    type_checker: &mut TypeChecker,
    spelling: &str,
    operands: Vec<Nodecl>,
    span: &Span,
    context: &DeclContext,
) -> Result<Nodecl, Error> {
    let generic_name = format!(".operator.{}", spelling);
    let Some(generic) = find_symbol(type_checker, &generic_name, context) else {
        let operand_types: Vec<TypeId> = operands.iter().map(Nodecl::ty).collect();
        return Err(error_at(
            ErrorImpl::OperatorTypeMismatch {
                operator: spelling.to_string(),
                operands: type_checker.describe_types(&operand_types),
            },
            span,
        ));
    };
    trace!("`{}` resolves through interface operator({})", spelling, spelling);
    let arguments: Vec<ActualArgument> = operands.into_iter().map(ActualArgument::positional).collect();
    calls::call_procedure(type_checker, generic, &arguments, span)
}
