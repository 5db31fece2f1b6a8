use crate::{
    config::Language,
    const_value::const_value::{ConstValue, FloatPrecision},
    nodecl::nodecl::{Nodecl, NodeclKind},
    symbols::symbols::SymbolKind,
    type_checker::type_checker::{convert_constant, TypeChecker},
    types::types::{TypeId, TypeKind},
};

/// Rank of an implicit conversion sequence, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConversionRank {
    Exact,
    Promotion,
    Conversion,
    /// Argument matched by the `...` of a variadic function.
    Ellipsis,
}

/// What an implicit conversion needs to know about the converted expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSource {
    pub ty: TypeId,
    pub is_lvalue: bool,
    pub is_null_pointer_constant: bool,
}

impl ConversionSource {
    pub fn of(type_checker: &TypeChecker, nodecl: &Nodecl) -> Self {
        ConversionSource {
            ty: nodecl.ty(),
            is_lvalue: nodecl.is_lvalue(),
            is_null_pointer_constant: is_null_pointer_constant(type_checker, nodecl),
        }
    }
}

/// An integral constant expression equal to zero.
pub fn is_null_pointer_constant(type_checker: &TypeChecker, nodecl: &Nodecl) -> bool {
    let types = &type_checker.types;
    (types.is_integer(nodecl.ty()) || types.is_bool(nodecl.ty()) || types.is_character(nodecl.ty()))
        && nodecl.constant().is_some_and(ConstValue::is_zero)
}

/// Integral promotion: `bool`, `char`, short integers and enums become `int`.
pub fn promote(type_checker: &mut TypeChecker, ty: TypeId) -> TypeId {
    let ty = type_checker.types.unqualified(ty);
    let promotes = match type_checker.types.kind(ty) {
        TypeKind::Bool { .. } | TypeKind::Character { .. } => true,
        TypeKind::Integer { bytes, .. } => *bytes < 4,
        TypeKind::Named(_) => type_checker.types.is_enum(ty, &type_checker.symbols),
        _ => false,
    };
    if promotes {
        type_checker.types.signed_int()
    } else {
        ty
    }
}

/// Common type of two arithmetic operands.
pub fn usual_arithmetic_conversions(type_checker: &mut TypeChecker, left: TypeId, right: TypeId) -> TypeId {
    let left = type_checker.types.unqualified(left);
    let right = type_checker.types.unqualified(right);

    let left_base = type_checker.types.complex_base(left);
    let right_base = type_checker.types.complex_base(right);
    if left_base.is_some() || right_base.is_some() {
        let base = usual_arithmetic_conversions(type_checker, left_base.unwrap_or(left), right_base.unwrap_or(right));
        return type_checker.types.complex(base);
    }

    let precision = |ty: TypeId| match type_checker.types.kind(ty) {
        TypeKind::Float(precision) => Some(*precision),
        _ => None,
    };
    match (precision(left), precision(right)) {
        (Some(a), Some(b)) => return if a >= b { left } else { right },
        (Some(_), None) => return left,
        (None, Some(_)) => return right,
        (None, None) => {}
    }

    let left = promote(type_checker, left);
    let right = promote(type_checker, right);
    if left == right {
        return left;
    }
    let info = |ty: TypeId| match type_checker.types.kind(ty) {
        TypeKind::Integer { bytes, signed } => (*bytes, *signed),
        _ => (4, true),
    };
    let ((left_bytes, left_signed), (right_bytes, right_signed)) = (info(left), info(right));
    if left_signed == right_signed {
        return if left_bytes >= right_bytes { left } else { right };
    }
    let (unsigned, unsigned_bytes, signed, signed_bytes) = if left_signed {
        (right, right_bytes, left, left_bytes)
    } else {
        (left, left_bytes, right, right_bytes)
    };
    // A strictly wider signed type holds every value of the unsigned one.
    if unsigned_bytes >= signed_bytes {
        unsigned
    } else {
        signed
    }
}

/// Array-to-pointer and function-to-pointer conversion, dropping top-level
/// qualifiers.
pub fn decay(type_checker: &mut TypeChecker, ty: TypeId) -> TypeId {
    let ty = type_checker.types.no_ref(ty);
    match type_checker.types.kind(ty).clone() {
        TypeKind::Array { element, .. } if !type_checker.is_fortran() => type_checker.types.pointer_to(element),
        TypeKind::Function { .. } => type_checker.types.pointer_to(ty),
        _ => type_checker.types.unqualified(ty),
    }
}

fn derived_class(type_checker: &TypeChecker, derived: TypeId, base: TypeId) -> bool {
    let types = &type_checker.types;
    match (types.named_symbol(derived), types.named_symbol(base)) {
        (Some(d), Some(b)) => {
            types.is_class(derived, &type_checker.symbols) && type_checker.symbols.is_derived_from(d, b)
        }
        _ => false,
    }
}

/// Rank of the implicit conversion of `source` to `target`, if any.
pub fn implicit_conversion(
    type_checker: &mut TypeChecker,
    source: &ConversionSource,
    target: TypeId,
) -> Option<ConversionRank> {
    if type_checker.types.is_reference(target) {
        return reference_binding(type_checker, source, target);
    }
    value_conversion(type_checker, source, target)
}

fn reference_binding(
    type_checker: &mut TypeChecker,
    source: &ConversionSource,
    target: TypeId,
) -> Option<ConversionRank> {
    let rvalue = type_checker.types.is_rvalue_reference(target);
    let referenced = type_checker.types.no_ref(target);
    let types = &mut type_checker.types;
    let source_ty = types.no_ref(source.ty);

    let qualifiers_fit = types.effective_cv(referenced).contains(types.effective_cv(source_ty));
    let (bare_referenced, bare_source) = (types.unqualified(referenced), types.unqualified(source_ty));
    let same = bare_referenced == bare_source;
    let derived = derived_class(type_checker, bare_source, bare_referenced);

    if (same || derived) && qualifiers_fit && source.is_lvalue != rvalue {
        return Some(if same { ConversionRank::Exact } else { ConversionRank::Conversion });
    }

    // Otherwise a temporary is created, which only `const T&` and `T&&` accept.
    let cv = type_checker.types.cv(referenced);
    let binds_temporary = rvalue || (cv.is_const && !cv.is_volatile);
    if !binds_temporary || (rvalue && source.is_lvalue && (same || derived)) {
        return None;
    }
    value_conversion(type_checker, source, bare_referenced)
}

fn value_conversion(type_checker: &mut TypeChecker, source: &ConversionSource, target: TypeId) -> Option<ConversionRank> {
    let target = type_checker.types.unqualified(target);
    let from = decay(type_checker, source.ty);
    if from == target {
        return Some(ConversionRank::Exact);
    }

    let symbols = &type_checker.symbols;
    let from_kind = type_checker.types.kind(from).clone();
    let target_kind = type_checker.types.kind(target).clone();

    if let TypeKind::UnresolvedOverload { candidates, .. } = &from_kind {
        let wanted = match target_kind {
            TypeKind::Pointer(pointee) => pointee,
            _ => target,
        };
        let matches = candidates
            .iter()
            .any(|c| symbols.get(*c).kind == SymbolKind::Function && symbols.get(*c).ty == wanted);
        return matches.then_some(ConversionRank::Exact);
    }

    let types = &type_checker.types;
    let c = type_checker.config.language == Language::C;

    if types.is_arithmetic(from, symbols) && types.is_arithmetic(target, symbols) {
        if types.is_enum(target, symbols) && !c {
            return None;
        }
        if types.is_floating(from) && types.is_floating(target) {
            let float_to_double = matches!(
                (&from_kind, &target_kind),
                (TypeKind::Float(FloatPrecision::Float), TypeKind::Float(FloatPrecision::Double))
            );
            return Some(if float_to_double {
                ConversionRank::Promotion
            } else {
                ConversionRank::Conversion
            });
        }
        if promote(type_checker, from) == target && type_checker.types.is_integer(target) {
            return Some(ConversionRank::Promotion);
        }
        return Some(ConversionRank::Conversion);
    }

    match (&from_kind, &target_kind) {
        (_, TypeKind::Pointer(_)) | (_, TypeKind::PointerToMember { .. }) if source.is_null_pointer_constant => {
            Some(ConversionRank::Conversion)
        }
        (TypeKind::Pointer(from_pointee), TypeKind::Pointer(target_pointee)) => {
            let types = &mut type_checker.types;
            let (from_cv, target_cv) = (types.effective_cv(*from_pointee), types.effective_cv(*target_pointee));
            if !target_cv.contains(from_cv) && !c {
                return None;
            }
            let bare_from = types.unqualified(*from_pointee);
            let bare_target = types.unqualified(*target_pointee);
            if bare_from == bare_target {
                return Some(ConversionRank::Exact);
            }
            if types.is_void(bare_target) && !types.is_function(bare_from) {
                return Some(ConversionRank::Conversion);
            }
            if c && types.is_void(bare_from) && !types.is_function(bare_target) {
                return Some(ConversionRank::Conversion);
            }
            derived_class(type_checker, bare_from, bare_target).then_some(ConversionRank::Conversion)
        }
        (TypeKind::Pointer(_) | TypeKind::PointerToMember { .. }, TypeKind::Bool { .. }) => {
            Some(ConversionRank::Conversion)
        }
        (TypeKind::Named(_), TypeKind::Named(_)) => {
            derived_class(type_checker, from, target).then_some(ConversionRank::Conversion)
        }
        _ => None,
    }
}

/// Converts a constant to a C scalar type; any nonzero value is `true`.
pub fn convert_scalar_constant(type_checker: &TypeChecker, value: &ConstValue, ty: TypeId) -> Option<ConstValue> {
    match type_checker.types.kind(ty) {
        TypeKind::Bool { bytes } => ConstValue::truth(value.is_nonzero()).cast_to_integer(*bytes, false),
        TypeKind::Named(_) => value.cast_to_integer(4, true),
        TypeKind::Pointer(_) | TypeKind::Array { .. } => None,
        _ => convert_constant(&type_checker.types, value, ty),
    }
}

/// Applies the implicit conversion of `value` to `target`. Reference
/// targets bound directly leave the expression untouched.
pub fn convert_to(type_checker: &mut TypeChecker, value: Nodecl, target: TypeId) -> Nodecl {
    let target = if type_checker.types.is_reference(target) {
        let referenced = type_checker.types.no_ref(target);
        let bare = type_checker.types.unqualified(referenced);
        let source_bare = type_checker.types.unqualified(value.ty());
        if bare == source_bare || derived_class(type_checker, source_bare, bare) {
            return value;
        }
        bare
    } else {
        type_checker.types.unqualified(target)
    };
    if type_checker.types.unqualified(value.ty()) == target {
        return value;
    }
    let constant = value
        .constant()
        .and_then(|constant| convert_scalar_constant(type_checker, constant, target));
    let span = value.span().clone();
    Nodecl::new(NodeclKind::Conversion, vec![value], target, span).with_constant(constant)
}
