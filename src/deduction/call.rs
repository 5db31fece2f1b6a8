use tracing::{debug, trace};

use crate::{
    symbols::symbols::{SymbolId, SymbolKind},
    type_checker::type_checker::TypeChecker,
    types::types::{TypeId, TypeKind},
};

use super::{
    deduction::{
        finish_deduction, ArgumentProvenance, DeductionSet, TemplateArgument, TemplateParameterKind,
        TemplateParameterList,
    },
    substitute::{bind_pack_element, collect_pack_keys, substitute_type},
    unify::unify,
};

/// What deduction needs to know about one actual argument of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallArgument {
    pub ty: TypeId,
    pub is_lvalue: bool,
}

impl CallArgument {
    pub fn lvalue(ty: TypeId) -> Self {
        CallArgument { ty, is_lvalue: true }
    }

    pub fn rvalue(ty: TypeId) -> Self {
        CallArgument { ty, is_lvalue: false }
    }
}

/// Deduces the template arguments of a call to the function template
/// `template`. Explicitly given arguments are bound first.
///
/// On success every parameter of the returned list is bound and the
/// function type substitutes to a valid type.
pub fn deduce_call(
    type_checker: &mut TypeChecker,
    template: SymbolId,
    arguments: &[CallArgument],
    explicit: Option<&[TemplateArgument]>,
) -> Option<TemplateParameterList> {
    let data = type_checker.symbols.get(template);
    if data.kind != SymbolKind::FunctionTemplate {
        trace!("`{}` is not a function template", data.name);
        return None;
    }
    let name = data.name.clone();
    let function_type = data.ty;
    let list = data.specs.template_parameters.clone()?;
    let parameter_symbols = data.specs.related_symbols.clone();

    let formals = type_checker.types.function_parameters(function_type).to_vec();
    let required = required_arguments(type_checker, &formals, &parameter_symbols);
    if arguments.len() < required {
        trace!("`{}` needs at least {} arguments, got {}", name, required, arguments.len());
        return None;
    }

    let list = deduce_arguments(type_checker, &list, &formals, arguments, explicit)?;
    if substitute_type(type_checker, function_type, &list).is_none() {
        trace!("`{}` does not substitute with the deduced arguments", name);
        return None;
    }
    debug!("deduced {} argument(s) for `{}`", list.len(), name);
    Some(list)
}

/// Formals before the first defaulted parameter or the trailing pack.
fn required_arguments(type_checker: &TypeChecker, formals: &[TypeId], parameters: &[SymbolId]) -> usize {
    formals
        .iter()
        .enumerate()
        .take_while(|(index, formal)| {
            let defaulted = parameters
                .get(*index)
                .map(|p| type_checker.symbols.get(*p).specs.default_argument.is_some())
                .unwrap_or(false);
            !defaulted && !type_checker.types.is_pack(**formal)
        })
        .count()
}

/// Deduction of `list` from formal parameter types and call arguments.
pub fn deduce_arguments(
    type_checker: &mut TypeChecker,
    list: &TemplateParameterList,
    formals: &[TypeId],
    arguments: &[CallArgument],
    explicit: Option<&[TemplateArgument]>,
) -> Option<TemplateParameterList> {
    let mut list = list.clone();
    if let Some(explicit) = explicit {
        splice_explicit(type_checker, &mut list, explicit)?;
    }

    // Formals with the explicit arguments in place; a fully specified
    // pack expands into several formals.
    let mut substituted = vec![];
    for formal in formals {
        let ty = substitute_type(type_checker, *formal, &list)?;
        match type_checker.types.kind(ty).clone() {
            TypeKind::Sequence(types) if type_checker.types.is_pack(*formal) => substituted.extend(types),
            _ => substituted.push(ty),
        }
    }

    let mut sets = vec![];
    let mut position = 0;
    for (index, formal) in substituted.iter().copied().enumerate() {
        if type_checker.types.is_pack(formal) {
            if index + 1 != substituted.len() {
                trace!("pack parameter that is not last is not deduced");
                continue;
            }
            let rest = arguments.get(position..).unwrap_or(&[]);
            position = arguments.len();
            sets.push(deduce_pack(type_checker, formal, rest)?);
            break;
        }
        let Some(argument) = arguments.get(position) else {
            break;
        };
        position += 1;
        if !type_checker.types.is_dependent(formal) {
            continue;
        }
        sets.push(deduce_pair(type_checker, formal, argument)?);
    }
    if position < arguments.len() {
        trace!("{} arguments for {} parameters", arguments.len(), substituted.len());
        return None;
    }

    let list = finish_deduction(type_checker, &list, sets)?;
    verify(type_checker, &list, &substituted, arguments)?;
    Some(list)
}

/// Binds explicitly specified arguments in order. A pack parameter takes
/// all that remain.
fn splice_explicit(
    type_checker: &TypeChecker,
    list: &mut TemplateParameterList,
    explicit: &[TemplateArgument],
) -> Option<()> {
    let mut flattened = vec![];
    for argument in explicit {
        match argument {
            TemplateArgument::Type(ty) => match type_checker.types.kind(*ty) {
                TypeKind::Sequence(types) => flattened.extend(types.iter().map(|t| TemplateArgument::Type(*t))),
                _ => flattened.push(argument.clone()),
            },
            _ => flattened.push(argument.clone()),
        }
    }

    let mut remaining = flattened.into_iter().peekable();
    for position in 0..list.len() {
        if remaining.peek().is_none() {
            break;
        }
        let kind = list.parameters[position].key.kind;
        if kind.is_pack() {
            let rest: Vec<TemplateArgument> = remaining.by_ref().collect();
            list.bind(position, TemplateArgument::Pack(rest), ArgumentProvenance::Explicit);
            break;
        }
        let argument = remaining.next()?;
        let fits = matches!(
            (kind, &argument),
            (TemplateParameterKind::Type, TemplateArgument::Type(_))
                | (TemplateParameterKind::NonType, TemplateArgument::Value { .. })
                | (TemplateParameterKind::Template, TemplateArgument::Template(_))
        );
        if !fits {
            trace!("explicit argument {:?} does not fit parameter {}", argument, position);
            return None;
        }
        list.bind(position, argument, ArgumentProvenance::Explicit);
    }
    if remaining.next().is_some() {
        trace!("too many explicit template arguments");
        return None;
    }
    Some(())
}

/// The formal and actual types unification works on.
///
/// Reference formals match the referenced type. `T&&` with an lvalue
/// deduces `T` as an lvalue reference. Other formals see the actual with
/// its reference and top-level qualifiers removed, arrays and functions
/// decayed to pointers.
fn adjust(type_checker: &mut TypeChecker, formal: TypeId, argument: &CallArgument) -> (TypeId, TypeId) {
    let types = &mut type_checker.types;
    if types.is_reference(formal) {
        let referenced = types.no_ref(formal);
        if types.is_rvalue_reference(formal)
            && types.is_template_parameter(referenced)
            && types.cv(referenced).is_empty()
            && argument.is_lvalue
        {
            let actual = types.no_ref(argument.ty);
            return (referenced, types.lvalue_reference(actual));
        }
        return (referenced, types.no_ref(argument.ty));
    }

    let formal = types.unqualified(formal);
    let actual = types.no_ref(argument.ty);
    let actual = match types.kind(actual).clone() {
        TypeKind::Array { element, .. } => types.pointer_to(element),
        TypeKind::Function { .. } => types.pointer_to(actual),
        _ => types.unqualified(actual),
    };
    (formal, actual)
}

fn deduce_pair(type_checker: &mut TypeChecker, formal: TypeId, argument: &CallArgument) -> Option<DeductionSet> {
    let (formal, actual) = adjust(type_checker, formal, argument);
    if let TypeKind::UnresolvedOverload { candidates, .. } = type_checker.types.kind(actual).clone() {
        return Some(deduce_from_overload(type_checker, formal, &candidates));
    }
    let mut set = DeductionSet::new();
    if !unify(type_checker, formal, actual, &mut set) {
        trace!(
            "{} conflicts with earlier deductions",
            type_checker.types.describe(actual, &type_checker.symbols)
        );
        return None;
    }
    Some(set)
}

fn deduce_pack(type_checker: &mut TypeChecker, formal: TypeId, arguments: &[CallArgument]) -> Option<DeductionSet> {
    let TypeKind::Pack(pattern) = type_checker.types.kind(formal).clone() else {
        return Some(DeductionSet::new());
    };
    let mut element_pattern = pattern;
    let mut actuals = vec![];
    for argument in arguments {
        let (adjusted_formal, actual) = adjust(type_checker, pattern, argument);
        element_pattern = adjusted_formal;
        actuals.push(actual);
    }
    let pack = type_checker.types.pack(element_pattern);
    let sequence = type_checker.types.sequence(actuals);
    let mut set = DeductionSet::new();
    if !unify(type_checker, pack, sequence, &mut set) {
        return None;
    }
    Some(set)
}

/// An overloaded function name deduces only when exactly one
/// non-template candidate matches.
fn deduce_from_overload(type_checker: &mut TypeChecker, formal: TypeId, candidates: &[SymbolId]) -> DeductionSet {
    let mut found: Option<DeductionSet> = None;
    for candidate in candidates {
        let data = type_checker.symbols.get(*candidate);
        if data.kind.is_template() {
            continue;
        }
        let ty = data.ty;
        let actual = if type_checker.types.is_pointer(formal) {
            type_checker.types.pointer_to(ty)
        } else {
            ty
        };
        let mut set = DeductionSet::new();
        if unify(type_checker, formal, actual, &mut set) && !set.deductions.is_empty() {
            if found.is_some() {
                trace!("several overloads match; argument is not deduced");
                return DeductionSet::new();
            }
            found = Some(set);
        }
    }
    found.unwrap_or_default()
}

/// Re-checks every argument against its formal with the final bindings.
/// Formals that no longer mention a template parameter take part in
/// ordinary conversions and are not checked here.
fn verify(
    type_checker: &mut TypeChecker,
    list: &TemplateParameterList,
    formals: &[TypeId],
    arguments: &[CallArgument],
) -> Option<()> {
    let pack_start = formals.iter().position(|f| type_checker.types.is_pack(*f));
    for (index, argument) in arguments.iter().enumerate() {
        let formal = match pack_start {
            Some(start) if index >= start => formals[start],
            _ => *formals.get(index)?,
        };
        if !type_checker.types.is_dependent(formal) {
            continue;
        }

        let (pattern, element_list) = match (type_checker.types.kind(formal).clone(), pack_start) {
            (TypeKind::Pack(pattern), Some(start)) => {
                (pattern, pack_element_list(type_checker, pattern, list, index - start)?)
            }
            _ => (formal, list.clone()),
        };
        let (adjusted_formal, actual) = adjust(type_checker, pattern, argument);
        let expected = substitute_type(type_checker, adjusted_formal, &element_list)?;
        if !argument_matches(type_checker, pattern, expected, actual) {
            debug!(
                "argument {} has type {}, deduction expects {}",
                index,
                type_checker.describe(actual),
                type_checker.describe(expected)
            );
            return None;
        }
    }
    Some(())
}

/// `list` with every pack of `pattern` narrowed to its `element`-th entry.
fn pack_element_list(
    type_checker: &TypeChecker,
    pattern: TypeId,
    list: &TemplateParameterList,
    element: usize,
) -> Option<TemplateParameterList> {
    let mut keys = vec![];
    collect_pack_keys(type_checker, pattern, &mut keys);
    let mut element_list = list.clone();
    for key in keys {
        if let Some(TemplateArgument::Pack(elements)) = list.lookup(&key) {
            bind_pack_element(&mut element_list, &key, elements.get(element)?.clone());
        }
    }
    Some(element_list)
}

fn argument_matches(type_checker: &TypeChecker, formal: TypeId, expected: TypeId, actual: TypeId) -> bool {
    let types = &type_checker.types;
    let symbols = &type_checker.symbols;
    if expected == actual {
        return true;
    }
    match types.kind(actual) {
        TypeKind::UnresolvedOverload { candidates, .. } => {
            let target = types.pointer_pointee(expected).unwrap_or(expected);
            return candidates.iter().any(|c| symbols.get(*c).ty == target);
        }
        TypeKind::Sequence(_) => return true,
        _ => {}
    }

    // A reference may bind to a less qualified object.
    if types.is_reference(formal) {
        let (expected_cv, actual_cv) = (types.cv(expected), types.cv(actual));
        if expected_cv.contains(actual_cv) && same_unqualified(type_checker, expected, actual) {
            return true;
        }
    }

    // Qualification and derived-to-base pointer conversions.
    if let (Some(expected_pointee), Some(actual_pointee)) = (types.pointer_pointee(expected), types.pointer_pointee(actual)) {
        if types.cv(expected_pointee).contains(types.cv(actual_pointee)) {
            if same_unqualified(type_checker, expected_pointee, actual_pointee) {
                return true;
            }
            if let (Some(base), Some(derived)) =
                (types.named_symbol(expected_pointee), types.named_symbol(actual_pointee))
            {
                if symbols.is_derived_from(derived, base) {
                    return true;
                }
            }
        }
    }

    // Deduced base class, derived class argument.
    if type_checker.config.lenient_derived_deduction {
        if let (Some(base), Some(derived)) = (types.named_symbol(expected), types.named_symbol(actual)) {
            if symbols.is_derived_from(derived, base) {
                trace!("accepting derived class argument for deduced base");
                return true;
            }
        }
    }
    false
}

fn same_unqualified(type_checker: &TypeChecker, a: TypeId, b: TypeId) -> bool {
    type_checker.types.kind(a) == type_checker.types.kind(b)
}
