use std::collections::HashMap;

use tracing::trace;

use crate::{
    const_value::const_value::ConstValue,
    symbols::symbols::SymbolId,
    type_checker::type_checker::TypeChecker,
    types::types::{ArrayBound, CvQualifiers, TemplateName, TypeId, TypeKind},
};

use super::{
    deduction::{DeducedParameter, DeductionSet, TemplateArgument, TemplateParameterKey},
    substitute::collect_pack_keys,
};

/// Matches `formal` against `actual`, recording what each template
/// parameter of `formal` must be.
///
/// Shapes that do not line up deduce nothing; the later verification
/// step rejects them. Only contradictory deductions return false.
pub fn unify(type_checker: &mut TypeChecker, formal: TypeId, actual: TypeId, set: &mut DeductionSet) -> bool {
    if !type_checker.types.is_dependent(formal) {
        return true;
    }

    match type_checker.types.kind(formal).clone() {
        TypeKind::TemplateParameter(key) => unify_parameter(type_checker, formal, &key, actual, set),
        TypeKind::Pack(pattern) => {
            let actuals = match type_checker.types.kind(actual).clone() {
                TypeKind::Sequence(types) => types,
                _ => vec![actual],
            };
            unify_pack(type_checker, pattern, &actuals, set)
        }
        TypeKind::Pointer(formal_pointee) => match type_checker.types.kind(actual).clone() {
            TypeKind::Pointer(actual_pointee) => unify(type_checker, formal_pointee, actual_pointee, set),
            _ => true,
        },
        TypeKind::Reference { referenced, .. } => {
            let actual = type_checker.types.no_ref(actual);
            unify(type_checker, referenced, actual, set)
        }
        TypeKind::Complex(formal_base) => match type_checker.types.kind(actual).clone() {
            TypeKind::Complex(actual_base) => unify(type_checker, formal_base, actual_base, set),
            _ => true,
        },
        TypeKind::PointerToMember { pointee, class } => match type_checker.types.kind(actual).clone() {
            TypeKind::PointerToMember {
                pointee: actual_pointee,
                class: actual_class,
            } => {
                unify(type_checker, pointee, actual_pointee, set)
                    && unify(type_checker, class, actual_class, set)
            }
            _ => true,
        },
        TypeKind::Array { element, size, .. } => match type_checker.types.kind(actual).clone() {
            TypeKind::Array {
                element: actual_element,
                size: actual_size,
                ..
            } => {
                if let (ArrayBound::Dependent(key), ArrayBound::Known(n)) = (&size, &actual_size) {
                    let ty = type_checker.types.integer(8, false);
                    let value = ConstValue::int(*n as i128, 8, false);
                    if !set.add(key, DeducedParameter::Value { value, ty }) {
                        return false;
                    }
                }
                unify(type_checker, element, actual_element, set)
            }
            _ => true,
        },
        TypeKind::Function {
            result, parameters, ..
        } => match type_checker.types.kind(actual).clone() {
            TypeKind::Function {
                result: actual_result,
                parameters: actual_parameters,
                ..
            } => {
                unify(type_checker, result, actual_result, set)
                    && unify_type_lists(type_checker, &parameters, &actual_parameters, set)
            }
            _ => true,
        },
        TypeKind::DependentSpecialization { template, arguments } => {
            unify_specialization(type_checker, &template, &arguments, actual, set)
        }
        _ => true,
    }
}

fn unify_parameter(
    type_checker: &mut TypeChecker,
    formal: TypeId,
    key: &TemplateParameterKey,
    actual: TypeId,
    set: &mut DeductionSet,
) -> bool {
    let formal_cv = type_checker.types.cv(formal);
    if key.kind.is_pack() {
        let actuals = match type_checker.types.kind(actual).clone() {
            TypeKind::Sequence(types) => types,
            _ => vec![actual],
        };
        let elements = actuals
            .into_iter()
            .map(|a| DeducedParameter::Type(strip_cv(type_checker, a, formal_cv)))
            .collect();
        return set.add_pack(key, elements);
    }
    if type_checker.types.is_sequence(actual) {
        return true;
    }
    let deduced = strip_cv(type_checker, actual, formal_cv);
    trace!(
        "`{}` := {}",
        key.name,
        type_checker.types.describe(deduced, &type_checker.symbols)
    );
    set.add(key, DeducedParameter::Type(deduced))
}

/// Removes from `actual` the qualifiers the formal already spells out.
fn strip_cv(type_checker: &mut TypeChecker, actual: TypeId, formal_cv: CvQualifiers) -> TypeId {
    if formal_cv.is_empty() {
        return actual;
    }
    let cv = type_checker.types.cv(actual).without(formal_cv);
    let kind = type_checker.types.kind(actual).clone();
    type_checker.types.intern(kind, cv)
}

/// Every element of `actuals` is matched against `pattern`; each pack
/// parameter named by the pattern collects one deduction per element.
fn unify_pack(type_checker: &mut TypeChecker, pattern: TypeId, actuals: &[TypeId], set: &mut DeductionSet) -> bool {
    let mut keys = vec![];
    collect_pack_keys(type_checker, pattern, &mut keys);

    let mut per_key: HashMap<TemplateParameterKey, Vec<DeducedParameter>> = HashMap::new();
    for actual in actuals {
        let mut element_set = DeductionSet::new();
        if !unify(type_checker, pattern, *actual, &mut element_set) {
            return false;
        }
        for deduction in element_set.deductions {
            if keys.contains(&deduction.key) {
                if let Some(first) = deduction.deduced.into_iter().next() {
                    per_key.entry(deduction.key).or_default().push(first);
                }
            } else {
                for deduced in deduction.deduced {
                    if !set.add(&deduction.key, deduced) {
                        return false;
                    }
                }
            }
        }
    }

    for key in keys {
        let elements = per_key.remove(&key).unwrap_or_default();
        if elements.len() != actuals.len() {
            trace!("pack `{}` not deduced from every element", key.name);
            continue;
        }
        if !set.add_pack(&key, elements) {
            return false;
        }
    }
    true
}

/// Pairs two parameter lists; a trailing pack absorbs what is left.
fn unify_type_lists(type_checker: &mut TypeChecker, formals: &[TypeId], actuals: &[TypeId], set: &mut DeductionSet) -> bool {
    for (index, formal) in formals.iter().enumerate() {
        if type_checker.types.is_pack(*formal) {
            let rest = actuals.get(index..).unwrap_or(&[]).to_vec();
            let sequence = type_checker.types.sequence(rest);
            return unify(type_checker, *formal, sequence, set);
        }
        match actuals.get(index) {
            Some(actual) => {
                if !unify(type_checker, *formal, *actual, set) {
                    return false;
                }
            }
            None => return true,
        }
    }
    true
}

fn unify_specialization(
    type_checker: &mut TypeChecker,
    template: &TemplateName,
    arguments: &[TemplateArgument],
    actual: TypeId,
    set: &mut DeductionSet,
) -> bool {
    let actual = type_checker.types.unqualified(actual);
    match type_checker.types.kind(actual).clone() {
        TypeKind::Named(class) => {
            if let Some(result) = unify_with_class(type_checker, template, arguments, class, set) {
                return result;
            }
            // A derived class deduces through the first base that matches.
            let mut pending = type_checker.symbols.base_classes(class);
            let mut visited = vec![class];
            while let Some(base) = pending.pop() {
                if visited.contains(&base) {
                    continue;
                }
                visited.push(base);
                let mut base_set = set.clone();
                match unify_with_class(type_checker, template, arguments, base, &mut base_set) {
                    Some(true) => {
                        trace!(
                            "deduced through base `{}`",
                            type_checker.symbols.qualified_name(base)
                        );
                        *set = base_set;
                        return true;
                    }
                    Some(false) => {}
                    None => pending.extend(type_checker.symbols.base_classes(base)),
                }
            }
            true
        }
        TypeKind::Sequence(elements) if names_initializer_list(type_checker, template) => {
            let Some(TemplateArgument::Type(element_formal)) = arguments.first() else {
                return true;
            };
            let element_formal = *element_formal;
            elements
                .into_iter()
                .all(|element| unify(type_checker, element_formal, element, set))
        }
        _ => true,
    }
}

fn names_initializer_list(type_checker: &TypeChecker, template: &TemplateName) -> bool {
    match template {
        TemplateName::Symbol(symbol) => type_checker.symbols.get(*symbol).name == "initializer_list",
        TemplateName::Parameter(_) => false,
    }
}

/// `None` when `class` is not a specialization of `template`.
fn unify_with_class(
    type_checker: &mut TypeChecker,
    template: &TemplateName,
    arguments: &[TemplateArgument],
    class: SymbolId,
    set: &mut DeductionSet,
) -> Option<bool> {
    let data = type_checker.symbols.get(class);
    let specialized_from = data.specs.template_of.map(|t| type_checker.symbols.resolve(t))?;
    let actual_arguments = data.specs.template_arguments.as_ref()?.bound_arguments();

    match template {
        TemplateName::Symbol(symbol) => {
            if type_checker.symbols.resolve(*symbol) != specialized_from {
                return None;
            }
        }
        TemplateName::Parameter(key) => {
            if !set.add(key, DeducedParameter::Template(specialized_from)) {
                return Some(false);
            }
        }
    }
    Some(unify_arguments(type_checker, arguments, &actual_arguments, set))
}

fn unify_arguments(
    type_checker: &mut TypeChecker,
    formals: &[TemplateArgument],
    actuals: &[TemplateArgument],
    set: &mut DeductionSet,
) -> bool {
    // Packs in the class's own argument list hold the trailing arguments.
    let actuals: Vec<TemplateArgument> = actuals
        .iter()
        .flat_map(|a| match a {
            TemplateArgument::Pack(elements) => elements.clone(),
            other => vec![other.clone()],
        })
        .collect();

    for (index, formal) in formals.iter().enumerate() {
        match formal {
            TemplateArgument::Type(ty) if type_checker.types.is_pack(*ty) => {
                let rest = actuals
                    .get(index..)
                    .unwrap_or(&[])
                    .iter()
                    .filter_map(|a| match a {
                        TemplateArgument::Type(t) => Some(*t),
                        _ => None,
                    })
                    .collect();
                let sequence = type_checker.types.sequence(rest);
                return unify(type_checker, *ty, sequence, set);
            }
            TemplateArgument::Parameter(key) if key.kind.is_pack() => {
                let rest = actuals
                    .get(index..)
                    .unwrap_or(&[])
                    .iter()
                    .filter_map(as_deduced)
                    .collect();
                return set.add_pack(key, rest);
            }
            _ => {}
        }

        let Some(actual) = actuals.get(index) else {
            return true;
        };
        let agrees = match (formal, actual) {
            (TemplateArgument::Type(f), TemplateArgument::Type(a)) => unify(type_checker, *f, *a, set),
            (TemplateArgument::Parameter(key), actual) => match as_deduced(actual) {
                Some(deduced) => set.add(key, deduced),
                None => true,
            },
            _ => true,
        };
        if !agrees {
            return false;
        }
    }
    true
}

fn as_deduced(argument: &TemplateArgument) -> Option<DeducedParameter> {
    match argument {
        TemplateArgument::Type(ty) => Some(DeducedParameter::Type(*ty)),
        TemplateArgument::Value { value, ty } => Some(DeducedParameter::Value {
            value: value.clone(),
            ty: *ty,
        }),
        TemplateArgument::Template(symbol) => Some(DeducedParameter::Template(*symbol)),
        TemplateArgument::Parameter(_) | TemplateArgument::Pack(_) => None,
    }
}
