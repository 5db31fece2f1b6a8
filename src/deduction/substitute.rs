use tracing::trace;

use crate::{
    symbols::{scope::ScopeKind, symbols::{SymbolId, SymbolKind}},
    type_checker::type_checker::TypeChecker,
    types::types::{ArrayBound, CvQualifiers, TemplateName, TypeId, TypeKind},
};

use super::deduction::{
    substitute_argument, ArgumentProvenance, TemplateArgument, TemplateParameterKey, TemplateParameterList,
};

/// Replaces the template parameters of `ty` bound in `list`.
///
/// Unbound parameters are left in place. Returns `None` when the result
/// would not be a valid type, such as a pointer to a reference, an array
/// of functions or an array of zero elements.
pub fn substitute_type(type_checker: &mut TypeChecker, ty: TypeId, list: &TemplateParameterList) -> Option<TypeId> {
    if !type_checker.types.is_dependent(ty) && !type_checker.types.is_pack(ty) {
        return Some(ty);
    }

    let cv = type_checker.types.cv(ty);
    let result = match type_checker.types.kind(ty).clone() {
        TypeKind::TemplateParameter(key) => match list.lookup(&key).cloned() {
            None => return Some(ty),
            Some(TemplateArgument::Type(bound)) => bound,
            Some(TemplateArgument::Pack(elements)) => {
                let types = elements
                    .iter()
                    .map(|element| match element {
                        TemplateArgument::Type(t) => Some(*t),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>()?;
                type_checker.types.sequence(types)
            }
            Some(other) => {
                trace!("`{}` is bound to {:?}, not a type", key.name, other);
                return None;
            }
        },
        TypeKind::Pointer(pointee) => {
            let pointee = substitute_type(type_checker, pointee, list)?;
            if type_checker.types.is_reference(pointee) {
                trace!("pointer to reference");
                return None;
            }
            type_checker.types.pointer_to(pointee)
        }
        TypeKind::Reference { referenced, rvalue } => {
            let referenced = substitute_type(type_checker, referenced, list)?;
            if type_checker.types.is_void(referenced) {
                trace!("reference to void");
                return None;
            }
            if rvalue {
                type_checker.types.rvalue_reference(referenced)
            } else {
                type_checker.types.lvalue_reference(referenced)
            }
        }
        TypeKind::Complex(base) => {
            let base = substitute_type(type_checker, base, list)?;
            type_checker.types.complex(base)
        }
        TypeKind::PointerToMember { pointee, class } => {
            let pointee = substitute_type(type_checker, pointee, list)?;
            let class = substitute_type(type_checker, class, list)?;
            if !type_checker.types.is_class(class, &type_checker.symbols) && !type_checker.types.is_dependent(class) {
                trace!("pointer to member of a non-class");
                return None;
            }
            type_checker.types.pointer_to_member(pointee, class)
        }
        TypeKind::Array {
            element,
            lower,
            size,
            assumed_shape,
        } => {
            let element = substitute_type(type_checker, element, list)?;
            let types = &type_checker.types;
            if types.is_void(element) || types.is_function(element) || types.is_reference(element) {
                trace!("array of invalid element type");
                return None;
            }
            let lower = substitute_bound(&lower, list)?;
            let size = substitute_bound(&size, list)?;
            if matches!(size, ArrayBound::Known(n) if n <= 0) {
                trace!("array of non-positive size");
                return None;
            }
            type_checker.types.intern(
                TypeKind::Array {
                    element,
                    lower,
                    size,
                    assumed_shape,
                },
                CvQualifiers::NONE,
            )
        }
        TypeKind::Function {
            result,
            parameters,
            variadic,
            lacks_prototype,
        } => {
            let result = substitute_type(type_checker, result, list)?;
            if type_checker.types.is_array(result) || type_checker.types.is_function(result) {
                trace!("function returning an array or a function");
                return None;
            }
            let mut substituted = vec![];
            for parameter in parameters {
                if type_checker.types.is_pack(parameter) {
                    substituted.extend(expand_pack(type_checker, parameter, list)?);
                    continue;
                }
                let parameter = substitute_type(type_checker, parameter, list)?;
                if type_checker.types.is_void(parameter) {
                    trace!("parameter of type void");
                    return None;
                }
                substituted.push(parameter);
            }
            type_checker.types.intern(
                TypeKind::Function {
                    result,
                    parameters: substituted,
                    variadic,
                    lacks_prototype,
                },
                CvQualifiers::NONE,
            )
        }
        TypeKind::DependentSpecialization { template, arguments } => {
            let arguments = substitute_arguments(type_checker, &arguments, list)?;
            let template = match template {
                TemplateName::Symbol(symbol) => symbol,
                TemplateName::Parameter(key) => match list.lookup(&key).cloned() {
                    Some(TemplateArgument::Template(symbol)) => symbol,
                    None => {
                        return Some(
                            type_checker
                                .types
                                .dependent_specialization(TemplateName::Parameter(key), arguments),
                        )
                    }
                    Some(_) => return None,
                },
            };
            if arguments.iter().any(|a| argument_is_dependent(type_checker, a)) {
                type_checker
                    .types
                    .dependent_specialization(TemplateName::Symbol(template), arguments)
            } else {
                let specialization = specialize_class(type_checker, template, arguments)?;
                type_checker.types.named(specialization)
            }
        }
        TypeKind::Pack(_) => {
            let types = expand_pack(type_checker, ty, list)?;
            if types == [ty] {
                return Some(ty);
            }
            type_checker.types.sequence(types)
        }
        TypeKind::Sequence(types) => {
            let types = types
                .into_iter()
                .map(|t| substitute_type(type_checker, t, list))
                .collect::<Option<Vec<_>>>()?;
            type_checker.types.sequence(types)
        }
        _ => ty,
    };

    Some(type_checker.types.qualified(result, cv))
}

fn substitute_bound(bound: &ArrayBound, list: &TemplateParameterList) -> Option<ArrayBound> {
    match bound {
        ArrayBound::Dependent(key) => match list.lookup(key) {
            None => Some(bound.clone()),
            Some(TemplateArgument::Value { value, .. }) => Some(ArrayBound::Known(value.as_i64()?)),
            Some(_) => None,
        },
        _ => Some(bound.clone()),
    }
}

fn argument_is_dependent(type_checker: &TypeChecker, argument: &TemplateArgument) -> bool {
    match argument {
        TemplateArgument::Type(ty) => type_checker.types.is_dependent(*ty),
        TemplateArgument::Parameter(_) => true,
        TemplateArgument::Pack(elements) => elements.iter().any(|e| argument_is_dependent(type_checker, e)),
        TemplateArgument::Value { .. } | TemplateArgument::Template(_) => false,
    }
}

/// Substitutes a template argument list, splicing expanded packs in place.
pub fn substitute_arguments(
    type_checker: &mut TypeChecker,
    arguments: &[TemplateArgument],
    list: &TemplateParameterList,
) -> Option<Vec<TemplateArgument>> {
    let mut result = vec![];
    for argument in arguments {
        match argument {
            TemplateArgument::Type(ty) if type_checker.types.is_pack(*ty) => {
                let types = expand_pack(type_checker, *ty, list)?;
                result.extend(types.into_iter().map(TemplateArgument::Type));
            }
            TemplateArgument::Parameter(key) if key.kind.is_pack() => match list.lookup(key) {
                Some(TemplateArgument::Pack(elements)) => result.extend(elements.iter().cloned()),
                Some(other) => result.push(other.clone()),
                None => result.push(argument.clone()),
            },
            _ => result.push(substitute_argument(type_checker, argument, list)?),
        }
    }
    Some(result)
}

/// Expands `pattern...` into one type per element of the packs it names.
fn expand_pack(type_checker: &mut TypeChecker, pack: TypeId, list: &TemplateParameterList) -> Option<Vec<TypeId>> {
    let pattern = match type_checker.types.kind(pack) {
        TypeKind::Pack(pattern) => *pattern,
        _ => pack,
    };
    let mut keys = vec![];
    collect_pack_keys(type_checker, pattern, &mut keys);

    let mut length = None;
    for key in &keys {
        if let Some(TemplateArgument::Pack(elements)) = list.lookup(key) {
            match length {
                None => length = Some(elements.len()),
                Some(n) if n != elements.len() => {
                    trace!("packs of different lengths expanded together");
                    return None;
                }
                Some(_) => {}
            }
        }
    }
    let Some(length) = length else {
        return Some(vec![pack]);
    };

    let mut expanded = vec![];
    for index in 0..length {
        let mut element_list = list.clone();
        for key in &keys {
            if let Some(TemplateArgument::Pack(elements)) = list.lookup(key) {
                let element = elements[index].clone();
                bind_pack_element(&mut element_list, key, element);
            }
        }
        expanded.push(substitute_type(type_checker, pattern, &element_list)?);
    }
    Some(expanded)
}

pub fn bind_pack_element(list: &mut TemplateParameterList, key: &TemplateParameterKey, element: TemplateArgument) {
    if key.nesting == list.nesting {
        if key.position < list.len() {
            list.arguments[key.position] = Some(element);
        }
    } else if let Some(enclosing) = list.enclosing.as_mut() {
        bind_pack_element(enclosing, key, element);
    }
}

/// Pack parameters mentioned in a type.
pub fn collect_pack_keys(type_checker: &TypeChecker, ty: TypeId, keys: &mut Vec<TemplateParameterKey>) {
    let types = &type_checker.types;
    match types.kind(ty) {
        TypeKind::TemplateParameter(key) => {
            if key.kind.is_pack() && !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        TypeKind::Pointer(inner) | TypeKind::Complex(inner) | TypeKind::Pack(inner) => {
            collect_pack_keys(type_checker, *inner, keys)
        }
        TypeKind::Reference { referenced, .. } => collect_pack_keys(type_checker, *referenced, keys),
        TypeKind::PointerToMember { pointee, class } => {
            collect_pack_keys(type_checker, *pointee, keys);
            collect_pack_keys(type_checker, *class, keys);
        }
        TypeKind::Array { element, size, .. } => {
            collect_pack_keys(type_checker, *element, keys);
            if let ArrayBound::Dependent(key) = size {
                if key.kind.is_pack() && !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
        TypeKind::Function {
            result, parameters, ..
        } => {
            collect_pack_keys(type_checker, *result, keys);
            for parameter in parameters {
                collect_pack_keys(type_checker, *parameter, keys);
            }
        }
        TypeKind::DependentSpecialization { arguments, .. } => {
            for argument in arguments {
                match argument {
                    TemplateArgument::Type(t) => collect_pack_keys(type_checker, *t, keys),
                    TemplateArgument::Parameter(key) if key.kind.is_pack() => {
                        if !keys.contains(key) {
                            keys.push(key.clone());
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

/// The specialization of a class template for `arguments`, created on
/// first request. Bases of the pattern are substituted into it.
pub fn specialize_class(
    type_checker: &mut TypeChecker,
    template: SymbolId,
    arguments: Vec<TemplateArgument>,
) -> Option<SymbolId> {
    let template = type_checker.symbols.resolve(template);
    let memo_key = (template, arguments.clone());
    if let Some(existing) = type_checker.class_specializations.get(&memo_key) {
        return Some(*existing);
    }

    let pattern = type_checker.symbols.get(template).clone();
    if pattern.kind != SymbolKind::ClassTemplate {
        trace!("`{}` is not a class template", pattern.name);
        return None;
    }
    let mut list = pattern.specs.template_parameters.clone()?;
    let mut remaining = arguments.into_iter();
    for position in 0..list.len() {
        if list.parameters[position].key.kind.is_pack() {
            let rest: Vec<TemplateArgument> = remaining.by_ref().collect();
            list.bind(position, TemplateArgument::Pack(rest), ArgumentProvenance::Explicit);
            break;
        }
        if let Some(argument) = remaining.next() {
            list.bind(position, argument, ArgumentProvenance::Explicit);
        }
    }
    if remaining.next().is_some() {
        trace!("too many template arguments for `{}`", pattern.name);
        return None;
    }
    for position in 0..list.len() {
        if list.argument(position).is_some() {
            continue;
        }
        match list.parameters[position].default.clone() {
            Some(default) => {
                let argument = substitute_argument(type_checker, &default, &list)?;
                list.bind(position, argument, ArgumentProvenance::Default);
            }
            None => {
                trace!("missing template argument for `{}`", pattern.name);
                return None;
            }
        }
    }

    let specialization = type_checker
        .symbols
        .new_detached_symbol(pattern.scope, &pattern.name, SymbolKind::Class);
    type_checker
        .symbols
        .new_scope(ScopeKind::Class, pattern.scope, Some(specialization));
    let ty = type_checker.types.named(specialization);
    {
        let data = type_checker.symbols.get_mut(specialization);
        data.ty = ty;
        data.defined = pattern.defined;
        data.span = pattern.span.clone();
        data.specs.template_of = Some(template);
        data.specs.template_arguments = Some(list.clone());
        data.specs.friends = pattern.specs.friends.clone();
        data.specs.bases = pattern.specs.bases.clone();
    }
    type_checker.class_specializations.insert(memo_key, specialization);
    type_checker
        .symbols
        .get_mut(template)
        .specs
        .specializations
        .push(specialization);

    for base in &pattern.specs.dependent_bases {
        let base = substitute_type(type_checker, *base, &list)?;
        match type_checker.types.named_symbol(base) {
            Some(symbol) => type_checker.symbols.get_mut(specialization).specs.bases.push(symbol),
            None => trace!("base of `{}` is not a class after substitution", pattern.name),
        }
    }

    trace!(
        "specialized `{}` as {:?}",
        type_checker.symbols.qualified_name(specialization),
        specialization
    );
    Some(specialization)
}
