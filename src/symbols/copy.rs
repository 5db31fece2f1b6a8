use std::collections::HashMap;

use tracing::trace;

use crate::{
    deduction::substitute::substitute_type,
    internal_error,
    nodecl::nodecl::Nodecl,
    type_checker::type_checker::TypeChecker,
    types::types::{TypeId, TypeKind, TypeTable},
};

use super::{
    scope::DeclContext,
    symbols::{EntitySpecs, SymbolId, SymbolKind},
};

/// Replacement symbols used while copying: references to a key are
/// rewritten to its value.
pub type SymbolMap = HashMap<SymbolId, SymbolId>;

/// Makes `dest` an independent copy of `source`.
///
/// The type is remapped through `symbol_map` and substituted with the
/// template arguments of `context`; the value and default arguments are
/// deep-copied. The scope of `dest` is left alone. Extended data is not
/// copied.
///
/// Classes and namespaces cannot be copied this way.
pub fn copy_symbol(
    type_checker: &mut TypeChecker,
    dest: SymbolId,
    source: SymbolId,
    symbol_map: &SymbolMap,
    context: &DeclContext,
) {
    let source_data = type_checker.symbols.get(source).clone();
    if matches!(source_data.kind, SymbolKind::Class | SymbolKind::Namespace) {
        internal_error!(
            "cannot deep-copy {:?} `{}`",
            source_data.kind,
            source_data.name
        );
    }
    trace!("copying `{}` into {:?}", source_data.name, dest);

    let ty = copy_type(type_checker, source_data.ty, symbol_map, context);
    let value = source_data
        .value
        .as_ref()
        .map(|value| copy_nodecl(type_checker, value, symbol_map, context));
    let specs = copy_specs(type_checker, &source_data.specs, symbol_map, context);

    let dest_data = type_checker.symbols.get_mut(dest);
    dest_data.kind = source_data.kind;
    dest_data.defined = source_data.defined;
    dest_data.ty = ty;
    dest_data.value = value;
    dest_data.span = source_data.span.clone();
    dest_data.printable = source_data.printable;
    dest_data.specs = specs;

    if source_data.kind.is_function_like() {
        relink_parameters(type_checker, dest, source);
    }
}

fn copy_type(type_checker: &mut TypeChecker, ty: TypeId, symbol_map: &SymbolMap, context: &DeclContext) -> TypeId {
    if ty == TypeId::ERROR {
        return ty;
    }
    let remapped = remap_type(&mut type_checker.types, ty, symbol_map);
    match &context.template_parameters {
        Some(list) => substitute_type(type_checker, remapped, list).unwrap_or_else(|| {
            trace!(
                "substitution into `{}` failed, the copy keeps the dependent type",
                type_checker.describe(remapped)
            );
            remapped
        }),
        None => remapped,
    }
}

fn copy_nodecl(
    type_checker: &mut TypeChecker,
    nodecl: &Nodecl,
    symbol_map: &SymbolMap,
    context: &DeclContext,
) -> Nodecl {
    let remap_symbol = |symbol: SymbolId| symbol_map.get(&symbol).copied().unwrap_or(symbol);
    nodecl.deep_copy_remapped(&remap_symbol, &mut |ty| {
        copy_type(type_checker, ty, symbol_map, context)
    })
}

fn copy_specs(
    type_checker: &mut TypeChecker,
    specs: &EntitySpecs,
    symbol_map: &SymbolMap,
    context: &DeclContext,
) -> EntitySpecs {
    let remap = |symbol: &SymbolId| symbol_map.get(symbol).copied().unwrap_or(*symbol);
    let mut copy = specs.clone();
    copy.related_symbols = specs.related_symbols.iter().map(remap).collect();
    copy.result_symbol = specs.result_symbol.as_ref().map(remap);
    copy.members = specs.members.iter().map(remap).collect();
    copy.friends = specs.friends.iter().map(remap).collect();
    copy.bases = specs.bases.iter().map(remap).collect();
    copy.class_type = specs
        .class_type
        .map(|ty| copy_type(type_checker, ty, symbol_map, context));
    copy.default_argument = specs
        .default_argument
        .as_ref()
        .map(|value| copy_nodecl(type_checker, value, symbol_map, context));
    copy
}

/// Registers `dest` as the function owning each of its parameters, at the
/// position they hold in `source`.
fn relink_parameters(type_checker: &mut TypeChecker, dest: SymbolId, source: SymbolId) {
    let specs = &type_checker.symbols.get(dest).specs;
    let result = specs.result_symbol;
    let parameters: Vec<SymbolId> = specs
        .related_symbols
        .iter()
        .copied()
        .filter(|p| Some(*p) != result)
        .collect();

    for (index, parameter) in parameters.into_iter().enumerate() {
        let data = type_checker.symbols.get_mut(parameter);
        let position = data
            .specs
            .parameter_of
            .iter()
            .find(|(function, _)| *function == source)
            .map(|(_, position)| *position)
            .unwrap_or(index);
        if !data.specs.parameter_of.contains(&(dest, position)) {
            data.specs.parameter_of.push((dest, position));
        }
    }
}

/// Rewrites the class and enum references of a type through `symbol_map`.
pub fn remap_type(types: &mut TypeTable, ty: TypeId, symbol_map: &SymbolMap) -> TypeId {
    if symbol_map.is_empty() {
        return ty;
    }
    let cv = types.cv(ty);
    let kind = match types.kind(ty).clone() {
        TypeKind::Named(symbol) => match symbol_map.get(&symbol) {
            Some(replacement) => TypeKind::Named(*replacement),
            None => return ty,
        },
        TypeKind::Pointer(pointee) => TypeKind::Pointer(remap_type(types, pointee, symbol_map)),
        TypeKind::Complex(base) => TypeKind::Complex(remap_type(types, base, symbol_map)),
        TypeKind::Reference { referenced, rvalue } => TypeKind::Reference {
            referenced: remap_type(types, referenced, symbol_map),
            rvalue,
        },
        TypeKind::PointerToMember { pointee, class } => TypeKind::PointerToMember {
            pointee: remap_type(types, pointee, symbol_map),
            class: remap_type(types, class, symbol_map),
        },
        TypeKind::Array {
            element,
            lower,
            size,
            assumed_shape,
        } => TypeKind::Array {
            element: remap_type(types, element, symbol_map),
            lower,
            size,
            assumed_shape,
        },
        TypeKind::Function {
            result,
            parameters,
            variadic,
            lacks_prototype,
        } => TypeKind::Function {
            result: remap_type(types, result, symbol_map),
            parameters: parameters
                .into_iter()
                .map(|p| remap_type(types, p, symbol_map))
                .collect(),
            variadic,
            lacks_prototype,
        },
        _ => return ty,
    };
    types.intern(kind, cv)
}
