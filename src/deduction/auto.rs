use tracing::trace;

use crate::{
    symbols::{
        scope::{QueryFlags, ScopeId},
        symbols::{SymbolId, SymbolKind},
    },
    type_checker::type_checker::TypeChecker,
    types::types::{TemplateName, TypeId, TypeKind},
};

use super::{
    call::{deduce_arguments, CallArgument},
    deduction::{
        TemplateArgument, TemplateParameter, TemplateParameterKey, TemplateParameterKind, TemplateParameterList,
    },
    substitute::substitute_type,
};

/// Nesting level of the parameter standing in for `auto`; no real
/// template is nested this deep.
const AUTO_NESTING: usize = usize::MAX;

/// Deduces the type of a variable declared with `auto` in `declared`.
///
/// `auto` is treated as the single parameter of an invented function
/// template called with the initializer. A braced initializer deduces a
/// `std::initializer_list` of its (common) element type.
pub fn deduce_auto(
    type_checker: &mut TypeChecker,
    declared: TypeId,
    initializer: &CallArgument,
    braced: bool,
) -> Option<TypeId> {
    let key = TemplateParameterKey::new(TemplateParameterKind::Type, "auto", 0, AUTO_NESTING);
    let parameter = type_checker.types.template_parameter(key.clone());
    let mut formal = replace_auto(type_checker, declared, parameter);

    if braced {
        let Some(initializer_list) = initializer_list_template(type_checker) else {
            trace!("braced `auto` initializer without std::initializer_list");
            return None;
        };
        formal = type_checker.types.dependent_specialization(
            TemplateName::Symbol(initializer_list),
            vec![TemplateArgument::Type(formal)],
        );
    }

    let list = TemplateParameterList::new(AUTO_NESTING, vec![TemplateParameter::new(key)]);
    let deduced = deduce_arguments(type_checker, &list, &[formal], std::slice::from_ref(initializer), None)?;
    let ty = substitute_type(type_checker, formal, &deduced)?;
    trace!("auto deduced as {}", type_checker.describe(ty));
    Some(ty)
}

fn replace_auto(type_checker: &mut TypeChecker, ty: TypeId, parameter: TypeId) -> TypeId {
    let cv = type_checker.types.cv(ty);
    let replaced = match type_checker.types.kind(ty).clone() {
        TypeKind::Auto => parameter,
        TypeKind::Pointer(pointee) => {
            let pointee = replace_auto(type_checker, pointee, parameter);
            type_checker.types.pointer_to(pointee)
        }
        TypeKind::Reference { referenced, rvalue } => {
            let referenced = replace_auto(type_checker, referenced, parameter);
            if rvalue {
                type_checker.types.rvalue_reference(referenced)
            } else {
                type_checker.types.lvalue_reference(referenced)
            }
        }
        _ => return ty,
    };
    type_checker.types.qualified(replaced, cv)
}

fn initializer_list_template(type_checker: &TypeChecker) -> Option<SymbolId> {
    type_checker
        .symbols
        .lookup_qualified(ScopeId::GLOBAL, &["std", "initializer_list"], QueryFlags::NONE)
        .into_iter()
        .find(|s| type_checker.symbols.get(*s).kind == SymbolKind::ClassTemplate)
}
