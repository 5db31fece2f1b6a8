use crate::{
    ast::ast::Ast,
    const_value::const_value::ConstValue,
    errors::errors::{Error, ErrorImpl},
    nodecl::nodecl::{Nodecl, NodeclKind},
    symbols::{
        scope::{DeclContext, QueryFlags},
        symbols::{SymbolId, SymbolKind},
    },
    type_checker::type_checker::{error_at, not_supported, TypeChecker},
    Span,
};

use super::{
    assignment::{coerce_value, is_intrinsic_assignment},
    calls::ActualArgument,
    expr::{child, dereference},
};

/// Components of a derived type in declaration order.
pub fn components(type_checker: &TypeChecker, class: SymbolId) -> Vec<SymbolId> {
    type_checker
        .symbols
        .get(class)
        .specs
        .members
        .iter()
        .copied()
        .filter(|member| {
            let data = type_checker.symbols.get(*member);
            data.kind == SymbolKind::Variable && data.specs.is_member && !data.specs.is_static
        })
        .collect()
}

/// `base%member`.
pub fn check_component_reference(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let base = type_checker.check_operand(child(ast, 0), context)?;
    let base_ty = base.ty();
    let no_such_member = |type_checker: &TypeChecker| {
        error_at(
            ErrorImpl::NoSuchMember {
                type_: type_checker.describe(base_ty),
                member: ast.text.clone(),
            },
            &ast.span,
        )
    };

    let class = type_checker
        .types
        .named_symbol(type_checker.types.rank0(base_ty))
        .map(|symbol| type_checker.symbols.resolve(symbol))
        .filter(|symbol| type_checker.symbols.get(*symbol).kind == SymbolKind::Class);
    let Some(class) = class else {
        return Err(no_such_member(type_checker));
    };
    let member = type_checker
        .symbols
        .get(class)
        .specs
        .related_scope
        .and_then(|scope| {
            type_checker
                .symbols
                .lookup_in_scope(scope, &ast.text, QueryFlags::NONE)
                .first()
                .copied()
        });
    let Some(member) = member else {
        return Err(no_such_member(type_checker));
    };

    let member_data = type_checker.symbols.get(member);
    let (member_ty, is_pointer) = (member_data.ty, member_data.specs.is_pointer);
    let base_rank = type_checker.types.rank(base_ty);
    let ty = if base_rank > 0 {
        if type_checker.types.rank(member_ty) > 0 || is_pointer {
            return Err(not_supported("array or pointer components of an array", &ast.span));
        }
        type_checker.types.rebuild_array(member_ty, base_ty)
    } else {
        member_ty
    };

    let constant = match base.constant() {
        Some(ConstValue::Struct { members }) => components(type_checker, class)
            .iter()
            .position(|c| *c == member)
            .and_then(|index| members.get(index).cloned()),
        _ => None,
    };
    let is_lvalue = base.is_lvalue();
    let field = Nodecl::symbol(member, member_ty, ast.span.clone());
    let access = Nodecl::new(NodeclKind::ClassMemberAccess, vec![base, field], ty, ast.span.clone())
        .with_text(&ast.text)
        .with_lvalue(is_lvalue)
        .with_constant(constant);
    if is_pointer {
        return Ok(dereference(type_checker, access).with_lvalue(true));
    }
    Ok(access)
}

/// `type_name(values)`: positional values in component order, keyword
/// values by component name, default initializers for the rest.
pub fn check_structure_constructor(
    type_checker: &mut TypeChecker,
    class: SymbolId,
    arguments: &[ActualArgument],
    span: &Span,
) -> Result<Nodecl, Error> {
    let type_name = type_checker.symbols.get(class).name.clone();
    let error = |message: String| {
        error_at(
            ErrorImpl::StructureConstructorError {
                type_: type_name.clone(),
                message,
            },
            span,
        )
    };

    let components = components(type_checker, class);
    let names: Vec<String> = components
        .iter()
        .map(|c| type_checker.symbols.get(*c).name.clone())
        .collect();
    let mut slots: Vec<Option<Nodecl>> = vec![None; components.len()];
    for (position, argument) in arguments.iter().enumerate() {
        let index = match &argument.keyword {
            None if position < components.len() => position,
            None => {
                return Err(error(format!(
                    "too many values, {} has {} component(s)",
                    type_name,
                    components.len()
                )))
            }
            Some(keyword) => names
                .iter()
                .position(|name| name == keyword)
                .ok_or_else(|| error(format!("no component named `{}`", keyword)))?,
        };
        if slots[index].is_some() {
            return Err(error(format!("component `{}` given more than once", names[index])));
        }
        slots[index] = Some(argument.value.clone());
    }

    let mut values = vec![];
    for ((component, name), slot) in components.iter().zip(&names).zip(slots) {
        let data = type_checker.symbols.get(*component);
        let component_ty = if data.specs.is_pointer {
            type_checker.types.pointer_pointee(data.ty).unwrap_or(data.ty)
        } else {
            data.ty
        };
        let default = data.specs.default_argument.as_ref().map(Nodecl::deep_copy);
        let value = match (slot, default) {
            (Some(value), _) => {
                let types = &type_checker.types;
                let rank_ok = types.rank(value.ty()) == 0 || types.rank(value.ty()) == types.rank(component_ty);
                if !is_intrinsic_assignment(types, &type_checker.symbols, component_ty, value.ty()) || !rank_ok {
                    return Err(error(format!(
                        "value of type {} given for component `{}` of type {}",
                        type_checker.describe(value.ty()),
                        name,
                        type_checker.describe(component_ty)
                    )));
                }
                let scalar = type_checker.types.rank0(component_ty);
                coerce_value(type_checker, value, scalar)
            }
            (None, Some(default)) => default,
            (None, None) => return Err(error(format!("no value for component `{}`", name))),
        };
        values.push(value);
    }

    let constant = values
        .iter()
        .map(|value| value.constant().cloned())
        .collect::<Option<Vec<_>>>()
        .map(ConstValue::structure);
    let ty = type_checker.symbols.get(class).ty;
    Ok(Nodecl::new(NodeclKind::StructuredValue, values, ty, span.clone())
        .with_symbol(class)
        .with_constant(constant))
}
