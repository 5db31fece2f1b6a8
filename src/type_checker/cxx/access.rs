use tracing::trace;

use crate::{
    ast::ast::{Ast, AstKind},
    errors::errors::{Error, ErrorImpl},
    nodecl::nodecl::{Nodecl, NodeclKind},
    symbols::{
        scope::{DeclContext, QueryFlags},
        symbols::{SymbolId, SymbolKind},
    },
    type_checker::{
        fortran::expr::child,
        type_checker::{error_at, TypeChecker},
    },
    types::types::TypeId,
    Span,
};

use super::{
    conversions::{convert_to, decay, implicit_conversion, promote, ConversionSource},
    expr::dependent_nodecl,
    overload,
};

// Subscripts

/// `a[i]`, with `i[a]` accepted as well. Constant arrays and string
/// literals indexed by a constant fold to the element.
pub fn check_array_subscript(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let base = type_checker.check_operand(child(ast, 0), context)?;
    let subscripts = &child(ast, 1).children;
    let [subscript] = subscripts.as_slice() else {
        return Err(error_at(
            ErrorImpl::SubscriptCountMismatch {
                expected: 1,
                received: subscripts.len(),
            },
            &ast.span,
        ));
    };
    let index = type_checker.check_operand(subscript, context)?;
    if base.is_type_dependent() || index.is_type_dependent() {
        return Ok(dependent_nodecl(type_checker, NodeclKind::ArraySubscript, vec![base, index], &ast.span));
    }

    let base_type = type_checker.types.no_ref(base.ty());
    if type_checker.config.is_cxx() && type_checker.types.is_class(base_type, &type_checker.symbols) {
        let operands = vec![base.clone(), index.clone()];
        if let Some(call) = overload::overloaded_operator(type_checker, "operator[]", operands, &ast.span, context)? {
            return Ok(call);
        }
    }

    let base_decayed = decay(type_checker, base.ty());
    let index_decayed = decay(type_checker, index.ty());
    let symbols = &type_checker.symbols;
    let types = &type_checker.types;
    let (array, offset, element) = match (types.pointer_pointee(base_decayed), types.pointer_pointee(index_decayed)) {
        (Some(element), None) if types.is_integral(index_decayed, symbols) => (base, index, element),
        (None, Some(element)) if types.is_integral(base_decayed, symbols) => (index, base, element),
        _ => {
            return Err(error_at(
                ErrorImpl::InvalidSubscript {
                    message: format!(
                        "cannot subscript {} with {}",
                        type_checker.describe(base.ty()),
                        type_checker.describe(index.ty())
                    ),
                },
                &ast.span,
            ))
        }
    };
    if types.is_void(element) || types.is_function(element) {
        return Err(error_at(
            ErrorImpl::InvalidSubscript {
                message: format!("cannot subscript a pointer to {}", type_checker.describe(element)),
            },
            &ast.span,
        ));
    }

    let constant = match (array.constant(), offset.constant().and_then(|c| c.as_i64())) {
        (Some(values), Some(position)) if position >= 0 => values.element(position as usize).cloned(),
        _ => None,
    };
    let promoted = promote(type_checker, offset.ty());
    let offset = convert_to(type_checker, offset, promoted);
    Ok(
        Nodecl::new(NodeclKind::ArraySubscript, vec![array, offset], element, ast.span.clone())
            .with_lvalue(true)
            .with_constant(constant),
    )
}

// Members

pub fn no_such_member(type_checker: &TypeChecker, ty: TypeId, member: &str, span: &Span) -> Error {
    error_at(
        ErrorImpl::NoSuchMember {
            type_: type_checker.describe(ty),
            member: member.to_string(),
        },
        span,
    )
}

/// Members named `name` of `class` or, failing that, of its bases.
pub fn lookup_member(type_checker: &TypeChecker, class: SymbolId, name: &str) -> Vec<SymbolId> {
    match type_checker.symbols.get(class).specs.related_scope {
        Some(scope) => type_checker
            .symbols
            .lookup(scope, name, QueryFlags::CURRENT_SCOPE_ONLY),
        None => vec![],
    }
}

/// The object of `object.member` or `pointer->member` and its class, or no
/// class while the object's type depends on template parameters.
pub fn member_object(
    type_checker: &mut TypeChecker,
    ast: &Ast,
    context: &DeclContext,
) -> Result<(Nodecl, Option<SymbolId>), Error> {
    let base = type_checker.check_operand(child(ast, 0), context)?;
    if base.is_type_dependent() {
        return Ok((base, None));
    }

    let object = if ast.kind == AstKind::PointerMemberAccess {
        let pointer = decay(type_checker, base.ty());
        let Some(pointee) = type_checker.types.pointer_pointee(pointer) else {
            return Err(error_at(
                ErrorImpl::TypeMatchError {
                    expected: "pointer to class".to_string(),
                    received: type_checker.describe(base.ty()),
                },
                base.span(),
            ));
        };
        let span = base.span().clone();
        Nodecl::new(NodeclKind::Dereference, vec![base], pointee, span).with_lvalue(true)
    } else {
        base
    };

    let ty = type_checker.types.no_ref(object.ty());
    if type_checker.types.is_dependent(ty) {
        return Ok((object, None));
    }
    match type_checker.types.named_symbol(ty) {
        Some(class) if type_checker.types.is_class(ty, &type_checker.symbols) => Ok((object, Some(class))),
        _ => Err(error_at(
            ErrorImpl::TypeMatchError {
                expected: "class type".to_string(),
                received: type_checker.describe(object.ty()),
            },
            object.span(),
        )),
    }
}

/// `object.member` for a found member. Non-static data members take the
/// qualifiers and value category of the object.
pub fn member_reference(type_checker: &mut TypeChecker, object: Nodecl, member: SymbolId, span: &Span) -> Result<Nodecl, Error> {
    let member = type_checker.symbols.resolve(member);
    let data = type_checker.symbols.get(member);
    let (name, declared, kind, is_static) = (data.name.clone(), data.ty, data.kind, data.specs.is_static);
    let constant = data.value.as_ref().and_then(Nodecl::constant).cloned();

    let (ty, lvalue, constant) = match kind {
        SymbolKind::Variable if type_checker.types.is_reference(declared) => {
            (type_checker.types.no_ref(declared), true, None)
        }
        SymbolKind::Variable if is_static => (declared, true, None),
        SymbolKind::Variable => {
            let object_type = type_checker.types.no_ref(object.ty());
            let cv = type_checker.types.cv(object_type);
            let ty = type_checker.types.qualified(declared, cv);
            (ty, object.is_lvalue(), None)
        }
        SymbolKind::Function => (declared, false, None),
        SymbolKind::Enumerator => (declared, false, constant),
        _ => return Err(error_at(ErrorImpl::NotAnExpression { name }, span)),
    };
    if ty == TypeId::ERROR {
        return Err(error_at(ErrorImpl::AlreadyReported, span));
    }

    let symbol = Nodecl::symbol(member, ty, span.clone());
    Ok(Nodecl::new(NodeclKind::ClassMemberAccess, vec![object, symbol], ty, span.clone())
        .with_symbol(member)
        .with_text(&name)
        .with_lvalue(lvalue)
        .with_constant(constant))
}

pub fn check_member_access(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let (object, class) = member_object(type_checker, ast, context)?;
    let Some(class) = class else {
        return Ok(
            dependent_nodecl(type_checker, NodeclKind::ClassMemberAccess, vec![object], &ast.span).with_text(&ast.text),
        );
    };

    let found = lookup_member(type_checker, class, &ast.text);
    let Some(first) = found.first().copied() else {
        return Err(no_such_member(type_checker, object.ty(), &ast.text, &ast.span));
    };
    let functions: Vec<SymbolId> = found
        .iter()
        .copied()
        .filter(|s| type_checker.symbols.get(*s).kind.is_function_like())
        .collect();
    let overloaded = functions.len() > 1
        || functions
            .iter()
            .any(|f| type_checker.symbols.get(*f).kind == SymbolKind::FunctionTemplate);
    if overloaded {
        trace!("member `{}` is an overload set", ast.text);
        let ty = type_checker.types.unresolved_overload(functions.clone(), None);
        return Ok(Nodecl::new(NodeclKind::ClassMemberAccess, vec![object], ty, ast.span.clone())
            .with_symbol(functions[0])
            .with_text(&ast.text));
    }
    member_reference(type_checker, object, first, &ast.span)
}

// Assignment

/// `a = b`. Class targets go through `operator=` first; otherwise the
/// target must be a modifiable lvalue and `b` implicitly convertible to its
/// type. The result is an lvalue in C++.
pub fn check_assignment(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let left = type_checker.check_operand(child(ast, 0), context)?;
    let right = type_checker.check_operand(child(ast, 1), context)?;
    if left.is_type_dependent() || right.is_type_dependent() {
        return Ok(dependent_nodecl(type_checker, NodeclKind::Assignment, vec![left, right], &ast.span));
    }

    let left_type = type_checker.types.no_ref(left.ty());
    if type_checker.config.is_cxx() && type_checker.types.is_class(left_type, &type_checker.symbols) {
        let operands = vec![left.clone(), right.clone()];
        if let Some(call) = overload::overloaded_operator(type_checker, "operator=", operands, &ast.span, context)? {
            return Ok(call);
        }
    }

    let types = &type_checker.types;
    let modifiable = left.is_lvalue()
        && !types.effective_cv(left_type).is_const
        && !types.is_array(left_type)
        && !types.is_function(left_type);
    if !modifiable {
        return Err(error_at(
            ErrorImpl::NotAssignable {
                expression: format!("expression of type {}", type_checker.describe(left.ty())),
            },
            left.span(),
        ));
    }

    let target = type_checker.types.unqualified(left_type);
    let source = ConversionSource::of(type_checker, &right);
    if implicit_conversion(type_checker, &source, target).is_none() {
        return Err(error_at(
            ErrorImpl::AssignmentTypeMismatch {
                left: type_checker.describe(left_type),
                right: type_checker.describe(right.ty()),
            },
            &ast.span,
        ));
    }

    let right = convert_to(type_checker, right, target);
    let lvalue = type_checker.config.is_cxx();
    Ok(Nodecl::new(NodeclKind::Assignment, vec![left, right], left_type, ast.span.clone()).with_lvalue(lvalue))
}
