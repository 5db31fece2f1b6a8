use tracing::{debug, trace};

use crate::{
    ast::ast::{Ast, AstKind},
    errors::errors::{Error, ErrorImpl},
    nodecl::{
        list::NodeclList,
        nodecl::{Nodecl, NodeclKind},
    },
    symbols::{
        scope::DeclContext,
        symbols::{Intent, SymbolId, SymbolKind},
    },
    type_checker::type_checker::{already_reported, error_at, not_supported, TypeChecker},
    types::types::{TypeId, TypeKind},
    Span,
};

use super::{
    expr::{absent, child, find_symbol},
    intrinsics, structures,
};

/// An actual argument of a procedure reference, already checked.
#[derive(Debug, Clone)]
pub struct ActualArgument {
    pub keyword: Option<String>,
    pub value: Nodecl,
}

impl ActualArgument {
    pub fn positional(value: Nodecl) -> Self {
        ActualArgument { keyword: None, value }
    }

    /// A scalar designating one element of an array, which may be passed
    /// to an explicit-shape array dummy (sequence association).
    pub fn is_array_element(&self, type_checker: &TypeChecker) -> bool {
        let types = &type_checker.types;
        self.value.kind() == NodeclKind::ArraySubscript
            && types.rank(self.value.ty()) == 0
            && self
                .value
                .child(0)
                .is_some_and(|base| types.rank(base.ty()) > 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallSite {
    Expression,
    Statement,
}

pub fn check_function_call(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    check_call(type_checker, ast, context, CallSite::Expression)
}

/// Checks the procedure reference of a `CALL` statement.
pub fn check_call_statement(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Nodecl {
    match check_call(type_checker, ast, context, CallSite::Statement) {
        Ok(nodecl) => nodecl,
        Err(error) => {
            type_checker.report(error);
            Nodecl::error(ast.span.clone())
        }
    }
}

fn check_call(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext, site: CallSite) -> Result<Nodecl, Error> {
    let callee = child(ast, 0);
    if callee.kind != AstKind::Symbol {
        return Err(not_supported("procedure references through expressions", &callee.span));
    }
    let arguments = check_actual_arguments(type_checker, child(ast, 1), context)?;
    let procedure = resolve_procedure(type_checker, &callee.text, context, site, &callee.span)?;
    let call = call_procedure(type_checker, procedure, &arguments, &ast.span)?;

    let is_subroutine = type_checker.types.is_void(call.ty());
    match site {
        CallSite::Expression if is_subroutine => Err(error_at(
            ErrorImpl::NotAnExpression {
                name: callee.text.clone(),
            },
            &callee.span,
        )),
        CallSite::Statement if !is_subroutine => Err(error_at(
            ErrorImpl::NotCallable {
                name: callee.text.clone(),
            },
            &callee.span,
        )),
        _ => Ok(call),
    }
}

fn check_actual_arguments(type_checker: &mut TypeChecker, list: &Ast, context: &DeclContext) -> Result<Vec<ActualArgument>, Error> {
    let mut arguments = vec![];
    let mut failed = false;
    for item in &list.children {
        let (keyword, value) = if item.kind == AstKind::KeywordArgument {
            (Some(item.text.clone()), child(item, 0))
        } else {
            (None, item)
        };
        let value = type_checker.check_expression(value, context);
        if value.is_error() {
            failed = true;
            continue;
        }
        arguments.push(ActualArgument { keyword, value });
    }
    if failed {
        return Err(already_reported(&list.span));
    }
    Ok(arguments)
}

/// A scalar local that only gave an intrinsic its type, e.g. `real :: sqrt`.
fn is_intrinsic_placeholder(type_checker: &TypeChecker, symbol: SymbolId) -> bool {
    let data = type_checker.symbols.get(symbol);
    match data.kind {
        SymbolKind::Unknown => true,
        SymbolKind::Variable => {
            !data.specs.is_dummy
                && !data.specs.is_parameter
                && !data.specs.is_pointer
                && type_checker.types.rank(data.ty) == 0
        }
        _ => false,
    }
}

fn resolve_procedure(
    type_checker: &mut TypeChecker,
    name: &str,
    context: &DeclContext,
    site: CallSite,
    span: &Span,
) -> Result<SymbolId, Error> {
    if let Some(symbol) = find_symbol(type_checker, name, context) {
        if is_intrinsic_placeholder(type_checker, symbol) {
            if let Some(intrinsic) = intrinsics::intrinsic_symbol(type_checker, name) {
                debug!("`{}` names the intrinsic procedure", name);
                type_checker.symbols.redirect(symbol, intrinsic);
                return Ok(intrinsic);
            }
        }
        return Ok(symbol);
    }
    if let Some(intrinsic) = intrinsics::intrinsic_symbol(type_checker, name) {
        return Ok(intrinsic);
    }
    if site == CallSite::Statement || type_checker.implicit_typing {
        return Ok(declare_external(type_checker, name, context, site));
    }
    Err(error_at(
        ErrorImpl::SymbolNotDeclared {
            name: name.to_string(),
        },
        span,
    ))
}

/// An external procedure known only through its references.
fn declare_external(type_checker: &mut TypeChecker, name: &str, context: &DeclContext, site: CallSite) -> SymbolId {
    let result = match site {
        CallSite::Statement => type_checker.types.void(),
        CallSite::Expression => type_checker.implicit_type(name),
    };
    let ty = type_checker.types.unprototyped_function(result);
    let symbol = type_checker
        .symbols
        .new_symbol(context.current_scope, name, SymbolKind::Function);
    let data = type_checker.symbols.get_mut(symbol);
    data.ty = ty;
    data.defined = true;
    data.specs.is_implicit = true;
    data.specs.is_subroutine = site == CallSite::Statement;
    trace!("declared external procedure `{}`", name);
    symbol
}

/// Checks a reference to `procedure`, whatever it is: intrinsic, generic
/// interface, specific procedure or derived type.
pub fn call_procedure(type_checker: &mut TypeChecker, procedure: SymbolId, arguments: &[ActualArgument], span: &Span) -> Result<Nodecl, Error> {
    let procedure = type_checker.symbols.resolve(procedure);
    let data = type_checker.symbols.get(procedure);
    match data.kind {
        SymbolKind::Generic => resolve_generic(type_checker, procedure, arguments, span),
        SymbolKind::Function if data.specs.intrinsic.is_some() => {
            intrinsics::check_intrinsic_call(type_checker, procedure, arguments, span)
        }
        SymbolKind::Function => check_specific_call(type_checker, procedure, arguments, span),
        SymbolKind::Class => structures::check_structure_constructor(type_checker, procedure, arguments, span),
        _ => Err(error_at(
            ErrorImpl::NotCallable {
                name: data.name.clone(),
            },
            span,
        )),
    }
}

/// User-facing name of a generic interface.
pub fn generic_display_name(name: &str) -> String {
    match name.strip_prefix(".operator.") {
        Some("=") => "assignment(=)".to_string(),
        Some(operator) => format!("operator({})", operator),
        None => name.to_string(),
    }
}

/// Picks the one specific procedure of a generic that accepts the
/// arguments. Every specific is tried with diagnostics muted first.
fn resolve_generic(type_checker: &mut TypeChecker, generic: SymbolId, arguments: &[ActualArgument], span: &Span) -> Result<Nodecl, Error> {
    let data = type_checker.symbols.get(generic);
    let name = generic_display_name(&data.name);
    let specifics = data.specs.related_symbols.clone();

    let mut matching = vec![];
    for specific in specifics {
        if type_checker
            .probe(|tc| call_procedure(tc, specific, arguments, span))
            .is_ok()
        {
            matching.push(specific);
        }
    }
    trace!("{} of the specifics of `{}` accept the arguments", matching.len(), name);

    match matching.as_slice() {
        [] => {
            let argument_types: Vec<TypeId> = arguments.iter().map(|a| a.value.ty()).collect();
            Err(error_at(
                ErrorImpl::NoMatchingSpecific {
                    generic: name,
                    arguments: type_checker.describe_types(&argument_types),
                },
                span,
            ))
        }
        [specific] => call_procedure(type_checker, *specific, arguments, span),
        several => {
            let candidates = several
                .iter()
                .map(|s| type_checker.symbols.get(*s).name.clone())
                .collect::<Vec<_>>()
                .join(", ");
            Err(error_at(
                ErrorImpl::AmbiguousGenericCall {
                    generic: name,
                    candidates,
                },
                span,
            ))
        }
    }
}

/// Places actual arguments in the slots of the dummy `keywords`. A
/// variadic procedure takes extra positional arguments in new slots.
pub fn associate_keywords(
    procedure: &str,
    keywords: &[String],
    arguments: &[ActualArgument],
    variadic: bool,
    span: &Span,
) -> Result<Vec<Option<ActualArgument>>, Error> {
    let mut slots: Vec<Option<ActualArgument>> = vec![None; keywords.len()];
    for (position, argument) in arguments.iter().enumerate() {
        let index = match &argument.keyword {
            None if position < slots.len() => position,
            None if variadic => {
                slots.push(None);
                slots.len() - 1
            }
            None => {
                return Err(error_at(
                    ErrorImpl::UnexpectedArguments {
                        expected: keywords.len(),
                        received: arguments.len(),
                    },
                    span,
                ))
            }
            Some(keyword) => keywords.iter().position(|k| k == keyword).ok_or_else(|| {
                error_at(
                    ErrorImpl::UnknownKeyword {
                        procedure: procedure.to_string(),
                        keyword: keyword.clone(),
                    },
                    argument.value.span(),
                )
            })?,
        };
        if slots[index].is_some() {
            let parameter = keywords
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("#{}", index + 1));
            return Err(error_at(
                ErrorImpl::DuplicateArgument {
                    procedure: procedure.to_string(),
                    parameter,
                },
                argument.value.span(),
            ));
        }
        slots[index] = Some(argument.clone());
    }
    Ok(slots)
}

fn check_specific_call(type_checker: &mut TypeChecker, procedure: SymbolId, arguments: &[ActualArgument], span: &Span) -> Result<Nodecl, Error> {
    let data = type_checker.symbols.get(procedure).clone();
    let function_type = data.ty;
    let TypeKind::Function {
        result,
        lacks_prototype,
        ..
    } = type_checker.types.kind(function_type).clone()
    else {
        return Err(error_at(ErrorImpl::NotCallable { name: data.name }, span));
    };

    if lacks_prototype {
        if let Some(keyword) = arguments.iter().find_map(|a| a.keyword.clone()) {
            return Err(error_at(
                ErrorImpl::UnknownKeyword {
                    procedure: data.name,
                    keyword,
                },
                span,
            ));
        }
        let values = arguments.iter().map(|a| a.value.clone()).collect();
        return Ok(call_nodecl(type_checker, procedure, function_type, values, result, span));
    }

    let dummies: Vec<SymbolId> = data
        .specs
        .related_symbols
        .iter()
        .copied()
        .filter(|s| Some(*s) != data.specs.result_symbol)
        .collect();
    let keywords: Vec<String> = dummies
        .iter()
        .map(|d| type_checker.symbols.get(*d).name.clone())
        .collect();
    let slots = associate_keywords(&data.name, &keywords, arguments, false, span)?;

    let mut values = vec![];
    for (dummy, slot) in dummies.iter().zip(slots) {
        match slot {
            Some(actual) => {
                check_association(type_checker, *dummy, &actual, data.specs.is_elemental)?;
                values.push(actual.value);
            }
            None => {
                let dummy_data = type_checker.symbols.get(*dummy);
                let default = dummy_data.specs.default_argument.as_ref().map(Nodecl::deep_copy);
                let optional = dummy_data.specs.is_optional;
                let parameter = dummy_data.name.clone();
                match default {
                    Some(default) => values.push(default),
                    None if optional => values.push(absent(type_checker, span)),
                    None => {
                        return Err(error_at(
                            ErrorImpl::MissingArgument {
                                procedure: data.name.clone(),
                                parameter,
                            },
                            span,
                        ))
                    }
                }
            }
        }
    }

    let mut result_type = result;
    if data.specs.is_elemental {
        if let Some(shape) = elemental_shape(type_checker, &data.name, &values, span)? {
            result_type = type_checker.types.rebuild_array(result, shape);
        }
    }
    Ok(call_nodecl(type_checker, procedure, function_type, values, result_type, span))
}

/// Checks that `actual` may be associated with `dummy`: same type and kind
/// and a compatible rank.
fn check_association(type_checker: &TypeChecker, dummy: SymbolId, actual: &ActualArgument, elemental: bool) -> Result<(), Error> {
    let dummy_data = type_checker.symbols.get(dummy);
    let types = &type_checker.types;
    let formal = if dummy_data.specs.is_pointer {
        types.pointer_pointee(dummy_data.ty).unwrap_or(dummy_data.ty)
    } else {
        dummy_data.ty
    };
    let actual_type = actual.value.ty();
    let mismatch = || {
        error_at(
            ErrorImpl::ArgumentTypeMatchError {
                parameter: dummy_data.name.clone(),
                expected: type_checker.describe(formal),
                received: type_checker.describe(actual_type),
            },
            actual.value.span(),
        )
    };

    if !types.same_type_and_kind(formal, actual_type) {
        return Err(mismatch());
    }

    if !elemental {
        let (formal_rank, actual_rank) = (types.rank(formal), types.rank(actual_type));
        let assumed_shape = matches!(types.kind(formal), TypeKind::Array { assumed_shape: true, .. });
        let rank_ok = if dummy_data.specs.is_pointer || assumed_shape {
            formal_rank == actual_rank
        } else if formal_rank == 0 {
            actual_rank == 0
        } else {
            actual_rank > 0
                || actual.is_array_element(type_checker)
                || (types.is_fortran_character(actual_type)
                    && types.fortran_kind(actual_type) == Some(type_checker.config.default_character_kind))
        };
        if !rank_ok {
            return Err(mismatch());
        }
    }

    if matches!(dummy_data.specs.intent, Intent::Out | Intent::InOut) && !actual.value.is_lvalue() {
        return Err(error_at(
            ErrorImpl::NotAssignable {
                expression: format!("actual argument for `{}`", dummy_data.name),
            },
            actual.value.span(),
        ));
    }
    Ok(())
}

/// Shape of an elemental reference: that of its array arguments, which
/// must all have the same rank.
pub fn elemental_shape(type_checker: &TypeChecker, procedure: &str, values: &[Nodecl], span: &Span) -> Result<Option<TypeId>, Error> {
    let mut shape: Option<TypeId> = None;
    for value in values {
        let rank = type_checker.types.rank(value.ty());
        if rank == 0 {
            continue;
        }
        match shape {
            None => shape = Some(value.ty()),
            Some(current) if type_checker.types.rank(current) == rank => {}
            Some(current) => {
                return Err(error_at(
                    ErrorImpl::RankMismatch {
                        operator: procedure.to_string(),
                        left: type_checker.types.rank(current),
                        right: rank,
                    },
                    span,
                ))
            }
        }
    }
    Ok(shape)
}

/// `FunctionCall[callee, List(arguments)]` typed with the result.
pub fn call_nodecl(
    type_checker: &mut TypeChecker,
    procedure: SymbolId,
    function_type: TypeId,
    arguments: Vec<Nodecl>,
    result: TypeId,
    span: &Span,
) -> Nodecl {
    let void = type_checker.types.void();
    let callee = Nodecl::symbol(procedure, function_type, span.clone());
    let arguments = NodeclList::from_vec(arguments).into_nodecl(void, span.clone());
    Nodecl::new(NodeclKind::FunctionCall, vec![callee, arguments], result, span.clone()).with_symbol(procedure)
}
