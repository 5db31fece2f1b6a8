use tracing::{debug, trace};

use crate::{
    ast::ast::{Ast, AstKind},
    deduction::{
        call::{deduce_call, CallArgument},
        deduction::{TemplateArgument, TemplateParameterList},
    },
    errors::errors::{Error, ErrorImpl},
    internal_error,
    koenig::koenig::koenig_lookup,
    nodecl::{
        list::NodeclList,
        nodecl::{Nodecl, NodeclKind},
    },
    symbols::{
        copy::{copy_symbol, SymbolMap},
        scope::{DeclContext, QueryFlags},
        symbols::{SymbolId, SymbolKind},
    },
    type_checker::{
        fortran::expr::child,
        type_checker::{error_at, TypeChecker},
    },
    types::types::{FloatPrecision, TypeId, TypeKind},
    Span,
};

use super::{
    access,
    conversions::{convert_to, decay, implicit_conversion, promote, ConversionRank, ConversionSource},
    expr::{dependent_nodecl, lookup_qualified_id, template_arguments},
};

/// A viable function with the rank of the conversion of each argument.
#[derive(Debug, Clone)]
struct Candidate {
    function: SymbolId,
    from_template: bool,
    /// Called as a member of the first operand of an operator.
    is_member: bool,
    ranks: Vec<ConversionRank>,
}

impl Candidate {
    /// No conversion is worse than the other candidate's, and one is better
    /// or, failing that, `self` is not a template specialization while
    /// `other` is.
    fn is_better_than(&self, other: &Candidate) -> bool {
        let pairs = || self.ranks.iter().zip(other.ranks.iter());
        if pairs().any(|(mine, theirs)| mine > theirs) {
            return false;
        }
        pairs().any(|(mine, theirs)| mine < theirs) || (!self.from_template && other.from_template)
    }
}

/// Parameters of a function, without its result symbol.
fn parameter_symbols(type_checker: &TypeChecker, function: SymbolId) -> Vec<SymbolId> {
    let specs = &type_checker.symbols.get(function).specs;
    specs
        .related_symbols
        .iter()
        .copied()
        .filter(|p| Some(*p) != specs.result_symbol)
        .collect()
}

pub fn check_function_call(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let callee = child(ast, 0);
    let mut arguments = vec![];
    for argument in &child(ast, 1).children {
        arguments.push(type_checker.check_operand(argument, context)?);
    }

    match callee.kind {
        AstKind::Symbol | AstKind::QualifiedId | AstKind::TemplateId => {
            named_call(type_checker, callee, arguments, &ast.span, context)
        }
        AstKind::MemberAccess | AstKind::PointerMemberAccess => {
            member_call(type_checker, callee, arguments, &ast.span, context)
        }
        _ => {
            let function = type_checker.check_operand(callee, context)?;
            call_value(type_checker, function, arguments, &ast.span)
        }
    }
}

fn dependent_call(type_checker: &mut TypeChecker, name: &str, arguments: Vec<Nodecl>, span: &Span) -> Nodecl {
    trace!("call to `{}` depends on template parameters", name);
    dependent_nodecl(type_checker, NodeclKind::Dependent, arguments, span).with_text(name)
}

/// `f(args)`, `ns::f(args)` or `f<T>(args)`. Unqualified names in C++ also
/// search the namespaces associated with the argument types, unless
/// ordinary lookup found an object or a class member.
fn named_call(
    type_checker: &mut TypeChecker,
    callee: &Ast,
    arguments: Vec<Nodecl>,
    span: &Span,
    context: &DeclContext,
) -> Result<Nodecl, Error> {
    let qualified = callee.text.contains("::");
    let explicit = match callee.kind {
        AstKind::TemplateId => Some(template_arguments(type_checker, callee, context)?),
        _ => None,
    };
    let ordinary = if qualified {
        lookup_qualified_id(type_checker, &callee.text, context)
    } else {
        type_checker
            .symbols
            .lookup(context.current_scope, &callee.text, QueryFlags::NONE)
    };

    if let Some(first) = ordinary.first() {
        if !type_checker.symbols.get(*first).kind.is_function_like() {
            let function = type_checker.check_operand(callee, context)?;
            return call_value(type_checker, function, arguments, span);
        }
    }
    if arguments.iter().any(Nodecl::is_type_dependent) {
        return Ok(dependent_call(type_checker, &callee.text, arguments, span));
    }

    let argument_dependent = !qualified
        && type_checker.config.is_cxx()
        && !ordinary.iter().any(|s| type_checker.symbols.get(*s).specs.is_member);
    let candidates = if argument_dependent {
        let argument_types: Vec<TypeId> = arguments.iter().map(Nodecl::ty).collect();
        koenig_lookup(type_checker, &callee.text, &ordinary, &argument_types)
    } else {
        ordinary
    };
    if candidates.is_empty() {
        return Err(error_at(
            ErrorImpl::SymbolNotDeclared {
                name: callee.text.clone(),
            },
            &callee.span,
        ));
    }

    let function = resolve_overload(type_checker, &callee.text, &candidates, &arguments, explicit.as_deref(), span)?;
    Ok(call_nodecl(type_checker, function, None, arguments, &callee.span, span))
}

/// `object.f(args)` and `pointer->f(args)`. A data member is called
/// through its value.
fn member_call(
    type_checker: &mut TypeChecker,
    callee: &Ast,
    arguments: Vec<Nodecl>,
    span: &Span,
    context: &DeclContext,
) -> Result<Nodecl, Error> {
    let (object, class) = access::member_object(type_checker, callee, context)?;
    let class = match class {
        Some(class) if !arguments.iter().any(Nodecl::is_type_dependent) => class,
        _ => {
            let mut children = vec![object];
            children.extend(arguments);
            return Ok(dependent_call(type_checker, &callee.text, children, span));
        }
    };

    let found = access::lookup_member(type_checker, class, &callee.text);
    let Some(first) = found.first().copied() else {
        return Err(access::no_such_member(type_checker, object.ty(), &callee.text, &callee.span));
    };
    if !type_checker.symbols.get(first).kind.is_function_like() {
        let function = access::member_reference(type_checker, object, first, &callee.span)?;
        return call_value(type_checker, function, arguments, span);
    }

    let function = resolve_overload(type_checker, &callee.text, &found, &arguments, None, span)?;
    Ok(call_nodecl(type_checker, function, Some(object), arguments, &callee.span, span))
}

/// A call through an expression: an overload set, an object with an
/// `operator()`, a function or a pointer to function.
pub fn call_value(type_checker: &mut TypeChecker, function: Nodecl, arguments: Vec<Nodecl>, span: &Span) -> Result<Nodecl, Error> {
    if function.is_type_dependent() || arguments.iter().any(Nodecl::is_type_dependent) {
        let mut children = vec![function];
        children.extend(arguments);
        return Ok(dependent_call(type_checker, "", children, span));
    }

    let ty = type_checker.types.no_ref(function.ty());
    if let TypeKind::UnresolvedOverload {
        candidates,
        explicit_arguments,
    } = type_checker.types.kind(ty).clone()
    {
        let name = function.text().to_string();
        let chosen = resolve_overload(type_checker, &name, &candidates, &arguments, explicit_arguments.as_deref(), span)?;
        return Ok(call_nodecl(type_checker, chosen, None, arguments, function.span(), span));
    }

    if let Some(class) = type_checker
        .types
        .named_symbol(ty)
        .filter(|_| type_checker.types.is_class(ty, &type_checker.symbols))
    {
        let operators = access::lookup_member(type_checker, class, "operator()");
        if !operators.is_empty() {
            let chosen = resolve_overload(type_checker, "operator()", &operators, &arguments, None, span)?;
            let callee_span = function.span().clone();
            return Ok(call_nodecl(type_checker, chosen, Some(function), arguments, &callee_span, span));
        }
    }

    let decayed = decay(type_checker, ty);
    let function_type = match type_checker.types.pointer_pointee(decayed) {
        Some(pointee) if type_checker.types.is_function(pointee) => pointee,
        _ => {
            return Err(error_at(
                ErrorImpl::NotCallable {
                    name: type_checker.describe(function.ty()),
                },
                function.span(),
            ))
        }
    };
    let TypeKind::Function {
        result,
        parameters,
        variadic,
        lacks_prototype,
    } = type_checker.types.kind(function_type).clone()
    else {
        internal_error!("pointer to function without a function type");
    };

    if !lacks_prototype {
        if arguments.len() < parameters.len() {
            return Err(error_at(
                ErrorImpl::MissingArgument {
                    procedure: type_checker.describe(function_type),
                    parameter: format!("#{}", arguments.len() + 1),
                },
                span,
            ));
        }
        if arguments.len() > parameters.len() && !variadic {
            return Err(error_at(
                ErrorImpl::UnexpectedArguments {
                    expected: parameters.len(),
                    received: arguments.len(),
                },
                span,
            ));
        }
        for (index, (argument, parameter)) in arguments.iter().zip(parameters.iter()).enumerate() {
            let source = ConversionSource::of(type_checker, argument);
            if implicit_conversion(type_checker, &source, *parameter).is_none() {
                return Err(error_at(
                    ErrorImpl::ArgumentTypeMatchError {
                        parameter: format!("#{}", index + 1),
                        expected: type_checker.describe(*parameter),
                        received: type_checker.describe(argument.ty()),
                    },
                    argument.span(),
                ));
            }
        }
    }

    let arguments = convert_arguments(type_checker, &parameters, arguments);
    Ok(finish_call(type_checker, function, arguments, result, span))
}

/// Argument promotions applied to what a `...` or an unprototyped
/// function receives: `float` becomes `double`, small integers `int`.
fn default_argument_promotion(type_checker: &mut TypeChecker, argument: Nodecl) -> Nodecl {
    let ty = decay(type_checker, argument.ty());
    let target = match type_checker.types.kind(ty) {
        TypeKind::Float(FloatPrecision::Float) => type_checker.types.float(FloatPrecision::Double),
        _ => promote(type_checker, ty),
    };
    convert_to(type_checker, argument, target)
}

fn convert_arguments(type_checker: &mut TypeChecker, parameters: &[TypeId], arguments: Vec<Nodecl>) -> Vec<Nodecl> {
    arguments
        .into_iter()
        .enumerate()
        .map(|(index, argument)| match parameters.get(index) {
            Some(parameter) => convert_to(type_checker, argument, *parameter),
            None => default_argument_promotion(type_checker, argument),
        })
        .collect()
}

/// `FunctionCall[callee, List(arguments)]`; a call returning an lvalue
/// reference is an lvalue of the referenced type.
fn finish_call(type_checker: &mut TypeChecker, callee: Nodecl, arguments: Vec<Nodecl>, result: TypeId, span: &Span) -> Nodecl {
    let void = type_checker.types.void();
    let arguments = NodeclList::from_vec(arguments).into_nodecl(void, span.clone());
    let lvalue = type_checker.types.is_lvalue_reference(result);
    let ty = type_checker.types.no_ref(result);
    let symbol = callee.get_symbol();
    let call = Nodecl::new(NodeclKind::FunctionCall, vec![callee, arguments], ty, span.clone()).with_lvalue(lvalue);
    match symbol {
        Some(symbol) => call.with_symbol(symbol),
        None => call,
    }
}

/// Call of the resolved `function`. Arguments are converted to the
/// parameter types and omitted trailing ones are taken from the defaults.
/// A member function called on `object` gets a member access callee.
pub fn call_nodecl(
    type_checker: &mut TypeChecker,
    function: SymbolId,
    object: Option<Nodecl>,
    arguments: Vec<Nodecl>,
    callee_span: &Span,
    span: &Span,
) -> Nodecl {
    let data = type_checker.symbols.get(function);
    let (ty, template_arguments) = (data.ty, data.specs.template_arguments.clone());
    let parameters = type_checker.types.function_parameters(ty).to_vec();
    let Some(result) = type_checker.types.function_result(ty) else {
        internal_error!("resolved call target `{}` is not a function", data.name);
    };

    let mut arguments = convert_arguments(type_checker, &parameters, arguments);
    let parameter_symbols = parameter_symbols(type_checker, function);
    for index in arguments.len()..parameters.len() {
        let default = parameter_symbols
            .get(index)
            .and_then(|p| type_checker.symbols.get(*p).specs.default_argument.as_ref())
            .map(Nodecl::deep_copy);
        if let Some(default) = default {
            arguments.push(default);
        }
    }

    let symbol = Nodecl::symbol(function, ty, callee_span.clone()).with_lvalue(true);
    let callee = match object {
        Some(object) => Nodecl::new(NodeclKind::ClassMemberAccess, vec![object, symbol], ty, callee_span.clone())
            .with_symbol(function)
            .with_lvalue(true),
        None => symbol,
    };
    let call = finish_call(type_checker, callee, arguments, result, span);
    match template_arguments {
        Some(template_arguments) => call.with_template_arguments(template_arguments),
        None => call,
    }
}

/// Conversion ranks of `sources` against the parameters of `function`, or
/// `None` if it cannot be called with them.
fn argument_ranks(
    type_checker: &mut TypeChecker,
    function: SymbolId,
    sources: &[ConversionSource],
) -> Option<Vec<ConversionRank>> {
    let ty = type_checker.symbols.get(function).ty;
    let TypeKind::Function {
        parameters,
        variadic,
        lacks_prototype,
        ..
    } = type_checker.types.kind(ty).clone()
    else {
        return None;
    };
    if lacks_prototype {
        return Some(vec![ConversionRank::Ellipsis; sources.len()]);
    }
    if sources.len() > parameters.len() && !variadic {
        return None;
    }
    let parameter_symbols = parameter_symbols(type_checker, function);
    let defaulted = |index: usize| {
        parameter_symbols
            .get(index)
            .is_some_and(|p| type_checker.symbols.get(*p).specs.default_argument.is_some())
    };
    if (sources.len()..parameters.len()).any(|index| !defaulted(index)) {
        return None;
    }

    let mut ranks = Vec::with_capacity(sources.len());
    for (index, source) in sources.iter().enumerate() {
        let rank = match parameters.get(index) {
            Some(parameter) => implicit_conversion(type_checker, source, *parameter)?,
            None => ConversionRank::Ellipsis,
        };
        ranks.push(rank);
    }
    Some(ranks)
}

/// The candidate `symbol` if it can be called with `sources`. A function
/// template takes part through the specialization deduction yields.
fn viable_candidate(
    type_checker: &mut TypeChecker,
    symbol: SymbolId,
    sources: &[ConversionSource],
    explicit: Option<&[TemplateArgument]>,
) -> Option<Candidate> {
    let symbol = type_checker.symbols.resolve(symbol);
    let kind = type_checker.symbols.get(symbol).kind;
    let (function, from_template) = match kind {
        SymbolKind::Function if explicit.is_none() => (symbol, false),
        SymbolKind::FunctionTemplate => {
            let arguments: Vec<CallArgument> = sources
                .iter()
                .map(|s| CallArgument {
                    ty: s.ty,
                    is_lvalue: s.is_lvalue,
                })
                .collect();
            let list = deduce_call(type_checker, symbol, &arguments, explicit)?;
            (specialize_function(type_checker, symbol, list), true)
        }
        _ => return None,
    };
    let ranks = argument_ranks(type_checker, function, sources)?;
    Some(Candidate {
        function,
        from_template,
        is_member: false,
        ranks,
    })
}

/// The specialization of a function template for the deduced `list`,
/// copied from the template on first request.
pub fn specialize_function(type_checker: &mut TypeChecker, template: SymbolId, list: TemplateParameterList) -> SymbolId {
    let arguments = list.bound_arguments();
    let symbols = &type_checker.symbols;
    let existing = symbols.get(template).specs.specializations.iter().copied().find(|s| {
        symbols.get(*s).specs.template_arguments.as_ref().is_some_and(|bound| {
            let bound = bound.bound_arguments();
            bound.len() == arguments.len() && bound.iter().zip(arguments.iter()).all(|(a, b)| a.same_as(b))
        })
    });
    if let Some(existing) = existing {
        return existing;
    }

    let data = symbols.get(template);
    let (scope, name) = (data.scope, data.name.clone());
    let context = DeclContext {
        current_scope: scope,
        namespace_scope: symbols.enclosing_namespace(scope),
        template_parameters: Some(list.clone()),
    };
    let specialization = type_checker
        .symbols
        .new_detached_symbol(scope, &name, SymbolKind::Function);
    copy_symbol(type_checker, specialization, template, &SymbolMap::new(), &context);

    let specs = &mut type_checker.symbols.get_mut(specialization).specs;
    specs.template_of = Some(template);
    specs.template_arguments = Some(list);
    specs.template_parameters = None;
    specs.specializations.clear();
    type_checker.symbols.get_mut(specialization).kind = SymbolKind::Function;
    type_checker
        .symbols
        .get_mut(template)
        .specs
        .specializations
        .push(specialization);
    debug!(
        "specialized `{}` as {}",
        name,
        type_checker.describe(type_checker.symbols.get(specialization).ty)
    );
    specialization
}

/// The unique best of the viable candidates.
fn select_best(
    type_checker: &TypeChecker,
    name: &str,
    viable: Vec<Candidate>,
    argument_types: &[TypeId],
    span: &Span,
) -> Result<Candidate, Error> {
    if viable.is_empty() {
        return Err(error_at(
            ErrorImpl::NoMatchingFunction {
                function: name.to_string(),
                arguments: type_checker.describe_types(argument_types),
            },
            span,
        ));
    }
    let best = (0..viable.len()).find(|&i| {
        (0..viable.len()).all(|j| i == j || viable[i].is_better_than(&viable[j]))
    });
    match best {
        Some(index) => {
            debug!(
                "`{}` resolved to {} among {} viable candidate(s)",
                name,
                type_checker.symbols.qualified_name(viable[index].function),
                viable.len()
            );
            Ok(viable[index].clone())
        }
        None => {
            let candidates = viable
                .iter()
                .map(|c| {
                    format!(
                        "{} [{}]",
                        type_checker.symbols.qualified_name(c.function),
                        type_checker.describe(type_checker.symbols.get(c.function).ty)
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            Err(error_at(
                ErrorImpl::AmbiguousCall {
                    function: name.to_string(),
                    candidates,
                },
                span,
            ))
        }
    }
}

/// Picks the function of `candidates` that `arguments` call.
pub fn resolve_overload(
    type_checker: &mut TypeChecker,
    name: &str,
    candidates: &[SymbolId],
    arguments: &[Nodecl],
    explicit: Option<&[TemplateArgument]>,
    span: &Span,
) -> Result<SymbolId, Error> {
    let sources: Vec<ConversionSource> = arguments
        .iter()
        .map(|a| ConversionSource::of(type_checker, a))
        .collect();

    let mut viable: Vec<Candidate> = vec![];
    for candidate in candidates {
        match viable_candidate(type_checker, *candidate, &sources, explicit) {
            Some(found) if !viable.iter().any(|v| v.function == found.function) => viable.push(found),
            Some(_) => {}
            None => trace!("candidate {} of `{}` is not viable", type_checker.symbols.qualified_name(*candidate), name),
        }
    }

    let argument_types: Vec<TypeId> = arguments.iter().map(Nodecl::ty).collect();
    select_best(type_checker, name, viable, &argument_types, span).map(|best| best.function)
}

/// `operator<op>` applied to `operands`, looked up as a non-member (with
/// argument-dependent lookup) and as a member of the first operand's
/// class. `None` when no candidate is viable, so the built-in operator
/// gets its turn.
pub fn overloaded_operator(
    type_checker: &mut TypeChecker,
    name: &str,
    operands: Vec<Nodecl>,
    span: &Span,
    context: &DeclContext,
) -> Result<Option<Nodecl>, Error> {
    let sources: Vec<ConversionSource> = operands
        .iter()
        .map(|o| ConversionSource::of(type_checker, o))
        .collect();
    let operand_types: Vec<TypeId> = operands.iter().map(Nodecl::ty).collect();

    let ordinary: Vec<SymbolId> = type_checker
        .symbols
        .lookup(context.current_scope, name, QueryFlags::NONE)
        .into_iter()
        .filter(|s| !type_checker.symbols.get(*s).specs.is_member)
        .collect();
    let non_members = koenig_lookup(type_checker, name, &ordinary, &operand_types);

    let mut viable = vec![];
    for candidate in non_members {
        if let Some(found) = viable_candidate(type_checker, candidate, &sources, None) {
            viable.push(found);
        }
    }

    let object_type = type_checker.types.no_ref(operand_types[0]);
    let class = type_checker
        .types
        .named_symbol(object_type)
        .filter(|_| type_checker.types.is_class(object_type, &type_checker.symbols));
    if let Some(class) = class {
        for member in access::lookup_member(type_checker, class, name) {
            if let Some(mut found) = viable_candidate(type_checker, member, &sources[1..], None) {
                found.ranks.insert(0, ConversionRank::Exact);
                found.is_member = true;
                viable.push(found);
            }
        }
    }

    if viable.is_empty() {
        trace!("no viable `{}` for {}", name, type_checker.describe_types(&operand_types));
        return Ok(None);
    }
    let best = select_best(type_checker, name, viable, &operand_types, span)?;
    let mut operands = operands;
    let call = if best.is_member {
        let object = operands.remove(0);
        call_nodecl(type_checker, best.function, Some(object), operands, span, span)
    } else {
        call_nodecl(type_checker, best.function, None, operands, span, span)
    };
    Ok(Some(call))
}
