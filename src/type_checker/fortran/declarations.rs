//! Declaration processing: symbols and types for the specification part
//! of a program unit, then checking of its executable statements.

use tracing::{debug, trace};

use crate::{
    ast::{
        ast::Ast,
        statements::{
            Attribute, DeclarationStmt, DerivedTypeStmt, EntityDecl, GenericName, InterfaceStmt, ProcedureStmt, Program, Stmt,
        },
        types::{DimSpec, IntrinsicTypeName, LenSelector, TypeSpec},
    },
    const_value::const_value::ConstValue,
    errors::errors::{Error, ErrorImpl},
    internal_error,
    nodecl::nodecl::Nodecl,
    symbols::{
        scope::{DeclContext, QueryFlags, ScopeId, ScopeKind},
        symbols::{Intent, SymbolId, SymbolKind},
    },
    type_checker::type_checker::{error_at, not_supported, TypeChecker},
    types::{
        fortran::Dimension,
        types::{ArrayBound, TypeId},
    },
    Span,
};

use super::{
    arrays::flatten_constant,
    assignment::{coerce_value, is_intrinsic_assignment},
    calls,
    expr::{constant_nodecl, find_symbol, is_integer_kind},
};

/// Attributes shared by every entity of a declaration statement.
#[derive(Debug, Default)]
struct EntityAttributes<'a> {
    parameter: bool,
    pointer: bool,
    optional: bool,
    intent: Intent,
    dimensions: Option<&'a [DimSpec]>,
}

impl<'a> EntityAttributes<'a> {
    fn from_attributes(attributes: &'a [Attribute]) -> Self {
        let mut result = EntityAttributes::default();
        for attribute in attributes {
            match attribute {
                Attribute::Parameter => result.parameter = true,
                Attribute::Pointer => result.pointer = true,
                Attribute::Optional => result.optional = true,
                Attribute::Intent(intent) => result.intent = *intent,
                Attribute::Dimension(dims) => result.dimensions = Some(dims),
            }
        }
        result
    }
}

/// Checks a whole program unit and returns its checked executable
/// statements, those of contained procedures included.
pub fn check_program(type_checker: &mut TypeChecker, program: &Program) -> Vec<Nodecl> {
    type_checker.implicit_typing = !type_checker.config.implicit_none && !program.implicit_none;
    let owner = program
        .name
        .as_ref()
        .map(|name| type_checker.symbols.new_symbol(ScopeId::GLOBAL, name, SymbolKind::Program));
    let scope = type_checker.symbols.new_scope(ScopeKind::Program, ScopeId::GLOBAL, owner);
    debug!(
        "checking program {} (implicit typing {})",
        program.name.as_deref().unwrap_or("<unnamed>"),
        if type_checker.implicit_typing { "on" } else { "off" }
    );
    check_statements(type_checker, &program.body, &DeclContext::global().in_scope(scope))
}

fn check_statements(type_checker: &mut TypeChecker, body: &[Stmt], context: &DeclContext) -> Vec<Nodecl> {
    let mut checked = vec![];
    for stmt in body {
        match stmt {
            Stmt::Declaration(declaration) => {
                declare_entities(type_checker, declaration, context);
            }
            Stmt::DerivedType(definition) => declare_derived_type(type_checker, definition, context),
            Stmt::Procedure(procedure) => {
                if let Some((_, body)) = declare_procedure(type_checker, procedure, context) {
                    checked.extend(body);
                }
            }
            Stmt::Interface(interface) => declare_interface(type_checker, interface, context),
            Stmt::Call(ast) => checked.push(calls::check_call_statement(type_checker, ast, context)),
            Stmt::Assignment(ast) | Stmt::Expression(ast) => checked.push(type_checker.check_expression(ast, context)),
        }
    }
    checked
}

/// The symbol a declaration of `name` in the current scope defines. A
/// symbol created ahead of its declaration (a dummy argument or a result
/// variable) is reused; anything already defined is an error.
fn entity_symbol(
    type_checker: &mut TypeChecker,
    name: &str,
    kind: SymbolKind,
    context: &DeclContext,
    span: &Span,
) -> Result<SymbolId, Error> {
    let existing = type_checker
        .symbols
        .lookup_in_scope(context.current_scope, name, QueryFlags::NONE);
    if let Some(symbol) = existing.first().copied() {
        let data = type_checker.symbols.get_mut(symbol);
        if data.defined {
            return Err(error_at(
                ErrorImpl::SymbolAlreadyDeclared {
                    name: name.to_string(),
                },
                span,
            ));
        }
        data.kind = kind;
        data.span = span.clone();
        return Ok(symbol);
    }
    let symbol = type_checker.symbols.new_symbol(context.current_scope, name, kind);
    type_checker.symbols.get_mut(symbol).span = span.clone();
    Ok(symbol)
}

// Types

/// A constant integer expression of a declaration: kind, length or bound.
fn constant_integer(type_checker: &mut TypeChecker, ast: &Ast, what: &str, context: &DeclContext) -> Result<Option<i64>, Error> {
    let value = type_checker.check_operand(ast, context)?;
    if !type_checker.types.is_integer(value.ty()) || type_checker.types.rank(value.ty()) != 0 {
        return Err(error_at(
            ErrorImpl::TypeMatchError {
                expected: format!("integer {}", what),
                received: type_checker.describe(value.ty()),
            },
            &ast.span,
        ));
    }
    Ok(value.constant().and_then(ConstValue::as_i64))
}

fn kind_selector(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<u8, Error> {
    match constant_integer(type_checker, ast, "kind", context)? {
        Some(kind) => u8::try_from(kind)
            .ok()
            .filter(|kind| *kind > 0)
            .ok_or_else(|| error_at(ErrorImpl::InvalidKind { kind }, &ast.span)),
        None => Err(error_at(
            ErrorImpl::NotConstant {
                name: "kind".to_string(),
            },
            &ast.span,
        )),
    }
}

fn length_selector(type_checker: &mut TypeChecker, length: Option<&LenSelector>, context: &DeclContext) -> Result<ArrayBound, Error> {
    match length {
        None => Ok(ArrayBound::Known(1)),
        Some(LenSelector::Assumed) => Ok(ArrayBound::Unknown),
        Some(LenSelector::Expr(ast)) => Ok(constant_integer(type_checker, ast, "length", context)?
            .map(|length| ArrayBound::Known(length.max(0)))
            .unwrap_or(ArrayBound::Unknown)),
    }
}

fn declared_type(
    type_checker: &mut TypeChecker,
    spec: &TypeSpec,
    entity_length: Option<&LenSelector>,
    context: &DeclContext,
    span: &Span,
) -> Result<TypeId, Error> {
    let (name, kind, len) = match spec {
        TypeSpec::Intrinsic { name, kind, len } => (*name, kind, len),
        TypeSpec::Derived(name) => {
            let class = find_symbol(type_checker, name, context)
                .map(|symbol| type_checker.symbols.resolve(symbol))
                .filter(|symbol| type_checker.symbols.get(*symbol).kind == SymbolKind::Class);
            return match class {
                Some(class) => Ok(type_checker.symbols.get(class).ty),
                None => Err(error_at(ErrorImpl::UnknownType { type_: name.clone() }, span)),
            };
        }
    };

    let kind = match kind {
        Some(kind) => Some(kind_selector(type_checker, kind, context)?),
        None => None,
    };
    let invalid_kind = |kind: u8| error_at(ErrorImpl::InvalidKind { kind: kind as i64 }, span);
    let config = type_checker.config.clone();
    match name {
        IntrinsicTypeName::Integer => {
            let kind = kind.unwrap_or(config.default_integer_kind);
            if !is_integer_kind(kind) {
                return Err(invalid_kind(kind));
            }
            Ok(type_checker.types.fortran_integer(kind))
        }
        IntrinsicTypeName::Real => {
            let kind = kind.unwrap_or(config.default_real_kind);
            type_checker.types.fortran_real(kind).ok_or_else(|| invalid_kind(kind))
        }
        IntrinsicTypeName::DoublePrecision => {
            let kind = config.double_precision_kind;
            type_checker.types.fortran_real(kind).ok_or_else(|| invalid_kind(kind))
        }
        IntrinsicTypeName::Complex => {
            let kind = kind.unwrap_or(config.default_real_kind);
            type_checker.types.fortran_complex(kind).ok_or_else(|| invalid_kind(kind))
        }
        IntrinsicTypeName::Logical => {
            let kind = kind.unwrap_or(config.default_logical_kind);
            if !is_integer_kind(kind) {
                return Err(invalid_kind(kind));
            }
            Ok(type_checker.types.fortran_logical(kind))
        }
        IntrinsicTypeName::Character => {
            let length = length_selector(type_checker, entity_length.or(len.as_ref()), context)?;
            let kind = kind.unwrap_or(config.default_character_kind);
            Ok(type_checker.types.fortran_character(length, kind))
        }
    }
}

fn array_bound(type_checker: &mut TypeChecker, ast: Option<&Ast>, default: i64, context: &DeclContext) -> Result<ArrayBound, Error> {
    match ast {
        None => Ok(ArrayBound::Known(default)),
        Some(ast) => Ok(constant_integer(type_checker, ast, "bound", context)?
            .map(ArrayBound::Known)
            .unwrap_or(ArrayBound::Unknown)),
    }
}

fn array_type(type_checker: &mut TypeChecker, element: TypeId, dims: &[DimSpec], context: &DeclContext, span: &Span) -> Result<TypeId, Error> {
    let assumed_shape = dims.iter().filter(|d| matches!(d, DimSpec::AssumedShape { .. })).count();
    if assumed_shape == dims.len() {
        let mut ty = element;
        for dim in dims {
            if let DimSpec::AssumedShape { lower } = dim {
                let lower = array_bound(type_checker, lower.as_ref(), 1, context)?;
                ty = type_checker.types.assumed_shape_array(ty, lower);
            }
        }
        return Ok(ty);
    }
    if assumed_shape > 0 {
        return Err(not_supported("assumed-shape and explicit dimensions in one array", span));
    }

    let mut dimensions = vec![];
    for dim in dims {
        let dimension = match dim {
            DimSpec::Explicit { lower, upper } => {
                let lower = array_bound(type_checker, lower.as_ref(), 1, context)?;
                let upper = array_bound(type_checker, Some(upper), 1, context)?;
                let size = match (lower.known(), upper.known()) {
                    (Some(l), Some(u)) => ArrayBound::Known((u - l + 1).max(0)),
                    _ => ArrayBound::Unknown,
                };
                Dimension { lower, size }
            }
            DimSpec::AssumedSize { lower } => Dimension {
                lower: array_bound(type_checker, lower.as_ref(), 1, context)?,
                size: ArrayBound::Unknown,
            },
            DimSpec::AssumedShape { .. } => internal_error!("assumed-shape dimension in an explicit-shape array"),
        };
        dimensions.push(dimension);
    }
    Ok(type_checker.types.fortran_array(element, &dimensions))
}

/// Nests a flat list of elements by `sizes`, first dimension innermost.
fn nest_elements(elements: Vec<ConstValue>, sizes: &[usize]) -> ConstValue {
    let mut level = elements;
    for size in sizes.iter().take(sizes.len().saturating_sub(1)) {
        level = level
            .chunks(*size)
            .map(|chunk| ConstValue::array(chunk.to_vec()))
            .collect();
    }
    ConstValue::array(level)
}

/// Gives a constant the shape of `ty`: scalars are broadcast and rank-one
/// values are reshaped in array element order.
fn shape_constant(type_checker: &TypeChecker, value: &ConstValue, ty: TypeId) -> Option<ConstValue> {
    let dims = type_checker.types.dimensions(ty);
    if dims.is_empty() {
        return Some(value.clone());
    }
    let sizes = dims
        .iter()
        .map(|dim| dim.size.known().and_then(|size| usize::try_from(size).ok()))
        .collect::<Option<Vec<_>>>()?;
    let count: usize = sizes.iter().product();
    if count == 0 {
        return Some(ConstValue::array(vec![]));
    }
    let elements = match value {
        ConstValue::Array { .. } => flatten_constant(value),
        _ => vec![value.clone(); count],
    };
    if elements.len() != count {
        return None;
    }
    Some(nest_elements(elements, &sizes))
}

// Entities

fn declare_entities(type_checker: &mut TypeChecker, declaration: &DeclarationStmt, context: &DeclContext) -> Vec<SymbolId> {
    let attributes = EntityAttributes::from_attributes(&declaration.attributes);
    let mut declared = vec![];
    for entity in &declaration.entities {
        match declare_entity(type_checker, declaration, &attributes, entity, context) {
            Ok(symbol) => declared.push(symbol),
            Err(error) => type_checker.report(error),
        }
    }
    declared
}

fn declare_entity(
    type_checker: &mut TypeChecker,
    declaration: &DeclarationStmt,
    attributes: &EntityAttributes,
    entity: &EntityDecl,
    context: &DeclContext,
) -> Result<SymbolId, Error> {
    let scalar = declared_type(type_checker, &declaration.type_spec, entity.length.as_ref(), context, &entity.span)?;
    let dims = entity.dimensions.as_deref().or(attributes.dimensions);
    let mut ty = match dims {
        Some(dims) => array_type(type_checker, scalar, dims, context, &entity.span)?,
        None => scalar,
    };
    let symbol = entity_symbol(type_checker, &entity.name, SymbolKind::Variable, context, &entity.span)?;

    let value = match &entity.initializer {
        Some(initializer) => {
            let (value_ty, value) = initial_value(type_checker, &entity.name, initializer, ty, context)?;
            ty = value_ty;
            Some(value)
        }
        None if attributes.parameter => {
            return Err(error_at(
                ErrorImpl::NotConstant {
                    name: entity.name.clone(),
                },
                &entity.span,
            ))
        }
        None => None,
    };
    if attributes.pointer {
        ty = type_checker.types.pointer_to(ty);
    }

    let data = type_checker.symbols.get_mut(symbol);
    data.ty = ty;
    data.value = value;
    data.defined = true;
    data.specs.is_parameter = attributes.parameter;
    data.specs.is_pointer = attributes.pointer;
    data.specs.is_optional = attributes.optional;
    data.specs.intent = attributes.intent;
    trace!("declared `{}`: {}", entity.name, type_checker.describe(ty));
    Ok(symbol)
}

/// Checks an initializer against the declared type `ty`. An assumed
/// character length takes the length of the value. Returns the final type
/// with the folded value.
fn initial_value(
    type_checker: &mut TypeChecker,
    name: &str,
    initializer: &Ast,
    ty: TypeId,
    context: &DeclContext,
) -> Result<(TypeId, Nodecl), Error> {
    let value = type_checker.check_operand(initializer, context)?;
    let value_ty = value.ty();
    if !is_intrinsic_assignment(&type_checker.types, &type_checker.symbols, ty, value_ty) {
        return Err(error_at(
            ErrorImpl::AssignmentTypeMismatch {
                left: type_checker.describe(ty),
                right: type_checker.describe(value_ty),
            },
            &initializer.span,
        ));
    }
    if !value.is_constant() {
        return Err(error_at(ErrorImpl::NotConstant { name: name.to_string() }, &initializer.span));
    }

    let mut scalar = type_checker.types.rank0(ty);
    if type_checker.types.is_fortran_character(scalar) && type_checker.types.character_length(scalar).is_none() {
        scalar = type_checker.types.rank0(value_ty);
    }
    let ty = type_checker.types.rebuild_array(scalar, ty);

    let converted = coerce_value(type_checker, value, scalar);
    let shaped = converted
        .constant()
        .and_then(|constant| shape_constant(type_checker, constant, ty));
    let Some(constant) = shaped else {
        return Err(error_at(
            ErrorImpl::TypeMatchError {
                expected: type_checker.describe(ty),
                received: type_checker.describe(value_ty),
            },
            &initializer.span,
        ));
    };
    Ok((ty, constant_nodecl(type_checker, constant, ty, &initializer.span)))
}

// Derived types

fn declare_derived_type(type_checker: &mut TypeChecker, definition: &DerivedTypeStmt, context: &DeclContext) {
    let class = match entity_symbol(type_checker, &definition.name, SymbolKind::Class, context, &definition.span) {
        Ok(class) => class,
        Err(error) => return type_checker.report(error),
    };
    let scope = type_checker
        .symbols
        .new_scope(ScopeKind::Class, context.current_scope, Some(class));
    let ty = type_checker.types.named(class);
    {
        let data = type_checker.symbols.get_mut(class);
        data.ty = ty;
        data.defined = true;
    }

    let inner = context.in_scope(scope);
    for component in &definition.components {
        for member in declare_entities(type_checker, component, &inner) {
            let data = type_checker.symbols.get_mut(member);
            data.specs.is_member = true;
            data.specs.default_argument = data.value.take();
            type_checker.symbols.get_mut(class).specs.members.push(member);
        }
    }
    debug!(
        "derived type `{}` with {} component(s)",
        definition.name,
        type_checker.symbols.get(class).specs.members.len()
    );
}

// Procedures

/// Declares a procedure, its dummy arguments and its result, then checks
/// its body. Returns the procedure with its checked statements.
fn declare_procedure(
    type_checker: &mut TypeChecker,
    procedure: &ProcedureStmt,
    context: &DeclContext,
) -> Option<(SymbolId, Vec<Nodecl>)> {
    let symbol = match entity_symbol(type_checker, &procedure.name, SymbolKind::Function, context, &procedure.span) {
        Ok(symbol) => symbol,
        Err(error) => {
            type_checker.report(error);
            return None;
        }
    };
    type_checker.symbols.get_mut(symbol).defined = true;
    let scope = type_checker
        .symbols
        .new_scope(ScopeKind::Program, context.current_scope, Some(symbol));
    let inner = context.in_scope(scope);

    let mut dummies = vec![];
    for (position, name) in procedure.dummies.iter().enumerate() {
        let dummy = type_checker.symbols.new_symbol(scope, name, SymbolKind::Unknown);
        let data = type_checker.symbols.get_mut(dummy);
        data.specs.is_dummy = true;
        data.specs.parameter_of.push((symbol, position));
        dummies.push(dummy);
    }
    let result = procedure.is_function.then(|| {
        let name = procedure.result.as_deref().unwrap_or(&procedure.name);
        type_checker.symbols.new_symbol(scope, name, SymbolKind::Unknown)
    });

    if let (Some(result), Some(spec)) = (result, &procedure.result_type) {
        match declared_type(type_checker, spec, None, &inner, &procedure.span) {
            Ok(ty) => {
                let data = type_checker.symbols.get_mut(result);
                data.kind = SymbolKind::Variable;
                data.ty = ty;
                data.defined = true;
            }
            Err(error) => type_checker.report(error),
        }
    }
    for declaration in &procedure.declarations {
        declare_entities(type_checker, declaration, &inner);
    }
    for entity in dummies.iter().chain(result.iter()) {
        type_undeclared(type_checker, *entity, &procedure.span);
    }

    let result_type = match result {
        Some(result) => type_checker.symbols.get(result).ty,
        None => type_checker.types.void(),
    };
    let parameter_types = dummies.iter().map(|d| type_checker.symbols.get(*d).ty).collect();
    let ty = type_checker.types.function(result_type, parameter_types, false);
    {
        let data = type_checker.symbols.get_mut(symbol);
        data.kind = SymbolKind::Function;
        data.ty = ty;
        data.specs.is_elemental = procedure.prefix.elemental;
        data.specs.is_pure = procedure.prefix.pure || procedure.prefix.elemental;
        data.specs.is_subroutine = !procedure.is_function;
        data.specs.related_symbols = dummies.iter().copied().chain(result).collect();
        data.specs.result_symbol = result;
    }
    debug!("declared procedure `{}`: {}", procedure.name, type_checker.describe(ty));

    let body = check_statements(type_checker, &procedure.body, &inner);
    Some((symbol, body))
}

/// Gives an undeclared dummy or result its implicit type, or reports it.
fn type_undeclared(type_checker: &mut TypeChecker, entity: SymbolId, span: &Span) {
    if type_checker.symbols.get(entity).defined {
        return;
    }
    let name = type_checker.symbols.get(entity).name.clone();
    if !type_checker.implicit_typing {
        return type_checker.report(error_at(ErrorImpl::SymbolNotDeclared { name }, span));
    }
    let ty = type_checker.implicit_type(&name);
    let data = type_checker.symbols.get_mut(entity);
    data.kind = SymbolKind::Variable;
    data.ty = ty;
    data.defined = true;
    data.specs.is_implicit = true;
}

// Interfaces

fn generic_symbol_name(generic: &GenericName) -> String {
    match generic {
        GenericName::Name(name) => name.clone(),
        GenericName::Operator(operator) => format!(".operator.{}", operator),
        GenericName::Assignment => ".operator.=".to_string(),
    }
}

fn declare_interface(type_checker: &mut TypeChecker, interface: &InterfaceStmt, context: &DeclContext) {
    let specifics: Vec<SymbolId> = interface
        .bodies
        .iter()
        .filter_map(|body| declare_procedure(type_checker, body, context).map(|(symbol, _)| symbol))
        .collect();
    let Some(generic) = &interface.generic else {
        return;
    };

    let name = generic_symbol_name(generic);
    let existing = type_checker
        .symbols
        .lookup_in_scope(context.current_scope, &name, QueryFlags::NONE)
        .first()
        .copied();
    let symbol = match existing {
        Some(symbol) if type_checker.symbols.get(symbol).kind == SymbolKind::Generic => symbol,
        Some(_) => {
            return type_checker.report(error_at(ErrorImpl::SymbolAlreadyDeclared { name }, &interface.span));
        }
        None => type_checker.symbols.new_symbol(context.current_scope, &name, SymbolKind::Generic),
    };
    let data = type_checker.symbols.get_mut(symbol);
    data.defined = true;
    data.span = interface.span.clone();
    data.specs.is_generic_spec = true;
    data.specs.related_symbols.extend(specifics);
    debug!(
        "generic `{}` with {} specific(s)",
        calls::generic_display_name(&name),
        data.specs.related_symbols.len()
    );
}
