use tracing::trace;

use crate::{
    deduction::deduction::TemplateArgument,
    symbols::{
        scope::{QueryFlags, ScopeId, ScopeKind},
        symbols::{SymbolId, SymbolKind, SymbolTable},
    },
    type_checker::type_checker::TypeChecker,
    types::types::{TypeId, TypeKind, TypeTable},
};

/// Namespaces and classes associated with a set of argument types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociatedEntities {
    pub namespaces: Vec<ScopeId>,
    pub classes: Vec<SymbolId>,
    /// Classes whose namespace, bases and template arguments were collected.
    walked: Vec<SymbolId>,
}

impl AssociatedEntities {
    /// Adds a namespace; an inline namespace brings its enclosing one too.
    fn add_namespace(&mut self, symbols: &SymbolTable, namespace: ScopeId) {
        let mut current = Some(namespace);
        while let Some(scope) = current {
            if !self.namespaces.contains(&scope) {
                self.namespaces.push(scope);
            }
            let data = symbols.scope(scope);
            current = if data.is_inline {
                data.parent.map(|parent| symbols.enclosing_namespace(parent))
            } else {
                None
            };
        }
    }

    fn add_class(&mut self, class: SymbolId) {
        if !self.classes.contains(&class) {
            self.classes.push(class);
        }
    }

    /// Marks `class` as walked; false when it already was.
    fn start_walk(&mut self, class: SymbolId) -> bool {
        if self.walked.contains(&class) {
            return false;
        }
        self.walked.push(class);
        true
    }
}

/// Collects the entities associated with every type in `arg_types`.
pub fn associated_entities(types: &TypeTable, symbols: &SymbolTable, arg_types: &[TypeId]) -> AssociatedEntities {
    let mut entities = AssociatedEntities::default();
    for ty in arg_types {
        associate_type(types, symbols, *ty, &mut entities);
    }
    entities
}

fn associate_type(types: &TypeTable, symbols: &SymbolTable, ty: TypeId, entities: &mut AssociatedEntities) {
    match types.kind(ty) {
        TypeKind::Named(symbol) => {
            let symbol = symbols.resolve(*symbol);
            match symbols.get(symbol).kind {
                SymbolKind::Class => associate_class(types, symbols, symbol, entities),
                SymbolKind::Enum => {
                    entities.add_namespace(symbols, symbols.enclosing_namespace(symbols.get(symbol).scope));
                    if let Some(class) = symbols.enclosing_class(symbol) {
                        entities.add_class(class);
                    }
                }
                _ => {}
            }
        }
        TypeKind::Pointer(inner) | TypeKind::Complex(inner) => associate_type(types, symbols, *inner, entities),
        TypeKind::Reference { referenced, .. } => associate_type(types, symbols, *referenced, entities),
        TypeKind::Array { element, .. } => associate_type(types, symbols, *element, entities),
        TypeKind::Function {
            result, parameters, ..
        } => {
            associate_type(types, symbols, *result, entities);
            for parameter in parameters {
                associate_type(types, symbols, *parameter, entities);
            }
        }
        TypeKind::PointerToMember { pointee, class } => {
            associate_type(types, symbols, *pointee, entities);
            associate_type(types, symbols, *class, entities);
        }
        TypeKind::UnresolvedOverload {
            candidates,
            explicit_arguments,
        } => {
            for candidate in candidates {
                associate_type(types, symbols, symbols.get(*candidate).ty, entities);
            }
            for argument in explicit_arguments.iter().flatten() {
                associate_argument(types, symbols, argument, entities);
            }
        }
        TypeKind::Sequence(elements) => {
            for element in elements {
                associate_type(types, symbols, *element, entities);
            }
        }
        _ => {}
    }
}

/// A class brings its namespace, its enclosing class, its bases and what
/// its template arguments are associated with.
fn associate_class(types: &TypeTable, symbols: &SymbolTable, class: SymbolId, entities: &mut AssociatedEntities) {
    if !associate_class_and_bases(symbols, class, entities) {
        return;
    }
    let template_arguments = symbols.get(class).specs.template_arguments.as_ref();
    for argument in template_arguments.map(|list| list.bound_arguments()).unwrap_or_default() {
        associate_argument(types, symbols, &argument, entities);
    }
}

fn associate_class_and_bases(symbols: &SymbolTable, class: SymbolId, entities: &mut AssociatedEntities) -> bool {
    if !entities.start_walk(class) {
        return false;
    }
    entities.add_class(class);
    entities.add_namespace(symbols, symbols.enclosing_namespace(symbols.get(class).scope));
    if let Some(enclosing) = symbols.enclosing_class(class) {
        entities.add_class(enclosing);
    }
    for base in symbols.base_classes(class) {
        associate_class_and_bases(symbols, base, entities);
    }
    true
}

fn associate_argument(types: &TypeTable, symbols: &SymbolTable, argument: &TemplateArgument, entities: &mut AssociatedEntities) {
    match argument {
        TemplateArgument::Type(ty) => associate_type(types, symbols, *ty, entities),
        TemplateArgument::Template(template) => {
            let template = symbols.resolve(*template);
            entities.add_namespace(symbols, symbols.enclosing_namespace(symbols.get(template).scope));
            if let Some(class) = symbols.enclosing_class(template) {
                entities.add_class(class);
            }
        }
        TemplateArgument::Pack(elements) => {
            for element in elements {
                associate_argument(types, symbols, element, entities);
            }
        }
        TemplateArgument::Value { .. } | TemplateArgument::Parameter(_) => {}
    }
}

/// Augments the ordinary lookup result for `name` with the functions
/// visible in the namespaces associated with `arg_types`.
///
/// An entity only declared as a friend is found only when it is a friend
/// of one of the associated classes.
pub fn koenig_lookup(
    type_checker: &TypeChecker,
    name: &str,
    ordinary: &[SymbolId],
    arg_types: &[TypeId],
) -> Vec<SymbolId> {
    let symbols = &type_checker.symbols;
    let entities = associated_entities(&type_checker.types, symbols, arg_types);
    trace!(
        "`{}`: {} associated namespace(s), {} associated class(es)",
        name,
        entities.namespaces.len(),
        entities.classes.len()
    );

    let mut result: Vec<SymbolId> = ordinary.iter().map(|s| symbols.resolve(*s)).collect();
    result.dedup();
    for namespace in &entities.namespaces {
        debug_assert_eq!(symbols.scope(*namespace).kind, ScopeKind::Namespace);
        for found in symbols.lookup_in_scope(*namespace, name, QueryFlags::NONE) {
            let data = symbols.get(found);
            if data.specs.is_friend_declared && !is_friend_of_any(symbols, found, &entities.classes) {
                trace!("skipping friend `{}` of no associated class", symbols.qualified_name(found));
                continue;
            }
            if !result.contains(&found) {
                result.push(found);
            }
        }
    }
    result
}

fn is_friend_of_any(symbols: &SymbolTable, entity: SymbolId, classes: &[SymbolId]) -> bool {
    classes.iter().any(|class| {
        symbols
            .get(*class)
            .specs
            .friends
            .iter()
            .any(|friend| symbols.resolve(*friend) == entity)
    })
}
