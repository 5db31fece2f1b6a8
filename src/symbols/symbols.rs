use std::collections::HashMap;

use crate::{
    deduction::deduction::TemplateParameterList, nodecl::nodecl::Nodecl, types::types::TypeId, Span,
};

use super::scope::{QueryFlags, Scope, ScopeId, ScopeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Variable,
    Function,
    Class,
    Enum,
    Enumerator,
    Namespace,
    Typedef,
    FunctionTemplate,
    ClassTemplate,
    TemplateTypeParameter,
    TemplateNonTypeParameter,
    TemplateTemplateParameter,
    /// Fortran generic specifier; its specifics are the related symbols.
    Generic,
    Program,
    /// Declared name whose role is not known yet.
    Unknown,
}

impl SymbolKind {
    pub fn is_function_like(self) -> bool {
        matches!(self, SymbolKind::Function | SymbolKind::FunctionTemplate)
    }

    pub fn is_template(self) -> bool {
        matches!(self, SymbolKind::FunctionTemplate | SymbolKind::ClassTemplate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Intent {
    #[default]
    Unspecified,
    In,
    Out,
    InOut,
}

/// Entity-specific attributes of a symbol.
#[derive(Debug, Clone, Default)]
pub struct EntitySpecs {
    pub is_member: bool,
    pub is_static: bool,
    pub is_friend_declared: bool,
    pub is_elemental: bool,
    pub is_pure: bool,
    pub is_optional: bool,
    /// Fortran named constant.
    pub is_parameter: bool,
    /// Fortran `pointer` attribute.
    pub is_pointer: bool,
    pub is_builtin: bool,
    pub is_subroutine: bool,
    pub is_implicit: bool,
    pub is_dummy: bool,
    pub is_generic_spec: bool,
    pub intent: Intent,
    pub class_type: Option<TypeId>,
    /// Parameters of a function, specifics of a generic or values of an enum.
    pub related_symbols: Vec<SymbolId>,
    /// Functions this symbol is a parameter of, with its position.
    pub parameter_of: Vec<(SymbolId, usize)>,
    pub result_symbol: Option<SymbolId>,
    /// Default argument of a parameter or default initializer of a component.
    pub default_argument: Option<Nodecl>,
    /// Direct base classes.
    pub bases: Vec<SymbolId>,
    /// Bases of a class template pattern, substituted on specialization.
    pub dependent_bases: Vec<TypeId>,
    pub friends: Vec<SymbolId>,
    /// Nonstatic data members in declaration order, then other members.
    pub members: Vec<SymbolId>,
    pub template_parameters: Option<TemplateParameterList>,
    /// Template this symbol is a specialization of.
    pub template_of: Option<SymbolId>,
    pub template_arguments: Option<TemplateParameterList>,
    pub specializations: Vec<SymbolId>,
    pub related_scope: Option<ScopeId>,
    pub intrinsic: Option<usize>,
}

/// Language-specific attributes that are not part of the entity specs.
pub type ExtendedData = HashMap<String, String>;

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: TypeId,
    pub value: Option<Nodecl>,
    pub span: Span,
    pub scope: ScopeId,
    pub defined: bool,
    pub printable: bool,
    pub specs: EntitySpecs,
    pub extended_data: ExtendedData,
    resolved_to: Option<SymbolId>,
}

#[derive(Debug)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            symbols: vec![],
            scopes: vec![Scope::new(ScopeKind::Namespace, None, None)],
        }
    }

    pub fn new_scope(&mut self, kind: ScopeKind, parent: ScopeId, owner: Option<SymbolId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(kind, Some(parent), owner));
        if let Some(owner) = owner {
            if matches!(kind, ScopeKind::Namespace | ScopeKind::Class) {
                self.symbols[owner.index()].specs.related_scope = Some(id);
            }
        }
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    /// Creates a symbol and makes it visible by name in `scope`.
    pub fn new_symbol(&mut self, scope: ScopeId, name: &str, kind: SymbolKind) -> SymbolId {
        let id = self.new_detached_symbol(scope, name, kind);
        self.insert_name(scope, name, id);
        id
    }

    /// Creates a symbol owned by `scope` that name lookup cannot find.
    pub fn new_detached_symbol(&mut self, scope: ScopeId, name: &str, kind: SymbolKind) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            name: name.to_string(),
            kind,
            ty: TypeId::ERROR,
            value: None,
            span: Span::null(),
            scope,
            defined: false,
            printable: true,
            specs: EntitySpecs::default(),
            extended_data: ExtendedData::new(),
            resolved_to: None,
        });
        id
    }

    pub fn insert_name(&mut self, scope: ScopeId, name: &str, symbol: SymbolId) {
        let entries = self.scopes[scope.index()]
            .names
            .entry(name.to_string())
            .or_default();
        if !entries.contains(&symbol) {
            entries.push(symbol);
        }
    }

    pub fn remove_name(&mut self, scope: ScopeId, name: &str, symbol: SymbolId) {
        if let Some(entries) = self.scopes[scope.index()].names.get_mut(name) {
            entries.retain(|s| *s != symbol);
        }
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[self.resolve(id).index()]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        let id = self.resolve(id);
        &mut self.symbols[id.index()]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Follows placeholder redirections to the final symbol.
    pub fn resolve(&self, mut id: SymbolId) -> SymbolId {
        while let Some(next) = self.symbols[id.index()].resolved_to {
            id = next;
        }
        id
    }

    /// Turns `placeholder` into an alias of `real`. Every handle to the
    /// placeholder now reaches `real` through [`SymbolTable::get`].
    pub fn redirect(&mut self, placeholder: SymbolId, real: SymbolId) {
        let real = self.resolve(real);
        if real != placeholder {
            self.symbols[placeholder.index()].resolved_to = Some(real);
        }
    }

    /// Names declared directly in `scope` and in the scopes it uses.
    pub fn lookup_in_scope(&self, scope: ScopeId, name: &str, flags: QueryFlags) -> Vec<SymbolId> {
        let mut result: Vec<SymbolId> = vec![];
        let mut visit = vec![scope];
        let mut seen = vec![];
        while let Some(current) = visit.pop() {
            if seen.contains(&current) {
                continue;
            }
            seen.push(current);
            let data = self.scope(current);
            if let Some(entries) = data.names.get(name) {
                for entry in entries {
                    let entry = self.resolve(*entry);
                    if flags.contains(QueryFlags::IGNORE_FRIEND_DECLARED)
                        && self.symbols[entry.index()].specs.is_friend_declared
                    {
                        continue;
                    }
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                }
            }
            visit.extend(data.used_scopes.iter().rev());
        }
        result
    }

    /// Unqualified lookup climbing enclosing scopes until something is found.
    /// Class scopes also search their bases.
    pub fn lookup(&self, scope: ScopeId, name: &str, flags: QueryFlags) -> Vec<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let mut found = self.lookup_in_scope(id, name, flags);
            if found.is_empty() && self.scope(id).kind == ScopeKind::Class {
                if let Some(owner) = self.scope(id).owner {
                    found = self.lookup_in_bases(owner, name, flags);
                }
            }
            if !found.is_empty() || flags.contains(QueryFlags::CURRENT_SCOPE_ONLY) {
                return found;
            }
            current = self.scope(id).parent;
        }
        vec![]
    }

    fn lookup_in_bases(&self, class: SymbolId, name: &str, flags: QueryFlags) -> Vec<SymbolId> {
        let mut result = vec![];
        for base in self.base_classes(class) {
            if let Some(scope) = self.get(base).specs.related_scope {
                let found = self.lookup_in_scope(scope, name, flags);
                if found.is_empty() {
                    result.extend(self.lookup_in_bases(base, name, flags));
                } else {
                    result.extend(found);
                }
            }
        }
        result.dedup();
        result
    }

    /// Lookup of `a::b::c` starting at `scope`.
    pub fn lookup_qualified(&self, scope: ScopeId, path: &[&str], flags: QueryFlags) -> Vec<SymbolId> {
        let Some((last, prefix)) = path.split_last() else {
            return vec![];
        };
        let mut current = scope;
        for (i, component) in prefix.iter().enumerate() {
            let found = if i == 0 {
                self.lookup(current, component, QueryFlags::NONE)
            } else {
                self.lookup_in_scope(current, component, QueryFlags::NONE)
            };
            let Some(next) = found
                .iter()
                .find_map(|s| self.get(*s).specs.related_scope)
            else {
                return vec![];
            };
            current = next;
        }
        if prefix.is_empty() {
            self.lookup(current, last, flags)
        } else {
            self.lookup_in_scope(current, last, flags)
        }
    }

    /// Base classes recorded on a class symbol.
    pub fn base_classes(&self, class: SymbolId) -> Vec<SymbolId> {
        self.get(class)
            .specs
            .bases
            .iter()
            .map(|base| self.resolve(*base))
            .collect()
    }

    /// Whether `derived` is `base` or has it among its transitive bases.
    pub fn is_derived_from(&self, derived: SymbolId, base: SymbolId) -> bool {
        let derived = self.resolve(derived);
        let base = self.resolve(base);
        if derived == base {
            return true;
        }
        self.base_classes(derived)
            .into_iter()
            .any(|b| self.is_derived_from(b, base))
    }

    /// Nearest enclosing namespace of a scope.
    pub fn enclosing_namespace(&self, mut scope: ScopeId) -> ScopeId {
        loop {
            let data = self.scope(scope);
            if data.kind == ScopeKind::Namespace {
                return scope;
            }
            match data.parent {
                Some(parent) => scope = parent,
                None => return ScopeId::GLOBAL,
            }
        }
    }

    /// Class that directly encloses the declaration of `symbol`, if any.
    pub fn enclosing_class(&self, symbol: SymbolId) -> Option<SymbolId> {
        let mut scope = Some(self.get(symbol).scope);
        while let Some(id) = scope {
            let data = self.scope(id);
            match data.kind {
                ScopeKind::Class => return data.owner,
                ScopeKind::Namespace => return None,
                _ => scope = data.parent,
            }
        }
        None
    }

    pub fn qualified_name(&self, symbol: SymbolId) -> String {
        let data = self.get(symbol);
        let mut parts = vec![data.name.clone()];
        let mut scope = Some(data.scope);
        while let Some(id) = scope {
            let scope_data = self.scope(id);
            if let Some(owner) = scope_data.owner {
                if matches!(scope_data.kind, ScopeKind::Namespace | ScopeKind::Class) {
                    parts.push(self.get(owner).name.clone());
                }
            }
            scope = scope_data.parent;
        }
        parts.reverse();
        parts.join("::")
    }
}
