use std::{collections::HashMap, ops::BitOr};

use crate::deduction::deduction::TemplateParameterList;

use super::symbols::SymbolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub(crate) u32);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Namespace,
    Class,
    Block,
    Prototype,
    Template,
    /// Fortran program unit or module.
    Program,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Namespace, class or procedure that opened the scope.
    pub owner: Option<SymbolId>,
    pub names: HashMap<String, Vec<SymbolId>>,
    /// Scopes made visible by using-directives or `use` statements.
    pub used_scopes: Vec<ScopeId>,
    pub is_inline: bool,
}

impl Scope {
    pub fn new(kind: ScopeKind, parent: Option<ScopeId>, owner: Option<SymbolId>) -> Self {
        Scope {
            kind,
            parent,
            owner,
            names: HashMap::new(),
            used_scopes: vec![],
            is_inline: false,
        }
    }
}

/// Name query flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryFlags(u32);

impl QueryFlags {
    pub const NONE: QueryFlags = QueryFlags(0);
    /// Skip entities only introduced by a friend declaration.
    pub const IGNORE_FRIEND_DECLARED: QueryFlags = QueryFlags(1);
    /// Do not climb to enclosing scopes.
    pub const CURRENT_SCOPE_ONLY: QueryFlags = QueryFlags(1 << 1);

    pub fn contains(self, other: QueryFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for QueryFlags {
    type Output = QueryFlags;

    fn bitor(self, rhs: QueryFlags) -> QueryFlags {
        QueryFlags(self.0 | rhs.0)
    }
}

/// Where an expression is being checked.
#[derive(Debug, Clone)]
pub struct DeclContext {
    pub current_scope: ScopeId,
    pub namespace_scope: ScopeId,
    pub template_parameters: Option<TemplateParameterList>,
}

impl DeclContext {
    pub fn global() -> Self {
        DeclContext {
            current_scope: ScopeId::GLOBAL,
            namespace_scope: ScopeId::GLOBAL,
            template_parameters: None,
        }
    }

    pub fn in_scope(&self, current_scope: ScopeId) -> Self {
        DeclContext {
            current_scope,
            namespace_scope: self.namespace_scope,
            template_parameters: self.template_parameters.clone(),
        }
    }

    pub fn with_template_parameters(&self, parameters: TemplateParameterList) -> Self {
        DeclContext {
            current_scope: self.current_scope,
            namespace_scope: self.namespace_scope,
            template_parameters: Some(parameters),
        }
    }
}
