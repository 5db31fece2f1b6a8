use std::collections::HashMap;

use lazy_static::lazy_static;
use tracing::{debug, trace};

use crate::{
    ast::ast::{Ast, AstKind},
    config::{CheckerConfig, Language},
    const_value::const_value::ConstValue,
    deduction::deduction::TemplateArgument,
    errors::{
        diagnostics::Diagnostics,
        errors::{Error, ErrorImpl},
    },
    internal_error,
    nodecl::nodecl::Nodecl,
    symbols::{scope::DeclContext, symbols::{SymbolId, SymbolTable}},
    types::types::{ArrayBound, TypeId, TypeKind, TypeTable},
    Span,
};

use super::{cxx, fortran};

/// Checks one syntax node of a given kind.
pub type Handler = fn(&mut TypeChecker, &Ast, &DeclContext) -> Result<Nodecl, Error>;

fn sorted(mut handlers: Vec<(AstKind, Handler)>) -> Vec<(AstKind, Handler)> {
    handlers.sort_by_key(|(kind, _)| *kind);
    handlers
}

lazy_static! {
    static ref FORTRAN_HANDLERS: Vec<(AstKind, Handler)> = sorted(fortran::expr::handlers());
    static ref CXX_HANDLERS: Vec<(AstKind, Handler)> = sorted(cxx::expr::handlers());
}

/// State shared by every check of a compilation unit.
#[derive(Debug)]
pub struct TypeChecker {
    pub types: TypeTable,
    pub symbols: SymbolTable,
    pub config: CheckerConfig,
    pub diagnostics: Diagnostics,
    /// Undeclared Fortran names are typed by their first letter.
    pub implicit_typing: bool,
    pub(crate) intrinsic_symbols: HashMap<String, SymbolId>,
    pub(crate) class_specializations: HashMap<(SymbolId, Vec<TemplateArgument>), SymbolId>,
}

impl TypeChecker {
    pub fn new(config: CheckerConfig) -> Self {
        let implicit_typing = !config.implicit_none;
        TypeChecker {
            types: TypeTable::new(),
            symbols: SymbolTable::new(),
            config,
            diagnostics: Diagnostics::new(),
            implicit_typing,
            intrinsic_symbols: HashMap::new(),
            class_specializations: HashMap::new(),
        }
    }

    /// Checks an expression. Never fails: on error the diagnostic is
    /// reported (unless probing) and the error nodecl is returned.
    pub fn check_expression(&mut self, ast: &Ast, context: &DeclContext) -> Nodecl {
        match dispatch(self, ast, context) {
            Ok(nodecl) => nodecl,
            Err(error) => {
                trace!("{:?} failed: {}", ast.kind, error);
                self.report(error);
                Nodecl::error(ast.span.clone())
            }
        }
    }

    /// Checks a subexpression whose failure aborts the enclosing check. The
    /// failure was already reported, so the returned error only propagates.
    pub fn check_operand(&mut self, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
        let nodecl = self.check_expression(ast, context);
        if nodecl.is_error() {
            return Err(already_reported(&ast.span));
        }
        Ok(nodecl)
    }

    pub fn report(&mut self, error: Error) {
        self.diagnostics.report(error);
    }

    pub fn is_probing(&self) -> bool {
        self.diagnostics.is_muted()
    }

    /// Runs `f` with diagnostics suppressed.
    pub fn probe<T>(&mut self, f: impl FnOnce(&mut TypeChecker) -> T) -> T {
        self.diagnostics.mute();
        let result = f(self);
        self.diagnostics.unmute();
        result
    }

    pub fn is_fortran(&self) -> bool {
        self.config.language == Language::Fortran
    }

    /// Spelling of a type in the checked language.
    pub fn describe(&self, ty: TypeId) -> String {
        if self.is_fortran() {
            self.types.describe_fortran(ty, &self.symbols)
        } else {
            self.types.describe(ty, &self.symbols)
        }
    }

    pub fn describe_types(&self, types: &[TypeId]) -> String {
        types
            .iter()
            .map(|ty| self.describe(*ty))
            .collect::<Vec<_>>()
            .join(", ")
    }

    // Default Fortran types

    pub fn default_integer(&mut self) -> TypeId {
        let kind = self.config.default_integer_kind;
        self.types.fortran_integer(kind)
    }

    pub fn default_real(&mut self) -> TypeId {
        let kind = self.config.default_real_kind;
        self.types.fortran_real(kind).unwrap_or(TypeId::ERROR)
    }

    pub fn double_precision(&mut self) -> TypeId {
        let kind = self.config.double_precision_kind;
        self.types.fortran_real(kind).unwrap_or(TypeId::ERROR)
    }

    pub fn default_logical(&mut self) -> TypeId {
        let kind = self.config.default_logical_kind;
        self.types.fortran_logical(kind)
    }

    pub fn default_character(&mut self, len: ArrayBound) -> TypeId {
        let kind = self.config.default_character_kind;
        self.types.fortran_character(len, kind)
    }

    /// Type of a comparison or logical operation: default logical in
    /// Fortran, `int` in C and `bool` in C++.
    pub fn truth_type(&mut self) -> TypeId {
        match self.config.language {
            Language::Fortran => self.default_logical(),
            Language::C => self.types.signed_int(),
            Language::Cxx => self.types.bool_type(1),
        }
    }

    /// Implicit type of an undeclared Fortran name: `i`-`n` integer,
    /// anything else default real.
    pub fn implicit_type(&mut self, name: &str) -> TypeId {
        match name.chars().next() {
            Some('i'..='n') => self.default_integer(),
            _ => self.default_real(),
        }
    }
}

/// Converts a constant to the representation of `ty`, elementwise for arrays.
pub fn convert_constant(types: &TypeTable, value: &ConstValue, ty: TypeId) -> Option<ConstValue> {
    let scalar = types.rank0(ty);
    match types.kind(scalar) {
        TypeKind::Integer { bytes, signed } => value.cast_to_integer(*bytes, *signed),
        TypeKind::Bool { bytes } => value.cast_to_integer(*bytes, true),
        TypeKind::Float(precision) => value.cast_to_float(*precision),
        TypeKind::Complex(base) => match types.kind(*base) {
            TypeKind::Float(precision) => value.cast_to_complex(*precision),
            _ => None,
        },
        TypeKind::Character { bytes } => value.cast_to_integer(*bytes, false),
        _ => Some(value.clone()),
    }
}

pub fn error_at(kind: ErrorImpl, span: &Span) -> Error {
    Error::new(kind, span.start.clone())
}

pub fn already_reported(span: &Span) -> Error {
    error_at(ErrorImpl::AlreadyReported, span)
}

pub fn not_supported(feature: &str, span: &Span) -> Error {
    error_at(
        ErrorImpl::NotSupported {
            feature: feature.to_string(),
        },
        span,
    )
}

fn dispatch(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    if ast.kind == AstKind::Ambiguous {
        return check_ambiguous(type_checker, ast, context);
    }

    let handlers: &[(AstKind, Handler)] = match type_checker.config.language {
        Language::Fortran => &FORTRAN_HANDLERS,
        Language::C | Language::Cxx => &CXX_HANDLERS,
    };
    match handlers.binary_search_by_key(&ast.kind, |(kind, _)| *kind) {
        Ok(index) => (handlers[index].1)(type_checker, ast, context),
        Err(_) => internal_error!(
            "no {:?} handler for expression kind {:?}",
            type_checker.config.language,
            ast.kind
        ),
    }
}

/// Tries every interpretation with diagnostics muted and keeps the one
/// that checks. When none does, the most plausible one is checked again
/// so that its diagnostics surface.
fn check_ambiguous(type_checker: &mut TypeChecker, ast: &Ast, context: &DeclContext) -> Result<Nodecl, Error> {
    let mut successes = vec![];
    for (index, alternative) in ast.children.iter().enumerate() {
        let nodecl = type_checker.probe(|tc| tc.check_expression(alternative, context));
        debug!(
            "ambiguity probe {} ({:?}): {}",
            index,
            alternative.kind,
            if nodecl.is_error() { "failed" } else { "ok" }
        );
        if !nodecl.is_error() {
            successes.push(nodecl);
        }
    }

    match successes.len() {
        0 => {
            let index = match type_checker.config.language {
                Language::Fortran => fortran::expr::failed_interpretation(type_checker, ast, context),
                Language::C | Language::Cxx => 0,
            };
            let Some(alternative) = ast.children.get(index) else {
                internal_error!("ambiguous node without alternatives");
            };
            let nodecl = type_checker.check_expression(alternative, context);
            if nodecl.is_error() {
                return Err(already_reported(&ast.span));
            }
            Ok(nodecl)
        }
        1 => Ok(successes.remove(0)),
        n => internal_error!("{} interpretations of an ambiguous expression are valid", n),
    }
}
