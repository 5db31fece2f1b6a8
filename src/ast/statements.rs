use crate::{symbols::symbols::Intent, Span};

use super::{
    ast::Ast,
    types::{DimSpec, LenSelector, TypeSpec},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Parameter,
    Dimension(Vec<DimSpec>),
    Pointer,
    Optional,
    Intent(Intent),
}

/// One name in a declaration, with its own shape, length and initializer.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDecl {
    pub name: String,
    pub dimensions: Option<Vec<DimSpec>>,
    pub length: Option<LenSelector>,
    pub initializer: Option<Ast>,
    pub span: Span,
}

/// Type declaration statement
/// `real, parameter :: a = 3, b(2) = (/ 1, 2 /)`
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationStmt {
    pub type_spec: TypeSpec,
    pub attributes: Vec<Attribute>,
    pub entities: Vec<EntityDecl>,
    pub span: Span,
}

/// Derived type definition
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTypeStmt {
    pub name: String,
    pub components: Vec<DeclarationStmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcedurePrefix {
    pub elemental: bool,
    pub pure: bool,
}

/// Function or subroutine, either an interface body or a definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureStmt {
    pub name: String,
    pub is_function: bool,
    pub prefix: ProcedurePrefix,
    pub result_type: Option<TypeSpec>,
    pub dummies: Vec<String>,
    pub result: Option<String>,
    pub declarations: Vec<DeclarationStmt>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenericName {
    Name(String),
    /// `operator(+)` or `operator(.cross.)`
    Operator(String),
    /// `assignment(=)`
    Assignment,
}

/// Interface block, generic when it has a name.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceStmt {
    pub generic: Option<GenericName>,
    pub bodies: Vec<ProcedureStmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Declaration(DeclarationStmt),
    DerivedType(DerivedTypeStmt),
    Procedure(ProcedureStmt),
    Interface(InterfaceStmt),
    /// `call name(args)`, held as a `FunctionCall` node.
    Call(Ast),
    /// `target = value`, held as an `Assignment` node.
    Assignment(Ast),
    Expression(Ast),
}

impl Stmt {
    pub fn get_span(&self) -> &Span {
        match self {
            Stmt::Declaration(stmt) => &stmt.span,
            Stmt::DerivedType(stmt) => &stmt.span,
            Stmt::Procedure(stmt) => &stmt.span,
            Stmt::Interface(stmt) => &stmt.span,
            Stmt::Call(ast) | Stmt::Assignment(ast) | Stmt::Expression(ast) => &ast.span,
        }
    }
}

/// A parsed program unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub name: Option<String>,
    pub implicit_none: bool,
    pub body: Vec<Stmt>,
    pub span: Span,
}
