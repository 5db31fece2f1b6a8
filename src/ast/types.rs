use super::ast::Ast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrinsicTypeName {
    Integer,
    Real,
    DoublePrecision,
    Complex,
    Logical,
    Character,
}

/// Length selector of a character type.
#[derive(Debug, Clone, PartialEq)]
pub enum LenSelector {
    Expr(Ast),
    /// `len=*`
    Assumed,
}

/// Declared type of a Fortran entity.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpec {
    Intrinsic {
        name: IntrinsicTypeName,
        kind: Option<Ast>,
        len: Option<LenSelector>,
    },
    /// `type(name)`
    Derived(String),
}

/// One dimension of an array specification.
#[derive(Debug, Clone, PartialEq)]
pub enum DimSpec {
    /// `[lower:]upper`
    Explicit { lower: Option<Ast>, upper: Ast },
    /// `:` or `lower:`
    AssumedShape { lower: Option<Ast> },
    /// `*` or `lower:*`
    AssumedSize { lower: Option<Ast> },
}
