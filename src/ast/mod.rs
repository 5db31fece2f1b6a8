/// AST (Abstract Syntax Tree) module
/// Contains the raw syntax consumed by the type checker
///
/// Submodules:
/// - ast: Expression nodes (`Ast`, `AstKind`)
/// - statements: Fortran statements and program units
/// - types: Type specifications as written in declarations
pub mod ast;
pub mod statements;
pub mod types;
