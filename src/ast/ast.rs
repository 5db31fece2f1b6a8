use crate::{types::types::TypeId, Span};

/// Expression node kinds.
///
/// The checker keeps one handler per kind and dialect, looked up by binary
/// search, so the derive of `Ord` is load-bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AstKind {
    // Literals
    IntegerLiteral,
    FloatingLiteral,
    /// `(re, im)`; children are the two parts.
    ComplexLiteral,
    BooleanLiteral,
    StringLiteral,
    CharacterLiteral,

    // Names
    Symbol,
    /// `name<args>`; children are the template arguments.
    TemplateId,
    /// `a::b::c`, spelled in `text`.
    QualifiedId,
    /// A type-id whose type was resolved by the declaration front end.
    TypeName,
    /// An omitted optional part, such as a missing triplet bound.
    Empty,

    // Binary operators
    Add,
    Minus,
    Mul,
    Div,
    Mod,
    Power,
    Concat,
    Equal,
    Different,
    LowerThan,
    LowerOrEqual,
    GreaterThan,
    GreaterOrEqual,
    LogicalAnd,
    LogicalOr,
    Eqv,
    Neqv,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    Shl,
    Shr,
    /// `a .name. b`; the operator is in `text`.
    DefinedBinary,

    // Unary operators
    Neg,
    Plus,
    LogicalNot,
    BitwiseNot,
    Reference,
    Dereference,
    /// `.name. a`; the operator is in `text`.
    DefinedUnary,

    Parenthesized,
    Conditional,
    Comma,
    /// Child is the operand; the target type is `type_ref`.
    Cast,
    Sizeof,
    Assignment,

    /// Children: callee, `ArgumentList`.
    FunctionCall,
    ArgumentList,
    /// `name = value` inside an argument list.
    KeywordArgument,
    /// Children: base, `SubscriptList`.
    ArraySubscript,
    SubscriptList,
    /// `lower:upper:stride`; omitted parts are `Empty`.
    Range,
    /// Fortran `base%member`.
    ComponentReference,
    /// C `base.member`.
    MemberAccess,
    /// C `base->member`.
    PointerMemberAccess,
    ArrayConstructor,
    /// Children: values (`ArgumentList`), lower, upper, stride. The loop
    /// variable is in `text`.
    ImpliedDo,
    BracedInitializer,
    /// Alternative interpretations of the same source.
    Ambiguous,
}

impl AstKind {
    /// Source spelling of an operator kind, used for diagnostics and to name
    /// user-defined operator interfaces.
    pub fn operator_name(&self) -> &'static str {
        match self {
            AstKind::Add | AstKind::Plus => "+",
            AstKind::Minus | AstKind::Neg => "-",
            AstKind::Mul => "*",
            AstKind::Div => "/",
            AstKind::Mod => "%",
            AstKind::Power => "**",
            AstKind::Concat => "//",
            AstKind::Equal => "==",
            AstKind::Different => "/=",
            AstKind::LowerThan => "<",
            AstKind::LowerOrEqual => "<=",
            AstKind::GreaterThan => ">",
            AstKind::GreaterOrEqual => ">=",
            AstKind::LogicalAnd => ".and.",
            AstKind::LogicalOr => ".or.",
            AstKind::LogicalNot => ".not.",
            AstKind::Eqv => ".eqv.",
            AstKind::Neqv => ".neqv.",
            AstKind::BitwiseAnd | AstKind::Reference => "&",
            AstKind::BitwiseOr => "|",
            AstKind::BitwiseXor => "^",
            AstKind::BitwiseNot => "~",
            AstKind::Shl => "<<",
            AstKind::Shr => ">>",
            AstKind::Dereference => "*",
            AstKind::Assignment => "=",
            _ => "",
        }
    }

    /// C spelling where it differs from the Fortran one.
    pub fn c_operator_name(&self) -> &'static str {
        match self {
            AstKind::Different => "!=",
            AstKind::LogicalAnd => "&&",
            AstKind::LogicalOr => "||",
            AstKind::LogicalNot => "!",
            other => other.operator_name(),
        }
    }
}

/// A raw syntax node as produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    pub kind: AstKind,
    pub children: Vec<Ast>,
    /// Name, literal spelling or operator spelling.
    pub text: String,
    pub span: Span,
    /// Type resolved for type-ids and casts.
    pub type_ref: Option<TypeId>,
}

impl Ast {
    pub fn new(kind: AstKind, children: Vec<Ast>, text: &str, span: Span) -> Self {
        Ast {
            kind,
            children,
            text: text.to_string(),
            span,
            type_ref: None,
        }
    }

    pub fn leaf(kind: AstKind, text: &str, span: Span) -> Self {
        Ast::new(kind, vec![], text, span)
    }

    pub fn node(kind: AstKind, children: Vec<Ast>, span: Span) -> Self {
        Ast::new(kind, children, "", span)
    }

    pub fn binary(kind: AstKind, left: Ast, right: Ast) -> Self {
        let span = left.span.to(&right.span);
        Ast::node(kind, vec![left, right], span)
    }

    pub fn unary(kind: AstKind, operand: Ast) -> Self {
        let span = operand.span.clone();
        Ast::node(kind, vec![operand], span)
    }

    pub fn with_type(mut self, ty: TypeId) -> Self {
        self.type_ref = Some(ty);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn child(&self, index: usize) -> Option<&Ast> {
        self.children.get(index)
    }

    pub fn is_empty_node(&self) -> bool {
        self.kind == AstKind::Empty
    }

    // Builders for programmatically constructed trees.

    pub fn symbol(name: &str) -> Self {
        Ast::leaf(AstKind::Symbol, name, Span::null())
    }

    pub fn qualified(path: &str) -> Self {
        Ast::leaf(AstKind::QualifiedId, path, Span::null())
    }

    pub fn integer(spelling: &str) -> Self {
        Ast::leaf(AstKind::IntegerLiteral, spelling, Span::null())
    }

    pub fn floating(spelling: &str) -> Self {
        Ast::leaf(AstKind::FloatingLiteral, spelling, Span::null())
    }

    pub fn string(value: &str) -> Self {
        Ast::leaf(AstKind::StringLiteral, value, Span::null())
    }

    pub fn boolean(value: bool) -> Self {
        Ast::leaf(AstKind::BooleanLiteral, if value { "true" } else { "false" }, Span::null())
    }

    pub fn type_name(ty: TypeId) -> Self {
        Ast::leaf(AstKind::TypeName, "", Span::null()).with_type(ty)
    }

    pub fn call(callee: Ast, arguments: Vec<Ast>) -> Self {
        let span = callee.span.clone();
        let list = Ast::node(AstKind::ArgumentList, arguments, span.clone());
        Ast::node(AstKind::FunctionCall, vec![callee, list], span)
    }

    pub fn keyword_argument(keyword: &str, value: Ast) -> Self {
        let span = value.span.clone();
        Ast::new(AstKind::KeywordArgument, vec![value], keyword, span)
    }

    pub fn subscript(base: Ast, subscripts: Vec<Ast>) -> Self {
        let span = base.span.clone();
        let list = Ast::node(AstKind::SubscriptList, subscripts, span.clone());
        Ast::node(AstKind::ArraySubscript, vec![base, list], span)
    }

    pub fn ambiguous(alternatives: Vec<Ast>) -> Self {
        let span = alternatives.first().map(|a| a.span.clone()).unwrap_or_else(Span::null);
        Ast::node(AstKind::Ambiguous, alternatives, span)
    }
}
