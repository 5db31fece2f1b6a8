use std::rc::Rc;

use crate::{
    const_value::const_value::ConstValue, deduction::deduction::TemplateParameterList,
    symbols::symbols::SymbolId, types::types::TypeId, Span,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeclKind {
    Error,
    List,
    IntegerLiteral,
    FloatingLiteral,
    ComplexLiteral,
    BooleanLiteral,
    StringLiteral,
    Symbol,
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
    LogicalNot,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    BitwiseNot,
    Shl,
    Shr,
    Neg,
    Plus,
    Reference,
    Dereference,
    /// Implicit conversion to the annotated type.
    Conversion,
    Cast,
    Sizeof,
    Conditional,
    Comma,
    Assignment,
    FunctionCall,
    ArraySubscript,
    /// `lower:upper:stride`.
    Range,
    ClassMemberAccess,
    StructuredValue,
    ImpliedDo,
    Parenthesized,
    /// Call, argument or operand whose meaning depends on template parameters.
    Dependent,
}

/// Semantic results attached to a checked expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub ty: TypeId,
    pub symbol: Option<SymbolId>,
    pub constant: Option<ConstValue>,
    pub is_lvalue: bool,
    pub is_type_dependent: bool,
    pub is_value_dependent: bool,
    /// Deduced template arguments of a call to a specialization.
    pub template_arguments: Option<TemplateParameterList>,
}

impl Annotation {
    fn typed(ty: TypeId) -> Self {
        Annotation {
            ty,
            symbol: None,
            constant: None,
            is_lvalue: false,
            is_type_dependent: false,
            is_value_dependent: false,
            template_arguments: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeclData {
    pub kind: NodeclKind,
    pub children: Vec<Nodecl>,
    /// Literal spelling, member name or operator name.
    pub text: String,
    pub span: Span,
    pub annotation: Annotation,
}

/// A checked expression node. Cloning is a shallow copy that shares
/// children; [`Nodecl::deep_copy`] duplicates the whole tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Nodecl(Rc<NodeclData>);

impl Nodecl {
    /// Builds a well-typed node. The error type is reserved for
    /// [`Nodecl::error`].
    pub fn new(kind: NodeclKind, children: Vec<Nodecl>, ty: TypeId, span: Span) -> Self {
        assert!(
            ty != TypeId::ERROR && kind != NodeclKind::Error,
            "non-error nodecl built with the error type"
        );
        Nodecl(Rc::new(NodeclData {
            kind,
            children,
            text: String::new(),
            span,
            annotation: Annotation::typed(ty),
        }))
    }

    pub fn error(span: Span) -> Self {
        Nodecl(Rc::new(NodeclData {
            kind: NodeclKind::Error,
            children: vec![],
            text: String::new(),
            span,
            annotation: Annotation::typed(TypeId::ERROR),
        }))
    }

    pub fn symbol(symbol: SymbolId, ty: TypeId, span: Span) -> Self {
        Nodecl::new(NodeclKind::Symbol, vec![], ty, span).with_symbol(symbol)
    }

    pub fn with_text(mut self, text: &str) -> Self {
        Rc::make_mut(&mut self.0).text = text.to_string();
        self
    }

    pub fn with_symbol(mut self, symbol: SymbolId) -> Self {
        Rc::make_mut(&mut self.0).annotation.symbol = Some(symbol);
        self
    }

    pub fn with_constant(mut self, constant: Option<ConstValue>) -> Self {
        if !self.is_error() {
            Rc::make_mut(&mut self.0).annotation.constant = constant;
        }
        self
    }

    pub fn with_lvalue(mut self, is_lvalue: bool) -> Self {
        Rc::make_mut(&mut self.0).annotation.is_lvalue = is_lvalue;
        self
    }

    pub fn with_dependence(mut self, type_dependent: bool, value_dependent: bool) -> Self {
        let annotation = &mut Rc::make_mut(&mut self.0).annotation;
        annotation.is_type_dependent = type_dependent;
        annotation.is_value_dependent = value_dependent || type_dependent;
        self
    }

    pub fn with_template_arguments(mut self, arguments: TemplateParameterList) -> Self {
        Rc::make_mut(&mut self.0).annotation.template_arguments = Some(arguments);
        self
    }

    /// Same node with another type. The error type turns it into an error node.
    pub fn retyped(mut self, ty: TypeId) -> Self {
        if ty == TypeId::ERROR {
            return Nodecl::error(self.span().clone());
        }
        if self.is_error() {
            return self;
        }
        Rc::make_mut(&mut self.0).annotation.ty = ty;
        self
    }

    pub fn kind(&self) -> NodeclKind {
        self.0.kind
    }

    pub fn is_error(&self) -> bool {
        self.0.kind == NodeclKind::Error
    }

    pub fn children(&self) -> &[Nodecl] {
        &self.0.children
    }

    pub fn child(&self, index: usize) -> Option<&Nodecl> {
        self.0.children.get(index)
    }

    pub fn text(&self) -> &str {
        &self.0.text
    }

    pub fn span(&self) -> &Span {
        &self.0.span
    }

    pub fn annotation(&self) -> &Annotation {
        &self.0.annotation
    }

    pub fn ty(&self) -> TypeId {
        self.0.annotation.ty
    }

    pub fn get_symbol(&self) -> Option<SymbolId> {
        self.0.annotation.symbol
    }

    pub fn constant(&self) -> Option<&ConstValue> {
        self.0.annotation.constant.as_ref()
    }

    pub fn is_constant(&self) -> bool {
        self.0.annotation.constant.is_some()
    }

    pub fn is_lvalue(&self) -> bool {
        self.0.annotation.is_lvalue
    }

    pub fn is_type_dependent(&self) -> bool {
        self.0.annotation.is_type_dependent
    }

    pub fn is_value_dependent(&self) -> bool {
        self.0.annotation.is_value_dependent
    }

    pub fn template_arguments(&self) -> Option<&TemplateParameterList> {
        self.0.annotation.template_arguments.as_ref()
    }

    /// Whether both handles point at the same node.
    pub fn same_node(&self, other: &Nodecl) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn shallow_copy(&self) -> Nodecl {
        self.clone()
    }

    pub fn deep_copy(&self) -> Nodecl {
        self.deep_copy_remapped(&|symbol| symbol, &mut |ty| ty)
    }

    /// Duplicates the tree, mapping every referenced symbol and type.
    pub fn deep_copy_remapped(
        &self,
        remap_symbol: &dyn Fn(SymbolId) -> SymbolId,
        remap_type: &mut dyn FnMut(TypeId) -> TypeId,
    ) -> Nodecl {
        let children = self
            .0
            .children
            .iter()
            .map(|child| child.deep_copy_remapped(remap_symbol, remap_type))
            .collect();
        let mut annotation = self.0.annotation.clone();
        if annotation.ty != TypeId::ERROR {
            annotation.ty = remap_type(annotation.ty);
        }
        annotation.symbol = annotation.symbol.map(remap_symbol);
        let kind = if annotation.ty == TypeId::ERROR {
            NodeclKind::Error
        } else {
            self.0.kind
        };
        Nodecl(Rc::new(NodeclData {
            kind,
            children,
            text: self.0.text.clone(),
            span: self.0.span.clone(),
            annotation,
        }))
    }
}
