use std::collections::HashMap;

pub use crate::const_value::const_value::FloatPrecision;
use crate::{
    deduction::deduction::{TemplateArgument, TemplateParameterKey},
    symbols::symbols::{SymbolId, SymbolKind, SymbolTable},
};

/// Handle to an interned type. `TypeId::ERROR` is always the error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub const ERROR: TypeId = TypeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CvQualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
}

impl CvQualifiers {
    pub const NONE: CvQualifiers = CvQualifiers {
        is_const: false,
        is_volatile: false,
    };
    pub const CONST: CvQualifiers = CvQualifiers {
        is_const: true,
        is_volatile: false,
    };
    pub const VOLATILE: CvQualifiers = CvQualifiers {
        is_const: false,
        is_volatile: true,
    };

    pub fn union(self, other: CvQualifiers) -> CvQualifiers {
        CvQualifiers {
            is_const: self.is_const || other.is_const,
            is_volatile: self.is_volatile || other.is_volatile,
        }
    }

    /// Whether `self` has at least the qualifiers of `other`.
    pub fn contains(self, other: CvQualifiers) -> bool {
        (self.is_const || !other.is_const) && (self.is_volatile || !other.is_volatile)
    }

    pub fn without(self, other: CvQualifiers) -> CvQualifiers {
        CvQualifiers {
            is_const: self.is_const && !other.is_const,
            is_volatile: self.is_volatile && !other.is_volatile,
        }
    }

    pub fn is_empty(self) -> bool {
        !self.is_const && !self.is_volatile
    }
}

/// Bound of one array dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayBound {
    Known(i64),
    Unknown,
    /// A non-type template parameter, as in `T[N]`.
    Dependent(TemplateParameterKey),
}

impl ArrayBound {
    pub fn known(&self) -> Option<i64> {
        match self {
            ArrayBound::Known(v) => Some(*v),
            _ => None,
        }
    }
}

/// The template named by a dependent template-id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateName {
    Symbol(SymbolId),
    Parameter(TemplateParameterKey),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Error,
    Void,
    Bool {
        bytes: u8,
    },
    Integer {
        bytes: u8,
        signed: bool,
    },
    /// C `char` or the element of a Fortran character string.
    Character {
        bytes: u8,
    },
    Float(FloatPrecision),
    Complex(TypeId),
    Pointer(TypeId),
    Reference {
        referenced: TypeId,
        rvalue: bool,
    },
    PointerToMember {
        pointee: TypeId,
        class: TypeId,
    },
    /// One dimension. Fortran arrays nest with the first dimension innermost.
    Array {
        element: TypeId,
        lower: ArrayBound,
        size: ArrayBound,
        assumed_shape: bool,
    },
    Function {
        result: TypeId,
        parameters: Vec<TypeId>,
        variadic: bool,
        lacks_prototype: bool,
    },
    /// Class or enum type, referring back to its declaring symbol.
    Named(SymbolId),
    TemplateParameter(TemplateParameterKey),
    DependentSpecialization {
        template: TemplateName,
        arguments: Vec<TemplateArgument>,
    },
    /// A pack expansion `T...`.
    Pack(TypeId),
    /// Several types standing in one slot while deducing packs.
    Sequence(Vec<TypeId>),
    UnresolvedOverload {
        candidates: Vec<SymbolId>,
        explicit_arguments: Option<Vec<TemplateArgument>>,
    },
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeData {
    pub kind: TypeKind,
    pub cv: CvQualifiers,
}

/// Interning table for every type of a compilation.
#[derive(Debug)]
pub struct TypeTable {
    entries: Vec<TypeData>,
    lookup: HashMap<TypeData, TypeId>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub fn new() -> Self {
        let mut table = TypeTable {
            entries: vec![],
            lookup: HashMap::new(),
        };
        let error = table.intern(TypeKind::Error, CvQualifiers::NONE);
        debug_assert_eq!(error, TypeId::ERROR);
        table
    }

    pub fn intern(&mut self, kind: TypeKind, cv: CvQualifiers) -> TypeId {
        let data = TypeData { kind, cv };
        if let Some(id) = self.lookup.get(&data) {
            return *id;
        }
        let id = TypeId(self.entries.len() as u32);
        self.entries.push(data.clone());
        self.lookup.insert(data, id);
        id
    }

    pub fn data(&self, ty: TypeId) -> &TypeData {
        &self.entries[ty.index()]
    }

    pub fn kind(&self, ty: TypeId) -> &TypeKind {
        &self.entries[ty.index()].kind
    }

    pub fn cv(&self, ty: TypeId) -> CvQualifiers {
        self.entries[ty.index()].cv
    }

    // Constructors

    pub fn error(&self) -> TypeId {
        TypeId::ERROR
    }

    pub fn void(&mut self) -> TypeId {
        self.intern(TypeKind::Void, CvQualifiers::NONE)
    }

    pub fn bool_type(&mut self, bytes: u8) -> TypeId {
        self.intern(TypeKind::Bool { bytes }, CvQualifiers::NONE)
    }

    pub fn integer(&mut self, bytes: u8, signed: bool) -> TypeId {
        self.intern(TypeKind::Integer { bytes, signed }, CvQualifiers::NONE)
    }

    pub fn signed_int(&mut self) -> TypeId {
        self.integer(4, true)
    }

    pub fn character(&mut self, bytes: u8) -> TypeId {
        self.intern(TypeKind::Character { bytes }, CvQualifiers::NONE)
    }

    pub fn float(&mut self, precision: FloatPrecision) -> TypeId {
        self.intern(TypeKind::Float(precision), CvQualifiers::NONE)
    }

    pub fn complex(&mut self, base: TypeId) -> TypeId {
        self.intern(TypeKind::Complex(base), CvQualifiers::NONE)
    }

    pub fn pointer_to(&mut self, pointee: TypeId) -> TypeId {
        self.intern(TypeKind::Pointer(pointee), CvQualifiers::NONE)
    }

    /// Builds `T&`, collapsing references to references.
    pub fn lvalue_reference(&mut self, referenced: TypeId) -> TypeId {
        let referenced = self.no_ref(referenced);
        self.intern(
            TypeKind::Reference {
                referenced,
                rvalue: false,
            },
            CvQualifiers::NONE,
        )
    }

    /// Builds `T&&`; `U& &&` collapses to `U&`.
    pub fn rvalue_reference(&mut self, referenced: TypeId) -> TypeId {
        if self.is_lvalue_reference(referenced) {
            return referenced;
        }
        let referenced = self.no_ref(referenced);
        self.intern(
            TypeKind::Reference {
                referenced,
                rvalue: true,
            },
            CvQualifiers::NONE,
        )
    }

    pub fn pointer_to_member(&mut self, pointee: TypeId, class: TypeId) -> TypeId {
        self.intern(TypeKind::PointerToMember { pointee, class }, CvQualifiers::NONE)
    }

    pub fn array(&mut self, element: TypeId, lower: ArrayBound, size: ArrayBound) -> TypeId {
        self.intern(
            TypeKind::Array {
                element,
                lower,
                size,
                assumed_shape: false,
            },
            CvQualifiers::NONE,
        )
    }

    /// C array `T[size]` indexed from zero.
    pub fn c_array(&mut self, element: TypeId, size: Option<i64>) -> TypeId {
        let size = size.map(ArrayBound::Known).unwrap_or(ArrayBound::Unknown);
        self.array(element, ArrayBound::Known(0), size)
    }

    pub fn assumed_shape_array(&mut self, element: TypeId, lower: ArrayBound) -> TypeId {
        self.intern(
            TypeKind::Array {
                element,
                lower,
                size: ArrayBound::Unknown,
                assumed_shape: true,
            },
            CvQualifiers::NONE,
        )
    }

    pub fn function(&mut self, result: TypeId, parameters: Vec<TypeId>, variadic: bool) -> TypeId {
        self.intern(
            TypeKind::Function {
                result,
                parameters,
                variadic,
                lacks_prototype: false,
            },
            CvQualifiers::NONE,
        )
    }

    /// A function type known only through an implicit interface.
    pub fn unprototyped_function(&mut self, result: TypeId) -> TypeId {
        self.intern(
            TypeKind::Function {
                result,
                parameters: vec![],
                variadic: false,
                lacks_prototype: true,
            },
            CvQualifiers::NONE,
        )
    }

    pub fn named(&mut self, symbol: SymbolId) -> TypeId {
        self.intern(TypeKind::Named(symbol), CvQualifiers::NONE)
    }

    pub fn template_parameter(&mut self, key: TemplateParameterKey) -> TypeId {
        self.intern(TypeKind::TemplateParameter(key), CvQualifiers::NONE)
    }

    pub fn dependent_specialization(
        &mut self,
        template: TemplateName,
        arguments: Vec<TemplateArgument>,
    ) -> TypeId {
        self.intern(
            TypeKind::DependentSpecialization {
                template,
                arguments,
            },
            CvQualifiers::NONE,
        )
    }

    pub fn pack(&mut self, pattern: TypeId) -> TypeId {
        self.intern(TypeKind::Pack(pattern), CvQualifiers::NONE)
    }

    pub fn sequence(&mut self, types: Vec<TypeId>) -> TypeId {
        self.intern(TypeKind::Sequence(types), CvQualifiers::NONE)
    }

    pub fn unresolved_overload(
        &mut self,
        candidates: Vec<SymbolId>,
        explicit_arguments: Option<Vec<TemplateArgument>>,
    ) -> TypeId {
        self.intern(
            TypeKind::UnresolvedOverload {
                candidates,
                explicit_arguments,
            },
            CvQualifiers::NONE,
        )
    }

    pub fn auto(&mut self) -> TypeId {
        self.intern(TypeKind::Auto, CvQualifiers::NONE)
    }

    // Qualification

    /// Adds qualifiers. Arrays carry the qualifiers of their elements;
    /// references and functions cannot be qualified.
    pub fn qualified(&mut self, ty: TypeId, cv: CvQualifiers) -> TypeId {
        if cv.is_empty() {
            return ty;
        }
        match self.kind(ty).clone() {
            TypeKind::Reference { .. } | TypeKind::Function { .. } | TypeKind::Error => ty,
            TypeKind::Array {
                element,
                lower,
                size,
                assumed_shape,
            } => {
                let element = self.qualified(element, cv);
                self.intern(
                    TypeKind::Array {
                        element,
                        lower,
                        size,
                        assumed_shape,
                    },
                    CvQualifiers::NONE,
                )
            }
            kind => {
                let merged = self.cv(ty).union(cv);
                self.intern(kind, merged)
            }
        }
    }

    pub fn unqualified(&mut self, ty: TypeId) -> TypeId {
        if self.cv(ty).is_empty() {
            return ty;
        }
        let kind = self.kind(ty).clone();
        self.intern(kind, CvQualifiers::NONE)
    }

    /// Qualifiers of a type, looking through array levels.
    pub fn effective_cv(&self, ty: TypeId) -> CvQualifiers {
        match self.kind(ty) {
            TypeKind::Array { element, .. } => self.effective_cv(*element),
            _ => self.cv(ty),
        }
    }

    pub fn no_ref(&self, ty: TypeId) -> TypeId {
        match self.kind(ty) {
            TypeKind::Reference { referenced, .. } => *referenced,
            _ => ty,
        }
    }

    // Predicates

    pub fn is_error(&self, ty: TypeId) -> bool {
        ty == TypeId::ERROR
    }

    pub fn is_void(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Void)
    }

    pub fn is_bool(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Bool { .. })
    }

    pub fn is_integer(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Integer { .. })
    }

    pub fn is_signed_integer(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Integer { signed: true, .. })
    }

    pub fn is_unsigned_integer(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Integer { signed: false, .. })
    }

    pub fn is_character(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Character { .. })
    }

    pub fn is_floating(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Float(_))
    }

    pub fn is_complex(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Complex(_))
    }

    pub fn is_pointer(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Pointer(_))
    }

    pub fn is_reference(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Reference { .. })
    }

    pub fn is_lvalue_reference(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Reference { rvalue: false, .. })
    }

    pub fn is_rvalue_reference(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Reference { rvalue: true, .. })
    }

    pub fn is_pointer_to_member(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::PointerToMember { .. })
    }

    pub fn is_array(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Array { .. })
    }

    pub fn is_function(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Function { .. })
    }

    pub fn is_pointer_to_function(&self, ty: TypeId) -> bool {
        match self.kind(ty) {
            TypeKind::Pointer(pointee) => self.is_function(*pointee),
            _ => false,
        }
    }

    pub fn is_named(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Named(_))
    }

    pub fn is_class(&self, ty: TypeId, symbols: &SymbolTable) -> bool {
        match self.kind(ty) {
            TypeKind::Named(symbol) => symbols.get(*symbol).kind == SymbolKind::Class,
            _ => false,
        }
    }

    pub fn is_enum(&self, ty: TypeId, symbols: &SymbolTable) -> bool {
        match self.kind(ty) {
            TypeKind::Named(symbol) => symbols.get(*symbol).kind == SymbolKind::Enum,
            _ => false,
        }
    }

    /// Integer, bool, char and enum types.
    pub fn is_integral(&self, ty: TypeId, symbols: &SymbolTable) -> bool {
        self.is_integer(ty) || self.is_bool(ty) || self.is_character(ty) || self.is_enum(ty, symbols)
    }

    pub fn is_arithmetic(&self, ty: TypeId, symbols: &SymbolTable) -> bool {
        self.is_integral(ty, symbols) || self.is_floating(ty) || self.is_complex(ty)
    }

    /// Arithmetic, pointer and pointer-to-member types.
    pub fn is_scalar(&self, ty: TypeId, symbols: &SymbolTable) -> bool {
        self.is_arithmetic(ty, symbols) || self.is_pointer(ty) || self.is_pointer_to_member(ty)
    }

    pub fn is_pack(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Pack(_))
    }

    pub fn is_sequence(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Sequence(_))
    }

    pub fn is_unresolved_overload(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::UnresolvedOverload { .. })
    }

    pub fn is_template_parameter(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::TemplateParameter(_))
    }

    pub fn is_auto(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Auto)
    }

    /// Whether the type mentions a template parameter anywhere.
    pub fn is_dependent(&self, ty: TypeId) -> bool {
        match self.kind(ty) {
            TypeKind::TemplateParameter(_) | TypeKind::DependentSpecialization { .. } => true,
            TypeKind::Error
            | TypeKind::Void
            | TypeKind::Bool { .. }
            | TypeKind::Integer { .. }
            | TypeKind::Character { .. }
            | TypeKind::Float(_)
            | TypeKind::Named(_)
            | TypeKind::UnresolvedOverload { .. }
            | TypeKind::Auto => false,
            TypeKind::Complex(inner) | TypeKind::Pointer(inner) | TypeKind::Pack(inner) => {
                self.is_dependent(*inner)
            }
            TypeKind::Reference { referenced, .. } => self.is_dependent(*referenced),
            TypeKind::PointerToMember { pointee, class } => {
                self.is_dependent(*pointee) || self.is_dependent(*class)
            }
            TypeKind::Array {
                element,
                lower,
                size,
                ..
            } => {
                self.is_dependent(*element)
                    || matches!(lower, ArrayBound::Dependent(_))
                    || matches!(size, ArrayBound::Dependent(_))
            }
            TypeKind::Function {
                result, parameters, ..
            } => self.is_dependent(*result) || parameters.iter().any(|p| self.is_dependent(*p)),
            TypeKind::Sequence(types) => types.iter().any(|t| self.is_dependent(*t)),
        }
    }

    /// Structural equivalence. Interning makes structurally equal types
    /// share a handle, so this reduces to handle comparison.
    pub fn equivalent_types(&self, a: TypeId, b: TypeId) -> bool {
        a == b && a != TypeId::ERROR
    }

    // Accessors

    pub fn pointer_pointee(&self, ty: TypeId) -> Option<TypeId> {
        match self.kind(ty) {
            TypeKind::Pointer(pointee) => Some(*pointee),
            _ => None,
        }
    }

    pub fn array_element(&self, ty: TypeId) -> Option<TypeId> {
        match self.kind(ty) {
            TypeKind::Array { element, .. } => Some(*element),
            _ => None,
        }
    }

    pub fn complex_base(&self, ty: TypeId) -> Option<TypeId> {
        match self.kind(ty) {
            TypeKind::Complex(base) => Some(*base),
            _ => None,
        }
    }

    pub fn function_result(&self, ty: TypeId) -> Option<TypeId> {
        match self.kind(ty) {
            TypeKind::Function { result, .. } => Some(*result),
            _ => None,
        }
    }

    pub fn function_parameters(&self, ty: TypeId) -> &[TypeId] {
        match self.kind(ty) {
            TypeKind::Function { parameters, .. } => parameters,
            _ => &[],
        }
    }

    pub fn named_symbol(&self, ty: TypeId) -> Option<SymbolId> {
        match self.kind(ty) {
            TypeKind::Named(symbol) => Some(*symbol),
            _ => None,
        }
    }

    /// Size in bytes of scalar types, used by integer promotion and `sizeof`.
    pub fn size_of(&self, ty: TypeId) -> Option<i64> {
        match self.kind(ty) {
            TypeKind::Bool { bytes } | TypeKind::Integer { bytes, .. } | TypeKind::Character { bytes } => {
                Some(*bytes as i64)
            }
            TypeKind::Float(precision) => Some(match precision {
                FloatPrecision::LongDouble => 16,
                p => p.bytes() as i64,
            }),
            TypeKind::Complex(base) => self.size_of(*base).map(|s| s * 2),
            TypeKind::Pointer(_) | TypeKind::PointerToMember { .. } => Some(8),
            TypeKind::Array { element, size, .. } => Some(self.size_of(*element)? * size.known()?),
            TypeKind::Named(_) => Some(4),
            _ => None,
        }
    }
}
