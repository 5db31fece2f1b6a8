use super::types::{ArrayBound, FloatPrecision, TypeId, TypeKind, TypeTable};

/// Extent of a single Fortran dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub lower: ArrayBound,
    pub size: ArrayBound,
}

impl Dimension {
    pub fn known(lower: i64, upper: i64) -> Self {
        Dimension {
            lower: ArrayBound::Known(lower),
            size: ArrayBound::Known((upper - lower + 1).max(0)),
        }
    }

    pub fn upper(&self) -> Option<i64> {
        Some(self.lower.known()? + self.size.known()? - 1)
    }
}

impl TypeTable {
    pub fn fortran_integer(&mut self, kind: u8) -> TypeId {
        self.integer(kind, true)
    }

    /// `REAL(kind)`; unsupported kinds yield `None`.
    pub fn fortran_real(&mut self, kind: u8) -> Option<TypeId> {
        match kind {
            4 | 8 | 10 | 16 => Some(self.float(FloatPrecision::from_bytes(kind)?)),
            _ => None,
        }
    }

    pub fn fortran_complex(&mut self, kind: u8) -> Option<TypeId> {
        let base = self.fortran_real(kind)?;
        Some(self.complex(base))
    }

    pub fn fortran_logical(&mut self, kind: u8) -> TypeId {
        self.bool_type(kind)
    }

    /// `CHARACTER(len=len, kind=kind)`, an array of characters indexed from 1.
    pub fn fortran_character(&mut self, len: ArrayBound, kind: u8) -> TypeId {
        let element = self.character(kind);
        self.array(element, ArrayBound::Known(1), len)
    }

    pub fn is_fortran_character(&self, ty: TypeId) -> bool {
        match self.kind(ty) {
            TypeKind::Array { element, .. } => self.is_character(*element),
            TypeKind::Character { .. } => true,
            _ => false,
        }
    }

    /// Length of a character string type when it is known.
    pub fn character_length(&self, ty: TypeId) -> Option<i64> {
        match self.kind(ty) {
            TypeKind::Array { element, size, .. } if self.is_character(*element) => size.known(),
            TypeKind::Character { .. } => Some(1),
            _ => None,
        }
    }

    pub fn is_fortran_integer(&self, ty: TypeId) -> bool {
        self.is_integer(ty)
    }

    pub fn is_fortran_real(&self, ty: TypeId) -> bool {
        self.is_floating(ty)
    }

    pub fn is_fortran_logical(&self, ty: TypeId) -> bool {
        self.is_bool(ty)
    }

    pub fn is_fortran_numeric(&self, ty: TypeId) -> bool {
        self.is_integer(ty) || self.is_floating(ty) || self.is_complex(ty)
    }

    /// Whether `ty` is a Fortran array (character strings are scalars).
    pub fn is_fortran_array(&self, ty: TypeId) -> bool {
        self.is_array(ty) && !self.is_fortran_character(ty)
    }

    /// Number of dimensions, stopping at character strings.
    pub fn rank(&self, ty: TypeId) -> usize {
        let ty = self.no_ref(ty);
        match self.kind(ty) {
            TypeKind::Array { element, .. } if !self.is_fortran_character(ty) => 1 + self.rank(*element),
            _ => 0,
        }
    }

    /// The scalar element type of a possibly multi-dimensional array.
    pub fn rank0(&self, ty: TypeId) -> TypeId {
        let ty = self.no_ref(ty);
        match self.kind(ty) {
            TypeKind::Array { element, .. } if !self.is_fortran_character(ty) => self.rank0(*element),
            _ => ty,
        }
    }

    /// Dimensions in source order, first dimension first.
    pub fn dimensions(&self, ty: TypeId) -> Vec<Dimension> {
        let mut dims = vec![];
        let mut current = self.no_ref(ty);
        while self.is_fortran_array(current) {
            if let TypeKind::Array {
                element,
                lower,
                size,
                ..
            } = self.kind(current)
            {
                dims.push(Dimension {
                    lower: lower.clone(),
                    size: size.clone(),
                });
                current = *element;
            }
        }
        dims.reverse();
        dims
    }

    /// Builds an array of `element` with `dims`, first dimension innermost.
    pub fn fortran_array(&mut self, element: TypeId, dims: &[Dimension]) -> TypeId {
        dims.iter().fold(element, |inner, dim| {
            self.array(inner, dim.lower.clone(), dim.size.clone())
        })
    }

    /// Builds an assumed-shape array of the given rank.
    pub fn fortran_assumed_shape(&mut self, element: TypeId, rank: usize) -> TypeId {
        (0..rank).fold(element, |inner, _| {
            self.assumed_shape_array(inner, ArrayBound::Known(1))
        })
    }

    /// Gives `scalar` the shape of `shaped`.
    pub fn rebuild_array(&mut self, scalar: TypeId, shaped: TypeId) -> TypeId {
        let dims = self.dimensions(shaped);
        self.fortran_array(scalar, &dims)
    }

    /// Array of `rank` dimensions whose extents are not known.
    pub fn array_of_rank(&mut self, scalar: TypeId, rank: usize) -> TypeId {
        (0..rank).fold(scalar, |inner, _| {
            self.array(inner, ArrayBound::Known(1), ArrayBound::Unknown)
        })
    }

    /// Total element count when every extent is known.
    pub fn array_element_count(&self, ty: TypeId) -> Option<i64> {
        self.dimensions(ty)
            .iter()
            .try_fold(1i64, |acc, dim| Some(acc * dim.size.known()?))
    }

    /// Kind parameter of an intrinsic type.
    pub fn fortran_kind(&self, ty: TypeId) -> Option<u8> {
        let ty = self.rank0(ty);
        match self.kind(ty) {
            TypeKind::Integer { bytes, .. } | TypeKind::Bool { bytes } | TypeKind::Character { bytes } => {
                Some(*bytes)
            }
            TypeKind::Float(precision) => Some(precision.bytes()),
            TypeKind::Complex(base) => self.fortran_kind(*base),
            TypeKind::Array { element, .. } if self.is_character(*element) => self.fortran_kind(*element),
            _ => None,
        }
    }

    /// Same intrinsic type and kind, ignoring character length.
    pub fn same_type_and_kind(&self, a: TypeId, b: TypeId) -> bool {
        let a = self.rank0(a);
        let b = self.rank0(b);
        if self.is_fortran_character(a) && self.is_fortran_character(b) {
            return self.fortran_kind(a) == self.fortran_kind(b);
        }
        a == b
    }

    /// Whether two shapes agree, treating unknown extents as compatible.
    pub fn conformable(&self, a: TypeId, b: TypeId) -> bool {
        let (rank_a, rank_b) = (self.rank(a), self.rank(b));
        if rank_a == 0 || rank_b == 0 {
            return true;
        }
        if rank_a != rank_b {
            return false;
        }
        self.dimensions(a)
            .iter()
            .zip(self.dimensions(b).iter())
            .all(|(x, y)| match (x.size.known(), y.size.known()) {
                (Some(m), Some(n)) => m == n,
                _ => true,
            })
    }
}
