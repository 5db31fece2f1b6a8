use crate::{
    deduction::deduction::TemplateArgument,
    symbols::symbols::{SymbolId, SymbolTable},
};

use super::types::{ArrayBound, FloatPrecision, TemplateName, TypeId, TypeKind, TypeTable};

impl TypeTable {
    /// C/C++ spelling of a type, for diagnostics and traces.
    pub fn describe(&self, ty: TypeId, symbols: &SymbolTable) -> String {
        let cv = self.cv(ty);
        let mut prefix = String::new();
        if cv.is_const {
            prefix.push_str("const ");
        }
        if cv.is_volatile {
            prefix.push_str("volatile ");
        }

        let body = match self.kind(ty) {
            TypeKind::Error => "<error>".to_string(),
            TypeKind::Void => "void".to_string(),
            TypeKind::Bool { .. } => "bool".to_string(),
            TypeKind::Integer { bytes, signed } => c_integer_name(*bytes, *signed),
            TypeKind::Character { bytes } => match bytes {
                1 => "char".to_string(),
                2 => "char16_t".to_string(),
                _ => "wchar_t".to_string(),
            },
            TypeKind::Float(precision) => c_float_name(*precision).to_string(),
            TypeKind::Complex(base) => format!("_Complex {}", self.describe(*base, symbols)),
            TypeKind::Pointer(pointee) => match self.kind(*pointee) {
                TypeKind::Function {
                    result, parameters, variadic, ..
                } => format!(
                    "{} (*)({})",
                    self.describe(*result, symbols),
                    self.describe_parameters(parameters, *variadic, symbols)
                ),
                _ => format!("{} *", self.describe(*pointee, symbols)),
            },
            TypeKind::Reference { referenced, rvalue } => {
                format!("{} {}", self.describe(*referenced, symbols), if *rvalue { "&&" } else { "&" })
            }
            TypeKind::PointerToMember { pointee, class } => format!(
                "{} {}::*",
                self.describe(*pointee, symbols),
                self.describe(*class, symbols)
            ),
            TypeKind::Array { element, size, .. } => match size {
                ArrayBound::Known(n) => format!("{} [{}]", self.describe(*element, symbols), n),
                ArrayBound::Dependent(key) => format!("{} [{}]", self.describe(*element, symbols), key.name),
                ArrayBound::Unknown => format!("{} []", self.describe(*element, symbols)),
            },
            TypeKind::Function {
                result,
                parameters,
                variadic,
                lacks_prototype,
            } => {
                if *lacks_prototype {
                    format!("{} ()", self.describe(*result, symbols))
                } else {
                    format!(
                        "{} ({})",
                        self.describe(*result, symbols),
                        self.describe_parameters(parameters, *variadic, symbols)
                    )
                }
            }
            TypeKind::Named(symbol) => self.describe_named(*symbol, symbols),
            TypeKind::TemplateParameter(key) => key.name.clone(),
            TypeKind::DependentSpecialization { template, arguments } => {
                let name = match template {
                    TemplateName::Symbol(symbol) => symbols.qualified_name(*symbol),
                    TemplateName::Parameter(key) => key.name.clone(),
                };
                format!("{}<{}>", name, self.describe_arguments(arguments, symbols))
            }
            TypeKind::Pack(pattern) => format!("{}...", self.describe(*pattern, symbols)),
            TypeKind::Sequence(types) => format!(
                "{{{}}}",
                types
                    .iter()
                    .map(|t| self.describe(*t, symbols))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            TypeKind::UnresolvedOverload { .. } => "<unresolved overloaded function type>".to_string(),
            TypeKind::Auto => "auto".to_string(),
        };

        prefix + &body
    }

    fn describe_parameters(&self, parameters: &[TypeId], variadic: bool, symbols: &SymbolTable) -> String {
        let mut names: Vec<String> = parameters.iter().map(|p| self.describe(*p, symbols)).collect();
        if variadic {
            names.push("...".to_string());
        }
        names.join(", ")
    }

    fn describe_named(&self, symbol: SymbolId, symbols: &SymbolTable) -> String {
        let name = symbols.qualified_name(symbol);
        match &symbols.get(symbol).specs.template_arguments {
            Some(list) => format!("{}<{}>", name, self.describe_arguments(&list.bound_arguments(), symbols)),
            None => name,
        }
    }

    pub fn describe_argument(&self, argument: &TemplateArgument, symbols: &SymbolTable) -> String {
        match argument {
            TemplateArgument::Type(ty) => self.describe(*ty, symbols),
            TemplateArgument::Value { value, .. } => value.to_string(),
            TemplateArgument::Template(symbol) => symbols.qualified_name(*symbol),
            TemplateArgument::Parameter(key) => key.name.clone(),
            TemplateArgument::Pack(elements) => self.describe_arguments(elements, symbols),
        }
    }

    fn describe_arguments(&self, arguments: &[TemplateArgument], symbols: &SymbolTable) -> String {
        arguments
            .iter()
            .map(|a| self.describe_argument(a, symbols))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Fortran spelling: `INTEGER(4)`, `CHARACTER(len=5)`,
    /// `REAL(8), DIMENSION(1:3, :)`.
    pub fn describe_fortran(&self, ty: TypeId, symbols: &SymbolTable) -> String {
        let ty = self.no_ref(ty);
        if self.is_fortran_array(ty) {
            let dims = self
                .dimensions(ty)
                .iter()
                .map(|dim| match (dim.lower.known(), dim.upper()) {
                    (Some(lower), Some(upper)) => format!("{}:{}", lower, upper),
                    (Some(lower), None) if lower != 1 => format!("{}:", lower),
                    _ => ":".to_string(),
                })
                .collect::<Vec<_>>()
                .join(", ");
            return format!("{}, DIMENSION({})", self.describe_fortran(self.rank0(ty), symbols), dims);
        }

        match self.kind(ty) {
            TypeKind::Integer { bytes, .. } => format!("INTEGER({})", bytes),
            TypeKind::Float(precision) => format!("REAL({})", precision.bytes()),
            TypeKind::Complex(base) => match self.kind(*base) {
                TypeKind::Float(precision) => format!("COMPLEX({})", precision.bytes()),
                _ => format!("COMPLEX({})", self.describe_fortran(*base, symbols)),
            },
            TypeKind::Bool { bytes } => format!("LOGICAL({})", bytes),
            TypeKind::Character { .. } => "CHARACTER(len=1)".to_string(),
            TypeKind::Array { size, .. } => match size.known() {
                Some(len) => format!("CHARACTER(len={})", len),
                None => "CHARACTER(len=*)".to_string(),
            },
            TypeKind::Named(symbol) => format!("TYPE({})", symbols.get(*symbol).name),
            TypeKind::Pointer(pointee) => format!("{}, POINTER", self.describe_fortran(*pointee, symbols)),
            TypeKind::Function {
                result, parameters, ..
            } => {
                let parameters = parameters
                    .iter()
                    .map(|p| self.describe_fortran(*p, symbols))
                    .collect::<Vec<_>>()
                    .join(", ");
                if self.is_void(*result) {
                    format!("SUBROUTINE({})", parameters)
                } else {
                    format!("{} FUNCTION({})", self.describe_fortran(*result, symbols), parameters)
                }
            }
            _ => self.describe(ty, symbols),
        }
    }
}

fn c_integer_name(bytes: u8, signed: bool) -> String {
    let base = match bytes {
        1 => "char",
        2 => "short",
        4 => "int",
        8 => "long",
        _ => "__int128",
    };
    match (signed, bytes) {
        (true, 1) => "signed char".to_string(),
        (true, _) => base.to_string(),
        (false, _) => format!("unsigned {}", base),
    }
}

fn c_float_name(precision: FloatPrecision) -> &'static str {
    match precision {
        FloatPrecision::Float => "float",
        FloatPrecision::Double => "double",
        FloatPrecision::LongDouble => "long double",
        FloatPrecision::Quad => "__float128",
    }
}
