use tracing::trace;

use crate::{
    const_value::const_value::ConstValue,
    symbols::symbols::SymbolId,
    type_checker::type_checker::TypeChecker,
    types::types::{TypeId, TypeKind},
};

use super::substitute::substitute_type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateParameterKind {
    Type,
    NonType,
    Template,
    TypePack,
    NonTypePack,
    TemplatePack,
}

impl TemplateParameterKind {
    pub fn is_pack(self) -> bool {
        matches!(
            self,
            TemplateParameterKind::TypePack
                | TemplateParameterKind::NonTypePack
                | TemplateParameterKind::TemplatePack
        )
    }
}

/// Identity of a template parameter: kind, name, position and nesting level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateParameterKey {
    pub kind: TemplateParameterKind,
    pub name: String,
    pub position: usize,
    pub nesting: usize,
}

impl TemplateParameterKey {
    pub fn new(kind: TemplateParameterKind, name: &str, position: usize, nesting: usize) -> Self {
        TemplateParameterKey {
            kind,
            name: name.to_string(),
            position,
            nesting,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateArgument {
    Type(TypeId),
    Value { value: ConstValue, ty: TypeId },
    Template(SymbolId),
    /// A non-type or template parameter used as an argument.
    Parameter(TemplateParameterKey),
    Pack(Vec<TemplateArgument>),
}

impl TemplateArgument {
    /// Same-value check: types by equivalence, values by what they compute.
    pub fn same_as(&self, other: &TemplateArgument) -> bool {
        match (self, other) {
            (TemplateArgument::Value { value: a, .. }, TemplateArgument::Value { value: b, .. }) => {
                match (a.as_i128(), b.as_i128()) {
                    (Some(x), Some(y)) => x == y,
                    _ => a == b,
                }
            }
            (TemplateArgument::Pack(a), TemplateArgument::Pack(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.same_as(y))
            }
            _ => self == other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateParameter {
    pub key: TemplateParameterKey,
    pub symbol: Option<SymbolId>,
    /// Declared type of a non-type parameter.
    pub value_type: Option<TypeId>,
    pub default: Option<TemplateArgument>,
}

impl TemplateParameter {
    pub fn new(key: TemplateParameterKey) -> Self {
        TemplateParameter {
            key,
            symbol: None,
            value_type: None,
            default: None,
        }
    }

    pub fn with_default(mut self, default: TemplateArgument) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_value_type(mut self, ty: TypeId) -> Self {
        self.value_type = Some(ty);
        self
    }
}

/// How a bound template argument was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentProvenance {
    Explicit,
    Deduced,
    Default,
    EmptyPack,
}

/// Parameters of one template level with their (possibly partial) bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateParameterList {
    pub nesting: usize,
    pub parameters: Vec<TemplateParameter>,
    pub arguments: Vec<Option<TemplateArgument>>,
    pub provenance: Vec<Option<ArgumentProvenance>>,
    pub enclosing: Option<Box<TemplateParameterList>>,
}

impl TemplateParameterList {
    pub fn new(nesting: usize, parameters: Vec<TemplateParameter>) -> Self {
        let len = parameters.len();
        TemplateParameterList {
            nesting,
            parameters,
            arguments: vec![None; len],
            provenance: vec![None; len],
            enclosing: None,
        }
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn bind(&mut self, position: usize, argument: TemplateArgument, provenance: ArgumentProvenance) {
        self.arguments[position] = Some(argument);
        self.provenance[position] = Some(provenance);
    }

    pub fn argument(&self, position: usize) -> Option<&TemplateArgument> {
        self.arguments.get(position).and_then(Option::as_ref)
    }

    pub fn is_complete(&self) -> bool {
        self.arguments.iter().all(Option::is_some)
    }

    /// Binding of `key` at this level or an enclosing one.
    pub fn lookup(&self, key: &TemplateParameterKey) -> Option<&TemplateArgument> {
        if key.nesting == self.nesting {
            return self.argument(key.position);
        }
        self.enclosing.as_ref().and_then(|e| e.lookup(key))
    }

    /// Bound arguments in order; unbound positions are skipped.
    pub fn bound_arguments(&self) -> Vec<TemplateArgument> {
        self.arguments.iter().flatten().cloned().collect()
    }
}

/// A value deduced for one parameter from one formal/actual pair.
#[derive(Debug, Clone, PartialEq)]
pub enum DeducedParameter {
    Type(TypeId),
    Value { value: ConstValue, ty: TypeId },
    Template(SymbolId),
}

impl DeducedParameter {
    pub fn to_argument(&self) -> TemplateArgument {
        match self {
            DeducedParameter::Type(ty) => TemplateArgument::Type(*ty),
            DeducedParameter::Value { value, ty } => TemplateArgument::Value {
                value: value.clone(),
                ty: *ty,
            },
            DeducedParameter::Template(symbol) => TemplateArgument::Template(*symbol),
        }
    }

    fn same_as(&self, other: &DeducedParameter) -> bool {
        self.to_argument().same_as(&other.to_argument())
    }
}

/// Everything one parameter received; packs hold one entry per element.
#[derive(Debug, Clone, PartialEq)]
pub struct Deduction {
    pub key: TemplateParameterKey,
    pub deduced: Vec<DeducedParameter>,
}

impl Deduction {
    pub fn to_argument(&self) -> Option<TemplateArgument> {
        if self.key.kind.is_pack() {
            Some(TemplateArgument::Pack(
                self.deduced.iter().map(DeducedParameter::to_argument).collect(),
            ))
        } else {
            self.deduced.first().map(DeducedParameter::to_argument)
        }
    }
}

/// Deductions accumulated from one formal/actual pairing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeductionSet {
    pub deductions: Vec<Deduction>,
}

impl DeductionSet {
    pub fn new() -> Self {
        DeductionSet { deductions: vec![] }
    }

    pub fn get(&self, key: &TemplateParameterKey) -> Option<&Deduction> {
        self.deductions.iter().find(|d| &d.key == key)
    }

    /// Records a deduction for a non-pack parameter. Returns false when the
    /// parameter already holds a different value.
    pub fn add(&mut self, key: &TemplateParameterKey, deduced: DeducedParameter) -> bool {
        match self.deductions.iter().find(|d| &d.key == key) {
            Some(existing) => {
                let agrees = existing
                    .deduced
                    .first()
                    .map(|d| d.same_as(&deduced))
                    .unwrap_or(true);
                if !agrees {
                    trace!("conflicting deduction for `{}`", key.name);
                }
                agrees
            }
            None => {
                self.deductions.push(Deduction {
                    key: key.clone(),
                    deduced: vec![deduced],
                });
                true
            }
        }
    }

    /// Records a whole pack at once.
    pub fn add_pack(&mut self, key: &TemplateParameterKey, elements: Vec<DeducedParameter>) -> bool {
        match self.deductions.iter().find(|d| &d.key == key) {
            Some(existing) => {
                existing.deduced.len() == elements.len()
                    && existing
                        .deduced
                        .iter()
                        .zip(elements.iter())
                        .all(|(a, b)| a.same_as(b))
            }
            None => {
                self.deductions.push(Deduction {
                    key: key.clone(),
                    deduced: elements,
                });
                true
            }
        }
    }

    pub fn merge(&mut self, other: DeductionSet) -> bool {
        other.deductions.into_iter().all(|deduction| {
            if deduction.key.kind.is_pack() {
                self.add_pack(&deduction.key, deduction.deduced)
            } else {
                deduction
                    .deduced
                    .into_iter()
                    .all(|d| self.add(&deduction.key, d))
            }
        })
    }
}

/// Combines per-pair deduction sets into bindings for `list`.
///
/// A parameter deduced from two pairs must agree. Parameters left without a
/// binding take their default (substituted with what is already known) or,
/// for packs, the empty pack. Anything else fails the deduction.
pub fn finish_deduction(
    type_checker: &mut TypeChecker,
    list: &TemplateParameterList,
    sets: Vec<DeductionSet>,
) -> Option<TemplateParameterList> {
    let mut merged = DeductionSet::new();
    for (pair, set) in sets.into_iter().enumerate() {
        if !merged.merge(set) {
            trace!("deduction from argument {} disagrees with previous ones", pair);
            return None;
        }
    }

    let mut result = list.clone();
    for position in 0..result.len() {
        if result.argument(position).is_some() {
            continue;
        }
        let key = result.parameters[position].key.clone();
        if let Some(argument) = merged.get(&key).and_then(Deduction::to_argument) {
            let argument = convert_value_argument(type_checker, &result.parameters[position], argument);
            result.bind(position, argument, ArgumentProvenance::Deduced);
        }
    }

    for position in 0..result.len() {
        if result.argument(position).is_some() {
            continue;
        }
        let parameter = result.parameters[position].clone();
        if let Some(default) = &parameter.default {
            let argument = substitute_argument(type_checker, default, &result)?;
            result.bind(position, argument, ArgumentProvenance::Default);
        } else if parameter.key.kind.is_pack() {
            result.bind(position, TemplateArgument::Pack(vec![]), ArgumentProvenance::EmptyPack);
        } else {
            trace!("template parameter `{}` could not be deduced", parameter.key.name);
            return None;
        }
    }

    Some(result)
}

/// Gives a deduced value (an array bound, say) the declared type of its
/// parameter.
fn convert_value_argument(
    type_checker: &TypeChecker,
    parameter: &TemplateParameter,
    argument: TemplateArgument,
) -> TemplateArgument {
    let (TemplateArgument::Value { value, ty }, Some(declared)) = (&argument, parameter.value_type) else {
        return argument;
    };
    if *ty == declared {
        return argument;
    }
    match type_checker.types.kind(declared) {
        TypeKind::Integer { bytes, signed } => match value.cast_to_integer(*bytes, *signed) {
            Some(value) => TemplateArgument::Value { value, ty: declared },
            None => argument,
        },
        _ => argument,
    }
}

pub fn substitute_argument(
    type_checker: &mut TypeChecker,
    argument: &TemplateArgument,
    list: &TemplateParameterList,
) -> Option<TemplateArgument> {
    match argument {
        TemplateArgument::Type(ty) => Some(TemplateArgument::Type(substitute_type(type_checker, *ty, list)?)),
        TemplateArgument::Parameter(key) => match list.lookup(key) {
            Some(bound) => Some(bound.clone()),
            None => Some(argument.clone()),
        },
        TemplateArgument::Pack(elements) => Some(TemplateArgument::Pack(
            elements
                .iter()
                .map(|e| substitute_argument(type_checker, e, list))
                .collect::<Option<Vec<_>>>()?,
        )),
        TemplateArgument::Value { .. } | TemplateArgument::Template(_) => Some(argument.clone()),
    }
}
