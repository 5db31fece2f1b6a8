use std::{
    cmp::Ordering,
    fmt::Display,
    hash::{Hash, Hasher},
};

/// Precision of a floating constant or of a floating type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FloatPrecision {
    Float,
    Double,
    LongDouble,
    Quad,
}

impl FloatPrecision {
    pub fn bytes(&self) -> u8 {
        match self {
            FloatPrecision::Float => 4,
            FloatPrecision::Double => 8,
            FloatPrecision::LongDouble => 10,
            FloatPrecision::Quad => 16,
        }
    }

    pub fn from_bytes(bytes: u8) -> Option<FloatPrecision> {
        match bytes {
            4 => Some(FloatPrecision::Float),
            8 => Some(FloatPrecision::Double),
            10 => Some(FloatPrecision::LongDouble),
            16 => Some(FloatPrecision::Quad),
            _ => None,
        }
    }

    /// Rounds a value to what this precision can hold.
    ///
    /// Long double and quad values are carried as `f64`.
    fn round(&self, value: f64) -> f64 {
        match self {
            FloatPrecision::Float => value as f32 as f64,
            _ => value,
        }
    }
}

/// An immutable compile-time value.
///
/// Integers keep their raw bits masked to `bytes`; the signed view is
/// obtained by sign extension. Logical and boolean values are integers.
#[derive(Debug, Clone)]
pub enum ConstValue {
    Integer {
        bits: u128,
        bytes: u8,
        signed: bool,
    },
    Floating {
        value: f64,
        precision: FloatPrecision,
    },
    Complex {
        real: Box<ConstValue>,
        imag: Box<ConstValue>,
    },
    Str {
        chars: Vec<ConstValue>,
    },
    Array {
        elements: Vec<ConstValue>,
    },
    Struct {
        members: Vec<ConstValue>,
    },
    Range {
        lower: Box<ConstValue>,
        upper: Box<ConstValue>,
        stride: Box<ConstValue>,
    },
}

fn mask(bytes: u8) -> u128 {
    if bytes >= 16 {
        u128::MAX
    } else {
        (1u128 << (bytes as u32 * 8)) - 1
    }
}

fn sign_extend(bits: u128, bytes: u8) -> i128 {
    if bytes >= 16 {
        bits as i128
    } else {
        let shift = 128 - bytes as u32 * 8;
        ((bits << shift) as i128) >> shift
    }
}

fn wrapping_ipow(mut base: i128, mut exp: u128) -> i128 {
    let mut result: i128 = 1;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exp >>= 1;
    }
    result
}

impl ConstValue {
    pub fn int(value: i128, bytes: u8, signed: bool) -> Self {
        ConstValue::Integer {
            bits: (value as u128) & mask(bytes),
            bytes,
            signed,
        }
    }

    pub fn signed_int(value: i64) -> Self {
        ConstValue::int(value as i128, 4, true)
    }

    pub fn truth(value: bool) -> Self {
        ConstValue::int(value as i128, 4, true)
    }

    pub fn float(value: f64, precision: FloatPrecision) -> Self {
        ConstValue::Floating {
            value: precision.round(value),
            precision,
        }
    }

    pub fn complex(real: ConstValue, imag: ConstValue) -> Self {
        ConstValue::Complex {
            real: Box::new(real),
            imag: Box::new(imag),
        }
    }

    pub fn string(text: &str, char_bytes: u8) -> Self {
        ConstValue::Str {
            chars: text
                .chars()
                .map(|c| ConstValue::int(c as u32 as i128, char_bytes, false))
                .collect(),
        }
    }

    pub fn array(elements: Vec<ConstValue>) -> Self {
        ConstValue::Array { elements }
    }

    pub fn structure(members: Vec<ConstValue>) -> Self {
        ConstValue::Struct { members }
    }

    pub fn range(lower: ConstValue, upper: ConstValue, stride: ConstValue) -> Self {
        ConstValue::Range {
            lower: Box::new(lower),
            upper: Box::new(upper),
            stride: Box::new(stride),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, ConstValue::Integer { .. })
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, ConstValue::Floating { .. })
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, ConstValue::Complex { .. })
    }

    pub fn is_string(&self) -> bool {
        matches!(self, ConstValue::Str { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ConstValue::Array { .. })
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, ConstValue::Struct { .. })
    }

    pub fn is_range(&self) -> bool {
        matches!(self, ConstValue::Range { .. })
    }

    /// Signed view of an integer constant.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            ConstValue::Integer { bits, bytes, signed } => Some(if *signed {
                sign_extend(*bits, *bytes)
            } else {
                *bits as i128
            }),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_i128().and_then(|v| i64::try_from(v).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConstValue::Integer { .. } => self.as_i128().map(|v| v as f64),
            ConstValue::Floating { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            ConstValue::Integer { bits, .. } => *bits == 0,
            ConstValue::Floating { value, .. } => *value == 0.0,
            ConstValue::Complex { real, imag } => real.is_zero() && imag.is_zero(),
            _ => false,
        }
    }

    pub fn is_nonzero(&self) -> bool {
        match self {
            ConstValue::Integer { .. } | ConstValue::Floating { .. } | ConstValue::Complex { .. } => {
                !self.is_zero()
            }
            _ => false,
        }
    }

    /// Number of elements of an aggregate constant.
    pub fn num_elements(&self) -> usize {
        match self {
            ConstValue::Str { chars } => chars.len(),
            ConstValue::Array { elements } => elements.len(),
            ConstValue::Struct { members } => members.len(),
            _ => 0,
        }
    }

    /// Element of an aggregate constant, zero-based.
    pub fn element(&self, index: usize) -> Option<&ConstValue> {
        match self {
            ConstValue::Str { chars } => chars.get(index),
            ConstValue::Array { elements } => elements.get(index),
            ConstValue::Struct { members } => members.get(index),
            _ => None,
        }
    }

    pub fn elements(&self) -> &[ConstValue] {
        match self {
            ConstValue::Str { chars } => chars,
            ConstValue::Array { elements } => elements,
            ConstValue::Struct { members } => members,
            _ => &[],
        }
    }

    pub fn string_value(&self) -> Option<String> {
        match self {
            ConstValue::Str { chars } => chars
                .iter()
                .map(|c| c.as_i128().and_then(|v| char::from_u32(v as u32)))
                .collect(),
            _ => None,
        }
    }

    /// Substring by zero-based, inclusive-exclusive bounds.
    pub fn substring(&self, start: usize, end: usize) -> Option<ConstValue> {
        match self {
            ConstValue::Str { chars } if start <= end && end <= chars.len() => Some(ConstValue::Str {
                chars: chars[start..end].to_vec(),
            }),
            ConstValue::Str { .. } if start > end => Some(ConstValue::Str { chars: vec![] }),
            _ => None,
        }
    }

    // Casts

    pub fn cast_to_integer(&self, bytes: u8, signed: bool) -> Option<ConstValue> {
        match self {
            ConstValue::Integer { .. } => Some(ConstValue::int(self.as_i128()?, bytes, signed)),
            ConstValue::Floating { value, .. } => {
                if !value.is_finite() {
                    return None;
                }
                Some(ConstValue::int(value.trunc() as i128, bytes, signed))
            }
            ConstValue::Complex { real, .. } => real.cast_to_integer(bytes, signed),
            ConstValue::Array { elements } => elements
                .iter()
                .map(|e| e.cast_to_integer(bytes, signed))
                .collect::<Option<Vec<_>>>()
                .map(ConstValue::array),
            _ => None,
        }
    }

    pub fn cast_to_float(&self, precision: FloatPrecision) -> Option<ConstValue> {
        match self {
            ConstValue::Integer { .. } | ConstValue::Floating { .. } => {
                Some(ConstValue::float(self.as_f64()?, precision))
            }
            ConstValue::Complex { real, .. } => real.cast_to_float(precision),
            ConstValue::Array { elements } => elements
                .iter()
                .map(|e| e.cast_to_float(precision))
                .collect::<Option<Vec<_>>>()
                .map(ConstValue::array),
            _ => None,
        }
    }

    pub fn cast_to_complex(&self, precision: FloatPrecision) -> Option<ConstValue> {
        match self {
            ConstValue::Integer { .. } | ConstValue::Floating { .. } => Some(ConstValue::complex(
                self.cast_to_float(precision)?,
                ConstValue::float(0.0, precision),
            )),
            ConstValue::Complex { real, imag } => Some(ConstValue::complex(
                real.cast_to_float(precision)?,
                imag.cast_to_float(precision)?,
            )),
            ConstValue::Array { elements } => elements
                .iter()
                .map(|e| e.cast_to_complex(precision))
                .collect::<Option<Vec<_>>>()
                .map(ConstValue::array),
            _ => None,
        }
    }

    fn category(&self) -> Option<u8> {
        match self {
            ConstValue::Integer { .. } => Some(0),
            ConstValue::Floating { .. } => Some(1),
            ConstValue::Complex { .. } => Some(2),
            _ => None,
        }
    }

    fn precision(&self) -> Option<FloatPrecision> {
        match self {
            ConstValue::Floating { precision, .. } => Some(*precision),
            ConstValue::Complex { real, .. } => real.precision(),
            _ => None,
        }
    }

    /// Brings two numeric scalars to their common representation.
    fn promote_pair(&self, other: &ConstValue) -> Option<(ConstValue, ConstValue)> {
        let (ca, cb) = (self.category()?, other.category()?);
        match (self, other) {
            (
                ConstValue::Integer { bytes: ba, signed: sa, .. },
                ConstValue::Integer { bytes: bb, signed: sb, .. },
            ) => {
                let bytes = (*ba).max(*bb);
                let signed = if sa == sb {
                    *sa
                } else if *sa {
                    ba > bb
                } else {
                    bb > ba
                };
                Some((
                    self.cast_to_integer(bytes, signed)?,
                    other.cast_to_integer(bytes, signed)?,
                ))
            }
            _ => {
                let precision = match (self.precision(), other.precision()) {
                    (Some(a), Some(b)) => a.max(b),
                    (Some(a), None) | (None, Some(a)) => a,
                    (None, None) => return None,
                };
                if ca.max(cb) == 2 {
                    Some((
                        self.cast_to_complex(precision)?,
                        other.cast_to_complex(precision)?,
                    ))
                } else {
                    Some((
                        self.cast_to_float(precision)?,
                        other.cast_to_float(precision)?,
                    ))
                }
            }
        }
    }

    /// Applies `op` elementwise when either side is an array, broadcasting scalars.
    fn elementwise(
        &self,
        other: &ConstValue,
        op: &dyn Fn(&ConstValue, &ConstValue) -> Option<ConstValue>,
    ) -> Option<ConstValue> {
        match (self, other) {
            (ConstValue::Array { elements: a }, ConstValue::Array { elements: b }) => {
                if a.len() != b.len() {
                    return None;
                }
                a.iter()
                    .zip(b.iter())
                    .map(|(x, y)| x.elementwise(y, op))
                    .collect::<Option<Vec<_>>>()
                    .map(ConstValue::array)
            }
            (ConstValue::Array { elements }, scalar) => elements
                .iter()
                .map(|x| x.elementwise(scalar, op))
                .collect::<Option<Vec<_>>>()
                .map(ConstValue::array),
            (scalar, ConstValue::Array { elements }) => elements
                .iter()
                .map(|y| scalar.elementwise(y, op))
                .collect::<Option<Vec<_>>>()
                .map(ConstValue::array),
            _ => op(self, other),
        }
    }

    fn elementwise_unary(&self, op: &dyn Fn(&ConstValue) -> Option<ConstValue>) -> Option<ConstValue> {
        match self {
            ConstValue::Array { elements } => elements
                .iter()
                .map(|x| x.elementwise_unary(op))
                .collect::<Option<Vec<_>>>()
                .map(ConstValue::array),
            _ => op(self),
        }
    }

    fn arith(
        &self,
        other: &ConstValue,
        int_op: fn(i128, i128, bool) -> Option<i128>,
        float_op: fn(f64, f64) -> f64,
        complex_op: fn((f64, f64), (f64, f64)) -> Option<(f64, f64)>,
    ) -> Option<ConstValue> {
        self.elementwise(other, &|a, b| {
            let (a, b) = a.promote_pair(b)?;
            match (&a, &b) {
                (ConstValue::Integer { bytes, signed, .. }, ConstValue::Integer { .. }) => {
                    let result = if *signed {
                        int_op(a.as_i128()?, b.as_i128()?, true)?
                    } else {
                        let (Some(x), Some(y)) = (a.unsigned_bits(), b.unsigned_bits()) else {
                            return None;
                        };
                        int_op(x as i128, y as i128, false)?
                    };
                    Some(ConstValue::int(result, *bytes, *signed))
                }
                (
                    ConstValue::Floating { value: x, precision },
                    ConstValue::Floating { value: y, .. },
                ) => Some(ConstValue::float(float_op(*x, *y), *precision)),
                (ConstValue::Complex { .. }, ConstValue::Complex { .. }) => {
                    let precision = a.precision()?;
                    let (re, im) = complex_op(a.complex_parts()?, b.complex_parts()?)?;
                    Some(ConstValue::complex(
                        ConstValue::float(re, precision),
                        ConstValue::float(im, precision),
                    ))
                }
                _ => None,
            }
        })
    }

    fn unsigned_bits(&self) -> Option<u128> {
        match self {
            ConstValue::Integer { bits, .. } => Some(*bits),
            _ => None,
        }
    }

    fn complex_parts(&self) -> Option<(f64, f64)> {
        match self {
            ConstValue::Complex { real, imag } => Some((real.as_f64()?, imag.as_f64()?)),
            _ => None,
        }
    }

    // Arithmetic

    pub fn add(&self, other: &ConstValue) -> Option<ConstValue> {
        self.arith(
            other,
            |a, b, _| Some(a.wrapping_add(b)),
            |a, b| a + b,
            |(a, b), (c, d)| Some((a + c, b + d)),
        )
    }

    pub fn sub(&self, other: &ConstValue) -> Option<ConstValue> {
        self.arith(
            other,
            |a, b, _| Some(a.wrapping_sub(b)),
            |a, b| a - b,
            |(a, b), (c, d)| Some((a - c, b - d)),
        )
    }

    pub fn mul(&self, other: &ConstValue) -> Option<ConstValue> {
        self.arith(
            other,
            |a, b, _| Some(a.wrapping_mul(b)),
            |a, b| a * b,
            |(a, b), (c, d)| Some((a * c - b * d, a * d + b * c)),
        )
    }

    /// Division; integer division truncates and division by zero does not fold.
    pub fn div(&self, other: &ConstValue) -> Option<ConstValue> {
        if !other.is_array() && other.is_zero() {
            return None;
        }
        self.arith(
            other,
            |a, b, signed| {
                if b == 0 {
                    None
                } else if signed {
                    Some(a.wrapping_div(b))
                } else {
                    Some(((a as u128) / (b as u128)) as i128)
                }
            },
            |a, b| a / b,
            |(a, b), (c, d)| {
                let denominator = c * c + d * d;
                if denominator == 0.0 {
                    None
                } else {
                    Some(((a * c + b * d) / denominator, (b * c - a * d) / denominator))
                }
            },
        )
    }

    /// Remainder with the sign of the dividend.
    pub fn rem(&self, other: &ConstValue) -> Option<ConstValue> {
        self.arith(
            other,
            |a, b, signed| {
                if b == 0 {
                    None
                } else if signed {
                    Some(a.wrapping_rem(b))
                } else {
                    Some(((a as u128) % (b as u128)) as i128)
                }
            },
            |a, b| a % b,
            |_, _| None,
        )
    }

    /// Exponentiation. A negative integer exponent of an integer base
    /// follows integer division semantics.
    pub fn pow(&self, other: &ConstValue) -> Option<ConstValue> {
        self.elementwise(other, &|base, exponent| match (base, exponent) {
            (ConstValue::Integer { .. }, ConstValue::Integer { .. }) => {
                let (b, e) = base.promote_pair(exponent)?;
                let (x, n) = (b.as_i128()?, e.as_i128()?);
                let ConstValue::Integer { bytes, signed, .. } = b else {
                    return None;
                };
                let result = if n >= 0 {
                    wrapping_ipow(x, n as u128)
                } else {
                    match x {
                        0 => return None,
                        1 => 1,
                        -1 => {
                            if n % 2 == 0 {
                                1
                            } else {
                                -1
                            }
                        }
                        _ => 0,
                    }
                };
                Some(ConstValue::int(result, bytes, signed))
            }
            (ConstValue::Floating { value, precision }, ConstValue::Integer { .. }) => {
                let n = exponent.as_i128()?;
                let result = match i32::try_from(n) {
                    Ok(n) => value.powi(n),
                    Err(_) => value.powf(n as f64),
                };
                Some(ConstValue::float(result, *precision))
            }
            (ConstValue::Complex { .. }, ConstValue::Integer { .. }) => {
                let n = exponent.as_i128()?;
                let precision = base.precision()?;
                let mut result = ConstValue::complex(
                    ConstValue::float(1.0, precision),
                    ConstValue::float(0.0, precision),
                );
                let mut square = base.clone();
                let mut remaining = n.unsigned_abs();
                while remaining > 0 {
                    if remaining & 1 == 1 {
                        result = result.mul(&square)?;
                    }
                    remaining >>= 1;
                    if remaining > 0 {
                        square = square.mul(&square)?;
                    }
                }
                if n < 0 {
                    result = ConstValue::complex(
                        ConstValue::float(1.0, precision),
                        ConstValue::float(0.0, precision),
                    )
                    .div(&result)?;
                }
                Some(result)
            }
            _ => {
                let (b, e) = base.promote_pair(exponent)?;
                match (&b, &e) {
                    (
                        ConstValue::Floating { value: x, precision },
                        ConstValue::Floating { value: y, .. },
                    ) => Some(ConstValue::float(x.powf(*y), *precision)),
                    _ => None,
                }
            }
        })
    }

    pub fn neg(&self) -> Option<ConstValue> {
        self.elementwise_unary(&|v| match v {
            ConstValue::Integer { bytes, signed, .. } => {
                Some(ConstValue::int(v.as_i128()?.wrapping_neg(), *bytes, *signed))
            }
            ConstValue::Floating { value, precision } => Some(ConstValue::float(-value, *precision)),
            ConstValue::Complex { real, imag } => Some(ConstValue::complex(real.neg()?, imag.neg()?)),
            _ => None,
        })
    }

    pub fn plus(&self) -> Option<ConstValue> {
        self.elementwise_unary(&|v| match v {
            ConstValue::Integer { .. } | ConstValue::Floating { .. } | ConstValue::Complex { .. } => {
                Some(v.clone())
            }
            _ => None,
        })
    }

    pub fn bitwise_not(&self) -> Option<ConstValue> {
        self.elementwise_unary(&|v| match v {
            ConstValue::Integer { bits, bytes, signed } => Some(ConstValue::Integer {
                bits: !bits & mask(*bytes),
                bytes: *bytes,
                signed: *signed,
            }),
            _ => None,
        })
    }

    pub fn logical_not(&self) -> Option<ConstValue> {
        self.elementwise_unary(&|v| match v {
            ConstValue::Integer { .. } | ConstValue::Floating { .. } => Some(ConstValue::truth(v.is_zero())),
            _ => None,
        })
    }

    fn logical(&self, other: &ConstValue, op: fn(bool, bool) -> bool) -> Option<ConstValue> {
        self.elementwise(other, &|a, b| match (a, b) {
            (ConstValue::Integer { .. }, ConstValue::Integer { .. }) => {
                Some(ConstValue::truth(op(a.is_nonzero(), b.is_nonzero())))
            }
            _ => None,
        })
    }

    pub fn logical_and(&self, other: &ConstValue) -> Option<ConstValue> {
        self.logical(other, |a, b| a && b)
    }

    pub fn logical_or(&self, other: &ConstValue) -> Option<ConstValue> {
        self.logical(other, |a, b| a || b)
    }

    pub fn eqv(&self, other: &ConstValue) -> Option<ConstValue> {
        self.logical(other, |a, b| a == b)
    }

    pub fn neqv(&self, other: &ConstValue) -> Option<ConstValue> {
        self.logical(other, |a, b| a != b)
    }

    fn bitwise(&self, other: &ConstValue, op: fn(u128, u128) -> u128) -> Option<ConstValue> {
        self.elementwise(other, &|a, b| {
            let (a, b) = a.promote_pair(b)?;
            match (&a, &b) {
                (
                    ConstValue::Integer { bits: x, bytes, signed },
                    ConstValue::Integer { bits: y, .. },
                ) => Some(ConstValue::Integer {
                    bits: op(*x, *y) & mask(*bytes),
                    bytes: *bytes,
                    signed: *signed,
                }),
                _ => None,
            }
        })
    }

    pub fn bit_and(&self, other: &ConstValue) -> Option<ConstValue> {
        self.bitwise(other, |a, b| a & b)
    }

    pub fn bit_or(&self, other: &ConstValue) -> Option<ConstValue> {
        self.bitwise(other, |a, b| a | b)
    }

    pub fn bit_xor(&self, other: &ConstValue) -> Option<ConstValue> {
        self.bitwise(other, |a, b| a ^ b)
    }

    /// Shifts keep the type of the left operand.
    pub fn shl(&self, other: &ConstValue) -> Option<ConstValue> {
        match self {
            ConstValue::Integer { bytes, signed, .. } => {
                let amount = other.as_i128()?;
                if amount < 0 || amount >= *bytes as i128 * 8 {
                    return None;
                }
                Some(ConstValue::int(self.as_i128()? << amount, *bytes, *signed))
            }
            _ => None,
        }
    }

    pub fn shr(&self, other: &ConstValue) -> Option<ConstValue> {
        match self {
            ConstValue::Integer { bits, bytes, signed } => {
                let amount = other.as_i128()?;
                if amount < 0 || amount >= *bytes as i128 * 8 {
                    return None;
                }
                if *signed {
                    Some(ConstValue::int(self.as_i128()? >> amount, *bytes, true))
                } else {
                    Some(ConstValue::int((bits >> amount) as i128, *bytes, false))
                }
            }
            _ => None,
        }
    }

    /// Concatenation of two character strings.
    pub fn concat(&self, other: &ConstValue) -> Option<ConstValue> {
        self.elementwise(other, &|a, b| match (a, b) {
            (ConstValue::Str { chars: x }, ConstValue::Str { chars: y }) => Some(ConstValue::Str {
                chars: x.iter().chain(y.iter()).cloned().collect(),
            }),
            _ => None,
        })
    }

    // Comparisons

    /// Orders two scalars. Strings compare as if the shorter one were
    /// padded with blanks.
    pub fn compare(&self, other: &ConstValue) -> Option<Ordering> {
        match (self, other) {
            (ConstValue::Str { chars: a }, ConstValue::Str { chars: b }) => {
                let blank = ConstValue::int(' ' as u32 as i128, 1, false);
                let length = a.len().max(b.len());
                for i in 0..length {
                    let x = a.get(i).unwrap_or(&blank).as_i128()?;
                    let y = b.get(i).unwrap_or(&blank).as_i128()?;
                    match x.cmp(&y) {
                        Ordering::Equal => continue,
                        ordering => return Some(ordering),
                    }
                }
                Some(Ordering::Equal)
            }
            _ => {
                let (a, b) = self.promote_pair(other)?;
                match (&a, &b) {
                    (ConstValue::Integer { signed: true, .. }, ConstValue::Integer { .. }) => {
                        Some(a.as_i128()?.cmp(&b.as_i128()?))
                    }
                    (ConstValue::Integer { bits: x, .. }, ConstValue::Integer { bits: y, .. }) => {
                        Some(x.cmp(y))
                    }
                    (ConstValue::Floating { value: x, .. }, ConstValue::Floating { value: y, .. }) => {
                        x.partial_cmp(y)
                    }
                    _ => None,
                }
            }
        }
    }

    fn equality(&self, other: &ConstValue) -> Option<bool> {
        match (self, other) {
            (ConstValue::Complex { .. }, _) | (_, ConstValue::Complex { .. }) => {
                let (a, b) = self.promote_pair(other)?;
                Some(a.complex_parts()? == b.complex_parts()?)
            }
            _ => self.compare(other).map(|o| o == Ordering::Equal),
        }
    }

    pub fn equal(&self, other: &ConstValue) -> Option<ConstValue> {
        self.elementwise(other, &|a, b| a.equality(b).map(ConstValue::truth))
    }

    pub fn not_equal(&self, other: &ConstValue) -> Option<ConstValue> {
        self.elementwise(other, &|a, b| a.equality(b).map(|e| ConstValue::truth(!e)))
    }

    pub fn lower_than(&self, other: &ConstValue) -> Option<ConstValue> {
        self.elementwise(other, &|a, b| a.compare(b).map(|o| ConstValue::truth(o == Ordering::Less)))
    }

    pub fn lower_or_equal(&self, other: &ConstValue) -> Option<ConstValue> {
        self.elementwise(other, &|a, b| {
            a.compare(b).map(|o| ConstValue::truth(o != Ordering::Greater))
        })
    }

    pub fn greater_than(&self, other: &ConstValue) -> Option<ConstValue> {
        self.elementwise(other, &|a, b| {
            a.compare(b).map(|o| ConstValue::truth(o == Ordering::Greater))
        })
    }

    pub fn greater_or_equal(&self, other: &ConstValue) -> Option<ConstValue> {
        self.elementwise(other, &|a, b| a.compare(b).map(|o| ConstValue::truth(o != Ordering::Less)))
    }
}

impl PartialEq for ConstValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                ConstValue::Integer { bits: a, bytes: ba, signed: sa },
                ConstValue::Integer { bits: b, bytes: bb, signed: sb },
            ) => a == b && ba == bb && sa == sb,
            (
                ConstValue::Floating { value: a, precision: pa },
                ConstValue::Floating { value: b, precision: pb },
            ) => a.to_bits() == b.to_bits() && pa == pb,
            (
                ConstValue::Complex { real: ra, imag: ia },
                ConstValue::Complex { real: rb, imag: ib },
            ) => ra == rb && ia == ib,
            (ConstValue::Str { chars: a }, ConstValue::Str { chars: b }) => a == b,
            (ConstValue::Array { elements: a }, ConstValue::Array { elements: b }) => a == b,
            (ConstValue::Struct { members: a }, ConstValue::Struct { members: b }) => a == b,
            (
                ConstValue::Range { lower: la, upper: ua, stride: sa },
                ConstValue::Range { lower: lb, upper: ub, stride: sb },
            ) => la == lb && ua == ub && sa == sb,
            _ => false,
        }
    }
}

impl Eq for ConstValue {}

impl Hash for ConstValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ConstValue::Integer { bits, bytes, signed } => {
                bits.hash(state);
                bytes.hash(state);
                signed.hash(state);
            }
            ConstValue::Floating { value, precision } => {
                value.to_bits().hash(state);
                precision.hash(state);
            }
            ConstValue::Complex { real, imag } => {
                real.hash(state);
                imag.hash(state);
            }
            ConstValue::Str { chars: items }
            | ConstValue::Array { elements: items }
            | ConstValue::Struct { members: items } => items.hash(state),
            ConstValue::Range { lower, upper, stride } => {
                lower.hash(state);
                upper.hash(state);
                stride.hash(state);
            }
        }
    }
}

impl Display for ConstValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstValue::Integer { signed: true, .. } => {
                write!(f, "{}", self.as_i128().unwrap_or_default())
            }
            ConstValue::Integer { bits, .. } => write!(f, "{}", bits),
            ConstValue::Floating { value, .. } => write!(f, "{:?}", value),
            ConstValue::Complex { real, imag } => write!(f, "({}, {})", real, imag),
            ConstValue::Str { .. } => write!(f, "{:?}", self.string_value().unwrap_or_default()),
            ConstValue::Array { elements } => {
                write!(f, "[")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "]")
            }
            ConstValue::Struct { members } => {
                write!(f, "{{")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", m)?;
                }
                write!(f, "}}")
            }
            ConstValue::Range { lower, upper, stride } => write!(f, "{}:{}:{}", lower, upper, stride),
        }
    }
}
