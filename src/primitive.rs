//! Primitive on-wire formats: widths, range checks and byte packing.

use std::fmt;

use crate::{
    errors::FieldError,
    float::{f16_bits_to_f32, f64_to_f16_bits},
    value::Value,
};

/// Byte order used for every multi-byte primitive in a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    /// Network byte order is big-endian.
    pub const NETWORK: ByteOrder = ByteOrder::BigEndian;

    /// Byte order of the target platform.
    pub fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }
}

/// The storage format of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    /// IEEE 754 binary16.
    F16,
    F32,
    F64,
    Bool,
    /// Fixed-length byte string, zero-padded to its width.
    Bytes(usize),
    /// Byte string prefixed by a one-byte length, occupying a fixed width.
    Pascal(usize),
    /// Raw zero bytes.
    Pad(usize),
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::U8 => f.write_str("u8"),
            Primitive::I8 => f.write_str("i8"),
            Primitive::U16 => f.write_str("u16"),
            Primitive::I16 => f.write_str("i16"),
            Primitive::U32 => f.write_str("u32"),
            Primitive::I32 => f.write_str("i32"),
            Primitive::U64 => f.write_str("u64"),
            Primitive::I64 => f.write_str("i64"),
            Primitive::F16 => f.write_str("f16"),
            Primitive::F32 => f.write_str("f32"),
            Primitive::F64 => f.write_str("f64"),
            Primitive::Bool => f.write_str("bool"),
            Primitive::Bytes(n) => write!(f, "bytes[{n}]"),
            Primitive::Pascal(n) => write!(f, "pascal[{n}]"),
            Primitive::Pad(n) => write!(f, "pad[{n}]"),
        }
    }
}

impl Primitive {
    /// Number of bytes the primitive occupies in the layout.
    pub fn width(&self) -> usize {
        match *self {
            Primitive::U8 | Primitive::I8 | Primitive::Bool => 1,
            Primitive::U16 | Primitive::I16 | Primitive::F16 => 2,
            Primitive::U32 | Primitive::I32 | Primitive::F32 => 4,
            Primitive::U64 | Primitive::I64 | Primitive::F64 => 8,
            Primitive::Bytes(n) | Primitive::Pascal(n) | Primitive::Pad(n) => n,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.integer_bounds().is_some()
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            Primitive::I8 | Primitive::I16 | Primitive::I32 | Primitive::I64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Primitive::F16 | Primitive::F32 | Primitive::F64)
    }

    pub fn is_padding(&self) -> bool {
        matches!(self, Primitive::Pad(_))
    }

    /// Most bytes a value of this primitive can hold, for byte strings.
    pub fn capacity(&self) -> Option<usize> {
        match *self {
            Primitive::Bytes(n) => Some(n),
            Primitive::Pascal(n) => Some(n.saturating_sub(1).min(u8::MAX as usize)),
            _ => None,
        }
    }

    /// Inclusive bounds of an integer primitive, widened to `i128`.
    fn integer_bounds(&self) -> Option<(i128, i128)> {
        match self {
            Primitive::U8 => Some((0, u8::MAX as i128)),
            Primitive::I8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Primitive::U16 => Some((0, u16::MAX as i128)),
            Primitive::I16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Primitive::U32 => Some((0, u32::MAX as i128)),
            Primitive::I32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Primitive::U64 => Some((0, u64::MAX as i128)),
            Primitive::I64 => Some((i64::MIN as i128, i64::MAX as i128)),
            _ => None,
        }
    }

    /// The value a field holds when nothing else is given.
    pub fn zero(&self) -> Value {
        match *self {
            Primitive::U8 | Primitive::U16 | Primitive::U32 | Primitive::U64 => Value::U64(0),
            Primitive::I8 | Primitive::I16 | Primitive::I32 | Primitive::I64 => Value::I64(0),
            Primitive::F16 | Primitive::F32 | Primitive::F64 => Value::F64(0.0),
            Primitive::Bool => Value::Bool(false),
            Primitive::Bytes(n) | Primitive::Pad(n) => Value::Bytes(vec![0; n]),
            Primitive::Pascal(_) => Value::Bytes(Vec::new()),
        }
    }

    /// Checks that `value` fits this primitive and returns it in canonical form.
    ///
    /// `field` only names the field in errors.
    pub fn coerce(&self, field: &str, value: Value) -> Result<Value, FieldError> {
        if let Some((min, max)) = self.integer_bounds() {
            let wide = match value {
                Value::I64(v) => v as i128,
                Value::U64(v) => v as i128,
                other => return Err(self.mismatch(field, "an integer", other)),
            };

            if wide < min || wide > max {
                return Err(self.out_of_range(field, value));
            }

            return Ok(if self.is_signed() {
                Value::I64(wide as i64)
            } else {
                Value::U64(wide as u64)
            });
        }

        if self.is_float() {
            let Some(v) = value.as_f64() else {
                return Err(self.mismatch(field, "a number", value));
            };

            let stored = match self {
                Primitive::F16 => f16_bits_to_f32(f64_to_f16_bits(v)) as f64,
                Primitive::F32 => v as f32 as f64,
                _ => v,
            };

            if v.is_finite() && stored.is_infinite() {
                return Err(self.out_of_range(field, value));
            }

            return Ok(Value::F64(canonical_nan(stored)));
        }

        match *self {
            Primitive::Bool => match value {
                Value::Bool(_) => Ok(value),
                other => Err(self.mismatch(field, "a bool", other)),
            },
            Primitive::Bytes(n) => match value {
                Value::Bytes(mut bytes) => {
                    if bytes.len() > n {
                        return Err(self.out_of_range(field, Value::Bytes(bytes)));
                    }
                    bytes.resize(n, 0);
                    Ok(Value::Bytes(bytes))
                }
                other => Err(self.mismatch(field, "bytes", other)),
            },
            Primitive::Pascal(_) => match value {
                Value::Bytes(bytes) => {
                    if bytes.len() > self.capacity().unwrap_or(0) {
                        return Err(self.out_of_range(field, Value::Bytes(bytes)));
                    }
                    Ok(Value::Bytes(bytes))
                }
                other => Err(self.mismatch(field, "bytes", other)),
            },
            _ => Err(self.mismatch(field, "no value", value)),
        }
    }

    fn out_of_range(&self, field: &str, value: Value) -> FieldError {
        FieldError::OutOfRange {
            field: field.to_string(),
            primitive: self.to_string(),
            value,
        }
    }

    fn mismatch(&self, field: &str, expected: &'static str, value: Value) -> FieldError {
        FieldError::TypeMismatch {
            field: field.to_string(),
            expected,
            value,
        }
    }

    /// Writes a canonical `value` into `out`, which is exactly [Primitive::width] bytes long.
    ///
    /// A value of the wrong shape fails with [FieldError::TypeMismatch] and
    /// leaves `out` untouched. `field` only names the field in errors.
    pub fn pack(
        &self,
        field: &str,
        value: &Value,
        order: ByteOrder,
        out: &mut [u8],
    ) -> Result<(), FieldError> {
        match (*self, value) {
            (Primitive::F16, Value::F64(v)) => write_uint(f64_to_f16_bits(*v) as u64, order, out),
            (Primitive::F32, Value::F64(v)) => {
                let bits = if v.is_nan() { f32::NAN.to_bits() } else { (*v as f32).to_bits() };
                write_uint(bits as u64, order, out)
            }
            (Primitive::F64, Value::F64(v)) if v.is_nan() => write_uint(f64::NAN.to_bits(), order, out),
            (Primitive::F64, Value::F64(v)) => write_uint(v.to_bits(), order, out),
            (Primitive::Bool, Value::Bool(v)) => out[0] = *v as u8,
            (Primitive::Bytes(_), Value::Bytes(bytes)) => {
                let n = bytes.len().min(out.len());
                out[..n].copy_from_slice(&bytes[..n]);
            }
            (Primitive::Pascal(_), Value::Bytes(bytes)) => {
                let n = bytes.len().min(self.capacity().unwrap_or(0));
                out.fill(0);
                out[0] = n as u8;
                out[1..1 + n].copy_from_slice(&bytes[..n]);
            }
            (Primitive::Pad(_), _) => out.fill(0),
            (_, Value::I64(v)) if self.is_integer() => write_uint(*v as u64, order, out),
            (_, Value::U64(v)) if self.is_integer() => write_uint(*v, order, out),
            (_, other) => {
                let expected = if self.is_integer() {
                    "an integer"
                } else if self.is_float() {
                    "a number"
                } else if *self == Primitive::Bool {
                    "a bool"
                } else {
                    "bytes"
                };
                return Err(self.mismatch(field, expected, other.clone()));
            }
        }
        Ok(())
    }

    /// Reads a canonical value from `bytes`, which is exactly [Primitive::width] bytes long.
    pub fn unpack(&self, order: ByteOrder, bytes: &[u8]) -> Value {
        match *self {
            Primitive::F16 => Value::F64(canonical_nan(
                f16_bits_to_f32(read_uint(order, bytes) as u16) as f64,
            )),
            Primitive::F32 => Value::F64(canonical_nan(
                f32::from_bits(read_uint(order, bytes) as u32) as f64,
            )),
            Primitive::F64 => Value::F64(canonical_nan(f64::from_bits(read_uint(order, bytes)))),
            Primitive::Bool => Value::Bool(bytes[0] != 0),
            Primitive::Bytes(_) | Primitive::Pad(_) => Value::Bytes(bytes.to_vec()),
            Primitive::Pascal(_) => {
                let n = (bytes[0] as usize).min(self.capacity().unwrap_or(0));
                Value::Bytes(bytes[1..1 + n].to_vec())
            }
            _ if self.is_signed() => {
                Value::I64(sign_extend(read_uint(order, bytes), bytes.len() * 8))
            }
            _ => Value::U64(read_uint(order, bytes)),
        }
    }
}

/// Collapses every NaN payload to [f64::NAN] so stored floats compare bitwise.
fn canonical_nan(value: f64) -> f64 {
    if value.is_nan() { f64::NAN } else { value }
}

/// Writes the low `out.len()` bytes of `value` in the given order.
fn write_uint(value: u64, order: ByteOrder, out: &mut [u8]) {
    let width = out.len();
    match order {
        ByteOrder::BigEndian => out.copy_from_slice(&value.to_be_bytes()[8 - width..]),
        ByteOrder::LittleEndian => out.copy_from_slice(&value.to_le_bytes()[..width]),
    }
}

/// Reads up to 8 bytes as an unsigned value in the given order.
fn read_uint(order: ByteOrder, bytes: &[u8]) -> u64 {
    match order {
        ByteOrder::BigEndian => bytes.iter().fold(0, |acc, b| (acc << 8) | *b as u64),
        ByteOrder::LittleEndian => bytes.iter().rev().fold(0, |acc, b| (acc << 8) | *b as u64),
    }
}

/// Sign-extends the low `bits` of `value` to a full `i64`.
fn sign_extend(value: u64, bits: usize) -> i64 {
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}
