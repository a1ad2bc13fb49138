//! Declared fields used to build a [crate::schema::Schema].

use std::{fmt, sync::Arc};

use crate::{
    enums::EnumMapping, errors::FieldError, primitive::Primitive, record::FieldView, value::Value,
};

/// Signature of a calculated field's function: a pure projection of the other fields.
pub type CalcFn = dyn Fn(&FieldView<'_>) -> Result<Value, FieldError> + Send + Sync;

/// A shareable calculation attached to a [FieldKind::Calculated] field.
#[derive(Clone)]
pub struct Calculation(Arc<CalcFn>);

impl Calculation {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&FieldView<'_>) -> Result<Value, FieldError> + Send + Sync + 'static,
    {
        Calculation(Arc::new(f))
    }

    pub fn call(&self, view: &FieldView<'_>) -> Result<Value, FieldError> {
        (self.0)(view)
    }
}

impl fmt::Debug for Calculation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Calculation(..)")
    }
}

/// What a field does besides holding bytes.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Ordinary readable and writable value.
    Plain,
    /// Zero bytes that never hold a value.
    Padding,
    /// Always holds its default; decoding checks it.
    Constant,
    /// Integer stored raw, read back as a label.
    Enumerated(EnumMapping),
    /// Layout size plus `offset`, computed once.
    AutoLength { offset: i64 },
    /// Derived from the other fields on every read; decoding recomputes it.
    Calculated(Option<Calculation>),
}

/// Read and write rules of a [FieldKind].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    /// Reads return a value.
    pub readable: bool,
    /// Writes are accepted (padding accepts and discards them).
    pub writable: bool,
    /// The field may be given an initial value at construction.
    pub constructible: bool,
    /// A record keeps a value for the field.
    pub stored: bool,
}

impl FieldKind {
    pub fn access(&self) -> Access {
        let (readable, writable, constructible, stored) = match self {
            FieldKind::Plain => (true, true, true, true),
            FieldKind::Padding => (false, true, true, false),
            FieldKind::Constant => (true, false, false, true),
            FieldKind::Enumerated(_) => (true, true, true, true),
            FieldKind::AutoLength { .. } => (true, false, false, true),
            FieldKind::Calculated(_) => (true, false, false, false),
        };

        Access {
            readable,
            writable,
            constructible,
            stored,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Plain => "plain",
            FieldKind::Padding => "padding",
            FieldKind::Constant => "constant",
            FieldKind::Enumerated(_) => "enumerated",
            FieldKind::AutoLength { .. } => "auto-length",
            FieldKind::Calculated(_) => "calculated",
        }
    }
}

/// One declared field.
///
/// Constructors only capture intent; everything is validated when the owning
/// schema is compiled.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Identifier used to read and write the field.
    pub name: String,
    pub kind: FieldKind,
    pub primitive: Primitive,
    /// Initial value. For constants, the only legal value.
    pub default: Option<Value>,
    /// Moves the field to the physical end of the layout.
    pub trailing: bool,
}

impl FieldSpec {
    fn new(name: impl Into<String>, kind: FieldKind, primitive: Primitive) -> Self {
        FieldSpec {
            name: name.into(),
            kind,
            primitive,
            default: None,
            trailing: false,
        }
    }

    pub fn plain(name: impl Into<String>, primitive: Primitive) -> Self {
        Self::new(name, FieldKind::Plain, primitive)
    }

    /// `count` zero bytes.
    pub fn padding(name: impl Into<String>, count: usize) -> Self {
        Self::new(name, FieldKind::Padding, Primitive::Pad(count))
    }

    pub fn constant(name: impl Into<String>, primitive: Primitive, value: impl Into<Value>) -> Self {
        Self::new(name, FieldKind::Constant, primitive).with_default(value)
    }

    /// The initial value is the first entry of `mapping` unless a default is set.
    pub fn enumerated(name: impl Into<String>, primitive: Primitive, mapping: EnumMapping) -> Self {
        Self::new(name, FieldKind::Enumerated(mapping), primitive)
    }

    pub fn auto_length(name: impl Into<String>, primitive: Primitive, offset: i64) -> Self {
        Self::new(name, FieldKind::AutoLength { offset }, primitive)
    }

    pub fn calculated<F>(name: impl Into<String>, primitive: Primitive, f: F) -> Self
    where
        F: Fn(&FieldView<'_>) -> Result<Value, FieldError> + Send + Sync + 'static,
    {
        Self::new(
            name,
            FieldKind::Calculated(Some(Calculation::new(f))),
            primitive,
        )
    }

    /// Fixed-length byte string of `len` bytes.
    pub fn bytes(name: impl Into<String>, len: usize) -> Self {
        Self::plain(name, Primitive::Bytes(len))
    }

    /// Length-prefixed byte string occupying `len` bytes in total.
    pub fn pascal(name: impl Into<String>, len: usize) -> Self {
        Self::plain(name, Primitive::Pascal(len))
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Attaches a calculation. Turns the field into a calculated field.
    pub fn with_calculation(mut self, calculation: Calculation) -> Self {
        self.kind = FieldKind::Calculated(Some(calculation));
        self
    }

    /// Places the field after every other field in the byte layout.
    pub fn trailing(mut self) -> Self {
        self.trailing = true;
        self
    }

    pub fn width(&self) -> usize {
        self.primitive.width()
    }
}
