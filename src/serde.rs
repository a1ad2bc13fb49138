//! JSON-deserializable schema description.
//!
//! These types describe the fields of a record type so that a layout can be
//! shipped as data (for example a JSON file next to your application) and
//! compiled into a [`Schema`] at startup.
//!
//! Calculations cannot be expressed as data. A field declared as
//! [`FieldKindDef::Calculated`] gets its function from
//! [`SchemaDef::compile_with`]; compiling without one fails with
//! [`SchemaError::MissingCalculation`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    enums::EnumMapping,
    errors::SchemaError,
    field::{Calculation, FieldKind, FieldSpec},
    primitive::{ByteOrder, Primitive},
    schema::Schema,
    value::Value,
};

/// Top-level schema definition.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchemaDef {
    /// Record type name, used when rendering records.
    pub name: String,
    /// Byte order of every multi-byte field; defaults to big-endian.
    #[serde(default)]
    pub byte_order: ByteOrderDef,
    /// Fields in declaration order.
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy)]
pub enum ByteOrderDef {
    #[default]
    BigEndian,
    LittleEndian,
    /// Byte order of the platform compiling the schema.
    Native,
    /// Big-endian.
    Network,
}

/// Description of a single field.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FieldDef {
    /// Identifier used to read and write the field.
    pub name: String,
    /// Storage format.
    pub primitive: PrimitiveDef,
    /// Behaviour of the field; plain when omitted.
    #[serde(default)]
    pub kind: FieldKindDef,
    /// Initial value, or the value of a constant.
    #[serde(default)]
    pub default: Option<ValueDef>,
    /// Whether the field is moved to the end of the layout.
    #[serde(default)]
    pub trailing: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(tag = "type")]
pub enum PrimitiveDef {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F16,
    F32,
    F64,
    Bool,
    Bytes { len: usize },
    Pascal { len: usize },
    Pad { len: usize },
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
#[serde(tag = "type")]
pub enum FieldKindDef {
    #[default]
    Plain,
    Padding,
    Constant,
    Enumerated {
        /// Raw value and label pairs.
        values: Vec<EnumEntryDef>,
    },
    AutoLength {
        #[serde(default)]
        offset: i64,
    },
    Calculated,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EnumEntryDef {
    pub value: i64,
    pub label: String,
}

/// A default value as written in JSON.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub enum ValueDef {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// An enum label.
    Label(String),
    Bytes(Vec<u8>),
}

impl From<ByteOrderDef> for ByteOrder {
    fn from(value: ByteOrderDef) -> Self {
        match value {
            ByteOrderDef::BigEndian => ByteOrder::BigEndian,
            ByteOrderDef::LittleEndian => ByteOrder::LittleEndian,
            ByteOrderDef::Native => ByteOrder::native(),
            ByteOrderDef::Network => ByteOrder::NETWORK,
        }
    }
}

impl From<PrimitiveDef> for Primitive {
    fn from(value: PrimitiveDef) -> Self {
        match value {
            PrimitiveDef::U8 => Primitive::U8,
            PrimitiveDef::I8 => Primitive::I8,
            PrimitiveDef::U16 => Primitive::U16,
            PrimitiveDef::I16 => Primitive::I16,
            PrimitiveDef::U32 => Primitive::U32,
            PrimitiveDef::I32 => Primitive::I32,
            PrimitiveDef::U64 => Primitive::U64,
            PrimitiveDef::I64 => Primitive::I64,
            PrimitiveDef::F16 => Primitive::F16,
            PrimitiveDef::F32 => Primitive::F32,
            PrimitiveDef::F64 => Primitive::F64,
            PrimitiveDef::Bool => Primitive::Bool,
            PrimitiveDef::Bytes { len } => Primitive::Bytes(len),
            PrimitiveDef::Pascal { len } => Primitive::Pascal(len),
            PrimitiveDef::Pad { len } => Primitive::Pad(len),
        }
    }
}

impl From<ValueDef> for Value {
    fn from(value: ValueDef) -> Self {
        match value {
            ValueDef::Bool(v) => Value::Bool(v),
            ValueDef::Int(v) => Value::I64(v),
            ValueDef::UInt(v) => Value::U64(v),
            ValueDef::Float(v) => Value::F64(v),
            ValueDef::Label(v) => Value::Label(v),
            ValueDef::Bytes(v) => Value::Bytes(v),
        }
    }
}

impl From<FieldDef> for FieldSpec {
    fn from(value: FieldDef) -> Self {
        let kind = match value.kind {
            FieldKindDef::Plain => FieldKind::Plain,
            FieldKindDef::Padding => FieldKind::Padding,
            FieldKindDef::Constant => FieldKind::Constant,
            FieldKindDef::Enumerated { values } => FieldKind::Enumerated(EnumMapping::new(
                values.into_iter().map(|entry| (entry.value, entry.label)),
            )),
            FieldKindDef::AutoLength { offset } => FieldKind::AutoLength { offset },
            FieldKindDef::Calculated => FieldKind::Calculated(None),
        };

        FieldSpec {
            name: value.name,
            kind,
            primitive: value.primitive.into(),
            default: value.default.map(Into::into),
            trailing: value.trailing,
        }
    }
}

impl SchemaDef {
    /// Compiles the definition, attaching calculations to calculated fields by name.
    ///
    /// A calculation whose name is not a calculated field of the definition
    /// fails with [SchemaError::UnusedCalculation].
    pub fn compile_with(
        self,
        mut calculations: HashMap<String, Calculation>,
    ) -> Result<Schema, SchemaError> {
        let fields: Vec<FieldSpec> = self
            .fields
            .into_iter()
            .map(|def| {
                let mut spec = FieldSpec::from(def);
                if matches!(spec.kind, FieldKind::Calculated(None)) {
                    if let Some(calculation) = calculations.remove(&spec.name) {
                        spec = spec.with_calculation(calculation);
                    }
                }
                spec
            })
            .collect();

        if let Some(unused) = calculations.into_keys().min() {
            return Err(SchemaError::UnusedCalculation(unused));
        }

        Schema::builder(self.name)
            .byte_order(self.byte_order.into())
            .fields(fields)
            .build()
    }
}

impl TryFrom<SchemaDef> for Schema {
    type Error = SchemaError;

    fn try_from(value: SchemaDef) -> Result<Self, Self::Error> {
        value.compile_with(HashMap::new())
    }
}
