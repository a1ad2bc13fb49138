//! Records: the live values of one instance of a [Schema].

use std::{fmt, sync::Arc};

use crate::{
    codec,
    compiled::CompiledField,
    errors::{DecodeError, FieldError},
    field::FieldKind,
    schema::Schema,
    value::Value,
};

/// Read-only view of a record's stored fields, handed to calculations.
///
/// Padding and calculated fields are not visible through a view.
pub struct FieldView<'a> {
    schema: &'a Schema,
    values: &'a [Option<Value>],
}

impl<'a> FieldView<'a> {
    pub(crate) fn new(schema: &'a Schema, values: &'a [Option<Value>]) -> Self {
        FieldView { schema, values }
    }

    /// Stored value of a field; enumerated fields yield their raw integer.
    pub fn raw(&self, name: &str) -> Result<&'a Value, FieldError> {
        let field = self
            .schema
            .field(name)
            .ok_or_else(|| FieldError::UnknownField(name.to_string()))?;

        match field.kind {
            FieldKind::Padding => Err(FieldError::NotReadable(field.name.clone())),
            FieldKind::Calculated(_) => Err(FieldError::CalculatedDependency(field.name.clone())),
            _ => {
                let values: &'a [Option<Value>] = self.values;
                values[field.index]
                    .as_ref()
                    .ok_or_else(|| FieldError::NotReadable(field.name.clone()))
            }
        }
    }

    /// Value of a field as a record read would return it.
    pub fn get(&self, name: &str) -> Result<Value, FieldError> {
        let raw = self.raw(name)?;
        match self.schema.field(name) {
            Some(field) => resolve(field, raw),
            None => Err(FieldError::UnknownField(name.to_string())),
        }
    }

    /// Integer value of a field. Bools read as 0 or 1.
    pub fn int(&self, name: &str) -> Result<i64, FieldError> {
        let raw = self.raw(name)?;
        match raw {
            Value::Bool(v) => Ok(*v as i64),
            _ => raw.as_i64().ok_or_else(|| FieldError::TypeMismatch {
                field: name.to_string(),
                expected: "an integer",
                value: raw.clone(),
            }),
        }
    }

    pub fn uint(&self, name: &str) -> Result<u64, FieldError> {
        let raw = self.raw(name)?;
        raw.as_u64().ok_or_else(|| FieldError::TypeMismatch {
            field: name.to_string(),
            expected: "an unsigned integer",
            value: raw.clone(),
        })
    }

    pub fn float(&self, name: &str) -> Result<f64, FieldError> {
        let raw = self.raw(name)?;
        raw.as_f64().ok_or_else(|| FieldError::TypeMismatch {
            field: name.to_string(),
            expected: "a number",
            value: raw.clone(),
        })
    }

    pub fn bytes(&self, name: &str) -> Result<&'a [u8], FieldError> {
        let raw = self.raw(name)?;
        raw.as_bytes().ok_or_else(|| FieldError::TypeMismatch {
            field: name.to_string(),
            expected: "bytes",
            value: raw.clone(),
        })
    }
}

/// Translates a stored value into what a read returns.
fn resolve(field: &CompiledField, raw: &Value) -> Result<Value, FieldError> {
    match &field.kind {
        FieldKind::Enumerated(mapping) => raw
            .as_i64()
            .and_then(|v| mapping.label(v))
            .map(|label| Value::Label(label.to_string()))
            .ok_or_else(|| FieldError::UnknownEnumValue {
                field: field.name.clone(),
                value: raw.clone(),
            }),
        _ => Ok(raw.clone()),
    }
}

/// Runs a calculated field's function over `values` and checks the result fits.
pub(crate) fn calculate(
    schema: &Schema,
    values: &[Option<Value>],
    field: &CompiledField,
) -> Result<Value, FieldError> {
    let FieldKind::Calculated(Some(calculation)) = &field.kind else {
        return Err(FieldError::Calculation {
            field: field.name.clone(),
            message: "field is not calculated".to_string(),
        });
    };

    let value = calculation.call(&FieldView::new(schema, values))?;
    field.primitive.coerce(&field.name, value)
}

/// The values of one record, bound to a shared [Schema].
///
/// Writes are validated eagerly; a rejected write leaves the record unchanged.
#[derive(Clone)]
pub struct Record {
    schema: Arc<Schema>,
    /// Stored values by logical field index.
    values: Vec<Option<Value>>,
}

impl Record {
    /// A record holding every field's default.
    pub fn new(schema: &Arc<Schema>) -> Self {
        Record {
            schema: Arc::clone(schema),
            values: schema
                .fields()
                .iter()
                .map(|field| field.initial.clone())
                .collect(),
        }
    }

    /// A record with the given initial values; omitted fields keep their defaults.
    ///
    /// Only names listed by [Schema::constructor_names] are accepted.
    pub fn with_values<I, K, V>(schema: &Arc<Schema>, values: I) -> Result<Self, FieldError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = Record::new(schema);

        for (name, value) in values {
            let name = name.as_ref();
            match schema.field(name) {
                Some(field) if field.kind.access().constructible => record.set(name, value)?,
                _ => return Err(FieldError::UnknownField(name.to_string())),
            }
        }

        Ok(record)
    }

    /// Decodes `data`. See [codec::decode].
    pub fn decode(schema: &Arc<Schema>, data: &[u8]) -> Result<Self, DecodeError> {
        codec::decode(schema, data)
    }

    pub(crate) fn from_parts(schema: &Arc<Schema>, values: Vec<Option<Value>>) -> Self {
        Record {
            schema: Arc::clone(schema),
            values,
        }
    }

    pub(crate) fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Encodes the record. See [codec::encode].
    pub fn encode(&self) -> Result<Vec<u8>, FieldError> {
        codec::encode(self)
    }

    /// Replaces every value with the contents of `data`. On error the record is unchanged.
    pub fn set_bytes(&mut self, data: &[u8]) -> Result<(), DecodeError> {
        let decoded = codec::decode(&self.schema, data)?;
        self.values = decoded.values;
        Ok(())
    }

    /// Readable field names in layout order.
    pub fn field_names(&self) -> Vec<&str> {
        self.schema.field_names()
    }

    fn field(&self, name: &str) -> Result<&CompiledField, FieldError> {
        self.schema
            .field(name)
            .ok_or_else(|| FieldError::UnknownField(name.to_string()))
    }

    /// Reads a field. Enumerated fields return their label, calculated fields
    /// are evaluated against the current values.
    pub fn get(&self, name: &str) -> Result<Value, FieldError> {
        let field = self.field(name)?;

        match &field.kind {
            FieldKind::Padding => Err(FieldError::NotReadable(field.name.clone())),
            FieldKind::Calculated(_) => calculate(&self.schema, &self.values, field),
            _ => match &self.values[field.index] {
                Some(raw) => resolve(field, raw),
                None => Err(FieldError::NotReadable(field.name.clone())),
            },
        }
    }

    /// Writes a field.
    ///
    /// Padding accepts and discards any value. Enumerated fields take a label
    /// or a mapped raw value.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        let field = self.field(name)?;
        let value = value.into();

        let stored = match &field.kind {
            FieldKind::Plain => field.primitive.coerce(&field.name, value)?,
            FieldKind::Padding => return Ok(()),
            FieldKind::Constant => return Err(FieldError::ConstantImmutable(field.name.clone())),
            FieldKind::AutoLength { .. } => {
                return Err(FieldError::AutoLengthImmutable(field.name.clone()));
            }
            FieldKind::Calculated(_) => {
                return Err(FieldError::CalculatedNotSettable(field.name.clone()));
            }
            FieldKind::Enumerated(mapping) => {
                let raw = match &value {
                    Value::Label(label) => mapping.value(label),
                    other => other.as_i64().filter(|v| mapping.contains(*v)),
                };

                match raw {
                    Some(raw) => field.primitive.coerce(&field.name, Value::I64(raw))?,
                    None => {
                        return Err(FieldError::UnknownEnumValue {
                            field: field.name.clone(),
                            value,
                        });
                    }
                }
            }
        };

        let index = field.index;
        self.values[index] = Some(stored);
        Ok(())
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        let same_schema = Arc::ptr_eq(&self.schema, &other.schema)
            || (self.schema.name() == other.schema.name()
                && self.schema.field_names() == other.schema.field_names());

        same_schema && self.values == other.values
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("schema", &self.schema.name())
            .field("values", &self.values)
            .finish()
    }
}

/// Renders `Name(field=value, ...)` over the readable fields in layout order.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.schema.name())?;

        for (i, name) in self.schema.field_names().into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match self.get(name) {
                Ok(value) => write!(f, "{name}={value}")?,
                Err(err) => write!(f, "{name}=<{err}>")?,
            }
        }

        f.write_str(")")
    }
}
