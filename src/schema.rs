//! Schema: compiled set of fields describing one fixed-size record layout.

use std::collections::HashMap;

use crate::{
    compiled::CompiledField,
    errors::SchemaError,
    field::{FieldKind, FieldSpec},
    primitive::ByteOrder,
    value::Value,
};

/// A compiled, immutable record layout. Use [Schema::compile] or
/// [Schema::builder] to build one, then share it behind an `Arc` with every
/// [crate::record::Record] of that type.
#[derive(Debug)]
pub struct Schema {
    name: String,
    byte_order: ByteOrder,
    /// Names of the schemas this one extends, oldest first.
    lineage: Vec<String>,
    /// Declared fields in logical order, kept for extension.
    specs: Vec<FieldSpec>,
    /// Compiled fields in logical order.
    fields: Vec<CompiledField>,
    /// Indices into `fields` in physical order.
    layout: Vec<usize>,
    layout_size: usize,
    index: HashMap<String, usize>,
    /// Enum labels promoted to named constants.
    constants: HashMap<String, i64>,
}

/// Collects the parent, byte order and fields of a schema before compiling it.
pub struct SchemaBuilder<'a> {
    name: String,
    parent: Option<&'a Schema>,
    byte_order: Option<ByteOrder>,
    fields: Vec<FieldSpec>,
}

impl<'a> SchemaBuilder<'a> {
    /// Inherits every field of `parent`, ahead of the fields declared here.
    pub fn extends<'p>(self, parent: &'p Schema) -> SchemaBuilder<'p> {
        SchemaBuilder {
            name: self.name,
            parent: Some(parent),
            byte_order: self.byte_order,
            fields: self.fields,
        }
    }

    /// Overrides the byte order. Defaults to the parent's, or big-endian.
    pub fn byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = Some(byte_order);
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let (lineage, mut specs, inherited_order) = match self.parent {
            Some(parent) => {
                let mut lineage = parent.lineage.clone();
                lineage.push(parent.name.clone());
                (lineage, parent.specs.clone(), Some(parent.byte_order))
            }
            None => (Vec::new(), Vec::new(), None),
        };
        specs.extend(self.fields);

        let byte_order = self.byte_order.or(inherited_order).unwrap_or_default();

        Schema::compile_specs(self.name, byte_order, lineage, specs)
    }
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder<'static> {
        SchemaBuilder {
            name: name.into(),
            parent: None,
            byte_order: None,
            fields: Vec::new(),
        }
    }

    /// Compiles a big-endian schema with no parent.
    pub fn compile(name: impl Into<String>, fields: &[FieldSpec]) -> Result<Self, SchemaError> {
        Self::builder(name).fields(fields.iter().cloned()).build()
    }

    fn compile_specs(
        name: String,
        byte_order: ByteOrder,
        lineage: Vec<String>,
        specs: Vec<FieldSpec>,
    ) -> Result<Self, SchemaError> {
        let mut fields: Vec<CompiledField> = Vec::with_capacity(specs.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(specs.len());
        let mut constants: HashMap<String, i64> = HashMap::new();
        let mut trailing: Option<usize> = None;

        for spec in &specs {
            if index.contains_key(&spec.name) {
                return Err(SchemaError::DuplicateFieldName(spec.name.clone()));
            }

            let mut compiled_field = CompiledField::try_from(spec)?;
            compiled_field.index = fields.len();

            if let FieldKind::Enumerated(mapping) = &spec.kind {
                for (value, label) in mapping.iter() {
                    if constants.insert(label.to_string(), value).is_some() {
                        return Err(SchemaError::DuplicateEnumLabel {
                            field: spec.name.clone(),
                            label: label.to_string(),
                        });
                    }
                }
            }

            if spec.trailing {
                if let Some(first) = trailing {
                    return Err(SchemaError::MultipleTrailingFields {
                        first: fields[first].name.clone(),
                        second: spec.name.clone(),
                    });
                }
                trailing = Some(compiled_field.index);
            }

            index.insert(spec.name.clone(), compiled_field.index);
            fields.push(compiled_field);
        }

        let mut layout: Vec<usize> = (0..fields.len())
            .filter(|i| Some(*i) != trailing)
            .collect();
        layout.extend(trailing);

        let mut layout_size = 0;
        for &i in &layout {
            fields[i].offset = layout_size;
            layout_size += fields[i].width();
        }

        for field in &mut fields {
            if let FieldKind::AutoLength { offset } = field.kind {
                let length = layout_size as i128 + offset as i128;
                let value = i64::try_from(length)
                    .map(Value::I64)
                    .unwrap_or(Value::U64(length as u64));
                let initial = field.primitive.coerce(&field.name, value).map_err(|err| {
                    SchemaError::InvalidDefault {
                        field: field.name.clone(),
                        reason: err.to_string(),
                    }
                })?;
                field.initial = Some(initial);
            }
        }

        tracing::debug!(
            schema = %name,
            fields = fields.len(),
            layout_size,
            ?byte_order,
            "compiled schema"
        );

        Ok(Schema {
            name,
            byte_order,
            lineage,
            specs,
            fields,
            layout,
            layout_size,
            index,
            constants,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Total encoded size in bytes.
    pub fn layout_size(&self) -> usize {
        self.layout_size
    }

    /// Names of the extended schemas, oldest first.
    pub fn lineage(&self) -> &[String] {
        &self.lineage
    }

    /// Declared fields in logical order, inherited fields first.
    pub fn specs(&self) -> &[FieldSpec] {
        &self.specs
    }

    /// Compiled fields in logical order.
    pub fn fields(&self) -> &[CompiledField] {
        &self.fields
    }

    /// Compiled fields in physical order: inline fields, then the trailing field.
    pub fn layout(&self) -> impl Iterator<Item = &CompiledField> {
        self.layout.iter().map(|&i| &self.fields[i])
    }

    pub fn field(&self, name: &str) -> Option<&CompiledField> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Raw value of an enum label declared anywhere in the schema.
    pub fn constant(&self, label: &str) -> Option<i64> {
        self.constants.get(label).copied()
    }

    /// Readable field names in physical order.
    pub fn field_names(&self) -> Vec<&str> {
        self.layout()
            .filter(|field| field.kind.access().readable)
            .map(|field| field.name.as_str())
            .collect()
    }

    /// Names accepted by [crate::record::Record::with_values], in logical order.
    pub fn constructor_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| field.kind.access().constructible)
            .map(|field| field.name.as_str())
            .collect()
    }
}
