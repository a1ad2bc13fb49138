use crate::{
    errors::SchemaError,
    field::{FieldKind, FieldSpec},
    primitive::Primitive,
    value::Value,
};

/// A validated field with its place in the layout.
#[derive(Debug, Clone)]
pub struct CompiledField {
    pub name: String,
    pub kind: FieldKind,
    pub primitive: Primitive,
    pub trailing: bool,
    /// Position in logical (declaration) order.
    pub index: usize,
    /// Byte offset in the physical layout.
    pub offset: usize,
    /// Canonical value a new record starts with. `None` for padding and calculated fields.
    pub initial: Option<Value>,
}

impl CompiledField {
    pub fn width(&self) -> usize {
        self.primitive.width()
    }

    /// Byte range of the field within an encoded record.
    pub fn span(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.width()
    }
}

impl TryFrom<&FieldSpec> for CompiledField {
    type Error = SchemaError;

    fn try_from(spec: &FieldSpec) -> Result<Self, Self::Error> {
        if !is_identifier(&spec.name) {
            return Err(SchemaError::InvalidFieldName(spec.name.clone()));
        }

        let name = spec.name.as_str();
        let primitive = spec.primitive;

        match primitive {
            Primitive::Bytes(0) | Primitive::Pascal(0) | Primitive::Pad(0) => {
                return Err(SchemaError::InvalidWidth(spec.name.clone()));
            }
            _ => {}
        }

        let padding_kind = matches!(spec.kind, FieldKind::Padding);
        let integer_kind = matches!(
            spec.kind,
            FieldKind::Enumerated(_) | FieldKind::AutoLength { .. }
        );
        if padding_kind != primitive.is_padding() || (integer_kind && !primitive.is_integer()) {
            return Err(SchemaError::IncompatiblePrimitive {
                field: spec.name.clone(),
                primitive: primitive.to_string(),
            });
        }

        let initial = match &spec.kind {
            FieldKind::Plain => match &spec.default {
                Some(value) => Some(coerce_default(spec, value.clone())?),
                None => Some(primitive.zero()),
            },
            FieldKind::Padding => None,
            FieldKind::Constant => match &spec.default {
                Some(value) => Some(coerce_default(spec, value.clone())?),
                None => {
                    return Err(SchemaError::InvalidDefault {
                        field: spec.name.clone(),
                        reason: "constant fields need a value".to_string(),
                    });
                }
            },
            FieldKind::Enumerated(mapping) => {
                if mapping.is_empty() {
                    return Err(SchemaError::EmptyEnumMapping(spec.name.clone()));
                }

                if let Some(value) = mapping.duplicate_value() {
                    return Err(SchemaError::DuplicateEnumValue {
                        field: spec.name.clone(),
                        value,
                    });
                }

                for (value, _) in mapping.iter() {
                    coerce_default(spec, Value::I64(value))?;
                }

                let raw = match &spec.default {
                    Some(Value::Label(label)) => mapping.value(label),
                    Some(value) => value.as_i64().filter(|v| mapping.contains(*v)),
                    None => mapping.iter().next().map(|(value, _)| value),
                };

                match raw {
                    Some(raw) => Some(coerce_default(spec, Value::I64(raw))?),
                    None => {
                        return Err(SchemaError::InvalidDefault {
                            field: spec.name.clone(),
                            reason: "default is not part of the mapping".to_string(),
                        });
                    }
                }
            }
            // Filled in once the layout size is known.
            FieldKind::AutoLength { .. } => None,
            FieldKind::Calculated(calculation) => {
                if calculation.is_none() {
                    return Err(SchemaError::MissingCalculation(spec.name.clone()));
                }
                None
            }
        };

        Ok(CompiledField {
            name: name.to_string(),
            kind: spec.kind.clone(),
            primitive,
            trailing: spec.trailing,
            index: 0,
            offset: 0,
            initial,
        })
    }
}

fn coerce_default(spec: &FieldSpec, value: Value) -> Result<Value, SchemaError> {
    spec.primitive
        .coerce(&spec.name, value)
        .map_err(|err| SchemaError::InvalidDefault {
            field: spec.name.clone(),
            reason: err.to_string(),
        })
}

/// Names must be usable as keywords: a letter or underscore followed by
/// letters, digits or underscores.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::enums::EnumMapping;

    use super::*;

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("temp"));
        assert!(is_identifier("_pad1"));
        assert!(is_identifier("värde"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier("two words"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier("a.b"));
    }

    #[test]
    fn test_plain_defaults() {
        let field = CompiledField::try_from(&FieldSpec::plain("temp", Primitive::I16)).unwrap();
        assert_eq!(field.initial, Some(Value::I64(0)));

        let field =
            CompiledField::try_from(&FieldSpec::bytes("name", 4).with_default(b"ab")).unwrap();
        assert_eq!(field.initial, Some(Value::Bytes(b"ab\0\0".to_vec())));

        let err = CompiledField::try_from(&FieldSpec::plain("temp", Primitive::U8).with_default(300))
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefault { .. }));
    }

    #[test]
    fn test_padding_needs_pad_primitive() {
        let mut spec = FieldSpec::padding("_pad", 2);
        spec.primitive = Primitive::U16;
        assert!(matches!(
            CompiledField::try_from(&spec),
            Err(SchemaError::IncompatiblePrimitive { .. })
        ));

        assert!(matches!(
            CompiledField::try_from(&FieldSpec::plain("raw", Primitive::Pad(2))),
            Err(SchemaError::IncompatiblePrimitive { .. })
        ));

        assert_eq!(
            CompiledField::try_from(&FieldSpec::padding("_pad", 0)).unwrap_err(),
            SchemaError::InvalidWidth("_pad".to_string())
        );
    }

    #[test]
    fn test_enumerated_default() {
        let mapping = EnumMapping::new([(4, "TEMPERATURE"), (7, "HUMIDITY")]);

        let field = CompiledField::try_from(&FieldSpec::enumerated(
            "kind",
            Primitive::U8,
            mapping.clone(),
        ))
        .unwrap();
        assert_eq!(field.initial, Some(Value::U64(4)));

        let field = CompiledField::try_from(
            &FieldSpec::enumerated("kind", Primitive::U8, mapping.clone()).with_default("HUMIDITY"),
        )
        .unwrap();
        assert_eq!(field.initial, Some(Value::U64(7)));

        let err = CompiledField::try_from(
            &FieldSpec::enumerated("kind", Primitive::U8, mapping).with_default(5),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefault { .. }));
    }

    #[test]
    fn test_enumerated_mapping_checks() {
        assert_eq!(
            CompiledField::try_from(&FieldSpec::enumerated(
                "kind",
                Primitive::U8,
                EnumMapping::default()
            ))
            .unwrap_err(),
            SchemaError::EmptyEnumMapping("kind".to_string())
        );

        assert_eq!(
            CompiledField::try_from(&FieldSpec::enumerated(
                "kind",
                Primitive::U8,
                EnumMapping::new([(1, "A"), (1, "B")])
            ))
            .unwrap_err(),
            SchemaError::DuplicateEnumValue {
                field: "kind".to_string(),
                value: 1
            }
        );

        assert!(matches!(
            CompiledField::try_from(&FieldSpec::enumerated(
                "kind",
                Primitive::U8,
                EnumMapping::new([(1, "A"), (256, "B")])
            )),
            Err(SchemaError::InvalidDefault { .. })
        ));

        assert!(matches!(
            CompiledField::try_from(&FieldSpec::enumerated(
                "kind",
                Primitive::F32,
                EnumMapping::new([(1, "A")])
            )),
            Err(SchemaError::IncompatiblePrimitive { .. })
        ));
    }

    #[test]
    fn test_calculated_needs_function() {
        let mut spec = FieldSpec::plain("checksum", Primitive::U8);
        spec.kind = FieldKind::Calculated(None);
        assert_eq!(
            CompiledField::try_from(&spec).unwrap_err(),
            SchemaError::MissingCalculation("checksum".to_string())
        );
    }

    #[test]
    fn test_constant_needs_value() {
        let mut spec = FieldSpec::plain("datatype", Primitive::U8);
        spec.kind = FieldKind::Constant;
        assert!(matches!(
            CompiledField::try_from(&spec),
            Err(SchemaError::InvalidDefault { .. })
        ));
    }
}
