//! Encoding records to bytes and decoding bytes back into records.
//!
//! Both directions walk the schema's physical layout: inline fields in
//! declaration order, then the trailing field.

use std::sync::Arc;

use crate::{
    errors::{DecodeError, FieldError},
    field::FieldKind,
    record::{Record, calculate},
    schema::Schema,
    value::Value,
};

/// Packs `record` into exactly [Schema::layout_size] bytes.
///
/// Padding is written as zeros and calculated fields are evaluated against the
/// record's current values. Fails when a calculation fails or yields a value
/// its primitive cannot hold.
pub fn encode(record: &Record) -> Result<Vec<u8>, FieldError> {
    let schema = record.schema();
    let values = record.values();
    let mut out = vec![0u8; schema.layout_size()];

    for field in schema.layout() {
        let span = field.span();
        match &field.kind {
            FieldKind::Padding => {}
            FieldKind::Calculated(_) => {
                let value = calculate(schema, values, field)?;
                field
                    .primitive
                    .pack(&field.name, &value, schema.byte_order(), &mut out[span])?;
            }
            _ => {
                if let Some(value) = &values[field.index] {
                    field
                        .primitive
                        .pack(&field.name, value, schema.byte_order(), &mut out[span])?;
                }
            }
        }
    }

    tracing::trace!(schema = schema.name(), len = out.len(), "encoded record");
    Ok(out)
}

/// Unpacks `data` into a new record, validating every self-describing field.
///
/// The whole buffer is unpacked before any field is checked. Constants, enum
/// mappings and auto-lengths are checked in layout order, then calculated
/// fields are recomputed over the decoded values. The first violation is
/// returned and no record is produced.
pub fn decode(schema: &Arc<Schema>, data: &[u8]) -> Result<Record, DecodeError> {
    if data.len() != schema.layout_size() {
        let err = DecodeError::LengthMismatch {
            expected: schema.layout_size(),
            actual: data.len(),
        };
        tracing::debug!(schema = schema.name(), error = %err, "rejected input");
        return Err(err);
    }

    let mut unpacked: Vec<Option<Value>> = vec![None; schema.fields().len()];
    for field in schema.layout() {
        if matches!(field.kind, FieldKind::Padding) {
            continue;
        }
        let raw = field.primitive.unpack(schema.byte_order(), &data[field.span()]);
        unpacked[field.index] = Some(raw);
    }

    // Calculated values are verified, never stored.
    let mut values = unpacked.clone();
    for field in schema.fields() {
        if !field.kind.access().stored {
            values[field.index] = None;
        }
    }

    if let Err(err) = verify(schema, &unpacked, &values) {
        tracing::debug!(schema = schema.name(), error = %err, "rejected input");
        return Err(err);
    }

    tracing::trace!(schema = schema.name(), len = data.len(), "decoded record");
    Ok(Record::from_parts(schema, values))
}

fn verify(
    schema: &Schema,
    unpacked: &[Option<Value>],
    values: &[Option<Value>],
) -> Result<(), DecodeError> {
    for field in schema.layout() {
        let Some(actual) = &unpacked[field.index] else {
            continue;
        };

        match &field.kind {
            FieldKind::Constant => {
                if field.initial.as_ref() != Some(actual) {
                    return Err(DecodeError::ConstantMismatch {
                        field: field.name.clone(),
                        expected: field.initial.clone().unwrap_or_else(|| field.primitive.zero()),
                        actual: actual.clone(),
                    });
                }
            }
            FieldKind::Enumerated(mapping) => {
                if !actual.as_i64().is_some_and(|v| mapping.contains(v)) {
                    return Err(DecodeError::UnmappedEnumValue {
                        field: field.name.clone(),
                        value: actual.clone(),
                    });
                }
            }
            FieldKind::AutoLength { .. } => {
                if field.initial.as_ref() != Some(actual) {
                    return Err(DecodeError::AutoLengthMismatch {
                        field: field.name.clone(),
                        expected: field.initial.clone().unwrap_or_else(|| field.primitive.zero()),
                        actual: actual.clone(),
                    });
                }
            }
            _ => {}
        }
    }

    for field in schema.layout() {
        if !matches!(field.kind, FieldKind::Calculated(_)) {
            continue;
        }
        let Some(actual) = &unpacked[field.index] else {
            continue;
        };

        let expected = calculate(schema, values, field)?;
        if &expected != actual {
            return Err(DecodeError::CalculatedMismatch {
                field: field.name.clone(),
                expected,
                actual: actual.clone(),
            });
        }
    }

    Ok(())
}
