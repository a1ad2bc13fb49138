//! Error types for schema compilation, field access and decoding.

use thiserror::Error;

use crate::value::Value;

/// Errors produced when compiling [crate::field::FieldSpec]s into a [crate::schema::Schema].
///
/// These are definition-time errors: a schema that fails to compile cannot be used.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Two fields in the hierarchy share a name.
    #[error("duplicate field name '{0}'")]
    DuplicateFieldName(String),

    /// Two enumerated fields in the hierarchy expose the same label.
    #[error("enum label '{label}' of field '{field}' is already defined")]
    DuplicateEnumLabel { field: String, label: String },

    /// A mapping lists the same raw value twice.
    #[error("enum value {value} of field '{field}' is mapped twice")]
    DuplicateEnumValue { field: String, value: i64 },

    /// An enumerated field was declared with no labels.
    #[error("enumerated field '{0}' has an empty mapping")]
    EmptyEnumMapping(String),

    /// Field name is empty, starts with a digit or contains separators.
    #[error("invalid field name '{0}'")]
    InvalidFieldName(String),

    /// More than one field is marked as trailing.
    #[error("only one trailing field is allowed, found '{first}' and '{second}'")]
    MultipleTrailingFields { first: String, second: String },

    /// A calculated field has no calculation attached.
    #[error("calculated field '{0}' has no calculation")]
    MissingCalculation(String),

    /// A calculation was supplied for a name that is not a calculated field.
    #[error("calculation supplied for '{0}', which is not a calculated field")]
    UnusedCalculation(String),

    /// The primitive cannot carry this kind of field.
    #[error("field '{field}' cannot use primitive {primitive}")]
    IncompatiblePrimitive { field: String, primitive: String },

    /// Byte string or padding declared with zero width.
    #[error("field '{0}' has zero width")]
    InvalidWidth(String),

    /// A default, constant, mapping or computed length does not fit the primitive.
    #[error("invalid default for field '{field}': {reason}")]
    InvalidDefault { field: String, reason: String },
}

/// Errors produced when reading or writing a single field of a [crate::record::Record].
///
/// A failed write never modifies the record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    /// No field with this name exists, or it cannot be supplied at construction.
    #[error("unexpected field '{0}'")]
    UnknownField(String),

    // Range errors
    /// Value does not fit the field's primitive.
    #[error("value {value} out of range for field '{field}' ({primitive})")]
    OutOfRange {
        field: String,
        primitive: String,
        value: Value,
    },

    /// Value has the wrong shape for the field (e.g. bytes for an integer).
    #[error("field '{field}' expects {expected}, got {} {value}", .value.kind_name())]
    TypeMismatch {
        field: String,
        expected: &'static str,
        value: Value,
    },

    // Access errors
    /// Padding is never readable.
    #[error("Padding ({0}) is not readable")]
    NotReadable(String),

    /// Calculations cannot depend on other calculated fields.
    #[error("calculated field '{0}' cannot be read by another calculation")]
    CalculatedDependency(String),

    /// Constant fields keep their declared value.
    #[error("constant field '{0}' cannot be changed")]
    ConstantImmutable(String),

    /// Auto-length fields are computed from the layout.
    #[error("auto-length field '{0}' cannot be changed")]
    AutoLengthImmutable(String),

    /// Calculated fields are derived from the other fields.
    #[error("calculated field '{0}' cannot be set")]
    CalculatedNotSettable(String),

    /// Value is neither a known label nor a mapped raw value.
    #[error("unknown enum value {value} for field '{field}'")]
    UnknownEnumValue { field: String, value: Value },

    /// A calculation failed.
    #[error("calculation of field '{field}' failed: {message}")]
    Calculation { field: String, message: String },
}

/// Errors produced by [crate::codec::decode]. No record is produced on any of them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Input length differs from the schema layout size.
    #[error("expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A constant field holds a different value.
    #[error("constant field '{field}' expected {expected}, got {actual}")]
    ConstantMismatch {
        field: String,
        expected: Value,
        actual: Value,
    },

    /// An auto-length field disagrees with the layout size.
    #[error("auto-length field '{field}' expected {expected}, got {actual}")]
    AutoLengthMismatch {
        field: String,
        expected: Value,
        actual: Value,
    },

    /// A calculated field disagrees with its recomputed value.
    #[error("calculated field '{field}' expected {expected}, got {actual}")]
    CalculatedMismatch {
        field: String,
        expected: Value,
        actual: Value,
    },

    /// An enumerated field holds a raw value outside its mapping.
    #[error("enumerated field '{field}' holds unmapped value {value}")]
    UnmappedEnumValue { field: String, value: Value },

    /// A calculation failed while verifying the input.
    #[error(transparent)]
    Field(#[from] FieldError),
}
