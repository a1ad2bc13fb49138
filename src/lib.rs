//! # bytecraft
//!
//! Declarative fixed-layout binary records.
//!
//! Describe a record as an ordered list of [`FieldSpec`]s (integers, floats,
//! bools, fixed or length-prefixed byte strings, padding), optionally with
//! special behaviour: constants, enumerated labels, automatically computed
//! lengths and fields calculated from the other fields. Compile the list into
//! a [`Schema`] once, then encode and decode [`Record`]s against it. Decoding
//! checks every self-describing field and rejects inconsistent input.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use bytecraft::{FieldSpec, Primitive, Record, Schema, Value};
//!
//! let schema = Arc::new(
//!     Schema::compile(
//!         "TempHum",
//!         &[
//!             FieldSpec::plain("temp", Primitive::I8),
//!             FieldSpec::plain("hum", Primitive::U8),
//!             FieldSpec::calculated("checksum", Primitive::U8, |view| {
//!                 Ok(Value::I64((view.int("temp")? + view.int("hum")?) & 0xFF))
//!             }),
//!         ],
//!     )
//!     .unwrap(),
//! );
//!
//! let record = Record::with_values(&schema, [("temp", -27), ("hum", 10)]).unwrap();
//! assert_eq!(record.encode().unwrap(), vec![0xE5, 0x0A, 0xEF]);
//!
//! let decoded = Record::decode(&schema, &[0xE5, 0x0A, 0xEF]).unwrap();
//! assert_eq!(decoded, record);
//! assert_eq!(decoded.to_string(), "TempHum(temp=-27, hum=10, checksum=239)");
//! ```

pub mod codec;
pub mod compiled;
pub mod enums;
pub mod errors;
pub mod field;
pub mod float;
pub mod primitive;
pub mod record;
pub mod schema;
#[cfg(feature = "serde")]
pub mod serde;
pub mod value;

pub use enums::EnumMapping;
pub use errors::{DecodeError, FieldError, SchemaError};
pub use field::{Calculation, FieldKind, FieldSpec};
pub use primitive::{ByteOrder, Primitive};
pub use record::{FieldView, Record};
pub use schema::{Schema, SchemaBuilder};
pub use value::Value;
