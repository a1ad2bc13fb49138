use std::sync::Arc;

use bytecraft::{
    ByteOrder, DecodeError, EnumMapping, FieldError, FieldSpec, Primitive, Record, Schema,
    SchemaError, Value,
};

fn compile(name: &str, fields: &[FieldSpec]) -> Arc<Schema> {
    Arc::new(Schema::compile(name, fields).unwrap())
}

#[test]
fn test_plain_fields() {
    let schema = compile(
        "TempHum",
        &[
            FieldSpec::plain("temp", Primitive::U8),
            FieldSpec::plain("humidity", Primitive::U8),
        ],
    );
    assert_eq!(schema.byte_order(), ByteOrder::BigEndian);

    let record = Record::with_values(&schema, [("temp", 10), ("humidity", 60)]).unwrap();
    assert_eq!(record.encode().unwrap(), vec![0x0A, 0x3C]);

    let decoded = Record::decode(&schema, &[0x0A, 0x3C]).unwrap();
    assert_eq!(decoded.get("temp"), Ok(Value::U64(10)));
    assert_eq!(decoded.get("humidity"), Ok(Value::U64(60)));
    assert_eq!(decoded, record);
}

#[test]
fn test_padding() {
    let schema = compile(
        "PadClass",
        &[
            FieldSpec::plain("temp", Primitive::U8),
            FieldSpec::padding("pad", 2),
            FieldSpec::plain("humidity", Primitive::U8),
        ],
    );

    let record = Record::with_values(&schema, [("temp", 10), ("humidity", 60)]).unwrap();
    assert_eq!(record.encode().unwrap(), vec![0x0A, 0x00, 0x00, 0x3C]);
    assert_eq!(
        record.get("pad"),
        Err(FieldError::NotReadable("pad".to_string()))
    );
    assert_eq!(
        record.get("pad").unwrap_err().to_string(),
        "Padding (pad) is not readable"
    );

    let decoded = Record::decode(&schema, &[0x0A, 0xFF, 0xFF, 0x3C]).unwrap();
    assert_eq!(decoded.get("humidity"), Ok(Value::U64(60)));
    assert!(decoded.get("pad").is_err());
    assert_eq!(decoded.to_string(), "PadClass(temp=10, humidity=60)");
}

#[test]
fn test_several_paddings() {
    let schema = compile(
        "AdvancedPadClass",
        &[
            FieldSpec::plain("temp", Primitive::U8),
            FieldSpec::padding("_pad1", 2),
            FieldSpec::plain("humidity", Primitive::U8),
            FieldSpec::padding("_pad2", 3),
            FieldSpec::padding("_pad3", 1),
        ],
    );

    let mut record = Record::new(&schema);
    record.set("temp", 10).unwrap();
    record.set("humidity", 60).unwrap();
    assert_eq!(
        record.encode().unwrap(),
        vec![10, 0, 0, 60, 0, 0, 0, 0]
    );
    for pad in ["_pad1", "_pad2", "_pad3"] {
        assert_eq!(record.get(pad), Err(FieldError::NotReadable(pad.to_string())));
    }
}

#[test]
fn test_constant() {
    let schema = compile(
        "Typed",
        &[
            FieldSpec::constant("datatype", Primitive::U8, 0x15u8),
            FieldSpec::plain("status", Primitive::U8),
        ],
    );

    assert_eq!(
        Record::decode(&schema, &[0x14, 0x01]).unwrap_err(),
        DecodeError::ConstantMismatch {
            field: "datatype".to_string(),
            expected: Value::U64(0x15),
            actual: Value::U64(0x14)
        }
    );

    let record = Record::decode(&schema, &[0x15, 0x01]).unwrap();
    assert_eq!(record.get("status"), Ok(Value::U64(1)));
    assert_eq!(record.get("datatype"), Ok(Value::U64(0x15)));
    assert_eq!(record.encode().unwrap(), vec![0x15, 0x01]);

    assert_eq!(
        Record::with_values(&schema, [("datatype", 0x16)]).unwrap_err(),
        FieldError::UnknownField("datatype".to_string())
    );
}

#[test]
fn test_auto_length() {
    let schema = compile(
        "Sized",
        &[
            FieldSpec::auto_length("length", Primitive::U8, 0),
            FieldSpec::plain("temp", Primitive::I8),
        ],
    );

    let record = Record::with_values(&schema, [("temp", 10)]).unwrap();
    assert_eq!(record.get("length"), Ok(Value::U64(2)));
    assert_eq!(record.encode().unwrap(), vec![0x02, 0x0A]);

    assert_eq!(
        Record::decode(&schema, &[0x01, 0x0A]).unwrap_err(),
        DecodeError::AutoLengthMismatch {
            field: "length".to_string(),
            expected: Value::U64(2),
            actual: Value::U64(1)
        }
    );
}

#[test]
fn test_calculated_checksum() {
    let schema = compile(
        "Checked",
        &[
            FieldSpec::plain("temp", Primitive::I8),
            FieldSpec::plain("hum", Primitive::U8),
            FieldSpec::calculated("checksum", Primitive::U8, |view| {
                Ok(Value::I64((view.int("temp")? + view.int("hum")?) & 0xFF))
            }),
        ],
    );

    let record = Record::with_values(&schema, [("temp", -27), ("hum", 10)]).unwrap();
    assert_eq!(record.get("checksum"), Ok(Value::U64(239)));
    assert_eq!(record.encode().unwrap(), vec![0xE5, 0x0A, 0xEF]);

    assert!(Record::decode(&schema, &[0xE5, 0x0A, 0xEF]).is_ok());
    for wrong in [0x00, 0xEE, 0xF0, 0xFF] {
        assert!(matches!(
            Record::decode(&schema, &[0xE5, 0x0A, wrong]).unwrap_err(),
            DecodeError::CalculatedMismatch { .. }
        ));
    }
}

#[test]
fn test_trailing_checksum_keeps_logical_position() {
    let schema = compile(
        "Framed",
        &[
            FieldSpec::auto_length("length", Primitive::U8, 0),
            FieldSpec::calculated("crc", Primitive::U8, |view| {
                let sum = view.uint("length")? + view.uint("a")? + view.uint("b")?;
                Ok(Value::U64(sum & 0xFF))
            })
            .trailing(),
            FieldSpec::plain("a", Primitive::U8),
            FieldSpec::plain("b", Primitive::U8),
        ],
    );

    let record = Record::with_values(&schema, [("a", 1), ("b", 2)]).unwrap();
    assert_eq!(record.encode().unwrap(), vec![4, 1, 2, 7]);
    assert_eq!(record.field_names(), vec!["length", "a", "b", "crc"]);
    assert_eq!(schema.fields()[1].name, "crc");
    assert_eq!(Record::decode(&schema, &[4, 1, 2, 7]).unwrap(), record);
}

#[test]
fn test_enumerated() {
    let schema = compile(
        "Measurement",
        &[
            FieldSpec::enumerated(
                "kind",
                Primitive::U16,
                EnumMapping::new([(1, "TEMPERATURE"), (2, "HUMIDITY")]),
            ),
            FieldSpec::plain("value", Primitive::F32),
        ],
    );

    let mut record = Record::with_values(
        &schema,
        [("kind", Value::from("HUMIDITY")), ("value", Value::from(21.5))],
    )
    .unwrap();
    assert_eq!(
        record.encode().unwrap(),
        vec![0x00, 0x02, 0x41, 0xAC, 0x00, 0x00]
    );

    record.set("kind", schema.constant("TEMPERATURE").unwrap()).unwrap();
    assert_eq!(record.get("kind"), Ok(Value::Label("TEMPERATURE".to_string())));

    assert!(matches!(
        Record::decode(&schema, &[0x00, 0x03, 0, 0, 0, 0]).unwrap_err(),
        DecodeError::UnmappedEnumValue { .. }
    ));
}

#[test]
fn test_inheritance() {
    let base = Schema::builder("Base")
        .byte_order(ByteOrder::LittleEndian)
        .fields([
            FieldSpec::constant("version", Primitive::U8, 1u8),
            FieldSpec::plain("id", Primitive::U16),
        ])
        .build()
        .unwrap();
    let child = Arc::new(
        Schema::builder("Child")
            .extends(&base)
            .field(FieldSpec::plain("reading", Primitive::I16))
            .build()
            .unwrap(),
    );

    let record = Record::with_values(&child, [("id", 0x0102), ("reading", -1)]).unwrap();
    assert_eq!(
        record.encode().unwrap(),
        vec![0x01, 0x02, 0x01, 0xFF, 0xFF]
    );
    assert_eq!(child.constructor_names(), vec!["id", "reading"]);
    assert_eq!(
        record.to_string(),
        "Child(version=1, id=258, reading=-1)"
    );
}

#[test]
fn test_trailing_uniqueness_across_inheritance() {
    let base = Schema::compile(
        "Base",
        &[
            FieldSpec::plain("a", Primitive::U8),
            FieldSpec::calculated("crc", Primitive::U8, |view| view.get("a")).trailing(),
        ],
    )
    .unwrap();

    let err = Schema::builder("Child")
        .extends(&base)
        .field(FieldSpec::calculated("crc2", Primitive::U8, |view| view.get("a")).trailing())
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        SchemaError::MultipleTrailingFields {
            first: "crc".to_string(),
            second: "crc2".to_string()
        }
    );

    // A child without its own trailing field still moves the inherited one last.
    let child = Schema::builder("Child")
        .extends(&base)
        .field(FieldSpec::plain("b", Primitive::U8))
        .build()
        .unwrap();
    assert_eq!(
        child.layout().map(|field| field.name.as_str()).collect::<Vec<_>>(),
        vec!["a", "b", "crc"]
    );
}

#[test]
fn test_label_collision_across_inheritance() {
    let base = Schema::compile(
        "Base",
        &[FieldSpec::enumerated(
            "mode",
            Primitive::U8,
            EnumMapping::new([(0, "OFF"), (1, "ON")]),
        )],
    )
    .unwrap();

    let err = Schema::builder("Child")
        .extends(&base)
        .field(FieldSpec::enumerated(
            "power",
            Primitive::U8,
            EnumMapping::new([(1, "ON")]),
        ))
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateEnumLabel { .. }));
}

#[test]
fn test_strings() {
    let schema = compile(
        "Named",
        &[
            FieldSpec::bytes("tag", 4).with_default(b"ab"),
            FieldSpec::pascal("label", 5),
        ],
    );

    let mut record = Record::new(&schema);
    record.set("label", b"hey").unwrap();
    let bytes = record.encode().unwrap();
    assert_eq!(bytes, b"ab\0\0\x03hey\0".to_vec());
    assert_eq!(Record::decode(&schema, &bytes).unwrap(), record);
}

#[test]
fn test_schema_shared_between_threads() {
    let schema = compile(
        "Counter",
        &[FieldSpec::plain("count", Primitive::U32)],
    );

    let handles: Vec<_> = (0..4u32)
        .map(|i| {
            let schema = Arc::clone(&schema);
            std::thread::spawn(move || {
                let record = Record::with_values(&schema, [("count", i)]).unwrap();
                Record::decode(&schema, &record.encode().unwrap()).unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let record = handle.join().unwrap();
        assert_eq!(record.get("count"), Ok(Value::U64(i as u64)));
    }
}
