use ranger::{varint, Error, Marshaler, Object, Schema, StructValue, Value};

fn schema(types: &str) -> Schema {
    Schema::parse(&format!("max_byte_range: 64\ntypes:\n{types}")).unwrap()
}

#[test]
fn test_fixed_layout() {
    let schema = schema(
        r#"
  Outpoint:
    - PreviousTx:
        value_type: "[]byte"
        require: { length: 32 }
    - Index:
        value_type: uint8
"#,
    );
    assert_eq!(schema.struct_def("Outpoint").unwrap().min_size(), 33);

    // Zero value
    let zero = schema.object("Outpoint").unwrap();
    assert_eq!(zero.size(), 33);
    assert_eq!(zero.marshal().unwrap().as_ref(), &[0u8; 33][..]);

    // Any value
    let value = StructValue::new("Outpoint")
        .with("PreviousTx", vec![0xEEu8; 32])
        .with("Index", 255u8);
    let obj = Object::with_value(&schema, value.clone()).unwrap();
    assert_eq!(obj.size(), 33);
    let encoded = obj.marshal().unwrap();
    assert_eq!(encoded[32], 255);

    let mut decoded = schema.object("Outpoint").unwrap();
    assert_eq!(decoded.unmarshal_from(&encoded), Ok(33));
    assert_eq!(decoded.value(), &value);
}

#[test]
fn test_bounded_bytes() {
    let schema = schema(
        r#"
  Output:
    - ScriptPubKey:
        value_type: "[]byte"
        require: { max_length: 20 }
"#,
    );
    let output = |len: usize| {
        Object::with_value(
            &schema,
            StructValue::new("Output").with("ScriptPubKey", vec![7u8; len]),
        )
        .unwrap()
    };

    // At the bound
    let encoded = output(20).marshal().unwrap();
    assert_eq!(encoded.len(), varint::size(20) + 20);
    let mut decoded = schema.object("Output").unwrap();
    decoded.unmarshal(&encoded).unwrap();

    // Past the bound, on both paths
    let err = output(21).marshal().unwrap_err();
    assert_eq!(err.kind(), &Error::TooMany(21, 20));
    assert_eq!(err.path(), vec!["Output.ScriptPubKey"]);

    let mut data = vec![21u8];
    data.extend_from_slice(&[7u8; 21]);
    let mut decoded = schema.object("Output").unwrap();
    assert_eq!(
        decoded.unmarshal(&data).unwrap_err().kind(),
        &Error::TooMany(21, 20)
    );
}

#[test]
fn test_bounded_array() {
    let schema = schema(
        r#"
  List:
    - Items:
        structure_type: array
        value_type: uint16
        require: { max_length: 3 }
"#,
    );
    let list = |count: usize| {
        let items: Vec<Value> = (0..count).map(|i| Value::Uint16(i as u16)).collect();
        Object::with_value(&schema, StructValue::new("List").with("Items", items)).unwrap()
    };

    let encoded = list(3).marshal().unwrap();
    assert_eq!(encoded.as_ref(), &[3, 0, 1, 2]);
    assert_eq!(
        list(4).marshal().unwrap_err().kind(),
        &Error::TooMany(4, 3)
    );

    let mut decoded = schema.object("List").unwrap();
    assert_eq!(
        decoded.unmarshal(&[4, 0, 1, 2, 3]).unwrap_err().kind(),
        &Error::TooMany(4, 3)
    );
}

#[test]
fn test_tagged_union() {
    let schema = schema(
        r#"
  Transfer:
    - Amount:
        value_type: uint64
  Genesis:
    - Supply:
        value_type: uint32
        require: { static: true }
  Config:
    - Key:
        value_type: string
        require: { max_length: 8 }
  Escrow:
  Transaction:
    - Body:
        value_type: TransactionBody
        interface:
          output: TxType
          input: uint8
          cases:
            - 0: Transfer
            - 1: Genesis
            - 2: Config
            - 3: Escrow
"#,
    );
    let bodies = [
        (0u8, StructValue::new("Transfer").with("Amount", 1u64 << 40)),
        (1, StructValue::new("Genesis").with("Supply", 21_000_000u32)),
        (2, StructValue::new("Config").with("Key", "fee")),
        (3, StructValue::new("Escrow")),
    ];
    for (tag, body) in bodies {
        let value = StructValue::new("Transaction").with("Body", Value::Union(Box::new(body)));
        let obj = Object::with_value(&schema, value.clone()).unwrap();
        let encoded = obj.marshal().unwrap();
        assert_eq!(encoded[0], tag);
        assert_eq!(encoded.len(), obj.size());

        let mut decoded = schema.object("Transaction").unwrap();
        decoded.unmarshal(&encoded).unwrap();
        assert_eq!(decoded.value(), &value);
    }

    let mut decoded = schema.object("Transaction").unwrap();
    let err = decoded.unmarshal(&[5]).unwrap_err();
    assert!(matches!(err.kind(), Error::BadInterface(_)));
    assert_eq!(err.path(), vec!["Transaction.Body"]);
}

#[test]
fn test_length_mismatch() {
    let schema = schema(
        r#"
  Transfer:
    - Inputs:
        structure_type: array
        value_type: uint8
        require: { max_length: 5 }
    - Witnesses:
        structure_type: array
        value_type: "[]byte"
        require: { max_length: 5 }
        item_require: { max_length: 4 }
        match: { length_of_field: Inputs }
"#,
    );
    let value = StructValue::new("Transfer")
        .with("Inputs", vec![Value::Uint8(1), Value::Uint8(2), Value::Uint8(3)])
        .with(
            "Witnesses",
            vec![Value::from(vec![1u8]), Value::from(vec![2u8])],
        );
    let obj = Object::with_value(&schema, value).unwrap();
    assert!(matches!(
        obj.marshal().unwrap_err(),
        Error::LengthMismatch(_, _)
    ));

    let mut decoded = schema.object("Transfer").unwrap();
    let data = [3, 1, 2, 3, 2, 1, 1, 1, 2];
    assert!(matches!(
        decoded.unmarshal(&data).unwrap_err(),
        Error::LengthMismatch(_, _)
    ));

    let data = [2, 1, 2, 2, 1, 1, 1, 2];
    decoded.unmarshal(&data).unwrap();
}

#[test]
fn test_short_buffers() {
    let schema = schema(
        r#"
  Outpoint:
    - PreviousTx:
        value_type: "[]byte"
        require: { length: 32 }
    - Index:
        value_type: uint8
  Input:
    - Outpoint:
        value_type: Outpoint
        inline_struct: true
    - Sequence:
        value_type: uint32
    - Tags:
        structure_type: array
        value_type: string
        require: { max_length: 4 }
        item_require: { max_length: 8 }
"#,
    );
    let value = StructValue::new("Input")
        .with(
            "Outpoint",
            StructValue::new("Outpoint")
                .with("PreviousTx", vec![1u8; 32])
                .with("Index", 2u8),
        )
        .with("Sequence", 1u32 << 20)
        .with("Tags", vec![Value::from("a"), Value::from("bcd")]);
    let encoded = Object::with_value(&schema, value)
        .unwrap()
        .marshal()
        .unwrap();

    // Every strict prefix fails cleanly.
    for len in 0..encoded.len() {
        let mut decoded = schema.object("Input").unwrap();
        let err = decoded.unmarshal_from(&encoded[..len]).unwrap_err();
        assert_eq!(err.kind(), &Error::ShortRead, "prefix of {len} bytes");
    }

    // Below the minimum size, before reading any field.
    let mut decoded = schema.object("Input").unwrap();
    let err = decoded.unmarshal_from(&[0u8; 10]).unwrap_err();
    assert_eq!(err, Error::ShortRead.context("Input"));
}

#[test]
fn test_short_write() {
    let schema = schema(
        r#"
  Pair:
    - A:
        value_type: uint64
        require: { static: true }
    - B:
        value_type: uint64
        require: { static: true }
"#,
    );
    let obj = Object::with_value(
        &schema,
        StructValue::new("Pair").with("A", 1u64).with("B", 2u64),
    )
    .unwrap();
    let mut buf = [0u8; 15];
    let err = obj.marshal_to(&mut buf).unwrap_err();
    assert_eq!(err, Error::ShortWrite.context("Pair.B"));
}

#[test]
fn test_varint_size_law() {
    let values = [
        0u64,
        1,
        127,
        128,
        129,
        255,
        256,
        (1 << 32) - 1,
        1 << 32,
        (1 << 63) - 1,
        u64::MAX,
    ];
    for value in values {
        let encoded = varint::encode(value);
        assert_eq!(encoded.len(), varint::size(value));
        assert_eq!(varint::decode(&encoded), Ok((value, varint::size(value))));
    }
}
