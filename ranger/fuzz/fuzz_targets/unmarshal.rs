#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rand::{rngs::StdRng, SeedableRng};
use ranger::{generate::random_value, varint, Marshaler, Object, Schema};
use std::sync::OnceLock;

const LEDGER: &str = include_str!("../../testdata/ledger.yml");

fn schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| Schema::parse(LEDGER).expect("fixture schema must load"))
}

fn type_name(selector: u8) -> &'static str {
    let schema = schema();
    let index = selector as usize % schema.types().count();
    schema
        .types()
        .nth(index)
        .map(|def| def.name())
        .expect("index is in range")
}

#[derive(Arbitrary, Debug)]
enum FuzzInput<'a> {
    Unmarshal { selector: u8, data: &'a [u8] },
    Generated { selector: u8, seed: u64 },
    Varint(&'a [u8]),
}

fn unmarshal(selector: u8, data: &[u8]) {
    let schema = schema();
    let type_name = type_name(selector);
    let mut obj = schema.object(type_name).unwrap();
    let Ok(consumed) = obj.unmarshal_from(data) else {
        return;
    };

    // Overlong varints are accepted, so the canonical encoding is never longer than the input.
    assert!(consumed <= data.len());
    assert!(obj.size() <= consumed);
    let encoded = obj.marshal().expect("Failed to marshal a decoded value!");
    assert_eq!(encoded.len(), obj.size());

    let mut decoded = schema.object(type_name).unwrap();
    assert_eq!(decoded.unmarshal_from(&encoded), Ok(encoded.len()));
    assert_eq!(decoded.value(), obj.value());
}

fn generated(selector: u8, seed: u64) {
    let schema = schema();
    let type_name = type_name(selector);
    let mut rng = StdRng::seed_from_u64(seed);
    let value = random_value(schema, type_name, &mut rng).unwrap();
    let obj = Object::with_value(schema, value).unwrap();
    let encoded = obj.marshal().expect("Failed to marshal a generated value!");
    assert_eq!(encoded.len(), obj.size());

    let mut decoded = schema.object(type_name).unwrap();
    decoded
        .unmarshal(&encoded)
        .expect("Failed to unmarshal a marshaled value!");
    assert_eq!(decoded.value(), obj.value());
}

fn roundtrip_varint(data: &[u8]) {
    let Ok((value, consumed)) = varint::decode(data) else {
        return;
    };
    assert!(varint::size(value) <= consumed);
    let encoded = varint::encode(value);
    assert_eq!(encoded.len(), varint::size(value));
    assert_eq!(varint::decode(&encoded), Ok((value, encoded.len())));
}

fn fuzz(input: FuzzInput) {
    match input {
        FuzzInput::Unmarshal { selector, data } => unmarshal(selector, data),
        FuzzInput::Generated { selector, seed } => generated(selector, seed),
        FuzzInput::Varint(data) => roundtrip_varint(data),
    };
}

fuzz_target!(|input: FuzzInput| {
    fuzz(input);
});
