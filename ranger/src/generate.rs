//! Random values that conform to a schema.
//!
//! Generated values respect every declared bound and `match` constraint, so they always
//! marshal. Useful for round-trip tests, fuzzing, and sampling encodings.

use crate::{
    native::NativeType,
    schema::{FieldDef, Structure, Type},
    Error, Schema, StructValue, Value,
};
use bytes::Bytes;
use rand::{distributions::Alphanumeric, Rng};
use std::collections::BTreeMap;

/// Largest number of elements (or bytes) chosen for a variable-length field.
const MAX_ITEMS: u64 = 10;

/// Largest number of bytes chosen for a variable-length byte sequence or string.
const MAX_BYTES: u64 = 64;

/// Nesting depth past which variable-length arrays are left empty.
const MAX_DEPTH: usize = 8;

/// Returns a random instance of `type_name`.
pub fn random_value(
    schema: &Schema,
    type_name: &str,
    rng: &mut impl Rng,
) -> Result<StructValue, Error> {
    if schema.struct_def(type_name).is_none() {
        return Err(Error::UnknownType(type_name.to_string()));
    }
    Ok(random_struct(schema, type_name, 0, rng))
}

fn random_struct(schema: &Schema, type_name: &str, depth: usize, rng: &mut impl Rng) -> StructValue {
    let mut obj = StructValue::new(type_name);
    let Some(def) = schema.struct_def(type_name) else {
        return obj;
    };

    let lengths = choose_lengths(def.fields(), depth, rng);
    for field in def.fields() {
        if !field.marshal() {
            if let Some(default) = schema.default_value(field) {
                obj.set(field.name(), default);
            }
            continue;
        }
        let length = lengths.get(field.name()).copied();
        let value = random_field(schema, field, length, depth, rng);
        obj.set(field.name(), value);
    }
    obj
}

/// Picks the length of every container field, giving matched fields the same length.
fn choose_lengths(
    fields: &[FieldDef],
    depth: usize,
    rng: &mut impl Rng,
) -> BTreeMap<String, u64> {
    let mut lengths = BTreeMap::new();
    for field in fields.iter().filter(|f| f.is_container()) {
        let require = field.require();
        let length = if require.length > 0 {
            require.length
        } else if field.structure() == Structure::Array {
            if depth >= MAX_DEPTH {
                0
            } else {
                rng.gen_range(0..=require.max_length.min(MAX_ITEMS))
            }
        } else {
            rng.gen_range(0..=require.max_length.min(MAX_BYTES))
        };
        lengths.insert(field.name().to_string(), length);
    }

    for field in fields {
        let Some(target) = field.length_of() else {
            continue;
        };
        let (Some(&left), Some(&right)) = (lengths.get(field.name()), lengths.get(target)) else {
            continue;
        };
        let fixed = |name: &str| {
            fields
                .iter()
                .find(|f| f.name() == name)
                .is_some_and(|f| f.require().length > 0)
        };
        let shared = if fixed(field.name()) {
            left
        } else if fixed(target) {
            right
        } else {
            left.min(right)
        };
        lengths.insert(field.name().to_string(), shared);
        lengths.insert(target.to_string(), shared);
    }
    lengths
}

fn random_field(
    schema: &Schema,
    field: &FieldDef,
    length: Option<u64>,
    depth: usize,
    rng: &mut impl Rng,
) -> Value {
    if let Some(interface) = field.interface() {
        let cases = interface.cases();
        let case = if depth >= MAX_DEPTH {
            // Deep values settle on the smallest case so recursive unions terminate.
            cases.iter().min_by_key(|(_, name)| {
                schema.struct_def(name).map_or(usize::MAX, |def| def.min_size())
            })
        } else {
            cases.get(rng.gen_range(0..cases.len()))
        };
        let name = case.map_or("", |(_, name)| name.as_str());
        return Value::Union(Box::new(random_struct(schema, name, depth + 1, rng)));
    }
    match field.structure() {
        Structure::Scalar => random_of(schema, field.value_type(), length, depth, rng),
        Structure::Array => {
            let item_length = field
                .item_require()
                .filter(|r| r.length > 0)
                .map(|r| r.length);
            let item_max = field.item_require().map_or(0, |r| r.max_length);
            let items = (0..length.unwrap_or_default())
                .map(|_| {
                    let length = item_length
                        .or_else(|| Some(rng.gen_range(0..=item_max.min(MAX_BYTES))));
                    random_of(schema, field.value_type(), length, depth, rng)
                })
                .collect();
            Value::Array(items)
        }
    }
}

fn random_of(
    schema: &Schema,
    type_name: &str,
    length: Option<u64>,
    depth: usize,
    rng: &mut impl Rng,
) -> Value {
    match schema.get_type(type_name) {
        Some(Type::Native(native)) => random_native(native, length.unwrap_or_default(), rng),
        Some(Type::Struct(def)) => Value::Struct(random_struct(schema, def.name(), depth + 1, rng)),
        None => Value::Struct(StructValue::new(type_name)),
    }
}

fn random_native(native: NativeType, length: u64, rng: &mut impl Rng) -> Value {
    // Vary the magnitude so every varint length is exercised.
    let shift = rng.gen_range(0..u64::BITS);
    let integer = rng.gen::<u64>() >> shift;
    match native {
        NativeType::Uint8 => Value::Uint8(integer as u8),
        NativeType::Uint16 => Value::Uint16(integer as u16),
        NativeType::Uint32 => Value::Uint32(integer as u32),
        NativeType::Uint64 => Value::Uint64(integer),
        NativeType::Bytes => {
            let mut raw = vec![0u8; length as usize];
            rng.fill(&mut raw[..]);
            Value::Bytes(Bytes::from(raw))
        }
        NativeType::String => Value::String(
            (0..length)
                .map(|_| char::from(rng.sample(Alphanumeric)))
                .collect(),
        ),
    }
}
