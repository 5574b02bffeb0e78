//! Dynamic values marshaled by the interpreter.
//!
//! A [StructValue] holds the members of one instance of a schema type by field name. A field
//! that is absent is "unset": the value cannot be marshaled until it is provided, and
//! [crate::Marshaler::size] reports `0` for it.

use bytes::Bytes;
use std::collections::BTreeMap;

/// A value of any type expressible in a schema.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Bytes(Bytes),
    String(String),
    /// A nested struct, stored inline.
    Struct(StructValue),
    /// The elements of an array field.
    Array(Vec<Value>),
    /// The concrete payload of a tagged union. The discriminant is derived from the payload's
    /// type when marshaling.
    Union(Box<StructValue>),
}

impl Value {
    /// Returns a short name for the shape of the value, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Uint8(_) => "uint8",
            Value::Uint16(_) => "uint16",
            Value::Uint32(_) => "uint32",
            Value::Uint64(_) => "uint64",
            Value::Bytes(_) => "[]byte",
            Value::String(_) => "string",
            Value::Struct(_) => "struct",
            Value::Array(_) => "array",
            Value::Union(_) => "interface",
        }
    }

    /// Returns the value as a `u64` if it is an integer of any width.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint8(v) => Some(u64::from(*v)),
            Value::Uint16(v) => Some(u64::from(*v)),
            Value::Uint32(v) => Some(u64::from(*v)),
            Value::Uint64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the number of elements (arrays) or bytes (byte sequences and strings).
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Bytes(b) => Some(b.len()),
            Value::String(s) => Some(s.len()),
            Value::Array(items) => Some(items.len()),
            _ => None,
        }
    }

    /// Returns true if the value is an empty container.
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(v) => Some(v),
            Value::Union(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Uint8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::Uint16(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Uint32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint64(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(v))
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(Bytes::copy_from_slice(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<StructValue> for Value {
    fn from(v: StructValue) -> Self {
        Value::Struct(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

/// One instance of a struct type: its type name and its members by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct StructValue {
    type_name: String,
    fields: BTreeMap<String, Value>,
}

impl StructValue {
    /// Creates an instance of `type_name` with every field unset.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Sets a field, returning the instance (for building values inline).
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    /// Sets a field, returning the previous value if there was one.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Unsets a field, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Iterates over the set fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}
