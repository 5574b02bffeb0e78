//! Native types understood by every schema.
//!
//! # Integers
//!
//! `uint8` is always a single raw byte. Wider integers are encoded as a varint unless the
//! field is marked `static`, in which case they use their fixed width, little-endian.
//!
//! # Byte sequences
//!
//! `[]byte` (alias `bytes`) and `string` are written as exactly `length` raw bytes when the
//! field declares a fixed `length`, and as a varint length followed by the raw bytes
//! otherwise. Strings must be valid UTF-8.

use crate::{algorithm::Algorithm, instance::Instance, varint, Error, Schema, Value};
use bytes::{Buf, BufMut, Bytes};

/// A type built into the schema language.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NativeType {
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Bytes,
    String,
}

impl NativeType {
    /// Resolves a `value_type` to a native type.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "uint8" => Some(NativeType::Uint8),
            "uint16" => Some(NativeType::Uint16),
            "uint32" => Some(NativeType::Uint32),
            "uint64" => Some(NativeType::Uint64),
            "[]byte" | "bytes" => Some(NativeType::Bytes),
            "string" => Some(NativeType::String),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NativeType::Uint8 => "uint8",
            NativeType::Uint16 => "uint16",
            NativeType::Uint32 => "uint32",
            NativeType::Uint64 => "uint64",
            NativeType::Bytes => "[]byte",
            NativeType::String => "string",
        }
    }

    pub fn is_integer(&self) -> bool {
        !self.is_bytes()
    }

    /// Returns true for the length-delimited types (`[]byte` and `string`).
    pub fn is_bytes(&self) -> bool {
        matches!(self, NativeType::Bytes | NativeType::String)
    }

    /// Width in bytes of the fixed-width encoding of an integer (0 for byte sequences).
    pub fn width(&self) -> usize {
        match self {
            NativeType::Uint8 => 1,
            NativeType::Uint16 => 2,
            NativeType::Uint32 => 4,
            NativeType::Uint64 => 8,
            NativeType::Bytes | NativeType::String => 0,
        }
    }

    pub fn bits(&self) -> u32 {
        (self.width() * 8) as u32
    }

    /// Returns true if values of this type are preceded by a varint length.
    pub fn has_length(&self, inst: &dyn Instance) -> bool {
        self.is_bytes() && inst.length() == 0
    }

    /// Returns the zero value, `length` zero bytes for fixed byte sequences.
    pub fn zero(&self, length: u64) -> Value {
        match self {
            NativeType::Uint8 => Value::Uint8(0),
            NativeType::Uint16 => Value::Uint16(0),
            NativeType::Uint32 => Value::Uint32(0),
            NativeType::Uint64 => Value::Uint64(0),
            NativeType::Bytes => Value::Bytes(Bytes::from(vec![0u8; length as usize])),
            NativeType::String => Value::String(String::new()),
        }
    }

    /// Converts an integer to a value of this type.
    pub fn from_u64(&self, value: u64) -> Result<Value, Error> {
        let too_large = |_| Error::TooLarge(value, self.bits());
        match self {
            NativeType::Uint8 => u8::try_from(value).map(Value::Uint8).map_err(too_large),
            NativeType::Uint16 => u16::try_from(value).map(Value::Uint16).map_err(too_large),
            NativeType::Uint32 => u32::try_from(value).map(Value::Uint32).map_err(too_large),
            NativeType::Uint64 => Ok(Value::Uint64(value)),
            NativeType::Bytes | NativeType::String => Err(Error::UnexpectedValue {
                expected: self.name().to_string(),
                found: "integer".to_string(),
            }),
        }
    }

    /// Returns the raw contents of a value of this type, if it has the right shape.
    fn contents<'v>(&self, value: &'v Value) -> Option<&'v [u8]> {
        match (self, value) {
            (NativeType::Bytes, Value::Bytes(b)) => Some(b),
            (NativeType::String, Value::String(s)) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Returns an integer value of this type as a `u64`, if it has the right shape.
    fn integer(&self, value: &Value) -> Option<u64> {
        match (self, value) {
            (NativeType::Uint8, Value::Uint8(_))
            | (NativeType::Uint16, Value::Uint16(_))
            | (NativeType::Uint32, Value::Uint32(_))
            | (NativeType::Uint64, Value::Uint64(_)) => value.as_u64(),
            _ => None,
        }
    }

    fn unexpected(&self, value: &Value) -> Error {
        Error::UnexpectedValue {
            expected: self.name().to_string(),
            found: value.kind().to_string(),
        }
    }

    fn read_integer(&self, inst: &dyn Instance, buf: &mut impl Buf) -> Result<Value, Error> {
        if *self != NativeType::Uint8 && !inst.is_static() {
            return self.from_u64(varint::read(buf)?);
        }
        if buf.remaining() < self.width() {
            return Err(Error::ShortRead);
        }
        Ok(match self {
            NativeType::Uint8 => Value::Uint8(buf.get_u8()),
            NativeType::Uint16 => Value::Uint16(buf.get_u16_le()),
            NativeType::Uint32 => Value::Uint32(buf.get_u32_le()),
            _ => Value::Uint64(buf.get_u64_le()),
        })
    }

    fn read_bytes(&self, inst: &dyn Instance, buf: &mut impl Buf) -> Result<Value, Error> {
        let len = match inst.length() {
            0 => {
                let len = varint::read(buf)?;
                let max = inst.max_length();
                if max > 0 && len > max {
                    return Err(Error::TooMany(len, max));
                }
                len
            }
            length => length,
        };
        if (buf.remaining() as u64) < len {
            return Err(Error::ShortRead);
        }
        let raw = buf.copy_to_bytes(len as usize);
        match self {
            NativeType::String => String::from_utf8(raw.to_vec())
                .map(Value::String)
                .map_err(|_| Error::InvalidUtf8),
            _ => Ok(Value::Bytes(raw)),
        }
    }

    fn check_bounds(&self, inst: &dyn Instance, len: u64) -> Result<(), Error> {
        let length = inst.length();
        if length > 0 && len != length {
            return Err(Error::FixedLength {
                found: len,
                expected: length,
            });
        }
        let max = inst.max_length();
        if length == 0 && max > 0 && len > max {
            return Err(Error::TooMany(len, max));
        }
        Ok(())
    }
}

impl Algorithm for NativeType {
    fn minimum_size(&self, _: &Schema, inst: &dyn Instance) -> usize {
        match self {
            NativeType::Uint8 => 1,
            NativeType::Uint16 | NativeType::Uint32 | NativeType::Uint64 => {
                if inst.is_static() {
                    self.width()
                } else {
                    1
                }
            }
            NativeType::Bytes | NativeType::String => match inst.length() {
                0 => 1,
                length => length as usize,
            },
        }
    }

    fn read(&self, _: &Schema, inst: &dyn Instance, buf: &mut impl Buf) -> Result<Value, Error> {
        if self.is_bytes() {
            self.read_bytes(inst, buf)
        } else {
            self.read_integer(inst, buf)
        }
    }

    fn write(
        &self,
        schema: &Schema,
        inst: &dyn Instance,
        value: &Value,
        buf: &mut impl BufMut,
    ) -> Result<(), Error> {
        if let Some(contents) = self.contents(value) {
            let len = contents.len() as u64;
            self.check_bounds(inst, len)?;
            let prefix = self.has_length(inst);
            let needed = contents.len() + if prefix { varint::size(len) } else { 0 };
            if buf.remaining_mut() < needed {
                return Err(Error::ShortWrite);
            }
            if prefix {
                varint::write(len, buf);
            }
            buf.put_slice(contents);
            return Ok(());
        }

        let integer = self.integer(value).ok_or_else(|| self.unexpected(value))?;
        let needed = self
            .write_size(schema, inst, value)
            .ok_or_else(|| self.unexpected(value))?;
        if buf.remaining_mut() < needed {
            return Err(Error::ShortWrite);
        }
        match self {
            NativeType::Uint8 => buf.put_u8(integer as u8),
            _ if !inst.is_static() => varint::write(integer, buf),
            NativeType::Uint16 => buf.put_u16_le(integer as u16),
            NativeType::Uint32 => buf.put_u32_le(integer as u32),
            _ => buf.put_u64_le(integer),
        }
        Ok(())
    }

    fn write_size(&self, _: &Schema, inst: &dyn Instance, value: &Value) -> Option<usize> {
        if let Some(contents) = self.contents(value) {
            let len = contents.len();
            return Some(if self.has_length(inst) {
                varint::size(len as u64) + len
            } else {
                len
            });
        }
        let integer = self.integer(value)?;
        Some(match self {
            NativeType::Uint8 => 1,
            _ if inst.is_static() => self.width(),
            _ => varint::size(integer),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use paste::paste;

    /// A bare instance for exercising native encodings without a schema.
    struct Bare {
        length: u64,
        max_length: u64,
        is_static: bool,
    }

    impl Bare {
        fn dynamic() -> Self {
            Self {
                length: 0,
                max_length: 0,
                is_static: false,
            }
        }

        fn fixed() -> Self {
            Self {
                is_static: true,
                ..Self::dynamic()
            }
        }

        fn bounded(length: u64, max_length: u64) -> Self {
            Self {
                length,
                max_length,
                is_static: false,
            }
        }
    }

    impl Instance for Bare {
        fn qual_name(&self) -> String {
            "Test.Field".to_string()
        }
        fn value_type(&self) -> &str {
            "native"
        }
        fn length(&self) -> u64 {
            self.length
        }
        fn max_length(&self) -> u64 {
            self.max_length
        }
        fn is_static(&self) -> bool {
            self.is_static
        }
        fn is_boxed(&self) -> bool {
            false
        }
        fn has_length(&self, _: &Schema) -> bool {
            false
        }
    }

    fn encode(native: NativeType, inst: &Bare, value: &Value) -> Result<Bytes, Error> {
        let schema = Schema::default();
        let mut buf = BytesMut::new();
        native.write(&schema, inst, value, &mut buf)?;
        assert_eq!(native.write_size(&schema, inst, value), Some(buf.len()));
        Ok(buf.freeze())
    }

    fn decode(native: NativeType, inst: &Bare, data: &[u8]) -> Result<Value, Error> {
        let mut cursor = data;
        let value = native.read(&Schema::default(), inst, &mut cursor)?;
        assert!(cursor.is_empty());
        Ok(value)
    }

    macro_rules! impl_native_test {
        ($type:ty, $native:ident) => {
            paste! {
                #[test]
                fn [<test_ $type>]() {
                    let native = NativeType::$native;
                    let width = std::mem::size_of::<$type>();
                    assert_eq!(native.width(), width);
                    let values: [$type; 4] = [0, 1, 42, <$type>::MAX];
                    for value in values {
                        let value = Value::$native(value);

                        // Fixed width
                        let encoded = encode(native, &Bare::fixed(), &value).unwrap();
                        assert_eq!(encoded.len(), width);
                        assert_eq!(decode(native, &Bare::fixed(), &encoded).unwrap(), value);

                        // Varint (uint8 stays a raw byte)
                        let expected = if width == 1 {
                            1
                        } else {
                            varint::size(value.as_u64().unwrap())
                        };
                        let encoded = encode(native, &Bare::dynamic(), &value).unwrap();
                        assert_eq!(encoded.len(), expected);
                        assert_eq!(decode(native, &Bare::dynamic(), &encoded).unwrap(), value);
                    }

                    let schema = Schema::default();
                    assert_eq!(native.minimum_size(&schema, &Bare::fixed()), width);
                    assert_eq!(native.minimum_size(&schema, &Bare::dynamic()), 1);
                }
            }
        };
    }
    impl_native_test!(u8, Uint8);
    impl_native_test!(u16, Uint16);
    impl_native_test!(u32, Uint32);
    impl_native_test!(u64, Uint64);

    #[test]
    fn test_little_endian() {
        let encoded = encode(NativeType::Uint16, &Bare::fixed(), &Value::Uint16(0x0102)).unwrap();
        assert_eq!(encoded.as_ref(), &[0x02, 0x01]);

        let encoded =
            encode(NativeType::Uint32, &Bare::fixed(), &Value::Uint32(0x01020304)).unwrap();
        assert_eq!(encoded.as_ref(), &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_varint_too_large() {
        let encoded = varint::encode(u64::from(u16::MAX) + 1);
        assert_eq!(
            decode(NativeType::Uint16, &Bare::dynamic(), &encoded),
            Err(Error::TooLarge(u64::from(u16::MAX) + 1, 16))
        );
    }

    #[test]
    fn test_static_short_read() {
        assert_eq!(
            decode(NativeType::Uint32, &Bare::fixed(), &[1, 2, 3]),
            Err(Error::ShortRead)
        );
    }

    #[test]
    fn test_fixed_bytes() {
        let inst = Bare::bounded(4, 0);
        let value = Value::from(vec![1u8, 2, 3, 4]);
        let encoded = encode(NativeType::Bytes, &inst, &value).unwrap();
        assert_eq!(encoded.as_ref(), &[1, 2, 3, 4]);
        assert_eq!(decode(NativeType::Bytes, &inst, &encoded).unwrap(), value);
        assert_eq!(NativeType::Bytes.minimum_size(&Schema::default(), &inst), 4);

        assert_eq!(
            encode(NativeType::Bytes, &inst, &Value::from(vec![1u8, 2, 3])),
            Err(Error::FixedLength {
                found: 3,
                expected: 4
            })
        );
    }

    #[test]
    fn test_bounded_bytes() {
        let inst = Bare::bounded(0, 3);
        let value = Value::from(vec![7u8, 8, 9]);
        let encoded = encode(NativeType::Bytes, &inst, &value).unwrap();
        assert_eq!(encoded.as_ref(), &[3, 7, 8, 9]);
        assert_eq!(decode(NativeType::Bytes, &inst, &encoded).unwrap(), value);

        assert_eq!(
            encode(NativeType::Bytes, &inst, &Value::from(vec![0u8; 4])),
            Err(Error::TooMany(4, 3))
        );
        assert_eq!(
            decode(NativeType::Bytes, &inst, &[4, 0, 0, 0, 0]),
            Err(Error::TooMany(4, 3))
        );
        assert_eq!(
            decode(NativeType::Bytes, &inst, &[3, 0]),
            Err(Error::ShortRead)
        );
    }

    #[test]
    fn test_string() {
        let inst = Bare::bounded(0, 16);
        let value = Value::from("ranger");
        let encoded = encode(NativeType::String, &inst, &value).unwrap();
        assert_eq!(encoded[0], 6);
        assert_eq!(decode(NativeType::String, &inst, &encoded).unwrap(), value);
        assert_eq!(
            decode(NativeType::String, &inst, &[2, 0xC3, 0x28]),
            Err(Error::InvalidUtf8)
        );
    }

    #[test]
    fn test_short_write() {
        let schema = Schema::default();
        let mut storage = [0u8; 3];
        let mut buf = &mut storage[..];
        assert_eq!(
            NativeType::Uint32.write(&schema, &Bare::fixed(), &Value::Uint32(1), &mut buf),
            Err(Error::ShortWrite)
        );

        let mut buf = &mut storage[..];
        assert_eq!(
            NativeType::Bytes.write(
                &schema,
                &Bare::bounded(0, 8),
                &Value::from(vec![0u8; 3]),
                &mut buf
            ),
            Err(Error::ShortWrite)
        );
    }

    #[test]
    fn test_unexpected_value() {
        assert!(matches!(
            encode(NativeType::Uint16, &Bare::fixed(), &Value::Uint32(1)),
            Err(Error::UnexpectedValue { .. })
        ));
        assert!(matches!(
            encode(NativeType::String, &Bare::dynamic(), &Value::from(vec![1u8])),
            Err(Error::UnexpectedValue { .. })
        ));
        assert_eq!(
            NativeType::Uint8.write_size(&Schema::default(), &Bare::fixed(), &Value::Uint16(1)),
            None
        );
    }

    #[test]
    fn test_from_u64() {
        assert_eq!(NativeType::Uint8.from_u64(255), Ok(Value::Uint8(255)));
        assert_eq!(NativeType::Uint8.from_u64(256), Err(Error::TooLarge(256, 8)));
        assert_eq!(NativeType::Uint64.from_u64(u64::MAX), Ok(Value::Uint64(u64::MAX)));
    }

    #[test]
    fn test_names() {
        for native in [
            NativeType::Uint8,
            NativeType::Uint16,
            NativeType::Uint32,
            NativeType::Uint64,
            NativeType::Bytes,
            NativeType::String,
        ] {
            assert_eq!(NativeType::from_name(native.name()), Some(native));
        }
        assert_eq!(NativeType::from_name("bytes"), Some(NativeType::Bytes));
        assert_eq!(NativeType::from_name("int32"), None);
    }
}
