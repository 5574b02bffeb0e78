//! The marshaling contract shared by every type.

use crate::{schema::StructDef, Error, Schema, StructValue};
use bytes::{Bytes, BytesMut};

/// Trait for types with a deterministic, size-exact binary encoding.
///
/// Implementors provide [Marshaler::size], [Marshaler::marshal_to], and
/// [Marshaler::unmarshal_from]. The allocating and whole-buffer variants are provided.
pub trait Marshaler {
    /// Returns the exact number of bytes [Marshaler::marshal_to] writes.
    ///
    /// Returns `0` if the value cannot be encoded (for example, a required field is unset).
    fn size(&self) -> usize;

    /// Encodes the value at the start of `buf`, returning the number of bytes written.
    ///
    /// Returns [Error::ShortWrite] if `buf` is too small.
    fn marshal_to(&self, buf: &mut [u8]) -> Result<usize, Error>;

    /// Decodes a value from the start of `buf`, returning the number of bytes consumed.
    ///
    /// On failure, the current value is left unchanged.
    fn unmarshal_from(&mut self, buf: &[u8]) -> Result<usize, Error>;

    /// Encodes the value into a buffer of exactly [Marshaler::size] bytes.
    ///
    /// (Provided method).
    fn marshal(&self) -> Result<Bytes, Error> {
        let expected = self.size();
        let mut buf = BytesMut::zeroed(expected);
        let written = self.marshal_to(&mut buf[..])?;
        if written != expected {
            return Err(Error::MarshalLength { written, expected });
        }
        Ok(buf.freeze())
    }

    /// Decodes a value that occupies all of `buf`.
    ///
    /// (Provided method).
    fn unmarshal(&mut self, buf: &[u8]) -> Result<(), Error> {
        let consumed = self.unmarshal_from(buf)?;
        if consumed < buf.len() {
            return Err(Error::LeftOverBytes(buf.len() - consumed));
        }
        Ok(())
    }
}

/// An instance of a schema type that can be marshaled.
#[derive(Clone, Debug)]
pub struct Object<'s> {
    schema: &'s Schema,
    def: &'s StructDef,
    value: StructValue,
}

impl<'s> Object<'s> {
    /// Creates an object holding the zero value of `type_name`.
    pub fn new(schema: &'s Schema, type_name: &str) -> Result<Self, Error> {
        let def = schema
            .struct_def(type_name)
            .ok_or_else(|| Error::UnknownType(type_name.to_string()))?;
        let value = schema
            .zero_value(type_name)
            .unwrap_or_else(|| StructValue::new(type_name));
        Ok(Self { schema, def, value })
    }

    /// Creates an object holding `value`, whose type must be declared.
    pub fn with_value(schema: &'s Schema, value: StructValue) -> Result<Self, Error> {
        let def = schema
            .struct_def(value.type_name())
            .ok_or_else(|| Error::UnknownType(value.type_name().to_string()))?;
        Ok(Self { schema, def, value })
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub fn def(&self) -> &'s StructDef {
        self.def
    }

    pub fn value(&self) -> &StructValue {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut StructValue {
        &mut self.value
    }

    pub fn into_value(self) -> StructValue {
        self.value
    }
}

impl Marshaler for Object<'_> {
    fn size(&self) -> usize {
        self.def
            .struct_size(self.schema, &self.value)
            .unwrap_or_default()
    }

    fn marshal_to(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let total = buf.len();
        let mut cursor = buf;
        self.def.write_struct(self.schema, &self.value, &mut cursor)?;
        Ok(total - cursor.len())
    }

    fn unmarshal_from(&mut self, buf: &[u8]) -> Result<usize, Error> {
        let mut cursor = buf;
        self.value = self.def.read_struct(self.schema, &mut cursor)?;
        Ok(buf.len() - cursor.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;
    use bytes::{Buf, BufMut};

    const SCHEMA: &str = r#"
max_byte_range: 16
types:
  Pair:
    - Left:
        value_type: uint16
    - Right:
        value_type: "[]byte"
        require: { max_length: 4 }
"#;

    fn pair() -> StructValue {
        StructValue::new("Pair")
            .with("Left", 300u16)
            .with("Right", vec![9u8, 8])
    }

    #[test]
    fn test_marshal_unmarshal() {
        let schema = Schema::parse(SCHEMA).unwrap();
        let obj = Object::with_value(&schema, pair()).unwrap();
        assert_eq!(obj.size(), 5);
        let encoded = obj.marshal().unwrap();
        assert_eq!(encoded.as_ref(), &[0xAC, 0x02, 0x02, 9, 8]);

        let mut decoded = schema.object("Pair").unwrap();
        decoded.unmarshal(&encoded).unwrap();
        assert_eq!(decoded.into_value(), pair());
    }

    #[test]
    fn test_marshal_to_reports_written() {
        let schema = Schema::parse(SCHEMA).unwrap();
        let obj = Object::with_value(&schema, pair()).unwrap();
        let mut buf = [0xFFu8; 8];
        assert_eq!(obj.marshal_to(&mut buf), Ok(5));
        assert_eq!(&buf[5..], &[0xFF; 3]);
        assert_eq!(obj.marshal_to(&mut buf[..4]), Err(Error::ShortWrite.context("Pair.Right")));
    }

    #[test]
    fn test_unmarshal_from_reports_consumed() {
        let schema = Schema::parse(SCHEMA).unwrap();
        let mut obj = schema.object("Pair").unwrap();
        assert_eq!(obj.unmarshal_from(&[1, 0, 7]), Ok(2));
        assert_eq!(obj.value().get("Left"), Some(&Value::Uint16(1)));
        assert_eq!(
            obj.unmarshal(&[1, 0, 7]),
            Err(Error::LeftOverBytes(1))
        );
    }

    #[test]
    fn test_failed_unmarshal_keeps_value() {
        let schema = Schema::parse(SCHEMA).unwrap();
        let mut obj = Object::with_value(&schema, pair()).unwrap();
        assert!(obj.unmarshal(&[1, 3, 0]).is_err());
        assert_eq!(obj.value(), &pair());
    }

    #[test]
    fn test_unknown_type() {
        let schema = Schema::parse(SCHEMA).unwrap();
        assert_eq!(
            schema.object("Missing").unwrap_err(),
            Error::UnknownType("Missing".to_string())
        );
        assert!(Object::with_value(&schema, StructValue::new("Missing")).is_err());
    }

    /// A hand-written type whose size disagrees with what it writes.
    struct Liar(u32);

    impl Marshaler for Liar {
        fn size(&self) -> usize {
            8
        }

        fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize, Error> {
            if buf.len() < 4 {
                return Err(Error::ShortWrite);
            }
            buf.put_u32_le(self.0);
            Ok(4)
        }

        fn unmarshal_from(&mut self, mut buf: &[u8]) -> Result<usize, Error> {
            if buf.remaining() < 4 {
                return Err(Error::ShortRead);
            }
            self.0 = buf.get_u32_le();
            Ok(4)
        }
    }

    #[test]
    fn test_marshal_length() {
        assert_eq!(
            Liar(1).marshal(),
            Err(Error::MarshalLength {
                written: 4,
                expected: 8
            })
        );

        let mut liar = Liar(0);
        liar.unmarshal(&[1, 0, 0, 0]).unwrap();
        assert_eq!(liar.0, 1);
        assert_eq!(liar.unmarshal(&[1, 0]), Err(Error::ShortRead));
    }
}
