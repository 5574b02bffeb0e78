//! Marshal structured data described by a schema.
//!
//! # Overview
//!
//! A schema-driven binary serialization engine designed to:
//! - Serialize values into a deterministic, size-exact binary format
//! - Deserialize untrusted binary input, enforcing every declared bound
//!
//! Types are declared in a YAML document and loaded into a [Schema]. Every declared type can
//! then be marshaled through the [Marshaler] contract by an [Object] holding a [StructValue].
//!
//! # Supported Types
//!
//! - Integers: `uint8`, `uint16`, `uint32`, `uint64` (varint unless `static`)
//! - Byte sequences: `[]byte` and `string`, either of a fixed `length` or length-prefixed and
//!   bounded by `max_length`
//! - Nested structs and arrays of any of the above (arrays of arrays are rejected)
//! - Tagged unions ("interfaces"): a fixed-width discriminant followed by the payload
//!
//! # Example
//!
//! ```
//! use ranger::{Marshaler, Object, Schema, StructValue};
//!
//! let schema = Schema::parse(
//!     r#"
//! max_byte_range: 32
//! types:
//!   TransactionOutput:
//!     - Value:
//!         value_type: uint32
//!     - ScriptPubKey:
//!         value_type: "[]byte"
//!         require:
//!           max_length: 20
//! "#,
//! )
//! .unwrap();
//!
//! // Build a value and encode it
//! let value = StructValue::new("TransactionOutput")
//!     .with("Value", 1000u32)
//!     .with("ScriptPubKey", vec![0xABu8; 3]);
//! let obj = Object::with_value(&schema, value.clone()).unwrap();
//! let encoded = obj.marshal().unwrap();
//! assert_eq!(encoded.as_ref(), &[0xE8, 0x07, 0x03, 0xAB, 0xAB, 0xAB]);
//! assert_eq!(encoded.len(), obj.size());
//!
//! // Decode it again
//! let mut decoded = schema.object("TransactionOutput").unwrap();
//! decoded.unmarshal(&encoded).unwrap();
//! assert_eq!(decoded.value(), &value);
//! ```

pub mod algorithm;
pub mod error;
pub mod generate;
pub mod instance;
pub mod marshal;
pub mod native;
pub mod schema;
pub mod value;
pub mod varint;

// Re-export main types and traits
pub use algorithm::Algorithm;
pub use error::Error;
pub use marshal::{Marshaler, Object};
pub use native::NativeType;
pub use schema::Schema;
pub use value::{StructValue, Value};
