//! Validated, cross-referenced representation of a schema document.
//!
//! A [Schema] is built once (see [Schema::parse] and [Schema::from_file]) and is immutable
//! afterwards. Every check that can be made without a value in hand is made at load time,
//! so the type algorithms only fail on malformed input or values.

mod document;
mod validate;

pub use document::{
    Document, FieldDocument, InterfaceDocument, MatchDocument, RequireDocument, StructureType,
};

use crate::{marshal::Object, native::NativeType, StructValue, Value};
use std::{collections::BTreeMap, path::Path};
use thiserror::Error;

/// Errors that abort loading a schema.
///
/// Field-level failures name the field as `Type.Field`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("max_byte_range must be greater than 0")]
    ZeroMaxByteRange,
    #[error("{0}: each field entry must name exactly one field")]
    MalformedField(String),
    #[error("{0}: duplicate field")]
    DuplicateField(String),
    #[error("{0}: unknown type {1}")]
    UnknownType(String, String),
    #[error("{0}: must declare a length or max_length")]
    MissingLength(String),
    #[error("{0}: elements must declare item_require with a length or max_length")]
    MissingItemRequire(String),
    #[error("{0}: static is only valid for integer types")]
    StaticNotIntegral(String),
    #[error("{0}: inline_struct cannot be used with an array")]
    EmbeddedArray(String),
    #[error("{0}: string cannot have a fixed length")]
    FixedWidthString(String),
    #[error("{0}: arrays of arrays are not supported")]
    NestedArray(String),
    #[error("{0}: contains a length but is not a container type")]
    LengthOnNonContainer(String),
    #[error("{0}: length {1} exceeds max_byte_range {2}")]
    ExceedsByteRange(String, u64, u64),
    #[error("{0}: match refers to unknown field {1}")]
    UnknownMatch(String, String),
    #[error("{0}: match requires both fields to be arrays, byte sequences, or strings")]
    MatchNotContainer(String),
    #[error("{0}: interface input must be an integer type, found {1}")]
    InvalidInterfaceInput(String, String),
    #[error("{0}: discriminant {1} does not fit in {2}")]
    DiscriminantTooLarge(String, u64, String),
    #[error("{0}: duplicate discriminant {1}")]
    DuplicateDiscriminant(String, u64),
    #[error("{0}: type {1} appears in more than one case")]
    DuplicateCase(String, String),
    #[error("{0}: case type {1} is not a declared type")]
    UnknownCase(String, String),
    #[error("{0}: interface must declare at least one case")]
    EmptyInterface(String),
    #[error("{0}: interface cannot be an array")]
    InterfaceArray(String),
    #[error("{0}: variable-count array of elements that encode to zero bytes")]
    ZeroSizedElements(String),
    #[error("{0}: type contains itself")]
    Recursive(String),
}

/// Whether a field holds one value or a sequence of values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Structure {
    Scalar,
    Array,
}

/// Length and encoding requirements of a field (or of its elements).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Require {
    /// Exact size; the encoding carries no length prefix.
    pub length: u64,
    /// Upper bound of a length-prefixed encoding.
    pub max_length: u64,
    /// Fixed-width integer encoding.
    pub is_static: bool,
}

impl Require {
    /// Returns true if either bound is declared.
    pub fn is_bounded(&self) -> bool {
        self.length > 0 || self.max_length > 0
    }
}

impl From<RequireDocument> for Require {
    fn from(doc: RequireDocument) -> Self {
        Self {
            length: doc.length,
            max_length: doc.max_length,
            is_static: doc.is_static,
        }
    }
}

/// A closed tagged union.
#[derive(Clone, Debug)]
pub struct InterfaceDef {
    output: String,
    input: NativeType,
    cases: Vec<(u64, String)>,
}

impl InterfaceDef {
    /// Accessor that yields the discriminant of a concrete value.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Integer type the discriminant is encoded as.
    pub fn input(&self) -> NativeType {
        self.input
    }

    /// Discriminant and concrete type of every case, in declaration order.
    pub fn cases(&self) -> &[(u64, String)] {
        &self.cases
    }

    /// Returns the concrete type for a discriminant.
    pub fn case(&self, discriminant: u64) -> Option<&str> {
        self.cases
            .iter()
            .find(|(d, _)| *d == discriminant)
            .map(|(_, name)| name.as_str())
    }

    /// Returns the discriminant of a concrete type.
    pub fn discriminant_of(&self, type_name: &str) -> Option<u64> {
        self.cases
            .iter()
            .find(|(_, name)| name == type_name)
            .map(|(d, _)| *d)
    }
}

/// One member of a struct.
#[derive(Clone, Debug)]
pub struct FieldDef {
    owner: String,
    name: String,
    structure: Structure,
    value_type: String,
    native: Option<NativeType>,
    require: Require,
    item_require: Option<Require>,
    interface: Option<InterfaceDef>,
    length_of: Option<String>,
    marshal: bool,
    embedded: bool,
    comment: String,
}

impl FieldDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the struct the field belongs to.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// `Type.Field`
    pub fn qual_name(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }

    pub fn structure(&self) -> Structure {
        self.structure
    }

    pub fn value_type(&self) -> &str {
        &self.value_type
    }

    /// The native type of the field (or of its elements), if it is not a struct.
    pub fn native(&self) -> Option<NativeType> {
        self.native
    }

    pub fn require(&self) -> &Require {
        &self.require
    }

    pub fn item_require(&self) -> Option<&Require> {
        self.item_require.as_ref()
    }

    pub fn interface(&self) -> Option<&InterfaceDef> {
        self.interface.as_ref()
    }

    /// Field whose length must equal this field's length.
    pub fn length_of(&self) -> Option<&str> {
        self.length_of.as_deref()
    }

    /// False if the field is omitted from the wire.
    pub fn marshal(&self) -> bool {
        self.marshal
    }

    /// True if the value is stored inline and is never unset.
    pub fn embedded(&self) -> bool {
        self.embedded
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Returns true for arrays, byte sequences, and strings.
    pub fn is_container(&self) -> bool {
        self.structure == Structure::Array || self.native.is_some_and(|n| n.is_bytes())
    }
}

/// A named, ordered sequence of fields.
#[derive(Clone, Debug)]
pub struct StructDef {
    name: String,
    fields: Vec<FieldDef>,
    min_size: usize,
}

impl StructDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in serialization order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Smallest number of bytes any encoding of this type occupies.
    pub fn min_size(&self) -> usize {
        self.min_size
    }
}

/// A resolved `value_type`.
#[derive(Clone, Copy, Debug)]
pub enum Type<'s> {
    Native(NativeType),
    Struct(&'s StructDef),
}

/// A loaded schema.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    package: String,
    comment: String,
    max_byte_range: u64,
    types: BTreeMap<String, StructDef>,
}

impl Schema {
    /// Parses and validates a YAML schema document.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let document: Document = serde_yaml::from_str(text)?;
        Self::from_document(document)
    }

    /// Reads, parses, and validates a schema file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Validates an already deserialized document.
    pub fn from_document(document: Document) -> Result<Self, Error> {
        validate::build(document)
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn max_byte_range(&self) -> u64 {
        self.max_byte_range
    }

    /// Iterates over declared types in name order.
    pub fn types(&self) -> impl Iterator<Item = &StructDef> {
        self.types.values()
    }

    pub fn struct_def(&self, name: &str) -> Option<&StructDef> {
        self.types.get(name)
    }

    /// Resolves a `value_type` to a native type or a declared struct.
    pub fn get_type(&self, name: &str) -> Option<Type<'_>> {
        NativeType::from_name(name)
            .map(Type::Native)
            .or_else(|| self.types.get(name).map(Type::Struct))
    }

    /// Returns a marshaler for a declared type, holding its zero value.
    pub fn object(&self, type_name: &str) -> Result<Object<'_>, crate::Error> {
        Object::new(self, type_name)
    }

    /// Returns the value a decoder starts from: every inline field holds its default, every
    /// independently owned field is unset.
    pub fn zero_value(&self, type_name: &str) -> Option<StructValue> {
        let def = self.types.get(type_name)?;
        let mut value = StructValue::new(type_name);
        for field in &def.fields {
            let boxed = field.structure == Structure::Scalar
                && field.native.is_none()
                && !field.embedded;
            if boxed || field.interface.is_some() {
                continue;
            }
            if let Some(default) = self.default_value(field) {
                value.set(field.name(), default);
            }
        }
        Some(value)
    }

    /// Returns the value a field takes when it is not on the wire.
    ///
    /// Integers are 0, strings are empty, fixed byte sequences are `length` zero bytes, arrays
    /// hold `length` default elements, and structs are defaulted recursively. Tagged unions
    /// have no default.
    pub fn default_value(&self, field: &FieldDef) -> Option<Value> {
        if field.interface.is_some() {
            return None;
        }
        match field.structure {
            Structure::Scalar => self.default_of(&field.value_type, field.require.length),
            Structure::Array => {
                let length = field.item_require.map_or(0, |r| r.length);
                (0..field.require.length)
                    .map(|_| self.default_of(&field.value_type, length))
                    .collect::<Option<Vec<_>>>()
                    .map(Value::Array)
            }
        }
    }

    /// Returns an instance of a declared type with every field defaulted.
    pub fn default_struct(&self, type_name: &str) -> Option<StructValue> {
        let def = self.types.get(type_name)?;
        let mut value = StructValue::new(type_name);
        for field in &def.fields {
            if let Some(default) = self.default_value(field) {
                value.set(field.name(), default);
            }
        }
        Some(value)
    }

    fn default_of(&self, type_name: &str, length: u64) -> Option<Value> {
        match self.get_type(type_name)? {
            Type::Native(native) => Some(native.zero(length)),
            Type::Struct(def) => self.default_struct(&def.name).map(Value::Struct),
        }
    }
}
