//! Views of a field definition in the context it is marshaled in.
//!
//! The same [FieldDef] is encoded differently depending on whether it is a struct member
//! ([FieldInstance]) or one element of an array ([ItemInstance]). A tagged-union field is
//! additionally viewed through [Discriminant] when its tag is read or written.

use crate::{
    schema::{FieldDef, InterfaceDef, Require, Structure, Type},
    Error, Schema, StructValue, Value,
};

/// A field definition as seen by the type algorithms.
pub trait Instance {
    /// Name used in diagnostics (`Type.Field`).
    fn qual_name(&self) -> String;

    /// Name of the native or struct type being encoded.
    fn value_type(&self) -> &str;

    /// Exact length in bytes (byte sequences) or elements (arrays). Zero if variable.
    fn length(&self) -> u64;

    /// Upper bound for variable-length encodings.
    fn max_length(&self) -> u64;

    /// True if integers use their fixed-width encoding.
    fn is_static(&self) -> bool;

    /// True if the value is independently owned and may be unset.
    fn is_boxed(&self) -> bool;

    /// True if the encoding starts with a varint length prefix.
    fn has_length(&self, schema: &Schema) -> bool;
}

/// A field used directly as a struct member.
#[derive(Clone, Copy, Debug)]
pub struct FieldInstance<'a> {
    field: &'a FieldDef,
}

impl<'a> FieldInstance<'a> {
    pub fn new(field: &'a FieldDef) -> Self {
        Self { field }
    }

    pub fn field(&self) -> &'a FieldDef {
        self.field
    }

    /// Reads the member from the struct (the read/write symbol of a struct member).
    pub fn load<'v>(&self, obj: &'v StructValue) -> Option<&'v Value> {
        obj.get(self.field.name())
    }

    /// Stores a decoded member into the struct.
    pub fn store(&self, obj: &mut StructValue, value: Value) {
        obj.set(self.field.name(), value);
    }
}

impl Instance for FieldInstance<'_> {
    fn qual_name(&self) -> String {
        self.field.qual_name()
    }

    fn value_type(&self) -> &str {
        self.field.value_type()
    }

    fn length(&self) -> u64 {
        self.field.require().length
    }

    fn max_length(&self) -> u64 {
        self.field.require().max_length
    }

    fn is_static(&self) -> bool {
        self.field.require().is_static
    }

    fn is_boxed(&self) -> bool {
        !self.field.embedded()
    }

    fn has_length(&self, _: &Schema) -> bool {
        // Arrays with a fixed count are written without a prefix.
        self.field.structure() == Structure::Array && self.length() == 0
    }
}

/// One element of an array field.
///
/// Bounds come from `item_require`; the array's own `require` bounds its element count.
#[derive(Clone, Copy, Debug)]
pub struct ItemInstance<'a> {
    field: &'a FieldDef,
    index: Option<usize>,
}

impl<'a> ItemInstance<'a> {
    pub fn new(field: &'a FieldDef) -> Self {
        Self { field, index: None }
    }

    /// Returns the instance for the element at `index`, for diagnostics.
    pub fn at(self, index: usize) -> Self {
        Self {
            index: Some(index),
            ..self
        }
    }

    pub fn field(&self) -> &'a FieldDef {
        self.field
    }

    fn require(&self) -> Require {
        // Presence is checked at load time for every element type that needs bounds.
        self.field.item_require().copied().unwrap_or_default()
    }
}

impl Instance for ItemInstance<'_> {
    fn qual_name(&self) -> String {
        match self.index {
            Some(index) => format!("{}[{}]", self.field.qual_name(), index),
            None => self.field.qual_name(),
        }
    }

    fn value_type(&self) -> &str {
        self.field.value_type()
    }

    fn length(&self) -> u64 {
        self.require().length
    }

    fn max_length(&self) -> u64 {
        self.require().max_length
    }

    fn is_static(&self) -> bool {
        self.require().is_static || self.field.require().is_static
    }

    fn is_boxed(&self) -> bool {
        true
    }

    fn has_length(&self, schema: &Schema) -> bool {
        match schema.get_type(self.value_type()) {
            Some(Type::Native(native)) => native.has_length(self),
            _ => false,
        }
    }
}

/// Either view of a field, chosen by where it is consumed.
#[derive(Clone, Copy, Debug)]
pub enum MaybeItem<'a> {
    Field(FieldInstance<'a>),
    Item(ItemInstance<'a>),
}

/// Selects the view of `field`: [ItemInstance] for array elements, [FieldInstance] otherwise.
pub fn maybe_item_instance(field: &FieldDef, item: bool) -> MaybeItem<'_> {
    if item {
        MaybeItem::Item(ItemInstance::new(field))
    } else {
        MaybeItem::Field(FieldInstance::new(field))
    }
}

impl MaybeItem<'_> {
    fn inner(&self) -> &dyn Instance {
        match self {
            MaybeItem::Field(field) => field,
            MaybeItem::Item(item) => item,
        }
    }
}

impl Instance for MaybeItem<'_> {
    fn qual_name(&self) -> String {
        self.inner().qual_name()
    }

    fn value_type(&self) -> &str {
        self.inner().value_type()
    }

    fn length(&self) -> u64 {
        self.inner().length()
    }

    fn max_length(&self) -> u64 {
        self.inner().max_length()
    }

    fn is_static(&self) -> bool {
        self.inner().is_static()
    }

    fn is_boxed(&self) -> bool {
        self.inner().is_boxed()
    }

    fn has_length(&self, schema: &Schema) -> bool {
        self.inner().has_length(schema)
    }
}

/// The discriminant of a tagged-union field, encoded as the interface's `input` type.
///
/// Discriminants are always fixed-width.
#[derive(Clone, Copy)]
pub struct Discriminant<'a> {
    inner: &'a dyn Instance,
    interface: &'a InterfaceDef,
}

impl<'a> Discriminant<'a> {
    pub fn new(inner: &'a dyn Instance, interface: &'a InterfaceDef) -> Self {
        Self { inner, interface }
    }

    /// Evaluates the `output` accessor on a payload, yielding its discriminant.
    pub fn output(&self, payload: &StructValue) -> Result<u64, Error> {
        self.interface
            .discriminant_of(payload.type_name())
            .ok_or_else(|| {
                Error::BadInterface(format!(
                    "{} has no {} for {}",
                    self.interface.output(),
                    self.inner.value_type(),
                    payload.type_name()
                ))
            })
    }

    /// Resolves a decoded discriminant to the name of its concrete type.
    pub fn case(&self, discriminant: u64) -> Result<&'a str, Error> {
        self.interface
            .case(discriminant)
            .ok_or_else(|| Error::BadInterface(format!("unknown discriminant {discriminant}")))
    }
}

impl Instance for Discriminant<'_> {
    fn qual_name(&self) -> String {
        self.inner.qual_name()
    }

    fn value_type(&self) -> &str {
        self.interface.input().name()
    }

    fn length(&self) -> u64 {
        0
    }

    fn max_length(&self) -> u64 {
        0
    }

    fn is_static(&self) -> bool {
        true
    }

    fn is_boxed(&self) -> bool {
        false
    }

    fn has_length(&self, _: &Schema) -> bool {
        false
    }
}
