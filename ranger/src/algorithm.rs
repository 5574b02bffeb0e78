//! Read, write, and size algorithms for every schema type.
//!
//! Natives are implemented in [crate::native]. This module implements structs: fields are
//! encoded in declaration order, arrays as a varint count (omitted when the count is fixed)
//! followed by each element, and tagged unions as a fixed-width discriminant immediately
//! followed by the payload's own encoding.

use crate::{
    instance::{Discriminant, FieldInstance, Instance, ItemInstance},
    schema::{FieldDef, InterfaceDef, StructDef, Structure, Type},
    varint, Error, Schema, StructValue, Value,
};
use bytes::{Buf, BufMut};

/// Deepest struct nesting accepted when decoding.
///
/// Types may refer to themselves through tagged unions and variable-count arrays, so the
/// nesting of a decoded value is otherwise bounded only by the input.
pub const MAX_DEPTH: usize = 64;

/// Encoding of a type, parameterized by the instance it is used as.
pub trait Algorithm {
    /// Returns the smallest number of bytes any encoding occupies.
    fn minimum_size(&self, schema: &Schema, inst: &dyn Instance) -> usize;

    /// Decodes a value from the buffer.
    fn read(&self, schema: &Schema, inst: &dyn Instance, buf: &mut impl Buf)
        -> Result<Value, Error>;

    /// Encodes a value into the buffer, checking remaining capacity before every write.
    fn write(
        &self,
        schema: &Schema,
        inst: &dyn Instance,
        value: &Value,
        buf: &mut impl BufMut,
    ) -> Result<(), Error>;

    /// Returns the encoded size of a value, or `None` if it cannot be encoded (a field is
    /// unset or a value has the wrong shape).
    fn write_size(&self, schema: &Schema, inst: &dyn Instance, value: &Value) -> Option<usize>;
}

impl Algorithm for Type<'_> {
    fn minimum_size(&self, schema: &Schema, inst: &dyn Instance) -> usize {
        match self {
            Type::Native(native) => native.minimum_size(schema, inst),
            Type::Struct(def) => def.minimum_size(schema, inst),
        }
    }

    fn read(
        &self,
        schema: &Schema,
        inst: &dyn Instance,
        buf: &mut impl Buf,
    ) -> Result<Value, Error> {
        match self {
            Type::Native(native) => native.read(schema, inst, buf),
            Type::Struct(def) => def.read(schema, inst, buf),
        }
    }

    fn write(
        &self,
        schema: &Schema,
        inst: &dyn Instance,
        value: &Value,
        buf: &mut impl BufMut,
    ) -> Result<(), Error> {
        match self {
            Type::Native(native) => native.write(schema, inst, value, buf),
            Type::Struct(def) => def.write(schema, inst, value, buf),
        }
    }

    fn write_size(&self, schema: &Schema, inst: &dyn Instance, value: &Value) -> Option<usize> {
        match self {
            Type::Native(native) => native.write_size(schema, inst, value),
            Type::Struct(def) => def.write_size(schema, inst, value),
        }
    }
}

impl Algorithm for StructDef {
    fn minimum_size(&self, _: &Schema, _: &dyn Instance) -> usize {
        self.min_size()
    }

    fn read(&self, schema: &Schema, _: &dyn Instance, buf: &mut impl Buf) -> Result<Value, Error> {
        self.read_struct(schema, buf).map(Value::Struct)
    }

    fn write(
        &self,
        schema: &Schema,
        _: &dyn Instance,
        value: &Value,
        buf: &mut impl BufMut,
    ) -> Result<(), Error> {
        let Value::Struct(obj) = value else {
            return Err(Error::UnexpectedValue {
                expected: self.name().to_string(),
                found: value.kind().to_string(),
            });
        };
        self.write_struct(schema, obj, buf)
    }

    fn write_size(&self, schema: &Schema, _: &dyn Instance, value: &Value) -> Option<usize> {
        match value {
            Value::Struct(obj) => self.struct_size(schema, obj),
            _ => None,
        }
    }
}

impl StructDef {
    /// Decodes an instance of this type.
    pub fn read_struct(&self, schema: &Schema, buf: &mut impl Buf) -> Result<StructValue, Error> {
        self.read_nested(schema, buf, 0)
    }

    fn read_nested(
        &self,
        schema: &Schema,
        buf: &mut impl Buf,
        depth: usize,
    ) -> Result<StructValue, Error> {
        if depth > MAX_DEPTH {
            return Err(Error::TooDeep(MAX_DEPTH));
        }
        if buf.remaining() < self.min_size() {
            return Err(Error::ShortRead.context(self.name()));
        }
        let mut obj = StructValue::new(self.name());
        for field in self.fields() {
            if !field.marshal() {
                if let Some(default) = schema.default_value(field) {
                    obj.set(field.name(), default);
                }
                continue;
            }
            let value = read_field(schema, field, buf, depth)?;
            FieldInstance::new(field).store(&mut obj, value);
        }
        check_matches(self, &obj)?;
        Ok(obj)
    }

    /// Encodes an instance of this type.
    pub fn write_struct(
        &self,
        schema: &Schema,
        obj: &StructValue,
        buf: &mut impl BufMut,
    ) -> Result<(), Error> {
        if obj.type_name() != self.name() {
            return Err(Error::UnexpectedValue {
                expected: self.name().to_string(),
                found: obj.type_name().to_string(),
            });
        }
        check_matches(self, obj)?;
        for field in self.fields().iter().filter(|f| f.marshal()) {
            let inst = FieldInstance::new(field);
            let value = inst
                .load(obj)
                .ok_or_else(|| Error::ShortWrite.context(field.qual_name()))?;
            write_field(schema, field, value, buf)?;
        }
        Ok(())
    }

    /// Returns the encoded size of an instance of this type.
    pub fn struct_size(&self, schema: &Schema, obj: &StructValue) -> Option<usize> {
        if obj.type_name() != self.name() {
            return None;
        }
        self.fields()
            .iter()
            .filter(|f| f.marshal())
            .try_fold(0usize, |total, field| {
                let value = FieldInstance::new(field).load(obj)?;
                Some(total + field_size(schema, field, value)?)
            })
    }
}

fn resolve<'s>(schema: &'s Schema, name: &str) -> Result<Type<'s>, Error> {
    schema
        .get_type(name)
        .ok_or_else(|| Error::UnknownType(name.to_string()))
}

/// Decodes a value of `ty`, counting struct values against the nesting limit.
fn read_type(
    schema: &Schema,
    ty: &Type<'_>,
    inst: &dyn Instance,
    buf: &mut impl Buf,
    depth: usize,
) -> Result<Value, Error> {
    match ty {
        Type::Struct(def) => def.read_nested(schema, buf, depth + 1).map(Value::Struct),
        Type::Native(native) => native.read(schema, inst, buf),
    }
}

fn read_field(
    schema: &Schema,
    field: &FieldDef,
    buf: &mut impl Buf,
    depth: usize,
) -> Result<Value, Error> {
    let inst = FieldInstance::new(field);
    if let Some(interface) = field.interface() {
        return read_union(schema, &inst, interface, buf, depth)
            .map_err(|e| e.context(field.qual_name()));
    }
    match field.structure() {
        Structure::Scalar => {
            let ty = resolve(schema, field.value_type())?;
            if buf.remaining() < ty.minimum_size(schema, &inst) {
                return Err(Error::ShortRead.context(field.qual_name()));
            }
            read_type(schema, &ty, &inst, buf, depth).map_err(|e| e.context(field.qual_name()))
        }
        Structure::Array => read_array(schema, field, buf, depth),
    }
}

fn read_union(
    schema: &Schema,
    inst: &dyn Instance,
    interface: &InterfaceDef,
    buf: &mut impl Buf,
    depth: usize,
) -> Result<Value, Error> {
    let discriminant = Discriminant::new(inst, interface);
    let input = interface.input();
    let tag = input.read(schema, &discriminant, buf)?;
    let case = discriminant.case(tag.as_u64().unwrap_or_default())?;
    let def = schema
        .struct_def(case)
        .ok_or_else(|| Error::UnknownType(case.to_string()))?;
    let payload = def.read_nested(schema, buf, depth + 1)?;
    Ok(Value::Union(Box::new(payload)))
}

fn read_array(
    schema: &Schema,
    field: &FieldDef,
    buf: &mut impl Buf,
    depth: usize,
) -> Result<Value, Error> {
    let require = field.require();
    let count = match require.length {
        0 => {
            let count = varint::read(buf).map_err(|e| e.context(field.qual_name()))?;
            if count > require.max_length {
                return Err(Error::TooMany(count, require.max_length).context(field.qual_name()));
            }
            count
        }
        length => length,
    };

    let element = resolve(schema, field.value_type())?;
    let item = ItemInstance::new(field);
    let min = element.minimum_size(schema, &item);

    // Never allocate more elements than the remaining input could hold.
    let capacity = usize::try_from(count)
        .unwrap_or(usize::MAX)
        .min(buf.remaining());
    let mut items = Vec::with_capacity(capacity);
    for index in 0..count {
        let item = item.at(index as usize);
        if buf.remaining() < min {
            return Err(Error::ShortRead.context(item.qual_name()));
        }
        let value = read_type(schema, &element, &item, buf, depth)
            .map_err(|e| e.context(item.qual_name()))?;
        items.push(value);
    }
    Ok(Value::Array(items))
}

fn write_field(
    schema: &Schema,
    field: &FieldDef,
    value: &Value,
    buf: &mut impl BufMut,
) -> Result<(), Error> {
    let inst = FieldInstance::new(field);
    if let Some(interface) = field.interface() {
        return write_union(schema, &inst, interface, value, buf)
            .map_err(|e| e.context(field.qual_name()));
    }
    match field.structure() {
        Structure::Scalar => resolve(schema, field.value_type())?
            .write(schema, &inst, value, buf)
            .map_err(|e| e.context(field.qual_name())),
        Structure::Array => write_array(schema, field, value, buf),
    }
}

fn write_union(
    schema: &Schema,
    inst: &dyn Instance,
    interface: &InterfaceDef,
    value: &Value,
    buf: &mut impl BufMut,
) -> Result<(), Error> {
    let Value::Union(payload) = value else {
        return Err(Error::UnexpectedValue {
            expected: "interface".to_string(),
            found: value.kind().to_string(),
        });
    };
    let discriminant = Discriminant::new(inst, interface);
    let input = interface.input();
    let tag = input.from_u64(discriminant.output(payload)?)?;
    input.write(schema, &discriminant, &tag, buf)?;

    let def = schema
        .struct_def(payload.type_name())
        .ok_or_else(|| Error::UnknownType(payload.type_name().to_string()))?;
    def.write_struct(schema, payload, buf)
}

fn write_array(
    schema: &Schema,
    field: &FieldDef,
    value: &Value,
    buf: &mut impl BufMut,
) -> Result<(), Error> {
    let items = value.as_array().ok_or_else(|| {
        Error::UnexpectedValue {
            expected: "array".to_string(),
            found: value.kind().to_string(),
        }
        .context(field.qual_name())
    })?;

    let require = field.require();
    let count = items.len() as u64;
    if require.length > 0 {
        if count != require.length {
            return Err(Error::FixedLength {
                found: count,
                expected: require.length,
            }
            .context(field.qual_name()));
        }
    } else {
        if count > require.max_length {
            return Err(Error::TooMany(count, require.max_length).context(field.qual_name()));
        }
        if buf.remaining_mut() < varint::size(count) {
            return Err(Error::ShortWrite.context(field.qual_name()));
        }
        varint::write(count, buf);
    }

    let element = resolve(schema, field.value_type())?;
    let item = ItemInstance::new(field);
    for (index, value) in items.iter().enumerate() {
        let item = item.at(index);
        element
            .write(schema, &item, value, buf)
            .map_err(|e| e.context(item.qual_name()))?;
    }
    Ok(())
}

fn field_size(schema: &Schema, field: &FieldDef, value: &Value) -> Option<usize> {
    let inst = FieldInstance::new(field);
    if let Some(interface) = field.interface() {
        let Value::Union(payload) = value else {
            return None;
        };
        interface.discriminant_of(payload.type_name())?;
        let def = schema.struct_def(payload.type_name())?;
        return Some(interface.input().width() + def.struct_size(schema, payload)?);
    }

    let ty = schema.get_type(field.value_type())?;
    match field.structure() {
        Structure::Scalar => ty.write_size(schema, &inst, value),
        Structure::Array => {
            let items = value.as_array()?;
            let prefix = match field.require().length {
                0 => varint::size(items.len() as u64),
                _ => 0,
            };
            let item = ItemInstance::new(field);
            items.iter().try_fold(prefix, |total, value| {
                Some(total + ty.write_size(schema, &item, value)?)
            })
        }
    }
}

/// Checks every `match` constraint of a struct. Unset fields are skipped.
fn check_matches(def: &StructDef, obj: &StructValue) -> Result<(), Error> {
    for field in def.fields() {
        let Some(target) = field.length_of() else {
            continue;
        };
        let (Some(left), Some(right)) = (obj.get(field.name()), obj.get(target)) else {
            continue;
        };
        if left.len() != right.len() {
            return Err(Error::LengthMismatch(
                field.qual_name(),
                format!("{}.{}", def.name(), target),
            ));
        }
    }
    Ok(())
}
