//! Load-time validation and derivation of per-type metadata.

use super::{
    Document, Error, FieldDef, FieldDocument, InterfaceDef, InterfaceDocument, Schema, StructDef,
    Structure, StructureType,
};
use crate::{
    algorithm::Algorithm,
    instance::{FieldInstance, Instance, ItemInstance},
    native::NativeType,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Builds a [Schema] from a document, rejecting any definition the type algorithms cannot
/// encode.
pub(super) fn build(document: Document) -> Result<Schema, Error> {
    if document.max_byte_range == 0 {
        return Err(Error::ZeroMaxByteRange);
    }

    let mut types = BTreeMap::new();
    for (name, entries) in document.types {
        let mut fields: Vec<FieldDef> = Vec::new();
        for entry in entries.unwrap_or_default() {
            if entry.len() != 1 {
                return Err(Error::MalformedField(name.clone()));
            }
            let Some((field_name, field)) = entry.into_iter().next() else {
                return Err(Error::MalformedField(name.clone()));
            };
            if fields.iter().any(|f| f.name == field_name) {
                return Err(Error::DuplicateField(format!("{name}.{field_name}")));
            }
            fields.push(field_def(&name, field_name, field)?);
        }
        types.insert(
            name.clone(),
            StructDef {
                name,
                fields,
                min_size: 0,
            },
        );
    }

    let mut schema = Schema {
        package: document.package,
        comment: document.comment,
        max_byte_range: document.max_byte_range,
        types,
    };
    for def in schema.types.values() {
        for field in &def.fields {
            check_field(&schema, def, field)?;
        }
    }
    finalize(&mut schema)?;

    info!(
        package = schema.package.as_str(),
        types = schema.types.len(),
        "loaded schema"
    );
    Ok(schema)
}

fn field_def(owner: &str, name: String, doc: FieldDocument) -> Result<FieldDef, Error> {
    let qual_name = format!("{owner}.{name}");
    let structure = match doc.structure_type {
        StructureType::Struct => Structure::Scalar,
        StructureType::Array => Structure::Array,
    };
    if doc.value_type.starts_with("[]") && NativeType::from_name(&doc.value_type).is_none() {
        return Err(Error::NestedArray(qual_name));
    }
    let interface = match doc.interface {
        Some(interface) => Some(interface_def(&qual_name, structure, interface)?),
        None => None,
    };

    Ok(FieldDef {
        owner: owner.to_string(),
        native: NativeType::from_name(&doc.value_type),
        name,
        structure,
        value_type: doc.value_type,
        require: doc.require.into(),
        item_require: doc.item_require.map(Into::into),
        interface,
        length_of: doc.matches.map(|m| m.length_of_field),
        marshal: doc.marshal.unwrap_or(true),
        embedded: doc.inline_struct,
        comment: doc.comment,
    })
}

fn interface_def(
    qual_name: &str,
    structure: Structure,
    doc: InterfaceDocument,
) -> Result<InterfaceDef, Error> {
    if structure == Structure::Array {
        return Err(Error::InterfaceArray(qual_name.to_string()));
    }
    let input = NativeType::from_name(&doc.input)
        .filter(NativeType::is_integer)
        .ok_or_else(|| Error::InvalidInterfaceInput(qual_name.to_string(), doc.input.clone()))?;

    let mut cases: Vec<(u64, String)> = Vec::new();
    for (discriminant, type_name) in doc.cases.into_iter().flatten() {
        if input.bits() < u64::BITS && discriminant >> input.bits() != 0 {
            return Err(Error::DiscriminantTooLarge(
                qual_name.to_string(),
                discriminant,
                input.name().to_string(),
            ));
        }
        if cases.iter().any(|(d, _)| *d == discriminant) {
            return Err(Error::DuplicateDiscriminant(
                qual_name.to_string(),
                discriminant,
            ));
        }
        if cases.iter().any(|(_, t)| *t == type_name) {
            return Err(Error::DuplicateCase(qual_name.to_string(), type_name));
        }
        cases.push((discriminant, type_name));
    }
    if cases.is_empty() {
        return Err(Error::EmptyInterface(qual_name.to_string()));
    }

    Ok(InterfaceDef {
        output: doc.output,
        input,
        cases,
    })
}

fn check_field(schema: &Schema, def: &StructDef, field: &FieldDef) -> Result<(), Error> {
    let qual_name = field.qual_name();

    if let Some(interface) = &field.interface {
        for (_, case) in &interface.cases {
            if !schema.types.contains_key(case) {
                return Err(Error::UnknownCase(qual_name, case.clone()));
            }
        }
        return Ok(());
    }

    if field.native.is_none() && !schema.types.contains_key(&field.value_type) {
        return Err(Error::UnknownType(qual_name, field.value_type.clone()));
    }
    if field.structure == Structure::Array && field.embedded {
        return Err(Error::EmbeddedArray(qual_name));
    }
    let is_integer = field.native.is_some_and(|n| n.is_integer());
    let item_require = field.item_require.unwrap_or_default();
    if (field.require.is_static || item_require.is_static) && !is_integer {
        return Err(Error::StaticNotIntegral(qual_name));
    }
    if field.native == Some(NativeType::String) {
        let length = match field.structure {
            Structure::Scalar => field.require.length,
            Structure::Array => item_require.length,
        };
        if length > 0 {
            return Err(Error::FixedWidthString(qual_name));
        }
    }

    // Fields that never reach the wire need no bounds.
    if field.marshal {
        check_bounds(schema, field, &qual_name)?;
    }

    if let Some(target) = &field.length_of {
        let other = def
            .field(target)
            .ok_or_else(|| Error::UnknownMatch(qual_name.clone(), target.clone()))?;
        if !field.is_container() || !other.is_container() {
            return Err(Error::MatchNotContainer(qual_name));
        }
    }
    Ok(())
}

fn check_bounds(schema: &Schema, field: &FieldDef, qual_name: &str) -> Result<(), Error> {
    let is_bytes = field.native.is_some_and(|n| n.is_bytes());
    let (bytes_require, misplaced) = match field.structure {
        Structure::Array => {
            if !field.require.is_bounded() {
                return Err(Error::MissingLength(qual_name.to_string()));
            }
            let item_require = field.item_require.unwrap_or_default();
            if is_bytes && !item_require.is_bounded() {
                return Err(Error::MissingItemRequire(qual_name.to_string()));
            }
            (is_bytes.then_some(item_require), !is_bytes && item_require.is_bounded())
        }
        Structure::Scalar => {
            if is_bytes && !field.require.is_bounded() {
                return Err(Error::MissingLength(qual_name.to_string()));
            }
            (
                is_bytes.then_some(field.require),
                !is_bytes && field.require.is_bounded(),
            )
        }
    };

    if misplaced {
        return Err(Error::LengthOnNonContainer(qual_name.to_string()));
    }
    if let Some(require) = bytes_require {
        for bound in [require.length, require.max_length] {
            if bound > schema.max_byte_range {
                return Err(Error::ExceedsByteRange(
                    qual_name.to_string(),
                    bound,
                    schema.max_byte_range,
                ));
            }
        }
    }
    Ok(())
}

/// Rejects types that contain themselves, caches the minimum size of every type, and rejects
/// variable-count arrays of elements that encode to nothing.
///
/// A type contains another through a struct-valued scalar field (inline or not) or a
/// fixed-count array of structs. Variable-count arrays and tagged unions may be empty or
/// choose another case, so they do not count.
fn finalize(schema: &mut Schema) -> Result<(), Error> {
    let mut sizes = BTreeMap::new();
    let mut visiting = BTreeSet::new();
    for name in schema.types.keys() {
        visit(schema, name, &mut visiting, &mut sizes)?;
    }
    for (name, def) in schema.types.iter_mut() {
        def.min_size = sizes.get(name).copied().unwrap_or_default();
        debug!(name = name.as_str(), min_size = def.min_size, "resolved type");
    }

    // A decoded count is only bounded by the input when every element consumes input.
    for def in schema.types.values() {
        let empty = def.fields.iter().find(|field| {
            field.marshal
                && field.structure == Structure::Array
                && field.require.length == 0
                && field.native.is_none()
                && sizes.get(&field.value_type) == Some(&0)
        });
        if let Some(field) = empty {
            return Err(Error::ZeroSizedElements(field.qual_name()));
        }
    }
    Ok(())
}

fn visit(
    schema: &Schema,
    name: &str,
    visiting: &mut BTreeSet<String>,
    sizes: &mut BTreeMap<String, usize>,
) -> Result<usize, Error> {
    if let Some(size) = sizes.get(name) {
        return Ok(*size);
    }
    if !visiting.insert(name.to_string()) {
        return Err(Error::Recursive(name.to_string()));
    }
    let Some(def) = schema.types.get(name) else {
        return Ok(0);
    };

    let mut total = 0usize;
    for field in &def.fields {
        let contains = field.interface.is_none()
            && field.native.is_none()
            && (field.structure == Structure::Scalar || field.require.length > 0);
        let nested = if contains {
            Some(visit(schema, &field.value_type, visiting, sizes)?)
        } else {
            None
        };
        total = total.saturating_add(field_minimum(schema, field, nested));
    }

    visiting.remove(name);
    sizes.insert(name.to_string(), total);
    Ok(total)
}

fn field_minimum(schema: &Schema, field: &FieldDef, nested: Option<usize>) -> usize {
    if !field.marshal {
        return 0;
    }
    if let Some(interface) = &field.interface {
        return interface.input.width();
    }
    let element = |inst: &dyn Instance| match field.native {
        Some(native) => native.minimum_size(schema, inst),
        None => nested.unwrap_or(0),
    };
    match field.structure {
        Structure::Scalar => element(&FieldInstance::new(field)),
        Structure::Array if field.require.length == 0 => 1,
        Structure::Array => usize::try_from(field.require.length)
            .unwrap_or(usize::MAX)
            .saturating_mul(element(&ItemInstance::new(field))),
    }
}
