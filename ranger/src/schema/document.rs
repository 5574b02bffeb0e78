//! Serialized layout of a schema document.
//!
//! ```yaml
//! package: ledger
//! max_byte_range: 1024
//! types:
//!   TransactionOutput:
//!     - Value:
//!         value_type: uint32
//!     - ScriptPubKey:
//!         value_type: "[]byte"
//!         require:
//!           max_length: 20
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root of a schema document.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct Document {
    /// Opaque label passed through to consumers.
    #[serde(default)]
    pub package: String,
    /// Upper bound for any byte or string field.
    #[serde(default)]
    pub max_byte_range: u64,
    #[serde(default)]
    pub comment: String,
    /// Type name to fields, in serialization order. Each entry maps exactly one field name to
    /// its definition.
    #[serde(default)]
    pub types: BTreeMap<String, Option<Vec<BTreeMap<String, FieldDocument>>>>,
}

/// Shape of a field: a single value or a count-prefixed sequence.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StructureType {
    #[default]
    #[serde(alias = "scalar")]
    Struct,
    Array,
}

/// Definition of one field.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct FieldDocument {
    #[serde(default)]
    pub structure_type: StructureType,
    pub value_type: String,
    #[serde(default)]
    pub interface: Option<InterfaceDocument>,
    #[serde(default, rename = "match")]
    pub matches: Option<MatchDocument>,
    #[serde(default)]
    pub require: RequireDocument,
    #[serde(default)]
    pub item_require: Option<RequireDocument>,
    #[serde(default)]
    pub marshal: Option<bool>,
    #[serde(default)]
    pub inline_struct: bool,
    #[serde(default)]
    pub comment: String,
}

/// Length and encoding requirements of a field (or of its elements).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RequireDocument {
    #[serde(default)]
    pub length: u64,
    #[serde(default)]
    pub max_length: u64,
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

/// Tagged union carried by a field.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct InterfaceDocument {
    pub output: String,
    pub input: String,
    /// Discriminant to concrete type name, one entry per case.
    pub cases: Vec<BTreeMap<u64, String>>,
}

/// Cross-field constraint.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct MatchDocument {
    pub length_of_field: String,
}
