//! Validated entity descriptors produced by the builder.

use std::collections::BTreeSet;

/// The names injected into every base-managed entity. Only the repository
/// writes these columns.
pub const BASE_FIELD_NAMES: [&str; 4] = ["id", "created_at", "updated_at", "deleted_at"];

pub fn is_base_field(name: &str) -> bool {
    BASE_FIELD_NAMES.contains(&name)
}

/// Closed set of storage-level column kinds. Declared scalars map onto these
/// through the builder's fixed table; client types map off them through the
/// projector's fixed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// Bounded varchar.
    String,
    /// 64-bit integer.
    Integer,
    Timestamp,
    /// Fixed-length string without identifier semantics.
    FixedString,
    /// 36-char identifier (uuids land here).
    ForeignId,
    /// Unbounded text.
    Text,
    Boolean,
    /// Raw bytes; persistable but has no client-type mapping.
    Binary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldConstraints {
    pub nullable: bool,
    pub unique: bool,
    pub indexed: bool,
    pub max_length: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub storage: StorageKind,
    pub constraints: FieldConstraints,
    /// Capabilities required to read or write this field. Populated at build
    /// time: fields without their own annotation inherit the entity-level set.
    pub required_capabilities: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub name: String,
    pub table: String,
    /// Always present, always first: id, created_at, updated_at, deleted_at.
    pub base_fields: Vec<FieldDescriptor>,
    /// Declared fields, in declaration order.
    pub fields: Vec<FieldDescriptor>,
    pub required_capabilities: BTreeSet<String>,
}

impl EntityDescriptor {
    /// Base fields followed by declared fields.
    pub fn all_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.base_fields.iter().chain(self.fields.iter())
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.all_fields().find(|field| field.name == name)
    }
}
