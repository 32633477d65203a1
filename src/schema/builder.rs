//! Turns raw entity shapes into the validated descriptor catalog.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use super::descriptor::{EntityDescriptor, FieldConstraints, FieldDescriptor, StorageKind};
use super::error::SchemaError;
use super::shape::{EntityShape, FieldShape, ScalarShape, ShapeMarker};

const FOREIGN_ID_LEN: u32 = 36;

/// Process-wide catalog of entity descriptors, built once at startup and
/// read-only afterwards.
#[derive(Debug, Default)]
pub struct SchemaCatalog {
    descriptors: Vec<Arc<EntityDescriptor>>,
    by_name: HashMap<String, usize>,
}

impl SchemaCatalog {
    /// Validates every shape and caches one descriptor per entity, in
    /// registration order. Descriptors only depend on their own shape, so the
    /// order entities are handed in never changes any single descriptor, and
    /// rebuilding from the same shapes is idempotent.
    pub fn build(shapes: Vec<EntityShape>) -> Result<Self, SchemaError> {
        let mut catalog = Self::default();
        for shape in &shapes {
            let descriptor = build_descriptor(shape)?;
            if catalog.by_name.contains_key(&descriptor.name) {
                return Err(SchemaError::DuplicateEntity {
                    entity: descriptor.name,
                });
            }
            catalog
                .by_name
                .insert(descriptor.name.clone(), catalog.descriptors.len());
            catalog.descriptors.push(Arc::new(descriptor));
        }
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<Arc<EntityDescriptor>> {
        self.by_name
            .get(name)
            .map(|&index| Arc::clone(&self.descriptors[index]))
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> &[Arc<EntityDescriptor>] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

fn build_descriptor(shape: &EntityShape) -> Result<EntityDescriptor, SchemaError> {
    let mut base_markers = 0usize;
    let mut required_capabilities = BTreeSet::new();
    for marker in &shape.markers {
        match marker {
            ShapeMarker::BaseModel => base_markers += 1,
            ShapeMarker::RequiresCapability(name) => {
                required_capabilities.insert(name.clone());
            }
        }
    }
    match base_markers {
        0 => {
            return Err(SchemaError::MissingBaseModel {
                entity: shape.name.clone(),
            });
        }
        1 => {}
        _ => {
            return Err(SchemaError::DuplicateBaseModel {
                entity: shape.name.clone(),
            });
        }
    }

    let base_fields = base_field_descriptors();
    let mut seen: HashSet<String> = base_fields
        .iter()
        .map(|field| field.name.clone())
        .collect();

    let mut fields = Vec::with_capacity(shape.fields.len());
    for field in &shape.fields {
        if !seen.insert(field.name.clone()) {
            return Err(SchemaError::DuplicateField {
                entity: shape.name.clone(),
                field: field.name.clone(),
            });
        }
        let storage = storage_kind(&shape.name, field)?;
        // Fields without their own capability annotation inherit the
        // entity-level set, materialized here so later passes never have to
        // walk back up to the entity.
        let field_capabilities = if field.requires.is_empty() {
            required_capabilities.clone()
        } else {
            field.requires.iter().cloned().collect()
        };
        fields.push(FieldDescriptor {
            name: field.name.clone(),
            storage,
            constraints: FieldConstraints {
                nullable: field.nullable,
                unique: field.unique,
                indexed: field.indexed,
                max_length: field.max_len.or(field.fixed_len),
            },
            required_capabilities: field_capabilities,
        });
    }

    Ok(EntityDescriptor {
        name: shape.name.clone(),
        table: shape.table.clone(),
        base_fields,
        fields,
        required_capabilities,
    })
}

/// The columns injected by the base model marker. Base fields never carry
/// capability requirements.
fn base_field_descriptors() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor {
            name: "id".to_string(),
            storage: StorageKind::ForeignId,
            constraints: FieldConstraints {
                unique: true,
                ..FieldConstraints::default()
            },
            required_capabilities: BTreeSet::new(),
        },
        FieldDescriptor {
            name: "created_at".to_string(),
            storage: StorageKind::Timestamp,
            constraints: FieldConstraints::default(),
            required_capabilities: BTreeSet::new(),
        },
        FieldDescriptor {
            name: "updated_at".to_string(),
            storage: StorageKind::Timestamp,
            constraints: FieldConstraints::default(),
            required_capabilities: BTreeSet::new(),
        },
        FieldDescriptor {
            name: "deleted_at".to_string(),
            storage: StorageKind::Timestamp,
            constraints: FieldConstraints {
                nullable: true,
                indexed: true,
                ..FieldConstraints::default()
            },
            required_capabilities: BTreeSet::new(),
        },
    ]
}

fn storage_kind(entity: &str, field: &FieldShape) -> Result<StorageKind, SchemaError> {
    match &field.scalar {
        ScalarShape::Uuid => Ok(StorageKind::ForeignId),
        ScalarShape::Str => Ok(match field.fixed_len {
            Some(FOREIGN_ID_LEN) => StorageKind::ForeignId,
            Some(_) => StorageKind::FixedString,
            None if field.text => StorageKind::Text,
            None => StorageKind::String,
        }),
        ScalarShape::Int => Ok(StorageKind::Integer),
        ScalarShape::Bool => Ok(StorageKind::Boolean),
        ScalarShape::DateTime => Ok(StorageKind::Timestamp),
        ScalarShape::Bytes => Ok(StorageKind::Binary),
        ScalarShape::Json => Err(unmapped(entity, field, "json")),
        ScalarShape::Unsupported(declared) => Err(unmapped(entity, field, declared)),
    }
}

fn unmapped(entity: &str, field: &FieldShape, declared: &str) -> SchemaError {
    SchemaError::UnmappedFieldType {
        entity: entity.to_string(),
        field: field.name.clone(),
        declared: declared.to_string(),
    }
}
