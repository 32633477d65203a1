use std::sync::Arc;

use crate::permissions::{PermissionRegistry, PermissionSet};
use crate::schema::{EntityDescriptor, FieldDescriptor, StorageKind};

use super::error::{GenerateError, GenerateIssue};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TsType {
    Number,
    String,
    Boolean,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectedField {
    pub name: String,
    pub ts_type: TsType,
    pub optional: bool,
}

/// One client-side type declaration for one entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectedEntity {
    pub name: String,
    pub fields: Vec<ProjectedField>,
}

/// Projects the descriptors visible to `export` into client type units.
///
/// An entity whose capability requirements are not all granted by `export`
/// is left out entirely rather than emitted with holes. Inside an emitted
/// entity the same rule drops individual gated fields; base fields always
/// pass. Unit order follows descriptor order and field order follows
/// declaration order, so the same inputs always produce the same output.
/// The pass collects every unmappable field before failing, so one run
/// reports the full list of offenders.
pub fn generate(
    descriptors: &[Arc<EntityDescriptor>],
    export: &PermissionSet,
    registry: &PermissionRegistry,
) -> Result<Vec<ProjectedEntity>, GenerateError> {
    let mut units = Vec::new();
    let mut issues = Vec::new();

    for descriptor in descriptors {
        if registry
            .missing_capability(export, &descriptor.required_capabilities)
            .is_some()
        {
            continue;
        }

        let mut fields = Vec::new();
        for field in &descriptor.base_fields {
            push_field(descriptor, field, &mut fields, &mut issues);
        }
        for field in &descriptor.fields {
            if registry
                .missing_capability(export, &field.required_capabilities)
                .is_some()
            {
                continue;
            }
            push_field(descriptor, field, &mut fields, &mut issues);
        }

        if fields.is_empty() {
            issues.push(GenerateIssue::EmptyEntity {
                entity: descriptor.name.clone(),
            });
            continue;
        }
        units.push(ProjectedEntity {
            name: descriptor.name.clone(),
            fields,
        });
    }

    if issues.is_empty() {
        Ok(units)
    } else {
        Err(GenerateError::new(issues))
    }
}

fn push_field(
    descriptor: &EntityDescriptor,
    field: &FieldDescriptor,
    fields: &mut Vec<ProjectedField>,
    issues: &mut Vec<GenerateIssue>,
) {
    match client_type(field.storage) {
        Some(ts_type) => fields.push(ProjectedField {
            name: field.name.clone(),
            ts_type,
            optional: field.constraints.nullable,
        }),
        None => issues.push(GenerateIssue::UnmappableField {
            entity: descriptor.name.clone(),
            field: field.name.clone(),
            storage: field.storage,
        }),
    }
}

/// Fixed storage-to-client mapping. Binary columns have no client
/// representation and fail generation instead of degrading to an untyped
/// field.
fn client_type(storage: StorageKind) -> Option<TsType> {
    match storage {
        StorageKind::Integer => Some(TsType::Number),
        StorageKind::Boolean => Some(TsType::Boolean),
        StorageKind::String
        | StorageKind::FixedString
        | StorageKind::Text
        | StorageKind::ForeignId
        | StorageKind::Timestamp => Some(TsType::String),
        StorageKind::Binary => None,
    }
}
