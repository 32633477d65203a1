use thiserror::Error;

/// Configuration faults raised while describing entities or registering
/// capabilities. All of these are fatal at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("capability already registered: {name}")]
    DuplicateCapability { name: String },
    #[error("entity {entity} is missing the base model marker")]
    MissingBaseModel { entity: String },
    #[error("entity {entity} declares the base model marker more than once")]
    DuplicateBaseModel { entity: String },
    #[error("entity already described: {entity}")]
    DuplicateEntity { entity: String },
    #[error("duplicate field {field} on entity {entity}")]
    DuplicateField { entity: String, field: String },
    #[error("field {entity}.{field} has no storage mapping for {declared}")]
    UnmappedFieldType {
        entity: String,
        field: String,
        declared: String,
    },
    #[error("no descriptor registered for entity {entity}")]
    UnknownEntity { entity: String },
}
