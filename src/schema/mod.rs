pub mod builder;
pub mod descriptor;
pub mod error;
pub mod shape;

pub use builder::SchemaCatalog;
pub use descriptor::{
    EntityDescriptor, FieldConstraints, FieldDescriptor, StorageKind, is_base_field,
};
pub use error::SchemaError;
pub use shape::{
    EntityShape, FieldShape, HasModelShape, ScalarShape, ShapeMarker, entity_name_from_module,
};
