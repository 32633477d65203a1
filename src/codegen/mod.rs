pub mod error;
pub mod projector;
pub mod typescript;

pub use error::{GenerateError, GenerateIssue};
pub use projector::{ProjectedEntity, ProjectedField, TsType, generate};
pub use typescript::{render_typescript, write_types_file};
