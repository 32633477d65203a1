pub mod registry;
pub mod set;

pub use registry::{Capability, PermissionRegistry};
pub use set::{CapabilityId, PermissionSet};

use crate::schema::SchemaError;

/// Capability gating administrative entities and fields.
pub const ADMIN_CAPABILITY: &str = "admin";

/// Registers the capabilities the server itself relies on. Runs once at
/// startup, before any application-level registration.
pub fn register_builtin_capabilities(registry: &PermissionRegistry) -> Result<(), SchemaError> {
    registry.register(ADMIN_CAPABILITY)?;
    Ok(())
}
