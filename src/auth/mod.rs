pub mod capability_layer;
pub mod resolver;

use serde::{Deserialize, Serialize};

pub use capability_layer::RequireCapabilityLayer;
pub use resolver::{Caller, IdentityResolver, JwtIdentityResolver, resolve_identity};

/// Wire format of the access token payload. Capability names are resolved
/// against the registry when the token is accepted; unknown names resolve to
/// nothing.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id / email
    pub exp: usize,  // expiry (unix)
    pub iat: usize,  // issued at
    pub caps: Vec<String>,
}
