#[allow(unused_imports)]
pub mod prelude {
    pub use super::api_key::Entity as ApiKey;
    pub use super::post::Entity as Post;
    pub use super::user::Entity as User;
}

pub mod api_key;
pub mod post;
pub mod user;

use crate::schema::{EntityShape, HasModelShape};

/// Shapes of every entity, in registration order. New entities must be listed
/// here for the catalog to see them.
pub fn all_shapes() -> Vec<EntityShape> {
    vec![
        prelude::User::model_shape(),
        prelude::Post::model_shape(),
        prelude::ApiKey::model_shape(),
    ]
}
