pub mod base;
pub mod base_traits;
mod context;
pub mod error;

pub use base::{PaginatedResponse, Repo, RepoScan};
pub use base_traits::{
    HasCreatedAtColumn, HasIdActiveModel, HasSoftDeleteColumn, SoftDeleteActiveModel,
    TimestampedActiveModel,
};
pub use context::RepoContext;
pub use error::{RepoError, RepoResult};
