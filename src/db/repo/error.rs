use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Db(#[from] DbErr),

    #[error("{entity} not found")]
    NotFound { entity: String },

    /// A single-record lookup matched more than one live row.
    #[error("{entity} lookup matched more than one record")]
    Ambiguous { entity: String },

    #[error("access to {entity} requires capability '{capability}'")]
    Forbidden { entity: String, capability: String },

    #[error("{entity} update requires an id")]
    MissingId { entity: String },

    #[error("invalid pagination: page={page} page_size={page_size}")]
    InvalidPagination { page: u64, page_size: u64 },
}

pub type RepoResult<T> = Result<T, RepoError>;
