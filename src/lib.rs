pub mod auth;
pub mod codegen;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod permissions;
pub mod routes;
pub mod schema;
pub mod state;
pub mod test_helpers;
