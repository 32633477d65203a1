pub mod connection;
pub mod entities;
pub mod repo;

pub use connection::connect;
