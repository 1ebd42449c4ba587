//! # partbridge-database
//!
//! PostgreSQL connection pool and the project repository that records
//! preview keys on marketplace projects.

pub mod connection;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::project::ProjectRepository;
