//! # partbridge-core
//!
//! Core crate for the PartBridge preview service. Contains the object-store
//! and project-record traits, configuration schemas, typed identifiers,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other PartBridge crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
