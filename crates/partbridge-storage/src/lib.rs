//! # partbridge-storage
//!
//! Object store implementations for PartBridge. Supports the hosted
//! storage REST API and a local filesystem layout for development.

pub mod factory;
pub mod providers;

pub use factory::build_object_store;
