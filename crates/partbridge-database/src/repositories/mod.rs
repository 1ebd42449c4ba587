//! Repository implementations.

pub mod project;
