//! Core traits defined in `partbridge-core` and implemented by other crates.

pub mod project;
pub mod storage;

pub use project::ProjectRecordStore;
pub use storage::{ObjectStore, UploadOptions};
