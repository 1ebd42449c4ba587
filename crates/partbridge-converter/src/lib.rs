//! # PartBridge Converter
//!
//! Turns an uploaded CAD file into a PNG preview by driving an external
//! conversion job API:
//!
//! 1. resolve the caller's file reference to a bucket-relative key,
//! 2. download the source bytes from the object store,
//! 3. create an import/convert/export job, upload the source, poll until
//!    the job is terminal, and download the exported raster,
//! 4. publish the raster under a per-project key and record that key on
//!    the project.
//!
//! Every step short-circuits with a [`ConversionError`]; nothing is retried.

mod cancel;

pub mod client;
pub mod error;
pub mod fetcher;
pub mod metrics;
pub mod models;
pub mod poll;
pub mod processor;
pub mod publisher;
pub mod reference;

pub use client::JobClient;
pub use error::{ConversionError, PipelineStage};
pub use metrics::{ConversionMetrics, MetricsSnapshot};
pub use models::{ConversionOutcome, ConversionRequest, PublishedPreview};
pub use poll::PollPolicy;
pub use processor::ConversionProcessor;
pub use reference::{CanonicalStoragePath, FileReference};
