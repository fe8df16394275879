pub mod commands;
mod controller;
mod error;
pub mod pipeline;
mod worker;

pub use controller::{Ack, AttemptBatch, IngestController, SampleBatch};
pub use error::IngestError;
pub use pipeline::{EnrichmentReport, FallbackReason};
