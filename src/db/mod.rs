pub mod buckets;
pub mod connection;
pub mod helpers;
mod migrations;
pub mod models;
pub mod repositories;

pub use connection::Database;
pub use models::*;
pub use repositories::buckets::{AppendOutcome, BucketInfo};

/// Raised by store writes that reference a session the registry does not know.
#[derive(Debug, thiserror::Error)]
#[error("session {0} does not exist")]
pub struct UnknownSession(pub String);
