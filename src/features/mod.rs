pub mod config;
pub mod extractor;
pub mod kinematics;
pub mod overshoot;
pub mod stats;

pub use config::ExtractionConfig;
pub use extractor::{AttemptWindow, ExtractionError, FeatureExtractor};
