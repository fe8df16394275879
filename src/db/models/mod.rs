pub mod attempt;
pub mod round;
pub mod sample;
pub mod session;
pub mod summary;

pub use attempt::{
    Attempt, AttemptFeatures, BasicFeatures, Click, EnrichedAttempt, FeatureSet, Fitts,
    Kinematics, Spatial, Target, Timing,
};
pub use round::Round;
pub use sample::PointerSample;
pub use session::{Session, SessionInput};
pub use summary::{
    FeatureMap, RoundCounts, RoundFeatures, RoundSummary, SessionLabel, SessionSummary,
    TrainingPage, TrainingQuery,
};
