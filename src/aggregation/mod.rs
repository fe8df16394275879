//! Round and session aggregation over stored attempts.
//!
//! The pure roll-ups live in [`round`] and [`session`]; the loaders here read
//! whatever enriched attempts have landed so far.

pub mod commands;
pub mod round;
pub mod session;

use anyhow::Result;

use crate::db::{Database, FeatureMap, Round, RoundFeatures};

pub use round::round_features;
pub use session::session_features;

pub async fn load_round_features(
    db: &Database,
    session_id: &str,
    round: Round,
) -> Result<Option<RoundFeatures>> {
    let attempts = db.get_attempts(session_id, Some(round)).await?;
    Ok(round_features(&attempts))
}

pub async fn load_session_features(db: &Database, session_id: &str) -> Result<FeatureMap> {
    let mut rounds = Vec::with_capacity(3);
    for round in Round::all() {
        rounds.push((round, load_round_features(db, session_id, round).await?));
    }
    Ok(session_features(&rounds))
}
