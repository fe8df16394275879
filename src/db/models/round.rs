//! Round identifier shared by samples, attempts and summaries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three task rounds. Construction is validated so a stored
/// record can never carry an out-of-range round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Round(u8);

impl Round {
    pub const FIRST: Round = Round(1);
    pub const LAST: Round = Round(3);

    pub fn all() -> [Round; 3] {
        [Round(1), Round(2), Round(3)]
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Round {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1..=3 => Ok(Round(value)),
            other => Err(format!("round must be 1, 2 or 3 (got {other})")),
        }
    }
}

impl From<Round> for u8 {
    fn from(round: Round) -> Self {
        round.0
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
