pub mod constraints;
pub mod context;
pub mod enumerate;
pub mod summary;

use thiserror::Error;

use crate::party::PartyError;
use crate::scoring::ScoreError;

pub const DEFAULT_MAJORITY_THRESHOLD: u32 = 76;

#[derive(Debug, Error)]
pub enum CoalitionError {
    #[error(transparent)]
    Party(#[from] PartyError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error("invalid coalition size bounds: min {min_size}, max {max_size}")]
    InvalidBounds { min_size: usize, max_size: usize },
    #[error("{kind} constraint takes {expected} party names, got {got}")]
    ConstraintArity {
        kind: &'static str,
        expected: &'static str,
        got: usize,
    },
    #[error("unknown party: {0}")]
    UnknownParty(String),
}

pub fn majority_of(total_seats: u32) -> u32 {
    total_seats / 2 + 1
}
