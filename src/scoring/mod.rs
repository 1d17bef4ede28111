pub mod hull;

use thiserror::Error;

use crate::party::{Party, PartyName, Position};
use crate::scoring::hull::{convex_hull, distinct_points, polygon_area};

pub const MAX_DISTANCE: f64 = 2.0 * std::f64::consts::SQRT_2;
pub const MAX_AREA: f64 = 4.0;
pub const PARTY_COUNT_DECAY: f64 = 0.98;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoreError {
    #[error("cannot score an empty coalition")]
    Empty,
    #[error("party {0} has a non-finite position")]
    NonFinitePosition(PartyName),
}

pub fn compatibility(parties: &[Party]) -> Result<f64, ScoreError> {
    if let Some(bad) = parties.iter().find(|p| !p.position.is_finite()) {
        return Err(ScoreError::NonFinitePosition(bad.name.clone()));
    }
    let positions = parties.iter().map(|p| p.position).collect::<Vec<_>>();
    score_positions(&positions)
}

pub fn score_positions(positions: &[Position]) -> Result<f64, ScoreError> {
    match positions {
        [] => Err(ScoreError::Empty),
        [_] => Ok(100.0),
        [a, b] => Ok(round_tenth(
            (1.0 - a.distance_to(b) / MAX_DISTANCE) * 100.0,
        )),
        _ => Ok(score_many(positions)),
    }
}

fn score_many(positions: &[Position]) -> f64 {
    let penalty = party_count_penalty(positions.len());
    if distinct_points(positions).len() <= 2 {
        let spread = bounding_diagonal(positions);
        return round_tenth((1.0 - spread / MAX_DISTANCE) * 100.0 * penalty);
    }

    let area = polygon_area(&convex_hull(positions));
    let base = (1.0 - area / MAX_AREA) * 100.0;
    round_tenth((base * penalty).max(0.0))
}

pub fn party_count_penalty(party_count: usize) -> f64 {
    let extra = party_count.saturating_sub(2);
    PARTY_COUNT_DECAY.powi(i32::try_from(extra).unwrap_or(i32::MAX))
}

fn bounding_diagonal(positions: &[Position]) -> f64 {
    let (mut min_e, mut max_e) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_s, mut max_s) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in positions {
        min_e = min_e.min(p.economic);
        max_e = max_e.max(p.economic);
        min_s = min_s.min(p.social);
        max_s = max_s.max(p.social);
    }
    (max_e - min_e).hypot(max_s - min_s)
}

/// Nearest tenth of the exact binary value, exact ties away from zero.
pub fn round_tenth(value: f64) -> f64 {
    let magnitude = value.abs();
    let scaled = magnitude * 10.0;
    // exact residue of the multiplication
    let residue = magnitude.mul_add(10.0, -scaled);
    let floor = scaled.floor();
    let fraction = scaled - floor;
    let round_up = if fraction == 0.5 {
        residue >= 0.0
    } else {
        fraction > 0.5
    };
    let rounded = if round_up { floor + 1.0 } else { floor };
    (rounded / 10.0).copysign(value)
}
