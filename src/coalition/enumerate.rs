use std::cmp::Reverse;
use std::collections::BTreeSet;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coalition::constraints::{Constraints, Inclusion};
use crate::coalition::CoalitionError;
use crate::party::{ensure_unique_names, total_seats, Party};

pub const DEFAULT_MIN_PARTIES: usize = 1;
pub const DEFAULT_MAX_PARTIES: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBounds {
    pub min_size: usize,
    pub max_size: usize,
}

impl Default for SearchBounds {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_PARTIES,
            max_size: DEFAULT_MAX_PARTIES,
        }
    }
}

impl SearchBounds {
    pub fn new(min_size: usize, max_size: usize) -> Result<Self, CoalitionError> {
        if min_size == 0 || min_size > max_size {
            return Err(CoalitionError::InvalidBounds { min_size, max_size });
        }
        Ok(Self { min_size, max_size })
    }
}

/// A majority-reaching party subset, members ordered by seats descending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub parties: Vec<Party>,
    pub total_seats: u32,
}

impl Candidate {
    pub fn largest_seats(&self) -> u32 {
        self.parties.first().map(|p| p.seats).unwrap_or(0)
    }

    pub fn names(&self) -> Vec<&str> {
        self.parties.iter().map(|p| p.name.as_str()).collect()
    }
}

pub fn generate(
    parties: &[Party],
    constraints: &Constraints,
    bounds: SearchBounds,
    majority_threshold: u32,
) -> Result<Vec<Candidate>, CoalitionError> {
    let bounds = SearchBounds::new(bounds.min_size, bounds.max_size)?;
    ensure_unique_names(parties)?;

    let viable = parties.iter().filter(|p| p.is_viable()).collect::<Vec<_>>();
    let inclusions = effective_inclusions(constraints, &viable);
    let effective = Constraints {
        exclusions: constraints.exclusions.clone(),
        inclusions,
    };

    let largest_size = bounds.max_size.min(viable.len());
    let mut candidates = Vec::new();
    let mut examined = 0usize;

    for size in bounds.min_size..=largest_size {
        for combo in viable.iter().copied().combinations(size) {
            examined += 1;
            let members = combo.iter().map(|p| p.name.as_str()).collect::<BTreeSet<_>>();
            if !effective.admits(&members) {
                continue;
            }
            let seats = combo.iter().map(|p| p.seats).sum::<u32>();
            if seats < majority_threshold {
                continue;
            }
            let mut ordered = combo.into_iter().cloned().collect::<Vec<_>>();
            ordered.sort_by_key(|p| Reverse(p.seats));
            debug_assert_eq!(total_seats(&ordered), seats);
            candidates.push(Candidate {
                parties: ordered,
                total_seats: seats,
            });
        }
    }

    candidates.sort_by_key(|c| Reverse((c.largest_seats(), c.total_seats)));
    debug!(
        "examined {examined} combinations of {} viable parties, {} reach {majority_threshold} seats",
        viable.len(),
        candidates.len()
    );
    Ok(candidates)
}

fn effective_inclusions(constraints: &Constraints, viable: &[&Party]) -> BTreeSet<Inclusion> {
    let viable_names = viable.iter().map(|p| p.name.as_str()).collect::<BTreeSet<_>>();
    constraints
        .inclusions
        .iter()
        .filter(|inclusion| {
            let enforceable = inclusion
                .names()
                .iter()
                .all(|name| viable_names.contains(name.as_str()));
            if !enforceable {
                debug!("ignoring inclusion ({inclusion}): a member holds no seats");
            }
            enforceable
        })
        .cloned()
        .collect()
}
