use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::party::{Party, PartyName};
use crate::polls::Poll;

pub const LEGISLATURE_SIZE: u32 = 150;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AverageError {
    #[error("no polls to average")]
    NoPolls,
    #[error("poll {0} lists no parties")]
    EmptyPoll(String),
    #[error("poll {poll} lists {party} more than once")]
    DuplicateParty { poll: String, party: PartyName },
    #[error("poll means floor to {floors} seats; {total} cannot be reached by largest remainder over {parties} parties")]
    Unapportionable {
        floors: u64,
        total: u32,
        parties: usize,
    },
    #[error("apportioned {actual} seats instead of {expected}")]
    TotalMismatch { expected: u32, actual: u32 },
}

#[derive(Debug, Clone, PartialEq)]
struct Quota {
    name: PartyName,
    mean: f64,
    floor: u32,
    remainder: f64,
}

pub fn mean_seats(polls: &[Poll]) -> Result<BTreeMap<PartyName, f64>, AverageError> {
    if polls.is_empty() {
        return Err(AverageError::NoPolls);
    }
    let mut observed: BTreeMap<PartyName, Vec<u32>> = BTreeMap::new();
    for poll in polls {
        if poll.parties.is_empty() {
            return Err(AverageError::EmptyPoll(poll.label.clone()));
        }
        let mut in_poll = std::collections::BTreeSet::new();
        for party in &poll.parties {
            if !in_poll.insert(&party.name) {
                return Err(AverageError::DuplicateParty {
                    poll: poll.label.clone(),
                    party: party.name.clone(),
                });
            }
            observed
                .entry(party.name.clone())
                .or_default()
                .push(party.seats);
        }
    }

    Ok(observed
        .into_iter()
        .map(|(name, seats)| {
            let sum = seats.iter().map(|s| f64::from(*s)).sum::<f64>();
            (name, sum / seats.len() as f64)
        })
        .collect())
}

pub fn average_polls(polls: &[Poll], total_seats: u32) -> Result<Vec<Party>, AverageError> {
    let means = mean_seats(polls)?;
    let mut quotas = means
        .into_iter()
        .map(|(name, mean)| {
            let floor = mean.floor();
            Quota {
                name,
                mean,
                floor: floor as u32,
                remainder: mean - floor,
            }
        })
        .collect::<Vec<_>>();

    let floors = quotas.iter().map(|q| u64::from(q.floor)).sum::<u64>();
    let leftover = u64::from(total_seats)
        .checked_sub(floors)
        .filter(|left| *left <= quotas.len() as u64)
        .ok_or(AverageError::Unapportionable {
            floors,
            total: total_seats,
            parties: quotas.len(),
        })?;
    debug!("floors give {floors} seats, {leftover} go to largest remainders");

    // Quotas are in name order already, so a stable sort keeps names
    // ascending among equal remainders.
    let mut by_remainder = (0..quotas.len()).collect::<Vec<_>>();
    by_remainder.sort_by(|a, b| quotas[*b].remainder.total_cmp(&quotas[*a].remainder));
    for idx in by_remainder.into_iter().take(leftover as usize) {
        quotas[idx].floor += 1;
    }

    let mut result = quotas
        .into_iter()
        .filter(|q| q.floor > 0)
        .map(|q| {
            debug_assert!((f64::from(q.floor) - q.mean).abs() < 1.0);
            Party {
                name: q.name,
                seats: q.floor,
                position: Default::default(),
                selected: false,
            }
        })
        .collect::<Vec<_>>();
    result.sort_by(|a, b| b.seats.cmp(&a.seats));

    let actual = result.iter().map(|p| p.seats).sum::<u32>();
    debug_assert_eq!(actual, total_seats);
    if actual != total_seats {
        return Err(AverageError::TotalMismatch {
            expected: total_seats,
            actual,
        });
    }
    Ok(result)
}
