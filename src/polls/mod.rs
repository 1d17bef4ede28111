pub mod average;
pub mod parse;
pub mod source;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::party::{total_seats, Party};
use crate::polls::average::average_polls;

pub const AVERAGE_LABEL: &str = "average";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub label: String,
    pub parties: Vec<Party>,
}

impl Poll {
    pub fn total_seats(&self) -> u32 {
        total_seats(&self.parties)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSet {
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    pub polls: Vec<Poll>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollListing {
    pub label: String,
    pub parties: usize,
    pub total_seats: u32,
}

impl PollSet {
    pub fn new(source: impl Into<String>, polls: Vec<Poll>) -> Self {
        Self {
            source: source.into(),
            fetched_at: Utc::now(),
            polls,
        }
    }

    pub fn labels(&self) -> Vec<&str> {
        self.polls.iter().map(|p| p.label.as_str()).collect()
    }

    pub fn listing(&self) -> Vec<PollListing> {
        self.polls
            .iter()
            .map(|poll| PollListing {
                label: poll.label.clone(),
                parties: poll.parties.len(),
                total_seats: poll.total_seats(),
            })
            .collect()
    }

    pub fn get(&self, label: &str) -> Option<&Poll> {
        self.polls
            .iter()
            .find(|p| p.label == label)
            .or_else(|| self.polls.iter().find(|p| p.label.eq_ignore_ascii_case(label)))
    }

    pub fn select(&self, label: Option<&str>, legislature_size: u32) -> Result<Vec<Party>> {
        match label.map(str::trim) {
            Some(label) if label.eq_ignore_ascii_case(AVERAGE_LABEL) => {
                Ok(average_polls(&self.polls, legislature_size)?)
            }
            Some(label) => self
                .get(label)
                .map(|poll| poll.parties.clone())
                .ok_or_else(|| anyhow!("unknown poll: {label} (available: {})", self.labels().join(", "))),
            None => self
                .polls
                .first()
                .map(|poll| poll.parties.clone())
                .ok_or_else(|| anyhow!("no polls found at {}", self.source)),
        }
    }
}
