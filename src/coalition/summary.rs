use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coalition::enumerate::Candidate;
use crate::scoring::{compatibility, ScoreError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeatShare {
    pub name: String,
    pub seats: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoalitionSummary {
    pub parties: Vec<String>,
    pub seats: u32,
    pub party_details: Vec<SeatShare>,
    pub avg_economic: f64,
    pub avg_social: f64,
    pub compatibility: f64,
}

pub fn summarize(candidate: &Candidate) -> Result<CoalitionSummary, ScoreError> {
    let compatibility = compatibility(&candidate.parties)?;
    let count = candidate.parties.len() as f64;
    let avg_economic = candidate.parties.iter().map(|p| p.economic()).sum::<f64>() / count;
    let avg_social = candidate.parties.iter().map(|p| p.social()).sum::<f64>() / count;

    Ok(CoalitionSummary {
        parties: candidate
            .parties
            .iter()
            .map(|p| p.name.to_string())
            .collect(),
        seats: candidate.total_seats,
        party_details: candidate
            .parties
            .iter()
            .map(|p| SeatShare {
                name: p.name.to_string(),
                seats: p.seats,
            })
            .collect(),
        avg_economic,
        avg_social,
        compatibility,
    })
}

pub fn summarize_all(candidates: &[Candidate]) -> Result<Vec<CoalitionSummary>, ScoreError> {
    candidates.iter().map(summarize).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    #[default]
    Compatibility,
    Seats,
}

impl Display for RankBy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compatibility => write!(f, "compatibility"),
            Self::Seats => write!(f, "seats"),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown ranking: {0} (expected compatibility or seats)")]
pub struct RankByParseError(pub String);

impl FromStr for RankBy {
    type Err = RankByParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compatibility" | "compat" | "score" => Ok(Self::Compatibility),
            "seats" | "size" => Ok(Self::Seats),
            _ => Err(RankByParseError(s.to_string())),
        }
    }
}

pub fn rank(summaries: &mut [CoalitionSummary], by: RankBy) {
    if by == RankBy::Compatibility {
        summaries.sort_by(|a, b| b.compatibility.total_cmp(&a.compatibility));
    }
}

#[cfg(test)]
mod tests {
    use super::{rank, summarize, CoalitionSummary, RankBy};
    use crate::coalition::enumerate::Candidate;
    use crate::party::{Party, Position};

    fn party(name: &str, seats: u32, economic: f64, social: f64) -> Party {
        Party::new(name, seats)
            .expect("valid party")
            .with_position(Position::new(economic, social).expect("finite"))
    }

    fn summary(name: &str, compatibility: f64) -> CoalitionSummary {
        CoalitionSummary {
            parties: vec![name.to_string()],
            seats: 80,
            party_details: Vec::new(),
            avg_economic: 0.0,
            avg_social: 0.0,
            compatibility,
        }
    }

    #[test]
    fn summary_reports_means_and_score() {
        let candidate = Candidate {
            parties: vec![party("A", 50, -0.5, 0.5), party("B", 30, 0.5, -0.5)],
            total_seats: 80,
        };
        let summary = summarize(&candidate).expect("scorable");
        assert_eq!(summary.parties, vec!["A", "B"]);
        assert_eq!(summary.seats, 80);
        assert_eq!(summary.party_details[1].seats, 30);
        assert!(summary.avg_economic.abs() < 1e-12);
        assert!(summary.avg_social.abs() < 1e-12);
        assert_eq!(summary.compatibility, 50.0);
    }

    #[test]
    fn compatibility_ranking_is_stable() {
        let mut summaries = vec![summary("x", 40.0), summary("y", 90.0), summary("z", 40.0)];
        rank(&mut summaries, RankBy::Compatibility);
        let order = summaries
            .iter()
            .map(|s| s.parties[0].as_str())
            .collect::<Vec<_>>();
        assert_eq!(order, vec!["y", "x", "z"]);
    }

    #[test]
    fn seat_ranking_keeps_enumeration_order() {
        let mut summaries = vec![summary("x", 40.0), summary("y", 90.0)];
        rank(&mut summaries, RankBy::Seats);
        assert_eq!(summaries[0].parties[0], "x");
    }

    #[test]
    fn parses_ranking_names() {
        assert_eq!("Seats".parse::<RankBy>().expect("valid"), RankBy::Seats);
        assert!("votes".parse::<RankBy>().is_err());
    }
}
