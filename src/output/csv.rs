use anyhow::Result;

use crate::coalition::summary::CoalitionSummary;
use crate::party::Party;
use crate::polls::PollListing;

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn polls_to_csv(polls: &[PollListing]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["label", "parties", "total_seats"])?;
    for poll in polls {
        writer.write_record([
            poll.label.clone(),
            poll.parties.to_string(),
            poll.total_seats.to_string(),
        ])?;
    }
    finish(writer)
}

pub fn parties_to_csv(parties: &[Party]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["name", "seats", "economic", "social"])?;
    for party in parties {
        writer.write_record([
            party.name.to_string(),
            party.seats.to_string(),
            format!("{:.2}", party.economic()),
            format!("{:.2}", party.social()),
        ])?;
    }
    finish(writer)
}

pub fn coalitions_to_csv(coalitions: &[CoalitionSummary]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "parties",
        "seats",
        "compatibility",
        "avg_economic",
        "avg_social",
    ])?;
    for coalition in coalitions {
        writer.write_record([
            coalition.parties.join("+"),
            coalition.seats.to_string(),
            format!("{:.1}", coalition.compatibility),
            format!("{:.3}", coalition.avg_economic),
            format!("{:.3}", coalition.avg_social),
        ])?;
    }
    finish(writer)
}

#[cfg(test)]
mod tests {
    use super::{coalitions_to_csv, parties_to_csv};
    use crate::coalition::summary::CoalitionSummary;
    use crate::party::{Party, Position};

    #[test]
    fn parties_are_written_with_positions() {
        let parties = vec![Party::new("GL-PvdA", 25)
            .expect("valid party")
            .with_position(Position::new(-0.65, 0.75).expect("finite"))];
        let csv = parties_to_csv(&parties).expect("csv");
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("name,seats,economic,social"));
        assert_eq!(lines.next(), Some("GL-PvdA,25,-0.65,0.75"));
    }

    #[test]
    fn coalition_members_share_one_column() {
        let summary = CoalitionSummary {
            parties: vec!["PVV".to_string(), "VVD".to_string()],
            seats: 80,
            party_details: Vec::new(),
            avg_economic: 0.5,
            avg_social: -0.25,
            compatibility: 85.8,
        };
        let csv = coalitions_to_csv(&[summary]).expect("csv");
        assert_eq!(csv.lines().nth(1), Some("PVV+VVD,80,85.8,0.500,-0.250"));
    }
}
