use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::coalition::summary::CoalitionSummary;
use crate::party::Party;
use crate::polls::PollListing;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

fn compatibility_cell(score: f64) -> Cell {
    let cell = Cell::new(format!("{score:.1}"));
    if score >= 70.0 {
        cell.fg(Color::Green)
    } else if score >= 40.0 {
        cell.fg(Color::Yellow)
    } else {
        cell.fg(Color::Red)
    }
}

pub fn render_polls_table(polls: &[PollListing]) -> String {
    let mut table = new_table(vec!["Poll", "Parties", "Seats"]);
    for poll in polls {
        table.add_row(vec![
            poll.label.clone(),
            poll.parties.to_string(),
            poll.total_seats.to_string(),
        ]);
    }
    table.to_string()
}

pub fn render_parties_table(parties: &[Party]) -> String {
    let mut table = new_table(vec!["Party", "Seats", "Economic", "Social"]);
    for party in parties {
        let seats = if party.is_viable() {
            Cell::new(party.seats)
        } else {
            Cell::new(party.seats).fg(Color::DarkGrey)
        };
        table.add_row(Row::from(vec![
            Cell::new(party.name.as_str()),
            seats,
            Cell::new(format!("{:+.2}", party.economic())),
            Cell::new(format!("{:+.2}", party.social())),
        ]));
    }
    let total = parties.iter().map(|p| p.seats).sum::<u32>();
    format!("{table}\nTotal seats: {total}")
}

pub fn render_coalitions_table(
    coalitions: &[CoalitionSummary],
    majority_threshold: u32,
) -> String {
    let mut table = new_table(vec![
        "Rank",
        "Coalition",
        "Seats",
        "Compatibility",
        "Avg Economic",
        "Avg Social",
    ]);
    for (idx, coalition) in coalitions.iter().enumerate() {
        let seats = if coalition.seats >= majority_threshold {
            Cell::new(coalition.seats).fg(Color::Green)
        } else {
            Cell::new(coalition.seats)
        };
        let members = coalition
            .party_details
            .iter()
            .map(|share| format!("{} ({})", share.name, share.seats))
            .collect::<Vec<_>>()
            .join(" + ");
        table.add_row(Row::from(vec![
            Cell::new(idx + 1),
            Cell::new(members),
            seats,
            compatibility_cell(coalition.compatibility),
            Cell::new(format!("{:+.2}", coalition.avg_economic)),
            Cell::new(format!("{:+.2}", coalition.avg_social)),
        ]));
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::{render_coalitions_table, render_parties_table};
    use crate::coalition::summary::{CoalitionSummary, SeatShare};
    use crate::party::Party;

    #[test]
    fn parties_table_reports_total() {
        let parties = vec![
            Party::new("PVV", 37).expect("valid party"),
            Party::new("VVD", 24).expect("valid party"),
        ];
        let rendered = render_parties_table(&parties);
        assert!(rendered.contains("PVV"));
        assert!(rendered.ends_with("Total seats: 61"));
    }

    #[test]
    fn coalitions_table_lists_members_with_seats() {
        let summary = CoalitionSummary {
            parties: vec!["PVV".to_string(), "VVD".to_string()],
            seats: 80,
            party_details: vec![
                SeatShare {
                    name: "PVV".to_string(),
                    seats: 50,
                },
                SeatShare {
                    name: "VVD".to_string(),
                    seats: 30,
                },
            ],
            avg_economic: 0.5,
            avg_social: -0.25,
            compatibility: 85.8,
        };
        let rendered = render_coalitions_table(&[summary], 76);
        assert!(rendered.contains("PVV (50) + VVD (30)"));
        assert!(rendered.contains("85.8"));
    }
}
