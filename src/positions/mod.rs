pub mod defaults;
pub mod store;

use std::collections::BTreeMap;

use crate::party::{Party, PartyName, Position};

pub type PositionTable = BTreeMap<PartyName, Position>;

pub fn override_or(defaults: PositionTable, overrides: Option<PositionTable>) -> PositionTable {
    let mut merged = defaults;
    if let Some(overrides) = overrides {
        merged.extend(overrides);
    }
    merged
}

/// Parties missing from `table` keep whatever position they already have.
pub fn assign_positions(parties: &mut [Party], table: &PositionTable) {
    for party in parties.iter_mut() {
        if let Some(position) = table.get(party.name.as_str()) {
            party.position = *position;
        }
    }
}

pub fn table_from_parties(parties: &[Party]) -> PositionTable {
    parties
        .iter()
        .map(|party| (party.name.clone(), party.position))
        .collect()
}
