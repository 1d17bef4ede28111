use crate::party::{PartyName, Position};
use crate::positions::PositionTable;

// (name, economic, social): economic runs left (-1) to right (1),
// social runs conservative (-1) to progressive (1).
const DEFAULT_POSITIONS: [(&str, f64, f64); 19] = [
    ("PVV", 0.3, -0.8),
    ("VVD", 0.7, 0.3),
    ("CDA", 0.2, -0.4),
    ("D66", -0.1, 0.8),
    ("GL", -0.7, 0.9),
    ("PvdA", -0.6, 0.6),
    ("SP", -0.8, -0.1),
    ("PvdD", -0.5, 0.7),
    ("CU", -0.1, -0.6),
    ("SGP", 0.1, -0.9),
    ("DENK", -0.4, -0.3),
    ("FvD", 0.5, -0.7),
    ("JA21", 0.6, -0.2),
    ("Volt", -0.2, 0.9),
    ("BBB", 0.4, -0.2),
    ("NSC", 0.3, 0.1),
    ("BVNL", 0.8, -0.5),
    ("Lijst Pim Fortuyn", 0.4, -0.4),
    ("OSF", -0.3, 0.4),
];

pub fn default_positions() -> PositionTable {
    DEFAULT_POSITIONS
        .iter()
        .filter_map(|(name, economic, social)| {
            let name = PartyName::new(*name).ok()?;
            let position = Position::new(*economic, *social).ok()?;
            Some((name, position))
        })
        .collect()
}
