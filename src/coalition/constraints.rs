use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::coalition::CoalitionError;
use crate::party::PartyName;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub enum Exclusion {
    Party(PartyName),
    Pair(PartyName, PartyName),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Inclusion(pub PartyName, pub PartyName);

impl Exclusion {
    pub fn is_violated_by(&self, members: &BTreeSet<&str>) -> bool {
        match self {
            Self::Party(name) => members.contains(name.as_str()),
            Self::Pair(a, b) => members.contains(a.as_str()) && members.contains(b.as_str()),
        }
    }
}

impl Inclusion {
    pub fn is_violated_by(&self, members: &BTreeSet<&str>) -> bool {
        members.contains(self.0.as_str()) != members.contains(self.1.as_str())
    }

    pub fn names(&self) -> [&PartyName; 2] {
        [&self.0, &self.1]
    }
}

fn parse_names(raw: &[String]) -> Result<Vec<PartyName>, CoalitionError> {
    raw.iter()
        .map(|name| PartyName::new(name.as_str()).map_err(CoalitionError::from))
        .collect()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(|piece| piece.trim().to_string()).collect()
}

impl TryFrom<Vec<String>> for Exclusion {
    type Error = CoalitionError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        let mut names = parse_names(&value)?;
        match names.len() {
            1 => Ok(Self::Party(names.remove(0))),
            2 => {
                let b = names.remove(1);
                let a = names.remove(0);
                Ok(Self::Pair(a, b))
            }
            n => Err(CoalitionError::ConstraintArity {
                kind: "exclusion",
                expected: "1 or 2",
                got: n,
            }),
        }
    }
}

impl From<Exclusion> for Vec<String> {
    fn from(value: Exclusion) -> Self {
        match value {
            Exclusion::Party(name) => vec![name.into()],
            Exclusion::Pair(a, b) => vec![a.into(), b.into()],
        }
    }
}

impl TryFrom<Vec<String>> for Inclusion {
    type Error = CoalitionError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        let mut names = parse_names(&value)?;
        if names.len() != 2 {
            return Err(CoalitionError::ConstraintArity {
                kind: "inclusion",
                expected: "2",
                got: names.len(),
            });
        }
        let b = names.remove(1);
        let a = names.remove(0);
        Ok(Self(a, b))
    }
}

impl From<Inclusion> for Vec<String> {
    fn from(value: Inclusion) -> Self {
        vec![value.0.into(), value.1.into()]
    }
}

/// Accepts `NAME` or `NAME,NAME`.
impl FromStr for Exclusion {
    type Err = CoalitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(split_list(s))
    }
}

impl FromStr for Inclusion {
    type Err = CoalitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(split_list(s))
    }
}

impl Display for Exclusion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Party(name) => write!(f, "not {name}"),
            Self::Pair(a, b) => write!(f, "not {a} with {b}"),
        }
    }
}

impl Display for Inclusion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} together with {}", self.0, self.1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default)]
    pub exclusions: BTreeSet<Exclusion>,
    #[serde(default)]
    pub inclusions: BTreeSet<Inclusion>,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(mut self, exclusion: Exclusion) -> Self {
        self.exclusions.insert(exclusion);
        self
    }

    pub fn include(mut self, inclusion: Inclusion) -> Self {
        self.inclusions.insert(inclusion);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.exclusions.is_empty() && self.inclusions.is_empty()
    }

    pub fn excludes(&self, members: &BTreeSet<&str>) -> bool {
        self.exclusions.iter().any(|e| e.is_violated_by(members))
    }

    pub fn violates_inclusions(&self, members: &BTreeSet<&str>) -> bool {
        self.inclusions.iter().any(|i| i.is_violated_by(members))
    }

    pub fn admits(&self, members: &BTreeSet<&str>) -> bool {
        !self.excludes(members) && !self.violates_inclusions(members)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{Constraints, Exclusion, Inclusion};
    use crate::coalition::CoalitionError;

    fn members<'a>(names: &[&'a str]) -> BTreeSet<&'a str> {
        names.iter().copied().collect()
    }

    #[test]
    fn parses_single_and_pair_exclusions() {
        let single: Exclusion = "PVV".parse().expect("valid exclusion");
        assert!(matches!(single, Exclusion::Party(ref n) if n.as_str() == "PVV"));

        let pair: Exclusion = "VVD, GL".parse().expect("valid exclusion");
        assert!(matches!(pair, Exclusion::Pair(ref a, ref b) if a.as_str() == "VVD" && b.as_str() == "GL"));

        assert!(matches!(
            "A,B,C".parse::<Exclusion>(),
            Err(CoalitionError::ConstraintArity { got: 3, .. })
        ));
        assert!("A,".parse::<Exclusion>().is_err());
    }

    #[test]
    fn inclusions_require_exactly_two_names() {
        assert!("CDA,CU".parse::<Inclusion>().is_ok());
        assert!("CDA".parse::<Inclusion>().is_err());
    }

    #[test]
    fn exclusions_match_single_parties_and_pairs() {
        let constraints = Constraints::new()
            .exclude("PVV".parse().expect("valid"))
            .exclude("VVD,GL".parse().expect("valid"));
        assert!(constraints.excludes(&members(&["PVV", "CDA"])));
        assert!(constraints.excludes(&members(&["VVD", "GL", "D66"])));
        assert!(!constraints.excludes(&members(&["VVD", "D66"])));
    }

    #[test]
    fn inclusions_require_both_or_neither() {
        let constraints = Constraints::new().include("CDA,CU".parse().expect("valid"));
        assert!(!constraints.violates_inclusions(&members(&["CDA", "CU", "VVD"])));
        assert!(!constraints.violates_inclusions(&members(&["VVD", "D66"])));
        assert!(constraints.violates_inclusions(&members(&["CDA", "VVD"])));
    }

    #[test]
    fn constraints_round_trip_through_json_arrays() {
        let json = r#"{"exclusions": [["PVV"], ["VVD", "GL"]], "inclusions": [["CDA", "CU"]]}"#;
        let constraints: Constraints = serde_json::from_str(json).expect("valid constraints");
        assert_eq!(constraints.exclusions.len(), 2);
        assert_eq!(constraints.inclusions.len(), 1);

        let bad = r#"{"exclusions": [["A", "B", "C"]]}"#;
        assert!(serde_json::from_str::<Constraints>(bad).is_err());
    }
}
