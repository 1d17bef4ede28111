use tracing::{info, warn};

use crate::coalition::constraints::Constraints;
use crate::coalition::enumerate::{generate, Candidate, SearchBounds};
use crate::coalition::summary::{rank, summarize, summarize_all, CoalitionSummary, RankBy};
use crate::coalition::CoalitionError;
use crate::party::{ensure_unique_names, total_seats, Party, PartyError, PartyName};
use crate::positions::store::PositionStore;
use crate::positions::{assign_positions, table_from_parties};
use crate::scoring::compatibility;

#[derive(Debug, Clone)]
pub struct CoalitionContext {
    parties: Vec<Party>,
    majority_threshold: u32,
    store: Option<PositionStore>,
}

impl CoalitionContext {
    pub fn new(parties: Vec<Party>, majority_threshold: u32) -> Result<Self, CoalitionError> {
        ensure_unique_names(&parties)?;
        Ok(Self {
            parties,
            majority_threshold,
            store: None,
        })
    }

    pub fn with_store(
        mut parties: Vec<Party>,
        majority_threshold: u32,
        store: PositionStore,
    ) -> Result<Self, CoalitionError> {
        assign_positions(&mut parties, &store.load());
        let mut context = Self::new(parties, majority_threshold)?;
        context.store = Some(store);
        Ok(context)
    }

    pub fn parties(&self) -> &[Party] {
        &self.parties
    }

    pub fn party(&self, name: &str) -> Option<&Party> {
        self.parties.iter().find(|p| p.name.as_str() == name)
    }

    pub fn majority_threshold(&self) -> u32 {
        self.majority_threshold
    }

    pub fn total_seats(&self) -> u32 {
        total_seats(&self.parties)
    }

    pub fn coalition_seats(&self) -> u32 {
        self.parties
            .iter()
            .filter(|p| p.selected)
            .map(|p| p.seats)
            .sum()
    }

    pub fn has_majority(&self) -> bool {
        self.coalition_seats() >= self.majority_threshold
    }

    pub fn selected_parties(&self) -> Vec<&Party> {
        self.parties.iter().filter(|p| p.selected).collect()
    }

    /// Returns `false` when no party has that name.
    pub fn toggle_party(&mut self, name: &str) -> bool {
        match self.parties.iter_mut().find(|p| p.name.as_str() == name) {
            Some(party) => {
                party.selected = !party.selected;
                true
            }
            None => false,
        }
    }

    pub fn select_only<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        for party in &mut self.parties {
            party.selected = false;
        }
        let mut unknown = Vec::new();
        for name in names {
            let name = name.as_ref();
            match self.parties.iter_mut().find(|p| p.name.as_str() == name) {
                Some(party) => party.selected = true,
                None => unknown.push(name.to_string()),
            }
        }
        unknown
    }

    pub fn update_party_position(
        &mut self,
        name: &str,
        economic: f64,
        social: f64,
    ) -> Result<bool, CoalitionError> {
        let Some(party) = self.parties.iter_mut().find(|p| p.name.as_str() == name) else {
            return Ok(false);
        };
        party.set_position(economic, social)?;
        info!(
            "position of {name} set to ({:.2}, {:.2})",
            party.economic(),
            party.social()
        );
        self.persist_positions();
        Ok(true)
    }

    fn persist_positions(&self) {
        let Some(store) = &self.store else {
            return;
        };
        // Keep overrides for parties outside this poll.
        let mut table = store.read_overrides().ok().flatten().unwrap_or_default();
        table.extend(table_from_parties(&self.parties));
        if !store.save(&table) {
            warn!("position edit applied but not persisted");
        }
    }

    pub fn generate(
        &self,
        constraints: &Constraints,
        bounds: SearchBounds,
    ) -> Result<Vec<Candidate>, CoalitionError> {
        generate(&self.parties, constraints, bounds, self.majority_threshold)
    }

    pub fn ranked_coalitions(
        &self,
        constraints: &Constraints,
        bounds: SearchBounds,
        by: RankBy,
    ) -> Result<Vec<CoalitionSummary>, CoalitionError> {
        let candidates = self.generate(constraints, bounds)?;
        let mut summaries = summarize_all(&candidates)?;
        rank(&mut summaries, by);
        Ok(summaries)
    }

    pub fn score<S: AsRef<str>>(&self, names: &[S]) -> Result<f64, CoalitionError> {
        Ok(compatibility(&self.members(names)?)?)
    }

    pub fn summary_of<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<CoalitionSummary, CoalitionError> {
        let parties = self.members(names)?;
        let candidate = Candidate {
            total_seats: total_seats(&parties),
            parties,
        };
        Ok(summarize(&candidate)?)
    }

    fn members<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Party>, CoalitionError> {
        let mut members = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let party = self
                .party(name.trim())
                .ok_or_else(|| CoalitionError::UnknownParty(name.to_string()))?;
            if members.iter().any(|m: &Party| m == party) {
                return Err(PartyError::DuplicateName(PartyName::new(name)?).into());
            }
            members.push(party.clone());
        }
        Ok(members)
    }
}
