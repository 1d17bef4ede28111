use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::info;

use crate::coalition::context::CoalitionContext;
use crate::config::Config;
use crate::polls::source::{HttpPollSource, PollSource};
use crate::polls::PollSet;
use crate::positions::store::PositionStore;

pub struct Session {
    source: Arc<dyn PollSource>,
    store: PositionStore,
    legislature_size: u32,
    majority_threshold: u32,
    polls: Option<PollSet>,
    context: Option<CoalitionContext>,
}

impl Session {
    pub fn new(
        source: Arc<dyn PollSource>,
        store: PositionStore,
        legislature_size: u32,
        majority_threshold: u32,
    ) -> Self {
        Self {
            source,
            store,
            legislature_size,
            majority_threshold,
            polls: None,
            context: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let source = HttpPollSource::new(config.source.url.clone(), config.source_timeout())?;
        Ok(Self::new(
            Arc::new(source),
            config.position_store(),
            config.legislature.total_seats,
            config.legislature.majority_threshold,
        ))
    }

    pub fn store(&self) -> &PositionStore {
        &self.store
    }

    pub async fn polls(&mut self) -> Result<&PollSet> {
        if self.polls.is_none() {
            self.refresh_polls().await?;
        }
        self.polls
            .as_ref()
            .ok_or_else(|| anyhow!("no polls fetched from {}", self.source.name()))
    }

    pub async fn refresh_polls(&mut self) -> Result<&PollSet> {
        let set = self.source.fetch().await?;
        info!("loaded {} polls from {}", set.polls.len(), set.source);
        Ok(self.polls.insert(set))
    }

    pub async fn initialize(&mut self, label: Option<&str>) -> Result<&mut CoalitionContext> {
        let legislature_size = self.legislature_size;
        let parties = self.polls().await?.select(label, legislature_size)?;
        let context =
            CoalitionContext::with_store(parties, self.majority_threshold, self.store.clone())?;
        info!(
            "coalition context initialized from {} with {} parties ({} seats)",
            label.unwrap_or("first poll"),
            context.parties().len(),
            context.total_seats()
        );
        Ok(self.context.insert(context))
    }

    pub fn context(&self) -> Result<&CoalitionContext> {
        self.context.as_ref().ok_or_else(not_initialized)
    }

    pub fn context_mut(&mut self) -> Result<&mut CoalitionContext> {
        self.context.as_mut().ok_or_else(not_initialized)
    }
}

fn not_initialized() -> anyhow::Error {
    anyhow!("no poll loaded; initialize the session first")
}
