use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use crate::polls::parse::parse_polls;
use crate::polls::{Poll, PollSet};

pub const DEFAULT_SOURCE_URL: &str = "https://www.peilingennederland.nl/alle-peilingen.html";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 6;

#[async_trait]
pub trait PollSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self) -> Result<PollSet>;
}

#[derive(Debug, Clone)]
pub struct HttpPollSource {
    url: String,
    client: Client,
}

impl HttpPollSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("coalition-builder/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS).min(timeout))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_text(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("failed GET request: {}", self.url))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed reading response body: {}", self.url))?;
        if !status.is_success() {
            let preview: String = body.chars().take(180).collect();
            return Err(anyhow!("GET {} returned {status}: {preview}", self.url));
        }
        Ok(body)
    }
}

#[async_trait]
impl PollSource for HttpPollSource {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<PollSet> {
        let html = self.fetch_text().await?;
        let polls =
            parse_polls(&html).with_context(|| format!("no polls found at {}", self.url))?;
        info!("fetched {} polls from {}", polls.len(), self.url);
        Ok(PollSet::new(self.url.clone(), polls))
    }
}

/// Fixed polls, for offline use and tests.
#[derive(Debug, Clone)]
pub struct StaticPollSource {
    name: String,
    polls: Vec<Poll>,
}

impl StaticPollSource {
    pub fn new(name: impl Into<String>, polls: Vec<Poll>) -> Self {
        Self {
            name: name.into(),
            polls,
        }
    }

    pub fn from_html(name: impl Into<String>, html: &str) -> Result<Self> {
        Ok(Self::new(name, parse_polls(html)?))
    }
}

#[async_trait]
impl PollSource for StaticPollSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<PollSet> {
        if self.polls.is_empty() {
            return Err(anyhow!("{} holds no polls", self.name));
        }
        Ok(PollSet::new(self.name.clone(), self.polls.clone()))
    }
}
