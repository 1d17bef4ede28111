use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::coalition::enumerate::{SearchBounds, DEFAULT_MAX_PARTIES, DEFAULT_MIN_PARTIES};
use crate::coalition::{majority_of, DEFAULT_MAJORITY_THRESHOLD};
use crate::polls::average::LEGISLATURE_SIZE;
use crate::polls::source::DEFAULT_SOURCE_URL;
use crate::positions::store::PositionStore;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub positions: PositionsConfig,
    #[serde(default)]
    pub legislature: LegislatureConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionsConfig {
    #[serde(default = "default_positions_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegislatureConfig {
    #[serde(default = "default_total_seats")]
    pub total_seats: u32,
    #[serde(default = "default_majority_threshold")]
    pub majority_threshold: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_min_parties")]
    pub min_parties: usize,
    #[serde(default = "default_max_parties")]
    pub max_parties: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source_url: Option<String>,
    pub positions_path: Option<String>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/coalition-builder/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<()> {
        let legislature = &self.legislature;
        if legislature.total_seats == 0 {
            bail!("legislature.total_seats must be positive");
        }
        if legislature.majority_threshold == 0
            || legislature.majority_threshold > legislature.total_seats
        {
            bail!(
                "legislature.majority_threshold must be within 1..={}",
                legislature.total_seats
            );
        }
        if legislature.majority_threshold < majority_of(legislature.total_seats) {
            warn!(
                "majority_threshold {} is at most half of {} seats; disjoint coalitions can both qualify",
                legislature.majority_threshold, legislature.total_seats
            );
        }
        self.search_bounds()?;
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.source_url {
            self.source.url = url;
        }
        if let Some(path) = overrides.positions_path {
            self.positions.path = path;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_positions_path(&self) -> PathBuf {
        expand_tilde(&self.positions.path)
    }

    pub fn position_store(&self) -> PositionStore {
        PositionStore::new(self.resolved_positions_path())
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_secs.max(1))
    }

    pub fn search_bounds(&self) -> Result<SearchBounds> {
        SearchBounds::new(self.search.min_parties, self.search.max_parties)
            .context("invalid [search] bounds")
    }

    pub fn default_template() -> String {
        let template = r#"[source]
url = "https://www.peilingennederland.nl/alle-peilingen.html"
timeout_secs = 12

[positions]
path = "~/.config/coalition-builder/party_positions.json"

[legislature]
total_seats = 150
majority_threshold = 76

[search]
min_parties = 1
max_parties = 6

[server]
host = "127.0.0.1"
port = 5000
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PositionsConfig {
    fn default() -> Self {
        Self {
            path: default_positions_path(),
        }
    }
}

impl Default for LegislatureConfig {
    fn default() -> Self {
        Self {
            total_seats: default_total_seats(),
            majority_threshold: default_majority_threshold(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_parties: default_min_parties(),
            max_parties: default_max_parties(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_source_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    12
}

fn default_positions_path() -> String {
    "~/.config/coalition-builder/party_positions.json".to_string()
}

fn default_total_seats() -> u32 {
    LEGISLATURE_SIZE
}

fn default_majority_threshold() -> u32 {
    DEFAULT_MAJORITY_THRESHOLD
}

fn default_min_parties() -> usize {
    DEFAULT_MIN_PARTIES
}

fn default_max_parties() -> usize {
    DEFAULT_MAX_PARTIES
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}
