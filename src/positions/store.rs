use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::party::{PartyName, Position};
use crate::positions::defaults::default_positions;
use crate::positions::{override_or, PositionTable};

#[derive(Debug, Deserialize)]
struct StoredPosition {
    economic: f64,
    social: f64,
}

/// Flat JSON file of user-edited positions, `{"NAME": {"economic": x, "social": y}}`.
#[derive(Debug, Clone)]
pub struct PositionStore {
    path: PathBuf,
}

impl PositionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> PositionTable {
        let overrides = match self.read_overrides() {
            Ok(overrides) => overrides,
            Err(err) => {
                warn!("ignoring position overrides: {err:#}");
                None
            }
        };
        override_or(default_positions(), overrides)
    }

    pub fn read_overrides(&self) -> Result<Option<PositionTable>> {
        if !self.path.exists() {
            debug!("no position overrides at {}", self.path.display());
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("failed reading positions: {}", self.path.display()))?;
        let raw: BTreeMap<String, StoredPosition> = serde_json::from_str(&data)
            .with_context(|| format!("failed parsing positions JSON: {}", self.path.display()))?;

        let mut table = PositionTable::new();
        for (name, stored) in raw {
            let name = PartyName::new(name)?;
            let position = Position::new(stored.economic, stored.social)
                .with_context(|| format!("invalid position for {name}"))?;
            table.insert(name, position);
        }
        Ok(Some(table))
    }

    pub fn save(&self, table: &PositionTable) -> bool {
        match self.try_save(table) {
            Ok(()) => true,
            Err(err) => {
                warn!("failed saving positions: {err:#}");
                false
            }
        }
    }

    pub fn try_save(&self, table: &PositionTable) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed creating positions directory: {}", parent.display())
                })?;
            }
        }
        let body = serde_json::to_string_pretty(table)?;
        fs::write(&self.path, body)
            .with_context(|| format!("failed writing positions: {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::PositionStore;
    use crate::party::{PartyName, Position};
    use crate::positions::PositionTable;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PositionStore::new(dir.path().join("absent.json"));
        let table = store.load();
        assert_eq!(table.len(), 19);
        assert!(store.read_overrides().expect("missing is not an error").is_none());
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("positions.json");
        fs::write(&path, "{ not json").expect("write");
        let store = PositionStore::new(&path);
        assert!(store.read_overrides().is_err());
        assert_eq!(store.load()["VVD"].economic, 0.7);
    }

    #[test]
    fn saved_positions_override_defaults_on_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PositionStore::new(dir.path().join("nested/positions.json"));
        let mut table = PositionTable::new();
        table.insert(
            PartyName::new("VVD").expect("valid name"),
            Position::new(0.1, -0.2).expect("finite"),
        );
        assert!(store.save(&table));

        let raw = fs::read_to_string(store.path()).expect("file written");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("valid JSON");
        assert_eq!(value["VVD"]["economic"], 0.1);

        let loaded = store.load();
        assert_eq!(loaded["VVD"].economic, 0.1);
        assert_eq!(loaded["VVD"].social, -0.2);
        assert_eq!(loaded["SP"].economic, -0.8);
    }

    #[test]
    fn out_of_range_file_values_are_clamped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("positions.json");
        fs::write(&path, r#"{"CDA": {"economic": 4.0, "social": -2.5}}"#).expect("write");
        let table = PositionStore::new(&path).load();
        assert_eq!(table["CDA"].economic, 1.0);
        assert_eq!(table["CDA"].social, -1.0);
    }
}
