use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{db::CollectionSelector, player::DEFAULT_CUE_THRESHOLD_SECS};

pub const DEFAULT_FIXED_INTERVAL_SECS: u32 = 30;

/// Final-seconds cue flagged in player snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CueSettings {
    pub enabled: bool,
    pub threshold_secs: u32,
}

impl Default for CueSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_secs: DEFAULT_CUE_THRESHOLD_SECS,
        }
    }
}

impl CueSettings {
    /// Threshold handed to the player; zero when the cue is off.
    pub fn effective_threshold(&self) -> u32 {
        if self.enabled {
            self.threshold_secs
        } else {
            0
        }
    }
}

/// Configuration the last player was started with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LastUsed {
    #[serde(with = "selector_text")]
    pub collection: CollectionSelector,
    pub shuffle: bool,
    pub fixed_interval_secs: u32,
    pub session_id: Option<i64>,
}

impl Default for LastUsed {
    fn default() -> Self {
        Self {
            collection: CollectionSelector::All,
            shuffle: false,
            fixed_interval_secs: DEFAULT_FIXED_INTERVAL_SECS,
            session_id: None,
        }
    }
}

// Stored as `"all"` or the collection id, matching the CLI argument.
mod selector_text {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use crate::db::CollectionSelector;

    pub fn serialize<S: Serializer>(selector: &CollectionSelector, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(selector)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CollectionSelector, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UserSettings {
    cue: CueSettings,
    last_used: LastUsed,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("Ignoring unreadable settings at {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn cue(&self) -> CueSettings {
        self.read().cue.clone()
    }

    pub fn update_cue(&self, settings: CueSettings) -> Result<()> {
        let mut guard = self.write();
        guard.cue = settings;
        self.persist(&guard)
    }

    pub fn last_used(&self) -> LastUsed {
        self.read().last_used.clone()
    }

    pub fn update_last_used<F>(&self, update: F) -> Result<()>
    where
        F: FnOnce(&mut LastUsed),
    {
        let mut guard = self.write();
        update(&mut guard.last_used);
        self.persist(&guard)
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
