use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::zones::Padding;

/// Process-wide runtime configuration. Mutated by the character-detection
/// flow and persisted on every change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    pub hotkey: String,
    pub active_character: String,
    pub debug: bool,
    pub padding: Padding,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            hotkey: "Alt+U".into(),
            active_character: String::new(),
            debug: false,
            padding: Padding::default(),
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<RuntimeConfig>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            RuntimeConfig::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn config(&self) -> RuntimeConfig {
        self.data.read().unwrap().clone()
    }

    pub fn padding(&self) -> Padding {
        self.data.read().unwrap().padding
    }

    pub fn active_character(&self) -> String {
        self.data.read().unwrap().active_character.clone()
    }

    pub fn debug(&self) -> bool {
        self.data.read().unwrap().debug
    }

    pub fn set_active_character(&self, name: &str) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.active_character = name.to_string();
        self.persist(&guard)
    }

    pub fn update(&self, config: RuntimeConfig) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        *guard = config;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: RuntimeConfig = serde_json::from_str(&contents)?;
        let mut guard = self.data.write().unwrap();
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &RuntimeConfig) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
