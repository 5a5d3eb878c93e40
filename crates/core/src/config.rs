//! Tunables for a generation run.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::language::classify::TierRules;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Maximum number of items per (tenant, section, tier)
    pub hard_cap: usize,
    /// Generator calls per request
    pub max_rounds: usize,
    /// Extra candidates requested per round to absorb rejections
    pub surplus: usize,
    /// How many forbidden words are listed in the generator prompt
    pub forbidden_hint_limit: usize,
    /// Stored content is truncated to this many characters
    pub max_content_chars: usize,
    pub default_kind: String,
    pub rules: TierRules,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            hard_cap: 10,
            max_rounds: 3,
            surplus: 4,
            forbidden_hint_limit: 200,
            max_content_chars: 255,
            default_kind: "texto".to_string(),
            rules: TierRules::default(),
        }
    }
}

impl GenerationConfig {
    /// Load from a JSON file. Missing fields keep their defaults, including
    /// whole tiers under `rules`; the result is validated.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&data)
            .with_context(|| format!("Invalid config JSON: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            bail!("max_rounds must be at least 1");
        }
        if self.hard_cap == 0 {
            bail!("hard_cap must be at least 1");
        }
        self.rules.validate()
    }
}

/// Default location of the exercise store.
///
/// Uses `SILABARIO_STORE` if set, otherwise `~/.local/share/silabario/exercises.json`.
pub fn default_store_path() -> PathBuf {
    if let Ok(path) = std::env::var("SILABARIO_STORE") {
        return PathBuf::from(path);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("silabario")
        .join("exercises.json")
}
