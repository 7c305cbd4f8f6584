//! Configuration management for inferimpact
//!
//! Settings are layered from built-in defaults, an optional YAML file and
//! `INFERIMPACT__`-prefixed environment variables, in increasing precedence.

use crate::electricity::{ElectricityMix, ElectricityMixTable, DEFAULT_GEOGRAPHY};
use crate::{Error, HardwareProfile, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_PATH_ENV: &str = "INFERIMPACT_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "./inferimpact.yaml";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model catalog location
    pub catalog: CatalogConfig,

    /// Serving hardware used for estimates
    pub hardware: HardwareProfile,

    /// Electricity mixes per geography
    pub electricity: ElectricityConfig,
}

impl Config {
    /// Load configuration with precedence:
    /// 1. Environment variables (highest)
    /// 2. Configuration file
    /// 3. Defaults (lowest)
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::build(config::File::with_name(&path).required(false))
    }

    /// Load configuration from a specific file, which must exist.
    /// Environment variables still take precedence over it.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());
        Self::build(config::File::from(path))
    }

    fn build(file: config::File<config::FileSourceFile, config::FileFormat>) -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("INFERIMPACT")
                    .separator("__")
                    .try_parsing(true),
            );

        let parsed: Self = builder.build()?.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.hardware.validate()?;
        self.electricity.validate()?;
        Ok(())
    }

    /// Geography-keyed mix table built from the configured mixes
    pub fn electricity_table(&self) -> ElectricityMixTable {
        self.electricity.table()
    }
}

/// Model catalog location
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path to the catalog JSON document
    pub path: Option<PathBuf>,
}

/// Electricity mix configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectricityConfig {
    /// Geography used when a request names none, and the fallback mix
    pub default_geography: String,

    /// Mixes keyed by geography code
    pub mixes: HashMap<String, ElectricityMix>,
}

impl ElectricityConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_geography.trim().is_empty() {
            return Err(Error::config("electricity.default_geography must not be empty"));
        }
        for (geography, mix) in &self.mixes {
            if let Some((metric, value)) = mix.factors.iter().find(|(_, v)| !(**v >= 0.0)) {
                return Err(Error::config(format!(
                    "electricity mix {} has invalid {} factor {}",
                    geography, metric, value
                )));
            }
        }
        if self.default_mix().is_none() {
            return Err(Error::config(format!(
                "no electricity mix configured for default geography {}",
                self.default_geography
            )));
        }
        Ok(())
    }

    /// Table of configured mixes falling back to the default geography's mix
    pub fn table(&self) -> ElectricityMixTable {
        let fallback = self.default_mix().unwrap_or_else(ElectricityMix::usa);
        self.mixes
            .iter()
            .fold(ElectricityMixTable::new(fallback), |table, (geography, mix)| {
                table.with_mix(geography, *mix)
            })
    }

    // config lowercases keys, so match geographies case-insensitively
    fn default_mix(&self) -> Option<ElectricityMix> {
        let wanted = self.default_geography.trim();
        self.mixes
            .iter()
            .find(|(geography, _)| geography.trim().eq_ignore_ascii_case(wanted))
            .map(|(_, mix)| *mix)
    }
}

impl Default for ElectricityConfig {
    fn default() -> Self {
        Self {
            default_geography: DEFAULT_GEOGRAPHY.to_string(),
            mixes: HashMap::from([(DEFAULT_GEOGRAPHY.to_string(), ElectricityMix::usa())]),
        }
    }
}
