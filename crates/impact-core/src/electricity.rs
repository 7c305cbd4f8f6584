//! Electricity mix conversion factors
//!
//! Maps a geography code to the impact of consuming one kWh of electricity
//! there. The default table only knows a single placeholder region and
//! serves it for every geography.

use crate::{ImpactFactors, Metric};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Geography served by the default table
pub const DEFAULT_GEOGRAPHY: &str = "USA";

/// Impact per kWh of electricity for one geography
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElectricityMix {
    /// kgSbeq / kWh, kgCO2eq / kWh and MJ / kWh
    #[serde(flatten)]
    pub factors: ImpactFactors,
}

impl ElectricityMix {
    pub const fn new(adpe: f64, gwp: f64, pe: f64) -> Self {
        Self {
            factors: ImpactFactors::new(adpe, gwp, pe),
        }
    }

    /// United States average mix
    pub const fn usa() -> Self {
        Self::new(0.000_000_098_554_8, 0.679_78, 11.358)
    }

    /// Conversion factor for `metric`
    pub fn factor(&self, metric: Metric) -> f64 {
        *self.factors.get(metric)
    }
}

/// Source of electricity mixes for the impact engine
pub trait ElectricityMixProvider: Send + Sync {
    /// Mix to apply for `geography`. Always returns a value.
    fn mix_for(&self, geography: &str) -> ElectricityMix;
}

/// Geography-keyed table with a fallback entry for unknown geographies.
/// Keys are compared case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectricityMixTable {
    mixes: HashMap<String, ElectricityMix>,
    fallback: ElectricityMix,
}

impl ElectricityMixTable {
    /// Empty table serving `fallback` everywhere
    pub fn new(fallback: ElectricityMix) -> Self {
        Self {
            mixes: HashMap::new(),
            fallback,
        }
    }

    /// Add or replace the mix for `geography`
    pub fn with_mix(mut self, geography: impl AsRef<str>, mix: ElectricityMix) -> Self {
        self.insert(geography, mix);
        self
    }

    pub fn insert(&mut self, geography: impl AsRef<str>, mix: ElectricityMix) {
        self.mixes.insert(normalize(geography.as_ref()), mix);
    }

    /// Known mix for `geography`, without fallback
    pub fn get(&self, geography: &str) -> Option<&ElectricityMix> {
        self.mixes.get(&normalize(geography))
    }

    pub fn fallback(&self) -> &ElectricityMix {
        &self.fallback
    }

    /// Known geography codes, sorted
    pub fn geographies(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.mixes.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl Default for ElectricityMixTable {
    fn default() -> Self {
        Self::new(ElectricityMix::usa()).with_mix(DEFAULT_GEOGRAPHY, ElectricityMix::usa())
    }
}

impl ElectricityMixProvider for ElectricityMixTable {
    fn mix_for(&self, geography: &str) -> ElectricityMix {
        match self.get(geography) {
            Some(mix) => *mix,
            None => {
                debug!("No electricity mix for geography {:?}, using fallback", geography);
                self.fallback
            }
        }
    }
}

fn normalize(geography: &str) -> String {
    geography.trim().to_uppercase()
}
