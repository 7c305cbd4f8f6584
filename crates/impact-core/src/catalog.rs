//! Model catalog ingestion
//!
//! Parses a model-descriptor catalog into normalized, immutable [`AiModel`]
//! entities. Numeric parameter fields may appear as bare numbers or as
//! `{min, max}` objects with missing bounds; that ambiguity is captured by
//! [`ParameterSpec`] and resolved into an [`Interval`] at this boundary, so
//! nothing downstream ever sees it.
//!
//! ```json
//! {
//!   "aliases": [{"provider": "openai", "name": "gpt-4", "alias": "gpt-4-0613"}],
//!   "models": [{
//!     "type": "model",
//!     "provider": "openai",
//!     "name": "gpt-4",
//!     "architecture": {
//!       "type": "moe",
//!       "parameters": {"total": 1760.8, "active": {"min": 220.0, "max": 880.5}}
//!     },
//!     "warnings": [{"code": "model-arch-not-released", "message": "..."}],
//!     "sources": ["https://example.com"]
//!   }]
//! }
//! ```

use crate::{Error, Interval, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Quantization applied when the catalog does not specify one
pub const DEFAULT_QUANTIZATION_BITS: u32 = 8;

/// Runtime memory overhead (activations, KV-cache, framework buffers) on top
/// of raw weight storage
pub const MEMORY_OVERHEAD_FACTOR: f64 = 1.2;

/// Model provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "mistralai")]
    MistralAi,
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "huggingface_hub")]
    HuggingFaceHub,
    #[serde(rename = "cohere")]
    Cohere,
    #[serde(rename = "google")]
    Google,
}

impl Provider {
    pub const ALL: [Provider; 6] = [
        Provider::Anthropic,
        Provider::MistralAi,
        Provider::OpenAi,
        Provider::HuggingFaceHub,
        Provider::Cohere,
        Provider::Google,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::MistralAi => "mistralai",
            Provider::OpenAi => "openai",
            Provider::HuggingFaceHub => "huggingface_hub",
            Provider::Cohere => "cohere",
            Provider::Google => "google",
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == lowered)
            .ok_or_else(|| format!("Unknown provider: {}", s))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model architecture family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArchitectureType {
    /// Every parameter is active for every generated token
    #[default]
    #[serde(rename = "dense")]
    Dense,
    /// Only a subset of parameters is active per token
    #[serde(rename = "moe", alias = "mixture-of-experts")]
    MixtureOfExperts,
}

impl fmt::Display for ArchitectureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchitectureType::Dense => write!(f, "dense"),
            ArchitectureType::MixtureOfExperts => write!(f, "moe"),
        }
    }
}

/// Warning attached to a catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Alternate name for a catalog model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub provider: Provider,
    /// Target model name
    pub name: String,
    pub alias: String,
}

/// Shape of a numeric parameter field as it appeared in the catalog
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterSpec {
    /// Field not present
    Absent,
    /// Bare number
    Scalar(f64),
    /// Object with both bounds
    Range(f64, f64),
    /// Object with only `min`
    MinOnly(f64),
    /// Object with only `max`
    MaxOnly(f64),
}

impl ParameterSpec {
    /// Classify a raw JSON value. `field` names the value in errors.
    pub fn parse(field: &str, value: Option<&Value>) -> Result<Self> {
        let spec = Self::classify(field, value)?;
        spec.check_bounds(field)?;
        Ok(spec)
    }

    fn classify(field: &str, value: Option<&Value>) -> Result<Self> {
        match value {
            None => Ok(ParameterSpec::Absent),
            Some(Value::Number(n)) => Ok(ParameterSpec::Scalar(number(field, n)?)),
            Some(Value::Object(obj)) => {
                let min = bound(field, obj, "min")?;
                let max = bound(field, obj, "max")?;
                match (min, max) {
                    (Some(min), Some(max)) => Ok(ParameterSpec::Range(min, max)),
                    (Some(min), None) => Ok(ParameterSpec::MinOnly(min)),
                    (None, Some(max)) => Ok(ParameterSpec::MaxOnly(max)),
                    (None, None) => Err(Error::missing_range_data(field)),
                }
            }
            Some(other) => Err(Error::type_mismatch(field, json_type(other))),
        }
    }

    // parameter counts are non-negative and ranges must be ordered
    fn check_bounds(&self, field: &str) -> Result<()> {
        let (min, max) = match *self {
            ParameterSpec::Absent => return Ok(()),
            ParameterSpec::Scalar(v) | ParameterSpec::MinOnly(v) | ParameterSpec::MaxOnly(v) => {
                (v, v)
            }
            ParameterSpec::Range(min, max) => (min, max),
        };
        if min < 0.0 || min > max {
            return Err(Error::invalid_range(field, min, max));
        }
        Ok(())
    }

    /// Canonical interval. A single bound collapses to a degenerate interval
    /// at that bound; an absent field becomes the zero interval.
    pub fn into_interval(self) -> Interval {
        match self {
            ParameterSpec::Absent => Interval::zero(),
            ParameterSpec::Scalar(v) => Interval::point(v),
            ParameterSpec::Range(min, max) => Interval::new(min, max),
            ParameterSpec::MinOnly(v) | ParameterSpec::MaxOnly(v) => Interval::point(v),
        }
    }
}

/// Parse a scalar-or-range field straight into an interval
pub fn parse_interval(field: &str, value: Option<&Value>) -> Result<Interval> {
    ParameterSpec::parse(field, value).map(ParameterSpec::into_interval)
}

fn bound(field: &str, obj: &Map<String, Value>, key: &str) -> Result<Option<f64>> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::Number(n)) => number(&format!("{}.{}", field, key), n).map(Some),
        Some(other) => Err(Error::type_mismatch(
            format!("{}.{}", field, key),
            json_type(other),
        )),
    }
}

fn number(field: &str, n: &Number) -> Result<f64> {
    n.as_f64()
        .ok_or_else(|| Error::type_mismatch(field, "non-finite number"))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A generative model's parameter profile, normalized from the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiModel {
    name: String,
    provider: Provider,
    architecture_type: ArchitectureType,
    total_parameters: Interval,
    active_parameters: Interval,
    quantization_bits: u32,
    warnings: Vec<Warning>,
    sources: Vec<String>,
}

impl AiModel {
    /// Create a model with no warnings or sources and default quantization
    pub fn new(
        name: impl Into<String>,
        provider: Provider,
        architecture_type: ArchitectureType,
        total_parameters: Interval,
        active_parameters: Interval,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            architecture_type,
            total_parameters,
            active_parameters,
            quantization_bits: DEFAULT_QUANTIZATION_BITS,
            warnings: Vec::new(),
            sources: Vec::new(),
        }
    }

    pub fn with_quantization_bits(mut self, bits: u32) -> Self {
        self.quantization_bits = bits;
        self
    }

    pub fn with_warning(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.warnings.push(Warning {
            code: code.into(),
            message: message.into(),
        });
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn architecture_type(&self) -> ArchitectureType {
        self.architecture_type
    }

    /// Total parameter count in billions
    pub fn total_parameters(&self) -> Interval {
        self.total_parameters
    }

    /// Parameters active per generated token, in billions
    pub fn active_parameters(&self) -> Interval {
        self.active_parameters
    }

    pub fn quantization_bits(&self) -> u32 {
        self.quantization_bits
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Accelerator memory in GB needed to serve the model:
    /// `1.2 * total.max * bits / 8`
    pub fn required_memory_gb(&self) -> f64 {
        MEMORY_OVERHEAD_FACTOR * self.total_parameters.max * f64::from(self.quantization_bits)
            / 8.0
    }
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    aliases: Option<Vec<Alias>>,
    #[serde(default)]
    models: Option<Vec<RawModel>>,
}

#[derive(Debug, Deserialize)]
struct RawModel {
    provider: Provider,
    name: String,
    #[serde(default)]
    architecture: Option<RawArchitecture>,
    #[serde(default)]
    warnings: Option<Vec<Warning>>,
    #[serde(default)]
    sources: Option<Vec<String>>,
    #[serde(default)]
    quantization_bits: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawArchitecture {
    #[serde(rename = "type", default)]
    kind: ArchitectureType,
    #[serde(default)]
    parameters: Option<Value>,
}

impl RawModel {
    fn normalize(self) -> Result<AiModel> {
        let (architecture_type, total, active) = match self.architecture {
            Some(arch) => {
                let prefix = format!("{}.architecture.parameters", self.name);
                let (total, active) = parse_parameters(&prefix, arch.parameters.as_ref())?;
                (arch.kind, total, active)
            }
            None => (ArchitectureType::default(), Interval::zero(), Interval::zero()),
        };

        Ok(AiModel {
            name: self.name,
            provider: self.provider,
            architecture_type,
            total_parameters: total,
            active_parameters: active,
            quantization_bits: self.quantization_bits.unwrap_or(DEFAULT_QUANTIZATION_BITS),
            warnings: self.warnings.unwrap_or_default(),
            sources: self.sources.unwrap_or_default(),
        })
    }
}

/// Resolve `(total, active)` from an architecture's `parameters` value.
///
/// `{total, active}` members are read as scalar-or-range fields. A legacy
/// parameters value (a bare number, or an object carrying `min`/`max`
/// directly) stands for the total and takes precedence over `total`.
fn parse_parameters(prefix: &str, parameters: Option<&Value>) -> Result<(Interval, Interval)> {
    let obj = match parameters {
        None => return Ok((Interval::zero(), Interval::zero())),
        Some(Value::Object(obj)) => obj,
        Some(legacy @ Value::Number(_)) => {
            return Ok((parse_interval(prefix, Some(legacy))?, Interval::zero()));
        }
        Some(other) => return Err(Error::type_mismatch(prefix, json_type(other))),
    };

    let mut total = parse_interval(&format!("{}.total", prefix), obj.get("total"))?;
    let active = parse_interval(&format!("{}.active", prefix), obj.get("active"))?;

    if obj.contains_key("min") || obj.contains_key("max") {
        total = parse_interval(prefix, parameters)?;
    }

    Ok((total, active))
}

/// Name-keyed collection of normalized models
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: HashMap<String, Arc<AiModel>>,
    aliases: HashMap<String, String>,
}

impl ModelCatalog {
    /// Parse a catalog from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// Parse a catalog from JSON bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: RawCatalog = serde_json::from_slice(bytes)?;
        Self::from_raw(raw)
    }

    /// Parse a catalog from a reader
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let raw: RawCatalog = serde_json::from_reader(reader)?;
        Self::from_raw(raw)
    }

    /// Read and parse a catalog file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading model catalog from {}", path.display());
        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes)
    }

    /// Build a catalog from already-constructed models
    pub fn from_models(models: impl IntoIterator<Item = AiModel>) -> Self {
        let mut catalog = Self::default();
        for model in models {
            catalog.insert(model);
        }
        catalog
    }

    fn from_raw(raw: RawCatalog) -> Result<Self> {
        let mut catalog = Self::default();
        for descriptor in raw.models.unwrap_or_default() {
            catalog.insert(descriptor.normalize()?);
        }

        for alias in raw.aliases.unwrap_or_default() {
            match catalog.models.get(&alias.name) {
                None => {
                    warn!(
                        "Skipping alias {} for unknown model {}/{}",
                        alias.alias, alias.provider, alias.name
                    );
                    continue;
                }
                Some(target) if target.provider != alias.provider => {
                    warn!(
                        "Skipping alias {} for {}/{}: model belongs to {}",
                        alias.alias, alias.provider, alias.name, target.provider
                    );
                    continue;
                }
                Some(_) => {}
            }
            catalog.aliases.insert(alias.alias, alias.name);
        }

        info!(
            "Loaded model catalog with {} models and {} aliases",
            catalog.models.len(),
            catalog.aliases.len()
        );
        Ok(catalog)
    }

    // Later descriptors win on name collisions.
    fn insert(&mut self, model: AiModel) {
        let name = model.name.clone();
        if let Some(previous) = self.models.insert(name, Arc::new(model)) {
            warn!(
                "Duplicate model name {} in catalog; replacing earlier {} entry",
                previous.name, previous.provider
            );
        }
    }

    /// Look up a model by name, falling back to aliases
    pub fn load_model(&self, name: &str) -> Result<Arc<AiModel>> {
        self.models
            .get(name)
            .or_else(|| self.aliases.get(name).and_then(|target| self.models.get(target)))
            .cloned()
            .ok_or_else(|| Error::model_not_found(name))
    }

    /// Look up a model by name and require it to belong to `provider`
    pub fn load_model_for(&self, provider: Provider, name: &str) -> Result<Arc<AiModel>> {
        match self.load_model(name) {
            Ok(model) if model.provider == provider => Ok(model),
            Ok(_) | Err(Error::ModelNotFound(_)) => {
                Err(Error::model_not_found(format!("{}/{}", provider, name)))
            }
            Err(e) => Err(e),
        }
    }

    /// Name a lookup would resolve to, if any
    pub fn resolve_name<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if self.models.contains_key(name) {
            Some(name)
        } else {
            self.aliases.get(name).map(String::as_str)
        }
    }

    /// All models sorted by name
    pub fn models(&self) -> Vec<Arc<AiModel>> {
        let mut models: Vec<_> = self.models.values().cloned().collect();
        models.sort_by(|a, b| a.name.cmp(&b.name));
        models
    }

    /// Aliases pointing at `name`, sorted
    pub fn aliases_of(&self, name: &str) -> Vec<&str> {
        let mut aliases: Vec<&str> = self
            .aliases
            .iter()
            .filter(|(_, target)| target.as_str() == name)
            .map(|(alias, _)| alias.as_str())
            .collect();
        aliases.sort_unstable();
        aliases
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
