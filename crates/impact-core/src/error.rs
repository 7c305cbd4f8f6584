//! Error handling for inferimpact
//!
//! Provides a unified error type and result type for catalog ingestion,
//! the estimation pipeline and configuration loading.

use std::fmt;

/// Result type alias for inferimpact operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage that rejected its inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Accelerator count needed to hold the model weights
    RequiredAccelerators,
    /// Token generation latency estimate
    GenerationLatency,
    /// Per-accelerator energy estimate
    AcceleratorEnergy,
    /// Server baseline energy (accelerators excluded)
    ServerEnergy,
    /// Datacenter-level request energy
    RequestEnergy,
    /// Embodied impact amortization
    EmbodiedImpact,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::RequiredAccelerators => "required_accelerators",
            Stage::GenerationLatency => "generation_latency",
            Stage::AcceleratorEnergy => "accelerator_energy",
            Stage::ServerEnergy => "server_energy",
            Stage::RequestEnergy => "request_energy",
            Stage::EmbodiedImpact => "embodied_impact",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for inferimpact
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A numeric catalog field was neither a number nor a range object
    #[error("Type mismatch for `{field}`: expected number or {{min, max}} object, found {found}")]
    TypeMismatch { field: String, found: &'static str },

    /// A range object carried neither `min` nor `max`
    #[error("Missing range data for `{field}`: object has neither `min` nor `max`")]
    MissingRangeData { field: String },

    /// A catalog range was negative or had `min > max`
    #[error("Invalid range for `{field}`: [{min}, {max}] must satisfy 0 <= min <= max")]
    InvalidRange { field: String, min: f64, max: f64 },

    /// No model or alias with this name in the catalog
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// A pipeline stage rejected a physically impossible input
    #[error("Validation failed in {stage}: {reason}")]
    Validation { stage: Stage, reason: String },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    InvalidConfiguration(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration parsing errors
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Create a type mismatch error for a catalog field
    pub fn type_mismatch(field: impl Into<String>, found: &'static str) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            found,
        }
    }

    /// Create a missing range data error for a catalog field
    pub fn missing_range_data(field: impl Into<String>) -> Self {
        Self::MissingRangeData {
            field: field.into(),
        }
    }

    /// Create an invalid range error for a catalog field
    pub fn invalid_range(field: impl Into<String>, min: f64, max: f64) -> Self {
        Self::InvalidRange {
            field: field.into(),
            min,
            max,
        }
    }

    /// Create a model not found error
    pub fn model_not_found(name: impl Into<String>) -> Self {
        Self::ModelNotFound(name.into())
    }

    /// Create a validation error for a pipeline stage
    pub fn validation(stage: Stage, reason: impl Into<String>) -> Self {
        Self::Validation {
            stage,
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Pipeline stage that raised this error, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Validation { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Check if this error comes from catalog ingestion
    pub fn is_catalog_error(&self) -> bool {
        matches!(
            self,
            Error::TypeMismatch { .. }
                | Error::MissingRangeData { .. }
                | Error::InvalidRange { .. }
                | Error::ModelNotFound(_)
                | Error::Json(_)
        )
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::TypeMismatch { .. } => "type_mismatch",
            Error::MissingRangeData { .. } => "missing_range_data",
            Error::InvalidRange { .. } => "invalid_range",
            Error::ModelNotFound(_) => "model_not_found",
            Error::Validation { .. } => "validation",
            Error::InvalidConfiguration(_) => "configuration",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Config(_) => "config",
        }
    }
}
