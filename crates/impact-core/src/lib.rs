//! # impact-core
//!
//! Energy and environmental impact estimation for large language model
//! inference requests.
//!
//! Given a model from the [`ModelCatalog`], a [`HardwareProfile`] and the
//! facts of one [`Request`], the [`ImpactEngine`] estimates the request's
//! energy together with its abiotic resource depletion (ADPe), global warming
//! potential (GWP) and primary energy (PE) impacts. Every quantity is an
//! [`Interval`] carrying a 95% confidence band.
//!
//! - Model catalog ingestion with scalar-or-range parameter counts
//! - Hardware profiles with per-accelerator energy and latency regressions
//! - Geography-keyed electricity mixes
//! - Layered configuration and a unified error type

pub mod catalog;
pub mod config;
pub mod electricity;
pub mod engine;
pub mod error;
pub mod hardware;
pub mod interval;
pub mod metric;
pub mod request;

// Re-export commonly used types at the crate root
pub use catalog::{AiModel, Alias, ArchitectureType, ModelCatalog, ParameterSpec, Provider, Warning};
pub use config::{CatalogConfig, Config, ElectricityConfig};
pub use electricity::{ElectricityMix, ElectricityMixProvider, ElectricityMixTable};
pub use engine::{compute_impacts, ImpactEngine, Impacts, MetricImpact};
pub use error::{Error, Result, Stage};
pub use hardware::{Accelerator, HardwareProfile, HardwareProfileBuilder};
pub use interval::Interval;
pub use metric::{ImpactFactors, Metric, PerMetric};
pub use request::Request;
