//! Impact estimation pipeline
//!
//! [`ImpactEngine::compute`] turns a model, a hardware profile and one
//! request into request energy plus usage, embodied and total impacts for
//! every [`Metric`]. Stages run in order and the first failing stage aborts
//! the computation; there is no partial result.

use crate::electricity::{ElectricityMix, ElectricityMixProvider, ElectricityMixTable};
use crate::error::Stage;
use crate::{AiModel, Error, HardwareProfile, Interval, Metric, PerMetric, Request, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Usage, embodied and total impact for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricImpact {
    /// Impact of the electricity consumed by the request
    pub usage: Interval,
    /// Share of hardware manufacturing impact amortized onto the request
    pub embodied: Interval,
    /// `usage + embodied`
    pub total: Interval,
}

/// Estimated impacts of one inference request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Impacts {
    /// Datacenter-level energy of the request in kWh
    pub request_energy: Interval,
    /// Per-metric impacts, serialized as `adpe`, `gwp` and `pe`
    #[serde(flatten)]
    pub metrics: PerMetric<MetricImpact>,
    /// Generation latency the estimate was based on, in seconds
    pub generation_latency: Interval,
    /// Accelerators occupied by the model
    pub accelerators_required: u32,
    /// Geography whose electricity mix was applied
    pub geography: String,
}

impl Impacts {
    pub fn metric(&self, metric: Metric) -> &MetricImpact {
        self.metrics.get(metric)
    }

    pub fn usage(&self, metric: Metric) -> Interval {
        self.metric(metric).usage
    }

    pub fn embodied(&self, metric: Metric) -> Interval {
        self.metric(metric).embodied
    }

    pub fn total(&self, metric: Metric) -> Interval {
        self.metric(metric).total
    }
}

/// Computes request impacts against a source of electricity mixes
#[derive(Clone)]
pub struct ImpactEngine {
    electricity: Arc<dyn ElectricityMixProvider>,
}

impl ImpactEngine {
    pub fn new(electricity: impl ElectricityMixProvider + 'static) -> Self {
        Self {
            electricity: Arc::new(electricity),
        }
    }

    /// Share an existing provider between engines
    pub fn with_provider(electricity: Arc<dyn ElectricityMixProvider>) -> Self {
        Self { electricity }
    }

    /// Estimate the impacts of `request` served by `model` on `hardware`
    pub fn compute(
        &self,
        model: &AiModel,
        hardware: &HardwareProfile,
        request: &Request,
    ) -> Result<Impacts> {
        let active_parameters = model.active_parameters().max;

        let memory_gb = model.required_memory_gb();
        let accelerators_required = hardware.required_accelerator_count(memory_gb)?;
        debug!(
            "Model {} needs {:.1} GB on {} accelerators",
            model.name(),
            memory_gb,
            accelerators_required
        );

        let latency = hardware.generation_latency_seconds(
            active_parameters,
            request.output_token_count,
            request.measured_latency_seconds,
        )?;
        let accelerator_energy =
            hardware.accelerator_energy_kwh(active_parameters, request.output_token_count)?;
        let server_energy =
            hardware.server_energy_baseline_kwh(latency.max, accelerators_required)?;
        let request_energy =
            hardware.request_energy_kwh(server_energy, accelerators_required, accelerator_energy)?;
        debug!(
            "Generation latency {} s, request energy {} kWh",
            latency, request_energy
        );

        let mix = self.electricity.mix_for(&request.geography);
        let metrics = PerMetric::try_from_fn(|metric| {
            metric_impact(metric, hardware, &mix, accelerators_required, latency, request_energy)
        })?;

        Ok(Impacts {
            request_energy,
            metrics,
            generation_latency: latency,
            accelerators_required,
            geography: request.geography.clone(),
        })
    }
}

impl Default for ImpactEngine {
    fn default() -> Self {
        Self::new(ElectricityMixTable::default())
    }
}

impl fmt::Debug for ImpactEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImpactEngine").finish_non_exhaustive()
    }
}

/// Compute impacts with the default electricity mix table
pub fn compute_impacts(
    model: &AiModel,
    hardware: &HardwareProfile,
    request: &Request,
) -> Result<Impacts> {
    ImpactEngine::default().compute(model, hardware, request)
}

fn metric_impact(
    metric: Metric,
    hardware: &HardwareProfile,
    mix: &ElectricityMix,
    accelerators_required: u32,
    latency: Interval,
    request_energy: Interval,
) -> Result<MetricImpact> {
    let usage = request_energy.scale(mix.factor(metric));
    let embodied = embodied_impact(metric, hardware, accelerators_required, latency)?;
    Ok(MetricImpact {
        usage,
        embodied,
        total: usage + embodied,
    })
}

/// Server share plus dedicated accelerators, amortized over the fraction of
/// the hardware lifetime the request occupied
fn embodied_impact(
    metric: Metric,
    hardware: &HardwareProfile,
    accelerators_required: u32,
    latency: Interval,
) -> Result<Interval> {
    let lifespan = hardware.hardware_lifespan_seconds;
    if !(lifespan > 0.0) {
        return Err(Error::validation(
            Stage::EmbodiedImpact,
            "hardware lifespan must be greater than 0",
        ));
    }

    let server = *hardware.embodied_impact.get(metric);
    let accelerator = *hardware.accelerator.embodied_impact.get(metric);
    if !(server >= 0.0 && accelerator >= 0.0) || !(server + accelerator).is_finite() {
        return Err(Error::validation(
            Stage::EmbodiedImpact,
            format!("embodied {} impact must be a non-negative number", metric),
        ));
    }
    let shared = hardware.accelerator_share(accelerators_required) * server
        + f64::from(accelerators_required) * accelerator;

    Ok(latency.map(|seconds| (seconds / lifespan) * shared))
}
