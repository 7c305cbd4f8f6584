//! Serving hardware profiles
//!
//! A [`HardwareProfile`] describes one inference server and the accelerator
//! model it hosts, together with two linear regressions fit offline per
//! accelerator family: energy per generated token and latency per generated
//! token, both as functions of the model's active parameter count.

use crate::error::Stage;
use crate::{Error, ImpactFactors, Interval, Result};
use serde::{Deserialize, Serialize};

const SECONDS_PER_HOUR: f64 = 3600.0;

// false for NaN as well as for zero and negatives
fn is_positive(value: f64) -> bool {
    value > 0.0
}

/// Accelerator (GPU) characteristics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Accelerator {
    /// Energy-per-token slope in kWh per billion active parameters
    pub energy_alpha: f64,
    /// Energy-per-token intercept in kWh
    pub energy_beta: f64,
    /// Standard deviation of the per-token energy regression
    pub energy_stdev: f64,
    /// Latency-per-token slope in seconds per billion active parameters
    pub latency_alpha: f64,
    /// Latency-per-token intercept in seconds
    pub latency_beta: f64,
    /// Standard deviation of the per-token latency regression
    pub latency_stdev: f64,
    /// Memory available on one accelerator in GB
    pub available_memory_gb: f64,
    /// Manufacturing footprint of a single unit
    pub embodied_impact: ImpactFactors,
}

impl Accelerator {
    /// Generic datacenter accelerator with 80 GB of memory
    pub fn generic() -> Self {
        Self {
            energy_alpha: 8.91e-8,
            energy_beta: 1.43e-6,
            energy_stdev: 5.19e-7,
            latency_alpha: 8.02e-4,
            latency_beta: 2.23e-2,
            latency_stdev: 7.00e-6,
            available_memory_gb: 80.0,
            embodied_impact: ImpactFactors::new(5.1e-3, 143.0, 1828.0),
        }
    }
}

impl Default for Accelerator {
    fn default() -> Self {
        Self::generic()
    }
}

/// Server infrastructure serving inference requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareProfile {
    /// Accelerators installed in the server
    pub available_accelerator_count: u32,
    /// Server baseline power draw in kW, accelerators excluded
    pub power_consumption_kw: f64,
    /// Manufacturing footprint of the whole server
    pub embodied_impact: ImpactFactors,
    /// Operational lifetime of the hardware in seconds
    pub hardware_lifespan_seconds: f64,
    /// Datacenter Power Usage Effectiveness
    pub datacenter_pue: f64,
    /// Accelerator model installed in the server
    pub accelerator: Accelerator,
}

impl HardwareProfile {
    /// Generic 100-accelerator server with a five year lifespan
    pub fn generic() -> Self {
        Self {
            available_accelerator_count: 100,
            power_consumption_kw: 1.0,
            embodied_impact: ImpactFactors::new(0.24, 3000.0, 38000.0),
            hardware_lifespan_seconds: 5.0 * 365.0 * 24.0 * 60.0 * 60.0,
            datacenter_pue: 1.2,
            accelerator: Accelerator::generic(),
        }
    }

    /// Start a builder from the generic profile
    pub fn builder() -> HardwareProfileBuilder {
        HardwareProfileBuilder::default()
    }

    /// Check that every characteristic is physically meaningful
    pub fn validate(&self) -> Result<()> {
        let gpu = &self.accelerator;
        if self.available_accelerator_count == 0 {
            return Err(Error::config("available_accelerator_count must be greater than 0"));
        }
        for (name, value) in [
            ("power_consumption_kw", self.power_consumption_kw),
            ("hardware_lifespan_seconds", self.hardware_lifespan_seconds),
            ("datacenter_pue", self.datacenter_pue),
            ("accelerator.available_memory_gb", gpu.available_memory_gb),
            ("accelerator.energy_alpha", gpu.energy_alpha),
            ("accelerator.energy_beta", gpu.energy_beta),
            ("accelerator.energy_stdev", gpu.energy_stdev),
            ("accelerator.latency_alpha", gpu.latency_alpha),
            ("accelerator.latency_beta", gpu.latency_beta),
            ("accelerator.latency_stdev", gpu.latency_stdev),
        ] {
            if !is_positive(value) || !value.is_finite() {
                return Err(Error::config(format!("{} must be a positive number", name)));
            }
        }
        for (metric, value) in self.embodied_impact.iter().chain(gpu.embodied_impact.iter()) {
            if *value < 0.0 {
                return Err(Error::config(format!(
                    "embodied {} impact must not be negative",
                    metric
                )));
            }
        }
        Ok(())
    }

    /// Accelerators needed to hold `model_memory_gb` of weights, rounded up
    pub fn required_accelerator_count(&self, model_memory_gb: f64) -> Result<u32> {
        let stage = Stage::RequiredAccelerators;
        if !is_positive(model_memory_gb) {
            return Err(Error::validation(stage, "model required memory must be greater than 0"));
        }
        if !is_positive(self.accelerator.available_memory_gb) {
            return Err(Error::validation(stage, "accelerator memory must be greater than 0"));
        }

        let count = (model_memory_gb / self.accelerator.available_memory_gb).ceil();
        if !count.is_finite() || count > f64::from(u32::MAX) {
            return Err(Error::validation(
                stage,
                format!("required accelerator count {} is not representable", count),
            ));
        }
        Ok(count as u32)
    }

    /// 95% confidence interval of one accelerator's energy in kWh
    pub fn accelerator_energy_kwh(
        &self,
        active_parameters: f64,
        output_token_count: u64,
    ) -> Result<Interval> {
        let stage = Stage::AcceleratorEnergy;
        let gpu = &self.accelerator;
        if !is_positive(active_parameters) {
            return Err(Error::validation(stage, "active parameter count must be greater than 0"));
        }
        if output_token_count == 0 {
            return Err(Error::validation(stage, "output token count must be greater than 0"));
        }
        if ![gpu.energy_alpha, gpu.energy_beta, gpu.energy_stdev].into_iter().all(is_positive) {
            return Err(Error::validation(stage, "accelerator energy parameters must be greater than 0"));
        }

        let per_token_mean = gpu.energy_alpha * active_parameters + gpu.energy_beta;
        Ok(Interval::confidence_interval(
            per_token_mean,
            gpu.energy_stdev,
            output_token_count as f64,
        ))
    }

    /// Token generation latency in seconds.
    ///
    /// The regression estimate is returned when its upper bound fits inside
    /// the measured request latency. Otherwise the measurement replaces it as
    /// a degenerate interval.
    pub fn generation_latency_seconds(
        &self,
        active_parameters: f64,
        output_token_count: u64,
        measured_latency_seconds: f64,
    ) -> Result<Interval> {
        let stage = Stage::GenerationLatency;
        let gpu = &self.accelerator;
        if !is_positive(active_parameters) {
            return Err(Error::validation(stage, "active parameter count must be greater than 0"));
        }
        if output_token_count == 0 {
            return Err(Error::validation(stage, "output token count must be greater than 0"));
        }
        if !is_positive(measured_latency_seconds) {
            return Err(Error::validation(stage, "measured latency must be greater than 0"));
        }
        if ![gpu.latency_alpha, gpu.latency_beta, gpu.latency_stdev].into_iter().all(is_positive) {
            return Err(Error::validation(stage, "accelerator latency parameters must be greater than 0"));
        }
        if self.available_accelerator_count == 0 {
            return Err(Error::validation(stage, "available accelerator count must be greater than 0"));
        }
        if !is_positive(self.power_consumption_kw) {
            return Err(Error::validation(stage, "server power consumption must be greater than 0"));
        }

        let per_token_mean = gpu.latency_alpha * active_parameters + gpu.latency_beta;
        let estimate = Interval::confidence_interval(
            per_token_mean,
            gpu.latency_stdev,
            output_token_count as f64,
        );
        if estimate.max < measured_latency_seconds {
            Ok(estimate)
        } else {
            Ok(Interval::point(measured_latency_seconds))
        }
    }

    /// Server energy in kWh prorated by the share of accelerators in use.
    /// Accelerator power is not included.
    pub fn server_energy_baseline_kwh(
        &self,
        latency_seconds: f64,
        accelerators_required: u32,
    ) -> Result<f64> {
        let stage = Stage::ServerEnergy;
        if !is_positive(latency_seconds) {
            return Err(Error::validation(stage, "generation latency must be greater than 0"));
        }
        self.check_accelerator_share(stage, accelerators_required)?;
        if !is_positive(self.power_consumption_kw) {
            return Err(Error::validation(stage, "server power consumption must be greater than 0"));
        }

        Ok((latency_seconds / SECONDS_PER_HOUR)
            * self.power_consumption_kw
            * self.accelerator_share(accelerators_required))
    }

    /// Datacenter-level request energy in kWh:
    /// `pue * (server + required * accelerator)` on each bound
    pub fn request_energy_kwh(
        &self,
        server_energy_kwh: f64,
        accelerators_required: u32,
        accelerator_energy: Interval,
    ) -> Result<Interval> {
        let stage = Stage::RequestEnergy;
        if !is_positive(server_energy_kwh) {
            return Err(Error::validation(stage, "server energy must be greater than 0"));
        }
        self.check_accelerator_share(stage, accelerators_required)?;
        if !is_positive(self.datacenter_pue) || !self.datacenter_pue.is_finite() {
            return Err(Error::validation(stage, "datacenter PUE must be a positive number"));
        }
        if accelerator_energy.min < 0.0 || accelerator_energy.max < 0.0 {
            return Err(Error::validation(stage, "accelerator energy bounds must be non-negative"));
        }

        let required = f64::from(accelerators_required);
        Ok(accelerator_energy.map(|bound| self.datacenter_pue * (server_energy_kwh + required * bound)))
    }

    /// Fraction of the server occupied by `accelerators_required`
    pub fn accelerator_share(&self, accelerators_required: u32) -> f64 {
        f64::from(accelerators_required) / f64::from(self.available_accelerator_count)
    }

    fn check_accelerator_share(&self, stage: Stage, accelerators_required: u32) -> Result<()> {
        if accelerators_required == 0 || accelerators_required > self.available_accelerator_count {
            return Err(Error::validation(
                stage,
                format!(
                    "required accelerators {} must be between 1 and the {} available",
                    accelerators_required, self.available_accelerator_count
                ),
            ));
        }
        Ok(())
    }
}

impl Default for HardwareProfile {
    fn default() -> Self {
        Self::generic()
    }
}

/// Builder for custom hardware profiles
#[derive(Debug, Clone, Default)]
pub struct HardwareProfileBuilder {
    profile: HardwareProfile,
}

impl HardwareProfileBuilder {
    pub fn available_accelerator_count(mut self, count: u32) -> Self {
        self.profile.available_accelerator_count = count;
        self
    }

    pub fn power_consumption_kw(mut self, kw: f64) -> Self {
        self.profile.power_consumption_kw = kw;
        self
    }

    pub fn embodied_impact(mut self, impact: ImpactFactors) -> Self {
        self.profile.embodied_impact = impact;
        self
    }

    pub fn hardware_lifespan_seconds(mut self, seconds: f64) -> Self {
        self.profile.hardware_lifespan_seconds = seconds;
        self
    }

    pub fn datacenter_pue(mut self, pue: f64) -> Self {
        self.profile.datacenter_pue = pue;
        self
    }

    pub fn accelerator(mut self, accelerator: Accelerator) -> Self {
        self.profile.accelerator = accelerator;
        self
    }

    pub fn build(self) -> HardwareProfile {
        self.profile
    }
}
