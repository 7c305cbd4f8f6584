//! Hardware profile commands

use crate::output::{Formattable, OutputFormat, OutputFormatter};
use anyhow::Result;
use impact_core::{HardwareProfile, Metric};

impl Formattable for HardwareProfile {
    fn table_headers() -> Vec<String> {
        vec![
            "Accelerators".to_string(),
            "Memory (GB)".to_string(),
            "Power (kW)".to_string(),
            "PUE".to_string(),
            "Lifespan (years)".to_string(),
        ]
    }

    fn table_row(&self) -> Vec<String> {
        vec![
            self.available_accelerator_count.to_string(),
            self.accelerator.available_memory_gb.to_string(),
            self.power_consumption_kw.to_string(),
            self.datacenter_pue.to_string(),
            format!("{:.1}", lifespan_years(self)),
        ]
    }

    fn key_value_pairs(&self) -> Vec<(String, String)> {
        let gpu = &self.accelerator;
        let mut pairs = vec![
            ("Accelerators".to_string(), self.available_accelerator_count.to_string()),
            ("Accelerator Memory".to_string(), format!("{} GB", gpu.available_memory_gb)),
            ("Server Power".to_string(), format!("{} kW", self.power_consumption_kw)),
            ("Datacenter PUE".to_string(), self.datacenter_pue.to_string()),
            (
                "Hardware Lifespan".to_string(),
                format!("{} s ({:.1} years)", self.hardware_lifespan_seconds, lifespan_years(self)),
            ),
            (
                "Energy Regression".to_string(),
                format!(
                    "alpha={:e} beta={:e} stdev={:e} kWh",
                    gpu.energy_alpha, gpu.energy_beta, gpu.energy_stdev
                ),
            ),
            (
                "Latency Regression".to_string(),
                format!(
                    "alpha={:e} beta={:e} stdev={:e} s",
                    gpu.latency_alpha, gpu.latency_beta, gpu.latency_stdev
                ),
            ),
        ];
        for metric in Metric::ALL {
            pairs.push((
                format!("Embodied {}", metric),
                format!(
                    "server {} / accelerator {} {}",
                    self.embodied_impact.get(metric),
                    gpu.embodied_impact.get(metric),
                    metric.unit()
                ),
            ));
        }
        pairs
    }
}

fn lifespan_years(profile: &HardwareProfile) -> f64 {
    profile.hardware_lifespan_seconds / (365.0 * 24.0 * 3600.0)
}

/// Show the effective hardware profile
pub fn show_hardware(profile: &HardwareProfile, output_format: OutputFormat) -> Result<()> {
    OutputFormatter::new(output_format).print_item(profile)
}
