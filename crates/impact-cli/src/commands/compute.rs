//! Impact computation command

use crate::output::{format_interval, Formattable, OutputFormat, OutputFormatter};
use anyhow::{Context, Result};
use impact_core::{
    HardwareProfile, ImpactEngine, Impacts, Metric, ModelCatalog, Provider, Request, Warning,
};
use serde::Serialize;
use tracing::info;

/// Arguments of one `compute` invocation
#[derive(Debug, Clone)]
pub struct ComputeArgs {
    pub model: String,
    pub provider: Option<Provider>,
    pub output_tokens: u64,
    pub latency_seconds: f64,
    pub geography: String,
}

/// Impacts of one request, labelled with the model that served it
#[derive(Debug, Serialize)]
pub struct ImpactReport {
    pub model: String,
    pub provider: Provider,
    pub output_tokens: u64,
    pub measured_latency_seconds: f64,
    #[serde(flatten)]
    pub impacts: Impacts,
    /// Catalog warnings about the precision of the model's data
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

impl Formattable for ImpactReport {
    fn table_headers() -> Vec<String> {
        vec![
            "Model".to_string(),
            "Tokens".to_string(),
            "Energy (kWh)".to_string(),
            "GWP (kgCO2eq)".to_string(),
        ]
    }

    fn table_row(&self) -> Vec<String> {
        vec![
            self.model.clone(),
            self.output_tokens.to_string(),
            self.impacts.request_energy.to_string(),
            self.impacts.total(Metric::Gwp).to_string(),
        ]
    }

    fn key_value_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("Model".to_string(), format!("{}/{}", self.provider, self.model)),
            ("Output Tokens".to_string(), self.output_tokens.to_string()),
            ("Geography".to_string(), self.impacts.geography.clone()),
            (
                "Accelerators".to_string(),
                self.impacts.accelerators_required.to_string(),
            ),
            (
                "Generation Latency".to_string(),
                format_interval(self.impacts.generation_latency, "s"),
            ),
            (
                "Request Energy".to_string(),
                format_interval(self.impacts.request_energy, "kWh"),
            ),
        ]
    }
}

impl ImpactReport {
    /// Usage, embodied and total rows, one per metric
    fn metric_rows(&self) -> Vec<Vec<String>> {
        Metric::ALL
            .iter()
            .map(|&metric| {
                let impact = self.impacts.metric(metric);
                vec![
                    format!("{} ({})", metric, metric.unit()),
                    impact.usage.to_string(),
                    impact.embodied.to_string(),
                    impact.total.to_string(),
                ]
            })
            .collect()
    }
}

/// Estimate the impacts of one request and print them
pub fn compute(
    catalog: &ModelCatalog,
    engine: &ImpactEngine,
    hardware: &HardwareProfile,
    args: ComputeArgs,
    output_format: OutputFormat,
) -> Result<()> {
    let formatter = OutputFormatter::new(output_format);
    let report = build_report(catalog, engine, hardware, args)?;

    for warning in &report.warnings {
        formatter.print_warning(&format!("{}: {}", warning.code, warning.message));
    }

    formatter.print_item(&report)?;
    if !formatter.is_structured() {
        println!();
        formatter.print_section(
            "Impacts",
            &["Metric", "Usage", "Embodied", "Total"],
            &report.metric_rows(),
        );
    }
    Ok(())
}

fn build_report(
    catalog: &ModelCatalog,
    engine: &ImpactEngine,
    hardware: &HardwareProfile,
    args: ComputeArgs,
) -> Result<ImpactReport> {
    let model = match args.provider {
        Some(provider) => catalog.load_model_for(provider, &args.model)?,
        None => catalog.load_model(&args.model)?,
    };

    let request = Request::new(args.output_tokens, args.latency_seconds, args.geography);
    let impacts = engine
        .compute(&model, hardware, &request)
        .with_context(|| format!("Failed to compute impacts for model {}", model.name()))?;

    info!(
        "Computed impacts for {} ({} tokens): {} kWh",
        model.name(),
        request.output_token_count,
        impacts.request_energy
    );

    Ok(ImpactReport {
        model: model.name().to_string(),
        provider: model.provider(),
        output_tokens: request.output_token_count,
        measured_latency_seconds: request.measured_latency_seconds,
        impacts,
        warnings: model.warnings().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use impact_core::Stage;

    fn catalog() -> ModelCatalog {
        ModelCatalog::from_json_str(
            r#"{
                "aliases": [{"provider": "mistralai", "name": "open-mixtral-8x22b", "alias": "mixtral-8x22b"}],
                "models": [
                    {"type": "model", "provider": "mistralai", "name": "open-mixtral-8x22b",
                     "architecture": {"type": "moe", "parameters": {"total": 140.6, "active": 39.1}},
                     "warnings": [{"code": "model-arch-not-released", "message": "estimated"}]},
                    {"type": "model", "provider": "openai", "name": "gpt-4",
                     "architecture": {"type": "moe", "parameters": {"total": 1760.8, "active": {"min": 220, "max": 880.5}}}}
                ]
            }"#,
        )
        .unwrap()
    }

    fn args(model: &str, provider: Option<Provider>) -> ComputeArgs {
        ComputeArgs {
            model: model.to_string(),
            provider,
            output_tokens: 100,
            latency_seconds: 5.0,
            geography: "USA".to_string(),
        }
    }

    #[test]
    fn test_build_report_resolves_alias() {
        let report = build_report(
            &catalog(),
            &ImpactEngine::default(),
            &HardwareProfile::generic(),
            args("mixtral-8x22b", None),
        )
        .unwrap();

        assert_eq!(report.model, "open-mixtral-8x22b");
        assert_eq!(report.provider, Provider::MistralAi);
        assert_eq!(report.impacts.accelerators_required, 3);
        assert_eq!(report.metric_rows().len(), 3);
    }

    #[test]
    fn test_build_report_checks_provider() {
        let err = build_report(
            &catalog(),
            &ImpactEngine::default(),
            &HardwareProfile::generic(),
            args("gpt-4", Some(Provider::Anthropic)),
        )
        .unwrap_err();
        assert!(err.to_string().contains("anthropic/gpt-4"));
    }

    #[test]
    fn test_build_report_surfaces_stage_failure() {
        let small = HardwareProfile::builder().available_accelerator_count(8).build();
        let err = build_report(
            &catalog(),
            &ImpactEngine::default(),
            &small,
            args("gpt-4", Some(Provider::OpenAi)),
        )
        .unwrap_err();

        let core = err.downcast_ref::<impact_core::Error>().unwrap();
        assert_eq!(core.stage(), Some(Stage::ServerEnergy));
    }

    #[test]
    fn test_report_serializes_flat() {
        let report = build_report(
            &catalog(),
            &ImpactEngine::default(),
            &HardwareProfile::generic(),
            args("open-mixtral-8x22b", None),
        )
        .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["model"], "open-mixtral-8x22b");
        assert_eq!(json["provider"], "mistralai");
        assert!(json["gwp"]["total"]["max"].is_number());
        assert!(json["request_energy"]["min"].is_number());
    }

    #[test]
    fn test_report_carries_model_warnings() {
        let catalog = catalog();
        let engine = ImpactEngine::default();
        let hardware = HardwareProfile::generic();

        let mixtral = build_report(&catalog, &engine, &hardware, args("open-mixtral-8x22b", None)).unwrap();
        assert_eq!(mixtral.warnings.len(), 1);
        assert_eq!(mixtral.warnings[0].code, "model-arch-not-released");
        assert_eq!(serde_json::to_value(&mixtral).unwrap()["warnings"][0]["message"], "estimated");

        let gpt4 = build_report(&catalog, &engine, &hardware, args("gpt-4", None)).unwrap();
        assert!(gpt4.warnings.is_empty());
        assert!(serde_json::to_value(&gpt4).unwrap().get("warnings").is_none());
    }
}
