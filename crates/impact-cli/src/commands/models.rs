//! Model catalog commands

use crate::output::{format_parameters, Formattable, OutputFormat, OutputFormatter};
use anyhow::Result;
use impact_core::{AiModel, ModelCatalog, Provider};
use serde::Serialize;
use std::sync::Arc;

impl Formattable for Arc<AiModel> {
    fn table_headers() -> Vec<String> {
        ["Name", "Provider", "Architecture", "Total", "Active", "Memory", "Warnings"]
            .iter()
            .map(|h| h.to_string())
            .collect()
    }

    fn table_row(&self) -> Vec<String> {
        vec![
            self.name().to_string(),
            self.provider().to_string(),
            self.architecture_type().to_string(),
            format_parameters(self.total_parameters()),
            format_parameters(self.active_parameters()),
            format!("{:.1} GB", self.required_memory_gb()),
            self.warnings().len().to_string(),
        ]
    }

    fn key_value_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("Name".to_string(), self.name().to_string()),
            ("Provider".to_string(), self.provider().to_string()),
            ("Architecture".to_string(), self.architecture_type().to_string()),
            ("Total Parameters".to_string(), format_parameters(self.total_parameters())),
            ("Active Parameters".to_string(), format_parameters(self.active_parameters())),
            ("Quantization".to_string(), format!("{} bits", self.quantization_bits())),
            ("Required Memory".to_string(), format!("{:.1} GB", self.required_memory_gb())),
        ]
    }
}

/// One catalog entry with the aliases that resolve to it
#[derive(Debug, Serialize)]
pub struct ModelDetails {
    #[serde(flatten)]
    model: Arc<AiModel>,
    aliases: Vec<String>,
}

impl ModelDetails {
    pub fn new(catalog: &ModelCatalog, model: Arc<AiModel>) -> Self {
        let aliases = catalog
            .aliases_of(model.name())
            .into_iter()
            .map(str::to_string)
            .collect();
        Self { model, aliases }
    }
}

impl Formattable for ModelDetails {
    fn table_headers() -> Vec<String> {
        Arc::<AiModel>::table_headers()
    }

    fn table_row(&self) -> Vec<String> {
        self.model.table_row()
    }

    fn key_value_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.model.key_value_pairs();
        if !self.aliases.is_empty() {
            pairs.push(("Aliases".to_string(), self.aliases.join(", ")));
        }
        for warning in self.model.warnings() {
            pairs.push((format!("Warning [{}]", warning.code), warning.message.clone()));
        }
        for source in self.model.sources() {
            pairs.push(("Source".to_string(), source.clone()));
        }
        pairs
    }
}

/// List catalog models, optionally restricted to one provider
pub fn list_models(
    catalog: &ModelCatalog,
    provider: Option<Provider>,
    output_format: OutputFormat,
) -> Result<()> {
    let formatter = OutputFormatter::new(output_format);
    let models = filter_models(catalog, provider);
    formatter.print_list(&models)
}

/// Describe one catalog model by name or alias
pub fn describe_model(catalog: &ModelCatalog, name: &str, output_format: OutputFormat) -> Result<()> {
    let formatter = OutputFormatter::new(output_format);
    let model = catalog.load_model(name)?;
    formatter.print_item(&ModelDetails::new(catalog, model))
}

fn filter_models(catalog: &ModelCatalog, provider: Option<Provider>) -> Vec<Arc<AiModel>> {
    catalog
        .models()
        .into_iter()
        .filter(|m| provider.map_or(true, |p| m.provider() == p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use impact_core::{ArchitectureType, Interval};

    fn catalog() -> ModelCatalog {
        ModelCatalog::from_json_str(
            r#"{
                "aliases": [{"provider": "mistralai", "name": "open-mixtral-8x22b", "alias": "mixtral-8x22b"}],
                "models": [
                    {"type": "model", "provider": "mistralai", "name": "open-mixtral-8x22b",
                     "architecture": {"type": "moe", "parameters": {"total": 140.6, "active": 39.1}},
                     "warnings": [{"code": "model-arch-not-released", "message": "estimated"}],
                     "sources": ["https://mistral.ai/news/mixtral-8x22b/"]},
                    {"type": "model", "provider": "cohere", "name": "command-r",
                     "architecture": {"type": "dense", "parameters": {"total": 35, "active": 35}}}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_filter_models_by_provider() {
        let catalog = catalog();
        assert_eq!(filter_models(&catalog, None).len(), 2);

        let mistral = filter_models(&catalog, Some(Provider::MistralAi));
        assert_eq!(mistral.len(), 1);
        assert_eq!(mistral[0].name(), "open-mixtral-8x22b");
        assert!(filter_models(&catalog, Some(Provider::Google)).is_empty());
    }

    #[test]
    fn test_model_details_include_aliases_and_warnings() {
        let catalog = catalog();
        let details = ModelDetails::new(&catalog, catalog.load_model("mixtral-8x22b").unwrap());
        let pairs = details.key_value_pairs();

        assert!(pairs.contains(&("Aliases".to_string(), "mixtral-8x22b".to_string())));
        assert!(pairs
            .iter()
            .any(|(k, v)| k == "Warning [model-arch-not-released]" && v == "estimated"));
        assert!(pairs.iter().any(|(k, _)| k == "Source"));

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["name"], "open-mixtral-8x22b");
        assert_eq!(json["aliases"][0], "mixtral-8x22b");
    }

    #[test]
    fn test_model_row() {
        let model = Arc::new(AiModel::new(
            "tiny",
            Provider::HuggingFaceHub,
            ArchitectureType::Dense,
            Interval::point(10.0),
            Interval::point(10.0),
        ));
        let row = model.table_row();
        assert_eq!(row.len(), Arc::<AiModel>::table_headers().len());
        assert_eq!(row[1], "huggingface_hub");
        assert_eq!(row[5], "12.0 GB");
    }

    #[test]
    fn test_describe_unknown_model_fails() {
        let err = describe_model(&catalog(), "gpt-17", OutputFormat::Json).unwrap_err();
        assert!(err.to_string().contains("Model not found: gpt-17"));
    }
}
