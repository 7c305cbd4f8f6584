//! Command implementations for the impact CLI

pub mod compute;
pub mod hardware;
pub mod models;

use anyhow::{Context, Result};
use impact_core::{Config, ModelCatalog};
use std::path::Path;
use tracing::debug;

/// Catalog shipped with the binary, used when none is configured
const BUNDLED_CATALOG: &str = include_str!("../../data/models.json");

/// Load the model catalog from `override_path`, then the configured path,
/// then the bundled catalog
pub fn load_catalog(config: &Config, override_path: Option<&Path>) -> Result<ModelCatalog> {
    match override_path.or(config.catalog.path.as_deref()) {
        Some(path) => ModelCatalog::from_path(path)
            .with_context(|| format!("Failed to load model catalog from {}", path.display())),
        None => {
            debug!("No catalog path configured, using bundled catalog");
            ModelCatalog::from_json_str(BUNDLED_CATALOG).context("Bundled model catalog is invalid")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bundled_catalog_loads() {
        let catalog = load_catalog(&Config::default(), None).unwrap();
        assert!(!catalog.is_empty());
        assert!(catalog.load_model("open-mixtral-8x22b").is_ok());
    }

    #[test]
    fn test_bundled_catalog_ships_with_crate() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/models.json");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), BUNDLED_CATALOG);

        let from_file = ModelCatalog::from_path(&path).unwrap();
        assert_eq!(from_file.len(), load_catalog(&Config::default(), None).unwrap().len());
    }

    #[test]
    fn test_override_path_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"models": [{"type": "model", "provider": "cohere", "name": "command-r",
                "architecture": {"type": "dense", "parameters": 35}}]}"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.catalog.path = Some("/nonexistent/models.json".into());
        let catalog = load_catalog(&config, Some(file.path())).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.load_model("command-r").is_ok());
    }

    #[test]
    fn test_missing_catalog_reports_path() {
        let mut config = Config::default();
        config.catalog.path = Some("/nonexistent/models.json".into());
        let err = load_catalog(&config, None).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/models.json"));
    }
}
