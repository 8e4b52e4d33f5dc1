//! Configuration loading.
//!
//! Settings resolve in priority order: command-line argument, environment
//! variable (both handled by clap in `main`), TOML config file, then the
//! compiled defaults below.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, WorkbenchError};
use crate::models::DatasetDescriptor;
use crate::{DATA_DIR, DEFAULT_BIND};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind: String,
    /// Directory holding dataset files; relative dataset paths resolve here
    pub data_root: PathBuf,
    /// Scan `data_root` for `*.jsonld` files and offer them as datasets
    pub discover: bool,
    pub datasets: Vec<DatasetDescriptor>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            data_root: PathBuf::from(DATA_DIR),
            discover: true,
            datasets: builtin_datasets(),
        }
    }
}

/// Datasets offered when no config file lists any.
pub fn builtin_datasets() -> Vec<DatasetDescriptor> {
    vec![DatasetDescriptor {
        id: "annals-connacht".to_string(),
        label: "Annals of Connacht (1224-1544)".to_string(),
        path: "annals_ireland/annals_connacht.jsonld".to_string(),
    }]
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| WorkbenchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or fall back to defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|e| {
            WorkbenchError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), datasets = config.datasets.len(), "loaded config file");
        Ok(config)
    }

    pub fn with_overrides(mut self, bind: Option<String>, data_root: Option<PathBuf>) -> Self {
        if let Some(bind) = bind {
            self.bind = bind;
        }
        if let Some(data_root) = data_root {
            self.data_root = data_root;
        }
        self
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for dataset in &self.datasets {
            if dataset.id.trim().is_empty() || dataset.path.trim().is_empty() {
                return Err(WorkbenchError::Config(format!(
                    "dataset '{}' needs both an id and a path",
                    dataset.label
                )));
            }
            if !seen.insert(dataset.id.as_str()) {
                return Err(WorkbenchError::Config(format!("duplicate dataset id '{}'", dataset.id)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(config.data_root, PathBuf::from(DATA_DIR));
        assert_eq!(config.datasets[0].id, "annals-connacht");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str("bind = \"0.0.0.0:8080\"\n").unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert!(config.discover);
        assert_eq!(config.datasets, builtin_datasets());
    }

    #[test]
    fn test_dataset_list() {
        let config = Config::from_toml_str(
            r#"
data_root = "/srv/datasets"
discover = false

[[datasets]]
id = "au"
label = "Annals of Ulster"
path = "https://example.org/annals_ulster.jsonld"
"#,
        )
        .unwrap();
        assert_eq!(config.data_root, PathBuf::from("/srv/datasets"));
        assert!(!config.discover);
        assert_eq!(config.datasets.len(), 1);
        assert_eq!(config.datasets[0].label, "Annals of Ulster");
    }

    #[test]
    fn test_invalid_configs() {
        let duplicate = r#"
[[datasets]]
id = "a"
label = "A"
path = "a.jsonld"

[[datasets]]
id = "a"
label = "B"
path = "b.jsonld"
"#;
        assert!(matches!(Config::from_toml_str(duplicate), Err(WorkbenchError::Config(_))));
        assert!(Config::from_toml_str("bind = [").is_err());
    }

    #[test]
    fn test_load_from_file_and_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind = \"127.0.0.1:9999\"").unwrap();

        let config = Config::load(Some(file.path()))
            .unwrap()
            .with_overrides(None, Some(PathBuf::from("elsewhere")));
        assert_eq!(config.bind, "127.0.0.1:9999");
        assert_eq!(config.data_root, PathBuf::from("elsewhere"));

        assert!(Config::load(Some(Path::new("/definitely/missing.toml"))).is_err());
        assert_eq!(Config::load(None).unwrap(), Config::default());
    }
}
