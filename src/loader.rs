//! Dataset loading.
//!
//! Named datasets are fetched over HTTP when their path is a URL and read
//! from the data root otherwise. Uploaded files arrive as raw bytes.

use std::path::{Path, PathBuf};

use serde_json::Value;
use url::Url;
use walkdir::WalkDir;

use crate::error::{Result, WorkbenchError};
use crate::export::slugify;
use crate::models::DatasetDescriptor;

const DATASET_EXTENSION: &str = "jsonld";

#[derive(Debug, Clone, PartialEq)]
pub enum DatasetLocation {
    Remote(Url),
    Local(PathBuf),
}

/// Decide where a dataset path points.
pub fn resolve_location(data_root: &Path, path: &str) -> DatasetLocation {
    if let Ok(url) = Url::parse(path) {
        if url.scheme() == "http" || url.scheme() == "https" {
            return DatasetLocation::Remote(url);
        }
    }
    DatasetLocation::Local(data_root.join(path))
}

/// Fetch and parse a named dataset.
pub async fn load_remote(
    client: &reqwest::Client,
    data_root: &Path,
    descriptor: &DatasetDescriptor,
) -> Result<Value> {
    let bytes = match resolve_location(data_root, &descriptor.path) {
        DatasetLocation::Remote(url) => {
            tracing::info!(%url, dataset = %descriptor.id, "fetching dataset");
            let response = client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(WorkbenchError::Load(format!(
                    "{} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("")
                )));
            }
            response.bytes().await?.to_vec()
        }
        DatasetLocation::Local(path) => {
            tracing::info!(path = %path.display(), dataset = %descriptor.id, "reading dataset");
            tokio::fs::read(&path)
                .await
                .map_err(|e| WorkbenchError::Load(format!("{}: {}", path.display(), e)))?
        }
    };

    Ok(serde_json::from_slice(&bytes)?)
}

/// Parse an uploaded file.
pub fn load_local(file_name: &str, bytes: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        WorkbenchError::Load(format!("{} could not be read as UTF-8: {}", file_name, e))
    })?;
    Ok(serde_json::from_str(text)?)
}

/// List `*.jsonld` files under the data root that are not already configured.
pub fn discover_datasets(data_root: &Path, configured: &[DatasetDescriptor]) -> Vec<DatasetDescriptor> {
    let mut found: Vec<DatasetDescriptor> = WalkDir::new(data_root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some(DATASET_EXTENSION))
        .filter_map(|e| {
            let relative = e.path().strip_prefix(data_root).ok()?;
            let path = relative.to_string_lossy().replace('\\', "/");
            if configured.iter().any(|d| d.path == path) {
                return None;
            }
            let label = e.path().file_stem()?.to_string_lossy().to_string();
            Some(DatasetDescriptor {
                id: format!("local-{}", slugify(&path)),
                label,
                path,
            })
        })
        .collect();

    found.sort_by(|a, b| a.path.cmp(&b.path));
    found
}
