use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::paths;

/// Root configuration structure for sweep.json
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SweepConfig {
    #[serde(default)]
    pub indices: IndicesConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

/// Settings for the Elasticsearch index cleanup path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndicesConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_container")]
    pub container: String,

    /// `_cat/indices` columns requested after the index name; they also
    /// name the record attributes.
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,
}

impl Default for IndicesConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            container: default_container(),
            columns: default_columns(),
        }
    }
}

/// Settings for the container-registry purge path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Repositories whose name contains this marker are eligible for purge-all.
    #[serde(default = "default_group_marker")]
    pub group_marker: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            group_marker: default_group_marker(),
            profile: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl CacheConfig {
    /// Resolve the listing cache file, expanding `~` in configured paths.
    pub fn resolve_path(&self) -> crate::Result<PathBuf> {
        match self.path.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(path) => Ok(PathBuf::from(shellexpand::tilde(path).to_string())),
            None => paths::listing_cache(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_namespace() -> String {
    "openshift-logging".to_string()
}

fn default_container() -> String {
    "elasticsearch".to_string()
}

fn default_columns() -> Vec<String> {
    vec!["creation.date.string".to_string(), "store.size".to_string()]
}

fn default_group_marker() -> String {
    "snapshot".to_string()
}

// =============================================================================
// Loading functions
// =============================================================================

/// Load the full sweep.json config, falling back to defaults on any error.
pub fn load_config() -> SweepConfig {
    match load_config_from_file() {
        Ok(config) => config,
        Err(err) => {
            tracing::debug!(code = err.code.as_str(), "using built-in config defaults");
            SweepConfig::default()
        }
    }
}

/// Attempt to load config from sweep.json file.
fn load_config_from_file() -> crate::Result<SweepConfig> {
    let path = paths::sweep_json()?;

    if !path.exists() {
        return Err(crate::Error::internal_io(
            "sweep.json not found",
            Some(path.display().to_string()),
        ));
    }

    let content = fs::read_to_string(&path).map_err(|e| {
        crate::Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;

    parse_config(&content, &path.display().to_string())
}

/// Parse sweep.json content; every missing key takes its default.
pub fn parse_config(content: &str, origin: &str) -> crate::Result<SweepConfig> {
    serde_json::from_str(content).map_err(|e| crate::Error::config_invalid_json(origin, e))
}

/// Save config to sweep.json file (creates if missing).
pub fn save_config(config: &SweepConfig) -> crate::Result<()> {
    let path = paths::sweep_json()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            crate::Error::internal_io(e.to_string(), Some(format!("create {}", parent.display())))
        })?;
    }

    let content = serde_json::to_string_pretty(config).map_err(|e| {
        crate::Error::internal_json(e.to_string(), Some("serialize sweep.json".to_string()))
    })?;

    fs::write(&path, content).map_err(|e| {
        crate::Error::internal_io(e.to_string(), Some(format!("write {}", path.display())))
    })?;

    Ok(())
}

/// Check if sweep.json file exists
pub fn config_exists() -> bool {
    paths::sweep_json().map(|p| p.exists()).unwrap_or(false)
}

/// Delete sweep.json file (reset to defaults)
pub fn reset_config() -> crate::Result<bool> {
    let path = paths::sweep_json()?;

    if path.exists() {
        fs::remove_file(&path).map_err(|e| {
            crate::Error::internal_io(e.to_string(), Some(format!("delete {}", path.display())))
        })?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Get the path to sweep.json (for display purposes)
pub fn config_path() -> crate::Result<String> {
    Ok(paths::sweep_json()?.display().to_string())
}
