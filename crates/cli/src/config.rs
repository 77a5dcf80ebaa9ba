use anyhow::{bail, Context as AnyhowContext, Result};
use intended_for_catalog::CatalogConfig;
use intended_for_pairing::DEFAULT_FIELD;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "INTENDED_FOR_CONFIG";

/// Run configuration, read from TOML. Every field has a default.
///
/// ```toml
/// field = "IntendedFor"
///
/// [catalog]
/// order_field = "SeriesNumber"
/// positive_label = "PA"
/// negative_label = "AP"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntendedForConfig {
    /// Sidecar field receiving the acquisition list
    pub field: String,

    pub catalog: CatalogConfig,
}

impl Default for IntendedForConfig {
    fn default() -> Self {
        Self {
            field: DEFAULT_FIELD.to_string(),
            catalog: CatalogConfig::default(),
        }
    }
}

impl IntendedForConfig {
    /// Load from `explicit`, else from `$INTENDED_FOR_CONFIG`, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));

        let config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.field.trim().is_empty() {
            bail!("config: field must not be empty");
        }
        if let Err(reason) = self.catalog.validate() {
            bail!("config: catalog: {reason}");
        }
        Ok(())
    }
}
