use crate::Polarity;
use serde::{Deserialize, Serialize};

/// Naming conventions the catalog uses to discover and resolve files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Extensions of imaging data files, longest match wins (".nii.gz" before ".nii")
    pub data_extensions: Vec<String>,

    /// Extension of the metadata document colocated with each data file
    pub sidecar_extension: String,

    /// Sidecar field holding the acquisition-order key
    pub order_field: String,

    /// Suffixes of functional data files (`..._bold.nii.gz`)
    pub functional_suffixes: Vec<String>,

    /// `dir-` label of the positive-polarity fieldmap
    pub positive_label: String,

    /// `dir-` label of the negative-polarity fieldmap
    pub negative_label: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_extensions: vec![".nii.gz".to_string(), ".nii".to_string()],
            sidecar_extension: ".json".to_string(),
            order_field: "SeriesNumber".to_string(),
            functional_suffixes: vec!["bold".to_string()],
            positive_label: "PA".to_string(),
            negative_label: "AP".to_string(),
        }
    }
}

impl CatalogConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.data_extensions.is_empty() {
            return Err("data_extensions must not be empty".to_string());
        }
        for ext in self
            .data_extensions
            .iter()
            .chain(std::iter::once(&self.sidecar_extension))
        {
            if !ext.starts_with('.') || ext.len() < 2 {
                return Err(format!("extension '{ext}' must start with '.'"));
            }
        }
        if self.data_extensions.contains(&self.sidecar_extension) {
            return Err(format!(
                "sidecar_extension '{}' collides with a data extension",
                self.sidecar_extension
            ));
        }
        if self.functional_suffixes.is_empty() {
            return Err("functional_suffixes must not be empty".to_string());
        }
        if self.order_field.trim().is_empty() {
            return Err("order_field must not be empty".to_string());
        }
        if self.positive_label.is_empty() || self.negative_label.is_empty() {
            return Err("polarity labels must not be empty".to_string());
        }
        if self.positive_label == self.negative_label {
            return Err(format!(
                "positive_label and negative_label are both '{}'",
                self.positive_label
            ));
        }
        Ok(())
    }

    /// Data extension `file_name` ends with, longest first.
    pub fn data_extension_of<'a>(&'a self, file_name: &str) -> Option<&'a str> {
        self.data_extensions
            .iter()
            .filter(|ext| file_name.len() > ext.len() && file_name.ends_with(ext.as_str()))
            .max_by_key(|ext| ext.len())
            .map(String::as_str)
    }

    pub fn polarity_of(&self, dir_label: &str) -> Option<Polarity> {
        if dir_label == self.positive_label {
            Some(Polarity::Positive)
        } else if dir_label == self.negative_label {
            Some(Polarity::Negative)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(CatalogConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_identical_polarity_labels() {
        let config = CatalogConfig {
            negative_label: "PA".to_string(),
            ..CatalogConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("'PA'"), "unexpected message: {err}");
    }

    #[test]
    fn rejects_extension_without_dot() {
        let config = CatalogConfig {
            data_extensions: vec!["nii".to_string()],
            ..CatalogConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn longest_data_extension_wins() {
        let config = CatalogConfig::default();
        assert_eq!(
            config.data_extension_of("sub-01_bold.nii.gz"),
            Some(".nii.gz")
        );
        assert_eq!(config.data_extension_of("sub-01_bold.nii"), Some(".nii"));
        assert_eq!(config.data_extension_of("sub-01_bold.json"), None);
    }

    #[test]
    fn maps_dir_labels_to_polarity() {
        let config = CatalogConfig::default();
        assert_eq!(config.polarity_of("PA"), Some(Polarity::Positive));
        assert_eq!(config.polarity_of("AP"), Some(Polarity::Negative));
        assert_eq!(config.polarity_of("LR"), None);
    }
}
