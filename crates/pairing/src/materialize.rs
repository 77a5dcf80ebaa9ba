use crate::assignment::Assignment;
use crate::error::{PairingError, Result};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_FIELD: &str = "IntendedFor";

/// One sidecar upsert produced from an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidecarWrite {
    pub sidecar_path: PathBuf,
    pub field: String,
    pub value: Vec<String>,
}

/// Turns an [`Assignment`] into per-fieldmap-file sidecar writes.
#[derive(Debug, Clone)]
pub struct Materializer {
    root_prefix: PathBuf,
    strip_subject: bool,
    data_extensions: Vec<String>,
    sidecar_extension: String,
    field: String,
}

impl Materializer {
    /// Acquisition paths are written relative to `root_prefix`.
    pub fn new(root_prefix: impl Into<PathBuf>) -> Self {
        Self {
            root_prefix: root_prefix.into(),
            strip_subject: false,
            data_extensions: vec![".nii.gz".to_string(), ".nii".to_string()],
            sidecar_extension: ".json".to_string(),
            field: DEFAULT_FIELD.to_string(),
        }
    }

    /// Drop a leading `sub-<label>` segment from relative paths.
    pub fn strip_subject(mut self, strip: bool) -> Self {
        self.strip_subject = strip;
        self
    }

    pub fn with_extensions(
        mut self,
        data_extensions: impl IntoIterator<Item = impl Into<String>>,
        sidecar_extension: impl Into<String>,
    ) -> Self {
        self.data_extensions = data_extensions.into_iter().map(Into::into).collect();
        self.sidecar_extension = sidecar_extension.into();
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn materialize(&self, assignment: &Assignment<'_>) -> Result<Vec<SidecarWrite>> {
        let mut writes = Vec::new();
        for (fieldmap, acquisitions) in assignment.per_fieldmap_file() {
            let value = acquisitions
                .iter()
                .map(|acq| self.relative_path(&acq.path))
                .collect::<Result<Vec<_>>>()?;
            writes.push(SidecarWrite {
                sidecar_path: self.sidecar_path(&fieldmap.path)?,
                field: self.field.clone(),
                value,
            });
        }
        Ok(writes)
    }

    /// `.../x_epi.nii.gz` becomes `.../x_epi.json`.
    pub fn sidecar_path(&self, data_path: &Path) -> Result<PathBuf> {
        let name = data_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| PairingError::UnknownDataExtension(data_path.to_path_buf()))?;

        let stem = self
            .data_extensions
            .iter()
            .filter_map(|ext| name.strip_suffix(ext.as_str()))
            .filter(|stem| !stem.is_empty())
            .min_by_key(|stem| stem.len())
            .ok_or_else(|| PairingError::UnknownDataExtension(data_path.to_path_buf()))?;

        Ok(data_path.with_file_name(format!("{stem}{}", self.sidecar_extension)))
    }

    /// `/data/sub-01/ses-A/func/x.nii.gz` relative to `/data/sub-01` is
    /// `ses-A/func/x.nii.gz`, always `/`-separated.
    pub fn relative_path(&self, path: &Path) -> Result<String> {
        let relative = path
            .strip_prefix(&self.root_prefix)
            .map_err(|_| PairingError::OutsideRoot {
                path: path.to_path_buf(),
                root: self.root_prefix.clone(),
            })?;

        let mut segments: Vec<String> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if self.strip_subject && segments.len() > 1 && segments[0].starts_with("sub-") {
            segments.remove(0);
        }
        Ok(segments.join("/"))
    }
}
