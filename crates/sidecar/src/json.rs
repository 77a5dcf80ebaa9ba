use crate::{Result, SidecarError, SidecarWriter, UpsertOutcome};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::fs;
use std::path::Path;

const INDENT: &[u8] = b"    ";

/// Writes sidecars in place: the whole document is read, one key is set and
/// the whole document is written back with key order kept.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSidecarWriter;

impl JsonSidecarWriter {
    pub fn new() -> Self {
        Self
    }

    fn read(path: &Path) -> Result<serde_json::Map<String, Value>> {
        let raw = fs::read(path).map_err(|err| SidecarError::io(path, err))?;
        match serde_json::from_slice(&raw).map_err(|err| SidecarError::json(path, err))? {
            Value::Object(map) => Ok(map),
            _ => Err(SidecarError::NotAnObject(path.to_path_buf())),
        }
    }

    fn write(path: &Path, doc: &serde_json::Map<String, Value>) -> Result<()> {
        let mut out = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(INDENT));
        doc.serialize(&mut serializer)
            .map_err(|err| SidecarError::json(path, err))?;
        out.push(b'\n');
        fs::write(path, out).map_err(|err| SidecarError::io(path, err))
    }
}

impl SidecarWriter for JsonSidecarWriter {
    fn upsert(&self, path: &Path, field: &str, value: &Value) -> Result<UpsertOutcome> {
        let mut doc = Self::read(path)?;

        let outcome = match doc.get(field) {
            Some(existing) if existing == value => {
                log::debug!("{field} already up to date in {}", path.display());
                return Ok(UpsertOutcome::Unchanged);
            }
            Some(existing) => {
                log::warn!(
                    "Replacing {field}: {existing} with {value} in {}",
                    path.display()
                );
                UpsertOutcome::Replaced {
                    previous: existing.clone(),
                }
            }
            None => {
                log::info!("Inserting {field}: {value} in {}", path.display());
                UpsertOutcome::Inserted
            }
        };

        doc.insert(field.to_string(), value.clone());
        Self::write(path, &doc)?;
        Ok(outcome)
    }
}
