use crate::{pairing_key, Acquisition, Catalog, CatalogError, FieldmapFile, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone)]
struct Unit {
    acquisitions: Vec<Acquisition>,
    fieldmaps: Vec<(FieldmapFile, Option<String>)>,
}

/// In-memory catalog. Records are keyed by subject and optional session;
/// queries follow the same ordering contract as [`crate::BidsCatalog`].
#[derive(Debug, Clone)]
pub struct MemoryCatalog {
    root: PathBuf,
    subjects: BTreeMap<String, BTreeMap<Option<String>, Unit>>,
}

impl MemoryCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            subjects: BTreeMap::new(),
        }
    }

    pub fn add_acquisition(
        &mut self,
        subject: &str,
        session: Option<&str>,
        acquisition: Acquisition,
    ) -> &mut Self {
        self.unit_mut(subject, session)
            .acquisitions
            .push(acquisition);
        self
    }

    /// Register a fieldmap; `task` plays the role of the `desc-<task>` tag.
    ///
    /// `fieldmap.run_id` is the bare run label (empty for none) and is
    /// rewritten into the same session-qualified key [`crate::BidsCatalog`]
    /// produces.
    pub fn add_fieldmap(
        &mut self,
        subject: &str,
        session: Option<&str>,
        task: Option<&str>,
        mut fieldmap: FieldmapFile,
    ) -> &mut Self {
        let run = Some(fieldmap.run_id.as_str()).filter(|run| !run.is_empty());
        fieldmap.run_id = pairing_key(session, run, task);
        self.unit_mut(subject, session)
            .fieldmaps
            .push((fieldmap, task.map(str::to_string)));
        self
    }

    fn unit_mut(&mut self, subject: &str, session: Option<&str>) -> &mut Unit {
        self.subjects
            .entry(subject.to_string())
            .or_default()
            .entry(session.map(str::to_string))
            .or_default()
    }

    fn units<'a>(
        &'a self,
        subject: &str,
        session: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Unit> + 'a {
        self.subjects
            .get(subject)
            .into_iter()
            .flat_map(|sessions| sessions.iter())
            .filter(move |(key, _)| session.map_or(true, |s| key.as_deref() == Some(s)))
            .map(|(_, unit)| unit)
    }
}

impl Catalog for MemoryCatalog {
    fn list_subjects(&self) -> Result<BTreeSet<String>> {
        Ok(self.subjects.keys().cloned().collect())
    }

    fn list_sessions(&self, subject: &str) -> Result<Vec<String>> {
        let sessions = self
            .subjects
            .get(subject)
            .ok_or_else(|| CatalogError::UnknownSubject(subject.to_string()))?;
        Ok(sessions.keys().flatten().cloned().collect())
    }

    fn list_tasks(&self, subject: &str, session: Option<&str>) -> Result<Vec<String>> {
        let tasks: BTreeSet<String> = self
            .units(subject, session)
            .flat_map(|unit| unit.acquisitions.iter())
            .filter_map(|acq| acq.task.clone())
            .collect();
        Ok(tasks.into_iter().collect())
    }

    fn query_acquisitions(
        &self,
        subject: &str,
        session: Option<&str>,
        task: Option<&str>,
    ) -> Result<Vec<Acquisition>> {
        let mut acquisitions: Vec<Acquisition> = self
            .units(subject, session)
            .flat_map(|unit| unit.acquisitions.iter())
            .filter(|acq| task.map_or(true, |t| acq.task.as_deref() == Some(t)))
            .cloned()
            .collect();
        acquisitions.sort_by_key(|acq| acq.order_key);
        Ok(acquisitions)
    }

    fn query_fieldmaps(
        &self,
        subject: &str,
        session: Option<&str>,
        task: Option<&str>,
    ) -> Result<Vec<FieldmapFile>> {
        Ok(self
            .units(subject, session)
            .flat_map(|unit| unit.fieldmaps.iter())
            .filter(|(_, desc)| task.map_or(true, |t| desc.as_deref() == Some(t)))
            .map(|(fieldmap, _)| fieldmap.clone())
            .collect())
    }

    fn root(&self) -> &Path {
        &self.root
    }
}
