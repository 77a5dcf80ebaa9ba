use crate::{
    pairing_key, Acquisition, BidsEntities, Catalog, CatalogConfig, CatalogError, FieldmapFile,
    Result,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Datatype {
    Func,
    Fmap,
}

impl Datatype {
    fn from_dir_name(name: &str) -> Option<Self> {
        match name {
            "func" => Some(Self::Func),
            "fmap" => Some(Self::Fmap),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct IndexedFile {
    path: PathBuf,
    datatype: Datatype,
    entities: BidsEntities,
}

/// Catalog over a BIDS dataset on disk.
///
/// The directory tree is walked once at `open`; scan metadata (the order
/// key) is read from each file's sidecar when a query returns it.
pub struct BidsCatalog {
    root: PathBuf,
    config: CatalogConfig,
    subjects: BTreeMap<String, BTreeSet<String>>,
    files: Vec<IndexedFile>,
}

impl BidsCatalog {
    pub fn open(root: impl AsRef<Path>, config: CatalogConfig) -> Result<Self> {
        config.validate().map_err(CatalogError::InvalidConfig)?;

        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(CatalogError::InvalidRoot(root.display().to_string()));
        }

        let mut subjects: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut files = Vec::new();

        let walker = WalkDir::new(&root)
            .min_depth(1)
            .max_depth(4)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry));

        for entry in walker {
            let entry = entry?;
            let depth = entry.depth();
            let Some(name) = entry.file_name().to_str() else {
                log::debug!("Skipping non UTF-8 path {}", entry.path().display());
                continue;
            };

            if entry.file_type().is_dir() {
                match depth {
                    1 => {
                        if let Some(label) = name.strip_prefix("sub-") {
                            subjects.entry(label.to_string()).or_default();
                        }
                    }
                    2 => {
                        let subject = parent_label(entry.path(), "sub-");
                        if let (Some(subject), Some(session)) = (subject, name.strip_prefix("ses-"))
                        {
                            subjects
                                .entry(subject)
                                .or_default()
                                .insert(session.to_string());
                        }
                    }
                    _ => {}
                }
                continue;
            }

            if let Some(file) = index_file(&entry, name, &config) {
                files.push(file);
            }
        }

        log::info!(
            "Indexed {} subjects and {} data files under {}",
            subjects.len(),
            files.len(),
            root.display()
        );

        Ok(Self {
            root,
            config,
            subjects,
            files,
        })
    }

    fn matching<'a>(
        &'a self,
        datatype: Datatype,
        subject: &'a str,
        session: Option<&'a str>,
    ) -> impl Iterator<Item = &'a IndexedFile> + 'a {
        self.files.iter().filter(move |file| {
            file.datatype == datatype
                && file.entities.subject() == Some(subject)
                && session.map_or(true, |s| file.entities.session() == Some(s))
        })
    }

    fn is_functional(&self, file: &IndexedFile) -> bool {
        self.config
            .functional_suffixes
            .iter()
            .any(|suffix| *suffix == file.entities.suffix)
    }

    fn read_order_key(&self, file: &IndexedFile) -> Result<i64> {
        let sidecar = sidecar_path_for(&file.path, &file.entities.extension, &self.config);
        let field = &self.config.order_field;

        let raw = match fs::read(&sidecar) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(CatalogError::missing_metadata(sidecar, field.as_str()));
            }
            Err(err) => return Err(err.into()),
        };
        let doc: serde_json::Value = serde_json::from_slice(&raw)
            .map_err(|err| CatalogError::invalid_metadata(&sidecar, err.to_string()))?;

        match doc.get(field) {
            None | Some(serde_json::Value::Null) => {
                Err(CatalogError::missing_metadata(sidecar, field.as_str()))
            }
            Some(value) => value.as_i64().ok_or_else(|| {
                CatalogError::invalid_metadata(
                    &sidecar,
                    format!("'{field}' must be an integer, found {value}"),
                )
            }),
        }
    }
}

impl Catalog for BidsCatalog {
    fn list_subjects(&self) -> Result<BTreeSet<String>> {
        Ok(self.subjects.keys().cloned().collect())
    }

    fn list_sessions(&self, subject: &str) -> Result<Vec<String>> {
        self.subjects
            .get(subject)
            .map(|sessions| sessions.iter().cloned().collect())
            .ok_or_else(|| CatalogError::UnknownSubject(subject.to_string()))
    }

    fn list_tasks(&self, subject: &str, session: Option<&str>) -> Result<Vec<String>> {
        let tasks: BTreeSet<&str> = self
            .matching(Datatype::Func, subject, session)
            .filter(|file| self.is_functional(file))
            .filter_map(|file| file.entities.task())
            .collect();
        Ok(tasks.into_iter().map(str::to_string).collect())
    }

    fn query_acquisitions(
        &self,
        subject: &str,
        session: Option<&str>,
        task: Option<&str>,
    ) -> Result<Vec<Acquisition>> {
        let mut acquisitions = Vec::new();
        for file in self
            .matching(Datatype::Func, subject, session)
            .filter(|file| self.is_functional(file))
            .filter(|file| task.map_or(true, |t| file.entities.task() == Some(t)))
        {
            acquisitions.push(Acquisition {
                path: file.path.clone(),
                order_key: self.read_order_key(file)?,
                task: file.entities.task().map(str::to_string),
            });
        }
        // Stable: equal keys keep path order from the sorted walk.
        acquisitions.sort_by_key(|acq| acq.order_key);
        Ok(acquisitions)
    }

    fn query_fieldmaps(
        &self,
        subject: &str,
        session: Option<&str>,
        task: Option<&str>,
    ) -> Result<Vec<FieldmapFile>> {
        let mut fieldmaps = Vec::new();
        for file in self
            .matching(Datatype::Fmap, subject, session)
            .filter(|file| task.map_or(true, |t| file.entities.desc() == Some(t)))
        {
            let polarity = file
                .entities
                .direction()
                .and_then(|dir| self.config.polarity_of(dir));
            let Some(polarity) = polarity else {
                log::debug!(
                    "Ignoring fieldmap without a configured direction: {}",
                    file.path.display()
                );
                continue;
            };
            fieldmaps.push(FieldmapFile {
                path: file.path.clone(),
                order_key: self.read_order_key(file)?,
                run_id: pairing_key(
                    file.entities.session(),
                    file.entities.run(),
                    file.entities.desc(),
                ),
                polarity,
            });
        }
        Ok(fieldmaps)
    }

    fn root(&self) -> &Path {
        &self.root
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn parent_label(path: &Path, prefix: &str) -> Option<String> {
    path.parent()?
        .file_name()?
        .to_str()?
        .strip_prefix(prefix)
        .map(str::to_string)
}

fn index_file(entry: &DirEntry, name: &str, config: &CatalogConfig) -> Option<IndexedFile> {
    let depth = entry.depth();
    if depth != 3 && depth != 4 {
        return None;
    }
    let datatype = entry
        .path()
        .parent()
        .and_then(|dir| dir.file_name())
        .and_then(|dir| dir.to_str())
        .and_then(Datatype::from_dir_name)?;
    let extension = config.data_extension_of(name)?;

    match BidsEntities::parse(name, extension) {
        Some(entities) => Some(IndexedFile {
            path: entry.path().to_path_buf(),
            datatype,
            entities,
        }),
        None => {
            log::debug!("Skipping file with non-BIDS name {}", entry.path().display());
            None
        }
    }
}

fn sidecar_path_for(data_path: &Path, extension: &str, config: &CatalogConfig) -> PathBuf {
    let name = data_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let stem = name.strip_suffix(extension).unwrap_or(name);
    data_path.with_file_name(format!("{stem}{}", config.sidecar_extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Polarity;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn write_scan(dir: &Path, name: &str, series: Option<i64>) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(format!("{name}.nii.gz")), b"").unwrap();
        let doc = match series {
            Some(n) => serde_json::json!({ "SeriesNumber": n, "RepetitionTime": 0.8 }),
            None => serde_json::json!({ "RepetitionTime": 0.8 }),
        };
        fs::write(dir.join(format!("{name}.json")), doc.to_string()).unwrap();
    }

    fn dataset() -> tempfile::TempDir {
        let temp = tempdir().unwrap();
        let ses = temp.path().join("sub-01").join("ses-A");
        write_scan(&ses.join("func"), "sub-01_ses-A_task-rest_run-1_bold", Some(12));
        write_scan(&ses.join("func"), "sub-01_ses-A_task-rest_run-2_bold", Some(4));
        write_scan(&ses.join("func"), "sub-01_ses-A_task-nback_bold", Some(8));
        write_scan(&ses.join("func"), "sub-01_ses-A_task-rest_run-1_sbref", Some(11));
        write_scan(&ses.join("fmap"), "sub-01_ses-A_dir-PA_run-1_epi", Some(2));
        write_scan(&ses.join("fmap"), "sub-01_ses-A_dir-AP_run-1_epi", Some(3));
        write_scan(&ses.join("fmap"), "sub-01_ses-A_magnitude1", Some(1));
        write_scan(
            &temp.path().join("sub-02").join("func"),
            "sub-02_task-rest_bold",
            Some(5),
        );
        fs::create_dir_all(temp.path().join(".git").join("sub-03")).unwrap();
        temp
    }

    #[test]
    fn lists_subjects_and_sessions() {
        let temp = dataset();
        let catalog = BidsCatalog::open(temp.path(), CatalogConfig::default()).unwrap();

        let subjects: Vec<String> = catalog.list_subjects().unwrap().into_iter().collect();
        assert_eq!(subjects, vec!["01".to_string(), "02".to_string()]);
        assert_eq!(catalog.list_sessions("01").unwrap(), vec!["A".to_string()]);
        assert!(catalog.list_sessions("02").unwrap().is_empty());
        assert!(matches!(
            catalog.list_sessions("99"),
            Err(CatalogError::UnknownSubject(_))
        ));
    }

    #[test]
    fn acquisitions_are_sorted_by_series_number() {
        let temp = dataset();
        let catalog = BidsCatalog::open(temp.path(), CatalogConfig::default()).unwrap();

        let acquisitions = catalog.query_acquisitions("01", Some("A"), None).unwrap();
        let keys: Vec<i64> = acquisitions.iter().map(|a| a.order_key).collect();
        assert_eq!(keys, vec![4, 8, 12]);
        assert_eq!(acquisitions[1].task.as_deref(), Some("nback"));

        let rest = catalog
            .query_acquisitions("01", Some("A"), Some("rest"))
            .unwrap();
        assert_eq!(rest.len(), 2);
        assert_eq!(
            catalog.list_tasks("01", None).unwrap(),
            vec!["nback".to_string(), "rest".to_string()]
        );
    }

    #[test]
    fn fieldmaps_carry_polarity_and_run() {
        let temp = dataset();
        let catalog = BidsCatalog::open(temp.path(), CatalogConfig::default()).unwrap();

        let fieldmaps = catalog.query_fieldmaps("01", Some("A"), None).unwrap();
        assert_eq!(fieldmaps.len(), 2);
        assert!(fieldmaps.iter().all(|f| f.run_id == "ses-A_run-1"));
        let polarities: Vec<Polarity> = fieldmaps.iter().map(|f| f.polarity).collect();
        assert!(polarities.contains(&Polarity::Positive));
        assert!(polarities.contains(&Polarity::Negative));

        assert!(catalog
            .query_fieldmaps("01", Some("A"), Some("rest"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn task_fieldmaps_without_run_pair_by_desc_and_session() {
        let temp = tempdir().unwrap();
        for ses in ["A", "B"] {
            let fmap = temp.path().join("sub-01").join(format!("ses-{ses}")).join("fmap");
            for (desc, series) in [("rest", 1), ("nback", 5)] {
                let stem = format!("sub-01_ses-{ses}_desc-{desc}");
                write_scan(&fmap, &format!("{stem}_dir-PA_epi"), Some(series));
                write_scan(&fmap, &format!("{stem}_dir-AP_epi"), Some(series + 1));
            }
        }
        let catalog = BidsCatalog::open(temp.path(), CatalogConfig::default()).unwrap();

        let keys: BTreeSet<String> = catalog
            .query_fieldmaps("01", None, None)
            .unwrap()
            .into_iter()
            .map(|f| f.run_id)
            .collect();
        let expected: BTreeSet<String> =
            ["ses-A_desc-nback", "ses-A_desc-rest", "ses-B_desc-nback", "ses-B_desc-rest"]
                .into_iter()
                .map(str::to_string)
                .collect();
        assert_eq!(keys, expected);

        let rest = catalog.query_fieldmaps("01", Some("B"), Some("rest")).unwrap();
        assert_eq!(rest.len(), 2);
        assert!(rest.iter().all(|f| f.run_id == "ses-B_desc-rest"));
    }

    #[test]
    fn missing_order_key_is_reported_at_query_time() {
        let temp = dataset();
        write_scan(
            &temp.path().join("sub-02").join("func"),
            "sub-02_task-rest_run-2_bold",
            None,
        );
        let catalog = BidsCatalog::open(temp.path(), CatalogConfig::default()).unwrap();

        let err = catalog.query_acquisitions("02", None, None).unwrap_err();
        match err {
            CatalogError::MissingMetadata { path, field } => {
                assert_eq!(field, "SeriesNumber");
                assert!(path.ends_with("sub-02_task-rest_run-2_bold.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_missing_root() {
        let temp = tempdir().unwrap();
        let missing = temp.path().join("nope");
        assert!(matches!(
            BidsCatalog::open(&missing, CatalogConfig::default()),
            Err(CatalogError::InvalidRoot(_))
        ));
    }
}
