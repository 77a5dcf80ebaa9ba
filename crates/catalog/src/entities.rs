/// Entities of a BIDS filename: `sub-01_ses-A_task-rest_run-2_bold.nii.gz`
/// parses to `[(sub, 01), (ses, A), (task, rest), (run, 2)]`, suffix `bold`,
/// extension `.nii.gz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidsEntities {
    pairs: Vec<(String, String)>,
    pub suffix: String,
    pub extension: String,
}

impl BidsEntities {
    /// Parse `file_name`, which must end in `extension`. Returns `None` for
    /// names that do not follow the `key-value_..._suffix` shape.
    pub fn parse(file_name: &str, extension: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(extension)?;
        let mut parts: Vec<&str> = stem.split('_').collect();
        let suffix = parts.pop()?;
        if suffix.is_empty() || suffix.contains('-') {
            return None;
        }

        let mut pairs = Vec::with_capacity(parts.len());
        for part in parts {
            let (key, value) = part.split_once('-')?;
            if key.is_empty() || value.is_empty() || value.contains('-') {
                return None;
            }
            pairs.push((key.to_string(), value.to_string()));
        }
        if pairs.first().map(|(key, _)| key.as_str()) != Some("sub") {
            return None;
        }

        Some(Self {
            pairs,
            suffix: suffix.to_string(),
            extension: extension.to_string(),
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn subject(&self) -> Option<&str> {
        self.get("sub")
    }

    pub fn session(&self) -> Option<&str> {
        self.get("ses")
    }

    pub fn task(&self) -> Option<&str> {
        self.get("task")
    }

    pub fn run(&self) -> Option<&str> {
        self.get("run")
    }

    pub fn direction(&self) -> Option<&str> {
        self.get("dir")
    }

    pub fn desc(&self) -> Option<&str> {
        self.get("desc")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_functional_name() {
        let e = BidsEntities::parse("sub-01_ses-A_task-rest_run-2_bold.nii.gz", ".nii.gz")
            .expect("valid name");
        assert_eq!(e.subject(), Some("01"));
        assert_eq!(e.session(), Some("A"));
        assert_eq!(e.task(), Some("rest"));
        assert_eq!(e.run(), Some("2"));
        assert_eq!(e.suffix, "bold");
        assert_eq!(e.extension, ".nii.gz");
    }

    #[test]
    fn parses_fieldmap_name_without_session() {
        let e = BidsEntities::parse("sub-02_desc-nback_dir-PA_run-1_epi.nii", ".nii")
            .expect("valid name");
        assert_eq!(e.session(), None);
        assert_eq!(e.direction(), Some("PA"));
        assert_eq!(e.desc(), Some("nback"));
        assert_eq!(e.suffix, "epi");
    }

    #[test]
    fn rejects_malformed_names() {
        assert_eq!(BidsEntities::parse("notes.nii.gz", ".nii.gz"), None);
        assert_eq!(BidsEntities::parse("sub-01_bold.json", ".nii.gz"), None);
        assert_eq!(BidsEntities::parse("sub-01_task_bold.nii.gz", ".nii.gz"), None);
        assert_eq!(BidsEntities::parse("task-rest_sub-01_bold.nii.gz", ".nii.gz"), None);
        assert_eq!(BidsEntities::parse("sub-01_run-1.nii.gz", ".nii.gz"), None);
    }
}
