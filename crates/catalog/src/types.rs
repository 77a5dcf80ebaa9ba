use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One functional scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acquisition {
    /// Data file path, unique within a session
    pub path: PathBuf,

    /// Acquisition series number; establishes chronological order
    pub order_key: i64,

    /// Task label (`task-<label>` entity)
    pub task: Option<String>,
}

impl Acquisition {
    pub fn new(path: impl Into<PathBuf>, order_key: i64, task: Option<&str>) -> Self {
        Self {
            path: path.into(),
            order_key,
            task: task.map(str::to_string),
        }
    }
}

/// Phase-encoding direction of a fieldmap file. Fieldmaps come in
/// complementary pairs: one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One calibration scan file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldmapFile {
    pub path: PathBuf,
    pub order_key: i64,

    /// Grouping key tying two complementary files together, built by
    /// [`pairing_key`]. Unique per session, so collapsed sessions never mix.
    pub run_id: String,

    pub polarity: Polarity,
}

impl FieldmapFile {
    pub fn new(
        path: impl Into<PathBuf>,
        order_key: i64,
        run_id: impl Into<String>,
        polarity: Polarity,
    ) -> Self {
        Self {
            path: path.into(),
            order_key,
            run_id: run_id.into(),
            polarity,
        }
    }
}

/// Key under which two complementary fieldmap files pair up.
///
/// The run label identifies the pair; without one, the `desc-` tag does
/// (task-specific fieldmaps). Both are qualified by session. A session-less
/// file with neither entity gets the empty key: one implicit pair.
pub fn pairing_key(session: Option<&str>, run: Option<&str>, desc: Option<&str>) -> String {
    let mut parts = Vec::with_capacity(2);
    if let Some(session) = session {
        parts.push(format!("ses-{session}"));
    }
    match (run, desc) {
        (Some(run), _) => parts.push(format!("run-{run}")),
        (None, Some(desc)) => parts.push(format!("desc-{desc}")),
        (None, None) => {}
    }
    parts.join("_")
}
