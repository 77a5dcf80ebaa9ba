use crate::{Result, SidecarError, SidecarWriter, UpsertOutcome};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// An upsert that would have been performed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedWrite {
    pub path: PathBuf,
    pub field: String,
    pub value: serde_json::Value,
}

/// Writer that touches nothing: intended writes are recorded and, when
/// `echo` is on, printed to stdout as one JSON object per line.
#[derive(Debug, Default)]
pub struct DryRunWriter {
    echo: bool,
    recorded: Mutex<Vec<RecordedWrite>>,
}

impl DryRunWriter {
    pub fn new(echo: bool) -> Self {
        Self {
            echo,
            recorded: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded(&self) -> Vec<RecordedWrite> {
        self.recorded
            .lock()
            .map(|writes| writes.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl SidecarWriter for DryRunWriter {
    fn upsert(&self, path: &Path, field: &str, value: &serde_json::Value) -> Result<UpsertOutcome> {
        let write = RecordedWrite {
            path: path.to_path_buf(),
            field: field.to_string(),
            value: value.clone(),
        };

        if self.echo {
            let line =
                serde_json::to_string(&write).map_err(|err| SidecarError::json(path, err))?;
            write_line(&mut io::stdout().lock(), &line).map_err(SidecarError::OutputError)?;
        }
        log::debug!("Dry run: {field} -> {}", path.display());

        match self.recorded.lock() {
            Ok(mut writes) => writes.push(write),
            Err(poisoned) => poisoned.into_inner().push(write),
        }
        Ok(UpsertOutcome::DryRun)
    }
}

/// Write one line and flush. A closed pipe (`| head`) ends the preview
/// without an error.
fn write_line(out: &mut impl Write, line: &str) -> io::Result<()> {
    match out
        .write_all(line.as_bytes())
        .and_then(|_| out.write_all(b"\n"))
        .and_then(|_| out.flush())
    {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn records_without_touching_disk() {
        let writer = DryRunWriter::new(false);
        let path = Path::new("/nonexistent/sub-01_dir-AP_epi.json");

        let outcome = writer.upsert(path, "IntendedFor", &json!(["func/x.nii.gz"])).unwrap();
        assert_eq!(outcome, UpsertOutcome::DryRun);
        assert_eq!(
            writer.recorded(),
            vec![RecordedWrite {
                path: path.to_path_buf(),
                field: "IntendedFor".to_string(),
                value: json!(["func/x.nii.gz"]),
            }]
        );
        assert!(!path.exists());
    }

    struct FailingOutput(io::ErrorKind);

    impl Write for FailingOutput {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(self.0))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn closed_pipe_ends_output_quietly() {
        let mut out = FailingOutput(io::ErrorKind::BrokenPipe);
        assert!(write_line(&mut out, "{}").is_ok());
    }

    #[test]
    fn other_output_errors_propagate() {
        let mut out = FailingOutput(io::ErrorKind::PermissionDenied);
        let err = write_line(&mut out, "{}").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);

        let mut buffer = Vec::new();
        write_line(&mut buffer, r#"{"a":1}"#).unwrap();
        assert_eq!(buffer, b"{\"a\":1}\n".to_vec());
    }
}
