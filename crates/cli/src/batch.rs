use anyhow::{Context as AnyhowContext, Result};
use intended_for_catalog::Catalog;
use intended_for_pairing::{group, Materializer, PairingEngine, Strategy};
use intended_for_sidecar::{SidecarWriter, UpsertOutcome};
use serde::Serialize;
use std::fmt;

/// How sessions of a subject map onto work units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// One unit per session
    #[default]
    PerSession,

    /// All sessions of a subject form a single unit
    Collapsed,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub strategy: Strategy,

    /// Bare subject labels to keep (no `sub-` prefix); `None` keeps all
    pub participants: Option<Vec<String>>,

    /// Bare session labels to keep; `None` keeps all
    pub sessions: Option<Vec<String>>,

    /// When non-empty, every subject/session is split into one unit per task
    pub tasks: Vec<String>,

    pub session_mode: SessionMode,

    /// Sidecar field to write
    pub field: String,

    pub data_extensions: Vec<String>,
    pub sidecar_extension: String,
}

impl BatchOptions {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            participants: None,
            sessions: None,
            tasks: Vec::new(),
            session_mode: SessionMode::PerSession,
            field: intended_for_pairing::DEFAULT_FIELD.to_string(),
            data_extensions: vec![".nii.gz".to_string(), ".nii".to_string()],
            sidecar_extension: ".json".to_string(),
        }
    }
}

/// One subject/session (optionally task) processed start to finish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkUnit {
    pub subject: String,

    /// `None` for session-less subjects and collapsed sessions
    pub session: Option<String>,

    pub task: Option<String>,

    /// The subject has no session directories
    pub sessionless: bool,
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.subject)?;
        match (&self.session, self.sessionless) {
            (Some(session), _) => write!(f, " ses-{session}")?,
            (None, true) => f.write_str(" (no sessions)")?,
            (None, false) => f.write_str(" (all sessions)")?,
        }
        if let Some(task) = &self.task {
            write!(f, " task-{task}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteCounts {
    pub inserted: usize,
    pub replaced: usize,
    pub unchanged: usize,
    pub dry_run: usize,
}

impl WriteCounts {
    fn record(&mut self, outcome: &UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Replaced { .. } => self.replaced += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
            UpsertOutcome::DryRun => self.dry_run += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.inserted + self.replaced + self.unchanged + self.dry_run
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitStatus {
    Written(WriteCounts),
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    pub unit: WorkUnit,
    #[serde(flatten)]
    pub status: UnitStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub units: Vec<UnitReport>,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Written(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&UnitStatus) -> bool) -> usize {
        self.units.iter().filter(|u| pred(&u.status)).count()
    }
}

/// Expand the catalog into work units, applying participant, session and
/// task filters.
pub fn plan_units(catalog: &dyn Catalog, options: &BatchOptions) -> Result<Vec<WorkUnit>> {
    let subjects = catalog.list_subjects().context("Failed to list subjects")?;

    if let Some(wanted) = &options.participants {
        for label in wanted.iter().filter(|label| !subjects.contains(*label)) {
            log::warn!("Participant sub-{label} not found in dataset");
        }
    }

    let task_slots: Vec<Option<String>> = if options.tasks.is_empty() {
        vec![None]
    } else {
        options.tasks.iter().cloned().map(Some).collect()
    };

    let mut units = Vec::new();
    for subject in subjects.iter().filter(|s| {
        options
            .participants
            .as_ref()
            .map_or(true, |wanted| wanted.contains(*s))
    }) {
        let sessions = catalog
            .list_sessions(subject)
            .with_context(|| format!("Failed to list sessions of sub-{subject}"))?;
        let sessionless = sessions.is_empty();
        if sessionless && options.sessions.is_some() {
            log::warn!("Skipping sub-{subject}: no sessions to match the session filter");
            continue;
        }

        let session_slots: Vec<Option<String>> =
            if sessionless || options.session_mode == SessionMode::Collapsed {
                vec![None]
            } else {
                sessions
                    .into_iter()
                    .filter(|session| {
                        options
                            .sessions
                            .as_ref()
                            .map_or(true, |wanted| wanted.contains(session))
                    })
                    .map(Some)
                    .collect()
            };

        for session in &session_slots {
            for task in &task_slots {
                units.push(WorkUnit {
                    subject: subject.clone(),
                    session: session.clone(),
                    task: task.clone(),
                    sessionless,
                });
            }
        }
    }

    log::info!("Planned {} work units", units.len());
    Ok(units)
}

/// Run every unit, catching per-unit failures so the batch always
/// completes. Only planning errors (listing subjects or sessions) are
/// returned.
pub fn run_batch(
    catalog: &dyn Catalog,
    options: &BatchOptions,
    writer: &dyn SidecarWriter,
) -> Result<BatchReport> {
    let units = plan_units(catalog, options)?;
    let engine = PairingEngine::new(options.strategy);

    let mut report = BatchReport::default();
    for unit in units {
        let status = match run_unit(catalog, options, &engine, writer, &unit) {
            Ok(status) => status,
            Err(err) => {
                log::error!("Error pairing {unit}: {err:#}");
                UnitStatus::Failed {
                    error: format!("{err:#}"),
                }
            }
        };
        report.units.push(UnitReport { unit, status });
    }

    log::info!(
        "Batch finished: {} written, {} skipped, {} failed",
        report.written(),
        report.skipped(),
        report.failed()
    );
    Ok(report)
}

fn run_unit(
    catalog: &dyn Catalog,
    options: &BatchOptions,
    engine: &PairingEngine,
    writer: &dyn SidecarWriter,
    unit: &WorkUnit,
) -> Result<UnitStatus> {
    log::info!("Pairing for {unit}");
    let session = unit.session.as_deref();
    let task = unit.task.as_deref();

    let fieldmaps = catalog.query_fieldmaps(&unit.subject, session, task)?;
    if fieldmaps.is_empty() {
        log::warn!("No fieldmaps found for {unit}");
        return Ok(UnitStatus::Skipped {
            reason: "no fieldmaps found".to_string(),
        });
    }
    let groups = group(&fieldmaps)?;

    let acquisitions = catalog.query_acquisitions(&unit.subject, session, task)?;
    if acquisitions.is_empty() {
        log::warn!("No functional acquisitions found for {unit}");
        return Ok(UnitStatus::Skipped {
            reason: "no functional acquisitions found".to_string(),
        });
    }

    let task_order = match (&unit.task, engine.strategy()) {
        (Some(task), _) => vec![task.clone()],
        (None, Strategy::Task) => catalog.list_tasks(&unit.subject, session)?,
        (None, _) => Vec::new(),
    };
    let assignment = engine
        .clone()
        .with_task_order(task_order)
        .pair(&acquisitions, &groups)?;

    let materializer = if unit.sessionless {
        Materializer::new(catalog.root()).strip_subject(true)
    } else {
        Materializer::new(catalog.root().join(format!("sub-{}", unit.subject)))
    }
    .with_extensions(
        options.data_extensions.iter().cloned(),
        options.sidecar_extension.clone(),
    )
    .with_field(options.field.clone());
    let writes = materializer.materialize(&assignment)?;

    let mut counts = WriteCounts::default();
    for write in &writes {
        let value = serde_json::to_value(&write.value)?;
        let outcome = writer
            .upsert(&write.sidecar_path, &write.field, &value)
            .with_context(|| format!("Failed to update {}", write.sidecar_path.display()))?;
        counts.record(&outcome);
    }
    log::debug!("{unit}: {} sidecar writes", counts.total());
    Ok(UnitStatus::Written(counts))
}
