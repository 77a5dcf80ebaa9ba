use anyhow::{Context as AnyhowContext, Result};
use clap::{Parser, ValueEnum};
use intended_for_catalog::BidsCatalog;
use intended_for_cli::{run_batch, BatchOptions, IntendedForConfig, SessionMode};
use intended_for_pairing::Strategy;
use intended_for_sidecar::{DryRunWriter, JsonSidecarWriter, SidecarWriter};
use std::io;
use std::path::PathBuf;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "intended-for")]
#[command(
    about = "Pair fieldmaps with functional scans and write IntendedFor into fieldmap sidecars",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Root of the BIDS dataset
    dataset_root: PathBuf,

    /// Pairing strategy
    #[arg(value_enum)]
    strategy: StrategyArg,

    /// Participant labels to process, with or without the "sub-" prefix (default: all)
    #[arg(long = "participant-label", value_name = "ID", num_args = 1..)]
    participant_label: Option<Vec<String>>,

    /// Session labels to process, with or without the "ses-" prefix (default: all)
    #[arg(long, value_name = "ID", num_args = 1.., conflicts_with = "all_sessions")]
    session: Option<Vec<String>>,

    /// Process each listed task separately (fieldmaps tagged desc-<task>)
    #[arg(long, value_name = "TASK", num_args = 1..)]
    tasks: Option<Vec<String>>,

    /// Collapse all sessions of a subject into one unit
    #[arg(short = 'a', long = "all-sessions", visible_alias = "no-sessions")]
    all_sessions: bool,

    /// Dry run: print intended writes to stdout instead of writing sidecars
    #[arg(short, long)]
    debug: bool,

    /// TOML config file (overrides INTENDED_FOR_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the batch report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Last,
    Closest,
    Task,
    #[value(name = "eta_squared")]
    EtaSquared,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Last => Strategy::Last,
            StrategyArg::Closest => Strategy::Closest,
            StrategyArg::Task => Strategy::Task,
            StrategyArg::EtaSquared => Strategy::EtaSquared,
        }
    }
}

fn strip_labels(labels: Option<Vec<String>>, prefix: &str) -> Option<Vec<String>> {
    labels.map(|labels| {
        labels
            .into_iter()
            .map(|label| label.strip_prefix(prefix).unwrap_or(&label).to_string())
            .collect()
    })
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = IntendedForConfig::load(cli.config.as_deref())?;
    let catalog = BidsCatalog::open(&cli.dataset_root, config.catalog.clone())
        .with_context(|| format!("Failed to open dataset {}", cli.dataset_root.display()))?;

    let options = BatchOptions {
        strategy: cli.strategy.into(),
        participants: strip_labels(cli.participant_label.clone(), "sub-"),
        sessions: strip_labels(cli.session.clone(), "ses-"),
        tasks: cli.tasks.clone().unwrap_or_default(),
        session_mode: if cli.all_sessions {
            SessionMode::Collapsed
        } else {
            SessionMode::PerSession
        },
        field: config.field.clone(),
        data_extensions: config.catalog.data_extensions.clone(),
        sidecar_extension: config.catalog.sidecar_extension.clone(),
    };
    log::debug!(
        "Strategy {} over {}",
        options.strategy,
        cli.dataset_root.display()
    );

    let json_writer = JsonSidecarWriter::new();
    let dry_run = DryRunWriter::new(true);
    let writer: &dyn SidecarWriter = if cli.debug { &dry_run } else { &json_writer };

    let report = run_batch(&catalog, &options, writer)?;
    if cli.json {
        print_stdout(&serde_json::to_string_pretty(&report)?)?;
    }
    // Per-unit failures are logged, not surfaced in the exit status.
    Ok(())
}
