//! Episcope command line front end
//!
//! Headless access to the annotation engine: check a taxonomy, list its
//! symptom paths, rewrite a saved timeline in canonical order, print a
//! timeline summary and export the clinical report.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_appender::non_blocking::WorkerGuard;

use episcope_core::core::settings::{AppSettings, LoggingSettings, SettingsManager};
use episcope_core::core::timeline::{format_clock, ReportInfo, Timeline};
use episcope_core::core::{ItemId, SymptomFamily, TimeMs};
use episcope_core::Session;

#[derive(Parser)]
#[command(name = "episcope")]
#[command(about = "Symptom timeline annotation tools", version)]
struct Cli {
    /// Directory holding settings.json (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Taxonomy file, overriding the configured one
    #[arg(long, global = true)]
    taxonomy: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the taxonomy and report its size
    Validate,
    /// Print every symptom path in the taxonomy
    List {
        /// Only list one family (objective_symptoms or subjective_symptoms)
        #[arg(long)]
        family: Option<String>,
        /// Print a JSON array instead of one path per line
        #[arg(long)]
        json: bool,
    },
    /// Re-import a timeline and write it back in start order
    Normalize {
        /// Exported timeline JSON
        timeline: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the items of a timeline with hh:mm:ss times
    Summary {
        /// Exported timeline JSON
        timeline: PathBuf,
        /// Print the items as JSON (times in milliseconds)
        #[arg(long)]
        json: bool,
    },
    /// Export the plain-text report for a timeline
    Report {
        /// Exported timeline JSON
        timeline: PathBuf,
        /// Patient number
        #[arg(long)]
        patient: String,
        /// Doctor name (defaults to the configured one)
        #[arg(long)]
        doctor: Option<String>,
        /// Report date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Observations text
        #[arg(long, conflicts_with = "notes_file")]
        notes: Option<String>,
        /// Read observations from a file
        #[arg(long)]
        notes_file: Option<PathBuf>,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_settings(config: Option<&Path>) -> AppSettings {
    match config {
        Some(dir) => SettingsManager::new(dir.to_path_buf()).load(),
        None => SettingsManager::default_location()
            .map(|manager| manager.load())
            .unwrap_or_default(),
    }
}

/// Installs stderr logging plus a daily log file when a directory is
/// configured. The returned guard must live until exit.
fn init_logging(settings: &LoggingSettings) -> Option<WorkerGuard> {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match settings.directory.as_deref().and_then(prepare_log_dir) {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "episcope.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer);

    let _ = tracing::subscriber::set_global_default(subscriber);
    guard
}

/// Creates the log directory. On failure the error goes to stderr (tracing
/// is not installed yet) and file logging is skipped.
fn prepare_log_dir(dir: &Path) -> Option<&Path> {
    match std::fs::create_dir_all(dir) {
        Ok(()) => Some(dir),
        Err(e) => {
            eprintln!(
                "Failed to create log directory {}: {}; logging to stderr only",
                dir.display(),
                e
            );
            None
        }
    }
}

/// `--taxonomy` wins over `taxonomy.path` from settings
fn resolve_taxonomy(cli_taxonomy: Option<&Path>, settings: &AppSettings) -> Result<PathBuf> {
    cli_taxonomy
        .map(Path::to_path_buf)
        .or_else(|| settings.taxonomy.path.clone())
        .context("no taxonomy file given; pass --taxonomy or set taxonomy.path in settings.json")
}

fn open_session(cli_taxonomy: Option<&Path>, settings: &AppSettings) -> Result<Session> {
    let path = resolve_taxonomy(cli_taxonomy, settings)?;

    Session::open(&path, &settings.taxonomy_options())
        .with_context(|| format!("failed to load taxonomy {}", path.display()))
}

fn parse_family(key: Option<&str>) -> Result<Option<SymptomFamily>> {
    match key {
        Some(key) => match SymptomFamily::from_key(key) {
            Some(family) => Ok(Some(family)),
            None => bail!("unknown family '{}'", key),
        },
        None => Ok(None),
    }
}

/// Keeps the paths under `family`, or all of them
fn filter_paths(paths: Vec<String>, family: Option<SymptomFamily>) -> Vec<String> {
    match family {
        Some(family) => {
            let prefix = format!("{}/", family.as_str());
            paths.into_iter().filter(|path| path.starts_with(&prefix)).collect()
        }
        None => paths,
    }
}

/// Observations text from `--notes` or `--notes-file`. Trailing newlines of
/// the file are dropped so the report does not end with blank lines.
fn read_notes(notes: Option<String>, notes_file: Option<&Path>) -> Result<String> {
    match notes_file {
        Some(path) => Ok(std::fs::read_to_string(path)
            .with_context(|| format!("failed to read notes {}", path.display()))?
            .trim_end_matches(['\n', '\r'])
            .to_string()),
        None => Ok(notes.unwrap_or_default()),
    }
}

fn report_info(
    patient: String,
    doctor: Option<String>,
    date: Option<NaiveDate>,
    notes: String,
    settings: &AppSettings,
) -> ReportInfo {
    ReportInfo {
        patient_id: patient,
        doctor_name: doctor.unwrap_or_else(|| settings.report.doctor_name.clone()),
        date: date.unwrap_or_else(|| chrono::Local::now().date_naive()),
        notes,
    }
}

/// One line of `summary`
#[derive(Debug, Serialize)]
struct SummaryRow {
    identifier: ItemId,
    start: TimeMs,
    end: TimeMs,
    path: String,
}

fn summary_rows(timeline: &Timeline) -> Vec<SummaryRow> {
    timeline
        .symptoms()
        .map(|item| SummaryRow {
            identifier: item.identifier,
            start: item.start,
            end: item.end(),
            path: item.symptom.path().unwrap_or_else(|| item.symptom.name.clone()),
        })
        .collect()
}

fn open_timeline(session: &mut Session, path: &Path) -> Result<()> {
    session
        .load_timeline(path)
        .with_context(|| format!("failed to load timeline {}", path.display()))
}

fn emit(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => episcope_core::core::fs::atomic_write_text(path, text)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref());
    let _log_guard = init_logging(&settings.logging);

    match cli.command {
        Commands::Validate => {
            let session = open_session(cli.taxonomy.as_deref(), &settings)?;
            let db = session.db();
            println!(
                "OK: {} global attributes, {} objective categories, \
                 {} subjective categories, {} symptoms",
                db.attributes.len(),
                db.objective.len(),
                db.subjective.len(),
                db.symptom_count()
            );
        }
        Commands::List { family, json } => {
            let family = parse_family(family.as_deref())?;
            let session = open_session(cli.taxonomy.as_deref(), &settings)?;
            let paths = filter_paths(session.db().paths(), family);

            if json {
                println!("{}", serde_json::to_string_pretty(&paths)?);
            } else {
                for path in paths {
                    println!("{}", path);
                }
            }
        }
        Commands::Normalize { timeline, output } => {
            let mut session = open_session(cli.taxonomy.as_deref(), &settings)?;
            open_timeline(&mut session, &timeline)?;

            let mut text = session.timeline().to_json()?;
            if output.is_none() {
                text.push('\n');
            }
            emit(output.as_deref(), &text)?;
        }
        Commands::Summary { timeline, json } => {
            let mut session = open_session(cli.taxonomy.as_deref(), &settings)?;
            open_timeline(&mut session, &timeline)?;

            let rows = summary_rows(session.timeline());
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }

            for row in &rows {
                println!(
                    "{:>4}  {} - {}  {}",
                    row.identifier,
                    format_clock(row.start),
                    format_clock(row.end),
                    row.path
                );
            }
            println!(
                "{} items, last end {}",
                session.timeline().len(),
                format_clock(session.timeline().latest_end())
            );
        }
        Commands::Report {
            timeline,
            patient,
            doctor,
            date,
            notes,
            notes_file,
            output,
        } => {
            let mut session = open_session(cli.taxonomy.as_deref(), &settings)?;
            open_timeline(&mut session, &timeline)?;

            let notes = read_notes(notes, notes_file.as_deref())?;
            let info = report_info(patient, doctor, date, notes, &settings);

            match output {
                Some(path) => session
                    .export_report(&path, &info)
                    .with_context(|| format!("failed to write report {}", path.display()))?,
                None => emit(None, &session.timeline().to_report(&info)?)?,
            }
        }
    }

    Ok(())
}
