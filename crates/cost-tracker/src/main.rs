mod bootstrap;

use std::io;

use anyhow::{Context, Result};
use tracker_core::error::TrackerError;
use tracker_core::settings::Settings;
use tracker_data::source::{FileSource, MemorySource, PathSource};
use tracker_runtime::dashboard::Session;
use tracker_ui::app::App;
use tracker_ui::report::write_report;

use bootstrap::LogTarget;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, &log_target(&settings))?;

    tracing::info!("Cost Tracker v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Top: {}, Theme: {}, Report: {}",
        settings.top,
        settings.theme,
        settings.report
    );

    let Some(file) = settings.file.clone() else {
        return Err(TrackerError::Config(
            "no usage export given; pass a JSON file path, or - to read stdin".to_string(),
        )
        .into());
    };

    if settings.reads_stdin() {
        let source =
            MemorySource::from_reader("stdin", io::stdin().lock(), settings.max_document_bytes())?;
        run(source, &settings)
    } else {
        run(PathSource::new(file), &settings)
    }
}

/// `--report` logs to stderr unless a file was asked for; the dashboard
/// always logs to a file.
fn log_target(settings: &Settings) -> LogTarget {
    match (&settings.log_file, settings.report) {
        (Some(path), _) => LogTarget::File(path.clone()),
        (None, true) => LogTarget::Stderr,
        (None, false) => LogTarget::File(bootstrap::default_log_path()),
    }
}

fn run<S: FileSource>(source: S, settings: &Settings) -> Result<()> {
    let identity = source.identity();
    let mut session = Session::open(source, settings.max_document_bytes(), settings.top_limit())
        .with_context(|| format!("failed to load {}", identity))?;

    if let Some(period) = &settings.period {
        session.select_period(period)?;
    }

    tracing::info!(
        records = session.records().len(),
        diagnostics = session.diagnostics().len(),
        periods = session.periods().len(),
        "usage export loaded"
    );

    if settings.report {
        let view = session.view()?;
        write_report(view.as_ref(), session.diagnostics(), &mut io::stdout().lock())?;
        return Ok(());
    }

    App::new(session, &settings.theme)
        .run()
        .map_err(|e| TrackerError::Terminal(e.to_string()))?;

    tracing::info!("Cost Tracker exiting");
    Ok(())
}
