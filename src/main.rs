use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use rollcall::{
    cli::{Cli, OutputFormat},
    csv_output::CsvOutput,
    json_output::JsonOutput,
    pipeline, text_output, AttendanceReport, ReconcileConfig,
};
use std::fs;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Load the config file if given, otherwise the built-in defaults
fn load_config(args: &Cli) -> Result<ReconcileConfig> {
    let config = match &args.config {
        Some(path) => ReconcileConfig::from_file(path)?,
        None => ReconcileConfig::default(),
    };
    Ok(args.apply_overrides(config))
}

/// Render the report in the requested format
fn render(report: &AttendanceReport, format: OutputFormat) -> Result<Vec<u8>> {
    let bytes = match format {
        OutputFormat::Text => text_output::render_report(report).into_bytes(),
        OutputFormat::Json => {
            let mut json = JsonOutput::from_report(report)
                .to_json()
                .context("Failed to serialize JSON output")?;
            json.push('\n');
            json.into_bytes()
        }
        OutputFormat::Csv => CsvOutput::default()
            .to_bytes(&report.table)
            .context("Failed to render CSV output")?,
    };
    Ok(bytes)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = load_config(&args)?;

    let report = pipeline::reconcile_file(&args.input, &config)
        .with_context(|| format!("Failed to reconcile {}", args.input.display()))?;

    if let Some(dir) = &args.output_dir {
        let generated_at = Local::now().naive_local();
        let path = CsvOutput::default()
            .write_to_dir(&report.table, dir, generated_at)
            .with_context(|| format!("Failed to write summary into {}", dir.display()))?;
        eprintln!("Summary written to {}", path.display());
        return Ok(());
    }

    let rendered = render(&report, args.format)?;

    match &args.output {
        Some(path) => fs::write(path, &rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&rendered)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
