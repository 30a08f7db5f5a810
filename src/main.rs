//! markline - render a Markdown file through the in-place editing engine.
//!
//! # Usage
//!
//! ```bash
//! markline README.md
//! markline --format json README.md
//! markline --format outline --save README.md
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use markline::config::{
    ConfigFlags, OutputFormat, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use markline::document::LineKind;
use markline::editor::Editor;
use markline::perf::{self, EVENT_TARGET};
use markline::surface::MemorySurface;

/// Render a Markdown file the way the editing surface shows it
#[derive(Parser, Debug)]
#[command(name = "markline", version, about, long_about = None)]
struct Cli {
    /// Markdown file to render
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Render in view mode (no editing affordances)
    #[arg(long)]
    read_only: bool,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Maximum number of history snapshots
    #[arg(long, value_name = "N")]
    history_limit: Option<usize>,

    /// Quiet period before a history snapshot is saved
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Enable performance logging
    #[arg(long)]
    perf: bool,

    /// Write engine debug events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

#[derive(Serialize)]
struct LineReport<'a> {
    line: usize,
    kind: &'a LineKind,
    raw: &'a str,
}

/// Warnings (and perf timings when enabled) go to stderr; engine events go
/// to the event log file when one is given.
fn init_logging(perf: bool, event_log: Option<&Path>) -> Result<()> {
    let mut filter = EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into());
    if perf {
        filter = filter.add_directive(
            "markline::perf=debug"
                .parse()
                .context("Invalid perf log directive")?,
        );
    }

    let (event_file, open_error) = match event_log.map(File::create) {
        Some(Ok(file)) => (Some(file), None),
        Some(Err(err)) => (None, Some(err)),
        None => (None, None),
    };
    let event_layer = event_file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(Targets::new().with_target(EVENT_TARGET, tracing::Level::DEBUG))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_filter(filter))
        .with(event_layer)
        .init();

    if let Some(err) = open_error {
        tracing::warn!(path = ?event_log, error = %err, "failed to open event log");
    }
    Ok(())
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let event_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os("MARKLINE_RENDER_DEBUG_LOG").map(PathBuf::from));
    init_logging(effective.perf, event_log_path.as_deref())?;

    let markdown = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;
    let editor = {
        let _scope = perf::scope("cli.load");
        Editor::new(
            MemorySurface::new(),
            effective.editor_options().with_initial_value(markdown),
        )
    };

    match effective.format.unwrap_or(OutputFormat::Html) {
        OutputFormat::Html => println!("{}", editor.surface().html()),
        OutputFormat::Json => {
            let report: Vec<LineReport<'_>> = editor
                .document()
                .lines()
                .iter()
                .enumerate()
                .map(|(line, l)| LineReport {
                    line,
                    kind: l.kind(),
                    raw: l.raw(),
                })
                .collect();
            let json = serde_json::to_string_pretty(&report).context("Failed to encode lines")?;
            println!("{json}");
        }
        OutputFormat::Outline => {
            for heading in editor.outline() {
                let indent = "  ".repeat(usize::from(heading.level.saturating_sub(1)));
                println!("{indent}{} (line {})", heading.text, heading.line + 1);
            }
        }
    }
    Ok(())
}
