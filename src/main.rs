use anyhow::{Context, Result};
use clap::Parser;
use code_extractor::app::events::Operation;
use code_extractor::app::view_model::{generate_ui_state, render_tree_text};
use code_extractor::app::{self, commands, tasks, AppState, Notice, StatusSink};
use code_extractor::config::{settings, AppConfig};
use code_extractor::utils::logging::{init_logging, with_startup_logging, LoggingOptions};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status after an interrupt, as shells report SIGINT.
const EXIT_CANCELLED: u8 = 130;

/// Scan a directory, adjust the selection and extract it into one text file.
#[derive(Parser, Debug)]
#[command(name = "code-extractor", version, about)]
struct Cli {
    /// Directory to scan. Defaults to the last scanned directory.
    dir: Option<PathBuf>,

    /// Write the extracted document here.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extract into the configured output directory.
    #[arg(long)]
    extract: bool,

    /// Uncheck a path (relative to DIR) before extracting.
    #[arg(short = 'x', long = "exclude", value_name = "REL")]
    exclude: Vec<PathBuf>,

    /// Check a path (relative to DIR); applied after all excludes.
    #[arg(short = 'i', long = "include", value_name = "REL")]
    include: Vec<PathBuf>,

    /// List entries whose name contains this text.
    #[arg(long, value_name = "QUERY")]
    search: Option<String>,

    /// Restrict --search to an extension ("no extension" for none).
    #[arg(long = "ext", value_name = "EXT", requires = "search")]
    extension: Option<String>,

    /// Print the preview of one entry.
    #[arg(long, value_name = "REL")]
    preview: Option<PathBuf>,

    /// Print the selection tree.
    #[arg(long)]
    tree: bool,

    /// Print the tree as JSON instead of a checklist.
    #[arg(long, requires = "tree")]
    json: bool,

    /// Use this configuration file instead of the per-user one.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write a debug log to this file.
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Log debug messages to the console.
    #[arg(short, long)]
    verbose: bool,

    /// Number of extraction workers.
    #[arg(long, value_name = "N")]
    workers: Option<usize>,
}

/// Reports progress on stderr, one line per operation.
#[derive(Default)]
struct ConsoleSink;

impl StatusSink for ConsoleSink {
    fn progress(&mut self, operation: Operation, percent: u8) {
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{operation}: {percent:>3}%");
        if percent == 100 {
            let _ = writeln!(stderr);
        }
    }

    fn notice(&mut self, notice: &Notice) {
        match notice {
            Notice::Info(message) => tracing::info!("{}", message),
            Notice::Error(message) => tracing::error!("{}", message),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn exit_code_for(notices: &[Notice]) -> ExitCode {
    if notices.iter().any(Notice::is_error) {
        ExitCode::FAILURE
    } else {
        ExitCode::from(EXIT_CANCELLED)
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = with_startup_logging(cli.verbose, std::io::stderr, || {
        AppConfig::load(cli.config.as_deref())
    })
    .context("Failed to load configuration")?;
    if let Some(workers) = cli.workers {
        config.worker_threads = Some(workers);
    }

    init_logging(&LoggingOptions {
        verbose: cli.verbose,
        log_file: cli.log_file.clone().or_else(|| config.log_file.clone()),
    })?;

    let dir = cli
        .dir
        .clone()
        .or_else(|| config.last_directory.clone())
        .context("No directory given and no previous directory configured")?;

    let mut state = AppState::new(config);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut sink = ConsoleSink;

    tasks::start_scan_on_path(dir, tx.clone(), &mut state)?;
    let notices = app::run_until_idle(&mut state, &mut rx, &mut sink).await;
    if state.tree.is_none() {
        return Ok(exit_code_for(&notices));
    }
    if let Err(e) = settings::save_config(&state.config, cli.config.as_deref()) {
        tracing::warn!("Failed to save config: {:#}", e);
    }

    for path in &cli.exclude {
        commands::set_path_checked(&mut state, path, false)?;
    }
    for path in &cli.include {
        commands::set_path_checked(&mut state, path, true)?;
    }

    if let Some(query) = &cli.search {
        let extension = cli.extension.as_deref().unwrap_or_default();
        for path in commands::search(&mut state, query, extension) {
            println!("{}", path.display());
        }
    }

    if cli.tree {
        let ui_state = generate_ui_state(&state);
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&ui_state)?);
        } else {
            print!("{}", render_tree_text(&ui_state.tree));
        }
    }

    if let Some(path) = &cli.preview {
        println!("{}", commands::preview(&state, path)?);
    }

    if cli.extract || cli.output.is_some() {
        let destination = cli
            .output
            .clone()
            .unwrap_or_else(|| state.config.default_output_path());
        tasks::start_extraction(destination, tx.clone(), &mut state)?;
        let notices = app::run_until_idle(&mut state, &mut rx, &mut sink).await;
        match &state.last_output {
            Some(path) => println!("{}", path.display()),
            None => return Ok(exit_code_for(&notices)),
        }
    }

    Ok(ExitCode::SUCCESS)
}
