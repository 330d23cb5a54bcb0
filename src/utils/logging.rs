//! Process-wide logging setup.
//!
//! `main` builds the logging context once from [`LoggingOptions`] and owns its
//! lifetime. Library code only emits `tracing` events and spans.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

#[derive(Debug, Clone, Default)]
pub struct LoggingOptions {
    /// Lowers the console threshold from INFO to DEBUG.
    pub verbose: bool,
    /// Receives every event down to DEBUG. The file is kept after exit.
    pub log_file: Option<PathBuf>,
}

/// Console threshold: `RUST_LOG` when set, otherwise INFO or DEBUG.
fn console_filter(verbose: bool) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Runs `f` with a console-only subscriber scoped to the current thread.
///
/// Covers the work done before [`init_logging`] can run, such as loading the
/// configuration that names the log file.
pub fn with_startup_logging<W, T>(verbose: bool, make_writer: W, f: impl FnOnce() -> T) -> T
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_writer(make_writer)
        .with_target(false)
        .with_env_filter(console_filter(verbose))
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

/// Installs the global subscriber: console on stderr plus an optional log file.
///
/// `RUST_LOG` overrides the console threshold when set.
pub fn init_logging(options: &LoggingOptions) -> Result<()> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter(options.verbose));

    let file_layer = match &options.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(path) = &options.log_file {
        tracing::debug!("Writing debug log to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings;
    use std::io;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn config_warnings_are_logged_before_init() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let captured = Captured::default();
        let writer = captured.clone();

        let config = with_startup_logging(false, move || writer.clone(), || {
            settings::load_config(Some(&path))
        })
        .unwrap();

        assert!(config.last_directory.is_none());
        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Falling back to default config"), "{output}");
    }
}
