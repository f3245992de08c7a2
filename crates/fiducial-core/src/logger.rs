//! `log` backend for the detection pipeline.
//!
//! Each record is written to stderr as
//! `LEVEL +elapsed-ms target: message`, where the elapsed time counts from
//! installation. The target column keeps interleaved per-stage diagnostics
//! (segmentation, decoding, pose) attributable when several detectors run
//! in one process.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use log::{LevelFilter, Log, Metadata, Record};

struct PipelineLogger {
    // LevelFilter stored by discriminant so the static can be const-built
    filter: AtomicUsize,
    installed_at: OnceLock<Instant>,
}

static LOGGER: PipelineLogger = PipelineLogger {
    filter: AtomicUsize::new(0),
    installed_at: OnceLock::new(),
};

fn fmt_line(elapsed: Duration, record: &Record<'_>) -> String {
    format!(
        "{:<5} +{:>9.1}ms {}: {}",
        record.level(),
        elapsed.as_secs_f64() * 1e3,
        record.target(),
        record.args()
    )
}

impl Log for PipelineLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() as usize <= self.filter.load(Ordering::Relaxed)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let elapsed = self
            .installed_at
            .get()
            .map(|t| t.elapsed())
            .unwrap_or_default();
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}", fmt_line(elapsed, record));
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Install the pipeline logger with the given level filter.
///
/// Fails if another `log` backend was installed first; the host process
/// keeps control of logging in that case and nothing changes.
pub fn init_with_level(filter: LevelFilter) -> Result<(), log::SetLoggerError> {
    LOGGER.filter.store(filter as usize, Ordering::Relaxed);
    let _ = LOGGER.installed_at.set(Instant::now());
    log::set_logger(&LOGGER)?;
    log::set_max_level(filter);
    Ok(())
}

/// Route diagnostics through `tracing` instead, honouring `RUST_LOG` and
/// falling back to `default_filter` (e.g. `"info"`).
#[cfg(feature = "tracing")]
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
