// Per-run diagnostics file.
//
// One file per launch, named after the local start time, never rotated.
// Debug builds mirror everything to stderr as well.

use crate::error::{FocusDimError, Result};
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::{self, time::ChronoLocal};
use tracing_subscriber::prelude::*;

pub fn log_file_name(started: &DateTime<Local>) -> String {
    format!("focusdim_{}.log", started.format("%Y%m%d_%H%M%S"))
}

/// Create `dir` if needed and return the path of this run's log file.
pub fn prepare_log_file(dir: &Path, started: &DateTime<Local>) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    Ok(dir.join(log_file_name(started)))
}

fn default_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default level.
/// Returns the path of the file being written.
pub fn init(dir: &Path) -> Result<PathBuf> {
    let path = prepare_log_file(dir, &Local::now())?;
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::builder()
        .with_default_directive(default_level().into())
        .from_env_lossy();

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_timer(ChronoLocal::rfc_3339())
        .with_file(true)
        .with_line_number(true);

    let stderr_layer = cfg!(debug_assertions).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(ChronoLocal::rfc_3339())
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| FocusDimError::Logging(e.to_string()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn file_name_uses_local_start_time() {
        let started = Local.with_ymd_and_hms(2026, 10, 17, 9, 5, 3).unwrap();
        assert_eq!(log_file_name(&started), "focusdim_20261017_090503.log");
    }

    #[test]
    fn prepare_creates_missing_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("FocusDim").join("logs");
        let started = Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();

        let path = prepare_log_file(&dir, &started).unwrap();

        assert!(dir.is_dir());
        assert_eq!(path, dir.join("focusdim_20260102_030405.log"));
        assert!(!path.exists());
    }
}
