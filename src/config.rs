use crate::render::RenderStyle;
use std::path::PathBuf;
use std::time::Duration;

pub const APP_NAME: &str = "FocusDim";

/// Period of the foreground-window poll, and the minimum gap between two
/// effective ticks.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Minimum gap between two actual draws of the mask.
pub const PAINT_INTERVAL: Duration = Duration::from_millis(50);

/// At most one query-failure diagnostic per this interval.
pub const ERROR_LOG_INTERVAL: Duration = Duration::from_secs(1);

/// Pause after a failed OS query before the loop continues.
pub const ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Global hotkey that flips the forced-hidden override.
pub const TOGGLE_HOTKEY: &str = "Ctrl+Alt+F";

/// Runtime settings. Built from the constants above; there is no file or
/// command-line source, tests construct their own values.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub tick_interval: Duration,
    pub paint_interval: Duration,
    pub error_log_interval: Duration,
    pub error_backoff: Duration,
    pub toggle_hotkey: String,
    pub style: RenderStyle,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            tick_interval: TICK_INTERVAL,
            paint_interval: PAINT_INTERVAL,
            error_log_interval: ERROR_LOG_INTERVAL,
            error_backoff: ERROR_BACKOFF,
            toggle_hotkey: TOGGLE_HOTKEY.into(),
            style: RenderStyle::default(),
        }
    }
}

/// Directory holding the per-run log files.
pub fn log_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join(APP_NAME).join("logs")
}
