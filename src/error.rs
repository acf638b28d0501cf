use thiserror::Error;

/// Why a foreground-window sample could not be used this tick.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SampleError {
    #[error("no foreground window")]
    NoForegroundWindow,

    #[error("window geometry unavailable: {0}")]
    GeometryUnavailable(String),

    #[error("window query failed: {0}")]
    QueryFailure(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("surface has no drawable area ({width}x{height})")]
    EmptySurface { width: i32, height: i32 },

    #[error("failed to present frame: {0}")]
    Present(String),
}

#[derive(Error, Debug)]
pub enum FocusDimError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("overlay surface error: {0}")]
    Surface(String),

    #[error("hotkey error: {0}")]
    Hotkey(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("signal handler error: {0}")]
    Signal(String),
}

impl FocusDimError {
    pub fn surface(msg: impl Into<String>) -> Self {
        FocusDimError::Surface(msg.into())
    }

    pub fn hotkey(msg: impl Into<String>) -> Self {
        FocusDimError::Hotkey(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, FocusDimError>;
