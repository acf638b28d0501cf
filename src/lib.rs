//! FocusDim: a click-through overlay that dims every screen area except the
//! window that currently has keyboard focus.
//!
//! The platform-independent core (tracking, rendering, lifecycle) is plain
//! Rust and tested with fake providers. The Win32 pieces live behind
//! `cfg(windows)`.

pub mod classifier;
pub mod config;
pub mod error;
pub mod geometry;
pub mod lifecycle;
pub mod logging;
pub mod render;
pub mod toggle;
pub mod tracker;
pub mod window_info;

#[cfg(windows)]
pub mod foreground;
#[cfg(windows)]
pub mod hotkeys;
#[cfg(windows)]
pub mod overlay;

pub use error::{FocusDimError, Result};
