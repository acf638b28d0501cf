//! Foreground tracking state machine.
//!
//! One evaluation per tick decides between three phases:
//!
//! * `Hidden` – nothing trackable is focused (or nothing was seen yet).
//! * `ShowingWindow(handle)` – the mask is up with a cutout over `handle`.
//! * `ForceHidden` – the user toggled the overlay off; ticks are ignored.
//!
//! Showing is edge-triggered: it fires once when the tracked handle changes.
//! Geometry is level-triggered: the cutout follows the window every tick.
//! Clearing `last_handle` is how the surrogate path and the toggle path force
//! the next trackable window to produce a fresh show.

use crate::classifier::WindowClassifier;
use crate::config::OverlayConfig;
use crate::error::SampleError;
use crate::geometry::ScreenRect;
use crate::window_info::{WindowHandle, WindowInfoProvider, WindowSnapshot};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingPhase {
    Hidden,
    ShowingWindow(WindowHandle),
    ForceHidden,
}

/// The long-lived overlay state. Only the tracker and the paint path
/// mutate it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayState {
    pub highlight_rect: ScreenRect,
    pub visible: bool,
    pub forced_hidden: bool,
    pub last_handle: Option<WindowHandle>,
    pub last_tick_time: Option<Instant>,
    pub last_paint_time: Option<Instant>,
    pub last_error_time: Option<Instant>,
    pub tick_count: u64,
    pub paint_count: u64,
}

/// The tracked part of `OverlayState`, without the bookkeeping clocks and
/// counters. Each evaluation builds the next value and applies it whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tracked {
    pub highlight_rect: ScreenRect,
    pub visible: bool,
    pub forced_hidden: bool,
    pub last_handle: Option<WindowHandle>,
}

impl OverlayState {
    pub fn tracked(&self) -> Tracked {
        Tracked {
            highlight_rect: self.highlight_rect,
            visible: self.visible,
            forced_hidden: self.forced_hidden,
            last_handle: self.last_handle,
        }
    }

    fn apply(&mut self, next: Tracked) {
        debug_assert!(!next.visible || !next.highlight_rect.is_degenerate());
        debug_assert!(!(next.forced_hidden && next.visible));
        self.highlight_rect = next.highlight_rect;
        self.visible = next.visible;
        self.forced_hidden = next.forced_hidden;
        self.last_handle = next.last_handle;
    }
}

/// What a tick decided. The coordinator turns these into surface actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Less than one tick interval since the previous tick.
    Throttled,
    /// Forced hidden; nothing was sampled.
    Suppressed,
    /// No usable snapshot; tracked state untouched.
    Skipped(SampleError),
    /// A shell/desktop window is focused.
    Withdrawn { was_visible: bool },
    /// A new window became trackable. The only outcome that shows the surface.
    Shown(WindowHandle),
    /// Same window as before, geometry re-read.
    Refreshed { moved: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    ForceHidden,
    Released(TickOutcome),
}

pub struct Tracker {
    state: OverlayState,
    classifier: WindowClassifier,
    tick_interval: Duration,
    error_log_interval: Duration,
}

impl Tracker {
    pub fn new(
        classifier: WindowClassifier,
        tick_interval: Duration,
        error_log_interval: Duration,
    ) -> Self {
        Self {
            state: OverlayState::default(),
            classifier,
            tick_interval,
            error_log_interval,
        }
    }

    pub fn from_config(config: &OverlayConfig) -> Self {
        Self::new(
            WindowClassifier::default(),
            config.tick_interval,
            config.error_log_interval,
        )
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut OverlayState {
        &mut self.state
    }

    pub fn phase(&self) -> TrackingPhase {
        match (self.state.forced_hidden, self.state.visible, self.state.last_handle) {
            (true, _, _) => TrackingPhase::ForceHidden,
            (false, true, Some(handle)) => TrackingPhase::ShowingWindow(handle),
            _ => TrackingPhase::Hidden,
        }
    }

    pub fn tick(&mut self, now: Instant, provider: &dyn WindowInfoProvider) -> TickOutcome {
        if let Some(last) = self.state.last_tick_time {
            if now.saturating_duration_since(last) < self.tick_interval {
                return TickOutcome::Throttled;
            }
        }
        self.state.last_tick_time = Some(now);
        self.state.tick_count += 1;

        if self.state.forced_hidden {
            trace!("forced hidden, tick ignored");
            return TickOutcome::Suppressed;
        }

        self.evaluate(now, provider)
    }

    /// Flip the forced-hidden override. Releasing it re-evaluates the
    /// foreground window immediately instead of waiting for the next tick.
    pub fn toggle(&mut self, now: Instant, provider: &dyn WindowInfoProvider) -> ToggleOutcome {
        let current = self.state.tracked();

        if current.visible {
            self.state.apply(Tracked {
                visible: false,
                forced_hidden: true,
                ..current
            });
            info!("overlay hidden by user");
            return ToggleOutcome::ForceHidden;
        }

        self.state.apply(Tracked {
            forced_hidden: false,
            last_handle: None,
            ..current
        });
        info!("overlay released by user");
        ToggleOutcome::Released(self.evaluate(now, provider))
    }

    fn evaluate(&mut self, now: Instant, provider: &dyn WindowInfoProvider) -> TickOutcome {
        let snapshot = match provider.sample().and_then(reject_degenerate) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.report_sample_error(now, &err);
                return TickOutcome::Skipped(err);
            }
        };

        let current = self.state.tracked();

        if self.classifier.is_system_surrogate(&snapshot) {
            self.state.apply(Tracked {
                visible: false,
                last_handle: None,
                ..current
            });
            if current.visible {
                info!(
                    class = %snapshot.class_name,
                    title = %snapshot.title,
                    "system window focused, withdrawing overlay"
                );
            } else {
                trace!(class = %snapshot.class_name, "system window focused");
            }
            return TickOutcome::Withdrawn {
                was_visible: current.visible,
            };
        }

        let moved = current.highlight_rect != snapshot.rect;

        if current.last_handle == Some(snapshot.handle) {
            self.state.apply(Tracked {
                highlight_rect: snapshot.rect,
                ..current
            });
            if moved {
                trace!(handle = %snapshot.handle, rect = ?snapshot.rect, "tracked window moved");
            }
            return TickOutcome::Refreshed { moved };
        }

        self.state.apply(Tracked {
            highlight_rect: snapshot.rect,
            visible: true,
            forced_hidden: false,
            last_handle: Some(snapshot.handle),
        });
        info!(
            handle = %snapshot.handle,
            class = %snapshot.class_name,
            title = %snapshot.title,
            rect = ?snapshot.rect,
            "tracking window"
        );
        TickOutcome::Shown(snapshot.handle)
    }

    fn report_sample_error(&mut self, now: Instant, err: &SampleError) {
        match err {
            SampleError::NoForegroundWindow => debug!("no foreground window"),
            SampleError::GeometryUnavailable(detail) => warn!("{detail}"),
            SampleError::QueryFailure(detail) => {
                let due = self
                    .state
                    .last_error_time
                    .map_or(true, |last| {
                        now.saturating_duration_since(last) >= self.error_log_interval
                    });
                if due {
                    error!("foreground window query failed: {detail}");
                    self.state.last_error_time = Some(now);
                }
            }
        }
    }
}

fn reject_degenerate(snapshot: WindowSnapshot) -> Result<WindowSnapshot, SampleError> {
    if snapshot.rect.is_degenerate() {
        return Err(SampleError::GeometryUnavailable(format!(
            "window {} has an empty rectangle {:?}",
            snapshot.handle, snapshot.rect
        )));
    }
    Ok(snapshot)
}
