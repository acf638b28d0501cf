//! Lifecycle coordinator.
//!
//! Owns the tracker, the render engine, the foreground provider and the
//! overlay surface, and turns tracker outcomes into surface actions. All of
//! it runs on the thread that pumps the window messages; the only cross-thread
//! piece is [`ShutdownSignal`], which a signal handler may set.

use crate::config::OverlayConfig;
use crate::error::{RenderError, Result, SampleError};
use crate::geometry::ScreenRect;
use crate::render::{Frame, RenderEngine};
use crate::tracker::{OverlayState, TickOutcome, ToggleOutcome, Tracker};
use crate::window_info::WindowInfoProvider;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Show/withdraw/paint capability of the always-on-top, click-through,
/// full-screen surface.
pub trait OverlaySurface {
    /// Surface rectangle in screen coordinates.
    fn bounds(&self) -> ScreenRect;

    fn start_ticks(&mut self, period: Duration) -> Result<()>;

    fn stop_ticks(&mut self) -> Result<()>;

    fn show(&mut self) -> Result<()>;

    fn withdraw(&mut self) -> Result<()>;

    fn present(&mut self, frame: &Frame) -> std::result::Result<(), RenderError>;

    /// Release OS resources. Called once, during shutdown.
    fn release(&mut self) -> Result<()>;
}

/// Shutdown request flag. Setting it is the only thing a signal handler
/// does; the owning thread notices it and tears down.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Created,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    pub tick_count: u64,
    pub paint_count: u64,
}

pub struct Coordinator<P: WindowInfoProvider, S: OverlaySurface> {
    config: OverlayConfig,
    tracker: Tracker,
    renderer: RenderEngine,
    provider: P,
    surface: S,
    shutdown: ShutdownSignal,
    phase: LifecyclePhase,
    repaint_pending: bool,
    /// A show waiting for its first frame, so the surface never comes up
    /// with a cutout from an earlier window.
    show_pending: bool,
    report: Option<ShutdownReport>,
}

impl<P: WindowInfoProvider, S: OverlaySurface> Coordinator<P, S> {
    pub fn new(
        config: OverlayConfig,
        provider: P,
        surface: S,
        shutdown: ShutdownSignal,
    ) -> Result<Self> {
        let renderer = RenderEngine::new(surface.bounds(), &config.style, config.paint_interval)?;
        let tracker = Tracker::from_config(&config);

        Ok(Self {
            config,
            tracker,
            renderer,
            provider,
            surface,
            shutdown,
            phase: LifecyclePhase::Created,
            repaint_pending: false,
            show_pending: false,
            report: None,
        })
    }

    pub fn start(&mut self) -> Result<()> {
        if self.phase != LifecyclePhase::Created {
            return Ok(());
        }
        self.surface.start_ticks(self.config.tick_interval)?;
        self.phase = LifecyclePhase::Running;
        info!(
            bounds = ?self.renderer.bounds(),
            tick_ms = self.config.tick_interval.as_millis() as u64,
            paint_ms = self.config.paint_interval.as_millis() as u64,
            "overlay started"
        );
        Ok(())
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn state(&self) -> &OverlayState {
        self.tracker.state()
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.is_requested()
    }

    /// Timer callback.
    pub fn on_tick(&mut self, now: Instant) -> Option<TickOutcome> {
        if self.phase != LifecyclePhase::Running {
            return None;
        }
        let outcome = self.tracker.tick(now, &self.provider);
        self.apply(&outcome, now);
        Some(outcome)
    }

    /// Toggle transition, applied synchronously.
    pub fn toggle(&mut self, now: Instant) -> Option<ToggleOutcome> {
        if self.phase != LifecyclePhase::Running {
            return None;
        }
        let outcome = self.tracker.toggle(now, &self.provider);
        match &outcome {
            ToggleOutcome::ForceHidden => self.withdraw_surface(),
            ToggleOutcome::Released(tick) => self.apply(tick, now),
        }
        Some(outcome)
    }

    /// Stop ticking, withdraw and release the surface, log the counters.
    /// Later calls return the first report without touching the surface.
    pub fn shutdown(&mut self) -> ShutdownReport {
        if let Some(report) = self.report {
            debug!("shutdown already done");
            return report;
        }

        if self.phase == LifecyclePhase::Running {
            if let Err(err) = self.surface.stop_ticks() {
                warn!("failed to stop tick timer: {err}");
            }
        }
        if let Err(err) = self.surface.withdraw() {
            warn!("failed to withdraw overlay: {err}");
        }
        if let Err(err) = self.surface.release() {
            warn!("failed to release overlay: {err}");
        }

        let state = self.tracker.state();
        let report = ShutdownReport {
            tick_count: state.tick_count,
            paint_count: state.paint_count,
        };
        info!(
            tick_count = report.tick_count,
            paint_count = report.paint_count,
            "overlay shut down"
        );

        self.phase = LifecyclePhase::Stopped;
        self.report = Some(report);
        report
    }

    fn apply(&mut self, outcome: &TickOutcome, now: Instant) {
        match outcome {
            TickOutcome::Throttled | TickOutcome::Suppressed => return,
            TickOutcome::Skipped(SampleError::QueryFailure(_)) => {
                if !self.config.error_backoff.is_zero() {
                    std::thread::sleep(self.config.error_backoff);
                }
            }
            TickOutcome::Skipped(_) => {}
            TickOutcome::Withdrawn { was_visible } => {
                if *was_visible {
                    self.withdraw_surface();
                }
                return;
            }
            TickOutcome::Shown(_) => {
                self.repaint_pending = true;
                self.show_pending = true;
            }
            TickOutcome::Refreshed { moved } => {
                if *moved {
                    self.repaint_pending = true;
                }
            }
        }
        self.flush_paint(now);
    }

    /// Draw if a repaint is pending and the paint gate allows it, then
    /// bring up the surface if a show was waiting on that frame. A gated
    /// paint keeps both pending for the next tick.
    fn flush_paint(&mut self, now: Instant) {
        if !self.repaint_pending || !self.tracker.state().visible {
            return;
        }
        let Some(frame) = self.renderer.paint(self.tracker.state_mut(), now) else {
            return;
        };
        self.repaint_pending = false;
        if let Err(err) = self.surface.present(&frame) {
            error!("dropping frame: {err}");
        }

        if self.show_pending {
            self.show_pending = false;
            if let Err(err) = self.surface.show() {
                error!("failed to show overlay: {err}");
            }
        }
    }

    fn withdraw_surface(&mut self) {
        self.repaint_pending = false;
        self.show_pending = false;
        if let Err(err) = self.surface.withdraw() {
            error!("failed to withdraw overlay: {err}");
        }
    }
}

impl<P: WindowInfoProvider, S: OverlaySurface> Drop for Coordinator<P, S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
