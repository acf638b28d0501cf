use focusdim::config::OverlayConfig;
use focusdim::error::{RenderError, Result, SampleError};
use focusdim::geometry::ScreenRect;
use focusdim::lifecycle::{Coordinator, LifecyclePhase, OverlaySurface, ShutdownSignal};
use focusdim::render::{Frame, RenderEngine, RenderStyle, Rgba};
use focusdim::toggle::ToggleController;
use focusdim::tracker::{TickOutcome, ToggleOutcome, TrackingPhase};
use focusdim::window_info::{WindowHandle, WindowInfoProvider, WindowSnapshot};
use std::cell::RefCell;
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_millis(100);

/// Foreground provider whose answer the test swaps between ticks.
struct Desktop(RefCell<std::result::Result<WindowSnapshot, SampleError>>);

impl Desktop {
    fn focused(handle: isize, edges: (i32, i32, i32, i32), class_name: &str) -> Self {
        let desktop = Self(RefCell::new(Err(SampleError::NoForegroundWindow)));
        desktop.focus(handle, edges, class_name);
        desktop
    }

    fn focus(&self, handle: isize, edges: (i32, i32, i32, i32), class_name: &str) {
        *self.0.borrow_mut() =
            WindowSnapshot::from_edges(WindowHandle(handle), edges, "", class_name);
    }
}

impl WindowInfoProvider for Desktop {
    fn sample(&self) -> std::result::Result<WindowSnapshot, SampleError> {
        self.0.borrow().clone()
    }
}

#[derive(Default)]
struct RecordingSurface {
    shows: u32,
    /// Number of frames presented at the moment of each show.
    shown_after: Vec<usize>,
    withdraws: u32,
    releases: u32,
    frames: Vec<Frame>,
}

impl OverlaySurface for RecordingSurface {
    fn bounds(&self) -> ScreenRect {
        ScreenRect::new(0, 0, 800, 600)
    }

    fn start_ticks(&mut self, _period: Duration) -> Result<()> {
        Ok(())
    }

    fn stop_ticks(&mut self) -> Result<()> {
        Ok(())
    }

    fn show(&mut self) -> Result<()> {
        self.shows += 1;
        self.shown_after.push(self.frames.len());
        Ok(())
    }

    fn withdraw(&mut self) -> Result<()> {
        self.withdraws += 1;
        Ok(())
    }

    fn present(&mut self, frame: &Frame) -> std::result::Result<(), RenderError> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.releases += 1;
        Ok(())
    }
}

fn started(desktop: &Desktop) -> Coordinator<&Desktop, RecordingSurface> {
    let config = OverlayConfig {
        error_backoff: Duration::ZERO,
        ..OverlayConfig::default()
    };
    let mut coordinator = Coordinator::new(
        config,
        desktop,
        RecordingSurface::default(),
        ShutdownSignal::new(),
    )
    .unwrap();
    coordinator.start().unwrap();
    coordinator
}

#[test]
fn notepad_gets_focus_then_moves() {
    let desktop = Desktop::focused(7, (100, 100, 400, 300), "Notepad");
    let mut overlay = started(&desktop);
    let t0 = Instant::now();

    overlay.on_tick(t0);
    let state = overlay.state();
    assert!(state.visible);
    assert_eq!(state.highlight_rect, ScreenRect::new(100, 100, 300, 200));
    assert_eq!(state.last_handle, Some(WindowHandle(7)));
    assert_eq!(overlay.surface().shows, 1);

    desktop.focus(7, (120, 100, 420, 300), "Notepad");
    overlay.on_tick(t0 + TICK);
    assert_eq!(
        overlay.state().highlight_rect,
        ScreenRect::new(120, 100, 300, 200)
    );
    assert_eq!(overlay.surface().shows, 1);

    // The repaint after the move cuts out the new position.
    let frame = overlay.surface().frames.last().unwrap();
    assert_eq!(frame.pixel(120, 100), Rgba::TRANSPARENT);
    assert_ne!(frame.pixel(110, 100).a, 0);
}

#[test]
fn taskbar_click_withdraws_overlay() {
    let desktop = Desktop::focused(7, (100, 100, 400, 300), "Notepad");
    let mut overlay = started(&desktop);
    let t0 = Instant::now();
    overlay.on_tick(t0);

    desktop.focus(9, (0, 1040, 1920, 1080), "Shell_TrayWnd");
    overlay.on_tick(t0 + TICK);

    assert!(!overlay.state().visible);
    assert_eq!(overlay.state().last_handle, None);
    assert_eq!(overlay.tracker().phase(), TrackingPhase::Hidden);
    assert_eq!(overlay.surface().withdraws, 1);
}

#[test]
fn surrogate_hides_regardless_of_prior_state() {
    let desktop = Desktop::focused(9, (0, 0, 1920, 1080), "Progman");
    let mut overlay = started(&desktop);

    assert_eq!(
        overlay.on_tick(Instant::now()),
        Some(TickOutcome::Withdrawn { was_visible: false })
    );
    assert!(!overlay.state().visible);
    assert_eq!(overlay.state().last_handle, None);
    assert_eq!(overlay.surface().shows, 0);
}

#[test]
fn forced_hidden_ignores_focus_changes() {
    let desktop = Desktop::focused(7, (100, 100, 400, 300), "Notepad");
    let mut overlay = started(&desktop);
    let t0 = Instant::now();
    overlay.on_tick(t0);
    assert_eq!(overlay.toggle(t0), Some(ToggleOutcome::ForceHidden));
    let before = overlay.state().tracked();

    desktop.focus(8, (0, 0, 640, 480), "Chrome_WidgetWin_1");
    for i in 1..=5 {
        assert_eq!(overlay.on_tick(t0 + TICK * i), Some(TickOutcome::Suppressed));
    }

    assert_eq!(overlay.state().tracked(), before);
    assert!(overlay.state().forced_hidden);
    assert_eq!(overlay.surface().shows, 1);
}

#[test]
fn toggle_from_forced_hidden_shows_current_window_at_once() {
    let desktop = Desktop::focused(7, (100, 100, 400, 300), "Notepad");
    let mut overlay = started(&desktop);
    let controller = ToggleController::new("Ctrl+Alt+F".parse().unwrap());
    let t0 = Instant::now();
    overlay.on_tick(t0);
    controller.on_toggle(&mut overlay, t0);

    let outcome = controller.on_toggle(&mut overlay, t0 + Duration::from_millis(60));

    assert_eq!(
        outcome,
        Some(ToggleOutcome::Released(TickOutcome::Shown(WindowHandle(7))))
    );
    let state = overlay.state();
    assert!(!state.forced_hidden);
    assert!(state.visible);
    assert_eq!(state.last_handle, Some(WindowHandle(7)));
    assert_eq!(overlay.surface().shows, 2);
}

#[test]
fn quick_release_onto_another_window_never_shows_old_cutout() {
    let desktop = Desktop::focused(7, (100, 100, 400, 300), "Notepad");
    let mut overlay = started(&desktop);
    let t0 = Instant::now();
    overlay.on_tick(t0);

    overlay.toggle(t0 + Duration::from_millis(10));
    desktop.focus(8, (500, 400, 700, 550), "Notepad");
    overlay.toggle(t0 + Duration::from_millis(20));

    // Released inside the paint interval: tracked, but not up yet.
    assert!(overlay.state().visible);
    assert_eq!(overlay.surface().shows, 1);

    overlay.on_tick(t0 + TICK);
    let surface = overlay.surface();
    assert_eq!(surface.shows, 2);
    let shown = &surface.frames[surface.shown_after[1] - 1];
    assert_eq!(shown.pixel(500, 400), Rgba::TRANSPARENT);
    assert_ne!(shown.pixel(100, 100).a, 0);
}

#[test]
fn every_show_follows_a_frame_of_the_shown_window() {
    let desktop = Desktop::focused(7, (100, 100, 400, 300), "Notepad");
    let mut overlay = started(&desktop);
    let t0 = Instant::now();

    overlay.on_tick(t0);
    desktop.focus(8, (500, 400, 700, 550), "Notepad");
    overlay.on_tick(t0 + TICK);

    let surface = overlay.surface();
    assert_eq!(surface.shown_after, vec![1, 2]);
    assert_eq!(surface.frames[1].pixel(500, 400), Rgba::TRANSPARENT);
}

#[test]
fn stable_window_is_shown_once() {
    let desktop = Desktop::focused(7, (100, 100, 400, 300), "Notepad");
    let mut overlay = started(&desktop);
    let t0 = Instant::now();

    for i in 0..20 {
        overlay.on_tick(t0 + TICK * i);
        assert!(overlay.state().visible);
    }
    assert_eq!(overlay.surface().shows, 1);
    assert_eq!(overlay.state().tick_count, 20);
}

#[test]
fn degenerate_geometry_leaves_state_alone() {
    let desktop = Desktop::focused(7, (100, 100, 400, 300), "Notepad");
    let mut overlay = started(&desktop);
    let t0 = Instant::now();
    overlay.on_tick(t0);
    let before = overlay.state().tracked();

    desktop.focus(7, (400, 100, 100, 300), "Notepad");
    assert!(matches!(
        overlay.on_tick(t0 + TICK),
        Some(TickOutcome::Skipped(SampleError::GeometryUnavailable(_)))
    ));
    desktop.focus(7, (100, 300, 400, 300), "Notepad");
    overlay.on_tick(t0 + TICK * 2);

    assert_eq!(overlay.state().tracked(), before);
    assert_eq!(overlay.surface().withdraws, 0);
}

#[test]
fn toggling_twice_restores_forced_hidden() {
    let desktop = Desktop::focused(7, (100, 100, 400, 300), "Notepad");
    let mut overlay = started(&desktop);
    let t0 = Instant::now();
    overlay.on_tick(t0);

    // Visible start.
    assert!(!overlay.state().forced_hidden);
    overlay.toggle(t0);
    overlay.toggle(t0);
    assert!(!overlay.state().forced_hidden);

    // Force-hidden start.
    overlay.toggle(t0);
    assert!(overlay.state().forced_hidden);
    overlay.toggle(t0);
    overlay.toggle(t0);
    assert!(overlay.state().forced_hidden);
}

#[test]
fn shutdown_twice_releases_once() {
    let desktop = Desktop::focused(7, (100, 100, 400, 300), "Notepad");
    let mut overlay = started(&desktop);
    overlay.on_tick(Instant::now());

    let first = overlay.shutdown();
    let second = overlay.shutdown();

    assert_eq!(first, second);
    assert_eq!(overlay.surface().releases, 1);
    assert_eq!(overlay.phase(), LifecyclePhase::Stopped);
}

#[test]
fn shutdown_signal_is_visible_to_the_coordinator() {
    let desktop = Desktop::focused(7, (100, 100, 400, 300), "Notepad");
    let signal = ShutdownSignal::new();
    let overlay = Coordinator::new(
        OverlayConfig::default(),
        &desktop,
        RecordingSurface::default(),
        signal.clone(),
    )
    .unwrap();

    assert!(!overlay.shutdown_requested());
    signal.request();
    assert!(overlay.shutdown_requested());
}

#[test]
fn rendering_same_state_twice_is_identical() {
    let desktop = Desktop::focused(7, (100, 100, 400, 300), "Notepad");
    let mut overlay = started(&desktop);
    overlay.on_tick(Instant::now());

    let engine = RenderEngine::new(
        ScreenRect::new(0, 0, 800, 600),
        &RenderStyle::default(),
        Duration::from_millis(50),
    )
    .unwrap();
    let state = overlay.state();
    assert_eq!(engine.render(state), engine.render(state));
    assert_eq!(&engine.render(state), &overlay.surface().frames[0]);
}
