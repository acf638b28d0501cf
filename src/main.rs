// Prevents console window in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use focusdim::config;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    // Single-instance check
    let Some(_instance) = acquire_instance() else {
        return ExitCode::SUCCESS;
    };

    let log_path = match focusdim::logging::init(&config::log_dir()) {
        Ok(path) => Some(path),
        Err(err) => {
            eprintln!("{} could not set up logging: {err}", config::APP_NAME);
            None
        }
    };
    info!(
        version = env!("CARGO_PKG_VERSION"),
        log = ?log_path,
        "{} starting",
        config::APP_NAME
    );

    // Anything escaping the run loop, panics included, ends here. The
    // coordinator's Drop has already cleaned up the surface by then.
    match panic::catch_unwind(AssertUnwindSafe(run)) {
        Ok(Ok(())) => {
            info!("{} exited", config::APP_NAME);
            ExitCode::SUCCESS
        }
        Ok(Err(err)) => {
            error!(fatal = true, "{err:#}");
            ExitCode::FAILURE
        }
        Err(payload) => {
            error!(fatal = true, "panic: {}", panic_message(payload.as_ref()));
            ExitCode::FAILURE
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}

#[cfg(windows)]
const SINGLE_INSTANCE_MUTEX: &str = "FocusDimMutex\0";

/// The named mutex this process owns; held by `main` until exit.
#[cfg(windows)]
struct InstanceGuard(Option<windows::Win32::Foundation::HANDLE>);

#[cfg(windows)]
impl Drop for InstanceGuard {
    fn drop(&mut self) {
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::ReleaseMutex;

        if let Some(handle) = self.0.take() {
            unsafe {
                let _ = ReleaseMutex(handle);
                let _ = CloseHandle(handle);
            }
        }
    }
}

/// Take the single-instance mutex, or `None` if another instance holds it.
#[cfg(windows)]
fn acquire_instance() -> Option<InstanceGuard> {
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{CloseHandle, GetLastError, ERROR_ALREADY_EXISTS};
    use windows::Win32::System::Threading::CreateMutexW;

    let name: Vec<u16> = SINGLE_INSTANCE_MUTEX.encode_utf16().collect();

    unsafe {
        match CreateMutexW(None, true, PCWSTR(name.as_ptr())) {
            Ok(handle) if GetLastError() == ERROR_ALREADY_EXISTS => {
                let _ = CloseHandle(handle);
                None
            }
            Ok(handle) => Some(InstanceGuard(Some(handle))),
            // Could not create it at all; run unguarded rather than not at all.
            Err(err) => {
                eprintln!("{} single-instance mutex unavailable: {err}", config::APP_NAME);
                Some(InstanceGuard(None))
            }
        }
    }
}

#[cfg(not(windows))]
struct InstanceGuard;

#[cfg(not(windows))]
fn acquire_instance() -> Option<InstanceGuard> {
    Some(InstanceGuard)
}

#[cfg(windows)]
fn run() -> anyhow::Result<()> {
    use focusdim::config::OverlayConfig;
    use focusdim::error::FocusDimError;
    use focusdim::foreground::ForegroundWindowProvider;
    use focusdim::hotkeys::HotkeyRegistration;
    use focusdim::lifecycle::{Coordinator, ShutdownSignal};
    use focusdim::overlay::LayeredOverlay;
    use focusdim::toggle::{HotkeyChord, ToggleController};
    use std::time::Instant;
    use tracing::warn;
    use windows::Win32::Foundation::{LPARAM, WPARAM};
    use windows::Win32::System::Threading::GetCurrentThreadId;
    use windows::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, GetMessageW, PostThreadMessageW, TranslateMessage, MSG, WM_APP,
        WM_HOTKEY, WM_TIMER,
    };

    // Posted by the signal handler so GetMessageW returns and the flag is seen.
    const WM_WAKE: u32 = WM_APP + 1;

    let config = OverlayConfig::default();
    let shutdown = ShutdownSignal::new();

    let thread_id = unsafe { GetCurrentThreadId() };
    let handler_signal = shutdown.clone();
    ctrlc::set_handler(move || {
        handler_signal.request();
        unsafe {
            let _ = PostThreadMessageW(thread_id, WM_WAKE, WPARAM(0), LPARAM(0));
        }
    })
    .map_err(|e| FocusDimError::Signal(e.to_string()))?;

    let chord: HotkeyChord = config.toggle_hotkey.parse()?;
    let controller = ToggleController::new(chord);

    let surface = LayeredOverlay::create_primary()?;
    let mut coordinator =
        Coordinator::new(config, ForegroundWindowProvider::new(), surface, shutdown)?;

    // Without the hotkey the overlay still tracks; there is just no toggle.
    let mut hotkey = match HotkeyRegistration::register(&controller) {
        Ok(registration) => Some(registration),
        Err(err) => {
            warn!("{err}, continuing without a toggle hotkey");
            None
        }
    };

    coordinator.start()?;

    // Win32 message loop
    let mut msg = MSG::default();
    let mut loop_error = None;
    loop {
        let got = unsafe { GetMessageW(&mut msg, None, 0, 0) };
        match got.0 {
            0 => {
                info!("quit message received");
                break;
            }
            -1 => {
                loop_error = Some(windows::core::Error::from_win32());
                break;
            }
            _ => {}
        }

        match msg.message {
            WM_TIMER if coordinator.surface().owns_timer(msg.wParam.0) => {
                coordinator.on_tick(Instant::now());
            }
            WM_HOTKEY if controller.handles(msg.wParam.0 as i32) => {
                controller.on_toggle(&mut coordinator, Instant::now());
            }
            WM_WAKE => {}
            _ => unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            },
        }

        if coordinator.shutdown_requested() {
            info!("shutdown requested");
            break;
        }
    }

    // Cleanup
    if let Some(registration) = hotkey.as_mut() {
        registration.unregister();
    }
    coordinator.shutdown();

    match loop_error {
        Some(err) => Err(anyhow::anyhow!("GetMessageW failed: {err}")),
        None => Ok(()),
    }
}

#[cfg(not(windows))]
fn run() -> anyhow::Result<()> {
    anyhow::bail!("{} only runs on Windows", config::APP_NAME)
}
