// Foreground-window sampling through user32.

use crate::error::SampleError;
use crate::window_info::{WindowHandle, WindowInfoProvider, WindowSnapshot};
use windows::Win32::Foundation::{HWND, RECT};
use windows::Win32::UI::WindowsAndMessaging::{
    GetClassNameW, GetForegroundWindow, GetWindowRect, GetWindowTextW, IsWindow,
};

/// Window class names are limited to 256 characters.
const CLASS_NAME_CAPACITY: usize = 256;
const TITLE_CAPACITY: usize = 512;

/// Reads the current foreground window. Holds no state between samples.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForegroundWindowProvider;

impl ForegroundWindowProvider {
    pub fn new() -> Self {
        Self
    }
}

impl WindowInfoProvider for ForegroundWindowProvider {
    fn sample(&self) -> Result<WindowSnapshot, SampleError> {
        unsafe {
            let hwnd = GetForegroundWindow();
            // Focus can move to nothing, or the window can die between calls.
            if hwnd.is_invalid() || !IsWindow(Some(hwnd)).as_bool() {
                return Err(SampleError::NoForegroundWindow);
            }
            let handle = WindowHandle(hwnd.0 as isize);

            let mut rect = RECT::default();
            GetWindowRect(hwnd, &mut rect).map_err(|e| {
                SampleError::QueryFailure(format!("GetWindowRect({handle}): {e}"))
            })?;

            let class_name = class_name(hwnd).ok_or_else(|| {
                SampleError::QueryFailure(format!(
                    "GetClassNameW({handle}): {}",
                    windows::core::Error::from_win32()
                ))
            })?;
            let title = window_text(hwnd);

            WindowSnapshot::from_edges(
                handle,
                (rect.left, rect.top, rect.right, rect.bottom),
                title,
                class_name,
            )
        }
    }
}

unsafe fn class_name(hwnd: HWND) -> Option<String> {
    let mut buf = [0u16; CLASS_NAME_CAPACITY];
    let len = GetClassNameW(hwnd, &mut buf);
    if len <= 0 {
        return None;
    }
    Some(String::from_utf16_lossy(&buf[..len as usize]))
}

/// Untitled windows are common; an empty title is not an error.
unsafe fn window_text(hwnd: HWND) -> String {
    let mut buf = [0u16; TITLE_CAPACITY];
    let len = GetWindowTextW(hwnd, &mut buf).max(0) as usize;
    String::from_utf16_lossy(&buf[..len])
}
