// Full-screen layered overlay window on the primary display.
//
// The window is layered, click-through, topmost, never activated and kept
// out of the taskbar and Alt+Tab:
//   • WS_EX_LAYERED | WS_EX_TRANSPARENT lets input fall through
//   • WS_EX_TOPMOST puts it in the topmost z-band
//   • WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE keeps it out of Alt+Tab and focus
// Pixels go in through UpdateLayeredWindow with a premultiplied BGRA DIB,
// so per-pixel alpha works and there is no WM_PAINT path at all.
//
// Ticks come from a thread timer (SetTimer without a window); the message
// loop in main.rs routes its WM_TIMER to the coordinator.

use crate::error::{FocusDimError, RenderError, Result};
use crate::geometry::ScreenRect;
use crate::lifecycle::OverlaySurface;
use crate::render::Frame;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};
use windows::core::PCWSTR;
use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, POINT, SIZE, WPARAM};
use windows::Win32::Graphics::Gdi::{
    CreateCompatibleDC, CreateDIBSection, DeleteDC, DeleteObject, SelectObject, BITMAPINFO,
    BITMAPINFOHEADER, BI_RGB, BLENDFUNCTION, DIB_RGB_COLORS,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, GetSystemMetrics, KillTimer, PostQuitMessage,
    RegisterClassW, SetTimer, SetWindowPos, ShowWindow, UpdateLayeredWindow, HWND_TOPMOST,
    SM_CXSCREEN, SM_CYSCREEN, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SW_HIDE,
    SW_SHOWNOACTIVATE, ULW_ALPHA, WM_CLOSE, WM_ENDSESSION, WNDCLASSW, WS_DISABLED,
    WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_EX_TRANSPARENT,
    WS_POPUP,
};

const CLASS_NAME: &str = "FocusDimOverlay\0";

// BLENDFUNCTION fields are bytes.
const AC_SRC_OVER: u8 = 0x00;
const AC_SRC_ALPHA: u8 = 0x01;

static CLASS_REGISTERED: AtomicBool = AtomicBool::new(false);

/// Closing or session end ends the message loop; teardown then runs on
/// the main thread.
unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_CLOSE => {
            PostQuitMessage(0);
            LRESULT(0)
        }
        WM_ENDSESSION if wparam.0 != 0 => {
            PostQuitMessage(0);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

fn class_name() -> Vec<u16> {
    CLASS_NAME.encode_utf16().collect()
}

fn register_class() -> Result<()> {
    if CLASS_REGISTERED.load(Ordering::SeqCst) {
        return Ok(());
    }

    unsafe {
        let hinstance = GetModuleHandleW(PCWSTR::null())
            .map_err(|e| FocusDimError::surface(format!("GetModuleHandleW: {e}")))?;
        let class_name = class_name();

        let wc = WNDCLASSW {
            lpfnWndProc: Some(window_proc),
            hInstance: hinstance.into(),
            lpszClassName: PCWSTR(class_name.as_ptr()),
            ..Default::default()
        };

        if RegisterClassW(&wc) == 0 {
            return Err(FocusDimError::surface(format!(
                "RegisterClassW: {}",
                windows::core::Error::from_win32()
            )));
        }
    }

    CLASS_REGISTERED.store(true, Ordering::SeqCst);
    Ok(())
}

pub struct LayeredOverlay {
    hwnd: Option<HWND>,
    bounds: ScreenRect,
    timer_id: Option<usize>,
}

impl LayeredOverlay {
    /// Create the (hidden) overlay covering the primary display.
    pub fn create_primary() -> Result<Self> {
        let bounds = unsafe {
            ScreenRect::new(
                0,
                0,
                GetSystemMetrics(SM_CXSCREEN),
                GetSystemMetrics(SM_CYSCREEN),
            )
        };
        if bounds.is_degenerate() {
            return Err(RenderError::EmptySurface {
                width: bounds.width,
                height: bounds.height,
            }
            .into());
        }

        register_class()?;

        let hwnd = unsafe {
            let hinstance = GetModuleHandleW(PCWSTR::null())
                .map_err(|e| FocusDimError::surface(format!("GetModuleHandleW: {e}")))?;
            let class_name = class_name();

            CreateWindowExW(
                WS_EX_LAYERED
                    | WS_EX_TRANSPARENT
                    | WS_EX_TOPMOST
                    | WS_EX_TOOLWINDOW
                    | WS_EX_NOACTIVATE,
                PCWSTR(class_name.as_ptr()),
                PCWSTR::null(),
                WS_POPUP | WS_DISABLED,
                bounds.left,
                bounds.top,
                bounds.width,
                bounds.height,
                None,
                None,
                Some(hinstance.into()),
                None,
            )
            .map_err(|e| FocusDimError::surface(format!("CreateWindowExW: {e}")))?
        };

        info!(?bounds, "overlay window created");
        Ok(Self {
            hwnd: Some(hwnd),
            bounds,
            timer_id: None,
        })
    }

    /// Whether a `WM_TIMER` with this id is the overlay's tick.
    pub fn owns_timer(&self, id: usize) -> bool {
        self.timer_id == Some(id)
    }

    fn window(&self) -> Result<HWND> {
        self.hwnd
            .ok_or_else(|| FocusDimError::surface("overlay window already released"))
    }
}

impl OverlaySurface for LayeredOverlay {
    fn bounds(&self) -> ScreenRect {
        self.bounds
    }

    fn start_ticks(&mut self, period: Duration) -> Result<()> {
        self.stop_ticks()?;
        let millis = period.as_millis().clamp(1, u32::MAX as u128) as u32;
        let id = unsafe { SetTimer(None, 0, millis, None) };
        if id == 0 {
            return Err(FocusDimError::surface(format!(
                "SetTimer: {}",
                windows::core::Error::from_win32()
            )));
        }
        debug!(id, millis, "tick timer started");
        self.timer_id = Some(id);
        Ok(())
    }

    fn stop_ticks(&mut self) -> Result<()> {
        if let Some(id) = self.timer_id.take() {
            unsafe { KillTimer(None, id) }
                .map_err(|e| FocusDimError::surface(format!("KillTimer: {e}")))?;
        }
        Ok(())
    }

    fn show(&mut self) -> Result<()> {
        let hwnd = self.window()?;
        unsafe {
            let _ = ShowWindow(hwnd, SW_SHOWNOACTIVATE);
            SetWindowPos(
                hwnd,
                Some(HWND_TOPMOST),
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
            )
            .map_err(|e| FocusDimError::surface(format!("SetWindowPos: {e}")))?;
        }
        Ok(())
    }

    fn withdraw(&mut self) -> Result<()> {
        if let Some(hwnd) = self.hwnd {
            unsafe {
                let _ = ShowWindow(hwnd, SW_HIDE);
            }
        }
        Ok(())
    }

    fn present(&mut self, frame: &Frame) -> std::result::Result<(), RenderError> {
        let hwnd = self
            .hwnd
            .ok_or_else(|| RenderError::Present("overlay window already released".into()))?;
        let width = frame.width() as i32;
        let height = frame.height() as i32;
        let pixels = frame.to_premultiplied_bgra();

        let bmi = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                // Negative height: top-down rows, matching the frame.
                biHeight: -height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };

        unsafe {
            let mem_dc = CreateCompatibleDC(None);
            if mem_dc.is_invalid() {
                return Err(RenderError::Present("CreateCompatibleDC failed".into()));
            }

            let mut bits: *mut std::ffi::c_void = std::ptr::null_mut();
            let created =
                CreateDIBSection(Some(mem_dc), &bmi, DIB_RGB_COLORS, &mut bits, None, 0);
            let bitmap = match created {
                Ok(bitmap) if !bits.is_null() => bitmap,
                Ok(bitmap) => {
                    let _ = DeleteObject(bitmap.into());
                    let _ = DeleteDC(mem_dc);
                    return Err(RenderError::Present("DIB section has no pixel memory".into()));
                }
                Err(e) => {
                    let _ = DeleteDC(mem_dc);
                    return Err(RenderError::Present(format!("CreateDIBSection: {e}")));
                }
            };

            std::ptr::copy_nonoverlapping(pixels.as_ptr(), bits as *mut u8, pixels.len());
            let previous = SelectObject(mem_dc, bitmap.into());

            let dst = POINT {
                x: self.bounds.left,
                y: self.bounds.top,
            };
            let src = POINT { x: 0, y: 0 };
            let size = SIZE {
                cx: width,
                cy: height,
            };
            let blend = BLENDFUNCTION {
                BlendOp: AC_SRC_OVER,
                BlendFlags: 0,
                SourceConstantAlpha: 255,
                AlphaFormat: AC_SRC_ALPHA,
            };

            let result = UpdateLayeredWindow(
                hwnd,
                None,
                Some(&dst),
                Some(&size),
                Some(mem_dc),
                Some(&src),
                COLORREF(0),
                Some(&blend),
                ULW_ALPHA,
            );

            let _ = SelectObject(mem_dc, previous);
            let _ = DeleteObject(bitmap.into());
            let _ = DeleteDC(mem_dc);

            result.map_err(|e| RenderError::Present(format!("UpdateLayeredWindow: {e}")))
        }
    }

    fn release(&mut self) -> Result<()> {
        self.stop_ticks()?;
        if let Some(hwnd) = self.hwnd.take() {
            unsafe { DestroyWindow(hwnd) }
                .map_err(|e| FocusDimError::surface(format!("DestroyWindow: {e}")))?;
            debug!("overlay window destroyed");
        }
        Ok(())
    }
}

impl Drop for LayeredOverlay {
    fn drop(&mut self) {
        let _ = self.release();
    }
}
