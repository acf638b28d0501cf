// Foreground-window sampling seam.
//
// The Win32 implementation lives in `foreground.rs`; everything above this
// trait (tracker, coordinator, tests) only sees `WindowSnapshot` values.

use crate::error::SampleError;
use crate::geometry::ScreenRect;
use std::fmt;

/// Opaque OS window identity (an `HWND` value on Windows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

/// One observation of the foreground window. Lives for a single tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub handle: WindowHandle,
    pub rect: ScreenRect,
    pub title: String,
    pub class_name: String,
}

impl WindowSnapshot {
    /// Build a snapshot from raw OS edges, rejecting inverted or empty
    /// rectangles as `GeometryUnavailable`.
    pub fn from_edges(
        handle: WindowHandle,
        (left, top, right, bottom): (i32, i32, i32, i32),
        title: impl Into<String>,
        class_name: impl Into<String>,
    ) -> Result<Self, SampleError> {
        let rect = ScreenRect::from_edges(left, top, right, bottom).ok_or_else(|| {
            SampleError::GeometryUnavailable(format!(
                "window {handle} reported edges ({left}, {top}, {right}, {bottom})"
            ))
        })?;

        Ok(Self {
            handle,
            rect,
            title: title.into(),
            class_name: class_name.into(),
        })
    }
}

/// Source of foreground-window snapshots. Implementations must not mutate
/// anything observable; they only query.
pub trait WindowInfoProvider {
    fn sample(&self) -> Result<WindowSnapshot, SampleError>;
}

impl<T: WindowInfoProvider + ?Sized> WindowInfoProvider for &T {
    fn sample(&self) -> Result<WindowSnapshot, SampleError> {
        (**self).sample()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_from_valid_edges() {
        let snapshot =
            WindowSnapshot::from_edges(WindowHandle(7), (100, 100, 400, 300), "Untitled", "Notepad")
                .unwrap();
        assert_eq!(snapshot.rect, ScreenRect::new(100, 100, 300, 200));
        assert_eq!(snapshot.class_name, "Notepad");
    }

    #[test]
    fn snapshot_from_zero_area_edges_is_geometry_unavailable() {
        let err = WindowSnapshot::from_edges(WindowHandle(7), (100, 100, 100, 300), "", "Notepad")
            .unwrap_err();
        assert!(matches!(err, SampleError::GeometryUnavailable(_)));
    }

    #[test]
    fn handle_displays_as_hex() {
        assert_eq!(WindowHandle(0x1A2B).to_string(), "0x1A2B");
    }
}
