/// Integer screen rectangle in virtual-screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenRect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl ScreenRect {
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Build from the edge form the OS reports. Inverted or zero-area
    /// rectangles (right <= left or bottom <= top) yield `None`.
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Option<Self> {
        if right <= left || bottom <= top {
            return None;
        }
        let width = right.checked_sub(left)?;
        let height = bottom.checked_sub(top)?;
        Some(Self::new(left, top, width, height))
    }

    pub fn right(&self) -> i32 {
        self.left.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.top.saturating_add(self.height)
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.left.saturating_add(dx),
            self.top.saturating_add(dy),
            self.width,
            self.height,
        )
    }

    /// Overlap with `other`, or `None` when they do not intersect.
    pub fn intersection(&self, other: &ScreenRect) -> Option<ScreenRect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Self::from_edges(left, top, right, bottom)
    }
}
