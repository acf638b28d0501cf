// Dim mask with a vignette and a transparent cutout over the tracked window.
//
// Layers, back to front:
//   1. near-opaque base dim over the whole surface
//   2. radial vignette (alpha-over), transparent in the middle
//   3. "clear" cutout at the highlight rectangle when visible
//
// Layers 1 and 2 only depend on the surface size, so they are composed once
// into a backdrop and every frame starts from a copy of it.

use crate::error::RenderError;
use crate::geometry::ScreenRect;
use crate::tracker::OverlayState;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Colours and vignette geometry of the mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStyle {
    pub dim: Rgba,
    pub vignette_edge: Rgba,
    /// Vignette radius as a fraction of the longer surface side.
    pub vignette_radius_factor: f32,
    /// Fraction of the radius that stays fully transparent.
    pub vignette_fade_start: f32,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            dim: Rgba::new(0, 0, 0, 235),
            vignette_edge: Rgba::new(0, 0, 0, 180),
            vignette_radius_factor: 0.75,
            vignette_fade_start: 0.7,
        }
    }
}

/// Straight-alpha RGBA pixels, row-major, top-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, fill: Rgba) -> Self {
        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        for chunk in pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[fill.r, fill.g, fill.b, fill.a]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let idx = self.index(x, y);
        Rgba {
            r: self.pixels[idx],
            g: self.pixels[idx + 1],
            b: self.pixels[idx + 2],
            a: self.pixels[idx + 3],
        }
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        let idx = self.index(x, y);
        self.pixels[idx..idx + 4].copy_from_slice(&[color.r, color.g, color.b, color.a]);
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Clear every pixel of `rect` (surface coordinates) to transparent.
    /// `rect` must already be clipped to the frame.
    fn clear_rect(&mut self, rect: &ScreenRect) {
        let row_bytes = self.width as usize * 4;
        for y in rect.top..rect.bottom() {
            let start = y as usize * row_bytes + rect.left as usize * 4;
            let end = start + rect.width as usize * 4;
            self.pixels[start..end].fill(0);
        }
    }

    /// Premultiplied BGRA, the layout `UpdateLayeredWindow` expects.
    pub fn to_premultiplied_bgra(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len());
        for px in self.pixels.chunks_exact(4) {
            let a = px[3] as u16;
            let premultiply = |c: u8| ((c as u16 * a + 127) / 255) as u8;
            out.extend_from_slice(&[
                premultiply(px[2]),
                premultiply(px[1]),
                premultiply(px[0]),
                px[3],
            ]);
        }
        out
    }
}

pub struct RenderEngine {
    bounds: ScreenRect,
    backdrop: Frame,
    paint_interval: Duration,
}

impl RenderEngine {
    /// `bounds` is the surface rectangle in screen coordinates.
    pub fn new(
        bounds: ScreenRect,
        style: &RenderStyle,
        paint_interval: Duration,
    ) -> Result<Self, RenderError> {
        if bounds.is_degenerate() {
            return Err(RenderError::EmptySurface {
                width: bounds.width,
                height: bounds.height,
            });
        }

        let backdrop = compose_backdrop(bounds.width as u32, bounds.height as u32, style);
        Ok(Self {
            bounds,
            backdrop,
            paint_interval,
        })
    }

    pub fn bounds(&self) -> ScreenRect {
        self.bounds
    }

    pub fn render(&self, state: &OverlayState) -> Frame {
        let mut frame = self.backdrop.clone();
        if state.visible {
            let local = state
                .highlight_rect
                .translated(-self.bounds.left, -self.bounds.top);
            let surface = ScreenRect::new(0, 0, self.bounds.width, self.bounds.height);
            if let Some(cutout) = local.intersection(&surface) {
                frame.clear_rect(&cutout);
            }
        }
        frame
    }

    /// Rate-limited paint. Returns `None` when the previous draw is more
    /// recent than the paint interval; the caller keeps showing that frame.
    pub fn paint(&self, state: &mut OverlayState, now: Instant) -> Option<Frame> {
        if let Some(last) = state.last_paint_time {
            if now.saturating_duration_since(last) < self.paint_interval {
                return None;
            }
        }
        state.last_paint_time = Some(now);
        state.paint_count += 1;
        Some(self.render(state))
    }
}

fn compose_backdrop(width: u32, height: u32, style: &RenderStyle) -> Frame {
    let mut frame = Frame::new(width, height, style.dim);

    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let radius = style.vignette_radius_factor * width.max(height) as f32;

    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let ratio = (dx * dx + dy * dy).sqrt() / radius;
            let alpha = vignette_alpha(ratio, style);
            if alpha == 0 {
                continue;
            }
            let top = Rgba {
                a: alpha,
                ..style.vignette_edge
            };
            let blended = blend_pixel(style.dim, top);
            frame.set_pixel(x, y, blended);
        }
    }

    frame
}

/// Vignette alpha at `ratio` = distance / radius. Past the radius the edge
/// colour is padded outwards.
fn vignette_alpha(ratio: f32, style: &RenderStyle) -> u8 {
    let start = style.vignette_fade_start;
    if ratio <= start {
        return 0;
    }
    let t = ((ratio - start) / (1.0 - start)).min(1.0);
    (style.vignette_edge.a as f32 * t).round() as u8
}

fn blend_pixel(bottom: Rgba, top: Rgba) -> Rgba {
    let sa = top.a as f32 / 255.0;
    let da = bottom.a as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    if out_a <= f32::EPSILON {
        return Rgba::TRANSPARENT;
    }

    let blend = |s: u8, d: u8| -> u8 {
        (((s as f32 * sa) + (d as f32 * da * (1.0 - sa))) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };

    Rgba {
        r: blend(top.r, bottom.r),
        g: blend(top.g, bottom.g),
        b: blend(top.b, bottom.b),
        a: (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    }
}
