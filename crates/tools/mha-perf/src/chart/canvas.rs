//! In-memory RGB raster with clipped drawing primitives.
//!
//! Coordinates are signed so callers can position shapes partially off the
//! canvas; everything outside is clipped.

use super::font;
use crate::style::Rgb;

/// Horizontal anchor of a text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    /// Anchor is the left edge.
    Left,
    /// Anchor is the horizontal center.
    Center,
    /// Anchor is the right edge.
    Right,
}

/// Vertical anchor of a text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    /// Anchor is the top edge.
    Top,
    /// Anchor is the vertical center.
    Center,
    /// Anchor is the bottom edge.
    Bottom,
}

/// How a string is drawn.
///
/// Alignment refers to the bounding box of the text after rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Integer magnification of the 5x7 font.
    pub scale: u32,
    /// Ink color.
    pub color: Rgb,
    /// Thicken strokes horizontally.
    pub bold: bool,
    /// Counter-clockwise rotation in degrees.
    pub rotation: f32,
    /// Horizontal anchor.
    pub halign: HAlign,
    /// Vertical anchor.
    pub valign: VAlign,
}

impl TextStyle {
    /// Unrotated black text anchored at its top-left corner.
    pub fn new(scale: u32) -> Self {
        Self {
            scale: scale.max(1),
            color: Rgb::BLACK,
            bold: false,
            rotation: 0.0,
            halign: HAlign::Left,
            valign: VAlign::Top,
        }
    }

    /// Set the anchor.
    #[must_use]
    pub fn align(mut self, halign: HAlign, valign: VAlign) -> Self {
        self.halign = halign;
        self.valign = valign;
        self
    }

    /// Set the rotation in degrees.
    #[must_use]
    pub fn rotated(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    /// Enable bold strokes.
    #[must_use]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Horizontal stroke thickening applied in bold mode.
    fn embolden(&self) -> u32 {
        if self.bold { (self.scale / 3).max(1) } else { 0 }
    }
}

/// Axis-aligned pixel rectangle, `x1`/`y1` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub x0: i32,
    /// Top edge.
    pub y0: i32,
    /// Right edge (exclusive).
    pub x1: i32,
    /// Bottom edge (exclusive).
    pub y1: i32,
}

impl Rect {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        u32::try_from(self.x1 - self.x0).unwrap_or(0)
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        u32::try_from(self.y1 - self.y0).unwrap_or(0)
    }
}

/// An RGB raster image.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl Canvas {
    /// Create a canvas filled with `background`.
    pub fn new(width: u32, height: u32, background: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![background; width as usize * height as usize],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Read back one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        (x < self.width && y < self.height)
            .then(|| self.pixels[y as usize * self.width as usize + x as usize])
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        let x = u32::try_from(x).ok()?;
        let y = u32::try_from(y).ok()?;
        (x < self.width && y < self.height)
            .then(|| y as usize * self.width as usize + x as usize)
    }

    /// Set one pixel, ignoring out-of-bounds coordinates.
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Rgb) {
        if let Some(i) = self.offset(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Blend `color` over one pixel with opacity `alpha`.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgb, alpha: f32) {
        if let Some(i) = self.offset(x, y) {
            self.pixels[i] = color.blend_over(self.pixels[i], alpha);
        }
    }

    /// Fill `rect` with `color` at opacity `alpha`.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgb, alpha: f32) {
        let w = i32::try_from(self.width).unwrap_or(i32::MAX);
        let h = i32::try_from(self.height).unwrap_or(i32::MAX);
        for y in rect.y0.max(0)..rect.y1.min(h) {
            for x in rect.x0.max(0)..rect.x1.min(w) {
                self.blend_pixel(x, y, color, alpha);
            }
        }
    }

    /// Draw a horizontal line `thickness` pixels tall, starting at `y`.
    pub fn hline(&mut self, x0: i32, x1: i32, y: i32, thickness: u32, color: Rgb) {
        let t = i32::try_from(thickness.max(1)).unwrap_or(1);
        self.fill_rect(Rect { x0, y0: y, x1, y1: y + t }, color, 1.0);
    }

    /// Draw a vertical line `thickness` pixels wide, starting at `x`.
    pub fn vline(&mut self, x: i32, y0: i32, y1: i32, thickness: u32, color: Rgb) {
        let t = i32::try_from(thickness.max(1)).unwrap_or(1);
        self.fill_rect(Rect { x0: x, y0, x1: x + t, y1 }, color, 1.0);
    }

    /// Draw a dashed horizontal line blended at opacity `alpha`.
    #[allow(clippy::too_many_arguments)]
    pub fn dashed_hline(
        &mut self,
        x0: i32,
        x1: i32,
        y: i32,
        thickness: u32,
        dash: u32,
        gap: u32,
        color: Rgb,
        alpha: f32,
    ) {
        let t = i32::try_from(thickness.max(1)).unwrap_or(1);
        let dash = i32::try_from(dash.max(1)).unwrap_or(1);
        let period = dash + i32::try_from(gap).unwrap_or(0);
        let mut x = x0;
        while x < x1 {
            let end = (x + dash).min(x1);
            self.fill_rect(Rect { x0: x, y0: y, x1: end, y1: y + t }, color, alpha);
            x += period;
        }
    }

    /// Size of `text`'s bounding box once drawn with `style`.
    pub fn measure_text(text: &str, style: &TextStyle) -> (u32, u32) {
        TextMask::render(text, style).rotated_size(style.rotation)
    }

    /// Draw `text` anchored at (`x`, `y`), returning the covered box.
    #[allow(clippy::cast_precision_loss)]
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, style: &TextStyle) -> Rect {
        let mask = TextMask::render(text, style);
        let (bw, bh) = mask.rotated_size(style.rotation);
        let (bw, bh) = (to_i32(bw), to_i32(bh));

        let left = match style.halign {
            HAlign::Left => x,
            HAlign::Center => x - bw / 2,
            HAlign::Right => x - bw,
        };
        let top = match style.valign {
            VAlign::Top => y,
            VAlign::Center => y - bh / 2,
            VAlign::Bottom => y - bh,
        };
        let bounds = Rect {
            x0: left,
            y0: top,
            x1: left + bw,
            y1: top + bh,
        };

        let (sin, cos) = style.rotation.to_radians().sin_cos();
        let cx = bw as f32 / 2.0;
        let cy = bh as f32 / 2.0;
        let mw = mask.width as f32 / 2.0;
        let mh = mask.height as f32 / 2.0;

        // Inverse-map each destination pixel center back into the mask.
        for py in 0..bh {
            for px in 0..bw {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                let sx = dx * cos - dy * sin + mw;
                let sy = dx * sin + dy * cos + mh;
                if mask.covers(sx, sy) {
                    self.put_pixel(left + px, top + py, style.color);
                }
            }
        }

        bounds
    }

    /// Smallest rectangle containing every pixel that differs from
    /// `background`, or `None` for a blank canvas.
    pub fn content_bounds(&self, background: Rgb) -> Option<Rect> {
        let w = self.width as usize;
        let mut bounds: Option<Rect> = None;
        for (i, &p) in self.pixels.iter().enumerate() {
            if p == background {
                continue;
            }
            let x = to_i32(u32::try_from(i % w).unwrap_or(u32::MAX));
            let y = to_i32(u32::try_from(i / w).unwrap_or(u32::MAX));
            bounds = Some(match bounds {
                None => Rect { x0: x, y0: y, x1: x + 1, y1: y + 1 },
                Some(b) => Rect {
                    x0: b.x0.min(x),
                    y0: b.y0.min(y),
                    x1: b.x1.max(x + 1),
                    y1: b.y1.max(y + 1),
                },
            });
        }
        bounds
    }

    /// Copy out `rect`, filling any part outside the canvas with `fill`.
    #[must_use]
    pub fn crop(&self, rect: Rect, fill: Rgb) -> Self {
        let mut out = Self::new(rect.width(), rect.height(), fill);
        for y in 0..rect.height() {
            for x in 0..rect.width() {
                let sx = rect.x0 + to_i32(x);
                let sy = rect.y0 + to_i32(y);
                if let Some(i) = self.offset(sx, sy) {
                    out.pixels[y as usize * out.width as usize + x as usize] = self.pixels[i];
                }
            }
        }
        out
    }

    /// Packed 8-bit RGB scanlines, top to bottom.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for p in &self.pixels {
            out.extend_from_slice(&[p.r, p.g, p.b]);
        }
        out
    }
}

fn to_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

/// Unrotated coverage mask of a rendered string.
struct TextMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl TextMask {
    fn render(text: &str, style: &TextStyle) -> Self {
        let scale = style.scale.max(1);
        let extra = style.embolden();
        let (tw, th) = font::text_size(text);
        let width = if tw == 0 { 0 } else { tw * scale + extra };
        let height = th * scale;
        let mut bits = vec![false; width as usize * height as usize];

        for (i, ch) in text.chars().enumerate() {
            let glyph = font::glyph(ch);
            let origin = u32::try_from(i).unwrap_or(u32::MAX) * font::ADVANCE * scale;
            for gy in 0..font::HEIGHT {
                for gx in 0..font::WIDTH {
                    if !font::pixel(glyph, gx, gy) {
                        continue;
                    }
                    for y in gy * scale..(gy + 1) * scale {
                        for x in origin + gx * scale..origin + (gx + 1) * scale + extra {
                            if x < width {
                                bits[y as usize * width as usize + x as usize] = true;
                            }
                        }
                    }
                }
            }
        }

        Self {
            width,
            height,
            bits,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rotated_size(&self, degrees: f32) -> (u32, u32) {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let (w, h) = (self.width as f32, self.height as f32);
        let bw = w * cos.abs() + h * sin.abs();
        let bh = w * sin.abs() + h * cos.abs();
        // Absorb float noise so 90 degree turns swap dimensions exactly.
        ((bw - 1e-3).ceil().max(0.0) as u32, (bh - 1e-3).ceil().max(0.0) as u32)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn covers(&self, sx: f32, sy: f32) -> bool {
        if sx < 0.0 || sy < 0.0 {
            return false;
        }
        let (x, y) = (sx.floor() as u32, sy.floor() as u32);
        x < self.width && y < self.height && self.bits[y as usize * self.width as usize + x as usize]
    }
}
