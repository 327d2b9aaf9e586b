//! 2D RGBA raster

use super::Rgba;
use crate::geometry::{Coord, Rect};

/// 2D raster of premultiplied pixels (row-major order)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Image {
    /// Create a transparent image
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgba::TRANSPARENT)
    }

    /// Create an image filled with one pixel value
    pub fn filled(width: u32, height: u32, pixel: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![pixel; width as usize * height as usize],
        }
    }

    /// Create a transparent image large enough for a block of `size`
    pub fn for_size(size: Coord) -> Self {
        Self::new(to_extent(size.x), to_extent(size.y))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bounds of the image in its own coordinate space
    pub fn bounds(&self) -> Rect {
        Rect::sized(Coord::new(f64::from(self.width), f64::from(self.height)))
    }

    /// Whether this image can hold a block of `size` without reallocation
    pub fn matches_size(&self, size: Coord) -> bool {
        self.width == to_extent(size.x) && self.height == to_extent(size.y)
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height) {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Get a pixel (returns None if out of bounds)
    pub fn get(&self, x: i64, y: i64) -> Option<Rgba> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Set a pixel (does nothing if out of bounds)
    pub fn set(&mut self, x: i64, y: i64, pixel: Rgba) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = pixel;
        }
    }

    /// Row-major pixel data
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Fill the whole image
    pub fn fill(&mut self, pixel: Rgba) {
        self.pixels.fill(pixel);
    }

    /// Fill an area, clipped to the image
    pub fn fill_rect(&mut self, area: Rect, pixel: Rgba) {
        let (x0, y0, x1, y1) = self.clip(area);
        for y in y0..y1 {
            for x in x0..x1 {
                self.set(x, y, pixel);
            }
        }
    }

    /// Alpha-composite `src` over this image with its origin at `at.min`,
    /// clipped to `at` and to this image
    pub fn draw_over(&mut self, at: Rect, src: &Image) {
        self.blit(at, src, Rgba::over);
    }

    /// Copy `src` into this image with its origin at `at.min`, replacing the
    /// destination pixels, clipped to `at` and to this image
    pub fn draw_src(&mut self, at: Rect, src: &Image) {
        self.blit(at, src, |s, _| s);
    }

    fn blit(&mut self, at: Rect, src: &Image, op: impl Fn(Rgba, Rgba) -> Rgba) {
        let ox = at.min.x.round() as i64;
        let oy = at.min.y.round() as i64;
        let (x0, y0, x1, y1) = self.clip(at);
        let x1 = x1.min(ox.saturating_add(i64::from(src.width)));
        let y1 = y1.min(oy.saturating_add(i64::from(src.height)));
        for y in y0..y1 {
            for x in x0..x1 {
                let (Some(s), Some(di)) = (src.get(x - ox, y - oy), self.index(x, y)) else {
                    continue;
                };
                self.pixels[di] = op(s, self.pixels[di]);
            }
        }
    }

    /// Integer span of `area` clipped to the image, as `(x0, y0, x1, y1)`
    fn clip(&self, area: Rect) -> (i64, i64, i64, i64) {
        (
            (area.min.x.round() as i64).max(0),
            (area.min.y.round() as i64).max(0),
            (area.max.x.round() as i64).min(i64::from(self.width)),
            (area.max.y.round() as i64).min(i64::from(self.height)),
        )
    }
}

fn to_extent(v: f64) -> u32 {
    if v.is_finite() && v > 0.0 {
        v.round().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}
