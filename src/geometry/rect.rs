//! Axis-aligned rectangle given by its min and max corners

use super::Coord;

/// A rectangle spanning `[min, max)` on both axes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub min: Coord,
    pub max: Coord,
}

impl Rect {
    /// Create a rectangle from its corners
    pub const fn new(min: Coord, max: Coord) -> Self {
        Self { min, max }
    }

    /// Create a rectangle from edge coordinates
    pub const fn from_edges(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(Coord::new(min_x, min_y), Coord::new(max_x, max_y))
    }

    /// Create a rectangle at origin with the given size
    pub const fn sized(size: Coord) -> Self {
        Self::new(Coord::origin(), size)
    }

    /// Create from position and size
    pub fn from_pos_size(pos: Coord, size: Coord) -> Self {
        Self::new(pos, pos + size)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Width and height as a coordinate
    pub fn size(&self) -> Coord {
        self.max - self.min
    }

    /// Check if the rectangle has no area
    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }

    /// Check if a point is inside this rectangle (max edges exclusive)
    pub fn contains_coord(&self, p: Coord) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Check whether two rectangles overlap
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Get the intersection of two rectangles
    pub fn intersect(&self, other: &Rect) -> Self {
        let r = Self::from_edges(
            self.min.x.max(other.min.x),
            self.min.y.max(other.min.y),
            self.max.x.min(other.max.x),
            self.max.y.min(other.max.y),
        );
        if r.is_empty() {
            Self::default()
        } else {
            r
        }
    }

    /// Smallest rectangle containing both; empty rectangles are ignored
    pub fn union(&self, other: &Rect) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self::from_edges(
            self.min.x.min(other.min.x),
            self.min.y.min(other.min.y),
            self.max.x.max(other.max.x),
            self.max.y.max(other.max.y),
        )
    }

    /// Shift the whole rectangle by `-origin`, moving it into a space whose
    /// origin sits at `origin`
    pub fn translate_into(&self, origin: Coord) -> Self {
        Self::new(self.min - origin, self.max - origin)
    }
}
