//! Premultiplied RGBA pixels

/// An 8-bit RGBA pixel with premultiplied alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);

    /// Create a pixel from already premultiplied channels
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a fully opaque pixel
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Create a pixel from straight (non-premultiplied) channels
    pub fn straight(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(mul_div(r, a), mul_div(g, a), mul_div(b, a), a)
    }

    /// Parse a hex color string (e.g., "#ff0000" or "ff0000"), always opaque
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 {
            return None;
        }

        let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
        let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
        let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
        Some(Self::opaque(r, g, b))
    }

    pub const fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// Porter-Duff "source over destination"
    pub fn over(self, dst: Rgba) -> Rgba {
        let inv = 255 - self.a;
        Rgba::new(
            self.r.saturating_add(mul_div(dst.r, inv)),
            self.g.saturating_add(mul_div(dst.g, inv)),
            self.b.saturating_add(mul_div(dst.b, inv)),
            self.a.saturating_add(mul_div(dst.a, inv)),
        )
    }
}

/// `v * f / 255`, rounded
fn mul_div(v: u8, f: u8) -> u8 {
    let p = u32::from(v) * u32::from(f) + 128;
    ((p + (p >> 8)) >> 8) as u8
}
