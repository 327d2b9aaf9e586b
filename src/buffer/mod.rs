//! Raster buffers that blocks paint into and foundations composite

mod image;
mod pixel;

pub use image::Image;
pub use pixel::Rgba;
