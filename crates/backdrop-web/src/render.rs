pub mod grid;
pub mod helpers;
pub mod pixel_blast;

pub use grid::GridRenderer;
pub use pixel_blast::PixelBlastRenderer;

pub static PIXEL_BLAST_WGSL: &str = include_str!("../shaders/pixel_blast.wgsl");

#[inline]
pub fn to_wgpu_color(c: backdrop_core::Rgba) -> wgpu::Color {
    wgpu::Color {
        r: c.r as f64,
        g: c.g as f64,
        b: c.b as f64,
        a: c.a as f64,
    }
}
