//! GPU uniform block for the pixel blast shader.
//!
//! Layout is five `vec4<f32>` rows so it matches WGSL uniform alignment without
//! padding fields. Clamping of host-supplied values happens here.

use crate::constants::*;
use crate::params::{ParamSnapshot, Rgba};
use crate::surface::{BackgroundMode, BackingSize};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EffectUniforms {
    /// width, height, time (s), pixel size (device px)
    pub resolution_time: [f32; 4],
    pub color: [f32; 4],
    /// pointer uv, pattern scale, pattern density
    pub pointer_pattern: [f32; 4],
    /// speed, edge fade, ripple intensity, seed
    pub motion: [f32; 4],
    pub clear: [f32; 4],
}

impl EffectUniforms {
    pub fn from_snapshot(
        params: &ParamSnapshot,
        backing: BackingSize,
        elapsed: f64,
        background: BackgroundMode,
        pixel_scale: f32,
    ) -> Self {
        let scale = if pixel_scale.is_finite() && pixel_scale > 0.0 {
            pixel_scale
        } else {
            1.0
        };
        let pixel_size = (params.finite_or("pixelSize", PIXEL_BLAST_PIXEL_SIZE) * scale)
            .clamp(PIXEL_SIZE_MIN, PIXEL_SIZE_MAX * scale);
        let color = params
            .color(COLOR_PARAM)
            .unwrap_or(Rgba::new(1.0, 1.0, 1.0, 1.0));
        let pointer = params
            .finite_vec2(POINTER_PARAM)
            .map(|p| p.clamp(glam::Vec2::ZERO, glam::Vec2::ONE))
            .unwrap_or(glam::Vec2::from_array(DEFAULT_POINTER_UV));
        Self {
            resolution_time: [
                backing.width.max(1) as f32,
                backing.height.max(1) as f32,
                elapsed as f32,
                pixel_size,
            ],
            color: color.to_array(),
            pointer_pattern: [
                pointer.x,
                pointer.y,
                params
                    .finite_or("patternScale", PIXEL_BLAST_PATTERN_SCALE)
                    .max(0.01),
                params
                    .finite_or("patternDensity", PIXEL_BLAST_PATTERN_DENSITY)
                    .clamp(0.0, PATTERN_DENSITY_MAX),
            ],
            motion: [
                params
                    .finite_or(SPEED_PARAM, PIXEL_BLAST_SPEED)
                    .clamp(0.0, SPEED_MAX),
                params
                    .finite_or("edgeFade", PIXEL_BLAST_EDGE_FADE)
                    .clamp(0.0, 1.0),
                params
                    .finite_or("rippleIntensity", PIXEL_BLAST_RIPPLE_INTENSITY)
                    .max(0.0),
                params.finite_or("seed", 0.0),
            ],
            clear: background.clear_color().to_array(),
        }
    }

    pub fn time(&self) -> f32 {
        self.resolution_time[2]
    }

    pub fn pixel_size(&self) -> f32 {
        self.resolution_time[3]
    }
}
