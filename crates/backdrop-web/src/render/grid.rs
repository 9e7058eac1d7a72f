//! Canvas 2D renderer for the scrolling grid field.

use backdrop_core::pointer::uv_to_px;
use backdrop_core::constants::POINTER_PARAM;
use backdrop_core::{BackgroundMode, Frame, GridField};
use glam::Vec2;
use wasm_bindgen::JsValue;
use web_sys as web;

pub struct GridRenderer {
    ctx: web::CanvasRenderingContext2d,
}

impl GridRenderer {
    pub fn new(ctx: web::CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }

    #[allow(deprecated)]
    pub fn render(&self, frame: &Frame<'_>) -> anyhow::Result<()> {
        let ctx = &self.ctx;
        let w = frame.backing.width as f64;
        let h = frame.backing.height as f64;
        match frame.background {
            BackgroundMode::Transparent => ctx.clear_rect(0.0, 0.0, w, h),
            BackgroundMode::Opaque(c) => {
                ctx.set_fill_style(&JsValue::from_str(&c.with_alpha(1.0).to_css()));
                ctx.fill_rect(0.0, 0.0, w, h);
            }
        }

        let grid = GridField::from_snapshot(frame.params, frame.pixel_ratio);
        let offset = grid.offset_at(frame.elapsed);

        // Cells near the pointer first so the lines stay on top.
        if let Some(uv) = frame.params.vec2(POINTER_PARAM) {
            let pointer = uv_to_px(uv, frame.backing.width, frame.backing.height);
            self.highlight_cells(&grid, offset, pointer, w as f32, h as f32);
        }

        ctx.set_global_alpha(grid.color.a as f64);
        ctx.set_stroke_style(&JsValue::from_str(&grid.color.with_alpha(1.0).to_css()));
        ctx.set_line_width(grid.line_width as f64);
        ctx.begin_path();
        for x in grid.lines(w as f32, offset.x) {
            let x = x as f64 + 0.5;
            ctx.move_to(x, 0.0);
            ctx.line_to(x, h);
        }
        for y in grid.lines(h as f32, offset.y) {
            let y = y as f64 + 0.5;
            ctx.move_to(0.0, y);
            ctx.line_to(w, y);
        }
        ctx.stroke();
        ctx.set_global_alpha(1.0);
        Ok(())
    }

    #[allow(deprecated)]
    fn highlight_cells(&self, grid: &GridField, offset: Vec2, pointer: Vec2, w: f32, h: f32) {
        if grid.hover_radius <= 0.0 {
            return;
        }
        let ctx = &self.ctx;
        let step = grid.cell_size;
        ctx.set_fill_style(&JsValue::from_str(&grid.hover_color.with_alpha(1.0).to_css()));
        let xs: Vec<f32> = grid.lines(w, offset.x).collect();
        let ys: Vec<f32> = grid.lines(h, offset.y).collect();
        for &y in &ys {
            if (y + step * 0.5 - pointer.y).abs() > grid.hover_radius + step {
                continue;
            }
            for &x in &xs {
                let strength = grid.highlight(Vec2::new(x + step * 0.5, y + step * 0.5), pointer);
                if strength <= 0.0 {
                    continue;
                }
                ctx.set_global_alpha((strength * grid.hover_color.a) as f64);
                ctx.fill_rect(x as f64, y as f64, step as f64, step as f64);
            }
        }
        ctx.set_global_alpha(1.0);
    }
}
