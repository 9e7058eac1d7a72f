//! Canvas element backend: one `<canvas>` appended to the host container.

use crate::dom::js_err;
use backdrop_core::{BackgroundMode, BackingSize, ContextKind, SurfaceBackend};
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

pub struct CanvasBackend {
    container: web::Element,
    canvas: Option<web::HtmlCanvasElement>,
    ctx2d: Option<web::CanvasRenderingContext2d>,
}

impl CanvasBackend {
    pub fn new(container: web::Element) -> Self {
        Self {
            container,
            canvas: None,
            ctx2d: None,
        }
    }

    pub fn canvas(&self) -> Option<&web::HtmlCanvasElement> {
        self.canvas.as_ref()
    }

    pub fn context_2d(&self) -> Option<&web::CanvasRenderingContext2d> {
        self.ctx2d.as_ref()
    }

    pub fn container(&self) -> &web::Element {
        &self.container
    }

    fn create_canvas(&self) -> anyhow::Result<web::HtmlCanvasElement> {
        let document = self
            .container
            .owner_document()
            .ok_or_else(|| anyhow::anyhow!("container has no document"))?;
        let canvas: web::HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(js_err)?
            .dyn_into::<web::HtmlCanvasElement>()
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let style = canvas.style();
        _ = style.set_property("position", "absolute");
        _ = style.set_property("inset", "0");
        _ = style.set_property("width", "100%");
        _ = style.set_property("height", "100%");
        _ = style.set_property("display", "block");
        _ = style.set_property("pointer-events", "none");
        _ = canvas.set_attribute("aria-hidden", "true");
        Ok(canvas)
    }
}

fn webgpu_available() -> bool {
    web::window()
        .map(|w| {
            let nav = w.navigator();
            js_sys::Reflect::get(&nav, &JsValue::from_str("gpu"))
                .map(|gpu| !gpu.is_undefined() && !gpu.is_null())
                .unwrap_or(false)
        })
        .unwrap_or(false)
}

impl SurfaceBackend for CanvasBackend {
    fn acquire(&mut self, kind: ContextKind, background: BackgroundMode) -> anyhow::Result<()> {
        let canvas = self.create_canvas()?;
        match kind {
            ContextKind::Canvas2d => {
                let opts = js_sys::Object::new();
                _ = js_sys::Reflect::set(
                    &opts,
                    &JsValue::from_str("alpha"),
                    &JsValue::from_bool(background.is_transparent()),
                );
                let ctx = canvas
                    .get_context_with_context_options("2d", &opts)
                    .map_err(js_err)?
                    .ok_or_else(|| anyhow::anyhow!("2d context not supported"))?
                    .dyn_into::<web::CanvasRenderingContext2d>()
                    .map_err(|e| anyhow::anyhow!("{:?}", e))?;
                self.ctx2d = Some(ctx);
            }
            ContextKind::Gpu => {
                // The wgpu surface is created later from this canvas; only the
                // capability is checked here.
                if !webgpu_available() {
                    anyhow::bail!("navigator.gpu missing");
                }
            }
        }
        self.container.append_child(&canvas).map_err(js_err)?;
        self.canvas = Some(canvas);
        Ok(())
    }

    fn allocate(&mut self, size: BackingSize) {
        if let Some(c) = &self.canvas {
            c.set_width(size.width);
            c.set_height(size.height);
        }
    }

    fn release(&mut self) -> anyhow::Result<()> {
        self.ctx2d = None;
        if let Some(canvas) = self.canvas.take() {
            canvas.remove();
        }
        Ok(())
    }
}
