use backdrop_core::{ContainerSize, Rect};
use wasm_bindgen::JsValue;
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

#[inline]
pub fn device_pixel_ratio() -> f64 {
    web::window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0)
}

/// Current CSS size of `el`.
pub fn element_size(el: &web::Element) -> ContainerSize {
    let rect = el.get_bounding_client_rect();
    ContainerSize::new(rect.width(), rect.height())
}

pub fn element_rect(el: &web::Element) -> Rect {
    let r = el.get_bounding_client_rect();
    Rect::new(
        r.left() as f32,
        r.top() as f32,
        r.width() as f32,
        r.height() as f32,
    )
}

pub fn page_visible(document: &web::Document) -> bool {
    document.visibility_state() != web::VisibilityState::Hidden
}

/// `JsValue` errors carry no `std::error::Error`; stringify them for anyhow.
pub fn js_err(e: JsValue) -> anyhow::Error {
    anyhow::anyhow!("{:?}", e)
}
