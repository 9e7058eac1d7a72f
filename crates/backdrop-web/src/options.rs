//! Reads a plain JS options object into [`BackdropOptions`]. Anything missing
//! or malformed keeps its default and is logged.

use backdrop_core::{parse_color, BackdropOptions, ContainerSize, EffectKind, ParamInput, ParamValue};
use glam::Vec2;
use js_sys::{Array, Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};

fn field(obj: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(obj, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn number(obj: &JsValue, key: &str) -> Option<f64> {
    let v = field(obj, key)?;
    match v.as_f64() {
        Some(n) if n.is_finite() => Some(n),
        _ => {
            log::warn!("[options] `{}` is not a finite number; using default", key);
            None
        }
    }
}

fn flag(obj: &JsValue, key: &str) -> Option<bool> {
    let v = field(obj, key)?;
    if v.as_bool().is_none() {
        log::warn!("[options] `{}` is not a boolean; using default", key);
    }
    v.as_bool()
}

fn text(obj: &JsValue, key: &str) -> Option<String> {
    let v = field(obj, key)?;
    if v.as_string().is_none() {
        log::warn!("[options] `{}` is not a string; using default", key);
    }
    v.as_string()
}

/// Map a JS value onto the closest parameter input. Strings stay text so the
/// store can coerce them against the declared kind.
pub fn param_input(value: &JsValue) -> Option<ParamInput> {
    if let Some(n) = value.as_f64() {
        return Some(ParamInput::Value(ParamValue::Number(n as f32)));
    }
    if let Some(b) = value.as_bool() {
        return Some(ParamInput::Value(ParamValue::Flag(b)));
    }
    if let Some(s) = value.as_string() {
        return Some(ParamInput::Text(s));
    }
    if Array::is_array(value) {
        let arr: &Array = value.unchecked_ref();
        if arr.length() == 2 {
            let x = arr.get(0).as_f64()?;
            let y = arr.get(1).as_f64()?;
            return Some(ParamInput::Value(ParamValue::Vec2(Vec2::new(x as f32, y as f32))));
        }
    }
    None
}

pub fn parse_options(js: &JsValue) -> BackdropOptions {
    let mut o = BackdropOptions::default();
    if js.is_undefined() || js.is_null() {
        return o;
    }
    if !js.is_object() {
        log::warn!("[options] expected an object; using defaults");
        return o;
    }

    if let Some(id) = text(js, "effect") {
        match EffectKind::from_id(&id) {
            Some(kind) => o.effect = kind,
            None => log::warn!("[options] unknown effect `{}`", id),
        }
    }
    if let (Some(w), Some(h)) = (number(js, "width"), number(js, "height")) {
        if w > 0.0 && h > 0.0 {
            o.size = Some(ContainerSize::new(w, h));
        }
    }
    if let Some(t) = flag(js, "transparent") {
        o.transparent = t;
    }
    if let Some(bg) = text(js, "background") {
        match parse_color(&bg) {
            Ok(c) => o.background = c,
            Err(e) => log::warn!("[options] {}", e),
        }
    }
    if let Some(v) = flag(js, "pauseOnHidden") {
        o.pause_on_hidden = v;
    }
    if let Some(v) = flag(js, "pauseOnOffscreen") {
        o.pause_on_offscreen = v;
    }
    if let Some(v) = flag(js, "pauseOnHover") {
        o.pause_on_hover = v;
    }
    if let Some(ms) = number(js, "resizeDebounceMs") {
        o.resize_debounce_ms = ms.max(0.0) as u64;
    }
    if let Some(dpr) = number(js, "maxDevicePixelRatio") {
        if dpr > 0.0 {
            o.max_device_pixel_ratio = dpr;
        }
    }
    o.max_fps = number(js, "maxFps").filter(|f| *f > 0.0);
    o.seed = number(js, "seed").map(|s| s.max(0.0) as u64);

    if let Some(params) = field(js, "params") {
        if let Some(obj) = params.dyn_ref::<Object>() {
            for key in Object::keys(obj).iter() {
                let Some(name) = key.as_string() else { continue };
                let Some(value) = field(&params, &name) else { continue };
                match param_input(&value) {
                    Some(input) => o.params.push((name, input)),
                    None => log::warn!("[options] unsupported value for `{}`", name),
                }
            }
        }
    }
    o
}
