//! `BackdropHandle`: the object the page holds for one mounted background.

use crate::render::{GridRenderer, PixelBlastRenderer};
use crate::scheduler::RafScheduler;
use crate::start_gate::{StartAction, StartGate};
use crate::surface::CanvasBackend;
use crate::{dom, options, reactors};
use backdrop_core::{
    mount_or_disable, Backdrop, BackdropError, ContextKind, EffectKind, Frame, Mount, ParamInput,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

pub type WebBackdrop = Backdrop<CanvasBackend, RafScheduler>;
pub type SharedBackdrop = Rc<RefCell<WebBackdrop>>;

type ErrorHandler = Rc<RefCell<Option<js_sys::Function>>>;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("backdrop-web loaded");
    Ok(())
}

fn to_js(e: BackdropError) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

/// Log a runtime error and hand it to the host's `onError` callback.
fn report(handler: &ErrorHandler, e: BackdropError) {
    let message = format!("{:#}", anyhow::Error::from(e));
    log::error!("[backdrop] {}", message);
    if let Some(f) = handler.borrow().as_ref() {
        if let Err(js) = f.call1(&JsValue::NULL, &js_sys::Error::new(&message)) {
            log::warn!("[backdrop] onError handler threw: {:?}", js);
        }
    }
}

/// One mounted background. Mounting never throws: when no drawing context is
/// available the handle reports `effectEnabled() == false` and every other
/// call is a no-op, so the host can show a static background instead.
#[wasm_bindgen]
pub struct BackdropHandle {
    inner: Option<SharedBackdrop>,
    enabled: Rc<Cell<bool>>,
    disabled_reason: Rc<RefCell<Option<String>>>,
    on_error: ErrorHandler,
    gpu: Rc<RefCell<Option<PixelBlastRenderer>>>,
    gate: Rc<RefCell<StartGate>>,
}

#[wasm_bindgen]
impl BackdropHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(container: web::Element, options: JsValue) -> BackdropHandle {
        let opts = options::parse_options(&options);
        let scheduler = RafScheduler::new();
        let sink = scheduler.sink_slot();
        let size = dom::element_size(&container);
        let backend = CanvasBackend::new(container);
        let on_error: ErrorHandler = Rc::new(RefCell::new(None));

        let mut handle = BackdropHandle {
            inner: None,
            enabled: Rc::new(Cell::new(false)),
            disabled_reason: Rc::new(RefCell::new(None)),
            on_error: on_error.clone(),
            gpu: Rc::new(RefCell::new(None)),
            gate: Rc::new(RefCell::new(StartGate::default())),
        };

        let bd = match mount_or_disable(backend, scheduler, size, dom::device_pixel_ratio(), &opts) {
            Mount::Active(bd) => bd,
            Mount::Disabled(e) => {
                *handle.disabled_reason.borrow_mut() = Some(e.to_string());
                return handle;
            }
        };
        let shared: SharedBackdrop = Rc::new(RefCell::new(bd));

        let weak = Rc::downgrade(&shared);
        *sink.borrow_mut() = Some(Box::new(move |frame, ts| {
            let Some(rc) = weak.upgrade() else {
                return true;
            };
            let result = match rc.try_borrow_mut() {
                Ok(mut bd) => bd.on_frame(frame, ts),
                // Borrowed by the host mid-call; the scheduler re-arms this
                // frame for the next refresh.
                Err(_) => return false,
            };
            if let Err(e) = result {
                report(&on_error, e);
            }
            true
        }));

        if let Err(e) = reactors::wire(&shared) {
            log::warn!("[backdrop] reactors incomplete: {:#}", e);
        }
        handle.enabled.set(true);
        handle.inner = Some(shared);
        handle
    }

    #[wasm_bindgen(js_name = effectEnabled)]
    pub fn effect_enabled(&self) -> bool {
        self.enabled.get()
    }

    #[wasm_bindgen(js_name = disabledReason)]
    pub fn disabled_reason(&self) -> Option<String> {
        self.disabled_reason.borrow().clone()
    }

    /// Register `callback(error)` for frame and renderer failures.
    #[wasm_bindgen(js_name = onError)]
    pub fn on_error(&self, callback: js_sys::Function) {
        *self.on_error.borrow_mut() = Some(callback);
    }

    pub fn start(&mut self) {
        let Some(shared) = self.inner.clone() else {
            return;
        };
        if shared.borrow().is_disposed() {
            return;
        }
        let effect = shared.borrow().effect();
        match effect {
            EffectKind::GridField => {
                let ctx = shared.borrow().surface().backend().context_2d().cloned();
                let Some(ctx) = ctx else {
                    log::error!("[backdrop] 2d context missing after mount");
                    return;
                };
                let renderer = GridRenderer::new(ctx);
                shared
                    .borrow_mut()
                    .start(move |f: &Frame<'_>| renderer.render(f));
            }
            EffectKind::PixelBlast => self.start_gpu(shared),
        }
    }

    pub fn pause(&self) {
        if let Some(shared) = &self.inner {
            shared.borrow_mut().pause();
        }
    }

    pub fn resume(&self) {
        if let Some(shared) = &self.inner {
            shared.borrow_mut().resume();
        }
    }

    pub fn stop(&self) {
        self.gate.borrow_mut().request_stop();
        if let Some(shared) = &self.inner {
            shared.borrow_mut().stop();
        }
    }

    /// Release everything. Returns the release failures as strings; calling
    /// again returns an empty array.
    pub fn dispose(&mut self) -> js_sys::Array {
        self.gate.borrow_mut().request_stop();
        let failures = js_sys::Array::new();
        if let Some(shared) = &self.inner {
            for e in shared.borrow_mut().dispose() {
                failures.push(&JsValue::from_str(&e.to_string()));
            }
        }
        self.gpu.borrow_mut().take();
        failures
    }

    /// Set a declared parameter. Numbers, booleans, `[x, y]` pairs and
    /// strings are accepted; a value of the wrong shape throws.
    #[wasm_bindgen(js_name = setParameter)]
    pub fn set_parameter(&self, name: &str, value: JsValue) -> Result<(), JsValue> {
        let Some(shared) = &self.inner else {
            return Ok(());
        };
        let input = options::param_input(&value)
            .unwrap_or_else(|| ParamInput::Text(value.as_string().unwrap_or_default()));
        shared
            .borrow_mut()
            .apply_parameter(name, &input)
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = loopState)]
    pub fn loop_state(&self) -> String {
        match &self.inner {
            Some(shared) => format!("{:?}", shared.borrow().loop_state()).to_lowercase(),
            None => "stopped".to_string(),
        }
    }
}

impl BackdropHandle {
    fn start_gpu(&self, shared: SharedBackdrop) {
        let action = self.gate.borrow_mut().request_start();
        match action {
            StartAction::Run => run_gpu(&shared, &self.gpu),
            StartAction::Wait => log::debug!("[backdrop] gpu init in flight"),
            StartAction::BeginInit => self.init_gpu(shared),
        }
    }

    fn init_gpu(&self, shared: SharedBackdrop) {
        let gpu = self.gpu.clone();
        let gate = self.gate.clone();
        let enabled = self.enabled.clone();
        let reason = self.disabled_reason.clone();
        let on_error = self.on_error.clone();
        spawn_local(async move {
            let (canvas, transparent) = {
                let bd = shared.borrow();
                (
                    bd.surface().backend().canvas().cloned(),
                    bd.surface().background().is_transparent(),
                )
            };
            let outcome = match canvas {
                Some(canvas) => PixelBlastRenderer::new(canvas, transparent).await,
                None => Err(anyhow::anyhow!("canvas detached before gpu init")),
            };
            match outcome {
                Ok(r) => {
                    *gpu.borrow_mut() = Some(r);
                    let run = gate.borrow_mut().init_finished(true);
                    if run && !shared.borrow().is_disposed() {
                        run_gpu(&shared, &gpu);
                    }
                }
                Err(e) => {
                    gate.borrow_mut().init_finished(false);
                    let e = BackdropError::ContextUnavailable {
                        kind: ContextKind::Gpu,
                        reason: format!("{:#}", e),
                    };
                    *reason.borrow_mut() = Some(e.to_string());
                    enabled.set(false);
                    report(&on_error, e);
                    shared.borrow_mut().dispose();
                }
            }
        });
    }
}

fn run_gpu(shared: &SharedBackdrop, gpu: &Rc<RefCell<Option<PixelBlastRenderer>>>) {
    let renderer = gpu.clone();
    shared.borrow_mut().start(move |f: &Frame<'_>| {
        match renderer.borrow_mut().as_mut() {
            Some(r) => r.render(f),
            None => Ok(()),
        }
    });
}
