//! DOM wiring for one backdrop: pointer, hover, page visibility, viewport
//! intersection and container resize. Every listener, observer and timer is
//! registered on the backdrop's release list, so `dispose` removes all of
//! them; nothing is leaked with `Closure::forget`.

use crate::dom::{device_pixel_ratio, element_rect, js_err, page_visible, window_document};
use crate::{SharedBackdrop, WebBackdrop};
use glam::Vec2;
use instant::Instant;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

type WeakBackdrop = Weak<RefCell<WebBackdrop>>;

/// Run `f` against the backdrop if it is still alive and not already borrowed
/// (a frame in progress, or a release running inside `dispose`).
fn with_backdrop<R>(weak: &WeakBackdrop, f: impl FnOnce(&mut WebBackdrop) -> R) -> Option<R> {
    let rc = weak.upgrade()?;
    let mut bd = rc.try_borrow_mut().ok()?;
    Some(f(&mut bd))
}

/// Add an event listener and return its release.
fn listen(
    target: &web::EventTarget,
    event: &'static str,
    handler: impl FnMut(web::Event) + 'static,
) -> anyhow::Result<impl FnOnce() -> anyhow::Result<()>> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web::Event)>);
    target
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .map_err(js_err)?;
    let target = target.clone();
    Ok(move || {
        let removed = target
            .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .map_err(js_err);
        drop(closure);
        removed
    })
}

pub fn wire(shared: &SharedBackdrop) -> anyhow::Result<()> {
    let weak = Rc::downgrade(shared);
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let container = shared.borrow().surface().backend().container().clone();

    wire_pointer(shared, &weak, &window, &container)?;
    wire_hover(shared, &weak, &container)?;
    wire_page_visibility(shared, &weak, &document)?;
    wire_intersection(shared, &weak, &container)?;
    wire_resize(shared, &weak, &container)?;
    log::debug!(
        "[reactors] wired {} resources",
        shared.borrow().release_list_len()
    );
    Ok(())
}

fn wire_pointer(
    shared: &SharedBackdrop,
    weak: &WeakBackdrop,
    window: &web::Window,
    container: &web::Element,
) -> anyhow::Result<()> {
    let w = weak.clone();
    let el = container.clone();
    let release = listen(window, "pointermove", move |ev: web::Event| {
        let Some(pe) = ev.dyn_ref::<web::PointerEvent>() else {
            return;
        };
        let client = Vec2::new(pe.client_x() as f32, pe.client_y() as f32);
        let rect = element_rect(&el);
        with_backdrop(&w, |bd| bd.pointer_moved(client, rect));
    })?;
    shared.borrow_mut().track("pointermove", release);
    Ok(())
}

fn wire_hover(
    shared: &SharedBackdrop,
    weak: &WeakBackdrop,
    container: &web::Element,
) -> anyhow::Result<()> {
    for (event, hovered) in [("pointerenter", true), ("pointerleave", false)] {
        let w = weak.clone();
        let release = listen(container, event, move |_| {
            with_backdrop(&w, |bd| bd.hover_changed(hovered));
        })?;
        shared.borrow_mut().track(event, release);
    }
    Ok(())
}

fn wire_page_visibility(
    shared: &SharedBackdrop,
    weak: &WeakBackdrop,
    document: &web::Document,
) -> anyhow::Result<()> {
    let w = weak.clone();
    let doc = document.clone();
    let release = listen(document, "visibilitychange", move |_| {
        let visible = page_visible(&doc);
        log::debug!("[reactors] page visible: {}", visible);
        with_backdrop(&w, |bd| bd.page_visibility_changed(visible));
    })?;
    let mut bd = shared.borrow_mut();
    bd.track("visibilitychange", release);
    // Mounting into a background tab starts paused.
    bd.page_visibility_changed(page_visible(document));
    Ok(())
}

fn wire_intersection(
    shared: &SharedBackdrop,
    weak: &WeakBackdrop,
    container: &web::Element,
) -> anyhow::Result<()> {
    let w = weak.clone();
    let callback = Closure::wrap(Box::new(move |entries: js_sys::Array, _: web::IntersectionObserver| {
        // Only the latest entry matters when several are batched.
        let Some(entry) = entries
            .iter()
            .last()
            .and_then(|e| e.dyn_into::<web::IntersectionObserverEntry>().ok())
        else {
            return;
        };
        let intersecting = entry.is_intersecting();
        with_backdrop(&w, |bd| bd.intersection_changed(intersecting));
    }) as Box<dyn FnMut(js_sys::Array, web::IntersectionObserver)>);
    let observer = web::IntersectionObserver::new(callback.as_ref().unchecked_ref()).map_err(js_err)?;
    observer.observe(container);
    shared.borrow_mut().track("intersection-observer", move || {
        observer.disconnect();
        drop(callback);
        Ok(())
    });
    Ok(())
}

/// Trailing-edge timer that applies the debounced resize.
struct ResizeTimer {
    id: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl ResizeTimer {
    fn arm(&self, deadline: Instant) {
        let Some(window) = web::window() else {
            return;
        };
        self.cancel();
        let now = Instant::now();
        let wait = if deadline > now {
            deadline - now
        } else {
            Duration::ZERO
        };
        let delay = wait.as_millis().min(i32::MAX as u128) as i32 + 1;
        if let Some(cb) = self.callback.borrow().as_ref() {
            match window.set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                delay,
            ) {
                Ok(id) => self.id.set(Some(id)),
                Err(e) => log::warn!("[reactors] resize timer failed: {:?}", e),
            }
        }
    }

    fn cancel(&self) {
        if let (Some(id), Some(window)) = (self.id.take(), web::window()) {
            window.clear_timeout_with_handle(id);
        }
    }
}

fn wire_resize(
    shared: &SharedBackdrop,
    weak: &WeakBackdrop,
    container: &web::Element,
) -> anyhow::Result<()> {
    let timer = Rc::new(ResizeTimer {
        id: Cell::new(None),
        callback: RefCell::new(None),
    });

    let w = weak.clone();
    let t = Rc::downgrade(&timer);
    *timer.callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        let Some(timer) = t.upgrade() else {
            return;
        };
        timer.id.set(None);
        let pending = with_backdrop(&w, |bd| {
            if bd.poll_resize(Instant::now()) {
                None
            } else {
                bd.resize_deadline()
            }
        });
        // Fired a little early; try again at the real deadline.
        if let Some(Some(deadline)) = pending {
            timer.arm(deadline);
        }
    }) as Box<dyn FnMut()>));

    let w = weak.clone();
    let t = timer.clone();
    let callback = Closure::wrap(Box::new(move |entries: js_sys::Array, _: web::ResizeObserver| {
        let Some(entry) = entries
            .iter()
            .last()
            .and_then(|e| e.dyn_into::<web::ResizeObserverEntry>().ok())
        else {
            return;
        };
        let rect = entry.content_rect();
        let size = backdrop_core::ContainerSize::new(rect.width(), rect.height());
        let deadline = with_backdrop(&w, |bd| {
            bd.request_resize(size, device_pixel_ratio(), Instant::now());
            bd.resize_deadline()
        });
        if let Some(Some(deadline)) = deadline {
            t.arm(deadline);
        }
    }) as Box<dyn FnMut(js_sys::Array, web::ResizeObserver)>);
    let observer = web::ResizeObserver::new(callback.as_ref().unchecked_ref()).map_err(js_err)?;
    observer.observe(container);

    let mut bd = shared.borrow_mut();
    bd.track("resize-observer", move || {
        observer.disconnect();
        drop(callback);
        Ok(())
    });
    bd.track("resize-timer", move || {
        timer.cancel();
        timer.callback.borrow_mut().take();
        Ok(())
    });
    Ok(())
}
