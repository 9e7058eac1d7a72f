use backdrop_core::{FrameScheduler, LoopHandle, PendingFrame};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Receives `(handle, timestamp_ms)` when a requested frame fires. Returns
/// `false` if the frame could not be delivered; the scheduler then re-arms
/// the same handle for the next refresh.
pub type FrameSink = Box<dyn FnMut(LoopHandle, f64) -> bool>;

type TickSlot = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn request_raf(tick: &TickSlot) -> i64 {
    let Some(w) = web::window() else {
        return 0;
    };
    tick.borrow()
        .as_ref()
        .and_then(|cb| w.request_animation_frame(cb.as_ref().unchecked_ref()).ok())
        .unwrap_or(0) as i64
}

/// `requestAnimationFrame` scheduler. One persistent closure is handed to the
/// browser for every request; `PendingFrame` maps the browser's ids to the
/// loop's handle.
pub struct RafScheduler {
    tick: TickSlot,
    pending: Rc<RefCell<PendingFrame>>,
    sink: Rc<RefCell<Option<FrameSink>>>,
}

impl RafScheduler {
    pub fn new() -> Self {
        let tick: TickSlot = Rc::new(RefCell::new(None));
        let pending = Rc::new(RefCell::new(PendingFrame::default()));
        let sink: Rc<RefCell<Option<FrameSink>>> = Rc::new(RefCell::new(None));

        let tick_ref: Weak<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::downgrade(&tick);
        let pending_tick = pending.clone();
        let sink_tick = sink.clone();
        *tick.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
            let Some(handle) = pending_tick.borrow_mut().fire() else {
                return;
            };
            // Take the sink out while it runs so a reentrant request cannot
            // observe a borrowed slot.
            let taken = sink_tick.borrow_mut().take();
            let Some(mut deliver) = taken else {
                return;
            };
            let delivered = deliver(handle, ts);
            {
                let mut slot = sink_tick.borrow_mut();
                if slot.is_none() {
                    *slot = Some(deliver);
                }
            }
            if !delivered {
                if let Some(tick) = tick_ref.upgrade() {
                    let id = request_raf(&tick);
                    pending_tick.borrow_mut().rearm(handle, id);
                }
            }
        }) as Box<dyn FnMut(f64)>));

        Self {
            tick,
            pending,
            sink,
        }
    }

    /// Slot the frame sink is installed into once the owning backdrop exists.
    pub fn sink_slot(&self) -> Rc<RefCell<Option<FrameSink>>> {
        self.sink.clone()
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> LoopHandle {
        let id = request_raf(&self.tick);
        self.pending.borrow_mut().issue(id)
    }

    fn cancel_frame(&mut self, handle: LoopHandle) {
        let id = self.pending.borrow_mut().cancel(handle);
        if let (Some(id), Some(w)) = (id, web::window()) {
            _ = w.cancel_animation_frame(id as i32);
        }
    }
}

impl Drop for RafScheduler {
    fn drop(&mut self) {
        let outstanding = self.pending.borrow().current();
        if let Some(h) = outstanding {
            self.cancel_frame(h);
        }
        self.sink.borrow_mut().take();
        self.tick.borrow_mut().take();
    }
}
