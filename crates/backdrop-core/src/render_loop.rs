//! Frame scheduling state machine.
//!
//! `Stopped -> Running` on `start`, `Running <-> Paused` on `pause`/`resume`,
//! anything `-> Stopped` on `stop` or on a failing frame callback. At most one
//! scheduled frame exists at a time; a frame delivered with any other handle
//! is dropped, which is what keeps already-queued callbacks from running after
//! `stop`.

use crate::error::{BackdropError, Result};
use crate::params::ParamSnapshot;
use crate::surface::{BackgroundMode, BackingSize, SurfaceInfo};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
    Paused,
}

/// Opaque id of a scheduled frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoopHandle(pub u64);

pub trait FrameScheduler {
    fn request_frame(&mut self) -> LoopHandle;
    fn cancel_frame(&mut self, handle: LoopHandle);
}

/// What the frame callback sees. Times are in seconds.
#[derive(Clone, Debug)]
pub struct Frame<'a> {
    pub elapsed: f64,
    pub delta: f64,
    pub index: u64,
    pub params: &'a ParamSnapshot,
    pub backing: BackingSize,
    pub background: BackgroundMode,
    pub pixel_ratio: f32,
}

pub type FrameFn = Box<dyn FnMut(&Frame<'_>) -> anyhow::Result<()>>;

/// Elapsed time across one running span; time spent paused is not counted.
#[derive(Clone, Copy, Debug, Default)]
struct FrameClock {
    last_ms: Option<f64>,
    elapsed: f64,
}

impl FrameClock {
    fn advance(&mut self, timestamp_ms: f64) -> (f64, f64) {
        let delta = match self.last_ms {
            Some(last) if timestamp_ms.is_finite() => ((timestamp_ms - last).max(0.0)) / 1000.0,
            _ => 0.0,
        };
        if timestamp_ms.is_finite() {
            self.last_ms = Some(timestamp_ms);
        }
        self.elapsed += delta;
        (self.elapsed, delta)
    }

    fn suspend(&mut self) {
        self.last_ms = None;
    }
}

pub struct RenderLoop<S: FrameScheduler> {
    scheduler: S,
    state: LoopState,
    handle: Option<LoopHandle>,
    frame_fn: Option<FrameFn>,
    clock: FrameClock,
    frame_index: u64,
    min_interval_ms: Option<f64>,
    last_drawn_ms: Option<f64>,
}

impl<S: FrameScheduler> RenderLoop<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            state: LoopState::Stopped,
            handle: None,
            frame_fn: None,
            clock: FrameClock::default(),
            frame_index: 0,
            min_interval_ms: None,
            last_drawn_ms: None,
        }
    }

    /// Skip frames that arrive sooner than `1 / max_fps` after the last drawn
    /// one. `None` or a non-positive value draws every refresh.
    pub fn set_max_fps(&mut self, max_fps: Option<f64>) {
        self.min_interval_ms = max_fps
            .filter(|f| f.is_finite() && *f > 0.0)
            .map(|f| 1000.0 / f);
    }

    /// Elapsed time starts at zero only when coming from `Stopped`; starting
    /// a live loop swaps the frame fn and keeps the clock.
    pub fn start(&mut self, frame_fn: FrameFn) {
        self.cancel_pending();
        self.frame_fn = Some(frame_fn);
        if self.state == LoopState::Stopped {
            self.clock = FrameClock::default();
            self.frame_index = 0;
            self.last_drawn_ms = None;
            log::debug!("[loop] started");
        }
        self.state = LoopState::Running;
        self.schedule();
    }

    pub fn pause(&mut self) {
        if self.state != LoopState::Running {
            return;
        }
        self.cancel_pending();
        self.clock.suspend();
        self.last_drawn_ms = None;
        self.state = LoopState::Paused;
        log::debug!("[loop] paused at frame {}", self.frame_index);
    }

    pub fn resume(&mut self) {
        if self.state != LoopState::Paused {
            return;
        }
        self.state = LoopState::Running;
        self.schedule();
        log::debug!("[loop] resumed");
    }

    /// Never fails; fine to call before `start` or twice.
    pub fn stop(&mut self) {
        self.cancel_pending();
        self.frame_fn = None;
        if self.state != LoopState::Stopped {
            log::debug!("[loop] stopped after {} frames", self.frame_index);
        }
        self.state = LoopState::Stopped;
    }

    /// Platform callback for a scheduled frame.
    pub fn on_frame(
        &mut self,
        handle: LoopHandle,
        timestamp_ms: f64,
        params: &ParamSnapshot,
        surface: SurfaceInfo,
    ) -> Result<()> {
        if self.state != LoopState::Running || self.handle != Some(handle) {
            log::trace!("[loop] dropping stale frame {:?}", handle);
            return Ok(());
        }
        self.handle = None;

        if let (Some(min), Some(last)) = (self.min_interval_ms, self.last_drawn_ms) {
            if timestamp_ms - last < min {
                self.schedule();
                return Ok(());
            }
        }

        let (elapsed, delta) = self.clock.advance(timestamp_ms);
        let frame = Frame {
            elapsed,
            delta,
            index: self.frame_index,
            params,
            backing: surface.backing,
            background: surface.background,
            pixel_ratio: surface.pixel_ratio,
        };
        let outcome = match self.frame_fn.as_mut() {
            Some(f) => f(&frame),
            None => Ok(()),
        };
        match outcome {
            Ok(()) => {
                self.frame_index += 1;
                self.last_drawn_ms = Some(timestamp_ms);
                self.schedule();
                Ok(())
            }
            Err(source) => {
                let frame_index = self.frame_index;
                log::error!("[loop] frame {} failed: {:#}", frame_index, source);
                self.frame_fn = None;
                self.state = LoopState::Stopped;
                Err(BackdropError::FrameCallback {
                    frame_index,
                    source,
                })
            }
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn pending(&self) -> Option<LoopHandle> {
        self.handle
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frame_index
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    fn schedule(&mut self) {
        self.cancel_pending();
        self.handle = Some(self.scheduler.request_frame());
    }

    fn cancel_pending(&mut self) {
        if let Some(h) = self.handle.take() {
            self.scheduler.cancel_frame(h);
        }
    }
}

/// Handle bookkeeping for platform schedulers whose own ids change on every
/// request (`requestAnimationFrame`, timers). The loop keeps seeing one stable
/// [`LoopHandle`] even when a delivery has to be re-armed under a new
/// platform id.
#[derive(Debug, Default)]
pub struct PendingFrame {
    next_id: u64,
    current: Option<(LoopHandle, i64)>,
}

impl PendingFrame {
    pub fn issue(&mut self, platform_id: i64) -> LoopHandle {
        self.next_id += 1;
        let handle = LoopHandle(self.next_id);
        self.current = Some((handle, platform_id));
        handle
    }

    /// Platform id to cancel, if `handle` is still the outstanding one.
    pub fn cancel(&mut self, handle: LoopHandle) -> Option<i64> {
        match self.current {
            Some((h, id)) if h == handle => {
                self.current = None;
                Some(id)
            }
            _ => None,
        }
    }

    /// The platform callback fired; hand back the handle it belongs to.
    pub fn fire(&mut self) -> Option<LoopHandle> {
        self.current.take().map(|(h, _)| h)
    }

    /// Put an undelivered handle back under a fresh platform id. Ignored if
    /// another request has been issued since it fired.
    pub fn rearm(&mut self, handle: LoopHandle, platform_id: i64) -> bool {
        if self.current.is_some() {
            return false;
        }
        self.current = Some((handle, platform_id));
        true
    }

    pub fn current(&self) -> Option<LoopHandle> {
        self.current.map(|(h, _)| h)
    }
}

#[derive(Default)]
struct ManualQueue {
    next_id: u64,
    pending: Vec<LoopHandle>,
    requested: usize,
    cancelled: usize,
}

/// Scheduler driven by hand, for headless hosts and tests. Clones share one
/// queue, so a copy kept outside the loop can deliver frames.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<ManualQueue>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every currently scheduled handle.
    pub fn take_due(&self) -> Vec<LoopHandle> {
        std::mem::take(&mut self.queue.borrow_mut().pending)
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().pending.len()
    }

    pub fn requested(&self) -> usize {
        self.queue.borrow().requested
    }

    pub fn cancelled(&self) -> usize {
        self.queue.borrow().cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> LoopHandle {
        let mut q = self.queue.borrow_mut();
        q.next_id += 1;
        let h = LoopHandle(q.next_id);
        q.pending.push(h);
        q.requested += 1;
        h
    }

    fn cancel_frame(&mut self, handle: LoopHandle) {
        let mut q = self.queue.borrow_mut();
        q.pending.retain(|h| *h != handle);
        q.cancelled += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParamValue, ParameterStore};
    use std::cell::Cell;

    fn info() -> SurfaceInfo {
        SurfaceInfo {
            backing: BackingSize::default(),
            background: BackgroundMode::Transparent,
            pixel_ratio: 1.0,
        }
    }

    fn snapshot() -> ParamSnapshot {
        ParameterStore::new([("speed", ParamValue::Number(1.0))]).snapshot()
    }

    fn drive(l: &mut RenderLoop<ManualScheduler>, sched: &ManualScheduler, ts: f64) -> Result<()> {
        let snap = snapshot();
        for h in sched.take_due() {
            l.on_frame(h, ts, &snap, info())?;
        }
        Ok(())
    }

    fn counting() -> (Rc<Cell<u32>>, FrameFn) {
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let f: FrameFn = Box::new(move |_: &Frame<'_>| {
            c.set(c.get() + 1);
            Ok(())
        });
        (calls, f)
    }

    #[test]
    fn only_one_frame_is_ever_pending() {
        let sched = ManualScheduler::new();
        let mut l = RenderLoop::new(sched.clone());
        let (_, f) = counting();
        l.start(f);
        l.pause();
        l.resume();
        assert_eq!(sched.pending(), 1);
        let (_, f2) = counting();
        l.start(f2);
        assert_eq!(sched.pending(), 1);
    }

    #[test]
    fn stale_handle_after_stop_is_ignored() {
        let sched = ManualScheduler::new();
        let mut l = RenderLoop::new(sched.clone());
        let (calls, f) = counting();
        l.start(f);
        let queued = l.pending().unwrap();
        l.stop();
        let snap = snapshot();
        l.on_frame(queued, 16.0, &snap, info()).unwrap();
        assert_eq!(calls.get(), 0);
        assert_eq!(l.state(), LoopState::Stopped);
    }

    #[test]
    fn paused_time_is_not_counted() {
        let sched = ManualScheduler::new();
        let mut l = RenderLoop::new(sched.clone());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        l.start(Box::new(move |f: &Frame<'_>| {
            s.borrow_mut().push(f.elapsed);
            Ok(())
        }));
        drive(&mut l, &sched, 1000.0).unwrap();
        drive(&mut l, &sched, 1100.0).unwrap();
        l.pause();
        l.resume();
        drive(&mut l, &sched, 9000.0).unwrap();
        drive(&mut l, &sched, 9050.0).unwrap();
        let seen = seen.borrow();
        assert_eq!(seen.len(), 4);
        assert!((seen[1] - 0.1).abs() < 1e-9);
        assert!((seen[2] - 0.1).abs() < 1e-9);
        assert!((seen[3] - 0.15).abs() < 1e-9);
    }

    #[test]
    fn fresh_start_resets_elapsed() {
        let sched = ManualScheduler::new();
        let mut l = RenderLoop::new(sched.clone());
        let (_, f) = counting();
        l.start(f);
        drive(&mut l, &sched, 0.0).unwrap();
        drive(&mut l, &sched, 500.0).unwrap();
        l.stop();
        let first = Rc::new(Cell::new(-1.0));
        let fc = first.clone();
        l.start(Box::new(move |f: &Frame<'_>| {
            if fc.get() < 0.0 {
                fc.set(f.elapsed);
            }
            Ok(())
        }));
        drive(&mut l, &sched, 2000.0).unwrap();
        assert_eq!(first.get(), 0.0);
    }

    #[test]
    fn start_on_a_live_loop_keeps_the_clock() {
        let sched = ManualScheduler::new();
        let mut l = RenderLoop::new(sched.clone());
        let (_, f) = counting();
        l.start(f);
        drive(&mut l, &sched, 0.0).unwrap();
        drive(&mut l, &sched, 1000.0).unwrap();
        let seen = Rc::new(Cell::new(-1.0));
        let sc = seen.clone();
        l.start(Box::new(move |f: &Frame<'_>| {
            sc.set(f.elapsed);
            Ok(())
        }));
        assert_eq!(sched.pending(), 1);
        drive(&mut l, &sched, 1500.0).unwrap();
        assert!((seen.get() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn pending_frame_keeps_handle_across_rearm() {
        let mut p = PendingFrame::default();
        let h = p.issue(7);
        assert_eq!(p.fire(), Some(h));
        assert_eq!(p.fire(), None);
        assert!(p.rearm(h, 8));
        assert_eq!(p.current(), Some(h));
        assert_eq!(p.cancel(LoopHandle(h.0 + 1)), None);
        assert_eq!(p.cancel(h), Some(8));
        assert_eq!(p.current(), None);
    }

    #[test]
    fn rearm_loses_to_a_newer_request() {
        let mut p = PendingFrame::default();
        let old = p.issue(1);
        p.fire();
        let newer = p.issue(2);
        assert!(!p.rearm(old, 3));
        assert_eq!(p.current(), Some(newer));
    }

    /// Platform stand-in whose ids change on every request, like rAF.
    #[derive(Clone, Default)]
    struct RafLike {
        slot: Rc<RefCell<PendingFrame>>,
        next_platform_id: Rc<Cell<i64>>,
    }

    impl RafLike {
        fn platform_id(&self) -> i64 {
            self.next_platform_id.set(self.next_platform_id.get() + 1);
            self.next_platform_id.get()
        }
    }

    impl FrameScheduler for RafLike {
        fn request_frame(&mut self) -> LoopHandle {
            let id = self.platform_id();
            self.slot.borrow_mut().issue(id)
        }

        fn cancel_frame(&mut self, handle: LoopHandle) {
            self.slot.borrow_mut().cancel(handle);
        }
    }

    #[test]
    fn skipped_delivery_rearms_and_the_loop_keeps_drawing() {
        let raf = RafLike::default();
        let mut l = RenderLoop::new(raf.clone());
        let (calls, f) = counting();
        l.start(f);
        let snap = snapshot();

        // The callback fires while the owner is busy: nothing is delivered,
        // the same handle is re-armed under a new platform id.
        let h = raf.slot.borrow_mut().fire().unwrap();
        let id = raf.platform_id();
        assert!(raf.slot.borrow_mut().rearm(h, id));
        assert_eq!(calls.get(), 0);

        let h = raf.slot.borrow_mut().fire().unwrap();
        l.on_frame(h, 16.0, &snap, info()).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(l.state(), LoopState::Running);
        assert!(raf.slot.borrow().current().is_some());
    }

    #[test]
    fn max_fps_skips_early_frames() {
        let sched = ManualScheduler::new();
        let mut l = RenderLoop::new(sched.clone());
        l.set_max_fps(Some(30.0));
        let (calls, f) = counting();
        l.start(f);
        for i in 0..6 {
            drive(&mut l, &sched, i as f64 * 16.7).unwrap();
        }
        assert_eq!(calls.get(), 3);
        assert_eq!(sched.pending(), 1);
    }

    #[test]
    fn pause_and_resume_outside_their_states_do_nothing() {
        let sched = ManualScheduler::new();
        let mut l = RenderLoop::<ManualScheduler>::new(sched.clone());
        l.pause();
        l.resume();
        assert_eq!(l.state(), LoopState::Stopped);
        assert_eq!(sched.requested(), 0);
    }
}
