//! One mounted background instance: surface, parameters, loop, reactors and
//! the release list, all owned together so instances never share state.

use crate::config::BackdropOptions;
use crate::constants::POINTER_PARAM;
use crate::debounce::ResizeDebouncer;
use crate::effects::EffectKind;
use crate::error::{BackdropError, Result};
use crate::guard::{DisposalGuard, ReleaseId};
use crate::params::{ParamInput, ParamSnapshot, ParamValue, ParameterStore};
use crate::pointer::{normalize_pointer, Rect};
use crate::render_loop::{Frame, FrameScheduler, LoopHandle, LoopState, RenderLoop};
use crate::surface::{ContainerSize, Surface, SurfaceBackend};
use crate::visibility::{LoopTransition, VisibilitySignal, VisibilityState, VisibilityTracker};
use glam::Vec2;
use instant::Instant;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::borrow::Cow;

pub struct Backdrop<B: SurfaceBackend, S: FrameScheduler> {
    surface: Surface<B>,
    params: ParameterStore,
    render_loop: RenderLoop<S>,
    visibility: VisibilityTracker,
    resize: ResizeDebouncer<(ContainerSize, f64)>,
    guard: DisposalGuard,
    effect: EffectKind,
    fixed_size: Option<ContainerSize>,
    dpr: f64,
    host_paused: bool,
    disposed: bool,
}

impl<B: SurfaceBackend, S: FrameScheduler> Backdrop<B, S> {
    /// Acquire the surface and set up parameters. Fails only with
    /// `ContextUnavailable`; invalid parameter overrides are logged and the
    /// defaults kept.
    pub fn mount(
        backend: B,
        scheduler: S,
        container: ContainerSize,
        dpr: f64,
        options: &BackdropOptions,
    ) -> Result<Self> {
        let container = options.size.unwrap_or(container);
        let surface = Surface::create(backend, container, dpr, options.surface_options())?;

        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut params = ParameterStore::new(options.effect.parameters(&mut rng));
        for (name, input) in &options.params {
            if let Err(e) = params.apply(name, input) {
                log::warn!("[backdrop] ignoring option `{}`: {}", name, e);
            }
        }

        let mut render_loop = RenderLoop::new(scheduler);
        render_loop.set_max_fps(options.max_fps);

        log::info!(
            "[backdrop] mounted {} on {} surface",
            options.effect.id(),
            surface.context_kind()
        );
        Ok(Self {
            surface,
            params,
            render_loop,
            visibility: VisibilityTracker::new(options.visibility_policy()),
            resize: ResizeDebouncer::new(options.resize_window()),
            guard: DisposalGuard::new(),
            effect: options.effect,
            fixed_size: options.size,
            dpr,
            host_paused: false,
            disposed: false,
        })
    }

    pub fn start<F>(&mut self, frame_fn: F)
    where
        F: FnMut(&Frame<'_>) -> anyhow::Result<()> + 'static,
    {
        if self.disposed {
            return;
        }
        self.host_paused = false;
        self.render_loop.start(Box::new(frame_fn));
        if !self.visibility.should_run() {
            self.render_loop.pause();
        }
    }

    pub fn pause(&mut self) {
        if self.disposed {
            return;
        }
        self.host_paused = true;
        self.render_loop.pause();
    }

    /// Resumes unless a visibility signal still holds the loop paused; the
    /// loop then resumes as soon as that signal clears.
    pub fn resume(&mut self) {
        if self.disposed {
            return;
        }
        self.host_paused = false;
        if self.visibility.should_run() {
            self.render_loop.resume();
        }
    }

    pub fn stop(&mut self) {
        self.render_loop.stop();
    }

    /// Stop the loop, release every tracked resource newest first, then the
    /// surface itself (the first acquisition). Failures are logged and
    /// returned; a second call returns nothing.
    pub fn dispose(&mut self) -> Vec<BackdropError> {
        if self.disposed {
            return Vec::new();
        }
        self.disposed = true;
        self.render_loop.stop();
        self.resize.clear();
        let mut failures = self.guard.dispose();
        if let Err(e) = self.surface.destroy() {
            log::warn!("[backdrop] surface release failed: {:#}", e);
            failures.push(BackdropError::Disposal {
                label: "surface".to_string(),
                reason: format!("{:#}", e),
            });
        }
        log::info!(
            "[backdrop] disposed {} ({} release failures)",
            self.effect.id(),
            failures.len()
        );
        failures
    }

    // ---------------- Parameters ----------------

    /// Writes after `dispose` are dropped.
    pub fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.params.set_parameter(name, value)
    }

    pub fn set_parameter_str(&mut self, name: &str, text: &str) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.params.set_parameter_str(name, text)
    }

    pub fn apply_parameter(&mut self, name: &str, input: &ParamInput) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.params.apply(name, input)
    }

    pub fn snapshot(&self) -> ParamSnapshot {
        self.params.snapshot()
    }

    // ---------------- Reactors ----------------

    /// Returns whether the pointer parameter was written. Points outside the
    /// surface keep the previous value.
    pub fn pointer_moved(&mut self, client: Vec2, rect: Rect) -> bool {
        if self.disposed || !self.params.is_declared(POINTER_PARAM) {
            return false;
        }
        match normalize_pointer(client, &rect) {
            Some(uv) => self
                .params
                .set_parameter(POINTER_PARAM, ParamValue::Vec2(uv))
                .is_ok(),
            None => false,
        }
    }

    pub fn page_visibility_changed(&mut self, visible: bool) {
        self.signal(if visible {
            VisibilitySignal::PageShown
        } else {
            VisibilitySignal::PageHidden
        });
    }

    pub fn intersection_changed(&mut self, intersecting: bool) {
        self.signal(if intersecting {
            VisibilitySignal::EnteredViewport
        } else {
            VisibilitySignal::LeftViewport
        });
    }

    pub fn hover_changed(&mut self, hovered: bool) {
        self.signal(if hovered {
            VisibilitySignal::PointerEntered
        } else {
            VisibilitySignal::PointerLeft
        });
    }

    pub fn signal(&mut self, signal: VisibilitySignal) {
        if self.disposed {
            return;
        }
        match self.visibility.apply(signal) {
            Some(LoopTransition::Pause) => self.render_loop.pause(),
            Some(LoopTransition::Resume) if !self.host_paused => self.render_loop.resume(),
            _ => {}
        }
    }

    /// Queue a resize; it is applied by `poll_resize` once the debounce window
    /// has passed without another request.
    pub fn request_resize(&mut self, container: ContainerSize, dpr: f64, now: Instant) {
        if self.disposed {
            return;
        }
        let container = self.fixed_size.unwrap_or(container);
        self.resize.request((container, dpr), now);
    }

    pub fn poll_resize(&mut self, now: Instant) -> bool {
        if self.disposed {
            return false;
        }
        match self.resize.poll(now) {
            Some((container, dpr)) => self.resize_now(container, dpr),
            None => false,
        }
    }

    pub fn resize_deadline(&self) -> Option<Instant> {
        self.resize.deadline()
    }

    pub fn resize_now(&mut self, container: ContainerSize, dpr: f64) -> bool {
        if self.disposed {
            return false;
        }
        self.dpr = dpr;
        let container = self.fixed_size.unwrap_or(container);
        self.surface.resize(container, dpr)
    }

    // ---------------- Frames ----------------

    /// Deliver a scheduled frame. The parameter snapshot is taken here, before
    /// the callback runs.
    pub fn on_frame(&mut self, handle: LoopHandle, timestamp_ms: f64) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        let snapshot = self.params.snapshot();
        self.render_loop
            .on_frame(handle, timestamp_ms, &snapshot, self.surface.info())
    }

    // ---------------- Resources ----------------

    /// Register a host resource (listener, observer, timer) for release on
    /// `dispose`.
    pub fn track(
        &mut self,
        label: impl Into<Cow<'static, str>>,
        release: impl FnOnce() -> anyhow::Result<()> + 'static,
    ) -> ReleaseId {
        self.guard.register(label, release)
    }

    pub fn release(&mut self, id: ReleaseId) -> Result<()> {
        self.guard.release(id)
    }

    pub fn release_list_len(&self) -> usize {
        self.guard.len()
    }

    // ---------------- Accessors ----------------

    pub fn loop_state(&self) -> LoopState {
        self.render_loop.state()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.render_loop.frames_drawn()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn effect(&self) -> EffectKind {
        self.effect
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.dpr
    }

    pub fn visibility(&self) -> VisibilityState {
        self.visibility.state()
    }

    pub fn surface(&self) -> &Surface<B> {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface<B> {
        &mut self.surface
    }

    pub fn scheduler(&self) -> &S {
        self.render_loop.scheduler()
    }
}

impl<B: SurfaceBackend, S: FrameScheduler> Drop for Backdrop<B, S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Outcome of mounting when the host wants a flag instead of an error.
pub enum Mount<B: SurfaceBackend, S: FrameScheduler> {
    Active(Backdrop<B, S>),
    /// No drawing context; render a static background instead.
    Disabled(BackdropError),
}

impl<B: SurfaceBackend, S: FrameScheduler> Mount<B, S> {
    pub fn effect_enabled(&self) -> bool {
        matches!(self, Mount::Active(_))
    }

    pub fn into_active(self) -> Option<Backdrop<B, S>> {
        match self {
            Mount::Active(b) => Some(b),
            Mount::Disabled(_) => None,
        }
    }
}

pub fn mount_or_disable<B: SurfaceBackend, S: FrameScheduler>(
    backend: B,
    scheduler: S,
    container: ContainerSize,
    dpr: f64,
    options: &BackdropOptions,
) -> Mount<B, S> {
    match Backdrop::mount(backend, scheduler, container, dpr, options) {
        Ok(b) => Mount::Active(b),
        Err(e) => {
            log::warn!("[backdrop] effect disabled: {}", e);
            Mount::Disabled(e)
        }
    }
}
