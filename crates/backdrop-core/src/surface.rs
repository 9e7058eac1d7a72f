use crate::constants::{DEFAULT_MAX_DEVICE_PIXEL_RATIO, MIN_BACKING_PX};
use crate::error::{BackdropError, Result};
use crate::params::Rgba;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContextKind {
    Canvas2d,
    Gpu,
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextKind::Canvas2d => f.write_str("2d canvas"),
            ContextKind::Gpu => f.write_str("gpu"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BackgroundMode {
    Opaque(Rgba),
    Transparent,
}

impl BackgroundMode {
    pub fn clear_color(&self) -> Rgba {
        match self {
            BackgroundMode::Opaque(c) => c.with_alpha(1.0),
            BackgroundMode::Transparent => Rgba::TRANSPARENT,
        }
    }

    pub fn is_transparent(&self) -> bool {
        matches!(self, BackgroundMode::Transparent)
    }
}

/// Container size in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Backing store size in device pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BackingSize {
    pub width: u32,
    pub height: u32,
}

impl BackingSize {
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Geometry handed to each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceInfo {
    pub backing: BackingSize,
    pub background: BackgroundMode,
    /// Effective device pixel ratio after the cap.
    pub pixel_ratio: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceOptions {
    pub context: ContextKind,
    pub background: BackgroundMode,
    pub max_device_pixel_ratio: f64,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            context: ContextKind::Canvas2d,
            background: BackgroundMode::Opaque(Rgba::BLACK),
            max_device_pixel_ratio: DEFAULT_MAX_DEVICE_PIXEL_RATIO,
        }
    }
}

/// Platform side of a surface: owns the element and its drawing context.
pub trait SurfaceBackend {
    /// Create the element and acquire `kind`. An `Err` means the platform
    /// cannot provide that context at all.
    fn acquire(&mut self, kind: ContextKind, background: BackgroundMode) -> anyhow::Result<()>;

    /// Reallocate the backing store.
    fn allocate(&mut self, size: BackingSize);

    /// Drop the context and detach the element.
    fn release(&mut self) -> anyhow::Result<()>;
}

/// Device pixel ratio actually applied: invalid values become 1.0, then the
/// cap is applied.
pub fn effective_pixel_ratio(dpr: f64, max_dpr: f64) -> f64 {
    let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
    let max_dpr = if max_dpr.is_finite() && max_dpr > 0.0 {
        max_dpr
    } else {
        DEFAULT_MAX_DEVICE_PIXEL_RATIO
    };
    dpr.min(max_dpr)
}

/// Backing size for a container at a given device pixel ratio.
pub fn backing_size_for(container: ContainerSize, dpr: f64, max_dpr: f64) -> BackingSize {
    let scale = effective_pixel_ratio(dpr, max_dpr);
    let px = |css: f64| {
        let css = if css.is_finite() { css.max(0.0) } else { 0.0 };
        ((css * scale).round() as u32).max(MIN_BACKING_PX)
    };
    BackingSize {
        width: px(container.width),
        height: px(container.height),
    }
}

pub struct Surface<B: SurfaceBackend> {
    backend: B,
    options: SurfaceOptions,
    container: ContainerSize,
    backing: BackingSize,
    pixel_ratio: f64,
    destroyed: bool,
}

impl<B: SurfaceBackend> Surface<B> {
    pub fn create(
        mut backend: B,
        container: ContainerSize,
        dpr: f64,
        options: SurfaceOptions,
    ) -> Result<Self> {
        backend
            .acquire(options.context, options.background)
            .map_err(|e| BackdropError::ContextUnavailable {
                kind: options.context,
                reason: format!("{:#}", e),
            })?;
        let backing = backing_size_for(container, dpr, options.max_device_pixel_ratio);
        backend.allocate(backing);
        log::debug!(
            "[surface] created {} {}x{} (css {:.0}x{:.0})",
            options.context,
            backing.width,
            backing.height,
            container.width,
            container.height
        );
        Ok(Self {
            backend,
            options,
            container,
            backing,
            pixel_ratio: effective_pixel_ratio(dpr, options.max_device_pixel_ratio),
            destroyed: false,
        })
    }

    /// Recompute the backing store. Returns `true` only if it was reallocated;
    /// unchanged inputs leave the backend untouched.
    pub fn resize(&mut self, container: ContainerSize, dpr: f64) -> bool {
        if self.destroyed {
            return false;
        }
        self.container = container;
        self.pixel_ratio = effective_pixel_ratio(dpr, self.options.max_device_pixel_ratio);
        let next = backing_size_for(container, dpr, self.options.max_device_pixel_ratio);
        if next == self.backing {
            return false;
        }
        self.backing = next;
        self.backend.allocate(next);
        log::debug!("[surface] resized to {}x{}", next.width, next.height);
        true
    }

    /// Safe to call more than once; later calls do nothing.
    pub fn destroy(&mut self) -> anyhow::Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.destroyed = true;
        self.backend.release()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn backing(&self) -> BackingSize {
        self.backing
    }

    pub fn info(&self) -> SurfaceInfo {
        SurfaceInfo {
            backing: self.backing,
            background: self.options.background,
            pixel_ratio: self.pixel_ratio as f32,
        }
    }

    pub fn container(&self) -> ContainerSize {
        self.container
    }

    pub fn context_kind(&self) -> ContextKind {
        self.options.context
    }

    pub fn background(&self) -> BackgroundMode {
        self.options.background
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
