//! Headless core for animated background surfaces.
//!
//! Nothing here touches a browser: the drawing context and frame scheduling
//! sit behind [`SurfaceBackend`] and [`FrameScheduler`], so the whole
//! mount/run/dispose lifecycle can be driven from tests or any host.

pub mod backdrop;
pub mod config;
pub mod constants;
pub mod debounce;
pub mod effects;
pub mod error;
pub mod guard;
pub mod params;
pub mod pointer;
pub mod render_loop;
pub mod surface;
pub mod uniforms;
pub mod visibility;

pub use backdrop::{mount_or_disable, Backdrop, Mount};
pub use config::BackdropOptions;
pub use debounce::ResizeDebouncer;
pub use effects::{EffectKind, GridField};
pub use error::{BackdropError, Result};
pub use guard::{DisposalGuard, ReleaseId};
pub use params::{parse_color, ParamInput, ParamKind, ParamSnapshot, ParamValue, ParameterStore, Rgba};
pub use pointer::{normalize_pointer, Rect};
pub use render_loop::{Frame, FrameFn, FrameScheduler, LoopHandle, LoopState, ManualScheduler, PendingFrame, RenderLoop};
pub use surface::{
    backing_size_for, effective_pixel_ratio, BackgroundMode, BackingSize, ContainerSize, ContextKind, Surface,
    SurfaceBackend, SurfaceInfo, SurfaceOptions,
};
pub use uniforms::EffectUniforms;
pub use visibility::{LoopTransition, VisibilityPolicy, VisibilitySignal, VisibilityState, VisibilityTracker};
