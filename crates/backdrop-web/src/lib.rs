//! Browser front-end: mounts a backdrop into a container element and drives
//! it from `requestAnimationFrame` and DOM observers. Everything except the
//! start bookkeeping is `wasm32` only.

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
mod start_gate;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod handle;
#[cfg(target_arch = "wasm32")]
mod options;
#[cfg(target_arch = "wasm32")]
mod reactors;
#[cfg(target_arch = "wasm32")]
mod render;
#[cfg(target_arch = "wasm32")]
mod scheduler;
#[cfg(target_arch = "wasm32")]
mod surface;

#[cfg(target_arch = "wasm32")]
pub use handle::{BackdropHandle, SharedBackdrop, WebBackdrop};
