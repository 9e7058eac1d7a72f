use crate::constants::*;
use crate::effects::EffectKind;
use crate::params::{parse_color, ParamInput, Rgba};
use crate::surface::{BackgroundMode, ContainerSize, ContextKind, SurfaceOptions};
use crate::visibility::VisibilityPolicy;
use std::time::Duration;

/// Host configuration for one backdrop instance.
#[derive(Clone, Debug, PartialEq)]
pub struct BackdropOptions {
    /// Also fixes the drawing context: each effect has exactly one renderer.
    pub effect: EffectKind,
    /// Fixed CSS size; `None` follows the container.
    pub size: Option<ContainerSize>,
    pub transparent: bool,
    pub background: Rgba,
    pub pause_on_hidden: bool,
    pub pause_on_offscreen: bool,
    pub pause_on_hover: bool,
    pub resize_debounce_ms: u64,
    pub max_device_pixel_ratio: f64,
    pub max_fps: Option<f64>,
    pub seed: Option<u64>,
    pub params: Vec<(String, ParamInput)>,
}

impl Default for BackdropOptions {
    fn default() -> Self {
        Self {
            effect: EffectKind::default(),
            size: None,
            transparent: false,
            background: parse_color(DEFAULT_BACKGROUND_HEX).unwrap_or(Rgba::BLACK),
            pause_on_hidden: true,
            pause_on_offscreen: true,
            pause_on_hover: false,
            resize_debounce_ms: DEFAULT_RESIZE_DEBOUNCE_MS,
            max_device_pixel_ratio: DEFAULT_MAX_DEVICE_PIXEL_RATIO,
            max_fps: None,
            seed: None,
            params: Vec::new(),
        }
    }
}

impl BackdropOptions {
    pub fn for_effect(effect: EffectKind) -> Self {
        Self {
            effect,
            ..Default::default()
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, input: impl Into<ParamInput>) -> Self {
        self.params.push((name.into(), input.into()));
        self
    }

    pub fn context_kind(&self) -> ContextKind {
        self.effect.context()
    }

    pub fn background_mode(&self) -> BackgroundMode {
        if self.transparent {
            BackgroundMode::Transparent
        } else {
            BackgroundMode::Opaque(self.background)
        }
    }

    pub fn surface_options(&self) -> SurfaceOptions {
        SurfaceOptions {
            context: self.context_kind(),
            background: self.background_mode(),
            max_device_pixel_ratio: self.max_device_pixel_ratio,
        }
    }

    pub fn visibility_policy(&self) -> VisibilityPolicy {
        VisibilityPolicy {
            pause_on_hidden: self.pause_on_hidden,
            pause_on_offscreen: self.pause_on_offscreen,
            pause_on_hover: self.pause_on_hover,
        }
    }

    pub fn resize_window(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}
