use crate::params::ParamKind;
use crate::surface::ContextKind;
use thiserror::Error;

pub type Result<T, E = BackdropError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BackdropError {
    /// The platform refused the requested drawing context. Hosts degrade to a
    /// static background instead of failing the page.
    #[error("{kind} context unavailable: {reason}")]
    ContextUnavailable { kind: ContextKind, reason: String },

    #[error("parameter `{name}` expects {expected}, got {found}")]
    InvalidParameterType {
        name: String,
        expected: ParamKind,
        found: String,
    },

    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),

    #[error("invalid color literal `{0}`")]
    InvalidColor(String),

    #[error("frame callback failed on frame {frame_index}: {source}")]
    FrameCallback {
        frame_index: u64,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to release `{label}`: {reason}")]
    Disposal { label: String, reason: String },
}

impl BackdropError {
    /// Errors a host should answer by disabling the effect rather than
    /// reporting a crash.
    pub fn disables_effect(&self) -> bool {
        matches!(self, BackdropError::ContextUnavailable { .. })
    }
}
