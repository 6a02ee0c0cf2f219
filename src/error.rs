//! Configuration-boundary errors.
//!
//! Physics steps never fail; only catalog lookups and control-panel edits do.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("unknown model id '{0}'")]
    UnknownModel(String),

    #[error("model '{model}' has no parameter '{name}'")]
    UnknownParameter { model: &'static str, name: String },

    #[error("model '{model}' has no flag '{name}'")]
    UnknownFlag { model: &'static str, name: String },

    #[error("parameter '{name}' must be finite, got {value}")]
    NonFiniteValue { name: String, value: f64 },

    #[error("pendulum segment {0} does not exist (valid: 1..=3)")]
    NoSuchSegment(usize),

    #[error("spring {0} does not exist (valid: 1..=3)")]
    NoSuchSpring(usize),

    #[error("segment {segment} needs segment {required} enabled first")]
    SegmentOrder { segment: usize, required: usize },

    #[error("spring cannot handle this speed, reduce angular speed below {critical:.2} rad/s")]
    WouldBreak { critical: f64 },

    #[error("operation not supported by model '{0}'")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, EngineError>;
