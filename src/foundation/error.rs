/// Convenience result type used across the engine.
pub type AnimaResult<T> = Result<T, AnimaError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum AnimaError {
    /// Invalid caller-provided or session data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while decoding the binary character or frame format.
    #[error("codec error: {0}")]
    Codec(String),

    /// Errors while evaluating skeleton poses or blend state.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnimaError {
    /// Build an [`AnimaError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an [`AnimaError::Codec`] value.
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    /// Build an [`AnimaError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build an [`AnimaError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

/// Closed set of error codes surfaced to the host's error handler.
///
/// Playback-internal failures never cross the scheduler's public boundary
/// as panics or `Err` returns; they are funneled here so the host can log,
/// retry or degrade while the tick loop keeps running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    /// Body track supplied no clip within the wait budget.
    BodyDataExpired,
    /// Audio track data arrived behind the consumption watermark.
    AudioDataExpired,
    /// A wire batch did not match any known frame shape.
    InvalidDataStructure,
    /// The character rig payload failed to decode.
    CharacterDecode,
    /// A face frame payload failed to decode.
    FaceDecode,
    /// Pose evaluation failed for an otherwise well-formed frame.
    Evaluation,
}

/// Structured error event delivered to the registered handler.
#[derive(Debug)]
pub struct ErrorEvent {
    /// Stable machine-readable code.
    pub code: ErrorCode,
    /// Human-readable context for logs.
    pub message: String,
    /// Underlying engine error, when one exists.
    pub source: Option<AnimaError>,
}

impl ErrorEvent {
    /// Build an event without an underlying source error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Build an event wrapping an underlying engine error.
    pub fn with_source(code: ErrorCode, message: impl Into<String>, source: AnimaError) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(source),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
