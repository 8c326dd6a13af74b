/// Convenience result type used across tickmix.
pub type MixResult<T> = Result<T, MixError>;

/// Top-level error taxonomy used by decoder, converter and mixer APIs.
#[derive(thiserror::Error, Debug)]
pub enum MixError {
    /// The codec backend rejected or failed on a packet.
    #[error("decode error: {0}")]
    Decode(String),

    /// A resource could not be set up for the requested output (frame rate, pixel format).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A tick failed while compositing audio or image data.
    #[error("composition error: {0}")]
    Composition(String),

    /// Misuse of an immutable result entity.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Invalid user-provided values or settings documents.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MixError {
    /// Build a [`MixError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`MixError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`MixError::Composition`] value.
    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition(msg.into())
    }

    /// Build a [`MixError::InvalidOperation`] value.
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Build a [`MixError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
