/// Convenience result type used across Framecast.
pub type FramecastResult<T> = Result<T, FramecastError>;

/// Top-level error taxonomy used by routing APIs.
///
/// All variants are construction-time or configuration errors; the per-frame
/// paths (publish, receive) never fail, they degrade observably instead
/// (dropped or repeated frames, end-of-stream).
#[derive(thiserror::Error, Debug)]
pub enum FramecastError {
    /// Invalid user-provided data (e.g. a malformed route specification).
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while resolving or wiring a route (unknown source,
    /// self-referential route, missing destination format).
    #[error("route error: {0}")]
    Route(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FramecastError {
    /// Build a [`FramecastError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FramecastError::Route`] value.
    pub fn route(msg: impl Into<String>) -> Self {
        Self::Route(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
