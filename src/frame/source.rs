use std::collections::BTreeMap;

use crate::foundation::core::VideoField;
use crate::frame::tree::FrameTree;

/// Human-readable snapshot of a frame source's current state.
///
/// Serialized as-is into channel state reports; the detail keys are
/// source-specific (a route producer reports its source channel/layer, mode
/// and buffer counters).
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct SourceState {
    /// The source's display name, e.g. `route[1-10]`.
    pub name: String,
    /// Source-specific key/value details.
    pub details: BTreeMap<String, serde_json::Value>,
}

impl SourceState {
    /// Start a snapshot for a named source.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            details: BTreeMap::new(),
        }
    }

    /// Insert one detail entry.
    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_owned(), value.into());
        self
    }
}

/// The generic frame source contract a channel layer holds its content by.
///
/// A layer does not know whether its source is a file player, a generator or
/// a route from another channel; it only drives this interface once per field
/// per render tick.
pub trait FrameSource: Send + Sync {
    /// Deliver the next frame for the requested field.
    ///
    /// Returns `None` only on permanent end-of-stream. Transient conditions
    /// (nothing buffered yet, producer running late) yield an empty frame or
    /// a repeat of the last delivered frame, never `None`.
    fn receive(&self, field: VideoField) -> Option<FrameTree>;

    /// The last frame delivered for `field`, or the empty frame before any.
    fn last_frame(&self, field: VideoField) -> FrameTree;

    /// Whether a call to [`FrameSource::receive`] would deliver real content
    /// right now.
    fn is_ready(&self) -> bool;

    /// Human-readable name for logs and state reports.
    fn name(&self) -> String;

    /// Snapshot of the source's current state.
    fn state(&self) -> SourceState;
}
