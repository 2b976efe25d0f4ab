use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::foundation::core::VideoFormat;
use crate::frame::tree::FramePair;

/// Identifies a routable publication point: a channel, optionally narrowed to
/// one of its layers.
///
/// `layer: None` routes the channel's fully composed output; `Some(n)` routes
/// the content of a single layer before channel composition. Displayed as
/// `"1"` or `"1-10"`, matching the `route://` address syntax.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct RouteKey {
    /// Producing channel index.
    pub channel: usize,
    /// Producing layer index, or `None` for the whole channel output.
    pub layer: Option<usize>,
}

impl RouteKey {
    /// Key for a channel's composed output.
    pub fn channel(channel: usize) -> Self {
        Self {
            channel,
            layer: None,
        }
    }

    /// Key for a single layer of a channel.
    pub fn layer(channel: usize, layer: usize) -> Self {
        Self {
            channel,
            layer: Some(layer),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.layer {
            Some(layer) => write!(f, "{}-{}", self.channel, layer),
            None => write!(f, "{}", self.channel),
        }
    }
}

/// Receives frame pairs published on a route.
///
/// Implementations must be cheap and non-blocking: `on_frame` runs on the
/// *producing* channel's render thread, inside its per-frame time budget.
pub trait RouteSubscriber: Send + Sync {
    /// A newly rendered pair was published on the subscribed route.
    fn on_frame(&self, pair: FramePair);
}

/// A per-channel/layer publication point.
///
/// Owned by the producing channel and dropped when the channel or layer is
/// torn down; subscribers hold only a [`Weak`] reference and treat its
/// disappearance as permanent end-of-stream. The route in turn holds only
/// weak references to its subscribers, so neither side can keep the other
/// alive: subscriber teardown revokes delivery without any unsubscribe
/// handshake.
pub struct Route {
    key: RouteKey,
    generation: u64,
    format: Mutex<VideoFormat>,
    subscribers: Mutex<Vec<Weak<dyn RouteSubscriber>>>,
}

impl Route {
    fn new(key: RouteKey, generation: u64, format: VideoFormat) -> Self {
        Self {
            key,
            generation,
            format: Mutex::new(format),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// The channel/layer this route publishes.
    pub fn key(&self) -> RouteKey {
        self.key
    }

    /// Monotonic creation number, unique per registry.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The producing channel's current output format.
    pub fn format(&self) -> VideoFormat {
        *self.format.lock()
    }

    /// Update the output format after a channel format change.
    pub fn set_format(&self, format: VideoFormat) {
        *self.format.lock() = format;
    }

    /// Register a subscriber. Delivery stops on its own once the subscriber
    /// is dropped or revokes itself.
    pub fn subscribe(&self, subscriber: Weak<dyn RouteSubscriber>) {
        self.subscribers.lock().push(subscriber);
    }

    /// Broadcast a newly rendered pair to all live subscribers.
    ///
    /// Runs on the producing channel's render thread. Dead subscriber entries
    /// are pruned in passing.
    pub fn publish(&self, pair: FramePair) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|weak| match weak.upgrade() {
            Some(subscriber) => {
                subscriber.on_frame(pair.clone());
                true
            }
            None => false,
        });
    }

    /// Number of currently live subscribers.
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|weak| weak.strong_count() > 0);
        subscribers.len()
    }
}

/// Resolves a channel index to its current output format.
///
/// This is the narrow interface the routing core consumes from the channel
/// shell; [`RouteRegistry`] provides an implementation backed by its
/// channel-output routes.
pub trait FormatProvider: Send + Sync {
    /// The format of `channel`'s output, or `None` for an unknown channel.
    fn current_format(&self, channel: usize) -> Option<VideoFormat>;
}

/// Process-wide table of the routes that currently exist.
///
/// Channels create their routes when they (or their layers) become routable
/// and remove them on teardown. Consumers look routes up by key; an absent
/// key is a construction-time error for new producers, while producers
/// already subscribed observe the drop of the route itself as end-of-stream.
#[derive(Default)]
pub struct RouteRegistry {
    routes: Mutex<HashMap<RouteKey, Arc<Route>>>,
    generation: AtomicU64,
}

impl RouteRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) the route for `key`, assigning the next
    /// generation number.
    ///
    /// Replacing an existing key drops the old route, which its subscribers
    /// observe as end-of-stream; the replacement is a distinct route identity.
    pub fn create(&self, key: RouteKey, format: VideoFormat) -> Arc<Route> {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let route = Arc::new(Route::new(key, generation, format));
        tracing::debug!(route = %key, generation, "route created");
        self.routes.lock().insert(key, Arc::clone(&route));
        route
    }

    /// The route for `key`, if one currently exists.
    pub fn lookup(&self, key: RouteKey) -> Option<Arc<Route>> {
        self.routes.lock().get(&key).cloned()
    }

    /// Remove the route for `key` on channel/layer teardown.
    ///
    /// Subscribers see end-of-stream once the last outstanding [`Arc`] to the
    /// route is gone.
    pub fn remove(&self, key: RouteKey) -> Option<Arc<Route>> {
        let removed = self.routes.lock().remove(&key);
        if removed.is_some() {
            tracing::debug!(route = %key, "route removed");
        }
        removed
    }
}

impl FormatProvider for RouteRegistry {
    fn current_format(&self, channel: usize) -> Option<VideoFormat> {
        self.lookup(RouteKey::channel(channel))
            .map(|route| route.format())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/route/route.rs"]
mod tests;
