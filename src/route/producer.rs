use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::diagnostics::graph::{Color, DiagTimer, Graph};
use crate::foundation::core::{VideoField, VideoFormat};
use crate::foundation::error::{FramecastError, FramecastResult};
use crate::frame::source::{FrameSource, SourceState};
use crate::frame::tree::{FramePair, FrameTree};
use crate::route::buffer::RouteBuffer;
use crate::route::rewrite::TagRewriter;
use crate::route::route::{FormatProvider, Route, RouteKey, RouteRegistry, RouteSubscriber};

/// Parsed `route://` source specification for a layer.
///
/// Address syntax is `route://<channel>[-<layer>]`, optionally followed by a
/// `BUFFER <n>` parameter overriding the initial buffer depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteSpec {
    /// Source channel index.
    pub channel: usize,
    /// Source layer index, or `None` for the channel's composed output.
    pub layer: Option<usize>,
    /// Requested initial buffer depth, if given.
    pub buffer: Option<usize>,
}

impl RouteSpec {
    /// Parse a `route://<channel>[-<layer>]` address.
    pub fn parse(address: &str) -> FramecastResult<Self> {
        let Some(rest) = address.strip_prefix("route://") else {
            return Err(FramecastError::validation(format!(
                "route address must start with route://, got {address:?}"
            )));
        };
        let (channel_str, layer_str) = match rest.split_once('-') {
            Some((channel, layer)) => (channel, Some(layer)),
            None => (rest, None),
        };
        let channel = channel_str.parse::<usize>().map_err(|_| {
            FramecastError::validation(format!("invalid route channel {channel_str:?}"))
        })?;
        let layer = layer_str
            .map(|s| {
                s.parse::<usize>()
                    .map_err(|_| FramecastError::validation(format!("invalid route layer {s:?}")))
            })
            .transpose()?;
        Ok(Self {
            channel,
            layer,
            buffer: None,
        })
    }

    /// Parse a full parameter list: the address, then optional `BUFFER <n>`.
    pub fn parse_params(params: &[String]) -> FramecastResult<Self> {
        let Some(address) = params.first() else {
            return Err(FramecastError::validation("missing route address"));
        };
        let mut spec = Self::parse(address)?;
        let mut rest = params[1..].iter();
        while let Some(param) = rest.next() {
            if param.eq_ignore_ascii_case("BUFFER") {
                let Some(depth) = rest.next() else {
                    return Err(FramecastError::validation("BUFFER requires a depth value"));
                };
                let depth = depth.parse::<usize>().map_err(|_| {
                    FramecastError::validation(format!("invalid BUFFER depth {depth:?}"))
                })?;
                spec.buffer = Some(depth);
            } else {
                return Err(FramecastError::validation(format!(
                    "unknown route parameter {param:?}"
                )));
            }
        }
        Ok(spec)
    }

    /// The registry key this specification resolves to.
    pub fn key(&self) -> RouteKey {
        RouteKey {
            channel: self.channel,
            layer: self.layer,
        }
    }
}

/// Mode-switch interface the destination layer's control path drives.
///
/// Separated from [`FrameSource`] so the channel shell can retarget buffering
/// when a source route starts or stops crossing channel boundaries without
/// knowing anything else about the producer.
pub trait RouteControl {
    /// Index of the channel this producer routes from.
    fn source_channel(&self) -> usize;
    /// Index of the layer this producer routes from, if layer-scoped.
    fn source_layer(&self) -> Option<usize>;
    /// Switch between same-channel and cross-channel buffering.
    ///
    /// Cross-channel mode doubles the buffer (capacity 2) and starts tracking
    /// the source route's format; same-channel mode reverts to capacity 1 and
    /// clears the tracked format. Must be issued between frames.
    fn set_cross_channel(&self, cross: bool);
}

/// The subscriber half of a producer: owns the buffer and runs on the
/// producing channel's render thread.
struct ProducerSink {
    buffer: RouteBuffer,
    graph: Arc<Graph>,
    produce_timer: DiagTimer,
    frame_interval: f64,
    revoked: AtomicBool,
}

impl RouteSubscriber for ProducerSink {
    fn on_frame(&self, pair: FramePair) {
        if self.revoked.load(Ordering::Acquire) {
            return;
        }
        if self.frame_interval > 0.0 {
            self.graph
                .set_value("produce-time", self.produce_timer.restart_secs() / self.frame_interval);
        }
        if !self.buffer.try_push(pair) {
            self.graph.tag("dropped-frame");
        }
    }
}

struct ProducerState {
    last_pair: Option<FramePair>,
    source_format: VideoFormat,
    cross_channel: bool,
}

/// A frame source that consumes another channel/layer's published output.
///
/// The producer subscribes to its [`Route`](crate::Route), buffers published
/// pairs in a bounded non-blocking [`RouteBuffer`], and on every destination
/// render tick delivers the next pair with all leaf tags rewritten by its
/// [`TagRewriter`]. Rate mismatch degrades observably instead of blocking:
/// an overrun drops the incoming pair (`dropped-frame`), an underrun repeats
/// the last delivered one (`late-frame`). End-of-stream is reported only once
/// the source route is permanently gone and the buffer has drained.
///
/// Dropping the producer revokes its subscription before the buffer is torn
/// down, so no publish can land after destruction begins.
pub struct RouteProducer {
    graph: Arc<Graph>,
    sink: Arc<ProducerSink>,
    route: Weak<Route>,
    format: VideoFormat,
    source_channel: usize,
    source_layer: Option<usize>,
    rewriter: TagRewriter,
    state: Mutex<ProducerState>,
    consume_timer: DiagTimer,
}

impl RouteProducer {
    fn new(
        route: &Arc<Route>,
        format: VideoFormat,
        initial_buffer: usize,
    ) -> Arc<Self> {
        let graph = Arc::new(Graph::new());
        graph.set_color("late-frame", Color::rgb(0.6, 0.3, 0.3));
        graph.set_color("produce-time", Color::rgb(0.0, 1.0, 0.0));
        graph.set_color("consume-time", Color::rgba(1.0, 0.4, 0.0, 0.8));
        graph.set_color("dropped-frame", Color::rgb(0.3, 0.6, 0.3));

        let sink = Arc::new(ProducerSink {
            buffer: RouteBuffer::with_capacity(initial_buffer),
            graph: Arc::clone(&graph),
            produce_timer: DiagTimer::new(),
            frame_interval: format.frame_interval_secs(),
            revoked: AtomicBool::new(false),
        });
        // The sink allocation doubles as this producer's route identity: live
        // producers can never share one without any central coordination.
        let route_id = Arc::as_ptr(&sink) as usize as u64;

        let key = route.key();
        let producer = Arc::new(Self {
            graph,
            sink,
            route: Arc::downgrade(route),
            format,
            source_channel: key.channel,
            source_layer: key.layer,
            rewriter: TagRewriter::new(route_id),
            state: Mutex::new(ProducerState {
                last_pair: None,
                source_format: VideoFormat::default(),
                cross_channel: false,
            }),
            consume_timer: DiagTimer::new(),
        });
        producer.graph.set_text(producer.name());

        let sink: Arc<dyn RouteSubscriber> = Arc::clone(&producer.sink) as _;
        let subscriber: Weak<dyn RouteSubscriber> = Arc::downgrade(&sink);
        route.subscribe(subscriber);
        tracing::debug!(producer = %producer.name(), "initialized");
        producer
    }

    /// This producer's diagnostics graph.
    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    /// Destination channel format this producer delivers into.
    pub fn format(&self) -> VideoFormat {
        self.format
    }

    /// The tracked source format: the source route's format in cross-channel
    /// mode, the default descriptor otherwise.
    pub fn source_format(&self) -> VideoFormat {
        self.state.lock().source_format
    }

    /// Whether the producer is in cross-channel mode.
    pub fn is_cross_channel(&self) -> bool {
        self.state.lock().cross_channel
    }

    /// Current buffer capacity (1 same-channel, 2 cross-channel).
    pub fn buffer_capacity(&self) -> usize {
        self.sink.buffer.capacity()
    }

    fn advance(&self, state: &mut ProducerState, field: VideoField) -> Option<FrameTree> {
        if self.format.frame_interval_secs() > 0.0 {
            self.graph.set_value(
                "consume-time",
                self.consume_timer.restart_secs() / self.format.frame_interval_secs(),
            );
        }
        match self.sink.buffer.try_pop() {
            Some(pair) => {
                let rewritten = self.rewriter.rewrite_pair(&pair);
                let frame = rewritten.field(field).clone();
                state.last_pair = Some(rewritten);
                Some(frame)
            }
            None => {
                if self.route.strong_count() == 0 {
                    // Source torn down and buffer drained: end-of-stream.
                    return None;
                }
                self.graph.tag("late-frame");
                match &state.last_pair {
                    Some(pair) => Some(pair.field(field).clone()),
                    // Nothing published yet; stay black until the first pair.
                    None => Some(FrameTree::empty()),
                }
            }
        }
    }
}

impl std::fmt::Debug for RouteProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteProducer")
            .field("source_channel", &self.source_channel)
            .field("source_layer", &self.source_layer)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl RouteControl for RouteProducer {
    fn source_channel(&self) -> usize {
        self.source_channel
    }

    fn source_layer(&self) -> Option<usize> {
        self.source_layer
    }

    fn set_cross_channel(&self, cross: bool) {
        let mut state = self.state.lock();
        state.cross_channel = cross;
        if cross {
            self.sink.buffer.set_capacity(2);
            state.source_format = self
                .route
                .upgrade()
                .map(|route| route.format())
                .unwrap_or_default();
        } else {
            self.sink.buffer.set_capacity(1);
            state.source_format = VideoFormat::default();
        }
    }
}

impl FrameSource for RouteProducer {
    fn receive(&self, field: VideoField) -> Option<FrameTree> {
        let mut state = self.state.lock();
        if field == VideoField::Second
            && let Some(pair) = &state.last_pair
        {
            // The first-field call of this tick already popped the pair.
            return Some(pair.second.clone());
        }
        self.advance(&mut state, field)
    }

    fn last_frame(&self, field: VideoField) -> FrameTree {
        self.state
            .lock()
            .last_pair
            .as_ref()
            .map(|pair| pair.field(field).clone())
            .unwrap_or_else(FrameTree::empty)
    }

    fn is_ready(&self) -> bool {
        !self.sink.buffer.is_empty() || self.state.lock().last_pair.is_some()
    }

    fn name(&self) -> String {
        format!(
            "route[{}]",
            RouteKey {
                channel: self.source_channel,
                layer: self.source_layer,
            }
        )
    }

    fn state(&self) -> SourceState {
        let state = self.state.lock();
        SourceState::named(self.name())
            .with("source-channel", self.source_channel as u64)
            .with(
                "source-layer",
                match self.source_layer {
                    Some(layer) => serde_json::Value::from(layer as u64),
                    None => serde_json::Value::Null,
                },
            )
            .with("cross-channel", state.cross_channel)
            .with("buffered", self.sink.buffer.len() as u64)
            .with("buffer-capacity", self.sink.buffer.capacity() as u64)
            .with("dropped-frames", self.graph.count("dropped-frame"))
            .with("late-frames", self.graph.count("late-frame"))
    }
}

impl Drop for RouteProducer {
    fn drop(&mut self) {
        // Revocation must be visible before the sink allocation can go away.
        self.sink.revoked.store(true, Ordering::Release);
        tracing::debug!(producer = %self.name(), "revoked");
    }
}

/// Resolve a route specification into a subscribed [`RouteProducer`] for a
/// destination layer.
///
/// Fails at construction time for a self-referential route (source equals
/// destination channel and layer), an unknown source route, or an unknown
/// destination channel format. Cross-channel mode is entered immediately
/// when the source channel differs from the destination channel.
pub fn create_route_producer(
    registry: &RouteRegistry,
    formats: &dyn FormatProvider,
    dest_channel: usize,
    dest_layer: usize,
    spec: &RouteSpec,
) -> FramecastResult<Arc<RouteProducer>> {
    if spec.channel == dest_channel && spec.layer == Some(dest_layer) {
        return Err(FramecastError::route(format!(
            "cannot route layer {dest_channel}-{dest_layer} into itself"
        )));
    }
    let key = spec.key();
    let Some(route) = registry.lookup(key) else {
        return Err(FramecastError::route(format!("no route at {key}")));
    };
    let Some(format) = formats.current_format(dest_channel) else {
        return Err(FramecastError::route(format!(
            "unknown destination channel {dest_channel}"
        )));
    };

    // The capacity invariant pins buffering to one or two pairs; a requested
    // deeper BUFFER is clamped rather than honored.
    let initial_buffer = spec.buffer.unwrap_or(1).clamp(1, 2);
    let producer = RouteProducer::new(&route, format, initial_buffer);
    if spec.channel != dest_channel {
        producer.set_cross_channel(true);
    }
    Ok(producer)
}

#[cfg(test)]
#[path = "../../tests/unit/route/producer.rs"]
mod tests;
