//! Framecast is a cross-channel frame routing core for real-time video playout.
//!
//! A playout server runs independently clocked *channels*, each rendering a
//! composed frame per tick on its own render thread. Framecast is the subsystem
//! that lets one channel's rendered output be consumed as a live source inside
//! another channel (or another layer of the same channel): a [`Route`] is the
//! publication point owned by the producing channel, and a [`RouteProducer`] is
//! the ordinary-looking [`FrameSource`] the destination layer holds.
//!
//! # Data flow
//!
//! 1. **Publish**: the producing channel renders a [`FramePair`] and calls
//!    [`Route::publish`] on its render thread.
//! 2. **Buffer**: each subscribed producer pushes the pair into its own
//!    bounded, non-blocking [`RouteBuffer`] (capacity 1 same-channel, 2
//!    cross-channel). A full buffer drops the incoming pair; neither channel
//!    ever blocks.
//! 3. **Consume**: the destination channel's render tick calls
//!    [`FrameSource::receive`], which pops the next pair, rewrites every leaf's
//!    [`StreamTag`] through the [`TagRewriter`], and returns the requested
//!    field's [`FrameTree`].
//!
//! The tag rewrite is what keeps downstream frame caching honest: routed
//! content must never deduplicate against the destination channel's own frames
//! that happen to share leaf identities with the source.
//!
//! # Design constraints
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Never block a render thread**: buffer overrun drops the incoming pair,
//!   underrun repeats the last delivered one; both are observable through the
//!   diagnostics [`Graph`], never through blocking.
//! - **Deterministic rewriting**: rewritten tags are a pure function of the
//!   route identity and the original tag for the lifetime of the producer.
//! - **Structure-preserving**: the rewritten frame tree is isomorphic to the
//!   input (same nesting, same transforms); only leaf tags differ.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod diagnostics;
mod foundation;
mod frame;
mod route;

pub use diagnostics::graph::{Color, DiagTimer, Graph, GraphSnapshot};
pub use foundation::core::{FieldMode, Fps, VideoField, VideoFormat};
pub use foundation::error::{FramecastError, FramecastResult};
pub use frame::source::{FrameSource, SourceState};
pub use frame::tree::{
    FrameKind, FrameLeaf, FramePair, FrameTransform, FrameTree, FrameVisitor, LeafContent,
    StreamTag,
};
pub use route::buffer::RouteBuffer;
pub use route::producer::{RouteControl, RouteProducer, RouteSpec, create_route_producer};
pub use route::rewrite::TagRewriter;
pub use route::route::{FormatProvider, Route, RouteKey, RouteRegistry, RouteSubscriber};
