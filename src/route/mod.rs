/// Bounded, non-blocking frame pair buffer.
pub mod buffer;
/// The route producer: a frame source fed by another channel's route.
pub mod producer;
/// Leaf tag rewriting for routed frame trees.
pub mod rewrite;
/// Routes, the route registry and the subscription model.
#[allow(clippy::module_inception)]
pub mod route;
