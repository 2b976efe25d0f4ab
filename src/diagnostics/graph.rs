use std::collections::BTreeMap;
use std::time::Instant;

use parking_lot::Mutex;

/// RGBA display color for a diagnostics signal.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Color {
    /// Red component in `[0, 1]`.
    pub r: f32,
    /// Green component in `[0, 1]`.
    pub g: f32,
    /// Blue component in `[0, 1]`.
    pub b: f32,
    /// Alpha component in `[0, 1]`.
    pub a: f32,
}

impl Color {
    /// Opaque color from RGB components.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Color from RGBA components.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Default)]
struct GraphInner {
    text: String,
    colors: BTreeMap<&'static str, Color>,
    counts: BTreeMap<&'static str, u64>,
    values: BTreeMap<&'static str, f64>,
}

/// Serializable snapshot of a diagnostics graph.
#[derive(Clone, Debug, serde::Serialize)]
pub struct GraphSnapshot {
    /// The graph's display label.
    pub text: String,
    /// Pulse counts per signal name.
    pub counts: BTreeMap<&'static str, u64>,
    /// Last value per signal name.
    pub values: BTreeMap<&'static str, f64>,
}

/// Diagnostics sink for one real-time component.
///
/// A graph accepts named numeric signals of two kinds: *pulses*
/// ([`Graph::tag`], counted) and *values* ([`Graph::set_value`], last value
/// retained). Registered colors describe how a display layer should render
/// each signal; this crate only keeps the data model. Every signal also emits
/// a `tracing` event so graphs are observable without any display attached.
#[derive(Default)]
pub struct Graph {
    inner: Mutex<GraphInner>,
}

impl Graph {
    /// A new graph with no label or signals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the graph's display label.
    pub fn set_text(&self, text: impl Into<String>) {
        self.inner.lock().text = text.into();
    }

    /// The graph's display label.
    pub fn text(&self) -> String {
        self.inner.lock().text.clone()
    }

    /// Register the display color for a signal name.
    pub fn set_color(&self, name: &'static str, color: Color) {
        self.inner.lock().colors.insert(name, color);
    }

    /// Pulse a counted signal once.
    pub fn tag(&self, name: &'static str) {
        let mut inner = self.inner.lock();
        *inner.counts.entry(name).or_insert(0) += 1;
        tracing::trace!(graph = %inner.text, signal = name, "diagnostics tag");
    }

    /// Record the current value of a signal.
    pub fn set_value(&self, name: &'static str, value: f64) {
        let mut inner = self.inner.lock();
        inner.values.insert(name, value);
        tracing::trace!(graph = %inner.text, signal = name, value, "diagnostics value");
    }

    /// How many times `name` has been pulsed.
    pub fn count(&self, name: &'static str) -> u64 {
        self.inner.lock().counts.get(name).copied().unwrap_or(0)
    }

    /// The last recorded value of `name`, if any.
    pub fn value(&self, name: &'static str) -> Option<f64> {
        self.inner.lock().values.get(name).copied()
    }

    /// Snapshot of label, counts and last values.
    pub fn snapshot(&self) -> GraphSnapshot {
        let inner = self.inner.lock();
        GraphSnapshot {
            text: inner.text.clone(),
            counts: inner.counts.clone(),
            values: inner.values.clone(),
        }
    }
}

/// Restartable elapsed timer for cadence measurements.
///
/// `restart_secs` returns the time since the previous restart (or
/// construction) and rearms, which is exactly the shape needed for
/// produce-time / consume-time signals normalized by the frame interval.
pub struct DiagTimer {
    last: Mutex<Instant>,
}

impl Default for DiagTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagTimer {
    /// A timer armed at construction time.
    pub fn new() -> Self {
        Self {
            last: Mutex::new(Instant::now()),
        }
    }

    /// Seconds since the last restart, then rearm.
    pub fn restart_secs(&self) -> f64 {
        let mut last = self.last.lock();
        let now = Instant::now();
        let elapsed = now.duration_since(*last).as_secs_f64();
        *last = now;
        elapsed
    }
}

#[cfg(test)]
#[path = "../../tests/unit/diagnostics/graph.rs"]
mod tests;
