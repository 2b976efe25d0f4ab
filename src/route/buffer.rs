use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::frame::tree::FramePair;

struct BufferInner {
    queue: VecDeque<FramePair>,
    capacity: usize,
}

/// Fixed-capacity, non-blocking FIFO of frame pairs.
///
/// The buffer is the sole synchronization point between a producing channel's
/// render thread (push side) and a consuming channel's render thread (pop
/// side). Neither side ever waits: a push against a full buffer fails and the
/// incoming pair is dropped (drop-newest, so whatever is eventually consumed
/// stays in publish order), and a pop against an empty buffer returns `None`
/// immediately.
///
/// Capacity is 1 for same-channel routes and 2 for cross-channel routes,
/// where an extra pair of slack absorbs the phase drift between two
/// independent clocks. [`RouteBuffer::set_capacity`] takes the same lock as
/// push and pop, so a capacity change can never be observed mid-operation.
pub struct RouteBuffer {
    inner: Mutex<BufferInner>,
}

impl RouteBuffer {
    /// A buffer holding at most `capacity` pairs (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(BufferInner {
                queue: VecDeque::with_capacity(capacity.max(1)),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Try to enqueue a pair without blocking.
    ///
    /// Returns `false` and drops `pair` when the buffer is at capacity;
    /// already-queued pairs are never evicted.
    pub fn try_push(&self, pair: FramePair) -> bool {
        let mut inner = self.inner.lock();
        if inner.queue.len() >= inner.capacity {
            return false;
        }
        inner.queue.push_back(pair);
        true
    }

    /// Try to dequeue the oldest pair without blocking.
    pub fn try_pop(&self) -> Option<FramePair> {
        self.inner.lock().queue.pop_front()
    }

    /// Change the capacity (minimum 1).
    ///
    /// Intended to be called only between frame boundaries. Queued pairs in
    /// excess of a shrunk capacity are not evicted; they drain normally and
    /// only new pushes see the reduced bound.
    pub fn set_capacity(&self, capacity: usize) {
        self.inner.lock().capacity = capacity.max(1);
    }

    /// Current capacity.
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    /// Number of queued pairs.
    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().queue.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/route/buffer.rs"]
mod tests;
