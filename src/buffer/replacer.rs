use std::collections::VecDeque;

use crate::common::config::FrameId;

/// Victim-selection policy requested at `BufferPool::init`.
///
/// `LruK`, `Clock`, and `Lfu` are reserved identifiers for tuning strategies
/// this subsystem does not implement; selecting one fails `init` with
/// `BufferError::NotImplemented`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementStrategy {
    Fifo,
    Lru,
    LruK,
    Clock,
    Lfu,
}

/// FIFO queue of resident frame indices in load order.
///
/// A ring buffer of frame indices, per the design notes: frames enter at the
/// back on load and the victim is the oldest entry that is currently
/// unpinned. Pins and unpins never reorder the queue.
#[derive(Debug, Default)]
pub struct FifoReplacer {
    queue: VecDeque<FrameId>,
}

impl FifoReplacer {
    pub fn new() -> Self {
        FifoReplacer {
            queue: VecDeque::new(),
        }
    }

    /// Called when a frame is freshly loaded (miss). FIFO does not reorder on
    /// hit, so there is no separate touch-on-hit call.
    pub fn record_load(&mut self, frame_id: FrameId) {
        self.queue.push_back(frame_id);
    }

    /// Scans from the front for the oldest unpinned frame and removes it.
    /// Pinned entries encountered along the way are left in place, in their
    /// original relative order, so a later unpin makes them evictable again.
    pub fn victim(&mut self, is_pinned: impl Fn(FrameId) -> bool) -> Option<FrameId> {
        let pos = self.queue.iter().position(|&id| !is_pinned(id))?;
        self.queue.remove(pos)
    }
}

/// LRU ordering of resident frame indices, most-recently-used first.
///
/// Modeled as an ordered list rather than an intrusive linked list for
/// memory safety; `touch`/`victim` are O(capacity), which the design notes
/// call out as acceptable given the small pool sizes this subsystem targets.
#[derive(Debug, Default)]
pub struct LruReplacer {
    /// Front = most recently used, back = least recently used.
    order: Vec<FrameId>,
}

impl LruReplacer {
    pub fn new() -> Self {
        LruReplacer { order: Vec::new() }
    }

    /// Moves `frame_id` to the head. Used both on load and on a pin hit.
    pub fn touch(&mut self, frame_id: FrameId) {
        self.order.retain(|&id| id != frame_id);
        self.order.insert(0, frame_id);
    }

    /// Scans from the tail toward the head for the first unpinned frame.
    pub fn victim(&mut self, is_pinned: impl Fn(FrameId) -> bool) -> Option<FrameId> {
        let pos = self.order.iter().rposition(|&id| !is_pinned(id))?;
        Some(self.order.remove(pos))
    }
}

/// Enum-dispatched replacer: `BufferPool` picks one concrete strategy at
/// `init` and never switches it, so a closed enum is simpler and cheaper
/// than a trait object here.
#[derive(Debug)]
pub enum Replacer {
    Fifo(FifoReplacer),
    Lru(LruReplacer),
}

impl Replacer {
    /// Called whenever a frame becomes resident (load) or is re-pinned on a
    /// cache hit. FIFO only tracks the load; LRU moves to head on both.
    pub fn touch_on_load(&mut self, frame_id: FrameId) {
        match self {
            Replacer::Fifo(r) => r.record_load(frame_id),
            Replacer::Lru(r) => r.touch(frame_id),
        }
    }

    pub fn touch_on_hit(&mut self, frame_id: FrameId) {
        match self {
            Replacer::Fifo(_) => {}
            Replacer::Lru(r) => r.touch(frame_id),
        }
    }

    pub fn victim(&mut self, is_pinned: impl Fn(FrameId) -> bool) -> Option<FrameId> {
        match self {
            Replacer::Fifo(r) => r.victim(is_pinned),
            Replacer::Lru(r) => r.victim(is_pinned),
        }
    }
}
