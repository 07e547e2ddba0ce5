//! Host abstractions: the transformed element and the frame clock.
//!
//! The engine never touches a DOM or a window directly. A host implements
//! [`PanTarget`] for the element it wants to pan and zoom, and
//! [`FrameScheduler`] for its animation-frame primitive. [`MemoryTarget`] and
//! [`ManualScheduler`] are in-memory implementations for tests and headless
//! replays.

use crate::notify::PanEvent;
use crate::transform::Transform;
use kurbo::{Point, Vec2};
use std::collections::VecDeque;
use std::time::Duration;
use web_time::Instant;

/// What kind of node the engine is being attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A graphic element nested inside a coordinate-space root.
    Graphic,
    /// The coordinate-space root itself (e.g. the outer `<svg>`).
    Root,
    /// Anything that is not a vector graphic element.
    Other,
}

/// The element whose transform the engine drives.
pub trait PanTarget {
    /// Classify the element for attachment checks.
    fn kind(&self) -> TargetKind;

    /// Read the element's current transform.
    fn transform(&self) -> Transform;

    /// Write a new transform to the element.
    fn set_transform(&mut self, transform: Transform);

    /// Dispatch a lifecycle notification on the element.
    fn dispatch(&mut self, event: PanEvent);

    /// Enable or disable native text selection and drag-start while a mouse
    /// drag is in progress.
    fn set_native_selection(&mut self, _enabled: bool) {}

    /// Map a client-space point into the element's parent coordinate space.
    fn client_to_parent(&self, client: Point) -> Point {
        client
    }

    /// Map a client-space displacement into the parent coordinate space.
    ///
    /// Only the linear part of the mapping applies, so this must agree with
    /// [`PanTarget::client_to_parent`] up to translation.
    fn client_delta_to_parent(&self, delta: Vec2) -> Vec2 {
        delta
    }
}

/// Opaque handle for a scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Frame-scheduling primitive (e.g. `requestAnimationFrame`).
///
/// The host calls back into the engine with the same handle once the frame is
/// due.
pub trait FrameScheduler {
    /// Schedule one frame and return its handle.
    fn request_frame(&mut self) -> FrameHandle;

    /// Drop a previously scheduled frame. Unknown handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Current time on the clock that drives frames.
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Scheduler that queues frames until the caller drains them.
///
/// Its clock stands still unless [`ManualScheduler::advance`] moves it.
#[derive(Debug)]
pub struct ManualScheduler {
    next_id: u64,
    queue: VecDeque<FrameHandle>,
    now: Instant,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self {
            next_id: 0,
            queue: VecDeque::new(),
            now: Instant::now(),
        }
    }
}

impl ManualScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    /// Take the oldest due frame.
    pub fn pop_due(&mut self) -> Option<FrameHandle> {
        self.queue.pop_front()
    }

    /// Number of frames waiting.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.queue.push_back(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.queue.retain(|h| *h != handle);
    }

    fn now(&self) -> Instant {
        self.now
    }
}

/// In-memory target that records everything the engine does to it.
#[derive(Debug, Clone)]
pub struct MemoryTarget {
    kind: TargetKind,
    transform: Transform,
    /// Every transform written, in order.
    pub history: Vec<Transform>,
    /// Every notification dispatched, in order.
    pub events: Vec<PanEvent>,
    /// Whether native selection is currently enabled.
    pub native_selection: bool,
}

impl Default for MemoryTarget {
    fn default() -> Self {
        Self::new(TargetKind::Graphic)
    }
}

impl MemoryTarget {
    /// Create a target of the given kind with an identity transform.
    pub fn new(kind: TargetKind) -> Self {
        Self::with_transform(kind, Transform::IDENTITY)
    }

    /// Create a target with an initial transform.
    pub fn with_transform(kind: TargetKind, transform: Transform) -> Self {
        Self {
            kind,
            transform,
            history: Vec::new(),
            events: Vec::new(),
            native_selection: true,
        }
    }

    /// Count dispatched notifications of one kind.
    pub fn count(&self, event: PanEvent) -> usize {
        self.events.iter().filter(|e| **e == event).count()
    }
}

impl PanTarget for MemoryTarget {
    fn kind(&self) -> TargetKind {
        self.kind
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.history.push(transform);
    }

    fn dispatch(&mut self, event: PanEvent) {
        self.events.push(event);
    }

    fn set_native_selection(&mut self, enabled: bool) {
        self.native_selection = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_scheduler_queue() {
        let mut scheduler = ManualScheduler::new();
        let a = scheduler.request_frame();
        let b = scheduler.request_frame();
        assert_ne!(a, b);
        assert_eq!(scheduler.pending(), 2);

        scheduler.cancel_frame(a);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.pop_due(), Some(b));
        assert_eq!(scheduler.pop_due(), None);
    }

    #[test]
    fn test_cancel_unknown_handle_is_noop() {
        let mut scheduler = ManualScheduler::new();
        scheduler.request_frame();
        scheduler.cancel_frame(FrameHandle(999));
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_manual_clock_only_moves_when_advanced() {
        let mut scheduler = ManualScheduler::new();
        let start = scheduler.now();
        scheduler.request_frame();
        assert_eq!(scheduler.now(), start);

        scheduler.advance(Duration::from_millis(16));
        assert_eq!(scheduler.now() - start, Duration::from_millis(16));
    }

    #[test]
    fn test_memory_target_records() {
        let mut target = MemoryTarget::default();
        let t = Transform::new(kurbo::Vec2::new(1.0, 2.0), 2.0);
        target.set_transform(t);
        target.dispatch(PanEvent::PanStart);
        target.dispatch(PanEvent::PanEnd);

        assert_eq!(target.transform(), t);
        assert_eq!(target.history, vec![t]);
        assert_eq!(target.count(PanEvent::PanStart), 1);
        assert_eq!(target.count(PanEvent::PanEnd), 1);
    }
}
