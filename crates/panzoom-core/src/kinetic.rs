//! Kinetic scrolling: keep panning after release with decaying velocity.
//!
//! While a drag is live the simulator only records the pan deltas the gesture
//! state machine already applied, each stamped with the scheduler clock. On
//! release it averages the most recent deltas that are still inside the
//! velocity window into a velocity and runs a per-frame decay loop:
//!
//! 1. at the top of each frame, stop if the run was cancelled or the speed
//!    dropped below `min_speed`;
//! 2. otherwise pan the target by the current velocity;
//! 3. multiply the velocity by `damping` and schedule the next frame.
//!
//! The loop is tied to the [`FrameHandle`] of its pending frame. Frames
//! carrying any other handle are ignored, so cancelling is a single call.
//!
//! A drag that holds still longer than the window before release leaves no
//! fresh samples and therefore no throw.

use crate::config::PanZoomConfig;
use crate::host::{FrameHandle, FrameScheduler, PanTarget};
use kurbo::Vec2;
use std::collections::VecDeque;
use std::time::Duration;
use web_time::Instant;

/// Velocity tracker and decay loop.
#[derive(Debug, Clone)]
pub struct Kinetic {
    damping: f64,
    min_speed: f64,
    capacity: usize,
    /// Samples older than this at release are ignored.
    window: Duration,
    /// Whether deltas are currently being recorded.
    tracking: bool,
    /// Most recent pan deltas with the time they were applied, oldest first.
    samples: VecDeque<(Instant, Vec2)>,
    /// Current decay velocity in px/frame.
    velocity: Vec2,
    /// Pending frame of the active decay run.
    frame: Option<FrameHandle>,
}

impl Kinetic {
    /// Create a simulator from the engine configuration.
    pub fn new(config: &PanZoomConfig) -> Self {
        Self {
            damping: config.damping,
            min_speed: config.min_speed,
            capacity: config.velocity_samples.max(1),
            window: config.velocity_window(),
            tracking: false,
            samples: VecDeque::with_capacity(config.velocity_samples.max(1)),
            velocity: Vec2::ZERO,
            frame: None,
        }
    }

    /// Begin recording velocity for a live drag.
    pub fn start(&mut self) {
        self.tracking = true;
        self.samples.clear();
    }

    /// Record a pan delta that was just applied at `at`.
    pub fn track(&mut self, delta: Vec2, at: Instant) {
        if !self.tracking {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back((at, delta));
    }

    /// Forget recorded deltas without ending the drag (e.g. when a pinch
    /// interrupts a single-finger pan or the pointer comes to rest).
    pub fn clear_samples(&mut self) {
        self.samples.clear();
    }

    /// End tracking and start the decay loop from the recorded velocity.
    ///
    /// Only samples taken within the velocity window before the scheduler's
    /// current time count. Any previous run is cancelled first. No frame is
    /// scheduled when the release velocity is already below `min_speed`.
    pub fn stop<S: FrameScheduler>(&mut self, scheduler: &mut S) {
        if !self.tracking {
            return;
        }
        self.tracking = false;
        let velocity = self.release_velocity(scheduler.now());
        self.samples.clear();
        self.cancel(scheduler);

        if velocity.hypot() < self.min_speed {
            return;
        }
        log::debug!("kinetic: release velocity ({:.3}, {:.3})", velocity.x, velocity.y);
        self.velocity = velocity;
        self.frame = Some(scheduler.request_frame());
    }

    /// Halt any decay run and zero the velocity.
    pub fn cancel<S: FrameScheduler>(&mut self, scheduler: &mut S) {
        if let Some(handle) = self.frame.take() {
            log::debug!("kinetic: cancelled with velocity ({:.3}, {:.3})", self.velocity.x, self.velocity.y);
            scheduler.cancel_frame(handle);
        }
        self.velocity = Vec2::ZERO;
    }

    /// Run one decay frame. Returns `true` if another frame was scheduled.
    pub fn step<T: PanTarget, S: FrameScheduler>(
        &mut self,
        handle: FrameHandle,
        target: &mut T,
        scheduler: &mut S,
    ) -> bool {
        if self.frame != Some(handle) {
            return false;
        }
        self.frame = None;

        if self.velocity.hypot() < self.min_speed {
            log::debug!("kinetic: came to rest");
            self.velocity = Vec2::ZERO;
            return false;
        }

        let mut transform = target.transform();
        transform.pan_to(transform.translation + self.velocity);
        target.set_transform(transform);
        log::trace!("kinetic: step ({:.3}, {:.3})", self.velocity.x, self.velocity.y);

        self.velocity *= self.damping;
        self.frame = Some(scheduler.request_frame());
        true
    }

    /// Whether velocity is being recorded.
    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Whether a decay run is in progress.
    pub fn is_running(&self) -> bool {
        self.frame.is_some()
    }

    /// Current decay velocity.
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn release_velocity(&self, now: Instant) -> Vec2 {
        let (count, sum) = self
            .samples
            .iter()
            .filter(|(at, _)| now.saturating_duration_since(*at) <= self.window)
            .fold((0usize, Vec2::ZERO), |(n, acc), (_, d)| (n + 1, acc + *d));
        if count == 0 {
            if !self.samples.is_empty() {
                log::debug!("kinetic: pointer at rest before release");
            }
            return Vec2::ZERO;
        }
        sum / count as f64
    }
}
