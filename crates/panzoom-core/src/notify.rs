//! Pan lifecycle notifications.

use crate::host::PanTarget;
use serde::{Deserialize, Serialize};

/// Notification dispatched on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanEvent {
    /// First movement of a gesture.
    PanStart,
    /// The gesture that fired `PanStart` has fully ended.
    PanEnd,
}

impl PanEvent {
    /// Event name as seen by host listeners.
    pub fn name(self) -> &'static str {
        match self {
            PanEvent::PanStart => "panstart",
            PanEvent::PanEnd => "panend",
        }
    }
}

/// Deduplicates `panstart`/`panend` for one gesture session.
#[derive(Debug, Clone, Copy, Default)]
pub struct Notifier {
    panstart_fired: bool,
}

impl Notifier {
    /// Create a notifier with no gesture in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `panstart` fired for the current gesture.
    pub fn panstart_fired(&self) -> bool {
        self.panstart_fired
    }

    /// Fire `panstart` unless it already fired this gesture.
    ///
    /// Returns `true` if the notification was dispatched.
    pub fn pan_start<T: PanTarget>(&mut self, target: &mut T) -> bool {
        if self.panstart_fired {
            return false;
        }
        self.panstart_fired = true;
        target.dispatch(PanEvent::PanStart);
        true
    }

    /// Fire `panend` if `panstart` fired, and reset for the next gesture.
    ///
    /// Returns `true` if the notification was dispatched.
    pub fn pan_end<T: PanTarget>(&mut self, target: &mut T) -> bool {
        if !self.panstart_fired {
            return false;
        }
        self.panstart_fired = false;
        target.dispatch(PanEvent::PanEnd);
        true
    }
}
