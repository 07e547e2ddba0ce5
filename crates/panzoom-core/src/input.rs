//! Raw input events fed to the engine by the host.
//!
//! Positions are client (viewport) coordinates. Wheel deltas are assumed to be
//! already normalized across hosts; only their sign matters.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Mouse event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MouseEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    Up {
        position: Point,
    },
}

/// Touch event phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// Touch event carrying every touch point still on the surface.
///
/// For `End`/`Cancel` the lifted point is no longer listed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub touches: Vec<Point>,
}

impl TouchEvent {
    /// Create a touch event.
    pub fn new(phase: TouchPhase, touches: impl Into<Vec<Point>>) -> Self {
        Self {
            phase,
            touches: touches.into(),
        }
    }

    /// Whether this event ends (part of) the touch interaction.
    pub fn is_release(&self) -> bool {
        matches!(self.phase, TouchPhase::End | TouchPhase::Cancel)
    }
}

/// A single normalized wheel tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WheelEvent {
    /// Cursor position.
    pub position: Point,
    /// Signed vertical delta; positive scrolls down (zoom out).
    pub delta_y: f64,
}

/// Any input the engine understands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    Mouse(MouseEvent),
    Touch(TouchEvent),
    Wheel(WheelEvent),
}

impl From<MouseEvent> for InputEvent {
    fn from(event: MouseEvent) -> Self {
        Self::Mouse(event)
    }
}

impl From<TouchEvent> for InputEvent {
    fn from(event: TouchEvent) -> Self {
        Self::Touch(event)
    }
}

impl From<WheelEvent> for InputEvent {
    fn from(event: WheelEvent) -> Self {
        Self::Wheel(event)
    }
}

/// What the host should do with the native event after the engine saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Propagation {
    /// Let the event continue with its default action.
    #[default]
    Continue,
    /// Stop propagation and prevent the default action.
    Stop,
}

impl Propagation {
    /// Whether the native event should be stopped.
    pub fn is_stop(self) -> bool {
        self == Propagation::Stop
    }
}

/// Squared distance between two touch points.
pub fn squared_distance(a: Point, b: Point) -> f64 {
    (a - b).hypot2()
}

/// Midpoint between two touch points.
pub fn midpoint(a: Point, b: Point) -> Point {
    a.midpoint(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_distance() {
        let a = Point::new(100.0, 100.0);
        let b = Point::new(200.0, 100.0);
        assert!((squared_distance(a, b) - 10_000.0).abs() < f64::EPSILON);
        assert!((squared_distance(Point::new(90.0, 100.0), Point::new(210.0, 100.0)) - 14_400.0).abs() < f64::EPSILON);
        assert!(squared_distance(a, a).abs() < f64::EPSILON);
    }

    #[test]
    fn test_midpoint() {
        let m = midpoint(Point::new(90.0, 100.0), Point::new(210.0, 120.0));
        assert_eq!(m, Point::new(150.0, 110.0));
    }

    #[test]
    fn test_touch_release_phases() {
        assert!(TouchEvent::new(TouchPhase::End, vec![]).is_release());
        assert!(TouchEvent::new(TouchPhase::Cancel, vec![]).is_release());
        assert!(!TouchEvent::new(TouchPhase::Move, vec![Point::ZERO]).is_release());
    }

    #[test]
    fn test_deserialize_tagged_events() {
        let json = r#"{ "type": "mouse", "kind": "down", "position": { "x": 1.0, "y": 2.0 }, "button": "left" }"#;
        let event: InputEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(
            event,
            InputEvent::Mouse(MouseEvent::Down { button: MouseButton::Left, .. })
        ));

        let json = r#"{ "type": "wheel", "position": { "x": 5.0, "y": 5.0 }, "delta_y": -3.0 }"#;
        let event: InputEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, InputEvent::Wheel(WheelEvent { delta_y, .. }) if delta_y < 0.0));
    }
}
