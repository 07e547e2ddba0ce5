//! Headless trace replay.
//!
//! A trace is a JSON document listing input steps. Replaying it drives a
//! [`PanZoom`] engine attached to an in-memory target, with frames advanced
//! only when the trace asks for them.
//!
//! ```json
//! {
//!   "config": { "damping": 0.9 },
//!   "steps": [
//!     { "op": "mouse_down", "x": 0, "y": 0 },
//!     { "op": "mouse_move", "x": 10, "y": 0 },
//!     { "op": "wait", "ms": 20 },
//!     { "op": "mouse_up", "x": 10, "y": 0 },
//!     { "op": "frames" },
//!     { "op": "wheel", "x": 50, "y": 50, "delta_y": -1 }
//!   ]
//! }
//! ```

use kurbo::Point;
use panzoom_core::{
    InputEvent, ManualScheduler, MemoryTarget, MouseButton, MouseEvent, PanEvent, PanZoom,
    PanZoomConfig, PanZoomError, TargetKind, TouchEvent, TouchPhase, Transform, WheelEvent,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on frames run by a single open-ended `frames` step.
pub const MAX_FRAMES_PER_STEP: usize = 10_000;

/// Replay errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Engine error: {0}")]
    Engine(#[from] PanZoomError),
}

/// Result type for replay operations.
pub type ReplayResult<T> = Result<T, ReplayError>;

fn default_button() -> MouseButton {
    MouseButton::Left
}

/// One step of a trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TraceStep {
    MouseDown {
        x: f64,
        y: f64,
        #[serde(default = "default_button")]
        button: MouseButton,
    },
    MouseMove {
        x: f64,
        y: f64,
    },
    MouseUp {
        x: f64,
        y: f64,
    },
    Touch {
        phase: TouchPhase,
        #[serde(default)]
        touches: Vec<[f64; 2]>,
    },
    Wheel {
        x: f64,
        y: f64,
        delta_y: f64,
    },
    /// Let time pass on the scheduler clock without any input.
    Wait {
        ms: u64,
    },
    /// Run `count` frames, or until kinetic decay comes to rest.
    Frames {
        #[serde(default)]
        count: Option<usize>,
    },
    Dispose,
}

impl TraceStep {
    /// The input event this step feeds, if any.
    pub fn to_input(&self) -> Option<InputEvent> {
        let event = match self {
            TraceStep::MouseDown { x, y, button } => InputEvent::Mouse(MouseEvent::Down {
                position: Point::new(*x, *y),
                button: *button,
            }),
            TraceStep::MouseMove { x, y } => InputEvent::Mouse(MouseEvent::Move {
                position: Point::new(*x, *y),
            }),
            TraceStep::MouseUp { x, y } => InputEvent::Mouse(MouseEvent::Up {
                position: Point::new(*x, *y),
            }),
            TraceStep::Touch { phase, touches } => InputEvent::Touch(TouchEvent::new(
                *phase,
                touches
                    .iter()
                    .map(|[x, y]| Point::new(*x, *y))
                    .collect::<Vec<_>>(),
            )),
            TraceStep::Wheel { x, y, delta_y } => InputEvent::Wheel(WheelEvent {
                position: Point::new(*x, *y),
                delta_y: *delta_y,
            }),
            TraceStep::Wait { .. } | TraceStep::Frames { .. } | TraceStep::Dispose => {
                return None;
            }
        };
        Some(event)
    }
}

/// A recorded input trace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub config: PanZoomConfig,
    /// Transform of the target before the first step.
    #[serde(default)]
    pub initial: Option<Transform>,
    pub steps: Vec<TraceStep>,
}

/// Outcome of a replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub transform: Transform,
    pub svg_matrix: String,
    pub events: Vec<PanEvent>,
    /// Number of transform writes.
    pub mutations: usize,
    /// Frames that were run.
    pub frames: usize,
    /// Whether decay was still running at the end of the trace.
    pub decaying: bool,
    pub disposed: bool,
}

/// Load a trace from a JSON file.
pub fn load_trace(path: impl AsRef<Path>) -> ReplayResult<Trace> {
    let text = std::fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&text)?)
}

/// Replay a trace from a JSON file.
pub fn replay_file(path: impl AsRef<Path>) -> ReplayResult<ReplayReport> {
    let trace = load_trace(path)?;
    replay(&trace)
}

/// Replay a trace against a fresh in-memory target.
pub fn replay(trace: &Trace) -> ReplayResult<ReplayReport> {
    let target = MemoryTarget::with_transform(
        TargetKind::Graphic,
        trace.initial.unwrap_or_default(),
    );
    let mut engine = PanZoom::new(target, ManualScheduler::new(), trace.config.clone())?;
    let mut frames = 0;

    for (index, step) in trace.steps.iter().enumerate() {
        log::trace!("replay: step {index}: {step:?}");
        match step {
            TraceStep::Frames { count } => {
                let limit = count.unwrap_or(MAX_FRAMES_PER_STEP);
                frames += run_frames(&mut engine, limit);
                if count.is_none() && engine.is_decaying() {
                    log::warn!("replay: decay still running after {limit} frames");
                }
            }
            TraceStep::Wait { ms } => {
                engine.scheduler_mut().advance(Duration::from_millis(*ms));
            }
            TraceStep::Dispose => engine.dispose(),
            _ => {
                if let Some(event) = step.to_input() {
                    engine.handle(&event);
                }
            }
        }
    }

    let transform = engine.transform();
    Ok(ReplayReport {
        transform,
        svg_matrix: transform.to_svg_matrix(),
        events: engine.target().events.clone(),
        mutations: engine.target().history.len(),
        frames,
        decaying: engine.is_decaying(),
        disposed: engine.is_disposed(),
    })
}

fn run_frames(engine: &mut PanZoom<MemoryTarget, ManualScheduler>, limit: usize) -> usize {
    let mut frames = 0;
    while frames < limit {
        let Some(handle) = engine.scheduler_mut().pop_due() else {
            break;
        };
        engine.on_frame(handle);
        frames += 1;
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(json: &str) -> Trace {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_drag_and_release_trace() {
        let trace = parse(
            r#"{
                "config": { "min_speed": 1e-9 },
                "steps": [
                    { "op": "mouse_down", "x": 0, "y": 0 },
                    { "op": "mouse_move", "x": 2, "y": 0 },
                    { "op": "mouse_move", "x": 4, "y": 0 },
                    { "op": "mouse_move", "x": 6, "y": 0 },
                    { "op": "mouse_move", "x": 8, "y": 0 },
                    { "op": "mouse_move", "x": 10, "y": 0 },
                    { "op": "mouse_up", "x": 10, "y": 0 },
                    { "op": "frames" }
                ]
            }"#,
        );
        let report = replay(&trace).unwrap();

        assert!((report.transform.translation.x - 30.0).abs() < 1e-6);
        assert_eq!(report.events, vec![PanEvent::PanStart, PanEvent::PanEnd]);
        assert!(!report.decaying);
        assert!(report.frames > 100);
    }

    #[test]
    fn test_frame_count_limits_decay() {
        let trace = parse(
            r#"{ "steps": [
                { "op": "mouse_down", "x": 0, "y": 0 },
                { "op": "mouse_move", "x": 5, "y": 0 },
                { "op": "mouse_up", "x": 5, "y": 0 },
                { "op": "frames", "count": 2 }
            ] }"#,
        );
        let report = replay(&trace).unwrap();

        assert_eq!(report.frames, 2);
        assert!(report.decaying);
        assert!((report.transform.translation.x - (5.0 + 5.0 + 4.5)).abs() < 1e-9);
    }

    #[test]
    fn test_wait_before_release_stops_the_throw() {
        let trace = parse(
            r#"{ "steps": [
                { "op": "mouse_down", "x": 0, "y": 0 },
                { "op": "mouse_move", "x": 40, "y": 0 },
                { "op": "wait", "ms": 500 },
                { "op": "mouse_up", "x": 40, "y": 0 },
                { "op": "frames" }
            ] }"#,
        );
        let report = replay(&trace).unwrap();

        assert_eq!(report.frames, 0);
        assert_eq!(report.svg_matrix, "matrix(1 0 0 1 40 0)");
        assert_eq!(report.events, vec![PanEvent::PanStart, PanEvent::PanEnd]);
    }

    #[test]
    fn test_pinch_and_wheel_trace() {
        let trace = parse(
            r#"{ "steps": [
                { "op": "touch", "phase": "start", "touches": [[100, 100]] },
                { "op": "touch", "phase": "start", "touches": [[100, 100], [200, 100]] },
                { "op": "touch", "phase": "move", "touches": [[90, 100], [210, 100]] },
                { "op": "touch", "phase": "end" },
                { "op": "wheel", "x": 150, "y": 100, "delta_y": -3 }
            ] }"#,
        );
        let report = replay(&trace).unwrap();

        assert!((report.transform.scale - 0.935 * 1.065).abs() < 1e-12);
        assert_eq!(report.events, vec![PanEvent::PanStart, PanEvent::PanEnd]);
    }

    #[test]
    fn test_dispose_mid_drag_trace() {
        let trace = parse(
            r#"{ "steps": [
                { "op": "mouse_down", "x": 0, "y": 0 },
                { "op": "mouse_move", "x": 3, "y": 4 },
                { "op": "dispose" },
                { "op": "mouse_move", "x": 30, "y": 40 },
                { "op": "dispose" }
            ] }"#,
        );
        let report = replay(&trace).unwrap();

        assert!(report.disposed);
        assert_eq!(report.events, vec![PanEvent::PanStart, PanEvent::PanEnd]);
        assert_eq!(report.svg_matrix, "matrix(1 0 0 1 3 4)");
        assert_eq!(report.mutations, 1);
    }

    #[test]
    fn test_initial_transform() {
        let trace = parse(
            r#"{
                "initial": { "translation": { "x": 10, "y": 20 }, "scale": 2 },
                "steps": [ { "op": "mouse_down", "x": 0, "y": 0, "button": "right" },
                           { "op": "mouse_move", "x": 5, "y": 5 } ]
            }"#,
        );
        let report = replay(&trace).unwrap();
        assert_eq!(report.svg_matrix, "matrix(2 0 0 2 10 20)");
        assert!(report.events.is_empty());
    }

    #[test]
    fn test_invalid_config_is_engine_error() {
        let trace = parse(r#"{ "config": { "zoom_speed": 2.0 }, "steps": [] }"#);
        assert!(matches!(
            replay(&trace),
            Err(ReplayError::Engine(PanZoomError::Configuration(_)))
        ));
    }

    #[test]
    fn test_replay_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "steps": [ {{ "op": "wheel", "x": 0, "y": 0, "delta_y": 1 }} ] }}"#
        )
        .unwrap();

        let report = replay_file(file.path()).unwrap();
        assert!((report.transform.scale - 0.935).abs() < 1e-12);
    }

    #[test]
    fn test_replay_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            replay_file(dir.path().join("missing.json")),
            Err(ReplayError::Io(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(replay_file(file.path()), Err(ReplayError::Parse(_))));
    }
}
