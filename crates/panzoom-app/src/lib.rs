//! Panzoom Application
//!
//! Hosts for the pan/zoom engine: a headless trace replayer for native
//! builds, and a browser host binding the engine to an SVG element on WASM.

mod replay;
mod shared;

pub use replay::{
    MAX_FRAMES_PER_STEP, ReplayError, ReplayReport, ReplayResult, Trace, TraceStep, load_trace,
    replay, replay_file,
};
pub use shared::SharedPanZoom;

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{PanZoomHandle, create_pan_zoom};
