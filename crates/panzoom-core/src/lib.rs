//! Panzoom Core Library
//!
//! Platform-agnostic pan/zoom engine for 2D vector graphics: mouse, touch and
//! wheel input become translation and uniform-scale updates on a target
//! element, with kinetic panning after release.
//!
//! ```
//! use kurbo::Point;
//! use panzoom_core::{ManualScheduler, MemoryTarget, MouseButton, MouseEvent, PanZoom};
//!
//! let mut panzoom = PanZoom::with_defaults(MemoryTarget::default(), ManualScheduler::new())?;
//! panzoom.handle_mouse(MouseEvent::Down { position: Point::new(0.0, 0.0), button: MouseButton::Left });
//! panzoom.handle_mouse(MouseEvent::Move { position: Point::new(12.0, 5.0) });
//! panzoom.handle_mouse(MouseEvent::Up { position: Point::new(12.0, 5.0) });
//! assert_eq!(panzoom.transform().translation, kurbo::Vec2::new(12.0, 5.0));
//!
//! // Inertia keeps going for as long as the host delivers frames.
//! while let Some(frame) = panzoom.scheduler_mut().pop_due() {
//!     panzoom.on_frame(frame);
//! }
//! panzoom.dispose();
//! # Ok::<(), panzoom_core::PanZoomError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod host;
pub mod input;
pub mod kinetic;
pub mod notify;
pub mod transform;

pub use config::PanZoomConfig;
pub use engine::PanZoom;
pub use error::{PanZoomError, PanZoomResult};
pub use gesture::{GestureAction, GestureRecognizer, InteractionState, ListenerScope};
pub use host::{FrameHandle, FrameScheduler, ManualScheduler, MemoryTarget, PanTarget, TargetKind};
pub use input::{InputEvent, MouseButton, MouseEvent, Propagation, TouchEvent, TouchPhase, WheelEvent};
pub use kinetic::Kinetic;
pub use notify::{Notifier, PanEvent};
pub use transform::Transform;
