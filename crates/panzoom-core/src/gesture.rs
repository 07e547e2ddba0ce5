//! Gesture state machine: turns mouse, touch and wheel input into pan/zoom
//! actions.
//!
//! The recognizer is pure: it only tracks interaction state and returns the
//! [`GestureAction`]s the engine must carry out, in order. This keeps every
//! transition testable without a host.
//!
//! ```text
//!            mouse down (left)              mouse up
//!   Idle ────────────────────▶ MouseDragging ─────────▶ Idle
//!    │  ▲                          │
//!    │  │ last finger lifted       │ touch start (touch wins)
//!    │  │                          ▼
//!    └──┴──── touch start ───▶ TouchDragging ◀──────┐ one finger left
//!                                   │ second finger  │
//!                                   ▼                │
//!                               PinchZooming ────────┘
//! ```
//!
//! Wheel ticks bypass the state machine entirely.

use crate::config::PanZoomConfig;
use crate::input::{
    MouseButton, MouseEvent, Propagation, TouchEvent, TouchPhase, WheelEvent, midpoint,
    squared_distance,
};
use kurbo::{Point, Vec2};

/// Current interaction. Mouse and touch states are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    MouseDragging,
    TouchDragging {
        fingers: usize,
    },
    PinchZooming,
}

impl InteractionState {
    /// Whether a touch gesture owns the interaction.
    pub fn is_touch(self) -> bool {
        matches!(self, Self::TouchDragging { .. } | Self::PinchZooming)
    }
}

/// Listener groups the engine attaches to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerScope {
    /// Press, touch start and wheel listeners on the target's owner.
    Element,
    /// Document-wide mouse move/up, live during a mouse drag.
    DocumentMouse,
    /// Document-wide touch move/end/cancel, live during a touch gesture.
    DocumentTouch,
}

/// Side effect requested by the recognizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureAction {
    /// A new gesture pre-empts any kinetic decay.
    CancelKinetic,
    /// Start listening on a scope.
    Attach(ListenerScope),
    /// Stop listening on a scope.
    Detach(ListenerScope),
    /// Disable native text selection / drag-start.
    SuppressSelection,
    /// Restore native text selection / drag-start.
    RestoreSelection,
    /// Movement detected; fires `panstart` once per gesture.
    Moved,
    /// Pan by a client-space delta.
    Pan(Vec2),
    /// Zoom about a client-space pivot.
    Zoom { pivot: Point, multiplier: f64 },
    /// Drop recorded velocity (the pointer came to rest or a pinch
    /// interrupted the pan).
    ResetVelocity,
    /// The gesture fully ended; fires `panend` if `panstart` fired.
    End,
}

/// Result of feeding one event to the recognizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureResponse {
    pub actions: Vec<GestureAction>,
    pub propagation: Propagation,
}

impl GestureResponse {
    fn ignored() -> Self {
        Self::default()
    }

    fn stop(actions: Vec<GestureAction>) -> Self {
        Self {
            actions,
            propagation: Propagation::Stop,
        }
    }

    fn pass(actions: Vec<GestureAction>) -> Self {
        Self {
            actions,
            propagation: Propagation::Continue,
        }
    }
}

/// Interaction state plus the last pointer and pinch samples.
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    state: InteractionState,
    /// Last primary-pointer position (mouse, first finger, or pinch midpoint).
    pointer: Point,
    /// Squared distance between the two fingers at the previous pinch event.
    pinch: f64,
    config: PanZoomConfig,
}

impl GestureRecognizer {
    /// Create an idle recognizer.
    pub fn new(config: PanZoomConfig) -> Self {
        Self {
            state: InteractionState::Idle,
            pointer: Point::ZERO,
            pinch: 0.0,
            config,
        }
    }

    /// Current interaction state.
    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Handle a mouse event.
    pub fn on_mouse(&mut self, event: &MouseEvent) -> GestureResponse {
        match *event {
            MouseEvent::Down { position, button } => self.mouse_down(position, button),
            MouseEvent::Move { position } => self.mouse_move(position),
            MouseEvent::Up { .. } => self.mouse_up(),
        }
    }

    /// Handle a touch event.
    pub fn on_touch(&mut self, event: &TouchEvent) -> GestureResponse {
        match event.phase {
            TouchPhase::Start => self.touch_start(&event.touches),
            TouchPhase::Move => self.touch_move(&event.touches),
            TouchPhase::End | TouchPhase::Cancel => self.touch_end(&event.touches),
        }
    }

    /// Handle a wheel tick.
    pub fn on_wheel(&mut self, event: &WheelEvent) -> GestureResponse {
        let multiplier = self.config.scale_multiplier(event.delta_y);
        if multiplier == 1.0 {
            return GestureResponse::pass(vec![GestureAction::CancelKinetic]);
        }
        GestureResponse::stop(vec![
            GestureAction::CancelKinetic,
            GestureAction::Zoom {
                pivot: event.position,
                multiplier,
            },
        ])
    }

    /// Abandon any interaction, returning the cleanup the engine must do
    /// besides ending the gesture.
    pub fn reset(&mut self) -> Vec<GestureAction> {
        let actions = match self.state {
            InteractionState::MouseDragging => vec![GestureAction::RestoreSelection],
            _ => Vec::new(),
        };
        self.state = InteractionState::Idle;
        actions
    }

    fn mouse_down(&mut self, position: Point, button: MouseButton) -> GestureResponse {
        if self.state.is_touch() {
            // Synthesized from the touch that is already being handled.
            return GestureResponse::stop(Vec::new());
        }
        if button != MouseButton::Left {
            return GestureResponse::ignored();
        }

        self.pointer = position;
        if self.state == InteractionState::MouseDragging {
            return GestureResponse::stop(Vec::new());
        }

        log::debug!("gesture: mouse drag at ({}, {})", position.x, position.y);
        self.state = InteractionState::MouseDragging;
        GestureResponse::stop(vec![
            GestureAction::CancelKinetic,
            GestureAction::Attach(ListenerScope::DocumentMouse),
            GestureAction::SuppressSelection,
        ])
    }

    fn mouse_move(&mut self, position: Point) -> GestureResponse {
        if self.state != InteractionState::MouseDragging {
            return GestureResponse::ignored();
        }
        GestureResponse::pass(self.pan_to_pointer(position))
    }

    fn mouse_up(&mut self) -> GestureResponse {
        if self.state != InteractionState::MouseDragging {
            return GestureResponse::ignored();
        }
        log::debug!("gesture: mouse drag released");
        self.state = InteractionState::Idle;
        GestureResponse::pass(vec![
            GestureAction::RestoreSelection,
            GestureAction::End,
            GestureAction::Detach(ListenerScope::DocumentMouse),
        ])
    }

    fn touch_start(&mut self, touches: &[Point]) -> GestureResponse {
        let mut actions = Vec::new();
        match self.state {
            InteractionState::Idle => {
                if touches.is_empty() || touches.len() > 2 {
                    return GestureResponse::ignored();
                }
                actions.push(GestureAction::CancelKinetic);
                actions.push(GestureAction::Attach(ListenerScope::DocumentTouch));
            }
            InteractionState::MouseDragging => {
                if touches.is_empty() || touches.len() > 2 {
                    return GestureResponse::ignored();
                }
                log::debug!("gesture: touch supersedes mouse drag");
                actions.push(GestureAction::RestoreSelection);
                actions.push(GestureAction::Detach(ListenerScope::DocumentMouse));
                actions.push(GestureAction::Attach(ListenerScope::DocumentTouch));
            }
            InteractionState::TouchDragging { .. } | InteractionState::PinchZooming => {}
        }

        match touches {
            [first] => {
                self.pointer = *first;
                self.state = InteractionState::TouchDragging { fingers: 1 };
                GestureResponse::stop(actions)
            }
            [first, second] => {
                self.begin_pinch(*first, *second, &mut actions);
                GestureResponse::stop(actions)
            }
            _ => GestureResponse::stop(actions),
        }
    }

    fn touch_move(&mut self, touches: &[Point]) -> GestureResponse {
        if !self.state.is_touch() {
            return GestureResponse::ignored();
        }
        match touches {
            [finger] => {
                if self.state == InteractionState::PinchZooming {
                    // Missed the lift; rebaseline without jumping.
                    self.pointer = *finger;
                    self.state = InteractionState::TouchDragging { fingers: 1 };
                    return GestureResponse::stop(Vec::new());
                }
                GestureResponse::stop(self.pan_to_pointer(*finger))
            }
            [first, second] => {
                let mut actions = Vec::new();
                if self.state != InteractionState::PinchZooming {
                    self.begin_pinch(*first, *second, &mut actions);
                    return GestureResponse::stop(actions);
                }

                let current = squared_distance(*first, *second);
                let multiplier = self.config.scale_multiplier(current - self.pinch);
                self.pinch = current;
                self.pointer = midpoint(*first, *second);

                if multiplier != 1.0 {
                    actions.push(GestureAction::Moved);
                    actions.push(GestureAction::Zoom {
                        pivot: self.pointer,
                        multiplier,
                    });
                }
                GestureResponse::stop(actions)
            }
            _ => GestureResponse::ignored(),
        }
    }

    fn touch_end(&mut self, touches: &[Point]) -> GestureResponse {
        if !self.state.is_touch() {
            return GestureResponse::ignored();
        }
        match touches {
            [] => {
                log::debug!("gesture: all fingers lifted");
                self.state = InteractionState::Idle;
                GestureResponse::pass(vec![
                    GestureAction::End,
                    GestureAction::Detach(ListenerScope::DocumentTouch),
                ])
            }
            [finger] => {
                self.pointer = *finger;
                self.state = InteractionState::TouchDragging { fingers: 1 };
                GestureResponse::ignored()
            }
            [first, second] => {
                let mut actions = Vec::new();
                self.begin_pinch(*first, *second, &mut actions);
                GestureResponse::pass(actions)
            }
            _ => GestureResponse::ignored(),
        }
    }

    fn begin_pinch(&mut self, first: Point, second: Point, actions: &mut Vec<GestureAction>) {
        log::debug!("gesture: pinch started");
        self.pinch = squared_distance(first, second);
        self.pointer = midpoint(first, second);
        self.state = InteractionState::PinchZooming;
        actions.push(GestureAction::ResetVelocity);
    }

    fn pan_to_pointer(&mut self, position: Point) -> Vec<GestureAction> {
        let delta = position - self.pointer;
        self.pointer = position;
        if delta == Vec2::ZERO {
            // Pointer at rest: not movement, but whatever speed it had is gone.
            return vec![GestureAction::ResetVelocity];
        }
        log::trace!("gesture: pan ({}, {})", delta.x, delta.y);
        vec![GestureAction::Moved, GestureAction::Pan(delta)]
    }
}
