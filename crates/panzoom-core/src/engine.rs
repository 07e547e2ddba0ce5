//! The pan/zoom engine: wires the gesture recognizer to the target, the
//! kinetic simulator and the notifier.

use crate::config::PanZoomConfig;
use crate::error::{PanZoomError, PanZoomResult};
use crate::gesture::{GestureAction, GestureRecognizer, InteractionState, ListenerScope};
use crate::host::{FrameHandle, FrameScheduler, PanTarget, TargetKind};
use crate::input::{InputEvent, MouseEvent, Propagation, TouchEvent, TouchPhase, WheelEvent};
use crate::kinetic::Kinetic;
use crate::notify::Notifier;
use crate::transform::Transform;
use std::collections::HashSet;

/// Pan/zoom controller attached to one target.
///
/// Each instance owns its whole session state; several engines can drive
/// different targets side by side.
#[derive(Debug)]
pub struct PanZoom<T: PanTarget, S: FrameScheduler> {
    target: T,
    scheduler: S,
    config: PanZoomConfig,
    recognizer: GestureRecognizer,
    kinetic: Kinetic,
    notifier: Notifier,
    /// Listener scopes currently attached.
    listeners: HashSet<ListenerScope>,
    /// Whether native selection was turned off at mouse-down.
    selection_suppressed: bool,
    disposed: bool,
}

impl<T: PanTarget, S: FrameScheduler> PanZoom<T, S> {
    /// Attach a new engine to `target`.
    ///
    /// Fails without attaching anything if the target is not a graphic
    /// element, is the coordinate-space root, or the configuration is invalid.
    pub fn new(target: T, scheduler: S, config: PanZoomConfig) -> PanZoomResult<Self> {
        match target.kind() {
            TargetKind::Graphic => {}
            TargetKind::Root => return Err(PanZoomError::UnsupportedTarget),
            TargetKind::Other => {
                return Err(PanZoomError::Configuration(
                    "a vector graphic element is required for panzoom to work".to_string(),
                ));
            }
        }
        config.validate()?;

        let mut listeners = HashSet::new();
        listeners.insert(ListenerScope::Element);
        log::debug!("panzoom: attached ({config:?})");

        Ok(Self {
            target,
            scheduler,
            recognizer: GestureRecognizer::new(config.clone()),
            kinetic: Kinetic::new(&config),
            notifier: Notifier::new(),
            config,
            listeners,
            selection_suppressed: false,
            disposed: false,
        })
    }

    /// Attach with the default configuration.
    pub fn with_defaults(target: T, scheduler: S) -> PanZoomResult<Self> {
        Self::new(target, scheduler, PanZoomConfig::default())
    }

    /// Feed one input event.
    ///
    /// Events for a listener scope that is not attached are dropped, exactly as
    /// if no listener had been registered for them.
    pub fn handle(&mut self, event: &InputEvent) -> Propagation {
        let scope = Self::scope_of(event);
        if !self.is_listening(scope) {
            return Propagation::Continue;
        }

        let response = match event {
            InputEvent::Mouse(e) => self.recognizer.on_mouse(e),
            InputEvent::Touch(e) => self.recognizer.on_touch(e),
            InputEvent::Wheel(e) => self.recognizer.on_wheel(e),
        };
        for action in response.actions {
            self.apply(action);
        }
        response.propagation
    }

    /// Feed a mouse event.
    pub fn handle_mouse(&mut self, event: MouseEvent) -> Propagation {
        self.handle(&InputEvent::Mouse(event))
    }

    /// Feed a touch event.
    pub fn handle_touch(&mut self, event: TouchEvent) -> Propagation {
        self.handle(&InputEvent::Touch(event))
    }

    /// Feed a wheel tick.
    pub fn handle_wheel(&mut self, event: WheelEvent) -> Propagation {
        self.handle(&InputEvent::Wheel(event))
    }

    /// Run a scheduled animation frame. Returns `true` if another frame was
    /// requested.
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        if self.disposed {
            return false;
        }
        self.kinetic.step(handle, &mut self.target, &mut self.scheduler)
    }

    /// Detach from the target.
    ///
    /// Cancels kinetic decay, drops every listener, restores native selection
    /// and fires a final `panend` if a gesture was in flight. Calling it again
    /// does nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        self.kinetic.cancel(&mut self.scheduler);
        for action in self.recognizer.reset() {
            self.apply(action);
        }
        self.listeners.clear();
        self.notifier.pan_end(&mut self.target);
        log::debug!("panzoom: disposed");
    }

    /// The target being transformed.
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Mutable access to the target.
    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// The frame scheduler.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Mutable access to the frame scheduler.
    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// The target's current transform.
    pub fn transform(&self) -> Transform {
        self.target.transform()
    }

    /// Current interaction state.
    pub fn state(&self) -> InteractionState {
        self.recognizer.state()
    }

    /// Active configuration.
    pub fn config(&self) -> &PanZoomConfig {
        &self.config
    }

    /// Whether a listener scope is attached.
    pub fn is_listening(&self, scope: ListenerScope) -> bool {
        self.listeners.contains(&scope)
    }

    /// Number of attached listener scopes.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Whether kinetic decay is running.
    pub fn is_decaying(&self) -> bool {
        self.kinetic.is_running()
    }

    /// Whether [`PanZoom::dispose`] was called.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn scope_of(event: &InputEvent) -> ListenerScope {
        match event {
            InputEvent::Mouse(MouseEvent::Down { .. }) => ListenerScope::Element,
            InputEvent::Mouse(_) => ListenerScope::DocumentMouse,
            InputEvent::Touch(TouchEvent {
                phase: TouchPhase::Start,
                ..
            }) => ListenerScope::Element,
            InputEvent::Touch(_) => ListenerScope::DocumentTouch,
            InputEvent::Wheel(_) => ListenerScope::Element,
        }
    }

    fn apply(&mut self, action: GestureAction) {
        match action {
            GestureAction::CancelKinetic => self.kinetic.cancel(&mut self.scheduler),
            GestureAction::Attach(scope) => {
                self.listeners.insert(scope);
            }
            GestureAction::Detach(scope) => {
                self.listeners.remove(&scope);
            }
            GestureAction::SuppressSelection => {
                if !self.selection_suppressed {
                    self.selection_suppressed = true;
                    self.target.set_native_selection(false);
                }
            }
            GestureAction::RestoreSelection => {
                if self.selection_suppressed {
                    self.selection_suppressed = false;
                    self.target.set_native_selection(true);
                }
            }
            GestureAction::Moved => {
                if self.notifier.pan_start(&mut self.target) {
                    self.kinetic.start();
                }
            }
            GestureAction::Pan(delta) => {
                let delta = self.target.client_delta_to_parent(delta);
                let mut transform = self.target.transform();
                transform.pan_by(delta);
                self.target.set_transform(transform);
                self.kinetic.track(delta, self.scheduler.now());
            }
            GestureAction::Zoom { pivot, multiplier } => {
                let pivot = self.target.client_to_parent(pivot);
                let mut transform = self.target.transform();
                if transform.zoom_at(pivot, multiplier) {
                    self.target.set_transform(transform);
                }
            }
            GestureAction::ResetVelocity => self.kinetic.clear_samples(),
            GestureAction::End => {
                if self.notifier.panstart_fired() {
                    self.kinetic.stop(&mut self.scheduler);
                }
                self.notifier.pan_end(&mut self.target);
            }
        }
    }
}
