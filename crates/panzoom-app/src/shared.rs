//! Shared engine handle for callback-driven hosts.
//!
//! Browser hosts call into the engine from event and frame callbacks, and the
//! engine calls back out synchronously when it dispatches `panstart` and
//! `panend`. A listener that reacts by disposing the engine would re-enter it
//! while it is still borrowed. [`SharedPanZoom`] records such a request and
//! carries it out as soon as the outer call returns.

use panzoom_core::{FrameHandle, FrameScheduler, InputEvent, PanTarget, PanZoom, Propagation};
use std::cell::{Cell, RefCell};

/// A [`PanZoom`] engine behind interior mutability, with deferred disposal.
///
/// Dropping the handle disposes the engine.
#[derive(Debug)]
pub struct SharedPanZoom<T: PanTarget, S: FrameScheduler> {
    engine: RefCell<PanZoom<T, S>>,
    dispose_requested: Cell<bool>,
}

impl<T: PanTarget, S: FrameScheduler> SharedPanZoom<T, S> {
    pub fn new(engine: PanZoom<T, S>) -> Self {
        Self {
            engine: RefCell::new(engine),
            dispose_requested: Cell::new(false),
        }
    }

    /// Run `f` with exclusive access to the engine.
    ///
    /// Returns `None` without running `f` if the engine is already in use
    /// further up the call stack. A dispose requested while `f` ran is
    /// carried out before returning.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut PanZoom<T, S>) -> R) -> Option<R> {
        let result = match self.engine.try_borrow_mut() {
            Ok(mut engine) => f(&mut engine),
            Err(_) => return None,
        };
        self.flush();
        Some(result)
    }

    /// Read engine state. `None` while the engine is in use.
    pub fn inspect<R>(&self, f: impl FnOnce(&PanZoom<T, S>) -> R) -> Option<R> {
        self.engine.try_borrow().ok().map(|engine| f(&engine))
    }

    /// Feed one input event. `None` if the engine was busy.
    pub fn handle(&self, event: &InputEvent) -> Option<Propagation> {
        self.with_engine(|engine| engine.handle(event))
    }

    /// Run a scheduled frame. `None` if the engine was busy.
    pub fn on_frame(&self, handle: FrameHandle) -> Option<bool> {
        self.with_engine(|engine| engine.on_frame(handle))
    }

    /// Dispose the engine now, or right after the engine call in progress.
    ///
    /// Returns `true` if disposal happened immediately.
    pub fn dispose(&self) -> bool {
        match self.engine.try_borrow_mut() {
            Ok(mut engine) => {
                engine.dispose();
                true
            }
            Err(_) => {
                log::debug!("panzoom: dispose deferred until the current event returns");
                self.dispose_requested.set(true);
                false
            }
        }
    }

    /// Whether a deferred dispose is waiting.
    pub fn is_dispose_pending(&self) -> bool {
        self.dispose_requested.get()
    }

    fn flush(&self) {
        while self.dispose_requested.take() {
            self.dispose();
        }
    }
}

impl<T: PanTarget, S: FrameScheduler> Drop for SharedPanZoom<T, S> {
    fn drop(&mut self) {
        self.engine.get_mut().dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use panzoom_core::{
        ListenerScope, ManualScheduler, MemoryTarget, MouseButton, MouseEvent, PanEvent,
        TargetKind, Transform,
    };
    use std::rc::{Rc, Weak};

    type Shared = SharedPanZoom<HookTarget, ManualScheduler>;

    /// Target that reports into shared state and can dispose its own engine
    /// from inside a notification.
    #[derive(Debug)]
    struct HookTarget {
        inner: MemoryTarget,
        events: Rc<RefCell<Vec<PanEvent>>>,
        selection: Rc<Cell<bool>>,
        dispose_on: Option<PanEvent>,
        engine: Rc<RefCell<Weak<Shared>>>,
    }

    impl PanTarget for HookTarget {
        fn kind(&self) -> TargetKind {
            self.inner.kind()
        }

        fn transform(&self) -> Transform {
            self.inner.transform()
        }

        fn set_transform(&mut self, transform: Transform) {
            self.inner.set_transform(transform);
        }

        fn dispatch(&mut self, event: PanEvent) {
            self.events.borrow_mut().push(event);
            if self.dispose_on == Some(event) {
                if let Some(engine) = self.engine.borrow().upgrade() {
                    assert!(!engine.dispose());
                }
            }
        }

        fn set_native_selection(&mut self, enabled: bool) {
            self.selection.set(enabled);
        }
    }

    struct Fixture {
        shared: Rc<Shared>,
        events: Rc<RefCell<Vec<PanEvent>>>,
        selection: Rc<Cell<bool>>,
    }

    fn fixture(dispose_on: Option<PanEvent>) -> Fixture {
        let events = Rc::new(RefCell::new(Vec::new()));
        let selection = Rc::new(Cell::new(true));
        let slot = Rc::new(RefCell::new(Weak::new()));
        let target = HookTarget {
            inner: MemoryTarget::default(),
            events: events.clone(),
            selection: selection.clone(),
            dispose_on,
            engine: slot.clone(),
        };
        let engine = PanZoom::with_defaults(target, ManualScheduler::new()).unwrap();
        let shared = Rc::new(SharedPanZoom::new(engine));
        *slot.borrow_mut() = Rc::downgrade(&shared);
        Fixture {
            shared,
            events,
            selection,
        }
    }

    fn mouse(shared: &Shared, event: MouseEvent) {
        assert!(shared.handle(&InputEvent::Mouse(event)).is_some());
    }

    fn down(shared: &Shared, x: f64, y: f64) {
        mouse(
            shared,
            MouseEvent::Down {
                position: Point::new(x, y),
                button: MouseButton::Left,
            },
        );
    }

    fn mv(shared: &Shared, x: f64, y: f64) {
        mouse(
            shared,
            MouseEvent::Move {
                position: Point::new(x, y),
            },
        );
    }

    #[test]
    fn test_dispose_from_panstart_listener_runs_after_event() {
        let f = fixture(Some(PanEvent::PanStart));
        down(&f.shared, 0.0, 0.0);
        mv(&f.shared, 5.0, 0.0);

        assert!(!f.shared.is_dispose_pending());
        assert_eq!(f.shared.inspect(|e| e.is_disposed()), Some(true));
        assert_eq!(f.shared.inspect(|e| e.listener_count()), Some(0));
        assert_eq!(*f.events.borrow(), vec![PanEvent::PanStart, PanEvent::PanEnd]);
        assert!(f.selection.get());

        mv(&f.shared, 50.0, 0.0);
        assert_eq!(
            f.shared.inspect(|e| e.transform().translation.x),
            Some(5.0)
        );
    }

    #[test]
    fn test_dispose_from_panend_listener_stops_decay() {
        let f = fixture(Some(PanEvent::PanEnd));
        down(&f.shared, 0.0, 0.0);
        mv(&f.shared, 20.0, 0.0);
        mouse(
            &f.shared,
            MouseEvent::Up {
                position: Point::new(20.0, 0.0),
            },
        );

        assert_eq!(f.shared.inspect(|e| e.is_disposed()), Some(true));
        assert_eq!(f.shared.inspect(|e| e.is_decaying()), Some(false));
        assert_eq!(f.shared.inspect(|e| e.scheduler().pending()), Some(0));
        assert_eq!(
            f.shared
                .inspect(|e| e.is_listening(ListenerScope::Element)),
            Some(false)
        );
    }

    #[test]
    fn test_busy_engine_refuses_reentry() {
        let f = fixture(None);
        let nested = f.shared.with_engine(|_| f.shared.with_engine(|_| ()));
        assert_eq!(nested, Some(None));
        assert_eq!(f.shared.inspect(|e| e.is_disposed()), Some(false));
    }

    #[test]
    fn test_drop_disposes_mid_drag() {
        let f = fixture(None);
        down(&f.shared, 0.0, 0.0);
        mv(&f.shared, 3.0, 4.0);
        assert!(!f.selection.get());

        drop(f.shared);

        assert_eq!(*f.events.borrow(), vec![PanEvent::PanStart, PanEvent::PanEnd]);
        assert!(f.selection.get());
    }
}
