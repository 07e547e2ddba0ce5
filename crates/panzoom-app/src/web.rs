//! WebAssembly entry point: binds the engine to an SVG element in the page.
//!
//! ```js
//! import init, { createPanZoom } from "./panzoom_app.js";
//! await init();
//! const panzoom = createPanZoom(document.querySelector("#scene"));
//! document.querySelector("#scene").addEventListener("panend", () => { /* ... */ });
//! panzoom.dispose();
//! ```

use crate::shared::SharedPanZoom;
use kurbo::{Affine, Point, Vec2};
use panzoom_core::{
    FrameHandle, FrameScheduler, InputEvent, ListenerScope, MouseButton, MouseEvent, PanEvent,
    PanTarget, PanZoom, PanZoomConfig, PanZoomError, TargetKind, TouchEvent, TouchPhase, Transform,
    WheelEvent,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, CustomEvent, Document, Event, EventTarget, SvgGraphicsElement,
    SvgMatrix, SvgsvgElement, Window,
};

type WebEngine = SharedPanZoom<SvgTarget, RafScheduler>;

/// Initialize logging and panic reporting.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"panzoom: logger already initialized".into());
    }
}

/// The `<g>` (or other graphics element) being panned.
struct SvgTarget {
    element: SvgGraphicsElement,
    owner: Option<SvgsvgElement>,
    document: Document,
    transform: Transform,
    /// Selection handler in place before the drag started.
    prev_select_start: Option<js_sys::Function>,
    prev_drag_start: Option<js_sys::Function>,
    disabled: Closure<dyn FnMut(Event) -> bool>,
}

impl SvgTarget {
    /// Inverse of the parent's screen CTM: client pixels to parent units.
    fn client_to_parent_affine(&self) -> Option<Affine> {
        let parent = self
            .element
            .parent_element()
            .and_then(|p| p.dyn_into::<SvgGraphicsElement>().ok());
        parent
            .as_ref()
            .and_then(SvgGraphicsElement::get_screen_ctm)
            .or_else(|| self.owner.as_ref().and_then(|o| o.get_screen_ctm()))
            .map(|m| to_affine(&m).inverse())
    }

    fn new(element: SvgGraphicsElement, document: Document) -> Self {
        let owner = element.owner_svg_element();
        let transform = read_transform(&element);
        let disabled = Closure::wrap(Box::new(|event: Event| {
            event.stop_propagation();
            false
        }) as Box<dyn FnMut(Event) -> bool>);
        Self {
            element,
            owner,
            document,
            transform,
            prev_select_start: None,
            prev_drag_start: None,
            disabled,
        }
    }
}

fn read_transform(element: &SvgGraphicsElement) -> Transform {
    match element.transform().base_val().consolidate() {
        Ok(Some(transform)) => Transform::from_affine(to_affine(&transform.matrix())),
        Ok(None) => Transform::IDENTITY,
        Err(e) => {
            log::warn!("panzoom: could not read transform: {:?}", e);
            Transform::IDENTITY
        }
    }
}

fn to_affine(m: &SvgMatrix) -> Affine {
    Affine::new([
        f64::from(m.a()),
        f64::from(m.b()),
        f64::from(m.c()),
        f64::from(m.d()),
        f64::from(m.e()),
        f64::from(m.f()),
    ])
}

impl PanTarget for SvgTarget {
    fn kind(&self) -> TargetKind {
        if self.owner.is_some() {
            TargetKind::Graphic
        } else {
            TargetKind::Root
        }
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        if let Err(e) = self
            .element
            .set_attribute("transform", &transform.to_svg_matrix())
        {
            log::warn!("panzoom: could not write transform: {:?}", e);
        }
    }

    fn dispatch(&mut self, event: PanEvent) {
        let result = CustomEvent::new(event.name())
            .and_then(|custom| self.element.dispatch_event(&custom));
        if let Err(e) = result {
            log::warn!("panzoom: could not dispatch {}: {:?}", event.name(), e);
        }
    }

    fn set_native_selection(&mut self, enabled: bool) {
        if enabled {
            self.document
                .set_onselectstart(self.prev_select_start.take().as_ref());
            self.element
                .set_ondragstart(self.prev_drag_start.take().as_ref());
        } else {
            self.prev_select_start = self.document.onselectstart();
            self.prev_drag_start = self.element.ondragstart();
            let disabled: &js_sys::Function = self.disabled.as_ref().unchecked_ref();
            self.document.set_onselectstart(Some(disabled));
            self.element.set_ondragstart(Some(disabled));
        }
    }

    fn client_to_parent(&self, client: Point) -> Point {
        match self.client_to_parent_affine() {
            Some(inverse) => inverse * client,
            None => client,
        }
    }

    fn client_delta_to_parent(&self, delta: Vec2) -> Vec2 {
        match self.client_to_parent_affine() {
            Some(inverse) => inverse * delta.to_point() - inverse * Point::ZERO,
            None => delta,
        }
    }
}

/// `requestAnimationFrame` scheduler feeding frames back to the engine.
struct RafScheduler {
    window: Window,
    next_id: u64,
    pending: HashMap<FrameHandle, i32>,
    host: Rc<RefCell<Weak<Host>>>,
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        let host = self.host.borrow().clone();
        let callback = Closure::once_into_js(move |_timestamp: f64| {
            if let Some(host) = host.upgrade() {
                host.on_frame(handle);
            }
        });
        match self.window.request_animation_frame(callback.unchecked_ref()) {
            Ok(id) => {
                self.pending.insert(handle, id);
            }
            Err(e) => log::warn!("panzoom: requestAnimationFrame failed: {:?}", e),
        }
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Some(id) = self.pending.remove(&handle) {
            if let Err(e) = self.window.cancel_animation_frame(id) {
                log::warn!("panzoom: cancelAnimationFrame failed: {:?}", e);
            }
        }
    }
}

const ELEMENT_EVENTS: &[&str] = &["mousedown", "touchstart", "wheel"];
const MOUSE_DRAG_EVENTS: &[&str] = &["mousemove", "mouseup"];
const TOUCH_DRAG_EVENTS: &[&str] = &["touchmove", "touchend", "touchcancel"];

/// A DOM listener registration, removed from its target on detach.
struct Listener {
    target: EventTarget,
    name: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn detach(&self) {
        let result = self
            .target
            .remove_event_listener_with_callback(self.name, self.callback.as_ref().unchecked_ref());
        if let Err(e) = result {
            log::warn!("panzoom: could not remove {} listener: {:?}", self.name, e);
        }
    }
}

struct Host {
    engine: WebEngine,
    owner: EventTarget,
    document: Document,
    self_ref: Weak<Host>,
    listeners: RefCell<HashMap<ListenerScope, Vec<Listener>>>,
    /// Detached listeners whose closure may still be on the call stack.
    detached: RefCell<Vec<Listener>>,
}

impl Host {
    fn on_frame(&self, handle: FrameHandle) {
        let ran = self.engine.with_engine(|engine| {
            engine.scheduler_mut().pending.remove(&handle);
            engine.on_frame(handle)
        });
        if ran.is_none() {
            log::warn!("panzoom: frame skipped, engine busy");
        }
        self.sync_listeners();
    }

    fn on_event(&self, event: &Event) {
        self.detached.borrow_mut().clear();

        let Some(input) = to_input(event) else {
            return;
        };
        let Some(propagation) = self.engine.handle(&input) else {
            log::warn!("panzoom: {} ignored, engine busy", event.type_());
            return;
        };
        if propagation.is_stop() {
            event.stop_propagation();
            event.prevent_default();
        }
        self.sync_listeners();
    }

    /// Attach or detach DOM listeners to match the engine's listener scopes.
    fn sync_listeners(&self) {
        let Some(wanted) = self.engine.inspect(|engine| {
            [
                ListenerScope::Element,
                ListenerScope::DocumentMouse,
                ListenerScope::DocumentTouch,
            ]
            .map(|scope| (scope, engine.is_listening(scope)))
        }) else {
            return;
        };

        let mut listeners = self.listeners.borrow_mut();
        for (scope, listening) in wanted {
            let attached = listeners.contains_key(&scope);
            if listening && !attached {
                listeners.insert(scope, self.attach(scope));
            } else if !listening && attached {
                if let Some(removed) = listeners.remove(&scope) {
                    for listener in &removed {
                        listener.detach();
                    }
                    self.detached.borrow_mut().extend(removed);
                }
            }
        }
    }

    fn attach(&self, scope: ListenerScope) -> Vec<Listener> {
        let (target, names): (EventTarget, &[&'static str]) = match scope {
            ListenerScope::Element => (self.owner.clone(), ELEMENT_EVENTS),
            ListenerScope::DocumentMouse => (self.document.clone().into(), MOUSE_DRAG_EVENTS),
            ListenerScope::DocumentTouch => (self.document.clone().into(), TOUCH_DRAG_EVENTS),
        };

        let options = AddEventListenerOptions::new();
        options.set_passive(false);

        names
            .iter()
            .filter_map(|&name| {
                let host = self.self_ref.clone();
                let callback = Closure::wrap(Box::new(move |event: Event| {
                    if let Some(host) = host.upgrade() {
                        host.on_event(&event);
                    }
                }) as Box<dyn FnMut(Event)>);
                let result = target.add_event_listener_with_callback_and_add_event_listener_options(
                    name,
                    callback.as_ref().unchecked_ref(),
                    &options,
                );
                match result {
                    Ok(()) => Some(Listener {
                        target: target.clone(),
                        name,
                        callback,
                    }),
                    Err(e) => {
                        log::warn!("panzoom: could not add {} listener: {:?}", name, e);
                        None
                    }
                }
            })
            .collect()
    }

    /// Listeners are released here, or by the event that is currently
    /// running if the engine is busy.
    fn dispose(&self) {
        if self.engine.dispose() {
            self.sync_listeners();
        }
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        for listener in self.listeners.get_mut().values().flatten() {
            listener.detach();
        }
    }
}

fn client_point(event: &web_sys::MouseEvent) -> Point {
    Point::new(f64::from(event.client_x()), f64::from(event.client_y()))
}

fn to_input(event: &Event) -> Option<InputEvent> {
    let kind = event.type_();
    let input = match kind.as_str() {
        "mousedown" | "mousemove" | "mouseup" => {
            let mouse = event.dyn_ref::<web_sys::MouseEvent>()?;
            let position = client_point(mouse);
            match kind.as_str() {
                "mousedown" => InputEvent::Mouse(MouseEvent::Down {
                    position,
                    button: match mouse.button() {
                        0 => MouseButton::Left,
                        1 => MouseButton::Middle,
                        _ => MouseButton::Right,
                    },
                }),
                "mousemove" => InputEvent::Mouse(MouseEvent::Move { position }),
                _ => InputEvent::Mouse(MouseEvent::Up { position }),
            }
        }
        "touchstart" | "touchmove" | "touchend" | "touchcancel" => {
            let touch = event.dyn_ref::<web_sys::TouchEvent>()?;
            let phase = match kind.as_str() {
                "touchstart" => TouchPhase::Start,
                "touchmove" => TouchPhase::Move,
                "touchend" => TouchPhase::End,
                _ => TouchPhase::Cancel,
            };
            let list = touch.touches();
            let touches: Vec<Point> = (0..list.length())
                .filter_map(|i| list.get(i))
                .map(|t| Point::new(f64::from(t.client_x()), f64::from(t.client_y())))
                .collect();
            InputEvent::Touch(TouchEvent::new(phase, touches))
        }
        "wheel" => {
            let wheel = event.dyn_ref::<web_sys::WheelEvent>()?;
            InputEvent::Wheel(WheelEvent {
                position: client_point(wheel),
                delta_y: wheel.delta_y(),
            })
        }
        _ => return None,
    };
    Some(input)
}

fn js_error(error: PanZoomError) -> JsValue {
    JsError::new(&error.to_string()).into()
}

/// Handle returned to JavaScript; call `dispose()` to detach.
#[wasm_bindgen]
pub struct PanZoomHandle {
    host: Rc<Host>,
}

#[wasm_bindgen]
impl PanZoomHandle {
    /// Detach all listeners and stop any kinetic scrolling. Safe to call
    /// more than once.
    pub fn dispose(&self) {
        self.host.dispose();
    }
}

/// Make an SVG graphics element pannable and zoomable.
#[wasm_bindgen(js_name = createPanZoom)]
pub fn create_pan_zoom(element: JsValue) -> Result<PanZoomHandle, JsValue> {
    let element = element.dyn_into::<SvgGraphicsElement>().map_err(|_| {
        js_error(PanZoomError::Configuration(
            "svg element is required for panzoom to work".to_string(),
        ))
    })?;
    let window = web_sys::window()
        .ok_or_else(|| js_error(PanZoomError::Configuration("no window".to_string())))?;
    let document = window
        .document()
        .ok_or_else(|| js_error(PanZoomError::Configuration("no document".to_string())))?;

    let target = SvgTarget::new(element, document.clone());
    let owner: Option<EventTarget> = target.owner.clone().map(Into::into);

    let slot = Rc::new(RefCell::new(Weak::new()));
    let scheduler = RafScheduler {
        window,
        next_id: 0,
        pending: HashMap::new(),
        host: slot.clone(),
    };
    let engine = PanZoom::new(target, scheduler, PanZoomConfig::default()).map_err(js_error)?;
    let owner = owner.ok_or_else(|| js_error(PanZoomError::UnsupportedTarget))?;

    let host = Rc::new_cyclic(|self_ref| Host {
        engine: SharedPanZoom::new(engine),
        owner,
        document,
        self_ref: self_ref.clone(),
        listeners: RefCell::new(HashMap::new()),
        detached: RefCell::new(Vec::new()),
    });
    *slot.borrow_mut() = Rc::downgrade(&host);
    host.sync_listeners();
    log::info!("panzoom: attached");

    Ok(PanZoomHandle { host })
}
