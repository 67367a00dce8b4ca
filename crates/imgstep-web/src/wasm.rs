#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for the ImageStepper.
//!
//! This module wires [`StepperCore`] to the page: listeners feed it events,
//! a single `setTimeout` drives its timers, and diagnostic actions become a
//! fixed-position toast. Only compiled on `wasm32` targets.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use imgstep_core::clock::{Clock, SystemClock};
use imgstep_engine::{NavConfig, ViewportState};
use imgstep_index::NodeKind;
use imgstep_runtime::DiagnosticAction;
use js_sys::{Array, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, Event, EventTarget, KeyboardEvent, MutationObserver, MutationObserverInit,
    MutationRecord, Node, ScrollBehavior, ScrollToOptions,
};

use crate::dom::DomHost;
use crate::registry::{ListenerRegistry, Registration};
use crate::stepper_core::{KeyInput, ScrollBehaviorKind, ScrollRequest, StepperCore};

const TOAST_ID: &str = "scroll-debug-toast";
const TOAST_STYLE: &str = "position: fixed; top: 20px; right: 20px; \
    background: rgba(0, 0, 0, 0.9); color: #fff; padding: 12px 16px; \
    border-radius: 6px; font-family: monospace; font-size: 12px; \
    z-index: 999999; max-width: 400px; line-height: 1.4; \
    box-shadow: 0 4px 12px rgba(0,0,0,0.3); white-space: pre-wrap;";

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            console_error(&format!("imgstep panic: {info}"));
        }));
    });
}

fn node_kind(node: &Node) -> NodeKind {
    let contains_image = node.node_type() == Node::ELEMENT_NODE
        && node
            .unchecked_ref::<Element>()
            .query_selector("img")
            .ok()
            .flatten()
            .is_some();
    NodeKind::from_node_name(&node.node_name(), contains_image)
}

fn node_kinds(list: &web_sys::NodeList) -> Vec<NodeKind> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .map(|node| node_kind(&node))
        .collect()
}

struct Inner {
    host: DomHost,
    core: StepperCore<Element, SystemClock>,
    clock: SystemClock,
    timer: Option<i32>,
    tick_callback: Option<Closure<dyn FnMut()>>,
}

impl Inner {
    fn viewport(&self) -> ViewportState {
        let document = self.host.document();
        let root = document.document_element();
        let root_top = root.as_ref().map_or(0.0, |e| f64::from(e.scroll_top()));
        let body_top = document.body().map_or(0.0, |b| f64::from(b.scroll_top()));
        let height = self
            .host
            .window()
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        let document_height = root.map_or(0.0, |e| f64::from(e.scroll_height()));
        ViewportState::from_scroll_tops(root_top, body_top, height, document_height)
    }

    fn scroll(&self, request: ScrollRequest) {
        let options = ScrollToOptions::new();
        options.set_top(request.top);
        options.set_behavior(match request.behavior {
            ScrollBehaviorKind::Instant => ScrollBehavior::Instant,
            ScrollBehaviorKind::Smooth => ScrollBehavior::Smooth,
        });
        self.host.window().scroll_to_with_scroll_to_options(&options);
    }

    fn render(&self, actions: Vec<DiagnosticAction>) {
        let document = self.host.document();
        for action in actions {
            match action {
                DiagnosticAction::Show(toast) => {
                    if let Some(existing) = document.get_element_by_id(TOAST_ID) {
                        existing.remove();
                    }
                    let Ok(element) = document.create_element("div") else {
                        continue;
                    };
                    element.set_id(TOAST_ID);
                    let _ = element.set_attribute("style", TOAST_STYLE);
                    let _ = element.set_attribute("data-toast", &toast.id.0.to_string());
                    element.set_text_content(Some(&toast.message));
                    if let Some(body) = document.body() {
                        let _ = body.append_child(&element);
                    }
                }
                DiagnosticAction::Hide(id) => {
                    if let Some(existing) = document.get_element_by_id(TOAST_ID)
                        && existing.get_attribute("data-toast").as_deref()
                            == Some(id.0.to_string().as_str())
                    {
                        existing.remove();
                    }
                }
            }
        }
    }
}

type Listener = Closure<dyn FnMut(JsValue)>;
type Listeners<T> = ListenerRegistry<T, Listener>;

fn detach<T: AsRef<EventTarget>>(registration: Registration<T, Listener>) {
    let _ = registration
        .target
        .as_ref()
        .remove_event_listener_with_callback_and_bool(
            registration.event,
            registration.listener.as_ref().unchecked_ref(),
            registration.capture,
        );
}

fn listen<T: AsRef<EventTarget> + PartialEq>(
    registry: &mut Listeners<T>,
    target: T,
    event: &'static str,
    capture: bool,
    listener: Listener,
) -> Result<(), JsValue> {
    target.as_ref().add_event_listener_with_callback_and_bool(
        event,
        listener.as_ref().unchecked_ref(),
        capture,
    )?;
    if let Some(replaced) = registry.attach(target, event, capture, listener) {
        detach(replaced);
    }
    Ok(())
}

/// Re-arm the single timer for the core's next deadline.
fn schedule(inner: &Rc<RefCell<Inner>>) {
    let mut state = inner.borrow_mut();
    if let Some(handle) = state.timer.take() {
        state.host.window().clear_timeout_with_handle(handle);
    }
    let Some(deadline) = state.core.next_deadline() else {
        return;
    };
    let delay = deadline.saturating_sub(state.clock.now_mono());
    let delay_ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);

    let Some(callback) = state.tick_callback.as_ref() else {
        return;
    };
    let handle = state
        .host
        .window()
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            delay_ms,
        );
    state.timer = handle.ok();
}

/// Image navigation installed on the current page.
///
/// Keeps its listeners alive for as long as the value lives. Callbacks hold
/// only weak handles to the shared state; dropping the value (or calling
/// `disconnect`) detaches every listener, the observer and the timer.
#[wasm_bindgen]
pub struct ImageStepper {
    inner: Rc<RefCell<Inner>>,
    observer: MutationObserver,
    listeners: Listeners<EventTarget>,
    frame_listeners: Rc<RefCell<Listeners<Document>>>,
    _mutations: Closure<dyn FnMut(Array, MutationObserver)>,
}

#[wasm_bindgen]
impl ImageStepper {
    /// Install with the default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<ImageStepper, JsValue> {
        Self::install(&NavConfig::default())
    }

    /// Mark the position index stale, as a DOM change would.
    #[wasm_bindgen(js_name = invalidate)]
    pub fn invalidate(&self) {
        self.inner.borrow().core.navigator().stale_handle().mark();
    }

    /// Consecutive stuck presses.
    #[wasm_bindgen(js_name = stuckCount)]
    pub fn stuck_count(&self) -> u32 {
        self.inner.borrow().core.navigator().stuck_count()
    }

    /// Detach the observer, every listener and the pending timer.
    pub fn disconnect(&mut self) {
        self.observer.disconnect();
        self.listeners.drain().into_iter().for_each(detach);
        self.frame_listeners
            .borrow_mut()
            .drain()
            .into_iter()
            .for_each(detach);
        let mut state = self.inner.borrow_mut();
        if let Some(handle) = state.timer.take() {
            state.host.window().clear_timeout_with_handle(handle);
        }
        state.tick_callback = None;
    }
}

impl ImageStepper {
    /// Install with an explicit configuration.
    pub fn install(config: &NavConfig) -> Result<ImageStepper, JsValue> {
        install_panic_hook();
        let host = DomHost::from_global().ok_or_else(|| JsValue::from_str("no window"))?;
        let window = host.window().clone();
        let document = host.document().clone();
        let clock = SystemClock::new();

        let inner = Rc::new(RefCell::new(Inner {
            core: StepperCore::new(config, clock.clone()),
            host,
            clock,
            timer: None,
            tick_callback: None,
        }));

        let tick_inner = Rc::downgrade(&inner);
        let tick = Closure::<dyn FnMut()>::new(move || {
            let Some(inner) = tick_inner.upgrade() else {
                return;
            };
            {
                let mut state = inner.borrow_mut();
                state.timer = None;
                let actions = state.core.tick();
                state.render(actions);
            }
            schedule(&inner);
        });
        inner.borrow_mut().tick_callback = Some(tick);

        let mut listeners: Listeners<EventTarget> = Listeners::new();

        let key_inner = Rc::downgrade(&inner);
        let keydown = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            let Some(inner) = key_inner.upgrade() else {
                return;
            };
            let event = value.unchecked_into::<KeyboardEvent>();
            let target = event.target().map(|t| t.unchecked_into::<Element>());
            let tag = target.as_ref().map(Element::tag_name);
            let editable = target
                .as_ref()
                .and_then(|t| t.get_attribute("contenteditable"));
            let key = event.key();
            let input = KeyInput {
                key: &key,
                shift: event.shift_key(),
                ctrl: event.ctrl_key(),
                alt: event.alt_key(),
                meta: event.meta_key(),
                repeat: event.repeat(),
                target_tag: tag.as_deref(),
                content_editable: editable.as_deref(),
            };
            {
                let mut state = inner.borrow_mut();
                let viewport = state.viewport();
                let Inner { host, core, .. } = &mut *state;
                let result = core.key_down(&*host, input, viewport);
                if result.prevent_default {
                    event.prevent_default();
                }
                if let Some(request) = result.scroll {
                    state.scroll(request);
                }
                state.render(result.diagnostics);
            }
            schedule(&inner);
        });
        listen(&mut listeners, document.clone().into(), "keydown", false, keydown)?;

        let keyup_inner = Rc::downgrade(&inner);
        let keyup = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            let Some(inner) = keyup_inner.upgrade() else {
                return;
            };
            let event = value.unchecked_into::<KeyboardEvent>();
            inner.borrow_mut().core.key_up(&event.key());
        });
        listen(&mut listeners, window.clone().into(), "keyup", false, keyup)?;

        let scroll_inner = Rc::downgrade(&inner);
        let scroll = Closure::<dyn FnMut(JsValue)>::new(move |_: JsValue| {
            let Some(inner) = scroll_inner.upgrade() else {
                return;
            };
            {
                let mut state = inner.borrow_mut();
                let offset = state.viewport().scroll_offset;
                state.core.scrolled(offset);
            }
            schedule(&inner);
        });
        listen(&mut listeners, window.into(), "scroll", false, scroll)?;

        // Load events do not bubble; listen in the capture phase.
        let frame_listeners: Rc<RefCell<Listeners<Document>>> = Rc::default();
        let load = Self::load_listener(Rc::downgrade(&inner), Rc::clone(&frame_listeners));
        listen(&mut listeners, document.clone().into(), "load", true, load)?;

        let mutation_inner = Rc::downgrade(&inner);
        let mutations = Closure::<dyn FnMut(Array, MutationObserver)>::new(
            move |records: Array, _observer: MutationObserver| {
                let Some(inner) = mutation_inner.upgrade() else {
                    return;
                };
                let state = inner.borrow();
                for record in records.iter() {
                    let record = record.unchecked_into::<MutationRecord>();
                    let stale = match record.type_().as_str() {
                        "childList" => state.core.child_list_changed(
                            &node_kinds(&record.added_nodes()),
                            &node_kinds(&record.removed_nodes()),
                        ),
                        "attributes" => {
                            let target = record
                                .target()
                                .map_or(NodeKind::Other { contains_image: false }, |n| {
                                    node_kind(&n)
                                });
                            let name = record.attribute_name().unwrap_or_default();
                            state.core.attribute_changed(target, &name)
                        }
                        _ => false,
                    };
                    if stale {
                        break;
                    }
                }
            },
        );
        let observer = MutationObserver::new(mutations.as_ref().unchecked_ref())?;
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        init.set_attributes(true);
        let filter: Array = ["src", "width", "height", "style", "class"]
            .iter()
            .map(|name| JsValue::from_str(name))
            .collect();
        init.set_attribute_filter(&filter);
        if let Some(root) = document.document_element() {
            observer.observe_with_options(&root, &init)?;
        }

        tracing::info!("imgstep installed");
        Ok(ImageStepper {
            inner,
            observer,
            listeners,
            frame_listeners,
            _mutations: mutations,
        })
    }

    fn load_listener(
        inner: Weak<RefCell<Inner>>,
        frame_listeners: Rc<RefCell<Listeners<Document>>>,
    ) -> Listener {
        Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            let Some(strong) = inner.upgrade() else {
                return;
            };
            let event = value.unchecked_into::<Event>();
            let Some(target) = event.target() else {
                return;
            };
            let node = target.unchecked_into::<Node>();
            let kind = NodeKind::from_node_name(&node.node_name(), false);
            if !strong.borrow().core.loaded(kind) || kind != NodeKind::Frame {
                return;
            }

            // Images inside a same-origin frame fire load in that document.
            let Some(frame_document) = node
                .unchecked_ref::<web_sys::HtmlIFrameElement>()
                .content_document()
            else {
                return;
            };
            let mut registry = frame_listeners.borrow_mut();
            // A reloaded or removed frame leaves its old document without a view.
            registry
                .prune(|document| document.default_view().is_some())
                .into_iter()
                .for_each(detach);
            if registry.contains(&frame_document, "load", true) {
                return;
            }
            let frame_inner = inner.clone();
            let listener = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
                let Some(inner) = frame_inner.upgrade() else {
                    return;
                };
                let Some(target) = value.unchecked_into::<Event>().target() else {
                    return;
                };
                let name = target.unchecked_into::<Node>().node_name();
                if NodeKind::from_node_name(&name, false) == NodeKind::Image {
                    inner.borrow().core.loaded(NodeKind::Image);
                }
            });
            let _ = listen(&mut registry, frame_document, "load", true, listener);
        })
    }
}

impl Drop for ImageStepper {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
    use web_sys::HtmlIFrameElement;

    wasm_bindgen_test_configure!(run_in_browser);

    fn document() -> Document {
        web_sys::window()
            .and_then(|w| w.document())
            .expect("browser document")
    }

    fn append_frame(document: &Document) -> HtmlIFrameElement {
        let frame = document
            .create_element("iframe")
            .expect("create iframe")
            .unchecked_into::<HtmlIFrameElement>();
        document
            .body()
            .expect("body")
            .append_child(&frame)
            .expect("append iframe");
        frame
    }

    fn fire_load(frame: &HtmlIFrameElement) {
        let event = Event::new("load").expect("load event");
        frame.dispatch_event(&event).expect("dispatch load");
    }

    #[wasm_bindgen_test]
    fn callbacks_hold_only_weak_handles() {
        let stepper = ImageStepper::new().expect("install");
        assert_eq!(Rc::strong_count(&stepper.inner), 1);
        // tick, keydown, keyup, scroll, load, mutations
        assert!(Rc::weak_count(&stepper.inner) >= 6);
        assert_eq!(stepper.listeners.len(), 4);
    }

    #[wasm_bindgen_test]
    fn repeated_frame_loads_keep_one_listener() {
        let document = document();
        let stepper = ImageStepper::new().expect("install");
        let frame = append_frame(&document);
        for _ in 0..5 {
            fire_load(&frame);
        }
        assert_eq!(stepper.frame_listeners.borrow().len(), 1);

        frame.remove();
        let replacement = append_frame(&document);
        fire_load(&replacement);
        let registry = stepper.frame_listeners.borrow();
        assert_eq!(registry.len(), 1);
        let current = replacement.content_document().expect("same-origin frame");
        assert!(registry.contains(&current, "load", true));
        drop(registry);
        replacement.remove();
    }

    #[wasm_bindgen_test]
    fn disconnect_detaches_every_listener() {
        let document = document();
        let mut stepper = ImageStepper::new().expect("install");
        let frame = append_frame(&document);
        fire_load(&frame);
        assert_eq!(stepper.frame_listeners.borrow().len(), 1);

        stepper.disconnect();
        assert!(stepper.listeners.is_empty());
        assert!(stepper.frame_listeners.borrow().is_empty());
        let state = stepper.inner.borrow();
        assert!(state.timer.is_none());
        assert!(state.tick_callback.is_none());
        drop(state);
        frame.remove();
    }
}
