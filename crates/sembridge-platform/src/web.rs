//! Web backend (wasm32): a web-sys [`HostDom`] and the `WebBridge` entry
//! point JS embedders call.
//!
//! Listeners only record events and ask for a pump; the session is never
//! borrowed from inside a DOM callback, since `focus()` and friends
//! dispatch events synchronously while the session is already borrowed.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use slotmap::{SecondaryMap, SlotMap};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_time::Instant;

use sembridge_core::BridgeError;
use sembridge_dom::{
    ElementId, EventMask, HostDom, Key, NativeEvent, NativeEventKind, SelectionDirection,
    SelectionRange, Tag,
};

use crate::{BridgeOptions, Session};

type EventQueue = Rc<RefCell<Vec<NativeEvent>>>;
type Wake = Rc<dyn Fn()>;
type SharedWake = Rc<RefCell<Option<Wake>>>;
type SelectionTargets = Rc<RefCell<Vec<(ElementId, web_sys::Element)>>>;

// `selectionchange` is not in this table: Safari only dispatches it on the
// document, so it is observed there and routed to the focused element.
const LISTENED: [(EventMask, &str); 9] = [
    (EventMask::INPUT, "input"),
    (EventMask::SELECTION, "select"),
    (EventMask::KEYBOARD, "keydown"),
    (EventMask::KEYBOARD, "keyup"),
    (EventMask::FOCUS, "focus"),
    (EventMask::FOCUS, "blur"),
    (EventMask::COMPOSITION, "compositionstart"),
    (EventMask::COMPOSITION, "compositionupdate"),
    (EventMask::COMPOSITION, "compositionend"),
];

fn to_kind(name: &str, ev: &web_sys::Event) -> Option<NativeEventKind> {
    let key = || {
        ev.dyn_ref::<web_sys::KeyboardEvent>()
            .map(|k| Key::from_dom(&k.key()))
    };
    let data = || {
        ev.dyn_ref::<web_sys::CompositionEvent>()
            .and_then(|c| c.data())
            .unwrap_or_default()
    };
    Some(match name {
        "input" => NativeEventKind::Input,
        "select" => NativeEventKind::SelectionChange,
        "keydown" => NativeEventKind::KeyDown(key()?),
        "keyup" => NativeEventKind::KeyUp(key()?),
        "focus" => NativeEventKind::Focus,
        "blur" => NativeEventKind::Blur,
        "compositionstart" => NativeEventKind::CompositionStart,
        "compositionupdate" => NativeEventKind::CompositionUpdate(data()),
        "compositionend" => NativeEventKind::CompositionEnd(data()),
        _ => return None,
    })
}

struct Listener {
    mask: EventMask,
    name: &'static str,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

struct Slot {
    tag: Tag,
    node: Option<web_sys::HtmlElement>,
}

pub struct WebDom {
    document: web_sys::Document,
    host: web_sys::HtmlElement,
    elements: SlotMap<ElementId, Slot>,
    listeners: SecondaryMap<ElementId, Vec<Listener>>,
    root: ElementId,
    events: EventQueue,
    wake: SharedWake,
    selection_targets: SelectionTargets,
    selection_listener: Closure<dyn FnMut(web_sys::Event)>,
}

fn record(events: &EventQueue, wake: &SharedWake, event: NativeEvent) {
    events.borrow_mut().push(event);
    let wake = wake.borrow().clone();
    if let Some(wake) = wake {
        wake();
    }
}

fn host_err(what: &str, e: JsValue) -> BridgeError {
    BridgeError::Host(format!("{what}: {e:?}"))
}

fn js_err(context: &str) -> impl Fn(JsValue) -> JsValue + '_ {
    move |e| JsValue::from_str(&host_err(context, e).to_string())
}

/// DOM calls made while the bridge is running are not fatal.
fn warn_on_err<T>(result: Result<T, JsValue>, what: &str) {
    if let Err(e) = result {
        log::warn!("{}", host_err(what, e));
    }
}

impl WebDom {
    /// `root_id` names the framework's surface element; the body is used
    /// when it is absent.
    pub fn new(root_id: Option<&str>) -> Result<Self, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let body = document
            .body()
            .ok_or_else(|| JsValue::from_str("document has no body"))?;

        let root_node: web_sys::HtmlElement = match root_id {
            Some(id) => document
                .get_element_by_id(id)
                .ok_or_else(|| JsValue::from_str(&format!("element '{id}' not found")))?
                .dyn_into()
                .map_err(|_| JsValue::from_str(&format!("'{id}' is not an HTML element")))?,
            None => body.clone(),
        };
        root_node
            .set_attribute("tabindex", "-1")
            .map_err(js_err("root tabindex"))?;

        let host: web_sys::HtmlElement = document
            .create_element(Tag::Surface.name())
            .map_err(js_err("semantics host"))?
            .dyn_into()
            .map_err(|_| JsValue::from_str("semantics host is not an HTML element"))?;
        let style = host.style();
        style.set_property("position", "absolute")?;
        style.set_property("top", "0")?;
        style.set_property("left", "0")?;
        body.append_child(&host).map_err(js_err("append semantics host"))?;

        let events: EventQueue = Rc::default();
        let wake: SharedWake = Rc::default();
        let selection_targets: SelectionTargets = Rc::default();
        let selection_listener = {
            let document = document.clone();
            let targets = selection_targets.clone();
            let events = events.clone();
            let wake = wake.clone();
            Closure::<dyn FnMut(web_sys::Event)>::new(move |_: web_sys::Event| {
                let Some(active) = document.active_element() else {
                    return;
                };
                let target = targets
                    .borrow()
                    .iter()
                    .find(|(_, node)| *node == active)
                    .map(|(id, _)| *id);
                if let Some(el) = target {
                    record(
                        &events,
                        &wake,
                        NativeEvent::new(el, NativeEventKind::SelectionChange),
                    );
                }
            })
        };
        document
            .add_event_listener_with_callback(
                "selectionchange",
                selection_listener.as_ref().unchecked_ref(),
            )
            .map_err(js_err("selectionchange listener"))?;

        let mut elements = SlotMap::with_key();
        let root = elements.insert(Slot {
            tag: Tag::Surface,
            node: Some(root_node),
        });
        Ok(Self {
            document,
            host,
            elements,
            listeners: SecondaryMap::new(),
            root,
            events,
            wake,
            selection_targets,
            selection_listener,
        })
    }

    /// Called whenever a listener records an event.
    pub fn set_wake(&mut self, wake: Wake) {
        *self.wake.borrow_mut() = Some(wake);
    }

    fn node(&self, el: ElementId) -> Option<&web_sys::HtmlElement> {
        self.elements.get(el).and_then(|s| s.node.as_ref())
    }

    fn input(&self, el: ElementId) -> Option<&web_sys::HtmlInputElement> {
        self.node(el)?.dyn_ref()
    }

    fn textarea(&self, el: ElementId) -> Option<&web_sys::HtmlTextAreaElement> {
        self.node(el)?.dyn_ref()
    }
}

fn direction(raw: Option<String>) -> SelectionDirection {
    match raw.as_deref() {
        Some("forward") => SelectionDirection::Forward,
        Some("backward") => SelectionDirection::Backward,
        _ => SelectionDirection::None,
    }
}

impl HostDom for WebDom {
    fn create_element(&mut self, tag: Tag) -> ElementId {
        let node = self
            .document
            .create_element(tag.name())
            .ok()
            .and_then(|e| e.dyn_into::<web_sys::HtmlElement>().ok());
        if node.is_none() {
            log::warn!("could not create <{}>", tag.name());
        }
        self.elements.insert(Slot { tag, node })
    }

    fn append_to_semantics_host(&mut self, el: ElementId) {
        if let Some(node) = self.node(el) {
            warn_on_err(self.host.append_child(node), "appendChild");
        }
    }

    fn remove_element(&mut self, el: ElementId) {
        self.remove_listeners(el, EventMask::EDITING);
        self.listeners.remove(el);
        if let Some(slot) = self.elements.remove(el)
            && let Some(node) = slot.node
        {
            node.remove();
        }
        self.events.borrow_mut().retain(|e| e.target != el);
    }

    fn is_connected(&self, el: ElementId) -> bool {
        self.node(el).is_some_and(|n| n.is_connected())
    }

    fn tag(&self, el: ElementId) -> Option<Tag> {
        self.elements.get(el).map(|s| s.tag)
    }

    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str) {
        if let Some(node) = self.node(el) {
            warn_on_err(node.set_attribute(name, value), "setAttribute");
        }
    }

    fn remove_attribute(&mut self, el: ElementId, name: &str) {
        if let Some(node) = self.node(el) {
            warn_on_err(node.remove_attribute(name), "removeAttribute");
        }
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<String> {
        self.node(el)?.get_attribute(name)
    }

    fn set_style(&mut self, el: ElementId, property: &str, value: &str) {
        if let Some(node) = self.node(el) {
            warn_on_err(node.style().set_property(property, value), "style");
        }
    }

    fn style(&self, el: ElementId, property: &str) -> Option<String> {
        self.node(el)?
            .style()
            .get_property_value(property)
            .ok()
            .filter(|v| !v.is_empty())
    }

    fn value(&self, el: ElementId) -> Option<String> {
        match self.tag(el)? {
            Tag::Input => self.input(el).map(|i| i.value()),
            Tag::TextArea => self.textarea(el).map(|t| t.value()),
            _ => None,
        }
    }

    fn set_value(&mut self, el: ElementId, value: &str) {
        match self.tag(el) {
            Some(Tag::Input) => {
                if let Some(i) = self.input(el) {
                    i.set_value(value);
                }
            }
            Some(Tag::TextArea) => {
                if let Some(t) = self.textarea(el) {
                    t.set_value(value);
                }
            }
            _ => {}
        }
    }

    fn selection(&self, el: ElementId) -> Option<SelectionRange> {
        let (start, end, dir) = match self.tag(el)? {
            Tag::Input => {
                let i = self.input(el)?;
                (
                    i.selection_start().ok()??,
                    i.selection_end().ok()??,
                    i.selection_direction().ok().flatten(),
                )
            }
            Tag::TextArea => {
                let t = self.textarea(el)?;
                (
                    t.selection_start().ok()??,
                    t.selection_end().ok()??,
                    t.selection_direction().ok().flatten(),
                )
            }
            _ => return None,
        };
        Some(SelectionRange {
            start: start as usize,
            end: end as usize,
            direction: direction(dir),
        })
    }

    fn set_selection_range(&mut self, el: ElementId, range: SelectionRange) {
        let (start, end) = (range.start as u32, range.end as u32);
        let dir = range.direction.as_str();
        let result = match self.tag(el) {
            Some(Tag::Input) => self
                .input(el)
                .map(|i| i.set_selection_range_with_direction(start, end, dir)),
            Some(Tag::TextArea) => self
                .textarea(el)
                .map(|t| t.set_selection_range_with_direction(start, end, dir)),
            _ => None,
        };
        if let Some(result) = result {
            warn_on_err(result, "setSelectionRange");
        }
    }

    fn focus(&mut self, el: ElementId) {
        if let Some(node) = self.node(el) {
            warn_on_err(node.focus(), "focus");
        }
    }

    fn blur(&mut self, el: ElementId) {
        if let Some(node) = self.node(el) {
            warn_on_err(node.blur(), "blur");
        }
    }

    fn root(&self) -> ElementId {
        self.root
    }

    fn active_element(&self) -> Option<ElementId> {
        let active = self.document.active_element()?;
        self.elements.iter().find_map(|(id, slot)| {
            let node: &web_sys::Element = slot.node.as_ref()?;
            (*node == active).then_some(id)
        })
    }

    fn add_listeners(&mut self, el: ElementId, mask: EventMask) {
        let Some(node) = self.node(el).cloned() else {
            return;
        };
        let present = self.listeners(el);
        let mut added = Vec::new();
        for (group, name) in LISTENED {
            if !mask.contains(group) || present.contains(group) {
                continue;
            }
            let events = self.events.clone();
            let wake = self.wake.clone();
            let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |ev: web_sys::Event| {
                if let Some(kind) = to_kind(name, &ev) {
                    record(&events, &wake, NativeEvent::new(el, kind));
                }
            });
            warn_on_err(
                node.add_event_listener_with_callback(name, callback.as_ref().unchecked_ref()),
                "addEventListener",
            );
            if group == EventMask::SELECTION {
                self.selection_targets
                    .borrow_mut()
                    .push((el, web_sys::Element::from(node.clone())));
            }
            added.push(Listener {
                mask: group,
                name,
                callback,
            });
        }
        if let Some(list) = self.listeners.entry(el) {
            list.or_default().extend(added);
        }
    }

    fn remove_listeners(&mut self, el: ElementId, mask: EventMask) {
        if mask.contains(EventMask::SELECTION) {
            self.selection_targets
                .borrow_mut()
                .retain(|(id, _)| *id != el);
        }
        let Some(list) = self.listeners.get_mut(el) else {
            return;
        };
        let node = self.elements.get(el).and_then(|s| s.node.clone());
        list.retain(|l| {
            if !mask.contains(l.mask) {
                return true;
            }
            if let Some(node) = &node {
                warn_on_err(
                    node.remove_event_listener_with_callback(
                        l.name,
                        l.callback.as_ref().unchecked_ref(),
                    ),
                    "removeEventListener",
                );
            }
            false
        });
    }

    fn listeners(&self, el: ElementId) -> EventMask {
        self.listeners
            .get(el)
            .map(|list| list.iter().fold(EventMask::empty(), |m, l| m | l.mask))
            .unwrap_or_default()
    }

    fn take_events(&mut self) -> Vec<NativeEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl Drop for WebDom {
    fn drop(&mut self) {
        warn_on_err(
            self.document.remove_event_listener_with_callback(
                "selectionchange",
                self.selection_listener.as_ref().unchecked_ref(),
            ),
            "removeEventListener",
        );
    }
}

#[wasm_bindgen]
pub struct WebOptions {
    root_id: Option<String>,
    handoff_delay_ms: u32,
    verbose: bool,
}

#[wasm_bindgen]
impl WebOptions {
    #[wasm_bindgen(constructor)]
    pub fn new(root_id: Option<String>) -> Self {
        Self {
            root_id,
            handoff_delay_ms: 0,
            verbose: false,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn root_id(&self) -> Option<String> {
        self.root_id.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn handoff_delay_ms(&self) -> u32 {
        self.handoff_delay_ms
    }

    #[wasm_bindgen(setter)]
    pub fn set_handoff_delay_ms(&mut self, v: u32) {
        self.handoff_delay_ms = v;
    }

    #[wasm_bindgen(getter)]
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    #[wasm_bindgen(setter)]
    pub fn set_verbose(&mut self, v: bool) {
        self.verbose = v;
    }
}

impl WebOptions {
    fn bridge_options(&self) -> BridgeOptions {
        BridgeOptions {
            handoff_delay: Duration::from_millis(u64::from(self.handoff_delay_ms)),
            log_level: if self.verbose {
                log::Level::Debug
            } else {
                log::Level::Info
            },
            ..BridgeOptions::default()
        }
    }
}

struct Inner {
    session: RefCell<Session<WebDom>>,
    pump_scheduled: Cell<bool>,
}

fn schedule_pump(inner: &Weak<Inner>, delay: Duration) {
    let Some(strong) = inner.upgrade() else {
        return;
    };
    if strong.pump_scheduled.replace(true) {
        return;
    }
    let Some(window) = web_sys::window() else {
        return;
    };
    let weak = inner.clone();
    let callback = Closure::once_into_js(move || {
        if let Some(inner) = weak.upgrade() {
            inner.pump_scheduled.set(false);
            pump(&inner);
        }
    });
    let ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
    warn_on_err(
        window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), ms),
        "setTimeout",
    );
}

fn pump(inner: &Rc<Inner>) {
    let weak = Rc::downgrade(inner);
    let Ok(mut session) = inner.session.try_borrow_mut() else {
        schedule_pump(&weak, Duration::ZERO);
        return;
    };
    session.pump_native_events();
    session.run_deferred_turn();
    let next = session.next_deadline();
    drop(session);
    if let Some(due) = next {
        schedule_pump(&weak, due.saturating_duration_since(Instant::now()));
    }
}

/// One bridge per framework view.
#[wasm_bindgen]
pub struct WebBridge {
    inner: Rc<Inner>,
}

#[wasm_bindgen]
impl WebBridge {
    #[wasm_bindgen(constructor)]
    pub fn new(options: WebOptions) -> Result<WebBridge, JsValue> {
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));
        let bridge_options = options.bridge_options();
        let _ = console_log::init_with_level(bridge_options.log_level);

        let dom = WebDom::new(options.root_id.as_deref())?;
        let inner = Rc::new(Inner {
            session: RefCell::new(Session::new(dom, &bridge_options)),
            pump_scheduled: Cell::new(false),
        });
        let weak = Rc::downgrade(&inner);
        inner
            .session
            .borrow_mut()
            .dom_mut()
            .set_wake(Rc::new(move || schedule_pump(&weak, Duration::ZERO)));
        log::info!("sembridge web bridge ready");
        Ok(WebBridge { inner })
    }

    /// Applies a JSON semantics update batch.
    #[wasm_bindgen(js_name = updateSemantics)]
    pub fn update_semantics(&self, json: &str) -> Result<(), JsValue> {
        let result = self.inner.session.borrow_mut().update_semantics_json(json);
        self.after_call();
        result.map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Handles a `TextInput.*` method call.
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&self, json: &str) -> Result<(), JsValue> {
        let result = self.inner.session.borrow_mut().handle_channel_message(json);
        self.after_call();
        result.map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Pending `TextInputClient.*` messages as a JSON array of strings.
    #[wasm_bindgen(js_name = takeOutbound)]
    pub fn take_outbound(&self) -> String {
        let messages = self.inner.session.borrow_mut().take_outbound();
        serde_json::to_string(&messages).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn dispose(&self) {
        self.inner.session.borrow_mut().shutdown();
    }

    fn after_call(&self) {
        let weak = Rc::downgrade(&self.inner);
        schedule_pump(&weak, Duration::ZERO);
    }
}
