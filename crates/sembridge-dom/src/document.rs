//! In-memory document.
//!
//! Behaves like a browser for the handful of operations the bridge performs:
//! programmatic writes stay silent, user gestures produce events, focus moves
//! produce blur/focus pairs, and disabled elements refuse focus. Events are
//! only recorded for listeners that are attached, exactly like a real
//! `addEventListener` registration.

use std::collections::VecDeque;

use slotmap::SlotMap;
use smallvec::SmallVec;

use sembridge_core::{byte_index_for_utf16, clamp_utf16, utf16_len};

use crate::{
    ElementId, EventMask, HostDom, Key, NativeEvent, NativeEventKind, SelectionRange, Tag,
};

type Pairs = SmallVec<[(String, String); 4]>;

struct ElementData {
    tag: Tag,
    attributes: Pairs,
    style: Pairs,
    value: String,
    selection: SelectionRange,
    listeners: EventMask,
    connected: bool,
}

impl ElementData {
    fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: SmallVec::new(),
            style: SmallVec::new(),
            value: String::new(),
            selection: SelectionRange::default(),
            listeners: EventMask::empty(),
            connected: false,
        }
    }
}

fn get<'a>(pairs: &'a Pairs, name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn put(pairs: &mut Pairs, name: &str, value: &str) {
    if let Some(slot) = pairs.iter_mut().find(|(k, _)| k == name) {
        slot.1 = value.to_string();
    } else {
        pairs.push((name.to_string(), value.to_string()));
    }
}

struct Composition {
    el: ElementId,
    start: usize,
    len: usize,
}

pub struct Document {
    elements: SlotMap<ElementId, ElementData>,
    root: ElementId,
    host_children: Vec<ElementId>,
    active: Option<ElementId>,
    events: VecDeque<NativeEvent>,
    composition: Option<Composition>,
    /// Emulates engines that focus an input as a side effect of
    /// `setSelectionRange` (some WebKit builds do, Blink does not).
    pub focus_on_selection: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut elements = SlotMap::with_key();
        let mut surface = ElementData::new(Tag::Surface);
        surface.connected = true;
        put(&mut surface.attributes, "tabindex", "-1");
        let root = elements.insert(surface);
        Self {
            elements,
            root,
            host_children: Vec::new(),
            active: None,
            events: VecDeque::new(),
            composition: None,
            focus_on_selection: false,
        }
    }

    /// Connected children of the semantics host, in insertion order.
    pub fn semantics_children(&self) -> &[ElementId] {
        &self.host_children
    }

    /// All attributes of `el`, in the order they were first set.
    pub fn attributes(&self, el: ElementId) -> Vec<(String, String)> {
        self.elements
            .get(el)
            .map(|e| e.attributes.to_vec())
            .unwrap_or_default()
    }

    /// All inline style properties of `el`.
    pub fn styles(&self, el: ElementId) -> Vec<(String, String)> {
        self.elements
            .get(el)
            .map(|e| e.style.to_vec())
            .unwrap_or_default()
    }

    fn emit(&mut self, target: ElementId, kind: NativeEventKind) {
        let listening = self
            .elements
            .get(target)
            .is_some_and(|e| e.listeners.contains(kind.mask()));
        if listening {
            self.events.push_back(NativeEvent::new(target, kind));
        }
    }

    fn focusable(&self, el: ElementId) -> bool {
        self.elements
            .get(el)
            .is_some_and(|e| e.connected && get(&e.attributes, "disabled").is_none())
    }

    fn replace_selection(&mut self, el: ElementId, text: &str) -> Option<usize> {
        let data = self.elements.get_mut(el)?;
        let sel = data.selection;
        let start = byte_index_for_utf16(&data.value, sel.start);
        let end = byte_index_for_utf16(&data.value, sel.end);
        data.value.replace_range(start..end, text);
        let caret = sel.start + utf16_len(text);
        data.selection = SelectionRange::collapsed(caret);
        Some(sel.start)
    }

    // ---- user gestures -------------------------------------------------

    /// Types `text` into the focused element, replacing its selection.
    pub fn type_text(&mut self, el: ElementId, text: &str) {
        if self.active != Some(el) {
            log::debug!("type_text ignored: {el:?} is not focused");
            return;
        }
        if self.replace_selection(el, text).is_some() {
            self.emit(el, NativeEventKind::Input);
        }
    }

    /// Moves the caret/selection as a user would with the mouse or arrows.
    pub fn select(&mut self, el: ElementId, base: usize, extent: usize) {
        let Some(data) = self.elements.get_mut(el) else {
            return;
        };
        let base = clamp_utf16(&data.value, base);
        let extent = clamp_utf16(&data.value, extent);
        data.selection = SelectionRange::from_base_extent(base, extent);
        self.emit(el, NativeEventKind::SelectionChange);
    }

    pub fn press_key(&mut self, el: ElementId, key: Key) {
        self.emit(el, NativeEventKind::KeyDown(key.clone()));
        self.emit(el, NativeEventKind::KeyUp(key));
    }

    /// Focus moved by the user (click, tab).
    pub fn user_focus(&mut self, el: ElementId) {
        self.focus(el);
    }

    /// Focus left `el` without landing anywhere else.
    pub fn user_blur(&mut self, el: ElementId) {
        self.blur(el);
    }

    pub fn compose_start(&mut self, el: ElementId) {
        let Some(data) = self.elements.get(el) else {
            return;
        };
        self.composition = Some(Composition {
            el,
            start: data.selection.start,
            len: 0,
        });
        self.emit(el, NativeEventKind::CompositionStart);
    }

    /// Replaces the in-progress composition with `text`.
    pub fn compose_update(&mut self, el: ElementId, text: &str) {
        let Some(comp) = self.composition.as_ref().filter(|c| c.el == el) else {
            return;
        };
        let (start, len) = (comp.start, comp.len);
        if let Some(data) = self.elements.get_mut(el) {
            data.selection = SelectionRange {
                start,
                end: start + len,
                direction: Default::default(),
            };
        }
        self.replace_selection(el, text);
        if let Some(comp) = self.composition.as_mut() {
            comp.len = utf16_len(text);
        }
        self.emit(el, NativeEventKind::CompositionUpdate(text.to_string()));
        self.emit(el, NativeEventKind::Input);
    }

    pub fn compose_end(&mut self, el: ElementId) {
        let Some(comp) = self.composition.take() else {
            return;
        };
        let committed = self
            .elements
            .get(el)
            .map(|d| {
                let s = byte_index_for_utf16(&d.value, comp.start);
                let e = byte_index_for_utf16(&d.value, comp.start + comp.len);
                d.value[s..e].to_string()
            })
            .unwrap_or_default();
        self.emit(el, NativeEventKind::CompositionEnd(committed));
    }
}

impl HostDom for Document {
    fn create_element(&mut self, tag: Tag) -> ElementId {
        self.elements.insert(ElementData::new(tag))
    }

    fn append_to_semantics_host(&mut self, el: ElementId) {
        if let Some(data) = self.elements.get_mut(el)
            && !data.connected
        {
            data.connected = true;
            self.host_children.push(el);
        }
    }

    fn remove_element(&mut self, el: ElementId) {
        if self.elements.remove(el).is_none() {
            return;
        }
        self.host_children.retain(|c| *c != el);
        // Browsers drop focus to the body without a blur event.
        if self.active == Some(el) {
            self.active = None;
        }
        if self.composition.as_ref().is_some_and(|c| c.el == el) {
            self.composition = None;
        }
        self.events.retain(|e| e.target != el);
    }

    fn is_connected(&self, el: ElementId) -> bool {
        self.elements.get(el).is_some_and(|e| e.connected)
    }

    fn tag(&self, el: ElementId) -> Option<Tag> {
        self.elements.get(el).map(|e| e.tag)
    }

    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str) {
        if let Some(data) = self.elements.get_mut(el) {
            put(&mut data.attributes, name, value);
        }
        // Disabling the focused element drops its focus.
        if name == "disabled" {
            self.blur(el);
        }
    }

    fn remove_attribute(&mut self, el: ElementId, name: &str) {
        if let Some(data) = self.elements.get_mut(el) {
            data.attributes.retain(|(k, _)| k != name);
        }
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<String> {
        self.elements
            .get(el)
            .and_then(|e| get(&e.attributes, name))
            .map(str::to_string)
    }

    fn set_style(&mut self, el: ElementId, property: &str, value: &str) {
        if let Some(data) = self.elements.get_mut(el) {
            put(&mut data.style, property, value);
        }
    }

    fn style(&self, el: ElementId, property: &str) -> Option<String> {
        self.elements
            .get(el)
            .and_then(|e| get(&e.style, property))
            .map(str::to_string)
    }

    fn value(&self, el: ElementId) -> Option<String> {
        self.elements
            .get(el)
            .filter(|e| e.tag.is_editable())
            .map(|e| e.value.clone())
    }

    fn set_value(&mut self, el: ElementId, value: &str) {
        if let Some(data) = self.elements.get_mut(el)
            && data.tag.is_editable()
        {
            data.value = value.to_string();
            data.selection = SelectionRange::collapsed(utf16_len(value));
        }
    }

    fn selection(&self, el: ElementId) -> Option<SelectionRange> {
        self.elements
            .get(el)
            .filter(|e| e.tag.is_editable())
            .map(|e| e.selection)
    }

    fn set_selection_range(&mut self, el: ElementId, range: SelectionRange) {
        let Some(data) = self.elements.get_mut(el) else {
            return;
        };
        if !data.tag.is_editable() {
            return;
        }
        let len = utf16_len(&data.value);
        data.selection = SelectionRange {
            start: range.start.min(len),
            end: range.end.min(len).max(range.start.min(len)),
            direction: range.direction,
        };
        self.emit(el, NativeEventKind::SelectionChange);
        if self.focus_on_selection && self.active != Some(el) {
            self.focus(el);
        }
    }

    fn focus(&mut self, el: ElementId) {
        if self.active == Some(el) || !self.focusable(el) {
            return;
        }
        if let Some(prev) = self.active.take() {
            self.emit(prev, NativeEventKind::Blur);
        }
        self.active = Some(el);
        self.emit(el, NativeEventKind::Focus);
    }

    fn blur(&mut self, el: ElementId) {
        if self.active == Some(el) {
            self.active = None;
            self.emit(el, NativeEventKind::Blur);
        }
    }

    fn root(&self) -> ElementId {
        self.root
    }

    fn active_element(&self) -> Option<ElementId> {
        self.active
    }

    fn add_listeners(&mut self, el: ElementId, mask: EventMask) {
        if let Some(data) = self.elements.get_mut(el) {
            data.listeners |= mask;
        }
    }

    fn remove_listeners(&mut self, el: ElementId, mask: EventMask) {
        if let Some(data) = self.elements.get_mut(el) {
            data.listeners -= mask;
        }
    }

    fn listeners(&self, el: ElementId) -> EventMask {
        self.elements
            .get(el)
            .map(|e| e.listeners)
            .unwrap_or_default()
    }

    fn take_events(&mut self) -> Vec<NativeEvent> {
        self.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn focused_input(doc: &mut Document) -> ElementId {
        let el = doc.create_element(Tag::Input);
        doc.append_to_semantics_host(el);
        doc.add_listeners(el, EventMask::EDITING);
        doc.focus(el);
        doc.take_events();
        el
    }

    #[test]
    fn test_programmatic_writes_are_silent() {
        let mut doc = Document::new();
        let el = focused_input(&mut doc);
        doc.set_value(el, "hello");
        assert_eq!(doc.value(el).as_deref(), Some("hello"));
        assert_eq!(doc.selection(el), Some(SelectionRange::collapsed(5)));
        assert!(doc.take_events().is_empty());
    }

    #[test]
    fn test_typing_replaces_selection_and_emits_input() {
        let mut doc = Document::new();
        let el = focused_input(&mut doc);
        doc.set_value(el, "hello");
        doc.set_selection_range(el, SelectionRange::from_base_extent(1, 4));
        doc.take_events();

        doc.type_text(el, "ey");
        assert_eq!(doc.value(el).as_deref(), Some("heyo"));
        assert_eq!(doc.selection(el), Some(SelectionRange::collapsed(3)));
        assert_eq!(
            doc.take_events(),
            vec![NativeEvent::new(el, NativeEventKind::Input)]
        );
    }

    #[test]
    fn test_focus_moves_emit_blur_then_focus() {
        let mut doc = Document::new();
        let a = focused_input(&mut doc);
        let b = doc.create_element(Tag::TextArea);
        doc.append_to_semantics_host(b);
        doc.add_listeners(b, EventMask::FOCUS);

        doc.focus(b);
        assert_eq!(doc.active_element(), Some(b));
        assert_eq!(
            doc.take_events(),
            vec![
                NativeEvent::new(a, NativeEventKind::Blur),
                NativeEvent::new(b, NativeEventKind::Focus),
            ]
        );
    }

    #[test]
    fn test_disabled_and_detached_elements_refuse_focus() {
        let mut doc = Document::new();
        let el = doc.create_element(Tag::Input);
        doc.focus(el);
        assert_eq!(doc.active_element(), None);

        doc.append_to_semantics_host(el);
        doc.set_attribute(el, "disabled", "");
        doc.focus(el);
        assert_eq!(doc.active_element(), None);

        doc.remove_attribute(el, "disabled");
        doc.focus(el);
        assert_eq!(doc.active_element(), Some(el));
    }

    #[test]
    fn test_events_need_listeners() {
        let mut doc = Document::new();
        let el = focused_input(&mut doc);
        doc.remove_listeners(el, EventMask::EDITING);
        doc.type_text(el, "x");
        assert!(doc.take_events().is_empty());
        assert_eq!(doc.value(el).as_deref(), Some("x"));
    }

    #[test]
    fn test_focus_on_selection_quirk() {
        let mut doc = Document::new();
        doc.focus_on_selection = true;
        let el = doc.create_element(Tag::Input);
        doc.append_to_semantics_host(el);
        doc.set_selection_range(el, SelectionRange::collapsed(0));
        assert_eq!(doc.active_element(), Some(el));
    }

    #[test]
    fn test_composition_replaces_in_place() {
        let mut doc = Document::new();
        let el = focused_input(&mut doc);
        doc.type_text(el, "ab");
        doc.take_events();

        doc.compose_start(el);
        doc.compose_update(el, "n");
        doc.compose_update(el, "に");
        doc.compose_end(el);
        assert_eq!(doc.value(el).as_deref(), Some("abに"));
        let kinds: Vec<_> = doc.take_events().into_iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NativeEventKind::CompositionStart,
                NativeEventKind::CompositionUpdate("n".into()),
                NativeEventKind::Input,
                NativeEventKind::CompositionUpdate("に".into()),
                NativeEventKind::Input,
                NativeEventKind::CompositionEnd("に".into()),
            ]
        );
    }

    #[test]
    fn test_removed_element_loses_focus_silently() {
        let mut doc = Document::new();
        let el = focused_input(&mut doc);
        doc.remove_element(el);
        assert_eq!(doc.active_element(), None);
        assert!(!doc.is_connected(el));
        assert!(doc.take_events().is_empty());
        assert!(doc.semantics_children().is_empty());
    }
}
