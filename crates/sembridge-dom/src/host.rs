use crate::{ElementId, EventMask, NativeEvent, SelectionRange, Tag};

/// The slice of the browser DOM the bridge is allowed to touch.
///
/// Implemented by the in-memory [`Document`](crate::Document) and, on wasm32,
/// by the web-sys backend in `sembridge-platform`. Calls naming an element the
/// host no longer knows about are no-ops (or return `None`); the bridge treats
/// the DOM as an external resource that may change underneath it.
pub trait HostDom {
    fn create_element(&mut self, tag: Tag) -> ElementId;

    /// Inserts `el` under the semantics host so assistive technology sees it.
    fn append_to_semantics_host(&mut self, el: ElementId);

    /// Detaches `el` and releases the handle.
    fn remove_element(&mut self, el: ElementId);

    fn is_connected(&self, el: ElementId) -> bool;

    fn tag(&self, el: ElementId) -> Option<Tag>;

    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str);
    fn remove_attribute(&mut self, el: ElementId, name: &str);
    fn attribute(&self, el: ElementId, name: &str) -> Option<String>;

    fn set_style(&mut self, el: ElementId, property: &str, value: &str);
    fn style(&self, el: ElementId, property: &str) -> Option<String>;

    /// Live value of an editable element.
    fn value(&self, el: ElementId) -> Option<String>;
    fn set_value(&mut self, el: ElementId, value: &str);

    fn selection(&self, el: ElementId) -> Option<SelectionRange>;
    fn set_selection_range(&mut self, el: ElementId, range: SelectionRange);

    fn focus(&mut self, el: ElementId);
    fn blur(&mut self, el: ElementId);

    /// The framework's root interaction surface.
    fn root(&self) -> ElementId;

    /// Moves focus back to the root surface.
    fn focus_root(&mut self) {
        let root = self.root();
        self.focus(root);
    }

    /// Element holding document focus; `None` means the body.
    fn active_element(&self) -> Option<ElementId>;

    fn add_listeners(&mut self, el: ElementId, mask: EventMask);
    fn remove_listeners(&mut self, el: ElementId, mask: EventMask);
    fn listeners(&self, el: ElementId) -> EventMask;

    /// Native events observed through attached listeners since the last call.
    fn take_events(&mut self) -> Vec<NativeEvent>;
}
