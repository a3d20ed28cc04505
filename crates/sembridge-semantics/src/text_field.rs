use sembridge_core::{NodeId, SemanticsChanges, SemanticsObject};
use sembridge_dom::{ElementId, HostDom, Tag};

use crate::context::BridgeContext;

/// Role for an editable text node. Owns one `<input>` or `<textarea>`,
/// chosen when the role is created.
///
/// The role only writes attributes and geometry. Value and selection belong
/// to the editing strategy and are never touched here, so a semantics
/// update cannot stomp on text the user is typing.
///
/// Activation is edge-triggered: the role asks for it when the node is
/// created focused or its focus flag turns on. A node that stays focused
/// across updates never pulls focus back after a native blur.
#[derive(Debug)]
pub struct TextFieldRole {
    node: NodeId,
    multiline: bool,
    element: Option<ElementId>,
    /// Focused-and-enabled as of the previous update.
    wants_focus: bool,
}

impl TextFieldRole {
    pub fn new(node: NodeId, multiline: bool) -> Self {
        Self {
            node,
            multiline,
            element: None,
            wants_focus: false,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    pub fn element(&self) -> Option<ElementId> {
        self.element
    }

    pub fn update_from<D: HostDom>(&mut self, obj: &SemanticsObject, cx: &mut BridgeContext<D>) {
        let (el, changes) = match self.element {
            Some(el) => (el, obj.changes()),
            None => (self.create(cx), SemanticsChanges::all()),
        };
        let dom = &mut cx.host.dom;

        if changes.contains(SemanticsChanges::LABEL) {
            if obj.label.is_empty() {
                dom.remove_attribute(el, "aria-label");
            } else {
                dom.set_attribute(el, "aria-label", &obj.label);
            }
        }
        if changes.contains(SemanticsChanges::HINT) {
            if obj.hint.is_empty() {
                dom.remove_attribute(el, "aria-description");
            } else {
                dom.set_attribute(el, "aria-description", &obj.hint);
            }
        }
        if changes.contains(SemanticsChanges::FLAGS) {
            toggle_attribute(dom, el, "disabled", !obj.is_enabled());
            toggle_attribute(dom, el, "readonly", obj.is_read_only());
            if !self.multiline {
                let kind = if obj.is_obscured() { "password" } else { "text" };
                dom.set_attribute(el, "type", kind);
            }
        }
        if changes.contains(SemanticsChanges::RECT) {
            cx.host
                .placement
                .place_from_semantics(&mut cx.host.dom, el, obj.rect);
        }

        // Unfocused nodes never blur; only native focus changes do that.
        let wants_focus = obj.is_focused() && obj.is_enabled();
        let gained = wants_focus && !self.wants_focus;
        self.wants_focus = wants_focus;
        if gained {
            let settled =
                cx.strategy.is_active(el) && cx.host.dom.active_element() == Some(el);
            if !settled {
                cx.request_activation(self.node, el);
            }
        }
    }

    /// Releases and removes the element. Safe to call more than once, and on
    /// a role that never created one.
    pub fn dispose<D: HostDom>(&mut self, cx: &mut BridgeContext<D>) {
        let Some(el) = self.element.take() else {
            return;
        };
        cx.strategy.release(&mut cx.host, el);
        cx.host.placement.forget(el);
        cx.host.dom.remove_element(el);
    }

    fn create<D: HostDom>(&mut self, cx: &mut BridgeContext<D>) -> ElementId {
        let tag = if self.multiline {
            Tag::TextArea
        } else {
            Tag::Input
        };
        let dom = &mut cx.host.dom;
        let el = dom.create_element(tag);
        dom.set_style(el, "position", "absolute");
        dom.set_style(el, "top", "0");
        dom.set_style(el, "left", "0");
        dom.append_to_semantics_host(el);
        log::debug!("node {} created <{}>", self.node, tag.name());
        self.element = Some(el);
        el
    }
}

fn toggle_attribute<D: HostDom>(dom: &mut D, el: ElementId, name: &str, on: bool) {
    if on {
        dom.set_attribute(el, name, "");
    } else if dom.attribute(el, name).is_some() {
        dom.remove_attribute(el, name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sembridge_core::{Rect, SemanticsFlags, SemanticsNodeUpdate};
    use sembridge_dom::Document;

    fn object(update: SemanticsNodeUpdate) -> SemanticsObject {
        let mut obj = SemanticsObject::new(update.id);
        obj.apply(&update);
        obj
    }

    fn field(id: u64) -> SemanticsNodeUpdate {
        SemanticsNodeUpdate::new(id)
            .with_flag(SemanticsFlags::IS_TEXT_FIELD, true)
            .rect(Rect::new(0.0, 0.0, 100.0, 50.0))
    }

    #[test]
    fn test_creates_input_with_aria() {
        let mut cx = BridgeContext::new(Document::new());
        let mut role = TextFieldRole::new(1, false);
        role.update_from(&object(field(1).label("Name").hint("Your name")), &mut cx);

        let el = role.element().unwrap();
        assert_eq!(cx.dom().tag(el), Some(Tag::Input));
        assert_eq!(cx.dom().attribute(el, "aria-label").as_deref(), Some("Name"));
        assert_eq!(
            cx.dom().attribute(el, "aria-description").as_deref(),
            Some("Your name")
        );
        assert_eq!(cx.dom().attribute(el, "type").as_deref(), Some("text"));
        assert_eq!(cx.dom().attribute(el, "role"), None);
        assert!(!cx.has_post_update());
    }

    #[test]
    fn test_disabled_and_obscured_flags() {
        let mut cx = BridgeContext::new(Document::new());
        let mut role = TextFieldRole::new(1, false);
        let update = field(1)
            .with_flag(SemanticsFlags::IS_ENABLED, false)
            .with_flag(SemanticsFlags::IS_OBSCURED, true);
        role.update_from(&object(update), &mut cx);

        let el = role.element().unwrap();
        assert!(cx.dom().attribute(el, "disabled").is_some());
        assert_eq!(cx.dom().attribute(el, "type").as_deref(), Some("password"));
    }

    #[test]
    fn test_multiline_uses_textarea() {
        let mut cx = BridgeContext::new(Document::new());
        let mut role = TextFieldRole::new(2, true);
        let update = field(2).with_flag(SemanticsFlags::IS_MULTILINE, true);
        role.update_from(&object(update), &mut cx);
        let el = role.element().unwrap();
        assert_eq!(cx.dom().tag(el), Some(Tag::TextArea));
        assert_eq!(cx.dom().attribute(el, "type"), None);
    }

    #[test]
    fn test_focused_node_requests_activation() {
        let mut cx = BridgeContext::new(Document::new());
        let mut role = TextFieldRole::new(1, false);
        role.update_from(
            &object(field(1).with_flag(SemanticsFlags::IS_FOCUSED, true)),
            &mut cx,
        );
        assert!(cx.has_post_update());
        cx.run_post_update();
        assert_eq!(cx.dom().active_element(), role.element());
    }

    #[test]
    fn test_staying_focused_does_not_request_again() {
        let mut cx = BridgeContext::new(Document::new());
        let mut role = TextFieldRole::new(1, false);
        let focused = || field(1).with_flag(SemanticsFlags::IS_FOCUSED, true);
        role.update_from(&object(focused()), &mut cx);
        cx.run_post_update();
        let el = role.element().unwrap();

        cx.dom_mut().user_blur(el);
        role.update_from(&object(focused().label("Renamed")), &mut cx);
        assert!(!cx.has_post_update());

        // Off then on again is a new focus request.
        role.update_from(&object(field(1)), &mut cx);
        assert!(!cx.has_post_update());
        role.update_from(&object(focused()), &mut cx);
        assert!(cx.has_post_update());
    }

    #[test]
    fn test_enabling_a_focused_node_requests_activation() {
        let mut cx = BridgeContext::new(Document::new());
        let mut role = TextFieldRole::new(1, false);
        let focused = || field(1).with_flag(SemanticsFlags::IS_FOCUSED, true);
        role.update_from(
            &object(focused().with_flag(SemanticsFlags::IS_ENABLED, false)),
            &mut cx,
        );
        assert!(!cx.has_post_update());
        role.update_from(&object(focused()), &mut cx);
        assert!(cx.has_post_update());
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut cx = BridgeContext::new(Document::new());
        let mut never_updated = TextFieldRole::new(1, false);
        never_updated.dispose(&mut cx);
        never_updated.dispose(&mut cx);

        let mut role = TextFieldRole::new(2, false);
        role.update_from(&object(field(2)), &mut cx);
        let el = role.element().unwrap();
        role.dispose(&mut cx);
        role.dispose(&mut cx);
        assert!(!cx.dom().is_connected(el));
    }
}
