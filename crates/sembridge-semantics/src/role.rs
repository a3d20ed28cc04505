use sembridge_core::{NodeId, Role, SemanticsChanges, SemanticsFlags, SemanticsObject};
use sembridge_dom::{ElementId, HostDom, Tag};

use crate::context::BridgeContext;
use crate::text_field::TextFieldRole;

/// Role attached to a semantics node. Picked once from the node's flags;
/// a node whose flags later imply a different [`Role`] gets a new one.
#[derive(Debug)]
pub enum SemanticRole {
    TextField(TextFieldRole),
    Generic(GenericRole),
}

impl SemanticRole {
    pub fn for_object(obj: &SemanticsObject) -> Self {
        match obj.role() {
            Role::TextField => SemanticRole::TextField(TextFieldRole::new(obj.id, false)),
            Role::MultilineTextField => SemanticRole::TextField(TextFieldRole::new(obj.id, true)),
            kind => SemanticRole::Generic(GenericRole::new(obj.id, kind)),
        }
    }

    pub fn kind(&self) -> Role {
        match self {
            SemanticRole::TextField(tf) if tf.is_multiline() => Role::MultilineTextField,
            SemanticRole::TextField(_) => Role::TextField,
            SemanticRole::Generic(g) => g.kind,
        }
    }

    pub fn element(&self) -> Option<ElementId> {
        match self {
            SemanticRole::TextField(tf) => tf.element(),
            SemanticRole::Generic(g) => g.element,
        }
    }

    pub fn update_from<D: HostDom>(&mut self, obj: &SemanticsObject, cx: &mut BridgeContext<D>) {
        match self {
            SemanticRole::TextField(tf) => tf.update_from(obj, cx),
            SemanticRole::Generic(g) => g.update_from(obj, cx),
        }
    }

    pub fn dispose<D: HostDom>(&mut self, cx: &mut BridgeContext<D>) {
        match self {
            SemanticRole::TextField(tf) => tf.dispose(cx),
            SemanticRole::Generic(g) => g.dispose(cx),
        }
    }
}

/// Non-editable nodes: a labelled `<div>`, with an ARIA role for buttons and
/// checkboxes.
#[derive(Debug)]
pub struct GenericRole {
    node: NodeId,
    kind: Role,
    element: Option<ElementId>,
}

impl GenericRole {
    pub fn new(node: NodeId, kind: Role) -> Self {
        Self {
            node,
            kind,
            element: None,
        }
    }

    pub fn update_from<D: HostDom>(&mut self, obj: &SemanticsObject, cx: &mut BridgeContext<D>) {
        let (el, changes) = match self.element {
            Some(el) => (el, obj.changes()),
            None => {
                let dom = &mut cx.host.dom;
                let el = dom.create_element(Tag::Div);
                dom.set_style(el, "position", "absolute");
                match self.kind {
                    Role::Button => dom.set_attribute(el, "role", "button"),
                    Role::Checkbox => dom.set_attribute(el, "role", "checkbox"),
                    _ => {}
                }
                dom.append_to_semantics_host(el);
                self.element = Some(el);
                (el, SemanticsChanges::all())
            }
        };
        let dom = &mut cx.host.dom;

        if changes.contains(SemanticsChanges::LABEL) {
            if obj.label.is_empty() {
                dom.remove_attribute(el, "aria-label");
            } else {
                dom.set_attribute(el, "aria-label", &obj.label);
            }
        }
        if changes.contains(SemanticsChanges::FLAGS) {
            if obj.flags.contains(SemanticsFlags::HAS_ENABLED_STATE) {
                let disabled = if obj.is_enabled() { "false" } else { "true" };
                dom.set_attribute(el, "aria-disabled", disabled);
            }
            if self.kind == Role::Checkbox {
                let checked = obj.flags.contains(SemanticsFlags::IS_CHECKED);
                dom.set_attribute(el, "aria-checked", if checked { "true" } else { "false" });
            }
        }
        if changes.contains(SemanticsChanges::RECT) {
            cx.host
                .placement
                .place_from_semantics(&mut cx.host.dom, el, obj.rect);
        }
    }

    pub fn dispose<D: HostDom>(&mut self, cx: &mut BridgeContext<D>) {
        if let Some(el) = self.element.take() {
            log::trace!("node {} disposing generic element", self.node);
            cx.host.placement.forget(el);
            cx.host.dom.remove_element(el);
        }
    }
}
