use std::collections::{HashMap, HashSet};

use sembridge_core::{NodeId, SemanticsObject, SemanticsUpdate};
use sembridge_dom::{ElementId, HostDom};

use crate::context::BridgeContext;
use crate::role::SemanticRole;

/// Owns every [`SemanticsObject`] of a view and the role attached to each.
#[derive(Default)]
pub struct SemanticsTree {
    objects: HashMap<NodeId, SemanticsObject>,
    roles: HashMap<NodeId, SemanticRole>,
}

impl SemanticsTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn object(&self, id: NodeId) -> Option<&SemanticsObject> {
        self.objects.get(&id)
    }

    pub fn role(&self, id: NodeId) -> Option<&SemanticRole> {
        self.roles.get(&id)
    }

    pub fn element_of(&self, id: NodeId) -> Option<ElementId> {
        self.roles.get(&id).and_then(SemanticRole::element)
    }

    /// Node ids in ascending order.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<_> = self.objects.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Applies one batch: node updates in order, then removals (and, for a
    /// full tree, every node the batch did not mention), then the
    /// activations roles asked for.
    pub fn apply<D: HostDom>(&mut self, update: &SemanticsUpdate, cx: &mut BridgeContext<D>) {
        let mut seen = HashSet::with_capacity(update.nodes.len());
        for node in &update.nodes {
            seen.insert(node.id);
            let obj = self
                .objects
                .entry(node.id)
                .or_insert_with(|| SemanticsObject::new(node.id));
            obj.apply(node);

            let wanted = obj.role();
            let stale = self.roles.get(&node.id).is_some_and(|r| r.kind() != wanted);
            if stale && let Some(mut old) = self.roles.remove(&node.id) {
                log::debug!("node {} changed role {:?} -> {wanted:?}", node.id, old.kind());
                old.dispose(cx);
            }
            self.roles
                .entry(node.id)
                .or_insert_with(|| SemanticRole::for_object(obj))
                .update_from(obj, cx);
        }

        for id in &update.removed {
            self.remove(*id, cx);
        }
        if update.full_tree {
            let gone: Vec<NodeId> = self
                .objects
                .keys()
                .filter(|id| !seen.contains(id))
                .copied()
                .collect();
            for id in gone {
                self.remove(id, cx);
            }
        }

        cx.run_post_update();
    }

    fn remove<D: HostDom>(&mut self, id: NodeId, cx: &mut BridgeContext<D>) {
        self.objects.remove(&id);
        if let Some(mut role) = self.roles.remove(&id) {
            role.dispose(cx);
        }
    }

    /// Disposes every role; the DOM is left without bridge elements.
    pub fn clear<D: HostDom>(&mut self, cx: &mut BridgeContext<D>) {
        for id in self.ids() {
            self.remove(id, cx);
        }
    }
}
