use std::time::Duration;

use sembridge_core::NodeId;
use sembridge_dom::{ElementId, HostDom};
use sembridge_editing::{EditingStrategy, Host, HostTask};

/// Work a role asks for that must wait until the whole batch is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostUpdate {
    Activate { node: NodeId, element: ElementId },
}

/// Per-view state handed to every role: the host DOM and task queue, the
/// view's single editing strategy, and the post-update queue.
pub struct BridgeContext<D: HostDom> {
    pub host: Host<D>,
    pub strategy: EditingStrategy,
    post_update: Vec<PostUpdate>,
}

impl<D: HostDom> BridgeContext<D> {
    pub fn new(dom: D) -> Self {
        Self {
            host: Host::new(dom),
            strategy: EditingStrategy::new(),
            post_update: Vec::new(),
        }
    }

    pub fn with_handoff_delay(mut self, delay: Duration) -> Self {
        self.host.handoff_delay = delay;
        self
    }

    pub fn dom(&self) -> &D {
        &self.host.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.host.dom
    }

    pub fn request_activation(&mut self, node: NodeId, element: ElementId) {
        self.post_update.push(PostUpdate::Activate { node, element });
    }

    pub fn has_post_update(&self) -> bool {
        !self.post_update.is_empty()
    }

    /// Runs queued post-update work. Only one element can be active per
    /// view, so when several nodes asked for focus in one batch the last
    /// request wins.
    pub fn run_post_update(&mut self) {
        let mut requests = std::mem::take(&mut self.post_update);
        let Some(PostUpdate::Activate { node, element }) = requests.pop() else {
            return;
        };
        for PostUpdate::Activate { node: skipped, .. } in requests {
            log::debug!("activation of node {skipped} superseded by node {node}");
        }
        if !self.host.dom.is_connected(element) {
            log::debug!("node {node} was removed before its activation ran");
            return;
        }
        self.strategy.activate(&mut self.host, element);
    }

    /// Feeds native events observed since the last call to the strategy.
    pub fn pump_native_events(&mut self) -> usize {
        let events = self.host.dom.take_events();
        for event in &events {
            self.strategy.handle_native_event(&mut self.host, event);
        }
        events.len()
    }

    /// Runs one turn of deferred tasks.
    pub fn run_deferred_turn(&mut self) -> usize {
        let tasks = self.host.tasks.take_turn();
        self.run_tasks(tasks)
    }

    /// Runs every pending task without waiting for its deadline.
    pub fn run_all_deferred(&mut self) -> usize {
        let tasks = self.host.tasks.take_all();
        self.run_tasks(tasks)
    }

    fn run_tasks(&mut self, tasks: Vec<HostTask>) -> usize {
        let n = tasks.len();
        for task in tasks {
            self.strategy.run_task(&mut self.host, task);
        }
        n
    }
}
