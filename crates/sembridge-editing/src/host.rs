use std::time::Duration;

use sembridge_dom::{ElementId, HostDom, TaskQueue};

use crate::focus::FocusToken;
use crate::placement::Placement;

/// Deferred work the bridge posts to the host event loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostTask {
    /// Give focus back to the root surface once the current turn is over,
    /// unless something newer claimed it first.
    FocusHandoff { token: FocusToken, from: ElementId },
}

/// Host-side resources shared by roles and the editing strategy of one view.
pub struct Host<D: HostDom> {
    pub dom: D,
    pub tasks: TaskQueue<HostTask>,
    pub placement: Placement,
    pub handoff_delay: Duration,
}

impl<D: HostDom> Host<D> {
    pub fn new(dom: D) -> Self {
        Self {
            dom,
            tasks: TaskQueue::new(),
            placement: Placement::new(),
            handoff_delay: Duration::ZERO,
        }
    }

    pub fn with_handoff_delay(mut self, delay: Duration) -> Self {
        self.handoff_delay = delay;
        self
    }
}
