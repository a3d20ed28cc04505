//! Focus arbitration.
//!
//! Rules shared by roles and the strategy:
//!
//! 1. Only activation (or the refocus that follows a framework editing
//!    state) programmatically focuses an editing element.
//! 2. Only a native blur, `disable()` or a configuration switch gives it up.
//! 3. A semantics node reporting "not focused" is advisory and never blurs.
//!
//! Giving up focus never blurs synchronously. A handoff to the root surface
//! is posted for the next turn, tagged with the current generation; every
//! grant bumps the generation, so a handoff that lost the race is a no-op.

use sembridge_dom::{ElementId, HostDom, TaskId, TaskQueue};

use crate::host::{Host, HostTask};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FocusToken(u64);

/// Why an element stopped being the editing target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relinquish {
    NativeBlur,
    Disable,
    ConfigSwitch,
    /// The owning role went away.
    Released,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandoffOutcome {
    /// Focus moved to (or already sat on) the root surface.
    Completed,
    /// A newer grant happened after the handoff was posted.
    Stale,
    /// Focus landed on an unrelated element in the meantime.
    Superseded,
}

#[derive(Default)]
pub struct FocusArbiter {
    generation: u64,
    pending: Option<(TaskId, FocusToken)>,
}

impl FocusArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> FocusToken {
        FocusToken(self.generation)
    }

    pub fn has_pending_handoff(&self) -> bool {
        self.pending.is_some()
    }

    /// Focuses `el` on behalf of an activation and cancels any handoff.
    pub fn grant<D: HostDom>(&mut self, host: &mut Host<D>, el: ElementId) {
        self.invalidate(&mut host.tasks);
        host.dom.focus(el);
    }

    /// Makes every outstanding handoff stale.
    pub fn invalidate(&mut self, tasks: &mut TaskQueue<HostTask>) {
        self.generation += 1;
        if let Some((id, _)) = self.pending.take() {
            tasks.cancel(id);
        }
    }

    pub fn schedule_handoff<D: HostDom>(
        &mut self,
        host: &mut Host<D>,
        from: ElementId,
        reason: Relinquish,
    ) {
        if let Some((id, _)) = self.pending.take() {
            host.tasks.cancel(id);
        }
        let token = self.current();
        let id = host
            .tasks
            .schedule(host.handoff_delay, HostTask::FocusHandoff { token, from });
        log::debug!("focus handoff from {from:?} scheduled ({reason:?})");
        self.pending = Some((id, token));
    }

    pub fn run_handoff<D: HostDom>(
        &mut self,
        dom: &mut D,
        token: FocusToken,
        from: ElementId,
    ) -> HandoffOutcome {
        if token != self.current() {
            return HandoffOutcome::Stale;
        }
        if self.pending.is_some_and(|(_, t)| t == token) {
            self.pending = None;
        }
        let root = dom.root();
        match dom.active_element() {
            Some(a) if a == root => HandoffOutcome::Completed,
            Some(a) if a != from => {
                log::debug!("focus handoff from {from:?} superseded by {a:?}");
                HandoffOutcome::Superseded
            }
            _ => {
                dom.focus_root();
                HandoffOutcome::Completed
            }
        }
    }
}
