//! Per-view bridge sessions.
//!
//! A [`Session`] is what a host embeds once per rendering view. It owns the
//! semantics tree and the [`BridgeContext`] (and with it the view's single
//! editing strategy), routes text input channel calls, pumps native events
//! and runs deferred tasks. Messages for the framework are queued and handed
//! to a [`ChannelSink`].
//!
//! On wasm32 with the `web` feature, `web` provides a web-sys backed
//! [`HostDom`] and a `wasm_bindgen` entry point.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

use sembridge_core::{
    BridgeError, BridgeResult, ClientId, InputAction, InputConfiguration, SemanticsUpdate,
};
use sembridge_dom::{Document, HostDom};
use sembridge_editing::{
    EditingState, EditingStrategy, OnAction, OnChange, TextInputCommand, decode_method_call,
    encode_perform_action, encode_update_editing_state,
};
use sembridge_semantics::{BridgeContext, SemanticsTree};

#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub mod web;

mod tests;

/// Upper bound on pump/turn rounds in [`Session::settle`].
const SETTLE_ROUNDS: usize = 32;

/// Session configuration.
#[derive(Clone, Debug)]
pub struct BridgeOptions {
    /// Delay before focus is handed back to the root surface after a blur
    /// or `disable()`. Zero means "next turn".
    pub handoff_delay: Duration,
    /// Make the in-memory document focus inputs on `setSelectionRange`, as
    /// some WebKit builds do.
    pub focus_on_selection: bool,
    /// Console log level for the web runner.
    pub log_level: log::Level,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            handoff_delay: Duration::ZERO,
            focus_on_selection: false,
            log_level: log::Level::Info,
        }
    }
}

/// Receives encoded `TextInputClient.*` messages for the framework.
pub trait ChannelSink {
    fn send(&mut self, message: &str);
}

/// Drops messages; they stay readable through [`Session::take_outbound`].
pub struct NoopSink;

impl ChannelSink for NoopSink {
    fn send(&mut self, message: &str) {
        log::trace!("outbound (no sink): {message}");
    }
}

/// Collects messages into a shared buffer.
impl ChannelSink for Rc<RefCell<Vec<String>>> {
    fn send(&mut self, message: &str) {
        self.borrow_mut().push(message.to_string());
    }
}

/// Adapts a closure.
pub struct FnSink<F>(pub F);

impl<F: FnMut(&str)> ChannelSink for FnSink<F> {
    fn send(&mut self, message: &str) {
        (self.0)(message)
    }
}

pub struct Session<D: HostDom> {
    tree: SemanticsTree,
    cx: BridgeContext<D>,
    /// Client named by the last `setClient`, kept across `hide`.
    client: Option<(ClientId, InputConfiguration)>,
    outbound: Rc<RefCell<Vec<String>>>,
    sink: Option<Box<dyn ChannelSink>>,
    on_change: OnChange,
    on_action: OnAction,
}

impl Session<Document> {
    /// A session over the in-memory document.
    pub fn in_memory(options: &BridgeOptions) -> Self {
        let mut doc = Document::new();
        doc.focus_on_selection = options.focus_on_selection;
        Self::new(doc, options)
    }
}

impl<D: HostDom> Session<D> {
    pub fn new(dom: D, options: &BridgeOptions) -> Self {
        let outbound: Rc<RefCell<Vec<String>>> = Rc::default();
        let changes = outbound.clone();
        let actions = outbound.clone();
        Self {
            tree: SemanticsTree::new(),
            cx: BridgeContext::new(dom).with_handoff_delay(options.handoff_delay),
            client: None,
            outbound,
            sink: None,
            on_change: Rc::new(move |client: ClientId, state: &EditingState| {
                changes
                    .borrow_mut()
                    .push(encode_update_editing_state(client, state));
            }),
            on_action: Rc::new(move |client: ClientId, action: InputAction| {
                actions
                    .borrow_mut()
                    .push(encode_perform_action(client, action));
            }),
        }
    }

    pub fn with_sink(mut self, sink: impl ChannelSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn tree(&self) -> &SemanticsTree {
        &self.tree
    }

    pub fn context(&self) -> &BridgeContext<D> {
        &self.cx
    }

    pub fn dom(&self) -> &D {
        self.cx.dom()
    }

    pub fn dom_mut(&mut self) -> &mut D {
        self.cx.dom_mut()
    }

    pub fn strategy(&self) -> &EditingStrategy {
        &self.cx.strategy
    }

    pub fn client(&self) -> Option<ClientId> {
        self.client.as_ref().map(|(id, _)| *id)
    }

    /// Earliest deadline among deferred tasks, for hosts that drive turns
    /// with timers.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.cx.host.tasks.next_due()
    }

    pub fn update_semantics(&mut self, update: &SemanticsUpdate) {
        self.tree.apply(update, &mut self.cx);
        self.flush();
    }

    pub fn update_semantics_json(&mut self, json: &str) -> BridgeResult<()> {
        let update: SemanticsUpdate = serde_json::from_str(json)?;
        self.update_semantics(&update);
        Ok(())
    }

    /// Entry point for `TextInput.*` method calls. Malformed calls are
    /// returned as errors; calls for a superseded client are dropped.
    pub fn handle_channel_message(&mut self, json: &str) -> BridgeResult<()> {
        let (client, command) = decode_method_call(json)?;
        match self.dispatch_command(client, command) {
            Err(BridgeError::StaleClient { client, active }) => {
                log::debug!("dropping command for {client}; active client is {active:?}");
                Ok(())
            }
            other => other,
        }
    }

    pub fn dispatch_command(
        &mut self,
        addressed: Option<ClientId>,
        command: TextInputCommand,
    ) -> BridgeResult<()> {
        let result = self.apply_command(addressed, command);
        self.flush();
        result
    }

    fn apply_command(
        &mut self,
        addressed: Option<ClientId>,
        command: TextInputCommand,
    ) -> BridgeResult<()> {
        let host = &mut self.cx.host;
        let strategy = &mut self.cx.strategy;

        if let TextInputCommand::SetClient { client, config } = command {
            log::debug!("setClient {client} {:?}", config.input_type);
            if strategy.is_enabled() {
                strategy.enable(
                    host,
                    client,
                    config.clone(),
                    self.on_change.clone(),
                    self.on_action.clone(),
                );
            }
            self.client = Some((client, config));
            return Ok(());
        }

        let current = self.client.as_ref().map(|(id, _)| *id);
        if let Some(client) = addressed
            && Some(client) != current
        {
            return Err(BridgeError::StaleClient {
                client,
                active: current,
            });
        }

        match command {
            TextInputCommand::SetClient { .. } => {}
            TextInputCommand::Show => match &self.client {
                Some((client, _)) if strategy.is_enabled() && strategy.client() == Some(*client) => {
                    log::trace!("show: {client} already enabled");
                }
                Some((client, config)) => strategy.enable(
                    host,
                    *client,
                    config.clone(),
                    self.on_change.clone(),
                    self.on_action.clone(),
                ),
                None => log::debug!("show without a client"),
            },
            TextInputCommand::Hide => strategy.hide(host),
            TextInputCommand::ClearClient => {
                strategy.clear_client(host);
                self.client = None;
            }
            TextInputCommand::SetEditingState(state) => {
                if current.is_none() {
                    log::debug!("editing state without a client dropped");
                    return Ok(());
                }
                strategy.set_editing_state(host, state);
            }
            TextInputCommand::SetEditableSizeAndTransform(geometry) => {
                strategy.set_editable_size_and_transform(host, geometry)
            }
            TextInputCommand::SetStyle(style) => strategy.set_style(host, style),
            TextInputCommand::Ignored(name) => log::trace!("{name} ignored"),
        }
        Ok(())
    }

    /// Feeds native events to the strategy. Returns how many were handled.
    pub fn pump_native_events(&mut self) -> usize {
        let n = self.cx.pump_native_events();
        self.flush();
        n
    }

    /// Runs one turn of deferred tasks.
    pub fn run_deferred_turn(&mut self) -> usize {
        let n = self.cx.run_deferred_turn();
        self.flush();
        n
    }

    /// Pumps events and runs deferred work until both are quiet. Deadlines
    /// are not waited for.
    pub fn settle(&mut self) {
        for _ in 0..SETTLE_ROUNDS {
            let events = self.cx.pump_native_events();
            let tasks = self.cx.run_all_deferred();
            if events == 0 && tasks == 0 {
                break;
            }
        }
        self.flush();
    }

    /// Messages produced since the last call that were not handed to a sink.
    pub fn take_outbound(&mut self) -> Vec<String> {
        std::mem::take(&mut *self.outbound.borrow_mut())
    }

    /// Disposes every role and ends any editing session.
    pub fn shutdown(&mut self) {
        self.cx.strategy.clear_client(&mut self.cx.host);
        self.client = None;
        self.tree.clear(&mut self.cx);
        self.settle();
    }

    fn flush(&mut self) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let messages = std::mem::take(&mut *self.outbound.borrow_mut());
        for message in &messages {
            sink.send(message);
        }
    }
}
