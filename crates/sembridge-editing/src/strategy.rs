//! The editing strategy: one per view, owning the single active element.

use std::rc::Rc;

use sembridge_core::{ClientId, InputAction, InputConfiguration, utf16_len};
use sembridge_dom::{ElementId, EventMask, HostDom, Key, NativeEvent, NativeEventKind, Tag};

use crate::channel::EditableTextStyle;
use crate::editing_state::EditingState;
use crate::focus::{FocusArbiter, HandoffOutcome, Relinquish};
use crate::host::{Host, HostTask};
use crate::placement::EditableTextGeometry;

pub type OnChange = Rc<dyn Fn(ClientId, &EditingState)>;
pub type OnAction = Rc<dyn Fn(ClientId, InputAction)>;

struct ClientBinding {
    client: ClientId,
    config: InputConfiguration,
    on_change: OnChange,
    on_action: OnAction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyState {
    Disabled,
    Enabled { active: Option<ElementId> },
}

/// Bridges native editing events and framework commands for the one
/// element currently being edited.
///
/// `Disabled` → `Enabled(no active)` → `Enabled(active)` → `Disabled`.
/// The strategy never creates or removes elements; roles hand them in via
/// [`activate`](Self::activate) and take them back via
/// [`release`](Self::release).
#[derive(Default)]
pub struct EditingStrategy {
    binding: Option<ClientBinding>,
    enabled: bool,
    active: Option<ElementId>,
    attached: bool,
    /// Last state known to both sides; native snapshots are diffed against it.
    last_state: Option<EditingState>,
    geometry: Option<EditableTextGeometry>,
    style: Option<EditableTextStyle>,
    composing_text: Option<String>,
    focus: FocusArbiter,
}

impl EditingStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StrategyState {
        if self.enabled {
            StrategyState::Enabled {
                active: self.active,
            }
        } else {
            StrategyState::Disabled
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn active_element(&self) -> Option<ElementId> {
        self.active
    }

    pub fn is_active(&self, el: ElementId) -> bool {
        self.active == Some(el)
    }

    pub fn client(&self) -> Option<ClientId> {
        self.binding.as_ref().map(|b| b.client)
    }

    pub fn config(&self) -> Option<&InputConfiguration> {
        self.binding.as_ref().map(|b| &b.config)
    }

    pub fn last_state(&self) -> Option<&EditingState> {
        self.last_state.as_ref()
    }

    pub fn geometry(&self) -> Option<EditableTextGeometry> {
        self.geometry
    }

    pub fn focus_arbiter(&self) -> &FocusArbiter {
        &self.focus
    }

    /// Starts (or switches) an editing session.
    ///
    /// Enabling while already enabled is a configuration switch: the previous
    /// element's listeners come off and the slot is cleared; the caller is
    /// expected to activate a role-created element for the new
    /// configuration. Focus may stay on the old element until that happens
    /// or the deferred handoff runs.
    pub fn enable<D: HostDom>(
        &mut self,
        host: &mut Host<D>,
        client: ClientId,
        config: InputConfiguration,
        on_change: OnChange,
        on_action: OnAction,
    ) {
        if self.enabled {
            log::debug!("configuration switch to {client}");
            self.relinquish(host, Relinquish::ConfigSwitch);
            self.last_state = None;
            self.geometry = None;
            self.style = None;
        }
        self.binding = Some(ClientBinding {
            client,
            config,
            on_change,
            on_action,
        });
        self.enabled = true;

        if let Some(el) = self.active {
            if host.dom.is_connected(el) {
                self.attach(host, el);
            } else {
                self.active = None;
            }
        }
    }

    /// Makes `el` the active element and focuses it.
    pub fn activate<D: HostDom>(&mut self, host: &mut Host<D>, el: ElementId) {
        if self.active != Some(el) {
            if let Some(prev) = self.active.take() {
                self.detach(host, prev);
            }
            self.active = Some(el);
            self.composing_text = None;
        }
        if self.enabled && !self.attached {
            self.attach(host, el);
        }
        self.focus.grant(host, el);
    }

    /// Ends the editing session. The element stays in the DOM; focus moves
    /// to the root surface on the next turn if the element still holds it.
    pub fn disable<D: HostDom>(&mut self, host: &mut Host<D>) {
        if !self.enabled && self.active.is_none() {
            return;
        }
        self.enabled = false;
        self.relinquish(host, Relinquish::Disable);
        self.last_state = None;
        self.geometry = None;
        self.style = None;
    }

    /// `TextInput.hide`: stop editing but remember the client so a later
    /// `show` can resume.
    pub fn hide<D: HostDom>(&mut self, host: &mut Host<D>) {
        self.disable(host);
    }

    /// `TextInput.clearClient`: stop editing and forget the client.
    pub fn clear_client<D: HostDom>(&mut self, host: &mut Host<D>) {
        self.disable(host);
        self.binding = None;
    }

    /// Called by a role that is going away.
    pub fn release<D: HostDom>(&mut self, host: &mut Host<D>, el: ElementId) {
        if self.active == Some(el) {
            self.relinquish(host, Relinquish::Released);
        }
    }

    /// Framework-originated text and selection. Never reported back.
    pub fn set_editing_state<D: HostDom>(&mut self, host: &mut Host<D>, state: EditingState) {
        // The DOM cannot hold the framework's composing range; drop it from
        // the baseline so the next native snapshot compares cleanly.
        let baseline = state.with_composing(None);
        match self.active {
            Some(el) if self.enabled => {
                baseline.apply_to_dom(&mut host.dom, el);
                self.last_state = Some(baseline);
                if host.dom.active_element() != Some(el) {
                    log::debug!("refocusing {el:?} after editing state");
                    self.focus.grant(host, el);
                }
            }
            _ => self.last_state = Some(baseline),
        }
    }

    pub fn set_editable_size_and_transform<D: HostDom>(
        &mut self,
        host: &mut Host<D>,
        geometry: EditableTextGeometry,
    ) {
        self.geometry = Some(geometry);
        if let Some(el) = self.active.filter(|_| self.enabled) {
            host.placement.place_from_command(&mut host.dom, el, geometry);
        }
    }

    pub fn set_style<D: HostDom>(&mut self, host: &mut Host<D>, style: EditableTextStyle) {
        if let Some(el) = self.active.filter(|_| self.enabled) {
            apply_style(&mut host.dom, el, &style);
        }
        self.style = Some(style);
    }

    pub fn handle_native_event<D: HostDom>(&mut self, host: &mut Host<D>, event: &NativeEvent) {
        if !self.enabled || self.active != Some(event.target) {
            return;
        }
        let el = event.target;
        match &event.kind {
            NativeEventKind::Input | NativeEventKind::SelectionChange | NativeEventKind::KeyUp(_) => {
                self.sync_from_dom(host, el)
            }
            NativeEventKind::CompositionStart => self.composing_text = Some(String::new()),
            NativeEventKind::CompositionUpdate(text) => self.composing_text = Some(text.clone()),
            NativeEventKind::CompositionEnd(_) => {
                self.composing_text = None;
                self.sync_from_dom(host, el);
            }
            NativeEventKind::KeyDown(Key::Enter) => self.on_enter(host, el),
            NativeEventKind::KeyDown(_) => {}
            NativeEventKind::Focus => self.focus.invalidate(&mut host.tasks),
            NativeEventKind::Blur => {
                self.composing_text = None;
                self.focus
                    .schedule_handoff(host, el, Relinquish::NativeBlur);
            }
        }
    }

    pub fn run_task<D: HostDom>(&mut self, host: &mut Host<D>, task: HostTask) {
        match task {
            HostTask::FocusHandoff { token, from } => {
                let outcome = self.focus.run_handoff(&mut host.dom, token, from);
                if outcome != HandoffOutcome::Stale && self.active == Some(from) {
                    self.detach(host, from);
                    self.active = None;
                }
            }
        }
    }

    fn relinquish<D: HostDom>(&mut self, host: &mut Host<D>, reason: Relinquish) {
        let Some(el) = self.active.take() else {
            return;
        };
        self.detach(host, el);
        if host.dom.active_element() == Some(el) {
            self.focus.schedule_handoff(host, el, reason);
        }
    }

    fn attach<D: HostDom>(&mut self, host: &mut Host<D>, el: ElementId) {
        host.dom.add_listeners(el, EventMask::EDITING);
        self.attached = true;

        if let Some(binding) = &self.binding {
            let config = &binding.config;
            match config.input_type.input_mode() {
                Some(mode) => host.dom.set_attribute(el, "inputmode", mode),
                None => host.dom.remove_attribute(el, "inputmode"),
            }
            match config.input_action.enter_key_hint() {
                Some(hint) => host.dom.set_attribute(el, "enterkeyhint", hint),
                None => host.dom.remove_attribute(el, "enterkeyhint"),
            }
            let autocorrect = if config.autocorrect { "on" } else { "off" };
            host.dom.set_attribute(el, "autocorrect", autocorrect);
        }

        match &self.last_state {
            Some(state) => state.apply_to_dom(&mut host.dom, el),
            None => self.last_state = EditingState::from_dom(&host.dom, el),
        }
        if let Some(geometry) = self.geometry {
            host.placement.place_from_command(&mut host.dom, el, geometry);
        }
        if let Some(style) = &self.style {
            apply_style(&mut host.dom, el, style);
        }
    }

    fn detach<D: HostDom>(&mut self, host: &mut Host<D>, el: ElementId) {
        host.dom.remove_listeners(el, EventMask::EDITING);
        self.attached = false;
        self.composing_text = None;
    }

    fn sync_from_dom<D: HostDom>(&mut self, host: &Host<D>, el: ElementId) {
        let Some(mut state) = EditingState::from_dom(&host.dom, el) else {
            return;
        };
        if let Some(text) = &self.composing_text {
            let end = state.base();
            let start = end.saturating_sub(utf16_len(text));
            state = state.with_composing(Some(start..end));
        }
        if self
            .last_state
            .as_ref()
            .is_some_and(|last| last.same_including_composing(&state))
        {
            return;
        }
        self.last_state = Some(state.clone());
        if let Some(binding) = &self.binding {
            let (client, on_change) = (binding.client, Rc::clone(&binding.on_change));
            on_change(client, &state);
        }
    }

    fn on_enter<D: HostDom>(&self, host: &Host<D>, el: ElementId) {
        let Some(binding) = &self.binding else {
            return;
        };
        let action = binding.config.input_action;
        let submits = match host.dom.tag(el) {
            Some(Tag::Input) => true,
            Some(Tag::TextArea) => action != InputAction::Newline,
            _ => false,
        };
        if submits {
            let (client, on_action) = (binding.client, Rc::clone(&binding.on_action));
            on_action(client, action);
        }
    }
}

fn apply_style<D: HostDom>(dom: &mut D, el: ElementId, style: &EditableTextStyle) {
    for (property, value) in style.css() {
        dom.set_style(el, property, &value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use sembridge_core::{Rect, Transform};
    use sembridge_dom::Document;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Fixture {
        host: Host<Document>,
        strategy: EditingStrategy,
        log: Log,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                host: Host::new(Document::new()),
                strategy: EditingStrategy::new(),
                log: Rc::default(),
            }
        }

        fn element(&mut self, tag: Tag) -> ElementId {
            let el = self.host.dom.create_element(tag);
            self.host.dom.append_to_semantics_host(el);
            el
        }

        fn enable(&mut self, config: InputConfiguration) {
            let changes = self.log.clone();
            let actions = self.log.clone();
            self.strategy.enable(
                &mut self.host,
                ClientId(1),
                config,
                Rc::new(move |client: ClientId, state: &EditingState| {
                    changes.borrow_mut().push(format!(
                        "change {} {:?} {}..{}",
                        client.0,
                        state.text(),
                        state.base(),
                        state.extent()
                    ))
                }),
                Rc::new(move |client: ClientId, action: InputAction| {
                    actions
                        .borrow_mut()
                        .push(format!("action {} {}", client.0, action.name()))
                }),
            );
        }

        fn pump(&mut self) {
            for event in self.host.dom.take_events() {
                self.strategy.handle_native_event(&mut self.host, &event);
            }
        }

        fn turn(&mut self) {
            for task in self.host.tasks.take_turn() {
                self.strategy.run_task(&mut self.host, task);
            }
        }

        fn log(&self) -> Vec<String> {
            self.log.borrow().clone()
        }
    }

    #[test]
    fn test_activate_focuses_and_listens() {
        let mut fx = Fixture::new();
        let el = fx.element(Tag::Input);
        fx.enable(InputConfiguration::single_line());
        fx.strategy.activate(&mut fx.host, el);

        assert_eq!(fx.host.dom.active_element(), Some(el));
        assert_eq!(fx.host.dom.listeners(el), EventMask::EDITING);
        assert_eq!(fx.strategy.state(), StrategyState::Enabled { active: Some(el) });
        assert_eq!(fx.host.dom.attribute(el, "enterkeyhint").as_deref(), Some("done"));
    }

    #[test]
    fn test_user_typing_reports_once_per_change() {
        let mut fx = Fixture::new();
        let el = fx.element(Tag::Input);
        fx.enable(InputConfiguration::single_line());
        fx.strategy.activate(&mut fx.host, el);
        fx.pump();

        fx.host.dom.type_text(el, "hi");
        fx.host.dom.select(el, 2, 2);
        fx.host.dom.press_key(el, Key::Character("i".into()));
        fx.pump();

        assert_eq!(fx.log(), vec![r#"change 1 "hi" 2..2"#]);
    }

    #[test]
    fn test_framework_state_is_not_echoed() {
        let mut fx = Fixture::new();
        let el = fx.element(Tag::Input);
        fx.enable(InputConfiguration::single_line());
        fx.strategy.activate(&mut fx.host, el);

        fx.strategy
            .set_editing_state(&mut fx.host, EditingState::new("updated", 2, 3));
        fx.pump();

        assert_eq!(fx.host.dom.value(el).as_deref(), Some("updated"));
        let sel = fx.host.dom.selection(el).unwrap();
        assert_eq!((sel.start, sel.end), (2, 3));
        assert!(fx.log().is_empty());
    }

    #[test]
    fn test_set_editing_state_refocuses() {
        let mut fx = Fixture::new();
        let el = fx.element(Tag::Input);
        fx.enable(InputConfiguration::single_line());
        fx.strategy.activate(&mut fx.host, el);
        fx.host.dom.focus_root();
        fx.host.dom.take_events();

        fx.strategy
            .set_editing_state(&mut fx.host, EditingState::collapsed("x", 1));
        assert_eq!(fx.host.dom.active_element(), Some(el));
    }

    #[test]
    fn test_disable_hands_focus_back_next_turn() {
        let mut fx = Fixture::new();
        let el = fx.element(Tag::Input);
        fx.enable(InputConfiguration::single_line());
        fx.strategy.activate(&mut fx.host, el);

        fx.strategy.disable(&mut fx.host);
        assert_eq!(fx.host.dom.active_element(), Some(el));
        assert_eq!(fx.strategy.state(), StrategyState::Disabled);
        assert!(fx.host.dom.listeners(el).is_empty());
        assert!(fx.host.dom.is_connected(el));

        fx.turn();
        assert_eq!(fx.host.dom.active_element(), Some(fx.host.dom.root()));

        // Second disable has nothing left to do.
        fx.strategy.disable(&mut fx.host);
        assert!(fx.host.tasks.is_empty());
    }

    #[test]
    fn test_native_blur_schedules_handoff_without_refocus() {
        let mut fx = Fixture::new();
        let el = fx.element(Tag::Input);
        fx.enable(InputConfiguration::single_line());
        fx.strategy.activate(&mut fx.host, el);
        fx.pump();

        fx.host.dom.user_blur(el);
        fx.pump();
        assert_eq!(fx.host.dom.active_element(), None);
        assert_eq!(fx.strategy.active_element(), Some(el));

        fx.turn();
        assert_eq!(fx.host.dom.active_element(), Some(fx.host.dom.root()));
        assert_eq!(fx.strategy.active_element(), None);
    }

    #[test]
    fn test_activation_before_turn_cancels_handoff() {
        let mut fx = Fixture::new();
        let a = fx.element(Tag::Input);
        let b = fx.element(Tag::Input);
        fx.enable(InputConfiguration::single_line());
        fx.strategy.activate(&mut fx.host, a);
        fx.strategy.disable(&mut fx.host);

        fx.enable(InputConfiguration::single_line());
        fx.strategy.activate(&mut fx.host, b);
        fx.turn();

        assert_eq!(fx.host.dom.active_element(), Some(b));
        assert_eq!(fx.strategy.active_element(), Some(b));
    }

    #[test]
    fn test_switching_elements_keeps_one_active() {
        let mut fx = Fixture::new();
        let a = fx.element(Tag::Input);
        let b = fx.element(Tag::Input);
        fx.enable(InputConfiguration::single_line());

        for i in 0..6 {
            let (on, off) = if i % 2 == 0 { (a, b) } else { (b, a) };
            fx.strategy.activate(&mut fx.host, on);
            fx.pump();
            fx.turn();
            assert_eq!(fx.host.dom.active_element(), Some(on));
            assert_eq!(fx.strategy.active_element(), Some(on));
            assert!(fx.host.dom.listeners(off).is_empty());
        }
    }

    #[test]
    fn test_config_switch_detaches_previous_element() {
        let mut fx = Fixture::new();
        let area = fx.element(Tag::TextArea);
        let input = fx.element(Tag::Input);
        fx.enable(InputConfiguration::multiline());
        fx.strategy.activate(&mut fx.host, area);

        fx.enable(InputConfiguration::single_line());
        assert_eq!(fx.strategy.active_element(), None);
        assert!(fx.host.dom.listeners(area).is_empty());
        // Focus may linger on the old element until the new one activates.
        assert_eq!(fx.host.dom.active_element(), Some(area));

        fx.strategy.activate(&mut fx.host, input);
        fx.turn();
        assert_eq!(fx.host.dom.active_element(), Some(input));
        assert_eq!(fx.host.dom.tag(area), Some(Tag::TextArea));
    }

    #[test]
    fn test_activation_while_disabled_attaches_on_enable() {
        let mut fx = Fixture::new();
        let el = fx.element(Tag::Input);
        fx.strategy.activate(&mut fx.host, el);
        assert_eq!(fx.host.dom.active_element(), Some(el));
        assert!(fx.host.dom.listeners(el).is_empty());

        fx.strategy
            .set_editing_state(&mut fx.host, EditingState::collapsed("early", 5));
        fx.enable(InputConfiguration::single_line());
        assert_eq!(fx.host.dom.listeners(el), EventMask::EDITING);
        assert_eq!(fx.host.dom.value(el).as_deref(), Some("early"));
    }

    #[test]
    fn test_enter_performs_action() {
        let mut fx = Fixture::new();
        let el = fx.element(Tag::Input);
        fx.enable(InputConfiguration::single_line().with_action(InputAction::Go));
        fx.strategy.activate(&mut fx.host, el);
        fx.host.dom.press_key(el, Key::Enter);
        fx.pump();
        assert_eq!(fx.log(), vec!["action 1 go"]);
    }

    #[test]
    fn test_enter_in_multiline_inserts_newline() {
        let mut fx = Fixture::new();
        let el = fx.element(Tag::TextArea);
        fx.enable(InputConfiguration::multiline());
        fx.strategy.activate(&mut fx.host, el);
        fx.host.dom.press_key(el, Key::Enter);
        fx.pump();
        assert!(fx.log().is_empty());
    }

    #[test]
    fn test_composition_reports_composing_range() {
        let mut fx = Fixture::new();
        let el = fx.element(Tag::Input);
        let seen: Rc<RefCell<Vec<Option<std::ops::Range<usize>>>>> = Rc::default();
        let sink = seen.clone();
        fx.strategy.enable(
            &mut fx.host,
            ClientId(4),
            InputConfiguration::single_line(),
            Rc::new(move |_: ClientId, state: &EditingState| {
                sink.borrow_mut().push(state.composing().cloned())
            }),
            Rc::new(|_: ClientId, _: InputAction| {}),
        );
        fx.strategy.activate(&mut fx.host, el);
        fx.pump();

        fx.host.dom.compose_start(el);
        fx.host.dom.compose_update(el, "に");
        fx.host.dom.compose_update(el, "日");
        fx.host.dom.compose_end(el);
        fx.pump();

        assert_eq!(*seen.borrow(), vec![Some(0..1), None]);
    }

    #[test]
    fn test_command_geometry_yields_to_semantics() {
        let mut fx = Fixture::new();
        let el = fx.element(Tag::Input);
        fx.host
            .placement
            .place_from_semantics(&mut fx.host.dom, el, Rect::new(0.0, 0.0, 80.0, 20.0));
        fx.enable(InputConfiguration::single_line());
        fx.strategy.activate(&mut fx.host, el);
        fx.strategy.set_editable_size_and_transform(
            &mut fx.host,
            EditableTextGeometry::new(10.0, 10.0, Transform::translate(5.0, 5.0)),
        );
        assert_eq!(fx.host.dom.style(el, "width").as_deref(), Some("80px"));
    }

    #[test]
    fn test_events_from_inactive_elements_are_ignored() {
        let mut fx = Fixture::new();
        let a = fx.element(Tag::Input);
        let b = fx.element(Tag::Input);
        fx.enable(InputConfiguration::single_line());
        fx.strategy.activate(&mut fx.host, a);
        fx.host.dom.type_text(a, "x");
        fx.strategy.activate(&mut fx.host, b);
        fx.pump();
        assert!(fx.log().is_empty());
    }
}
