use std::fmt::Write;

use web_time::Instant;

use sembridge_dom::{Document, ElementId, HostDom};
use sembridge_editing::StrategyState;
use sembridge_platform::Session;

/// Text dump of what assistive technology would see: the bridge's elements
/// under the semantics host, where focus is, and the editing strategy.
pub struct Inspector {
    pub enabled: bool,
    dumps: u64,
    last_dump: Option<Instant>,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

impl Inspector {
    pub fn new() -> Self {
        Self {
            enabled: false,
            dumps: 0,
            last_dump: None,
        }
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    pub fn dumps(&self) -> u64 {
        self.dumps
    }

    /// Logs a dump at debug level when enabled.
    pub fn frame(&mut self, session: &Session<Document>) {
        if !self.enabled {
            return;
        }
        self.dumps += 1;
        let now = Instant::now();
        if let Some(prev) = self.last_dump.replace(now) {
            log::trace!("inspector: {:.1} ms since last dump", (now - prev).as_secs_f32() * 1000.0);
        }
        log::debug!("inspector dump #{}\n{}", self.dumps, dump(session));
    }
}

/// Deterministic dump; elements are numbered in semantics host order.
pub fn dump(session: &Session<Document>) -> String {
    let dom = session.dom();
    let children = dom.semantics_children();
    let label = |el: Option<ElementId>| match el {
        None => "none".to_string(),
        Some(el) if el == dom.root() => "root".to_string(),
        Some(el) => children
            .iter()
            .position(|c| *c == el)
            .map(|i| format!("#{i}"))
            .unwrap_or_else(|| "detached".to_string()),
    };

    let mut out = String::new();
    match session.strategy().state() {
        StrategyState::Disabled => out.push_str("strategy: disabled\n"),
        StrategyState::Enabled { active } => {
            let client = session
                .strategy()
                .client()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "no client".to_string());
            let _ = writeln!(out, "strategy: enabled {client} active={}", label(active));
        }
    }
    let _ = writeln!(out, "focus: {}", label(dom.active_element()));

    let tree = session.tree();
    for (i, &el) in children.iter().enumerate() {
        let tag = dom.tag(el).map(|t| t.name()).unwrap_or("?");
        let node = tree
            .ids()
            .into_iter()
            .find(|id| tree.element_of(*id) == Some(el))
            .map(|id| format!(" node {id}"))
            .unwrap_or_default();
        let listening = if dom.listeners(el).is_empty() {
            ""
        } else {
            " listening"
        };
        let _ = writeln!(out, "#{i} <{tag}>{node}{listening}");

        let attrs: Vec<String> = dom
            .attributes(el)
            .iter()
            .map(|(k, v)| format!("{k}={v:?}"))
            .collect();
        if !attrs.is_empty() {
            let _ = writeln!(out, "  attrs: {}", attrs.join(" "));
        }
        let styles: Vec<String> = dom
            .styles(el)
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect();
        if !styles.is_empty() {
            let _ = writeln!(out, "  style: {}", styles.join("; "));
        }
        if let (Some(value), Some(sel)) = (dom.value(el), dom.selection(el)) {
            let _ = writeln!(out, "  value: {value:?} selection: {}..{}", sel.start, sel.end);
        }
    }
    out
}
