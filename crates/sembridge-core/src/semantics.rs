use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::Rect;

/// Stable id of a semantics node, shared with the framework.
pub type NodeId = u64;

bitflags! {
    /// Boolean state carried by a semantics node.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SemanticsFlags: u32 {
        const IS_TEXT_FIELD     = 1 << 0;
        const IS_MULTILINE      = 1 << 1;
        const IS_FOCUSED        = 1 << 2;
        const IS_FOCUSABLE      = 1 << 3;
        const HAS_ENABLED_STATE = 1 << 4;
        const IS_ENABLED        = 1 << 5;
        const HAS_TAP           = 1 << 6;
        const IS_BUTTON         = 1 << 7;
        const IS_OBSCURED       = 1 << 8;
        const IS_READ_ONLY      = 1 << 9;
        const HAS_CHECKED_STATE = 1 << 10;
        const IS_CHECKED        = 1 << 11;
    }
}

impl Serialize for SemanticsFlags {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for SemanticsFlags {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(d)?;
        // Unknown bits come from newer frameworks; keep what we understand.
        Ok(SemanticsFlags::from_bits_truncate(bits))
    }
}

/// High‑level semantic role of a node, similar to ARIA roles.
///
/// The role is derived once when a node is first seen and never changes in
/// place; a node whose flags imply a different role gets a fresh role object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Single-line editable text, hosted in an `<input>`.
    TextField,
    /// Multi-line editable text, hosted in a `<textarea>`.
    MultilineTextField,
    Button,
    Checkbox,
    Container,
}

impl Role {
    pub fn from_flags(flags: SemanticsFlags) -> Self {
        if flags.contains(SemanticsFlags::IS_TEXT_FIELD) {
            if flags.contains(SemanticsFlags::IS_MULTILINE) {
                Role::MultilineTextField
            } else {
                Role::TextField
            }
        } else if flags.contains(SemanticsFlags::HAS_CHECKED_STATE) {
            Role::Checkbox
        } else if flags.intersects(SemanticsFlags::IS_BUTTON | SemanticsFlags::HAS_TAP) {
            Role::Button
        } else {
            Role::Container
        }
    }
}

/// One node of an already-parsed semantics update batch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SemanticsNodeUpdate {
    pub id: NodeId,
    pub flags: SemanticsFlags,
    pub label: String,
    pub hint: String,
    pub value: String,
    pub rect: Rect,
    pub text_selection_base: Option<usize>,
    pub text_selection_extent: Option<usize>,
}

impl SemanticsNodeUpdate {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            flags: SemanticsFlags::IS_ENABLED | SemanticsFlags::HAS_ENABLED_STATE,
            ..Default::default()
        }
    }

    pub fn flags(mut self, flags: SemanticsFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_flag(mut self, flag: SemanticsFlags, on: bool) -> Self {
        self.flags.set(flag, on);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    pub fn selection(mut self, base: usize, extent: usize) -> Self {
        self.text_selection_base = Some(base);
        self.text_selection_extent = Some(extent);
        self
    }
}

/// A batch of node updates, applied atomically by the semantics tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SemanticsUpdate {
    pub nodes: Vec<SemanticsNodeUpdate>,
    /// Nodes the framework dropped since the previous batch.
    pub removed: Vec<NodeId>,
    /// When set, every node not named in `nodes` is garbage-collected.
    pub full_tree: bool,
}

impl SemanticsUpdate {
    pub fn full(nodes: Vec<SemanticsNodeUpdate>) -> Self {
        Self {
            nodes,
            removed: Vec::new(),
            full_tree: true,
        }
    }

    pub fn partial(nodes: Vec<SemanticsNodeUpdate>) -> Self {
        Self {
            nodes,
            removed: Vec::new(),
            full_tree: false,
        }
    }
}

bitflags! {
    /// Which fields of a `SemanticsObject` changed during the last update.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct SemanticsChanges: u8 {
        const FLAGS     = 1 << 0;
        const LABEL     = 1 << 1;
        const HINT      = 1 << 2;
        const VALUE     = 1 << 3;
        const RECT      = 1 << 4;
        const SELECTION = 1 << 5;
    }
}

/// Framework accessibility node as held by the semantics tree.
#[derive(Clone, Debug, PartialEq)]
pub struct SemanticsObject {
    pub id: NodeId,
    pub flags: SemanticsFlags,
    pub label: String,
    pub hint: String,
    pub value: String,
    pub rect: Rect,
    pub text_selection_base: Option<usize>,
    pub text_selection_extent: Option<usize>,
    changes: SemanticsChanges,
    fresh: bool,
}

impl SemanticsObject {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            flags: SemanticsFlags::empty(),
            label: String::new(),
            hint: String::new(),
            value: String::new(),
            rect: Rect::default(),
            text_selection_base: None,
            text_selection_extent: None,
            changes: SemanticsChanges::all(),
            fresh: true,
        }
    }

    /// Mutates the node in place and records which fields moved.
    pub fn apply(&mut self, update: &SemanticsNodeUpdate) -> SemanticsChanges {
        let mut changes = SemanticsChanges::empty();
        if self.flags != update.flags {
            self.flags = update.flags;
            changes |= SemanticsChanges::FLAGS;
        }
        if self.label != update.label {
            self.label.clone_from(&update.label);
            changes |= SemanticsChanges::LABEL;
        }
        if self.hint != update.hint {
            self.hint.clone_from(&update.hint);
            changes |= SemanticsChanges::HINT;
        }
        if self.value != update.value {
            self.value.clone_from(&update.value);
            changes |= SemanticsChanges::VALUE;
        }
        if self.rect != update.rect {
            self.rect = update.rect;
            changes |= SemanticsChanges::RECT;
        }
        if self.text_selection_base != update.text_selection_base
            || self.text_selection_extent != update.text_selection_extent
        {
            self.text_selection_base = update.text_selection_base;
            self.text_selection_extent = update.text_selection_extent;
            changes |= SemanticsChanges::SELECTION;
        }
        // A freshly created node reports everything as changed once.
        self.changes = if std::mem::take(&mut self.fresh) {
            SemanticsChanges::all()
        } else {
            changes
        };
        self.changes
    }

    /// Changes recorded by the most recent `apply`.
    pub fn changes(&self) -> SemanticsChanges {
        self.changes
    }

    pub fn role(&self) -> Role {
        Role::from_flags(self.flags)
    }

    pub fn is_multiline(&self) -> bool {
        self.flags.contains(SemanticsFlags::IS_MULTILINE)
    }

    pub fn is_focused(&self) -> bool {
        self.flags.contains(SemanticsFlags::IS_FOCUSED)
    }

    /// Nodes without an enabled state are treated as enabled.
    pub fn is_enabled(&self) -> bool {
        !self.flags.contains(SemanticsFlags::HAS_ENABLED_STATE)
            || self.flags.contains(SemanticsFlags::IS_ENABLED)
    }

    pub fn is_obscured(&self) -> bool {
        self.flags.contains(SemanticsFlags::IS_OBSCURED)
    }

    pub fn is_read_only(&self) -> bool {
        self.flags.contains(SemanticsFlags::IS_READ_ONLY)
    }

    pub fn has_tap(&self) -> bool {
        self.flags.contains(SemanticsFlags::HAS_TAP)
    }
}
