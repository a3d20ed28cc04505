use bitflags::bitflags;

use crate::ElementId;

bitflags! {
    /// Groups of native listeners the bridge attaches to an element.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EventMask: u8 {
        const INPUT       = 1 << 0;
        const SELECTION   = 1 << 1;
        const KEYBOARD    = 1 << 2;
        const FOCUS       = 1 << 3;
        const COMPOSITION = 1 << 4;
        const EDITING = Self::INPUT.bits()
            | Self::SELECTION.bits()
            | Self::KEYBOARD.bits()
            | Self::FOCUS.bits()
            | Self::COMPOSITION.bits();
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Enter,
    Tab,
    Escape,
    Character(String),
    Other(String),
}

impl Key {
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Enter" => Key::Enter,
            "Tab" => Key::Tab,
            "Escape" => Key::Escape,
            k if k.chars().count() == 1 => Key::Character(k.to_string()),
            k => Key::Other(k.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NativeEventKind {
    Input,
    SelectionChange,
    KeyDown(Key),
    KeyUp(Key),
    Focus,
    Blur,
    CompositionStart,
    CompositionUpdate(String),
    CompositionEnd(String),
}

impl NativeEventKind {
    /// Listener group an event is delivered through.
    pub fn mask(&self) -> EventMask {
        match self {
            NativeEventKind::Input => EventMask::INPUT,
            NativeEventKind::SelectionChange => EventMask::SELECTION,
            NativeEventKind::KeyDown(_) | NativeEventKind::KeyUp(_) => EventMask::KEYBOARD,
            NativeEventKind::Focus | NativeEventKind::Blur => EventMask::FOCUS,
            NativeEventKind::CompositionStart
            | NativeEventKind::CompositionUpdate(_)
            | NativeEventKind::CompositionEnd(_) => EventMask::COMPOSITION,
        }
    }
}

/// An event observed by a listener the bridge attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeEvent {
    pub target: ElementId,
    pub kind: NativeEventKind,
}

impl NativeEvent {
    pub fn new(target: ElementId, kind: NativeEventKind) -> Self {
        Self { target, kind }
    }
}
