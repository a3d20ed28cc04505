use std::ops::Range;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sembridge_core::{BridgeResult, clamp_utf16, utf16_len};
use sembridge_dom::{ElementId, HostDom, SelectionRange};

/// Immutable snapshot of an editable element's text and selection.
///
/// Offsets are UTF-16 code units. `base` is where the selection started and
/// `extent` where it ends, so `extent < base` is a backwards selection. Both
/// are clamped into `[0, len]` on construction.
#[derive(Clone, Debug, Default)]
pub struct EditingState {
    text: String,
    base: usize,
    extent: usize,
    composing: Option<Range<usize>>,
}

/// Equality covers text and selection. The composing range rides along but
/// does not make two states different.
impl PartialEq for EditingState {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.base == other.base && self.extent == other.extent
    }
}

impl Eq for EditingState {}

impl EditingState {
    pub fn new(text: impl Into<String>, base: usize, extent: usize) -> Self {
        let text = text.into();
        let base = clamp_utf16(&text, base);
        let extent = clamp_utf16(&text, extent);
        Self {
            text,
            base,
            extent,
            composing: None,
        }
    }

    /// Caret at `at`, no selection.
    pub fn collapsed(text: impl Into<String>, at: usize) -> Self {
        Self::new(text, at, at)
    }

    /// Attaches an IME composing range; empty or out-of-bounds ranges are
    /// dropped.
    pub fn with_composing(mut self, range: Option<Range<usize>>) -> Self {
        let len = utf16_len(&self.text);
        self.composing = range.filter(|r| r.start < r.end && r.end <= len);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn extent(&self) -> usize {
        self.extent
    }

    pub fn composing(&self) -> Option<&Range<usize>> {
        self.composing.as_ref()
    }

    pub fn is_collapsed(&self) -> bool {
        self.base == self.extent
    }

    /// Stricter than `==`: also compares the composing range.
    pub fn same_including_composing(&self, other: &EditingState) -> bool {
        self == other && self.composing == other.composing
    }

    /// Reads the live value and selection of `el`. `None` when the element
    /// is gone or not editable.
    pub fn from_dom<D: HostDom>(dom: &D, el: ElementId) -> Option<Self> {
        let text = dom.value(el)?;
        let (base, extent) = dom.selection(el)?.base_extent();
        Some(Self::new(text, base, extent))
    }

    /// Writes text and selection to `el`. The value is only reassigned when
    /// it differs so an unchanged write does not reset the caret or an
    /// in-flight IME session.
    pub fn apply_to_dom<D: HostDom>(&self, dom: &mut D, el: ElementId) {
        if dom.value(el).as_deref() != Some(self.text.as_str()) {
            dom.set_value(el, &self.text);
        }
        dom.set_selection_range(el, SelectionRange::from_base_extent(self.base, self.extent));
    }

    /// Decodes the channel's editing state map. Negative selection offsets
    /// clamp to zero; negative composing offsets mean "no composition".
    pub fn from_channel(value: &Value) -> BridgeResult<Self> {
        let wire = EditingStateWire::deserialize(value)?;
        let to_offset = |v: i64| usize::try_from(v).unwrap_or(0);
        let composing = match (wire.composing_base, wire.composing_extent) {
            (b, e) if b >= 0 && e >= 0 => {
                let (b, e) = (b as usize, e as usize);
                Some(b.min(e)..b.max(e))
            }
            _ => None,
        };
        Ok(Self::new(
            wire.text,
            to_offset(wire.selection_base),
            to_offset(wire.selection_extent),
        )
        .with_composing(composing))
    }

    /// Encodes the state the way the framework expects it back.
    pub fn to_channel(&self) -> Value {
        let (cb, ce) = match &self.composing {
            Some(r) => (r.start as i64, r.end as i64),
            None => (-1, -1),
        };
        serde_json::to_value(EditingStateWire {
            text: self.text.clone(),
            selection_base: self.base as i64,
            selection_extent: self.extent as i64,
            composing_base: cb,
            composing_extent: ce,
        })
        .unwrap_or(Value::Null)
    }
}

fn no_composition() -> i64 {
    -1
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditingStateWire {
    #[serde(default)]
    text: String,
    #[serde(default)]
    selection_base: i64,
    #[serde(default)]
    selection_extent: i64,
    #[serde(default = "no_composition")]
    composing_base: i64,
    #[serde(default = "no_composition")]
    composing_extent: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sembridge_dom::{Document, Tag};
    use serde_json::json;

    #[test]
    fn test_offsets_are_clamped() {
        let s = EditingState::new("abc", 10, 2);
        assert_eq!((s.base(), s.extent()), (3, 2));
        assert!(!s.is_collapsed());
    }

    #[test]
    fn test_equality_ignores_composing() {
        let a = EditingState::collapsed("にほん", 3);
        let b = a.clone().with_composing(Some(0..3));
        assert_eq!(a, b);
        assert!(!a.same_including_composing(&b));
        assert_ne!(a, EditingState::collapsed("にほん", 2));
    }

    #[test]
    fn test_invalid_composing_is_dropped() {
        let s = EditingState::collapsed("ab", 2).with_composing(Some(1..5));
        assert!(s.composing().is_none());
        let s = EditingState::collapsed("ab", 2).with_composing(Some(1..1));
        assert!(s.composing().is_none());
    }

    #[test]
    fn test_dom_round_trip_keeps_direction() {
        let mut doc = Document::new();
        let el = doc.create_element(Tag::Input);
        doc.append_to_semantics_host(el);

        EditingState::new("updated", 5, 1).apply_to_dom(&mut doc, el);
        assert_eq!(doc.value(el).as_deref(), Some("updated"));
        let sel = doc.selection(el).unwrap();
        assert_eq!((sel.start, sel.end), (1, 5));

        let read = EditingState::from_dom(&doc, el).unwrap();
        assert_eq!((read.base(), read.extent()), (5, 1));
    }

    #[test]
    fn test_from_dom_needs_editable_element() {
        let mut doc = Document::new();
        let div = doc.create_element(Tag::Div);
        assert!(EditingState::from_dom(&doc, div).is_none());
    }

    #[test]
    fn test_channel_decode() {
        let s = EditingState::from_channel(&json!({
            "text": "hello",
            "selectionBase": -1,
            "selectionExtent": 3,
            "composingBase": 1,
            "composingExtent": 3,
        }))
        .unwrap();
        assert_eq!((s.base(), s.extent()), (0, 3));
        assert_eq!(s.composing(), Some(&(1..3)));

        let s = EditingState::from_channel(&json!({"text": "x"})).unwrap();
        assert!(s.composing().is_none());
        assert!(EditingState::from_channel(&json!({"text": 4})).is_err());
    }

    #[test]
    fn test_channel_encode() {
        let v = EditingState::new("hi", 1, 2).to_channel();
        assert_eq!(
            v,
            json!({
                "text": "hi",
                "selectionBase": 1,
                "selectionExtent": 2,
                "composingBase": -1,
                "composingExtent": -1,
            })
        );
    }
}
