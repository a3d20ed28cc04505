//! Positioning of native editable elements over the framework's canvas.
//!
//! Two sources want to place an element: the semantics tree (a rect per node)
//! and the editing channel (`setEditableSizeAndTransform`). Semantics wins
//! whenever it has a usable rect; command geometry only fills in for elements
//! that have no semantics-driven size yet.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use sembridge_core::{BridgeError, BridgeResult, Rect, Transform};
use sembridge_dom::{ElementId, HostDom};

/// Framework-intended size and transform of the editable region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EditableTextGeometry {
    pub width: f32,
    pub height: f32,
    pub transform: Transform,
}

#[derive(Deserialize)]
struct GeometryWire {
    width: f64,
    height: f64,
    transform: Vec<f64>,
}

impl EditableTextGeometry {
    pub fn new(width: f32, height: f32, transform: Transform) -> Self {
        Self {
            width,
            height,
            transform,
        }
    }

    pub fn from_channel(value: &Value) -> BridgeResult<Self> {
        let wire = GeometryWire::deserialize(value)?;
        let transform = Transform::from_column_major(&wire.transform).ok_or_else(|| {
            BridgeError::BadArguments {
                method: "TextInput.setEditableSizeAndTransform".into(),
                reason: format!("transform has {} values, expected 16", wire.transform.len()),
            }
        })?;
        Ok(Self::new(wire.width as f32, wire.height as f32, transform))
    }
}

/// Who decided where an element sits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlacementAuthority {
    Semantics(Rect),
    Command(EditableTextGeometry),
}

#[derive(Default)]
pub struct Placement {
    authorities: HashMap<ElementId, PlacementAuthority>,
}

impl Placement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authority(&self, el: ElementId) -> Option<PlacementAuthority> {
        self.authorities.get(&el).copied()
    }

    pub fn is_semantics_owned(&self, el: ElementId) -> bool {
        matches!(self.authorities.get(&el), Some(PlacementAuthority::Semantics(_)))
    }

    /// Places `el` from its semantics rect. An empty rect gives up the claim
    /// so command geometry can take over; returns whether semantics now owns
    /// the element's placement.
    pub fn place_from_semantics<D: HostDom>(&mut self, dom: &mut D, el: ElementId, rect: Rect) -> bool {
        if rect.is_empty() {
            if self.is_semantics_owned(el) {
                self.authorities.remove(&el);
            }
            return false;
        }
        if self.authorities.get(&el) == Some(&PlacementAuthority::Semantics(rect)) {
            return true;
        }
        write_box(
            dom,
            el,
            rect.w,
            rect.h,
            &Transform::translate(rect.x, rect.y).to_css(),
        );
        self.authorities.insert(el, PlacementAuthority::Semantics(rect));
        true
    }

    /// Places `el` from channel geometry unless semantics already owns it.
    pub fn place_from_command<D: HostDom>(
        &mut self,
        dom: &mut D,
        el: ElementId,
        geometry: EditableTextGeometry,
    ) -> bool {
        if self.is_semantics_owned(el) {
            log::debug!("placement of {el:?} owned by semantics; command geometry deferred");
            return false;
        }
        write_box(
            dom,
            el,
            geometry.width,
            geometry.height,
            &geometry.transform.to_css(),
        );
        dom.set_style(el, "transform-origin", "0 0 0");
        self.authorities.insert(el, PlacementAuthority::Command(geometry));
        true
    }

    pub fn forget(&mut self, el: ElementId) {
        self.authorities.remove(&el);
    }
}

fn write_box<D: HostDom>(dom: &mut D, el: ElementId, w: f32, h: f32, transform: &str) {
    dom.set_style(el, "width", &format!("{w}px"));
    dom.set_style(el, "height", &format!("{h}px"));
    dom.set_style(el, "transform", transform);
}
