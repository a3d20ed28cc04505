//! Host DOM seam.
//!
//! The bridge never talks to the browser directly. Everything goes through
//! [`HostDom`]: element creation, attributes and inline style, the live
//! value/selection of editable elements, focus, and listener registration.
//! Native events come back out of [`HostDom::take_events`] and deferred work
//! is posted to a [`TaskQueue`].
//!
//! [`Document`] is an in-memory host used by tests and the demo; the wasm32
//! backend lives in `sembridge-platform`.

pub mod document;
pub mod element;
pub mod event;
pub mod host;
pub mod tasks;

pub use document::Document;
pub use element::{ElementId, SelectionDirection, SelectionRange, Tag};
pub use event::{EventMask, Key, NativeEvent, NativeEventKind};
pub use host::HostDom;
pub use tasks::{TaskId, TaskQueue};
