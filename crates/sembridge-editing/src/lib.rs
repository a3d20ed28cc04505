//! Editing side of the bridge.
//!
//! [`EditingStrategy`] owns the one element a view is currently editing. It
//! listens to that element's native events, reports user edits through the
//! client's callbacks, and applies framework commands decoded by
//! [`channel`]. Where the element sits on screen is decided by
//! [`Placement`]; who may move focus is decided by [`FocusArbiter`].

pub mod channel;
pub mod editing_state;
pub mod focus;
pub mod host;
pub mod placement;
pub mod strategy;

pub use channel::{
    EditableTextStyle, TextInputCommand, decode_call, decode_method_call,
    encode_perform_action, encode_update_editing_state,
};
pub use editing_state::EditingState;
pub use focus::{FocusArbiter, FocusToken, HandoffOutcome, Relinquish};
pub use host::{Host, HostTask};
pub use placement::{EditableTextGeometry, Placement, PlacementAuthority};
pub use strategy::{EditingStrategy, OnAction, OnChange, StrategyState};
