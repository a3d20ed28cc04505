//! Semantics side of the bridge.
//!
//! A [`SemanticsTree`] turns update batches into roles. Each role owns the
//! DOM element that represents its node to assistive technology; text-field
//! roles hand their element to the view's editing strategy when the node is
//! focused. Everything a role needs is passed in through a
//! [`BridgeContext`], one per view.

pub mod context;
pub mod role;
pub mod text_field;
pub mod tree;

pub use context::{BridgeContext, PostUpdate};
pub use role::{GenericRole, SemanticRole};
pub use text_field::TextFieldRole;
pub use tree::SemanticsTree;
