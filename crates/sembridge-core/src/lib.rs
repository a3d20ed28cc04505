//! # sembridge core model
//!
//! Plain data shared by every layer of the bridge:
//!
//! - [`geometry`]: rects and the 4x4 transforms the editing channel sends.
//! - [`semantics`]: node flags, update batches and the tree-owned
//!   [`SemanticsObject`].
//! - [`input`]: the [`InputConfiguration`] the framework supplies when it
//!   opens an editing session, and the [`ClientId`] commands are addressed to.
//! - [`text`]: UTF-16 offset helpers; selections are counted in UTF-16
//!   units on both sides of the bridge.
//!
//! ```rust
//! use sembridge_core::*;
//!
//! let update = SemanticsNodeUpdate::new(7)
//!     .with_flag(SemanticsFlags::IS_TEXT_FIELD, true)
//!     .label("Email");
//! let mut node = SemanticsObject::new(update.id);
//! node.apply(&update);
//! assert_eq!(node.role(), Role::TextField);
//! ```

pub mod error;
pub mod geometry;
pub mod input;
pub mod semantics;
pub mod text;

pub use error::*;
pub use geometry::*;
pub use input::*;
pub use semantics::*;
pub use text::{byte_index_for_utf16, clamp_utf16, utf16_len};
