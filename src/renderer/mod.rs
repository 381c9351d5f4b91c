//! Render descriptions
//!
//! Converts the settled game state into draw items and GPU-ready instances.
//! No drawing happens here.

pub mod draw_list;
pub mod instance;

pub use draw_list::{DrawItem, DrawKind, draw_list};
pub use instance::{DrawInstance, colors, instances};
