//! Docking-window layout management: a tree of windows, splits, and tab
//! stacks, the drop cascade that rearranges it, and XML persistence.
//!
//! Rendering, hit testing, and window chrome live in the host; this crate
//! owns the layout document and keeps it structurally sound under arbitrary
//! interactive edits.

pub mod common;
pub mod layout_engine;
pub mod manager;
pub mod model;

pub use common::config::DockSettings;
pub use common::geometry::{Point, Rect};
pub use layout_engine::{DockKind, DockLayout, DropLocation};
pub use manager::{DockDelegate, DockManager};
