mod docking;
pub mod drop;
pub mod engine;
mod persist;

pub use drop::{DockKind, DropLocation};
pub use engine::{DEFAULT_LAYOUT_NAME, DockLayout, MIN_PANEL_SIZE};
pub use persist::PersistError;

#[cfg(test)]
mod tests;
