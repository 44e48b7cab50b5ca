//! Plain data shared by the watcher, controller and popup.

pub mod action;
pub mod geometry;
pub mod slot;

pub use action::{ActionEffect, ExternalActionSpec, IconSpec, MenuAction};
pub use geometry::{Bounds, Position};
pub use slot::{ClipboardSlot, SlotCache};
