//! The popup menu: controller state machine and the surface protocol.

pub mod controller;
pub mod popup;

pub use controller::{MenuController, MenuState};
pub use popup::{PopupCommand, PopupState, PopupSurface};
