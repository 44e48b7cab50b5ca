//! TUI screens.

pub mod popup;
pub mod status;

pub use popup::TerminalPopup;
pub use status::{StatusSnapshot, StatusView};
