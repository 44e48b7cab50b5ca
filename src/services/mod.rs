//! Backend services.

pub mod actions;
pub mod clipboard;
pub mod fallback;
pub mod poll;
pub mod theme;
pub mod timer;
pub mod transforms;

pub use actions::{ExternalActionRegistry, ProcessRunner};
pub use clipboard::{ArboardClipboard, ClipboardSource};
pub use fallback::{FallbackReader, WlPasteReader};
pub use poll::PollSampler;
pub use theme::Theme;
pub use timer::LoopTimers;
