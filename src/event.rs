//! Everything the event loop reacts to.

use crossterm::event::Event as TerminalEvent;

use crate::models::ClipboardSlot;
use crate::services::poll::PollSample;
use crate::services::timer::TimerKind;

/// One item in the loop's queue. All state transitions are driven by these.
#[derive(Debug)]
pub enum LoopEvent {
    /// The host saw `slot` change to `text`.
    ClipboardChanged { slot: ClipboardSlot, text: String },
    /// A single-shot timer expired.
    TimerFired { kind: TimerKind, generation: u64 },
    /// Time to take a poll sample.
    PollTick,
    /// A poll sample finished off-loop.
    PollSampled(PollSample),
    /// Keyboard, mouse, focus or resize input from the terminal.
    Input(TerminalEvent),
}
