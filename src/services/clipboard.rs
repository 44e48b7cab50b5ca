//! Clipboard access and the change monitor that notifies the event loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::event::LoopEvent;
use crate::models::ClipboardSlot;

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[cfg(not(target_os = "linux"))]
    #[error("{slot} is not supported on this platform")]
    Unsupported { slot: ClipboardSlot },

    #[error("failed to access {slot}: {message}")]
    Access { slot: ClipboardSlot, message: String },
}

/// Synchronous text access to the clipboard and the selection.
pub trait ClipboardSource: Send + Sync {
    /// Current text of `slot`; an empty or non-text slot reads as "".
    fn read(&self, slot: ClipboardSlot) -> Result<String, ClipboardError>;

    fn write(&self, slot: ClipboardSlot, text: &str) -> Result<(), ClipboardError>;

    /// Current text of `slot` together with its write generation.
    ///
    /// The generation is bumped on every successful `write` to `slot`, even of
    /// identical text. Both values come from the same critical section, so a
    /// write never lands between them.
    fn read_versioned(&self, slot: ClipboardSlot) -> Result<(String, u64), ClipboardError>;
}

/// System clipboard backed by arboard.
pub struct ArboardClipboard {
    inner: Mutex<arboard::Clipboard>,
    clipboard_writes: AtomicU64,
    selection_writes: AtomicU64,
}

impl ArboardClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        let clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        Ok(Self {
            inner: Mutex::new(clipboard),
            clipboard_writes: AtomicU64::new(0),
            selection_writes: AtomicU64::new(0),
        })
    }

    /// Whether the platform has a primary selection at all.
    pub fn supports_selection() -> bool {
        cfg!(target_os = "linux")
    }

    fn counter(&self, slot: ClipboardSlot) -> &AtomicU64 {
        match slot {
            ClipboardSlot::Clipboard => &self.clipboard_writes,
            ClipboardSlot::Selection => &self.selection_writes,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, arboard::Clipboard>, ClipboardError> {
        self.inner
            .lock()
            .map_err(|_| ClipboardError::Unavailable("clipboard lock poisoned".to_string()))
    }
}

fn access_error(slot: ClipboardSlot, e: arboard::Error) -> ClipboardError {
    ClipboardError::Access {
        slot,
        message: e.to_string(),
    }
}

#[cfg(target_os = "linux")]
fn linux_kind(slot: ClipboardSlot) -> arboard::LinuxClipboardKind {
    match slot {
        ClipboardSlot::Clipboard => arboard::LinuxClipboardKind::Clipboard,
        ClipboardSlot::Selection => arboard::LinuxClipboardKind::Primary,
    }
}

#[cfg(target_os = "linux")]
fn read_text(
    clipboard: &mut arboard::Clipboard,
    slot: ClipboardSlot,
) -> Result<String, ClipboardError> {
    use arboard::GetExtLinux;

    match clipboard.get().clipboard(linux_kind(slot)).text() {
        Ok(text) => Ok(text),
        Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
        Err(e) => Err(access_error(slot, e)),
    }
}

#[cfg(not(target_os = "linux"))]
fn read_text(
    clipboard: &mut arboard::Clipboard,
    slot: ClipboardSlot,
) -> Result<String, ClipboardError> {
    if slot == ClipboardSlot::Selection {
        return Err(ClipboardError::Unsupported { slot });
    }
    match clipboard.get_text() {
        Ok(text) => Ok(text),
        Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
        Err(e) => Err(access_error(slot, e)),
    }
}

impl ClipboardSource for ArboardClipboard {
    fn read(&self, slot: ClipboardSlot) -> Result<String, ClipboardError> {
        let mut clipboard = self.lock()?;
        read_text(&mut clipboard, slot)
    }

    #[cfg(target_os = "linux")]
    fn write(&self, slot: ClipboardSlot, text: &str) -> Result<(), ClipboardError> {
        use arboard::SetExtLinux;

        let mut clipboard = self.lock()?;
        clipboard
            .set()
            .clipboard(linux_kind(slot))
            .text(text.to_string())
            .map_err(|e| access_error(slot, e))?;
        self.counter(slot).fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    fn write(&self, slot: ClipboardSlot, text: &str) -> Result<(), ClipboardError> {
        if slot == ClipboardSlot::Selection {
            return Err(ClipboardError::Unsupported { slot });
        }
        let mut clipboard = self.lock()?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| access_error(slot, e))?;
        self.counter(slot).fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read_versioned(&self, slot: ClipboardSlot) -> Result<(String, u64), ClipboardError> {
        // Writes bump the counter while holding this same guard.
        let mut clipboard = self.lock()?;
        let text = read_text(&mut clipboard, slot)?;
        Ok((text, self.counter(slot).load(Ordering::SeqCst)))
    }
}

/// Tracks what each slot looked like at the previous sample.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    seen: HashMap<ClipboardSlot, (String, u64)>,
}

impl ChangeDetector {
    /// Record a sample; true when it differs from the previous one.
    ///
    /// The first sample of a slot only seeds the detector, so whatever was on
    /// the clipboard at startup never counts as a change.
    pub fn observe(&mut self, slot: ClipboardSlot, text: &str, generation: u64) -> bool {
        match self.seen.get_mut(&slot) {
            Some(previous) => {
                if previous.0 == text && previous.1 == generation {
                    return false;
                }
                *previous = (text.to_string(), generation);
                true
            }
            None => {
                self.seen.insert(slot, (text.to_string(), generation));
                false
            }
        }
    }
}

/// How often the change monitor samples the slots.
const MONITOR_INTERVAL: Duration = Duration::from_millis(150);

/// Start the host change notifier on its own thread.
///
/// Each detected change is posted to the loop as
/// [`LoopEvent::ClipboardChanged`]. The thread ends when the loop goes away.
pub fn spawn_change_monitor(
    clipboard: Arc<dyn ClipboardSource>,
    tx: UnboundedSender<LoopEvent>,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("clipboard-monitor".to_string())
        .spawn(move || {
            let mut monitor = ChangeMonitor::default();
            info!(interval_ms = MONITOR_INTERVAL.as_millis() as u64, "clipboard monitor started");

            loop {
                for (slot, text) in monitor.sample(clipboard.as_ref()) {
                    if tx.send(LoopEvent::ClipboardChanged { slot, text }).is_err() {
                        return;
                    }
                }
                if tx.is_closed() {
                    return;
                }
                std::thread::sleep(MONITOR_INTERVAL);
            }
        })
}

/// One pass of the change monitor over both slots.
#[derive(Debug, Default)]
struct ChangeMonitor {
    detector: ChangeDetector,
    unreadable: HashMap<ClipboardSlot, bool>,
}

impl ChangeMonitor {
    /// Changed slots since the previous pass, with their new text.
    fn sample(&mut self, clipboard: &dyn ClipboardSource) -> Vec<(ClipboardSlot, String)> {
        let mut changes = Vec::new();
        for slot in ClipboardSlot::ALL {
            let (text, generation) = match clipboard.read_versioned(slot) {
                Ok(versioned) => {
                    self.unreadable.remove(&slot);
                    versioned
                }
                Err(e) => {
                    // Log once per outage, not once per sample.
                    if self.unreadable.insert(slot, true).is_none() {
                        debug!(%slot, error = %e, "slot unreadable");
                    }
                    continue;
                }
            };
            if self.detector.observe(slot, &text, generation) {
                debug!(%slot, "change detected");
                changes.push((slot, text));
            }
        }
        changes
    }
}
