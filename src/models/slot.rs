//! Clipboard channels and their last-known values.

use std::fmt;

/// One of the two independently observed text channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipboardSlot {
    /// The regular copy/paste clipboard.
    Clipboard,
    /// The primary selection (select-to-copy on X11/Wayland).
    Selection,
}

impl ClipboardSlot {
    pub const ALL: [ClipboardSlot; 2] = [ClipboardSlot::Clipboard, ClipboardSlot::Selection];
}

impl fmt::Display for ClipboardSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardSlot::Clipboard => f.write_str("clipboard"),
            ClipboardSlot::Selection => f.write_str("selection"),
        }
    }
}

/// Last confirmed text per slot.
#[derive(Debug, Default, Clone)]
pub struct SlotCache {
    clipboard: String,
    selection: String,
}

impl SlotCache {
    #[cfg(test)]
    pub fn get(&self, slot: ClipboardSlot) -> &str {
        match slot {
            ClipboardSlot::Clipboard => &self.clipboard,
            ClipboardSlot::Selection => &self.selection,
        }
    }

    /// Store `text` for `slot`. Returns true when the stored value changed.
    pub fn confirm(&mut self, slot: ClipboardSlot, text: &str) -> bool {
        let stored = match slot {
            ClipboardSlot::Clipboard => &mut self.clipboard,
            ClipboardSlot::Selection => &mut self.selection,
        };
        if stored == text {
            return false;
        }
        *stored = text.to_string();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_are_tracked_independently() {
        let mut cache = SlotCache::default();
        assert!(cache.confirm(ClipboardSlot::Clipboard, "abc"));
        assert_eq!(cache.get(ClipboardSlot::Clipboard), "abc");
        assert_eq!(cache.get(ClipboardSlot::Selection), "");
        assert!(!cache.confirm(ClipboardSlot::Clipboard, "abc"));
        assert!(cache.confirm(ClipboardSlot::Selection, "abc"));
    }
}
