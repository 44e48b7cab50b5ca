//! Active polling: one sample of both slots per tick.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{EffectiveSettings, FallbackMode, FALLBACK_TIMEOUT};
use crate::models::ClipboardSlot;
use crate::services::clipboard::ClipboardSource;
use crate::services::fallback::{reader_args, FallbackReader};
use crate::utils::preview_text;

/// Text of both slots as read during one poll tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollSample {
    pub clipboard: String,
    pub selection: String,
}

impl PollSample {
    pub fn get(&self, slot: ClipboardSlot) -> &str {
        match slot {
            ClipboardSlot::Clipboard => &self.clipboard,
            ClipboardSlot::Selection => &self.selection,
        }
    }

    fn get_mut(&mut self, slot: ClipboardSlot) -> &mut String {
        match slot {
            ClipboardSlot::Clipboard => &mut self.clipboard,
            ClipboardSlot::Selection => &mut self.selection,
        }
    }
}

/// Reads both slots directly, then consults the fallback reader if enabled.
#[derive(Clone)]
pub struct PollSampler {
    clipboard: Arc<dyn ClipboardSource>,
    fallback: Option<(Arc<dyn FallbackReader>, FallbackMode)>,
    trace: bool,
}

impl PollSampler {
    pub fn new(
        clipboard: Arc<dyn ClipboardSource>,
        fallback: Option<Arc<dyn FallbackReader>>,
        settings: &EffectiveSettings,
    ) -> Self {
        let fallback = if settings.fallback_reader_enabled {
            fallback.map(|reader| (reader, settings.fallback_reader_mode))
        } else {
            None
        };
        Self {
            clipboard,
            fallback,
            trace: settings.trace,
        }
    }

    /// Take one sample. Never fails: unreadable sides read as "".
    pub async fn sample(&self) -> PollSample {
        let clipboard = self.clipboard.clone();
        let mut sample = match tokio::task::spawn_blocking(move || read_direct(clipboard.as_ref()))
            .await
        {
            Ok(sample) => sample,
            Err(e) => {
                warn!(error = %e, "poll read task failed");
                PollSample::default()
            }
        };

        if let Some((reader, mode)) = &self.fallback {
            for slot in ClipboardSlot::ALL {
                let wanted = match slot {
                    ClipboardSlot::Clipboard => mode.reads_clipboard(),
                    ClipboardSlot::Selection => mode.reads_selection(),
                };
                if !wanted {
                    continue;
                }
                match reader.read(reader_args(slot), FALLBACK_TIMEOUT).await {
                    Ok(text) => {
                        if self.trace {
                            info!(%slot, ok = true, len = text.len(), "trace: fallback read");
                        }
                        if !text.is_empty() {
                            *sample.get_mut(slot) = text;
                        }
                    }
                    Err(e) => {
                        if self.trace {
                            info!(%slot, ok = false, error = %e, "trace: fallback read");
                        } else {
                            debug!(%slot, error = %e, "fallback read failed");
                        }
                    }
                }
            }
        }

        if self.trace {
            for slot in ClipboardSlot::ALL {
                let text = sample.get(slot);
                info!(%slot, len = text.len(), preview = %preview_text(text), "trace: poll read");
            }
        }

        sample
    }
}

fn read_direct(clipboard: &dyn ClipboardSource) -> PollSample {
    let mut sample = PollSample::default();
    for slot in ClipboardSlot::ALL {
        match clipboard.read(slot) {
            Ok(text) => *sample.get_mut(slot) = text,
            Err(e) => debug!(%slot, error = %e, "direct read failed"),
        }
    }
    sample
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeClipboard, ScriptedReader};

    fn settings(enabled: bool, mode: FallbackMode) -> EffectiveSettings {
        EffectiveSettings {
            poll_enabled: true,
            fallback_reader_enabled: enabled,
            fallback_reader_mode: mode,
            ..EffectiveSettings::default()
        }
    }

    fn clipboard_with(clip: &str, sel: &str) -> Arc<FakeClipboard> {
        let clipboard = Arc::new(FakeClipboard::default());
        clipboard.set_external(ClipboardSlot::Clipboard, clip);
        clipboard.set_external(ClipboardSlot::Selection, sel);
        clipboard
    }

    #[tokio::test]
    async fn test_direct_reads_without_fallback() {
        let reader = Arc::new(ScriptedReader::new(Some("wl-clip"), Some("wl-sel")));
        let sampler = PollSampler::new(
            clipboard_with("clip", "sel"),
            Some(reader.clone() as Arc<dyn FallbackReader>),
            &settings(false, FallbackMode::Both),
        );
        let sample = sampler.sample().await;
        assert_eq!(sample.clipboard, "clip");
        assert_eq!(sample.selection, "sel");
        assert!(reader.calls().is_empty());
    }

    #[tokio::test]
    async fn test_primary_mode_reads_selection_side_only() {
        let reader = Arc::new(ScriptedReader::new(Some("wl-clip"), Some("wl-sel")));
        let sampler = PollSampler::new(
            clipboard_with("clip", "sel"),
            Some(reader.clone() as Arc<dyn FallbackReader>),
            &settings(true, FallbackMode::Primary),
        );
        let sample = sampler.sample().await;
        assert_eq!(sample.clipboard, "clip");
        assert_eq!(sample.selection, "wl-sel");
        assert_eq!(reader.calls(), vec![ClipboardSlot::Selection]);
    }

    #[tokio::test]
    async fn test_clipboard_mode_reads_clipboard_side_only() {
        let reader = Arc::new(ScriptedReader::new(Some("wl-clip"), Some("wl-sel")));
        let sampler = PollSampler::new(
            clipboard_with("clip", "sel"),
            Some(reader.clone() as Arc<dyn FallbackReader>),
            &settings(true, FallbackMode::Clipboard),
        );
        let sample = sampler.sample().await;
        assert_eq!(sample.clipboard, "wl-clip");
        assert_eq!(sample.selection, "sel");
        assert_eq!(reader.calls(), vec![ClipboardSlot::Clipboard]);
    }

    #[tokio::test]
    async fn test_failed_or_empty_fallback_keeps_direct_read() {
        let reader = Arc::new(ScriptedReader::new(None, Some("")));
        let sampler = PollSampler::new(
            clipboard_with("clip", "sel"),
            Some(reader.clone() as Arc<dyn FallbackReader>),
            &settings(true, FallbackMode::Both),
        );
        let sample = sampler.sample().await;
        assert_eq!(sample.clipboard, "clip");
        assert_eq!(sample.selection, "sel");
        assert_eq!(
            reader.calls(),
            vec![ClipboardSlot::Clipboard, ClipboardSlot::Selection]
        );
    }
}
