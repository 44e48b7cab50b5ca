//! Menu controller: turns candidate text into at most one popup at a time.
//!
//! The controller is the only owner of clipboard/menu state and is driven
//! entirely from the event loop task: change notifications, timer firings,
//! poll samples and popup commands all arrive through `on_*` methods, one at
//! a time. Nothing here blocks except the short synchronous clipboard write.

use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::popup::{DismissReason, PopupCommand, PopupState, PopupSurface};
use crate::config::{EffectiveSettings, FOCUS_GRACE, POPUP_COOLDOWN};
use crate::models::{ActionEffect, ClipboardSlot, IconSpec, MenuAction, SlotCache};
use crate::services::clipboard::ClipboardSource;
use crate::services::poll::PollSample;
use crate::services::timer::{Scheduler, TimerKind};
use crate::services::transforms;
use crate::services::ExternalActionRegistry;
use crate::utils::preview_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Idle,
    PopupOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollPhase {
    Disabled,
    /// Stopped while a popup is visible or during the re-arm cooldown.
    Paused,
    Running,
}

#[derive(Debug)]
struct Candidate {
    slot: ClipboardSlot,
    text: String,
}

/// The built-in transforms, bound to `text`, in menu order.
pub fn builtin_actions(text: &str) -> Vec<MenuAction> {
    let set = |label: &str, transformed: String, icon: &str| {
        MenuAction::new(
            label,
            ActionEffect::SetText {
                slot: ClipboardSlot::Clipboard,
                text: transformed,
            },
        )
        .with_icon(IconSpec::parse(icon))
    };

    vec![
        set("UPPERCASE", transforms::uppercase(text), "sp:SP_ArrowUp"),
        set("lowercase", transforms::lowercase(text), "sp:SP_ArrowDown"),
        set("Title Case", transforms::title_case(text), "sp:SP_FileDialogDetailedView"),
        set(
            "Normalize Whitespace",
            transforms::normalize_whitespace(text),
            "sp:SP_BrowserReload",
        ),
        set("Copy to Clipboard", text.to_string(), "sp:SP_DialogOpenButton"),
    ]
}

pub struct MenuController<S, T>
where
    S: PopupSurface,
    T: Scheduler,
{
    settings: Arc<EffectiveSettings>,
    clipboard: Arc<dyn ClipboardSource>,
    registry: ExternalActionRegistry,
    surface: S,
    scheduler: T,

    slots: SlotCache,
    pending: Option<Candidate>,
    /// Slot whose next change notification is our own write echoing back.
    suppress_next: Option<ClipboardSlot>,
    popup: PopupState,
    shown_at: Option<Instant>,
    next_allowed_popup: Option<Instant>,
    polling: PollPhase,

    popups_shown: u64,
    last_text: Option<String>,
}

impl<S, T> MenuController<S, T>
where
    S: PopupSurface,
    T: Scheduler,
{
    pub fn new(
        settings: Arc<EffectiveSettings>,
        clipboard: Arc<dyn ClipboardSource>,
        registry: ExternalActionRegistry,
        surface: S,
        scheduler: T,
    ) -> Self {
        Self {
            settings,
            clipboard,
            registry,
            surface,
            scheduler,
            slots: SlotCache::default(),
            pending: None,
            suppress_next: None,
            popup: PopupState::default(),
            shown_at: None,
            next_allowed_popup: None,
            polling: PollPhase::Disabled,
            popups_shown: 0,
            last_text: None,
        }
    }

    /// Record what the slots held at startup so it never counts as a change.
    pub fn seed(&mut self, sample: &PollSample) {
        for slot in ClipboardSlot::ALL {
            self.slots.confirm(slot, sample.get(slot));
        }
    }

    /// Begin polling if enabled; the first tick comes one interval from now.
    pub fn start(&mut self) {
        if self.settings.poll_enabled {
            self.polling = PollPhase::Running;
            self.scheduler.start_polling();
            info!(interval_ms = self.settings.poll_interval_ms, "polling enabled");
        }
    }

    pub fn state(&self) -> MenuState {
        if self.popup.is_visible() {
            MenuState::PopupOpen
        } else {
            MenuState::Idle
        }
    }

    pub fn popup(&self) -> &PopupState {
        &self.popup
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Run `f` with the surface and the state it renders.
    pub fn with_surface<R>(&mut self, f: impl FnOnce(&mut S, &PopupState) -> R) -> R {
        f(&mut self.surface, &self.popup)
    }

    pub fn is_polling(&self) -> bool {
        self.polling == PollPhase::Running
    }

    pub fn popups_shown(&self) -> u64 {
        self.popups_shown
    }

    pub fn last_text(&self) -> Option<&str> {
        self.last_text.as_deref()
    }

    pub fn external_action_count(&self) -> usize {
        self.registry.len()
    }

    /// Host notification that `slot` now holds `text`.
    pub fn on_change(&mut self, slot: ClipboardSlot, text: String) {
        if self.suppress_next == Some(slot) {
            self.suppress_next = None;
            info!(%slot, "change suppressed (own write)");
            return;
        }
        debug!(%slot, len = text.len(), "change noticed");
        self.pending = Some(Candidate { slot, text });
        self.scheduler.schedule(TimerKind::Debounce);
    }

    pub fn on_timer(&mut self, kind: TimerKind, generation: u64) {
        if !self.scheduler.accept(kind, generation) {
            return;
        }
        match kind {
            TimerKind::Debounce => self.evaluate_pending(),
            TimerKind::PollRearm => self.rearm_polling(),
        }
    }

    /// Compare a poll sample with the last-known values and react immediately.
    pub fn on_poll_sample(&mut self, sample: &PollSample) {
        if self.polling != PollPhase::Running {
            debug!("poll sample while polling is paused; ignored");
            return;
        }
        for slot in ClipboardSlot::ALL {
            let fresh = sample.get(slot);
            // Confirmed before the cooldown gate: a change dropped there is not retried.
            if !self.slots.confirm(slot, fresh) || fresh.trim().is_empty() {
                continue;
            }
            info!(%slot, len = fresh.len(), "poll: change");
            self.evaluate(slot, fresh.to_string());
        }
    }

    pub fn on_command(&mut self, command: PopupCommand) {
        if !self.popup.is_visible() {
            debug!(?command, "popup command without a popup; ignored");
            return;
        }
        match command {
            PopupCommand::Select(index) => self.select(index),
            PopupCommand::NextPage => {
                if self.popup.next_page() {
                    self.surface.refresh(&self.popup);
                }
            }
            PopupCommand::PreviousPage => {
                if self.popup.previous_page() {
                    self.surface.refresh(&self.popup);
                }
            }
            PopupCommand::Cancel => self.close(DismissReason::Cancelled),
        }
    }

    /// The popup lost input focus.
    pub fn on_focus_lost(&mut self) {
        let Some(shown_at) = self.shown_at else {
            return;
        };
        if shown_at.elapsed() < FOCUS_GRACE {
            debug!("focus loss within grace window; ignored");
            return;
        }
        self.close(DismissReason::FocusLost);
    }

    fn evaluate_pending(&mut self) {
        let Some(Candidate { slot, text }) = self.pending.take() else {
            return;
        };
        self.slots.confirm(slot, &text);
        self.evaluate(slot, text);
    }

    fn evaluate(&mut self, slot: ClipboardSlot, text: String) {
        info!(%slot, len = text.len(), preview = %preview_text(&text), "evaluating text");
        if text.trim().is_empty() {
            info!("no text to act on");
            return;
        }
        if self.popup.is_visible() {
            info!("popup already visible; skipping");
            return;
        }
        if let Some(next_allowed) = self.next_allowed_popup {
            if Instant::now() < next_allowed {
                info!("popup cooldown active; skipping");
                return;
            }
        }
        self.open_popup(text);
    }

    fn open_popup(&mut self, text: String) {
        if self.polling == PollPhase::Running {
            self.polling = PollPhase::Paused;
            self.scheduler.stop_polling();
        }
        self.scheduler.cancel(TimerKind::PollRearm);

        let mut actions = builtin_actions(&text);
        actions.extend(self.registry.menu_actions(&text));
        info!(count = actions.len(), "showing menu");

        self.popup = PopupState::open(&text, actions, self.settings.actions_per_page);
        self.shown_at = Some(Instant::now());
        self.popups_shown += 1;
        self.last_text = Some(text);
        self.surface.show(&self.popup);
    }

    fn select(&mut self, index: usize) {
        let Some(action) = self.popup.action(index).cloned() else {
            warn!(index, "ignoring selection of unknown or disabled action");
            return;
        };
        info!(label = %action.label, "menu choice");
        self.apply(action.effect);
        self.close(DismissReason::ActionChosen);
    }

    fn apply(&mut self, effect: ActionEffect) {
        match effect {
            ActionEffect::SetText { slot, text } => {
                self.suppress_next = Some(slot);
                info!(%slot, len = text.len(), "setting clipboard text");
                match self.clipboard.write(slot, &text) {
                    Ok(()) => {
                        self.slots.confirm(slot, &text);
                    }
                    Err(e) => {
                        // No echo is coming; don't swallow the next real change.
                        self.suppress_next = None;
                        warn!(%slot, error = %e, "failed to set clipboard text");
                    }
                }
            }
            ActionEffect::Launch { command, args } => {
                self.registry.launch(&command, &args);
            }
        }
    }

    fn close(&mut self, reason: DismissReason) {
        if !self.popup.is_visible() {
            return;
        }
        self.popup.close();
        self.shown_at = None;
        self.surface.dismiss();
        self.next_allowed_popup = Some(Instant::now() + POPUP_COOLDOWN);
        info!(?reason, "popup closed");

        if self.polling != PollPhase::Disabled {
            self.scheduler.schedule(TimerKind::PollRearm);
        }
    }

    fn rearm_polling(&mut self) {
        if self.polling == PollPhase::Paused && !self.popup.is_visible() {
            self.polling = PollPhase::Running;
            self.scheduler.start_polling();
            debug!("polling resumed");
        }
    }
}
