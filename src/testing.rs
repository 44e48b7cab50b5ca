//! In-memory stand-ins for the clipboard, the fallback reader, the command
//! runner, the popup surface and the loop timers.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::menu::{PopupState, PopupSurface};
use crate::models::ClipboardSlot;
use crate::services::clipboard::{ClipboardError, ClipboardSource};
use crate::services::fallback::{FallbackError, FallbackReader};
use crate::services::timer::{Scheduler, TimerKind};
use crate::services::actions::CommandRunner;

#[derive(Default)]
pub struct FakeClipboard {
    values: Mutex<[String; 2]>,
    generations: [AtomicU64; 2],
    writes: Mutex<Vec<(ClipboardSlot, String)>>,
    fail_writes: AtomicBool,
}

fn index(slot: ClipboardSlot) -> usize {
    match slot {
        ClipboardSlot::Clipboard => 0,
        ClipboardSlot::Selection => 1,
    }
}

impl FakeClipboard {
    /// Another application put `text` into `slot`.
    pub fn set_external(&self, slot: ClipboardSlot, text: &str) {
        self.values.lock().unwrap()[index(slot)] = text.to_string();
    }

    pub fn writes(&self) -> Vec<(ClipboardSlot, String)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl ClipboardSource for FakeClipboard {
    fn read(&self, slot: ClipboardSlot) -> Result<String, ClipboardError> {
        Ok(self.values.lock().unwrap()[index(slot)].clone())
    }

    fn write(&self, slot: ClipboardSlot, text: &str) -> Result<(), ClipboardError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ClipboardError::Access {
                slot,
                message: "owner went away".to_string(),
            });
        }
        let mut values = self.values.lock().unwrap();
        values[index(slot)] = text.to_string();
        self.generations[index(slot)].fetch_add(1, Ordering::SeqCst);
        drop(values);
        self.writes.lock().unwrap().push((slot, text.to_string()));
        Ok(())
    }

    fn read_versioned(&self, slot: ClipboardSlot) -> Result<(String, u64), ClipboardError> {
        let values = self.values.lock().unwrap();
        let generation = self.generations[index(slot)].load(Ordering::SeqCst);
        Ok((values[index(slot)].clone(), generation))
    }
}

#[derive(Default)]
pub struct RecordingRunner {
    launches: Mutex<Vec<(String, Vec<String>)>>,
    fail: AtomicBool,
}

impl RecordingRunner {
    pub fn launches(&self) -> Vec<(String, Vec<String>)> {
        self.launches.lock().unwrap().clone()
    }

    pub fn fail_launches(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl CommandRunner for RecordingRunner {
    fn launch_detached(&self, command: &str, args: &[String]) -> bool {
        self.launches
            .lock()
            .unwrap()
            .push((command.to_string(), args.to_vec()));
        !self.fail.load(Ordering::SeqCst)
    }
}

/// Answers fallback reads from fixed values; `None` makes the read fail.
pub struct ScriptedReader {
    clipboard: Option<String>,
    selection: Option<String>,
    calls: Mutex<Vec<ClipboardSlot>>,
}

impl ScriptedReader {
    pub fn new(clipboard: Option<&str>, selection: Option<&str>) -> Self {
        Self {
            clipboard: clipboard.map(str::to_string),
            selection: selection.map(str::to_string),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ClipboardSlot> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FallbackReader for ScriptedReader {
    async fn read(&self, args: &[&str], _timeout: Duration) -> Result<String, FallbackError> {
        let slot = if args.contains(&"--primary") {
            ClipboardSlot::Selection
        } else {
            ClipboardSlot::Clipboard
        };
        self.calls.lock().unwrap().push(slot);
        let value = match slot {
            ClipboardSlot::Clipboard => &self.clipboard,
            ClipboardSlot::Selection => &self.selection,
        };
        value.clone().ok_or_else(|| {
            FallbackError::Spawn(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "scripted failure",
            ))
        })
    }
}

#[derive(Default)]
struct SurfaceLog {
    visible: bool,
    shown: Vec<String>,
    refreshes: usize,
    dismissals: usize,
}

/// Records what the controller asked to display. Clones share the log.
#[derive(Clone, Default)]
pub struct FakeSurface {
    log: Arc<Mutex<SurfaceLog>>,
}

impl FakeSurface {
    /// Captured text of every popup shown, in order.
    pub fn shown(&self) -> Vec<String> {
        self.log.lock().unwrap().shown.clone()
    }

    pub fn refresh_count(&self) -> usize {
        self.log.lock().unwrap().refreshes
    }

    pub fn dismiss_count(&self) -> usize {
        self.log.lock().unwrap().dismissals
    }
}

impl PopupSurface for FakeSurface {
    fn show(&mut self, popup: &PopupState) {
        let mut log = self.log.lock().unwrap();
        log.visible = true;
        log.shown.push(popup.text().to_string());
    }

    fn refresh(&mut self, _popup: &PopupState) {
        self.log.lock().unwrap().refreshes += 1;
    }

    fn dismiss(&mut self) -> bool {
        let mut log = self.log.lock().unwrap();
        log.dismissals += 1;
        std::mem::replace(&mut log.visible, false)
    }
}

#[derive(Default)]
struct SchedulerLog {
    generation: u64,
    debounce: Option<u64>,
    rearm: Option<u64>,
    debounce_schedules: usize,
    rearm_schedules: usize,
    polling: bool,
}

impl SchedulerLog {
    fn pending_mut(&mut self, kind: TimerKind) -> &mut Option<u64> {
        match kind {
            TimerKind::Debounce => &mut self.debounce,
            TimerKind::PollRearm => &mut self.rearm,
        }
    }
}

/// A scheduler that never fires on its own; tests deliver firings by hand.
#[derive(Clone, Default)]
pub struct FakeScheduler {
    log: Arc<Mutex<SchedulerLog>>,
}

impl FakeScheduler {
    /// Generation of the outstanding firing of `kind`, if one is pending.
    pub fn pending(&self, kind: TimerKind) -> Option<u64> {
        *self.log.lock().unwrap().pending_mut(kind)
    }

    pub fn schedule_count(&self, kind: TimerKind) -> usize {
        let log = self.log.lock().unwrap();
        match kind {
            TimerKind::Debounce => log.debounce_schedules,
            TimerKind::PollRearm => log.rearm_schedules,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.log.lock().unwrap().polling
    }
}

impl Scheduler for FakeScheduler {
    fn schedule(&mut self, kind: TimerKind) {
        let mut log = self.log.lock().unwrap();
        log.generation += 1;
        let generation = log.generation;
        *log.pending_mut(kind) = Some(generation);
        match kind {
            TimerKind::Debounce => log.debounce_schedules += 1,
            TimerKind::PollRearm => log.rearm_schedules += 1,
        }
    }

    fn cancel(&mut self, kind: TimerKind) {
        *self.log.lock().unwrap().pending_mut(kind) = None;
    }

    fn accept(&mut self, kind: TimerKind, generation: u64) -> bool {
        let mut log = self.log.lock().unwrap();
        let pending = log.pending_mut(kind);
        if *pending == Some(generation) {
            *pending = None;
            true
        } else {
            false
        }
    }

    fn start_polling(&mut self) {
        self.log.lock().unwrap().polling = true;
    }

    fn stop_polling(&mut self) {
        self.log.lock().unwrap().polling = false;
    }
}
