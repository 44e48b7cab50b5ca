//! Main application state and event loop.
//!
//! Everything that touches clipboard or menu state runs on this one task.
//! The change monitor, the terminal reader, the timers and the poll sampler
//! all post [`LoopEvent`]s into a single queue.

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::config::EffectiveSettings;
use crate::event::LoopEvent;
use crate::menu::{MenuController, MenuState};
use crate::models::ExternalActionSpec;
use crate::screens::{StatusSnapshot, StatusView, TerminalPopup};
use crate::services::clipboard::spawn_change_monitor;
use crate::services::{
    ClipboardSource, ExternalActionRegistry, FallbackReader, LoopTimers, PollSampler,
    ProcessRunner, Theme, WlPasteReader,
};

const INPUT_POLL: Duration = Duration::from_millis(100);

/// Application state.
pub struct App {
    controller: MenuController<TerminalPopup, LoopTimers>,
    clipboard: Arc<dyn ClipboardSource>,
    sampler: PollSampler,
    status: StatusView,

    tx: UnboundedSender<LoopEvent>,
    rx: UnboundedReceiver<LoopEvent>,

    /// A poll sample is in flight; further ticks are skipped until it lands.
    sampling: bool,
    should_quit: bool,
}

impl App {
    pub fn new(
        settings: EffectiveSettings,
        clipboard: Arc<dyn ClipboardSource>,
        actions: Vec<ExternalActionSpec>,
        selection_supported: bool,
    ) -> Self {
        let settings = Arc::new(settings);
        let theme = Arc::new(Theme::load());
        let (tx, rx) = unbounded_channel();

        let fallback: Arc<dyn FallbackReader> = Arc::new(WlPasteReader::default());
        let sampler = PollSampler::new(clipboard.clone(), Some(fallback), &settings);

        let controller = MenuController::new(
            settings.clone(),
            clipboard.clone(),
            ExternalActionRegistry::new(actions, Arc::new(ProcessRunner)),
            TerminalPopup::new(theme.clone()),
            LoopTimers::new(settings.poll_interval(), tx.clone()),
        );

        Self {
            controller,
            clipboard,
            sampler,
            status: StatusView::new(settings, theme, selection_supported),
            tx,
            rx,
            sampling: false,
            should_quit: false,
        }
    }

    /// Run the application until quit, SIGINT or SIGTERM.
    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableFocusChange
        )?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal).await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableFocusChange
        )?;
        terminal.show_cursor()?;

        result
    }

    async fn start(&mut self, size: (u16, u16)) -> Result<()> {
        self.controller.surface_mut().set_bounds(size.0, size.1);

        // Whatever is already on the clipboard is not a change.
        let initial = self.sampler.sample().await;
        self.controller.seed(&initial);

        spawn_change_monitor(self.clipboard.clone(), self.tx.clone())
            .context("failed to start the clipboard monitor")?;
        spawn_input_reader(self.tx.clone()).context("failed to start the input reader")?;

        self.controller.start();
        info!("watching for clipboard changes");
        Ok(())
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        let size = terminal.size()?;
        self.start((size.width, size.height)).await?;
        let mut signals = ShutdownSignals::new()?;

        loop {
            terminal.draw(|f| self.draw(f))?;

            let event = tokio::select! {
                event = self.rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
                name = signals.recv() => {
                    info!(signal = name, "received shutdown signal");
                    break;
                }
            };
            self.handle(event);
            while let Ok(event) = self.rx.try_recv() {
                self.handle(event);
            }

            if self.should_quit {
                break;
            }
        }

        info!(popups = self.controller.popups_shown(), "exiting");
        Ok(())
    }

    fn handle(&mut self, event: LoopEvent) {
        match event {
            LoopEvent::ClipboardChanged { slot, text } => self.controller.on_change(slot, text),
            LoopEvent::TimerFired { kind, generation } => self.controller.on_timer(kind, generation),
            LoopEvent::PollTick => self.sample_in_background(),
            LoopEvent::PollSampled(sample) => {
                self.sampling = false;
                self.controller.on_poll_sample(&sample);
            }
            LoopEvent::Input(input) => self.handle_input(input),
        }
    }

    fn sample_in_background(&mut self) {
        if self.sampling {
            debug!("previous poll sample still running; tick skipped");
            return;
        }
        self.sampling = true;
        let sampler = self.sampler.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let sample = sampler.sample().await;
            let _ = tx.send(LoopEvent::PollSampled(sample));
        });
    }

    fn handle_input(&mut self, input: Event) {
        match input {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    return;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    self.should_quit = true;
                    return;
                }
                if self.controller.state() == MenuState::PopupOpen {
                    let command = self
                        .controller
                        .with_surface(|surface, popup| surface.map_key(key, popup));
                    if let Some(command) = command {
                        self.controller.on_command(command);
                    }
                } else if key.code == KeyCode::Char('q') {
                    self.should_quit = true;
                }
            }
            Event::Mouse(mouse) => {
                let command = self
                    .controller
                    .with_surface(|surface, popup| surface.map_mouse(mouse, popup));
                if let Some(command) = command {
                    self.controller.on_command(command);
                }
            }
            Event::FocusLost => self.controller.on_focus_lost(),
            Event::Resize(width, height) => {
                self.controller.surface_mut().set_bounds(width, height);
            }
            _ => {}
        }
    }

    fn draw(&self, f: &mut ratatui::Frame) {
        let snapshot = StatusSnapshot {
            polling: self.controller.is_polling(),
            popups_shown: self.controller.popups_shown(),
            external_actions: self.controller.external_action_count(),
            last_text: self.controller.last_text().map(str::to_string),
        };
        let area = f.area();
        self.status.draw(f, area, &snapshot);
        self.controller.surface().draw(f, self.controller.popup());
    }
}

/// SIGTERM and SIGINT, either of which ends the loop so the terminal is
/// restored on the way out.
struct ShutdownSignals {
    terminate: Signal,
    interrupt: Signal,
}

impl ShutdownSignals {
    fn new() -> io::Result<Self> {
        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
        })
    }

    /// Name of the next signal to arrive.
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.terminate.recv() => "SIGTERM",
            _ = self.interrupt.recv() => "SIGINT",
        }
    }
}

/// Forward terminal input into the loop until the loop goes away.
fn spawn_input_reader(tx: UnboundedSender<LoopEvent>) -> io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("terminal-input".to_string())
        .spawn(move || loop {
            match event::poll(INPUT_POLL) {
                Ok(false) => {
                    if tx.is_closed() {
                        break;
                    }
                }
                Ok(true) => match event::read() {
                    Ok(input) => {
                        if tx.send(LoopEvent::Input(input)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "terminal read failed");
                        break;
                    }
                },
                Err(e) => {
                    warn!(error = %e, "terminal poll failed");
                    break;
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sigint_is_a_shutdown_signal() {
        let mut signals = ShutdownSignals::new().unwrap();
        // The handler is installed, so this no longer kills the test process.
        unsafe { libc::raise(libc::SIGINT) };
        let name = tokio::time::timeout(Duration::from_secs(2), signals.recv())
            .await
            .unwrap();
        assert_eq!(name, "SIGINT");
    }
}
