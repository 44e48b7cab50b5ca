//! Loop timers: the debouncer, the poll re-arm delay and the poll ticker.
//!
//! Timers never call back into the controller directly. They post
//! [`LoopEvent`]s into the loop's queue, so every transition still happens on
//! the loop task. Single-shot timers are single-slot: scheduling again aborts
//! the pending task, and a generation number rejects a firing that was
//! already queued before the abort.

use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::config::{DEBOUNCE_QUIET, POLL_REARM_COOLDOWN};
use crate::event::LoopEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Quiet period after change notifications.
    Debounce,
    /// Cooldown before polling resumes after a popup closes.
    PollRearm,
}

/// Timer control as seen by the menu controller.
pub trait Scheduler {
    /// (Re)start the single-shot timer `kind`.
    fn schedule(&mut self, kind: TimerKind);
    fn cancel(&mut self, kind: TimerKind);
    /// True once for the firing that belongs to the latest `schedule`.
    fn accept(&mut self, kind: TimerKind, generation: u64) -> bool;
    fn start_polling(&mut self);
    fn stop_polling(&mut self);
}

/// A restartable single-shot timer.
pub struct SingleShot {
    kind: TimerKind,
    delay: Duration,
    tx: UnboundedSender<LoopEvent>,
    generation: u64,
    pending: Option<AbortHandle>,
}

impl SingleShot {
    pub fn new(kind: TimerKind, delay: Duration, tx: UnboundedSender<LoopEvent>) -> Self {
        Self {
            kind,
            delay,
            tx,
            generation: 0,
            pending: None,
        }
    }

    /// The change-notification debouncer.
    pub fn debouncer(tx: UnboundedSender<LoopEvent>) -> Self {
        Self::new(TimerKind::Debounce, DEBOUNCE_QUIET, tx)
    }

    pub fn schedule(&mut self) {
        self.cancel();
        let kind = self.kind;
        let delay = self.delay;
        let generation = self.generation;
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(LoopEvent::TimerFired { kind, generation });
        });
        self.pending = Some(task.abort_handle());
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.generation += 1;
    }

    pub fn accept(&mut self, generation: u64) -> bool {
        if generation == self.generation && self.pending.is_some() {
            self.pending = None;
            true
        } else {
            debug!(kind = ?self.kind, generation, "stale timer firing dropped");
            false
        }
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Periodic poll ticks; the first tick comes one period after `start`.
pub struct PollTicker {
    period: Duration,
    tx: UnboundedSender<LoopEvent>,
    task: Option<AbortHandle>,
}

impl PollTicker {
    pub fn new(period: Duration, tx: UnboundedSender<LoopEvent>) -> Self {
        Self {
            period,
            tx,
            task: None,
        }
    }

    pub fn start(&mut self) {
        if self.task.is_some() {
            return;
        }
        let period = self.period;
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if tx.send(LoopEvent::PollTick).is_err() {
                    break;
                }
            }
        });
        self.task = Some(task.abort_handle());
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }
}

/// The production scheduler owned by the controller.
pub struct LoopTimers {
    debounce: SingleShot,
    rearm: SingleShot,
    ticker: PollTicker,
}

impl LoopTimers {
    pub fn new(poll_interval: Duration, tx: UnboundedSender<LoopEvent>) -> Self {
        Self {
            debounce: SingleShot::debouncer(tx.clone()),
            rearm: SingleShot::new(TimerKind::PollRearm, POLL_REARM_COOLDOWN, tx.clone()),
            ticker: PollTicker::new(poll_interval, tx),
        }
    }

    fn timer(&mut self, kind: TimerKind) -> &mut SingleShot {
        match kind {
            TimerKind::Debounce => &mut self.debounce,
            TimerKind::PollRearm => &mut self.rearm,
        }
    }
}

impl Scheduler for LoopTimers {
    fn schedule(&mut self, kind: TimerKind) {
        self.timer(kind).schedule();
    }

    fn cancel(&mut self, kind: TimerKind) {
        self.timer(kind).cancel();
    }

    fn accept(&mut self, kind: TimerKind, generation: u64) -> bool {
        self.timer(kind).accept(generation)
    }

    fn start_polling(&mut self) {
        self.ticker.start();
    }

    fn stop_polling(&mut self) {
        self.ticker.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
    use tokio::time::advance;

    /// Let spawned timer tasks observe the advanced clock.
    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    fn drain(rx: &mut UnboundedReceiver<LoopEvent>) -> Vec<LoopEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_into_one_firing() {
        let (tx, mut rx) = unbounded_channel();
        let mut debounce = SingleShot::debouncer(tx);

        for _ in 0..5 {
            debounce.schedule();
            settle().await;
            advance(Duration::from_millis(50)).await;
            settle().await;
        }
        assert!(drain(&mut rx).is_empty());

        advance(DEBOUNCE_QUIET).await;
        settle().await;
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            LoopEvent::TimerFired { kind, generation } => {
                assert_eq!(*kind, TimerKind::Debounce);
                assert!(debounce.accept(*generation));
                assert!(!debounce.accept(*generation));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let (tx, mut rx) = unbounded_channel();
        let mut rearm = SingleShot::new(TimerKind::PollRearm, POLL_REARM_COOLDOWN, tx);
        rearm.schedule();
        rearm.cancel();
        assert!(!rearm.is_pending());
        advance(POLL_REARM_COOLDOWN * 2).await;
        settle().await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_firing_from_previous_schedule_is_rejected() {
        let (tx, mut rx) = unbounded_channel();
        let mut debounce = SingleShot::debouncer(tx);
        debounce.schedule();
        settle().await;
        advance(DEBOUNCE_QUIET).await;
        settle().await;
        let stale = drain(&mut rx);
        assert_eq!(stale.len(), 1);

        // A new burst starts before the loop got to the queued firing.
        debounce.schedule();
        if let LoopEvent::TimerFired { generation, .. } = stale[0] {
            assert!(!debounce.accept(generation));
        }
        assert!(debounce.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_waits_one_period_then_ticks() {
        let (tx, mut rx) = unbounded_channel();
        let mut ticker = PollTicker::new(Duration::from_millis(1500), tx);
        ticker.start();
        settle().await;
        advance(Duration::from_millis(1400)).await;
        settle().await;
        assert!(drain(&mut rx).is_empty());

        advance(Duration::from_millis(100)).await;
        settle().await;
        assert_eq!(drain(&mut rx).len(), 1);

        advance(Duration::from_millis(1500)).await;
        settle().await;
        assert_eq!(drain(&mut rx).len(), 1);

        ticker.stop();
        assert!(!ticker.is_running());
        advance(Duration::from_millis(3000)).await;
        settle().await;
        assert!(drain(&mut rx).is_empty());
    }
}
