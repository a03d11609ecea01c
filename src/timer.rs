//! Per-question countdown.
//!
//! [`Countdown`] holds the countdown state and is advanced by the controller one
//! tick at a time. [`Ticker`] is the async half: a tokio task that emits
//! [`QuizEvent::TimerTick`] once per second for a given generation. Every
//! `start` bumps the generation, so ticks from a cancelled ticker that are
//! still in flight are recognised as stale and dropped.

use crate::quiz::QuizEvent;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

pub const TIMER_DURATION: u32 = 10;
pub const TICK: Duration = Duration::from_secs(1);

const CAUTION_AT: u32 = 5;
const CRITICAL_AT: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerWarning {
    #[default]
    Calm,
    Caution,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick from an old generation or a stopped countdown.
    Stale,
    Running { remaining: u32, warning: TimerWarning },
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerView {
    pub remaining: u32,
    pub total: u32,
    pub warning: TimerWarning,
    pub running: bool,
}

impl TimerView {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.remaining) / f64::from(self.total)
        }
    }
}

#[derive(Debug, Clone)]
pub struct Countdown {
    generation: u64,
    remaining: u32,
    warning: TimerWarning,
    running: bool,
}

impl Default for Countdown {
    fn default() -> Self {
        Self {
            generation: 0,
            remaining: TIMER_DURATION,
            warning: TimerWarning::Calm,
            running: false,
        }
    }
}

impl Countdown {
    /// Restarts from the full duration and returns the new generation.
    /// Any previous run is superseded.
    pub fn start(&mut self) -> u64 {
        self.generation += 1;
        self.remaining = TIMER_DURATION;
        self.warning = TimerWarning::Calm;
        self.running = true;
        self.generation
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Back to a full, dormant bar.
    pub fn reset(&mut self) {
        self.running = false;
        self.remaining = TIMER_DURATION;
        self.warning = TimerWarning::Calm;
    }

    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        if !self.running || generation != self.generation {
            return TickOutcome::Stale;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == CAUTION_AT {
            self.warning = TimerWarning::Caution;
        } else if self.remaining == CRITICAL_AT {
            self.warning = TimerWarning::Critical;
        }

        if self.remaining == 0 {
            self.running = false;
            TickOutcome::Expired
        } else {
            TickOutcome::Running {
                remaining: self.remaining,
                warning: self.warning,
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn view(&self) -> TimerView {
        TimerView {
            remaining: self.remaining,
            total: TIMER_DURATION,
            warning: self.warning,
            running: self.running,
        }
    }
}

/// Owns at most one tick task at a time.
#[derive(Debug, Default)]
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn start(&mut self, generation: u64, tx: UnboundedSender<QuizEvent>) {
        self.stop();
        debug!("Ticker started for generation {}", generation);
        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + TICK, TICK);
            loop {
                interval.tick().await;
                if tx.send(QuizEvent::TimerTick { generation }).is_err() {
                    break;
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
